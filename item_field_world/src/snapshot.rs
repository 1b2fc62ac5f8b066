// Serializable dump of a populated world.
//
// A snapshot records the patch size, the item type names (index = type), and
// every placed item in patch-position order. `restore` rebuilds a `PatchMap`
// from it; patches that held no items are not recorded, so the caller
// recreates the sampling region separately if it needs empty patches.

use crate::item::PlacedItem;
use crate::map::PatchMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub patch_size: u32,
    pub item_types: Vec<String>,
    pub items: Vec<PlacedItem>,
}

impl WorldSnapshot {
    pub fn capture<E>(map: &PatchMap<E>, item_types: Vec<String>) -> Self {
        Self {
            patch_size: map.patch_size(),
            item_types,
            items: map.items().cloned().collect(),
        }
    }

    /// Rebuild a map holding the snapshot's items. Items landing on an
    /// already-occupied cell are dropped; the count of dropped items is
    /// returned alongside the map.
    pub fn restore<E>(&self, energy: E) -> (PatchMap<E>, usize) {
        let mut map = PatchMap::new(self.patch_size.max(1), energy);
        let dropped = self
            .items
            .iter()
            .filter(|item| !map.place_item((*item).clone()))
            .count();
        (map, dropped)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Write the snapshot as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()
    }

    /// Number of items of each named type.
    pub fn counts_by_type(&self) -> Vec<usize> {
        let mut counts = vec![0; self.item_types.len()];
        for item in &self.items {
            if let Some(c) = counts.get_mut(item.item_type as usize) {
                *c += 1;
            }
        }
        counts
    }
}
