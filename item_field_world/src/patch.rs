// One n×n block of the world and the items located inside it.

use crate::item::PlacedItem;
use item_field_gibbs::{Patch, Position};
use serde::{Deserialize, Serialize};

/// Items are an unordered bag: removal swaps the last item into the hole.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    /// Patch position (world position divided by the patch size).
    pub position: Position,
    items: Vec<PlacedItem>,
}

impl ItemPatch {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            items: Vec::new(),
        }
    }

    pub fn items(&self) -> &[PlacedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The item at `world_position`, if any.
    pub fn item_at(&self, world_position: Position) -> Option<&PlacedItem> {
        self.items.iter().find(|i| i.location == world_position)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl Patch for ItemPatch {
    type Item = PlacedItem;

    fn items(&self) -> &[PlacedItem] {
        &self.items
    }

    fn remove_item(&mut self, index: usize) {
        self.items.swap_remove(index);
    }

    fn add_item(&mut self, item: PlacedItem) {
        self.items.push(item);
    }
}
