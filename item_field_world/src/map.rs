// Patch-indexed 2D world.
//
// The world is a sparse set of n×n patches keyed by patch position. Each
// item is stored in the patch that contains its location.
//
// Neighborhood lookup returns the 2×2 block of patches nearest a world
// position: the owning patch, plus the horizontal neighbor on the side of
// the patch's midline the position falls on, the vertical neighbor likewise,
// and the diagonal between them. Patches in the block that do not exist are
// skipped. The block contains every cell within Chebyshev distance
// `floor(n / 2)` of the position, so an energy model whose interactions
// vanish beyond that distance sees every relevant neighbor.
//
// See also: `patch.rs` for item storage, `energy.rs` for the model usually
// stored in `energy`, `config.rs` for building a map from JSON.

use crate::item::PlacedItem;
use crate::patch::ItemPatch;
use item_field_gibbs::{
    EnergyModel, ItemType, Neighborhood, NeighborhoodError, Patch, Position, WorldMap,
};
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
pub struct PatchMap<E> {
    patch_size: u32,
    patches: BTreeMap<Position, ItemPatch>,
    energy: E,
}

impl<E> PatchMap<E> {
    /// Create an empty map. Panics if `patch_size` is zero.
    pub fn new(patch_size: u32, energy: E) -> Self {
        assert!(patch_size > 0, "PatchMap: patch_size must be at least 1");
        Self {
            patch_size,
            patches: BTreeMap::new(),
            energy,
        }
    }

    pub fn patch_size(&self) -> u32 {
        self.patch_size
    }

    /// The patch at `patch_position`, created empty if absent.
    pub fn get_or_make_patch(&mut self, patch_position: Position) -> &mut ItemPatch {
        self.patches
            .entry(patch_position)
            .or_insert_with(|| ItemPatch::new(patch_position))
    }

    pub fn patch(&self, patch_position: Position) -> Option<&ItemPatch> {
        self.patches.get(&patch_position)
    }

    pub fn patch_count(&self) -> usize {
        self.patches.len()
    }

    /// Patches in ascending patch-position order.
    pub fn patches(&self) -> impl Iterator<Item = &ItemPatch> {
        self.patches.values()
    }

    pub fn items(&self) -> impl Iterator<Item = &PlacedItem> {
        self.patches.values().flat_map(|p| p.items().iter())
    }

    pub fn item_count(&self) -> usize {
        self.patches.values().map(ItemPatch::len).sum()
    }

    pub fn item_at(&self, world_position: Position) -> Option<&PlacedItem> {
        self.patch(world_position.patch_of(self.patch_size))
            .and_then(|p| p.item_at(world_position))
    }

    /// Place an item in its owning patch, creating the patch if needed.
    ///
    /// Returns `false` and leaves the map unchanged if the cell is occupied.
    pub fn place_item(&mut self, item: PlacedItem) -> bool {
        if self.item_at(item.location).is_some() {
            return false;
        }
        let patch_position = item.location.patch_of(self.patch_size);
        self.get_or_make_patch(patch_position).add_item(item);
        true
    }

    /// Remove every item, keeping the patches.
    pub fn clear_items(&mut self) {
        for patch in self.patches.values_mut() {
            patch.clear();
        }
    }

    /// Number of items of each type in `[0, item_type_count)`. Items of other
    /// types are not counted.
    pub fn counts_by_type(&self, item_type_count: u32) -> Vec<usize> {
        let mut counts = vec![0; item_type_count as usize];
        for item in self.items() {
            if let Some(c) = counts.get_mut(item.item_type as usize) {
                *c += 1;
            }
        }
        counts
    }

    /// The 2×2 block of patch positions considered for `world_position`, in
    /// row-major order (lower y first, then lower x). Existence is not checked.
    pub fn neighborhood_block(&self, world_position: Position) -> [Position; 4] {
        let owner = world_position.patch_of(self.patch_size);
        let offset = world_position.offset_in_patch(self.patch_size);
        let half = i64::from(self.patch_size / 2);
        let nx = if offset.x < half { owner.x - 1 } else { owner.x + 1 };
        let ny = if offset.y < half { owner.y - 1 } else { owner.y + 1 };
        let (x0, x1) = (owner.x.min(nx), owner.x.max(nx));
        let (y0, y1) = (owner.y.min(ny), owner.y.max(ny));
        [
            Position::new(x0, y0),
            Position::new(x1, y0),
            Position::new(x0, y1),
            Position::new(x1, y1),
        ]
    }

    /// Largest Chebyshev distance at which interactions are guaranteed to be
    /// seen by the sampler.
    pub fn interaction_reach(&self) -> u32 {
        self.patch_size / 2
    }
}

impl<E: EnergyModel> WorldMap for PatchMap<E> {
    type Patch = ItemPatch;
    type Energy = E;

    fn get_neighborhood(
        &self,
        world_position: Position,
    ) -> Result<Neighborhood<'_, ItemPatch>, NeighborhoodError> {
        let owner = world_position.patch_of(self.patch_size);
        let mut hood = Neighborhood::new();
        let mut owner_index = None;
        for position in self.neighborhood_block(world_position) {
            if let Some(patch) = self.patches.get(&position) {
                let index = hood.push(position, patch);
                if position == owner {
                    owner_index = Some(index);
                }
            }
        }
        hood.patch_index = owner_index.ok_or(NeighborhoodError::MissingPatch {
            world: world_position,
            patch: owner,
        })?;
        Ok(hood)
    }

    fn patch_mut(&mut self, patch_position: Position) -> Option<&mut ItemPatch> {
        self.patches.get_mut(&patch_position)
    }

    fn energy(&self) -> &E {
        &self.energy
    }
}

/// Type index of each item, for callers that only need occupancy.
pub fn occupancy<E>(map: &PatchMap<E>) -> BTreeMap<Position, ItemType> {
    map.items().map(|i| (i.location, i.item_type)).collect()
}
