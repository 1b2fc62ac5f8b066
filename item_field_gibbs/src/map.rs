// Collaborator contracts: items, patches, and the world map.
//
// The sampler never owns world state. It asks a `WorldMap` for the patches
// around a cell, reads their items, and then mutates exactly one or two of
// those patches through `patch_mut`. The neighborhood borrow ends before any
// mutation starts, which is what lets the borrow checker prove that an
// update reads a consistent snapshot and writes only afterwards.
//
// See also: `sampler.rs` for the consumer of these traits, and the
// `item_field_world` crate for the concrete `PatchMap`.

use crate::energy::EnergyModel;
use crate::error::NeighborhoodError;
use crate::types::{ItemType, Position};
use smallvec::SmallVec;

/// A placed item token.
pub trait FieldItem {
    fn item_type(&self) -> ItemType;

    /// World position of the cell the item occupies.
    fn location(&self) -> Position;

    /// Construct a fresh item. Any metadata beyond type and location must
    /// start zeroed.
    fn new_at(item_type: ItemType, location: Position) -> Self;
}

/// A square block of cells holding the items located inside it.
///
/// Items form an unordered bag: `remove_item` may move other items to new
/// indices, so indices are only valid until the next removal.
pub trait Patch {
    type Item: FieldItem;

    fn items(&self) -> &[Self::Item];

    /// Remove the item at `index`. Order of the remaining items is unspecified.
    fn remove_item(&mut self, index: usize);

    fn add_item(&mut self, item: Self::Item);
}

/// The patches that can hold items interacting with one world position.
#[derive(Debug)]
pub struct Neighborhood<'a, P> {
    /// Up to four patches, parallel to `positions`.
    pub patches: SmallVec<[&'a P; 4]>,
    /// Patch positions of `patches`.
    pub positions: SmallVec<[Position; 4]>,
    /// Index into `patches` of the patch that owns the queried position.
    pub patch_index: usize,
}

impl<'a, P> Neighborhood<'a, P> {
    pub fn new() -> Self {
        Self {
            patches: SmallVec::new(),
            positions: SmallVec::new(),
            patch_index: 0,
        }
    }

    /// Append a patch. Returns its index within the neighborhood.
    pub fn push(&mut self, position: Position, patch: &'a P) -> usize {
        self.patches.push(patch);
        self.positions.push(position);
        self.patches.len() - 1
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// Patch position of the owning patch, or `None` if `patch_index` does
    /// not name one of the collected patches.
    pub fn owner_position(&self) -> Option<Position> {
        self.positions.get(self.patch_index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Position, &'a P)> + '_ {
        self.positions
            .iter()
            .copied()
            .zip(self.patches.iter().copied())
    }
}

impl<P> Default for Neighborhood<'_, P> {
    fn default() -> Self {
        Self::new()
    }
}

/// The spatial index the sampler runs against.
pub trait WorldMap {
    type Patch: Patch;
    type Energy: EnergyModel;

    /// Patches whose extents can contain items interacting with
    /// `world_position`, including the one that owns it.
    ///
    /// Must be deterministic for a fixed map state, and must set
    /// `patch_index` to the owning patch.
    fn get_neighborhood(
        &self,
        world_position: Position,
    ) -> Result<Neighborhood<'_, Self::Patch>, NeighborhoodError>;

    fn patch_mut(&mut self, patch_position: Position) -> Option<&mut Self::Patch>;

    fn energy(&self) -> &Self::Energy;

    fn intensity(&self, world_position: Position, item_type: ItemType) -> f32 {
        self.energy().intensity(world_position, item_type)
    }

    fn interaction(
        &self,
        position: Position,
        other: Position,
        item_type: ItemType,
        other_type: ItemType,
    ) -> f32 {
        self.energy()
            .interaction(position, other, item_type, other_type)
    }
}
