// Placed item tokens.
//
// The sampler only reads `item_type` and `location`. The two timestamps are
// owned by whatever drives the world over time (spawning, decay); the
// sampler creates items with both set to zero.

use item_field_gibbs::{FieldItem, ItemType, Position};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedItem {
    pub item_type: ItemType,
    pub location: Position,
    /// Simulation time the item appeared. Zero for sampler-created items.
    #[serde(default)]
    pub creation_time: u64,
    /// Simulation time the item was removed, or zero while it exists.
    #[serde(default)]
    pub deletion_time: u64,
}

impl PlacedItem {
    pub fn new(item_type: ItemType, location: Position) -> Self {
        Self {
            item_type,
            location,
            creation_time: 0,
            deletion_time: 0,
        }
    }
}

impl FieldItem for PlacedItem {
    fn item_type(&self) -> ItemType {
        self.item_type
    }

    fn location(&self) -> Position {
        self.location
    }

    fn new_at(item_type: ItemType, location: Position) -> Self {
        Self::new(item_type, location)
    }
}
