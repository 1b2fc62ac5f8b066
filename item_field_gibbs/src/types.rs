// Spatial and item types shared by the sampler and its collaborators.
//
// World positions and patch positions share the `Position` type. A patch at
// patch position `p` with side `n` covers world cells `p * n + (0..n)` on
// each axis. Conversions use Euclidean division so that negative world
// coordinates land in the patch to their lower-left, not in patch zero.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of an item category, valid in `[0, item_type_count)`.
///
/// The sampler's conditional distribution has one extra category at index
/// `item_type_count` meaning "no item". That value is never stored in a
/// patch; occupancy is `Option<ItemType>` everywhere outside the sampler's
/// scratch buffer.
pub type ItemType = u32;

/// A cell on the 2D grid, in world units or patch units depending on context.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// World position of `offset` inside the patch at `patch_position`:
    /// `patch_position * patch_size + offset`.
    pub fn world(patch_position: Position, patch_size: u32, offset: Position) -> Self {
        let n = i64::from(patch_size);
        Self::new(
            patch_position.x * n + offset.x,
            patch_position.y * n + offset.y,
        )
    }

    /// Patch position of the patch containing this world position.
    pub fn patch_of(self, patch_size: u32) -> Self {
        let n = i64::from(patch_size);
        Self::new(self.x.div_euclid(n), self.y.div_euclid(n))
    }

    /// Offset of this world position inside its patch, each axis in `[0, n)`.
    pub fn offset_in_patch(self, patch_size: u32) -> Self {
        let n = i64::from(patch_size);
        Self::new(self.x.rem_euclid(n), self.y.rem_euclid(n))
    }

    pub fn squared_distance(self, other: Self) -> u64 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        dx * dx + dy * dy
    }

    /// Euclidean distance.
    pub fn distance(self, other: Self) -> f32 {
        (self.squared_distance(other) as f64).sqrt() as f32
    }

    /// Chebyshev (king-move) distance.
    pub fn chebyshev_distance(self, other: Self) -> u64 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_position_combines_patch_and_offset() {
        let world = Position::world(Position::new(2, -1), 8, Position::new(3, 5));
        assert_eq!(world, Position::new(19, -3));
    }

    #[test]
    fn patch_of_rounds_toward_negative_infinity() {
        assert_eq!(Position::new(0, 0).patch_of(4), Position::new(0, 0));
        assert_eq!(Position::new(3, 4).patch_of(4), Position::new(0, 1));
        assert_eq!(Position::new(-1, -4).patch_of(4), Position::new(-1, -1));
        assert_eq!(Position::new(-5, 7).patch_of(4), Position::new(-2, 1));
    }

    #[test]
    fn offset_round_trips_through_world() {
        for x in -9..9 {
            for y in -9..9 {
                let p = Position::new(x, y);
                let back = Position::world(p.patch_of(3), 3, p.offset_in_patch(3));
                assert_eq!(back, p);
                let o = p.offset_in_patch(3);
                assert!((0..3).contains(&o.x) && (0..3).contains(&o.y));
            }
        }
    }

    #[test]
    fn distances() {
        let a = Position::new(1, 1);
        let b = Position::new(4, 5);
        assert_eq!(a.squared_distance(b), 25);
        assert!((a.distance(b) - 5.0).abs() < 1e-6);
        assert_eq!(a.chebyshev_distance(b), 4);
        assert_eq!(a.distance(a), 0.0);
    }

    #[test]
    fn display_format() {
        assert_eq!(Position::new(-2, 7).to_string(), "(-2, 7)");
    }
}
