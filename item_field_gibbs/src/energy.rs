// Energy models: the unary and pairwise log-potential terms of the MRF.
//
// The sampler sums `intensity(position, t)` and one `interaction` term per
// neighboring item to get the unnormalized log-probability of placing type
// `t` at `position`. The "no item" state always has log-potential zero, so a
// negative total makes an item less likely than an empty cell and a positive
// total more likely.
//
// Models are pure: they read nothing from the world and mutate nothing. They
// are called `item_type_count * neighbor_item_count` times per update, which
// dominates the cost of a sweep.

use crate::types::{ItemType, Position};

/// Unary and pairwise log-potentials for item placement.
pub trait EnergyModel {
    /// Log-potential of an item of `item_type` at `position`, ignoring neighbors.
    fn intensity(&self, position: Position, item_type: ItemType) -> f32;

    /// Log-potential contributed by an existing item of `other_type` at
    /// `other` to a candidate of `item_type` at `position`.
    ///
    /// The sampler always passes the cell being resampled first.
    fn interaction(
        &self,
        position: Position,
        other: Position,
        item_type: ItemType,
        other_type: ItemType,
    ) -> f32;
}

impl<E: EnergyModel + ?Sized> EnergyModel for &E {
    fn intensity(&self, position: Position, item_type: ItemType) -> f32 {
        (**self).intensity(position, item_type)
    }

    fn interaction(
        &self,
        position: Position,
        other: Position,
        item_type: ItemType,
        other_type: ItemType,
    ) -> f32 {
        (**self).interaction(position, other, item_type, other_type)
    }
}

/// Zero everywhere: every type and the empty cell are equally likely.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlatEnergy;

impl EnergyModel for FlatEnergy {
    fn intensity(&self, _position: Position, _item_type: ItemType) -> f32 {
        0.0
    }

    fn interaction(
        &self,
        _position: Position,
        _other: Position,
        _item_type: ItemType,
        _other_type: ItemType,
    ) -> f32 {
        0.0
    }
}

/// An energy model backed by two closures.
///
/// ```
/// use item_field_gibbs::{EnergyFn, EnergyModel, Position};
///
/// let energy = EnergyFn::new(
///     |_, t| if t == 0 { 1.0 } else { -1.0 },
///     |a: Position, b: Position, _, _| if a.distance(b) <= 1.0 { -2.0 } else { 0.0 },
/// );
/// assert_eq!(energy.intensity(Position::new(0, 0), 0), 1.0);
/// assert_eq!(energy.interaction(Position::new(0, 0), Position::new(0, 1), 0, 0), -2.0);
/// ```
#[derive(Clone, Copy)]
pub struct EnergyFn<I, P> {
    intensity: I,
    interaction: P,
}

impl<I, P> EnergyFn<I, P>
where
    I: Fn(Position, ItemType) -> f32,
    P: Fn(Position, Position, ItemType, ItemType) -> f32,
{
    pub fn new(intensity: I, interaction: P) -> Self {
        Self {
            intensity,
            interaction,
        }
    }
}

impl<I, P> EnergyModel for EnergyFn<I, P>
where
    I: Fn(Position, ItemType) -> f32,
    P: Fn(Position, Position, ItemType, ItemType) -> f32,
{
    fn intensity(&self, position: Position, item_type: ItemType) -> f32 {
        (self.intensity)(position, item_type)
    }

    fn interaction(
        &self,
        position: Position,
        other: Position,
        item_type: ItemType,
        other_type: ItemType,
    ) -> f32 {
        (self.interaction)(position, other, item_type, other_type)
    }
}
