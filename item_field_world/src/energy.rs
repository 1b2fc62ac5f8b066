// Table-driven energy model.
//
// Each item type has a constant intensity (its unary log-potential). Pair
// rules add a constant `energy` whenever two items of the named types lie
// within Euclidean `radius` of each other. Rules are symmetric in the two
// types. Negative energies repel (spacing between trees), positive energies
// attract (rocks clustering into outcrops).
//
// A rule's radius must not exceed the map's interaction reach
// (`patch_size / 2`); `WorldConfig::validate` enforces this for
// config-built models.

use item_field_gibbs::{EnergyModel, ItemType, Position};
use serde::{Deserialize, Serialize};

/// Symmetric pairwise rule between two item types.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PairRule {
    pub first: ItemType,
    pub second: ItemType,
    pub radius: f32,
    pub energy: f32,
}

impl PairRule {
    fn applies_to(&self, a: ItemType, b: ItemType) -> bool {
        (self.first == a && self.second == b) || (self.first == b && self.second == a)
    }

    fn in_range(&self, a: Position, b: Position) -> bool {
        let r = f64::from(self.radius);
        a.squared_distance(b) as f64 <= r * r
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableEnergy {
    intensities: Vec<f32>,
    rules: Vec<PairRule>,
}

impl TableEnergy {
    /// One intensity per item type, indexed by type.
    pub fn new(intensities: Vec<f32>) -> Self {
        Self {
            intensities,
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, first: ItemType, second: ItemType, radius: f32, energy: f32) -> Self {
        self.add_rule(PairRule {
            first,
            second,
            radius,
            energy,
        });
        self
    }

    pub fn add_rule(&mut self, rule: PairRule) {
        self.rules.push(rule);
    }

    pub fn item_type_count(&self) -> u32 {
        self.intensities.len() as u32
    }

    pub fn rules(&self) -> &[PairRule] {
        &self.rules
    }

    /// Largest rule radius, or 0 without rules.
    pub fn max_radius(&self) -> f32 {
        self.rules.iter().map(|r| r.radius).fold(0.0, f32::max)
    }
}

impl EnergyModel for TableEnergy {
    /// Types without a table entry can never be placed.
    fn intensity(&self, _position: Position, item_type: ItemType) -> f32 {
        self.intensities
            .get(item_type as usize)
            .copied()
            .unwrap_or(f32::NEG_INFINITY)
    }

    fn interaction(
        &self,
        position: Position,
        other: Position,
        item_type: ItemType,
        other_type: ItemType,
    ) -> f32 {
        self.rules
            .iter()
            .filter(|r| r.applies_to(item_type, other_type) && r.in_range(position, other))
            .map(|r| r.energy)
            .sum()
    }
}
