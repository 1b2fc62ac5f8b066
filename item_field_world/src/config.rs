// Data-driven world configuration.
//
// Everything the `populate` binary needs lives in `WorldConfig`, loaded from
// JSON: the seed, patch size, number of sweeps, the region of patches to
// sample, the item types with their intensities, and the pairwise rules
// between them. Item types are referred to by name in the JSON and resolved
// to indices (declaration order) when the energy model is built.
//
// Missing fields fall back to `WorldConfig::default()`, so a config file only
// needs to state what it changes.
//
// See also: `energy.rs` for the `TableEnergy` built from `item_types` and
// `interactions`, `map.rs` for the `PatchMap` built from `region`.

use crate::energy::{PairRule, TableEnergy};
use crate::map::PatchMap;
use item_field_gibbs::{ItemType, Position};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("at least one item type is required")]
    NoItemTypes,

    #[error("patch size must be at least 1")]
    ZeroPatchSize,

    #[error("region from {min} to {max} contains no patches")]
    EmptyRegion { min: Position, max: Position },

    #[error("item type `{0}` is declared more than once")]
    DuplicateItemType(String),

    #[error("interaction refers to unknown item type `{0}`")]
    UnknownItemType(String),

    #[error(
        "interaction {first}/{second} has radius {radius}, beyond the reach of {reach} cells for this patch size"
    )]
    InteractionOutOfRange {
        first: String,
        second: String,
        radius: f32,
        reach: u32,
    },

    #[error("{0} must be a finite number")]
    NonFinite(String),
}

/// Rectangle of patch positions, inclusive on both corners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub min: Position,
    pub max: Position,
}

impl RegionConfig {
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Patch positions in row-major order (y outer, x inner).
    pub fn positions(&self) -> Vec<Position> {
        (self.min.y..=self.max.y)
            .flat_map(|y| (self.min.x..=self.max.x).map(move |x| Position::new(x, y)))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemTypeConfig {
    pub name: String,
    /// Unary log-potential relative to an empty cell.
    pub intensity: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractionConfig {
    pub first: String,
    pub second: String,
    /// Euclidean distance, in cells, within which `energy` applies.
    pub radius: f32,
    pub energy: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub seed: u64,
    /// Side length `n` of every patch, in cells.
    pub patch_size: u32,
    /// Number of full sweeps to run.
    pub sweeps: u32,
    pub region: RegionConfig,
    pub item_types: Vec<ItemTypeConfig>,
    pub interactions: Vec<InteractionConfig>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            patch_size: 16,
            sweeps: 20,
            region: RegionConfig {
                min: Position::new(0, 0),
                max: Position::new(1, 1),
            },
            item_types: vec![
                ItemTypeConfig {
                    name: "tree".into(),
                    intensity: -2.0,
                },
                ItemTypeConfig {
                    name: "rock".into(),
                    intensity: -3.0,
                },
            ],
            interactions: vec![
                // Trees keep their distance from each other.
                InteractionConfig {
                    first: "tree".into(),
                    second: "tree".into(),
                    radius: 2.0,
                    energy: -1.5,
                },
                // Nothing grows right next to a rock.
                InteractionConfig {
                    first: "tree".into(),
                    second: "rock".into(),
                    radius: 1.0,
                    energy: -4.0,
                },
                // Rocks cluster into outcrops.
                InteractionConfig {
                    first: "rock".into(),
                    second: "rock".into(),
                    radius: 3.0,
                    energy: 0.5,
                },
            ],
        }
    }
}

impl WorldConfig {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        info!(path = %path.display(), types = config.item_types.len(), "loaded world config");
        Ok(config)
    }

    /// Parse and validate a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.item_types.is_empty() {
            return Err(ConfigError::NoItemTypes);
        }
        if self.patch_size == 0 {
            return Err(ConfigError::ZeroPatchSize);
        }
        if self.region.is_empty() {
            return Err(ConfigError::EmptyRegion {
                min: self.region.min,
                max: self.region.max,
            });
        }
        for (i, t) in self.item_types.iter().enumerate() {
            if self.item_types[..i].iter().any(|other| other.name == t.name) {
                return Err(ConfigError::DuplicateItemType(t.name.clone()));
            }
            if !t.intensity.is_finite() {
                return Err(ConfigError::NonFinite(format!("intensity of `{}`", t.name)));
            }
        }

        let reach = self.patch_size / 2;
        for rule in &self.interactions {
            for name in [&rule.first, &rule.second] {
                if self.type_index(name).is_none() {
                    return Err(ConfigError::UnknownItemType(name.clone()));
                }
            }
            let label = format!("{}/{}", rule.first, rule.second);
            if !rule.energy.is_finite() {
                return Err(ConfigError::NonFinite(format!("energy of {label}")));
            }
            if !rule.radius.is_finite() || rule.radius < 0.0 {
                return Err(ConfigError::NonFinite(format!("radius of {label}")));
            }
            if rule.radius > reach as f32 {
                return Err(ConfigError::InteractionOutOfRange {
                    first: rule.first.clone(),
                    second: rule.second.clone(),
                    radius: rule.radius,
                    reach,
                });
            }
        }
        Ok(())
    }

    pub fn item_type_count(&self) -> u32 {
        self.item_types.len() as u32
    }

    pub fn type_index(&self, name: &str) -> Option<ItemType> {
        self.item_types
            .iter()
            .position(|t| t.name == name)
            .map(|i| i as ItemType)
    }

    pub fn type_names(&self) -> Vec<String> {
        self.item_types.iter().map(|t| t.name.clone()).collect()
    }

    pub fn build_energy(&self) -> Result<TableEnergy, ConfigError> {
        self.validate()?;
        let mut energy = TableEnergy::new(self.item_types.iter().map(|t| t.intensity).collect());
        for rule in &self.interactions {
            let lookup = |name: &str| {
                self.type_index(name)
                    .ok_or_else(|| ConfigError::UnknownItemType(name.to_string()))
            };
            energy.add_rule(PairRule {
                first: lookup(rule.first.as_str())?,
                second: lookup(rule.second.as_str())?,
                radius: rule.radius,
                energy: rule.energy,
            });
        }
        Ok(energy)
    }

    pub fn region_positions(&self) -> Vec<Position> {
        self.region.positions()
    }

    /// A map with an empty patch at every region position.
    pub fn build_map(&self) -> Result<PatchMap<TableEnergy>, ConfigError> {
        let mut map = PatchMap::new(self.patch_size, self.build_energy()?);
        for position in self.region_positions() {
            map.get_or_make_patch(position);
        }
        debug!(
            patches = map.patch_count(),
            patch_size = self.patch_size,
            "built world map"
        );
        Ok(map)
    }
}
