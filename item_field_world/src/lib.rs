// item_field_world: concrete collaborators for the Gibbs sampler.
//
// Provides a patch-indexed 2D world that `item_field_gibbs::GibbsField` can
// run against, a data-driven energy model, and the JSON configuration that
// ties them together for the `populate` binary.
//
// Module overview:
// - `item.rs`:     PlacedItem: an item token with zeroed lifecycle metadata.
// - `patch.rs`:    ItemPatch: an unordered bag of items for one n×n block.
// - `map.rs`:      PatchMap: BTreeMap of patches, 2×2 neighborhood lookup.
// - `energy.rs`:   TableEnergy: per-type intensity plus radius-based pair rules.
// - `config.rs`:   WorldConfig: seed, region, types, and rules loaded from JSON.
// - `snapshot.rs`: WorldSnapshot: serializable dump of every placed item.
//
// **Critical constraint: determinism.** Patches live in a `BTreeMap`, so
// iteration order (and therefore snapshot output) depends only on the map's
// contents. All randomness comes from the `FieldRng` the caller supplies.

pub mod config;
pub mod energy;
pub mod item;
pub mod map;
pub mod patch;
pub mod snapshot;

pub use config::{ConfigError, WorldConfig};
pub use energy::TableEnergy;
pub use item::PlacedItem;
pub use map::PatchMap;
pub use patch::ItemPatch;
pub use snapshot::WorldSnapshot;
