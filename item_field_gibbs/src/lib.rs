// item_field_gibbs: the Gibbs sampling core.
//
// Places discrete item tokens on a 2D grid of fixed-size square patches by
// repeatedly resampling single cells from their exact conditional
// distribution under a pairwise Markov Random Field energy. The crate owns
// no world state: it is generic over the world map, patch, item, energy
// model, and random source it is handed.
//
// Module overview:
// - `types.rs`:       Position (world/patch coordinates) and ItemType.
// - `map.rs`:         WorldMap / Patch / FieldItem traits and Neighborhood.
// - `energy.rs`:      EnergyModel trait plus FlatEnergy and closure-backed EnergyFn.
// - `categorical.rs`: Uniform draws, stable softmax, inverse-CDF categorical draw.
// - `sampler.rs`:     GibbsField: sweep scheduling, conditional distribution,
//                     occupancy mutation.
// - `stats.rs`:       CellOutcome / SweepStats bookkeeping.
// - `error.rs`:       GibbsError and NeighborhoodError.
// - `prng`:           Re-exported from `item_field_prng` (RandomSource, FieldRng).
//
// **Critical constraint: sequential updates.** Each single-site update reads
// the world as left by the previous one. Updates are never batched or run in
// parallel; doing so samples a different Markov chain.

pub mod categorical;
pub mod energy;
pub mod error;
pub mod map;
pub use item_field_prng as prng;
pub mod sampler;
pub mod stats;
pub mod types;

pub use energy::{EnergyFn, EnergyModel, FlatEnergy};
pub use error::{GibbsError, NeighborhoodError};
pub use map::{FieldItem, Neighborhood, Patch, WorldMap};
pub use sampler::GibbsField;
pub use stats::{CellOutcome, SweepStats};
pub use types::{ItemType, Position};
