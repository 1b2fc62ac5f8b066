// Error taxonomy for the sampler and its world-map collaborator.
//
// Configuration errors (`NoItemTypes`, `ZeroPatchSize`) are raised when a
// `GibbsField` is constructed; `DegenerateRng` when a sweep starts. Lookup
// failures abort the sweep in progress. A failing update never mutates the
// world: every lookup happens before the first item is removed or added.

use crate::types::Position;
use thiserror::Error;

/// Failure reported by a `WorldMap` when it cannot resolve a neighborhood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NeighborhoodError {
    /// The patch that should own the position is not in the map.
    #[error("no patch at {patch} to own world position {world}")]
    MissingPatch { world: Position, patch: Position },

    /// The map returned a neighborhood whose `patch_index` names none of
    /// its patches.
    #[error("neighborhood of {world} has no owning patch")]
    NoOwner { world: Position },
}

/// Errors returned by `GibbsField` construction and sampling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GibbsError {
    #[error("item type count must be at least 1")]
    NoItemTypes,

    #[error("patch size must be at least 1")]
    ZeroPatchSize,

    /// The random source's maximum is zero, so no uniform float can be formed.
    #[error("random source reports a maximum value of zero")]
    DegenerateRng,

    #[error("could not resolve the neighborhood of {position}")]
    Neighborhood {
        position: Position,
        #[source]
        source: NeighborhoodError,
    },

    /// A patch named by the neighborhood was gone when the update was applied.
    #[error("patch {position} is missing from the world map")]
    MissingPatch { position: Position },
}
