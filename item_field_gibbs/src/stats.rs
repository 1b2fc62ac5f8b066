// Per-update outcomes and their per-sweep tally.

use crate::types::ItemType;
use serde::{Deserialize, Serialize};

/// What a single-site update did to its cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellOutcome {
    /// The drawn state equals the current one. Nothing was touched.
    Unchanged,
    Added(ItemType),
    Removed(ItemType),
    Replaced { from: ItemType, to: ItemType },
    /// The conditional distribution was NaN or infinite; the cell was left alone.
    SkippedNonFinite,
}

/// Counts of update outcomes over one or more sweeps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepStats {
    pub updates: u64,
    pub unchanged: u64,
    pub added: u64,
    pub removed: u64,
    pub replaced: u64,
    pub skipped_non_finite: u64,
}

impl SweepStats {
    pub fn record(&mut self, outcome: CellOutcome) {
        self.updates += 1;
        match outcome {
            CellOutcome::Unchanged => self.unchanged += 1,
            CellOutcome::Added(_) => self.added += 1,
            CellOutcome::Removed(_) => self.removed += 1,
            CellOutcome::Replaced { .. } => self.replaced += 1,
            CellOutcome::SkippedNonFinite => self.skipped_non_finite += 1,
        }
    }

    pub fn merge(&mut self, other: &SweepStats) {
        self.updates += other.updates;
        self.unchanged += other.unchanged;
        self.added += other.added;
        self.removed += other.removed;
        self.replaced += other.replaced;
        self.skipped_non_finite += other.skipped_non_finite;
    }

    /// Updates that modified the world.
    pub fn changed(&self) -> u64 {
        self.added + self.removed + self.replaced
    }

    /// Fraction of updates that modified the world, or 0 with no updates.
    pub fn change_rate(&self) -> f64 {
        if self.updates == 0 {
            0.0
        } else {
            self.changed() as f64 / self.updates as f64
        }
    }
}
