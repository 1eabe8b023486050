//! Leader selection from the Pareto archive.
//!
//! RNG use per call: `Random` and both weighted variants consume exactly one
//! draw; `RoundRobin` and any call against an empty archive consume none.

use crate::schema::{TopologyConfig, TopologyKind};

use super::archive::{ArchiveEntry, ParetoArchive};
use super::rng::SwarmRng;

/// Guards the inverse weight of zero-distance entries.
const MIN_DISTANCE: f64 = 1e-12;

/// Leader-selection policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Topology {
    kind: TopologyKind,
    boundary_distance: f64,
}

impl Topology {
    pub fn new(config: &TopologyConfig) -> Self {
        Self {
            kind: config.kind,
            boundary_distance: config.boundary_distance,
        }
    }

    /// Pick the leader for `particle` at `iteration`.
    ///
    /// Returns `None` when the archive is empty; callers then follow the
    /// particle's own personal best.
    pub fn select<'a>(
        &self,
        particle: usize,
        iteration: usize,
        archive: &'a ParetoArchive,
        rng: &mut SwarmRng,
    ) -> Option<&'a ArchiveEntry> {
        if archive.is_empty() {
            return None;
        }
        let len = archive.len();

        let index = match self.kind {
            TopologyKind::Random => rng.index(len),
            TopologyKind::RoundRobin => (particle + iteration) % len,
            TopologyKind::LowerWeightedCrowdingDistance => {
                let weights: Vec<f64> = archive
                    .iter()
                    .map(|e| 1.0 / self.finite_distance(e).max(MIN_DISTANCE))
                    .collect();
                rng.weighted_index(&weights)
            }
            TopologyKind::HigherWeightedCrowdingDistance => {
                let weights: Vec<f64> = archive.iter().map(|e| self.finite_distance(e)).collect();
                rng.weighted_index(&weights)
            }
        };

        archive.get(index)
    }

    /// Crowding distance with boundary entries capped to a finite value.
    fn finite_distance(&self, entry: &ArchiveEntry) -> f64 {
        if entry.crowding_distance.is_finite() {
            entry.crowding_distance
        } else {
            self.boundary_distance
        }
    }
}
