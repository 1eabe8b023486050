//! Pareto archive of non-dominated solutions with crowding-distance scores.

use serde::{Deserialize, Serialize};

use crate::schema::Direction;

use super::dominance::dominates;

/// A non-dominated solution held by the archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    /// Insertion sequence number, unique within the archive's lifetime.
    pub id: u64,
    pub position: Vec<f64>,
    pub fitness: Vec<f64>,
    /// Density estimate; boundary entries are infinite.
    #[serde(with = "infinite_as_null")]
    pub crowding_distance: f64,
}

/// Incrementally maintained non-dominated set.
///
/// Entries are kept in insertion order, which is also the tie-break order for
/// crowding-distance pruning and the stable order used by round-robin leader
/// selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParetoArchive {
    entries: Vec<ArchiveEntry>,
    directions: Vec<Direction>,
    max_size: Option<usize>,
    next_id: u64,
}

impl ParetoArchive {
    /// Create an empty archive.
    pub fn new(directions: Vec<Direction>, max_size: Option<usize>) -> Self {
        Self {
            entries: Vec::new(),
            directions,
            max_size,
            next_id: 0,
        }
    }

    /// Offer a single candidate. Returns true if it was admitted.
    pub fn insert(&mut self, position: &[f64], fitness: &[f64]) -> bool {
        let admitted = self.admit(position, fitness);
        if admitted {
            self.recompute_crowding();
            self.prune();
        }
        admitted
    }

    /// Fold a batch of evaluated candidates, in order.
    ///
    /// Crowding distances are recomputed once membership settles, then the
    /// archive is pruned to its maximum size. Returns the number of
    /// candidates admitted.
    pub fn fold<'a, I>(&mut self, candidates: I) -> usize
    where
        I: IntoIterator<Item = (&'a [f64], &'a [f64])>,
    {
        let admitted = candidates
            .into_iter()
            .filter(|(position, fitness)| self.admit(position, fitness))
            .count();

        if admitted > 0 {
            self.recompute_crowding();
            let pruned = self.prune();
            log::debug!(
                "Archive admitted {} candidates, pruned {}, size {}",
                admitted,
                pruned,
                self.entries.len()
            );
        }
        admitted
    }

    /// Membership update without rescoring.
    fn admit(&mut self, position: &[f64], fitness: &[f64]) -> bool {
        let directions = &self.directions;
        let rejected = self
            .entries
            .iter()
            .any(|e| e.position == position || dominates(&e.fitness, fitness, directions));
        if rejected {
            return false;
        }

        self.entries
            .retain(|e| !dominates(fitness, &e.fitness, directions));
        self.entries.push(ArchiveEntry {
            id: self.next_id,
            position: position.to_vec(),
            fitness: fitness.to_vec(),
            crowding_distance: 0.0,
        });
        self.next_id += 1;
        true
    }

    /// Recompute every entry's crowding distance.
    pub fn recompute_crowding(&mut self) {
        let fitnesses: Vec<&[f64]> = self.entries.iter().map(|e| e.fitness.as_slice()).collect();
        let distances = crowding_distances(&fitnesses);
        for (entry, distance) in self.entries.iter_mut().zip(distances) {
            entry.crowding_distance = distance;
        }
    }

    /// Drop lowest-crowding entries until the size limit holds.
    fn prune(&mut self) -> usize {
        let Some(max_size) = self.max_size else {
            return 0;
        };

        let mut removed = 0;
        while self.entries.len() > max_size {
            // min_by keeps the first of equal minima: earliest insertion loses.
            let victim = self
                .entries
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| a.crowding_distance.total_cmp(&b.crowding_distance))
                .map(|(i, _)| i);
            let Some(victim) = victim else {
                break;
            };
            self.entries.remove(victim);
            self.recompute_crowding();
            removed += 1;
        }
        removed
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&ArchiveEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArchiveEntry> {
        self.entries.iter()
    }

    /// Fitness vectors of all entries.
    pub fn fitnesses(&self) -> Vec<Vec<f64>> {
        self.entries.iter().map(|e| e.fitness.clone()).collect()
    }

    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// NSGA-II crowding distance for a set of fitness vectors.
///
/// Per objective, entries are sorted by value (index order breaks ties); the
/// two extremes get infinite distance and every interior entry accumulates
/// the normalized gap between its neighbours. Objectives with zero range
/// contribute nothing. Sets of two or fewer are all infinite.
pub fn crowding_distances(fitnesses: &[&[f64]]) -> Vec<f64> {
    let n = fitnesses.len();
    if n <= 2 {
        return vec![f64::INFINITY; n];
    }

    let num_objectives = fitnesses[0].len();
    let mut distances = vec![0.0f64; n];
    let mut order: Vec<usize> = (0..n).collect();

    for obj in 0..num_objectives {
        order.sort_by(|&a, &b| {
            fitnesses[a][obj]
                .total_cmp(&fitnesses[b][obj])
                .then(a.cmp(&b))
        });

        let (first, last) = (order[0], order[n - 1]);
        distances[first] = f64::INFINITY;
        distances[last] = f64::INFINITY;

        let range = fitnesses[last][obj] - fitnesses[first][obj];
        if !(range.is_finite() && range > 0.0) {
            continue;
        }

        for w in order.windows(3) {
            let gap = (fitnesses[w[2]][obj] - fitnesses[w[0]][obj]) / range;
            if gap.is_finite() {
                distances[w[1]] += gap;
            }
        }
    }

    distances
}

/// Serde adapter that stores infinite distances as JSON `null`.
mod infinite_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_some(value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}
