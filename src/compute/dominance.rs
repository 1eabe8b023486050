//! Pareto dominance over fitness vectors with per-objective directions.

use crate::schema::Direction;

/// Returns true if fitness `a` Pareto-dominates fitness `b`.
///
/// Values are compared in minimization space: `a` must be no worse in every
/// objective and strictly better in at least one.
pub fn dominates(a: &[f64], b: &[f64], directions: &[Direction]) -> bool {
    debug_assert_eq!(a.len(), b.len());
    debug_assert_eq!(a.len(), directions.len());

    let mut strictly_better = false;
    for ((&av, &bv), dir) in a.iter().zip(b).zip(directions) {
        let (av, bv) = (dir.normalize(av), dir.normalize(bv));
        if av > bv {
            return false;
        }
        if av < bv {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Fitness vector mapped into minimization space.
pub fn normalized(fitness: &[f64], directions: &[Direction]) -> Vec<f64> {
    fitness
        .iter()
        .zip(directions)
        .map(|(&v, dir)| dir.normalize(v))
        .collect()
}
