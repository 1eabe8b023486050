//! Quality indicators over a final Pareto front.
//!
//! All indicators work in minimization space: maximized objectives are
//! negated before distances or volumes are computed.

use crate::schema::Direction;

use super::dominance::normalized;

/// Generational distance: how far the front lies from the reference set.
///
/// `sqrt(sum d_i^2) / n` where `d_i` is the Euclidean distance from front
/// member `i` to its nearest reference point. Returns `None` if either set
/// is empty.
pub fn generational_distance(
    front: &[Vec<f64>],
    reference: &[Vec<f64>],
    directions: &[Direction],
) -> Option<f64> {
    mean_nearest_distance(front, reference, directions)
}

/// Inverted generational distance: how well the front covers the reference set.
///
/// Same formula as [`generational_distance`] with the roles swapped.
pub fn inverted_generational_distance(
    front: &[Vec<f64>],
    reference: &[Vec<f64>],
    directions: &[Direction],
) -> Option<f64> {
    mean_nearest_distance(reference, front, directions)
}

fn mean_nearest_distance(
    from: &[Vec<f64>],
    to: &[Vec<f64>],
    directions: &[Direction],
) -> Option<f64> {
    if from.is_empty() || to.is_empty() {
        return None;
    }

    let to: Vec<Vec<f64>> = to.iter().map(|p| normalized(p, directions)).collect();
    let sum_sq: f64 = from
        .iter()
        .map(|p| {
            let p = normalized(p, directions);
            to.iter()
                .map(|q| squared_distance(&p, q))
                .fold(f64::INFINITY, f64::min)
        })
        .sum();

    Some(sum_sq.sqrt() / from.len() as f64)
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Hypervolume dominated by the front and bounded by `reference_point`.
///
/// Points that do not strictly dominate the reference point are ignored.
/// Uses recursive slicing on the last objective.
pub fn hypervolume(front: &[Vec<f64>], reference_point: &[f64], directions: &[Direction]) -> f64 {
    let reference = normalized(reference_point, directions);
    let points: Vec<Vec<f64>> = front
        .iter()
        .map(|p| normalized(p, directions))
        .filter(|p| p.iter().zip(&reference).all(|(v, r)| v < r))
        .collect();

    if points.is_empty() || reference.is_empty() {
        return 0.0;
    }
    slice_volume(&points, &reference)
}

fn slice_volume(points: &[Vec<f64>], reference: &[f64]) -> f64 {
    let d = reference.len();

    if d == 1 {
        let best = points.iter().map(|p| p[0]).fold(f64::INFINITY, f64::min);
        return (reference[0] - best).max(0.0);
    }
    if points.len() == 1 {
        return points[0]
            .iter()
            .zip(reference)
            .map(|(p, r)| (r - p).max(0.0))
            .product();
    }

    let mut sorted: Vec<&Vec<f64>> = points.iter().collect();
    sorted.sort_by(|a, b| a[d - 1].total_cmp(&b[d - 1]));

    let sub_reference = &reference[..d - 1];
    let mut volume = 0.0;
    for i in 0..sorted.len() {
        let next = sorted
            .get(i + 1)
            .map_or(reference[d - 1], |p| p[d - 1]);
        let height = next - sorted[i][d - 1];
        if height <= 0.0 {
            continue;
        }

        let projected: Vec<Vec<f64>> = sorted[..=i].iter().map(|p| p[..d - 1].to_vec()).collect();
        volume += height * slice_volume(&non_dominated(projected), sub_reference);
    }
    volume
}

/// Non-dominated subset in minimization space.
fn non_dominated(points: Vec<Vec<f64>>) -> Vec<Vec<f64>> {
    let dominated = |p: &[f64]| {
        points.iter().any(|q| {
            q.iter().zip(p).all(|(a, b)| a <= b) && q.iter().zip(p).any(|(a, b)| a < b)
        })
    };
    points
        .iter()
        .filter(|p| !dominated(p.as_slice()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN2: [Direction; 2] = [Direction::Minimize, Direction::Minimize];

    #[test]
    fn test_gd_zero_on_reference() {
        let front = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        assert_eq!(generational_distance(&front, &front, &MIN2), Some(0.0));
        assert_eq!(inverted_generational_distance(&front, &front, &MIN2), Some(0.0));
    }

    #[test]
    fn test_gd_and_igd_values() {
        let front = vec![vec![0.0, 2.0]];
        let reference = vec![vec![0.0, 1.0], vec![3.0, 1.0]];
        // Nearest distance from (0,2) is 1.
        assert_eq!(generational_distance(&front, &reference, &MIN2), Some(1.0));
        // Reference points are 1 and sqrt(10) away: sqrt(1 + 10) / 2.
        let igd = inverted_generational_distance(&front, &reference, &MIN2).unwrap();
        assert!((igd - 11f64.sqrt() / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_sets() {
        assert_eq!(generational_distance(&[], &[vec![1.0]], &[Direction::Minimize]), None);
        assert_eq!(hypervolume(&[], &[1.0, 1.0], &MIN2), 0.0);
    }

    #[test]
    fn test_hypervolume_2d() {
        let front = vec![vec![1.0, 3.0], vec![2.0, 2.0], vec![3.0, 1.0]];
        // Staircase under (4, 4): 3 + 2 + 1.
        assert!((hypervolume(&front, &[4.0, 4.0], &MIN2) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_hypervolume_maximize() {
        let dirs = [Direction::Maximize, Direction::Maximize];
        let front = vec![vec![3.0, 3.0]];
        assert!((hypervolume(&front, &[0.0, 0.0], &dirs) - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_hypervolume_3d() {
        let dirs = [Direction::Minimize; 3];
        let front = vec![vec![0.0, 0.0, 0.0]];
        assert!((hypervolume(&front, &[1.0, 2.0, 3.0], &dirs) - 6.0).abs() < 1e-12);

        let front = vec![vec![0.0, 1.0, 1.0], vec![1.0, 0.0, 1.0], vec![1.0, 1.0, 0.0]];
        // Three 2x1x1 boxes, pairwise and triple overlaps of the unit cube at (1,1,1).
        let hv = hypervolume(&front, &[2.0, 2.0, 2.0], &dirs);
        assert!((hv - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_points_outside_reference_ignored() {
        let front = vec![vec![5.0, 0.0], vec![1.0, 1.0]];
        assert!((hypervolume(&front, &[2.0, 2.0], &MIN2) - 1.0).abs() < 1e-12);
    }
}
