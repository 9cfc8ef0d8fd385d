//! Percentile-based directed Hausdorff comparison of two ordered point
//! sequences under great-circle distance, used by the classifier to decide
//! whether two trips retrace each other closely enough to be considered the
//! "same" physical path.

use std::cell::RefCell;
use std::collections::HashMap;

use utility::geo::distance_to_segment_m;

pub type Point = (f64, f64);

/// A trip's ordered sequence of stop locations, identified by a pointer-like
/// key so that trips sharing an identical stop-shape can reuse one cache
/// entry (see the block grouper's shape deduplication).
pub type ShapeId = usize;

/// Computes `{min_{segment s of other} dist(p, s) | p in shape}`, i.e. the
/// directed distance set from `shape` to `other`.
fn directed_distances(shape: &[Point], other: &[Point]) -> Vec<f64> {
    shape
        .iter()
        .map(|&point| {
            if other.len() < 2 {
                return other
                    .first()
                    .map(|&(olat, olon)| {
                        utility::geo::haversine_distance(point.0, point.1, olat, olon) * 1000.0
                    })
                    .unwrap_or(f64::INFINITY);
            }
            other
                .windows(2)
                .map(|seg| distance_to_segment_m(point, seg[0], seg[1]))
                .fold(f64::INFINITY, f64::min)
        })
        .collect()
}

/// Linear-interpolation percentile estimator: `index = p * (N + 1)`,
/// 1-based, clamped to the sorted slice's bounds.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let n = sorted.len();
    let rank = p * (n as f64 + 1.0);
    if rank <= 1.0 {
        return sorted[0];
    }
    if rank >= n as f64 {
        return sorted[n - 1];
    }
    let lower = rank.floor() as usize;
    let frac = rank - lower as f64;
    let lower_value = sorted[lower - 1];
    let upper_value = sorted[lower];
    lower_value + frac * (upper_value - lower_value)
}

/// Directed Hausdorff distance between two stop-shapes at the given
/// percentile: the two directed distance sets are concatenated, sorted, and
/// the percentile is read off with linear interpolation.
pub fn hausdorff_percentile(a: &[Point], b: &[Point], p: f64) -> f64 {
    let mut distances = directed_distances(a, b);
    distances.extend(directed_distances(b, a));
    distances.sort_by(|x, y| x.partial_cmp(y).unwrap());
    percentile(&distances, p)
}

/// Caches `hausdorff_percentile` results keyed by the unordered pair of
/// shape identities, since the classifier may re-compare the same two
/// shapes many times across a large block.
#[derive(Default)]
pub struct SimilarityCache {
    cache: RefCell<HashMap<(ShapeId, ShapeId, u64), f64>>,
}

impl SimilarityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(
        &self,
        id_a: ShapeId,
        shape_a: &[Point],
        id_b: ShapeId,
        shape_b: &[Point],
        percentile: f64,
    ) -> f64 {
        let key = if id_a <= id_b {
            (id_a, id_b, percentile.to_bits())
        } else {
            (id_b, id_a, percentile.to_bits())
        };
        if let Some(value) = self.cache.borrow().get(&key) {
            return *value;
        }
        let value = hausdorff_percentile(shape_a, shape_b, percentile);
        self.cache.borrow_mut().insert(key, value);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_shapes_have_zero_distance() {
        let shape = vec![(52.0, 13.0), (52.1, 13.1), (52.2, 13.2)];
        assert!((hausdorff_percentile(&shape, &shape, 0.9) - 0.0).abs() < 1e-6);
    }

    #[test]
    fn percentile_is_monotonic() {
        let a = vec![(52.0, 13.0), (52.1, 13.1)];
        let b = vec![(53.0, 14.0), (53.1, 14.1)];
        let low = hausdorff_percentile(&a, &b, 0.1);
        let high = hausdorff_percentile(&a, &b, 0.9);
        assert!(high >= low);
    }

    #[test]
    fn cache_returns_consistent_results_regardless_of_order() {
        let cache = SimilarityCache::new();
        let a = vec![(52.0, 13.0), (52.1, 13.1)];
        let b = vec![(53.0, 14.0), (53.1, 14.1)];
        let first = cache.get_or_compute(1, &a, 2, &b, 0.9);
        let second = cache.get_or_compute(2, &b, 1, &a, 0.9);
        assert_eq!(first, second);
    }
}
