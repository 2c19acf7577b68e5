//! UMAP projection to two dimensions.
//!
//! # The Algorithm (McInnes, Healy & Melville, 2018)
//!
//! 1. **Local metric**: for each point find its k nearest neighbors. `rho` is
//!    the distance to the nearest non-identical neighbor, `sigma` is chosen by
//!    binary search so that
//!
//!    ```text
//!    Σ_j exp(-(d_ij - rho_i) / sigma_i) = log2(k + 1)
//!    ```
//!
//! 2. **Fuzzy union**: directed memberships w_ij are symmetrized as
//!    `w_ij + w_ji - w_ij·w_ji`.
//!
//! 3. **Layout**: points start at seeded random positions and are moved by
//!    SGD. Edges attract with the low-dimensional kernel `1 / (1 + a·d^(2b))`;
//!    randomly sampled non-neighbors repel. `a` and `b` are fitted so the
//!    kernel approximates a curve that is flat up to `min_dist` and decays
//!    with scale `spread`.
//!
//! Neighbor search is exact (O(n²)); skill matrices are modest in size.
//! With a fixed seed the layout is fully deterministic.

use std::collections::BTreeMap;

use ndarray::{ArrayView1, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result, Stage};

const SMOOTH_K_TOLERANCE: f64 = 1e-5;
const MIN_K_DIST_SCALE: f64 = 1e-3;
const BINARY_SEARCH_STEPS: usize = 64;
const GRADIENT_CLIP: f64 = 4.0;
const INIT_RANGE: f64 = 10.0;

/// One (x, y) pair per matrix row, in row order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Embedding2D {
    points: Vec<[f64; 2]>,
}

impl Embedding2D {
    /// Wrap precomputed coordinates.
    pub fn new(points: Vec<[f64; 2]>) -> Self {
        Self { points }
    }

    /// Coordinates in row order.
    pub fn points(&self) -> &[[f64; 2]] {
        &self.points
    }

    /// Number of rows projected.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether no rows were projected.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// UMAP reducer with a fixed two-dimensional output.
#[derive(Debug, Clone)]
pub struct Umap {
    n_neighbors: usize,
    min_dist: f64,
    spread: f64,
    n_epochs: usize,
    learning_rate: f64,
    negative_sample_rate: usize,
    seed: u64,
}

impl Umap {
    /// Create a reducer with the given neighborhood size and minimum distance.
    pub fn new(n_neighbors: usize, min_dist: f64) -> Self {
        Self {
            n_neighbors,
            min_dist,
            ..Self::default()
        }
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of optimization epochs.
    pub fn with_n_epochs(mut self, n_epochs: usize) -> Self {
        self.n_epochs = n_epochs;
        self
    }

    /// Set the effective scale of embedded points.
    pub fn with_spread(mut self, spread: f64) -> Self {
        self.spread = spread;
        self
    }

    /// Set the initial SGD learning rate.
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set negative samples drawn per positive sample.
    pub fn with_negative_sample_rate(mut self, rate: usize) -> Self {
        self.negative_sample_rate = rate;
        self
    }

    fn validate(&self) -> Result<()> {
        let bad = |name: &'static str, message: &str| {
            Err(Error::invalid_parameter(Stage::Reduce, name, message))
        };
        if self.n_neighbors < 2 {
            return bad("n_neighbors", "must be at least 2");
        }
        if !(self.min_dist.is_finite() && self.min_dist >= 0.0) {
            return bad("min_dist", "must be non-negative");
        }
        if !(self.spread.is_finite() && self.spread > 0.0) {
            return bad("spread", "must be positive");
        }
        if self.min_dist > self.spread {
            return bad("min_dist", "must not exceed spread");
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return bad("learning_rate", "must be positive");
        }
        Ok(())
    }

    /// Project rows to 2D.
    ///
    /// Zero rows give an empty embedding and a single row sits at the origin.
    pub fn fit_transform(&self, data: ArrayView2<'_, f64>) -> Result<Embedding2D> {
        self.validate()?;

        let n = data.nrows();
        match n {
            0 => return Ok(Embedding2D::new(Vec::new())),
            1 => return Ok(Embedding2D::new(vec![[0.0, 0.0]])),
            _ => {}
        }

        let k = (self.n_neighbors - 1).min(n - 1);
        let knn = nearest_neighbors(data, k);
        let graph = fuzzy_union(&knn, k);
        let (a, b) = fit_curve(self.min_dist, self.spread);
        debug!(rows = n, k, edges = graph.len(), a, b, "umap graph built");

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut points: Vec<[f64; 2]> = (0..n)
            .map(|_| {
                [
                    rng.random_range(-INIT_RANGE..INIT_RANGE),
                    rng.random_range(-INIT_RANGE..INIT_RANGE),
                ]
            })
            .collect();

        self.optimize_layout(&mut points, &graph, a, b, &mut rng);

        if points.iter().flatten().any(|v| !v.is_finite()) {
            return Err(Error::algorithm_failure(
                Stage::Reduce,
                "layout diverged to non-finite coordinates",
            ));
        }

        Ok(Embedding2D::new(points))
    }

    fn optimize_layout(
        &self,
        points: &mut [[f64; 2]],
        graph: &[(usize, usize, f64)],
        a: f64,
        b: f64,
        rng: &mut ChaCha8Rng,
    ) {
        let n = points.len();
        let max_w = graph.iter().map(|e| e.2).fold(0.0, f64::max);
        if max_w <= 0.0 || self.n_epochs == 0 {
            return;
        }

        // Edges too weak to be sampled even once are dropped.
        let floor = max_w / self.n_epochs as f64;
        let edges: Vec<(usize, usize, f64)> = graph
            .iter()
            .copied()
            .filter(|e| e.2 >= floor)
            .flat_map(|(i, j, w)| [(i, j, w), (j, i, w)])
            .collect();

        let neg_rate = self.negative_sample_rate.max(1) as f64;
        let epochs_per_sample: Vec<f64> = edges.iter().map(|e| max_w / e.2).collect();
        let epochs_per_negative: Vec<f64> = epochs_per_sample.iter().map(|e| e / neg_rate).collect();
        let mut next_sample = epochs_per_sample.clone();
        let mut next_negative = epochs_per_negative.clone();

        for epoch in 0..self.n_epochs {
            let now = epoch as f64;
            let alpha = self.learning_rate * (1.0 - now / self.n_epochs as f64);

            for (e, &(i, j, _)) in edges.iter().enumerate() {
                if next_sample[e] > now {
                    continue;
                }

                let d2 = dist2(points[i], points[j]);
                if d2 > 0.0 {
                    let coeff = -2.0 * a * b * d2.powf(b - 1.0) / (a * d2.powf(b) + 1.0);
                    for dim in 0..2 {
                        let grad = clip(coeff * (points[i][dim] - points[j][dim]));
                        points[i][dim] += grad * alpha;
                        points[j][dim] -= grad * alpha;
                    }
                }
                next_sample[e] += epochs_per_sample[e];

                let n_neg = ((now - next_negative[e]) / epochs_per_negative[e]).floor().max(0.0) as usize;
                for _ in 0..n_neg {
                    let other = rng.random_range(0..n);
                    if other == i {
                        continue;
                    }
                    let d2 = dist2(points[i], points[other]);
                    for dim in 0..2 {
                        let grad = if d2 > 0.0 {
                            let coeff = 2.0 * b / ((0.001 + d2) * (a * d2.powf(b) + 1.0));
                            clip(coeff * (points[i][dim] - points[other][dim]))
                        } else {
                            GRADIENT_CLIP
                        };
                        points[i][dim] += grad * alpha;
                    }
                }
                next_negative[e] += n_neg as f64 * epochs_per_negative[e];
            }
        }
    }
}

impl Default for Umap {
    fn default() -> Self {
        Self {
            n_neighbors: 15,
            min_dist: 0.1,
            spread: 1.0,
            n_epochs: 200,
            learning_rate: 1.0,
            negative_sample_rate: 5,
            seed: 42,
        }
    }
}

#[inline]
fn clip(v: f64) -> f64 {
    v.clamp(-GRADIENT_CLIP, GRADIENT_CLIP)
}

#[inline]
fn dist2(p: [f64; 2], q: [f64; 2]) -> f64 {
    (p[0] - q[0]).powi(2) + (p[1] - q[1]).powi(2)
}

#[inline]
fn euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Exact k nearest neighbors of every row, self excluded, ordered by
/// (distance, index).
fn nearest_neighbors(data: ArrayView2<'_, f64>, k: usize) -> Vec<Vec<(usize, f64)>> {
    let n = data.nrows();
    (0..n)
        .map(|i| {
            let mut dists: Vec<(usize, f64)> = (0..n)
                .filter(|&j| j != i)
                .map(|j| (j, euclidean(data.row(i), data.row(j))))
                .collect();
            dists.sort_by(|x, y| x.1.total_cmp(&y.1).then(x.0.cmp(&y.0)));
            dists.truncate(k);
            dists
        })
        .collect()
}

/// Smooth kNN memberships, symmetrized by fuzzy union. Returns (i, j, w) with i < j.
fn fuzzy_union(knn: &[Vec<(usize, f64)>], k: usize) -> Vec<(usize, usize, f64)> {
    let target = ((k + 1) as f64).log2();
    let global_mean = {
        let all: Vec<f64> = knn.iter().flatten().map(|e| e.1).collect();
        all.iter().sum::<f64>() / all.len().max(1) as f64
    };

    let mut directed: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for (i, neighbors) in knn.iter().enumerate() {
        let rho = neighbors
            .iter()
            .map(|e| e.1)
            .find(|&d| d > 0.0)
            .unwrap_or(0.0);
        let sigma = smooth_sigma(neighbors, rho, target, global_mean);

        for &(j, d) in neighbors {
            let delta = d - rho;
            let w = if delta <= 0.0 { 1.0 } else { (-delta / sigma).exp() };
            let _ = directed.insert((i, j), w);
        }
    }

    let mut union: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for (&(i, j), &w_ij) in &directed {
        let key = (i.min(j), i.max(j));
        if union.contains_key(&key) {
            continue;
        }
        let w_ji = directed.get(&(j, i)).copied().unwrap_or(0.0);
        let _ = union.insert(key, w_ij + w_ji - w_ij * w_ji);
    }

    union
        .into_iter()
        .filter(|&(_, w)| w > 0.0)
        .map(|((i, j), w)| (i, j, w))
        .collect()
}

fn smooth_sigma(neighbors: &[(usize, f64)], rho: f64, target: f64, global_mean: f64) -> f64 {
    let mut lo = 0.0;
    let mut hi = f64::INFINITY;
    let mut mid = 1.0;

    for _ in 0..BINARY_SEARCH_STEPS {
        let psum: f64 = neighbors
            .iter()
            .map(|&(_, d)| {
                let delta = d - rho;
                if delta > 0.0 {
                    (-delta / mid).exp()
                } else {
                    1.0
                }
            })
            .sum();

        if (psum - target).abs() < SMOOTH_K_TOLERANCE {
            break;
        }
        if psum > target {
            hi = mid;
            mid = (lo + hi) / 2.0;
        } else {
            lo = mid;
            mid = if hi.is_infinite() { mid * 2.0 } else { (lo + hi) / 2.0 };
        }
    }

    let local_mean = neighbors.iter().map(|e| e.1).sum::<f64>() / neighbors.len().max(1) as f64;
    let scale = if rho > 0.0 { local_mean } else { global_mean };
    mid.max(MIN_K_DIST_SCALE * scale).max(f64::MIN_POSITIVE)
}

/// Fit `a`, `b` so that `1 / (1 + a·x^(2b))` tracks the target curve.
fn fit_curve(min_dist: f64, spread: f64) -> (f64, f64) {
    let xs: Vec<f64> = (1..=300).map(|i| 3.0 * spread * i as f64 / 300.0).collect();
    let ys: Vec<f64> = xs
        .iter()
        .map(|&x| {
            if x < min_dist {
                1.0
            } else {
                (-(x - min_dist) / spread).exp()
            }
        })
        .collect();
    let loss = |a: f64, b: f64| -> f64 {
        xs.iter()
            .zip(ys.iter())
            .map(|(&x, &y)| (1.0 / (1.0 + a * x.powf(2.0 * b)) - y).powi(2))
            .sum()
    };

    // Coarse-to-fine grid search over (ln a, b).
    let (mut ln_a, mut b) = (0.5f64, 1.0f64);
    let (mut ln_a_step, mut b_step) = (1.0f64, 0.5f64);
    let mut best = loss(ln_a.exp(), b);
    for _ in 0..40 {
        let mut improved = false;
        for da in [-1.0, 0.0, 1.0] {
            for db in [-1.0, 0.0, 1.0] {
                let cand_a = ln_a + da * ln_a_step;
                let cand_b = (b + db * b_step).max(0.05);
                let l = loss(cand_a.exp(), cand_b);
                if l < best {
                    best = l;
                    ln_a = cand_a;
                    b = cand_b;
                    improved = true;
                }
            }
        }
        if !improved {
            ln_a_step /= 2.0;
            b_step /= 2.0;
        }
    }

    (ln_a.exp(), b)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn blobs() -> Array2<f64> {
        Array2::from_shape_fn((12, 3), |(i, j)| {
            let base = if i < 6 { 0.0 } else { 8.0 };
            base + ((i * 3 + j) % 5) as f64 * 0.1
        })
    }

    #[test]
    fn test_row_count_preserved() {
        let data = blobs();
        let emb = Umap::new(5, 0.1).fit_transform(data.view()).unwrap();
        assert_eq!(emb.len(), 12);
        assert!(emb.points().iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn test_deterministic_under_seed() {
        let data = blobs();
        let a = Umap::new(5, 0.1).with_seed(7).fit_transform(data.view()).unwrap();
        let b = Umap::new(5, 0.1).with_seed(7).fit_transform(data.view()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_separated_groups_stay_apart() {
        let data = blobs();
        let emb = Umap::new(5, 0.1).with_n_epochs(300).fit_transform(data.view()).unwrap();
        let p = emb.points();
        let (mut within, mut n_within, mut between, mut n_between) = (0.0, 0, 0.0, 0);
        for i in 0..12 {
            for j in (i + 1)..12 {
                let d = dist2(p[i], p[j]).sqrt();
                if (i < 6) == (j < 6) {
                    within += d;
                    n_within += 1;
                } else {
                    between += d;
                    n_between += 1;
                }
            }
        }
        assert!(between / n_between as f64 > within / n_within as f64);
    }

    #[test]
    fn test_degenerate_sizes() {
        let empty = Array2::<f64>::zeros((0, 3));
        assert!(Umap::default().fit_transform(empty.view()).unwrap().is_empty());

        let one = array![[1.0, 2.0]];
        assert_eq!(
            Umap::default().fit_transform(one.view()).unwrap().points(),
            &[[0.0, 0.0]]
        );

        let two = array![[0.0], [1.0]];
        assert_eq!(Umap::default().fit_transform(two.view()).unwrap().len(), 2);
    }

    #[test]
    fn test_identical_rows() {
        let data = Array2::<f64>::zeros((5, 2));
        let emb = Umap::new(3, 0.1).fit_transform(data.view()).unwrap();
        assert_eq!(emb.len(), 5);
        assert!(emb.points().iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn test_invalid_params() {
        let data = array![[0.0], [1.0]];
        assert!(Umap::new(1, 0.1).fit_transform(data.view()).is_err());
        assert!(Umap::new(5, -0.1).fit_transform(data.view()).is_err());
        assert!(Umap::new(5, 2.0).fit_transform(data.view()).is_err());
    }

    #[test]
    fn test_curve_fit_matches_known_defaults() {
        // Reference values for min_dist = 0.1, spread = 1.0: a ≈ 1.58, b ≈ 0.90.
        let (a, b) = fit_curve(0.1, 1.0);
        assert!((a - 1.58).abs() < 0.15, "a = {a}");
        assert!((b - 0.90).abs() < 0.08, "b = {b}");
    }
}
