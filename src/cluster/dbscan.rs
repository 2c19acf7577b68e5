//! Density clustering of employees (DBSCAN, Ester et al. 1996).
//!
//! An employee is **core** when at least `min_samples` rows, itself
//! included, lie within `eps` of it in standardized skill space. Core rows
//! within `eps` of each other share a cluster; a non-core row within `eps` of
//! some core row is a **border** row of that cluster; everything else is
//! [`NOISE`]. The cluster count falls out of the data.
//!
//! ## Order Independence
//!
//! The textbook expansion assigns a border point to whichever cluster reaches
//! it first, so the partition depends on row order. Here clusters are the
//! connected components of the core-point graph, and a border point joins the
//! cluster of its nearest core point (ties broken by the core point's
//! coordinates). Permuting rows permutes labels but never changes the
//! partition.
//!
//! Cost is O(n²) distance evaluations, fine for team-sized matrices.

use std::cmp::Ordering;
use std::collections::HashMap;

use ndarray::{ArrayView1, ArrayView2};

use super::traits::{ClusterLabeling, Clustering, NOISE};
use crate::error::{Error, Result, Stage};

/// DBSCAN over Euclidean distance.
#[derive(Debug, Clone)]
pub struct Dbscan {
    eps: f64,
    min_samples: usize,
}

impl Dbscan {
    /// Neighborhood radius `eps`; `min_samples` counts the row itself.
    pub fn new(eps: f64, min_samples: usize) -> Self {
        Self { eps, min_samples }
    }

    /// Replace the neighborhood radius.
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    /// Set minimum neighborhood size.
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    /// Neighborhood radius.
    pub fn eps(&self) -> f64 {
        self.eps
    }

    /// Minimum neighborhood size.
    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    fn validate(&self) -> Result<()> {
        if !(self.eps.is_finite() && self.eps > 0.0) {
            return Err(Error::invalid_parameter(
                Stage::Cluster,
                "eps",
                "must be positive and finite",
            ));
        }
        if self.min_samples == 0 {
            return Err(Error::invalid_parameter(
                Stage::Cluster,
                "min_samples",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Euclidean distance between two rows.
    #[inline]
    fn distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// All neighbors within epsilon (excluding the point itself), with distances.
    fn region_query(&self, data: ArrayView2<'_, f64>, point_idx: usize) -> Vec<(usize, f64)> {
        let point = data.row(point_idx);
        data.outer_iter()
            .enumerate()
            .filter(|(idx, _)| *idx != point_idx)
            .filter_map(|(idx, other)| {
                let d = Self::distance(point, other);
                (d <= self.eps).then_some((idx, d))
            })
            .collect()
    }
}

/// Lexicographic order on coordinates; the row-order-free tie breaker.
fn cmp_coords(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> Ordering {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

impl Default for Dbscan {
    fn default() -> Self {
        Self::new(0.5, 5)
    }
}

impl Clustering for Dbscan {
    fn fit_predict(&self, data: ArrayView2<'_, f64>) -> Result<ClusterLabeling> {
        self.validate()?;

        let n = data.nrows();
        if n < 2 {
            return Ok(ClusterLabeling::all_zero(n));
        }

        let neighborhoods: Vec<Vec<(usize, f64)>> =
            (0..n).map(|i| self.region_query(data, i)).collect();

        // min_samples includes the point itself
        let is_core: Vec<bool> = neighborhoods
            .iter()
            .map(|nb| nb.len() + 1 >= self.min_samples)
            .collect();

        // Connected components of the core graph.
        let mut component = vec![usize::MAX; n];
        let mut n_components = 0;
        for start in 0..n {
            if !is_core[start] || component[start] != usize::MAX {
                continue;
            }
            component[start] = n_components;
            let mut to_process = vec![start];
            while let Some(p) = to_process.pop() {
                for &(q, _) in &neighborhoods[p] {
                    if is_core[q] && component[q] == usize::MAX {
                        component[q] = n_components;
                        to_process.push(q);
                    }
                }
            }
            n_components += 1;
        }

        // Border points join their nearest core point's component.
        for p in 0..n {
            if is_core[p] {
                continue;
            }
            let nearest = neighborhoods[p]
                .iter()
                .filter(|(q, _)| is_core[*q])
                .min_by(|(qa, da), (qb, db)| {
                    da.total_cmp(db)
                        .then_with(|| cmp_coords(data.row(*qa), data.row(*qb)))
                });
            if let Some(&(q, _)) = nearest {
                component[p] = component[q];
            }
        }

        // Renumber by first appearance in row order.
        let mut renumber: HashMap<usize, i32> = HashMap::with_capacity(n_components);
        let labels = component
            .iter()
            .map(|&c| {
                if c == usize::MAX {
                    NOISE
                } else {
                    let next = renumber.len() as i32;
                    *renumber.entry(c).or_insert(next)
                }
            })
            .collect();

        Ok(ClusterLabeling::new(labels))
    }

    fn name(&self) -> &'static str {
        "dbscan"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn two_blobs() -> Array2<f64> {
        array![
            // Cluster 1: around (0, 0)
            [0.0, 0.0],
            [0.1, 0.0],
            [0.0, 0.1],
            [0.1, 0.1],
            [0.05, 0.05],
            // Cluster 2: around (5, 5)
            [5.0, 5.0],
            [5.1, 5.0],
            [5.0, 5.1],
            [5.1, 5.1],
            [5.05, 5.05],
        ]
    }

    #[test]
    fn test_dbscan_two_clusters() {
        let data = two_blobs();
        let labels = Dbscan::new(0.3, 3).fit_predict(data.view()).unwrap();
        let labels = labels.labels();

        assert_eq!(labels.len(), 10);
        assert!(labels[..5].iter().all(|&l| l == labels[0]));
        assert!(labels[5..].iter().all(|&l| l == labels[5]));
        assert_ne!(labels[0], labels[5]);
        assert_eq!(labels[0], 0);
        assert_eq!(labels[5], 1);
    }

    #[test]
    fn test_dbscan_with_noise() {
        let data = array![
            [0.0, 0.0],
            [0.1, 0.0],
            [0.0, 0.1],
            [0.1, 0.1],
            // Outlier
            [100.0, 100.0],
            [5.0, 5.0],
            [5.1, 5.0],
            [5.0, 5.1],
            [5.1, 5.1],
        ];

        let labels = Dbscan::new(0.3, 3).fit_predict(data.view()).unwrap();
        assert_eq!(labels.labels()[4], NOISE);
        assert_eq!(labels.noise_count(), 1);
        assert_eq!(labels.n_clusters(), 2);
    }

    #[test]
    fn test_dbscan_all_noise() {
        let data = array![[0.0, 0.0], [10.0, 0.0], [0.0, 10.0], [10.0, 10.0]];
        let labels = Dbscan::new(0.5, 3).fit_predict(data.view()).unwrap();
        assert!(labels.labels().iter().all(|&l| l == NOISE));
        assert_eq!(labels.n_clusters(), 0);
    }

    #[test]
    fn test_dbscan_chain() {
        // Chain of points: density-reachable end to end.
        let data = Array2::from_shape_fn((10, 2), |(i, j)| if j == 0 { i as f64 * 0.3 } else { 0.0 });
        let labels = Dbscan::new(0.5, 2).fit_predict(data.view()).unwrap();
        assert!(labels.labels().iter().all(|&l| l == 0));
    }

    #[test]
    fn test_dbscan_border_point() {
        // Point 3 is only reachable from core point 2.
        let data = array![[0.0], [0.1], [0.2], [0.6]];
        let labels = Dbscan::new(0.45, 3).fit_predict(data.view()).unwrap();
        assert_eq!(labels.labels(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_dbscan_single_row_is_degenerate() {
        let data = array![[1.0, 2.0]];
        let labels = Dbscan::default().fit_predict(data.view()).unwrap();
        assert_eq!(labels.labels(), &[0]);
    }

    #[test]
    fn test_dbscan_invalid_params() {
        let data = array![[0.0, 0.0], [1.0, 1.0]];
        assert!(Dbscan::new(0.0, 3).fit_predict(data.view()).is_err());
        assert!(Dbscan::new(-1.0, 3).fit_predict(data.view()).is_err());
        assert!(Dbscan::new(f64::NAN, 3).fit_predict(data.view()).is_err());
        assert!(Dbscan::new(0.5, 0).fit_predict(data.view()).is_err());
    }

    #[test]
    fn test_dbscan_permutation_keeps_partition() {
        let data = two_blobs();
        let perm: Vec<usize> = vec![9, 3, 5, 0, 7, 1, 8, 2, 6, 4];
        let permuted = Array2::from_shape_fn((10, 2), |(i, j)| data[[perm[i], j]]);

        let a = Dbscan::new(0.3, 3).fit_predict(data.view()).unwrap();
        let b = Dbscan::new(0.3, 3).fit_predict(permuted.view()).unwrap();

        // Map permuted rows back to original indices before comparing.
        let unpermuted: Vec<i32> = {
            let mut v = vec![0; 10];
            for (i, &p) in perm.iter().enumerate() {
                v[p] = b.labels()[i];
            }
            v
        };
        assert_eq!(a.partition(), ClusterLabeling::new(unpermuted).partition());
    }
}
