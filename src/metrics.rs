//! Internal cluster-validity metrics.
//!
//! Measures for assessing clustering quality without ground truth, from the
//! geometry of the standardized matrix alone.
//!
//! # Metrics Overview
//!
//! | Metric | Range | Best | Measures |
//! |--------|-------|------|----------|
//! | [`silhouette_score`] | [-1, 1] | 1 | Cohesion vs. nearest other cluster |
//! | [`davies_bouldin_score`] | [0, ∞) | 0 | Spread vs. centroid separation |
//!
//! Rows labeled [`NOISE`] are dropped before either metric is computed. With
//! fewer than two rows or fewer than two clusters left, both metrics are
//! undefined and [`evaluate`] reports them as 0.
//!
//! # References
//!
//! - Rousseeuw (1987). "Silhouettes: a graphical aid to the interpretation
//!   and validation of cluster analysis."
//! - Davies & Bouldin (1979). "A Cluster Separation Measure."

use std::collections::BTreeMap;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::Serialize;

use crate::cluster::{ClusterLabeling, NOISE};
use crate::error::{Error, Result, Stage};

/// Quality summary for one clustering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClusterMetrics {
    /// Mean silhouette in [-1, 1]; 0 when undefined.
    pub silhouette: f64,
    /// Davies–Bouldin index (≥ 0, lower is better); 0 when undefined.
    pub davies_bouldin: f64,
    /// Distinct non-noise clusters.
    pub cluster_count: usize,
    /// Rows labeled noise.
    pub noise_count: usize,
}

impl ClusterMetrics {
    /// Whether the metrics were computed rather than defaulted.
    pub fn is_defined(&self) -> bool {
        self.cluster_count >= 2
    }
}

/// Evaluate a labeling against the standardized rows it was fitted on.
///
/// # Errors
///
/// [`Error::InputShape`] if the labeling length differs from the row count.
pub fn evaluate(data: ArrayView2<'_, f64>, labeling: &ClusterLabeling) -> Result<ClusterMetrics> {
    if labeling.len() != data.nrows() {
        return Err(Error::input_shape(
            format!("{} labels", data.nrows()),
            format!("{} labels", labeling.len()),
        ));
    }

    let noise_count = labeling.noise_count();
    let kept: Vec<usize> = labeling
        .labels()
        .iter()
        .enumerate()
        .filter(|(_, &l)| l != NOISE)
        .map(|(i, _)| i)
        .collect();
    let filtered_labels: Vec<i32> = kept.iter().map(|&i| labeling.labels()[i]).collect();
    let cluster_count = labeling.n_clusters();

    if kept.len() < 2 || cluster_count < 2 {
        return Ok(ClusterMetrics {
            silhouette: 0.0,
            davies_bouldin: 0.0,
            cluster_count,
            noise_count,
        });
    }

    let filtered = data.select(Axis(0), &kept);
    let silhouette = silhouette_score(filtered.view(), &filtered_labels);
    let davies_bouldin = davies_bouldin_score(filtered.view(), &filtered_labels);

    if !silhouette.is_finite() || !davies_bouldin.is_finite() {
        return Err(Error::algorithm_failure(
            Stage::Evaluate,
            "cluster metrics are not finite; input contains non-finite values",
        ));
    }

    Ok(ClusterMetrics {
        silhouette,
        davies_bouldin,
        cluster_count,
        noise_count,
    })
}

/// Mean silhouette coefficient over all rows.
///
/// For row i with mean intra-cluster distance a(i) and smallest mean distance
/// to another cluster b(i):
///
/// ```text
/// s(i) = (b(i) - a(i)) / max(a(i), b(i))
/// ```
///
/// Rows in singleton clusters score 0. Returns 0 with fewer than two clusters.
pub fn silhouette_score(data: ArrayView2<'_, f64>, labels: &[i32]) -> f64 {
    let n = data.nrows();
    let groups = group_rows(labels);
    if n < 2 || groups.len() < 2 {
        return 0.0;
    }

    let dist = pairwise_distances(data);
    let mut total = 0.0;

    for i in 0..n {
        let own = labels[i];
        let own_size = groups[&own].len();
        if own_size < 2 {
            continue;
        }

        let a = groups[&own].iter().map(|&j| dist[[i, j]]).sum::<f64>() / (own_size - 1) as f64;
        let b = groups
            .iter()
            .filter(|(&c, _)| c != own)
            .map(|(_, members)| {
                members.iter().map(|&j| dist[[i, j]]).sum::<f64>() / members.len() as f64
            })
            .fold(f64::INFINITY, f64::min);

        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }

    total / n as f64
}

/// Davies–Bouldin index.
///
/// ```text
/// DB = (1/k) Σ_i max_{j≠i} (s_i + s_j) / d(c_i, c_j)
/// ```
///
/// where s_i is the mean distance of cluster i's members to its centroid and
/// d(c_i, c_j) the centroid distance. Coincident centroids contribute 0.
/// Returns 0 with fewer than two clusters.
pub fn davies_bouldin_score(data: ArrayView2<'_, f64>, labels: &[i32]) -> f64 {
    let groups = group_rows(labels);
    let k = groups.len();
    if data.nrows() < 2 || k < 2 {
        return 0.0;
    }

    let centroids: Vec<Array1<f64>> = groups
        .values()
        .map(|members| {
            data.select(Axis(0), members)
                .mean_axis(Axis(0))
                .unwrap_or_else(|| Array1::zeros(data.ncols()))
        })
        .collect();

    let scatter: Vec<f64> = groups
        .values()
        .zip(centroids.iter())
        .map(|(members, c)| {
            members
                .iter()
                .map(|&m| euclidean(data.row(m), c.view()))
                .sum::<f64>()
                / members.len() as f64
        })
        .collect();

    let mut total = 0.0;
    for i in 0..k {
        let worst = (0..k)
            .filter(|&j| j != i)
            .map(|j| {
                let sep = euclidean(centroids[i].view(), centroids[j].view());
                if sep > 0.0 {
                    (scatter[i] + scatter[j]) / sep
                } else {
                    0.0
                }
            })
            .fold(0.0, f64::max);
        total += worst;
    }

    total / k as f64
}

fn group_rows(labels: &[i32]) -> BTreeMap<i32, Vec<usize>> {
    let mut groups: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for (i, &l) in labels.iter().enumerate() {
        groups.entry(l).or_default().push(i);
    }
    groups
}

fn pairwise_distances(data: ArrayView2<'_, f64>) -> Array2<f64> {
    let n = data.nrows();
    let mut dist = Array2::zeros((n, n));
    for i in 0..n {
        for j in (i + 1)..n {
            let d = euclidean(data.row(i), data.row(j));
            dist[[i, j]] = d;
            dist[[j, i]] = d;
        }
    }
    dist
}

#[inline]
fn euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_silhouette_well_separated() {
        let data = array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]];
        let s = silhouette_score(data.view(), &[0, 0, 1, 1]);
        // a = 1, b ≈ 10.02 for every row
        let b = (100.0f64).sqrt() / 2.0 + (101.0f64).sqrt() / 2.0;
        assert_relative_eq!(s, (b - 1.0) / b, epsilon = 1e-12);
    }

    #[test]
    fn test_silhouette_singletons_score_zero() {
        let data = array![[0.0], [1.0], [5.0]];
        assert_relative_eq!(silhouette_score(data.view(), &[0, 1, 2]), 0.0);
    }

    #[test]
    fn test_davies_bouldin_known_value() {
        // Centroids at 0 and 10, each cluster spread 1 around its centroid.
        let data = array![[-1.0], [1.0], [9.0], [11.0]];
        let db = davies_bouldin_score(data.view(), &[0, 0, 1, 1]);
        assert_relative_eq!(db, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_evaluate_filters_noise() {
        let data = array![[0.0], [0.1], [50.0], [10.0], [10.1]];
        let labeling = ClusterLabeling::new(vec![0, 0, NOISE, 1, 1]);
        let m = evaluate(data.view(), &labeling).unwrap();
        assert_eq!(m.cluster_count, 2);
        assert_eq!(m.noise_count, 1);
        assert!(m.silhouette > 0.9);
        assert!(m.davies_bouldin < 0.1);
        assert!(m.is_defined());
    }

    #[test]
    fn test_evaluate_single_row() {
        let data = array![[1.0, 0.0]];
        let m = evaluate(data.view(), &ClusterLabeling::all_zero(1)).unwrap();
        assert_eq!(m.silhouette, 0.0);
        assert_eq!(m.davies_bouldin, 0.0);
        assert!(m.cluster_count <= 1);
    }

    #[test]
    fn test_evaluate_all_noise() {
        let data = array![[0.0], [5.0], [9.0]];
        let m = evaluate(data.view(), &ClusterLabeling::new(vec![NOISE; 3])).unwrap();
        assert_eq!(m.cluster_count, 0);
        assert_eq!(m.noise_count, 3);
        assert_eq!(m.silhouette, 0.0);
        assert!(!m.is_defined());
    }

    #[test]
    fn test_evaluate_single_cluster() {
        let data = array![[0.0], [1.0], [2.0]];
        let m = evaluate(data.view(), &ClusterLabeling::all_zero(3)).unwrap();
        assert_eq!(m.cluster_count, 1);
        assert_eq!(m.davies_bouldin, 0.0);
    }

    #[test]
    fn test_evaluate_length_mismatch() {
        let data = array![[0.0], [1.0]];
        assert!(evaluate(data.view(), &ClusterLabeling::all_zero(3)).is_err());
    }
}
