//! Clustering traits and the shared labeling contract.

use std::collections::BTreeSet;

use ndarray::ArrayView2;
use serde::Serialize;

use crate::error::Result;

/// Label for rows that belong to no dense region.
pub const NOISE: i32 = -1;

/// One cluster id per matrix row; [`NOISE`] marks unassigned rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ClusterLabeling {
    labels: Vec<i32>,
}

impl ClusterLabeling {
    /// Wrap raw labels.
    pub fn new(labels: Vec<i32>) -> Self {
        Self { labels }
    }

    /// Every row in cluster 0.
    pub fn all_zero(n: usize) -> Self {
        Self { labels: vec![0; n] }
    }

    /// Raw labels in row order.
    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    /// Number of labeled rows.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Distinct non-noise cluster ids, ascending.
    pub fn cluster_ids(&self) -> Vec<i32> {
        self.labels
            .iter()
            .copied()
            .filter(|&l| l != NOISE)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of distinct non-noise clusters.
    pub fn n_clusters(&self) -> usize {
        self.cluster_ids().len()
    }

    /// Number of rows labeled [`NOISE`].
    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == NOISE).count()
    }

    /// Row indices carrying `cluster`.
    pub fn members(&self, cluster: i32) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == cluster)
            .map(|(i, _)| i)
            .collect()
    }

    /// The partition as sets of row indices, noise excluded.
    pub fn partition(&self) -> BTreeSet<BTreeSet<usize>> {
        self.cluster_ids()
            .into_iter()
            .map(|c| self.members(c).into_iter().collect())
            .collect()
    }
}

/// Trait for hard clustering algorithms over standardized rows.
pub trait Clustering {
    /// Fit the model to data and return one label per row.
    fn fit_predict(&self, data: ArrayView2<'_, f64>) -> Result<ClusterLabeling>;

    /// Short method name used in reports.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labeling_counts() {
        let l = ClusterLabeling::new(vec![0, NOISE, 1, 1, NOISE]);
        assert_eq!(l.cluster_ids(), vec![0, 1]);
        assert_eq!(l.n_clusters(), 2);
        assert_eq!(l.noise_count(), 2);
        assert_eq!(l.members(1), vec![2, 3]);
    }

    #[test]
    fn test_partition_ignores_label_values() {
        let a = ClusterLabeling::new(vec![0, 0, 1, NOISE]);
        let b = ClusterLabeling::new(vec![5, 5, 2, NOISE]);
        assert_eq!(a.partition(), b.partition());
    }
}
