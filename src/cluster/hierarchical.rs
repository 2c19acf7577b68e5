//! Ward agglomerative clustering of employees.
//!
//! Each employee starts alone. The two groups whose union adds the least
//! within-group variance are joined, repeatedly, until one group is left:
//!
//! ```text
//! cost(A ∪ B) = |A|·|B| / (|A| + |B|) · ‖mean(A) − mean(B)‖²
//! ```
//!
//! The merge history is a [`Dendrogram`]; replaying its first `n − k`
//! merges yields exactly `k` groups with no noise label. Single, complete and
//! average linkage are available for comparison but the pipeline uses Ward.

use kodama::{linkage, Method};
use ndarray::{ArrayView1, ArrayView2};
use tracing::debug;

use super::dendrogram::Dendrogram;
use super::traits::{ClusterLabeling, Clustering};
use crate::error::{Error, Result, Stage};

/// How the distance between two groups is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Linkage {
    /// Closest pair of members.
    Single,
    /// Farthest pair of members.
    Complete,
    /// Mean over all member pairs.
    Average,
    /// Increase in within-group variance.
    #[default]
    Ward,
}

impl Linkage {
    fn method(self) -> Method {
        match self {
            Linkage::Single => Method::Single,
            Linkage::Complete => Method::Complete,
            Linkage::Average => Method::Average,
            Linkage::Ward => Method::Ward,
        }
    }
}

/// Agglomerative clustering cut at a fixed group count.
#[derive(Debug, Clone)]
pub struct HierarchicalClustering {
    k: usize,
    linkage: Linkage,
}

impl HierarchicalClustering {
    /// Ward clustering into `k` groups.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            linkage: Linkage::Ward,
        }
    }

    /// Use a different linkage.
    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    /// Requested group count.
    pub fn n_clusters(&self) -> usize {
        self.k
    }

    /// Full merge history over the rows of `data`.
    ///
    /// # Errors
    ///
    /// [`Error::AlgorithmFailure`] with fewer than two rows or a non-finite
    /// pairwise distance.
    pub fn fit_dendrogram(&self, data: ArrayView2<'_, f64>) -> Result<Dendrogram> {
        let n = data.nrows();
        if n < 2 {
            return Err(Error::algorithm_failure(
                Stage::Cluster,
                format!("dendrogram needs at least 2 rows, got {n}"),
            ));
        }

        // kodama wants the condensed upper triangle, row-major.
        let mut condensed: Vec<f64> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .map(|(i, j)| euclidean(data.row(i), data.row(j)))
            .collect();
        if condensed.iter().any(|d| !d.is_finite()) {
            return Err(Error::algorithm_failure(
                Stage::Cluster,
                "non-finite distance in input",
            ));
        }

        let steps = linkage(&mut condensed, n, self.linkage.method());
        let mut dendrogram = Dendrogram::new(n);
        for step in steps.steps() {
            dendrogram.add_merge(step.cluster1, step.cluster2, step.dissimilarity, step.size);
        }
        Ok(dendrogram)
    }
}

#[inline]
fn euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

impl Clustering for HierarchicalClustering {
    fn fit_predict(&self, data: ArrayView2<'_, f64>) -> Result<ClusterLabeling> {
        if self.k == 0 {
            return Err(Error::invalid_parameter(
                Stage::Cluster,
                "k",
                "must be at least 1",
            ));
        }

        let n = data.nrows();
        if n < 2 {
            return Ok(ClusterLabeling::all_zero(n));
        }
        if self.k > n {
            debug!(k = self.k, rows = n, "clamping cluster count to row count");
        }

        let labels = self
            .fit_dendrogram(data)?
            .cut_to_k(self.k)
            .into_iter()
            .map(|l| l as i32)
            .collect();
        Ok(ClusterLabeling::new(labels))
    }

    fn name(&self) -> &'static str {
        "hierarchical"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_ward_separates_blobs() {
        let data = array![[0.0, 0.0], [0.1, 0.1], [10.0, 10.0], [10.1, 10.1]];
        let labels = HierarchicalClustering::new(2).fit_predict(data.view()).unwrap();
        let l = labels.labels();

        assert_eq!(l[0], l[1]);
        assert_eq!(l[2], l[3]);
        assert_ne!(l[0], l[2]);
    }

    #[test]
    fn test_hierarchical_exact_k_with_duplicates() {
        // Duplicate rows tie at distance 0; the cut must still give k groups.
        let data = array![[0.0], [0.0], [0.0], [5.0], [5.0], [9.0]];
        let labels = HierarchicalClustering::new(3).fit_predict(data.view()).unwrap();
        assert_eq!(labels.n_clusters(), 3);
        assert!(labels.labels().iter().all(|&l| (0..3).contains(&l)));
    }

    #[test]
    fn test_hierarchical_k_larger_than_rows() {
        let data = array![[0.0], [1.0], [2.0]];
        let labels = HierarchicalClustering::new(4).fit_predict(data.view()).unwrap();
        assert_eq!(labels.labels(), &[0, 1, 2]);
    }

    #[test]
    fn test_hierarchical_single_row() {
        let data = array![[1.0, 1.0]];
        let labels = HierarchicalClustering::new(4).fit_predict(data.view()).unwrap();
        assert_eq!(labels.labels(), &[0]);
    }

    #[test]
    fn test_hierarchical_zero_k_rejected() {
        let data = array![[0.0], [1.0]];
        assert!(HierarchicalClustering::new(0).fit_predict(data.view()).is_err());
    }

    #[test]
    fn test_merge_history_length() {
        let data = array![[0.0, 0.0], [1.0, 0.0], [10.0, 0.0]];
        let history = HierarchicalClustering::new(2).fit_dendrogram(data.view()).unwrap();
        assert_eq!(history.n_items(), 3);
        assert_eq!(history.n_merges(), 2);
    }

    #[test]
    fn test_ward_heights_never_decrease() {
        let data = array![[0.0, 0.0], [0.3, 0.0], [4.0, 1.0], [4.2, 1.1], [9.0, 9.0], [0.1, 0.2]];
        let history = HierarchicalClustering::new(2).fit_dendrogram(data.view()).unwrap();

        let merges: Vec<_> = history.merges().collect();
        assert_eq!(merges.len(), 5);
        for pair in merges.windows(2) {
            assert!(pair[1].distance >= pair[0].distance - 1e-12);
        }
        // the last merge joins every row
        assert_eq!(merges[4].size, 6);
        assert!(merges[0].size == 2);
    }

    #[test]
    fn test_other_linkages() {
        let data = array![[0.0], [0.2], [8.0], [8.1]];
        for linkage in [Linkage::Single, Linkage::Complete, Linkage::Average] {
            let labels = HierarchicalClustering::new(2)
                .with_linkage(linkage)
                .fit_predict(data.view())
                .unwrap();
            assert_eq!(labels.partition().len(), 2);
            assert_eq!(labels.labels()[0], labels.labels()[1]);
        }
    }
}
