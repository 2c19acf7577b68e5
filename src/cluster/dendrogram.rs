//! Dendrogram for hierarchical clustering.
//!
//! A dendrogram represents the nested structure of clusters produced
//! by agglomerative (bottom-up) clustering. Labels follow the SciPy/MATLAB
//! convention: leaves are `0..n`, merge `i` creates cluster `n + i`.

use std::collections::HashMap;

/// A dendrogram representing hierarchical cluster merges.
#[derive(Debug, Clone)]
pub struct Dendrogram {
    /// Merge history, in increasing dissimilarity.
    merges: Vec<Merge>,
    /// Number of original items.
    n_items: usize,
}

/// A single merge operation in the dendrogram.
#[derive(Debug, Clone, Copy)]
pub struct Merge {
    /// First cluster being merged (index).
    pub cluster_a: usize,
    /// Second cluster being merged (index).
    pub cluster_b: usize,
    /// Distance/dissimilarity at which merge occurred.
    pub distance: f64,
    /// Size of resulting cluster.
    pub size: usize,
}

impl Dendrogram {
    /// Create a new dendrogram for n items.
    pub fn new(n_items: usize) -> Self {
        Self {
            merges: Vec::with_capacity(n_items.saturating_sub(1)),
            n_items,
        }
    }

    /// Record a merge operation.
    pub fn add_merge(&mut self, cluster_a: usize, cluster_b: usize, distance: f64, size: usize) {
        self.merges.push(Merge {
            cluster_a,
            cluster_b,
            distance,
            size,
        });
    }

    /// Cluster assignments for exactly `k` clusters.
    ///
    /// Replays the first `n - k` merges, so ties in merge distance never
    /// collapse more clusters than requested. `k` is clamped to `[1, n]`.
    /// Labels are numbered by first appearance in item order.
    pub fn cut_to_k(&self, k: usize) -> Vec<usize> {
        let n = self.n_items;
        if n == 0 {
            return Vec::new();
        }
        let k = k.clamp(1, n);
        let n_merges = (n - k).min(self.merges.len());

        // parent pointers over leaves and merge-created clusters
        let mut parent: Vec<usize> = (0..n + n_merges).collect();
        for (i, merge) in self.merges.iter().take(n_merges).enumerate() {
            let new_id = n + i;
            parent[merge.cluster_a] = new_id;
            parent[merge.cluster_b] = new_id;
        }

        let mut renumber: HashMap<usize, usize> = HashMap::with_capacity(k);
        (0..n)
            .map(|leaf| {
                let mut root = leaf;
                while parent[root] != root {
                    root = parent[root];
                }
                let next = renumber.len();
                *renumber.entry(root).or_insert(next)
            })
            .collect()
    }

    /// Number of original items.
    pub fn n_items(&self) -> usize {
        self.n_items
    }

    /// Number of merges recorded.
    pub fn n_merges(&self) -> usize {
        self.merges.len()
    }

    /// Iterate over merges.
    pub fn merges(&self) -> impl Iterator<Item = &Merge> {
        self.merges.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_items() -> Dendrogram {
        let mut dendro = Dendrogram::new(4);
        dendro.add_merge(0, 1, 0.5, 2); // -> 4
        dendro.add_merge(2, 3, 0.5, 2); // -> 5
        dendro.add_merge(4, 5, 1.0, 4); // -> 6
        dendro
    }

    #[test]
    fn test_dendrogram_creation() {
        let dendro = Dendrogram::new(5);
        assert_eq!(dendro.n_items(), 5);
        assert_eq!(dendro.n_merges(), 0);
    }

    #[test]
    fn test_cut_to_k_with_tied_distances() {
        let dendro = four_items();
        assert_eq!(dendro.cut_to_k(3), vec![0, 0, 1, 2]);
        assert_eq!(dendro.cut_to_k(2), vec![0, 0, 1, 1]);
        assert_eq!(dendro.cut_to_k(1), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_cut_to_k_clamps() {
        let dendro = four_items();
        assert_eq!(dendro.cut_to_k(0), vec![0, 0, 0, 0]);
        assert_eq!(dendro.cut_to_k(9), vec![0, 1, 2, 3]);
    }
}
