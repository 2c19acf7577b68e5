//! The seam between graph construction and partitioning.

use petgraph::graph::UnGraph;

use crate::error::Result;

/// Partitions the nodes of a weighted undirected graph.
pub trait CommunityDetection {
    /// One label per node index, numbered `0..c` with no gaps.
    fn detect<N>(&self, graph: &UnGraph<N, f64>) -> Result<Vec<usize>>;

    /// Modularity resolution γ used by the detector.
    fn resolution(&self) -> f64 {
        1.0
    }
}
