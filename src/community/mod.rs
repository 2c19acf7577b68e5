//! Community detection for the skill graph.
//!
//! Skills that are densely tied to each other and sparsely tied to the rest
//! form a "skill family". Families are found by maximizing **modularity**:
//!
//! ```text
//! Q = Σ_c [ W_c / m  -  γ (D_c / 2m)² ]
//! ```
//!
//! summed over families c, with W_c the edge weight inside c, D_c the total
//! weighted degree of its skills, m the total edge weight and γ the
//! resolution (1 by default; larger values give smaller families).
//!
//! ## Algorithm
//!
//! ### Greedy modularity (Clauset–Newman–Moore)
//!
//! Agglomerative: every node starts alone and the pair of communities with
//! the largest modularity gain is merged until no merge helps. Skill graphs
//! are small, so the simple agglomeration is fast enough and, unlike
//! randomized local-moving methods, fully deterministic.
//!
//! A graph without edges yields one community per node.
//!
//! ## Example
//!
//! ```rust
//! use petgraph::graph::UnGraph;
//! use skillgenome::community::{CommunityDetection, GreedyModularity};
//!
//! let mut graph = UnGraph::<&str, f64>::new_undirected();
//! let a = graph.add_node("rust");
//! let b = graph.add_node("cargo");
//! let c = graph.add_node("excel");
//! graph.add_edge(a, b, 0.9);
//!
//! let communities = GreedyModularity::new().detect(&graph).unwrap();
//! assert_eq!(communities[0], communities[1]);
//! assert_ne!(communities[0], communities[2]);
//! ```
//!
//! ## References
//!
//! - Clauset, Newman & Moore (2004). "Finding community structure in very
//!   large networks."
//! - Newman (2006). "Modularity and community structure in networks." PNAS 103(23).

mod greedy;
mod traits;

pub use greedy::{modularity, GreedyModularity};
pub use traits::CommunityDetection;
