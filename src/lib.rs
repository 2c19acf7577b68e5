//! # skillgenome
//!
//! Skill genome analysis over a binary employee-by-skill matrix: who clusters
//! with whom, what defines each cluster, and how skills co-occur.
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | ingest | [`matrix`] | validated [`SkillMatrix`], standardized copy |
//! | cluster | [`cluster`] | DBSCAN or Ward labels |
//! | evaluate | [`metrics`] | silhouette, Davies–Bouldin |
//! | characterize | [`characterize`] | defining skills per cluster |
//! | reduce | [`reduce`] | seeded 2D UMAP embedding |
//! | network | [`network`], [`community`] | co-occurrence graph, hubs, bridges, families |
//! | assemble | [`genome`], [`report`] | sanitized JSON-ready documents |
//!
//! [`pipeline`] chains the stages under one [`AnalysisConfig`].
//!
//! ```
//! use skillgenome::{run_visualization, ClusterMethod, SkillMatrix};
//!
//! let m = SkillMatrix::new(
//!     vec!["e0".into(), "e1".into(), "e2".into()],
//!     vec!["rust".into(), "sql".into()],
//!     vec![vec![1, 0], vec![1, 1], vec![0, 1]],
//! )
//! .unwrap();
//! let genome = run_visualization(&m, ClusterMethod::Hierarchical).unwrap();
//! assert_eq!(genome.nodes.len(), 2);
//! assert_eq!(genome.metadata.total_employees, 3);
//! ```

pub mod characterize;
pub mod cluster;
pub mod community;
pub mod config;
/// Error types used across `skillgenome`.
pub mod error;
pub mod genome;
pub mod matrix;
pub mod metrics;
pub mod network;
pub mod pipeline;
pub mod reduce;
pub mod report;


pub use characterize::{characterize, ClusterCharacteristics};
pub use cluster::{
    ClusterLabeling, ClusterMethod, ClusterStrategy, Clustering, Dbscan, HierarchicalClustering,
    Linkage, NOISE,
};
pub use community::{CommunityDetection, GreedyModularity};
pub use config::AnalysisConfig;
pub use error::{Error, Result, Stage};
pub use genome::{assemble, GenomeParts, GenomeVisualization};
pub use matrix::{normalize, NormalizedMatrix, SkillMatrix};
pub use metrics::{davies_bouldin_score, evaluate, silhouette_score, ClusterMetrics};
pub use network::{analyze, build_skill_graph, NetworkInsights, SkillGraph};
pub use pipeline::{run_full_analysis, run_visualization, GenomeAnalyzer};
pub use reduce::{Embedding2D, Umap};
pub use report::{finalize, to_json, to_json_string, Degeneracy, FullReport};
