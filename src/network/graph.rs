//! Skill co-occurrence graph.
//!
//! Two skills co-occur when one employee holds both. With indicator matrix
//! X (employees × skills), the joint counts are `C = Xᵀ X` and the
//! marginal counts sit on its diagonal. Similarity is the cosine-style
//! normalization
//!
//! ```text
//! s_ij = C_ij / sqrt(C_ii · C_jj)        ∈ [0, 1]
//! ```
//!
//! Every pair with `s_ij > threshold` becomes an undirected edge. Self-pairs
//! never do, and every skill is a node even when isolated.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result, Stage};
use crate::matrix::SkillMatrix;

/// Default similarity threshold for emitting an edge.
pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// One weighted co-occurrence edge, endpoints in column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillEdge {
    /// Lower-index skill.
    pub source: String,
    /// Higher-index skill.
    pub target: String,
    /// Normalized co-occurrence in (threshold, 1].
    pub weight: f64,
}

/// Undirected skill graph; node `i` is skill column `i`.
#[derive(Debug, Clone)]
pub struct SkillGraph {
    graph: UnGraph<String, f64>,
    threshold: f64,
}

impl SkillGraph {
    /// Build from a raw skill matrix.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] if `threshold` is not in `[0, 1)`.
    pub fn build(matrix: &SkillMatrix, threshold: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&threshold) {
            return Err(Error::invalid_parameter(
                Stage::Network,
                "threshold",
                "must be in [0, 1)",
            ));
        }

        let similarity = cooccurrence_similarity(matrix);
        let n = matrix.n_skills();

        let mut graph = UnGraph::with_capacity(n, 0);
        let nodes: Vec<NodeIndex> = matrix
            .skill_names()
            .iter()
            .map(|name| graph.add_node(name.clone()))
            .collect();

        for i in 0..n {
            for j in (i + 1)..n {
                let s = similarity[i][j];
                if s > threshold {
                    let _ = graph.add_edge(nodes[i], nodes[j], s);
                }
            }
        }

        debug!(
            skills = n,
            edges = graph.edge_count(),
            threshold,
            "skill graph built"
        );
        Ok(Self { graph, threshold })
    }

    /// Underlying petgraph graph.
    pub fn graph(&self) -> &UnGraph<String, f64> {
        &self.graph
    }

    /// Threshold the graph was built with.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Number of skills.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Skill names in column order.
    pub fn skill_names(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    /// Edges sorted by (source column, target column).
    pub fn edges(&self) -> Vec<SkillEdge> {
        let mut raw: Vec<(usize, usize, f64)> = self
            .graph
            .edge_references()
            .map(|e| {
                let (a, b) = (e.source().index(), e.target().index());
                (a.min(b), a.max(b), *e.weight())
            })
            .collect();
        raw.sort_by(|x, y| (x.0, x.1).cmp(&(y.0, y.1)));
        raw.into_iter()
            .map(|(a, b, w)| SkillEdge {
                source: self.graph[NodeIndex::new(a)].clone(),
                target: self.graph[NodeIndex::new(b)].clone(),
                weight: w,
            })
            .collect()
    }

    /// Weighted adjacency lists indexed by skill column.
    pub fn adjacency(&self) -> Vec<Vec<(usize, f64)>> {
        let mut adj = vec![Vec::new(); self.graph.node_count()];
        for e in self.graph.edge_references() {
            let (a, b) = (e.source().index(), e.target().index());
            adj[a].push((b, *e.weight()));
            adj[b].push((a, *e.weight()));
        }
        for list in &mut adj {
            list.sort_by_key(|&(j, _)| j);
        }
        adj
    }
}

/// Build the co-occurrence graph; same as [`SkillGraph::build`].
pub fn build_skill_graph(matrix: &SkillMatrix, threshold: f64) -> Result<SkillGraph> {
    SkillGraph::build(matrix, threshold)
}

/// Pairwise normalized co-occurrence, `n_skills × n_skills`.
///
/// Pairs involving a skill nobody holds are 0. The diagonal is 1 for held
/// skills and is never turned into an edge.
pub fn cooccurrence_similarity(matrix: &SkillMatrix) -> Vec<Vec<f64>> {
    let x = matrix.to_indicator();
    let joint = x.t().dot(&x);
    let n = joint.nrows();

    (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    let denom = (joint[[i, i]] * joint[[j, j]]).sqrt();
                    if denom > 0.0 {
                        (joint[[i, j]] / denom).min(1.0)
                    } else {
                        0.0
                    }
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn matrix(rows: Vec<Vec<u8>>, skills: &[&str]) -> SkillMatrix {
        let ids = (0..rows.len()).map(|i| format!("e{i}")).collect();
        SkillMatrix::new(ids, skills.iter().map(|s| s.to_string()).collect(), rows).unwrap()
    }

    #[test]
    fn test_similarity_values() {
        // a: {0,1,2}, b: {0,1}, c: {3}
        let m = matrix(
            vec![vec![1, 1, 0], vec![1, 1, 0], vec![1, 0, 0], vec![0, 0, 1]],
            &["a", "b", "c"],
        );
        let s = cooccurrence_similarity(&m);
        assert_relative_eq!(s[0][1], 2.0 / 6.0f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(s[0][2], 0.0);
        assert_relative_eq!(s[1][0], s[0][1]);
    }

    #[test]
    fn test_edges_above_threshold_only() {
        let m = matrix(
            vec![vec![1, 1, 0], vec![1, 1, 0], vec![1, 0, 0], vec![0, 0, 1]],
            &["a", "b", "c"],
        );
        let g = SkillGraph::build(&m, 0.3).unwrap();
        assert_eq!(g.node_count(), 3);
        let edges = g.edges();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source, "a");
        assert_eq!(edges[0].target, "b");

        let strict = SkillGraph::build(&m, 0.9).unwrap();
        assert_eq!(strict.edge_count(), 0);
        assert_eq!(strict.node_count(), 3);
    }

    #[test]
    fn test_all_zero_skill_is_isolated() {
        let m = matrix(vec![vec![1, 1, 0], vec![1, 1, 0]], &["a", "b", "unused"]);
        let g = SkillGraph::build(&m, 0.3).unwrap();
        assert_eq!(g.node_count(), 3);
        assert!(g.adjacency()[2].is_empty());
        assert!(g.edges().iter().all(|e| e.source != "unused" && e.target != "unused"));
    }

    #[test]
    fn test_build_is_idempotent() {
        let m = matrix(
            vec![vec![1, 1, 0, 1], vec![0, 1, 1, 1], vec![1, 0, 1, 0]],
            &["a", "b", "c", "d"],
        );
        let first = SkillGraph::build(&m, 0.3).unwrap().edges();
        let second = SkillGraph::build(&m, 0.3).unwrap().edges();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_threshold() {
        let m = matrix(vec![vec![1]], &["a"]);
        assert!(SkillGraph::build(&m, 1.0).is_err());
        assert!(SkillGraph::build(&m, -0.1).is_err());
        assert!(SkillGraph::build(&m, f64::NAN).is_err());
    }
}
