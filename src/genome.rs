//! Genome visualization assembly.
//!
//! Joins one clustering, the 2D employee projection and the skill graph into
//! the node/link/metadata document a force-graph front end renders.
//! Nodes are skills; each is colored by its dominant cluster, the non-noise
//! cluster most common among employees holding it.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::cluster::{ClusterLabeling, ClusterMethod, NOISE};
use crate::error::{Error, Result, Stage};
use crate::matrix::SkillMatrix;
use crate::metrics::ClusterMetrics;
use crate::network::SkillGraph;
use crate::reduce::Embedding2D;

/// A skill node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenomeNode {
    /// Skill name.
    pub id: String,
    /// Display label (the skill name).
    pub label: String,
    /// Employees holding the skill.
    pub value: usize,
    /// Dominant cluster id + 1; 0 when no holder is clustered.
    pub group: usize,
    /// Growth signal, present only when supplied by the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth: Option<f64>,
}

/// A co-occurrence link between two skill nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenomeLink {
    /// Source skill id.
    pub source: String,
    /// Target skill id.
    pub target: String,
    /// Edge weight.
    pub value: f64,
}

/// An employee placed on the 2D map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeePoint {
    /// Employee identifier.
    pub id: String,
    /// Projected x coordinate.
    pub x: f64,
    /// Projected y coordinate.
    pub y: f64,
    /// Cluster label, -1 for noise.
    pub cluster: i32,
}

/// Summary attached to the visualization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenomeMetadata {
    /// Matrix rows.
    pub total_employees: usize,
    /// Matrix columns.
    pub total_skills: usize,
    /// Clustering used for node groups.
    pub clustering_method: ClusterMethod,
    /// Quality of that clustering.
    pub cluster_metrics: ClusterMetrics,
}

/// The skill genome document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenomeVisualization {
    /// One node per skill, in column order.
    pub nodes: Vec<GenomeNode>,
    /// One link per graph edge.
    pub links: Vec<GenomeLink>,
    /// Run summary.
    pub metadata: GenomeMetadata,
    /// Employee projection; omitted from JSON when empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub employees: Vec<EmployeePoint>,
}

impl GenomeVisualization {
    /// Attach growth values to nodes by skill name; unmatched skills keep none.
    pub fn with_growth(mut self, growth: &HashMap<String, f64>) -> Self {
        for node in &mut self.nodes {
            node.growth = growth.get(&node.id).copied();
        }
        self
    }
}

/// Inputs to [`assemble`], all derived from the same matrix.
#[derive(Debug, Clone, Copy)]
pub struct GenomeParts<'a> {
    /// Raw skill matrix.
    pub matrix: &'a SkillMatrix,
    /// Clustering used for node groups.
    pub labeling: &'a ClusterLabeling,
    /// Method that produced `labeling`.
    pub method: ClusterMethod,
    /// Metrics for `labeling`.
    pub metrics: ClusterMetrics,
    /// 2D projection of the employees.
    pub embedding: &'a Embedding2D,
    /// Skill co-occurrence graph.
    pub graph: &'a SkillGraph,
}

/// Build the visualization document.
///
/// # Errors
///
/// [`Error::AlgorithmFailure`] tagged [`Stage::Assemble`] if the parts
/// disagree on row or skill counts.
pub fn assemble(parts: GenomeParts<'_>) -> Result<GenomeVisualization> {
    let matrix = parts.matrix;
    let n_rows = matrix.n_employees();

    if parts.labeling.len() != n_rows || parts.embedding.len() != n_rows {
        return Err(Error::algorithm_failure(
            Stage::Assemble,
            format!(
                "row counts disagree: matrix {n_rows}, labels {}, embedding {}",
                parts.labeling.len(),
                parts.embedding.len()
            ),
        ));
    }
    if parts.graph.node_count() != matrix.n_skills() {
        return Err(Error::algorithm_failure(
            Stage::Assemble,
            format!(
                "skill counts disagree: matrix {}, graph {}",
                matrix.n_skills(),
                parts.graph.node_count()
            ),
        ));
    }

    let counts = matrix.skill_counts();
    let nodes = matrix
        .skill_names()
        .iter()
        .enumerate()
        .map(|(col, name)| GenomeNode {
            id: name.clone(),
            label: name.clone(),
            value: counts[col],
            group: dominant_cluster(matrix, parts.labeling, col)
                .map_or(0, |c| c as usize + 1),
            growth: None,
        })
        .collect();

    let links = parts
        .graph
        .edges()
        .into_iter()
        .map(|e| GenomeLink {
            source: e.source,
            target: e.target,
            value: e.weight,
        })
        .collect();

    let employees = matrix
        .employee_ids()
        .iter()
        .zip(parts.embedding.points())
        .zip(parts.labeling.labels())
        .map(|((id, p), &cluster)| EmployeePoint {
            id: id.clone(),
            x: p[0],
            y: p[1],
            cluster,
        })
        .collect();

    Ok(GenomeVisualization {
        nodes,
        links,
        metadata: GenomeMetadata {
            total_employees: n_rows,
            total_skills: matrix.n_skills(),
            clustering_method: parts.method,
            cluster_metrics: parts.metrics,
        },
        employees,
    })
}

/// Most frequent non-noise cluster among holders of skill `col`; ties go to
/// the smallest cluster id.
fn dominant_cluster(matrix: &SkillMatrix, labeling: &ClusterLabeling, col: usize) -> Option<i32> {
    let mut tally: BTreeMap<i32, usize> = BTreeMap::new();
    for (row, &label) in labeling.labels().iter().enumerate() {
        if label != NOISE && matrix.has_skill(row, col) {
            *tally.entry(label).or_insert(0) += 1;
        }
    }
    // max_by_key keeps the last maximum; iterate descending ids so the smallest wins
    tally
        .into_iter()
        .rev()
        .max_by_key(|&(_, count)| count)
        .map(|(label, _)| label)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fixture() -> (SkillMatrix, SkillGraph, Embedding2D) {
        let m = SkillMatrix::new(
            (0..4).map(|i| format!("e{i}")).collect(),
            ["a", "b", "c"].iter().map(|s| s.to_string()).collect(),
            vec![vec![1, 1, 0], vec![1, 1, 0], vec![0, 1, 0], vec![0, 1, 0]],
        )
        .unwrap();
        let g = SkillGraph::build(&m, 0.3).unwrap();
        let e = Embedding2D::new(vec![[0.0, 0.0], [1.0, 0.0], [5.0, 5.0], [6.0, 5.0]]);
        (m, g, e)
    }

    fn metrics() -> ClusterMetrics {
        ClusterMetrics {
            silhouette: 0.5,
            davies_bouldin: 0.4,
            cluster_count: 2,
            noise_count: 0,
        }
    }

    #[test]
    fn test_assemble_groups_and_links() {
        let (m, g, e) = fixture();
        let labeling = ClusterLabeling::new(vec![0, 0, 1, 1]);
        let viz = assemble(GenomeParts {
            matrix: &m,
            labeling: &labeling,
            method: ClusterMethod::Hierarchical,
            metrics: metrics(),
            embedding: &e,
            graph: &g,
        })
        .unwrap();

        assert_eq!(viz.nodes.len(), 3);
        assert_eq!(viz.nodes[0].value, 2);
        assert_eq!(viz.nodes[0].group, 1);
        // b is held equally by clusters 0 and 1: smallest id wins
        assert_eq!(viz.nodes[1].group, 1);
        // nobody holds c
        assert_eq!(viz.nodes[2].group, 0);
        assert_eq!(viz.links.len(), 1);
        assert_eq!(viz.metadata.total_employees, 4);
        assert_eq!(viz.employees[2].cluster, 1);
        assert_eq!(viz.employees[3].x, 6.0);
    }

    #[test]
    fn test_noise_holders_default_group() {
        let (m, g, e) = fixture();
        let labeling = ClusterLabeling::new(vec![NOISE, NOISE, 0, 0]);
        let viz = assemble(GenomeParts {
            matrix: &m,
            labeling: &labeling,
            method: ClusterMethod::Dbscan,
            metrics: metrics(),
            embedding: &e,
            graph: &g,
        })
        .unwrap();
        assert_eq!(viz.nodes[0].group, 0);
        assert_eq!(viz.nodes[1].group, 1);
    }

    #[test]
    fn test_mismatched_rows_rejected() {
        let (m, g, _) = fixture();
        let labeling = ClusterLabeling::all_zero(4);
        let short = Embedding2D::new(vec![[0.0, 0.0]]);
        let err = assemble(GenomeParts {
            matrix: &m,
            labeling: &labeling,
            method: ClusterMethod::Hierarchical,
            metrics: metrics(),
            embedding: &short,
            graph: &g,
        })
        .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Assemble));
    }

    #[test]
    fn test_growth_is_optional() {
        let (m, g, e) = fixture();
        let labeling = ClusterLabeling::all_zero(4);
        let viz = assemble(GenomeParts {
            matrix: &m,
            labeling: &labeling,
            method: ClusterMethod::Hierarchical,
            metrics: metrics(),
            embedding: &e,
            graph: &g,
        })
        .unwrap();
        let json = serde_json::to_value(&viz).unwrap();
        assert!(json["nodes"][0].get("growth").is_none());

        let growth: HashMap<String, f64> = [("a".to_string(), 0.2)].into_iter().collect();
        let viz = viz.with_growth(&growth);
        assert_eq!(viz.nodes[0].growth, Some(0.2));
        assert_eq!(viz.nodes[1].growth, None);
    }
}
