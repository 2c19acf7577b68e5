//! Report types and the JSON export boundary.
//!
//! Every numeric field in the output is a plain `f64`/`usize`/`i32`, but a
//! float can still go non-finite upstream. [`finalize`] is the one place
//! where output is cleaned before serialization: any NaN or infinity becomes
//! 0 and is logged.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::characterize::ClusterCharacteristics;
use crate::error::Result;
use crate::genome::{EmployeePoint, GenomeLink, GenomeNode, GenomeVisualization};
use crate::metrics::ClusterMetrics;
use crate::network::{NetworkInsights, RankedSkill};

/// A result that could not be computed meaningfully and was defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degeneracy {
    /// Fewer than two employees; clustering and metrics are trivial.
    TooFewRows {
        /// Rows present.
        rows: usize,
    },
    /// Fewer than two non-noise clusters; metrics default to 0.
    SingleCluster {
        /// Method that produced the labeling.
        method: String,
        /// Non-noise clusters found.
        clusters: usize,
    },
    /// Every row was labeled noise.
    AllNoise {
        /// Method that produced the labeling.
        method: String,
    },
    /// The skill graph has no edges; centralities and density are 0.
    EmptyGraph {
        /// Skills in the graph.
        skills: usize,
    },
}

/// Full analysis output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullReport {
    /// Visualization built from the default clustering method.
    pub genome: GenomeVisualization,
    /// Metrics per clustering method name.
    pub clustering_evaluation: BTreeMap<String, ClusterMetrics>,
    /// Cluster profiles per clustering method name.
    pub cluster_characteristics: BTreeMap<String, BTreeMap<i32, ClusterCharacteristics>>,
    /// Skill network findings.
    pub network_insights: NetworkInsights,
    /// Degenerate results encountered during the run.
    pub warnings: Vec<Degeneracy>,
}

/// Replace non-finite floats with 0 in place.
pub trait Sanitize {
    /// Returns how many values were replaced.
    fn sanitize(&mut self) -> usize;
}

impl Sanitize for f64 {
    fn sanitize(&mut self) -> usize {
        if self.is_finite() {
            0
        } else {
            *self = 0.0;
            1
        }
    }
}

impl<T: Sanitize> Sanitize for Vec<T> {
    fn sanitize(&mut self) -> usize {
        self.iter_mut().map(Sanitize::sanitize).sum()
    }
}

impl<K, T: Sanitize> Sanitize for BTreeMap<K, T> {
    fn sanitize(&mut self) -> usize {
        self.values_mut().map(Sanitize::sanitize).sum()
    }
}

impl<T: Sanitize> Sanitize for Option<T> {
    fn sanitize(&mut self) -> usize {
        self.as_mut().map_or(0, Sanitize::sanitize)
    }
}

impl Sanitize for ClusterMetrics {
    fn sanitize(&mut self) -> usize {
        self.silhouette.sanitize() + self.davies_bouldin.sanitize()
    }
}

impl<K, T: Sanitize> Sanitize for IndexMap<K, T> {
    fn sanitize(&mut self) -> usize {
        self.values_mut().map(Sanitize::sanitize).sum()
    }
}

impl Sanitize for ClusterCharacteristics {
    fn sanitize(&mut self) -> usize {
        self.skill_prevalence.sanitize() + self.avg_skills_per_employee.sanitize()
    }
}

impl Sanitize for RankedSkill {
    fn sanitize(&mut self) -> usize {
        self.score.sanitize()
    }
}

impl Sanitize for NetworkInsights {
    fn sanitize(&mut self) -> usize {
        self.hub_skills.sanitize()
            + self.bridge_skills.sanitize()
            + self.network_density.sanitize()
            + self.avg_clustering_coefficient.sanitize()
    }
}

impl Sanitize for GenomeNode {
    fn sanitize(&mut self) -> usize {
        self.growth.sanitize()
    }
}

impl Sanitize for GenomeLink {
    fn sanitize(&mut self) -> usize {
        self.value.sanitize()
    }
}

impl Sanitize for EmployeePoint {
    fn sanitize(&mut self) -> usize {
        self.x.sanitize() + self.y.sanitize()
    }
}

impl Sanitize for GenomeVisualization {
    fn sanitize(&mut self) -> usize {
        self.nodes.sanitize()
            + self.links.sanitize()
            + self.employees.sanitize()
            + self.metadata.cluster_metrics.sanitize()
    }
}

impl Sanitize for FullReport {
    fn sanitize(&mut self) -> usize {
        self.genome.sanitize()
            + self.clustering_evaluation.sanitize()
            + self.cluster_characteristics.sanitize()
            + self.network_insights.sanitize()
    }
}

/// Clean a result at the pipeline exit.
pub fn finalize<T: Sanitize>(mut value: T) -> T {
    let replaced = value.sanitize();
    if replaced > 0 {
        warn!(replaced, "non-finite values replaced with 0 before export");
    }
    value
}

/// Serialize a finalized result to a JSON value.
pub fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Serialize a finalized result to pretty-printed JSON text.
pub fn to_json_string<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
