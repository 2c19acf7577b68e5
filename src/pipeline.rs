//! Pipeline entry points.
//!
//! ```text
//! SkillMatrix ─┬─ normalize ─┬─ cluster (dbscan, hierarchical) ─ evaluate
//!              │             └─ umap ───────────────────────────┐
//!              ├─ characterize (per clustering)                 │
//!              └─ skill graph ─ analyze ────────────── assemble ┴─ finalize
//! ```
//!
//! Each call builds its own intermediates from an immutable matrix and
//! config; a [`GenomeAnalyzer`] can be shared across threads.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::characterize::characterize;
use crate::cluster::{ClusterLabeling, ClusterMethod, Clustering};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::genome::{assemble, GenomeParts, GenomeVisualization};
use crate::matrix::{normalize, NormalizedMatrix, SkillMatrix};
use crate::metrics::{evaluate, ClusterMetrics};
use crate::network::{analyze, SkillGraph};
use crate::report::{finalize, Degeneracy, FullReport};

/// Runs the skill genome pipeline under a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct GenomeAnalyzer {
    config: AnalysisConfig,
}

struct ClusteringRun {
    labeling: ClusterLabeling,
    metrics: ClusterMetrics,
}

impl GenomeAnalyzer {
    /// Create an analyzer.
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run every stage and both clustering methods.
    ///
    /// The genome visualization uses the config's `default_method`.
    ///
    /// # Errors
    ///
    /// Parameter and algorithm failures abort the run. Degenerate inputs do
    /// not; they are listed in [`FullReport::warnings`].
    pub fn run_full_analysis(&self, matrix: &SkillMatrix) -> Result<FullReport> {
        self.config.validate()?;
        info!(
            employees = matrix.n_employees(),
            skills = matrix.n_skills(),
            "starting full skill genome analysis"
        );

        let mut warnings = Vec::new();
        if matrix.n_employees() < 2 {
            warnings.push(Degeneracy::TooFewRows {
                rows: matrix.n_employees(),
            });
        }

        let normalized = normalize(matrix);

        let dbscan = self.cluster(&normalized, ClusterMethod::Dbscan, &mut warnings)?;
        let hierarchical = self.cluster(&normalized, ClusterMethod::Hierarchical, &mut warnings)?;

        let mut clustering_evaluation = BTreeMap::new();
        let mut cluster_characteristics = BTreeMap::new();
        for (method, run) in [
            (ClusterMethod::Dbscan, &dbscan),
            (ClusterMethod::Hierarchical, &hierarchical),
        ] {
            let _ = clustering_evaluation.insert(method.to_string(), run.metrics);
            let _ = cluster_characteristics
                .insert(method.to_string(), characterize(matrix, &run.labeling)?);
        }

        let run = match self.config.default_method {
            ClusterMethod::Dbscan => &dbscan,
            ClusterMethod::Hierarchical => &hierarchical,
        };

        let graph = self.skill_graph(matrix, &mut warnings)?;
        let network_insights = analyze(&graph, self.config.top_n_central)?;
        let genome = self.assemble_genome(matrix, &normalized, run, self.config.default_method, &graph)?;

        for w in &warnings {
            warn!(?w, "degenerate result");
        }
        info!(warnings = warnings.len(), "skill genome analysis complete");

        Ok(finalize(FullReport {
            genome,
            clustering_evaluation,
            cluster_characteristics,
            network_insights,
            warnings,
        }))
    }

    /// Build only the genome visualization, clustered with `method`.
    pub fn run_visualization(
        &self,
        matrix: &SkillMatrix,
        method: ClusterMethod,
    ) -> Result<GenomeVisualization> {
        self.config.validate()?;
        info!(
            employees = matrix.n_employees(),
            skills = matrix.n_skills(),
            %method,
            "building skill genome visualization"
        );

        let mut warnings = Vec::new();
        let normalized = normalize(matrix);
        let run = self.cluster(&normalized, method, &mut warnings)?;
        let graph = self.skill_graph(matrix, &mut warnings)?;
        for w in &warnings {
            warn!(?w, "degenerate result");
        }

        let genome = self.assemble_genome(matrix, &normalized, &run, method, &graph)?;
        Ok(finalize(genome))
    }

    fn cluster(
        &self,
        normalized: &NormalizedMatrix,
        method: ClusterMethod,
        warnings: &mut Vec<Degeneracy>,
    ) -> Result<ClusteringRun> {
        let labeling = self.config.strategy(method).fit_predict(normalized.view())?;
        let metrics = evaluate(normalized.view(), &labeling)?;
        debug!(
            %method,
            clusters = metrics.cluster_count,
            noise = metrics.noise_count,
            silhouette = metrics.silhouette,
            "clustering evaluated"
        );

        let rows = labeling.len();
        if rows >= 2 {
            if labeling.noise_count() == rows {
                warnings.push(Degeneracy::AllNoise {
                    method: method.to_string(),
                });
            } else if metrics.cluster_count < 2 {
                warnings.push(Degeneracy::SingleCluster {
                    method: method.to_string(),
                    clusters: metrics.cluster_count,
                });
            }
        }

        Ok(ClusteringRun { labeling, metrics })
    }

    fn skill_graph(&self, matrix: &SkillMatrix, warnings: &mut Vec<Degeneracy>) -> Result<SkillGraph> {
        let graph = SkillGraph::build(matrix, self.config.similarity_threshold)?;
        if graph.edge_count() == 0 {
            warnings.push(Degeneracy::EmptyGraph {
                skills: graph.node_count(),
            });
        }
        Ok(graph)
    }

    fn assemble_genome(
        &self,
        matrix: &SkillMatrix,
        normalized: &NormalizedMatrix,
        run: &ClusteringRun,
        method: ClusterMethod,
        graph: &SkillGraph,
    ) -> Result<GenomeVisualization> {
        let embedding = self.config.reducer().fit_transform(normalized.view())?;
        assemble(GenomeParts {
            matrix,
            labeling: &run.labeling,
            method,
            metrics: run.metrics,
            embedding: &embedding,
            graph,
        })
    }
}

/// Full analysis with the default configuration.
pub fn run_full_analysis(matrix: &SkillMatrix) -> Result<FullReport> {
    GenomeAnalyzer::default().run_full_analysis(matrix)
}

/// Genome visualization with the default configuration.
pub fn run_visualization(matrix: &SkillMatrix, method: ClusterMethod) -> Result<GenomeVisualization> {
    GenomeAnalyzer::default().run_visualization(matrix, method)
}
