//! Analysis configuration.
//!
//! One immutable [`AnalysisConfig`] is built by the caller and passed into
//! every run. Nothing here is global, so concurrent runs with different
//! configurations never interfere.

use serde::{Deserialize, Serialize};

use crate::cluster::{ClusterMethod, ClusterStrategy};
use crate::error::{Error, Result, Stage};
use crate::reduce::Umap;

/// Parameters for a full skill genome run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// DBSCAN neighborhood radius in standardized units.
    pub dbscan_eps: f64,
    /// DBSCAN minimum neighborhood size, self included.
    pub dbscan_min_samples: usize,
    /// Ward cluster count.
    pub hierarchical_k: usize,
    /// UMAP neighborhood size.
    pub umap_n_neighbors: usize,
    /// UMAP minimum embedded distance.
    pub umap_min_dist: f64,
    /// UMAP optimization epochs.
    pub umap_n_epochs: usize,
    /// Seed for the projection.
    pub seed: u64,
    /// Co-occurrence similarity an edge must exceed.
    pub similarity_threshold: f64,
    /// Length of the hub and bridge skill lists.
    pub top_n_central: usize,
    /// Clustering used for the visualization in a full run.
    pub default_method: ClusterMethod,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            dbscan_eps: 0.5,
            dbscan_min_samples: 5,
            hierarchical_k: 4,
            umap_n_neighbors: 15,
            umap_min_dist: 0.1,
            umap_n_epochs: 200,
            seed: 42,
            similarity_threshold: 0.3,
            top_n_central: 10,
            default_method: ClusterMethod::Hierarchical,
        }
    }
}

impl AnalysisConfig {
    /// Parse from JSON; absent fields take their defaults.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Set DBSCAN parameters.
    pub fn with_dbscan(mut self, eps: f64, min_samples: usize) -> Self {
        self.dbscan_eps = eps;
        self.dbscan_min_samples = min_samples;
        self
    }

    /// Set the Ward cluster count.
    pub fn with_hierarchical_k(mut self, k: usize) -> Self {
        self.hierarchical_k = k;
        self
    }

    /// Set UMAP neighborhood size and minimum distance.
    pub fn with_umap(mut self, n_neighbors: usize, min_dist: f64) -> Self {
        self.umap_n_neighbors = n_neighbors;
        self.umap_min_dist = min_dist;
        self
    }

    /// Set the projection seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the edge similarity threshold.
    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Set the hub/bridge list length.
    pub fn with_top_n_central(mut self, top_n: usize) -> Self {
        self.top_n_central = top_n;
        self
    }

    /// Set the clustering shown in a full run's visualization.
    pub fn with_default_method(mut self, method: ClusterMethod) -> Self {
        self.default_method = method;
        self
    }

    /// Check every parameter before any work is done.
    pub fn validate(&self) -> Result<()> {
        if !(self.dbscan_eps.is_finite() && self.dbscan_eps > 0.0) {
            return Err(Error::invalid_parameter(
                Stage::Cluster,
                "dbscan_eps",
                "must be positive and finite",
            ));
        }
        if self.dbscan_min_samples == 0 {
            return Err(Error::invalid_parameter(
                Stage::Cluster,
                "dbscan_min_samples",
                "must be at least 1",
            ));
        }
        if self.hierarchical_k == 0 {
            return Err(Error::invalid_parameter(
                Stage::Cluster,
                "hierarchical_k",
                "must be at least 1",
            ));
        }
        if self.umap_n_neighbors < 2 {
            return Err(Error::invalid_parameter(
                Stage::Reduce,
                "umap_n_neighbors",
                "must be at least 2",
            ));
        }
        if !(self.umap_min_dist.is_finite() && self.umap_min_dist >= 0.0) {
            return Err(Error::invalid_parameter(
                Stage::Reduce,
                "umap_min_dist",
                "must be non-negative",
            ));
        }
        if !(0.0..1.0).contains(&self.similarity_threshold) {
            return Err(Error::invalid_parameter(
                Stage::Network,
                "similarity_threshold",
                "must be in [0, 1)",
            ));
        }
        Ok(())
    }

    /// Strategy for a clustering family under this config.
    pub fn strategy(&self, method: ClusterMethod) -> ClusterStrategy {
        match method {
            ClusterMethod::Dbscan => ClusterStrategy::Density {
                eps: self.dbscan_eps,
                min_samples: self.dbscan_min_samples,
            },
            ClusterMethod::Hierarchical => ClusterStrategy::Hierarchical {
                k: self.hierarchical_k,
            },
        }
    }

    /// Reducer under this config.
    pub fn reducer(&self) -> Umap {
        Umap::new(self.umap_n_neighbors, self.umap_min_dist)
            .with_n_epochs(self.umap_n_epochs)
            .with_seed(self.seed)
    }
}
