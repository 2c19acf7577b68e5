//! Clustering algorithms for grouping employees by skill profile.
//!
//! Both strategies consume a column-standardized matrix and return a
//! [`ClusterLabeling`] with the same contract, so evaluation,
//! characterization and assembly never branch on the algorithm.
//!
//! ## Algorithms
//!
//! ### DBSCAN (density)
//!
//! Groups points that sit in dense neighborhoods and labels everything else
//! [`NOISE`]. The number of clusters is discovered, not requested.
//!
//! **When to use**: unknown cluster count, outlier employees with unusual
//! skill mixes.
//!
//! ### Hierarchical (Ward)
//!
//! Bottom-up: start with each point as its own cluster, repeatedly merge the
//! pair whose union increases within-cluster variance the least, and cut the
//! resulting **dendrogram** at `k` clusters. Every row is assigned.
//!
//! **When to use**: a fixed number of skill profiles is wanted for reporting.
//!
//! ## Usage
//!
//! ```rust
//! use ndarray::array;
//! use skillgenome::cluster::{ClusterStrategy, Clustering};
//!
//! let data = array![[0.0, 0.0], [0.1, 0.1], [10.0, 10.0], [10.1, 10.1]];
//!
//! let labels = ClusterStrategy::Hierarchical { k: 2 }
//!     .fit_predict(data.view())
//!     .unwrap();
//! assert_eq!(labels.labels()[0], labels.labels()[1]);
//! assert_ne!(labels.labels()[0], labels.labels()[2]);
//! ```

mod dbscan;
mod dendrogram;
mod hierarchical;
mod traits;

use std::fmt;
use std::str::FromStr;

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

pub use dbscan::Dbscan;
pub use dendrogram::{Dendrogram, Merge};
pub use hierarchical::{HierarchicalClustering, Linkage};
pub use traits::{ClusterLabeling, Clustering, NOISE};

use crate::error::{Error, Result, Stage};

/// Which clustering family to run, without its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterMethod {
    /// DBSCAN.
    Dbscan,
    /// Ward agglomerative clustering.
    #[default]
    Hierarchical,
}

impl ClusterMethod {
    /// Name used as report key.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterMethod::Dbscan => "dbscan",
            ClusterMethod::Hierarchical => "hierarchical",
        }
    }
}

impl fmt::Display for ClusterMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClusterMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dbscan" | "density" => Ok(ClusterMethod::Dbscan),
            "hierarchical" | "ward" | "agglomerative" => Ok(ClusterMethod::Hierarchical),
            _ => Err(Error::invalid_parameter(
                Stage::Cluster,
                "method",
                format!("unknown clustering method '{s}'"),
            )),
        }
    }
}

/// A clustering strategy with its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClusterStrategy {
    /// DBSCAN with neighborhood radius and minimum neighborhood size.
    Density {
        /// Neighborhood radius.
        eps: f64,
        /// Minimum neighborhood size, self included.
        min_samples: usize,
    },
    /// Ward clustering into `k` groups.
    Hierarchical {
        /// Target cluster count.
        k: usize,
    },
}

impl ClusterStrategy {
    /// The family this strategy belongs to.
    pub fn method(&self) -> ClusterMethod {
        match self {
            ClusterStrategy::Density { .. } => ClusterMethod::Dbscan,
            ClusterStrategy::Hierarchical { .. } => ClusterMethod::Hierarchical,
        }
    }
}

impl Clustering for ClusterStrategy {
    fn fit_predict(&self, data: ArrayView2<'_, f64>) -> Result<ClusterLabeling> {
        match *self {
            ClusterStrategy::Density { eps, min_samples } => {
                Dbscan::new(eps, min_samples).fit_predict(data)
            }
            ClusterStrategy::Hierarchical { k } => HierarchicalClustering::new(k).fit_predict(data),
        }
    }

    fn name(&self) -> &'static str {
        self.method().as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_from_str() {
        assert_eq!("DBSCAN".parse::<ClusterMethod>().unwrap(), ClusterMethod::Dbscan);
        assert_eq!(
            " hierarchical ".parse::<ClusterMethod>().unwrap(),
            ClusterMethod::Hierarchical
        );
        assert!("kmeans".parse::<ClusterMethod>().is_err());
    }

    #[test]
    fn test_strategy_names_match_method() {
        let s = ClusterStrategy::Density {
            eps: 0.5,
            min_samples: 2,
        };
        assert_eq!(s.name(), "dbscan");
        assert_eq!(ClusterStrategy::Hierarchical { k: 2 }.name(), "hierarchical");
    }
}
