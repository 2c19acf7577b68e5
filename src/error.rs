use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result alias for `skillgenome`.
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage, used to tag parameter and algorithm failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Column standardization.
    Normalize,
    /// Density or hierarchical clustering.
    Cluster,
    /// Silhouette / Davies–Bouldin evaluation.
    Evaluate,
    /// Per-cluster skill prevalence.
    Characterize,
    /// 2D projection.
    Reduce,
    /// Skill co-occurrence graph construction.
    Network,
    /// Centrality and community detection.
    Analyze,
    /// Genome visualization assembly.
    Assemble,
    /// JSON export.
    Export,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Normalize => "normalize",
            Stage::Cluster => "cluster",
            Stage::Evaluate => "evaluate",
            Stage::Characterize => "characterize",
            Stage::Reduce => "reduce",
            Stage::Network => "network",
            Stage::Analyze => "analyze",
            Stage::Assemble => "assemble",
            Stage::Export => "export",
        };
        f.write_str(name)
    }
}

/// Errors returned by the skill genome pipeline.
///
/// Degenerate inputs (one row, a single cluster, an edgeless graph) are not
/// errors; see [`crate::report::Degeneracy`].
#[derive(Debug, Error)]
pub enum Error {
    /// Matrix shape does not match its identifiers or skill names.
    #[error("input shape mismatch: expected {expected}, actual {actual}")]
    InputShape {
        /// Expected shape description.
        expected: String,
        /// Actual shape description.
        actual: String,
    },

    /// A skill cell could not be coerced to 0 or 1.
    #[error("non-binary value {value} at row {row}, column '{column}'")]
    NonBinaryValue {
        /// Row index.
        row: usize,
        /// Skill column name.
        column: String,
        /// Offending value, rendered.
        value: String,
    },

    /// A record has no usable `employee_id`.
    #[error("record {row} has no employee_id")]
    MissingIdentifier {
        /// Record index.
        row: usize,
    },

    /// Skill names must be unique.
    #[error("duplicate skill column '{0}'")]
    DuplicateSkill(String),

    /// Invalid parameter value.
    #[error("invalid parameter '{name}' in {stage}: {message}")]
    InvalidParameter {
        /// Stage the parameter belongs to.
        stage: Stage,
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: String,
    },

    /// An algorithm failed for a reason unrelated to degenerate input.
    #[error("{stage} stage failed: {message}")]
    AlgorithmFailure {
        /// Stage that failed.
        stage: Stage,
        /// Failure description.
        message: String,
    },

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create an `InputShape` error.
    pub fn input_shape(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::InputShape {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an `InvalidParameter` error.
    pub fn invalid_parameter(stage: Stage, name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            stage,
            name,
            message: message.into(),
        }
    }

    /// Create an `AlgorithmFailure` error.
    pub fn algorithm_failure(stage: Stage, message: impl Into<String>) -> Self {
        Self::AlgorithmFailure {
            stage,
            message: message.into(),
        }
    }

    /// The stage this error is attributed to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::InvalidParameter { stage, .. } | Error::AlgorithmFailure { stage, .. } => {
                Some(*stage)
            }
            Error::Serialization(_) => Some(Stage::Export),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_stage() {
        let err = Error::invalid_parameter(Stage::Cluster, "eps", "must be positive");
        let s = err.to_string();
        assert!(s.contains("eps"));
        assert!(s.contains("cluster"));
        assert_eq!(err.stage(), Some(Stage::Cluster));
    }

    #[test]
    fn test_shape_error_has_no_stage() {
        let err = Error::input_shape("3 rows", "2 rows");
        assert!(err.to_string().contains("3 rows"));
        assert_eq!(err.stage(), None);
    }
}
