use thiserror::Error;
use std::path::PathBuf;

/// Failures of the LDA computation and of reading its inputs. All of them are fatal:
/// the statistics must be fixed or regenerated upstream, since the computation is
/// deterministic and retrying over the same input gives the same outcome.
#[derive(Debug, Error)]
pub enum LdaError {

    /// Variances were accumulated against first-pass means (bw run without -2passvar),
    /// so the covariance statistics cannot be used.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The within-class scatter cannot be inverted.
    #[error("Singular matrix: {which} is not invertible (determinant {det:e})")]
    SingularMatrix { which : &'static str, det : f64 },

    #[error("Dimension mismatch: {what} (expected {expected}, found {found})")]
    DimensionMismatch { what : String, expected : usize, found : usize },

    #[error("Invalid count {count} for class {class}")]
    InvalidCount { class : usize, count : f64 },

    /// Counts sum up to zero, so there is no global mean.
    #[error("Total count is zero over {0} classes")]
    ZeroTotalCount(usize),

    /// Sw^-1 Sb has an eigenvalue with a non-negligible imaginary part.
    #[error("Complex eigenvalue {re} + {im}i at position {index}")]
    ComplexEigenvalues { index : usize, re : f64, im : f64 },

    #[error("No class statistics informed")]
    Empty,

    #[error("Error reading {path:?}: {source}")]
    Io { path : PathBuf, source : std::io::Error },

    #[error("Parse error at {path:?}, line {line}: {msg}")]
    Parse { path : PathBuf, line : usize, msg : String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error)

}

impl LdaError {

    pub(crate) fn mismatch(what : impl Into<String>, expected : usize, found : usize) -> Self {
        LdaError::DimensionMismatch { what : what.into(), expected, found }
    }

}
