/// Fisher linear discriminant (LDA) over Gaussian class statistics: scatter matrices,
/// the generalized eigenproblem Sb x = lambda Sw x and the resulting projection.
pub mod lda;

/// Per-class statistics (accumulated means, summed full covariances and frame counts)
/// and the sources they can be read from.
pub mod stats;

/// Plain-text readers for count and covariance files, and a writer for projection matrices.
pub mod io;

/// Error type shared by the statistics readers and the LDA computation.
pub mod error;

pub use lda::{compute_lda, Lda, LdaSettings, Scatter};
pub use stats::{ClassStats, GaussianCounts, StatsSource};
pub use error::LdaError;
