use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the Zig-Zag sampler core.
///
/// Numeric degeneracy is reported, never repaired: a NaN gradient or a zero mass
/// surfaces here so the enclosing MCMC iteration can reject or abort.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid user or API parameter.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// A buffer handed in by the caller or returned by an oracle has the wrong length.
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// NaN or infinite values in trajectory state (e.g. from the gradient oracle).
    #[error("non-finite value: {0}")]
    NonFinite(String),

    /// Precision-column request for a coordinate outside `0..dim`.
    #[error("coordinate index {index} out of range for dimension {dim}")]
    IndexOutOfRange { index: usize, dim: usize },

    /// The worker pool for parallel event search could not be created.
    #[error("thread pool error: {0}")]
    ThreadPool(String),
}
