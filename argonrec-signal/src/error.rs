//! Error types for argonrec-signal.

use thiserror::Error;

/// Result type for signal-processing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Signal-processing error types.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration value out of range.
    #[error("configuration error: {0}")]
    Config(String),

    /// Input length does not match the transform size.
    #[error("size mismatch: expected {expected} samples, got {got}")]
    SizeMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// Response components may no longer be added.
    #[error("response is locked")]
    ResponseLocked,

    /// Filter components may no longer be added.
    #[error("filter is locked")]
    FilterLocked,

    /// Operation requires a locked response.
    #[error("response must be locked first")]
    ResponseNotLocked,

    /// No response component was ever configured.
    #[error("no response configured")]
    NoResponse,

    /// No filter component was ever configured.
    #[error("no filter configured")]
    NoFilter,

    /// Kernel normalization found a non-positive extremum.
    #[error("non-positive peak in kernel normalization: response {response}, deconvolved {deconvolved}")]
    NonPositivePeak {
        /// Polarity-signed extremum of the configured response.
        response: f64,
        /// Polarity-signed extremum of the deconvolved response.
        deconvolved: f64,
    },

    /// Correlation produced no usable peak.
    #[error("no correlation peak found")]
    NoPeak,
}
