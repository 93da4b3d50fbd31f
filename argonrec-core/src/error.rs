//! Error types for argonrec-core.

use thiserror::Error;

use crate::ids::{Channel, View};

/// Result type alias for argonrec operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal error conditions.
///
/// Recoverable numerical failures (singular covariance, step-size
/// non-convergence) are reported through return values by the operations
/// that produce them, not through this enum.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration value out of range or missing.
    #[error("configuration error: {0}")]
    Config(String),

    /// Mutation of a locked shaping or transform object.
    #[error("object is locked: {0}")]
    Locked(&'static str),

    /// A required geometric identity does not hold.
    #[error("geometry mismatch: {0}")]
    GeometryMismatch(&'static str),

    /// Channel with no wire mapping.
    #[error("channel {0:?} has no wire mapping")]
    UnmappedChannel(Channel),

    /// Plane with a view the transforms cannot handle.
    #[error("unknown view {view:?} for cryostat {cryostat} TPC {tpc} plane {plane}")]
    UnknownView {
        /// The offending view.
        view: View,
        /// Cryostat index.
        cryostat: usize,
        /// TPC index.
        tpc: usize,
        /// Plane index.
        plane: usize,
    },

    /// ADC sample index outside the digitized window.
    #[error("sample index {index} out of range (window of {len} ticks)")]
    SampleOutOfRange {
        /// Requested index.
        index: usize,
        /// Window length.
        len: usize,
    },

    /// Unknown or unsupported compression tag.
    #[error("unknown compression scheme: {0}")]
    UnknownCompression(u8),

    /// Compressed payload is truncated or internally inconsistent.
    #[error("corrupt compressed block: {0}")]
    CorruptBlock(&'static str),

    /// Two persisted parameter sets disagree with each other and with the
    /// live configuration.
    #[error("inherited configuration conflict for {key}: {first} vs {second}")]
    InheritConflict {
        /// Parameter key in conflict.
        key: &'static str,
        /// First historical value seen.
        first: f64,
        /// Conflicting historical value.
        second: f64,
    },

    /// Conditions-database failure under the fatal policy.
    #[error("conditions lookup failed: {0}")]
    Conditions(String),
}
