//! Error type of the track-fit kernel.
//!
//! Only unrecoverable conditions surface here. Numerical failures during
//! propagation and combination (singular covariance, vanishing rotation
//! denominator, convergence) are reported as `Ok(None)` by the operation
//! so callers can drop the offending state and continue.

use thiserror::Error;

/// Fatal track-fit errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Two surfaces were required to match and do not.
    #[error("surface mismatch: {0}")]
    SurfaceMismatch(&'static str),

    /// Propagation was asked to target a surface variant it cannot reach.
    #[error("propagation target must be an yz plane")]
    TargetNotPlane,

    /// No mass is known for a PDG code.
    #[error("unsupported pdg code {0}")]
    UnknownPdg(i32),

    /// Invalid configuration value.
    #[error("configuration: {0}")]
    Config(String),

    /// Geometry lookup failure while building a measurement.
    #[error("geometry: {0}")]
    Geometry(String),
}

/// Track-fit result alias.
pub type Result<T> = std::result::Result<T, Error>;
