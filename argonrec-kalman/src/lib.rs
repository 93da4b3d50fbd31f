//! argonrec-kalman: Kalman-filter track kernel.
//!
//! Surfaces and track states for LArTPC track fitting, straight-line
//! propagation with liquid-argon material effects, one-dimensional wire
//! measurements, and weighted-average track combination. Pattern
//! recognition is out of scope; measurements arrive already associated
//! to a candidate track.

pub mod combine;
pub mod error;
pub mod group;
pub mod hit;
pub mod propagator;
pub mod surface;
pub mod track;

pub use combine::{combine_fit, combine_fit_track, combine_track};
pub use error::{Error, Result};
pub use group::KHitGroup;
pub use hit::{KHit, KHitWireX, Prediction};
pub use propagator::{Propagator, PropagatorConfig};
pub use surface::{SharedSurface, Surface};
pub use track::{seed_track, Direction, FitStatus, KETrack, KFitTrack, KHitsTrack, KTrack};
