//! argonrec-core: Foundational types for LArTPC signal-to-track reconstruction.
//!
//! This crate provides detector identifiers, the geometry collaborator
//! boundary, raw/calibrated data records with ADC compression, and the
//! fixed-size linear algebra used by the track-fitting kernel.

pub mod error;
pub mod geometry;
pub mod hit;
pub mod ids;
pub mod linalg;
pub mod raw;
pub mod wire;

pub use error::{Error, Result};
pub use geometry::{Geometry, SimpleGeometry, WireInfo};
pub use hit::{Hit, Trigger};
pub use ids::{Channel, SignalType, View, WireId};
pub use linalg::{sym_invert, TrackError, TrackVector};
pub use raw::{compress, uncompress, Compression, RawDigit};
pub use wire::{RegionOfInterest, Wire};
