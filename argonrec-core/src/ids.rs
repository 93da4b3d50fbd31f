//! Detector identifiers: channels, wire IDs, views, signal types.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Readout channel number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Channel(pub u32);

impl Channel {
    /// Creates a new channel identifier.
    #[inline]
    #[must_use]
    pub fn new(channel: u32) -> Self {
        Self(channel)
    }

    /// Returns the raw channel number.
    #[inline]
    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

/// Orientation class of a wire plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum View {
    /// First induction view.
    U,
    /// Second induction view.
    V,
    /// Collection view (vertical wires).
    Z,
    /// View could not be determined.
    Unknown,
}

/// Whether a plane reads induced or collected charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SignalType {
    /// Bipolar induction signal.
    Induction,
    /// Unipolar collection signal.
    Collection,
}

/// Hierarchical wire identifier within the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WireId {
    /// Cryostat index.
    pub cryostat: usize,
    /// TPC index within the cryostat.
    pub tpc: usize,
    /// Plane index within the TPC.
    pub plane: usize,
    /// Wire index within the plane.
    pub wire: usize,
}

impl WireId {
    /// Creates a new wire identifier.
    #[inline]
    #[must_use]
    pub fn new(cryostat: usize, tpc: usize, plane: usize, wire: usize) -> Self {
        Self {
            cryostat,
            tpc,
            plane,
            wire,
        }
    }
}
