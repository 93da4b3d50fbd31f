//! Geometry collaborator boundary.
//!
//! The detector geometry (channel maps, plane positions, wire orientations)
//! is owned by an external description; the reconstruction core only needs
//! the narrow view expressed by the [`Geometry`] trait. [`SimpleGeometry`]
//! is a rectangular single-TPC implementation for tests and seeding.

use crate::error::{Error, Result};
use crate::ids::{Channel, SignalType, View, WireId};

/// Position and orientation of a single sense wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WireInfo {
    /// Wire identifier.
    pub id: WireId,
    /// Global position of the wire center (cm).
    pub center: [f64; 3],
    /// Wire angle in the YZ plane, measured from the z axis (radians).
    pub angle: f64,
}

/// Narrow geometry interface consumed by the reconstruction core.
pub trait Geometry: Send + Sync {
    /// Number of cryostats in the detector.
    fn ncryostats(&self) -> usize;

    /// Number of TPCs in a cryostat.
    fn ntpcs(&self, cryostat: usize) -> usize;

    /// Number of wire planes in a TPC.
    fn nplanes(&self, cryostat: usize, tpc: usize) -> usize;

    /// Sign of the electron drift direction along x for a TPC (+1 or -1).
    fn drift_sign(&self, cryostat: usize, tpc: usize) -> f64;

    /// x position of a wire plane (cm).
    fn plane_x(&self, cryostat: usize, tpc: usize, plane: usize) -> f64;

    /// Distance between two planes of the same TPC (cm).
    fn plane_pitch(&self, cryostat: usize, tpc: usize, p1: usize, p2: usize) -> f64 {
        (self.plane_x(cryostat, tpc, p2) - self.plane_x(cryostat, tpc, p1)).abs()
    }

    /// View of a wire plane.
    fn view(&self, cryostat: usize, tpc: usize, plane: usize) -> View;

    /// Signal type of a wire plane.
    fn signal_type(&self, cryostat: usize, tpc: usize, plane: usize) -> SignalType;

    /// Position and orientation of a wire.
    fn wire_info(&self, wire: WireId) -> Result<WireInfo>;

    /// Wires read out by a channel.
    ///
    /// Wrapped detectors map one channel onto several physical wires, so
    /// the result is a list. An empty list is an unmapped channel.
    fn channel_to_wires(&self, channel: Channel) -> Vec<WireId>;

    /// First wire for a channel, failing on unmapped channels.
    fn channel_to_wire(&self, channel: Channel) -> Result<WireId> {
        self.channel_to_wires(channel)
            .into_iter()
            .next()
            .ok_or(Error::UnmappedChannel(channel))
    }
}

/// Rectangular single-cryostat, single-TPC geometry.
///
/// Planes sit at uniform pitch along x; wires within a plane run at a
/// per-view angle with uniform wire pitch along the view coordinate.
/// Channels number wires consecutively, plane by plane.
#[derive(Debug, Clone)]
pub struct SimpleGeometry {
    plane_x: Vec<f64>,
    views: Vec<View>,
    wire_angles: Vec<f64>,
    nwires: usize,
    wire_pitch: f64,
    drift_sign: f64,
}

impl SimpleGeometry {
    /// Creates a geometry with the given plane x positions and views.
    ///
    /// `wire_angles` must be parallel to `views`; `wire_pitch` is in cm.
    #[must_use]
    pub fn new(
        plane_x: Vec<f64>,
        views: Vec<View>,
        wire_angles: Vec<f64>,
        nwires: usize,
        wire_pitch: f64,
        drift_sign: f64,
    ) -> Self {
        assert_eq!(plane_x.len(), views.len());
        assert_eq!(plane_x.len(), wire_angles.len());
        Self {
            plane_x,
            views,
            wire_angles,
            nwires,
            wire_pitch,
            drift_sign,
        }
    }

    /// A three-plane U/V/Z geometry with uniform plane pitch.
    #[must_use]
    pub fn uvz(plane0_x: f64, plane_pitch: f64, nwires: usize, wire_pitch: f64) -> Self {
        let third = std::f64::consts::FRAC_PI_3;
        Self::new(
            vec![
                plane0_x,
                plane0_x + plane_pitch,
                plane0_x + 2.0 * plane_pitch,
            ],
            vec![View::U, View::V, View::Z],
            vec![third, -third, 0.0],
            nwires,
            wire_pitch,
            1.0,
        )
    }

    /// Wire pitch in cm.
    #[must_use]
    pub fn wire_pitch(&self) -> f64 {
        self.wire_pitch
    }
}

impl Geometry for SimpleGeometry {
    fn ncryostats(&self) -> usize {
        1
    }

    fn ntpcs(&self, _cryostat: usize) -> usize {
        1
    }

    fn nplanes(&self, _cryostat: usize, _tpc: usize) -> usize {
        self.plane_x.len()
    }

    fn drift_sign(&self, _cryostat: usize, _tpc: usize) -> f64 {
        self.drift_sign
    }

    fn plane_x(&self, _cryostat: usize, _tpc: usize, plane: usize) -> f64 {
        self.plane_x[plane]
    }

    fn view(&self, _cryostat: usize, _tpc: usize, plane: usize) -> View {
        self.views[plane]
    }

    fn signal_type(&self, cryostat: usize, tpc: usize, plane: usize) -> SignalType {
        if plane + 1 == self.nplanes(cryostat, tpc) {
            SignalType::Collection
        } else {
            SignalType::Induction
        }
    }

    fn wire_info(&self, wire: WireId) -> Result<WireInfo> {
        if wire.cryostat != 0 || wire.tpc != 0 || wire.plane >= self.plane_x.len() {
            return Err(Error::GeometryMismatch("wire outside geometry"));
        }
        if wire.wire >= self.nwires {
            return Err(Error::GeometryMismatch("wire index outside plane"));
        }
        let angle = self.wire_angles[wire.plane];
        // Wires step along the view coordinate perpendicular to their
        // direction; center them on wire (nwires-1)/2.
        let offset = (wire.wire as f64 - 0.5 * (self.nwires as f64 - 1.0)) * self.wire_pitch;
        Ok(WireInfo {
            id: wire,
            center: [
                self.plane_x[wire.plane],
                -offset * angle.sin(),
                offset * angle.cos(),
            ],
            angle,
        })
    }

    fn channel_to_wires(&self, channel: Channel) -> Vec<WireId> {
        let raw = channel.as_u32() as usize;
        let plane = raw / self.nwires;
        if plane >= self.plane_x.len() {
            return Vec::new();
        }
        vec![WireId::new(0, 0, plane, raw % self.nwires)]
    }
}
