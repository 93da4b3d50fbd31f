//! Measurement hierarchy.
//!
//! A measurement is a one-dimensional constraint on a track vector
//! component, living on its own surface. [`KHitWireX`] reduces a wire
//! hit (channel, peak time, peak-time sigma) to a drift-coordinate
//! measurement on the plane through the wire.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use argonrec_core::geometry::Geometry;
use argonrec_core::ids::Channel;
use argonrec_core::linalg;
use argonrec_detinfo::DetectorProperties;

use crate::error::{Error, Result};
use crate::surface::{SharedSurface, Surface};
use crate::track::KETrack;

static NEXT_HIT_ID: AtomicUsize = AtomicUsize::new(1);

/// Result of predicting a measurement from a track state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted measurement value.
    pub value: f64,
    /// Variance of the prediction from the track covariance.
    pub variance: f64,
    /// Measured minus predicted.
    pub residual: f64,
    /// Chi-square of the residual against the summed variance.
    pub chisq: f64,
}

/// A one-dimensional measurement usable by the fit.
///
/// The measured quantity is component `index()` of the track vector on
/// `surface()`. Prediction and update are provided in terms of that
/// contract.
pub trait KHit: Send + Sync {
    /// Measurement surface.
    fn surface(&self) -> &SharedSurface;

    /// Readout plane index the measurement came from.
    fn plane(&self) -> usize;

    /// Unique measurement id.
    fn id(&self) -> usize;

    /// Measured value.
    fn value(&self) -> f64;

    /// Measurement variance.
    fn variance(&self) -> f64;

    /// Track-vector component constrained by this measurement.
    fn index(&self) -> usize {
        0
    }

    /// Records the surface the track was on when last predicted.
    fn cache_prediction_surface(&self, surface: &SharedSurface);

    /// The surface cached by the last prediction, if still alive.
    fn prediction_surface(&self) -> Option<SharedSurface>;

    /// Predicts this measurement from a track state on the same surface.
    ///
    /// # Errors
    ///
    /// [`Error::SurfaceMismatch`] when the state is not on the
    /// measurement surface.
    fn predict(&self, tre: &KETrack) -> Result<Prediction> {
        if !tre.surface().is_equal(self.surface()) {
            return Err(Error::SurfaceMismatch("prediction off the measurement surface"));
        }
        self.cache_prediction_surface(tre.surface());
        let i = self.index();
        let value = tre.vector()[i];
        let variance = tre.error()[(i, i)];
        let residual = self.value() - value;
        let total = variance + self.variance();
        Ok(Prediction {
            value,
            variance,
            residual,
            chisq: residual * residual / total,
        })
    }

    /// Kalman update of a track state with this measurement.
    ///
    /// # Errors
    ///
    /// [`Error::SurfaceMismatch`] when the state is not on the
    /// measurement surface.
    fn update(&self, tre: &mut KETrack) -> Result<Prediction> {
        let prediction = self.predict(tre)?;
        let i = self.index();
        let total = prediction.variance + self.variance();
        let gain = tre.error().column(i) / total;
        let vector = tre.vector() + &gain * prediction.residual;
        let mut error = tre.error() - &gain * tre.error().row(i);
        linalg::symmetrize(&mut error);
        *tre.track_mut().vector_mut() = vector;
        tre.set_error(error);
        Ok(prediction)
    }
}

/// Drift-coordinate measurement from a wire hit.
///
/// The measurement surface is the plane through the wire at the wire
/// angle; the measured value is the drift coordinate converted from the
/// hit peak time, with variance `(sigma_t * C)^2` for drift coefficient
/// `C`.
pub struct KHitWireX {
    surface: SharedSurface,
    plane: usize,
    channel: Channel,
    value: f64,
    variance: f64,
    id: usize,
    prediction_surface: Mutex<Weak<Surface>>,
}

impl KHitWireX {
    /// Builds the measurement from a hit's channel and peak time.
    ///
    /// # Errors
    ///
    /// Geometry errors for unmapped channels or wires outside the
    /// description.
    pub fn new(
        geom: &dyn Geometry,
        detprop: &DetectorProperties,
        channel: Channel,
        peak_time: f64,
        sigma_peak_time: f64,
    ) -> Result<Self> {
        let wire = geom
            .channel_to_wire(channel)
            .map_err(|e| Error::Geometry(e.to_string()))?;
        let info = geom
            .wire_info(wire)
            .map_err(|e| Error::Geometry(e.to_string()))?;
        let surface = Surface::yz_plane(0.0, info.center[1], info.center[2], info.angle);
        let value = detprop.convert_ticks_to_x(peak_time, wire.plane, wire.tpc, wire.cryostat);
        let sigma_x = sigma_peak_time * detprop.x_ticks_coefficient();
        Ok(Self {
            surface,
            plane: wire.plane,
            channel,
            value,
            variance: sigma_x * sigma_x,
            id: NEXT_HIT_ID.fetch_add(1, Ordering::Relaxed),
            prediction_surface: Mutex::new(Weak::new()),
        })
    }

    /// Readout channel the measurement came from.
    #[must_use]
    pub fn channel(&self) -> Channel {
        self.channel
    }
}

impl KHit for KHitWireX {
    fn surface(&self) -> &SharedSurface {
        &self.surface
    }

    fn plane(&self) -> usize {
        self.plane
    }

    fn id(&self) -> usize {
        self.id
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn variance(&self) -> f64 {
        self.variance
    }

    fn cache_prediction_surface(&self, surface: &SharedSurface) {
        *self.prediction_surface.lock().unwrap() = Arc::downgrade(surface);
    }

    fn prediction_surface(&self) -> Option<SharedSurface> {
        self.prediction_surface.lock().unwrap().upgrade()
    }
}
