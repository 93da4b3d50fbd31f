//! Layered track-state records.
//!
//! [`KTrack`] is a bare state (surface, 5-vector, direction hint, PDG
//! code). [`KETrack`] adds the 5x5 covariance; [`KFitTrack`] adds the
//! fit bookkeeping (path length, chi-square, fit status).

use std::sync::Arc;

use argonrec_core::{linalg, TrackError, TrackVector};
use nalgebra::Vector3;

use crate::error::{Error, Result};
use crate::hit::KHit;
use crate::surface::{SharedSurface, Surface};

/// Direction of travel relative to the surface w axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Forward,
    Backward,
    Unknown,
}

/// Provenance of a fitted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FitStatus {
    Unknown,
    Forward,
    ForwardPredicted,
    Backward,
    BackwardPredicted,
    Optimal,
    OptimalPredicted,
}

/// Bare track state.
#[derive(Debug, Clone)]
pub struct KTrack {
    surface: SharedSurface,
    vector: TrackVector,
    direction: Direction,
    pdg: i32,
}

impl KTrack {
    #[must_use]
    pub fn new(surface: SharedSurface, vector: TrackVector, direction: Direction, pdg: i32) -> Self {
        Self {
            surface,
            vector,
            direction,
            pdg,
        }
    }

    #[must_use]
    pub fn surface(&self) -> &SharedSurface {
        &self.surface
    }

    #[must_use]
    pub fn vector(&self) -> &TrackVector {
        &self.vector
    }

    #[must_use]
    pub fn vector_mut(&mut self) -> &mut TrackVector {
        &mut self.vector
    }

    #[must_use]
    pub fn pdg(&self) -> i32 {
        self.pdg
    }

    /// Particle mass in GeV for the stored PDG code.
    pub fn mass(&self) -> Result<f64> {
        match self.pdg.abs() {
            11 => Ok(0.000_510_998_918),
            13 => Ok(0.105_658_367),
            211 => Ok(0.139_570_18),
            321 => Ok(0.493_677),
            2212 => Ok(0.938_272_013),
            _ => Err(Error::UnknownPdg(self.pdg)),
        }
    }

    /// Direction of travel, letting the surface parameterization
    /// override the stored hint when it encodes one.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.surface.encoded_direction().unwrap_or(self.direction)
    }

    /// Replaces the state in place; used by propagation.
    pub fn set_state(&mut self, surface: SharedSurface, vector: TrackVector, direction: Direction) {
        self.surface = surface;
        self.vector = vector;
        self.direction = direction;
    }

    /// Global position of the state.
    #[must_use]
    pub fn position(&self) -> Vector3<f64> {
        self.surface.position(&self.vector)
    }

    /// Global unit direction, `None` when the direction is unknown.
    #[must_use]
    pub fn momentum_direction(&self) -> Option<Vector3<f64>> {
        self.surface.direction(&self.vector, self.direction())
    }

    /// Momentum magnitude in GeV; infinite q/p maps to zero momentum.
    #[must_use]
    pub fn momentum(&self) -> f64 {
        let pinv = self.vector[4];
        if pinv == 0.0 {
            0.0
        } else {
            1.0 / pinv.abs()
        }
    }

    /// Whether the vector and direction describe a usable state.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.vector.iter().all(|x| x.is_finite()) && self.direction() != Direction::Unknown
    }
}

/// Track state with covariance.
#[derive(Debug, Clone)]
pub struct KETrack {
    track: KTrack,
    error: TrackError,
}

impl KETrack {
    #[must_use]
    pub fn new(track: KTrack, error: TrackError) -> Self {
        Self { track, error }
    }

    /// Seed state with the loose starting covariance of its surface.
    #[must_use]
    pub fn with_starting_error(track: KTrack) -> Self {
        let error = track.surface().starting_error();
        Self { track, error }
    }

    #[must_use]
    pub fn track(&self) -> &KTrack {
        &self.track
    }

    #[must_use]
    pub fn track_mut(&mut self) -> &mut KTrack {
        &mut self.track
    }

    #[must_use]
    pub fn error(&self) -> &TrackError {
        &self.error
    }

    /// Overwrites the covariance, enforcing symmetry.
    pub fn set_error(&mut self, mut error: TrackError) {
        linalg::symmetrize(&mut error);
        self.error = error;
    }

    #[must_use]
    pub fn surface(&self) -> &SharedSurface {
        self.track.surface()
    }

    #[must_use]
    pub fn vector(&self) -> &TrackVector {
        self.track.vector()
    }

    /// Scalar pointing uncertainty of this state.
    #[must_use]
    pub fn pointing_error(&self) -> f64 {
        self.track
            .surface()
            .pointing_error(self.track.vector(), &self.error)
    }

    /// Whether the state is numerically usable: finite parameters and a
    /// covariance with positive finite diagonal.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.track.is_valid()
            && (0..5).all(|i| {
                let d = self.error[(i, i)];
                d.is_finite() && d > 0.0
            })
    }
}

/// Fitted track state.
#[derive(Debug, Clone)]
pub struct KFitTrack {
    tre: KETrack,
    path: f64,
    chisq: f64,
    status: FitStatus,
}

impl KFitTrack {
    #[must_use]
    pub fn new(tre: KETrack, path: f64, chisq: f64, status: FitStatus) -> Self {
        Self {
            tre,
            path,
            chisq,
            status,
        }
    }

    #[must_use]
    pub fn tre(&self) -> &KETrack {
        &self.tre
    }

    #[must_use]
    pub fn tre_mut(&mut self) -> &mut KETrack {
        &mut self.tre
    }

    /// Accumulated path length (cm).
    #[must_use]
    pub fn path(&self) -> f64 {
        self.path
    }

    pub fn add_path(&mut self, s: f64) {
        self.path += s;
    }

    /// Accumulated chi-square.
    #[must_use]
    pub fn chisq(&self) -> f64 {
        self.chisq
    }

    pub fn set_chisq(&mut self, chisq: f64) {
        self.chisq = chisq;
    }

    #[must_use]
    pub fn status(&self) -> FitStatus {
        self.status
    }

    pub fn set_status(&mut self, status: FitStatus) {
        self.status = status;
    }
}

/// Fitted track together with the measurements that built it.
///
/// Measurements are recorded in the order they entered the fit; nothing
/// is ever removed.
pub struct KHitsTrack {
    fit: KFitTrack,
    hits: Vec<Arc<dyn KHit>>,
}

impl KHitsTrack {
    #[must_use]
    pub fn new(fit: KFitTrack) -> Self {
        Self {
            fit,
            hits: Vec::new(),
        }
    }

    #[must_use]
    pub fn fit(&self) -> &KFitTrack {
        &self.fit
    }

    #[must_use]
    pub fn fit_mut(&mut self) -> &mut KFitTrack {
        &mut self.fit
    }

    pub fn add_hit(&mut self, hit: Arc<dyn KHit>) {
        self.hits.push(hit);
    }

    /// Measurements in the order they entered the fit.
    #[must_use]
    pub fn hits(&self) -> &[Arc<dyn KHit>] {
        &self.hits
    }
}

/// Seed state on an yz line from a global position and direction.
///
/// Convenience for building the first state of a fit from a pattern
/// recognition seed.
#[must_use]
pub fn seed_track(
    position: Vector3<f64>,
    direction: Vector3<f64>,
    pinv: f64,
    pdg: i32,
) -> KETrack {
    let dir = direction.normalize();
    // Line through the seed point with the v axis along the projection
    // of the direction onto the yz plane.
    let phi_t = dir.z.atan2(dir.x);
    // atanh is singular for tracks exactly along y; clamp just inside.
    let eta = dir.y.clamp(-0.999_999_999, 0.999_999_999).atanh();
    let surface = Surface::yz_line(position.x, position.y, position.z, 0.0);
    let vector = TrackVector::new(0.0, 0.0, phi_t, eta, pinv);
    KETrack::with_starting_error(KTrack::new(surface, vector, Direction::Forward, pdg))
}
