//! Orientable surfaces carrying local track frames.
//!
//! A surface defines the (u, v, w) frame a track vector lives in. Two
//! variants cover the wire readout: a plane perpendicular to the drift
//! axis rotated about x by an angle phi (wire-x measurements), and the
//! line variant whose v axis is a single wire (wire-time measurements).
//! Surfaces are shared by reference count between tracks and
//! measurements; equality is structural, never by handle identity.

use std::sync::Arc;

use argonrec_core::{TrackError, TrackVector};
use nalgebra::{Matrix2, Matrix3, Matrix3x2, Vector3};

use crate::track::Direction;

/// Angular tolerance for surface comparison (radians).
pub const PHI_TOLERANCE: f64 = 1.0e-10;
/// Spatial tolerance for surface comparison (cm).
pub const SEP_TOLERANCE: f64 = 1.0e-6;

/// Shared handle to a surface.
pub type SharedSurface = Arc<Surface>;

/// An orientable track surface.
///
/// Both variants are parameterized by an origin `(x0, y0, z0)` and a
/// rotation `phi` about the x axis. The local frame is
/// `u = x - x0`, `v = (y-y0) cos phi + (z-z0) sin phi`,
/// `w = -(y-y0) sin phi + (z-z0) cos phi`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Surface {
    /// Plane spanned by the u and v axes; track vector
    /// `(u, v, dudw, dvdw, q/p)`.
    YzPlane { x0: f64, y0: f64, z0: f64, phi: f64 },
    /// Line along the v axis; track vector `(r, v, phi, eta, q/p)` with
    /// `r` the signed impact parameter.
    YzLine { x0: f64, y0: f64, z0: f64, phi: f64 },
}

impl Surface {
    /// Plane through `(x0, y0, z0)` rotated by `phi` about x.
    #[must_use]
    pub fn yz_plane(x0: f64, y0: f64, z0: f64, phi: f64) -> SharedSurface {
        Arc::new(Self::YzPlane { x0, y0, z0, phi })
    }

    /// Line through `(x0, y0, z0)` rotated by `phi` about x.
    #[must_use]
    pub fn yz_line(x0: f64, y0: f64, z0: f64, phi: f64) -> SharedSurface {
        Arc::new(Self::YzLine { x0, y0, z0, phi })
    }

    fn params(&self) -> (f64, f64, f64, f64) {
        match *self {
            Self::YzPlane { x0, y0, z0, phi } | Self::YzLine { x0, y0, z0, phi } => {
                (x0, y0, z0, phi)
            }
        }
    }

    /// Rotation angle about the x axis (radians).
    #[must_use]
    pub fn phi(&self) -> f64 {
        self.params().3
    }

    /// Transforms a global position into the local (u, v, w) frame.
    #[must_use]
    pub fn to_local(&self, p: &Vector3<f64>) -> Vector3<f64> {
        let (x0, y0, z0, phi) = self.params();
        let (sphi, cphi) = phi.sin_cos();
        let dy = p.y - y0;
        let dz = p.z - z0;
        Vector3::new(p.x - x0, dy * cphi + dz * sphi, -dy * sphi + dz * cphi)
    }

    /// Transforms a local (u, v, w) position into the global frame.
    #[must_use]
    pub fn to_global(&self, l: &Vector3<f64>) -> Vector3<f64> {
        let (x0, y0, z0, phi) = self.params();
        let (sphi, cphi) = phi.sin_cos();
        Vector3::new(
            x0 + l.x,
            y0 + l.y * cphi - l.z * sphi,
            z0 + l.y * sphi + l.z * cphi,
        )
    }

    /// Rotates a local direction into the global frame (no translation).
    #[must_use]
    pub fn direction_to_global(&self, d: &Vector3<f64>) -> Vector3<f64> {
        let (sphi, cphi) = self.phi().sin_cos();
        Vector3::new(d.x, d.y * cphi - d.z * sphi, d.y * sphi + d.z * cphi)
    }

    /// Rotates a global direction into the local frame.
    #[must_use]
    pub fn direction_to_local(&self, d: &Vector3<f64>) -> Vector3<f64> {
        let (sphi, cphi) = self.phi().sin_cos();
        Vector3::new(d.x, d.y * cphi + d.z * sphi, -d.y * sphi + d.z * cphi)
    }

    /// Global position of a track vector on this surface.
    #[must_use]
    pub fn position(&self, v: &TrackVector) -> Vector3<f64> {
        let local = match self {
            Self::YzPlane { .. } => Vector3::new(v[0], v[1], 0.0),
            Self::YzLine { .. } => {
                let (sphi_t, cphi_t) = v[2].sin_cos();
                Vector3::new(-v[0] * sphi_t, v[1], v[0] * cphi_t)
            }
        };
        self.to_global(&local)
    }

    /// Local unit direction of a track vector.
    ///
    /// The line parameterization encodes its own direction; the plane
    /// relies on the stored direction hint, returning `None` when the
    /// hint is unknown.
    #[must_use]
    pub fn local_direction(&self, v: &TrackVector, dir: Direction) -> Option<Vector3<f64>> {
        match self {
            Self::YzPlane { .. } => {
                let sign = match dir {
                    Direction::Forward => 1.0,
                    Direction::Backward => -1.0,
                    Direction::Unknown => return None,
                };
                let norm = (1.0 + v[2] * v[2] + v[3] * v[3]).sqrt();
                Some(Vector3::new(v[2], v[3], 1.0) * (sign / norm))
            }
            Self::YzLine { .. } => {
                let (sphi_t, cphi_t) = v[2].sin_cos();
                let sech = 1.0 / v[3].cosh();
                Some(Vector3::new(cphi_t * sech, v[3].tanh(), sphi_t * sech))
            }
        }
    }

    /// Global unit direction of a track vector.
    #[must_use]
    pub fn direction(&self, v: &TrackVector, dir: Direction) -> Option<Vector3<f64>> {
        self.local_direction(v, dir)
            .map(|d| self.direction_to_global(&d))
    }

    /// The direction encoded by the surface variant, if unambiguous.
    #[must_use]
    pub fn encoded_direction(&self) -> Option<Direction> {
        match self {
            // The plane vector is symmetric under direction reversal.
            Self::YzPlane { .. } => None,
            // The line angles single out one direction.
            Self::YzLine { .. } => Some(Direction::Forward),
        }
    }

    /// Whether two surfaces have parallel frames.
    #[must_use]
    pub fn is_parallel(&self, other: &Self) -> bool {
        let same_variant = matches!(
            (self, other),
            (Self::YzPlane { .. }, Self::YzPlane { .. })
                | (Self::YzLine { .. }, Self::YzLine { .. })
        );
        same_variant && angle_diff(self.phi(), other.phi()).abs() <= PHI_TOLERANCE
    }

    /// Signed w distance from this surface to a parallel one.
    ///
    /// `None` when the surfaces are not parallel.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> Option<f64> {
        if !self.is_parallel(other) {
            return None;
        }
        let (x0, y0, z0, _) = other.params();
        Some(self.to_local(&Vector3::new(x0, y0, z0)).z)
    }

    /// Structural equality within the class tolerances.
    #[must_use]
    pub fn is_equal(&self, other: &Self) -> bool {
        if !self.is_parallel(other) {
            return false;
        }
        let (x1, y1, z1, _) = self.params();
        let (x2, y2, z2, _) = other.params();
        (x1 - x2).abs() <= SEP_TOLERANCE
            && (y1 - y2).abs() <= SEP_TOLERANCE
            && (z1 - z2).abs() <= SEP_TOLERANCE
    }

    /// Difference `v1 - v2` of two track vectors on this surface, with
    /// angle components wrapped into `(-pi, pi]`.
    #[must_use]
    pub fn vector_diff(&self, v1: &TrackVector, v2: &TrackVector) -> TrackVector {
        let mut diff = v1 - v2;
        if matches!(self, Self::YzLine { .. }) {
            diff[2] = angle_diff(v1[2], v2[2]);
        }
        diff
    }

    /// Scalar uncertainty of the pointing direction of a track state.
    ///
    /// Propagates the relevant 2x2 covariance block through the Jacobian
    /// of the unit direction vector and returns the square root of the
    /// largest eigenvalue of the resulting 3x3 covariance.
    #[must_use]
    pub fn pointing_error(&self, v: &TrackVector, e: &TrackError) -> f64 {
        let jac: Matrix3x2<f64> = match self {
            Self::YzPlane { .. } => {
                let (a, b) = (v[2], v[3]);
                let s2 = 1.0 + a * a + b * b;
                let s3 = s2 * s2.sqrt();
                Matrix3x2::new(
                    (1.0 + b * b) / s3,
                    -a * b / s3,
                    -a * b / s3,
                    (1.0 + a * a) / s3,
                    -a / s3,
                    -b / s3,
                )
            }
            Self::YzLine { .. } => {
                let (sphi_t, cphi_t) = v[2].sin_cos();
                let sech = 1.0 / v[3].cosh();
                let tanh = v[3].tanh();
                Matrix3x2::new(
                    -sphi_t * sech,
                    -cphi_t * sech * tanh,
                    0.0,
                    sech * sech,
                    cphi_t * sech,
                    -sphi_t * sech * tanh,
                )
            }
        };
        let block = Matrix2::new(e[(2, 2)], e[(2, 3)], e[(3, 2)], e[(3, 3)]);
        let cov: Matrix3<f64> = jac * block * jac.transpose();
        let eigenvalues = cov.symmetric_eigen().eigenvalues;
        eigenvalues
            .iter()
            .fold(0.0_f64, |acc, &lambda| acc.max(lambda))
            .sqrt()
    }

    /// Loose diagonal seed covariance for a fresh track on this surface.
    #[must_use]
    pub fn starting_error(&self) -> TrackError {
        let mut e = TrackError::zeros();
        e[(0, 0)] = 1000.0;
        e[(1, 1)] = 1000.0;
        e[(2, 2)] = 1.0;
        e[(3, 3)] = 1.0;
        e[(4, 4)] = 10.0;
        e
    }
}

/// Difference of two angles wrapped into `(-pi, pi]`.
fn angle_diff(a: f64, b: f64) -> f64 {
    let two_pi = 2.0 * std::f64::consts::PI;
    let mut d = (a - b) % two_pi;
    if d > std::f64::consts::PI {
        d -= two_pi;
    } else if d <= -std::f64::consts::PI {
        d += two_pi;
    }
    d
}
