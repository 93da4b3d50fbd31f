//! Straight-line propagation through liquid argon.
//!
//! Moves a track state to a target plane along its own direction,
//! rotates the frame, couples position to slope in the covariance, and
//! applies material effects: continuous energy loss bending q/p and
//! multiple-Coulomb-scattering noise. Geometric and numerical failures
//! are recoverable and reported as `Ok(None)` with the input untouched.

use std::sync::Arc;

use argonrec_core::{linalg, TrackError, TrackVector};
use argonrec_detinfo::LarProperties;

use crate::error::{Error, Result};
use crate::surface::Surface;
use crate::track::{Direction, FitStatus, KETrack, KFitTrack};

/// Propagation tuning parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PropagatorConfig {
    /// Smallest material-effect substep (cm).
    pub min_step: f64,
    /// Largest fraction of kinetic energy lost in one substep.
    pub max_eloss_frac: f64,
    /// Substep iteration limit.
    pub max_nit: usize,
    /// Delta-ray cutoff for restricted dE/dx (MeV), 0 for unrestricted.
    pub tcut: f64,
    /// Distance a step may go against the direction hint (cm).
    pub wrong_dir_tolerance: f64,
    /// Whether the q/p variance follows the energy-loss derivative.
    pub prop_pinv_err: bool,
}

impl Default for PropagatorConfig {
    fn default() -> Self {
        Self {
            min_step: 0.1,
            max_eloss_frac: 0.1,
            max_nit: 10,
            tcut: 10.0,
            wrong_dir_tolerance: 0.01,
            prop_pinv_err: false,
        }
    }
}

/// Track-state propagator.
pub struct Propagator {
    config: PropagatorConfig,
    lar: LarProperties,
}

impl Propagator {
    /// Builds a propagator, validating the configuration.
    pub fn new(config: PropagatorConfig, lar: LarProperties) -> Result<Self> {
        if config.min_step <= 0.0 {
            return Err(Error::Config(format!(
                "non-positive min step {}",
                config.min_step
            )));
        }
        if !(0.0..=1.0).contains(&config.max_eloss_frac) || config.max_eloss_frac == 0.0 {
            return Err(Error::Config(format!(
                "max eloss fraction {} outside (0, 1]",
                config.max_eloss_frac
            )));
        }
        if config.max_nit == 0 {
            return Err(Error::Config("max iterations must be at least 1".into()));
        }
        if config.wrong_dir_tolerance < 0.0 {
            return Err(Error::Config(format!(
                "negative wrong-direction tolerance {}",
                config.wrong_dir_tolerance
            )));
        }
        Ok(Self { config, lar })
    }

    #[must_use]
    pub fn config(&self) -> &PropagatorConfig {
        &self.config
    }

    /// Propagates a state with covariance to a target plane.
    ///
    /// `dir` is the allowed direction of travel; a step against it by
    /// more than the configured tolerance fails. Returns the signed path
    /// length on success, `None` on a recoverable failure (the state is
    /// untouched). Targeting a line surface or starting from one is a
    /// usage error.
    ///
    /// # Errors
    ///
    /// [`Error::TargetNotPlane`] or [`Error::SurfaceMismatch`] for
    /// unsupported surface variants, [`Error::UnknownPdg`] when material
    /// effects are requested for an unknown particle.
    pub fn err_prop(
        &self,
        tre: &mut KETrack,
        target: &Arc<Surface>,
        dir: Direction,
        dodedx: bool,
        domcs: bool,
    ) -> Result<Option<f64>> {
        let Surface::YzPlane { phi: phi2, .. } = **target else {
            return Err(Error::TargetNotPlane);
        };
        let phi1 = tre.surface().phi();

        let track = tre.track();
        if track.direction() == Direction::Unknown {
            return Ok(None);
        }
        let pos = track.position();
        let Some(gdir) = track.momentum_direction() else {
            return Ok(None);
        };
        let ldir = target.direction_to_local(&gdir);
        if ldir.z == 0.0 {
            // Moving parallel to the target plane.
            return Ok(None);
        }

        let w0 = target.to_local(&pos).z;
        let s = -w0 / ldir.z;
        match dir {
            Direction::Forward if s < -self.config.wrong_dir_tolerance => return Ok(None),
            Direction::Backward if s > self.config.wrong_dir_tolerance => return Ok(None),
            _ => {}
        }

        // Straight-line translation to the target plane.
        let newpos = pos + gdir * s;
        let local = target.to_local(&newpos);
        let vec = track.vector();
        let pinv = vec[4];
        let mut vec2 = TrackVector::new(local.x, local.y, ldir.x / ldir.z, ldir.y / ldir.z, pinv);

        let (sindphi, cosdphi) = (phi2 - phi1).sin_cos();
        let j = match **tre.surface() {
            Surface::YzPlane { .. } => {
                // Frame rotation Jacobian between the two plane angles.
                let dudw1 = vec[2];
                let dvdw1 = vec[3];
                let dw2dw1 = cosdphi - dvdw1 * sindphi;
                if dw2dw1 == 0.0 {
                    return Ok(None);
                }
                let mut jr = TrackError::identity();
                jr[(1, 1)] = cosdphi;
                jr[(2, 2)] = 1.0 / dw2dw1;
                jr[(2, 3)] = dudw1 * sindphi / (dw2dw1 * dw2dw1);
                jr[(3, 3)] = 1.0 / (dw2dw1 * dw2dw1);

                // Linear-step Jacobian: the translation couples position
                // to slope through the w displacement in the target frame.
                let s_perp = s * ldir.z;
                let mut jp = TrackError::identity();
                jp[(0, 2)] = s_perp;
                jp[(1, 3)] = s_perp;
                jp * jr
            }
            Surface::YzLine { .. } => line_to_plane_jacobian(vec, sindphi, cosdphi, &ldir, s),
        };
        let mut err = j * tre.error() * j.transpose();
        linalg::symmetrize(&mut err);

        if (dodedx || domcs) && !self.material_effects(&mut vec2, &mut err, track.mass()?, s, ldir.z, dodedx, domcs) {
            return Ok(None);
        }

        let new_dir = if ldir.z > 0.0 {
            Direction::Forward
        } else {
            Direction::Backward
        };
        tre.track_mut().set_state(Arc::clone(target), vec2, new_dir);
        tre.set_error(err);
        Ok(Some(s))
    }

    /// Propagates a fitted state, accumulating path length and marking
    /// the result as predicted.
    ///
    /// # Errors
    ///
    /// Same as [`Self::err_prop`].
    pub fn err_prop_fit(
        &self,
        trf: &mut KFitTrack,
        target: &Arc<Surface>,
        dir: Direction,
        dodedx: bool,
        domcs: bool,
    ) -> Result<Option<f64>> {
        let mut tre = trf.tre().clone();
        let Some(s) = self.err_prop(&mut tre, target, dir, dodedx, domcs)? else {
            return Ok(None);
        };
        *trf.tre_mut() = tre;
        trf.add_path(s);
        trf.set_status(match trf.status() {
            FitStatus::Forward | FitStatus::ForwardPredicted => FitStatus::ForwardPredicted,
            FitStatus::Backward | FitStatus::BackwardPredicted => FitStatus::BackwardPredicted,
            FitStatus::Optimal | FitStatus::OptimalPredicted => FitStatus::OptimalPredicted,
            FitStatus::Unknown => FitStatus::Unknown,
        });
        Ok(Some(s))
    }

    /// Applies dE/dx and multiple scattering over the signed path `s`,
    /// splitting into substeps so no substep loses more than the
    /// configured kinetic-energy fraction. Returns false on iteration
    /// overflow.
    #[allow(clippy::too_many_arguments)]
    fn material_effects(
        &self,
        vec: &mut TrackVector,
        err: &mut TrackError,
        mass: f64,
        s: f64,
        dirw: f64,
        dodedx: bool,
        domcs: bool,
    ) -> bool {
        let mut remaining = s;
        let mut nit = 0;
        while remaining != 0.0 {
            nit += 1;
            if nit > self.config.max_nit {
                return false;
            }
            let pinv = vec[4];
            let mut step = remaining;
            if domcs && pinv != 0.0 {
                let p = 1.0 / pinv.abs();
                let e = (p * p + mass * mass).sqrt();
                let dedx = 1.0e-3 * self.lar.eloss(p, mass, self.config.tcut);
                if dedx > 0.0 {
                    let smax = (self.config.max_eloss_frac * (e - mass) / dedx)
                        .max(self.config.min_step);
                    if step.abs() > smax {
                        step = smax * step.signum();
                    }
                }
            }
            if dodedx {
                let (pinv2, deriv) = self.dedx_update(pinv, mass, step);
                if self.config.prop_pinv_err && deriv != 1.0 {
                    for i in 0..4 {
                        err[(i, 4)] *= deriv;
                        err[(4, i)] *= deriv;
                    }
                    err[(4, 4)] *= deriv * deriv;
                }
                vec[4] = pinv2;
                if pinv != 0.0 {
                    // Fluctuation of the applied energy loss.
                    let p = 1.0 / pinv.abs();
                    let e = (p * p + mass * mass).sqrt();
                    let evar = self.lar.eloss_var(p, mass) * step.abs();
                    err[(4, 4)] += evar * e * e / p.powi(6);
                }
            }
            if domcs {
                self.add_scattering_noise(vec, err, mass, step * dirw.signum());
            }
            remaining -= step;
        }
        true
    }

    /// Midpoint estimator of q/p after energy loss over a signed step.
    ///
    /// Returns the updated q/p and the derivative d(q/p)2 / d(q/p)1. A
    /// step that would leave negative kinetic energy is ignored.
    fn dedx_update(&self, pinv: f64, mass: f64, s: f64) -> (f64, f64) {
        if pinv == 0.0 {
            return (pinv, 1.0);
        }
        let p1 = 1.0 / pinv.abs();
        let e1 = (p1 * p1 + mass * mass).sqrt();
        let emid = e1 - 0.5e-3 * s * self.lar.eloss(p1, mass, self.config.tcut);
        if emid > mass {
            let pmid = (emid * emid - mass * mass).sqrt();
            let e2 = e1 - 1.0e-3 * s * self.lar.eloss(pmid, mass, self.config.tcut);
            if e2 > mass {
                let p2 = (e2 * e2 - mass * mass).sqrt();
                let pinv2 = (1.0 / p2).copysign(pinv);
                let deriv = pinv2.powi(3) * e2 / (pinv.powi(3) * e1);
                return (pinv2, deriv);
            }
        }
        (pinv, 1.0)
    }

    /// Adds the multiple-scattering noise block for a signed step in the
    /// target w sense.
    fn add_scattering_noise(&self, vec: &TrackVector, err: &mut TrackError, mass: f64, s: f64) {
        let pinv = vec[4].abs();
        if pinv == 0.0 || s == 0.0 {
            return;
        }
        let x0 = self.lar.radiation_length_cm();
        let range = s.abs() / x0;
        let mut theta0 = 0.0136 * pinv * (1.0 + mass * mass * pinv * pinv).sqrt();
        if range > 1.0 {
            theta0 *= 1.0 + 0.038 * range.ln();
        }
        let theta02 = theta0 * theta0 * range;

        let a = vec[2];
        let b = vec[3];
        let norm = 1.0 + a * a + b * b;
        let uu = theta02 * norm * (1.0 + a * a);
        let vv = theta02 * norm * (1.0 + b * b);
        let uv = theta02 * norm * a * b;

        let s2 = s * s / 3.0;
        let sh = s / 2.0;
        err[(0, 0)] += uu * s2;
        err[(1, 1)] += vv * s2;
        err[(0, 1)] += uv * s2;
        err[(1, 0)] += uv * s2;
        err[(0, 2)] += uu * sh;
        err[(2, 0)] += uu * sh;
        err[(1, 3)] += vv * sh;
        err[(3, 1)] += vv * sh;
        err[(0, 3)] += uv * sh;
        err[(3, 0)] += uv * sh;
        err[(1, 2)] += uv * sh;
        err[(2, 1)] += uv * sh;
        err[(2, 2)] += uu;
        err[(3, 3)] += vv;
        err[(2, 3)] += uv;
        err[(3, 2)] += uv;
    }
}

/// Exact propagation Jacobian from a line state `(r, v, phi, eta, q/p)`
/// to plane coordinates `(u, v, dudw, dvdw, q/p)` on the target, with
/// the straight-line translation folded in.
///
/// `ldir` is the track direction in the target frame and `s` the
/// signed path to the plane.
fn line_to_plane_jacobian(
    vec: &TrackVector,
    sindphi: f64,
    cosdphi: f64,
    ldir: &nalgebra::Vector3<f64>,
    s: f64,
) -> TrackError {
    let r = vec[0];
    let (sphi, cphi) = vec[2].sin_cos();
    let sech = 1.0 / vec[3].cosh();
    let th = vec[3].tanh();
    let (dx, dv, dw) = (ldir.x, ldir.y, ldir.z);

    let mut j = TrackError::zeros();
    j[(4, 4)] = 1.0;

    // Impact parameter r moves the closest-approach point.
    j[(0, 0)] = -sphi - cphi * cosdphi * dx / dw;
    j[(1, 0)] = cphi * sindphi - cphi * cosdphi * dv / dw;

    // v slides the point along the wire.
    j[(0, 1)] = sindphi * dx / dw;
    j[(1, 1)] = cosdphi + sindphi * dv / dw;

    // phi rotates both the point and the direction.
    let px_phi = -r * cphi;
    let pv_phi = -r * sphi * sindphi;
    let pw_phi = -r * sphi * cosdphi;
    let dx_phi = -sphi * sech;
    let dv_phi = cphi * sech * sindphi;
    let dw_phi = cphi * sech * cosdphi;
    let t_phi = -pw_phi / dw - s * dw_phi / dw;
    j[(0, 2)] = px_phi + t_phi * dx + s * dx_phi;
    j[(1, 2)] = pv_phi + t_phi * dv + s * dv_phi;
    j[(2, 2)] = (dx_phi * dw - dx * dw_phi) / (dw * dw);
    j[(3, 2)] = (dv_phi * dw - dv * dw_phi) / (dw * dw);

    // eta tilts the direction only.
    let dx_eta = -cphi * sech * th;
    let dv_eta = cosdphi * sech * sech - sphi * sech * th * sindphi;
    let dw_eta = -sindphi * sech * sech - sphi * sech * th * cosdphi;
    let t_eta = -s * dw_eta / dw;
    j[(0, 3)] = t_eta * dx + s * dx_eta;
    j[(1, 3)] = t_eta * dv + s * dv_eta;
    j[(2, 3)] = (dx_eta * dw - dx * dw_eta) / (dw * dw);
    j[(3, 3)] = (dv_eta * dw - dv * dw_eta) / (dw * dw);

    j
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    use crate::track::KTrack;

    fn propagator() -> Propagator {
        Propagator::new(PropagatorConfig::default(), LarProperties::default()).unwrap()
    }

    fn plane_state(z0: f64, vector: TrackVector) -> KETrack {
        let surface = Surface::yz_plane(0.0, 0.0, z0, 0.0);
        let track = KTrack::new(surface, vector, Direction::Forward, 13);
        KETrack::new(track, TrackError::identity())
    }

    #[test]
    fn test_same_plane_is_identity() {
        let prop = propagator();
        let vector = TrackVector::new(1.0, -2.0, 0.3, -0.4, 0.5);
        let mut tre = plane_state(0.0, vector);
        let target = Surface::yz_plane(0.0, 0.0, 0.0, 0.0);
        let s = prop
            .err_prop(&mut tre, &target, Direction::Unknown, false, false)
            .unwrap()
            .unwrap();
        assert_relative_eq!(s, 0.0, epsilon = 1e-12);
        for i in 0..5 {
            assert_relative_eq!(tre.vector()[i], vector[i], max_relative = 1e-12);
            for j in 0..5 {
                let expected = f64::from(u8::from(i == j));
                assert_relative_eq!(tre.error()[(i, j)], expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_translation_between_parallel_planes() {
        let prop = propagator();
        let vector = TrackVector::new(1.0, 2.0, 0.5, 0.0, 0.25);
        let mut tre = plane_state(0.0, vector);
        let target = Surface::yz_plane(0.0, 0.0, 3.0, 0.0);
        let s = prop
            .err_prop(&mut tre, &target, Direction::Forward, false, false)
            .unwrap()
            .unwrap();
        // w advances by 3 with slope (0.5, 0): path is 3*sqrt(1.25).
        assert_relative_eq!(s, 3.0 * 1.25_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(tre.vector()[0], 1.0 + 0.5 * 3.0, epsilon = 1e-12);
        assert_relative_eq!(tre.vector()[1], 2.0, epsilon = 1e-12);
        assert_relative_eq!(tre.vector()[2], 0.5, epsilon = 1e-12);
        // Position-slope coupling inflates the u variance.
        assert_relative_eq!(tre.error()[(0, 0)], 1.0 + 9.0, epsilon = 1e-12);
        assert_relative_eq!(tre.error()[(0, 2)], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_preserves_global_trajectory() {
        let prop = propagator();
        let vector = TrackVector::new(0.4, 1.0, 0.2, -0.1, 0.5);
        let mut tre = plane_state(0.0, vector);
        let before_pos = tre.track().position();
        let before_dir = tre.track().momentum_direction().unwrap();

        let target = Surface::yz_plane(0.0, 0.0, 0.0, 0.3);
        prop.err_prop(&mut tre, &target, Direction::Unknown, false, false)
            .unwrap()
            .unwrap();

        // The propagated state must lie on the original ray with the
        // original direction.
        let after_pos = tre.track().position();
        let after_dir = tre.track().momentum_direction().unwrap();
        assert_relative_eq!(after_dir, before_dir, epsilon = 1e-12);
        let offset = after_pos - before_pos;
        assert_relative_eq!(offset.normalize(), before_dir, epsilon = 1e-10);
        // And it must sit on the target plane.
        assert_relative_eq!(target.to_local(&after_pos).z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_wrong_direction_hint_fails() {
        let prop = propagator();
        let mut tre = plane_state(0.0, TrackVector::new(0.0, 0.0, 0.0, 0.0, 0.5));
        let before = tre.clone();
        let behind = Surface::yz_plane(0.0, 0.0, -5.0, 0.0);
        assert!(prop
            .err_prop(&mut tre, &behind, Direction::Forward, false, false)
            .unwrap()
            .is_none());
        // State untouched on failure.
        assert_relative_eq!(tre.vector()[0], before.vector()[0]);
        // The same step is fine as a backward propagation.
        assert!(prop
            .err_prop(&mut tre, &behind, Direction::Backward, false, false)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_parallel_direction_fails() {
        let prop = propagator();
        // Track along z; target plane contains z.
        let surface = Surface::yz_plane(0.0, 0.0, 0.0, 0.0);
        let track = KTrack::new(
            surface,
            TrackVector::new(0.0, 0.0, 0.0, 0.0, 0.5),
            Direction::Forward,
            13,
        );
        let mut tre = KETrack::new(track, TrackError::identity());
        let target = Surface::yz_plane(0.0, 5.0, 0.0, std::f64::consts::FRAC_PI_2);
        assert!(prop
            .err_prop(&mut tre, &target, Direction::Unknown, false, false)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_line_surfaces_are_rejected() {
        let prop = propagator();
        let mut tre = plane_state(0.0, TrackVector::new(0.0, 0.0, 0.0, 0.0, 0.5));
        let line = Surface::yz_line(0.0, 0.0, 1.0, 0.0);
        assert!(matches!(
            prop.err_prop(&mut tre, &line, Direction::Unknown, false, false),
            Err(Error::TargetNotPlane)
        ));
    }

    #[test]
    fn test_dedx_slows_forward_and_speeds_backward() {
        let prop = propagator();
        let target = Surface::yz_plane(0.0, 0.0, 100.0, 0.0);
        let mut tre = plane_state(0.0, TrackVector::new(0.0, 0.0, 0.0, 0.0, 1.0));
        prop.err_prop(&mut tre, &target, Direction::Forward, true, false)
            .unwrap()
            .unwrap();
        // A 1 GeV muon loses roughly 0.2 GeV over a meter of LAr.
        let p2 = tre.track().momentum();
        assert!(p2 < 1.0 && p2 > 0.6, "unexpected momentum {p2}");

        // Propagating back recovers the energy.
        let back = Surface::yz_plane(0.0, 0.0, 0.0, 0.0);
        prop.err_prop(&mut tre, &back, Direction::Backward, true, false)
            .unwrap()
            .unwrap();
        assert_relative_eq!(tre.track().momentum(), 1.0, max_relative = 1e-3);
    }

    #[test]
    fn test_mcs_inflates_covariance_symmetrically() {
        let prop = propagator();
        let target = Surface::yz_plane(0.0, 0.0, 30.0, 0.0);
        let mut tre = plane_state(0.0, TrackVector::new(0.0, 0.0, 0.1, -0.2, 2.0));
        prop.err_prop(&mut tre, &target, Direction::Forward, true, true)
            .unwrap()
            .unwrap();
        let e = tre.error();
        for i in 0..5 {
            assert!(e[(i, i)] > 0.0);
            for j in 0..5 {
                assert_relative_eq!(e[(i, j)], e[(j, i)], epsilon = 1e-12);
            }
        }
        // Slope variances must have grown beyond the transported seed.
        assert!(e[(2, 2)] > 1.0);
        assert!(e[(3, 3)] > 1.0);
        // Positive semi-definite: Cholesky of the symmetric part exists.
        assert!(argonrec_core::sym_invert(e).is_some());
    }

    #[test]
    fn test_iteration_limit_is_recoverable() {
        let config = PropagatorConfig {
            max_nit: 3,
            ..PropagatorConfig::default()
        };
        let prop = Propagator::new(config, LarProperties::default()).unwrap();
        let target = Surface::yz_plane(0.0, 0.0, 100.0, 0.0);
        // Slow muon: the eloss-limited substeps cannot cover a meter in
        // three iterations.
        let mut tre = plane_state(0.0, TrackVector::new(0.0, 0.0, 0.0, 0.0, 5.0));
        let before = tre.clone();
        assert!(prop
            .err_prop(&mut tre, &target, Direction::Forward, true, true)
            .unwrap()
            .is_none());
        assert_relative_eq!(tre.vector()[4], before.vector()[4]);
    }

    #[test]
    fn test_zero_momentum_leaves_pinv() {
        let prop = propagator();
        let target = Surface::yz_plane(0.0, 0.0, 10.0, 0.0);
        let mut tre = plane_state(0.0, TrackVector::new(0.0, 0.0, 0.0, 0.0, 0.0));
        let s = prop
            .err_prop(&mut tre, &target, Direction::Forward, true, true)
            .unwrap()
            .unwrap();
        assert_relative_eq!(s, 10.0, epsilon = 1e-12);
        assert_relative_eq!(tre.vector()[4], 0.0);
    }

    #[test]
    fn test_fit_propagation_marks_predicted() {
        let prop = propagator();
        let tre = plane_state(0.0, TrackVector::new(0.0, 0.0, 0.0, 0.0, 0.5));
        let mut trf = KFitTrack::new(tre, 5.0, 2.0, FitStatus::Forward);
        let target = Surface::yz_plane(0.0, 0.0, 4.0, 0.0);
        let s = prop
            .err_prop_fit(&mut trf, &target, Direction::Forward, false, false)
            .unwrap()
            .unwrap();
        assert_relative_eq!(s, 4.0, epsilon = 1e-12);
        assert_relative_eq!(trf.path(), 9.0, epsilon = 1e-12);
        assert_eq!(trf.status(), FitStatus::ForwardPredicted);
        assert_relative_eq!(trf.chisq(), 2.0);
    }

    #[test]
    fn test_seed_on_line_reaches_a_plane() {
        let prop = propagator();
        let seed = crate::track::seed_track(
            Vector3::new(5.0, 1.0, -2.0),
            Vector3::new(0.1, 0.2, 1.0).normalize(),
            0.5,
            13,
        );
        let before_pos = seed.track().position();
        let before_dir = seed.track().momentum_direction().unwrap();

        let mut tre = seed;
        let target = Surface::yz_plane(0.0, 0.0, 4.0, 0.0);
        let s = prop
            .err_prop(&mut tre, &target, Direction::Forward, false, false)
            .unwrap()
            .unwrap();
        assert!(s > 0.0);
        assert!(Arc::ptr_eq(tre.surface(), &target));

        // Trajectory is unchanged by the frame change.
        let after_pos = tre.track().position();
        assert_relative_eq!(
            tre.track().momentum_direction().unwrap(),
            before_dir,
            epsilon = 1e-10
        );
        assert_relative_eq!((after_pos - before_pos).normalize(), before_dir, epsilon = 1e-10);
        assert_relative_eq!(target.to_local(&after_pos).z, 0.0, epsilon = 1e-12);
        // The transported seed covariance stays usable.
        assert!(tre.is_valid());
        assert!(argonrec_core::sym_invert(tre.error()).is_some());
    }

    #[test]
    fn test_unknown_pdg_without_material_is_fine() {
        let prop = propagator();
        let surface = Surface::yz_plane(0.0, 0.0, 0.0, 0.0);
        let track = KTrack::new(
            surface,
            TrackVector::new(0.0, 0.0, 0.0, 0.0, 0.5),
            Direction::Forward,
            999,
        );
        let mut tre = KETrack::new(track, TrackError::identity());
        let target = Surface::yz_plane(0.0, 0.0, 1.0, 0.0);
        assert!(prop
            .err_prop(&mut tre, &target, Direction::Forward, false, false)
            .unwrap()
            .is_some());
        assert!(matches!(
            prop.err_prop(&mut tre, &target, Direction::Forward, true, false),
            Err(Error::UnknownPdg(999))
        ));
    }
}
