//! Weighted-average fusion of track states.
//!
//! Two states on the same surface merge by inverse-covariance weighting.
//! Numerical failure (singular summed covariance, invalid result) is
//! recoverable and reported as `Ok(None)`; a surface mismatch is a
//! usage error and fatal.

use argonrec_core::{linalg, sym_invert};

use crate::error::{Error, Result};
use crate::track::{FitStatus, KETrack, KFitTrack};

/// Merges `other` into `this` by weighted average.
///
/// The two inputs are ordered by covariance trace before the update, so
/// the result is independent of argument order up to symmetrization
/// error. Returns the chi-square of the merge, or `None` on numerical
/// failure (in which case `this` is left untouched).
///
/// # Errors
///
/// [`Error::SurfaceMismatch`] when the states live on different surfaces.
pub fn combine_track(this: &mut KETrack, other: &KETrack) -> Result<Option<f64>> {
    if !this.surface().is_equal(other.surface()) {
        return Err(Error::SurfaceMismatch("combination of different surfaces"));
    }

    // Order by covariance trace; the better-measured state is updated.
    let (first, second) = if this.error().trace() <= other.error().trace() {
        (&*this, other)
    } else {
        (other, &*this)
    };

    let dvec = first
        .surface()
        .vector_diff(first.vector(), second.vector());
    let dsum = first.error() + second.error();
    let Some(dinv) = sym_invert(&dsum) else {
        return Ok(None);
    };

    let gain = first.error() * dinv;
    let vector = first.vector() - gain * dvec;
    let mut error = first.error() - gain * first.error();
    linalg::symmetrize(&mut error);
    let chisq = (dvec.transpose() * dinv * dvec)[(0, 0)];

    let mut merged = first.clone();
    *merged.track_mut().vector_mut() = vector;
    merged.set_error(error);
    if !merged.is_valid() || !chisq.is_finite() {
        return Ok(None);
    }
    *this = merged;
    Ok(Some(chisq))
}

/// Composes two fit-status tags.
///
/// Only a filtered state and the predicted state of the opposite fit
/// direction may combine; everything else yields
/// [`FitStatus::Unknown`], meaning the combination is refused.
#[must_use]
pub fn combine_fit(left: FitStatus, right: FitStatus) -> FitStatus {
    use FitStatus::{
        Backward, BackwardPredicted, Forward, ForwardPredicted, Optimal, OptimalPredicted, Unknown,
    };
    match (left, right) {
        (Forward, BackwardPredicted)
        | (ForwardPredicted, Backward)
        | (BackwardPredicted, Forward) => Optimal,
        (ForwardPredicted, BackwardPredicted)
        | (Backward, Forward)
        | (BackwardPredicted, ForwardPredicted) => OptimalPredicted,
        _ => Unknown,
    }
}

/// Merges two fitted states, composing status and accumulating
/// chi-square. Path length is not touched.
///
/// Returns `Ok(false)` when the status combination is refused or the
/// numerical merge fails; `this` is untouched in both cases.
///
/// # Errors
///
/// [`Error::SurfaceMismatch`] when the states live on different surfaces.
pub fn combine_fit_track(this: &mut KFitTrack, other: &KFitTrack) -> Result<bool> {
    let status = combine_fit(this.status(), other.status());
    if status == FitStatus::Unknown {
        return Ok(false);
    }
    let mut merged = this.tre().clone();
    let Some(chisq_update) = combine_track(&mut merged, other.tre())? else {
        return Ok(false);
    };
    *this.tre_mut() = merged;
    this.set_chisq(this.chisq() + other.chisq() + chisq_update);
    this.set_status(status);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use argonrec_core::{TrackError, TrackVector};
    use crate::surface::Surface;
    use crate::track::{Direction, KTrack};

    fn state(vector: TrackVector, diag: f64) -> KETrack {
        let surface = Surface::yz_plane(0.0, 0.0, 0.0, 0.0);
        let track = KTrack::new(surface, vector, Direction::Forward, 13);
        KETrack::new(track, TrackError::identity() * diag)
    }

    #[test]
    fn test_identical_states_halve_covariance() {
        let vector = TrackVector::new(0.0, 0.0, 0.0, 0.0, 0.2);
        let mut a = state(vector, 1.0);
        let b = state(vector, 1.0);
        let chisq = combine_track(&mut a, &b).unwrap().unwrap();
        assert_relative_eq!(chisq, 0.0, epsilon = 1e-12);
        for i in 0..5 {
            assert_relative_eq!(a.vector()[i], vector[i], epsilon = 1e-12);
            assert_relative_eq!(a.error()[(i, i)], 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_chi_square_is_symmetric() {
        let mut a = state(TrackVector::new(1.0, 0.5, 0.1, -0.1, 0.2), 2.0);
        let mut b = state(TrackVector::new(0.0, 0.0, 0.0, 0.0, 0.25), 0.5);
        let ab = combine_track(&mut a.clone(), &b).unwrap().unwrap();
        let ba = combine_track(&mut b, &a).unwrap().unwrap();
        assert_relative_eq!(ab, ba, max_relative = 1e-9);
    }

    #[test]
    fn test_result_is_order_independent() {
        let a0 = state(TrackVector::new(1.0, 0.5, 0.1, -0.1, 0.2), 2.0);
        let b0 = state(TrackVector::new(0.0, 0.0, 0.0, 0.0, 0.25), 0.5);
        let mut ab = a0.clone();
        combine_track(&mut ab, &b0).unwrap().unwrap();
        let mut ba = b0;
        combine_track(&mut ba, &a0).unwrap().unwrap();
        for i in 0..5 {
            assert_relative_eq!(ab.vector()[i], ba.vector()[i], epsilon = 1e-9);
            for j in 0..5 {
                assert_relative_eq!(ab.error()[(i, j)], ba.error()[(i, j)], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_surface_mismatch_is_fatal() {
        let mut a = state(TrackVector::zeros(), 1.0);
        let surface = Surface::yz_plane(0.0, 0.0, 5.0, 0.0);
        let track = KTrack::new(surface, TrackVector::zeros(), Direction::Forward, 13);
        let b = KETrack::new(track, TrackError::identity());
        assert!(matches!(
            combine_track(&mut a, &b),
            Err(Error::SurfaceMismatch(_))
        ));
    }

    #[test]
    fn test_singular_sum_is_recoverable() {
        let vector = TrackVector::zeros();
        let mut a = state(vector, 1.0);
        let before = a.clone();
        let surface = Surface::yz_plane(0.0, 0.0, 0.0, 0.0);
        let track = KTrack::new(surface, vector, Direction::Forward, 13);
        // Negative covariance makes the sum indefinite.
        let b = KETrack::new(track, TrackError::identity() * -1.0);
        assert!(combine_track(&mut a, &b).unwrap().is_none());
        for i in 0..5 {
            assert_relative_eq!(a.error()[(i, i)], before.error()[(i, i)]);
        }
    }

    #[test]
    fn test_combine_fit_table() {
        use FitStatus::{
            Backward, BackwardPredicted, Forward, ForwardPredicted, Optimal, OptimalPredicted,
            Unknown,
        };
        assert_eq!(combine_fit(Forward, BackwardPredicted), Optimal);
        assert_eq!(combine_fit(ForwardPredicted, BackwardPredicted), OptimalPredicted);
        assert_eq!(combine_fit(ForwardPredicted, Backward), Optimal);
        assert_eq!(combine_fit(Backward, Forward), OptimalPredicted);
        assert_eq!(combine_fit(BackwardPredicted, Forward), Optimal);
        assert_eq!(combine_fit(BackwardPredicted, ForwardPredicted), OptimalPredicted);
        // A sample of refused combinations.
        assert_eq!(combine_fit(Forward, Forward), Unknown);
        assert_eq!(combine_fit(ForwardPredicted, ForwardPredicted), Unknown);
        assert_eq!(combine_fit(Optimal, Backward), Unknown);
        assert_eq!(combine_fit(Unknown, Forward), Unknown);
    }

    #[test]
    fn test_fit_status_closure() {
        use FitStatus::{
            Backward, BackwardPredicted, Forward, ForwardPredicted, Optimal, OptimalPredicted,
            Unknown,
        };
        let all = [
            Unknown,
            Forward,
            ForwardPredicted,
            Backward,
            BackwardPredicted,
            Optimal,
            OptimalPredicted,
        ];
        let allowed = [
            (Forward, BackwardPredicted),
            (ForwardPredicted, BackwardPredicted),
            (ForwardPredicted, Backward),
            (Backward, Forward),
            (BackwardPredicted, Forward),
            (BackwardPredicted, ForwardPredicted),
        ];
        for &left in &all {
            for &right in &all {
                let merged = combine_fit(left, right);
                if allowed.contains(&(left, right)) {
                    assert!(matches!(merged, Optimal | OptimalPredicted));
                } else {
                    assert_eq!(merged, Unknown);
                }
            }
        }
    }

    #[test]
    fn test_combine_fit_track_accumulates_chisq() {
        let vector = TrackVector::new(0.0, 0.0, 0.0, 0.0, 0.2);
        let forward = KFitTrack::new(state(vector, 1.0), 10.0, 3.0, FitStatus::Forward);
        let backward = KFitTrack::new(state(vector, 1.0), 20.0, 4.0, FitStatus::BackwardPredicted);
        let mut merged = forward.clone();
        assert!(combine_fit_track(&mut merged, &backward).unwrap());
        assert_eq!(merged.status(), FitStatus::Optimal);
        assert_relative_eq!(merged.chisq(), 7.0, epsilon = 1e-12);
        // Path length is untouched by combination.
        assert_relative_eq!(merged.path(), 10.0);

        let mut refused = forward.clone();
        let same = KFitTrack::new(state(vector, 1.0), 0.0, 0.0, FitStatus::Forward);
        assert!(!combine_fit_track(&mut refused, &same).unwrap());
        assert_eq!(refused.status(), FitStatus::Forward);
    }
}
