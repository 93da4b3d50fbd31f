//! Fixed-size linear algebra for track states.
//!
//! Track states live on a surface as a 5-vector with a 5x5 symmetric,
//! positive-definite covariance. Symmetric inversion goes through a
//! Cholesky factorization so that a non-positive-definite covariance is
//! reported instead of silently producing garbage. The [`small`] module
//! provides closed-form determinants and symmetric inverses for the 2x2,
//! 3x3 and 4x4 blocks used in pointing-error and noise calculations.

use nalgebra::{Matrix5, Vector5};

/// Track parameter 5-vector; interpretation depends on the surface.
pub type TrackVector = Vector5<f64>;

/// Track covariance; symmetric positive-definite by convention.
pub type TrackError = Matrix5<f64>;

/// Forces exact symmetry after an operation that is symmetric only up to
/// rounding (Jacobian sandwiches, weighted means).
pub fn symmetrize(e: &mut TrackError) {
    for i in 0..5 {
        for j in 0..i {
            let mean = 0.5 * (e[(i, j)] + e[(j, i)]);
            e[(i, j)] = mean;
            e[(j, i)] = mean;
        }
    }
}

/// Symmetric inverse of a positive-definite covariance.
///
/// Returns `None` when any leading minor is non-positive, leaving the
/// caller's matrices untouched.
#[must_use]
pub fn sym_invert(e: &TrackError) -> Option<TrackError> {
    let mut inv = e.cholesky()?.inverse();
    symmetrize(&mut inv);
    Some(inv)
}

/// Closed-form determinants and inverses for small symmetric matrices.
///
/// Cofactors are spelled out from Laplace expansion; the symmetric paths
/// compute each independent element once and mirror it.
pub mod small {
    use nalgebra::{Matrix2, Matrix3, Matrix4};

    /// Determinant of a 2x2 matrix.
    #[must_use]
    pub fn det2(m: &Matrix2<f64>) -> f64 {
        m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)]
    }

    /// Determinant of a 3x3 matrix.
    #[must_use]
    pub fn det3(m: &Matrix3<f64>) -> f64 {
        m[(0, 0)] * (m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)])
            - m[(0, 1)] * (m[(1, 0)] * m[(2, 2)] - m[(1, 2)] * m[(2, 0)])
            + m[(0, 2)] * (m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)])
    }

    /// Determinant of a 4x4 matrix by expansion along the first row.
    #[must_use]
    pub fn det4(m: &Matrix4<f64>) -> f64 {
        (0..4)
            .map(|j| {
                let sign = if j % 2 == 0 { 1.0 } else { -1.0 };
                sign * m[(0, j)] * minor3(m, 0, j)
            })
            .sum()
    }

    fn minor3(m: &Matrix4<f64>, row: usize, col: usize) -> f64 {
        let mut sub = Matrix3::zeros();
        let mut si = 0;
        for i in 0..4 {
            if i == row {
                continue;
            }
            let mut sj = 0;
            for j in 0..4 {
                if j == col {
                    continue;
                }
                sub[(si, sj)] = m[(i, j)];
                sj += 1;
            }
            si += 1;
        }
        det3(&sub)
    }

    /// Inverse of a symmetric 2x2 matrix; `None` if singular.
    #[must_use]
    pub fn inv_sym2(m: &Matrix2<f64>) -> Option<Matrix2<f64>> {
        let det = det2(m);
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        Some(Matrix2::new(
            m[(1, 1)] / det,
            -m[(0, 1)] / det,
            -m[(0, 1)] / det,
            m[(0, 0)] / det,
        ))
    }

    /// Inverse of a symmetric 3x3 matrix; `None` if singular.
    #[must_use]
    pub fn inv_sym3(m: &Matrix3<f64>) -> Option<Matrix3<f64>> {
        let det = det3(m);
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let c00 = m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(1, 2)];
        let c01 = m[(0, 2)] * m[(1, 2)] - m[(0, 1)] * m[(2, 2)];
        let c02 = m[(0, 1)] * m[(1, 2)] - m[(0, 2)] * m[(1, 1)];
        let c11 = m[(0, 0)] * m[(2, 2)] - m[(0, 2)] * m[(0, 2)];
        let c12 = m[(0, 1)] * m[(0, 2)] - m[(0, 0)] * m[(1, 2)];
        let c22 = m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(0, 1)];
        Some(Matrix3::new(
            c00 / det,
            c01 / det,
            c02 / det,
            c01 / det,
            c11 / det,
            c12 / det,
            c02 / det,
            c12 / det,
            c22 / det,
        ))
    }

    /// Inverse of a symmetric 4x4 matrix; `None` if singular.
    ///
    /// The ten independent cofactors are taken from Laplace expansion of
    /// the corresponding minors and mirrored into the lower triangle.
    #[must_use]
    pub fn inv_sym4(m: &Matrix4<f64>) -> Option<Matrix4<f64>> {
        let det = det4(m);
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let mut inv = Matrix4::zeros();
        for i in 0..4 {
            for j in i..4 {
                let sign = if (i + j) % 2 == 0 { 1.0 } else { -1.0 };
                let value = sign * minor3(m, i, j) / det;
                inv[(i, j)] = value;
                inv[(j, i)] = value;
            }
        }
        Some(inv)
    }
}
