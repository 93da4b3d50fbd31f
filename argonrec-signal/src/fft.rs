//! Power-of-two real-to-half-complex FFT engine.
//!
//! The engine owns its transform plans (rebuilt only on an explicit
//! [`LarFft::resize`]) and exposes the waveform operations the shaping
//! pipeline is built on: convolution, correlation, deconvolution,
//! frequency-domain shifting, and sub-bin peak correlation.

use std::sync::Arc;

use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use crate::error::{Error, Result};

/// One-dimensional FFT engine of fixed power-of-two size.
pub struct LarFft {
    size: usize,
    fit_bins: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl std::fmt::Debug for LarFft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LarFft")
            .field("size", &self.size)
            .field("fit_bins", &self.fit_bins)
            .finish()
    }
}

impl LarFft {
    /// Creates an engine for at least `size_request` samples.
    ///
    /// The transform size is the next power of two; `fit_bins` is the odd
    /// window length of the peak-correlation Gaussian fit.
    pub fn new(size_request: usize, fit_bins: usize) -> Result<Self> {
        if size_request == 0 {
            return Err(Error::Config("transform size must be positive".into()));
        }
        if fit_bins % 2 == 0 || fit_bins < 3 {
            return Err(Error::Config(format!(
                "fit window must be odd and at least 3, got {fit_bins}"
            )));
        }
        let size = size_request.next_power_of_two();
        let mut planner = FftPlanner::new();
        Ok(Self {
            size,
            fit_bins,
            forward: planner.plan_fft_forward(size),
            inverse: planner.plan_fft_inverse(size),
        })
    }

    /// Transform size.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of retained frequency bins (N/2 + 1).
    #[must_use]
    pub fn half_size(&self) -> usize {
        self.size / 2 + 1
    }

    /// Peak-fit window length.
    #[must_use]
    pub fn fit_bins(&self) -> usize {
        self.fit_bins
    }

    /// Replans for a new size. Only meant for run boundaries.
    pub fn resize(&mut self, size_request: usize) -> Result<()> {
        let replanned = Self::new(size_request, self.fit_bins)?;
        *self = replanned;
        Ok(())
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if len == self.size {
            Ok(())
        } else {
            Err(Error::SizeMismatch {
                expected: self.size,
                got: len,
            })
        }
    }

    fn check_half_len(&self, len: usize) -> Result<()> {
        if len == self.half_size() {
            Ok(())
        } else {
            Err(Error::SizeMismatch {
                expected: self.half_size(),
                got: len,
            })
        }
    }

    /// Forward transform of a real waveform into N/2+1 frequency bins.
    pub fn do_fft(&self, input: &[f64]) -> Result<Vec<Complex64>> {
        self.check_len(input.len())?;
        let mut buffer: Vec<Complex64> =
            input.iter().map(|&x| Complex64::new(x, 0.0)).collect();
        self.forward.process(&mut buffer);
        buffer.truncate(self.half_size());
        Ok(buffer)
    }

    /// Inverse transform back to a real waveform, normalized by 1/N.
    pub fn do_inv_fft(&self, spectrum: &[Complex64]) -> Result<Vec<f64>> {
        self.check_half_len(spectrum.len())?;
        let mut buffer = vec![Complex64::new(0.0, 0.0); self.size];
        buffer[..spectrum.len()].copy_from_slice(spectrum);
        // Hermitian completion of the upper half.
        for k in spectrum.len()..self.size {
            buffer[k] = spectrum[self.size - k].conj();
        }
        self.inverse.process(&mut buffer);
        let norm = 1.0 / self.size as f64;
        Ok(buffer.iter().map(|c| c.re * norm).collect())
    }

    /// Multiplies bin k by exp(-2 pi i s k / N), delaying by `shift` samples.
    pub fn shift_data(&self, spectrum: &mut [Complex64], shift: f64) -> Result<()> {
        self.check_half_len(spectrum.len())?;
        let factor = -2.0 * std::f64::consts::PI * shift / self.size as f64;
        for (k, bin) in spectrum.iter_mut().enumerate() {
            *bin *= Complex64::from_polar(1.0, factor * k as f64);
        }
        Ok(())
    }

    /// Replaces `a` with the circular convolution of `a` and `b`.
    pub fn convolute(&self, a: &mut [f64], b: &[f64]) -> Result<()> {
        let mut spec = self.do_fft(a)?;
        let kernel = self.do_fft(b)?;
        for (bin, k) in spec.iter_mut().zip(&kernel) {
            *bin *= k;
        }
        a.copy_from_slice(&self.do_inv_fft(&spec)?);
        Ok(())
    }

    /// Replaces `a` with the circular correlation of `a` against `b`.
    ///
    /// The result peaks at the lag by which `a` is delayed relative to `b`.
    pub fn correlate(&self, a: &mut [f64], b: &[f64]) -> Result<()> {
        let mut spec = self.do_fft(a)?;
        let kernel = self.do_fft(b)?;
        for (bin, k) in spec.iter_mut().zip(&kernel) {
            *bin *= k.conj();
        }
        a.copy_from_slice(&self.do_inv_fft(&spec)?);
        Ok(())
    }

    /// Replaces `a` with the circular deconvolution of `a` by `b`.
    pub fn deconvolute(&self, a: &mut [f64], b: &[f64]) -> Result<()> {
        let mut spec = self.do_fft(a)?;
        let kernel = self.do_fft(b)?;
        for (bin, k) in spec.iter_mut().zip(&kernel) {
            *bin /= k;
        }
        a.copy_from_slice(&self.do_inv_fft(&spec)?);
        Ok(())
    }

    /// Sub-bin lag of `a` relative to `b`.
    ///
    /// Finds the bin-wise argmax of the correlation, then fits a Gaussian
    /// (a parabola in log amplitude) to `fit_bins` samples around it with
    /// wraparound indexing. Lags beyond N/2 are reported as negative.
    pub fn peak_correlation(&self, a: &[f64], b: &[f64]) -> Result<f64> {
        let mut corr = a.to_vec();
        self.correlate(&mut corr, b)?;

        let (peak_bin, &peak_value) = corr
            .iter()
            .enumerate()
            .max_by(|(_, x), (_, y)| x.total_cmp(y))
            .ok_or(Error::NoPeak)?;
        if peak_value <= 0.0 {
            return Err(Error::NoPeak);
        }

        let half = (self.fit_bins / 2) as isize;
        let n = self.size as isize;
        let mut s2 = 0.0;
        let mut s4 = 0.0;
        let mut t0 = 0.0;
        let mut t1 = 0.0;
        let mut t2 = 0.0;
        let mut usable = true;
        for off in -half..=half {
            let idx = (peak_bin as isize + off).rem_euclid(n) as usize;
            if corr[idx] <= 0.0 {
                usable = false;
                break;
            }
            let x = off as f64;
            let z = corr[idx].ln();
            s2 += x * x;
            s4 += x * x * x * x;
            t0 += z;
            t1 += x * z;
            t2 += x * x * z;
        }

        let mut peak = peak_bin as f64;
        if usable {
            let npts = self.fit_bins as f64;
            let c1 = t1 / s2;
            let denom = npts * s4 - s2 * s2;
            let c2 = (npts * t2 - s2 * t0) / denom;
            if c2 < 0.0 {
                let offset = -0.5 * c1 / c2;
                if offset.abs() <= half as f64 {
                    peak += offset;
                }
            }
        }

        // Map the upper half of the lag axis to negative shifts.
        if peak > self.size as f64 / 2.0 {
            peak -= self.size as f64;
        }
        Ok(peak)
    }

    /// Shifts `a` into phase with `b`; if `add`, accumulates `b` into the
    /// aligned `a`. Returns the measured lag.
    pub fn aligned_sum(&self, a: &mut [f64], b: &[f64], add: bool) -> Result<f64> {
        let lag = self.peak_correlation(a, b)?;
        let mut spec = self.do_fft(a)?;
        self.shift_data(&mut spec, -lag)?;
        let shifted = self.do_inv_fft(&spec)?;
        a.copy_from_slice(&shifted);
        if add {
            for (x, y) in a.iter_mut().zip(b) {
                *x += y;
            }
        }
        Ok(lag)
    }
}
