//! Signal-shaping pipeline: cumulative response, noise filter, and the
//! derived deconvolution kernel.
//!
//! A shaper is configured in two phases. Response components (field
//! response, electronics response) are multiplied into the convolution
//! kernel until [`SignalShaper::lock_response`]; filter components are
//! multiplied into the frequency-domain filter until
//! [`SignalShaper::calculate_deconv_kernel`] freezes the deconvolution
//! kernel. After both locks the shaper is immutable and safe to share.

use rayon::prelude::*;
use rustfft::num_complex::Complex64;

use crate::error::{Error, Result};
use crate::fft::LarFft;

/// Magnitude below which a convolution-kernel bin is treated as silent;
/// dividing by it would only amplify noise.
const SILENT_BIN: f64 = 1.0e-4;

/// Composable convolution/deconvolution kernels for one plane.
#[derive(Debug, Clone)]
pub struct SignalShaper {
    size: usize,
    response: Vec<f64>,
    conv_kernel: Vec<Complex64>,
    filter: Vec<Complex64>,
    deconv_kernel: Vec<Complex64>,
    response_locked: bool,
    filter_locked: bool,
    normalize: bool,
    polarity: i8,
}

impl SignalShaper {
    /// Creates an unconfigured shaper for the engine's transform size.
    #[must_use]
    pub fn new(fft: &LarFft) -> Self {
        Self {
            size: fft.size(),
            response: Vec::new(),
            conv_kernel: Vec::new(),
            filter: Vec::new(),
            deconv_kernel: Vec::new(),
            response_locked: false,
            filter_locked: false,
            normalize: true,
            polarity: 1,
        }
    }

    /// Cumulative time-domain response.
    #[must_use]
    pub fn response(&self) -> &[f64] {
        &self.response
    }

    /// Convolution kernel (frequency domain).
    #[must_use]
    pub fn conv_kernel(&self) -> &[Complex64] {
        &self.conv_kernel
    }

    /// Cumulative filter (frequency domain).
    #[must_use]
    pub fn filter(&self) -> &[Complex64] {
        &self.filter
    }

    /// Deconvolution kernel; empty until calculated.
    #[must_use]
    pub fn deconv_kernel(&self) -> &[Complex64] {
        &self.deconv_kernel
    }

    /// Whether the response is frozen.
    #[must_use]
    pub fn is_response_locked(&self) -> bool {
        self.response_locked
    }

    /// Whether the filter and deconvolution kernel are frozen.
    #[must_use]
    pub fn is_filter_locked(&self) -> bool {
        self.filter_locked
    }

    fn check_fft(&self, fft: &LarFft) -> Result<()> {
        if fft.size() == self.size {
            Ok(())
        } else {
            Err(Error::SizeMismatch {
                expected: self.size,
                got: fft.size(),
            })
        }
    }

    /// Multiplies a time-domain response component into the cumulative
    /// response, or replaces it when `reset` is set or on first use.
    ///
    /// Shorter components are zero padded; longer ones are truncated.
    pub fn add_response_function(&mut self, fft: &LarFft, r: &[f64], reset: bool) -> Result<()> {
        if self.response_locked {
            return Err(Error::ResponseLocked);
        }
        self.check_fft(fft)?;

        let mut padded = vec![0.0; self.size];
        let n = r.len().min(self.size);
        padded[..n].copy_from_slice(&r[..n]);

        if reset || self.conv_kernel.is_empty() {
            self.conv_kernel = fft.do_fft(&padded)?;
            self.response = padded;
        } else {
            let component = fft.do_fft(&padded)?;
            for (bin, c) in self.conv_kernel.iter_mut().zip(&component) {
                *bin *= c;
            }
            self.response = fft.do_inv_fft(&self.conv_kernel)?;
        }
        Ok(())
    }

    /// Delays the cumulative response by `ticks` samples (may be negative
    /// or fractional).
    pub fn shift_response_time(&mut self, fft: &LarFft, ticks: f64) -> Result<()> {
        if self.response_locked {
            return Err(Error::ResponseLocked);
        }
        self.check_fft(fft)?;
        if self.conv_kernel.is_empty() {
            return Err(Error::NoResponse);
        }
        fft.shift_data(&mut self.conv_kernel, ticks)?;
        self.response = fft.do_inv_fft(&self.conv_kernel)?;
        Ok(())
    }

    /// Shifts the response so its peak lands on `tick`.
    ///
    /// The current peak is measured by correlating the response against a
    /// delta function at tick zero.
    pub fn set_peak_response_time(&mut self, fft: &LarFft, tick: f64) -> Result<()> {
        if self.response_locked {
            return Err(Error::ResponseLocked);
        }
        self.check_fft(fft)?;
        if self.response.is_empty() {
            return Err(Error::NoResponse);
        }
        let mut delta = vec![0.0; self.size];
        delta[0] = 1.0;
        let peak = fft.peak_correlation(&self.response, &delta)?;
        self.shift_response_time(fft, tick - peak)
    }

    /// Multiplies a frequency-domain filter component into the cumulative
    /// filter; the first call copies. Missing bins of a shorter component
    /// are zero.
    pub fn add_filter_function(&mut self, fft: &LarFft, f: &[Complex64]) -> Result<()> {
        if self.filter_locked {
            return Err(Error::FilterLocked);
        }
        self.check_fft(fft)?;

        let half = fft.half_size();
        let mut padded = vec![Complex64::new(0.0, 0.0); half];
        let n = f.len().min(half);
        padded[..n].copy_from_slice(&f[..n]);

        if self.filter.is_empty() {
            self.filter = padded;
        } else {
            for (bin, c) in self.filter.iter_mut().zip(&padded) {
                *bin *= c;
            }
        }
        Ok(())
    }

    /// Selects whether the deconvolved waveform is normalized to the
    /// maximum (+1) or minimum (-1) of the response.
    pub fn set_deconv_kernel_polarity(&mut self, polarity: i8) -> Result<()> {
        if self.filter_locked {
            return Err(Error::FilterLocked);
        }
        if polarity != 1 && polarity != -1 {
            return Err(Error::Config(format!(
                "polarity must be +1 or -1, got {polarity}"
            )));
        }
        self.polarity = polarity;
        Ok(())
    }

    /// Disables or re-enables peak normalization of the deconvolution
    /// kernel.
    pub fn set_normalization(&mut self, normalize: bool) -> Result<()> {
        if self.filter_locked {
            return Err(Error::FilterLocked);
        }
        self.normalize = normalize;
        Ok(())
    }

    /// Validates the configured response and freezes it.
    pub fn lock_response(&mut self, fft: &LarFft) -> Result<()> {
        self.check_fft(fft)?;
        if self.response.is_empty() || self.conv_kernel.is_empty() {
            return Err(Error::NoResponse);
        }
        if self.response.len() != self.size || self.conv_kernel.len() != fft.half_size() {
            return Err(Error::SizeMismatch {
                expected: self.size,
                got: self.response.len(),
            });
        }
        self.response_locked = true;
        Ok(())
    }

    /// Builds the deconvolution kernel `filter / conv_kernel` and freezes
    /// the filter.
    ///
    /// Bins where the convolution kernel is silent (magnitude at or below
    /// 1e-4) are zeroed rather than divided. Unless normalization is
    /// disabled, the kernel is rescaled so the peak of the deconvolved
    /// response matches the peak of the configured response, with the
    /// polarity choosing maximum or minimum.
    pub fn calculate_deconv_kernel(&mut self, fft: &LarFft) -> Result<()> {
        if !self.response_locked {
            return Err(Error::ResponseNotLocked);
        }
        if self.filter_locked {
            return Err(Error::FilterLocked);
        }
        self.check_fft(fft)?;
        if self.filter.is_empty() {
            return Err(Error::NoFilter);
        }

        self.deconv_kernel = self
            .filter
            .iter()
            .zip(&self.conv_kernel)
            .map(|(f, k)| {
                if k.norm() <= SILENT_BIN {
                    Complex64::new(0.0, 0.0)
                } else {
                    f / k
                }
            })
            .collect();

        if self.normalize {
            let mut deconv_response = self.response.clone();
            apply_kernel(fft, &mut deconv_response, &self.deconv_kernel)?;

            let response_peak = signed_extreme(&self.response, self.polarity);
            let deconv_peak = signed_extreme(&deconv_response, self.polarity);
            if response_peak <= 0.0 || deconv_peak <= 0.0 {
                return Err(Error::NonPositivePeak {
                    response: response_peak,
                    deconvolved: deconv_peak,
                });
            }
            let scale = response_peak / deconv_peak;
            for bin in &mut self.deconv_kernel {
                *bin *= scale;
            }
        }

        self.filter_locked = true;
        Ok(())
    }

    /// Convolves a waveform with the cumulative response, in place.
    pub fn convolve(&self, fft: &LarFft, waveform: &mut [f64]) -> Result<()> {
        if !self.response_locked {
            return Err(Error::ResponseNotLocked);
        }
        apply_kernel(fft, waveform, &self.conv_kernel)
    }

    /// Deconvolves a waveform with the frozen kernel, in place.
    pub fn deconvolve(&self, fft: &LarFft, waveform: &mut [f64]) -> Result<()> {
        if self.deconv_kernel.is_empty() {
            return Err(Error::NoFilter);
        }
        apply_kernel(fft, waveform, &self.deconv_kernel)
    }

    /// Deconvolves many waveforms in parallel, one transform plan per
    /// worker thread.
    pub fn deconvolve_batch(&self, fit_bins: usize, waveforms: &mut [Vec<f64>]) -> Result<()> {
        if self.deconv_kernel.is_empty() {
            return Err(Error::NoFilter);
        }
        waveforms
            .par_iter_mut()
            .map_init(
                || LarFft::new(self.size, fit_bins),
                |fft, waveform| {
                    let fft = fft.as_ref().map_err(clone_config_error)?;
                    apply_kernel(fft, waveform, &self.deconv_kernel)
                },
            )
            .collect::<Result<()>>()
    }
}

fn clone_config_error(err: &Error) -> Error {
    Error::Config(err.to_string())
}

fn apply_kernel(fft: &LarFft, waveform: &mut [f64], kernel: &[Complex64]) -> Result<()> {
    let mut spec = fft.do_fft(waveform)?;
    for (bin, k) in spec.iter_mut().zip(kernel) {
        *bin *= k;
    }
    waveform.copy_from_slice(&fft.do_inv_fft(&spec)?);
    Ok(())
}

fn signed_extreme(waveform: &[f64], polarity: i8) -> f64 {
    if polarity >= 0 {
        waveform.iter().cloned().fold(f64::MIN, f64::max)
    } else {
        -waveform.iter().cloned().fold(f64::MAX, f64::min)
    }
}
