//! argonrec-signal: Waveform processing for LArTPC wire signals.
//!
//! [`LarFft`] is a power-of-two real-to-half-complex FFT engine with
//! peak-correlation alignment; [`SignalShaper`] composes detector response
//! and noise-filter components into convolution and deconvolution kernels
//! applied to digitized waveforms.

pub mod error;
pub mod fft;
pub mod shaping;

pub use error::{Error, Result};
pub use fft::LarFft;
pub use shaping::SignalShaper;
