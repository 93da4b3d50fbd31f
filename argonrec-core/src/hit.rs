//! Reconstructed hits and trigger records.

use crate::ids::{Channel, SignalType, View, WireId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A fitted pulse on one wire, produced by an external hit finder.
///
/// Times are in ticks of the readout clock, amplitudes in ADC counts.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hit {
    /// Readout channel.
    pub channel: Channel,
    /// First tick of the fitted region.
    pub start_tick: i32,
    /// Last tick of the fitted region.
    pub end_tick: i32,
    /// Fitted peak position (ticks).
    pub peak_time: f64,
    /// Uncertainty on the peak position (ticks).
    pub sigma_peak_time: f64,
    /// RMS of the pulse shape (ticks).
    pub rms: f64,
    /// Fitted peak amplitude.
    pub peak_amplitude: f64,
    /// Uncertainty on the peak amplitude.
    pub sigma_peak_amplitude: f64,
    /// Sum of the ADC samples in the region.
    pub summed_adc: f64,
    /// Fitted integral of the pulse.
    pub integral: f64,
    /// Uncertainty on the integral.
    pub sigma_integral: f64,
    /// Number of pulses fitted together in the region.
    pub multiplicity: i16,
    /// Index of this pulse within the fitted region.
    pub local_index: i16,
    /// Goodness of the pulse fit.
    pub goodness_of_fit: f64,
    /// Degrees of freedom of the pulse fit.
    pub dof: i32,
    /// View of the hit's plane.
    pub view: View,
    /// Signal type of the hit's plane.
    pub signal_type: SignalType,
    /// Wire the hit was found on.
    pub wire_id: WireId,
}

/// Hardware trigger record for one event.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Trigger {
    /// Trigger counter.
    pub number: u32,
    /// Hardware trigger time (ns).
    pub trigger_time: f64,
    /// Beam gate opening time (ns).
    pub beam_gate_time: f64,
    /// Start of the TPC readout window (ns).
    pub tpc_readout_start: f64,
    /// Start of the optical readout window (ns).
    pub optical_readout_start: f64,
    /// Trigger bit mask.
    pub bits: u32,
}

impl Trigger {
    /// Whether a trigger bit is set.
    #[must_use]
    pub fn triggered(&self, bit: u32) -> bool {
        bit < 32 && (self.bits >> bit) & 1 == 1
    }
}
