//! Readout and simulation clock bookkeeping.
//!
//! The readout samples every wire at a fixed period; the ionization
//! simulation runs on its own TDC clock. This provider carries both
//! periods and the trigger bookkeeping that relates them.

use argonrec_core::hit::Trigger;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Clock and trigger time provider.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DetectorClocks {
    /// Period of the simulation TDC clock (ns).
    tdc_period_ns: f64,
    /// Period of the readout sampling clock (ns/tick).
    sample_period_ns: f64,
    /// Hardware trigger time (ns).
    trigger_time_ns: f64,
    /// Beam gate opening time (ns).
    beam_gate_time_ns: f64,
    /// Simulation reference time subtracted from TDC counts (ns).
    g4_ref_time_ns: f64,
    /// Trigger offset of the readout window (ticks).
    trigger_offset_ticks: f64,
    /// Start of the TPC readout window (ns).
    tpc_readout_start_ns: f64,
    /// Start of the optical readout window (ns).
    optical_readout_start_ns: f64,
    /// Trigger bit mask of the current event.
    trigger_bits: u32,
}

impl Default for DetectorClocks {
    fn default() -> Self {
        Self {
            tdc_period_ns: 500.0,
            sample_period_ns: 500.0,
            trigger_time_ns: 0.0,
            beam_gate_time_ns: 0.0,
            g4_ref_time_ns: 0.0,
            trigger_offset_ticks: 0.0,
            tpc_readout_start_ns: 0.0,
            optical_readout_start_ns: 0.0,
            trigger_bits: 0,
        }
    }
}

impl DetectorClocks {
    /// Creates a provider with default timings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the TDC clock period (ns).
    #[must_use]
    pub fn with_tdc_period_ns(mut self, period: f64) -> Self {
        self.tdc_period_ns = period;
        self
    }

    /// Sets the readout sampling period (ns/tick).
    #[must_use]
    pub fn with_sample_period_ns(mut self, period: f64) -> Self {
        self.sample_period_ns = period;
        self
    }

    /// Sets the hardware trigger time (ns).
    #[must_use]
    pub fn with_trigger_time_ns(mut self, time: f64) -> Self {
        self.trigger_time_ns = time;
        self
    }

    /// Sets the beam gate time (ns).
    #[must_use]
    pub fn with_beam_gate_time_ns(mut self, time: f64) -> Self {
        self.beam_gate_time_ns = time;
        self
    }

    /// Sets the simulation reference time (ns).
    #[must_use]
    pub fn with_g4_ref_time_ns(mut self, time: f64) -> Self {
        self.g4_ref_time_ns = time;
        self
    }

    /// Sets the trigger offset (ticks).
    #[must_use]
    pub fn with_trigger_offset_ticks(mut self, ticks: f64) -> Self {
        self.trigger_offset_ticks = ticks;
        self
    }

    /// Overwrites the per-event times from a hardware trigger record.
    pub fn apply_trigger(&mut self, trigger: &Trigger) {
        self.trigger_time_ns = trigger.trigger_time;
        self.beam_gate_time_ns = trigger.beam_gate_time;
        self.tpc_readout_start_ns = trigger.tpc_readout_start;
        self.optical_readout_start_ns = trigger.optical_readout_start;
        self.trigger_bits = trigger.bits;
    }

    /// Readout sampling period (ns/tick).
    #[must_use]
    pub fn sample_period_ns(&self) -> f64 {
        self.sample_period_ns
    }

    /// Readout sampling frequency (MHz).
    #[must_use]
    pub fn sampling_frequency_mhz(&self) -> f64 {
        1.0e3 / self.sample_period_ns
    }

    /// TDC clock period (ns).
    #[must_use]
    pub fn tdc_period_ns(&self) -> f64 {
        self.tdc_period_ns
    }

    /// Hardware trigger time (ns).
    #[must_use]
    pub fn trigger_time_ns(&self) -> f64 {
        self.trigger_time_ns
    }

    /// Beam gate time (ns).
    #[must_use]
    pub fn beam_gate_time_ns(&self) -> f64 {
        self.beam_gate_time_ns
    }

    /// Trigger offset of the readout window (ticks).
    #[must_use]
    pub fn trigger_offset_ticks(&self) -> f64 {
        self.trigger_offset_ticks
    }

    /// Start of the TPC readout window (ns).
    #[must_use]
    pub fn tpc_readout_start_ns(&self) -> f64 {
        self.tpc_readout_start_ns
    }

    /// Start of the optical readout window (ns).
    #[must_use]
    pub fn optical_readout_start_ns(&self) -> f64 {
        self.optical_readout_start_ns
    }

    /// Whether a trigger bit is set in the current event.
    #[must_use]
    pub fn triggered(&self, bit: u32) -> bool {
        bit < 32 && (self.trigger_bits >> bit) & 1 == 1
    }

    /// Converts a simulation TDC count to a readout tick.
    #[must_use]
    pub fn tdc_to_ticks(&self, tdc: f64) -> f64 {
        tdc * (self.tdc_period_ns / self.sample_period_ns)
            + (self.trigger_time_ns - self.g4_ref_time_ns) / self.sample_period_ns
            + self.trigger_offset_ticks
    }

    /// Converts a readout tick to a simulation TDC count.
    #[must_use]
    pub fn ticks_to_tdc(&self, ticks: f64) -> f64 {
        (ticks
            - self.trigger_offset_ticks
            - (self.trigger_time_ns - self.g4_ref_time_ns) / self.sample_period_ns)
            * (self.sample_period_ns / self.tdc_period_ns)
    }
}
