//! Detector-properties provider: X position versus readout ticks.
//!
//! The conversion is linear per plane: `ticks = x / (d * C) + O[c][t][p]`
//! with `C` the drift distance per tick, `d` the drift-direction sign of
//! the TPC, and `O` an offset absorbing the trigger offset, the distance
//! of the first plane from the origin, the transit times across the
//! inter-plane field gaps, and a per-view time offset. The offsets are
//! computed once per configuration and published through a `OnceLock`.

use std::sync::{Arc, OnceLock};

use argonrec_core::error::{Error, Result};
use argonrec_core::geometry::Geometry;
use argonrec_core::ids::View;

use crate::clocks::DetectorClocks;
use crate::inherit;
use crate::larprops::LarProperties;

/// Configuration of the detector-properties provider.
#[derive(Debug, Clone, PartialEq)]
pub struct DetPropsConfig {
    /// Conversion from drift electrons to ADC counts.
    pub electrons_to_adc: f64,
    /// Number of samples in one readout window.
    pub number_time_samples: u32,
    /// Size of the readout window used to derive the FFT size (ticks).
    pub readout_window_size: u32,
    /// Additive time offset for U-view planes (ticks).
    pub time_offset_u: f64,
    /// Additive time offset for V-view planes (ticks).
    pub time_offset_v: f64,
    /// Additive time offset for Z-view planes (ticks).
    pub time_offset_z: f64,
    /// Allow `number_time_samples` to be overridden from persisted
    /// parameter sets.
    pub inherit_number_time_samples: bool,
    /// Forwarded to the boundary-process simulation; unused by the
    /// coordinate transforms.
    pub simple_boundary_process: bool,
}

impl Default for DetPropsConfig {
    fn default() -> Self {
        Self {
            electrons_to_adc: 6.8906513e-3,
            number_time_samples: 6400,
            readout_window_size: 6400,
            time_offset_u: 0.0,
            time_offset_v: 0.0,
            time_offset_z: 0.0,
            inherit_number_time_samples: false,
            simple_boundary_process: true,
        }
    }
}

/// Parameter keys that identify a persisted detector-properties set.
const INHERIT_MATCH_KEYS: &[&str] = &["NumberTimeSamples", "ReadOutWindowSize", "ElectronsToADC"];

/// Drift coordinate provider for one detector configuration.
pub struct DetectorProperties {
    config: DetPropsConfig,
    lar: LarProperties,
    clocks: DetectorClocks,
    geom: Arc<dyn Geometry>,
    x_ticks_coefficient: f64,
    offsets: OnceLock<Vec<Vec<Vec<f64>>>>,
}

impl DetectorProperties {
    /// Builds the provider, validating views and field coverage up front
    /// so the lazy offset computation cannot fail.
    pub fn new(
        config: DetPropsConfig,
        lar: LarProperties,
        clocks: DetectorClocks,
        geom: Arc<dyn Geometry>,
    ) -> Result<Self> {
        let coefficient = 1.0e-3 * lar.drift_velocity_nominal() * clocks.sample_period_ns();
        if coefficient <= 0.0 {
            return Err(Error::Config(format!(
                "non-positive drift coefficient {coefficient}"
            )));
        }

        for cryostat in 0..geom.ncryostats() {
            for tpc in 0..geom.ntpcs(cryostat) {
                let nplanes = geom.nplanes(cryostat, tpc);
                if nplanes > 1 && lar.efield.len() < 3 {
                    return Err(Error::Config(format!(
                        "{nplanes}-plane TPC needs gap fields, got {} field entries",
                        lar.efield.len()
                    )));
                }
                for plane in 0..nplanes {
                    let view = geom.view(cryostat, tpc, plane);
                    if view == View::Unknown {
                        return Err(Error::UnknownView {
                            view,
                            cryostat,
                            tpc,
                            plane,
                        });
                    }
                }
            }
        }

        Ok(Self {
            config,
            lar,
            clocks,
            geom,
            x_ticks_coefficient: coefficient,
            offsets: OnceLock::new(),
        })
    }

    /// Drift distance per readout tick (cm/tick).
    #[must_use]
    pub fn x_ticks_coefficient(&self) -> f64 {
        self.x_ticks_coefficient
    }

    /// Electrons-to-ADC conversion factor.
    #[must_use]
    pub fn electrons_to_adc(&self) -> f64 {
        self.config.electrons_to_adc
    }

    /// Number of samples per readout window.
    #[must_use]
    pub fn number_time_samples(&self) -> u32 {
        self.config.number_time_samples
    }

    /// Readout window size in ticks; the FFT size request derives from it.
    #[must_use]
    pub fn readout_window_size(&self) -> u32 {
        self.config.readout_window_size
    }

    /// The LAr properties this provider was built with.
    #[must_use]
    pub fn lar(&self) -> &LarProperties {
        &self.lar
    }

    /// The clocks this provider was built with.
    #[must_use]
    pub fn clocks(&self) -> &DetectorClocks {
        &self.clocks
    }

    fn gap_coefficient(&self, gap: usize) -> f64 {
        1.0e-3
            * self
                .lar
                .drift_velocity(self.lar.efield[gap], self.lar.temperature)
            * self.clocks.sample_period_ns()
    }

    fn view_offset(&self, view: View) -> f64 {
        match view {
            View::U => self.config.time_offset_u,
            View::V => self.config.time_offset_v,
            View::Z => self.config.time_offset_z,
            // Ruled out at construction.
            View::Unknown => unreachable!("unknown view validated in new()"),
        }
    }

    fn compute_offsets(&self) -> Vec<Vec<Vec<f64>>> {
        let geom = &*self.geom;
        let mut all = Vec::with_capacity(geom.ncryostats());
        for cryostat in 0..geom.ncryostats() {
            let mut per_tpc = Vec::with_capacity(geom.ntpcs(cryostat));
            for tpc in 0..geom.ntpcs(cryostat) {
                let nplanes = geom.nplanes(cryostat, tpc);
                let dir = geom.drift_sign(cryostat, tpc);
                let x0 = geom.plane_x(cryostat, tpc, 0);
                let mut per_plane = Vec::with_capacity(nplanes);
                for plane in 0..nplanes {
                    let mut offset = -x0 / (dir * self.x_ticks_coefficient)
                        + self.clocks.trigger_offset_ticks();
                    match nplanes {
                        3 => {
                            for gap in 0..plane {
                                offset += geom.plane_pitch(cryostat, tpc, gap, gap + 1)
                                    / self.gap_coefficient(gap + 1);
                            }
                        }
                        2 => {
                            // Two-induction-plane readout: the gap index
                            // skips the absent middle plane, and the
                            // drift-volume transit to plane 0 is restated
                            // with the first gap field.
                            for gap in 0..plane {
                                offset += geom.plane_pitch(cryostat, tpc, gap, gap + 1)
                                    / self.gap_coefficient(gap + 2);
                            }
                            offset -= geom.plane_pitch(cryostat, tpc, 0, 1)
                                * (1.0 / self.x_ticks_coefficient
                                    - 1.0 / self.gap_coefficient(1));
                        }
                        _ => {}
                    }
                    offset += self.view_offset(geom.view(cryostat, tpc, plane));
                    per_plane.push(offset);
                }
                per_tpc.push(per_plane);
            }
            all.push(per_tpc);
        }
        all
    }

    /// X-to-ticks offset of a plane.
    #[must_use]
    pub fn x_ticks_offset(&self, plane: usize, tpc: usize, cryostat: usize) -> f64 {
        self.offsets.get_or_init(|| self.compute_offsets())[cryostat][tpc][plane]
    }

    /// Converts a drift position (cm) to a readout tick.
    #[must_use]
    pub fn convert_x_to_ticks(&self, x: f64, plane: usize, tpc: usize, cryostat: usize) -> f64 {
        x / (self.geom.drift_sign(cryostat, tpc) * self.x_ticks_coefficient)
            + self.x_ticks_offset(plane, tpc, cryostat)
    }

    /// Converts a readout tick to a drift position (cm).
    #[must_use]
    pub fn convert_ticks_to_x(&self, ticks: f64, plane: usize, tpc: usize, cryostat: usize) -> f64 {
        (ticks - self.x_ticks_offset(plane, tpc, cryostat))
            * self.x_ticks_coefficient
            * self.geom.drift_sign(cryostat, tpc)
    }

    /// Applies `NumberTimeSamples` overrides from persisted parameter
    /// sets, if inheritance is enabled.
    ///
    /// Historical values equal to the configuration are ignored; two
    /// disagreeing historical values are a fatal conflict.
    pub fn inherit_number_time_samples(&mut self, history: &[serde_json::Value]) -> Result<()> {
        if !self.config.inherit_number_time_samples {
            return Ok(());
        }
        let current = f64::from(self.config.number_time_samples);
        if let Some(inherited) =
            inherit::resolve_numeric("NumberTimeSamples", current, history, INHERIT_MATCH_KEYS)?
        {
            self.config.number_time_samples = inherited as u32;
        }
        Ok(())
    }
}
