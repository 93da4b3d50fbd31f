//! Liquid-argon material properties and energy-loss physics.
//!
//! All formulas run on configured scalars only; nothing here touches a
//! database or geometry. Units: E-fields in kV/cm, temperatures in K,
//! momenta and masses in GeV, dQ/dx in electrons/cm, dE/dx in MeV/cm.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Birks model parameter A.
pub const RECOMB_A: f64 = 0.800;
/// Birks model parameter k (kV/cm)(g/cm^2)/MeV.
pub const RECOMB_K: f64 = 0.0486;
/// Modified-Box model parameter alpha.
pub const MODBOX_A: f64 = 0.930;
/// Modified-Box model parameter B (kV/cm)(g/cm^2)/MeV.
pub const MODBOX_B: f64 = 0.212;
/// Ionization electrons per GeV of deposited energy.
pub const GEV_TO_ELECTRONS: f64 = 4.237e7;

/// 4 pi N_A r_e^2 m_e c^2 (MeV cm^2 / mol).
const BETHE_K: f64 = 0.307075;
/// Electron mass (MeV/c^2).
const ELECTRON_MASS_MEV: f64 = 0.510998918;

/// Sternheimer density-effect parameterization.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sternheimer {
    /// Density-effect coefficient a.
    pub a: f64,
    /// Density-effect exponent k.
    pub k: f64,
    /// Lower log10(beta gamma) bound of the transition region.
    pub x0: f64,
    /// Upper log10(beta gamma) bound of the transition region.
    pub x1: f64,
    /// Density-effect plateau constant.
    pub cbar: f64,
}

/// Liquid-argon property provider.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LarProperties {
    /// Electric field per drift region, kV/cm; entry 0 is the main drift
    /// volume, further entries the inter-plane gaps.
    pub efield: Vec<f64>,
    /// LAr temperature (K).
    pub temperature: f64,
    /// Drift electron lifetime (us).
    pub electron_lifetime: f64,
    /// Radiation length (g/cm^2).
    pub radiation_length: f64,
    /// Atomic number Z.
    pub atomic_number: f64,
    /// Atomic mass A (g/mol).
    pub atomic_mass: f64,
    /// Mean excitation energy I (eV).
    pub excitation_energy: f64,
    /// Density-effect parameters.
    pub sternheimer: Sternheimer,
}

impl Default for LarProperties {
    fn default() -> Self {
        Self {
            efield: vec![0.5, 0.666, 0.8],
            temperature: 87.3,
            electron_lifetime: 3000.0,
            radiation_length: 19.55,
            atomic_number: 18.0,
            atomic_mass: 39.948,
            excitation_energy: 188.0,
            sternheimer: Sternheimer {
                a: 0.1956,
                k: 3.0,
                x0: 0.2,
                x1: 3.0,
                cbar: 5.2146,
            },
        }
    }
}

impl LarProperties {
    /// E-field in the main drift volume (kV/cm).
    #[must_use]
    pub fn drift_field(&self) -> f64 {
        self.efield.first().copied().unwrap_or(0.0)
    }

    /// LAr density at a temperature (g/cm^3).
    #[must_use]
    pub fn density_at(temperature: f64) -> f64 {
        -0.00615 * temperature + 1.928
    }

    /// LAr density at the configured temperature (g/cm^3).
    #[must_use]
    pub fn density(&self) -> f64 {
        Self::density_at(self.temperature)
    }

    /// Radiation length in cm at the configured temperature.
    #[must_use]
    pub fn radiation_length_cm(&self) -> f64 {
        self.radiation_length / self.density()
    }

    /// Electron drift velocity in cm/us.
    ///
    /// Walkowiak parameterization above 0.699 kV/cm, ICARUS below
    /// 0.619 kV/cm, linearly blended in between; a linear extrapolation
    /// takes over in the low-field region.
    #[must_use]
    pub fn drift_velocity(&self, efield: f64, temperature: f64) -> f64 {
        let tshift = temperature - 87.203;
        let x_fit = 0.0938163 - 0.0052563 * tshift - 0.000_147_0 * tshift * tshift;
        let u_fit = 5.18406 + 0.01448 * tshift
            - 0.003497 * tshift * tshift
            - 0.000516 * tshift * tshift * tshift;

        // ICARUS parameter set.
        let (p1, p2, p3, p4, p5, p6, t0) =
            (-0.04640, 0.0171, 1.88125, 0.99408, 0.01172, 4.20214, 105.749);
        // Walkowiak parameter set.
        let (p1w, p2w, p3w, p4w, p5w, p6w, t0w) =
            (-0.01481, -0.0075, 0.141, 12.4, 1.627, 0.317, 90.371);

        let icarus = |e: f64| {
            (p1 * (temperature - t0) + 1.0) * (p3 * e * (1.0 + p4 / e).ln() + p5 * e.powf(p6))
                + p2 * (temperature - t0)
        };
        let walkowiak = |e: f64| {
            (p1w * (temperature - t0w) + 1.0)
                * (p3w * e * (1.0 + p4w / e).ln() + p5w * e.powf(p6w))
                + p2w * (temperature - t0w)
        };

        let vd = if efield < x_fit {
            efield * u_fit
        } else if efield < 0.619 {
            icarus(efield)
        } else if efield < 0.699 {
            // Linear blend over the 0.619-0.699 kV/cm window.
            12.5 * (efield - 0.619) * walkowiak(efield)
                + 12.5 * (0.699 - efield) * icarus(efield)
        } else {
            walkowiak(efield)
        };
        vd / 10.0
    }

    /// Drift velocity in the main drift volume at the configured
    /// temperature (cm/us).
    #[must_use]
    pub fn drift_velocity_nominal(&self) -> f64 {
        self.drift_velocity(self.drift_field(), self.temperature)
    }

    /// Birks recombination: dE/dx in MeV/cm from dQ/dx in electrons/cm.
    #[must_use]
    pub fn birks_correction(&self, dqdx: f64) -> f64 {
        let rho = self.density();
        let wion = 1000.0 / GEV_TO_ELECTRONS; // MeV per electron
        let k3t = RECOMB_K / self.drift_field();
        dqdx / (RECOMB_A / wion - k3t / rho * dqdx)
    }

    /// Modified-Box recombination: dE/dx in MeV/cm from dQ/dx in
    /// electrons/cm.
    #[must_use]
    pub fn modbox_correction(&self, dqdx: f64) -> f64 {
        let rho = self.density();
        let wion = 1000.0 / GEV_TO_ELECTRONS;
        let beta = MODBOX_B / (rho * self.drift_field());
        ((beta * wion * dqdx).exp() - MODBOX_A) / beta
    }

    /// Restricted mean dE/dx in MeV/cm for a particle of momentum `mom`
    /// (GeV) and mass `mass` (GeV), counting delta rays up to `tcut` MeV
    /// (0 means unrestricted).
    #[must_use]
    pub fn eloss(&self, mom: f64, mass: f64, tcut: f64) -> f64 {
        let bg = mom / mass;
        let gamma = (1.0 + bg * bg).sqrt();
        let beta = bg / gamma;
        let mer = 0.001 * ELECTRON_MASS_MEV / mass;
        let tmax = 2.0 * ELECTRON_MASS_MEV * bg * bg / (1.0 + 2.0 * gamma * mer + mer * mer);
        let tcut = if tcut == 0.0 || tcut > tmax { tmax } else { tcut };

        // Density-effect correction.
        let x = bg.log10();
        let s = &self.sternheimer;
        let mut delta = 0.0;
        if x >= s.x0 {
            delta = 2.0 * std::f64::consts::LN_10 * x - s.cbar;
            if x < s.x1 {
                delta += s.a * (s.x1 - x).powf(s.k);
            }
        }

        // Stopping number, clamped from below.
        let mut b = 0.5
            * (2.0 * ELECTRON_MASS_MEV * bg * bg * tcut
                / (1.0e-12 * self.excitation_energy * self.excitation_energy))
                .ln()
            - 0.5 * beta * beta * (1.0 + tcut / tmax)
            - 0.5 * delta;
        if b < 1.0 {
            b = 1.0;
        }

        self.density() * BETHE_K * self.atomic_number * b / (self.atomic_mass * beta * beta)
    }

    /// Energy-loss fluctuation variance in GeV^2/cm.
    #[must_use]
    pub fn eloss_var(&self, mom: f64, mass: f64) -> f64 {
        let bg = mom / mass;
        let gamma2 = 1.0 + bg * bg;
        let beta2 = bg * bg / gamma2;
        1.0e-6
            * gamma2
            * (1.0 - 0.5 * beta2)
            * ELECTRON_MASS_MEV
            * (self.atomic_number / self.atomic_mass)
            * BETHE_K
            * self.density()
    }
}
