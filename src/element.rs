use crate::data;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default displacement threshold (eV).
pub const DEFAULT_EDISP: f64 = 25.0;
/// Default lattice binding energy (eV).
pub const DEFAULT_ELBIND: f64 = 3.0;

/// One chemical species inside a material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Atomic number.
    pub z: u32,
    /// Atomic mass (amu).
    pub m: f64,
    /// Relative stoichiometric weight. Normalised by `Material::prepare`.
    pub t: f64,
    /// Minimum transferred energy that displaces this atom (eV).
    #[serde(default = "default_edisp")]
    pub edisp: f64,
    /// Energy lost to the lattice when this atom is displaced (eV).
    #[serde(default = "default_elbind")]
    pub elbind: f64,
}

fn default_edisp() -> f64 {
    DEFAULT_EDISP
}

fn default_elbind() -> f64 {
    DEFAULT_ELBIND
}

impl Element {
    pub fn new(z: u32, m: f64, t: f64) -> Result<Self> {
        if z == 0 {
            return Err(Error::InvalidParam("atomic number must be >= 1".into()));
        }
        if !m.is_finite() || m <= 0.0 {
            return Err(Error::InvalidParam("atomic mass must be finite and > 0".into()));
        }
        if !t.is_finite() {
            return Err(Error::InvalidParam("stoichiometric weight must be finite".into()));
        }
        Ok(Element {
            z,
            m,
            t,
            edisp: DEFAULT_EDISP,
            elbind: DEFAULT_ELBIND,
        })
    }

    /// Build an element from its chemical symbol with the standard atomic weight.
    pub fn from_symbol(symbol: &str, t: f64) -> Result<Self> {
        let z = data::atomic_number(symbol).ok_or_else(|| {
            Error::InvalidParam(format!("'{}' is not a recognized element symbol", symbol))
        })?;
        let m = data::atomic_weight(z).ok_or(Error::UnsupportedElement { z })?;
        Element::new(z, m, t)
    }

    /// Set the displacement and binding thresholds; needs `0 <= elbind <= edisp`.
    pub fn with_thresholds(mut self, edisp: f64, elbind: f64) -> Result<Self> {
        self.edisp = edisp;
        self.elbind = elbind;
        self.check_thresholds()?;
        Ok(self)
    }

    pub(crate) fn check_thresholds(&self) -> Result<()> {
        if !(self.elbind >= 0.0 && self.elbind <= self.edisp) || !self.edisp.is_finite() {
            return Err(Error::InvalidParam(format!(
                "element z={} needs 0 <= elbind <= edisp, got elbind={} edisp={}",
                self.z, self.elbind, self.edisp
            )));
        }
        Ok(())
    }

    pub fn symbol(&self) -> Option<&'static str> {
        data::symbol(self.z)
    }
}

/// Scattering parameters of one element for a given projectile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementConstants {
    /// Projectile to target mass ratio.
    pub my: f64,
    /// Maximum fraction of the projectile energy transferable in one collision.
    pub ec: f64,
    /// Universal screening length (Å).
    pub ai: f64,
    /// Reduced energy per eV.
    pub fi: f64,
}
