use crate::error::{Error, Result};
use crate::ion::DEFAULT_EF;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunable parameters of the transport engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    /// Smallest energy transfer (eV) resolved by the impact parameter cutoff.
    pub tmin: f64,
    /// Stop-following energy (eV) assigned to fragments by the driver.
    pub ef: f64,
    /// Split transferred energy into electronic and damage shares.
    pub robinson_partition: bool,
    /// Scale the first free flight of every ion by a uniform draw.
    pub randomize_first_flight: bool,
    /// Collision budget per ion before transport gives up.
    pub max_collisions: u64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        TransportSettings {
            tmin: 1.0,
            ef: DEFAULT_EF,
            robinson_partition: true,
            randomize_first_flight: true,
            max_collisions: 10_000_000,
        }
    }
}

impl TransportSettings {
    pub fn validate(&self) -> Result<()> {
        if !self.tmin.is_finite() || self.tmin <= 0.0 {
            return Err(Error::InvalidParam("tmin must be finite and > 0".into()));
        }
        if !self.ef.is_finite() || self.ef <= 0.0 {
            return Err(Error::InvalidParam("ef must be finite and > 0".into()));
        }
        if self.max_collisions == 0 {
            return Err(Error::InvalidParam("max_collisions must be > 0".into()));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: TransportSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = TransportSettings::default();
        assert_eq!(s.tmin, 1.0);
        assert_eq!(s.ef, 3.0);
        assert!(s.robinson_partition);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let s = TransportSettings::from_json_str(r#"{"robinson_partition": false}"#).unwrap();
        assert!(!s.robinson_partition);
        assert_eq!(s.tmin, 1.0);
        assert_eq!(s.max_collisions, 10_000_000);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(TransportSettings::from_json_str(r#"{"tmin": 0.0}"#).is_err());
        assert!(TransportSettings::from_json_str(r#"{"ef": -1.0}"#).is_err());
        assert!(TransportSettings::from_json_str(r#"{"max_collisions": 0}"#).is_err());
    }
}
