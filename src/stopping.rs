// Per-element electronic stopping coefficients.
//
// Records follow the classic TRIM coefficient files: heavy-ion screening
// factor, most abundant isotope mass, Fermi velocity, atomic density and the
// eight proton-stopping fit coefficients. The table is immutable once loaded
// and shared through an `Arc`.

use crate::config::Config;
use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

static GLOBAL_TABLE_CACHE: Lazy<Mutex<HashMap<String, Arc<StoppingTable>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Stopping coefficients for one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementCoefficients {
    pub z: u32,
    #[serde(default)]
    pub symbol: Option<String>,
    /// Most abundant isotope mass (amu).
    pub mm1: f64,
    /// Heavy-ion screening length factor.
    pub lfctr: f64,
    /// Fermi velocity of the target electrons (Bohr velocity units).
    pub vfermi: f64,
    /// Atomic density of the pure element (1e22 atoms/cm³).
    pub atrho: f64,
    /// Proton stopping fit: low-energy (0..4) and high-energy (4..8) branches.
    pub pcoef: [f64; 8],
}

impl ElementCoefficients {
    fn validate(&self) -> Result<()> {
        if self.z == 0 {
            return Err(Error::InvalidParam("stopping record with z=0".to_string()));
        }
        let finite = [self.mm1, self.lfctr, self.vfermi, self.atrho]
            .iter()
            .chain(self.pcoef.iter())
            .all(|v| v.is_finite());
        if !finite {
            return Err(Error::InvalidParam(format!(
                "stopping record z={} has non-finite coefficients",
                self.z
            )));
        }
        if self.vfermi <= 0.0 || self.mm1 <= 0.0 {
            return Err(Error::InvalidParam(format!(
                "stopping record z={} needs positive vfermi and mm1",
                self.z
            )));
        }
        Ok(())
    }
}

/// Immutable lookup of stopping coefficients indexed by atomic number.
#[derive(Debug, Clone, Default)]
pub struct StoppingTable {
    records: Vec<Option<ElementCoefficients>>,
}

impl StoppingTable {
    /// Build a table from records; duplicate atomic numbers are rejected.
    pub fn from_records(records: Vec<ElementCoefficients>) -> Result<Self> {
        let max_z = records.iter().map(|r| r.z).max().unwrap_or(0) as usize;
        let mut table: Vec<Option<ElementCoefficients>> = vec![None; max_z];
        for record in records {
            record.validate()?;
            let slot = &mut table[(record.z - 1) as usize];
            if slot.is_some() {
                return Err(Error::InvalidParam(format!(
                    "duplicate stopping record for z={}",
                    record.z
                )));
            }
            *slot = Some(record);
        }
        Ok(StoppingTable { records: table })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let records: Vec<ElementCoefficients> = serde_json::from_str(json)?;
        Self::from_records(records)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Coefficients for atomic number `z`.
    pub fn get(&self, z: u32) -> Result<&ElementCoefficients> {
        if z == 0 {
            return Err(Error::UnsupportedElement { z });
        }
        self.records
            .get((z - 1) as usize)
            .and_then(|r| r.as_ref())
            .ok_or(Error::UnsupportedElement { z })
    }

    pub fn contains(&self, z: u32) -> bool {
        self.get(z).is_ok()
    }

    /// Number of elements with coefficients.
    pub fn len(&self) -> usize {
        self.records.iter().filter(|r| r.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Load a table from `path`, sharing one instance per canonical path.
pub fn get_or_load_table(path: impl AsRef<Path>) -> Result<Arc<StoppingTable>> {
    let path = path.as_ref();
    let cache_key = match std::fs::canonicalize(path) {
        Ok(canonical) => canonical.to_string_lossy().to_string(),
        Err(_) => path.to_string_lossy().to_string(),
    };

    {
        let cache = match GLOBAL_TABLE_CACHE.lock() {
            Ok(cache) => cache,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(existing) = cache.get(&cache_key) {
            return Ok(Arc::clone(existing));
        }
    }

    let table = Arc::new(StoppingTable::from_json_file(path)?);
    log::debug!(
        "loaded stopping coefficients for {} elements from {}",
        table.len(),
        cache_key
    );

    let mut cache = match GLOBAL_TABLE_CACHE.lock() {
        Ok(cache) => cache,
        Err(poisoned) => poisoned.into_inner(),
    };
    cache.insert(cache_key, Arc::clone(&table));
    Ok(table)
}

/// Load the table named by the global [`Config`].
pub fn load_configured_table() -> Result<Arc<StoppingTable>> {
    let path = Config::global().stopping_data().ok_or_else(|| {
        Error::InvalidParam(
            "no stopping data configured: call Config::set_stopping_data or set YATRIM_STOPPING_DATA"
                .to_string(),
        )
    })?;
    get_or_load_table(path)
}
