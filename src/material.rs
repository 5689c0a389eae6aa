use crate::element::{Element, ElementConstants};
use crate::error::{Error, Result};
use crate::ion::{Ion, Species};
use crate::stopping::StoppingTable;
use serde::{Deserialize, Serialize};

/// Bohr radius times the Firsov/universal screening prefactor (Å).
const SCREENING_PREFACTOR: f64 = 0.5292 * 0.8853;
/// e² in eV·Å.
const E2: f64 = 14.4;
/// Avogadro's number scaled to convert g/cm³ / amu into atoms/Å³.
const AVOGADRO_ANG: f64 = 0.6022;
/// Reduced energy below which stopping is proportional to velocity.
const PE0: f64 = 25.0;

/// Composition averages, available after [`Material::prepare`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    /// Mean atomic mass (amu).
    pub am: f64,
    /// Mean atomic number.
    pub az: f64,
    /// Atomic number density (atoms/Å³).
    pub arho: f64,
}

/// Projectile-dependent constants of a material.
///
/// Produced by [`Material::derive_constants`] for one projectile species and
/// rejected by the stopping routines for any other species.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedConstants {
    pub species: Species,
    /// Projectile to mean target mass ratio.
    pub mu: f64,
    /// Screening length (Å).
    pub a: f64,
    /// Reduced energy per eV.
    pub f: f64,
    /// Reduced energy at the minimum resolved energy transfer.
    pub epsdg: f64,
    /// Robinson partition energy scale.
    pub fd: f64,
    /// Robinson partition electronic loss factor.
    pub kd: f64,
    /// Atomic number density (atoms/Å³).
    pub arho: f64,
    /// Per-element constants in material order.
    pub elements: Vec<ElementConstants>,
}

impl DerivedConstants {
    /// Fail unless these constants were derived for `species`.
    pub fn check_species(&self, species: Species) -> Result<()> {
        if self.species != species {
            return Err(Error::StaleConstants {
                expected_z: self.species.z,
                expected_m: self.species.m,
                z: species.z,
                m: species.m,
            });
        }
        Ok(())
    }

    /// Energy of a transfer `den` that ends up as atomic motion (Robinson
    /// partition); the remainder is lost to electronic excitation.
    pub fn damage_energy(&self, den: f64) -> f64 {
        if den <= 0.0 {
            return 0.0;
        }
        let eps = self.fd * den;
        let g = 3.4008 * eps.powf(1.0 / 6.0) + 0.40244 * eps.powf(0.75) + eps;
        den / (1.0 + self.kd * g)
    }
}

/// An ordered list of elements with a macroscopic density.
///
/// Typical workflow:
/// 1. Create with [`Material::new`] and add elements.
/// 2. Call [`Material::prepare`] once the composition is complete.
/// 3. Derive constants for each projectile species with
///    [`Material::derive_constants`] and pass them to the stopping routines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    #[serde(default)]
    pub name: Option<String>,
    /// Density (g/cm³).
    pub rho: f64,
    pub elements: Vec<Element>,
    #[serde(skip)]
    aggregate: Option<Aggregate>,
}

impl Material {
    pub fn new(rho: f64) -> Self {
        Material {
            name: None,
            rho,
            elements: Vec::new(),
            aggregate: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| "unnamed".to_string())
    }

    /// Append an element. The material must be prepared again afterwards.
    pub fn add_element(&mut self, element: Element) {
        self.elements.push(element);
        self.aggregate = None;
    }

    /// Clamp and normalise stoichiometric weights and compute composition averages.
    pub fn prepare(&mut self) -> Result<()> {
        if !self.rho.is_finite() || self.rho <= 0.0 {
            return Err(Error::InvalidParam(format!(
                "material '{}' density must be finite and > 0",
                self.label()
            )));
        }

        for element in &self.elements {
            element.check_thresholds()?;
        }
        for element in self.elements.iter_mut() {
            if element.t < 0.0 {
                element.t = 0.0;
            }
        }
        let tt: f64 = self.elements.iter().map(|e| e.t).sum();
        if self.elements.is_empty() || tt <= 0.0 {
            return Err(Error::EmptyMaterial(self.label()));
        }
        for element in self.elements.iter_mut() {
            element.t /= tt;
        }

        let am: f64 = self.elements.iter().map(|e| e.m * e.t).sum();
        let az: f64 = self.elements.iter().map(|e| e.z as f64 * e.t).sum();
        let arho = self.rho * AVOGADRO_ANG / am;
        self.aggregate = Some(Aggregate { am, az, arho });
        Ok(())
    }

    pub fn is_prepared(&self) -> bool {
        self.aggregate.is_some()
    }

    pub fn aggregate(&self) -> Result<Aggregate> {
        self.aggregate
            .ok_or_else(|| Error::MaterialNotPrepared(self.label()))
    }

    /// Screening and kinematic constants of this material for a projectile.
    pub fn derive_constants(&self, species: Species, tmin: f64) -> Result<DerivedConstants> {
        let Aggregate { am, az, arho } = self.aggregate()?;
        if species.z == 0 || !species.m.is_finite() || species.m <= 0.0 {
            return Err(Error::InvalidParam(format!(
                "projectile needs z1 >= 1 and m1 > 0, got z1={} m1={}",
                species.z, species.m
            )));
        }
        let z1 = species.z as f64;
        let m1 = species.m;

        let mu = m1 / am;
        let a = SCREENING_PREFACTOR / (z1.powf(0.23) + az.powf(0.23));
        let f = a * am / (az * z1 * E2 * (m1 + am));
        let epsdg = tmin * f * (1.0 + mu).powi(2) / (4.0 * mu);

        // NRT grouping on purpose: 0.01 * az^(-7/3), not (0.01 * az)^(-7/3)
        let fd = 0.01 * az.powf(-7.0 / 3.0);
        let kd = 0.1334 * az.powf(2.0 / 3.0) / am.sqrt();

        let elements = self
            .elements
            .iter()
            .map(|el| {
                let z2 = el.z as f64;
                let my = m1 / el.m;
                let ai = SCREENING_PREFACTOR / (z1.powf(0.23) + z2.powf(0.23));
                ElementConstants {
                    my,
                    ec: 4.0 * my / (1.0 + my).powi(2),
                    ai,
                    fi: ai * el.m / (z1 * z2 * E2 * (m1 + el.m)),
                }
            })
            .collect();

        Ok(DerivedConstants {
            species,
            mu,
            a,
            f,
            epsdg,
            fd,
            kd,
            arho,
            elements,
        })
    }

    /// Electronic stopping power of the material for `ion` (eV/Å).
    pub fn getrstop<P>(
        &self,
        table: &StoppingTable,
        constants: &DerivedConstants,
        ion: &Ion<P>,
    ) -> Result<f64> {
        constants.check_species(Species {
            z: ion.z1,
            m: ion.m1,
        })?;
        let arho = self.aggregate()?.arho;
        let mut se = 0.0;
        for element in &self.elements {
            se += rstop(table, ion, element.z)? * element.t * arho;
        }
        Ok(se)
    }

    /// Pick a collision partner for a uniform draw `u` by stoichiometry.
    pub fn select_element(&self, u: f64) -> usize {
        let mut hh = u;
        for (i, element) in self.elements.iter().enumerate() {
            hh -= element.t;
            if hh <= 0.0 {
                return i;
            }
        }
        self.elements.len().saturating_sub(1)
    }
}

fn sqr(x: f64) -> f64 {
    x * x
}

/// Two-branch proton stopping fit for target `z2` at `e` keV/amu.
///
/// Low- and high-energy power laws are combined harmonically; below 25
/// keV/amu the result is scaled down by a velocity power law.
pub fn rpstop(table: &StoppingTable, z2: u32, e: f64) -> Result<f64> {
    let c = &table.get(z2)?.pcoef;
    let pe = PE0.max(e);

    let sl = c[0] * pe.powf(c[1]) + c[2] * pe.powf(c[3]);
    let sh = c[4] / pe.powf(c[5]) * (c[6] / pe + c[7] * pe).ln();
    let mut sp = sl * sh / (sl + sh);

    if e <= PE0 {
        let velpwr = if z2 <= 6 { 0.25 } else { 0.45 };
        sp *= (e / PE0).powf(velpwr);
    }
    Ok(sp)
}

/// Electronic stopping cross section of element `z2` for a heavy ion (eV·Å²).
///
/// Effective-charge scaling of the proton stopping with the ionisation
/// level of the projectile at its velocity relative to the target Fermi
/// velocity. Clamps keep every logarithm, root and exponential finite.
pub fn rstop<P>(table: &StoppingTable, ion: &Ion<P>, z2: u32) -> Result<f64> {
    let z1 = ion.z1;
    if z1 == 1 || z1 == 2 {
        return Err(Error::UnsupportedProjectile { z: z1 });
    }
    if !(ion.e >= 0.0) || !ion.e.is_finite() {
        return Err(Error::InvalidParam(format!(
            "ion energy must be finite and >= 0, got {}",
            ion.e
        )));
    }
    let projectile = table.get(z1)?;
    let vfermi = table.get(z2)?.vfermi;
    let lfctr = projectile.lfctr;

    let m1 = if ion.m1 == 0.0 { projectile.mm1 } else { ion.m1 };
    let e = 0.001 * ion.e / m1;
    let fz1 = z1 as f64;
    let fz2 = z2 as f64;
    let z1_23 = fz1.powf(0.6667);
    let z1_13 = fz1.powf(0.3333);

    let yrmin: f64 = 0.13;
    let mut vrmin: f64 = 1.0;
    let v = (e / 25.0).sqrt() / vfermi;

    let vr = if v >= 1.0 {
        v * vfermi * (1.0 + 1.0 / (5.0 * v * v))
    } else {
        (3.0 * vfermi / 4.0) * (1.0 + (2.0 * v * v / 3.0) - v.powi(4) / 15.0)
    };

    let yr = yrmin.max(vr / z1_23).max(vrmin / z1_23);
    let a = -0.803 * yr.powf(0.3) + 1.3167 * yr.powf(0.6) + 0.38157 * yr + 0.008983 * yr * yr;

    // ionization level of the ion at velocity yr
    let q = (1.0 - (-a.min(50.0)).exp()).max(0.0).min(1.0);

    let b = (0.12 + 0.025 * fz1).max(0.32).min(0.43) / z1_13;
    let l0 = (0.8 - q * (0.6 + fz1 / 30.0).min(1.2)) / z1_13;
    let q_mid = (0.9 - 0.025 * fz1).max(0.0);
    let q_high = (1.0 - 0.025 * fz1.min(16.0)).max(0.0);
    let l1 = if q < 0.2 {
        0.0
    } else if q < q_mid {
        b * (q - 0.2) / (q_mid - 0.2000001).abs()
    } else if q < q_high {
        b
    } else {
        b * (1.0 - q) / (0.025 * fz1.min(16.0))
    };

    let l = l1.max(l0 * lfctr);
    let mut zeta = q
        + (1.0 / (2.0 * vfermi * vfermi)) * (1.0 - q) * (1.0 + sqr(4.0 * l * vfermi / 1.919)).ln();

    // z1^3 effect
    let a = -sqr(7.6 - e.ln().max(0.0));
    zeta *= 1.0 + (1.0 / (fz1 * fz1)) * (0.18 + 0.0015 * fz2) * a.exp();

    let se = if yr <= yrmin.max(vrmin / z1_23) {
        // velocity proportional stopping below the minimum relative velocity
        vrmin = vrmin.max(yrmin * z1_23);
        let vmin = 0.5 * (vrmin + (vrmin * vrmin - 0.8 * vfermi * vfermi).max(0.0).sqrt());
        let eee = 25.0 * vmin * vmin;
        let sp = rpstop(table, z2, eee)?;
        let power = if z2 == 6 || ((z2 == 14 || z2 == 32) && z1 <= 19) {
            0.375
        } else {
            0.5
        };
        sp * sqr(zeta * fz1) * (e / eee).powf(power)
    } else {
        rpstop(table, z2, e)? * sqr(zeta * fz1)
    };

    Ok(se * 10.0)
}
