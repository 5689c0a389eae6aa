// Inverse-CDF sampling of fission fragment mass and kinetic energy.
//
// Each sampler wraps a monotonic response function f(x) on [0, maxx] and
// returns the x at which f(x)/maxf reaches a uniform draw.

use crate::error::{Error, Result};
use statrs::function::erf::erf;

/// Bisection steps; 2^-32 of the domain is below what the fitted curves resolve.
pub const MAX_ITERATIONS: usize = 32;

/// Default early-exit tolerance on the normalised response.
pub const DEFAULT_TOL: f64 = 1e-7;

/// Invert `f` on `[0, maxx]` by bisection.
///
/// Starts at the midpoint with a step of `maxx / 4`, moving right while
/// `f(x)/maxf <= f1` and left otherwise. Always returns after at most
/// [`MAX_ITERATIONS`] evaluations.
pub fn bisect<F>(f: F, maxx: f64, maxf: f64, tol: f64, f1: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    let mut x = maxx / 2.0;
    let mut w = maxx / 4.0;

    for _ in 0..MAX_ITERATIONS {
        let f2 = f(x) / maxf;
        if (f2 - f1).abs() <= tol {
            break;
        }
        if f2 > f1 {
            x -= w;
        } else {
            x += w;
        }
        w *= 0.5;
    }

    x
}

/// A sampler drawing physically distributed values from a uniform draw.
pub trait Inverter {
    /// Response function (a cumulative distribution up to normalisation).
    fn response(&self, x: f64) -> f64;

    /// Upper end of the domain and the response at that point.
    fn domain(&self) -> Result<(f64, f64)>;

    fn tol(&self) -> f64 {
        DEFAULT_TOL
    }

    /// Draw a value for the uniform variate `f1`, which must lie in `[0, 1)`.
    fn sample(&self, f1: f64) -> Result<f64> {
        if !(0.0..1.0).contains(&f1) {
            return Err(Error::InvalidParam(format!(
                "uniform draw must lie in [0, 1), got {}",
                f1
            )));
        }
        let (maxx, maxf) = self.domain()?;
        Ok(bisect(|x| self.response(x), maxx, maxf, self.tol(), f1))
    }
}

/// Empirical U-235 fission fragment mass-yield curve (cumulative).
#[derive(Debug, Clone)]
pub struct MassInverter {
    maxx: f64,
    maxf: f64,
    tol: f64,
}

impl MassInverter {
    /// Compound nucleus mass; the fragment mass domain is `[0, TOTAL_MASS]`.
    pub const TOTAL_MASS: f64 = 235.0;

    pub fn new() -> Self {
        let mut inverter = MassInverter {
            maxx: Self::TOTAL_MASS,
            maxf: 1.0,
            tol: DEFAULT_TOL,
        };
        inverter.maxf = inverter.response(inverter.maxx);
        inverter
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }
}

impl Default for MassInverter {
    fn default() -> Self {
        Self::new()
    }
}

impl Inverter for MassInverter {
    fn response(&self, x: f64) -> f64 {
        (100.088
            + 0.112798 * erf(-5.56257 + 0.0471405 * x)
            + 37.4781 * erf(-19.3772 + 0.137386 * x)
            + 37.4781 * erf(-13.0462 + 0.137386 * x)
            + 12.5094 * erf(-30.8853 + 0.229537 * x)
            + 12.5094 * erf(-23.2853 + 0.229537 * x))
            / 200.1756
    }

    fn domain(&self) -> Result<(f64, f64)> {
        Ok((self.maxx, self.maxf))
    }

    fn tol(&self) -> f64 {
        self.tol
    }
}

/// Fragment kinetic energy curve (MeV), rescaled by the light fragment mass.
///
/// The curve rises to a single maximum and falls off after it, so the
/// domain is cut at the maximum to keep the response monotonic.
#[derive(Debug, Clone, Default)]
pub struct EnergyInverter {
    mass: Option<f64>,
    tol: Option<f64>,
}

const ENERGY_A: f64 = 0.00014122;
const ENERGY_B: f64 = 7.12299e-7;
const ENERGY_C: f64 = 0.0886603;
const ENERGY_NORM: f64 = 127.216;
const ENERGY_MASS_SCALE: f64 = 234.0;

impl EnergyInverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = Some(tol);
        self
    }

    /// Set the fragment mass `A` the energy curve is rescaled for.
    pub fn set_fragment_mass(&mut self, mass: f64) -> Result<()> {
        if !mass.is_finite() || mass <= 0.0 || mass >= ENERGY_MASS_SCALE {
            return Err(Error::InvalidParam(format!(
                "fragment mass must lie in (0, {}), got {}",
                ENERGY_MASS_SCALE, mass
            )));
        }
        self.mass = Some(mass);
        Ok(())
    }

    pub fn fragment_mass(&self) -> Option<f64> {
        self.mass
    }

    fn scale(&self) -> Option<f64> {
        self.mass.map(|a| 1.0 - a / ENERGY_MASS_SCALE)
    }
}

impl Inverter for EnergyInverter {
    fn response(&self, x: f64) -> f64 {
        let scale = self.scale().unwrap_or(1.0);
        let x1 = x / scale;
        (-ENERGY_A + (ENERGY_A - ENERGY_B * x1) * (ENERGY_C * x1).exp()) / ENERGY_NORM
    }

    fn domain(&self) -> Result<(f64, f64)> {
        let scale = self.scale().ok_or(Error::FragmentMassUnset)?;
        // d/dx1 vanishes at x1 = a/b - 1/c
        let peak = ENERGY_A / ENERGY_B - 1.0 / ENERGY_C;
        let maxx = peak * scale;
        Ok((maxx, self.response(maxx)))
    }

    fn tol(&self) -> f64 {
        self.tol.unwrap_or(DEFAULT_TOL)
    }
}
