// Two-body elastic scattering kinematics for screened Coulomb collisions.

use nalgebra::Vector3;
use std::f64::consts::PI;

/// Reduced energy above which the collision is treated as unscreened.
const RUTHERFORD_EPS: f64 = 10.0;
/// Reduced impact parameter below which the collision is head-on.
const HEAD_ON_B: f64 = 1e-10;
const MAX_NEWTON_ITERATIONS: usize = 100;

// Universal screening function: sum of c_i * exp(-d_i * r).
const UNIVERSAL_C: [f64; 4] = [0.18175, 0.50986, 0.28022, 0.028171];
const UNIVERSAL_D: [f64; 4] = [3.1998, 0.94229, 0.4029, 0.20162];

/// Centre-of-mass deflection of one collision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deflection {
    /// sin²(θ/2), the fraction of the maximum transfer actually transferred.
    pub s2: f64,
    /// cos θ.
    pub ct: f64,
    /// sin θ.
    pub st: f64,
}

impl Deflection {
    fn from_s2(s2: f64) -> Self {
        let s2 = s2.clamp(0.0, 1.0);
        let ct = 1.0 - 2.0 * s2;
        Deflection {
            s2,
            ct,
            st: (1.0 - ct * ct).max(0.0).sqrt(),
        }
    }

    pub fn head_on() -> Self {
        Deflection::from_s2(1.0)
    }

    /// CM scattering angle θ.
    pub fn theta(&self) -> f64 {
        self.st.atan2(self.ct)
    }

    /// Cosine of the projectile's lab deflection for mass ratio `my = m1/m2`.
    pub fn projectile_lab_cosine(&self, my: f64) -> f64 {
        self.st.atan2(self.ct + my).cos()
    }

    /// Cosine of the recoil's lab angle to the incident direction, (π - θ)/2.
    pub fn recoil_lab_cosine(&self) -> f64 {
        ((PI - self.theta()) / 2.0).cos()
    }
}

fn screening(r: f64) -> (f64, f64) {
    let mut v = 0.0;
    let mut dv = 0.0;
    for i in 0..4 {
        let ex = UNIVERSAL_C[i] * (-UNIVERSAL_D[i] * r).exp();
        v += ex;
        dv += UNIVERSAL_D[i] * ex;
    }
    let v = v / r;
    (v, -(v + dv) / r)
}

/// CM deflection for reduced energy `eps` and reduced impact parameter `b`.
///
/// Uses the Biersack-Haggmark "magic formula" with the universal
/// interatomic potential; the distance of closest approach is found by
/// Newton iteration. High reduced energies fall back to Rutherford
/// scattering.
pub fn magic(eps: f64, b: f64) -> Deflection {
    if !(b > HEAD_ON_B) || !(eps > 0.0) {
        return Deflection::head_on();
    }

    if eps > RUTHERFORD_EPS {
        let s2 = 1.0 / (1.0 + (1.0 + b * (1.0 + b)) * (2.0 * eps * b).powi(2));
        return Deflection::from_s2(s2);
    }

    // first guess at the distance of closest approach
    let mut r = b;
    let mut rr = -2.7 * (eps * b).ln();
    if rr >= b {
        r = rr;
        rr = -2.7 * (eps * rr).ln();
        if rr >= b {
            r = rr;
        }
    }

    let (mut v, mut v1) = screening(r);
    for _ in 0..MAX_NEWTON_ITERATIONS {
        let (pv, pv1) = screening(r);
        v = pv;
        v1 = pv1;
        let fr = b * b / r + v * r / eps - r;
        let fr1 = -b * b / (r * r) + (v + v1 * r) / eps - 1.0;
        let q = fr / fr1;
        let next = r - q;
        if !next.is_finite() || next <= 0.0 {
            break;
        }
        r = next;
        if (q / r).abs() <= 0.001 {
            break;
        }
    }

    let roc = -2.0 * (eps - v) / v1;
    let sqe = eps.sqrt();
    let cc = (0.011615 + sqe) / (0.0071222 + sqe);
    let aa = 2.0 * eps * (1.0 + 0.99229 / sqe) * b.powf(cc);
    let ff = ((aa * aa + 1.0).sqrt() - aa) * (9.3066 + eps) / (14.813 + eps);
    let delta = (r - b) * aa * ff / (ff + 1.0);
    let co = (b + delta + roc) / (r + roc);
    if !co.is_finite() {
        return Deflection::head_on();
    }
    Deflection::from_s2(1.0 - co * co)
}

/// Rotate a direction vector by angle theta (cos(theta)=mu) around an arbitrary axis
/// at azimuth phi. Returns a unit vector.
pub fn rotate_direction_3d(u_old: &Vector3<f64>, mu: f64, phi: f64) -> Vector3<f64> {
    let mu = mu.clamp(-1.0, 1.0);
    let sin_theta = (1.0 - mu * mu).max(0.0).sqrt();

    // Find a perpendicular vector to u_old
    let perp = if u_old.x.abs() < 0.99 {
        Vector3::new(1.0, 0.0, 0.0).cross(u_old).normalize()
    } else {
        Vector3::new(0.0, 1.0, 0.0).cross(u_old).normalize()
    };
    let ortho = u_old.cross(&perp);

    (mu * u_old + sin_theta * phi.cos() * perp + sin_theta * phi.sin() * ortho).normalize()
}
