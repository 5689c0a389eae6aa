use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the transport engine and its physics models.
///
/// Numeric-domain problems inside the stopping correlations are handled by
/// clamps and never surface here; these variants are precondition and
/// configuration failures.
#[derive(Debug, Error)]
pub enum Error {
    /// Electronic stopping is only modelled for heavy ions (z1 >= 3).
    #[error("unsupported projectile z1={z}: light-ion (H, He) stopping is not modelled")]
    UnsupportedProjectile { z: u32 },

    /// No stopping coefficients are available for this atomic number.
    #[error("unsupported element z={z}: no stopping coefficients in table")]
    UnsupportedElement { z: u32 },

    /// A material was used before `prepare` was called.
    #[error("material '{0}' has not been prepared")]
    MaterialNotPrepared(String),

    /// A material has no elements or only zero stoichiometric weights.
    #[error("material '{0}' has no elements with positive weight")]
    EmptyMaterial(String),

    /// Invalid user or API parameter.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// Derived constants were computed for a different projectile species.
    #[error("derived constants are for z1={expected_z}, m1={expected_m}, but ion is z1={z}, m1={m}")]
    StaleConstants {
        expected_z: u32,
        expected_m: f64,
        z: u32,
        m: f64,
    },

    /// The energy sampler was used before a fragment mass was set.
    #[error("fragment mass must be set before sampling fragment energy")]
    FragmentMassUnset,

    /// An ion exceeded the configured collision budget.
    #[error("ion still moving after {collisions} collisions")]
    StepLimit { collisions: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_is_informative() {
        let e = Error::UnsupportedProjectile { z: 2 };
        let msg = e.to_string();
        assert!(msg.contains("z1=2"));
        assert!(msg.contains("light-ion"));
    }

    #[test]
    fn stale_constants_names_both_species() {
        let e = Error::StaleConstants {
            expected_z: 54,
            expected_m: 132.0,
            z: 8,
            m: 16.0,
        };
        let msg = e.to_string();
        assert!(msg.contains("z1=54"));
        assert!(msg.contains("z1=8"));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let e: Error = io.into();
        assert!(matches!(e, Error::Io(_)));
    }
}
