use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Running energy totals of a cascade (eV).
///
/// Passed by mutable reference to every transport call; the driver resets it
/// between events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyLedger {
    /// Energy lost to electronic excitation.
    pub electronic: f64,
    /// Energy deposited in atomic motion (phonons, binding, stopped ions).
    pub nuclear: f64,
    /// Energy carried out of the sample by escaping ions.
    pub escaped: f64,
}

impl EnergyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_electronic(&mut self, e: f64) {
        self.electronic += e;
    }

    pub fn add_nuclear(&mut self, e: f64) {
        self.nuclear += e;
    }

    pub fn add_escaped(&mut self, e: f64) {
        self.escaped += e;
    }

    pub fn total(&self) -> f64 {
        self.electronic + self.nuclear + self.escaped
    }

    /// `initial` minus everything booked so far.
    pub fn balance(&self, initial: f64) -> f64 {
        initial - self.total()
    }

    /// Imbalance relative to `initial`. Zero when `initial` is zero.
    pub fn relative_balance(&self, initial: f64) -> f64 {
        if initial == 0.0 {
            return 0.0;
        }
        self.balance(initial) / initial
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl AddAssign for EnergyLedger {
    fn add_assign(&mut self, other: Self) {
        self.electronic += other.electronic;
        self.nuclear += other.nuclear;
        self.escaped += other.escaped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_and_balance() {
        let mut ledger = EnergyLedger::new();
        ledger.add_electronic(60.0);
        ledger.add_nuclear(30.0);
        ledger.add_escaped(9.0);
        assert_eq!(ledger.total(), 99.0);
        assert_eq!(ledger.balance(100.0), 1.0);
        assert!((ledger.relative_balance(100.0) - 0.01).abs() < 1e-12);
        assert_eq!(ledger.relative_balance(0.0), 0.0);
    }

    #[test]
    fn test_reset() {
        let mut ledger = EnergyLedger::new();
        ledger.add_nuclear(5.0);
        ledger.reset();
        assert_eq!(ledger, EnergyLedger::default());
    }

    #[test]
    fn test_accumulate_runs() {
        let mut run = EnergyLedger::new();
        let event = EnergyLedger {
            electronic: 1.0,
            nuclear: 2.0,
            escaped: 3.0,
        };
        run += event;
        run += event;
        assert_eq!(run.total(), 12.0);
    }
}
