// src/data.rs
// Static element tables used to build materials by symbol and to give
// fragments a sensible default mass. Index i holds element Z = i + 1.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Heaviest element covered by the tables.
pub const MAX_Z: u32 = 92;

/// Chemical symbols for Z = 1..=92.
pub const ELEMENT_SYMBOLS: [&str; MAX_Z as usize] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", //
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca", //
    "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", //
    "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", //
    "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn", //
    "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", //
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", //
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", //
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", //
    "Pa", "U",
];

/// Standard atomic weights (amu) for Z = 1..=92. Elements without stable
/// isotopes carry the mass number of their longest-lived isotope.
pub const ATOMIC_WEIGHTS: [f64; MAX_Z as usize] = [
    1.008, 4.0026, 6.94, 9.0122, 10.81, 12.011, 14.007, 15.999, 18.998, 20.180, //
    22.990, 24.305, 26.982, 28.085, 30.974, 32.06, 35.45, 39.948, 39.098, 40.078, //
    44.956, 47.867, 50.942, 51.996, 54.938, 55.845, 58.933, 58.693, 63.546, 65.38, //
    69.723, 72.630, 74.922, 78.971, 79.904, 83.798, 85.468, 87.62, 88.906, 91.224, //
    92.906, 95.95, 98.0, 101.07, 102.91, 106.42, 107.87, 112.41, 114.82, 118.71, //
    121.76, 127.60, 126.90, 131.29, 132.91, 137.33, 138.91, 140.12, 140.91, 144.24, //
    145.0, 150.36, 151.96, 157.25, 158.93, 162.50, 164.93, 167.26, 168.93, 173.05, //
    174.97, 178.49, 180.95, 183.84, 186.21, 190.23, 192.22, 195.08, 196.97, 200.59, //
    204.38, 207.2, 208.98, 209.0, 210.0, 222.0, 223.0, 226.0, 227.0, 232.04, //
    231.04, 238.03,
];

/// Map from chemical symbol to atomic number.
pub static SYMBOL_TO_Z: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    ELEMENT_SYMBOLS
        .iter()
        .enumerate()
        .map(|(i, &symbol)| (symbol, i as u32 + 1))
        .collect()
});

/// Chemical symbol for an atomic number, if covered by the tables.
pub fn symbol(z: u32) -> Option<&'static str> {
    if z == 0 || z > MAX_Z {
        return None;
    }
    Some(ELEMENT_SYMBOLS[(z - 1) as usize])
}

/// Standard atomic weight for an atomic number, if covered by the tables.
pub fn atomic_weight(z: u32) -> Option<f64> {
    if z == 0 || z > MAX_Z {
        return None;
    }
    Some(ATOMIC_WEIGHTS[(z - 1) as usize])
}

/// Atomic number for a chemical symbol (case-sensitive, exact match).
pub fn atomic_number(symbol: &str) -> Option<u32> {
    SYMBOL_TO_Z.get(symbol.trim()).copied()
}
