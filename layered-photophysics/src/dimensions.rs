//! Unit tables of the photophysical quantities.

use layered_extract_model::{Dimension, ModelResult};

pub fn time() -> ModelResult<Dimension> {
    Dimension::base("time", &[("Second", "s(ec(ond)?s?)?")])
}

/// Wavelengths, nearly always in `nm`.
pub fn length() -> ModelResult<Dimension> {
    Dimension::base("length", &[("Meter", "m(et(er|re)s?)?")])
}

pub fn energy() -> ModelResult<Dimension> {
    Dimension::base("energy", &[("ElectronVolt", "eV"), ("Joule", "J")])
}

/// Kelvin only: degree signs are split off by the tokenizer.
pub fn temperature() -> ModelResult<Dimension> {
    Dimension::base("temperature", &[("Kelvin", "K")])
}

/// Quantum yields, written as a percentage.
pub fn ratio() -> ModelResult<Dimension> {
    Dimension::dimensionless("ratio", &[("Percent", "%")])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_units_keep_their_dimension() {
        assert!(time().unwrap().matches("μs"));
        assert!(energy().unwrap().matches("meV"));
        assert!(!energy().unwrap().matches("ns"));
        assert!(temperature().unwrap().matches("K"));
        assert!(length().unwrap().matches("nm"));
        assert!(!length().unwrap().matches("ms"));
    }
}
