#![doc(
    html_logo_url = "https://raw.githubusercontent.com/storyscript/layered-nlp/main/assets/layered-nlp.svg",
    issue_tracker_base_url = "https://github.com/storyscript/layered-nlp/issues/"
)]

//! Photophysical properties of emitters, extracted with layered-extract.
//!
//! ## Models
//!
//! - **ThemeCompound**: names, labels and the roles a sentence gives them
//! - **PhotoluminescenceQuantumYield**: `ΦPL`, `PLQY`, with atmosphere,
//!   phase and temperature
//! - **DelayedLifetime**: `τd`, `τTADF`, delayed fluorescence lifetimes
//! - **STSplit**: singlet-triplet energy gaps, `ΔEST`
//! - **PhotoluminescenceWavelength**: `λPL`, `PL peak`, with solvent and
//!   temperature
//! - **EmissionWavelength**: `λem`, `λEL`, phosphorescence peaks, with phase
//!
//! Each property has a sentence parser and table parsers tried from most to
//! least specific: fractions of one for quantum yields, `τp/τd` pairs for
//! lifetimes, `S1/T1/ΔEST` triples for energy gaps. Lifetime columns may
//! factor out a power of ten, `τd [103 ns]`.
//!
//! ## Usage
//!
//! ```
//! use layered_extract_document::{Document, ExtractionConfig};
//! use layered_photophysics::photophysics_pipeline;
//!
//! let pipeline = photophysics_pipeline(ExtractionConfig::default()).unwrap();
//! let document = Document::from_text("Compound 1 showed the highest PLQY of 24.1 % .");
//! let records = pipeline.run(&document);
//! assert!(records.iter().any(|record| record.type_name() == "PhotoluminescenceQuantumYield"));
//! ```

pub mod compound;
pub mod condition;
pub mod dimensions;
pub mod energy;
pub mod lifetime;
pub mod quantum_yield;
mod registry;
pub mod wavelength;

pub use compound::{theme_chem_name, theme_compound, theme_table_chem_name, ThemeCompoundParser};
pub use condition::TemperatureTableParser;
pub use energy::{st_split, STSplitTableParser};
pub use lifetime::{delayed_lifetime, TauDTableParser};
pub use quantum_yield::{photoluminescence_quantum_yield, DimlessPlqyTableParser};
pub use registry::{photophysics_pipeline, Photophysics};
pub use wavelength::{emission_wavelength, photoluminescence_wavelength};

#[cfg(test)]
mod tests {
    mod scenarios;
}
