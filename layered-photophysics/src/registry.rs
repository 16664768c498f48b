//! The photophysics models and their parsers, ready to run on documents.

use layered_extract_auto::{AutoResult, AutoSentenceParser, AutoTableParser, FactorisedPowerTableParser};
use layered_extract_document::{ExtractionConfig, ModelParsers, Pipeline};
use layered_extract_model::SchemaRef;
use tracing::debug;

use crate::compound::{theme_chem_name, theme_compound, theme_table_chem_name, ThemeCompoundParser};
use crate::energy::{st_split, STSplitTableParser};
use crate::lifetime::{delayed_lifetime, TauDTableParser};
use crate::quantum_yield::{photoluminescence_quantum_yield, DimlessPlqyTableParser};
use crate::wavelength::{emission_wavelength, photoluminescence_wavelength};

/// Schemas of the compound and of every property extracted for it.
#[derive(Debug, Clone)]
pub struct Photophysics {
    compound: SchemaRef,
    quantum_yield: SchemaRef,
    delayed_lifetime: SchemaRef,
    st_split: SchemaRef,
    photoluminescence_wavelength: SchemaRef,
    emission_wavelength: SchemaRef,
}

impl Photophysics {
    pub fn new() -> AutoResult<Self> {
        let compound = theme_compound()?;
        Ok(Photophysics {
            quantum_yield: photoluminescence_quantum_yield(&compound)?,
            delayed_lifetime: delayed_lifetime(&compound)?,
            st_split: st_split(&compound)?,
            photoluminescence_wavelength: photoluminescence_wavelength(&compound)?,
            emission_wavelength: emission_wavelength(&compound)?,
            compound,
        })
    }

    pub fn compound(&self) -> &SchemaRef {
        &self.compound
    }

    pub fn quantum_yield(&self) -> &SchemaRef {
        &self.quantum_yield
    }

    pub fn delayed_lifetime(&self) -> &SchemaRef {
        &self.delayed_lifetime
    }

    pub fn st_split(&self) -> &SchemaRef {
        &self.st_split
    }

    pub fn photoluminescence_wavelength(&self) -> &SchemaRef {
        &self.photoluminescence_wavelength
    }

    pub fn emission_wavelength(&self) -> &SchemaRef {
        &self.emission_wavelength
    }

    pub fn compound_parsers(&self) -> ModelParsers {
        ModelParsers::new(&self.compound)
            .sentence_parser(ThemeCompoundParser::new(&self.compound))
            .table_parser(ThemeCompoundParser::new(&self.compound))
    }

    /// Sentences, then fraction cells before cells with a unit.
    pub fn quantum_yield_parsers(&self) -> AutoResult<ModelParsers> {
        let schema = &self.quantum_yield;
        Ok(ModelParsers::new(schema)
            .sentence_parser(sentence_parser(schema)?)
            .table_parser(DimlessPlqyTableParser::new(schema, theme_table_chem_name())?)
            .table_parser(AutoTableParser::with_chem_name(schema, theme_table_chem_name())?))
    }

    /// Prompt/delayed pairs, then columns that may factor out a power of ten.
    pub fn delayed_lifetime_parsers(&self) -> AutoResult<ModelParsers> {
        let schema = &self.delayed_lifetime;
        Ok(ModelParsers::new(schema)
            .sentence_parser(sentence_parser(schema)?)
            .table_parser(TauDTableParser::new(schema, theme_table_chem_name())?)
            .table_parser(FactorisedPowerTableParser::with_chem_name(schema, theme_table_chem_name())?))
    }

    pub fn st_split_parsers(&self) -> AutoResult<ModelParsers> {
        let schema = &self.st_split;
        Ok(ModelParsers::new(schema)
            .sentence_parser(sentence_parser(schema)?)
            .table_parser(STSplitTableParser::new(schema, theme_table_chem_name())?)
            .table_parser(AutoTableParser::with_chem_name(schema, theme_table_chem_name())?))
    }

    pub fn photoluminescence_wavelength_parsers(&self) -> AutoResult<ModelParsers> {
        plain_parsers(&self.photoluminescence_wavelength)
    }

    pub fn emission_wavelength_parsers(&self) -> AutoResult<ModelParsers> {
        plain_parsers(&self.emission_wavelength)
    }

    pub fn pipeline(&self, config: ExtractionConfig) -> AutoResult<Pipeline> {
        let pipeline = Pipeline::new(config)
            .compound(self.compound_parsers())
            .model(self.quantum_yield_parsers()?)
            .model(self.delayed_lifetime_parsers()?)
            .model(self.st_split_parsers()?)
            .model(self.photoluminescence_wavelength_parsers()?)
            .model(self.emission_wavelength_parsers()?);
        debug!(?pipeline, "photophysics pipeline");
        Ok(pipeline)
    }
}

fn sentence_parser(schema: &SchemaRef) -> AutoResult<AutoSentenceParser> {
    Ok(AutoSentenceParser::builder(schema).chem_name(theme_chem_name()).build()?)
}

fn plain_parsers(schema: &SchemaRef) -> AutoResult<ModelParsers> {
    Ok(ModelParsers::new(schema)
        .sentence_parser(sentence_parser(schema)?)
        .table_parser(AutoTableParser::with_chem_name(schema, theme_table_chem_name())?))
}

/// A pipeline extracting every photophysics model.
pub fn photophysics_pipeline(config: ExtractionConfig) -> AutoResult<Pipeline> {
    Photophysics::new()?.pipeline(config)
}
