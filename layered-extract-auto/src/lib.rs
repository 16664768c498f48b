//! Grammars synthesized from record schemas.
//!
//! An auto-parser reads a [`Schema`](layered_extract_model::Schema) and
//! builds a root grammar out of its field metadata: the specifier's parse
//! expression, a value and unit phrase for quantity schemas, the other
//! fields' expressions and a compound mention, found in any order within a
//! sentence or table cell. Matches are turned back into
//! [`Record`](layered_extract_model::Record)s by [`interpret_record`].
//!
//! ```
//! use layered_extract::{actions, create_stream_from_string, i, GrammarContext};
//! use layered_extract_auto::{AutoSentenceParser, RecordParser};
//! use layered_extract_model::{Dimension, Field, Schema};
//!
//! let ratio = Dimension::dimensionless("ratio", &[("Percent", "%")]).unwrap();
//! let schema = Schema::builder("QuantumYield")
//!     .quantity(ratio)
//!     .field(Field::string("specifier").required().parse((i("quantum") + i("yield")).with_action(actions::join)))
//!     .build()
//!     .unwrap();
//! let parser = AutoSentenceParser::new(&schema).unwrap();
//! let stream = create_stream_from_string("a quantum yield of 64 % was measured");
//! let records = parser.parse(&stream, &GrammarContext::new());
//! assert_eq!(records[0].value("raw_value").and_then(|value| value.as_str()), Some("64"));
//! ```

pub mod cem;
mod context;
mod error;
mod interpret;
mod parser;
mod sentence;
mod table;
pub mod unit;
pub mod value;

pub use context::{document_compounds_key, field_extension_key, register_labels, register_names, update_specifiers};
pub use error::{AutoError, AutoResult};
pub use interpret::{interpret_record, Pick, QUANTITY_FIELDS};
pub use parser::{
    chem_name_entity, compound_schema, entity_list, field_entities, interpret_match, labels_entity, root_phrase,
    specifier_entity, trigger_phrase, RecordParser,
};
pub use sentence::{AutoSentenceParser, AutoSentenceParserBuilder};
pub use table::{no_value_element, AutoTableParser, FactorisedPowerTableParser};
pub use unit::{clean_units, construct_unit_element, match_dimensions_of, unit_element};
pub use value::value_element;
