//! The parser seam and the pieces every auto-parser root is built from.

use layered_extract::{first, no_match, one_or_more, optional, skip_to, Element, GrammarContext, Match, TokenStream};
use layered_extract_model::{Record, Schema, SchemaRef};
use tracing::debug;

use crate::context::document_compounds_key;
use crate::interpret::{interpret_record, Pick, QUANTITY_FIELDS};

/// Finds records of one schema in a token stream.
///
/// Sentence parsers and table parsers share this trait; the document
/// pipeline decides which streams each one is run on.
pub trait RecordParser: Send + Sync {
    /// Stamped on every record as its `record_method`.
    fn name(&self) -> &str;

    fn schema(&self) -> &SchemaRef;

    fn root(&self) -> &Element;

    /// A cheap grammar that must occur in the stream before [`root`](Self::root)
    /// is worth scanning.
    fn trigger(&self) -> Option<&Element> {
        None
    }

    fn interpret(&self, found: &Match) -> Vec<Record>;

    fn parse(&self, stream: &TokenStream, context: &GrammarContext) -> Vec<Record> {
        if let Some(trigger) = self.trigger() {
            if !trigger.occurs_in(stream, context) {
                debug!(parser = self.name(), "trigger phrase absent");
                return Vec::new();
            }
        }
        self.root()
            .scan(stream, context)
            .flat_map(|found| self.interpret(&found))
            .collect()
    }
}

/// Interpret each phrase of `found` and stamp the records with `method`.
pub fn interpret_match(schema: &SchemaRef, found: &Match, pick: Pick, method: &str) -> Vec<Record> {
    found
        .nodes
        .iter()
        .filter_map(|phrase| interpret_record(schema, phrase, pick))
        .map(|mut record| {
            record.set_record_method(method);
            record
        })
        .collect()
}

/// The schema of the `compound` field, if there is one.
pub fn compound_schema(schema: &Schema) -> Option<&SchemaRef> {
    schema.field("compound").and_then(|field| field.kind().model_schema())
}

/// The compound's labels, as registered for this document.
pub fn labels_entity(schema: &Schema) -> Element {
    compound_schema(schema)
        .and_then(|compound| compound.field("labels"))
        .and_then(|labels| labels.parse_expression())
        .map(|expression| expression.named("labels").group("compound"))
        .unwrap_or_else(no_match)
}

/// Compound names known to the document, then `chem_name`. Never matches
/// for schemas without a `compound` field.
pub fn chem_name_entity(schema: &Schema, chem_name: &Element) -> Element {
    match compound_schema(schema) {
        Some(compound) => {
            Element::extensible(document_compounds_key(compound), no_match()).group("compound") | chem_name.clone()
        }
        None => no_match(),
    }
}

pub fn specifier_entity(schema: &Schema) -> Option<Element> {
    schema
        .field("specifier")
        .and_then(|field| field.parse_expression())
        .map(|expression| expression.named("specifier"))
}

/// Parse expressions of the remaining fields, each named after its field.
pub fn field_entities(schema: &Schema) -> Vec<Element> {
    schema
        .fields()
        .iter()
        .filter(|field| !QUANTITY_FIELDS.contains(&field.name()) && field.name() != "specifier")
        .filter_map(|field| field.parse_expression().map(|expression| expression.named(field.name())))
        .collect()
}

/// Ordered choice over `entities`; earlier entities win at the same position.
pub fn entity_list(entities: Vec<Element>) -> Element {
    first(entities)
}

/// Entities in any order, with anything in between, as one `root_phrase`.
pub fn root_phrase(combined: Element) -> Element {
    one_or_more(combined.clone() + optional(skip_to(combined))).named("root_phrase")
}

/// Parse expression of the first required, non-contextual field that has
/// one. Its absence from a sentence rules the whole sentence out.
pub fn trigger_phrase(schema: &Schema) -> Option<Element> {
    schema
        .fields()
        .iter()
        .filter(|field| field.is_hard_required() && !field.is_contextual())
        .find_map(|field| field.parse_expression().cloned())
}
