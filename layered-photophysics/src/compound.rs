//! The compound model of photophysics papers.
//!
//! Besides names and labels, a theme compound keeps the words that
//! introduced it (`reference compound 3`, `emitters 1 and 2`) as its
//! `roles`. Compounds that a sentence says were made (`to give 3b`,
//! `synthesis of …`) get the role `product`.

use layered_extract::actions::join;
use layered_extract::{
    every, first, i, no_match, not, optional, r, w, zero_or_more, Element, Match, ResultNode, TokenStream,
};
use layered_extract_auto::cem::{chemical_name, label};
use layered_extract_auto::value::{close_bracket, open_bracket};
use layered_extract_auto::{document_compounds_key, interpret_record, Pick, RecordParser};
use layered_extract_model::{Field, FieldKind, ModelResult, Record, Schema, SchemaRef, Value};
use tracing::debug;

/// Label-shaped tokens that name excited states, basis sets or units.
pub const LABEL_BLOCKLIST: [&str; 7] = ["S1", "31G", "S3", "T1", "3LE", "3CT", "V"];

const ORDINAL: &str = r"^\d+(st|nd|rd|th)$";

const PRODUCT_HINTS: [&str; 6] = ["synthesis", "give", "yield", "afford", "product", "preparation of"];

pub fn theme_compound() -> ModelResult<SchemaRef> {
    Schema::builder("ThemeCompound")
        .field(Field::set("names", FieldKind::String))
        .field(Field::set("labels", FieldKind::String).parse(no_match()).updatable())
        .field(Field::set("roles", FieldKind::String))
        .build()
}

/// Lowercase `role`, folding every way of saying "was made" into `product`.
pub fn standardize_role(role: &str) -> String {
    let role = role.to_lowercase();
    if PRODUCT_HINTS.iter().any(|hint| role.contains(hint)) {
        "product".to_string()
    } else {
        role
    }
}

fn standardize_roles(_tokens: &TokenStream, _start: usize, mut results: Vec<ResultNode>) -> Vec<ResultNode> {
    for node in &mut results {
        node.map_texts(&standardize_role);
    }
    results
}

fn label_blocklist() -> Element {
    let mut blocked: Vec<Element> = LABEL_BLOCKLIST.iter().map(|text| w(*text)).collect();
    blocked.push(r(ORDINAL));
    first(blocked)
}

/// A label that is not a state, a basis set or an ordinal.
pub fn theme_label() -> Element {
    every(vec![label(), not(label_blocklist())])
}

fn name_suffix() -> Element {
    optional(r("^[-‐‑–]$"))
        + (r("^units?$")
            | r("^parts?$")
            | r("^groups?$")
            | r("^substituents?$")
            | r("^moiet(y|ies)$")
            | w("based")
            | w("substituted")
            | w("modified"))
}

/// `reference compound`, `dyes`, `emitter:`.
fn label_type() -> Element {
    (optional(i("reference") | i("comparative"))
        + r("(?i)^(compound|dye|derivative|structure|molecule|product|formulae?|specimen|emitter)s?$"))
    .named("roles")
    .with_action(join)
    .with_action(standardize_roles)
}

fn product_role() -> Element {
    let synthesis_of = (i("synthesis") | i("preparation")) + i("of");
    let to_give = i("to") + (i("give") | i("afford") | i("yield"));
    (synthesis_of | to_give)
        .named("roles")
        .with_action(join)
        .with_action(standardize_roles)
}

/// A tagged name that is not part of a larger description (`carbazole
/// units`, `DMAC-based`), optionally followed by its bracketed label.
fn name_with_label() -> Element {
    (optional(product_role())
        + chemical_name()
        + not(name_suffix())
        + optional(open_bracket().hide() + theme_label() + close_bracket().hide()))
    .group("compound")
}

fn label_phrase() -> Element {
    let separator = (w(",") | i("and")).hide();
    (optional(product_role())
        + label_type()
        + optional(r("^[:#]$").hide())
        + theme_label()
        + zero_or_more(optional(separator) + theme_label()))
    .group("compound")
}

/// The compound mention the photophysics models look for.
pub fn theme_chem_name() -> Element {
    first(vec![name_with_label(), label_phrase()])
}

/// Row headers of tables often hold a bare label, `2a`.
pub fn theme_table_chem_name() -> Element {
    first(vec![theme_chem_name(), theme_label().group("compound")])
}

/// Finds theme compounds, one record per compound and per listed label.
#[derive(Debug, Clone)]
pub struct ThemeCompoundParser {
    schema: SchemaRef,
    root: Element,
}

impl ThemeCompoundParser {
    pub fn new(schema: &SchemaRef) -> Self {
        let known = Element::extensible(document_compounds_key(schema), no_match()).group("compound");
        ThemeCompoundParser {
            schema: schema.clone(),
            root: first(vec![known, theme_chem_name()]),
        }
    }
}

impl RecordParser for ThemeCompoundParser {
    fn name(&self) -> &str {
        "ThemeCompoundParser"
    }

    fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    fn root(&self) -> &Element {
        &self.root
    }

    fn interpret(&self, found: &Match) -> Vec<Record> {
        found
            .nodes
            .iter()
            .filter_map(|node| interpret_record(&self.schema, node, Pick::First))
            .flat_map(split_labels)
            .map(|mut record| {
                record.set_record_method(self.name());
                record
            })
            .collect()
    }
}

/// `compounds 1 and 2` describes two compounds; a name with a label is one.
fn split_labels(record: Record) -> Vec<Record> {
    let labels: Vec<String> = match record.value("labels").and_then(Value::as_items) {
        Some(items) => items.iter().filter_map(Value::as_str).map(str::to_string).collect(),
        None => return vec![record],
    };
    if record.value("names").is_some() || labels.len() < 2 {
        return vec![record];
    }
    labels
        .into_iter()
        .filter_map(|label| {
            let mut single = record.clone();
            match single.set("labels", Value::set([label])) {
                Ok(()) => Some(single),
                Err(err) => {
                    debug!(%err, "label not split");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use layered_extract::{create_stream_from_string, GrammarContext, LexiconTagger, NER_TAG};

    fn records(text: &str) -> Vec<String> {
        let mut stream = create_stream_from_string(text);
        stream.apply_tagger(
            &LexiconTagger::new(NER_TAG)
                .entry("DMAC", "B-CM")
                .entry("-", "I-CM")
                .entry("TRZ", "I-CM"),
        );
        let parser = ThemeCompoundParser::new(&theme_compound().unwrap());
        parser
            .parse(&stream, &GrammarContext::new())
            .iter()
            .map(Record::to_json)
            .collect()
    }

    #[test]
    fn roles_are_standardized() {
        assert_eq!(standardize_role("Reference Compound"), "reference compound");
        assert_eq!(standardize_role("to afford"), "product");
        assert_eq!(standardize_role("preparation of"), "product");
    }

    #[test]
    fn listed_labels_become_separate_compounds() {
        insta::assert_debug_snapshot!(records("Compounds 1 and 2 were studied"), @r###"
        [
            "{\"ThemeCompound\":{\"labels\":[\"1\"],\"roles\":[\"compounds\"]}}",
            "{\"ThemeCompound\":{\"labels\":[\"2\"],\"roles\":[\"compounds\"]}}",
        ]
        "###);
    }

    #[test]
    fn products_keep_their_names_and_labels() {
        insta::assert_debug_snapshot!(records("was coupled to give DMAC - TRZ ( 3b )"), @r###"
        [
            "{\"ThemeCompound\":{\"labels\":[\"3b\"],\"names\":[\"DMAC-TRZ\"],\"roles\":[\"product\"]}}",
        ]
        "###);
    }

    #[test]
    fn states_and_ordinals_are_not_labels() {
        assert!(records("the emitter S1 state").is_empty());
        assert!(records("the compound 2nd").is_empty());
        assert_eq!(records("the reference compound 4a").len(), 1);
    }

    #[test]
    fn names_describing_parts_are_skipped() {
        assert!(records("the DMAC units were").is_empty());
    }
}
