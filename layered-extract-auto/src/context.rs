//! Document-scoped grammar updates.
//!
//! Labels, names and specifier definitions found while reading one document
//! make later sentences of the same document easier to parse. They are
//! registered in the [`GrammarContext`] between the discovery pass and the
//! extraction pass, never while sentences are being scanned.

use layered_extract::actions::{fix_whitespace, join};
use layered_extract::{and, create_stream_from_string, w, Element, GrammarContext, Token};
use layered_extract_model::Schema;
use tracing::debug;

/// Context key of the names and labels seen so far for `compound`.
pub fn document_compounds_key(compound: &Schema) -> String {
    format!("{}.document_compounds", compound.name())
}

/// Key of the extensible parse expression of `field`, if it is updatable.
pub fn field_extension_key<'s>(schema: &'s Schema, field: &str) -> Option<&'s str> {
    schema
        .field(field)
        .filter(|field| field.is_updatable())
        .and_then(|field| field.parse_expression())
        .and_then(Element::extension_key)
}

/// Exact-token grammar for `text`, longest phrases first.
fn phrases<'a>(texts: impl IntoIterator<Item = &'a str>, name: &str) -> Vec<Element> {
    let mut tokenized: Vec<(Vec<String>, &str)> = texts
        .into_iter()
        .map(|text| {
            let tokens = create_stream_from_string(text)
                .iter()
                .map(|token: &Token| token.text().to_string())
                .collect();
            (tokens, text)
        })
        .filter(|(tokens, _): &(Vec<String>, &str)| !tokens.is_empty())
        .collect();
    tokenized.sort_by(|(lhs, lhs_text), (rhs, rhs_text)| {
        rhs.len()
            .cmp(&lhs.len())
            .then(rhs_text.len().cmp(&lhs_text.len()))
            .then(lhs_text.cmp(rhs_text))
    });
    tokenized.dedup_by(|(_, lhs), (_, rhs)| lhs == rhs);
    tokenized
        .into_iter()
        .map(|(tokens, _)| {
            and(tokens.into_iter().map(w).collect())
                .named(name)
                .with_action(join)
                .with_action(fix_whitespace)
        })
        .collect()
}

/// Make `labels` matchable as the `labels` field of `compound`.
///
/// Replaces the previously registered labels. Does nothing when the labels
/// field is not updatable.
pub fn register_labels<'a>(
    context: &mut GrammarContext,
    compound: &Schema,
    labels: impl IntoIterator<Item = &'a str>,
) -> bool {
    let key = match field_extension_key(compound, "labels") {
        Some(key) => key.to_string(),
        None => {
            debug!(schema = compound.name(), "labels are not updatable");
            return false;
        }
    };
    let alternatives = phrases(labels, "labels");
    debug!(%key, count = alternatives.len(), "registering labels");
    context.set_alternatives(key, alternatives);
    true
}

/// Make compound `names` matchable anywhere a `compound` is expected,
/// longest names first so `DMAC-TRZ` wins over `DMAC`.
pub fn register_names<'a>(context: &mut GrammarContext, compound: &Schema, names: impl IntoIterator<Item = &'a str>) {
    let key = document_compounds_key(compound);
    let alternatives = phrases(names, "names");
    debug!(%key, count = alternatives.len(), "registering names");
    context.set_alternatives(key, alternatives);
}

/// Add specifier spellings defined in the document, such as an abbreviation
/// introduced in brackets, to the updatable `specifier` of `schema`.
pub fn update_specifiers<'a>(
    context: &mut GrammarContext,
    schema: &Schema,
    specifiers: impl IntoIterator<Item = &'a str>,
) -> bool {
    let key = match field_extension_key(schema, "specifier") {
        Some(key) => key.to_string(),
        None => return false,
    };
    for alternative in phrases(specifiers, "specifier") {
        context.extend(key.clone(), alternative);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use layered_extract::{no_match, GrammarContext};
    use layered_extract_model::{Field, FieldKind};

    #[test]
    fn longer_names_are_tried_first() {
        let compound = Schema::builder("Compound")
            .field(Field::set("names", FieldKind::String))
            .field(Field::set("labels", FieldKind::String).parse(no_match()).updatable())
            .build()
            .unwrap();
        let mut context = GrammarContext::new();
        register_names(&mut context, &compound, ["DMAC", "DMAC-TRZ", "DMAC"]);
        assert!(register_labels(&mut context, &compound, ["1a"]));

        let names = Element::extensible(document_compounds_key(&compound), no_match());
        let stream = create_stream_from_string("DMAC-TRZ emits");
        let found = names.match_at_with(&stream, 0, &context).unwrap();
        assert_eq!(found.to_xml(), "<names>DMAC-TRZ</names>");
        assert_eq!(context.alternatives(&document_compounds_key(&compound)).len(), 2);

        let labels = compound.field("labels").unwrap().parse_expression().unwrap();
        let found = labels.match_at_with(&create_stream_from_string("1a"), 0, &context).unwrap();
        assert_eq!(found.to_xml(), "<labels>1a</labels>");
    }
}
