//! Default chemical entity mention grammar.
//!
//! Names come from the external NER tagger (`B-CM` followed by `I-CM`
//! tokens); labels are short alphanumeric identifiers such as `1`, `2a`,
//! `IV` or `C3`. Every element here produces a `compound` node with `names`
//! and `labels` children, which is what the interpreter reads for a
//! `compound` field.

use layered_extract::actions::{fix_whitespace, join};
use layered_extract::{every, first, i, not, optional, r, t_typed, w, zero_or_more, Element, NER_TAG};

use crate::value::{close_bracket, open_bracket};

pub const LABEL_PATTERN: &str = r"^(\d{1,3}[a-z]{0,2}|[A-Z]{1,2}-?\d{1,3}[a-z]?|[IVX]{1,5}[a-z]?|\d{1,3}[a-z]?['′″]+)$";

/// A run of tokens tagged as a chemical mention.
pub fn chemical_name() -> Element {
    (t_typed(NER_TAG, "B-CM") + zero_or_more(t_typed(NER_TAG, "I-CM")))
        .named("names")
        .with_action(join)
        .with_action(fix_whitespace)
}

fn label_blocklist() -> Element {
    // years and journal-style numbering are never compound labels
    r(r"^(1[89]|20)\d\d$") | w("S1") | w("T1")
}

/// A single label token, e.g. `2a`.
pub fn label() -> Element {
    every(vec![r(LABEL_PATTERN).named("labels"), not(label_blocklist())])
}

fn label_type() -> Element {
    r(r"^([Cc]ompounds?|[Cc]omplex(es)?|[Dd]yes?|[Ee]mitters?|[Mm]olecules?|[Ll]igands?|[Dd]erivatives?)$")
}

/// A name, optionally followed by its bracketed label: `4CzIPN (1)`.
pub fn cem() -> Element {
    (chemical_name() + optional(open_bracket().hide() + label() + close_bracket().hide())).group("compound")
}

/// Labels introduced by a label type: `compound 2a`, `emitters 1 and 2`.
pub fn chemical_label() -> Element {
    let separator = (w(",") | i("and")).hide();
    (label_type().hide()
        + optional(r("^[:#]$").hide())
        + label()
        + zero_or_more(optional(separator) + label()))
    .group("compound")
}

/// A bare label, as found in the first column of a table.
pub fn lenient_chemical_label() -> Element {
    label().group("compound")
}

/// What the auto-parsers look for when a schema has a `compound` field and
/// no dedicated compound grammar was supplied.
pub fn default_chem_name(lenient: bool) -> Element {
    let mut alternatives = vec![cem(), chemical_label()];
    if lenient {
        alternatives.push(lenient_chemical_label());
    }
    first(alternatives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use layered_extract::{create_stream_from_string, GrammarContext, LexiconTagger, TokenStream};

    fn tagged(text: &str) -> TokenStream {
        let mut stream = create_stream_from_string(text);
        stream.apply_tagger(
            &LexiconTagger::new(NER_TAG)
                .entry("DMAC", "B-CM")
                .entry("-", "I-CM")
                .entry("TRZ", "I-CM"),
        );
        stream
    }

    fn compounds(element: &Element, stream: &TokenStream) -> Vec<String> {
        element
            .scan(stream, &GrammarContext::new())
            .map(|found| found.to_xml())
            .collect()
    }

    #[test]
    fn names_with_bracketed_labels() {
        let stream = tagged("the emitter DMAC - TRZ ( 3b ) was");
        insta::assert_debug_snapshot!(compounds(&default_chem_name(false), &stream), @r###"
        [
            "<compound><names>DMAC-TRZ</names><labels>3b</labels></compound>",
        ]
        "###);
    }

    #[test]
    fn label_lists_after_a_label_type() {
        let stream = create_stream_from_string("Compounds 1, 2 and 4a were studied in 2019");
        insta::assert_debug_snapshot!(compounds(&default_chem_name(false), &stream), @r###"
        [
            "<compound><labels>1</labels><labels>2</labels><labels>4a</labels></compound>",
        ]
        "###);
    }

    #[test]
    fn bare_labels_only_when_lenient() {
        let stream = create_stream_from_string("2a");
        assert!(compounds(&default_chem_name(false), &stream).is_empty());
        assert_eq!(compounds(&default_chem_name(true), &stream).len(), 1);
        assert!(compounds(&lenient_chemical_label(), &create_stream_from_string("2019 S1")).is_empty());
    }
}
