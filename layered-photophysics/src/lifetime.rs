//! Delayed fluorescence lifetimes.
//!
//! Tables of TADF emitters usually give the prompt and delayed components
//! together, as `τp/τd [ns]` over `145/3100`. The delayed lifetime is the
//! second of the pair.

use layered_extract::actions::{join, merge};
use layered_extract::{i, optional, r, skip_to, w, Element, Match};
use layered_extract_auto::value::{close_bracket, open_bracket};
use layered_extract_auto::{
    chem_name_entity, entity_list, field_entities, interpret_match, labels_entity, match_dimensions_of,
    no_value_element, root_phrase, value_element, AutoResult, Pick, RecordParser,
};
use layered_extract_model::{Dimension, Field, ModelError, Record, Schema, SchemaRef};

use crate::condition::{self, room_temperature_phrase, temperature_phrase};
use crate::dimensions;

const TAU: &str = "^[τⲧ𝛕𝜏𝝉𝞃𝞽]$";
const TAU_D_JOINED: &str = r"^[τⲧ𝛕𝜏𝝉𝞃𝞽]\(?((DF?)|(df?)|(tadf)|(TADF)|[Tt]|([Dd]elayed))\)?\w?$";
const TAU_P_JOINED: &str = r"^[τⲧ𝛕𝜏𝝉𝞃𝞽]\(?((PF?)|(pf?)|[Ss]|[Ff]|([Pp]rompt))\)?\w?$";

fn fluorescence() -> Element {
    r("^[Ff]luorescen((ce)|t)$")
}

fn lifetimes() -> Element {
    r("^[Ll]ifetimes?$") | r("^[cC]omponents?$")
}

/// `τ` followed by a subscript written as a separate token, `τ (TADF)`.
fn tau_with(suffix: Element) -> Element {
    (r(TAU) + optional(open_bracket().hide()) + suffix + optional(close_bracket().hide())).with_action(merge)
}

/// `τd`, `τ TADF`, `delayed fluorescence lifetime`, `lifetime of the
/// delayed components`.
pub fn tau_d_specifier() -> Element {
    let suffix = r(r"^[Tt]1?\w?$")
        | r(r"^[Dd][Ff]\w?$")
        | r(r"^[Dd]elayed\w?$")
        | r(r"^[Dd]\w?$")
        | r(r"^[Tt]adf\w?$")
        | r(r"^TADF\w?$");
    let phrase = ((i("delayed") + optional(fluorescence())) | w("DF")) + lifetimes();
    let decay = (fluorescence() | i("decay"))
        + skip_to(i("delayed")).hide()
        + i("delayed")
        + optional(w("(") + i("DF") + w(")"))
        + lifetimes();
    let lifetime_of = r("^[lL]ifetimes?$")
        + w("of")
        + skip_to(w("delayed")).hide()
        + w("delayed")
        + (w("fluorescence") | r("^components?$"));
    tau_with(suffix)
        | r(TAU_D_JOINED)
        | phrase.with_action(join)
        | decay.with_action(join)
        | lifetime_of.with_action(join)
}

/// `τp`, `τ PF`, `prompt fluorescence lifetime`.
pub fn tau_p_specifier() -> Element {
    let suffix = r(r"^[Ss]\w?$") | r(r"^[Pp][Ff]\w?$") | r(r"^[Pp]rompt\w?$") | r(r"^[Pp]\w?$");
    let phrase = ((i("prompt") + optional(fluorescence())) | w("PF")) + lifetimes();
    let decay = (fluorescence() | i("decay"))
        + skip_to(i("prompt")).hide()
        + i("prompt")
        + optional(w("(") + i("PF") + w(")"))
        + lifetimes();
    tau_with(suffix) | r(TAU_P_JOINED) | phrase.with_action(join) | decay.with_action(join)
}

pub fn delayed_lifetime(compound: &SchemaRef) -> AutoResult<SchemaRef> {
    let temperature = condition::temperature()?;
    let schema = Schema::builder("DelayedLifetime")
        .quantity(dimensions::time()?)
        .field(Field::string("specifier").required().parse(tau_d_specifier()))
        .field(Field::model("compound", compound).contextual())
        .field(Field::model("temperature", &temperature).parse(temperature_phrase(&temperature)?))
        .field(Field::model("room_temperature", &condition::room_temperature()?).parse(room_temperature_phrase()))
        .build()?;
    Ok(schema)
}

/// `ns`, `[μs]`, with the brackets dropped.
fn lifetime_units(dimension: &Dimension) -> Element {
    (optional(open_bracket().hide()) + r("^[nmμµ]?s$") + optional(close_bracket().hide()))
        .named("raw_units")
        .with_action(merge)
        .with_condition(match_dimensions_of(dimension))
}

/// Cells holding prompt and delayed lifetimes side by side.
///
/// The prompt specifier in the header is required and hidden; of the
/// slash-separated values the last one is kept.
#[derive(Debug, Clone)]
pub struct TauDTableParser {
    schema: SchemaRef,
    root: Element,
}

impl TauDTableParser {
    pub fn new(schema: &SchemaRef, chem_name: Element) -> AutoResult<Self> {
        let dimension = schema.dimension().ok_or_else(|| {
            ModelError::InvalidConfiguration(format!("{} is not a quantity", schema.name()))
        })?;
        let units = lifetime_units(dimension);
        let slash = w("/").hide();

        let prompt = (tau_p_specifier() + optional(units.clone()) + w("/")).hide();
        let specifier = prompt
            + tau_d_specifier().named("specifier")
            + optional(slash.clone())
            + optional((units.clone() + slash.clone() + units.clone()) | units.clone());

        let slot = (value_element(None, false) | no_value_element()) + optional(units);
        let separator = (w("/") | w("|")).hide();
        let values = slot.clone() + separator.clone() + slot.clone() + optional(separator + slot);

        let mut entities = vec![labels_entity(schema), specifier, values];
        entities.extend(field_entities(schema));
        entities.push(chem_name_entity(schema, &chem_name));

        Ok(TauDTableParser {
            schema: schema.clone(),
            root: root_phrase(entity_list(entities)),
        })
    }
}

impl RecordParser for TauDTableParser {
    fn name(&self) -> &str {
        "TauDTableParser"
    }

    fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    fn root(&self) -> &Element {
        &self.root
    }

    fn interpret(&self, found: &Match) -> Vec<Record> {
        interpret_match(&self.schema, found, Pick::Last, self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compound::{theme_chem_name, theme_compound};
    use layered_extract::{create_stream_from_string, GrammarContext};
    use layered_extract_auto::AutoSentenceParser;

    fn schema() -> SchemaRef {
        delayed_lifetime(&theme_compound().unwrap()).unwrap()
    }

    fn sentence(text: &str) -> Vec<String> {
        let schema = schema();
        let parser = AutoSentenceParser::builder(&schema)
            .chem_name(theme_chem_name())
            .build()
            .unwrap();
        parser
            .parse(&create_stream_from_string(text), &GrammarContext::new())
            .iter()
            .map(Record::to_json)
            .collect()
    }

    #[test]
    fn prompt_and_delayed_pairs_keep_the_delayed_value() {
        let schema = schema();
        let parser = TauDTableParser::new(&schema, theme_chem_name()).unwrap();
        let records = parser.parse(&create_stream_from_string("τp/τd [ns] 145/3100"), &GrammarContext::new());
        assert_eq!(records.len(), 1);
        insta::assert_snapshot!(records[0].to_json(), @r###"{"DelayedLifetime":{"raw_units":"ns","raw_value":"3100","specifier":"τd","units":"(10^-9.0) * Second^(1.0)","value":[3100.0]}}"###);
        assert_eq!(records[0].record_method(), Some("TauDTableParser"));
    }

    #[test]
    fn single_lifetimes_are_left_to_other_parsers() {
        let parser = TauDTableParser::new(&schema(), theme_chem_name()).unwrap();
        assert!(parser
            .parse(&create_stream_from_string("τd [ns] 3100"), &GrammarContext::new())
            .is_empty());
    }

    #[test]
    fn spelled_out_specifier_with_compound() {
        insta::assert_debug_snapshot!(sentence("Compound 1 exhibits a delayed fluorescence lifetime of 4 μs ."), @r###"
        [
            "{\"DelayedLifetime\":{\"compound\":{\"ThemeCompound\":{\"labels\":[\"1\"],\"roles\":[\"compound\"]}},\"raw_units\":\"μs\",\"raw_value\":\"4\",\"specifier\":\"delayed fluorescence lifetime\",\"units\":\"(10^-6.0) * Second^(1.0)\",\"value\":[4.0]}}",
        ]
        "###);
    }

    #[test]
    fn letter_specifiers_with_bracketed_subscripts() {
        let expected = r#"{"DelayedLifetime":{"raw_units":"μs","raw_value":"120","specifier":"τTADF","units":"(10^-6.0) * Second^(1.0)","value":[120.0]}}"#;
        assert_eq!(sentence("τ(TADF) of 120 μs ."), vec![expected]);
        assert_eq!(sentence("τ TADF of 120 μs ."), vec![expected]);
    }

    #[test]
    fn prompt_specifiers_are_not_delayed_ones() {
        let context = GrammarContext::new();
        let stream = create_stream_from_string("τp");
        assert!(tau_p_specifier().match_full(&stream, &context).is_some());
        assert!(tau_d_specifier().match_full(&stream, &context).is_none());
    }
}
