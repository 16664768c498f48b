//! Singlet-triplet energy splitting, ΔEST.

use layered_extract::actions::{fix_whitespace, join, merge};
use layered_extract::{i, optional, r, w, Element, Match};
use layered_extract_auto::{
    chem_name_entity, entity_list, field_entities, interpret_record, labels_entity, no_value_element, root_phrase,
    unit_element, value_element, AutoResult, Pick, RecordParser,
};
use layered_extract_model::{Field, ModelError, Record, Schema, SchemaRef};
use tracing::debug;

use crate::dimensions;

const DELTA_E: &str = "^[Δⲇ∆Ⲇ𝚫𝛥𝜟𝝙𝞓]E$";
const DELTA_E_ST: &str = r"^[Δⲇ∆Ⲇ𝚫𝛥𝜟𝝙𝞓]E(ST|st)\w{0,2}$";
const DELTA_E_S: &str = "^[Δⲇ∆Ⲇ𝚫𝛥𝜟𝝙𝞓]E[Ss]$";
const HYPHEN: &str = "^[-‐‑⁃‒–—―]$";

/// `ΔEST`, `ΔE ST`, `ΔES-T`, `singlet-triplet splitting`.
pub fn st_split_specifier() -> Element {
    let suffix = r(r"^(ST|st)\w{0,2}$") | r(r"^[Ss][-‐‑⁃‒–—―][Tt]\w{0,2}$");
    (r(DELTA_E) + suffix).with_action(merge)
        | (i("singlet") + optional(r(HYPHEN) | w("/")) + i("triplet") + r("^[Ss]plit(tings?)?$"))
            .with_action(join)
            .with_action(fix_whitespace)
        | r(DELTA_E_ST)
        | (r(DELTA_E_S) + r(HYPHEN) + r(r"^[Tt]\w{0,2}$")).with_action(merge)
}

pub fn st_split(compound: &SchemaRef) -> AutoResult<SchemaRef> {
    let schema = Schema::builder("STSplit")
        .quantity(dimensions::energy()?)
        .field(Field::string("specifier").required().parse(st_split_specifier()))
        .field(Field::model("compound", compound).contextual())
        .build()?;
    Ok(schema)
}

/// Cells giving both state energies and their gap, as
/// `S1/T1/ΔEST [eV]` over `2.95/2.85/0.10`. Keeps the gap, the last
/// value, with the first unit found.
#[derive(Debug, Clone)]
pub struct STSplitTableParser {
    schema: SchemaRef,
    root: Element,
}

impl STSplitTableParser {
    pub fn new(schema: &SchemaRef, chem_name: Element) -> AutoResult<Self> {
        let dimension = schema.dimension().ok_or_else(|| {
            ModelError::InvalidConfiguration(format!("{} is not a quantity", schema.name()))
        })?;
        let units = unit_element(dimension)?.ok_or_else(|| {
            ModelError::InvalidConfiguration(format!("{} has no units", schema.name()))
        })?;
        let slash = w("/").hide();

        let states = (r(r"^E?S1\w?$") + w("/") + r(r"^E?T1\w?$") + w("/")).hide();
        let specifier = states
            + st_split_specifier().named("specifier")
            + optional(slash.clone())
            + optional(units.clone());

        let slot = (value_element(None, false) | no_value_element()) + optional(units);
        let values = slot.clone() + slash.clone() + slot.clone() + slash + slot;

        let mut entities = vec![labels_entity(schema), specifier, values];
        entities.extend(field_entities(schema));
        entities.push(chem_name_entity(schema, &chem_name));

        Ok(STSplitTableParser {
            schema: schema.clone(),
            root: root_phrase(entity_list(entities)),
        })
    }
}

impl RecordParser for STSplitTableParser {
    fn name(&self) -> &str {
        "STSplitTableParser"
    }

    fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    fn root(&self) -> &Element {
        &self.root
    }

    fn interpret(&self, found: &Match) -> Vec<Record> {
        let mut records = Vec::new();
        for phrase in &found.nodes {
            let mut record = match interpret_record(&self.schema, phrase, Pick::Last) {
                Some(record) => record,
                None => continue,
            };
            let first_units = phrase.children().iter().find(|child| child.tag() == "raw_units");
            if let Some(units) = first_units {
                if let Err(err) = record.set("raw_units", units.text_content()) {
                    debug!(%err, "units skipped");
                }
            }
            record.set_record_method(self.name());
            records.push(record);
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compound::{theme_chem_name, theme_compound};
    use layered_extract::{create_stream_from_string, GrammarContext};

    #[test]
    fn state_energies_and_gap() {
        let schema = st_split(&theme_compound().unwrap()).unwrap();
        let parser = STSplitTableParser::new(&schema, theme_chem_name()).unwrap();
        let stream = create_stream_from_string("S1/T1/ΔEST [eV] 2.95/2.85/0.10");
        let records = parser.parse(&stream, &GrammarContext::new());
        assert_eq!(records.len(), 1);
        insta::assert_snapshot!(records[0].to_json(), @r###"{"STSplit":{"raw_units":"[eV]","raw_value":"0.10","specifier":"ΔEST","units":"ElectronVolt^(1.0)","value":[0.1]}}"###);
    }

    #[test]
    fn specifier_spellings() {
        let context = GrammarContext::new();
        let found: Vec<String> = ["ΔEST", "ΔE ST", "ΔES - T", "singlet - triplet splitting"]
            .iter()
            .filter_map(|text| st_split_specifier().match_full(&create_stream_from_string(text), &context))
            .map(|found| found.nodes[0].text_content())
            .collect();
        assert_eq!(found, vec!["ΔEST", "ΔEST", "ΔES-T", "singlet-triplet splitting"]);
    }
}
