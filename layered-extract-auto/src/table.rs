use layered_extract::{optional, r, w, Element, GrammarResult, Match, ResultNode};
use layered_extract_model::{Record, SchemaRef, Value};
use tracing::debug;

use crate::cem::default_chem_name;
use crate::interpret::{interpret_record, Pick};
use crate::parser::{
    chem_name_entity, entity_list, field_entities, interpret_match, labels_entity, root_phrase, specifier_entity,
    RecordParser,
};
use crate::unit::unit_element;
use crate::value::{open_bracket, value_element};

/// A power of ten factored out of a column, `[105 s-1]` for `×10^5 s⁻¹`.
const FACTORISED_POWER: &str = "^10[2-9]$";

/// The `raw_value` written in table cells that have no value.
pub fn no_value_element() -> Element {
    w("NoValue").named("raw_value")
}

/// Entities of a table cell. With `factorised`, a `10n` factor may precede
/// the units and a bracket opened after the specifier is skipped.
fn table_entities(schema: &SchemaRef, chem_name: Element, factorised: bool) -> GrammarResult<Vec<Element>> {
    let mut entities = vec![labels_entity(schema)];

    match schema.dimension() {
        Some(dimension) => match unit_element(dimension)? {
            Some(units) => {
                let units = if factorised {
                    optional(r(FACTORISED_POWER).named("factorised_power")) + units
                } else {
                    units
                };
                entities.extend(specifier_entity(schema).map(|specifier| {
                    let specifier = specifier + optional(w("/"));
                    if factorised {
                        specifier + optional(open_bracket().hide()) + optional(units.clone())
                    } else {
                        specifier + optional(units.clone())
                    }
                }));
                entities.push((value_element(None, false) | no_value_element()) + optional(units));
            }
            None => {
                entities.extend(specifier_entity(schema));
                entities.push(value_element(None, false) | no_value_element());
            }
        },
        None => entities.extend(specifier_entity(schema)),
    }

    entities.extend(field_entities(schema));
    entities.push(chem_name_entity(schema, &chem_name));
    Ok(entities)
}

/// Parses table cells, read together with their row and column headers.
///
/// Unlike [`AutoSentenceParser`](crate::AutoSentenceParser) the unit may
/// follow the specifier in the header (`τd [ns]`) instead of the value, the
/// `NoValue` placeholder is accepted and no trigger phrase is required.
#[derive(Debug, Clone)]
pub struct AutoTableParser {
    schema: SchemaRef,
    root: Element,
}

impl AutoTableParser {
    pub fn new(schema: &SchemaRef) -> GrammarResult<Self> {
        Self::with_chem_name(schema, default_chem_name(true))
    }

    pub fn with_chem_name(schema: &SchemaRef, chem_name: Element) -> GrammarResult<Self> {
        Ok(AutoTableParser {
            schema: schema.clone(),
            root: root_phrase(entity_list(table_entities(schema, chem_name, false)?)),
        })
    }
}

impl RecordParser for AutoTableParser {
    fn name(&self) -> &str {
        "AutoTableParser"
    }

    fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    fn root(&self) -> &Element {
        &self.root
    }

    fn interpret(&self, found: &Match) -> Vec<Record> {
        interpret_match(&self.schema, found, Pick::First, self.name())
    }
}

/// [`AutoTableParser`] for columns whose header factors out a power of
/// ten: under `kRISC [105 s-1]`, the cell `3.2` is read as `3.2×105`.
#[derive(Debug, Clone)]
pub struct FactorisedPowerTableParser {
    schema: SchemaRef,
    root: Element,
}

impl FactorisedPowerTableParser {
    pub fn new(schema: &SchemaRef) -> GrammarResult<Self> {
        Self::with_chem_name(schema, default_chem_name(true))
    }

    pub fn with_chem_name(schema: &SchemaRef, chem_name: Element) -> GrammarResult<Self> {
        Ok(FactorisedPowerTableParser {
            schema: schema.clone(),
            root: root_phrase(entity_list(table_entities(schema, chem_name, true)?)),
        })
    }
}

/// Append the phrase's factor to the record's `raw_value`.
fn apply_factorised_power(record: &mut Record, phrase: &ResultNode) {
    let factor = match phrase.children_named("factorised_power").next() {
        Some(node) => node.text_content(),
        None => return,
    };
    let raw_value = match record.value("raw_value").and_then(Value::as_str) {
        Some(raw_value) if raw_value != "NoValue" => format!("{}×{}", raw_value, factor),
        _ => return,
    };
    if let Err(err) = record.set("raw_value", raw_value) {
        debug!(%err, "factorised power dropped");
    }
}

impl RecordParser for FactorisedPowerTableParser {
    fn name(&self) -> &str {
        "FactorisedPowerTableParser"
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
            .filter_map(|phrase| {
                let mut record = interpret_record(&self.schema, phrase, Pick::First)?;
                apply_factorised_power(&mut record, phrase);
                record.set_record_method(self.name());
                Some(record)
            })
            .collect()
    }
}
