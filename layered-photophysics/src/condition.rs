//! Measurement conditions: atmosphere, phase, solvent, temperature.
//!
//! These models are mostly found nested in a property record. Each comes
//! with the parse expression a property schema uses for its field, which
//! produces a node named after the field holding the nested model's own
//! fields.

use layered_extract::actions::{fix_whitespace, join};
use layered_extract::{and, create_stream_from_string, every, first, i, not, optional, r, w, Element, Match};
use layered_extract_auto::{
    entity_list, field_entities, interpret_match, root_phrase, specifier_entity, unit_element, value_element,
    AutoResult, Pick, RecordParser,
};
use layered_extract_model::{Field, ModelError, ModelResult, Record, Schema, SchemaRef};

use crate::dimensions;

const HYPHEN: &str = "^[-‐‑–]$";

const SOLVENTS: [&str; 10] = [
    "toluene",
    "dichloromethane",
    "DCM",
    "THF",
    "tetrahydrofuran",
    "chloroform",
    "cyclohexane",
    "hexane",
    "acetonitrile",
    "2-MeTHF",
];

const HOSTS: [&str; 10] = ["mCP", "mCBP", "CBP", "DPEPO", "PPF", "TCTA", "PMMA", "Zeonex", "TPBi", "BCPO"];

pub fn atmosphere_expression() -> Element {
    i("air") | i("nitrogen") | w("N2") | i("argon") | i("inert")
}

pub fn atmosphere() -> ModelResult<SchemaRef> {
    Schema::builder("Atmosphere")
        .field(Field::string("atmosphere").required().parse(atmosphere_expression()))
        .build()
}

/// Parse expression of an `atmosphere` field.
pub fn atmosphere_phrase() -> Element {
    atmosphere_expression().named("atmosphere").group("atmosphere")
}

fn phase_specifier() -> Element {
    (r("^[Ss]olutions?$") | (optional(i("thin") + optional(r(HYPHEN))) + r("^[Ff]ilms?$")) | r("^[hH]osts?$"))
        .with_action(join)
        .with_action(fix_whitespace)
}

/// Common solvents. Multi-token names such as `2-MeTHF` are matched token
/// by token.
pub fn solvent_expression() -> Element {
    let solvents = SOLVENTS.iter().map(|name| {
        let mut tokens = create_stream_from_string(name)
            .iter()
            .map(|token| i(token.text()))
            .collect::<Vec<_>>();
        match tokens.len() {
            1 => tokens.remove(0),
            _ => and(tokens).with_action(join).with_action(fix_whitespace),
        }
    });
    first(solvents.collect())
}

pub fn solvent() -> ModelResult<SchemaRef> {
    Schema::builder("Solvent")
        .field(Field::string("solvent").required().parse(solvent_expression()))
        .build()
}

/// Parse expression of a `solvent` field holding a nested model.
pub fn solvent_phrase() -> Element {
    solvent_expression().named("solvent").group("solvent")
}

/// Solvents, then host matrices.
fn host_expression() -> Element {
    let hosts = HOSTS.iter().map(|name| w(*name));
    first(std::iter::once(solvent_expression()).chain(hosts).collect())
}

pub fn phase() -> ModelResult<SchemaRef> {
    Schema::builder("Phase")
        .field(Field::string("specifier").parse(phase_specifier()))
        .field(Field::string("host").parse(host_expression()))
        .build()
}

/// Parse expression of a `phase` field: `toluene solution`, `mCBP film`,
/// `thin film`, `toluene`.
pub fn phase_phrase() -> Element {
    let host = host_expression().named("host");
    let specifier = phase_specifier().named("specifier");
    ((host + optional(specifier.clone())) | specifier).group("phase")
}

/// `T`, but not `Tg` or `Td`.
pub fn temperature_specifier() -> Element {
    i("temperature")
        | every(vec![r(r"^T\w?$"), not(w("Tg")), not(w("Td"))])
        | i("at")
        | i("near")
        | i("around")
        | i("above")
}

pub fn temperature() -> ModelResult<SchemaRef> {
    Schema::builder("Temperature")
        .quantity(dimensions::temperature()?)
        .field(Field::string("raw_units").required())
        .field(Field::string("specifier").required().parse(temperature_specifier()).updatable())
        .build()
}

fn temperature_units(schema: &Schema) -> AutoResult<Element> {
    let dimension = schema.dimension().ok_or_else(|| {
        ModelError::InvalidConfiguration(format!("{} is not a quantity", schema.name()))
    })?;
    let units = unit_element(dimension)?.ok_or_else(|| {
        ModelError::InvalidConfiguration(format!("{} has no units", schema.name()))
    })?;
    Ok(units)
}

/// Parse expression of a `temperature` field: `at 300 K`. Uses the
/// schema's own specifier, so document updates to it apply here too.
pub fn temperature_phrase(schema: &SchemaRef) -> AutoResult<Element> {
    let specifier = specifier_entity(schema).ok_or_else(|| {
        ModelError::InvalidConfiguration(format!("{} has no specifier expression", schema.name()))
    })?;
    let value = value_element(Some(temperature_units(schema)?), false);
    Ok((specifier + value).group("temperature"))
}

pub fn room_temperature_expression() -> Element {
    (r(r"(?i)^r\.?t\.?$") | ((i("room") | i("ambient")) + optional(r(HYPHEN)) + i("temperature")))
        .with_action(join)
        .with_action(fix_whitespace)
}

pub fn room_temperature() -> ModelResult<SchemaRef> {
    Schema::builder("RoomTemperature")
        .field(Field::string("room_temperature").required().parse(room_temperature_expression()))
        .build()
}

/// Parse expression of a `room_temperature` field holding a nested model.
pub fn room_temperature_phrase() -> Element {
    room_temperature_expression().named("room_temperature").group("room_temperature")
}

/// Temperature columns and cells. The value must carry its unit.
#[derive(Debug, Clone)]
pub struct TemperatureTableParser {
    schema: SchemaRef,
    root: Element,
}

impl TemperatureTableParser {
    pub fn new(schema: &SchemaRef) -> AutoResult<Self> {
        let mut entities: Vec<Element> = specifier_entity(schema).into_iter().collect();
        entities.push(value_element(Some(temperature_units(schema)?), false));
        entities.extend(field_entities(schema));
        Ok(TemperatureTableParser {
            schema: schema.clone(),
            root: root_phrase(entity_list(entities)),
        })
    }
}

impl RecordParser for TemperatureTableParser {
    fn name(&self) -> &str {
        "TemperatureTableParser"
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
