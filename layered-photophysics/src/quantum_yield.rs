//! Photoluminescence quantum yields.

use layered_extract::actions::{join, merge};
use layered_extract::{i, optional, r, w, Element, Match};
use layered_extract_auto::{interpret_record, AutoResult, AutoTableParser, Pick, RecordParser};
use layered_extract_model::{Field, Record, Schema, SchemaRef};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::condition::{self, atmosphere_phrase, phase_phrase, room_temperature_expression, temperature_phrase};
use crate::dimensions;

const PHI: &str = "^[ΦφϕɸⲪⲫ𝚽𝛗𝛟𝛷𝜑𝜙𝜱𝝋𝝓ᶲᵩ]$";

const PHI_JOINED: &str = r"^[ΦφϕɸⲪⲫ𝚽𝛗𝛟𝛷𝜑𝜙𝜱𝝋𝝓ᶲᵩ](([Pp][Ll])|([Ee][Mm]))([Aa]ir)?(inert)?([Vv]ac)?\w?$";

static FRACTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0\.(\d{1,3})$").expect("Invalid fraction regex"));

/// `ΦPL`, `Φ PL`, `PLQY`, `IQY`, `internal photoluminescence quantum yield`.
pub fn plqy_specifier() -> Element {
    let phi = r(PHI);
    let suffix = r(r"^[Pp][Ll]\w?$") | r(r"^[Tt]otal\w?$") | r(r"^[Ee][Mm]\w?$") | r(r"^(PL)?QY\w?$");
    (phi.clone() + suffix).with_action(merge)
        | r("^PLQY")
        | r("^IQY$")
        | (optional(w("internal")) + (i("photoluminescence") | w("PL")) + i("quantum") + i("yield")).with_action(join)
        | phi
        | r(PHI_JOINED)
}

pub fn photoluminescence_quantum_yield(compound: &SchemaRef) -> AutoResult<SchemaRef> {
    let temperature = condition::temperature()?;
    let schema = Schema::builder("PhotoluminescenceQuantumYield")
        .quantity(dimensions::ratio()?)
        .field(Field::string("specifier").required().parse(plqy_specifier()))
        .field(Field::model("compound", compound).contextual())
        .field(Field::model("atmosphere", &condition::atmosphere()?).parse(atmosphere_phrase()))
        .field(Field::model("phase", &condition::phase()?).parse(phase_phrase()))
        .field(Field::model("temperature", &temperature).parse(temperature_phrase(&temperature)?))
        .field(Field::string("room_temperature").parse(room_temperature_expression()))
        .build()?;
    Ok(schema)
}

/// `0.241` as a percentage, `24.1`. Only fractions with up to three
/// decimals are read this way.
pub fn fraction_to_percent(raw: &str) -> Option<String> {
    let digits = FRACTION.captures(raw)?.get(1)?.as_str();
    let padded = if digits.len() == 1 {
        format!("{}0", digits)
    } else {
        digits.to_string()
    };
    let (whole, decimals) = padded.split_at(2);
    let whole = whole.trim_start_matches('0');
    let whole = if whole.is_empty() { "0" } else { whole };
    Some(if decimals.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, decimals)
    })
}

/// Quantum yield columns given as fractions of one, without a unit.
///
/// Cells that carry a unit are left to the plain table parser.
#[derive(Debug, Clone)]
pub struct DimlessPlqyTableParser {
    inner: AutoTableParser,
}

impl DimlessPlqyTableParser {
    pub fn new(schema: &SchemaRef, chem_name: Element) -> AutoResult<Self> {
        Ok(DimlessPlqyTableParser {
            inner: AutoTableParser::with_chem_name(schema, chem_name)?,
        })
    }
}

impl RecordParser for DimlessPlqyTableParser {
    fn name(&self) -> &str {
        "DimlessPlqyTableParser"
    }

    fn schema(&self) -> &SchemaRef {
        self.inner.schema()
    }

    fn root(&self) -> &Element {
        self.inner.root()
    }

    fn interpret(&self, found: &Match) -> Vec<Record> {
        let mut records = Vec::new();
        for phrase in &found.nodes {
            if phrase.children().iter().any(|child| child.tag() == "raw_units") {
                continue;
            }
            let raw = match phrase.children().iter().find(|child| child.tag() == "raw_value") {
                Some(raw) => raw.text_content(),
                None => continue,
            };
            let percent = match fraction_to_percent(&raw) {
                Some(percent) => percent,
                None => continue,
            };
            let mut record = match interpret_record(self.schema(), phrase, Pick::First) {
                Some(record) => record,
                None => continue,
            };
            if let Err(err) = record
                .set("raw_value", percent)
                .and_then(|()| record.set("raw_units", "%"))
            {
                debug!(%err, "fraction not converted");
                continue;
            }
            record.set_record_method(self.name());
            records.push(record);
        }
        records
    }
}
