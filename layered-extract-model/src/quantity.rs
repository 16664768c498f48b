//! Quantity fields and the inference of numbers and units from raw text.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::units::Dimension;
use crate::{Field, FieldKind, Value};

const NUMBER: &str = r"[-+]?(?:\d+(?:\.\d*)?|\.\d+)(?:\s*[×xX*]\s*10\s*\^?\s*[-+]?\d+|[eE][-+]?\d+)?";

static SINGLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^(?:[<>≤≥~≈]\s*)?({})$", NUMBER)).expect("Invalid number regex"));

static RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)^(?:between\s+|from\s+)?({})\s*(?:-|to|and)\s*({})$", NUMBER, NUMBER))
        .expect("Invalid range regex")
});

static WITH_ERROR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^({})\s*(?:±|\+/-|\+-)\s*({})$", NUMBER, NUMBER)).expect("Invalid error regex")
});

static EXPONENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)[×xX*]10\^?([-+]?\d+)$").expect("Invalid exponent regex"));

/// The fields every quantity schema carries.
pub fn quantity_fields(dimension: &Dimension) -> Vec<Field> {
    vec![
        Field::string("raw_value").required(),
        Field::string("raw_units"),
        Field::inferred("value", FieldKind::list(FieldKind::Float), "raw_value", |raw, _| {
            let numbers = infer_value(raw?.as_str()?)?;
            Some(Value::list(numbers))
        }),
        units_field(dimension),
        Field::inferred("error", FieldKind::Float, "raw_value", |raw, _| {
            infer_error(raw?.as_str()?).map(Value::Float)
        }),
    ]
}

/// The inferred `units` field: `raw_units` rendered against `dimension`.
pub fn units_field(dimension: &Dimension) -> Field {
    let dimension = dimension.clone();
    Field::inferred("units", FieldKind::String, "raw_units", move |raw, _| {
        let parsed = dimension.decompose(raw?.as_str()?)?;
        Some(Value::String(parsed.render()))
    })
}

fn normalize(text: &str) -> String {
    text.trim().replace(['−', '–', '—'], "-")
}

fn parse_number(text: &str) -> Option<f64> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    match EXPONENT.captures(&compact) {
        Some(caps) => {
            let mantissa: f64 = caps[1].parse().ok()?;
            let exponent: i32 = caps[2].parse().ok()?;
            Some(mantissa * 10f64.powi(exponent))
        }
        None => compact.parse().ok(),
    }
}

/// Numbers in a raw value: one for a single value or a value with an
/// error, two for a range.
pub fn infer_value(raw: &str) -> Option<Vec<f64>> {
    let text = normalize(raw);
    if let Some(caps) = WITH_ERROR.captures(&text) {
        return Some(vec![parse_number(&caps[1])?]);
    }
    if let Some(caps) = SINGLE.captures(&text) {
        return Some(vec![parse_number(&caps[1])?]);
    }
    if let Some(caps) = RANGE.captures(&text) {
        return Some(vec![parse_number(&caps[1])?, parse_number(&caps[2])?]);
    }
    None
}

/// The `±` error in a raw value.
pub fn infer_error(raw: &str) -> Option<f64> {
    let text = normalize(raw);
    let caps = WITH_ERROR.captures(&text)?;
    parse_number(&caps[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values() {
        assert_eq!(infer_value("24.1"), Some(vec![24.1]));
        assert_eq!(infer_value("−3"), Some(vec![-3.0]));
        assert_eq!(infer_value("<5"), Some(vec![5.0]));
        assert_eq!(infer_value("1–2"), Some(vec![1.0, 2.0]));
        assert_eq!(infer_value("10 to 20"), Some(vec![10.0, 20.0]));
        assert_eq!(infer_value("between 3 and 4.5"), Some(vec![3.0, 4.5]));
        assert_eq!(infer_value("2.5 × 10^3"), Some(vec![2500.0]));
        assert_eq!(infer_value("1e-3"), Some(vec![0.001]));
        assert_eq!(infer_value("high"), None);
    }

    #[test]
    fn errors() {
        assert_eq!(infer_value("3.1 ± 0.2"), Some(vec![3.1]));
        assert_eq!(infer_error("3.1 ± 0.2"), Some(0.2));
        assert_eq!(infer_error("3.1 +/- 0.2"), Some(0.2));
        assert_eq!(infer_error("3.1"), None);
    }
}
