//! Numeric value phrases.

use layered_extract::actions::{join, merge};
use layered_extract::{first, i, optional, r, w, Element};

const PURE_NUMBER: &str = r"^(([+\-–−~∼˜]?\d+([.・,\d]+)?)|(<nUm>)|(×))+$";
const JOINED_RANGE: &str = r"^[+\-–−~∼˜]?\d+([.・,\d]+)?[\-–−~∼˜]\d+([.・,\d]+)?$";
const RANGE_DASH: &str = r"^[\-–−~∼˜]$";
const MINUS: &str = r"^[\-–−]$";

pub fn open_bracket() -> Element {
    r(r"^[(\[{]$")
}

pub fn close_bracket() -> Element {
    r(r"^[)\]}]$")
}

fn number() -> Element {
    let pure = r(PURE_NUMBER);
    (pure.clone() + r("^×$") + pure.clone()) | pure
}

/// A value, optionally followed by `units`, producing one `raw_value` node
/// with the value text glued together (`"1-2"`, `"3.1 ± 0.2"`, `"~5"`).
///
/// Ranges written with a dash, `±`, `between … and …`, or a bracketed
/// uncertainty are always recognized; `… to …` ranges only with
/// `activate_to_range`, since "from 3 to 5 mg" is usually not one value.
pub fn value_element(units: Option<Element>, activate_to_range: bool) -> Element {
    let number = number();
    let pure = r(PURE_NUMBER);

    let plusminus_range = (number.clone() + r("^±") + number.clone()).with_action(join);
    let joined_range = r(JOINED_RANGE);
    let (spaced_range, to_range) = match &units {
        Some(units) => (
            number.clone() + optional(units.hide()) + ((r(RANGE_DASH) + number.clone()) | number.clone()),
            number.clone() + optional(units.hide()) + i("to") + number.clone(),
        ),
        None => (
            number.clone() + r(RANGE_DASH) + number.clone(),
            number.clone() + i("to") + number.clone(),
        ),
    };
    let between_range = (i("between").hide() + number.clone() + i("and") + number.clone()).with_action(join);
    let bracket_range = r(r"^(\d+\.?(?:\d+)?)\(\d+\)$");
    let spaced_bracket_range = (pure.clone() + w("(") + pure + w(")")).with_action(merge);

    let mut ranges = vec![plusminus_range, joined_range, spaced_range.with_action(merge)];
    if activate_to_range {
        ranges.push(to_range.with_action(join));
    }
    ranges.extend([between_range, bracket_range, spaced_bracket_range]);

    let value_range = (optional(r(MINUS)) + first(ranges))
        .named("raw_value")
        .with_action(merge);
    let value_single = (optional(r(r"^[~∼˜<>]$")) + optional(r(MINUS)) + number)
        .named("raw_value")
        .with_action(merge);

    let value = optional(open_bracket().hide()) + (value_range | value_single) + optional(close_bracket().hide());
    match units {
        Some(units) => value + units,
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layered_extract::{create_stream_from_string, GrammarContext};

    fn values(text: &str, activate_to_range: bool) -> Vec<String> {
        let element = value_element(None, activate_to_range);
        let stream = create_stream_from_string(text);
        element
            .scan(&stream, &GrammarContext::new())
            .flat_map(|found| found.nodes)
            .map(|node| node.text_content())
            .collect()
    }

    #[test]
    fn single_values_and_ranges() {
        assert_eq!(values("yield of 24.1 percent", false), vec!["24.1"]);
        assert_eq!(values("from 3 – 5 and ~7", false), vec!["3–5", "~7"]);
        assert_eq!(values("3.1 ± 0.2", false), vec!["3.1 ± 0.2"]);
        assert_eq!(values("between 2 and 4", false), vec!["2 and 4"]);
    }

    #[test]
    fn to_ranges_need_activation() {
        assert_eq!(values("10 to 20", false), vec!["10", "20"]);
        assert_eq!(values("10 to 20", true), vec!["10 to 20"]);
    }

    #[test]
    fn brackets_around_values_are_dropped() {
        insta::assert_snapshot!(
            value_element(None, false)
                .match_at(&create_stream_from_string("(145)"), 0)
                .unwrap()
                .to_xml(),
            @"<raw_value>145</raw_value>"
        );
    }
}
