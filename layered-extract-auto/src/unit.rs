//! Unit phrases for quantity schemas.
//!
//! Units are matched per token: `[ns]`, `kJ mol-1` and `cm−1` all arrive as
//! several tokens. The element built here accepts any run of tokens made of
//! magnitude prefixes, the dimension's unit patterns, brackets, slashes and
//! powers, then [`clean_units`] glues the run back together and
//! [`match_dimensions_of`] checks that the result really has the schema's
//! dimension.

use layered_extract::{zero_or_more, Element, GrammarError, GrammarResult, ResultNode, TokenStream};
use layered_extract_model::units::{Dimension, MAGNITUDES};
use tracing::debug;

const BRACKETS: [(&str, &str); 3] = [("(", ")"), ("[", "]"), ("{", "}")];

/// Tokens matching a unit of `dimension`, cleaned by [`clean_units`].
///
/// `max_power` limits the powers accepted after a unit (`m2`, `s-1`) to
/// `2..=max_power`. It must be above 2 and at most 9; `None` accepts any
/// integer power. Returns `None` for
/// dimensions without units.
pub fn construct_unit_element(dimension: &Dimension, max_power: Option<u32>) -> GrammarResult<Option<Element>> {
    if dimension.units().is_empty() {
        return Ok(None);
    }
    let numbers = match max_power {
        None => r"\d+".to_string(),
        Some(power @ 3..=9) => format!("[2-{}]", power),
        Some(power) => {
            return Err(GrammarError::InvalidConfiguration(format!(
                "max_power must be above 2 and at most 9, not {}",
                power
            )))
        }
    };

    let magnitudes = MAGNITUDES
        .iter()
        .map(|(prefix, _)| regex::escape(prefix))
        .collect::<Vec<_>>()
        .join("|");
    let units: String = dimension
        .units()
        .iter()
        .map(|unit| format!("({})|", unit.pattern()))
        .collect();
    let atom = format!(r"(({})?(([(\[])|([)\]])|-|{}(/)", magnitudes, units);
    let unit_atom = format!("{}))", atom);
    let powered_atom = format!(r"{}|([+\-–−]?{n}(\.{n})?)))", atom, n = numbers);

    let leading = Element::regex(&format!("^{}+{}*$", unit_atom, powered_atom))?;
    let trailing = Element::regex(&format!("^{}+$", powered_atom))?;
    Ok(Some(
        (leading.clone() + zero_or_more(leading | trailing)).with_action(clean_units),
    ))
}

/// The `raw_units` element of a quantity schema: [`construct_unit_element`]
/// restricted to unit strings of the right dimension.
pub fn unit_element(dimension: &Dimension) -> GrammarResult<Option<Element>> {
    Ok(construct_unit_element(dimension, None)?.map(|element| {
        element
            .named("raw_units")
            .with_condition(match_dimensions_of(dimension))
    }))
}

/// Join the matched unit tokens into one node, dropping brackets that are
/// never closed (or never opened) and a trailing hyphen.
pub fn clean_units(_tokens: &TokenStream, _start: usize, results: Vec<ResultNode>) -> Vec<ResultNode> {
    let tag = match results.first() {
        Some(first) => first.tag().to_string(),
        None => return results,
    };
    let mut texts: Vec<&str> = results.iter().flat_map(ResultNode::texts).collect();

    for (open, close) in BRACKETS {
        let balance = texts.iter().fold(0i32, |balance, text| match *text {
            text if text == open => balance + 1,
            text if text == close => balance - 1,
            _ => balance,
        });
        if balance > 0 {
            let mut surplus = balance;
            texts.retain(|text| {
                if surplus > 0 && *text == open {
                    surplus -= 1;
                    return false;
                }
                true
            });
        } else if balance < 0 {
            let mut surplus = -balance;
            texts.reverse();
            texts.retain(|text| {
                if surplus > 0 && *text == close {
                    surplus -= 1;
                    return false;
                }
                true
            });
            texts.reverse();
        }
    }

    let mut text = texts.concat();
    if text.ends_with(['-', '–', '−']) {
        text.pop();
    }
    let start = results.iter().map(ResultNode::start).min().unwrap_or(0);
    let end = results.iter().map(ResultNode::end).max().unwrap_or(start);
    vec![ResultNode::leaf(tag, text, start, end)]
}

/// Condition accepting unit nodes whose text has exactly the dimensions of
/// `dimension`.
pub fn match_dimensions_of(dimension: &Dimension) -> impl Fn(&[ResultNode]) -> bool + Send + Sync + 'static {
    let dimension = dimension.clone();
    move |results: &[ResultNode]| {
        let text = match results.first() {
            Some(node) => node.text_content(),
            None => return false,
        };
        let matches = dimension.matches(&text);
        if !matches {
            debug!(units = %text, dimension = dimension.name(), "units rejected");
        }
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layered_extract::{create_stream_from_string, GrammarContext};

    fn time() -> Dimension {
        Dimension::base("time", &[("Second", "s(ec(ond)?s?)?")]).unwrap()
    }

    fn first_units(text: &str) -> Option<String> {
        let element = unit_element(&time()).unwrap().unwrap();
        let stream = create_stream_from_string(text);
        let context = GrammarContext::new();
        let found = element.scan(&stream, &context).next()?;
        found.nodes.first().map(ResultNode::text_content)
    }

    #[test]
    fn brackets_are_kept_only_when_balanced() {
        assert_eq!(first_units("[ns]").as_deref(), Some("[ns]"));
        assert_eq!(first_units("μs)").as_deref(), Some("μs"));
        assert_eq!(first_units("(ms").as_deref(), Some("ms"));
    }

    #[test]
    fn wrong_dimensions_are_rejected() {
        let frequency = Dimension::product("frequency", &[(&time(), -1)]);
        let per_second = unit_element(&frequency).unwrap().unwrap();
        assert!(per_second.match_at(&create_stream_from_string("ns"), 0).is_none());
        let found = per_second.match_at(&create_stream_from_string("s-1"), 0).unwrap();
        assert_eq!(found.to_xml(), "<raw_units>s-1</raw_units>");
    }

    #[test]
    fn trailing_hyphen_is_dropped() {
        let stream = TokenStream::default();
        let cleaned = clean_units(
            &stream,
            0,
            vec![
                ResultNode::leaf("raw_units", "ns", 0, 1),
                ResultNode::leaf("raw_units", "-", 1, 2),
            ],
        );
        assert_eq!(cleaned, vec![ResultNode::leaf("raw_units", "ns", 0, 2)]);
    }

    #[test]
    fn max_power_is_checked_at_build_time() {
        assert!(construct_unit_element(&time(), Some(9)).unwrap().is_some());
        assert!(construct_unit_element(&time(), Some(3)).unwrap().is_some());
        assert!(matches!(
            construct_unit_element(&time(), Some(2)),
            Err(GrammarError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            construct_unit_element(&time(), Some(10)),
            Err(GrammarError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            construct_unit_element(&time(), Some(1)),
            Err(GrammarError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn dimensionless_numbers_have_no_unit_element() {
        let number = Dimension::dimensionless("number", &[]).unwrap();
        assert!(unit_element(&number).unwrap().is_none());
    }
}
