//! Post-match actions.
//!
//! An action receives the token stream, the start position of the match and
//! the nodes the element produced, and returns the nodes to keep. Attach them
//! with [`Element::with_action`](crate::Element::with_action).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{ResultNode, TokenStream};

/// Characters treated as hyphens when repairing whitespace.
pub const HYPHENS: &str = "-‐‑⁃‒–—―−";

static SPACED_SINGLE_BETWEEN_HYPHENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"- (.) -").expect("Invalid hyphen regex"));

fn span_of(results: &[ResultNode]) -> (usize, usize) {
    let start = results.iter().map(ResultNode::start).min().unwrap_or(0);
    let end = results.iter().map(ResultNode::end).max().unwrap_or(start);
    (start, end)
}

fn collapse(results: Vec<ResultNode>, separator: &str) -> Vec<ResultNode> {
    let first = match results.first() {
        Some(first) => first,
        None => return results,
    };
    let text = results
        .iter()
        .flat_map(ResultNode::texts)
        .collect::<Vec<_>>()
        .join(separator);
    let (start, end) = span_of(&results);
    vec![ResultNode::leaf(first.tag(), text, start, end)]
}

/// Join all texts of the match with single spaces, keeping the first tag.
pub fn join(_tokens: &TokenStream, _start: usize, results: Vec<ResultNode>) -> Vec<ResultNode> {
    collapse(results, " ")
}

/// Concatenate all texts of the match, keeping the first tag.
pub fn merge(_tokens: &TokenStream, _start: usize, results: Vec<ResultNode>) -> Vec<ResultNode> {
    collapse(results, "")
}

/// Replace the children of every node with their concatenated text.
pub fn flatten(_tokens: &TokenStream, _start: usize, results: Vec<ResultNode>) -> Vec<ResultNode> {
    results
        .into_iter()
        .map(|node| {
            let text: String = node.texts().concat();
            ResultNode::leaf(node.tag(), text, node.start(), node.end())
        })
        .collect()
}

/// Remove a trailing full stop from every text in the match.
pub fn strip_stop(_tokens: &TokenStream, _start: usize, results: Vec<ResultNode>) -> Vec<ResultNode> {
    results
        .into_iter()
        .map(|mut node| {
            node.map_texts(&|text| text.strip_suffix('.').unwrap_or(text).to_string());
            node
        })
        .collect()
}

/// Remove tokenization whitespace around hyphens, brackets, slashes and commas.
pub fn fix_whitespace(_tokens: &TokenStream, _start: usize, results: Vec<ResultNode>) -> Vec<ResultNode> {
    results
        .into_iter()
        .map(|mut node| {
            node.map_texts(&fix_whitespace_str);
            node
        })
        .collect()
}

/// String form of [`fix_whitespace`].
pub fn fix_whitespace_str(text: &str) -> String {
    let mut text = text.replace(" , ", ", ").replace(" ,", ",");
    for hyphen in HYPHENS.chars() {
        text = text
            .replace(&format!("{} ", hyphen), &hyphen.to_string())
            .replace(&format!(" {}", hyphen), &hyphen.to_string());
    }
    let mut text = SPACED_SINGLE_BETWEEN_HYPHENS
        .replace_all(&text, "-$1-")
        .into_owned();
    for (from, to) in [
        (" -", "-"),
        (" : ", ":"),
        (" ( ", "("),
        (" ) ", ")"),
        (" / ", "/"),
        (" [ ", "["),
        (" ] ", "]"),
        ("( ", "("),
        (" )", ")"),
        ("[ ", "["),
        (" ]", "]"),
        ("′ ", "′"),
        (" ′", "′"),
    ] {
        text = text.replace(from, to);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(texts: &[&str]) -> Vec<ResultNode> {
        texts
            .iter()
            .enumerate()
            .map(|(idx, text)| ResultNode::leaf("specifier", *text, idx, idx + 1))
            .collect()
    }

    #[test]
    fn join_keeps_first_tag_and_span() {
        let stream = TokenStream::default();
        let joined = join(&stream, 0, leaves(&["PL", "quantum", "yield"]));
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].tag(), "specifier");
        assert_eq!(joined[0].text(), Some("PL quantum yield"));
        assert_eq!((joined[0].start(), joined[0].end()), (0, 3));
    }

    #[test]
    fn merge_concatenates() {
        let stream = TokenStream::default();
        let merged = merge(&stream, 0, leaves(&["0.45", "×", "10", "2"]));
        assert_eq!(merged[0].text(), Some("0.45×102"));
    }

    #[test]
    fn join_of_nothing_is_nothing() {
        let stream = TokenStream::default();
        assert!(join(&stream, 0, Vec::new()).is_empty());
    }

    #[test]
    fn strips_trailing_stop() {
        let stream = TokenStream::default();
        let stripped = strip_stop(&stream, 0, leaves(&["toluene."]));
        assert_eq!(stripped[0].text(), Some("toluene"));
    }

    #[test]
    fn repairs_whitespace() {
        assert_eq!(fix_whitespace_str("2 , 4 - dimethyl"), "2, 4-dimethyl");
        assert_eq!(fix_whitespace_str("bis ( carbazole )"), "bis(carbazole)");
        assert_eq!(fix_whitespace_str("τp / τd"), "τp/τd");
    }
}
