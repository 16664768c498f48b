use crate::*;

fn spans(grammar: &Element, text: &str) -> Vec<(usize, usize)> {
    let tokens = create_stream_from_string(text);
    let context = GrammarContext::new();
    grammar
        .scan(&tokens, &context)
        .map(|found| (found.start, found.end))
        .collect()
}

#[test]
fn scan_is_leftmost_and_non_overlapping() {
    let grammar = w("a") + optional(w("a"));
    assert_eq!(spans(&grammar, "a a a b a"), vec![(0, 2), (2, 3), (4, 5)]);
}

#[test]
fn overlapping_scan_restarts_after_each_start() {
    let tokens = create_stream_from_string("a a a");
    let context = GrammarContext::new();
    let grammar = w("a") + w("a");
    let found: Vec<_> = grammar
        .scan_overlapping(&tokens, &context)
        .map(|found| (found.start, found.end))
        .collect();
    assert_eq!(found, vec![(0, 2), (1, 3)]);
}

#[test]
fn zero_width_matches_are_skipped() {
    assert!(spans(&optional(w("x")), "a b c").is_empty());
}

#[test]
fn scan_is_idempotent() {
    let tokens = create_stream_from_string("τp of 145 ns and τd of 3100 ns");
    let context = GrammarContext::new();
    let grammar = (r("^τ") + skip_to(r(r"^\d+$")) + r(r"^\d+$").named("raw_value") + w("ns").named("raw_units"))
        .named("lifetime");

    let first: Vec<Match> = grammar.scan(&tokens, &context).collect();
    let second: Vec<Match> = grammar.scan(&tokens, &context).collect();
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);

    let mut previous_end = 0;
    for found in &first {
        assert!(found.start >= previous_end);
        assert!(found.end > found.start);
        previous_end = found.end;
    }
}

#[test]
fn earlier_alternative_wins_on_identical_spans() {
    let tokens = create_stream_from_string("PLQY");
    let context = GrammarContext::new();
    let grammar = r("^PLQY$").named("abbreviation") | r("^PL").named("prefix");
    let found: Vec<_> = grammar.scan(&tokens, &context).collect();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].to_xml(), "<abbreviation>PLQY</abbreviation>");
}

#[test]
fn occurs_in_tests_for_any_match() {
    let tokens = create_stream_from_string("the delayed lifetime");
    let context = GrammarContext::new();
    assert!(i("delayed").occurs_in(&tokens, &context));
    assert!(!i("prompt").occurs_in(&tokens, &context));
}
