use crate::*;

fn stream(text: &str) -> TokenStream {
    create_stream_from_string(text)
}

fn xml(grammar: &Element, text: &str) -> String {
    grammar
        .match_at(&stream(text), 0)
        .map(|found| found.to_xml())
        .unwrap_or_else(|| "<no match>".to_string())
}

#[test]
fn literal_and_caseless() {
    assert_eq!(xml(&w("Yield"), "yield"), "<no match>");
    assert_eq!(xml(&i("Yield").named("word"), "yield"), "<word>yield</word>");
}

#[test]
fn regex_is_anchored_at_token_start() {
    let grammar = r("ns").named("unit");
    assert_eq!(xml(&grammar, "ns"), "<unit>ns</unit>");
    assert_eq!(xml(&grammar, "ms"), "<no match>");
    assert!(Element::regex("(unclosed").is_err());
}

#[test]
fn regex_capture_group() {
    let grammar = Element::regex_group(r"^(\d+)K$", 1)
        .expect("valid pattern")
        .named("value");
    assert_eq!(xml(&grammar, "300K"), "<value>300</value>");
    assert!(matches!(
        Element::regex_group(r"^\d+$", 1),
        Err(GrammarError::InvalidConfiguration(_))
    ));
}

#[test]
fn tag_match_reads_tags() {
    let mut tokens = stream("4CzIPN emits");
    tokens.apply_tagger(&LexiconTagger::new(NER_TAG).entry("4CzIPN", "B-CM"));
    let grammar = t_typed(NER_TAG, "B-CM").named("names");
    let found = grammar.match_at(&tokens, 0).expect("tagged token matches");
    assert_eq!(found.to_xml(), "<names>4CzIPN</names>");
    assert!(grammar.match_at(&tokens, 1).is_none());
}

#[test]
fn unnamed_leaves_use_part_of_speech() {
    let tokens = TokenStream::new(vec![Token::new("emits").with_tag(POS_TAG, "VBZ"), Token::new("light")]);
    let found = (any() + any()).match_at(&tokens, 0).expect("matches");
    assert_eq!(found.to_xml(), "<VBZ>emits</VBZ><token>light</token>");
}

#[test]
fn named_sequence_wraps_children() {
    let grammar = (w("τ").named("symbol") + w("d").named("suffix")).named("specifier");
    assert_eq!(
        xml(&grammar, "τ d"),
        "<specifier><symbol>τ</symbol><suffix>d</suffix></specifier>"
    );
}

#[test]
fn group_keeps_inner_names() {
    let grammar = w("1").named("labels").group("compound");
    assert_eq!(xml(&grammar, "1"), "<compound><labels>1</labels></compound>");
}

#[test]
fn hidden_elements_match_without_output() {
    let grammar = w("(").hide() + w("ns").named("raw_units") + w(")").hide();
    assert_eq!(xml(&grammar, "(ns)"), "<raw_units>ns</raw_units>");
}

#[test]
fn condition_filters_candidates() {
    let short = r(r"^\d+$")
        .named("value")
        .with_condition(|nodes: &[ResultNode]| nodes.iter().all(|node| node.text_content().len() < 4));
    assert_eq!(xml(&short, "145"), "<value>145</value>");
    assert_eq!(xml(&short, "3100"), "<no match>");
}

#[test]
fn condition_failure_backtracks_repetition() {
    // the longest run is rejected, so the repetition gives back a token
    let pair = one_or_more(r(r"^\d$"))
        .named("digits")
        .with_condition(|nodes: &[ResultNode]| nodes[0].texts().len() == 2);
    let found = pair.match_at(&stream("1 2 3"), 0).expect("two digits accepted");
    assert_eq!(found.end, 2);
}

#[test]
fn actions_run_after_naming() {
    let grammar = (w("PL") + i("quantum") + i("yield"))
        .with_action(actions::join)
        .named("specifier");
    assert_eq!(
        xml(&grammar, "PL quantum yield"),
        "<specifier>PL quantum yield</specifier>"
    );
}

#[test]
fn every_uses_span_of_first_consuming_child() {
    let label = r(r"^[A-Z]?\d{1,3}[a-z]?$").named("labels");
    let blocked = ["S1", "T1"];
    let mut children = vec![label];
    children.extend(blocked.iter().map(|word| not(w(*word))));
    let grammar = every(children);

    assert_eq!(xml(&grammar, "2a"), "<labels>2a</labels>");
    assert_eq!(xml(&grammar, "S1"), "<no match>");
    assert_eq!(xml(&grammar, "T1"), "<no match>");
    assert_eq!(xml(&grammar, "S3"), "<labels>S3</labels>");
}

#[test]
fn every_of_zero_width_children_is_zero_width() {
    let grammar = every(vec![not(w("x")), followed_by(w("y"))]);
    let found = grammar.match_at(&stream("y"), 0).expect("matches");
    assert_eq!((found.start, found.end), (0, 0));
}

#[test]
fn skip_to_is_non_greedy() {
    let grammar = skip_to(w("b")) + w("b");
    let found = grammar.match_at(&stream("a a b a b"), 0).expect("matches");
    assert_eq!(found.end, 3);
    assert_eq!(found.nodes.len(), 3);
}

#[test]
fn anchors() {
    let tokens = stream("a b");
    assert!((start() + w("a")).match_at(&tokens, 0).is_some());
    assert!((start() + w("b")).match_at(&tokens, 1).is_none());
    assert!((w("b") + end()).match_at(&tokens, 1).is_some());
    assert!(no_match().match_at(&tokens, 0).is_none());
}

#[test]
fn extensible_nodes_read_the_context() {
    let labels = Element::extensible("ThemeCompound.labels", no_match()).named("labels");
    let tokens = stream("compound 2a");
    let mut context = GrammarContext::new();
    assert!(labels.match_at_with(&tokens, 1, &context).is_none());

    context.extend("ThemeCompound.labels", w("2a"));
    let found = labels.match_at_with(&tokens, 1, &context).expect("registered label");
    assert_eq!(found.nodes[0].text_content(), "2a");
    assert_eq!(labels.extension_key(), Some("ThemeCompound.labels"));

    context.reset("ThemeCompound.labels");
    assert!(labels.match_at_with(&tokens, 1, &context).is_none());
}

#[test]
fn elements_are_reusable() {
    let unit = w("ns").named("raw_units");
    let first_grammar = w("τd") + unit.clone();
    let second_grammar = unit.clone() + w("τd");
    assert!(first_grammar.match_at(&stream("τd ns"), 0).is_some());
    assert!(second_grammar.match_at(&stream("ns τd"), 0).is_some());
    assert_eq!(xml(&unit, "ns"), "<raw_units>ns</raw_units>");
}

#[test]
fn debug_renders_the_expression() {
    let grammar = (optional(w("internal")) + (i("photoluminescence") | w("PL"))).named("specifier");
    assert_eq!(
        format!("{:?}", grammar),
        r#"And(Optional(W("internal")), Or(I("photoluminescence"), W("PL")))("specifier")"#
    );
}
