use crate::{actions, create_stream_from_string, i, r, skip_to, w, GrammarContext, MatchDisplay};

fn display_quantum_yield(input: &str) -> String {
    let stream = create_stream_from_string(input);
    let specifier = (w("PL") + i("quantum") + i("yield"))
        .with_action(actions::join)
        .named("specifier");
    let value = r(r"^\d+(\.\d+)?$").named("raw_value");
    let units = w("%").named("raw_units");
    let grammar = specifier + skip_to(value.clone()) + value + units;

    let found = grammar
        .match_at_with(&stream, 0, &GrammarContext::new())
        .expect("grammar matches");

    let display = MatchDisplay::new(&stream)
        .with_named(&found, "specifier")
        .with_named(&found, "raw_value")
        .with_named(&found, "raw_units");

    format!("{}", display)
}

#[test]
fn quantum_yield_spans() {
    insta::assert_snapshot!(display_quantum_yield("PL quantum yield of 24.1%."), @r###"
    PL  quantum  yield  of  24.1  %  .
    ╰────────────────╯specifier("PL quantum yield")
                            ╰──╯raw_value("24.1")
                                  ╰raw_units("%")
    "###);
}

#[test]
fn whole_match_span() {
    let stream = create_stream_from_string("τp/τd [ns]");
    let grammar = r("^τ") + w("/") + r("^τ");
    let found = grammar.match_at(&stream, 0).expect("grammar matches");
    let display = MatchDisplay::new(&stream).with_match(&found, "lifetimes");
    insta::assert_snapshot!(format!("{}", display), @r###"
    τp  /  τd  [  ns  ]
    ╰───────╯lifetimes
    "###);
}
