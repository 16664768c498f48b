use layered_extract::actions::join;
use layered_extract::{create_stream_from_string, i, no_match, optional, w, GrammarContext};
use layered_extract_model::{Dimension, Field, FieldKind, Record, Schema, SchemaRef, Value};

use crate::*;

fn compound() -> SchemaRef {
    Schema::builder("Compound")
        .field(Field::set("names", FieldKind::String))
        .field(Field::set("labels", FieldKind::String).parse(no_match()).updatable())
        .build()
        .unwrap()
}

fn quantum_yield(compound: &SchemaRef) -> SchemaRef {
    let ratio = Dimension::dimensionless("ratio", &[("Percent", "%")]).unwrap();
    let specifier =
        (optional(w("internal")) + (i("photoluminescence") | w("PL")) + i("quantum") + i("yield")).with_action(join)
            | w("PLQY");
    Schema::builder("QuantumYield")
        .quantity(ratio)
        .field(Field::string("specifier").required().parse(specifier))
        .field(Field::model("compound", compound).required().contextual())
        .build()
        .unwrap()
}

fn parse(parser: &AutoSentenceParser, text: &str, context: &GrammarContext) -> Vec<Record> {
    parser.parse(&create_stream_from_string(text), context)
}

fn field(record: &Record, name: &str) -> Option<String> {
    record.value(name).and_then(|value| value.as_str()).map(str::to_string)
}

#[test]
fn value_with_units_after_the_specifier() {
    let schema = quantum_yield(&compound());
    let parser = AutoSentenceParser::new(&schema).unwrap();
    let records = parse(&parser, "PL quantum yield of 24.1%.", &GrammarContext::new());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record_method(), Some("AutoSentenceParser"));
    insta::assert_snapshot!(records[0].to_json(), @r###"{"QuantumYield":{"raw_units":"%","raw_value":"24.1","specifier":"PL quantum yield","units":"Percent^(1.0)","value":[24.1]}}"###);
    assert!(!records[0].required_fulfilled());
    assert!(records[0].noncontextual_required_fulfilled());
}

#[test]
fn sentences_without_the_trigger_are_skipped() {
    let schema = quantum_yield(&compound());
    let parser = AutoSentenceParser::new(&schema).unwrap();
    assert!(parser.trigger().is_some());
    assert!(parse(&parser, "a yield of 64 % was measured", &GrammarContext::new()).is_empty());
}

#[test]
fn registered_labels_fill_the_compound() {
    let compound = compound();
    let schema = quantum_yield(&compound);
    let parser = AutoSentenceParser::new(&schema).unwrap();
    let text = "The PLQY of 1a was 64 %.";

    let records = parse(&parser, text, &GrammarContext::new());
    assert_eq!(records.len(), 1);
    assert!(records[0].value("compound").is_none());

    let mut context = GrammarContext::new();
    assert!(register_labels(&mut context, &compound, ["1a"]));
    let records = parse(&parser, text, &context);
    assert_eq!(records.len(), 1);
    assert_eq!(field(&records[0], "raw_value").as_deref(), Some("64"));
    assert_eq!(field(&records[0], "specifier").as_deref(), Some("PLQY"));
    let found = records[0].value("compound").and_then(|value| value.as_record()).unwrap();
    insta::assert_snapshot!(found.to_json(), @r###"{"Compound":{"labels":["1a"]}}"###);
    assert!(records[0].required_fulfilled());
}

#[test]
fn lenient_parsers_accept_values_without_units() {
    let schema = quantum_yield(&compound());
    let text = "the PLQY reached 0.64 in film";

    let strict = AutoSentenceParser::new(&schema).unwrap();
    assert!(parse(&strict, text, &GrammarContext::new()).is_empty());

    let lenient = AutoSentenceParser::builder(&schema).lenient(true).build().unwrap();
    let records = parse(&lenient, text, &GrammarContext::new());
    assert_eq!(records.len(), 1);
    assert_eq!(field(&records[0], "raw_value").as_deref(), Some("0.64"));
    assert_eq!(field(&records[0], "raw_units"), None);
}

#[test]
fn to_ranges_only_when_activated() {
    let schema = quantum_yield(&compound());
    let text = "PLQY values from 10 to 20 %";

    let parser = AutoSentenceParser::new(&schema).unwrap();
    let records = parse(&parser, text, &GrammarContext::new());
    assert_eq!(field(&records[0], "raw_value").as_deref(), Some("20"));

    let parser = AutoSentenceParser::builder(&schema).activate_to_range(true).build().unwrap();
    let records = parse(&parser, text, &GrammarContext::new());
    assert_eq!(field(&records[0], "raw_value").as_deref(), Some("10 to 20"));
    assert_eq!(records[0].value("value"), Some(&Value::list([10.0, 20.0])));
}

#[test]
fn schemas_without_a_compound_never_match_compounds() {
    let ratio = Dimension::dimensionless("ratio", &[("Percent", "%")]).unwrap();
    let schema = Schema::builder("Ratio")
        .quantity(ratio)
        .field(Field::string("specifier").required().parse(w("ratio")))
        .build()
        .unwrap();
    let parser = AutoSentenceParser::new(&schema).unwrap();
    let records = parse(&parser, "compound 2 has a ratio of 5 %", &GrammarContext::new());
    assert_eq!(records.len(), 1);
    insta::assert_snapshot!(records[0].to_json(), @r###"{"Ratio":{"raw_units":"%","raw_value":"5","specifier":"ratio","units":"Percent^(1.0)","value":[5.0]}}"###);
}

#[test]
fn long_sentences_are_parsed_in_bounded_depth() {
    let schema = quantum_yield(&compound());
    let parser = AutoSentenceParser::new(&schema).unwrap();
    let text = vec!["PLQY 5 % and"; 100].join(" ");
    let records = parse(&parser, &text, &GrammarContext::new());
    assert!(!records.is_empty());
    assert_eq!(field(&records[0], "raw_value").as_deref(), Some("5"));
    assert_eq!(field(&records[0], "specifier").as_deref(), Some("PLQY"));
}
