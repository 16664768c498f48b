use layered_extract::{create_stream_from_string, i, r, GrammarContext};
use layered_extract_model::{Dimension, Field, FieldKind, Record, Schema, SchemaRef, Value};

use crate::*;

fn compound() -> SchemaRef {
    Schema::builder("Compound")
        .field(Field::set("names", FieldKind::String))
        .field(Field::set("labels", FieldKind::String))
        .build()
        .unwrap()
}

fn delayed_lifetime(compound: &SchemaRef) -> SchemaRef {
    let time = Dimension::base("time", &[("Second", "s(ec(ond)?s?)?")]).unwrap();
    Schema::builder("DelayedLifetime")
        .quantity(time)
        .field(Field::string("specifier").required().parse(r("^τd$") | (i("delayed") + i("lifetime"))))
        .field(Field::model("compound", compound).required().contextual())
        .build()
        .unwrap()
}

fn parse(text: &str) -> Vec<Record> {
    let parser = AutoTableParser::new(&delayed_lifetime(&compound())).unwrap();
    parser.parse(&create_stream_from_string(text), &GrammarContext::new())
}

fn field(record: &Record, name: &str) -> Option<String> {
    record.value(name).and_then(|value| value.as_str()).map(str::to_string)
}

#[test]
fn units_in_the_header() {
    let records = parse("τd [ns] 3100");
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.record_method(), Some("AutoTableParser"));
    assert_eq!(field(record, "specifier").as_deref(), Some("τd"));
    assert_eq!(field(record, "raw_units").as_deref(), Some("[ns]"));
    assert_eq!(field(record, "raw_value").as_deref(), Some("3100"));
    assert_eq!(record.value("units"), Some(&Value::from("(10^-9.0) * Second^(1.0)")));
}

#[test]
fn row_header_labels_become_the_compound() {
    let records = parse("2a τd [ns] 3100");
    assert_eq!(records.len(), 1);
    assert!(records[0].required_fulfilled());
    let found = records[0].value("compound").and_then(Value::as_record).unwrap();
    insta::assert_snapshot!(found.to_json(), @r###"{"Compound":{"labels":["2a"]}}"###);
}

#[test]
fn placeholder_cells_keep_their_record() {
    let records = parse("τd [ns] NoValue");
    assert_eq!(records.len(), 1);
    assert_eq!(field(&records[0], "raw_value").as_deref(), Some("NoValue"));
    assert_eq!(records[0].value("value"), None);
}

#[test]
fn cells_without_a_specifier_are_dropped() {
    let parser = AutoTableParser::new(&delayed_lifetime(&compound())).unwrap();
    assert!(parser.trigger().is_none());
    assert!(parser
        .parse(&create_stream_from_string("3100 ns"), &GrammarContext::new())
        .is_empty());
    let records = parser.parse(&create_stream_from_string("3100 ns τd"), &GrammarContext::new());
    assert_eq!(records.len(), 1);
    assert_eq!(field(&records[0], "raw_units").as_deref(), Some("ns"));
}

fn parse_factorised(text: &str) -> Vec<Record> {
    let parser = FactorisedPowerTableParser::new(&delayed_lifetime(&compound())).unwrap();
    parser.parse(&create_stream_from_string(text), &GrammarContext::new())
}

#[test]
fn header_factors_scale_the_value() {
    let records = parse_factorised("2a τd [103 ns] 31");
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.record_method(), Some("FactorisedPowerTableParser"));
    assert_eq!(field(record, "raw_units").as_deref(), Some("ns"));
    insta::assert_snapshot!(record.to_json(), @r###"{"DelayedLifetime":{"compound":{"Compound":{"labels":["2a"]}},"raw_units":"ns","raw_value":"31×103","specifier":"τd","units":"(10^-9.0) * Second^(1.0)","value":[31000.0]}}"###);
}

#[test]
fn headers_without_a_factor_read_as_usual() {
    let records = parse_factorised("τd [μs] 3.1");
    assert_eq!(records.len(), 1);
    assert_eq!(field(&records[0], "raw_value").as_deref(), Some("3.1"));
    assert_eq!(field(&records[0], "raw_units").as_deref(), Some("μs"));

    let placeholder = parse_factorised("τd [103 ns] NoValue");
    assert_eq!(field(&placeholder[0], "raw_value").as_deref(), Some("NoValue"));
    assert_eq!(placeholder[0].value("value"), None);
}
