use layered_extract::actions::join;
use layered_extract::{i, no_match, r, Element, GrammarContext, Match};
use layered_extract_auto::cem::default_chem_name;
use layered_extract_auto::{interpret_record, AutoSentenceParser, AutoTableParser, Pick, RecordParser};
use layered_extract_model::{Dimension, Field, FieldKind, Record, Schema, SchemaRef, Value};

use crate::*;

struct CompoundParser {
    schema: SchemaRef,
    root: Element,
}

impl CompoundParser {
    fn new(schema: &SchemaRef) -> Self {
        CompoundParser {
            schema: schema.clone(),
            root: default_chem_name(false),
        }
    }
}

impl RecordParser for CompoundParser {
    fn name(&self) -> &str {
        "CompoundParser"
    }

    fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    fn root(&self) -> &Element {
        &self.root
    }

    fn interpret(&self, found: &Match) -> Vec<Record> {
        found
            .nodes
            .iter()
            .filter_map(|node| interpret_record(&self.schema, node, Pick::First))
            .collect()
    }
}

fn compound() -> SchemaRef {
    Schema::builder("Compound")
        .field(Field::set("names", FieldKind::String))
        .field(Field::set("labels", FieldKind::String).parse(no_match()).updatable())
        .build()
        .unwrap()
}

fn delayed_lifetime(compound: &SchemaRef) -> SchemaRef {
    let time = Dimension::base("time", &[("Second", "s(ec(ond)?s?)?")]).unwrap();
    let specifier = r("^τd$") | (i("delayed") + i("lifetime")).with_action(join);
    Schema::builder("DelayedLifetime")
        .quantity(time)
        .field(Field::string("specifier").required().parse(specifier))
        .field(Field::model("compound", compound).required().contextual())
        .build()
        .unwrap()
}

fn pipeline(config: ExtractionConfig) -> Pipeline {
    let compound = compound();
    let lifetime = delayed_lifetime(&compound);
    Pipeline::new(config)
        .compound(ModelParsers::new(&compound).sentence_parser(CompoundParser::new(&compound)))
        .model(
            ModelParsers::new(&lifetime)
                .sentence_parser(AutoSentenceParser::new(&lifetime).unwrap())
                .table_parser(AutoTableParser::new(&lifetime).unwrap()),
        )
}

fn labels(record: &Record) -> Vec<String> {
    record
        .get_keypath("compound.labels")
        .ok()
        .flatten()
        .and_then(Value::as_items)
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

#[test]
fn discovered_labels_are_found_in_later_sentences() {
    let document = Document::from_text(
        "# Results\nCompound 2a was studied.\nThe delayed lifetime of 2a is 3100 ns.",
    );
    let records = pipeline(ExtractionConfig::default()).run(&document);
    assert_eq!(records.len(), 1);
    insta::assert_snapshot!(records[0].to_json(), @r###"{"DelayedLifetime":{"compound":{"Compound":{"labels":["2a"]}},"raw_units":"ns","raw_value":"3100","specifier":"delayed lifetime","units":"(10^-9.0) * Second^(1.0)","value":[3100.0]}}"###);
}

#[test]
fn contextual_compounds_come_from_the_closest_sentence() {
    let document = Document::from_text(
        "Compound 1 was made first.\n\nCompound 2 was made next.\nIts delayed lifetime is 3100 ns.",
    );
    let records = pipeline(ExtractionConfig::default()).run(&document);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].type_name(), "Compound");
    assert_eq!(records[1].type_name(), "DelayedLifetime");
    assert_eq!(labels(&records[1]), vec!["2"]);
}

#[test]
fn records_without_a_compound_are_dropped() {
    let compound = compound();
    let lifetime = delayed_lifetime(&compound);
    let pipeline = Pipeline::new(ExtractionConfig::default())
        .model(ModelParsers::new(&lifetime).sentence_parser(AutoSentenceParser::new(&lifetime).unwrap()));
    let document = Document::from_text("The delayed lifetime is 3100 ns.");

    let context = GrammarContext::new();
    let extracted = pipeline.extract(&document, &context);
    assert_eq!(extracted.len(), 1);
    assert!(pipeline.run(&document).is_empty());
}

#[test]
fn table_cells_carry_their_row_compound() {
    let table = Table::from_text(None, &["Compound", "τd [ns]"], &[&["2a", "3100"]]);
    let document = Document::new().heading("Photophysical data").table(table);
    let records = pipeline(ExtractionConfig::default()).run(&document);
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.value("specifier"), Some(&Value::from("τd")));
    assert_eq!(record.value("raw_units"), Some(&Value::from("[ns]")));
    assert_eq!(record.value("raw_value"), Some(&Value::from("3100")));
    assert_eq!(labels(record), vec!["2a"]);
}

#[test]
fn strict_labels_need_a_name() {
    let document = Document::from_text("Compound 2a was studied.");
    let key = "Compound.labels";

    let mut context = GrammarContext::new();
    let found = pipeline(ExtractionConfig::default()).discover(&document, &mut context);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].position, Position::new(0, 0, 0));
    assert_eq!(context.alternatives(key).len(), 1);

    let strict = ExtractionConfig {
        strict_labels: true,
        ..ExtractionConfig::default()
    };
    let mut context = GrammarContext::new();
    pipeline(strict).discover(&document, &mut context);
    assert!(context.alternatives(key).is_empty());
}
