//! Whole-document extraction.
//!
//! A [`Pipeline`] processes a [`Document`] in four passes:
//!
//! 1. discovery: compound parsers run on every sentence and table cell, and
//!    the labels and names they find are registered in a fresh
//!    [`GrammarContext`];
//! 2. extraction: every model's parsers run against the now read-only
//!    context, sentence parsers on sentences and table parsers on cells;
//! 3. merge: a fold in document order fills each record's contextual
//!    fields from the closest candidates;
//! 4. cleanup: incomplete nested records are reset, records missing
//!    required fields dropped and subsets removed.

use layered_extract::{GrammarContext, TokenStream};
use layered_extract_auto::{register_labels, register_names, RecordParser};
use layered_extract_model::{sort_merge_candidates, ContextualRange, Record, RecordList, SchemaRef, Value};
use tracing::{debug, info};

use crate::config::ExtractionConfig;
use crate::document::Document;
use crate::position::Position;

/// A record and where it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    pub position: Position,
    pub record: Record,
}

/// The parsers of one model. Every sentence parser runs on every sentence,
/// table parsers are ordered from most to least specific.
pub struct ModelParsers {
    schema: SchemaRef,
    sentence: Vec<Box<dyn RecordParser>>,
    table: Vec<Box<dyn RecordParser>>,
}

impl ModelParsers {
    pub fn new(schema: &SchemaRef) -> Self {
        ModelParsers {
            schema: schema.clone(),
            sentence: Vec::new(),
            table: Vec::new(),
        }
    }

    pub fn sentence_parser(mut self, parser: impl RecordParser + 'static) -> Self {
        self.sentence.push(Box::new(parser));
        self
    }

    pub fn table_parser(mut self, parser: impl RecordParser + 'static) -> Self {
        self.table.push(Box::new(parser));
        self
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    fn run(&self, document: &Document, context: &GrammarContext) -> Vec<Located> {
        let mut found = Vec::new();
        for (position, stream) in document.sentences() {
            found.extend(locate(&self.sentence, position, stream, context));
        }
        for (position, stream) in document.table_cells() {
            found.extend(locate_first(&self.table, position, &stream, context));
        }
        found
    }
}

/// Table parsers are tried in order; the first one finding records in a
/// cell wins it.
fn locate_first(
    parsers: &[Box<dyn RecordParser>],
    position: Position,
    stream: &TokenStream,
    context: &GrammarContext,
) -> Vec<Located> {
    parsers
        .iter()
        .map(|parser| parser.parse(stream, context))
        .find(|records| !records.is_empty())
        .unwrap_or_default()
        .into_iter()
        .map(|record| Located { position, record })
        .collect()
}

fn locate(parsers: &[Box<dyn RecordParser>], position: Position, stream: &TokenStream, context: &GrammarContext) -> Vec<Located> {
    parsers
        .iter()
        .flat_map(|parser| parser.parse(stream, context))
        .map(|record| Located { position, record })
        .collect()
}

impl std::fmt::Debug for ModelParsers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelParsers")
            .field("schema", &self.schema.name())
            .field("sentence", &self.sentence.iter().map(|parser| parser.name()).collect::<Vec<_>>())
            .field("table", &self.table.iter().map(|parser| parser.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// Runs a set of models over documents.
#[derive(Debug)]
pub struct Pipeline {
    compound: Option<ModelParsers>,
    models: Vec<ModelParsers>,
    config: ExtractionConfig,
}

impl Pipeline {
    pub fn new(config: ExtractionConfig) -> Self {
        Pipeline {
            compound: None,
            models: Vec::new(),
            config,
        }
    }

    /// Parsers whose records feed the discovery pass.
    pub fn compound(mut self, parsers: ModelParsers) -> Self {
        self.compound = Some(parsers);
        self
    }

    pub fn model(mut self, parsers: ModelParsers) -> Self {
        self.models.push(parsers);
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract, merge and clean the records of `document`.
    pub fn run(&self, document: &Document) -> RecordList {
        let mut context = GrammarContext::with_limits(self.config.limits);
        let mut located = self.discover(document, &mut context);
        located.extend(self.extract(document, &context));
        let merged = self.merge(located);
        let records = self.finish(merged);
        info!(count = records.len(), "document processed");
        records
    }

    /// Find compounds and register their labels and names in `context`.
    pub fn discover(&self, document: &Document, context: &mut GrammarContext) -> Vec<Located> {
        let parsers = match &self.compound {
            Some(parsers) => parsers,
            None => return Vec::new(),
        };
        let found = parsers.run(document, context);

        let mut labels: Vec<String> = Vec::new();
        let mut names: Vec<String> = Vec::new();
        for Located { record, .. } in &found {
            let record_names = strings(record, "names");
            if !self.config.strict_labels || !record_names.is_empty() {
                labels.extend(strings(record, "labels"));
            }
            names.extend(record_names);
        }
        labels.sort();
        labels.dedup();
        names.sort();
        names.dedup();
        debug!(labels = labels.len(), names = names.len(), "discovered compounds");

        let compound = parsers.schema();
        if !labels.is_empty() {
            register_labels(context, compound, labels.iter().map(String::as_str));
        }
        if !names.is_empty() {
            register_names(context, compound, names.iter().map(String::as_str));
        }
        found
    }

    pub fn extract(&self, document: &Document, context: &GrammarContext) -> Vec<Located> {
        self.models
            .iter()
            .flat_map(|parsers| {
                let found = parsers.run(document, context);
                debug!(model = parsers.schema().name(), count = found.len(), "extracted");
                found
            })
            .collect()
    }

    /// Fill contextual fields of every record, in document order, from the
    /// other records ranked closest first.
    pub fn merge(&self, mut located: Vec<Located>) -> Vec<Located> {
        located.sort_by_key(|found| found.position);
        let merge = &self.config.merge;

        for idx in 0..located.len() {
            if located[idx].record.contextual_fulfilled() {
                continue;
            }
            let position = located[idx].position;
            let mut candidates: Vec<(ContextualRange, Record)> = located
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != idx)
                .map(|(_, found)| (position.distance(&found.position), found.record.clone()))
                .collect();
            sort_merge_candidates(&mut candidates, merge.adjust_by_confidence, merge.confidence_epsilon);

            let record = &mut located[idx].record;
            for (distance, candidate) in &candidates {
                record.merge_contextual(candidate, *distance);
                if record.contextual_fulfilled() {
                    break;
                }
            }
        }

        if merge.merge_all_pass {
            for idx in 0..located.len() {
                let position = located[idx].position;
                let same_place: Vec<Record> = located
                    .iter()
                    .enumerate()
                    .filter(|(other, found)| {
                        *other != idx
                            && found.position == position
                            && found.record.schema().same_type(located[idx].record.schema())
                    })
                    .map(|(_, found)| found.record.clone())
                    .collect();
                for other in &same_place {
                    located[idx].record.merge_all(other, ContextualRange::sentence());
                }
            }
        }
        located
    }

    /// Clean, filter and deduplicate merged records.
    pub fn finish(&self, located: Vec<Located>) -> RecordList {
        let mut records: RecordList = located
            .into_iter()
            .map(|Located { mut record, .. }| {
                record.clean(self.config.clean_contextual);
                record
            })
            .collect();
        records.retain(Record::required_fulfilled);
        records.remove_subsets(self.config.remove_subsets_strict);
        if self.config.remove_used_subrecords {
            records.remove_used_subrecords();
        }
        records
    }
}

fn strings(record: &Record, field: &str) -> Vec<String> {
    record
        .value(field)
        .and_then(Value::as_items)
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}
