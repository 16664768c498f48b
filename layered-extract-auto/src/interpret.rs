//! Turning a matched phrase into a record.
//!
//! Every field of the schema looks up the nodes named after it. The record
//! itself only reads the direct children of the phrase, so a nested
//! temperature never lends its specifier or value to the quantity around
//! it. Nested models look among their direct children first, any
//! descendant otherwise. Scalars take the first text found, lists and sets
//! take all of them, nested models are built recursively from the node
//! found for them.

use layered_extract::ResultNode;
use layered_extract_model::{Field, FieldKind, ModelError, ModelResult, Record, SchemaRef, Value};
use tracing::debug;

/// Fields filled from the value phrase rather than from their own entity.
pub const QUANTITY_FIELDS: [&str; 5] = ["raw_value", "raw_units", "value", "units", "error"];

/// Which value to keep when a phrase holds several, as in `145/3100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    First,
    Last,
}

impl Pick {
    fn pick(self, texts: Vec<String>) -> Option<String> {
        match self {
            Pick::First => texts.into_iter().next(),
            Pick::Last => texts.into_iter().last(),
        }
    }
}

/// Build a record of `schema` from `phrase`.
///
/// Fields whose nodes are missing, or whose text the field cannot hold, are
/// left empty. `None` when nothing was found or a required, non-contextual
/// field stayed empty.
pub fn interpret_record(schema: &SchemaRef, phrase: &ResultNode, pick: Pick) -> Option<Record> {
    let mut record = Record::new(schema);
    let mut found = false;

    if schema.is_quantity() {
        for name in ["raw_value", "raw_units"] {
            if schema.field(name).is_none() {
                continue;
            }
            if let Some(text) = pick.pick(texts(phrase, name, true)) {
                match record.set(name, text) {
                    Ok(()) => found = true,
                    Err(err) => debug!(schema = schema.name(), %err, "value skipped"),
                }
            }
        }
    }

    for field in schema.fields() {
        if QUANTITY_FIELDS.contains(&field.name()) {
            continue;
        }
        let value = match field_data(field, phrase, true) {
            Ok(Some(value)) => value,
            Ok(None) => continue,
            Err(err) => {
                debug!(schema = schema.name(), %err, "field skipped");
                continue;
            }
        };
        match record.set(field.name(), value) {
            Ok(()) => found = true,
            Err(err) => debug!(schema = schema.name(), %err, "field skipped"),
        }
    }

    if !found {
        return None;
    }
    if !record.noncontextual_required_fulfilled() {
        debug!(schema = schema.name(), "candidate lacks required fields");
        return None;
    }
    Some(record)
}

fn missing(field: &Field) -> ModelResult<Option<Value>> {
    if field.is_hard_required() && !field.is_contextual() {
        Err(ModelError::MissingRequiredField {
            field: field.name().to_string(),
        })
    } else {
        Ok(None)
    }
}

fn lookup<'a>(node: &'a ResultNode, name: &str, strict: bool) -> Vec<&'a ResultNode> {
    if strict {
        node.children().iter().filter(|child| child.tag() == name).collect()
    } else {
        node.select(name)
    }
}

fn texts(node: &ResultNode, name: &str, strict: bool) -> Vec<String> {
    lookup(node, name, strict).into_iter().map(ResultNode::text_content).collect()
}

/// `strict` restricts the lookup to the direct children of `node`.
fn field_data(field: &Field, node: &ResultNode, strict: bool) -> ModelResult<Option<Value>> {
    let name = field.name();
    let value = match field.kind() {
        FieldKind::Inferred(_) => return Ok(None),
        FieldKind::String | FieldKind::Float => Pick::First.pick(texts(node, name, strict)).map(Value::from),
        FieldKind::Model(schema) => match lookup(node, name, strict).into_iter().next() {
            Some(found) => nested_record(schema, found)?.map(Value::from),
            None => None,
        },
        FieldKind::ListOf(inner) | FieldKind::SetOf(inner) => {
            let items = match inner.model_schema() {
                Some(schema) => {
                    let mut items = Vec::new();
                    for found in lookup(node, name, strict) {
                        if let Some(record) = nested_record(schema, found)? {
                            items.push(Value::from(record));
                        }
                    }
                    items
                }
                None => texts(node, name, strict).into_iter().map(Value::from).collect(),
            };
            if items.is_empty() {
                None
            } else {
                Some(Value::List(items))
            }
        }
    };
    match value {
        Some(value) => Ok(Some(value)),
        None => missing(field),
    }
}

fn nested_record(schema: &SchemaRef, node: &ResultNode) -> ModelResult<Option<Record>> {
    let mut record = Record::new(schema);
    let mut found = false;
    for field in schema.fields() {
        if let Some(value) = field_data(field, node, false)? {
            record.set(field.name(), value)?;
            found = true;
        }
    }
    Ok(if found { Some(record) } else { None })
}
