use std::cmp::Ordering;
use std::fmt;

use crate::Record;

/// A field value.
///
/// Sets are stored sorted and without duplicates; construct them through
/// [`Value::set`] or let field assignment normalize them.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Float(f64),
    List(Vec<Value>),
    Set(Vec<Value>),
    Model(Box<Record>),
}

impl Value {
    /// A normalized set.
    pub fn set<I, V>(items: I) -> Value
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Set(normalize_set(items.into_iter().map(Into::into).collect()))
    }

    pub fn list<I, V>(items: I) -> Value
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Empty strings, empty collections and records with no values.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::String(text) => text.is_empty(),
            Value::Float(_) => false,
            Value::List(items) | Value::Set(items) => items.is_empty(),
            Value::Model(record) => record.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Items of a list or a set.
    pub fn as_items(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Set(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Model(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Value::Model(record) => Some(record),
            _ => None,
        }
    }

    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Value::String(text) => format!("string {:?}", text),
            Value::Float(value) => format!("float {}", value),
            Value::List(_) => "list".to_string(),
            Value::Set(_) => "set".to_string(),
            Value::Model(record) => format!("{} record", record.type_name()),
        }
    }

    /// Total order used to normalize sets.
    pub(crate) fn total_cmp(&self, other: &Value) -> Ordering {
        fn rank(value: &Value) -> u8 {
            match value {
                Value::String(_) => 0,
                Value::Float(_) => 1,
                Value::List(_) => 2,
                Value::Set(_) => 3,
                Value::Model(_) => 4,
            }
        }

        match (self, other) {
            (Value::String(lhs), Value::String(rhs)) => lhs.cmp(rhs),
            (Value::Float(lhs), Value::Float(rhs)) => lhs.total_cmp(rhs),
            (Value::List(lhs), Value::List(rhs)) | (Value::Set(lhs), Value::Set(rhs)) => lhs
                .iter()
                .zip(rhs.iter())
                .map(|(lhs, rhs)| lhs.total_cmp(rhs))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or_else(|| lhs.len().cmp(&rhs.len())),
            (Value::Model(lhs), Value::Model(rhs)) => lhs.to_json().cmp(&rhs.to_json()),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

pub(crate) fn normalize_set(mut items: Vec<Value>) -> Vec<Value> {
    items.sort_by(Value::total_cmp);
    items.dedup();
    items
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::String(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::String(text)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Model(Box::new(record))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(text) => f.write_str(text),
            Value::Float(value) => write!(f, "{}", value),
            Value::List(items) | Value::Set(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Model(record) => f.write_str(&record.to_json()),
        }
    }
}
