//! Records: typed field values plus confidence and merge bookkeeping.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::OnceCell;

use crate::confidence::{min_value, Pooling};
use crate::{ContextualRange, FieldKind, ModelError, ModelResult, SchemaRef, Value};

#[derive(Clone, Default)]
struct Slot {
    value: Option<Value>,
    inferred: OnceCell<Option<Value>>,
}

/// An instance of a [`Schema`](crate::Schema).
///
/// Every access goes through the schema: naming a field it does not declare
/// is an [`ModelError::UnknownField`]. Inferred fields are computed on first
/// read and cached until their origin field changes.
#[derive(Clone)]
pub struct Record {
    schema: SchemaRef,
    slots: Vec<Slot>,
    confidences: BTreeMap<String, f64>,
    self_confidence: Option<f64>,
    contextual_merge_count: u32,
    no_merge_ranges: BTreeMap<String, ContextualRange>,
    record_method: Option<String>,
}

impl Record {
    /// A record with every field at its default.
    pub fn new(schema: &SchemaRef) -> Self {
        let slots = schema
            .fields()
            .iter()
            .map(|field| Slot {
                value: field.default_value().cloned(),
                inferred: OnceCell::new(),
            })
            .collect();
        Record {
            schema: schema.clone(),
            slots,
            confidences: BTreeMap::new(),
            self_confidence: None,
            contextual_merge_count: 0,
            no_merge_ranges: BTreeMap::new(),
            record_method: None,
        }
    }

    /// A record with the given field values.
    pub fn from_values<I, K, V>(schema: &SchemaRef, values: I) -> ModelResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut record = Record::new(schema);
        for (field, value) in values {
            record.set(field.as_ref(), value)?;
        }
        Ok(record)
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn type_name(&self) -> &str {
        self.schema.name()
    }

    /// The value of `field`, computing it first if it is inferred.
    pub fn get(&self, field: &str) -> ModelResult<Option<&Value>> {
        let idx = self.schema.require_index(field)?;
        Ok(self.value_at(idx))
    }

    /// [`get`](Self::get) flattened for fields known to exist.
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.get(field).ok().flatten()
    }

    pub(crate) fn value_at(&self, idx: usize) -> Option<&Value> {
        let slot = &self.slots[idx];
        if slot.value.is_some() {
            return slot.value.as_ref();
        }
        match self.schema.fields()[idx].kind() {
            FieldKind::Inferred(inferrer) => slot
                .inferred
                .get_or_init(|| {
                    let origin = self
                        .schema
                        .field_index(inferrer.origin())
                        .and_then(|origin| self.value_at(origin));
                    inferrer.infer(origin, self)
                })
                .as_ref(),
            _ => None,
        }
    }

    /// Non-empty value of the field at `idx`.
    pub(crate) fn filled_at(&self, idx: usize) -> Option<&Value> {
        self.value_at(idx).filter(|value| !value.is_empty())
    }

    pub(crate) fn is_filled_at(&self, idx: usize) -> bool {
        self.filled_at(idx).is_some()
    }

    /// Empty, or still the field's default.
    pub(crate) fn is_default_at(&self, idx: usize) -> bool {
        match self.filled_at(idx) {
            None => true,
            Some(value) => self.schema.fields()[idx].default_value() == Some(value),
        }
    }

    pub(crate) fn nested_at(&self, idx: usize) -> Option<&Record> {
        self.filled_at(idx).and_then(Value::as_record)
    }

    pub(crate) fn nested_at_mut(&mut self, idx: usize) -> Option<&mut Record> {
        self.slots[idx].value.as_mut().and_then(Value::as_record_mut)
    }

    /// Assign `field`, converting the value to the field's kind.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> ModelResult<()> {
        let idx = self.schema.require_index(field)?;
        let value = self.schema.fields()[idx].kind().accept(field, value.into())?;
        self.store(idx, Some(value));
        Ok(())
    }

    /// Reset `field` to its default.
    pub fn reset(&mut self, field: &str) -> ModelResult<()> {
        let idx = self.schema.require_index(field)?;
        self.reset_at(idx);
        Ok(())
    }

    pub(crate) fn reset_at(&mut self, idx: usize) {
        let default = self.schema.fields()[idx].default_value().cloned();
        self.store(idx, default);
    }

    /// Store an already converted value and drop inferences made from it.
    pub(crate) fn store(&mut self, idx: usize, value: Option<Value>) {
        self.slots[idx] = Slot {
            value,
            inferred: OnceCell::new(),
        };
        let name = self.schema.fields()[idx].name().to_string();
        let schema = self.schema.clone();
        for (dependent, field) in schema.fields().iter().enumerate() {
            if let FieldKind::Inferred(inferrer) = field.kind() {
                if inferrer.origin() == name && self.slots[dependent].value.is_none() {
                    self.slots[dependent].inferred = OnceCell::new();
                }
            }
        }
    }

    fn keypath(key: &str) -> Vec<&str> {
        key.split('.').collect()
    }

    /// Value at a dotted keypath such as `compound.labels`. Lists of records
    /// are entered through their first element.
    pub fn get_keypath(&self, keypath: &str) -> ModelResult<Option<&Value>> {
        let path = Self::keypath(keypath);
        let mut record = self;
        for (depth, segment) in path.iter().enumerate() {
            let value = record.get(segment)?;
            if depth + 1 == path.len() {
                return Ok(value);
            }
            let next = match value {
                Some(Value::Model(nested)) => Some(&**nested),
                Some(Value::List(items) | Value::Set(items)) => items.first().and_then(Value::as_record),
                _ => None,
            };
            match next {
                Some(nested) => record = nested,
                None => {
                    let idx = record.schema.require_index(segment)?;
                    return match record.schema.fields()[idx].kind().reachable_schema() {
                        Some(schema) => {
                            // The rest of the path must still name real fields.
                            Record::new(schema).get_keypath(&path[depth + 1..].join("."))?;
                            Ok(None)
                        }
                        None => Err(ModelError::UnknownField {
                            schema: record.type_name().to_string(),
                            field: path[depth + 1].to_string(),
                        }),
                    };
                }
            }
        }
        Ok(None)
    }

    /// Assign at a dotted keypath, creating intermediate records.
    pub fn set_keypath(&mut self, keypath: &str, value: impl Into<Value>) -> ModelResult<()> {
        match keypath.split_once('.') {
            None => self.set(keypath, value),
            Some((head, rest)) => {
                let idx = self.schema.require_index(head)?;
                let schema = self.schema.clone();
                let kind = schema.fields()[idx].kind();
                if let Some(nested_schema) = kind.model_schema() {
                    if self.nested_at(idx).is_none() {
                        self.store(idx, Some(Value::from(Record::new(nested_schema))));
                    }
                    let nested = self.nested_at_mut(idx).ok_or_else(|| ModelError::TypeMismatch {
                        field: head.to_string(),
                        expected: format!("{} record", nested_schema.name()),
                        found: "empty".to_string(),
                    })?;
                    nested.set_keypath(rest, value)
                } else if let Some(element_schema) = kind.element_schema() {
                    let mut items = match self.slots[idx].value.take() {
                        Some(Value::List(items) | Value::Set(items)) => items,
                        _ => Vec::new(),
                    };
                    if items.is_empty() {
                        items.push(Value::from(Record::new(element_schema)));
                    }
                    let result = match items[0].as_record_mut() {
                        Some(first) => first.set_keypath(rest, value),
                        None => Err(ModelError::UnknownField {
                            schema: schema.name().to_string(),
                            field: keypath.to_string(),
                        }),
                    };
                    let value = kind.accept(head, Value::List(items))?;
                    self.store(idx, Some(value));
                    result
                } else {
                    Err(ModelError::UnknownField {
                        schema: schema.name().to_string(),
                        field: keypath.to_string(),
                    })
                }
            }
        }
    }

    /// No field holds a value.
    pub fn is_empty(&self) -> bool {
        (0..self.slots.len())
            .filter(|idx| !self.schema.fields()[*idx].kind().is_inferred())
            .all(|idx| !self.is_filled_at(idx))
    }

    /// Confidence of a field, or of the record as a whole for `"self"`.
    /// Nested records report their total confidence.
    pub fn confidence(&self, key: &str) -> ModelResult<Option<f64>> {
        if key == "self" {
            return Ok(Some(self.total_confidence()));
        }
        let (head, rest) = match key.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (key, None),
        };
        let idx = self.schema.require_index(head)?;
        let value = match self.filled_at(idx) {
            Some(value) => value,
            None => return Ok(None),
        };
        let nested = match value {
            Value::Model(nested) => Some(&**nested),
            Value::List(items) | Value::Set(items) if rest.is_some() => items.first().and_then(Value::as_record),
            _ => None,
        };
        match (rest, nested) {
            (Some(rest), Some(nested)) => nested.confidence(rest),
            (None, Some(nested)) => Ok(Some(nested.total_confidence())),
            (Some(rest), None) => Err(ModelError::UnknownField {
                schema: self.type_name().to_string(),
                field: format!("{}.{}", head, rest),
            }),
            (None, None) => Ok(self.confidences.get(head).copied()),
        }
    }

    /// Set the confidence of a field, or the self confidence for `"self"`.
    /// Empty fields have no confidence; setting one is a no-op.
    pub fn set_confidence(&mut self, key: &str, confidence: f64) -> ModelResult<()> {
        if key == "self" {
            self.self_confidence = Some(confidence);
            return Ok(());
        }
        let (head, rest) = match key.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (key, None),
        };
        let idx = self.schema.require_index(head)?;
        if !self.is_filled_at(idx) {
            return Ok(());
        }
        let nested = match self.slots[idx].value.as_mut() {
            Some(Value::Model(nested)) => Some(&mut **nested),
            Some(Value::List(items) | Value::Set(items)) if rest.is_some() => {
                items.first_mut().and_then(Value::as_record_mut)
            }
            _ => None,
        };
        match (rest, nested) {
            (Some(rest), Some(nested)) => nested.set_confidence(rest, confidence),
            (None, Some(nested)) => {
                nested.self_confidence = Some(confidence);
                Ok(())
            }
            (Some(rest), None) => Err(ModelError::UnknownField {
                schema: self.type_name().to_string(),
                field: format!("{}.{}", head, rest),
            }),
            (None, None) => {
                self.confidences.insert(head.to_string(), confidence);
                Ok(())
            }
        }
    }

    pub fn self_confidence(&self) -> Option<f64> {
        self.self_confidence
    }

    /// Confidence stored for a field itself, without pooling.
    pub(crate) fn raw_confidence_at(&self, idx: usize) -> Option<f64> {
        match self.nested_at(idx) {
            Some(nested) => nested.self_confidence,
            None => self.confidences.get(self.schema.fields()[idx].name()).copied(),
        }
    }

    pub(crate) fn set_raw_confidence_at(&mut self, idx: usize, confidence: f64) {
        match self.nested_at_mut(idx) {
            Some(nested) => nested.self_confidence = Some(confidence),
            None => {
                let name = self.schema.fields()[idx].name().to_string();
                self.confidences.insert(name, confidence);
            }
        }
    }

    pub(crate) fn set_self_confidence(&mut self, confidence: Option<f64>) {
        self.self_confidence = confidence;
    }

    /// Confidences of the filled fields; nested records contribute their
    /// total confidence.
    pub fn field_confidences(&self, pooling: Pooling) -> Vec<f64> {
        let mut confidences = Vec::new();
        for idx in 0..self.slots.len() {
            match self.filled_at(idx) {
                Some(Value::Model(nested)) => confidences.push(nested.total_confidence_with(pooling)),
                Some(_) => {
                    if let Some(confidence) = self.confidences.get(self.schema.fields()[idx].name()) {
                        confidences.push(*confidence);
                    }
                }
                None => {}
            }
        }
        confidences
    }

    /// [`total_confidence_with`](Self::total_confidence_with) using the minimum.
    pub fn total_confidence(&self) -> f64 {
        self.total_confidence_with(min_value)
    }

    /// The self confidence if set; otherwise the pooled field confidences
    /// (1.0 when there are none) scaled by the requiredness factor.
    pub fn total_confidence_with(&self, pooling: Pooling) -> f64 {
        if let Some(confidence) = self.self_confidence {
            return confidence;
        }
        let pooled = pooling(&self.field_confidences(pooling)).unwrap_or(1.0);
        pooled * self.requiredness_factor()
    }

    /// Product of `1 - requiredness` over the missing soft-required fields,
    /// including those of nested records.
    pub fn requiredness_factor(&self) -> f64 {
        let mut factor = 1.0;
        for (idx, field) in self.schema.fields().iter().enumerate() {
            if field.is_required() && !field.is_hard_required() && !self.is_filled_at(idx) {
                factor *= 1.0 - field.requiredness_weight();
            }
            if let Some(nested) = self.nested_at(idx) {
                factor *= nested.requiredness_factor();
            }
        }
        factor
    }

    /// Every contextual field, including those of nested records, is set.
    pub fn contextual_fulfilled(&self) -> bool {
        for (idx, field) in self.schema.fields().iter().enumerate() {
            if field.kind().model_schema().is_some() {
                if field.is_contextual() && self.is_default_at(idx) {
                    return false;
                }
                if let Some(nested) = self.nested_at(idx) {
                    if !nested.contextual_fulfilled() {
                        return false;
                    }
                }
            } else if field.is_contextual() && self.is_default_at(idx) {
                return false;
            }
        }
        true
    }

    /// Every hard-required field, including those of nested records, is set.
    pub fn required_fulfilled(&self) -> bool {
        self.required_fulfilled_impl(true)
    }

    /// Like [`required_fulfilled`](Self::required_fulfilled) but contextual
    /// fields are exempt.
    pub fn noncontextual_required_fulfilled(&self) -> bool {
        self.required_fulfilled_impl(false)
    }

    fn required_fulfilled_impl(&self, strict: bool) -> bool {
        for (idx, field) in self.schema.fields().iter().enumerate() {
            if !field.is_hard_required() || (!strict && field.is_contextual()) {
                continue;
            }
            if self.is_default_at(idx) {
                return false;
            }
            if let Some(nested) = self.nested_at(idx) {
                if !nested.required_fulfilled() {
                    return false;
                }
            }
        }
        true
    }

    /// A record about a compound that has neither names nor labels.
    pub fn is_unidentified(&self) -> bool {
        let names = self.schema.field_index("names");
        let labels = self.schema.field_index("labels");
        if names.is_some() || labels.is_some() {
            return !names.map_or(false, |idx| self.is_filled_at(idx))
                && !labels.map_or(false, |idx| self.is_filled_at(idx));
        }
        match self.schema.field_index("compound") {
            Some(idx) => match self.nested_at(idx) {
                Some(compound) => compound.is_unidentified(),
                None => true,
            },
            None => false,
        }
    }

    /// Same type, and every field of `other` is either empty or equal here.
    pub fn is_superset(&self, other: &Record) -> bool {
        if !self.schema.same_type(&other.schema) {
            return false;
        }
        for (idx, field) in self.schema.fields().iter().enumerate() {
            if field.kind().is_inferred() {
                continue;
            }
            if field.kind().model_schema().is_some() {
                match (self.nested_at(idx), other.nested_at(idx)) {
                    (None, Some(_)) => return false,
                    (Some(mine), Some(theirs)) if !mine.is_superset(theirs) => return false,
                    _ => {}
                }
            } else if let Some(theirs) = other.filled_at(idx) {
                if self.filled_at(idx) != Some(theirs) {
                    return false;
                }
            }
        }
        true
    }

    pub fn is_subset(&self, other: &Record) -> bool {
        other.is_superset(self)
    }

    pub fn record_method(&self) -> Option<&str> {
        self.record_method.as_deref()
    }

    /// Stamp the parser that produced this record.
    pub fn set_record_method(&mut self, method: impl Into<String>) {
        self.record_method = Some(method.into());
    }

    pub fn contextual_merge_count(&self) -> u32 {
        self.contextual_merge_count
    }

    pub(crate) fn count_contextual_merge(&mut self) {
        self.contextual_merge_count += 1;
    }

    /// The range within which `field` may be merged from other records.
    pub fn contextual_range(&self, field: &str) -> ModelResult<ContextualRange> {
        let idx = self.schema.require_index(field)?;
        Ok(self.schema.fields()[idx].range())
    }

    /// The range within which `field` must not be merged. Zero unless overridden.
    pub fn no_merge_range(&self, field: &str) -> ModelResult<ContextualRange> {
        self.schema.require_index(field)?;
        Ok(self.no_merge_ranges.get(field).copied().unwrap_or_default())
    }

    pub fn set_no_merge_range(&mut self, field: &str, range: ContextualRange) -> ModelResult<()> {
        self.schema.require_index(field)?;
        self.no_merge_ranges.insert(field.to_string(), range);
        Ok(())
    }

    /// `distance` is inside the field's contextual range and outside its
    /// no-merge range.
    pub(crate) fn in_merge_range(&self, idx: usize, distance: ContextualRange) -> bool {
        let field = &self.schema.fields()[idx];
        distance <= field.range() && self.outside_no_merge_range(idx, distance)
    }

    pub(crate) fn outside_no_merge_range(&self, idx: usize, distance: ContextualRange) -> bool {
        let no_merge = self
            .no_merge_ranges
            .get(self.schema.fields()[idx].name())
            .copied()
            .unwrap_or_default();
        distance > no_merge
    }

    /// This record and every record nested inside it.
    pub fn flatten_instance(&self) -> Vec<&Record> {
        let mut records = vec![self];
        for idx in 0..self.slots.len() {
            if self.schema.fields()[idx].kind().is_inferred() {
                continue;
            }
            match self.filled_at(idx) {
                Some(Value::Model(nested)) => records.extend(nested.flatten_instance()),
                Some(Value::List(items) | Value::Set(items)) => {
                    for nested in items.iter().filter_map(Value::as_record) {
                        records.extend(nested.flatten_instance());
                    }
                }
                _ => {}
            }
        }
        records
    }

    /// Reset nested records whose required fields were never fulfilled.
    /// With `clean_contextual` off, missing contextual fields are tolerated.
    pub fn clean(&mut self, clean_contextual: bool) {
        for idx in 0..self.slots.len() {
            if self.schema.fields()[idx].kind().model_schema().is_none() {
                continue;
            }
            let keep = match self.nested_at_mut(idx) {
                Some(nested) => {
                    nested.clean(clean_contextual);
                    if clean_contextual {
                        nested.required_fulfilled()
                    } else {
                        nested.noncontextual_required_fulfilled()
                    }
                }
                None => continue,
            };
            if !keep {
                self.reset_at(idx);
            }
        }
    }

    pub(crate) fn raw_value_at_mut(&mut self, idx: usize) -> Option<&mut Value> {
        self.slots[idx].value.as_mut()
    }
}

impl PartialEq for Record {
    /// Same type and equal non-inferred fields, empty values counting as unset.
    fn eq(&self, other: &Record) -> bool {
        self.schema.same_type(&other.schema)
            && (0..self.slots.len())
                .filter(|idx| !self.schema.fields()[*idx].kind().is_inferred())
                .all(|idx| self.filled_at(idx) == other.filled_at(idx))
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record({})", self.to_json())
    }
}
