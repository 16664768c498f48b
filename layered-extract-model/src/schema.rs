//! Field descriptors and record schemas.

use std::fmt;
use std::sync::Arc;

use layered_extract::Element;
use tracing::warn;

use crate::units::Dimension;
use crate::{ContextualRange, ModelError, ModelResult, Record, Value};

/// Shared handle to a built [`Schema`].
pub type SchemaRef = Arc<Schema>;

/// Computes an inferred field from its origin field's value and the record.
pub type InferFn = Arc<dyn Fn(Option<&Value>, &Record) -> Option<Value> + Send + Sync>;

/// The type of values a field holds.
#[derive(Debug, Clone)]
pub enum FieldKind {
    String,
    Float,
    Model(SchemaRef),
    ListOf(Box<FieldKind>),
    SetOf(Box<FieldKind>),
    Inferred(Inferrer),
}

/// Derivation of an inferred field.
#[derive(Clone)]
pub struct Inferrer {
    kind: Box<FieldKind>,
    origin: String,
    infer: InferFn,
}

impl Inferrer {
    /// Kind of the inferred values.
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Name of the field the value is inferred from.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub(crate) fn infer(&self, origin: Option<&Value>, record: &Record) -> Option<Value> {
        (self.infer)(origin, record)
    }
}

impl fmt::Debug for Inferrer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inferrer")
            .field("kind", &self.kind)
            .field("origin", &self.origin)
            .finish()
    }
}

impl FieldKind {
    pub fn list(inner: FieldKind) -> Self {
        FieldKind::ListOf(Box::new(inner))
    }

    pub fn set(inner: FieldKind) -> Self {
        FieldKind::SetOf(Box::new(inner))
    }

    /// The schema of a directly nested record.
    pub fn model_schema(&self) -> Option<&SchemaRef> {
        match self {
            FieldKind::Model(schema) => Some(schema),
            _ => None,
        }
    }

    /// The schema of records held in a list or set.
    pub fn element_schema(&self) -> Option<&SchemaRef> {
        match self {
            FieldKind::ListOf(inner) | FieldKind::SetOf(inner) => inner.model_schema(),
            _ => None,
        }
    }

    /// The schema of records reachable through any collection or inference.
    pub fn reachable_schema(&self) -> Option<&SchemaRef> {
        match self {
            FieldKind::Model(schema) => Some(schema),
            FieldKind::ListOf(inner) | FieldKind::SetOf(inner) => inner.reachable_schema(),
            FieldKind::Inferred(inferrer) => inferrer.kind.reachable_schema(),
            FieldKind::String | FieldKind::Float => None,
        }
    }

    pub fn is_inferred(&self) -> bool {
        matches!(self, FieldKind::Inferred(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, FieldKind::ListOf(_) | FieldKind::SetOf(_))
    }

    fn expected(&self) -> String {
        match self {
            FieldKind::String => "string".to_string(),
            FieldKind::Float => "float".to_string(),
            FieldKind::Model(schema) => format!("{} record", schema.name()),
            FieldKind::ListOf(inner) => format!("list of {}", inner.expected()),
            FieldKind::SetOf(inner) => format!("set of {}", inner.expected()),
            FieldKind::Inferred(inferrer) => inferrer.kind.expected(),
        }
    }

    /// Convert `value` into this kind, or fail with a type mismatch.
    pub(crate) fn accept(&self, field: &str, value: Value) -> ModelResult<Value> {
        let mismatch = |kind: &FieldKind, value: &Value| ModelError::TypeMismatch {
            field: field.to_string(),
            expected: kind.expected(),
            found: value.describe(),
        };
        match (self, value) {
            (FieldKind::String, Value::String(text)) => Ok(Value::String(text)),
            (FieldKind::String, Value::Float(number)) => Ok(Value::String(number.to_string())),
            (FieldKind::Float, Value::Float(number)) => Ok(Value::Float(number)),
            (FieldKind::Float, Value::String(text)) => match text.trim().parse::<f64>() {
                Ok(number) => Ok(Value::Float(number)),
                Err(_) => Err(mismatch(self, &Value::String(text))),
            },
            (FieldKind::Model(schema), Value::Model(record)) => {
                if record.schema().is_instance_of(schema) {
                    Ok(Value::Model(record))
                } else {
                    Err(mismatch(self, &Value::Model(record)))
                }
            }
            (FieldKind::ListOf(inner), Value::List(items) | Value::Set(items)) => items
                .into_iter()
                .map(|item| inner.accept(field, item))
                .collect::<ModelResult<Vec<_>>>()
                .map(Value::List),
            (FieldKind::SetOf(inner), Value::List(items) | Value::Set(items)) => items
                .into_iter()
                .map(|item| inner.accept(field, item))
                .collect::<ModelResult<Vec<_>>>()
                .map(|items| Value::Set(crate::value::normalize_set(items))),
            (FieldKind::Inferred(inferrer), value) => inferrer.kind.accept(field, value),
            (_, value) => Err(mismatch(self, &value)),
        }
    }
}

/// A field descriptor: its value kind plus the metadata used by the
/// auto-parser and the merge engine.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    kind: FieldKind,
    default: Option<Value>,
    null: bool,
    required: bool,
    requiredness: f64,
    contextual: bool,
    contextual_range: ContextualRange,
    expression: Option<Element>,
    parse_expression: Option<Element>,
    updatable: bool,
    binding: bool,
    ignore_when_merging: bool,
    never_merge: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Field {
            name: name.into(),
            kind,
            default: None,
            null: false,
            required: false,
            requiredness: 1.0,
            contextual: false,
            contextual_range: ContextualRange::document(),
            expression: None,
            parse_expression: None,
            updatable: false,
            binding: false,
            ignore_when_merging: false,
            never_merge: false,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Float)
    }

    pub fn model(name: impl Into<String>, schema: &SchemaRef) -> Self {
        Self::new(name, FieldKind::Model(schema.clone()))
    }

    pub fn list(name: impl Into<String>, inner: FieldKind) -> Self {
        Self::new(name, FieldKind::list(inner))
    }

    pub fn set(name: impl Into<String>, inner: FieldKind) -> Self {
        Self::new(name, FieldKind::set(inner))
    }

    /// A field computed from `origin` the first time it is read.
    pub fn inferred<F>(name: impl Into<String>, kind: FieldKind, origin: impl Into<String>, infer: F) -> Self
    where
        F: Fn(Option<&Value>, &Record) -> Option<Value> + Send + Sync + 'static,
    {
        Self::new(
            name,
            FieldKind::Inferred(Inferrer {
                kind: Box::new(kind),
                origin: origin.into(),
                infer: Arc::new(infer),
            }),
        )
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Serialize this field even when it is empty.
    pub fn null(mut self) -> Self {
        self.null = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// A soft requirement: a missing value scales confidence by
    /// `1 - requiredness` instead of rejecting the record.
    pub fn requiredness(mut self, requiredness: f64) -> Self {
        self.required = true;
        self.requiredness = requiredness.clamp(0.0, 1.0);
        self
    }

    pub fn contextual(mut self) -> Self {
        self.contextual = true;
        self
    }

    pub fn contextual_range(mut self, range: ContextualRange) -> Self {
        self.contextual_range = range;
        self
    }

    pub fn parse(mut self, expression: Element) -> Self {
        self.expression = Some(expression);
        self
    }

    /// The parse expression can gain alternatives from the grammar context.
    pub fn updatable(mut self) -> Self {
        self.updatable = true;
        self
    }

    pub fn binding(mut self) -> Self {
        self.binding = true;
        self
    }

    pub fn ignore_when_merging(mut self) -> Self {
        self.ignore_when_merging = true;
        self
    }

    pub fn never_merge(mut self) -> Self {
        self.never_merge = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_null(&self) -> bool {
        self.null
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn requiredness_weight(&self) -> f64 {
        self.requiredness
    }

    /// Required with full requiredness.
    pub fn is_hard_required(&self) -> bool {
        self.required && (self.requiredness - 1.0).abs() < f64::EPSILON
    }

    pub fn is_contextual(&self) -> bool {
        self.contextual
    }

    pub fn range(&self) -> ContextualRange {
        self.contextual_range
    }

    /// The expression used for parsing; for updatable fields this is an
    /// extensible node keyed `"Schema.field"`.
    pub fn parse_expression(&self) -> Option<&Element> {
        self.parse_expression.as_ref()
    }

    pub fn is_updatable(&self) -> bool {
        self.updatable
    }

    pub fn is_binding(&self) -> bool {
        self.binding
    }

    pub fn is_ignored_when_merging(&self) -> bool {
        self.ignore_when_merging
    }

    pub fn is_never_merged(&self) -> bool {
        self.never_merge
    }

    fn compile(&mut self, schema: &str) {
        if self.updatable && self.expression.is_none() {
            warn!(
                schema,
                field = %self.name,
                "updatable field has no parse expression, ignoring the updatable flag"
            );
            self.updatable = false;
        }
        self.parse_expression = match &self.expression {
            Some(expression) if self.updatable => Some(Element::extensible(
                format!("{}.{}", schema, self.name),
                expression.clone(),
            )),
            other => other.clone(),
        };
    }
}

/// A record type: an ordered set of fields.
#[derive(Debug)]
pub struct Schema {
    name: String,
    ancestors: Vec<String>,
    fields: Vec<Field>,
    dimension: Option<Dimension>,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            ancestors: Vec::new(),
            fields: Vec::new(),
            dimension: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the schemas this one inherits from, nearest last.
    pub fn ancestors(&self) -> &[String] {
        &self.ancestors
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub(crate) fn require_index(&self, name: &str) -> ModelResult<usize> {
        self.field_index(name).ok_or_else(|| ModelError::UnknownField {
            schema: self.name.clone(),
            field: name.to_string(),
        })
    }

    /// Physical dimension of a quantity schema.
    pub fn dimension(&self) -> Option<&Dimension> {
        self.dimension.as_ref()
    }

    pub fn is_quantity(&self) -> bool {
        self.dimension.is_some()
    }

    pub fn same_type(&self, other: &Schema) -> bool {
        self.name == other.name
    }

    /// Whether records of this schema can stand in for `other`'s.
    pub fn is_instance_of(&self, other: &Schema) -> bool {
        self.same_type(other) || self.ancestors.iter().any(|ancestor| *ancestor == other.name)
    }

    /// This schema and every schema reachable through its fields.
    pub fn flatten(&self) -> Vec<&Schema> {
        let mut found: Vec<&Schema> = Vec::new();
        self.collect_flattened(&mut found);
        found
    }

    fn collect_flattened<'a>(&'a self, found: &mut Vec<&'a Schema>) {
        if found.iter().any(|schema| schema.same_type(self)) {
            return;
        }
        found.push(self);
        for field in &self.fields {
            if let Some(schema) = field.kind.reachable_schema() {
                schema.collect_flattened(found);
            }
        }
    }

    /// Whether `other` is this schema or nested somewhere inside it.
    pub fn contains_type(&self, other: &Schema) -> bool {
        self.flatten().iter().any(|schema| other.is_instance_of(schema))
    }

    /// Dotted paths to every leaf field, e.g. `compound.names`.
    pub fn all_keypaths(&self, include_model_lists: bool) -> Vec<String> {
        let mut keypaths = Vec::new();
        for field in &self.fields {
            let nested = if include_model_lists {
                field.kind.reachable_schema()
            } else {
                field.kind.model_schema()
            };
            match nested {
                Some(schema) => keypaths.extend(
                    schema
                        .all_keypaths(include_model_lists)
                        .into_iter()
                        .map(|keypath| format!("{}.{}", field.name, keypath)),
                ),
                None => keypaths.push(field.name.clone()),
            }
        }
        keypaths
    }

    /// Dotted paths to the hard-required leaf fields.
    pub fn required_keypaths(&self) -> Vec<String> {
        let mut keypaths = Vec::new();
        for field in self.fields.iter().filter(|field| field.is_hard_required()) {
            match field.kind.model_schema() {
                Some(schema) => keypaths.extend(
                    schema
                        .required_keypaths()
                        .into_iter()
                        .map(|keypath| format!("{}.{}", field.name, keypath)),
                ),
                None => keypaths.push(field.name.clone()),
            }
        }
        keypaths
    }
}

/// Builds a [`Schema`].
pub struct SchemaBuilder {
    name: String,
    ancestors: Vec<String>,
    fields: Vec<Field>,
    dimension: Option<Dimension>,
}

impl SchemaBuilder {
    /// Start from `parent`'s fields; later fields with the same name replace them.
    pub fn inherit(mut self, parent: &Schema) -> Self {
        self.ancestors.extend(parent.ancestors.iter().cloned());
        self.ancestors.push(parent.name.clone());
        for field in &parent.fields {
            self = self.field(field.clone());
        }
        if self.dimension.is_none() {
            self.dimension = parent.dimension.clone();
        }
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        match self.fields.iter_mut().find(|existing| existing.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    /// Add the quantity fields (`raw_value`, `raw_units`, `value`, `units`,
    /// `error`) for `dimension`.
    pub fn quantity(mut self, dimension: Dimension) -> Self {
        for field in crate::quantity::quantity_fields(&dimension) {
            self = self.field(field);
        }
        self.dimension = Some(dimension);
        self
    }

    /// Replace the dimension without touching the fields.
    pub fn dimension(mut self, dimension: Dimension) -> Self {
        if let Some(idx) = self.fields.iter().position(|field| field.name == "units") {
            self.fields[idx] = crate::quantity::units_field(&dimension);
        }
        self.dimension = Some(dimension);
        self
    }

    pub fn build(mut self) -> ModelResult<SchemaRef> {
        for field in &self.fields {
            if let FieldKind::Inferred(inferrer) = &field.kind {
                if !self.fields.iter().any(|origin| origin.name == inferrer.origin) {
                    return Err(ModelError::InvalidConfiguration(format!(
                        "{}.{} is inferred from unknown field `{}`",
                        self.name, field.name, inferrer.origin
                    )));
                }
            }
        }
        for field in &mut self.fields {
            field.compile(&self.name);
        }
        Ok(Arc::new(Schema {
            name: self.name,
            ancestors: self.ancestors,
            fields: self.fields,
            dimension: self.dimension,
        }))
    }
}
