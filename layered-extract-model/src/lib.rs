//! Schema-driven records for layered-extract.
//!
//! A [`Schema`] declares typed [`Field`]s together with the metadata the
//! auto-parser and the merge engine read: which fields are required,
//! which may be filled from surrounding text (contextual), which must agree
//! across merged records (binding). [`Record`]s are instances of a schema;
//! partial records found in different sentences and tables are combined
//! with [`Record::merge_contextual`] and deduplicated with
//! [`RecordList::remove_subsets`].

pub mod confidence;
mod error;
mod list;
mod merge;
pub mod quantity;
mod range;
mod record;
mod schema;
mod serialize;
pub mod units;
mod value;

pub use error::{ModelError, ModelResult};
pub use list::{sort_merge_candidates, RecordList, CONFIDENCE_EPSILON};
pub use range::ContextualRange;
pub use record::Record;
pub use schema::{Field, FieldKind, InferFn, Inferrer, Schema, SchemaBuilder, SchemaRef};
pub use units::Dimension;
pub use value::Value;

#[cfg(test)]
mod tests {
    mod scenarios;
}
