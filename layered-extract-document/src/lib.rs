//! Whole-document extraction for layered-extract.
//!
//! ## Core Types
//!
//! - [`Document`] / [`Table`] - Headings, paragraphs and tables as token streams
//! - [`Position`] - Where a record was found, and the distance between two places
//! - [`Pipeline`] / [`ModelParsers`] - Discovery, extraction, merging and cleanup
//! - [`ExtractionConfig`] - Pipeline settings, loadable from TOML
//!
//! ## Example
//!
//! ```
//! use layered_extract_document::{Document, ExtractionConfig, Pipeline};
//!
//! let document = Document::from_text("# Results\nNothing to see here.");
//! let records = Pipeline::new(ExtractionConfig::default()).run(&document);
//! assert!(records.is_empty());
//! ```

mod config;
mod document;
mod error;
mod pipeline;
mod position;

pub use config::{ExtractionConfig, MergeConfig};
pub use document::{Block, Document, Table};
pub use error::{ConfigError, ConfigResult};
pub use pipeline::{Located, ModelParsers, Pipeline};
pub use position::Position;
