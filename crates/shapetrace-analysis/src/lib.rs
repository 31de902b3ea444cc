//! # shapetrace-analysis
//!
//! Analysis engine for the shapetrace contract analyzer.
//! Contains the neutral syntax tree, pattern registry and matchers, schema
//! location extraction, the normalized schema model, source adapters, and the
//! producer/consumer comparator.

#![allow(clippy::module_inception)]

pub mod adapters;
pub mod compare;
pub mod extraction;
pub mod patterns;
pub mod schema;
pub mod syntax;

pub use adapters::{AdapterRegistry, McpToolAdapter, SchemaAdapter, SqlDdlAdapter};
pub use compare::{compare_schemas, CompareOptions, Direction, TraceResult};
pub use patterns::{PatternRegistry, ScanOptions};
pub use schema::{ConsumerSchema, NormalizedSchema, ProducerSchema, SchemaRef};
