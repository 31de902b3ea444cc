//! Schema adapters: turn one source kind into [`NormalizedSchema`]s.
//!
//! `extract` fails with a reason-qualified [`ExtractionError`]; `list` never fails and
//! degrades to an empty result.

pub mod mcp;
pub mod registry;
pub mod sql;
pub mod walk;

use std::path::Path;

use shapetrace_core::errors::ExtractionError;

use crate::schema::{NormalizedSchema, SchemaRef};

pub use mcp::McpToolAdapter;
pub use registry::AdapterRegistry;
pub use sql::SqlDdlAdapter;

/// One source kind (MCP servers, SQL DDL, ...).
pub trait SchemaAdapter: Send + Sync {
    /// Stable identifier, matched against [`SchemaRef::source`].
    fn kind(&self) -> &str;

    fn supports(&self, schema_ref: &SchemaRef) -> bool {
        schema_ref.source == self.kind()
    }

    fn extract(&self, schema_ref: &SchemaRef) -> Result<NormalizedSchema, ExtractionError>;

    /// Every schema reachable under `base_path`, sorted by id. Empty on any failure.
    fn list(&self, base_path: &Path) -> Vec<SchemaRef>;
}

/// Split a `<path>#<name>` reference id. Without a fragment, `name` comes from the
/// `option` entry of the ref's options.
pub(crate) fn split_ref_id<'a>(
    adapter: &str,
    schema_ref: &'a SchemaRef,
    option: &str,
) -> Result<(&'a str, &'a str), ExtractionError> {
    let (path, name) = match schema_ref.id.split_once('#') {
        Some((path, name)) => (path, name),
        None => {
            let name = schema_ref
                .option_str(option)
                .ok_or_else(|| ExtractionError::MissingOption {
                    adapter: adapter.to_string(),
                    option: option.to_string(),
                })?;
            (schema_ref.id.as_str(), name)
        }
    };
    if path.is_empty() || name.is_empty() {
        return Err(ExtractionError::UnsupportedRef {
            adapter: adapter.to_string(),
            id: schema_ref.id.clone(),
            reason: format!("expected \"<path>#<{option}>\""),
        });
    }
    Ok((path, name))
}

pub(crate) fn read_source(adapter: &str, path: &str) -> Result<String, ExtractionError> {
    std::fs::read_to_string(path).map_err(|e| ExtractionError::Io {
        adapter: adapter.to_string(),
        path: path.to_string(),
        message: e.to_string(),
    })
}
