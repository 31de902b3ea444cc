//! Schema location extraction: resolve where, relative to a match, the schema lives.

pub mod extractor;
pub mod location;

pub use extractor::extract_location;
pub use location::SchemaLocation;
