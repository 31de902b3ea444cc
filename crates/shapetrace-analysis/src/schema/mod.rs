//! Normalized schema model, per-format type mapping, and fragment decoders.

pub mod fragment;
pub mod json_schema;
pub mod properties;
pub mod ts_types;
pub mod type_map;
pub mod types;
pub mod zod;

pub use fragment::{decode_schema, resolve_binding};
pub use json_schema::{property_from_json, schema_from_json, type_from_json};
pub use properties::PropertyMap;
pub use ts_types::{schema_from_ts_node, type_from_ts_node};
pub use type_map::{normalize_type_name, SourceFormat};
pub use types::{
    ArgumentValue, Constraints, ConsumerSchema, LiteralValue, NormalizedSchema, NormalizedType,
    PrimitiveKind, ProducerSchema, PropertyDef, SchemaRef,
};
pub use zod::{zod_field, zod_shape, ZodField};
