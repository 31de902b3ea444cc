//! Fast hash collections used throughout the workspace.
//!
//! Keys are short identifiers (tool names, property names), so FxHash beats SipHash
//! and HashDoS is not a concern for locally parsed sources.

pub use rustc_hash::{FxHashMap, FxHashSet};
