//! Neutral syntax trees: the parser-independent node model every matcher, extractor,
//! and decoder works against, plus the tree-sitter TypeScript/JavaScript front end.

pub mod query;
pub mod tree;
pub mod typescript;

pub use tree::{Field, NodeId, NodeKind, NodeSpec, Position, SyntaxNode, SyntaxTree};
pub use typescript::{parse_source, parse_typescript, SourceLanguage};
