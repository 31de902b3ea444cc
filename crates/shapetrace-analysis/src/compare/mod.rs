//! Producer/consumer contract comparison.

pub mod comparator;
pub mod direction;
pub mod similarity;
pub mod types;

pub use comparator::compare_schemas;
pub use direction::Direction;
pub use similarity::{levenshtein, similarity, TypoDetector};
pub use types::{CompareOptions, IssueType, Match, Mismatch, TraceResult, TraceSummary};
