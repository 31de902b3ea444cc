//! Source positions attached to matches, schemas, and mismatches.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A `file:line:column` position. Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_file_line_column() {
        let loc = SourceLocation::new("src/server.ts", 12, 5);
        assert_eq!(loc.to_string(), "src/server.ts:12:5");
    }

    #[test]
    fn ordering_is_file_then_line_then_column() {
        let a = SourceLocation::new("a.ts", 9, 1);
        let b = SourceLocation::new("a.ts", 10, 1);
        let c = SourceLocation::new("b.ts", 1, 1);
        assert!(a < b);
        assert!(b < c);
    }
}
