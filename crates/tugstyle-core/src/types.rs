//! Common types shared between error and output modules.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Location in a source file.
///
/// - `file`: Workspace-relative path
/// - `line`: 1-indexed line number
/// - `col`: 1-indexed column, UTF-8 bytes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    /// File path (workspace-relative).
    pub file: String,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, UTF-8 bytes).
    pub col: u32,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32, col: u32) -> Self {
        Location {
            file: file.into(),
            line,
            col,
        }
    }

    /// Comparison key for deterministic sorting: (file, line, col).
    fn sort_key(&self) -> (&str, u32, u32) {
        (&self.file, self.line, self.col)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.col)
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_path_line_col() {
        assert_eq!(Location::new("src/A.cs", 3, 9).to_string(), "src/A.cs:3:9");
    }

    #[test]
    fn ordering_is_file_then_line_then_col() {
        let mut locations = vec![
            Location::new("b.cs", 1, 1),
            Location::new("a.cs", 2, 1),
            Location::new("a.cs", 1, 5),
        ];
        locations.sort();
        assert_eq!(
            locations,
            vec![
                Location::new("a.cs", 1, 5),
                Location::new("a.cs", 2, 1),
                Location::new("b.cs", 1, 1),
            ]
        );
    }
}
