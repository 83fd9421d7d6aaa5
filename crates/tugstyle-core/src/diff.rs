//! Unified diff generation utilities.
//!
//! Renames rewrite identifier text only and never add or remove lines, so a
//! diff is produced line by line: every changed line becomes its own
//! single-line hunk. Inputs whose line counts differ get one whole-file hunk.

/// Old and new text of one changed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Workspace-relative path.
    pub file: String,
    pub old_text: String,
    pub new_text: String,
}

impl FileChange {
    pub fn new(
        file: impl Into<String>,
        old_text: impl Into<String>,
        new_text: impl Into<String>,
    ) -> Self {
        FileChange {
            file: file.into(),
            old_text: old_text.into(),
            new_text: new_text.into(),
        }
    }

    /// Number of lines that differ.
    pub fn changed_lines(&self) -> usize {
        let old: Vec<&str> = self.old_text.lines().collect();
        let new: Vec<&str> = self.new_text.lines().collect();
        if old.len() != new.len() {
            return old.len().max(new.len());
        }
        old.iter().zip(&new).filter(|(a, b)| a != b).count()
    }
}

/// Generate a unified diff for a set of changed files.
///
/// Files are emitted in path order. Unchanged files produce nothing.
pub fn generate_unified_diff(changes: &[FileChange]) -> String {
    let mut sorted: Vec<&FileChange> = changes.iter().collect();
    sorted.sort_by(|a, b| a.file.cmp(&b.file));

    let mut diff = String::new();
    for change in sorted {
        if change.old_text == change.new_text {
            continue;
        }
        diff.push_str(&format!("--- a/{}\n", change.file));
        diff.push_str(&format!("+++ b/{}\n", change.file));

        let old: Vec<&str> = change.old_text.lines().collect();
        let new: Vec<&str> = change.new_text.lines().collect();
        if old.len() != new.len() {
            diff.push_str(&format!(
                "@@ -1,{} +1,{} @@\n",
                old.len(),
                new.len()
            ));
            for line in &old {
                diff.push_str(&format!("-{}\n", line));
            }
            for line in &new {
                diff.push_str(&format!("+{}\n", line));
            }
            continue;
        }

        for (index, (old_line, new_line)) in old.iter().zip(&new).enumerate() {
            if old_line == new_line {
                continue;
            }
            let line = index + 1;
            diff.push_str(&format!("@@ -{},1 +{},1 @@\n", line, line));
            diff.push_str(&format!("-{}\n", old_line));
            diff.push_str(&format!("+{}\n", new_line));
        }
    }

    diff
}

// ============================================================================
// Tests
// ============================================================================
