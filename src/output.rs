//! JSON output types for CLI responses.
//!
//! Every response has `status` first and carries `schema_version`. Output is
//! deterministic: files, renames and diffs are ordered by path, then by
//! position.

use std::fmt::Write as _;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use tugstyle_core::engine::RuleId;
use tugstyle_core::error::{OutputErrorCode, StyleError};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

/// Whether a run only reports or also writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Check,
    Fix,
}

/// One symbol rename performed by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameInfo {
    pub rule: RuleId,
    /// Document in which the candidate was found.
    pub file: String,
    /// Symbol kind (`method`, `named_type`, ...).
    pub kind: String,
    pub old_name: String,
    pub new_name: String,
}

/// Per-file change statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub file: String,
    pub changed_lines: usize,
}

/// Response for `check` and `fix`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleResponse {
    /// Status: "ok".
    pub status: String,
    pub schema_version: String,
    pub mode: RunMode,
    /// Rules run, in order.
    pub rules: Vec<RuleId>,
    pub files_scanned: usize,
    /// Candidates found across all rules.
    pub candidates: usize,
    /// Candidates whose name already conformed.
    pub skipped: usize,
    pub renames: Vec<RenameInfo>,
    /// Files whose text changed.
    pub files: Vec<FileSummary>,
    /// Files no rule engine supports.
    pub unsupported: Vec<String>,
    /// Unified diff of all changes.
    pub diff: String,
    /// Files written (fix only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_written: Option<Vec<String>>,
}

impl StyleResponse {
    /// Whether the run changed (or would change) any file.
    pub fn has_changes(&self) -> bool {
        !self.files.is_empty()
    }
}

/// Error details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code, also the process exit status.
    pub code: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl ErrorInfo {
    pub fn from_error(err: &StyleError) -> Self {
        let file = match err {
            StyleError::Apply { file, .. } => file.clone(),
            _ => None,
        };
        ErrorInfo {
            code: OutputErrorCode::from(err).code(),
            message: err.to_string(),
            file,
        }
    }
}

/// Response for any failed command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    pub fn from_error(err: &StyleError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

/// Emit a response as pretty JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

/// Human-readable summary followed by the diff.
pub fn render_text(response: &StyleResponse) -> String {
    let mut out = String::new();
    let verb = match response.mode {
        RunMode::Check => "would rename",
        RunMode::Fix => "renamed",
    };
    let _ = writeln!(
        out,
        "{} {} symbol(s) in {} file(s) ({} scanned, {} candidate(s), {} already conforming)",
        verb,
        response.renames.len(),
        response.files.len(),
        response.files_scanned,
        response.candidates,
        response.skipped
    );
    for rename in &response.renames {
        let _ = writeln!(
            out,
            "  [{}] {}: {} {} -> {}",
            rename.rule, rename.file, rename.kind, rename.old_name, rename.new_name
        );
    }
    for file in &response.unsupported {
        let _ = writeln!(out, "  skipped {}: language not supported", file);
    }
    if !response.diff.is_empty() {
        out.push('\n');
        out.push_str(&response.diff);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(mode: RunMode) -> StyleResponse {
        StyleResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            mode,
            rules: vec![RuleId::MethodNaming],
            files_scanned: 2,
            candidates: 2,
            skipped: 1,
            renames: vec![RenameInfo {
                rule: RuleId::MethodNaming,
                file: "App/A.cs".to_string(),
                kind: "method".to_string(),
                old_name: "m_go".to_string(),
                new_name: "go".to_string(),
            }],
            files: vec![FileSummary {
                file: "App/A.cs".to_string(),
                changed_lines: 1,
            }],
            unsupported: vec!["Legacy/M.vb".to_string()],
            diff: "--- a/App/A.cs\n+++ b/App/A.cs\n".to_string(),
            files_written: None,
        }
    }

    mod serialization {
        use super::*;

        #[test]
        fn status_comes_first() {
            let mut buf = Vec::new();
            emit_response(&response(RunMode::Check), &mut buf).unwrap();
            let json = String::from_utf8(buf).unwrap();
            assert!(json.trim_start().starts_with("{\n  \"status\": \"ok\""));
            assert!(!json.contains("files_written"));

            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(value["mode"], "check");
            assert_eq!(value["rules"][0], "method-naming");
            assert_eq!(value["renames"][0]["old_name"], "m_go");
        }

        #[test]
        fn error_response_carries_code() {
            let err = StyleError::Apply {
                message: "disk full".to_string(),
                file: Some("App/A.cs".to_string()),
            };
            let value = serde_json::to_value(ErrorResponse::from_error(&err)).unwrap();
            assert_eq!(value["status"], "error");
            assert_eq!(value["schema_version"], SCHEMA_VERSION);
            assert_eq!(value["error"]["code"], 4);
            assert_eq!(value["error"]["file"], "App/A.cs");
        }
    }

    mod text {
        use super::*;

        #[test]
        fn summary_lists_renames_and_unsupported_files() {
            let text = render_text(&response(RunMode::Fix));
            assert!(text.starts_with("renamed 1 symbol(s) in 1 file(s)"));
            assert!(text.contains("[method-naming] App/A.cs: method m_go -> go"));
            assert!(text.contains("skipped Legacy/M.vb: language not supported"));
            assert!(text.ends_with("+++ b/App/A.cs\n"));
        }

        #[test]
        fn check_mode_uses_conditional_wording() {
            let text = render_text(&response(RunMode::Check));
            assert!(text.starts_with("would rename 1 symbol(s)"));
        }
    }
}
