//! CLI front door.
//!
//! - `check`: run the rules in memory and report what would change
//! - `fix`: run the rules and write every changed file back
//!
//! Rules run one after another over every document in path order; each
//! document sees the snapshot left by everything before it.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use tugstyle_core::config::StyleConfig;
use tugstyle_core::diff::{generate_unified_diff, FileChange};
use tugstyle_core::engine::RuleId;
use tugstyle_core::error::{EngineError, StyleError};
use tugstyle_core::services::CancellationToken;
use tugstyle_core::solution::{DocumentId, Solution};

use crate::loader::{load_workspace, LoadedWorkspace};
use crate::output::{FileSummary, RenameInfo, RunMode, StyleResponse, SCHEMA_VERSION};
use crate::rules::dispatchers;

/// Report the renames the rules would make, without writing anything.
///
/// `rules` selects rules explicitly; empty means the configured rules.
pub fn run_check(
    workspace: &Path,
    rules: &[RuleId],
    cancel: &CancellationToken,
) -> Result<StyleResponse, StyleError> {
    let (_, response) = run(workspace, rules, RunMode::Check, cancel)?;
    Ok(response)
}

/// Apply the rules and write every changed file.
pub fn run_fix(
    workspace: &Path,
    rules: &[RuleId],
    cancel: &CancellationToken,
) -> Result<StyleResponse, StyleError> {
    let (changed, mut response) = run(workspace, rules, RunMode::Fix, cancel)?;
    let mut written = Vec::with_capacity(changed.len());
    for (path, text) in changed {
        let target = workspace.join(&path);
        fs::write(&target, text).map_err(|e| StyleError::Apply {
            message: format!("failed to write {}: {}", target.display(), e),
            file: Some(path.clone()),
        })?;
        debug!(file = %path, "wrote file");
        written.push(path);
    }
    info!(files = written.len(), "applied changes");
    response.files_written = Some(written);
    Ok(response)
}

/// Outcome of running every rule: changed files as `(path, new text)` plus the response.
fn run(
    workspace: &Path,
    rules: &[RuleId],
    mode: RunMode,
    cancel: &CancellationToken,
) -> Result<(Vec<(String, String)>, StyleResponse), StyleError> {
    let config = StyleConfig::load_from_workspace(workspace)?;
    let loaded = load_workspace(workspace, &config.workspace)?;
    let dispatchers = dispatchers(&config, rules);

    let mut current = loaded.solution().clone();
    let mut candidates = 0;
    let mut skipped = 0;
    let mut renames = Vec::new();
    let mut unsupported = BTreeSet::new();

    for dispatcher in &dispatchers {
        let rule = dispatcher.rule();
        for &document in loaded.documents() {
            let path = document_path(&current, document)?;
            let report = match dispatcher.process(&current, document, cancel) {
                Ok(report) => report,
                Err(EngineError::Unsupported { language, .. }) => {
                    debug!(%rule, %language, file = %path, "no engine, skipping");
                    unsupported.insert(path);
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            candidates += report.candidates;
            skipped += report.skipped;
            renames.extend(report.renames.into_iter().map(|decision| RenameInfo {
                rule,
                file: path.clone(),
                kind: decision.symbol.kind().to_string(),
                old_name: decision.old_name,
                new_name: decision.new_name,
            }));
            current = report.solution;
        }
    }

    for file in &unsupported {
        warn!(file = %file, "language not supported by any rule, skipped");
    }

    let changes = collect_changes(&loaded, &current)?;
    let diff = generate_unified_diff(&changes);
    let files = changes
        .iter()
        .map(|change| FileSummary {
            file: change.file.clone(),
            changed_lines: change.changed_lines(),
        })
        .collect();
    info!(
        renames = renames.len(),
        files = changes.len(),
        candidates,
        "rules complete"
    );

    let response = StyleResponse {
        status: "ok".to_string(),
        schema_version: SCHEMA_VERSION.to_string(),
        mode,
        rules: dispatchers.iter().map(|d| d.rule()).collect(),
        files_scanned: loaded.documents().len(),
        candidates,
        skipped,
        renames,
        files,
        unsupported: unsupported.into_iter().collect(),
        diff,
        files_written: None,
    };
    let changed = changes
        .into_iter()
        .map(|change| (change.file, change.new_text))
        .collect();
    Ok((changed, response))
}

/// Documents whose text differs between the loaded and the final snapshot, in path order.
fn collect_changes(loaded: &LoadedWorkspace, current: &Solution) -> Result<Vec<FileChange>, StyleError> {
    let original = loaded.solution();
    let mut changes = Vec::new();
    for document in current.changed_documents(original) {
        let path = document_path(current, document)?;
        let old_text = original
            .document(document)
            .map(|d| d.text())
            .unwrap_or_default();
        let new_text = document_text(current, document)?;
        if old_text != new_text {
            changes.push(FileChange::new(path, old_text, new_text));
        }
    }
    changes.sort_by(|a, b| a.file.cmp(&b.file));
    Ok(changes)
}

fn document_path(solution: &Solution, document: DocumentId) -> Result<String, StyleError> {
    solution
        .document(document)
        .map(|d| d.path().to_string())
        .ok_or_else(|| StyleError::internal(format!("document {} missing from snapshot", document)))
}

fn document_text(solution: &Solution, document: DocumentId) -> Result<String, StyleError> {
    solution
        .document(document)
        .map(|d| d.text())
        .ok_or_else(|| StyleError::internal(format!("document {} missing from snapshot", document)))
}
