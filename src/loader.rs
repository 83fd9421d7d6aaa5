//! Workspace loading.
//!
//! Turns a directory into a [`Solution`]:
//! - every top-level directory holding sources becomes a project, files directly
//!   in the root go to a project named after the root
//! - projects reference every other project of the same language
//! - `.cs` files are parsed, other recognized languages are kept as opaque text
//! - hidden directories and paths matching the configured exclude globs are skipped

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use thiserror::Error;
use tracing::{debug, trace};
use walkdir::WalkDir;

use tugstyle_core::config::WorkspaceConfig;
use tugstyle_core::error::{SolutionError, StyleError};
use tugstyle_core::solution::{DocumentId, Language, ProjectId, Solution};
use tugstyle_core::syntax::{SyntaxKind, SyntaxNode, SyntaxToken};

/// Errors loading a workspace from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("workspace root {path} is not a directory")]
    NotADirectory { path: String },

    #[error("invalid exclude pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("failed to read {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error(transparent)]
    Solution(#[from] SolutionError),
}

impl From<LoadError> for StyleError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::NotADirectory { .. } => StyleError::invalid_args(err.to_string()),
            LoadError::InvalidPattern { .. } => StyleError::InvalidConfig {
                message: err.to_string(),
            },
            LoadError::Read { .. } | LoadError::Solution(_) => StyleError::internal(err.to_string()),
        }
    }
}

/// A solution loaded from disk, with the on-disk location of each document.
#[derive(Debug, Clone)]
pub struct LoadedWorkspace {
    root: PathBuf,
    solution: Solution,
    documents: Vec<DocumentId>,
}

impl LoadedWorkspace {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn solution(&self) -> &Solution {
        &self.solution
    }

    /// Documents in path order.
    pub fn documents(&self) -> &[DocumentId] {
        &self.documents
    }

    /// Absolute path of `document`.
    pub fn disk_path(&self, document: DocumentId) -> Option<PathBuf> {
        self.solution
            .document(document)
            .map(|doc| self.root.join(doc.path()))
    }
}

/// A source file found on disk, before it is added to the solution.
struct SourceFile {
    relative: String,
    absolute: PathBuf,
}

/// Load every source file under `root`.
pub fn load_workspace(root: &Path, config: &WorkspaceConfig) -> Result<LoadedWorkspace, LoadError> {
    if !root.is_dir() {
        return Err(LoadError::NotADirectory {
            path: root.display().to_string(),
        });
    }
    let excludes = build_excludes(&config.exclude)?;
    let root_project = root
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "workspace".to_string());

    let mut projects: BTreeMap<(String, Language), Vec<SourceFile>> = BTreeMap::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let language = Language::from_path(rel);
        if language == Language::Unknown {
            continue;
        }
        if excludes.is_match(rel) {
            trace!(path = %rel.display(), "excluded");
            continue;
        }

        let components: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let project = if components.len() > 1 {
            components[0].clone()
        } else {
            root_project.clone()
        };
        projects.entry((project, language)).or_default().push(SourceFile {
            relative: components.join("/"),
            absolute: entry.path().to_path_buf(),
        });
    }

    let mut solution = Solution::new();
    let mut ids: Vec<(ProjectId, Language)> = Vec::new();
    let mut documents: Vec<(String, DocumentId)> = Vec::new();
    for ((name, language), files) in projects {
        let (next, project) = solution.with_project(name.as_str(), language);
        solution = next;
        for file in files {
            let text = fs::read_to_string(&file.absolute).map_err(|source| LoadError::Read {
                path: file.relative.clone(),
                source,
            })?;
            let tree = syntax_root(language, &text);
            let (next, document) = solution.with_document(project, file.relative.as_str(), tree)?;
            solution = next;
            documents.push((file.relative, document));
        }
        debug!(project = %name, %language, "loaded project");
        ids.push((project, language));
    }
    for (from, from_language) in &ids {
        for (to, to_language) in &ids {
            if from != to && from_language == to_language {
                solution = solution.with_project_reference(*from, *to)?;
            }
        }
    }

    documents.sort_by(|a, b| a.0.cmp(&b.0));
    debug!(
        root = %root.display(),
        projects = ids.len(),
        documents = documents.len(),
        "workspace loaded"
    );
    Ok(LoadedWorkspace {
        root: root.to_path_buf(),
        solution,
        documents: documents.into_iter().map(|(_, id)| id).collect(),
    })
}

fn build_excludes(patterns: &[String]) -> Result<GlobSet, LoadError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| LoadError::InvalidPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| LoadError::InvalidPattern {
        pattern: patterns.join(", "),
        message: e.to_string(),
    })
}

/// Parsed tree for C#, a single opaque token for anything else.
fn syntax_root(language: Language, text: &str) -> SyntaxNode {
    match language {
        Language::CSharp => tugstyle_csharp::parse(text),
        _ => SyntaxNode::new(
            SyntaxKind::CompilationUnit,
            vec![SyntaxToken::new(SyntaxKind::Unknown, text).into()],
        ),
    }
}
