//! Immutable project-graph snapshots.
//!
//! A [`Solution`] holds every project and document of a workspace at one point
//! in a rename sequence. Every mutation returns a new `Solution`; the old value
//! stays valid and can be diffed against the new one with
//! [`Solution::changed_documents`]. Storage uses persistent maps, so a clone
//! costs O(1) and an update copies only the touched path.

use std::fmt;
use std::path::Path;

use im::OrdMap;
use serde::{Deserialize, Serialize};

use crate::error::SolutionError;
use crate::syntax::SyntaxNode;

// ============================================================================
// Language Detection
// ============================================================================

/// Source languages known to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Language {
    /// C# source files (.cs)
    CSharp,
    /// Visual Basic source files (.vb)
    VisualBasic,
    /// Unknown or unsupported language
    Unknown,
}

impl Language {
    /// Detect language from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("cs") => Language::CSharp,
            Some("vb") => Language::VisualBasic,
            _ => Language::Unknown,
        }
    }

    /// Get the typical file extension for this language.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Language::CSharp => Some("cs"),
            Language::VisualBasic => Some("vb"),
            Language::Unknown => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::CSharp => write!(f, "csharp"),
            Language::VisualBasic => write!(f, "visual-basic"),
            Language::Unknown => write!(f, "unknown"),
        }
    }
}

// ============================================================================
// Identifiers
// ============================================================================

/// Stable identity of a document, independent of its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub u32);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc_{}", self.0)
    }
}

/// Stable identity of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId(pub u32);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proj_{}", self.0)
    }
}

// ============================================================================
// Projects and Documents
// ============================================================================

/// A source file inside one snapshot.
#[derive(Debug, Clone)]
pub struct Document {
    id: DocumentId,
    project: ProjectId,
    path: String,
    root: SyntaxNode,
}

impl Document {
    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn project(&self) -> ProjectId {
        self.project
    }

    /// Workspace-relative path (forward slashes).
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    /// Full source text of the document.
    pub fn text(&self) -> String {
        self.root.text()
    }
}

/// A compilation unit grouping documents of one language.
#[derive(Debug, Clone)]
pub struct Project {
    id: ProjectId,
    name: String,
    language: Language,
    documents: Vec<DocumentId>,
    references: Vec<ProjectId>,
}

impl Project {
    pub fn id(&self) -> ProjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Documents in insertion order.
    pub fn documents(&self) -> &[DocumentId] {
        &self.documents
    }

    /// Directly referenced projects.
    pub fn references(&self) -> &[ProjectId] {
        &self.references
    }
}

// ============================================================================
// Solution
// ============================================================================

/// Immutable snapshot of all projects and documents.
#[derive(Debug, Clone, Default)]
pub struct Solution {
    projects: OrdMap<ProjectId, Project>,
    documents: OrdMap<DocumentId, Document>,
    next_project: u32,
    next_document: u32,
}

impl Solution {
    /// An empty solution.
    pub fn new() -> Self {
        Solution::default()
    }

    /// Add a project, returning the new snapshot and the project's id.
    pub fn with_project(&self, name: impl Into<String>, language: Language) -> (Solution, ProjectId) {
        let id = ProjectId(self.next_project);
        let mut next = self.clone();
        next.next_project += 1;
        next.projects.insert(
            id,
            Project {
                id,
                name: name.into(),
                language,
                documents: Vec::new(),
                references: Vec::new(),
            },
        );
        (next, id)
    }

    /// Add a reference from `from` to `to`.
    pub fn with_project_reference(
        &self,
        from: ProjectId,
        to: ProjectId,
    ) -> Result<Solution, SolutionError> {
        if !self.projects.contains_key(&to) {
            return Err(SolutionError::ProjectNotFound { project: to });
        }
        let mut project = self
            .projects
            .get(&from)
            .cloned()
            .ok_or(SolutionError::ProjectNotFound { project: from })?;
        if from == to || project.references.contains(&to) {
            return Ok(self.clone());
        }
        project.references.push(to);
        let mut next = self.clone();
        next.projects.insert(from, project);
        Ok(next)
    }

    /// Add a document to a project, returning the new snapshot and the document's id.
    pub fn with_document(
        &self,
        project: ProjectId,
        path: impl Into<String>,
        root: SyntaxNode,
    ) -> Result<(Solution, DocumentId), SolutionError> {
        let mut owner = self
            .projects
            .get(&project)
            .cloned()
            .ok_or(SolutionError::ProjectNotFound { project })?;
        let id = DocumentId(self.next_document);
        owner.documents.push(id);

        let mut next = self.clone();
        next.next_document += 1;
        next.projects.insert(project, owner);
        next.documents.insert(
            id,
            Document {
                id,
                project,
                path: path.into(),
                root,
            },
        );
        Ok((next, id))
    }

    /// Replace a document's syntax root.
    pub fn with_document_root(
        &self,
        document: DocumentId,
        root: SyntaxNode,
    ) -> Result<Solution, SolutionError> {
        let mut updated = self
            .documents
            .get(&document)
            .cloned()
            .ok_or(SolutionError::DocumentNotFound { document })?;
        updated.root = root;
        let mut next = self.clone();
        next.documents.insert(document, updated);
        Ok(next)
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(&id)
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.get(&id)
    }

    /// Documents ordered by id.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    /// Projects ordered by id.
    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    /// Look up a document by its workspace-relative path.
    pub fn document_by_path(&self, path: &str) -> Option<&Document> {
        self.documents.values().find(|d| d.path == path)
    }

    /// Language of the project owning `document`.
    pub fn document_language(&self, document: DocumentId) -> Result<Language, SolutionError> {
        let doc = self
            .document(document)
            .ok_or(SolutionError::DocumentNotFound { document })?;
        let project = self
            .project(doc.project)
            .ok_or(SolutionError::ProjectNotFound {
                project: doc.project,
            })?;
        Ok(project.language)
    }

    /// `project` followed by every project reachable through references.
    pub fn visible_projects(&self, project: ProjectId) -> Vec<ProjectId> {
        let mut visible = Vec::new();
        let mut pending = vec![project];
        while let Some(id) = pending.pop() {
            if visible.contains(&id) {
                continue;
            }
            if let Some(p) = self.project(id) {
                visible.push(id);
                pending.extend(p.references.iter().rev().copied());
            }
        }
        visible
    }

    /// Documents whose tree differs from `older`, plus documents `older` lacks.
    ///
    /// Trees compare by handle: an untouched document shares its root with
    /// the snapshot it came from.
    pub fn changed_documents(&self, older: &Solution) -> Vec<DocumentId> {
        self.documents
            .values()
            .filter(|doc| match older.document(doc.id) {
                Some(previous) => !previous.root.ptr_eq(&doc.root),
                None => true,
            })
            .map(|doc| doc.id)
            .collect()
    }

    /// Whether every document shares its tree with `other` and no document was added or removed.
    pub fn same_trees(&self, other: &Solution) -> bool {
        self.documents.len() == other.documents.len()
            && self.changed_documents(other).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{SyntaxKind, SyntaxToken};

    fn tree(text: &str) -> SyntaxNode {
        SyntaxNode::new(
            SyntaxKind::CompilationUnit,
            vec![SyntaxToken::new(SyntaxKind::Identifier, text).into()],
        )
    }

    fn two_documents() -> (Solution, DocumentId, DocumentId) {
        let (solution, project) = Solution::new().with_project("App", Language::CSharp);
        let (solution, a) = solution.with_document(project, "App/a.cs", tree("a")).unwrap();
        let (solution, b) = solution.with_document(project, "App/b.cs", tree("b")).unwrap();
        (solution, a, b)
    }

    mod language {
        use super::*;

        #[test]
        fn detects_from_extension() {
            assert_eq!(Language::from_path(Path::new("x/Program.cs")), Language::CSharp);
            assert_eq!(Language::from_path(Path::new("Module.vb")), Language::VisualBasic);
            assert_eq!(Language::from_path(Path::new("README.md")), Language::Unknown);
            assert_eq!(Language::CSharp.extension(), Some("cs"));
        }

        #[test]
        fn display_and_serde_agree() {
            assert_eq!(Language::VisualBasic.to_string(), "visual-basic");
            assert_eq!(
                serde_json::to_string(&Language::VisualBasic).unwrap(),
                "\"visual-basic\""
            );
        }
    }

    mod snapshots {
        use super::*;

        #[test]
        fn documents_belong_to_projects() {
            let (solution, a, b) = two_documents();
            let project = solution.document(a).unwrap().project();
            assert_eq!(solution.project(project).unwrap().documents(), &[a, b]);
            assert_eq!(solution.document_language(b).unwrap(), Language::CSharp);
            assert_eq!(solution.document_by_path("App/b.cs").unwrap().id(), b);
        }

        #[test]
        fn updates_leave_older_snapshot_intact() {
            let (before, a, _) = two_documents();
            let after = before.with_document_root(a, tree("changed")).unwrap();
            assert_eq!(before.document(a).unwrap().text(), "a");
            assert_eq!(after.document(a).unwrap().text(), "changed");
        }

        #[test]
        fn changed_documents_compares_tree_handles() {
            let (before, a, b) = two_documents();
            assert!(before.changed_documents(&before).is_empty());
            assert!(before.same_trees(&before.clone()));

            let after = before.with_document_root(b, tree("b")).unwrap();
            assert_eq!(after.changed_documents(&before), vec![b]);
            assert!(!after.same_trees(&before));

            let reverted = after
                .with_document_root(b, before.document(b).unwrap().root().clone())
                .unwrap();
            assert!(reverted.changed_documents(&before).is_empty());
            let _ = a;
        }

        #[test]
        fn unknown_ids_are_errors() {
            let (solution, _, _) = two_documents();
            let err = solution.with_document_root(DocumentId(99), tree("x")).unwrap_err();
            assert!(matches!(err, SolutionError::DocumentNotFound { .. }));
            let err = solution
                .with_document(ProjectId(7), "x.cs", tree("x"))
                .unwrap_err();
            assert!(matches!(err, SolutionError::ProjectNotFound { .. }));
        }
    }

    mod references {
        use super::*;

        #[test]
        fn visible_projects_follow_references_transitively() {
            let (s, core) = Solution::new().with_project("Core", Language::CSharp);
            let (s, lib) = s.with_project("Lib", Language::CSharp);
            let (s, app) = s.with_project("App", Language::CSharp);
            let s = s.with_project_reference(app, lib).unwrap();
            let s = s.with_project_reference(lib, core).unwrap();
            let s = s.with_project_reference(app, lib).unwrap();

            assert_eq!(s.visible_projects(app), vec![app, lib, core]);
            assert_eq!(s.visible_projects(core), vec![core]);
            assert_eq!(s.project(app).unwrap().references(), &[lib]);
        }
    }
}
