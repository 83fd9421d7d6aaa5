//! `LanguageServices` for C#.

use tracing::trace;

use tugstyle_core::annotation::AnnotationKind;
use tugstyle_core::error::{ServiceError, SolutionError};
use tugstyle_core::services::{CancellationToken, LanguageServices, SemanticModel};
use tugstyle_core::solution::{DocumentId, Language, Solution};
use tugstyle_core::symbols::Symbol;
use tugstyle_core::syntax::{NodeRef, SyntaxNode};

use crate::binder::{Compilation, DocumentBindings};
use crate::rename;

/// Annotation kind the C# rename service leaves on rewritten tokens.
pub const RENAME_TRACKING_KIND: &str = "tugstyle.csharp.rename-tracking";

/// Binder-backed semantic model of one C# document.
#[derive(Debug)]
pub struct CSharpSemanticModel {
    document: DocumentId,
    root: SyntaxNode,
    bindings: DocumentBindings,
}

impl CSharpSemanticModel {
    pub fn bindings(&self) -> &DocumentBindings {
        &self.bindings
    }
}

impl SemanticModel for CSharpSemanticModel {
    fn document(&self) -> DocumentId {
        self.document
    }

    fn root(&self) -> &SyntaxNode {
        &self.root
    }

    fn declared_symbol(&self, node: &NodeRef) -> Option<Symbol> {
        self.bindings.declared.get(node.path()).cloned()
    }

    fn symbol_info(&self, node: &NodeRef) -> Option<Symbol> {
        self.bindings.references.get(node.path()).cloned()
    }
}

/// Binding and global rename for C# documents.
#[derive(Debug, Clone)]
pub struct CSharpServices {
    tracking: AnnotationKind,
}

impl CSharpServices {
    pub fn new() -> Self {
        CSharpServices {
            tracking: AnnotationKind::new(RENAME_TRACKING_KIND),
        }
    }
}

impl Default for CSharpServices {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageServices for CSharpServices {
    fn language(&self) -> Language {
        Language::CSharp
    }

    fn rename_tracking_kind(&self) -> AnnotationKind {
        self.tracking.clone()
    }

    fn semantic_model(
        &self,
        solution: &Solution,
        document: DocumentId,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn SemanticModel>, ServiceError> {
        cancel.check()?;
        let root = solution
            .document(document)
            .ok_or(SolutionError::DocumentNotFound { document })?
            .root()
            .clone();
        let bindings = Compilation::for_document(solution, document)?.bind_document(document, cancel)?;
        trace!(%document, symbols = bindings.declared.len(), "bound document");
        Ok(Box::new(CSharpSemanticModel {
            document,
            root,
            bindings,
        }))
    }

    fn rename_symbol(
        &self,
        solution: &Solution,
        symbol: &Symbol,
        new_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Solution, ServiceError> {
        rename::rename_symbol(solution, symbol, new_name, &self.tracking, cancel)
    }
}
