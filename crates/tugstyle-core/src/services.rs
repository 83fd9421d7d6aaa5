//! Language services: the semantic collaborators of the rename engine.
//!
//! The engine never parses or binds code itself. It asks a [`LanguageServices`]
//! implementation for a [`SemanticModel`] of one document in one snapshot and
//! for global renames. Both calls are synchronous and take a
//! [`CancellationToken`] that implementations check at their own suspension
//! points.
//!
//! # Snapshot Discipline
//!
//! A semantic model is bound to the snapshot it was created from. After any
//! new snapshot is produced (a rename, a qualifier rewrite), callers must
//! request a fresh model; `NodeRef`s obtained from the old model's root are
//! not meaningful in the new one.

use crate::annotation::AnnotationKind;
use crate::error::ServiceError;
use crate::solution::{DocumentId, Language, Solution};
use crate::symbols::Symbol;
use crate::syntax::{NodeRef, SyntaxNode};

// ============================================================================
// Cancellation
// ============================================================================

/// Cooperative cancellation shared between a caller and a running rename.
///
/// Wraps the tokio-util token, whose `cancel` and `is_cancelled` need no
/// runtime. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: tokio_util::sync::CancellationToken,
}

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// `Err(ServiceError::Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<(), ServiceError> {
        if self.is_cancelled() {
            Err(ServiceError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// A token cancelled with this one, but cancellable on its own too.
    pub fn child_token(&self) -> Self {
        CancellationToken {
            inner: self.inner.child_token(),
        }
    }
}

impl From<tokio_util::sync::CancellationToken> for CancellationToken {
    fn from(inner: tokio_util::sync::CancellationToken) -> Self {
        CancellationToken { inner }
    }
}

// ============================================================================
// Collaborator Traits
// ============================================================================

/// Semantic view of one document in one snapshot.
pub trait SemanticModel {
    /// The document this model describes.
    fn document(&self) -> DocumentId;

    /// The syntax root the model was built from.
    fn root(&self) -> &SyntaxNode;

    /// The symbol declared by `node` (a method, type, field ... declaration).
    fn declared_symbol(&self, node: &NodeRef) -> Option<Symbol>;

    /// The symbol `node` refers to (a reference site such as a name or member access).
    fn symbol_info(&self, node: &NodeRef) -> Option<Symbol>;
}

/// Parser, binder and rename service for one language.
pub trait LanguageServices: Send + Sync {
    /// The language served.
    fn language(&self) -> Language;

    /// Annotation kind left on every token rewritten by [`rename_symbol`].
    ///
    /// [`rename_symbol`]: LanguageServices::rename_symbol
    fn rename_tracking_kind(&self) -> AnnotationKind;

    /// Build the semantic model of `document` in `solution`.
    ///
    /// # Errors
    ///
    /// `DocumentNotFound` if the document is not in the snapshot, `Cancelled`
    /// if `cancel` fires while binding.
    fn semantic_model(
        &self,
        solution: &Solution,
        document: DocumentId,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn SemanticModel>, ServiceError>;

    /// Rename `symbol` and every reference to it across all documents.
    ///
    /// # Arguments
    ///
    /// * `solution` - Snapshot the symbol was resolved in
    /// * `symbol` - Symbol to rename
    /// * `new_name` - Replacement identifier
    /// * `cancel` - Checked before any document is rewritten
    ///
    /// # Returns
    ///
    /// A new snapshot in which every rewritten token carries an annotation of
    /// [`rename_tracking_kind`](LanguageServices::rename_tracking_kind).
    fn rename_symbol(
        &self,
        solution: &Solution,
        symbol: &Symbol,
        new_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Solution, ServiceError>;
}
