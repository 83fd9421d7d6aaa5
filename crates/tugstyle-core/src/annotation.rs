//! Syntax annotations: opaque tags that survive tree rewrites.
//!
//! Syntax trees are immutable and nodes have no identity across edits, so the
//! only reliable way to address "the same location" in a later snapshot is to
//! tag it and re-query the new root. An [`Annotation`] is such a tag: a
//! category ([`AnnotationKind`]) plus a process-unique id. It carries no
//! payload.
//!
//! The [`AnnotationContext`] bundles the two identities the rename protocol
//! depends on (the candidate marker and the rename service's tracking kind)
//! and is passed explicitly to the scanner, the engine loop and the cleaner.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Kind name used for rename-candidate markers.
pub const RENAME_CANDIDATE_KIND: &str = "tugstyle.rename-candidate";

static NEXT_ANNOTATION_ID: AtomicU64 = AtomicU64::new(1);

/// Category of an annotation.
///
/// Kinds compare by name. Clones share the same allocation.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnnotationKind(Arc<str>);

impl AnnotationKind {
    /// Create a kind with the given name.
    pub fn new(name: &str) -> Self {
        AnnotationKind(Arc::from(name))
    }

    /// The kind name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnnotationKind({})", self.0)
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tag attachable to a syntax node or token.
///
/// Two annotations are equal only if they were produced by the same call to
/// [`Annotation::new`] (or are clones of it).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Annotation {
    kind: AnnotationKind,
    id: u64,
}

impl Annotation {
    /// Create a fresh annotation of the given kind.
    pub fn new(kind: AnnotationKind) -> Self {
        let id = NEXT_ANNOTATION_ID.fetch_add(1, Ordering::Relaxed);
        Annotation { kind, id }
    }

    /// The annotation's kind.
    pub fn kind(&self) -> &AnnotationKind {
        &self.kind
    }

    /// The process-unique id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether this annotation is of the given kind.
    pub fn is_kind(&self, kind: &AnnotationKind) -> bool {
        &self.kind == kind
    }
}

/// Annotation identities shared by scanner, engine loop and cleaner.
#[derive(Debug, Clone)]
pub struct AnnotationContext {
    marker: Annotation,
    rename_tracking: AnnotationKind,
}

impl AnnotationContext {
    /// Build a context with a fresh candidate marker.
    ///
    /// `rename_tracking` is the kind the rename service leaves on every token
    /// it rewrites.
    pub fn new(rename_tracking: AnnotationKind) -> Self {
        AnnotationContext {
            marker: Annotation::new(AnnotationKind::new(RENAME_CANDIDATE_KIND)),
            rename_tracking,
        }
    }

    /// The candidate marker.
    pub fn marker(&self) -> &Annotation {
        &self.marker
    }

    /// The rename service's tracking kind.
    pub fn rename_tracking(&self) -> &AnnotationKind {
        &self.rename_tracking
    }
}
