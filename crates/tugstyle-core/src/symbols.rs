//! Semantic symbols resolved from syntax locations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::solution::DocumentId;
use crate::text::Span;

/// Identity of a symbol within one snapshot.
///
/// Source symbols are identified by the path of their declaring identifier
/// token. Token rewrites (renames) do not change paths, so the id of a renamed
/// symbol is the same before and after the rename.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolId {
    /// Declared in source.
    Source {
        document: DocumentId,
        path: Vec<usize>,
    },
    /// Defined outside the solution (built-in types and their members).
    Metadata(String),
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolId::Source { document, path } => {
                let path: Vec<String> = path.iter().map(usize::to_string).collect();
                write!(f, "{}:{}", document, path.join("."))
            }
            SymbolId::Metadata(name) => write!(f, "metadata:{}", name),
        }
    }
}

/// Kind of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    NamedType,
    Method,
    Field,
    Property,
    Local,
    Parameter,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SymbolKind::NamedType => "named_type",
            SymbolKind::Method => "method",
            SymbolKind::Field => "field",
            SymbolKind::Property => "property",
            SymbolKind::Local => "local",
            SymbolKind::Parameter => "parameter",
        };
        f.write_str(name)
    }
}

/// Where a source symbol is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolLocation {
    pub document: DocumentId,
    pub span: Span,
}

/// A semantic entity: a declared type, member, local or parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    id: SymbolId,
    kind: SymbolKind,
    name: String,
    containing_type: Option<Box<Symbol>>,
    location: Option<SymbolLocation>,
}

impl Symbol {
    pub fn new(id: SymbolId, kind: SymbolKind, name: impl Into<String>) -> Self {
        Symbol {
            id,
            kind,
            name: name.into(),
            containing_type: None,
            location: None,
        }
    }

    /// Set the type this symbol is a member of (or nested in).
    pub fn with_containing_type(mut self, containing: Symbol) -> Self {
        self.containing_type = Some(Box::new(containing));
        self
    }

    /// Set the declaration location.
    pub fn with_location(mut self, document: DocumentId, span: Span) -> Self {
        self.location = Some(SymbolLocation { document, span });
        self
    }

    pub fn id(&self) -> &SymbolId {
        &self.id
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn containing_type(&self) -> Option<&Symbol> {
        self.containing_type.as_deref()
    }

    pub fn location(&self) -> Option<&SymbolLocation> {
        self.location.as_ref()
    }

    /// Whether the symbol is defined outside the solution.
    pub fn is_metadata(&self) -> bool {
        matches!(self.id, SymbolId::Metadata(_))
    }

    /// Dotted name including containing types.
    pub fn qualified_name(&self) -> String {
        match &self.containing_type {
            Some(containing) => format!("{}.{}", containing.qualified_name(), self.name),
            None => self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_name_walks_containing_types() {
        let outer = Symbol::new(SymbolId::Metadata("Outer".into()), SymbolKind::NamedType, "Outer");
        let inner = Symbol::new(SymbolId::Metadata("Outer.Inner".into()), SymbolKind::NamedType, "Inner")
            .with_containing_type(outer);
        let method = Symbol::new(SymbolId::Metadata("Outer.Inner.Run".into()), SymbolKind::Method, "Run")
            .with_containing_type(inner);
        assert_eq!(method.qualified_name(), "Outer.Inner.Run");
        assert_eq!(method.containing_type().unwrap().name(), "Inner");
        assert!(method.is_metadata());
    }

    #[test]
    fn source_ids_display_document_and_path() {
        let id = SymbolId::Source {
            document: DocumentId(3),
            path: vec![1, 4, 2],
        };
        assert_eq!(id.to_string(), "doc_3:1.4.2");
        assert_eq!(SymbolId::Metadata("System.Int32".into()).to_string(), "metadata:System.Int32");
    }

    #[test]
    fn location_is_recorded() {
        let symbol = Symbol::new(
            SymbolId::Source { document: DocumentId(0), path: vec![0] },
            SymbolKind::Method,
            "run",
        )
        .with_location(DocumentId(0), Span::new(10, 13));
        assert!(!symbol.is_metadata());
        assert_eq!(symbol.location().unwrap().span, Span::new(10, 13));
        assert_eq!(symbol.kind().to_string(), "method");
    }
}
