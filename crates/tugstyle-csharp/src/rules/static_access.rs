//! Static access: `int.Parse(s)` is written `Int32.Parse(s)`.
//!
//! Candidates are member accesses qualified by a type keyword. Resolving a
//! candidate first rewrites the keyword to the canonical type name, then
//! resolves the accessed member in the rewritten snapshot. Members of
//! built-in types come from metadata, so the rename step normally leaves them
//! alone while the qualifier rewrite is kept.

use tracing::trace;

use tugstyle_core::annotation::Annotation;
use tugstyle_core::engine::{CandidateSite, EngineResult, NamingRule, RuleId, ScanOutcome};
use tugstyle_core::rewrite::{walk_node, Rewriter};
use tugstyle_core::symbols::{Symbol, SymbolKind};
use tugstyle_core::syntax::{SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};

use crate::builtins;

#[derive(Debug, Clone, Copy, Default)]
pub struct StaticAccessRule;

impl NamingRule for StaticAccessRule {
    fn id(&self) -> RuleId {
        RuleId::StaticAccess
    }

    fn scan(&self, root: &SyntaxNode, marker: &Annotation) -> ScanOutcome {
        let mut scanner = StaticAccessScanner { marker, count: 0 };
        let root = scanner.rewrite_node(root);
        ScanOutcome {
            root,
            count: scanner.count,
        }
    }

    fn resolve(&self, site: &mut CandidateSite<'_>) -> EngineResult<Symbol> {
        let Some(qualifier) = site.candidate().child_node_at(0) else {
            return Err(site.unresolved());
        };
        if let Some(replacement) = canonical_qualifier(qualifier.node()) {
            trace!(
                document = %site.document(),
                index = site.index(),
                keyword = %qualifier.node().token_text(),
                "canonicalizing qualifier"
            );
            site.replace(qualifier.path(), replacement.into())?;
        }

        if let Some(member) = site.model().symbol_info(site.candidate()) {
            return Ok(member);
        }
        site.candidate()
            .child_node_at(0)
            .and_then(|q| site.model().symbol_info(&q))
            .ok_or_else(|| site.unresolved())
    }

    fn desired_name(&self, symbol: &Symbol) -> String {
        desired_static_name(symbol)
    }
}

/// Tags keyword-qualified member accesses, innermost first.
struct StaticAccessScanner<'a> {
    marker: &'a Annotation,
    count: usize,
}

impl Rewriter for StaticAccessScanner<'_> {
    fn rewrite_node(&mut self, node: &SyntaxNode) -> SyntaxNode {
        let node = walk_node(self, node);
        if is_keyword_qualified_access(&node) {
            self.count += 1;
            node.with_annotation(self.marker.clone())
        } else {
            node
        }
    }
}

fn is_keyword_qualified_access(node: &SyntaxNode) -> bool {
    if node.kind() != SyntaxKind::SimpleMemberAccessExpression {
        return false;
    }
    let children = node.children();
    let qualified = children
        .first()
        .and_then(SyntaxElement::as_node)
        .is_some_and(|q| q.kind() == SyntaxKind::PredefinedType);
    let dotted = children
        .get(1)
        .and_then(SyntaxElement::as_token)
        .is_some_and(|t| t.kind() == SyntaxKind::Punctuation && t.text() == ".");
    qualified && dotted
}

/// `IdentifierName` spelling the canonical type for a keyword qualifier.
///
/// Trivia around the keyword moves onto the new identifier.
fn canonical_qualifier(qualifier: &SyntaxNode) -> Option<SyntaxNode> {
    if qualifier.kind() != SyntaxKind::PredefinedType {
        return None;
    }
    let keyword = qualifier.child_tokens().next()?;
    let canonical = builtins::canonical_name(keyword.text())?;
    let token = SyntaxToken::with_trivia(
        SyntaxKind::Identifier,
        keyword.leading_trivia(),
        canonical,
        keyword.trailing_trivia(),
    );
    Some(SyntaxNode::new(SyntaxKind::IdentifierName, vec![token.into()]))
}

/// The name a statically accessed symbol should have.
///
/// A named type spelled with a lower-case first letter takes the name of its
/// containing type. Everything else keeps its name, as does a type whose
/// containing type has a blank name.
pub fn desired_static_name(symbol: &Symbol) -> String {
    let lower_type = symbol.kind() == SymbolKind::NamedType
        && symbol.name().chars().next().is_some_and(char::is_lowercase);
    if lower_type {
        if let Some(containing) = symbol.containing_type() {
            if !containing.name().trim().is_empty() {
                return containing.name().to_string();
            }
        }
    }
    symbol.name().to_string()
}
