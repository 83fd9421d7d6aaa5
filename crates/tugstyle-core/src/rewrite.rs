//! Bottom-up tree rewriting and annotation cleanup.
//!
//! A [`Rewriter`] receives every node and token of a tree and returns a
//! (possibly new) replacement. [`walk_node`] rebuilds a node from its rewritten
//! children and keeps the original handle when no child changed, so rewriting
//! an unaffected subtree costs no allocation and preserves pointer identity.

use crate::annotation::{Annotation, AnnotationKind};
use crate::syntax::{SyntaxElement, SyntaxNode, SyntaxToken};

/// A bottom-up tree transformation.
pub trait Rewriter {
    /// Rewrite a node. The default rewrites the children and rebuilds.
    fn rewrite_node(&mut self, node: &SyntaxNode) -> SyntaxNode {
        walk_node(self, node)
    }

    /// Rewrite a token. The default returns it unchanged.
    fn rewrite_token(&mut self, token: &SyntaxToken) -> SyntaxToken {
        token.clone()
    }
}

/// Rewrite the children of `node` and rebuild it if any child changed.
pub fn walk_node<R: Rewriter + ?Sized>(rewriter: &mut R, node: &SyntaxNode) -> SyntaxNode {
    let mut changed = false;
    let children: Vec<SyntaxElement> = node
        .children()
        .iter()
        .map(|child| {
            let rewritten = match child {
                SyntaxElement::Node(n) => SyntaxElement::Node(rewriter.rewrite_node(n)),
                SyntaxElement::Token(t) => SyntaxElement::Token(rewriter.rewrite_token(t)),
            };
            if !rewritten.ptr_eq(child) {
                changed = true;
            }
            rewritten
        })
        .collect();

    if changed {
        node.with_children(children)
    } else {
        node.clone()
    }
}

/// Which annotations a cleaner removes.
#[derive(Debug, Clone)]
enum Target {
    Kind(AnnotationKind),
    Exact(Annotation),
}

/// Strips annotations from every node and token of a tree.
///
/// Total and idempotent: cleaning never fails, and cleaning a clean tree
/// returns the same handle.
#[derive(Debug, Clone)]
pub struct AnnotationCleaner {
    target: Target,
}

impl AnnotationCleaner {
    /// Remove every annotation of `kind`.
    pub fn for_kind(kind: AnnotationKind) -> Self {
        AnnotationCleaner {
            target: Target::Kind(kind),
        }
    }

    /// Remove one specific annotation.
    pub fn for_annotation(annotation: Annotation) -> Self {
        AnnotationCleaner {
            target: Target::Exact(annotation),
        }
    }

    /// Clean a whole tree.
    pub fn clean(&mut self, root: &SyntaxNode) -> SyntaxNode {
        self.rewrite_node(root)
    }
}

impl Rewriter for AnnotationCleaner {
    fn rewrite_node(&mut self, node: &SyntaxNode) -> SyntaxNode {
        let node = walk_node(self, node);
        match &self.target {
            Target::Kind(kind) => node.without_annotation_kind(kind),
            Target::Exact(annotation) => node.without_annotation(annotation),
        }
    }

    fn rewrite_token(&mut self, token: &SyntaxToken) -> SyntaxToken {
        match &self.target {
            Target::Kind(kind) => token.without_annotation_kind(kind),
            Target::Exact(annotation) => token.without_annotation(annotation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SyntaxKind;

    fn tracked_tree(kind: &AnnotationKind, keep: &Annotation) -> SyntaxNode {
        let renamed = SyntaxToken::new(SyntaxKind::Identifier, "Run")
            .with_annotation(Annotation::new(kind.clone()))
            .with_annotation(keep.clone());
        let name = SyntaxNode::new(SyntaxKind::IdentifierName, vec![renamed.into()])
            .with_annotation(Annotation::new(kind.clone()));
        let other = SyntaxNode::new(
            SyntaxKind::IdentifierName,
            vec![SyntaxToken::with_trivia(SyntaxKind::Identifier, " ", "x", "").into()],
        );
        SyntaxNode::new(SyntaxKind::Block, vec![name.into(), other.into()])
    }

    #[test]
    fn cleaner_removes_kind_from_nodes_and_tokens() {
        let kind = AnnotationKind::new("rename.tracking");
        let keep = Annotation::new(AnnotationKind::new("keep"));
        let root = tracked_tree(&kind, &keep);
        assert!(root.contains_annotation_kind(&kind));

        let cleaned = AnnotationCleaner::for_kind(kind.clone()).clean(&root);
        assert!(!cleaned.contains_annotation_kind(&kind));
        assert_eq!(cleaned.text(), root.text());
        let tokens = cleaned.tokens();
        assert!(tokens[0].token().has_annotation(&keep));
    }

    #[test]
    fn cleaner_is_idempotent_and_shares_clean_trees() {
        let kind = AnnotationKind::new("rename.tracking");
        let keep = Annotation::new(AnnotationKind::new("keep"));
        let root = tracked_tree(&kind, &keep);
        let mut cleaner = AnnotationCleaner::for_kind(kind);

        let once = cleaner.clean(&root);
        let twice = cleaner.clean(&once);
        assert!(twice.ptr_eq(&once));
    }

    #[test]
    fn untouched_subtrees_keep_identity() {
        let kind = AnnotationKind::new("rename.tracking");
        let keep = Annotation::new(AnnotationKind::new("keep"));
        let root = tracked_tree(&kind, &keep);
        let cleaned = AnnotationCleaner::for_kind(kind).clean(&root);
        assert!(cleaned.children()[1].ptr_eq(&root.children()[1]));
        assert!(!cleaned.children()[0].ptr_eq(&root.children()[0]));
    }

    #[test]
    fn exact_cleaner_leaves_other_annotations_of_same_kind() {
        let kind = AnnotationKind::new("marker");
        let first = Annotation::new(kind.clone());
        let second = Annotation::new(kind.clone());
        let node = SyntaxNode::new(SyntaxKind::Block, vec![])
            .with_annotation(first.clone())
            .with_annotation(second.clone());
        let cleaned = AnnotationCleaner::for_annotation(first.clone()).clean(&node);
        assert!(!cleaned.has_annotation(&first));
        assert!(cleaned.has_annotation(&second));
    }
}
