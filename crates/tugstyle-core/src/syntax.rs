//! Immutable, structurally shared syntax trees.
//!
//! A tree is made of [`SyntaxNode`]s and [`SyntaxToken`]s, both cheap `Arc`
//! handles. Nothing is ever mutated in place: attaching an annotation,
//! replacing a token or swapping a subtree produces a new root that shares
//! every untouched subtree with the old one.
//!
//! Trees are lossless. Whitespace and comments are stored as token trivia, so
//! [`SyntaxNode::text`] reproduces the source exactly.
//!
//! # Addressing
//!
//! Nodes do not know their parent or position. Traversal helpers return
//! [`NodeRef`] / [`TokenRef`] values carrying the child-index path from the
//! root and the byte offset, which is enough to re-find and replace the element
//! in the *same* root. Paths are not stable across structural edits; use
//! annotations to track a location across snapshots.

use std::fmt;
use std::sync::Arc;

use crate::annotation::{Annotation, AnnotationKind};
use crate::text::Span;

// ============================================================================
// Syntax Kinds
// ============================================================================

/// Node and token kinds shared by the curly-brace languages the platform parses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SyntaxKind {
    // Tokens
    Identifier,
    Keyword,
    IntegerLiteral,
    RealLiteral,
    StringLiteral,
    CharLiteral,
    Punctuation,
    /// Placeholder for a token the parser expected but did not find (zero width).
    Missing,
    /// Source text the lexer could not classify.
    Unknown,
    EndOfFile,

    // Declarations
    CompilationUnit,
    UsingDirective,
    NamespaceDeclaration,
    ClassDeclaration,
    StructDeclaration,
    InterfaceDeclaration,
    EnumDeclaration,
    EnumMemberDeclaration,
    BaseList,
    TypeParameterList,
    TypeParameterConstraintClause,
    MethodDeclaration,
    ConstructorDeclaration,
    FieldDeclaration,
    PropertyDeclaration,
    AccessorList,
    ParameterList,
    Parameter,
    VariableDeclarator,

    // Types
    QualifiedName,
    /// `Name<T, ...>`: an identifier followed by a `TypeArgumentList`.
    GenericName,
    TypeArgumentList,
    ArrayType,

    // Statements
    Block,
    LocalDeclarationStatement,
    ExpressionStatement,
    ReturnStatement,
    IfStatement,
    ElseClause,
    WhileStatement,
    EmptyStatement,

    // Expressions
    IdentifierName,
    PredefinedType,
    SimpleMemberAccessExpression,
    InvocationExpression,
    ArgumentList,
    Argument,
    ObjectCreationExpression,
    AssignmentExpression,
    BinaryExpression,
    PrefixUnaryExpression,
    PostfixUnaryExpression,
    ParenthesizedExpression,
    LiteralExpression,
    ThisExpression,

    /// Unparseable input kept verbatim.
    Error,
}

impl SyntaxKind {
    /// Whether this kind is a token kind.
    pub fn is_token(self) -> bool {
        matches!(
            self,
            SyntaxKind::Identifier
                | SyntaxKind::Keyword
                | SyntaxKind::IntegerLiteral
                | SyntaxKind::RealLiteral
                | SyntaxKind::StringLiteral
                | SyntaxKind::CharLiteral
                | SyntaxKind::Punctuation
                | SyntaxKind::Missing
                | SyntaxKind::Unknown
                | SyntaxKind::EndOfFile
        )
    }
}

// ============================================================================
// Tokens
// ============================================================================

#[derive(PartialEq, Eq)]
struct TokenData {
    kind: SyntaxKind,
    leading: String,
    text: String,
    trailing: String,
    annotations: Vec<Annotation>,
}

/// A leaf of the tree: token text plus surrounding trivia.
#[derive(Clone, PartialEq, Eq)]
pub struct SyntaxToken(Arc<TokenData>);

impl SyntaxToken {
    /// Create a token without trivia.
    pub fn new(kind: SyntaxKind, text: impl Into<String>) -> Self {
        SyntaxToken::with_trivia(kind, "", text, "")
    }

    /// Create a token with leading and trailing trivia.
    pub fn with_trivia(
        kind: SyntaxKind,
        leading: impl Into<String>,
        text: impl Into<String>,
        trailing: impl Into<String>,
    ) -> Self {
        SyntaxToken(Arc::new(TokenData {
            kind,
            leading: leading.into(),
            text: text.into(),
            trailing: trailing.into(),
            annotations: Vec::new(),
        }))
    }

    pub fn kind(&self) -> SyntaxKind {
        self.0.kind
    }

    pub fn text(&self) -> &str {
        &self.0.text
    }

    pub fn leading_trivia(&self) -> &str {
        &self.0.leading
    }

    pub fn trailing_trivia(&self) -> &str {
        &self.0.trailing
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.0.annotations
    }

    /// Width including trivia.
    pub fn full_width(&self) -> usize {
        self.0.leading.len() + self.0.text.len() + self.0.trailing.len()
    }

    pub fn has_annotation(&self, annotation: &Annotation) -> bool {
        self.0.annotations.contains(annotation)
    }

    pub fn has_annotation_kind(&self, kind: &AnnotationKind) -> bool {
        self.0.annotations.iter().any(|a| a.is_kind(kind))
    }

    /// Return a copy of this token carrying `annotation`.
    pub fn with_annotation(&self, annotation: Annotation) -> Self {
        if self.has_annotation(&annotation) {
            return self.clone();
        }
        let mut annotations = self.0.annotations.clone();
        annotations.push(annotation);
        self.rebuild(self.0.text.clone(), annotations)
    }

    /// Return a copy of this token without annotations of `kind`.
    ///
    /// Returns the same handle if there is nothing to remove.
    pub fn without_annotation_kind(&self, kind: &AnnotationKind) -> Self {
        if !self.has_annotation_kind(kind) {
            return self.clone();
        }
        let annotations = self
            .0
            .annotations
            .iter()
            .filter(|a| !a.is_kind(kind))
            .cloned()
            .collect();
        self.rebuild(self.0.text.clone(), annotations)
    }

    /// Return a copy of this token without one specific annotation.
    pub fn without_annotation(&self, annotation: &Annotation) -> Self {
        if !self.has_annotation(annotation) {
            return self.clone();
        }
        let annotations = self
            .0
            .annotations
            .iter()
            .filter(|a| *a != annotation)
            .cloned()
            .collect();
        self.rebuild(self.0.text.clone(), annotations)
    }

    /// Return a copy with new text, keeping kind, trivia and annotations.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        self.rebuild(text.into(), self.0.annotations.clone())
    }

    /// Whether both handles point at the same token.
    pub fn ptr_eq(&self, other: &SyntaxToken) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn rebuild(&self, text: String, annotations: Vec<Annotation>) -> Self {
        SyntaxToken(Arc::new(TokenData {
            kind: self.0.kind,
            leading: self.0.leading.clone(),
            text,
            trailing: self.0.trailing.clone(),
            annotations,
        }))
    }

    fn write_to(&self, out: &mut String) {
        out.push_str(&self.0.leading);
        out.push_str(&self.0.text);
        out.push_str(&self.0.trailing);
    }
}

impl fmt::Debug for SyntaxToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?})", self.0.kind, self.0.text)
    }
}

// ============================================================================
// Nodes
// ============================================================================

#[derive(PartialEq, Eq)]
struct NodeData {
    kind: SyntaxKind,
    children: Vec<SyntaxElement>,
    annotations: Vec<Annotation>,
    full_width: usize,
}

/// An interior node of the tree.
#[derive(Clone, PartialEq, Eq)]
pub struct SyntaxNode(Arc<NodeData>);

/// Either a node or a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxElement {
    Node(SyntaxNode),
    Token(SyntaxToken),
}

impl SyntaxElement {
    pub fn kind(&self) -> SyntaxKind {
        match self {
            SyntaxElement::Node(node) => node.kind(),
            SyntaxElement::Token(token) => token.kind(),
        }
    }

    pub fn full_width(&self) -> usize {
        match self {
            SyntaxElement::Node(node) => node.full_width(),
            SyntaxElement::Token(token) => token.full_width(),
        }
    }

    pub fn as_node(&self) -> Option<&SyntaxNode> {
        match self {
            SyntaxElement::Node(node) => Some(node),
            SyntaxElement::Token(_) => None,
        }
    }

    pub fn as_token(&self) -> Option<&SyntaxToken> {
        match self {
            SyntaxElement::Token(token) => Some(token),
            SyntaxElement::Node(_) => None,
        }
    }

    /// Whether both elements are the same handle.
    pub fn ptr_eq(&self, other: &SyntaxElement) -> bool {
        match (self, other) {
            (SyntaxElement::Node(a), SyntaxElement::Node(b)) => a.ptr_eq(b),
            (SyntaxElement::Token(a), SyntaxElement::Token(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    fn write_to(&self, out: &mut String) {
        match self {
            SyntaxElement::Node(node) => node.write_to(out),
            SyntaxElement::Token(token) => token.write_to(out),
        }
    }
}

impl From<SyntaxNode> for SyntaxElement {
    fn from(node: SyntaxNode) -> Self {
        SyntaxElement::Node(node)
    }
}

impl From<SyntaxToken> for SyntaxElement {
    fn from(token: SyntaxToken) -> Self {
        SyntaxElement::Token(token)
    }
}

impl SyntaxNode {
    /// Create a node from its children.
    pub fn new(kind: SyntaxKind, children: Vec<SyntaxElement>) -> Self {
        SyntaxNode::build(kind, children, Vec::new())
    }

    fn build(kind: SyntaxKind, children: Vec<SyntaxElement>, annotations: Vec<Annotation>) -> Self {
        let full_width = children.iter().map(SyntaxElement::full_width).sum();
        SyntaxNode(Arc::new(NodeData {
            kind,
            children,
            annotations,
            full_width,
        }))
    }

    pub fn kind(&self) -> SyntaxKind {
        self.0.kind
    }

    pub fn children(&self) -> &[SyntaxElement] {
        &self.0.children
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.0.annotations
    }

    /// Width including all trivia.
    pub fn full_width(&self) -> usize {
        self.0.full_width
    }

    /// Direct child nodes.
    pub fn child_nodes(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.0.children.iter().filter_map(SyntaxElement::as_node)
    }

    /// Direct child tokens.
    pub fn child_tokens(&self) -> impl Iterator<Item = &SyntaxToken> {
        self.0.children.iter().filter_map(SyntaxElement::as_token)
    }

    /// First direct child token of the given kind.
    pub fn child_token(&self, kind: SyntaxKind) -> Option<&SyntaxToken> {
        self.child_tokens().find(|t| t.kind() == kind)
    }

    /// First direct child node of the given kind.
    pub fn child_node(&self, kind: SyntaxKind) -> Option<&SyntaxNode> {
        self.child_nodes().find(|n| n.kind() == kind)
    }

    /// First token in the subtree, in source order.
    pub fn first_token(&self) -> Option<SyntaxToken> {
        self.0.children.iter().find_map(|child| match child {
            SyntaxElement::Token(token) => Some(token.clone()),
            SyntaxElement::Node(node) => node.first_token(),
        })
    }

    /// Full source text of the subtree, trivia included.
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.full_width());
        self.write_to(&mut out);
        out
    }

    /// Text of all tokens with trivia dropped and no separator.
    pub fn token_text(&self) -> String {
        let mut out = String::new();
        for token in self.tokens() {
            out.push_str(token.token.text());
        }
        out
    }

    fn write_to(&self, out: &mut String) {
        for child in &self.0.children {
            child.write_to(out);
        }
    }

    pub fn has_annotation(&self, annotation: &Annotation) -> bool {
        self.0.annotations.contains(annotation)
    }

    pub fn has_annotation_kind(&self, kind: &AnnotationKind) -> bool {
        self.0.annotations.iter().any(|a| a.is_kind(kind))
    }

    /// Return a copy of this node carrying `annotation`.
    pub fn with_annotation(&self, annotation: Annotation) -> Self {
        if self.has_annotation(&annotation) {
            return self.clone();
        }
        let mut annotations = self.0.annotations.clone();
        annotations.push(annotation);
        SyntaxNode::build(self.0.kind, self.0.children.clone(), annotations)
    }

    /// Return a copy of this node (not its descendants) without annotations of `kind`.
    ///
    /// Returns the same handle if there is nothing to remove.
    pub fn without_annotation_kind(&self, kind: &AnnotationKind) -> Self {
        if !self.has_annotation_kind(kind) {
            return self.clone();
        }
        let annotations = self
            .0
            .annotations
            .iter()
            .filter(|a| !a.is_kind(kind))
            .cloned()
            .collect();
        SyntaxNode::build(self.0.kind, self.0.children.clone(), annotations)
    }

    /// Return a copy of this node (not its descendants) without one specific annotation.
    pub fn without_annotation(&self, annotation: &Annotation) -> Self {
        if !self.has_annotation(annotation) {
            return self.clone();
        }
        let annotations = self
            .0
            .annotations
            .iter()
            .filter(|a| *a != annotation)
            .cloned()
            .collect();
        SyntaxNode::build(self.0.kind, self.0.children.clone(), annotations)
    }

    /// Return a node of the same kind and annotations with new children.
    pub fn with_children(&self, children: Vec<SyntaxElement>) -> Self {
        SyntaxNode::build(self.0.kind, children, self.0.annotations.clone())
    }

    /// Whether both handles point at the same node.
    pub fn ptr_eq(&self, other: &SyntaxNode) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// A reference to this node as the root of a traversal.
    pub fn as_root(&self) -> NodeRef {
        NodeRef {
            node: self.clone(),
            path: Vec::new(),
            offset: 0,
        }
    }

    /// All nodes of the subtree in document (pre-)order, this node first.
    pub fn descendants(&self) -> Vec<NodeRef> {
        let mut out = Vec::new();
        collect_nodes(self, &mut Vec::new(), 0, &mut out);
        out
    }

    /// All tokens of the subtree in document order.
    pub fn tokens(&self) -> Vec<TokenRef> {
        let mut out = Vec::new();
        collect_tokens(self, &mut Vec::new(), 0, &mut out);
        out
    }

    /// Nodes carrying `annotation`, in document order.
    pub fn annotated_nodes(&self, annotation: &Annotation) -> Vec<NodeRef> {
        self.descendants()
            .into_iter()
            .filter(|r| r.node.has_annotation(annotation))
            .collect()
    }

    /// Tokens carrying an annotation of `kind`, in document order.
    pub fn annotated_tokens(&self, kind: &AnnotationKind) -> Vec<TokenRef> {
        self.tokens()
            .into_iter()
            .filter(|r| r.token.has_annotation_kind(kind))
            .collect()
    }

    /// Whether any node or token in the subtree carries an annotation of `kind`.
    pub fn contains_annotation_kind(&self, kind: &AnnotationKind) -> bool {
        self.has_annotation_kind(kind)
            || self.0.children.iter().any(|child| match child {
                SyntaxElement::Node(node) => node.contains_annotation_kind(kind),
                SyntaxElement::Token(token) => token.has_annotation_kind(kind),
            })
    }

    /// The element at `path`, where each step is a child index.
    ///
    /// An empty path addresses this node.
    pub fn element_at(&self, path: &[usize]) -> Option<SyntaxElement> {
        let Some((&first, rest)) = path.split_first() else {
            return Some(SyntaxElement::Node(self.clone()));
        };
        let child = self.0.children.get(first)?;
        if rest.is_empty() {
            return Some(child.clone());
        }
        child.as_node()?.element_at(rest)
    }

    /// Replace the element at `path`, rebuilding only the spine above it.
    ///
    /// Returns `None` if the path does not exist. Replacing the empty path
    /// requires `replacement` to be a node.
    pub fn replace_at(&self, path: &[usize], replacement: SyntaxElement) -> Option<SyntaxNode> {
        let Some((&first, rest)) = path.split_first() else {
            return replacement.as_node().cloned();
        };
        let child = self.0.children.get(first)?;
        let new_child = if rest.is_empty() {
            replacement
        } else {
            SyntaxElement::Node(child.as_node()?.replace_at(rest, replacement)?)
        };
        let mut children = self.0.children.clone();
        children[first] = new_child;
        Some(self.with_children(children))
    }
}

impl fmt::Debug for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxNode")
            .field("kind", &self.0.kind)
            .field("text", &self.text())
            .field("annotations", &self.0.annotations.len())
            .finish()
    }
}

impl fmt::Display for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

fn collect_nodes(node: &SyntaxNode, path: &mut Vec<usize>, offset: usize, out: &mut Vec<NodeRef>) {
    out.push(NodeRef {
        node: node.clone(),
        path: path.clone(),
        offset,
    });
    let mut child_offset = offset;
    for (index, child) in node.children().iter().enumerate() {
        if let SyntaxElement::Node(child_node) = child {
            path.push(index);
            collect_nodes(child_node, path, child_offset, out);
            path.pop();
        }
        child_offset += child.full_width();
    }
}

fn collect_tokens(node: &SyntaxNode, path: &mut Vec<usize>, offset: usize, out: &mut Vec<TokenRef>) {
    let mut child_offset = offset;
    for (index, child) in node.children().iter().enumerate() {
        path.push(index);
        match child {
            SyntaxElement::Node(child_node) => collect_tokens(child_node, path, child_offset, out),
            SyntaxElement::Token(token) => out.push(TokenRef {
                token: token.clone(),
                path: path.clone(),
                offset: child_offset,
            }),
        }
        path.pop();
        child_offset += child.full_width();
    }
}

// ============================================================================
// Positioned References
// ============================================================================

/// A node together with its path and byte offset inside a particular root.
#[derive(Debug, Clone)]
pub struct NodeRef {
    node: SyntaxNode,
    path: Vec<usize>,
    offset: usize,
}

impl NodeRef {
    pub fn node(&self) -> &SyntaxNode {
        &self.node
    }

    pub fn kind(&self) -> SyntaxKind {
        self.node.kind()
    }

    /// Child-index path from the root.
    pub fn path(&self) -> &[usize] {
        &self.path
    }

    /// Byte offset of the node's first byte (leading trivia included).
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Span covering the node including trivia.
    pub fn full_span(&self) -> Span {
        Span::from_len(self.offset, self.node.full_width())
    }

    /// References to the direct children.
    pub fn children(&self) -> Vec<ElementRef> {
        let mut out = Vec::with_capacity(self.node.children().len());
        let mut child_offset = self.offset;
        for (index, child) in self.node.children().iter().enumerate() {
            let mut path = self.path.clone();
            path.push(index);
            out.push(match child {
                SyntaxElement::Node(node) => ElementRef::Node(NodeRef {
                    node: node.clone(),
                    path,
                    offset: child_offset,
                }),
                SyntaxElement::Token(token) => ElementRef::Token(TokenRef {
                    token: token.clone(),
                    path,
                    offset: child_offset,
                }),
            });
            child_offset += child.full_width();
        }
        out
    }

    /// References to the direct child nodes.
    pub fn child_nodes(&self) -> Vec<NodeRef> {
        self.children()
            .into_iter()
            .filter_map(ElementRef::into_node)
            .collect()
    }

    /// The `index`-th child element, if it is a node.
    pub fn child_node_at(&self, index: usize) -> Option<NodeRef> {
        self.children().into_iter().nth(index)?.into_node()
    }

    /// First direct child token of the given kind.
    pub fn child_token(&self, kind: SyntaxKind) -> Option<TokenRef> {
        self.children()
            .into_iter()
            .filter_map(ElementRef::into_token)
            .find(|t| t.kind() == kind)
    }
}

/// A token together with its path and byte offset inside a particular root.
#[derive(Debug, Clone)]
pub struct TokenRef {
    token: SyntaxToken,
    path: Vec<usize>,
    offset: usize,
}

impl TokenRef {
    pub fn token(&self) -> &SyntaxToken {
        &self.token
    }

    pub fn kind(&self) -> SyntaxKind {
        self.token.kind()
    }

    pub fn text(&self) -> &str {
        self.token.text()
    }

    /// Child-index path from the root.
    pub fn path(&self) -> &[usize] {
        &self.path
    }

    /// Span of the token text, trivia excluded.
    pub fn span(&self) -> Span {
        Span::from_len(
            self.offset + self.token.leading_trivia().len(),
            self.token.text().len(),
        )
    }
}

/// Either a [`NodeRef`] or a [`TokenRef`].
#[derive(Debug, Clone)]
pub enum ElementRef {
    Node(NodeRef),
    Token(TokenRef),
}

impl ElementRef {
    pub fn into_node(self) -> Option<NodeRef> {
        match self {
            ElementRef::Node(node) => Some(node),
            ElementRef::Token(_) => None,
        }
    }

    pub fn into_token(self) -> Option<TokenRef> {
        match self {
            ElementRef::Token(token) => Some(token),
            ElementRef::Node(_) => None,
        }
    }
}
