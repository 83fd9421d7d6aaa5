//! Name binding for the supported C# subset.
//!
//! Binding runs in two passes over a [`Compilation`], the C# documents of one
//! project plus every project it can see:
//!
//! 1. declaration collection: types (namespaced and nested), their members,
//!    constructors and the set of declared namespaces;
//! 2. type resolution: base types, then field, property and return types.
//!
//! [`Compilation::bind_document`] then walks one document with lexical scopes
//! and produces its [`DocumentBindings`]: declared symbols by node path,
//! referenced symbols by node path, and the identifier tokens bound to each
//! symbol (the tokens a rename rewrites).
//!
//! Overload resolution is out of scope: when several members share a name the
//! first declaration wins. Member lookup continues into base types, and a
//! type's own members hide inherited ones. Type arguments are bound but
//! generic types are not instantiated.

use std::collections::{HashMap, HashSet};

use tugstyle_core::error::{ServiceError, SolutionError};
use tugstyle_core::services::CancellationToken;
use tugstyle_core::solution::{DocumentId, Language, ProjectId, Solution};
use tugstyle_core::symbols::{Symbol, SymbolId, SymbolKind};
use tugstyle_core::syntax::{NodeRef, SyntaxKind, SyntaxNode, TokenRef};

use crate::builtins::{self, SYSTEM_NAMESPACE};

// ============================================================================
// Binding Results
// ============================================================================

/// Everything the binder learned about one document.
#[derive(Debug, Clone, Default)]
pub struct DocumentBindings {
    /// Symbols declared by declaration nodes, keyed by node path.
    pub declared: HashMap<Vec<usize>, Symbol>,
    /// Symbols referenced by name, member-access, invocation and creation nodes.
    pub references: HashMap<Vec<usize>, Symbol>,
    /// Identifier tokens bound to a symbol, in document order.
    pub tokens: Vec<(Vec<usize>, SymbolId)>,
}

impl DocumentBindings {
    /// Paths of the identifier tokens bound to `id`.
    pub fn tokens_bound_to<'a>(&'a self, id: &'a SymbolId) -> impl Iterator<Item = &'a [usize]> {
        self.tokens
            .iter()
            .filter(move |(_, bound)| bound == id)
            .map(|(path, _)| path.as_slice())
    }

    /// The symbol an identifier token at `path` is bound to.
    pub fn token_symbol(&self, path: &[usize]) -> Option<&SymbolId> {
        self.tokens
            .iter()
            .find(|(bound, _)| bound.as_slice() == path)
            .map(|(_, id)| id)
    }

    fn bind_token(&mut self, token: &TokenRef, id: &SymbolId) {
        self.tokens.push((token.path().to_vec(), id.clone()));
    }
}

// ============================================================================
// Compilation
// ============================================================================

/// A resolved type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRef {
    /// Index into the compilation's source types.
    Source(usize),
    /// Index into the built-in table.
    Builtin(usize),
    Unknown,
}

/// Lexical context of a declaration: enclosing namespace, usings in effect and
/// enclosing type.
#[derive(Debug, Clone, Default)]
struct Context {
    namespace: String,
    usings: Vec<String>,
    current_type: Option<usize>,
}

impl Context {
    fn nested_namespace(&self, name: &str) -> Context {
        Context {
            namespace: qualify(&self.namespace, name),
            usings: self.usings.clone(),
            current_type: None,
        }
    }

    fn inside(&self, type_index: usize) -> Context {
        Context {
            current_type: Some(type_index),
            ..self.clone()
        }
    }
}

#[derive(Debug)]
struct TypeDecl {
    symbol: Symbol,
    name: String,
    namespace: String,
    containing: Option<usize>,
    is_interface: bool,
    base_syntax: Vec<SyntaxNode>,
    bases: Vec<TypeRef>,
    members: Vec<MemberDecl>,
    context: Context,
}

#[derive(Debug)]
struct MemberDecl {
    symbol: Symbol,
    type_syntax: Option<SyntaxNode>,
    ty: TypeRef,
    /// Parameter count of a method.
    arity: Option<usize>,
    is_override: bool,
}

/// The C# documents visible from one project, with their declarations.
pub struct Compilation<'s> {
    solution: &'s Solution,
    types: Vec<TypeDecl>,
    type_by_node: HashMap<(DocumentId, Vec<usize>), usize>,
    member_by_node: HashMap<(DocumentId, Vec<usize>), (usize, usize)>,
    namespaces: HashSet<String>,
}

impl<'s> Compilation<'s> {
    /// Collect declarations of every C# document visible from `project`.
    pub fn new(solution: &'s Solution, project: ProjectId) -> Self {
        let mut compilation = Compilation {
            solution,
            types: Vec::new(),
            type_by_node: HashMap::new(),
            member_by_node: HashMap::new(),
            namespaces: HashSet::from([SYSTEM_NAMESPACE.to_string()]),
        };

        for project_id in solution.visible_projects(project) {
            let Some(project) = solution.project(project_id) else {
                continue;
            };
            if project.language() != Language::CSharp {
                continue;
            }
            for &document in project.documents() {
                if let Some(doc) = solution.document(document) {
                    compilation.collect_container(document, &doc.root().as_root(), &Context::default());
                }
            }
        }

        compilation.resolve_base_types();
        compilation.resolve_member_types();
        compilation
    }

    /// The compilation of the project that owns `document`.
    pub fn for_document(solution: &'s Solution, document: DocumentId) -> Result<Self, ServiceError> {
        let doc = solution
            .document(document)
            .ok_or(SolutionError::DocumentNotFound { document })?;
        Ok(Compilation::new(solution, doc.project()))
    }

    /// Bind every name in `document`.
    pub fn bind_document(
        &self,
        document: DocumentId,
        cancel: &CancellationToken,
    ) -> Result<DocumentBindings, ServiceError> {
        cancel.check()?;
        let doc = self
            .solution
            .document(document)
            .ok_or(SolutionError::DocumentNotFound { document })?;
        let mut binder = BodyBinder {
            compilation: self,
            document,
            scopes: Vec::new(),
            bindings: DocumentBindings::default(),
        };
        binder.bind_container(&doc.root().as_root(), &Context::default());
        Ok(binder.bindings)
    }

    // ------------------------------------------------------------------
    // Pass 1: declarations
    // ------------------------------------------------------------------

    fn collect_container(&mut self, document: DocumentId, node: &NodeRef, outer: &Context) {
        let mut context = outer.clone();
        for child in node.child_nodes() {
            match child.kind() {
                SyntaxKind::UsingDirective => {
                    if let Some(name) = child.node().child_nodes().next() {
                        context.usings.push(name.token_text());
                    }
                }
                SyntaxKind::NamespaceDeclaration => {
                    let name = child
                        .node()
                        .child_nodes()
                        .next()
                        .map(SyntaxNode::token_text)
                        .unwrap_or_default();
                    let inner = context.nested_namespace(&name);
                    self.declare_namespace(&inner.namespace);
                    self.collect_container(document, &child, &inner);
                }
                kind if is_type_declaration(kind) => {
                    self.collect_type(document, &child, &context);
                }
                _ => {}
            }
        }
    }

    fn declare_namespace(&mut self, namespace: &str) {
        let mut prefix = String::new();
        for part in namespace.split('.') {
            prefix = qualify(&prefix, part);
            self.namespaces.insert(prefix.clone());
        }
    }

    fn collect_type(&mut self, document: DocumentId, node: &NodeRef, context: &Context) {
        let Some(ident) = node.child_token(SyntaxKind::Identifier) else {
            return;
        };
        let mut symbol = source_symbol(document, &ident, SymbolKind::NamedType);
        if let Some(containing) = context.current_type {
            symbol = symbol.with_containing_type(self.types[containing].symbol.clone());
        }

        let index = self.types.len();
        let inner = context.inside(index);
        let base_syntax = node
            .node()
            .child_node(SyntaxKind::BaseList)
            .map(|bases| bases.child_nodes().cloned().collect())
            .unwrap_or_default();
        self.types.push(TypeDecl {
            symbol: symbol.clone(),
            name: ident.text().to_string(),
            namespace: context.namespace.clone(),
            containing: context.current_type,
            is_interface: node.kind() == SyntaxKind::InterfaceDeclaration,
            base_syntax,
            bases: Vec::new(),
            members: Vec::new(),
            context: inner.clone(),
        });
        self.type_by_node.insert((document, node.path().to_vec()), index);

        for member in node.child_nodes() {
            match member.kind() {
                kind if is_type_declaration(kind) => {
                    self.collect_type(document, &member, &inner);
                }
                SyntaxKind::MethodDeclaration | SyntaxKind::PropertyDeclaration => {
                    let kind = if member.kind() == SyntaxKind::MethodDeclaration {
                        SymbolKind::Method
                    } else {
                        SymbolKind::Property
                    };
                    let Some(ident) = member.child_token(SyntaxKind::Identifier) else {
                        continue;
                    };
                    let type_syntax = member.node().child_nodes().next().cloned();
                    self.add_member(document, &member, index, &ident, kind, type_syntax, &symbol);
                    if kind == SymbolKind::Method {
                        if let Some(decl) = self.types[index].members.last_mut() {
                            decl.arity = Some(parameter_count(member.node()));
                            decl.is_override = has_modifier(member.node(), "override");
                        }
                    }
                }
                SyntaxKind::EnumMemberDeclaration => {
                    let Some(ident) = member.child_token(SyntaxKind::Identifier) else {
                        continue;
                    };
                    self.add_member(document, &member, index, &ident, SymbolKind::Field, None, &symbol);
                    if let Some(decl) = self.types[index].members.last_mut() {
                        decl.ty = TypeRef::Source(index);
                    }
                }
                SyntaxKind::FieldDeclaration => {
                    let type_syntax = member.node().child_nodes().next().cloned();
                    for declarator in member.child_nodes() {
                        if declarator.kind() != SyntaxKind::VariableDeclarator {
                            continue;
                        }
                        let Some(ident) = declarator.child_token(SyntaxKind::Identifier) else {
                            continue;
                        };
                        self.add_member(
                            document,
                            &declarator,
                            index,
                            &ident,
                            SymbolKind::Field,
                            type_syntax.clone(),
                            &symbol,
                        );
                    }
                }
                _ => {}
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn add_member(
        &mut self,
        document: DocumentId,
        declaration: &NodeRef,
        type_index: usize,
        ident: &TokenRef,
        kind: SymbolKind,
        type_syntax: Option<SyntaxNode>,
        containing: &Symbol,
    ) {
        let symbol = source_symbol(document, ident, kind).with_containing_type(containing.clone());
        let members = &mut self.types[type_index].members;
        self.member_by_node.insert(
            (document, declaration.path().to_vec()),
            (type_index, members.len()),
        );
        members.push(MemberDecl {
            symbol,
            type_syntax,
            ty: TypeRef::Unknown,
            arity: None,
            is_override: false,
        });
    }

    // ------------------------------------------------------------------
    // Pass 2: base and member types
    // ------------------------------------------------------------------

    fn resolve_base_types(&mut self) {
        let resolved: Vec<Vec<TypeRef>> = self
            .types
            .iter()
            .map(|decl| {
                decl.base_syntax
                    .iter()
                    .map(|syntax| self.resolve_type(&syntax.as_root(), &decl.context, &mut |_, _| {}))
                    .collect()
            })
            .collect();
        for (decl, bases) in self.types.iter_mut().zip(resolved) {
            decl.bases = bases;
        }
    }

    fn resolve_member_types(&mut self) {
        let mut resolved = Vec::new();
        for (type_index, decl) in self.types.iter().enumerate() {
            for (member_index, member) in decl.members.iter().enumerate() {
                if let Some(syntax) = &member.type_syntax {
                    let ty = self.resolve_type(&syntax.as_root(), &decl.context, &mut |_, _| {});
                    resolved.push((type_index, member_index, ty));
                }
            }
        }
        for (type_index, member_index, ty) in resolved {
            self.types[type_index].members[member_index].ty = ty;
        }
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    fn type_symbol(&self, ty: TypeRef) -> Option<Symbol> {
        match ty {
            TypeRef::Source(index) => Some(self.types[index].symbol.clone()),
            TypeRef::Builtin(index) => Some(builtins::type_symbol(index)),
            TypeRef::Unknown => None,
        }
    }

    fn nested_type(&self, owner: usize, name: &str) -> Option<usize> {
        self.types
            .iter()
            .position(|t| t.containing == Some(owner) && t.name == name)
    }

    fn namespace_type(&self, namespace: &str, name: &str) -> Option<TypeRef> {
        if let Some(index) = self
            .types
            .iter()
            .position(|t| t.containing.is_none() && t.namespace == namespace && t.name == name)
        {
            return Some(TypeRef::Source(index));
        }
        if namespace == SYSTEM_NAMESPACE {
            return builtins::by_name(name).map(TypeRef::Builtin);
        }
        None
    }

    /// Resolve a simple type name: enclosing types outward, then the namespace
    /// chain, then usings, then built-in names.
    fn lookup_type(&self, name: &str, context: &Context) -> Option<TypeRef> {
        let mut current = context.current_type;
        while let Some(index) = current {
            if let Some(nested) = self.nested_type(index, name) {
                return Some(TypeRef::Source(nested));
            }
            current = self.types[index].containing;
        }

        let mut namespace = context.namespace.as_str();
        loop {
            if let Some(ty) = self.namespace_type(namespace, name) {
                return Some(ty);
            }
            match namespace.rfind('.') {
                Some(dot) => namespace = &namespace[..dot],
                None if !namespace.is_empty() => namespace = "",
                None => break,
            }
        }

        for using in &context.usings {
            if let Some(ty) = self.namespace_type(using, name) {
                return Some(ty);
            }
        }

        builtins::by_name(name).map(TypeRef::Builtin)
    }

    /// Source types `owner` derives from or implements, transitively, nearest first.
    fn base_types(&self, owner: usize) -> Vec<usize> {
        let mut seen = vec![owner];
        let mut next = 0;
        while next < seen.len() {
            for base in &self.types[seen[next]].bases {
                if let TypeRef::Source(index) = *base {
                    if !seen.contains(&index) {
                        seen.push(index);
                    }
                }
            }
            next += 1;
        }
        seen.remove(0);
        seen
    }

    /// First member named `name` of a source type, then of its base types.
    fn source_member(&self, owner: usize, name: &str) -> Option<&MemberDecl> {
        std::iter::once(owner)
            .chain(self.base_types(owner))
            .find_map(|index| self.types[index].members.iter().find(|m| m.symbol.name() == name))
    }

    fn type_of_symbol(&self, symbol: &Symbol) -> Option<usize> {
        self.types.iter().position(|t| t.symbol.id() == symbol.id())
    }

    fn member_decl(&self, owner: usize, symbol: &Symbol) -> Option<&MemberDecl> {
        self.types[owner]
            .members
            .iter()
            .find(|m| m.symbol.id() == symbol.id())
    }

    /// Methods that must keep the same name as one of `methods`: interface
    /// methods and their implementations, and overrides with what they
    /// override. Only methods not already in `methods` are returned.
    pub fn linked_methods(&self, methods: &[Symbol]) -> Vec<Symbol> {
        let mut linked: Vec<Symbol> = Vec::new();
        for (derived, decl) in self.types.iter().enumerate() {
            for base in self.base_types(derived) {
                let base_decl = &self.types[base];
                for member in decl.members.iter().filter(|m| m.arity.is_some()) {
                    let Some(inherited) = base_decl
                        .members
                        .iter()
                        .find(|m| m.arity == member.arity && m.symbol.name() == member.symbol.name())
                    else {
                        continue;
                    };
                    if !(base_decl.is_interface || member.is_override) {
                        continue;
                    }
                    let pair = [&member.symbol, &inherited.symbol];
                    if pair.iter().any(|s| in_group(methods, &linked, s)) {
                        for symbol in pair {
                            if !in_group(methods, &linked, symbol) {
                                linked.push(symbol.clone());
                            }
                        }
                    }
                }
            }
        }
        linked
    }

    /// A declaration that would clash with `symbol` once it is named
    /// `new_name`: a sibling member or nested type of that name, or the
    /// containing type itself. Methods of different arity overload and do
    /// not clash.
    pub fn member_conflict(&self, symbol: &Symbol, new_name: &str) -> Option<Symbol> {
        let owner = self.type_of_symbol(symbol.containing_type()?)?;
        let decl = &self.types[owner];
        if decl.name == new_name {
            return Some(decl.symbol.clone());
        }
        if let Some(nested) = self.nested_type(owner, new_name) {
            if self.types[nested].symbol.id() != symbol.id() {
                return Some(self.types[nested].symbol.clone());
            }
        }
        let arity = self.member_decl(owner, symbol).and_then(|m| m.arity);
        decl.members
            .iter()
            .filter(|m| m.symbol.id() != symbol.id() && m.symbol.name() == new_name)
            .find(|m| !matches!((arity, m.arity), (Some(a), Some(b)) if a != b))
            .map(|m| m.symbol.clone())
    }

    /// Look up `name` as a member of `owner`.
    fn member_of(&self, owner: &Value, name: &str) -> Resolved {
        match owner {
            Value::Namespace(namespace) => {
                if let Some(ty) = self.namespace_type(namespace, name) {
                    return self.resolved_type(ty);
                }
                let qualified = qualify(namespace, name);
                if self.namespaces.contains(&qualified) {
                    return Resolved::value(Value::Namespace(qualified));
                }
                Resolved::none()
            }
            Value::Type(TypeRef::Source(index)) => {
                if let Some(nested) = self.nested_type(*index, name) {
                    return self.resolved_type(TypeRef::Source(nested));
                }
                self.source_member_value(*index, name)
            }
            Value::Instance(TypeRef::Source(index)) => self.source_member_value(*index, name),
            Value::Type(TypeRef::Builtin(index)) | Value::Instance(TypeRef::Builtin(index)) => {
                match builtins::member(*index, name) {
                    Some((symbol, ty)) => {
                        let ty = ty.map_or(TypeRef::Unknown, TypeRef::Builtin);
                        let value = match symbol.kind() {
                            SymbolKind::Method => Value::Method(ty),
                            _ => Value::Instance(ty),
                        };
                        Resolved::symbol(symbol, value)
                    }
                    None => Resolved::none(),
                }
            }
            _ => Resolved::none(),
        }
    }

    fn source_member_value(&self, owner: usize, name: &str) -> Resolved {
        match self.source_member(owner, name) {
            Some(member) => {
                let value = match member.symbol.kind() {
                    SymbolKind::Method => Value::Method(member.ty),
                    _ => Value::Instance(member.ty),
                };
                Resolved::symbol(member.symbol.clone(), value)
            }
            None => Resolved::none(),
        }
    }

    fn resolved_type(&self, ty: TypeRef) -> Resolved {
        Resolved {
            symbol: self.type_symbol(ty),
            value: Value::Type(ty),
        }
    }

    /// Resolve a name in type or namespace position, reporting each resolved
    /// name node to `record`.
    fn resolve_name(
        &self,
        node: &NodeRef,
        context: &Context,
        record: &mut dyn FnMut(&NodeRef, &Symbol),
    ) -> Value {
        let resolved = match node.kind() {
            SyntaxKind::IdentifierName | SyntaxKind::GenericName => {
                self.resolve_type_arguments(node, context, record);
                let name = simple_name(node.node());
                match self.lookup_type(&name, context) {
                    Some(ty) => self.resolved_type(ty),
                    None if self.namespaces.contains(&name) => {
                        Resolved::value(Value::Namespace(name))
                    }
                    None => Resolved::none(),
                }
            }
            SyntaxKind::QualifiedName => {
                let parts = node.child_nodes();
                let (Some(left), Some(right)) = (parts.first(), parts.get(1)) else {
                    return Value::None;
                };
                let owner = self.resolve_name(left, context, record);
                self.resolve_type_arguments(right, context, record);
                let resolved = match owner {
                    Value::Namespace(_) | Value::Type(_) => {
                        self.member_of(&owner, &simple_name(right.node()))
                    }
                    _ => Resolved::none(),
                };
                if let Some(symbol) = &resolved.symbol {
                    record(right, symbol);
                }
                resolved
            }
            _ => Resolved::none(),
        };
        if let Some(symbol) = &resolved.symbol {
            record(node, symbol);
        }
        match resolved.value {
            value @ (Value::Namespace(_) | Value::Type(_)) => value,
            _ => Value::None,
        }
    }

    /// Bind the type arguments of a `GenericName`; other names have none.
    fn resolve_type_arguments(
        &self,
        node: &NodeRef,
        context: &Context,
        record: &mut dyn FnMut(&NodeRef, &Symbol),
    ) {
        if node.kind() != SyntaxKind::GenericName {
            return;
        }
        for list in node.child_nodes() {
            for argument in list.child_nodes() {
                self.resolve_type(&argument, context, record);
            }
        }
    }

    /// Resolve type syntax (predefined, named, generic, qualified or array).
    fn resolve_type(
        &self,
        node: &NodeRef,
        context: &Context,
        record: &mut dyn FnMut(&NodeRef, &Symbol),
    ) -> TypeRef {
        match node.kind() {
            SyntaxKind::PredefinedType => {
                let keyword = node.node().token_text();
                match builtins::by_keyword(&keyword) {
                    Some(index) => {
                        record(node, &builtins::type_symbol(index));
                        TypeRef::Builtin(index)
                    }
                    None => TypeRef::Unknown,
                }
            }
            SyntaxKind::IdentifierName | SyntaxKind::GenericName | SyntaxKind::QualifiedName => {
                match self.resolve_name(node, context, record) {
                    Value::Type(ty) => ty,
                    _ => TypeRef::Unknown,
                }
            }
            SyntaxKind::ArrayType => {
                if let Some(element) = node.child_nodes().first() {
                    self.resolve_type(element, context, record);
                }
                TypeRef::Unknown
            }
            _ => TypeRef::Unknown,
        }
    }
}

// ============================================================================
// Expression Values
// ============================================================================

/// What an expression denotes, as far as member lookup is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    None,
    Namespace(String),
    Type(TypeRef),
    Instance(TypeRef),
    /// A method group; invoking it yields an instance of the return type.
    Method(TypeRef),
}

#[derive(Debug)]
struct Resolved {
    symbol: Option<Symbol>,
    value: Value,
}

impl Resolved {
    fn none() -> Self {
        Resolved {
            symbol: None,
            value: Value::None,
        }
    }

    fn value(value: Value) -> Self {
        Resolved {
            symbol: None,
            value,
        }
    }

    fn symbol(symbol: Symbol, value: Value) -> Self {
        Resolved {
            symbol: Some(symbol),
            value,
        }
    }
}

// ============================================================================
// Body Binding
// ============================================================================

struct Local {
    symbol: Symbol,
    ty: TypeRef,
}

struct BodyBinder<'c, 's> {
    compilation: &'c Compilation<'s>,
    document: DocumentId,
    scopes: Vec<HashMap<String, Local>>,
    bindings: DocumentBindings,
}

impl BodyBinder<'_, '_> {
    fn bind_container(&mut self, node: &NodeRef, outer: &Context) {
        let mut context = outer.clone();
        for child in node.child_nodes() {
            match child.kind() {
                SyntaxKind::UsingDirective => {
                    if let Some(name) = child.child_nodes().first() {
                        context.usings.push(name.node().token_text());
                        self.bind_name(name, &Context::default());
                    }
                }
                SyntaxKind::NamespaceDeclaration => {
                    let name = child
                        .node()
                        .child_nodes()
                        .next()
                        .map(SyntaxNode::token_text)
                        .unwrap_or_default();
                    let inner = context.nested_namespace(&name);
                    self.bind_container(&child, &inner);
                }
                kind if is_type_declaration(kind) => {
                    self.bind_type_declaration(&child, &context);
                }
                _ => {}
            }
        }
    }

    fn bind_type_declaration(&mut self, node: &NodeRef, context: &Context) {
        let key = (self.document, node.path().to_vec());
        let Some(&index) = self.compilation.type_by_node.get(&key) else {
            return;
        };
        let symbol = self.compilation.types[index].symbol.clone();
        self.declare(node, &symbol);
        let inner = context.inside(index);

        for child in node.child_nodes() {
            match child.kind() {
                kind if is_type_declaration(kind) => {
                    self.bind_type_declaration(&child, &inner);
                }
                SyntaxKind::BaseList | SyntaxKind::TypeParameterConstraintClause => {
                    for ty in child.child_nodes() {
                        self.bind_type(&ty, &inner);
                    }
                }
                SyntaxKind::TypeParameterList => {}
                SyntaxKind::EnumMemberDeclaration => {
                    self.bind_member_declaration(&child);
                    if let Some(value) = child.child_nodes().first() {
                        self.bind_expression(value, &inner);
                    }
                }
                SyntaxKind::MethodDeclaration => self.bind_method(&child, &inner),
                SyntaxKind::ConstructorDeclaration => {
                    if let Some(ident) = child.child_token(SyntaxKind::Identifier) {
                        if ident.text() == symbol.name() {
                            self.bindings.bind_token(&ident, symbol.id());
                        }
                    }
                    self.bind_callable(&child, &inner);
                }
                SyntaxKind::PropertyDeclaration => {
                    self.bind_member_declaration(&child);
                    for part in child.child_nodes() {
                        match part.kind() {
                            SyntaxKind::AccessorList => {
                                for body in part.child_nodes() {
                                    self.bind_statement(&body, &inner);
                                }
                            }
                            _ => {
                                self.bind_type(&part, &inner);
                            }
                        }
                    }
                }
                SyntaxKind::FieldDeclaration => {
                    for part in child.child_nodes() {
                        if part.kind() == SyntaxKind::VariableDeclarator {
                            self.bind_member_declaration(&part);
                            if let Some(init) = part.child_nodes().first() {
                                self.bind_expression(init, &inner);
                            }
                        } else {
                            self.bind_type(&part, &inner);
                        }
                    }
                }
                // Base types.
                _ => {
                    self.bind_type(&child, &inner);
                }
            }
        }
    }

    fn bind_member_declaration(&mut self, node: &NodeRef) {
        let key = (self.document, node.path().to_vec());
        if let Some(&(owner, index)) = self.compilation.member_by_node.get(&key) {
            let symbol = self.compilation.types[owner].members[index].symbol.clone();
            self.declare(node, &symbol);
        }
    }

    fn bind_method(&mut self, node: &NodeRef, context: &Context) {
        self.bind_member_declaration(node);
        if let Some(return_type) = node.child_nodes().first() {
            self.bind_type(return_type, context);
        }
        self.bind_callable(node, context);
    }

    /// Parameters and body of a method or constructor.
    fn bind_callable(&mut self, node: &NodeRef, context: &Context) {
        self.scopes.push(HashMap::new());
        let mut after_parameters = false;
        for child in node.child_nodes() {
            match child.kind() {
                SyntaxKind::ParameterList => {
                    for parameter in child.child_nodes() {
                        if parameter.kind() == SyntaxKind::Parameter {
                            self.bind_parameter(&parameter, context);
                        }
                    }
                    after_parameters = true;
                }
                SyntaxKind::Block => self.bind_statement(&child, context),
                SyntaxKind::TypeParameterList => {}
                SyntaxKind::TypeParameterConstraintClause => {
                    for ty in child.child_nodes() {
                        self.bind_type(&ty, context);
                    }
                }
                _ if after_parameters => {
                    self.bind_expression(&child, context);
                }
                _ => {}
            }
        }
        self.scopes.pop();
    }

    fn bind_parameter(&mut self, node: &NodeRef, context: &Context) {
        let ty = match node.child_nodes().first() {
            Some(type_syntax) => self.bind_type(type_syntax, context),
            None => TypeRef::Unknown,
        };
        if let Some(ident) = node.child_token(SyntaxKind::Identifier) {
            let symbol = source_symbol(self.document, &ident, SymbolKind::Parameter);
            self.declare(node, &symbol);
            self.define_local(ident.text(), symbol, ty);
        }
    }

    fn declare(&mut self, node: &NodeRef, symbol: &Symbol) {
        self.bindings
            .declared
            .insert(node.path().to_vec(), symbol.clone());
        if let Some(ident) = node.child_token(SyntaxKind::Identifier) {
            self.bindings.bind_token(&ident, symbol.id());
        }
    }

    fn define_local(&mut self, name: &str, symbol: Symbol, ty: TypeRef) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), Local { symbol, ty });
        }
    }

    /// Record a reference from `node` to `symbol`, binding its identifier token
    /// when `node` is a simple name.
    fn record(&mut self, node: &NodeRef, symbol: &Symbol) {
        self.bindings
            .references
            .insert(node.path().to_vec(), symbol.clone());
        if matches!(node.kind(), SyntaxKind::IdentifierName | SyntaxKind::GenericName) {
            if let Some(ident) = node.child_token(SyntaxKind::Identifier) {
                self.bindings.bind_token(&ident, symbol.id());
            }
        }
    }

    fn bind_type(&mut self, node: &NodeRef, context: &Context) -> TypeRef {
        let mut recorded = Vec::new();
        let ty = self
            .compilation
            .resolve_type(node, context, &mut |n, s| recorded.push((n.clone(), s.clone())));
        for (node, symbol) in recorded {
            self.record(&node, &symbol);
        }
        ty
    }

    fn bind_name(&mut self, node: &NodeRef, context: &Context) -> Value {
        let mut recorded = Vec::new();
        let value = self
            .compilation
            .resolve_name(node, context, &mut |n, s| recorded.push((n.clone(), s.clone())));
        for (node, symbol) in recorded {
            self.record(&node, &symbol);
        }
        value
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn bind_statement(&mut self, node: &NodeRef, context: &Context) {
        match node.kind() {
            SyntaxKind::Block => {
                self.scopes.push(HashMap::new());
                for child in node.child_nodes() {
                    self.bind_statement(&child, context);
                }
                self.scopes.pop();
            }
            SyntaxKind::LocalDeclarationStatement => self.bind_local_declaration(node, context),
            SyntaxKind::ExpressionStatement
            | SyntaxKind::ReturnStatement
            | SyntaxKind::IfStatement
            | SyntaxKind::ElseClause
            | SyntaxKind::WhileStatement => {
                for child in node.child_nodes() {
                    if is_statement(child.kind()) {
                        self.bind_statement(&child, context);
                    } else {
                        self.bind_expression(&child, context);
                    }
                }
            }
            _ => {}
        }
    }

    fn bind_local_declaration(&mut self, node: &NodeRef, context: &Context) {
        let children = node.child_nodes();
        let Some((type_syntax, declarators)) = children.split_first() else {
            return;
        };
        let implicit = type_syntax.kind() == SyntaxKind::IdentifierName
            && type_syntax.node().token_text() == "var"
            && self.compilation.lookup_type("var", context).is_none();
        let declared_ty = if implicit {
            None
        } else {
            Some(self.bind_type(type_syntax, context))
        };

        for declarator in declarators {
            let initializer = declarator
                .child_nodes()
                .first()
                .map(|init| self.bind_expression(init, context));
            let ty = declared_ty.unwrap_or(match initializer {
                Some(Value::Instance(ty)) => ty,
                _ => TypeRef::Unknown,
            });
            if let Some(ident) = declarator.child_token(SyntaxKind::Identifier) {
                let symbol = source_symbol(self.document, &ident, SymbolKind::Local);
                self.declare(declarator, &symbol);
                self.define_local(ident.text(), symbol, ty);
            }
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn bind_expression(&mut self, node: &NodeRef, context: &Context) -> Value {
        let children = node.child_nodes();
        match node.kind() {
            SyntaxKind::IdentifierName => {
                let resolved = self.lookup_identifier(&node.node().token_text(), context);
                if let Some(symbol) = &resolved.symbol {
                    self.record(node, symbol);
                }
                resolved.value
            }
            SyntaxKind::PredefinedType | SyntaxKind::QualifiedName => {
                Value::Type(self.bind_type(node, context))
            }
            SyntaxKind::SimpleMemberAccessExpression => {
                let (Some(target), Some(name)) = (children.first(), children.get(1)) else {
                    return Value::None;
                };
                let owner = self.bind_expression(target, context);
                let resolved = self
                    .compilation
                    .member_of(&owner, &name.node().token_text());
                if let Some(symbol) = &resolved.symbol {
                    self.record(node, symbol);
                    self.record(name, symbol);
                }
                resolved.value
            }
            SyntaxKind::InvocationExpression => {
                let callee = match children.first() {
                    Some(callee) => self.bind_expression(callee, context),
                    None => Value::None,
                };
                if let Some(callee_symbol) = children
                    .first()
                    .and_then(|c| self.bindings.references.get(c.path()))
                    .cloned()
                {
                    self.bindings
                        .references
                        .insert(node.path().to_vec(), callee_symbol);
                }
                if let Some(arguments) = children.get(1) {
                    self.bind_arguments(arguments, context);
                }
                match callee {
                    Value::Method(ty) => Value::Instance(ty),
                    _ => Value::None,
                }
            }
            SyntaxKind::ObjectCreationExpression => {
                let mut ty = TypeRef::Unknown;
                for child in &children {
                    if child.kind() == SyntaxKind::ArgumentList {
                        self.bind_arguments(child, context);
                    } else {
                        ty = self.bind_type(child, context);
                    }
                }
                if let Some(symbol) = self.compilation.type_symbol(ty) {
                    self.bindings
                        .references
                        .insert(node.path().to_vec(), symbol);
                }
                Value::Instance(ty)
            }
            SyntaxKind::AssignmentExpression => {
                let target = children
                    .first()
                    .map_or(Value::None, |c| self.bind_expression(c, context));
                if let Some(value) = children.get(1) {
                    self.bind_expression(value, context);
                }
                target
            }
            SyntaxKind::BinaryExpression => {
                let left = children
                    .first()
                    .map_or(Value::None, |c| self.bind_expression(c, context));
                let right = children
                    .get(1)
                    .map_or(Value::None, |c| self.bind_expression(c, context));
                let operator = node
                    .node()
                    .child_token(SyntaxKind::Punctuation)
                    .map(|t| t.text().to_string())
                    .unwrap_or_default();
                binary_result(&operator, &left, &right)
            }
            SyntaxKind::PrefixUnaryExpression => {
                let operand = children
                    .first()
                    .map_or(Value::None, |c| self.bind_expression(c, context));
                let is_not = node
                    .node()
                    .child_token(SyntaxKind::Punctuation)
                    .is_some_and(|t| t.text() == "!");
                if is_not {
                    builtin_instance("Boolean")
                } else {
                    operand
                }
            }
            SyntaxKind::PostfixUnaryExpression | SyntaxKind::ParenthesizedExpression => children
                .first()
                .map_or(Value::None, |c| self.bind_expression(c, context)),
            SyntaxKind::LiteralExpression => literal_value(node.node()),
            SyntaxKind::ThisExpression => match context.current_type {
                Some(index) => {
                    let symbol = self.compilation.types[index].symbol.clone();
                    self.bindings
                        .references
                        .insert(node.path().to_vec(), symbol);
                    Value::Instance(TypeRef::Source(index))
                }
                None => Value::None,
            },
            _ => {
                for child in &children {
                    self.bind_expression(child, context);
                }
                Value::None
            }
        }
    }

    fn bind_arguments(&mut self, list: &NodeRef, context: &Context) {
        for argument in list.child_nodes() {
            for expression in argument.child_nodes() {
                self.bind_expression(&expression, context);
            }
        }
    }

    /// Locals and parameters, then members of enclosing types, then types,
    /// then namespaces.
    fn lookup_identifier(&self, name: &str, context: &Context) -> Resolved {
        for scope in self.scopes.iter().rev() {
            if let Some(local) = scope.get(name) {
                return Resolved::symbol(local.symbol.clone(), Value::Instance(local.ty));
            }
        }

        let mut current = context.current_type;
        while let Some(index) = current {
            if self.compilation.source_member(index, name).is_some() {
                return self.compilation.source_member_value(index, name);
            }
            current = self.compilation.types[index].containing;
        }

        if let Some(ty) = self.compilation.lookup_type(name, context) {
            return self.compilation.resolved_type(ty);
        }
        if self.compilation.namespaces.contains(name) {
            return Resolved::value(Value::Namespace(name.to_string()));
        }
        Resolved::none()
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}.{name}")
    }
}

fn source_symbol(document: DocumentId, ident: &TokenRef, kind: SymbolKind) -> Symbol {
    Symbol::new(
        SymbolId::Source {
            document,
            path: ident.path().to_vec(),
        },
        kind,
        ident.text(),
    )
    .with_location(document, ident.span())
}

fn is_type_declaration(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::ClassDeclaration
            | SyntaxKind::StructDeclaration
            | SyntaxKind::InterfaceDeclaration
            | SyntaxKind::EnumDeclaration
    )
}

/// The identifier of a simple or generic name.
fn simple_name(node: &SyntaxNode) -> String {
    match node.child_token(SyntaxKind::Identifier) {
        Some(ident) => ident.text().to_string(),
        None => node.token_text(),
    }
}

fn in_group(methods: &[Symbol], linked: &[Symbol], symbol: &Symbol) -> bool {
    methods.iter().chain(linked).any(|m| m.id() == symbol.id())
}

fn parameter_count(method: &SyntaxNode) -> usize {
    method
        .child_node(SyntaxKind::ParameterList)
        .map_or(0, |list| {
            list.child_nodes()
                .filter(|n| n.kind() == SyntaxKind::Parameter)
                .count()
        })
}

fn has_modifier(declaration: &SyntaxNode, modifier: &str) -> bool {
    declaration
        .child_tokens()
        .any(|t| t.kind() == SyntaxKind::Keyword && t.text() == modifier)
}

fn is_statement(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::Block
            | SyntaxKind::LocalDeclarationStatement
            | SyntaxKind::ExpressionStatement
            | SyntaxKind::ReturnStatement
            | SyntaxKind::IfStatement
            | SyntaxKind::ElseClause
            | SyntaxKind::WhileStatement
            | SyntaxKind::EmptyStatement
    )
}

fn builtin_instance(name: &str) -> Value {
    Value::Instance(builtins::by_name(name).map_or(TypeRef::Unknown, TypeRef::Builtin))
}

fn literal_value(node: &SyntaxNode) -> Value {
    let Some(token) = node.first_token() else {
        return Value::None;
    };
    match token.kind() {
        SyntaxKind::IntegerLiteral => builtin_instance("Int32"),
        SyntaxKind::RealLiteral => builtin_instance("Double"),
        SyntaxKind::StringLiteral => builtin_instance("String"),
        SyntaxKind::CharLiteral => builtin_instance("Char"),
        _ => match token.text() {
            "true" | "false" => builtin_instance("Boolean"),
            _ => Value::None,
        },
    }
}

fn binary_result(operator: &str, left: &Value, right: &Value) -> Value {
    match operator {
        "==" | "!=" | "<" | ">" | "<=" | ">=" | "&&" | "||" => builtin_instance("Boolean"),
        "+" if [left, right].iter().any(|v| **v == builtin_instance("String")) => {
            builtin_instance("String")
        }
        _ => match (left, right) {
            (Value::Instance(ty), _) | (_, Value::Instance(ty)) => Value::Instance(*ty),
            _ => Value::None,
        },
    }
}
