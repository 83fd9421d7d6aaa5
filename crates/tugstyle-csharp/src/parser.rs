//! Recursive-descent parser for the supported C# subset.
//!
//! The parser never fails. Tokens it cannot place are wrapped in `Error`
//! nodes and tokens it expected but did not find are inserted as zero-width
//! `Missing` tokens, so the resulting tree always reproduces the source text.
//!
//! Supported: using directives, block and file-scoped namespaces, classes,
//! structs, interfaces and enums (nested, with base lists, type parameters and
//! `where` clauses), methods, constructors, fields, auto-properties, generic
//! type names, blocks, local declarations (including `var`),
//! expression/return/if/while statements, and expressions with member access,
//! invocation, object creation, `await`, assignment, unary and binary
//! operators.

use tugstyle_core::syntax::{SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};

use crate::lexer::{is_predefined_type, tokenize};

const MODIFIERS: &[&str] = &[
    "public", "private", "protected", "internal", "static", "readonly", "const", "abstract",
    "sealed", "virtual", "override",
];

/// Modifiers the lexer sees as identifiers.
const CONTEXTUAL_MODIFIERS: &[&str] = &["async", "partial"];

const ASSIGNMENT_OPERATORS: &[&str] = &["=", "+=", "-=", "*=", "/=", "%="];

const PREFIX_OPERATORS: &[&str] = &["!", "-", "+", "~", "++", "--"];

/// Parse a whole document into a `CompilationUnit`.
pub fn parse(source: &str) -> SyntaxNode {
    Parser::new(source).parse_compilation_unit()
}

struct Parser {
    tokens: Vec<SyntaxToken>,
    pos: usize,
}

impl Parser {
    fn new(source: &str) -> Self {
        Parser {
            tokens: tokenize(source),
            pos: 0,
        }
    }

    // ------------------------------------------------------------------
    // Token access
    // ------------------------------------------------------------------

    fn nth(&self, n: usize) -> &SyntaxToken {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)]
    }

    fn current(&self) -> &SyntaxToken {
        self.nth(0)
    }

    fn is_eof(&self) -> bool {
        self.current().kind() == SyntaxKind::EndOfFile
    }

    fn nth_at(&self, n: usize, text: &str) -> bool {
        let token = self.nth(n);
        matches!(token.kind(), SyntaxKind::Punctuation | SyntaxKind::Keyword) && token.text() == text
    }

    fn at(&self, text: &str) -> bool {
        self.nth_at(0, text)
    }

    fn at_any(&self, texts: &[&str]) -> bool {
        texts.iter().any(|t| self.at(t))
    }

    /// A contextual keyword such as `where` or `async`, lexed as an identifier.
    fn nth_at_contextual(&self, n: usize, text: &str) -> bool {
        let token = self.nth(n);
        token.kind() == SyntaxKind::Identifier && token.text() == text
    }

    fn nth_is_ident(&self, n: usize) -> bool {
        self.nth(n).kind() == SyntaxKind::Identifier
    }

    fn at_ident(&self) -> bool {
        self.nth_is_ident(0)
    }

    fn nth_is_predefined(&self, n: usize) -> bool {
        let token = self.nth(n);
        token.kind() == SyntaxKind::Keyword && is_predefined_type(token.text())
    }

    fn at_type_start(&self) -> bool {
        self.at_ident() || self.nth_is_predefined(0)
    }

    /// Consume the current token. At end of input the `EndOfFile` token is
    /// returned without advancing.
    fn bump(&mut self) -> SyntaxElement {
        let token = self.current().clone();
        if !self.is_eof() {
            self.pos += 1;
        }
        token.into()
    }

    /// Consume a contextual keyword, re-kinded as a `Keyword` token so it is
    /// never mistaken for a declared name.
    fn bump_contextual(&mut self) -> SyntaxElement {
        let token = self.current().clone();
        if !self.is_eof() {
            self.pos += 1;
        }
        SyntaxToken::with_trivia(
            SyntaxKind::Keyword,
            token.leading_trivia(),
            token.text(),
            token.trailing_trivia(),
        )
        .into()
    }

    fn expect(&mut self, text: &str) -> SyntaxElement {
        if self.at(text) {
            self.bump()
        } else {
            missing()
        }
    }

    fn expect_ident(&mut self) -> SyntaxElement {
        if self.at_ident() {
            self.bump()
        } else {
            missing()
        }
    }

    /// Wrap the current token in an `Error` node.
    fn error_token(&mut self) -> SyntaxElement {
        node(SyntaxKind::Error, vec![self.bump()])
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn parse_compilation_unit(mut self) -> SyntaxNode {
        let mut children = Vec::new();
        self.parse_namespace_members(&mut children, false);
        children.push(self.bump());
        SyntaxNode::new(SyntaxKind::CompilationUnit, children)
    }

    fn parse_namespace_members(&mut self, children: &mut Vec<SyntaxElement>, braced: bool) {
        while !self.is_eof() && !(braced && self.at("}")) {
            if self.at("using") {
                children.push(self.parse_using());
            } else if self.at("namespace") {
                children.push(self.parse_namespace());
            } else if self.at_type_declaration() {
                children.push(self.parse_type_declaration());
            } else {
                children.push(self.error_token());
            }
        }
    }

    fn parse_using(&mut self) -> SyntaxElement {
        let mut children = vec![self.bump()];
        children.push(self.parse_name().into());
        children.push(self.expect(";"));
        node(SyntaxKind::UsingDirective, children)
    }

    fn parse_namespace(&mut self) -> SyntaxElement {
        let mut children = vec![self.bump()];
        children.push(self.parse_name().into());
        if self.at(";") {
            children.push(self.bump());
            self.parse_namespace_members(&mut children, false);
        } else {
            children.push(self.expect("{"));
            self.parse_namespace_members(&mut children, true);
            children.push(self.expect("}"));
        }
        node(SyntaxKind::NamespaceDeclaration, children)
    }

    fn nth_is_contextual_modifier(&self, n: usize) -> bool {
        CONTEXTUAL_MODIFIERS.iter().any(|m| self.nth_at_contextual(n, m))
            && (self.nth_is_ident(n + 1) || self.nth(n + 1).kind() == SyntaxKind::Keyword)
    }

    fn modifier_count(&self) -> usize {
        let mut n = 0;
        while MODIFIERS.iter().any(|m| self.nth_at(n, m)) || self.nth_is_contextual_modifier(n) {
            n += 1;
        }
        n
    }

    fn at_type_declaration(&self) -> bool {
        let n = self.modifier_count();
        ["class", "struct", "interface", "enum"]
            .iter()
            .any(|keyword| self.nth_at(n, keyword))
    }

    fn parse_modifiers(&mut self) -> Vec<SyntaxElement> {
        let count = self.modifier_count();
        (0..count)
            .map(|_| {
                if self.at_ident() {
                    self.bump_contextual()
                } else {
                    self.bump()
                }
            })
            .collect()
    }

    fn parse_type_declaration(&mut self) -> SyntaxElement {
        let mut children = self.parse_modifiers();
        let kind = match self.current().text() {
            "struct" => SyntaxKind::StructDeclaration,
            "interface" => SyntaxKind::InterfaceDeclaration,
            "enum" => SyntaxKind::EnumDeclaration,
            _ => SyntaxKind::ClassDeclaration,
        };
        children.push(self.bump());
        children.push(self.expect_ident());
        if self.at("<") && self.type_parameter_list_len_at(0).is_some() {
            children.push(self.parse_type_parameter_list().into());
        }
        if self.at(":") {
            children.push(self.parse_base_list().into());
        }
        self.parse_constraint_clauses(&mut children);
        children.push(self.expect("{"));
        if kind == SyntaxKind::EnumDeclaration {
            self.parse_enum_members(&mut children);
        } else {
            while !self.is_eof() && !self.at("}") {
                children.push(self.parse_member());
            }
        }
        children.push(self.expect("}"));
        if self.at(";") {
            children.push(self.bump());
        }
        node(kind, children)
    }

    /// `: Base, IFirst, ISecond<T>`
    fn parse_base_list(&mut self) -> SyntaxNode {
        let mut children = vec![self.bump()];
        children.push(self.parse_type().into());
        while self.at(",") {
            children.push(self.bump());
            children.push(self.parse_type().into());
        }
        SyntaxNode::new(SyntaxKind::BaseList, children)
    }

    /// `Name (= value)?` separated by commas, trailing comma allowed.
    fn parse_enum_members(&mut self, children: &mut Vec<SyntaxElement>) {
        while !self.is_eof() && !self.at("}") {
            if self.at_ident() {
                let mut member = vec![self.bump()];
                if self.at("=") {
                    member.push(self.bump());
                    member.push(self.parse_expression().into());
                }
                children.push(node(SyntaxKind::EnumMemberDeclaration, member));
            } else {
                children.push(self.error_token());
            }
            if self.at(",") {
                children.push(self.bump());
            }
        }
    }

    /// Length of a `<T, U>` type parameter list starting `offset` tokens ahead.
    fn type_parameter_list_len_at(&self, offset: usize) -> Option<usize> {
        if !self.nth_at(offset, "<") {
            return None;
        }
        let mut n = offset + 1;
        loop {
            if !self.nth_is_ident(n) {
                return None;
            }
            n += 1;
            if self.nth_at(n, ",") {
                n += 1;
            } else if self.nth_at(n, ">") {
                return Some(n + 1 - offset);
            } else {
                return None;
            }
        }
    }

    fn parse_type_parameter_list(&mut self) -> SyntaxNode {
        let mut children = vec![self.expect("<")];
        while !self.is_eof() && !self.at(">") {
            children.push(self.expect_ident());
            if self.at(",") {
                children.push(self.bump());
            } else {
                break;
            }
        }
        children.push(self.expect(">"));
        SyntaxNode::new(SyntaxKind::TypeParameterList, children)
    }

    /// `where T : class, IComparable<T>, new()` clauses.
    fn parse_constraint_clauses(&mut self, children: &mut Vec<SyntaxElement>) {
        while self.nth_at_contextual(0, "where") && self.nth_is_ident(1) && self.nth_at(2, ":") {
            let mut clause = vec![self.bump_contextual(), self.bump(), self.bump()];
            loop {
                if self.at("class") || self.at("struct") {
                    clause.push(self.bump());
                } else if self.at("new") {
                    clause.push(self.bump());
                    clause.push(self.expect("("));
                    clause.push(self.expect(")"));
                } else if self.at_type_start() {
                    clause.push(self.parse_type().into());
                } else {
                    clause.push(missing());
                    break;
                }
                if self.at(",") {
                    clause.push(self.bump());
                } else {
                    break;
                }
            }
            children.push(node(SyntaxKind::TypeParameterConstraintClause, clause));
        }
    }

    fn parse_member(&mut self) -> SyntaxElement {
        if self.at_type_declaration() {
            return self.parse_type_declaration();
        }
        let mut children = self.parse_modifiers();

        if self.at_ident() && self.nth_at(1, "(") {
            children.push(self.bump());
            children.push(self.parse_parameter_list().into());
            self.parse_body(&mut children);
            return node(SyntaxKind::ConstructorDeclaration, children);
        }

        if !self.at_type_start() {
            children.push(self.bump());
            return node(SyntaxKind::Error, children);
        }

        children.push(self.parse_type().into());
        if !self.at_ident() {
            children.push(missing());
            children.push(self.expect(";"));
            return node(SyntaxKind::Error, children);
        }

        let generic_method = self
            .type_parameter_list_len_at(1)
            .is_some_and(|len| self.nth_at(1 + len, "("));
        if self.nth_at(1, "(") || generic_method {
            children.push(self.bump());
            if generic_method {
                children.push(self.parse_type_parameter_list().into());
            }
            children.push(self.parse_parameter_list().into());
            self.parse_constraint_clauses(&mut children);
            self.parse_body(&mut children);
            node(SyntaxKind::MethodDeclaration, children)
        } else if self.nth_at(1, "{") {
            children.push(self.bump());
            children.push(self.parse_accessor_list().into());
            node(SyntaxKind::PropertyDeclaration, children)
        } else {
            self.parse_declarators(&mut children);
            children.push(self.expect(";"));
            node(SyntaxKind::FieldDeclaration, children)
        }
    }

    /// A block, an expression body (`=> expr;`) or a bare `;`.
    fn parse_body(&mut self, children: &mut Vec<SyntaxElement>) {
        if self.at("{") {
            children.push(self.parse_block().into());
        } else if self.at("=>") {
            children.push(self.bump());
            children.push(self.parse_expression().into());
            children.push(self.expect(";"));
        } else {
            children.push(self.expect(";"));
        }
    }

    fn parse_parameter_list(&mut self) -> SyntaxNode {
        let mut children = vec![self.expect("(")];
        while !self.is_eof() && !self.at(")") {
            if self.at_type_start() {
                let ty = self.parse_type();
                let name = self.expect_ident();
                children.push(node(SyntaxKind::Parameter, vec![ty.into(), name]));
            } else {
                children.push(self.error_token());
            }
            if self.at(",") {
                children.push(self.bump());
            } else {
                break;
            }
        }
        children.push(self.expect(")"));
        SyntaxNode::new(SyntaxKind::ParameterList, children)
    }

    fn parse_accessor_list(&mut self) -> SyntaxNode {
        let mut children = vec![self.expect("{")];
        while !self.is_eof() && !self.at("}") {
            children.extend(self.parse_modifiers());
            if self.at_ident() {
                children.push(self.bump());
                if self.at("{") {
                    children.push(self.parse_block().into());
                } else {
                    children.push(self.expect(";"));
                }
            } else {
                children.push(self.error_token());
            }
        }
        children.push(self.expect("}"));
        SyntaxNode::new(SyntaxKind::AccessorList, children)
    }

    /// `name (= expr)? (, name (= expr)?)*`
    fn parse_declarators(&mut self, children: &mut Vec<SyntaxElement>) {
        loop {
            let mut declarator = vec![self.expect_ident()];
            if self.at("=") {
                declarator.push(self.bump());
                declarator.push(self.parse_expression().into());
            }
            children.push(node(SyntaxKind::VariableDeclarator, declarator));
            if self.at(",") {
                children.push(self.bump());
            } else {
                break;
            }
        }
    }

    // ------------------------------------------------------------------
    // Types and names
    // ------------------------------------------------------------------

    fn parse_identifier_name(&mut self) -> SyntaxNode {
        SyntaxNode::new(SyntaxKind::IdentifierName, vec![self.expect_ident()])
    }

    /// `A` or `A.B.C` as a left-nested `QualifiedName`.
    fn parse_name(&mut self) -> SyntaxNode {
        let mut name = self.parse_identifier_name();
        while self.at(".") && self.nth_is_ident(1) {
            let dot = self.bump();
            let right = self.parse_identifier_name();
            name = SyntaxNode::new(SyntaxKind::QualifiedName, vec![name.into(), dot, right.into()]);
        }
        name
    }

    /// `A`, `A<T>`, `A.B<T>.C` in type position.
    fn parse_type_name(&mut self) -> SyntaxNode {
        let mut name = self.parse_simple_type_name();
        while self.at(".") && self.nth_is_ident(1) {
            let dot = self.bump();
            let right = self.parse_simple_type_name();
            name = SyntaxNode::new(SyntaxKind::QualifiedName, vec![name.into(), dot, right.into()]);
        }
        name
    }

    fn parse_simple_type_name(&mut self) -> SyntaxNode {
        if self.at_ident() && self.type_argument_list_len_at(1).is_some() {
            let ident = self.bump();
            let arguments = self.parse_type_argument_list();
            return SyntaxNode::new(SyntaxKind::GenericName, vec![ident, arguments.into()]);
        }
        self.parse_identifier_name()
    }

    fn parse_type_argument_list(&mut self) -> SyntaxNode {
        let mut children = vec![self.expect("<")];
        while !self.is_eof() && !self.at(">") {
            children.push(self.parse_type().into());
            if self.at(",") {
                children.push(self.bump());
            } else {
                break;
            }
        }
        children.push(self.expect(">"));
        SyntaxNode::new(SyntaxKind::TypeArgumentList, children)
    }

    fn parse_type(&mut self) -> SyntaxNode {
        let mut ty = if self.nth_is_predefined(0) {
            SyntaxNode::new(SyntaxKind::PredefinedType, vec![self.bump()])
        } else {
            self.parse_type_name()
        };
        while self.at("[") && self.nth_at(1, "]") {
            let open = self.bump();
            let close = self.bump();
            ty = SyntaxNode::new(SyntaxKind::ArrayType, vec![ty.into(), open, close]);
        }
        ty
    }

    /// Length of the type starting `offset` tokens ahead, if there is one.
    fn type_len_at(&self, offset: usize) -> Option<usize> {
        let mut n = offset;
        if self.nth_is_predefined(n) {
            n += 1;
        } else if self.nth_is_ident(n) {
            n = self.simple_type_name_end(n);
            while self.nth_at(n, ".") && self.nth_is_ident(n + 1) {
                n = self.simple_type_name_end(n + 1);
            }
        } else {
            return None;
        }
        while self.nth_at(n, "[") && self.nth_at(n + 1, "]") {
            n += 2;
        }
        Some(n - offset)
    }

    /// Position after the identifier at `n` and its type arguments, if any.
    fn simple_type_name_end(&self, n: usize) -> usize {
        n + 1 + self.type_argument_list_len_at(n + 1).unwrap_or(0)
    }

    /// Length of a `<...>` type argument list starting `offset` tokens ahead.
    fn type_argument_list_len_at(&self, offset: usize) -> Option<usize> {
        if !self.nth_at(offset, "<") {
            return None;
        }
        let mut n = offset + 1;
        loop {
            n += self.type_len_at(n)?;
            if self.nth_at(n, ",") {
                n += 1;
            } else if self.nth_at(n, ">") {
                return Some(n + 1 - offset);
            } else {
                return None;
            }
        }
    }

    fn looks_like_local_declaration(&self) -> bool {
        let Some(len) = self.type_len_at(0) else {
            return false;
        };
        self.nth_is_ident(len)
            && (self.nth_at(len + 1, "=") || self.nth_at(len + 1, ";") || self.nth_at(len + 1, ","))
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_block(&mut self) -> SyntaxNode {
        let mut children = vec![self.expect("{")];
        while !self.is_eof() && !self.at("}") {
            children.push(self.parse_statement());
        }
        children.push(self.expect("}"));
        SyntaxNode::new(SyntaxKind::Block, children)
    }

    fn parse_statement(&mut self) -> SyntaxElement {
        if self.at("{") {
            return self.parse_block().into();
        }
        if self.at(";") {
            return node(SyntaxKind::EmptyStatement, vec![self.bump()]);
        }
        if self.at("return") {
            let mut children = vec![self.bump()];
            if !self.at(";") {
                children.push(self.parse_expression().into());
            }
            children.push(self.expect(";"));
            return node(SyntaxKind::ReturnStatement, children);
        }
        if self.at("if") {
            let mut children = vec![self.bump(), self.expect("(")];
            children.push(self.parse_expression().into());
            children.push(self.expect(")"));
            children.push(self.parse_statement());
            if self.at("else") {
                let else_kw = self.bump();
                let body = self.parse_statement();
                children.push(node(SyntaxKind::ElseClause, vec![else_kw, body]));
            }
            return node(SyntaxKind::IfStatement, children);
        }
        if self.at("while") {
            let mut children = vec![self.bump(), self.expect("(")];
            children.push(self.parse_expression().into());
            children.push(self.expect(")"));
            children.push(self.parse_statement());
            return node(SyntaxKind::WhileStatement, children);
        }
        if self.looks_like_local_declaration() {
            let mut children = vec![self.parse_type().into()];
            self.parse_declarators(&mut children);
            children.push(self.expect(";"));
            return node(SyntaxKind::LocalDeclarationStatement, children);
        }

        let start = self.pos;
        let expression = self.parse_expression();
        let semicolon = self.expect(";");
        if self.pos == start {
            return self.error_token();
        }
        node(
            SyntaxKind::ExpressionStatement,
            vec![expression.into(), semicolon],
        )
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn parse_expression(&mut self) -> SyntaxNode {
        let left = self.parse_binary(0);
        if self.current().kind() == SyntaxKind::Punctuation && self.at_any(ASSIGNMENT_OPERATORS) {
            let op = self.bump();
            let right = self.parse_expression();
            return SyntaxNode::new(
                SyntaxKind::AssignmentExpression,
                vec![left.into(), op, right.into()],
            );
        }
        left
    }

    fn binary_precedence(&self) -> Option<u8> {
        let token = self.current();
        if token.kind() != SyntaxKind::Punctuation {
            return None;
        }
        match token.text() {
            "||" => Some(1),
            "&&" => Some(2),
            "|" => Some(3),
            "^" => Some(4),
            "&" => Some(5),
            "==" | "!=" => Some(6),
            "<" | ">" | "<=" | ">=" => Some(7),
            "+" | "-" => Some(8),
            "*" | "/" | "%" => Some(9),
            _ => None,
        }
    }

    fn parse_binary(&mut self, min_prec: u8) -> SyntaxNode {
        let mut left = self.parse_unary();
        while let Some(prec) = self.binary_precedence() {
            if prec < min_prec {
                break;
            }
            let op = self.bump();
            let right = self.parse_binary(prec + 1);
            left = SyntaxNode::new(SyntaxKind::BinaryExpression, vec![left.into(), op, right.into()]);
        }
        left
    }

    fn parse_unary(&mut self) -> SyntaxNode {
        if self.nth_at_contextual(0, "await") && self.nth_starts_operand(1) {
            let op = self.bump_contextual();
            let operand = self.parse_unary();
            return SyntaxNode::new(SyntaxKind::PrefixUnaryExpression, vec![op, operand.into()]);
        }
        if self.current().kind() == SyntaxKind::Punctuation && self.at_any(PREFIX_OPERATORS) {
            let op = self.bump();
            let operand = self.parse_unary();
            return SyntaxNode::new(SyntaxKind::PrefixUnaryExpression, vec![op, operand.into()]);
        }
        self.parse_postfix()
    }

    fn nth_starts_operand(&self, n: usize) -> bool {
        let token = self.nth(n);
        match token.kind() {
            SyntaxKind::Identifier
            | SyntaxKind::IntegerLiteral
            | SyntaxKind::RealLiteral
            | SyntaxKind::StringLiteral
            | SyntaxKind::CharLiteral => true,
            SyntaxKind::Keyword => {
                is_predefined_type(token.text())
                    || ["this", "new", "true", "false", "null"].contains(&token.text())
            }
            SyntaxKind::Punctuation => token.text() == "(",
            _ => false,
        }
    }

    fn parse_postfix(&mut self) -> SyntaxNode {
        let mut expr = self.parse_primary();
        loop {
            if self.at(".") {
                let dot = self.bump();
                let name = self.parse_identifier_name();
                expr = SyntaxNode::new(
                    SyntaxKind::SimpleMemberAccessExpression,
                    vec![expr.into(), dot, name.into()],
                );
            } else if self.at("(") {
                let args = self.parse_argument_list();
                expr = SyntaxNode::new(SyntaxKind::InvocationExpression, vec![expr.into(), args.into()]);
            } else if self.at("++") || self.at("--") {
                let op = self.bump();
                expr = SyntaxNode::new(SyntaxKind::PostfixUnaryExpression, vec![expr.into(), op]);
            } else {
                break;
            }
        }
        expr
    }

    fn parse_argument_list(&mut self) -> SyntaxNode {
        let mut children = vec![self.expect("(")];
        while !self.is_eof() && !self.at(")") {
            let argument = self.parse_expression();
            children.push(node(SyntaxKind::Argument, vec![argument.into()]));
            if self.at(",") {
                children.push(self.bump());
            } else {
                break;
            }
        }
        children.push(self.expect(")"));
        SyntaxNode::new(SyntaxKind::ArgumentList, children)
    }

    fn parse_primary(&mut self) -> SyntaxNode {
        let token = self.current();
        match token.kind() {
            SyntaxKind::IntegerLiteral
            | SyntaxKind::RealLiteral
            | SyntaxKind::StringLiteral
            | SyntaxKind::CharLiteral => {
                return SyntaxNode::new(SyntaxKind::LiteralExpression, vec![self.bump()]);
            }
            SyntaxKind::Identifier => return self.parse_identifier_name(),
            _ => {}
        }
        if self.at("true") || self.at("false") || self.at("null") {
            return SyntaxNode::new(SyntaxKind::LiteralExpression, vec![self.bump()]);
        }
        if self.at("this") {
            return SyntaxNode::new(SyntaxKind::ThisExpression, vec![self.bump()]);
        }
        if self.nth_is_predefined(0) {
            return SyntaxNode::new(SyntaxKind::PredefinedType, vec![self.bump()]);
        }
        if self.at("(") {
            let open = self.bump();
            let inner = self.parse_expression();
            let close = self.expect(")");
            return SyntaxNode::new(
                SyntaxKind::ParenthesizedExpression,
                vec![open, inner.into(), close],
            );
        }
        if self.at("new") {
            let mut children = vec![self.bump()];
            if self.at_type_start() {
                children.push(self.parse_type().into());
            } else {
                children.push(missing());
            }
            if self.at("(") {
                children.push(self.parse_argument_list().into());
            }
            return SyntaxNode::new(SyntaxKind::ObjectCreationExpression, children);
        }
        if self.is_eof() || self.at_any(&[")", "}", "]", ";", ","]) {
            return SyntaxNode::new(SyntaxKind::Error, vec![missing()]);
        }
        SyntaxNode::new(SyntaxKind::Error, vec![self.bump()])
    }
}

fn node(kind: SyntaxKind, children: Vec<SyntaxElement>) -> SyntaxElement {
    SyntaxNode::new(kind, children).into()
}

fn missing() -> SyntaxElement {
    SyntaxToken::new(SyntaxKind::Missing, "").into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(root: &SyntaxNode) -> Vec<SyntaxKind> {
        root.descendants().iter().map(|n| n.kind()).collect()
    }

    fn find(root: &SyntaxNode, kind: SyntaxKind) -> Vec<SyntaxNode> {
        root.descendants()
            .into_iter()
            .filter(|n| n.kind() == kind)
            .map(|n| n.node().clone())
            .collect()
    }

    mod round_trip {
        use super::*;

        #[test]
        fn well_formed_source_is_lossless() {
            let source = r#"using System;

namespace App.Core
{
    // A comment
    public class Greeter
    {
        private int count = 0;
        public string Name { get; set; }

        public Greeter(string name) { Name = name; }

        public void m_sayHello(int times)
        {
            var total = int.Parse("3") + times;
            if (total > 2) { count++; } else return;
            while (count < total) count += 1;
        }
    }
}
"#;
            let root = parse(source);
            assert_eq!(root.text(), source);
            assert!(find(&root, SyntaxKind::Error).is_empty());
        }

        #[test]
        fn malformed_source_is_lossless() {
            for source in [
                "class { void (",
                "namespace ; } } ) #",
                "class A { int x = ; void f() { a.; ) } }",
                "",
                "   ",
            ] {
                assert_eq!(parse(source).text(), source, "source: {source:?}");
            }
        }

        #[test]
        fn unparseable_tokens_become_error_nodes() {
            let root = parse("class A { } ) class B { }");
            assert_eq!(find(&root, SyntaxKind::Error).len(), 1);
            assert_eq!(find(&root, SyntaxKind::ClassDeclaration).len(), 2);
        }
    }

    mod declarations {
        use super::*;

        #[test]
        fn namespaces_types_and_members() {
            let root = parse(
                "namespace N { class A { struct B { } int f, g; string P { get; } void m() { } A() { } } }",
            );
            assert!(kinds(&root).starts_with(&[
                SyntaxKind::CompilationUnit,
                SyntaxKind::NamespaceDeclaration,
                SyntaxKind::IdentifierName,
                SyntaxKind::ClassDeclaration,
                SyntaxKind::StructDeclaration,
            ]));
            assert_eq!(find(&root, SyntaxKind::VariableDeclarator).len(), 2);
            assert_eq!(find(&root, SyntaxKind::PropertyDeclaration).len(), 1);
            assert_eq!(find(&root, SyntaxKind::ConstructorDeclaration).len(), 1);
            let method = &find(&root, SyntaxKind::MethodDeclaration)[0];
            assert_eq!(method.child_token(SyntaxKind::Identifier).unwrap().text(), "m");
            assert_eq!(method.child_nodes().next().unwrap().kind(), SyntaxKind::PredefinedType);
        }

        #[test]
        fn file_scoped_namespace_and_qualified_names() {
            let root = parse("using A.B.C;\nnamespace X.Y;\nclass K { }");
            let names = find(&root, SyntaxKind::QualifiedName);
            assert_eq!(names[0].token_text(), "A.B.C");
            let ns = &find(&root, SyntaxKind::NamespaceDeclaration)[0];
            assert_eq!(find(ns, SyntaxKind::ClassDeclaration).len(), 1);
        }

        #[test]
        fn interfaces_enums_and_base_lists() {
            let source = "interface IRunner { void run(); int Count { get; } }\n\
                          enum Color { Red, Green = 2, }\n\
                          class Runner : Base, IRunner { public void run() { } }";
            let root = parse(source);
            assert_eq!(root.text(), source);
            assert!(find(&root, SyntaxKind::Error).is_empty());

            let interface = &find(&root, SyntaxKind::InterfaceDeclaration)[0];
            assert_eq!(find(interface, SyntaxKind::MethodDeclaration).len(), 1);
            assert_eq!(find(interface, SyntaxKind::PropertyDeclaration).len(), 1);

            let members = find(&root, SyntaxKind::EnumMemberDeclaration);
            let names: Vec<String> = members
                .iter()
                .map(|m| m.child_token(SyntaxKind::Identifier).unwrap().text().to_string())
                .collect();
            assert_eq!(names, vec!["Red", "Green"]);

            let bases = &find(&root, SyntaxKind::BaseList)[0];
            assert_eq!(bases.token_text(), ":Base,IRunner");
        }

        #[test]
        fn generic_types_and_methods() {
            let source = "class Box<T> where T : class, new() {\n\
                          List<int> items() { return null; }\n\
                          async Task<Dictionary<string, List<T>>> load() { var x = await fetch(); return x; }\n\
                          U map<U>(Func<T, U> f) where U : IComparable<U> { List<U> xs = new List<U>(); return f(null); }\n\
                          }";
            let root = parse(source);
            assert_eq!(root.text(), source);
            assert!(find(&root, SyntaxKind::Error).is_empty());

            let methods = find(&root, SyntaxKind::MethodDeclaration);
            let names: Vec<String> = methods
                .iter()
                .map(|m| m.child_token(SyntaxKind::Identifier).unwrap().text().to_string())
                .collect();
            assert_eq!(names, vec!["items", "load", "map"]);
            assert_eq!(methods[0].child_nodes().next().unwrap().kind(), SyntaxKind::GenericName);
            assert_eq!(
                methods[1].child_nodes().next().unwrap().token_text(),
                "Task<Dictionary<string,List<T>>>"
            );
            assert_eq!(find(&root, SyntaxKind::TypeParameterList).len(), 2);
            assert_eq!(find(&root, SyntaxKind::TypeParameterConstraintClause).len(), 2);
            assert_eq!(find(&root, SyntaxKind::LocalDeclarationStatement).len(), 2);
        }

        #[test]
        fn contextual_modifiers_are_not_names() {
            let root = parse("partial class A { public async void run() { } void async() { } }");
            let methods = find(&root, SyntaxKind::MethodDeclaration);
            assert_eq!(methods[0].child_token(SyntaxKind::Identifier).unwrap().text(), "run");
            assert_eq!(methods[1].child_token(SyntaxKind::Identifier).unwrap().text(), "async");
            let class = &find(&root, SyntaxKind::ClassDeclaration)[0];
            assert_eq!(class.child_token(SyntaxKind::Identifier).unwrap().text(), "A");
        }

        #[test]
        fn expression_bodied_method() {
            let root = parse("class A { int twice(int x) => x * 2; }");
            let method = &find(&root, SyntaxKind::MethodDeclaration)[0];
            assert_eq!(find(method, SyntaxKind::BinaryExpression).len(), 1);
            assert_eq!(find(method, SyntaxKind::Parameter).len(), 1);
        }
    }

    mod expressions {
        use super::*;

        fn expression(source: &str) -> SyntaxNode {
            let root = parse(&format!("class A {{ void f() {{ {source}; }} }}"));
            let statement = find(&root, SyntaxKind::ExpressionStatement).remove(0);
            let expression = statement.child_nodes().next().unwrap().clone();
            expression
        }

        #[test]
        fn static_access_on_keyword() {
            let expr = expression("int.Parse(s)");
            assert_eq!(expr.kind(), SyntaxKind::InvocationExpression);
            let access = expr.child_nodes().next().unwrap();
            assert_eq!(access.kind(), SyntaxKind::SimpleMemberAccessExpression);
            assert_eq!(access.child_nodes().next().unwrap().kind(), SyntaxKind::PredefinedType);
        }

        #[test]
        fn precedence_and_associativity() {
            let expr = expression("a = b = c + d * e");
            assert_eq!(expr.kind(), SyntaxKind::AssignmentExpression);
            let sum = find(&expr, SyntaxKind::BinaryExpression)[0].clone();
            assert_eq!(sum.token_text(), "c+d*e");
            let right = sum.child_nodes().nth(1).unwrap();
            assert_eq!(right.token_text(), "d*e");
        }

        #[test]
        fn object_creation_and_chains() {
            let expr = expression("new Foo(1).Bar().Baz++");
            assert_eq!(expr.kind(), SyntaxKind::PostfixUnaryExpression);
            assert_eq!(find(&expr, SyntaxKind::ObjectCreationExpression).len(), 1);
            assert_eq!(find(&expr, SyntaxKind::InvocationExpression).len(), 2);
        }

        #[test]
        fn local_declarations_are_recognised() {
            let root = parse("class A { void f() { var x = 1; Foo.Bar y; int[] z; x = 2; } }");
            assert_eq!(find(&root, SyntaxKind::LocalDeclarationStatement).len(), 3);
            assert_eq!(find(&root, SyntaxKind::ExpressionStatement).len(), 1);
            assert_eq!(find(&root, SyntaxKind::ArrayType).len(), 1);
        }
    }
}
