//! Tokenizer for the supported C# subset.
//!
//! Whitespace and comments never become tokens of their own: they are
//! collected and attached as leading trivia to the next token. The final
//! `EndOfFile` token carries whatever trivia remains, so concatenating all
//! tokens reproduces the input exactly.

use logos::Logos;
use tugstyle_core::syntax::{SyntaxKind, SyntaxToken};

/// Reserved keywords other than the predefined type names.
pub const KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "break", "case", "catch", "class", "const", "continue", "default",
    "do", "else", "enum", "false", "finally", "for", "foreach", "if", "in", "interface",
    "internal", "is", "namespace", "new", "null", "out", "override", "private", "protected",
    "public", "readonly", "ref", "return", "sealed", "static", "struct", "switch", "this",
    "throw", "true", "try", "using", "virtual", "while",
];

/// Keywords that alias a built-in type.
pub const PREDEFINED_TYPES: &[&str] = &[
    "bool", "byte", "char", "decimal", "double", "float", "int", "long", "object", "sbyte",
    "short", "string", "uint", "ulong", "ushort", "void",
];

/// Whether `text` is a reserved word (keyword or predefined type).
pub fn is_reserved(text: &str) -> bool {
    KEYWORDS.contains(&text) || PREDEFINED_TYPES.contains(&text)
}

/// Whether `text` is a predefined type keyword such as `int`.
pub fn is_predefined_type(text: &str) -> bool {
    PREDEFINED_TYPES.contains(&text)
}

#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
#[logos(error = ())]
enum LexKind {
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    #[regex(r"//.*", allow_greedy = true)]
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    Comment,

    #[token("abstract")]
    #[token("as")]
    #[token("base")]
    #[token("break")]
    #[token("case")]
    #[token("catch")]
    #[token("class")]
    #[token("const")]
    #[token("continue")]
    #[token("default")]
    #[token("do")]
    #[token("else")]
    #[token("enum")]
    #[token("false")]
    #[token("finally")]
    #[token("for")]
    #[token("foreach")]
    #[token("if")]
    #[token("in")]
    #[token("interface")]
    #[token("internal")]
    #[token("is")]
    #[token("namespace")]
    #[token("new")]
    #[token("null")]
    #[token("out")]
    #[token("override")]
    #[token("private")]
    #[token("protected")]
    #[token("public")]
    #[token("readonly")]
    #[token("ref")]
    #[token("return")]
    #[token("sealed")]
    #[token("static")]
    #[token("struct")]
    #[token("switch")]
    #[token("this")]
    #[token("throw")]
    #[token("true")]
    #[token("try")]
    #[token("using")]
    #[token("virtual")]
    #[token("while")]
    #[token("bool")]
    #[token("byte")]
    #[token("char")]
    #[token("decimal")]
    #[token("double")]
    #[token("float")]
    #[token("int")]
    #[token("long")]
    #[token("object")]
    #[token("sbyte")]
    #[token("short")]
    #[token("string")]
    #[token("uint")]
    #[token("ulong")]
    #[token("ushort")]
    #[token("void")]
    Keyword,

    // Letters of any script, as C# allows.
    #[regex(r"@?[\p{L}\p{Nl}_][\p{L}\p{Nl}\p{Mn}\p{Mc}\p{Nd}\p{Pc}\p{Cf}]*")]
    Identifier,

    #[regex(r"0[xX][0-9A-Fa-f](_?[0-9A-Fa-f])*([uUlL]+)?")]
    #[regex(r"[0-9](_?[0-9])*([uUlL]+)?")]
    Integer,

    #[regex(r"[0-9](_?[0-9])*\.[0-9](_?[0-9])*([eE][+-]?[0-9]+)?[fFdDmM]?")]
    #[regex(r"[0-9](_?[0-9])*[eE][+-]?[0-9]+[fFdDmM]?")]
    #[regex(r"[0-9](_?[0-9])*[fFdDmM]")]
    Real,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r#"@"([^"]|"")*""#)]
    String,

    #[regex(r"'([^'\\\n]|\\.)+'")]
    Char,

    #[token("{")]
    #[token("}")]
    #[token("(")]
    #[token(")")]
    #[token("[")]
    #[token("]")]
    #[token(";")]
    #[token(",")]
    #[token(".")]
    #[token(":")]
    #[token("?")]
    #[token("=>")]
    #[token("=")]
    #[token("==")]
    #[token("!=")]
    #[token("<")]
    #[token("<=")]
    #[token(">")]
    #[token(">=")]
    #[token("+")]
    #[token("-")]
    #[token("*")]
    #[token("/")]
    #[token("%")]
    #[token("!")]
    #[token("&")]
    #[token("|")]
    #[token("^")]
    #[token("~")]
    #[token("&&")]
    #[token("||")]
    #[token("++")]
    #[token("--")]
    #[token("+=")]
    #[token("-=")]
    #[token("*=")]
    #[token("/=")]
    #[token("%=")]
    Punctuation,
}

impl From<LexKind> for SyntaxKind {
    fn from(kind: LexKind) -> Self {
        match kind {
            LexKind::Keyword => SyntaxKind::Keyword,
            LexKind::Identifier => SyntaxKind::Identifier,
            LexKind::Integer => SyntaxKind::IntegerLiteral,
            LexKind::Real => SyntaxKind::RealLiteral,
            LexKind::String => SyntaxKind::StringLiteral,
            LexKind::Char => SyntaxKind::CharLiteral,
            LexKind::Punctuation => SyntaxKind::Punctuation,
            LexKind::Whitespace | LexKind::Comment => SyntaxKind::Unknown,
        }
    }
}

/// Split `source` into tokens with leading trivia. Always ends with `EndOfFile`.
pub fn tokenize(source: &str) -> Vec<SyntaxToken> {
    let mut lexer = LexKind::lexer(source);
    let mut tokens = Vec::new();
    let mut leading = String::new();

    while let Some(result) = lexer.next() {
        let text = lexer.slice();
        let kind = match result {
            Ok(LexKind::Whitespace) | Ok(LexKind::Comment) => {
                leading.push_str(text);
                continue;
            }
            Ok(kind) => SyntaxKind::from(kind),
            Err(()) => SyntaxKind::Unknown,
        };
        tokens.push(SyntaxToken::with_trivia(
            kind,
            std::mem::take(&mut leading),
            text,
            "",
        ));
    }

    tokens.push(SyntaxToken::with_trivia(SyntaxKind::EndOfFile, leading, "", ""));
    tokens
}
