//! Built-in metadata types.
//!
//! A small, fixed table of the `System` types that have keyword aliases, plus
//! the handful of members that code in the supported subset commonly reaches
//! for. Symbols built from this table are metadata symbols: they resolve but
//! can never be renamed.

use tugstyle_core::symbols::{Symbol, SymbolId, SymbolKind};

/// Namespace that holds every built-in type.
pub const SYSTEM_NAMESPACE: &str = "System";

#[derive(Debug)]
pub struct BuiltinType {
    /// Metadata name inside `System`, e.g. `Int32`.
    pub name: &'static str,
    /// Keyword alias, e.g. `int`.
    pub keyword: Option<&'static str>,
    pub members: &'static [BuiltinMember],
}

#[derive(Debug)]
pub struct BuiltinMember {
    pub name: &'static str,
    pub kind: SymbolKind,
    /// Metadata name of the member's type (method return type).
    pub ty: &'static str,
}

const fn method(name: &'static str, ty: &'static str) -> BuiltinMember {
    BuiltinMember {
        name,
        kind: SymbolKind::Method,
        ty,
    }
}

const fn field(name: &'static str, ty: &'static str) -> BuiltinMember {
    BuiltinMember {
        name,
        kind: SymbolKind::Field,
        ty,
    }
}

const fn property(name: &'static str, ty: &'static str) -> BuiltinMember {
    BuiltinMember {
        name,
        kind: SymbolKind::Property,
        ty,
    }
}

const fn numeric(name: &'static str, keyword: &'static str) -> BuiltinType {
    BuiltinType {
        name,
        keyword: Some(keyword),
        members: NUMERIC_MEMBERS,
    }
}

const NUMERIC_MEMBERS: &[BuiltinMember] = &[
    method("Parse", "Self"),
    method("TryParse", "Boolean"),
    field("MaxValue", "Self"),
    field("MinValue", "Self"),
    method("CompareTo", "Int32"),
];

/// Every built-in type, keyword aliases first.
pub static BUILTINS: &[BuiltinType] = &[
    BuiltinType {
        name: "Boolean",
        keyword: Some("bool"),
        members: &[method("Parse", "Boolean"), method("TryParse", "Boolean")],
    },
    numeric("Byte", "byte"),
    BuiltinType {
        name: "Char",
        keyword: Some("char"),
        members: &[
            method("IsDigit", "Boolean"),
            method("IsLetter", "Boolean"),
            method("IsUpper", "Boolean"),
            method("ToUpper", "Char"),
        ],
    },
    numeric("Decimal", "decimal"),
    numeric("Double", "double"),
    numeric("Int16", "short"),
    numeric("Int32", "int"),
    numeric("Int64", "long"),
    BuiltinType {
        name: "Object",
        keyword: Some("object"),
        members: &[
            method("ToString", "String"),
            method("Equals", "Boolean"),
            method("GetHashCode", "Int32"),
            method("ReferenceEquals", "Boolean"),
        ],
    },
    numeric("SByte", "sbyte"),
    numeric("Single", "float"),
    BuiltinType {
        name: "String",
        keyword: Some("string"),
        members: &[
            field("Empty", "String"),
            method("IsNullOrEmpty", "Boolean"),
            method("IsNullOrWhiteSpace", "Boolean"),
            method("Concat", "String"),
            method("Join", "String"),
            method("Format", "String"),
            method("Compare", "Int32"),
            property("Length", "Int32"),
            method("ToUpper", "String"),
            method("ToLower", "String"),
            method("Trim", "String"),
            method("Contains", "Boolean"),
            method("Substring", "String"),
        ],
    },
    numeric("UInt16", "ushort"),
    numeric("UInt32", "uint"),
    numeric("UInt64", "ulong"),
    BuiltinType {
        name: "Void",
        keyword: Some("void"),
        members: &[],
    },
];

/// Index of the type aliased by `keyword` (`int` -> `Int32`).
pub fn by_keyword(keyword: &str) -> Option<usize> {
    BUILTINS.iter().position(|t| t.keyword == Some(keyword))
}

/// Index of the type with metadata name `name`.
pub fn by_name(name: &str) -> Option<usize> {
    BUILTINS.iter().position(|t| t.name == name)
}

/// Canonical type name for a keyword alias.
pub fn canonical_name(keyword: &str) -> Option<&'static str> {
    by_keyword(keyword).map(|index| BUILTINS[index].name)
}

/// The named-type symbol of built-in type `index`.
pub fn type_symbol(index: usize) -> Symbol {
    let name = BUILTINS[index].name;
    Symbol::new(
        SymbolId::Metadata(format!("{SYSTEM_NAMESPACE}.{name}")),
        SymbolKind::NamedType,
        name,
    )
}

/// Look up `name` on built-in type `index`, falling back to `Object` members.
///
/// Returns the member symbol and the index of the member's type.
pub fn member(index: usize, name: &str) -> Option<(Symbol, Option<usize>)> {
    let (owner, member) = find_member(index, name).or_else(|| {
        let object = by_name("Object")?;
        find_member(object, name)
    })?;
    let owner_name = BUILTINS[owner].name;
    let symbol = Symbol::new(
        SymbolId::Metadata(format!("{SYSTEM_NAMESPACE}.{owner_name}.{}", member.name)),
        member.kind,
        member.name,
    )
    .with_containing_type(type_symbol(owner));
    let ty = if member.ty == "Self" {
        Some(owner)
    } else {
        by_name(member.ty)
    };
    Some((symbol, ty))
}

fn find_member(index: usize, name: &str) -> Option<(usize, &'static BuiltinMember)> {
    BUILTINS[index]
        .members
        .iter()
        .find(|m| m.name == name)
        .map(|m| (index, m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_map_to_canonical_names() {
        assert_eq!(canonical_name("int"), Some("Int32"));
        assert_eq!(canonical_name("string"), Some("String"));
        assert_eq!(canonical_name("float"), Some("Single"));
        assert_eq!(canonical_name("var"), None);
        for keyword in crate::lexer::PREDEFINED_TYPES {
            assert!(canonical_name(keyword).is_some(), "no builtin for {keyword}");
        }
    }

    #[test]
    fn type_symbols_are_metadata() {
        let int = type_symbol(by_keyword("int").unwrap());
        assert_eq!(int.name(), "Int32");
        assert_eq!(int.id(), &SymbolId::Metadata("System.Int32".to_string()));
        assert!(int.is_metadata());
    }

    #[test]
    fn members_resolve_with_containing_type() {
        let int = by_name("Int32").unwrap();
        let (parse, ty) = member(int, "Parse").unwrap();
        assert_eq!(parse.qualified_name(), "Int32.Parse");
        assert_eq!(parse.kind(), SymbolKind::Method);
        assert_eq!(ty, Some(int));

        let (to_string, ty) = member(int, "ToString").unwrap();
        assert_eq!(to_string.id(), &SymbolId::Metadata("System.Object.ToString".into()));
        assert_eq!(ty, by_name("String"));

        assert!(member(int, "Frobnicate").is_none());
    }
}
