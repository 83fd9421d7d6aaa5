//! Method naming: method names start upper-case and carry no `x_` prefix.

use tugstyle_core::annotation::Annotation;
use tugstyle_core::engine::{CandidateSite, EngineResult, NamingRule, RuleId, ScanOutcome};
use tugstyle_core::rewrite::{walk_node, Rewriter};
use tugstyle_core::symbols::Symbol;
use tugstyle_core::syntax::{SyntaxKind, SyntaxNode};

/// Renames `m_doWork` to `DoWork` and `process` to `Process`.
#[derive(Debug, Clone, Copy)]
pub struct MethodNamingRule {
    separator: char,
}

impl MethodNamingRule {
    pub fn new(separator: char) -> Self {
        MethodNamingRule { separator }
    }
}

impl Default for MethodNamingRule {
    fn default() -> Self {
        MethodNamingRule::new('_')
    }
}

impl NamingRule for MethodNamingRule {
    fn id(&self) -> RuleId {
        RuleId::MethodNaming
    }

    fn scan(&self, root: &SyntaxNode, marker: &Annotation) -> ScanOutcome {
        let mut scanner = MethodScanner { marker, count: 0 };
        let root = scanner.rewrite_node(root);
        ScanOutcome {
            root,
            count: scanner.count,
        }
    }

    fn resolve(&self, site: &mut CandidateSite<'_>) -> EngineResult<Symbol> {
        site.model()
            .declared_symbol(site.candidate())
            .ok_or_else(|| site.unresolved())
    }

    fn desired_name(&self, symbol: &Symbol) -> String {
        desired_method_name(symbol.name(), self.separator)
    }
}

/// Tags method declarations whose name is a candidate.
struct MethodScanner<'a> {
    marker: &'a Annotation,
    count: usize,
}

impl Rewriter for MethodScanner<'_> {
    fn rewrite_node(&mut self, node: &SyntaxNode) -> SyntaxNode {
        if node.kind() != SyntaxKind::MethodDeclaration {
            return walk_node(self, node);
        }
        let is_candidate = node
            .child_token(SyntaxKind::Identifier)
            .is_some_and(|name| is_candidate_name(name.text()));
        if is_candidate {
            self.count += 1;
            node.with_annotation(self.marker.clone())
        } else {
            node.clone()
        }
    }
}

/// Non-blank, longer than one character, lower-case first character.
pub fn is_candidate_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name.chars().count() > 1
        && name.chars().next().is_some_and(char::is_lowercase)
}

/// The conventional form of method name `name`.
///
/// Drops a `<letter><separator>` prefix from names longer than two characters,
/// then upper-cases the first character of results longer than two
/// characters. Shorter results keep their case. A result that would be empty
/// falls back to `name`.
pub fn desired_method_name(name: &str, separator: char) -> String {
    let chars: Vec<char> = name.chars().collect();
    let stripped: String = if chars.len() > 2 && chars[0].is_alphabetic() && chars[1] == separator {
        chars[2..].iter().collect()
    } else {
        name.to_string()
    };
    if stripped.is_empty() {
        return name.to_string();
    }

    let mut rest = stripped.chars();
    match rest.next() {
        Some(first) if stripped.chars().count() > 2 && !first.is_uppercase() => {
            first.to_uppercase().chain(rest).collect()
        }
        _ => stripped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tugstyle_core::annotation::AnnotationKind;

    use crate::parser::parse;

    mod naming_policy {
        use super::*;

        #[test]
        fn prefix_is_stripped_and_capitalised() {
            assert_eq!(desired_method_name("m_doWork", '_'), "DoWork");
            assert_eq!(desired_method_name("s_total", '_'), "Total");
        }

        #[test]
        fn plain_lower_case_is_capitalised() {
            assert_eq!(desired_method_name("process", '_'), "Process");
            assert_eq!(desired_method_name("Process", '_'), "Process");
        }

        #[test]
        fn short_names_keep_their_case() {
            assert_eq!(desired_method_name("a_", '_'), "a_");
            assert_eq!(desired_method_name("go", '_'), "go");
            assert_eq!(desired_method_name("m_go", '_'), "go");
            assert_eq!(desired_method_name("m_x", '_'), "x");
        }

        #[test]
        fn separator_is_configurable() {
            assert_eq!(desired_method_name("m_doWork", '$'), "M_doWork");
            assert_eq!(desired_method_name("m$doWork", '$'), "DoWork");
        }

        #[test]
        fn prefix_needs_a_leading_letter() {
            assert_eq!(desired_method_name("__init", '_'), "__init");
            assert_eq!(desired_method_name("_x_y", '_'), "_x_y");
        }

        #[test]
        fn candidate_names() {
            assert!(is_candidate_name("process"));
            assert!(is_candidate_name("a_"));
            assert!(!is_candidate_name("x"));
            assert!(!is_candidate_name("Process"));
            assert!(!is_candidate_name("_private"));
            assert!(!is_candidate_name(""));
        }
    }

    mod scanning {
        use super::*;

        fn scan(source: &str) -> (SyntaxNode, ScanOutcome, Annotation) {
            let root = parse(source);
            let marker = Annotation::new(AnnotationKind::new("test.marker"));
            let outcome = MethodNamingRule::default().scan(&root, &marker);
            (root, outcome, marker)
        }

        #[test]
        fn tags_only_lower_case_method_declarations() {
            let (_, outcome, marker) = scan(
                "class A { void m_doWork() { x(); } void Run() { } void q() { } int field; void a_() { } }",
            );
            let marked = outcome.root.annotated_nodes(&marker);
            assert_eq!(outcome.count, 2);
            assert_eq!(marked.len(), outcome.count);
            let names: Vec<String> = marked
                .iter()
                .map(|n| n.node().child_token(SyntaxKind::Identifier).unwrap().text().to_string())
                .collect();
            assert_eq!(names, vec!["m_doWork", "a_"]);
        }

        #[test]
        fn generic_return_types_and_modifiers_do_not_hide_methods() {
            let (_, outcome, marker) = scan(
                "interface I { List<int> items(); }\nclass A { public async Task<Dictionary<string, int>> load<T>(T x) where T : I { } }",
            );
            let names: Vec<String> = outcome
                .root
                .annotated_nodes(&marker)
                .iter()
                .map(|n| n.node().child_token(SyntaxKind::Identifier).unwrap().text().to_string())
                .collect();
            assert_eq!(names, vec!["items", "load"]);
        }

        #[test]
        fn scanning_changes_nothing_but_annotations() {
            let source = "namespace N { class A { void run() { } class B { void go() { } } } }";
            let (root, outcome, _) = scan(source);
            assert_eq!(outcome.count, 2);
            assert_eq!(outcome.root.text(), root.text());
        }

        #[test]
        fn clean_tree_is_returned_as_is() {
            let (root, outcome, _) = scan("class A { void Run() { } }");
            assert_eq!(outcome.count, 0);
            assert!(outcome.root.ptr_eq(&root));
        }
    }
}
