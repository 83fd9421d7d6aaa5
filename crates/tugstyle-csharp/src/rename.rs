//! Global rename for C# symbols.
//!
//! 1. Validate the new name and refuse metadata symbols
//! 2. Widen a method to its linked methods (interface members and their
//!    implementations, overrides and what they override)
//! 3. Bind every C# document and collect the identifier tokens bound to the group
//! 4. Rewrite those tokens, tagging each with the rename-tracking annotation
//! 5. Re-bind the result and verify it:
//!    - every tracked token still binds to a renamed symbol
//!    - no untracked token has started to bind to one
//! 6. Refuse the rename if a renamed member would share its name with another
//!    member of its type
//!
//! Verification sees every tracked token in the new snapshot, including ones
//! left over from earlier renames. Callers must strip tracking annotations
//! between renames or the next verification reports a conflict.

use std::collections::HashMap;

use tracing::{debug, trace};

use tugstyle_core::annotation::{Annotation, AnnotationKind};
use tugstyle_core::error::{ServiceError, SolutionError};
use tugstyle_core::services::CancellationToken;
use tugstyle_core::solution::{Document, DocumentId, Language, ProjectId, Solution};
use tugstyle_core::symbols::{Symbol, SymbolId, SymbolKind};
use tugstyle_core::syntax::{SyntaxNode, TokenRef};
use tugstyle_core::text::byte_offset_to_position;
use tugstyle_core::types::Location;

use crate::binder::{Compilation, DocumentBindings};
use crate::validation::validate_identifier;

/// Rename `symbol` to `new_name` in every C# document of `solution`.
pub fn rename_symbol(
    solution: &Solution,
    symbol: &Symbol,
    new_name: &str,
    tracking: &AnnotationKind,
    cancel: &CancellationToken,
) -> Result<Solution, ServiceError> {
    cancel.check()?;
    validate_identifier(new_name)?;
    if symbol.is_metadata() {
        return Err(ServiceError::MetadataSymbol {
            name: symbol.qualified_name(),
        });
    }

    let mut binder = Binder::new(solution);
    let group = binder.rename_group(symbol);
    let ids: Vec<&SymbolId> = group.iter().map(Symbol::id).collect();
    let mut renamed = solution.clone();
    let mut rewritten = 0;

    for document in csharp_documents(solution) {
        cancel.check()?;
        let bindings = binder.bind(document, cancel)?;
        let mut paths: Vec<&[usize]> = ids
            .iter()
            .flat_map(|&id| bindings.tokens_bound_to(id))
            .collect();
        if paths.is_empty() {
            continue;
        }
        paths.sort_unstable();
        paths.dedup();

        let doc = document_ref(solution, document)?;
        let mut root = doc.root().clone();
        for path in paths {
            let Some(token) = root.element_at(path).and_then(|e| e.as_token().cloned()) else {
                continue;
            };
            let replacement = token
                .with_text(new_name)
                .with_annotation(Annotation::new(tracking.clone()));
            if let Some(next) = root.replace_at(path, replacement.into()) {
                root = next;
                rewritten += 1;
            }
        }
        trace!(document = %document, path = doc.path(), "rewrote references");
        renamed = renamed.with_document_root(document, root)?;
    }

    verify(&renamed, symbol, &ids, new_name, tracking, cancel)?;
    for member in &group {
        if let Some(clash) = binder.member_conflict(member, new_name)? {
            return Err(declaration_conflict(solution, &clash, symbol, new_name));
        }
    }
    debug!(
        symbol = %symbol.qualified_name(),
        to = new_name,
        linked = group.len() - 1,
        tokens = rewritten,
        "rename applied"
    );
    Ok(renamed)
}

/// Check the renamed snapshot for references that changed meaning.
fn verify(
    renamed: &Solution,
    symbol: &Symbol,
    ids: &[&SymbolId],
    new_name: &str,
    tracking: &AnnotationKind,
    cancel: &CancellationToken,
) -> Result<(), ServiceError> {
    let mut binder = Binder::new(renamed);
    for document in csharp_documents(renamed) {
        let bindings = binder.bind(document, cancel)?;
        let doc = document_ref(renamed, document)?;
        let tracked = doc.root().annotated_tokens(tracking);

        for token in &tracked {
            let bound = bindings.token_symbol(token.path());
            if !bound.is_some_and(|id| ids.contains(&id)) {
                return Err(conflict(doc, token.clone(), symbol, new_name));
            }
        }
        for id in ids {
            for path in bindings.tokens_bound_to(id) {
                if tracked.iter().any(|t| t.path() == path) {
                    continue;
                }
                if let Some(token) = token_at(doc.root(), path) {
                    return Err(conflict(doc, token, symbol, new_name));
                }
            }
        }
    }
    Ok(())
}

fn conflict(doc: &Document, token: TokenRef, symbol: &Symbol, new_name: &str) -> ServiceError {
    let (line, col) = byte_offset_to_position(&doc.text(), token.span().start as usize);
    ServiceError::Conflict {
        old_name: symbol.name().to_string(),
        new_name: new_name.to_string(),
        location: Location::new(doc.path(), line, col),
    }
}

/// A conflict reported at the declaration of the member `clash`.
fn declaration_conflict(solution: &Solution, clash: &Symbol, symbol: &Symbol, new_name: &str) -> ServiceError {
    let location = clash
        .location()
        .and_then(|at| {
            let doc = solution.document(at.document)?;
            let (line, col) = byte_offset_to_position(&doc.text(), at.span.start as usize);
            Some(Location::new(doc.path(), line, col))
        })
        .unwrap_or_else(|| Location::new(clash.qualified_name(), 1, 1));
    ServiceError::Conflict {
        old_name: symbol.name().to_string(),
        new_name: new_name.to_string(),
        location,
    }
}

fn token_at(root: &SyntaxNode, path: &[usize]) -> Option<TokenRef> {
    root.tokens().into_iter().find(|t| t.path() == path)
}

fn document_ref(solution: &Solution, document: DocumentId) -> Result<&Document, ServiceError> {
    Ok(solution
        .document(document)
        .ok_or(SolutionError::DocumentNotFound { document })?)
}

fn csharp_projects(solution: &Solution) -> Vec<ProjectId> {
    solution
        .projects()
        .filter(|p| p.language() == Language::CSharp)
        .map(|p| p.id())
        .collect()
}

/// Documents of every C# project, ordered by id.
fn csharp_documents(solution: &Solution) -> Vec<DocumentId> {
    solution
        .projects()
        .filter(|p| p.language() == Language::CSharp)
        .flat_map(|p| p.documents().iter().copied())
        .collect()
}

/// Binds documents, sharing one compilation per project.
struct Binder<'s> {
    solution: &'s Solution,
    compilations: HashMap<ProjectId, Compilation<'s>>,
}

impl<'s> Binder<'s> {
    fn new(solution: &'s Solution) -> Self {
        Binder {
            solution,
            compilations: HashMap::new(),
        }
    }

    fn compilation(&mut self, project: ProjectId) -> &Compilation<'s> {
        let solution = self.solution;
        self.compilations
            .entry(project)
            .or_insert_with(|| Compilation::new(solution, project))
    }

    fn bind(
        &mut self,
        document: DocumentId,
        cancel: &CancellationToken,
    ) -> Result<DocumentBindings, ServiceError> {
        let project = document_ref(self.solution, document)?.project();
        self.compilation(project).bind_document(document, cancel)
    }

    /// `symbol` plus every method linked to it, in any project.
    fn rename_group(&mut self, symbol: &Symbol) -> Vec<Symbol> {
        let mut group = vec![symbol.clone()];
        if symbol.kind() != SymbolKind::Method {
            return group;
        }
        loop {
            let before = group.len();
            for project in csharp_projects(self.solution) {
                let linked = self.compilation(project).linked_methods(&group);
                group.extend(linked);
            }
            if group.len() == before {
                return group;
            }
        }
    }

    /// A member that `member` would clash with once renamed, looked up in the
    /// project declaring it.
    fn member_conflict(&mut self, member: &Symbol, new_name: &str) -> Result<Option<Symbol>, ServiceError> {
        let Some(location) = member.location() else {
            return Ok(None);
        };
        let project = document_ref(self.solution, location.document)?.project();
        Ok(self.compilation(project).member_conflict(member, new_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    const TRACKING: &str = "test.csharp.rename-tracking";

    fn workspace(files: &[(&str, &str)]) -> (Solution, Vec<DocumentId>) {
        let (mut solution, project) = Solution::new().with_project("App", Language::CSharp);
        let mut ids = Vec::new();
        for (path, source) in files {
            let (next, id) = solution.with_document(project, *path, parse(source)).unwrap();
            solution = next;
            ids.push(id);
        }
        (solution, ids)
    }

    /// The symbol declared at the first token named `name` in `document`.
    fn declared(solution: &Solution, document: DocumentId, name: &str) -> Symbol {
        let root = solution.document(document).unwrap().root().clone();
        let bindings = Compilation::for_document(solution, document)
            .unwrap()
            .bind_document(document, &CancellationToken::new())
            .unwrap();
        bindings
            .declared
            .values()
            .filter(|s| s.name() == name)
            .min_by_key(|s| match s.id() {
                SymbolId::Source { path, .. } => root
                    .tokens()
                    .iter()
                    .position(|t| t.path() == path.as_slice())
                    .unwrap_or(usize::MAX),
                SymbolId::Metadata(_) => usize::MAX,
            })
            .cloned()
            .unwrap()
    }

    fn rename(solution: &Solution, symbol: &Symbol, new_name: &str) -> Result<Solution, ServiceError> {
        rename_symbol(
            solution,
            symbol,
            new_name,
            &AnnotationKind::new(TRACKING),
            &CancellationToken::new(),
        )
    }

    mod rewriting {
        use super::*;

        #[test]
        fn renames_declaration_and_references_across_documents() {
            let (s, docs) = workspace(&[
                ("App/Worker.cs", "class Worker { public void m_doWork() { } }"),
                ("App/Main.cs", "class Main { void Run(Worker w) { w.m_doWork(); } }"),
                ("App/Other.cs", "class Other { }"),
            ]);
            let symbol = declared(&s, docs[0], "m_doWork");
            let renamed = rename(&s, &symbol, "DoWork").unwrap();

            assert_eq!(
                renamed.document(docs[0]).unwrap().text(),
                "class Worker { public void DoWork() { } }"
            );
            assert_eq!(
                renamed.document(docs[1]).unwrap().text(),
                "class Main { void Run(Worker w) { w.DoWork(); } }"
            );
            assert_eq!(renamed.changed_documents(&s), vec![docs[0], docs[1]]);
        }

        #[test]
        fn rewritten_tokens_carry_tracking() {
            let (s, docs) = workspace(&[("App/A.cs", "class A { void go() { go(); go(); } }")]);
            let symbol = declared(&s, docs[0], "go");
            let renamed = rename(&s, &symbol, "Go").unwrap();
            let root = renamed.document(docs[0]).unwrap().root().clone();
            let tracked = root.annotated_tokens(&AnnotationKind::new(TRACKING));
            assert_eq!(tracked.len(), 3);
            assert!(tracked.iter().all(|t| t.text() == "Go"));
        }

        #[test]
        fn trivia_is_preserved() {
            let (s, docs) = workspace(&[(
                "App/A.cs",
                "class A {\n    // run it\n    void   run ( ) { }\n}\n",
            )]);
            let symbol = declared(&s, docs[0], "run");
            let renamed = rename(&s, &symbol, "Run").unwrap();
            assert_eq!(
                renamed.document(docs[0]).unwrap().text(),
                "class A {\n    // run it\n    void   Run ( ) { }\n}\n"
            );
        }
        #[test]
        fn overloads_of_a_different_arity_may_share_the_name() {
            let (s, docs) = workspace(&[("App/A.cs", "class A { void Run(int x) { } void run() { } }")]);
            let symbol = declared(&s, docs[0], "run");
            let renamed = rename(&s, &symbol, "Run").unwrap();
            assert_eq!(
                renamed.document(docs[0]).unwrap().text(),
                "class A { void Run(int x) { } void Run() { } }"
            );
        }

        #[test]
        fn interface_methods_rename_with_their_implementations() {
            let (s, docs) = workspace(&[
                ("App/I.cs", "interface I { void run(); }"),
                ("App/A.cs", "class A : I { public void run() { } void R(I i) { i.run(); } }"),
            ]);
            let symbol = declared(&s, docs[0], "run");
            let renamed = rename(&s, &symbol, "Run").unwrap();
            assert_eq!(
                renamed.document(docs[0]).unwrap().text(),
                "interface I { void Run(); }"
            );
            assert_eq!(
                renamed.document(docs[1]).unwrap().text(),
                "class A : I { public void Run() { } void R(I i) { i.Run(); } }"
            );

            let implementation = declared(&s, docs[1], "run");
            let from_implementation = rename(&s, &implementation, "Run").unwrap();
            assert_eq!(
                from_implementation.document(docs[0]).unwrap().text(),
                "interface I { void Run(); }"
            );
        }

        #[test]
        fn overrides_rename_with_the_method_they_override() {
            let (s, docs) = workspace(&[(
                "App/A.cs",
                "class B { public virtual void go() { } } class C : B { public override void go() { } void R(B b) { b.go(); } }",
            )]);
            let symbol = declared(&s, docs[0], "go");
            let renamed = rename(&s, &symbol, "Go").unwrap();
            assert_eq!(
                renamed.document(docs[0]).unwrap().text(),
                "class B { public virtual void Go() { } } class C : B { public override void Go() { } void R(B b) { b.Go(); } }"
            );
        }
    }

    mod rejections {
        use super::*;

        #[test]
        fn invalid_names_are_rejected() {
            let (s, docs) = workspace(&[("App/A.cs", "class A { void go() { } }")]);
            let symbol = declared(&s, docs[0], "go");
            for name in ["", "1x", "class"] {
                assert!(matches!(
                    rename(&s, &symbol, name),
                    Err(ServiceError::InvalidIdentifier { .. })
                ));
            }
        }

        #[test]
        fn metadata_symbols_are_rejected() {
            let (s, _) = workspace(&[("App/A.cs", "class A { }")]);
            let symbol = Symbol::new(
                SymbolId::Metadata("System.Int32.Parse".into()),
                SymbolKind::Method,
                "Parse",
            );
            assert!(matches!(
                rename(&s, &symbol, "parse"),
                Err(ServiceError::MetadataSymbol { .. })
            ));
        }

        #[test]
        fn capturing_an_existing_member_is_a_conflict() {
            let source = "class A {\n    void DoWork() { }\n    void m_doWork() { }\n    void go() { m_doWork(); }\n}\n";
            let (s, docs) = workspace(&[("App/A.cs", source)]);
            let symbol = declared(&s, docs[0], "m_doWork");
            match rename(&s, &symbol, "DoWork") {
                Err(ServiceError::Conflict {
                    old_name,
                    new_name,
                    location,
                }) => {
                    assert_eq!(old_name, "m_doWork");
                    assert_eq!(new_name, "DoWork");
                    assert_eq!(location.file, "App/A.cs");
                    assert_eq!(location.line, 4);
                }
                other => panic!("expected conflict, got {other:?}"),
            }
        }

        #[test]
        fn taking_the_name_of_a_property_or_field_is_a_conflict() {
            for (source, old, new) in [
                ("class A {\n    int Process { get; set; }\n    void process() { }\n}\n", "process", "Process"),
                ("class A {\n    int Run;\n    void run() { }\n}\n", "run", "Run"),
            ] {
                let (s, docs) = workspace(&[("App/A.cs", source)]);
                let symbol = declared(&s, docs[0], old);
                match rename(&s, &symbol, new) {
                    Err(ServiceError::Conflict { new_name, location, .. }) => {
                        assert_eq!(new_name, new);
                        assert_eq!(location.file, "App/A.cs");
                        assert_eq!(location.line, 2);
                    }
                    other => panic!("expected conflict for {old}, got {other:?}"),
                }
            }
        }

        #[test]
        fn taking_the_name_of_the_containing_type_is_a_conflict() {
            let (s, docs) = workspace(&[("App/A.cs", "class Run { void run() { } }")]);
            let symbol = declared(&s, docs[0], "run");
            assert!(matches!(
                rename(&s, &symbol, "Run"),
                Err(ServiceError::Conflict { .. })
            ));
        }

        #[test]
        fn stale_tracking_is_a_conflict() {
            let (s, docs) = workspace(&[("App/A.cs", "class A { void m_a() { } void m_b() { m_a(); } }")]);
            let first = declared(&s, docs[0], "m_a");
            let after_first = rename(&s, &first, "A1").unwrap();
            let second = declared(&after_first, docs[0], "m_b");
            assert!(matches!(
                rename(&after_first, &second, "B1"),
                Err(ServiceError::Conflict { .. })
            ));
        }

        #[test]
        fn cancellation_is_checked_first() {
            let (s, docs) = workspace(&[("App/A.cs", "class A { void go() { } }")]);
            let symbol = declared(&s, docs[0], "go");
            let cancel = CancellationToken::new();
            cancel.cancel();
            let err = rename_symbol(&s, &symbol, "Go", &AnnotationKind::new(TRACKING), &cancel).unwrap_err();
            assert!(matches!(err, ServiceError::Cancelled));
        }
    }
}
