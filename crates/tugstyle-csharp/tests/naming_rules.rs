//! End-to-end tests for the C# naming rules.
//!
//! Each test builds an in-memory solution from C# sources, runs one rule
//! through the rename engine and inspects the resulting snapshot.

use std::sync::Arc;

use tugstyle_core::annotation::AnnotationKind;
use tugstyle_core::dispatch::RuleDispatcher;
use tugstyle_core::engine::{RenameEngine, RenameReport, RuleId};
use tugstyle_core::error::{EngineError, ServiceError};
use tugstyle_core::services::CancellationToken;
use tugstyle_core::solution::{DocumentId, Language, ProjectId, Solution};
use tugstyle_core::syntax::{SyntaxKind, SyntaxNode};
use tugstyle_csharp::rules;
use tugstyle_csharp::services::RENAME_TRACKING_KIND;
use tugstyle_csharp::{parse, CSharpServices};

/// Projects of `(name, files)`; every project references all earlier ones.
fn solution(projects: &[(&str, &[(&str, &str)])]) -> (Solution, Vec<DocumentId>) {
    let mut solution = Solution::new();
    let mut project_ids: Vec<ProjectId> = Vec::new();
    let mut documents = Vec::new();
    for (name, files) in projects {
        let (next, project) = solution.with_project(*name, Language::CSharp);
        solution = next;
        for earlier in &project_ids {
            solution = solution.with_project_reference(project, *earlier).unwrap();
        }
        for (path, source) in files.iter() {
            let (next, document) = solution.with_document(project, *path, parse(source)).unwrap();
            solution = next;
            documents.push(document);
        }
        project_ids.push(project);
    }
    (solution, documents)
}

fn engine(rule: RuleId) -> RenameEngine {
    rules::engine(rule, Arc::new(CSharpServices::new()), '_')
}

fn run(rule: RuleId, solution: &Solution, document: DocumentId) -> Result<RenameReport, EngineError> {
    let root = solution.document(document).unwrap().root().clone();
    engine(rule).run(solution, document, &root, &CancellationToken::new())
}

fn text(solution: &Solution, document: DocumentId) -> String {
    solution.document(document).unwrap().text()
}

fn has_annotations(root: &SyntaxNode) -> bool {
    root.descendants().iter().any(|n| !n.node().annotations().is_empty())
        || root.tokens().iter().any(|t| !t.token().annotations().is_empty())
}

// ============================================================================
// Method Naming
// ============================================================================

mod method_naming {
    use super::*;

    const WORKER: &str = "namespace Lib\n{\n    public class Worker\n    {\n        public void m_doWork() { }\n        public void process() { m_doWork(); }\n    }\n}\n";
    const PROGRAM: &str = "using Lib;\n\nnamespace App\n{\n    class Program\n    {\n        void Run()\n        {\n            var w = new Worker();\n            w.m_doWork();\n            w.process();\n        }\n    }\n}\n";

    #[test]
    fn renames_declarations_and_references_across_projects() {
        let (s, docs) = solution(&[
            ("Lib", &[("Lib/Worker.cs", WORKER)]),
            ("App", &[("App/Program.cs", PROGRAM)]),
        ]);
        let report = run(RuleId::MethodNaming, &s, docs[0]).unwrap();

        assert_eq!(report.candidates, 2);
        assert_eq!(report.skipped, 0);
        let renames: Vec<(&str, &str)> = report
            .renames
            .iter()
            .map(|d| (d.old_name.as_str(), d.new_name.as_str()))
            .collect();
        assert_eq!(renames, vec![("m_doWork", "DoWork"), ("process", "Process")]);

        assert_eq!(
            text(&report.solution, docs[0]),
            WORKER.replace("m_doWork", "DoWork").replace("process", "Process")
        );
        assert_eq!(
            text(&report.solution, docs[1]),
            PROGRAM.replace("m_doWork", "DoWork").replace("process", "Process")
        );
    }

    #[test]
    fn short_names_are_skipped() {
        let source = "class A { void a_() { } void go() { go(); } }";
        let (s, docs) = solution(&[("App", &[("App/A.cs", source)])]);
        let report = run(RuleId::MethodNaming, &s, docs[0]).unwrap();

        assert_eq!(report.candidates, 2);
        assert_eq!(report.skipped, 2);
        assert!(report.renames.is_empty());
        assert_eq!(text(&report.solution, docs[0]), source);
        assert!(!has_annotations(report.solution.document(docs[0]).unwrap().root()));
    }

    #[test]
    fn nested_types_are_scanned() {
        let source = "class Outer { void m_run() { } class Inner { void stop() { } } }";
        let (s, docs) = solution(&[("App", &[("App/A.cs", source)])]);
        let report = run(RuleId::MethodNaming, &s, docs[0]).unwrap();
        assert_eq!(
            text(&report.solution, docs[0]),
            "class Outer { void Run() { } class Inner { void Stop() { } } }"
        );
    }

    #[test]
    fn renames_follow_declaration_order() {
        let source = "class A { void beta() { alpha(); } void alpha() { beta(); } }";
        let (s, docs) = solution(&[("App", &[("App/A.cs", source)])]);
        let report = run(RuleId::MethodNaming, &s, docs[0]).unwrap();
        let order: Vec<&str> = report.renames.iter().map(|d| d.new_name.as_str()).collect();
        assert_eq!(order, vec!["Beta", "Alpha"]);
        assert_eq!(
            text(&report.solution, docs[0]),
            "class A { void Beta() { Alpha(); } void Alpha() { Beta(); } }"
        );
    }

    #[test]
    fn second_run_is_a_no_op() {
        let (s, docs) = solution(&[
            ("Lib", &[("Lib/Worker.cs", WORKER)]),
            ("App", &[("App/Program.cs", PROGRAM)]),
        ]);
        let first = run(RuleId::MethodNaming, &s, docs[0]).unwrap();
        let second = run(RuleId::MethodNaming, &first.solution, docs[0]).unwrap();
        assert_eq!(second.candidates, 0);
        assert!(second.solution.same_trees(&first.solution));
    }

    #[test]
    fn clean_documents_keep_their_snapshot() {
        let (s, docs) = solution(&[("App", &[("App/A.cs", "class A { void Run() { } }")])]);
        let report = run(RuleId::MethodNaming, &s, docs[0]).unwrap();
        assert_eq!(report.candidates, 0);
        assert!(report.solution.same_trees(&s));
    }

    #[test]
    fn result_carries_no_annotations() {
        let (s, docs) = solution(&[
            ("Lib", &[("Lib/Worker.cs", WORKER)]),
            ("App", &[("App/Program.cs", PROGRAM)]),
        ]);
        let report = run(RuleId::MethodNaming, &s, docs[0]).unwrap();
        let tracking = AnnotationKind::new(RENAME_TRACKING_KIND);
        for doc in report.solution.documents() {
            assert!(!doc.root().contains_annotation_kind(&tracking), "{}", doc.path());
            assert!(!has_annotations(doc.root()), "{}", doc.path());
        }
    }

    #[test]
    fn untouched_documents_share_trees() {
        let (s, docs) = solution(&[(
            "App",
            &[
                ("App/A.cs", "class A { void m_go() { } }"),
                ("App/B.cs", "class B { void Stop() { } }"),
            ],
        )]);
        let report = run(RuleId::MethodNaming, &s, docs[0]).unwrap();
        assert_eq!(report.solution.changed_documents(&s), vec![docs[0]]);
        assert!(report
            .solution
            .document(docs[1])
            .unwrap()
            .root()
            .ptr_eq(s.document(docs[1]).unwrap().root()));
    }

    #[test]
    fn capturing_rename_is_a_conflict() {
        let source = "class A\n{\n    void DoWork() { }\n    void m_doWork() { }\n    void Go() { m_doWork(); }\n}\n";
        let (s, docs) = solution(&[("App", &[("App/A.cs", source)])]);
        let err = run(RuleId::MethodNaming, &s, docs[0]).unwrap_err();
        match err {
            EngineError::Service(ServiceError::Conflict { location, .. }) => {
                assert_eq!(location.file, "App/A.cs");
                assert_eq!(location.line, 5);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn interface_methods_rename_with_implementations() {
        let source = "interface I { void run(); }\nclass A : I { public void run() { } void R(I i) { i.run(); } }\n";
        let (s, docs) = solution(&[("App", &[("App/A.cs", source)])]);
        let report = run(RuleId::MethodNaming, &s, docs[0]).unwrap();
        assert_eq!(report.candidates, 2);
        assert_eq!(report.renames.len(), 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(text(&report.solution, docs[0]), source.replace("run", "Run"));
    }

    #[test]
    fn generic_and_async_signatures_are_scanned() {
        let source = "class A
{
    List<int> items() { return null; }
    async Task<int> load() { return await fetch(); }
    Task<int> fetch() { return null; }
    void R() { var x = items(); }
}
";
        let (s, docs) = solution(&[("App", &[("App/A.cs", source)])]);
        let report = run(RuleId::MethodNaming, &s, docs[0]).unwrap();
        assert_eq!(report.candidates, 3);
        assert_eq!(
            text(&report.solution, docs[0]),
            source
                .replace("items", "Items")
                .replace("load", "Load")
                .replace("fetch", "Fetch")
        );
    }

    #[test]
    fn non_ascii_names_are_scanned() {
        let source = "class A { void éclair() { } void R() { éclair(); } }";
        let (s, docs) = solution(&[("App", &[("App/A.cs", source)])]);
        let report = run(RuleId::MethodNaming, &s, docs[0]).unwrap();
        assert_eq!(
            text(&report.solution, docs[0]),
            "class A { void Éclair() { } void R() { Éclair(); } }"
        );
    }

    #[test]
    fn taking_a_property_name_is_a_conflict() {
        let source = "class A
{
    int Process { get; set; }
    void process() { }
}
";
        let (s, docs) = solution(&[("App", &[("App/A.cs", source)])]);
        let err = run(RuleId::MethodNaming, &s, docs[0]).unwrap_err();
        match err {
            EngineError::Service(ServiceError::Conflict { location, .. }) => {
                assert_eq!(location.line, 3);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn cancellation_returns_committed_snapshot() {
        let source = "class A { void m_go() { } }";
        let (s, docs) = solution(&[("App", &[("App/A.cs", source)])]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let root = s.document(docs[0]).unwrap().root().clone();
        let err = engine(RuleId::MethodNaming)
            .run(&s, docs[0], &root, &cancel)
            .unwrap_err();
        match err {
            EngineError::Cancelled {
                completed,
                total,
                committed,
            } => {
                assert_eq!((completed, total), (0, 1));
                assert_eq!(text(&committed, docs[0]), source);
                assert!(!has_annotations(committed.document(docs[0]).unwrap().root()));
            }
            other => panic!("expected cancellation, got {other:?}"),
        }
    }
}

// ============================================================================
// Static Access
// ============================================================================

mod static_access {
    use super::*;

    #[test]
    fn keyword_qualifiers_become_type_names() {
        let source = "class A\n{\n    int Run(string s)\n    {\n        return int.Parse(s) + int.MaxValue;\n    }\n}\n";
        let (s, docs) = solution(&[("App", &[("App/A.cs", source)])]);
        let report = run(RuleId::StaticAccess, &s, docs[0]).unwrap();

        assert_eq!(report.candidates, 2);
        assert_eq!(report.skipped, 2);
        assert!(report.renames.is_empty());
        assert_eq!(
            text(&report.solution, docs[0]),
            source.replace("int.", "Int32.")
        );
        assert!(!has_annotations(report.solution.document(docs[0]).unwrap().root()));
    }

    #[test]
    fn nested_accesses_are_canonicalized() {
        let source = "class A { int Run() { return string.Empty.Length + long.MaxValue.CompareTo(0); } }";
        let (s, docs) = solution(&[("App", &[("App/A.cs", source)])]);
        let report = run(RuleId::StaticAccess, &s, docs[0]).unwrap();
        assert_eq!(
            text(&report.solution, docs[0]),
            "class A { int Run() { return String.Empty.Length + Int64.MaxValue.CompareTo(0); } }"
        );
    }

    #[test]
    fn canonical_code_is_left_alone() {
        let source = "class A { int Run(string s) { return Int32.Parse(s); } }";
        let (s, docs) = solution(&[("App", &[("App/A.cs", source)])]);
        let report = run(RuleId::StaticAccess, &s, docs[0]).unwrap();
        assert_eq!(report.candidates, 0);
        assert!(report.solution.same_trees(&s));
    }

    #[test]
    fn second_run_is_a_no_op() {
        let source = "class A { void Run() { var n = double.Parse(\"1\"); } }";
        let (s, docs) = solution(&[("App", &[("App/A.cs", source)])]);
        let first = run(RuleId::StaticAccess, &s, docs[0]).unwrap();
        assert_eq!(
            text(&first.solution, docs[0]),
            "class A { void Run() { var n = Double.Parse(\"1\"); } }"
        );
        let second = run(RuleId::StaticAccess, &first.solution, docs[0]).unwrap();
        assert_eq!(second.candidates, 0);
    }
}

// ============================================================================
// Dispatch
// ============================================================================

mod dispatch {
    use super::*;

    fn dispatcher(rule: RuleId) -> RuleDispatcher {
        let mut dispatcher = RuleDispatcher::new(rule);
        dispatcher.register(engine(rule));
        dispatcher
    }

    #[test]
    fn csharp_documents_are_dispatched() {
        let (s, docs) = solution(&[("App", &[("App/A.cs", "class A { void m_run() { } }")])]);
        let dispatcher = dispatcher(RuleId::MethodNaming);
        assert!(dispatcher.supports(Language::CSharp));
        let report = dispatcher
            .process(&s, docs[0], &CancellationToken::new())
            .unwrap();
        assert_eq!(text(&report.solution, docs[0]), "class A { void Run() { } }");
    }

    #[test]
    fn visual_basic_is_unsupported() {
        let (s, project) = Solution::new().with_project("Legacy", Language::VisualBasic);
        let (s, doc) = s
            .with_document(
                project,
                "Legacy/Module1.vb",
                SyntaxNode::new(SyntaxKind::CompilationUnit, Vec::new()),
            )
            .unwrap();
        for rule in RuleId::ALL {
            let dispatcher = dispatcher(rule);
            assert!(!dispatcher.supports(Language::VisualBasic));
            let err = dispatcher
                .process(&s, doc, &CancellationToken::new())
                .unwrap_err();
            assert!(matches!(
                err,
                EngineError::Unsupported {
                    language: Language::VisualBasic,
                    ..
                }
            ));
        }
    }
}
