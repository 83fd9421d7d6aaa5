//! The rename engine: scan, mark, then rename candidates one at a time.
//!
//! A [`RenameEngine`] pairs one [`NamingRule`] with the [`LanguageServices`] of
//! one language. For a document it:
//!
//! 1. runs the rule's scanner, which tags every candidate with a fresh marker;
//! 2. returns the input snapshot untouched if nothing was tagged;
//! 3. otherwise installs the tagged tree and, for each marker index in order,
//!    re-derives the semantic model, re-finds the `i`-th marked node in the
//!    *current* tree, resolves its symbol, asks the rule for the desired name
//!    and, if it differs, performs a global rename;
//! 4. after each rename strips the rename service's tracking annotations from
//!    every document the rename changed;
//! 5. strips its own markers and returns the final snapshot.
//!
//! Candidates are never addressed by node handle across iterations. Every
//! rename produces new trees, so the marker is the only stable address.
//!
//! The loop is strictly sequential: candidate `i + 1` is resolved against the
//! snapshot produced by candidate `i`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::annotation::{Annotation, AnnotationContext, AnnotationKind};
use crate::error::{EngineError, ServiceError};
use crate::rewrite::AnnotationCleaner;
use crate::services::{CancellationToken, LanguageServices, SemanticModel};
use crate::solution::{DocumentId, Language, Solution};
use crate::symbols::Symbol;
use crate::syntax::{NodeRef, SyntaxElement, SyntaxNode};

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// ============================================================================
// Rule Identity
// ============================================================================

/// The naming rules tugstyle knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleId {
    /// Method names start with an upper-case letter and carry no `x_` prefix.
    MethodNaming,
    /// Static members are accessed through the canonical type name, not the keyword alias.
    StaticAccess,
}

impl RuleId {
    /// Every rule, in the order they run by default.
    pub const ALL: [RuleId; 2] = [RuleId::MethodNaming, RuleId::StaticAccess];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::MethodNaming => "method-naming",
            RuleId::StaticAccess => "static-access",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleId::ALL
            .into_iter()
            .find(|rule| rule.as_str() == s)
            .ok_or_else(|| format!("unknown rule '{}'", s))
    }
}

// ============================================================================
// Rule Interface
// ============================================================================

/// Output of a candidate scan.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// The input tree with every candidate tagged.
    pub root: SyntaxNode,
    /// Number of markers added. Always equals the marked nodes in `root`.
    pub count: usize,
}

/// The policy half of a rename engine: where the candidates are and what they should be called.
pub trait NamingRule: Send + Sync {
    fn id(&self) -> RuleId;

    /// Tag every candidate in `root` with `marker`.
    ///
    /// Must only add annotations. Identifiers, literals and structure are
    /// left as they are.
    fn scan(&self, root: &SyntaxNode, marker: &Annotation) -> ScanOutcome;

    /// Resolve the symbol to rename for the candidate at `site`.
    ///
    /// A rule may rewrite the candidate's surroundings first via
    /// [`CandidateSite::replace`]; the rewrite is kept even if no rename follows.
    fn resolve(&self, site: &mut CandidateSite<'_>) -> EngineResult<Symbol>;

    /// The name `symbol` should have. Returning the current name means "leave it".
    fn desired_name(&self, symbol: &Symbol) -> String;
}

/// One marked candidate, positioned in the current snapshot.
///
/// Handed to [`NamingRule::resolve`]. The candidate reference and the semantic
/// model always describe the same snapshot.
pub struct CandidateSite<'a> {
    services: &'a dyn LanguageServices,
    cancel: &'a CancellationToken,
    marker: &'a Annotation,
    document: DocumentId,
    index: usize,
    solution: Solution,
    model: Box<dyn SemanticModel>,
    candidate: NodeRef,
}

impl CandidateSite<'_> {
    /// The marked node.
    pub fn candidate(&self) -> &NodeRef {
        &self.candidate
    }

    /// Semantic model of the current snapshot.
    pub fn model(&self) -> &dyn SemanticModel {
        self.model.as_ref()
    }

    pub fn solution(&self) -> &Solution {
        &self.solution
    }

    pub fn document(&self) -> DocumentId {
        self.document
    }

    /// Marker index of this candidate.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Replace the element at `path` (in the current root), then rebind.
    ///
    /// Produces a new snapshot, a new semantic model and re-locates the
    /// candidate through its marker.
    pub fn replace(&mut self, path: &[usize], replacement: SyntaxElement) -> EngineResult<()> {
        let root = self
            .model
            .root()
            .replace_at(path, replacement)
            .ok_or(EngineError::RewriteFailed {
                document: self.document,
                index: self.index,
            })?;
        self.solution = self.solution.with_document_root(self.document, root)?;
        self.model = self
            .services
            .semantic_model(&self.solution, self.document, self.cancel)?;
        self.candidate = locate(self.model.root(), self.marker, self.document, self.index)?;
        Ok(())
    }

    /// The error to return when the candidate has no symbol.
    pub fn unresolved(&self) -> EngineError {
        EngineError::SymbolNotResolved {
            document: self.document,
            index: self.index,
        }
    }
}

/// The `index`-th node carrying `marker`, in document order.
fn locate(
    root: &SyntaxNode,
    marker: &Annotation,
    document: DocumentId,
    index: usize,
) -> EngineResult<NodeRef> {
    let mut marked = root.annotated_nodes(marker);
    let found = marked.len();
    if index >= found {
        return Err(EngineError::MarkerMissing {
            document,
            index,
            found,
        });
    }
    Ok(marked.swap_remove(index))
}

// ============================================================================
// Reports
// ============================================================================

/// A rename the engine performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingDecision {
    pub symbol: Symbol,
    pub old_name: String,
    pub new_name: String,
}

/// Outcome of running one rule over one document.
#[derive(Debug, Clone)]
pub struct RenameReport {
    /// The final snapshot.
    pub solution: Solution,
    /// Candidates found by the scan.
    pub candidates: usize,
    /// Renames performed, in marker order.
    pub renames: Vec<NamingDecision>,
    /// Candidates whose desired name equalled their current name.
    pub skipped: usize,
}

// ============================================================================
// Engine
// ============================================================================

/// Shared control flow of every naming rule.
#[derive(Clone)]
pub struct RenameEngine {
    services: Arc<dyn LanguageServices>,
    rule: Arc<dyn NamingRule>,
}

impl fmt::Debug for RenameEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenameEngine")
            .field("rule", &self.rule.id())
            .field("language", &self.services.language())
            .finish()
    }
}

impl RenameEngine {
    pub fn new(services: Arc<dyn LanguageServices>, rule: Arc<dyn NamingRule>) -> Self {
        RenameEngine { services, rule }
    }

    pub fn language(&self) -> Language {
        self.services.language()
    }

    pub fn rule(&self) -> RuleId {
        self.rule.id()
    }

    /// Run the rule over `document`, whose current tree is `root`.
    ///
    /// Returns the unchanged `solution` when the scan finds nothing.
    pub fn process(
        &self,
        solution: &Solution,
        document: DocumentId,
        root: &SyntaxNode,
        cancel: &CancellationToken,
    ) -> EngineResult<Solution> {
        self.run(solution, document, root, cancel)
            .map(|report| report.solution)
    }

    /// Like [`process`](RenameEngine::process), with per-candidate details.
    ///
    /// # Errors
    ///
    /// Any collaborator failure aborts the run. `Cancelled` carries the last
    /// snapshot in which every started rename was complete.
    pub fn run(
        &self,
        solution: &Solution,
        document: DocumentId,
        root: &SyntaxNode,
        cancel: &CancellationToken,
    ) -> EngineResult<RenameReport> {
        let context = AnnotationContext::new(self.services.rename_tracking_kind());
        let rule = self.rule.id();

        trace!(%rule, %document, "scanning");
        let outcome = self.rule.scan(root, context.marker());
        let total = outcome.count;
        debug!(%rule, %document, candidates = total, "scan complete");

        if total == 0 {
            return Ok(RenameReport {
                solution: solution.clone(),
                candidates: 0,
                renames: Vec::new(),
                skipped: 0,
            });
        }

        let mut current = solution.with_document_root(document, outcome.root)?;
        let mut renames = Vec::new();
        let mut skipped = 0;

        for index in 0..total {
            let committed = current.clone();
            let interrupted = |err: EngineError| match err {
                EngineError::Service(ServiceError::Cancelled) => EngineError::Cancelled {
                    completed: index,
                    total,
                    committed: Box::new(strip_marker(&committed, document, context.marker())),
                },
                other => other,
            };
            cancel
                .check()
                .map_err(EngineError::from)
                .map_err(interrupted)?;

            let model = self
                .services
                .semantic_model(&current, document, cancel)
                .map_err(EngineError::from)
                .map_err(interrupted)?;
            let candidate = locate(model.root(), context.marker(), document, index)?;
            let mut site = CandidateSite {
                services: self.services.as_ref(),
                cancel,
                marker: context.marker(),
                document,
                index,
                solution: current.clone(),
                model,
                candidate,
            };
            let symbol = self.rule.resolve(&mut site).map_err(interrupted)?;
            let resolved = site.solution;

            let old_name = symbol.name().to_string();
            let new_name = self.rule.desired_name(&symbol);
            if new_name == old_name {
                debug!(%rule, index, symbol = %symbol.qualified_name(), "name already conforms, skipping");
                skipped += 1;
                current = resolved;
                continue;
            }

            debug!(%rule, index, from = %old_name, to = %new_name, "renaming");
            let renamed = self
                .services
                .rename_symbol(&resolved, &symbol, &new_name, cancel)
                .map_err(EngineError::from)
                .map_err(interrupted)?;
            current = clean_changed(&renamed, &resolved, context.rename_tracking())?;
            info!(
                %rule,
                kind = %symbol.kind(),
                from = %old_name,
                to = %new_name,
                "renamed symbol"
            );
            renames.push(NamingDecision {
                symbol,
                old_name,
                new_name,
            });
        }

        let solution = strip_marker(&current, document, context.marker());
        Ok(RenameReport {
            solution,
            candidates: total,
            renames,
            skipped,
        })
    }
}

/// Remove rename-tracking annotations from every document of `renamed` that differs from `before`.
fn clean_changed(
    renamed: &Solution,
    before: &Solution,
    tracking: &AnnotationKind,
) -> EngineResult<Solution> {
    let mut cleaner = AnnotationCleaner::for_kind(tracking.clone());
    let mut current = renamed.clone();
    for id in renamed.changed_documents(before) {
        let Some(document) = renamed.document(id) else {
            continue;
        };
        let cleaned = cleaner.clean(document.root());
        if !cleaned.ptr_eq(document.root()) {
            trace!(document = %id, "cleaned rename tracking annotations");
            current = current.with_document_root(id, cleaned)?;
        }
    }
    Ok(current)
}

/// Remove this run's marker from `document`.
fn strip_marker(solution: &Solution, document: DocumentId, marker: &Annotation) -> Solution {
    let Some(doc) = solution.document(document) else {
        return solution.clone();
    };
    let cleaned = AnnotationCleaner::for_annotation(marker.clone()).clean(doc.root());
    if cleaned.ptr_eq(doc.root()) {
        return solution.clone();
    }
    solution
        .with_document_root(document, cleaned)
        .unwrap_or_else(|_| solution.clone())
}
