//! Language dispatch for one naming rule.
//!
//! A [`RuleDispatcher`] maps each source language to the [`RenameEngine`] that
//! implements its rule. Supporting a new language means registering another
//! engine; the dispatcher itself never changes.

use std::collections::HashMap;

use tracing::debug;

use crate::engine::{EngineResult, RenameEngine, RenameReport, RuleId};
use crate::error::{EngineError, SolutionError};
use crate::services::CancellationToken;
use crate::solution::{DocumentId, Language, Solution};

/// Per-language engines for one rule.
#[derive(Debug, Clone)]
pub struct RuleDispatcher {
    rule: RuleId,
    engines: HashMap<Language, RenameEngine>,
}

impl RuleDispatcher {
    pub fn new(rule: RuleId) -> Self {
        RuleDispatcher {
            rule,
            engines: HashMap::new(),
        }
    }

    /// Register `engine` for its language, replacing any previous one.
    pub fn register(&mut self, engine: RenameEngine) -> &mut Self {
        debug_assert_eq!(
            engine.rule(),
            self.rule,
            "engine for rule '{}' registered with dispatcher for '{}'",
            engine.rule(),
            self.rule
        );
        self.engines.insert(engine.language(), engine);
        self
    }

    pub fn rule(&self) -> RuleId {
        self.rule
    }

    /// Whether an engine is registered for `language`.
    pub fn supports(&self, language: Language) -> bool {
        self.engines.contains_key(&language)
    }

    /// Languages with a registered engine, sorted.
    pub fn languages(&self) -> Vec<Language> {
        let mut languages: Vec<Language> = self.engines.keys().copied().collect();
        languages.sort();
        languages
    }

    /// Run the rule on `document` with the engine for its language.
    ///
    /// # Errors
    ///
    /// `Unsupported` if no engine is registered for the document's language.
    pub fn process(
        &self,
        solution: &Solution,
        document: DocumentId,
        cancel: &CancellationToken,
    ) -> EngineResult<RenameReport> {
        let doc = solution
            .document(document)
            .ok_or(SolutionError::DocumentNotFound { document })?;
        let language = solution.document_language(document)?;
        let engine = self.engines.get(&language).ok_or(EngineError::Unsupported {
            rule: self.rule,
            language,
        })?;
        debug!(rule = %self.rule, %language, path = doc.path(), "dispatching");
        engine.run(solution, document, doc.root(), cancel)
    }
}
