//! Rule wiring: one dispatcher per enabled rule, with every supported language registered.

use std::sync::Arc;

use tugstyle_core::config::StyleConfig;
use tugstyle_core::dispatch::RuleDispatcher;
use tugstyle_core::engine::RuleId;
use tugstyle_csharp::CSharpServices;

/// Dispatcher for `rule` with every language engine registered.
pub fn dispatcher(rule: RuleId, separator: char) -> RuleDispatcher {
    let mut dispatcher = RuleDispatcher::new(rule);
    dispatcher.register(tugstyle_csharp::rules::engine(
        rule,
        Arc::new(CSharpServices::new()),
        separator,
    ));
    dispatcher
}

/// Dispatchers for `rules`, or for the configured rules when `rules` is empty.
///
/// Order follows the input; duplicates run once.
pub fn dispatchers(config: &StyleConfig, rules: &[RuleId]) -> Vec<RuleDispatcher> {
    let selected = if rules.is_empty() {
        config.rules.enabled.as_slice()
    } else {
        rules
    };
    let mut seen = Vec::new();
    for rule in selected {
        if !seen.contains(rule) {
            seen.push(*rule);
        }
    }
    seen.into_iter()
        .map(|rule| dispatcher(rule, config.naming.separator))
        .collect()
}
