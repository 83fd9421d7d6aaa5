//! Naming rules for C#.
//!
//! Each rule supplies the two policy steps of the rename protocol, finding
//! candidates and computing the name a symbol should have. The shared loop
//! lives in [`tugstyle_core::engine::RenameEngine`].

pub mod method_naming;
pub mod static_access;

use std::sync::Arc;

use tugstyle_core::engine::{RenameEngine, RuleId};
use tugstyle_core::services::LanguageServices;

pub use method_naming::MethodNamingRule;
pub use static_access::StaticAccessRule;

/// Build the C# engine for `rule`.
///
/// `separator` is the prefix separator used by method naming.
pub fn engine(rule: RuleId, services: Arc<dyn LanguageServices>, separator: char) -> RenameEngine {
    match rule {
        RuleId::MethodNaming => RenameEngine::new(services, Arc::new(MethodNamingRule::new(separator))),
        RuleId::StaticAccess => RenameEngine::new(services, Arc::new(StaticAccessRule)),
    }
}
