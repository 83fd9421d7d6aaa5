//! tugstyle: naming-convention enforcement through verified symbol renames.
//!
//! This crate provides the CLI on top of the engine crates:
//!
//! - `loader` - Workspace discovery into a solution snapshot
//! - `rules` - Dispatchers for each rule with every language registered
//! - `cli` - `check` and `fix` implementations
//! - `output` - JSON and text responses

pub mod cli;
pub mod loader;
pub mod output;
pub mod rules;

// Re-export core types for convenience
pub use tugstyle_core::config::StyleConfig;
pub use tugstyle_core::engine::{RenameEngine, RenameReport, RuleId};
pub use tugstyle_core::error::{OutputErrorCode, StyleError};
pub use tugstyle_core::services::CancellationToken;
pub use tugstyle_core::solution::{Language, Solution};
