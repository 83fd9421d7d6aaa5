//! C# language support for tugstyle.
//!
//! This crate provides everything the rename engine needs from a language:
//! - A lossless lexer and parser for a C# subset
//! - A binder resolving declarations and references across projects
//! - Built-in type metadata for keyword types
//! - The global rename service with conflict verification
//! - The method naming and static access rules

pub mod binder;
pub mod builtins;
pub mod lexer;
pub mod parser;
pub mod rename;
pub mod rules;
pub mod services;
pub mod validation;

pub use parser::parse;
pub use rules::{MethodNamingRule, StaticAccessRule};
pub use services::CSharpServices;
