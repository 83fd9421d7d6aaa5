//! Core infrastructure for tugstyle.
//!
//! This crate provides the language-agnostic half of naming enforcement:
//! - Immutable syntax trees with annotations
//! - Solution snapshots (projects and documents)
//! - Symbols and the language services trait
//! - The rename engine and per-language rule dispatch
//! - Annotation cleanup and tree rewriting
//! - Error types and error codes
//! - Configuration, text utilities and diff generation

pub mod annotation;
pub mod config;
pub mod diff;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod rewrite;
pub mod services;
pub mod solution;
pub mod symbols;
pub mod syntax;
pub mod text;
pub mod types;
