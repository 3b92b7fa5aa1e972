//! Rule matching and path rewriting for rewritefs.
//!
//! This module handles:
//! - Compiling rule and caller-filter patterns
//! - Backreference templates for rewritten paths
//! - Resolving virtual paths against the rule contexts

pub mod matcher;
pub mod pattern;
pub mod template;

pub use matcher::{RequestContext, Resolver};
pub use pattern::{CompiledPattern, PatternFlags};
pub use template::Template;
