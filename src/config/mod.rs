//! Configuration loading and parsing for rewritefs.
//!
//! This module handles:
//! - Rule file parsing into ordered contexts and rules
//! - Startup option handling and validation

pub mod options;
pub mod parser;
pub mod types;

pub use options::{MountOptions, initialize};
pub use parser::{parse_rule_file, parse_rules};
pub use types::{Config, Context, Rewrite, Rule, RuleSet};
