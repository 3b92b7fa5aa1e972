use crate::rules::{CompiledPattern, Template};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;
use tracing::info;

/// How a matching rule turns a virtual path into a real one.
#[derive(Debug, Clone)]
pub enum Rewrite {
	/// Written as `.` in the rule file: pass the path through unchanged.
	Identity,

	/// Replace the matched part of the path with the rendered template.
	Template(Template),
}

impl fmt::Display for Rewrite {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Rewrite::Identity => f.write_str("(don't rewrite)"),
			Rewrite::Template(template) => {
				write!(f, "{}", String::from_utf8_lossy(template.raw()))
			}
		}
	}
}

/// A filename pattern and what to do with paths it matches.
#[derive(Debug, Clone)]
pub struct Rule {
	/// Matched against the virtual path without its leading `/`.
	pub pattern: CompiledPattern,

	pub rewrite: Rewrite,
}

/// A group of rules that applies to callers whose command line matches `filter`.
#[derive(Debug, Clone, Default)]
pub struct Context {
	/// Caller filter. None applies the context to every caller.
	pub filter: Option<CompiledPattern>,

	/// Rules in declaration order. First match wins.
	pub rules: Vec<Rule>,
}

/// The ordered contexts parsed from a rule file.
///
/// The first context always exists and has no caller filter; rules written
/// before any `-` directive belong to it.
#[derive(Debug, Clone)]
pub struct RuleSet {
	contexts: Vec<Context>,
}

impl Default for RuleSet {
	fn default() -> Self {
		RuleSet {
			contexts: vec![Context::default()],
		}
	}
}

impl RuleSet {
	/// Contexts in declaration order.
	pub fn contexts(&self) -> &[Context] {
		&self.contexts
	}

	/// Total number of rules across all contexts.
	pub fn rule_count(&self) -> usize {
		self.contexts.iter().map(|ctx| ctx.rules.len()).sum()
	}

	pub(crate) fn push_context(&mut self, filter: Option<CompiledPattern>) {
		self.contexts.push(Context {
			filter,
			rules: Vec::new(),
		});
	}

	pub(crate) fn push_rule(&mut self, rule: Rule) {
		// contexts is never empty, see Default
		if let Some(current) = self.contexts.last_mut() {
			current.rules.push(rule);
		}
	}

	/// Log the context/rule table, one line per entry.
	pub fn log_table(&self) {
		for line in self.to_string().lines() {
			info!("{}", line);
		}
	}
}

impl fmt::Display for RuleSet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for ctx in &self.contexts {
			match &ctx.filter {
				Some(filter) => writeln!(f, "CTX \"{}\":", filter)?,
				None => writeln!(f, "CTX \"default\":")?,
			}
			for rule in &ctx.rules {
				writeln!(f, "  \"{}\" -> \"{}\"", rule.pattern, rule.rewrite)?;
			}
		}
		Ok(())
	}
}

/// Process-wide configuration, built once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Config {
	/// Canonical source directory without a trailing `/`. Empty when the
	/// source is the filesystem root.
	pub source_root: OsString,

	pub mount_point: PathBuf,

	pub rules: RuleSet,

	/// Debug output level, 0 to 4.
	pub verbose: u8,

	/// Create missing parent directories of rewritten paths.
	pub autocreate: bool,
}

impl Config {
	/// A configuration with no rules, mapping every path onto `source_root`.
	pub fn new(source_root: impl Into<OsString>, mount_point: impl Into<PathBuf>) -> Self {
		let mut source_root = source_root.into();
		if source_root.as_bytes().ends_with(b"/") {
			let trimmed = &source_root.as_bytes()[..source_root.len() - 1];
			source_root = OsStr::from_bytes(trimmed).to_os_string();
		}

		Config {
			source_root,
			mount_point: mount_point.into(),
			rules: RuleSet::default(),
			verbose: 0,
			autocreate: false,
		}
	}

	pub fn with_rules(mut self, rules: RuleSet) -> Self {
		self.rules = rules;
		self
	}

	pub fn with_verbose(mut self, verbose: u8) -> Self {
		self.verbose = verbose;
		self
	}

	pub fn with_autocreate(mut self, autocreate: bool) -> Self {
		self.autocreate = autocreate;
		self
	}
}
