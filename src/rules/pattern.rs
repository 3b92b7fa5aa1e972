use crate::error::{Result, RewriteError};
use regex::bytes::{Captures, Regex, RegexBuilder};
use std::fmt;

/// Flags accepted after the closing separator of a pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternFlags {
	/// `i`: case-insensitive matching.
	pub case_insensitive: bool,

	/// `x`: free-spacing syntax, whitespace and `#` comments are ignored.
	pub extended: bool,

	/// `u`: Unicode-aware character classes and case folding.
	pub unicode: bool,
}

impl PatternFlags {
	/// Set the flag named by `letter`. Returns false for an unknown letter.
	pub fn set(&mut self, letter: char) -> bool {
		match letter {
			'i' => self.case_insensitive = true,
			'x' => self.extended = true,
			'u' => self.unicode = true,
			_ => return false,
		}
		true
	}
}

impl fmt::Display for PatternFlags {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.case_insensitive {
			f.write_str("i")?;
		}
		if self.extended {
			f.write_str("x")?;
		}
		if self.unicode {
			f.write_str("u")?;
		}
		Ok(())
	}
}

/// A compiled regular expression together with its source text.
///
/// Patterns match raw bytes so that paths and command lines which are not
/// valid UTF-8 can still be matched.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
	regex: Regex,
	captures: usize,
	flags: PatternFlags,
	raw: String,
}

impl CompiledPattern {
	/// Compile `source` with the given flags.
	pub fn compile(source: &str, flags: PatternFlags) -> Result<Self> {
		let regex = RegexBuilder::new(source)
			.case_insensitive(flags.case_insensitive)
			.ignore_whitespace(flags.extended)
			.unicode(flags.unicode)
			.build()
			.map_err(|source_err| RewriteError::InvalidPattern {
				pattern: source.to_string(),
				source: source_err,
			})?;

		// captures_len counts the implicit whole-match group
		let captures = regex.captures_len() - 1;

		Ok(CompiledPattern {
			regex,
			captures,
			flags,
			raw: source.to_string(),
		})
	}

	/// The pattern text as written in the rule file.
	pub fn raw(&self) -> &str {
		&self.raw
	}

	/// Number of capturing groups, not counting the whole match.
	pub fn captures_len(&self) -> usize {
		self.captures
	}

	pub fn flags(&self) -> PatternFlags {
		self.flags
	}

	/// True when the pattern body was empty (`//`).
	pub fn is_empty(&self) -> bool {
		self.raw.is_empty()
	}

	pub fn is_match(&self, haystack: &[u8]) -> bool {
		self.regex.is_match(haystack)
	}

	/// Leftmost match with capture offsets, or None if the pattern does not match.
	pub fn captures<'h>(&self, haystack: &'h [u8]) -> Option<Captures<'h>> {
		self.regex.captures(haystack)
	}
}

impl fmt::Display for CompiledPattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.raw)
	}
}
