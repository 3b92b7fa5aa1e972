use crate::config::types::{Rewrite, Rule, RuleSet};
use crate::error::{Result, RewriteError};
use crate::rules::{CompiledPattern, PatternFlags, Template};
use std::path::Path;

/// Parse a rule file from the given path.
pub fn parse_rule_file(path: &Path) -> Result<RuleSet> {
	let content = std::fs::read(path).map_err(|source| RewriteError::ConfigReadError {
		path: path.to_path_buf(),
		source,
	})?;

	parse_rules(&content)
}

/// Parse rules from an in-memory buffer.
///
/// The grammar is line oriented:
///
/// ```text
/// # comment
/// /pattern/flags replacement
/// m|pattern|flags replacement
/// - /caller filter/flags
/// ```
///
/// A replacement of `.` leaves matching paths unchanged.
pub fn parse_rules(content: &[u8]) -> Result<RuleSet> {
	let mut reader = Reader::new(content);
	let mut rules = RuleSet::default();

	loop {
		reader.skip_blanks();
		let line = reader.line;
		match reader.next() {
			None => break,
			Some(b'#') => reader.skip_comment(),
			Some(b'-') => {
				reader.skip_blanks();
				let sep = reader.context_separator()?;
				let filter = reader.pattern(sep)?;
				// an empty body means "every caller"
				rules.push_context((!filter.is_empty()).then_some(filter));
			}
			Some(first @ (b'/' | b'm')) => {
				let sep = if first == b'm' {
					reader.custom_separator()?
				} else {
					b'/'
				};
				let pattern = reader.pattern(sep)?;
				reader.skip_blanks();
				let replacement = reader.replacement()?;
				let rewrite = if replacement == b"." {
					Rewrite::Identity
				} else {
					Rewrite::Template(Template::parse(&replacement, pattern.captures_len()))
				};
				rules.push_rule(Rule { pattern, rewrite });
			}
			Some(other) => {
				return Err(RewriteError::UnexpectedChar {
					ch: char::from(other),
					line,
				});
			}
		}
	}

	Ok(rules)
}

/// `isspace` in the C locale, which includes vertical tab.
fn is_space(byte: u8) -> bool {
	byte.is_ascii_whitespace() || byte == 0x0b
}

/// Pattern text for a body read from the rule file. Bytes that are not valid
/// UTF-8 become byte escapes, so they match the same raw bytes in a path.
fn pattern_source(body: &[u8]) -> String {
	let mut source = String::with_capacity(body.len());
	for chunk in body.utf8_chunks() {
		source.push_str(chunk.valid());
		for byte in chunk.invalid() {
			source.push_str(&format!("(?-u:\\x{byte:02X})"));
		}
	}
	source
}

/// Byte cursor over the rule file that tracks the current line.
struct Reader<'a> {
	input: &'a [u8],
	pos: usize,
	line: usize,
}

impl<'a> Reader<'a> {
	fn new(input: &'a [u8]) -> Self {
		Reader {
			input,
			pos: 0,
			line: 1,
		}
	}

	fn peek(&self) -> Option<u8> {
		self.input.get(self.pos).copied()
	}

	fn next(&mut self) -> Option<u8> {
		let byte = self.peek()?;
		self.pos += 1;
		if byte == b'\n' {
			self.line += 1;
		}
		Some(byte)
	}

	fn eof(&self) -> RewriteError {
		RewriteError::UnexpectedEof { line: self.line }
	}

	fn skip_blanks(&mut self) {
		while self.peek().is_some_and(is_space) {
			self.next();
		}
	}

	fn skip_comment(&mut self) {
		while let Some(byte) = self.next() {
			if byte == b'\n' {
				break;
			}
		}
	}

	/// Separator of a caller filter: `/` or `m` followed by any separator.
	fn context_separator(&mut self) -> Result<u8> {
		let line = self.line;
		match self.next() {
			Some(b'/') => Ok(b'/'),
			Some(b'm') => self.custom_separator(),
			Some(other) => Err(RewriteError::UnexpectedChar {
				ch: char::from(other),
				line,
			}),
			None => Err(self.eof()),
		}
	}

	/// Separator following an `m`. Anything but whitespace is accepted.
	fn custom_separator(&mut self) -> Result<u8> {
		let line = self.line;
		match self.next() {
			Some(sep) if is_space(sep) => Err(RewriteError::UnexpectedChar {
				ch: char::from(sep),
				line,
			}),
			Some(sep) => Ok(sep),
			None => Err(self.eof()),
		}
	}

	/// Read up to an unescaped `sep`, which is consumed but not returned.
	/// The flag is false when the input ended before `sep` was found.
	///
	/// A backslash directly before `sep` is dropped and `sep` is kept as a
	/// literal. Other backslashes are kept as written.
	fn delimited(&mut self, sep: u8) -> (Vec<u8>, bool) {
		let mut body = Vec::new();
		let mut escaped = false;

		while let Some(byte) = self.next() {
			if byte == sep {
				if !escaped {
					return (body, true);
				}
				body.pop();
				body.push(byte);
				escaped = false;
				continue;
			}
			escaped = byte == b'\\' && !escaped;
			body.push(byte);
		}

		(body, false)
	}

	/// Pattern body up to `sep`, then flag letters up to the next blank.
	fn pattern(&mut self, sep: u8) -> Result<CompiledPattern> {
		let (body, terminated) = self.delimited(sep);
		if !terminated {
			return Err(self.eof());
		}

		let mut flags = PatternFlags::default();
		loop {
			let line = self.line;
			match self.next() {
				// a filter may be the last thing in the file
				None => break,
				Some(byte) if is_space(byte) => break,
				Some(byte) => {
					let letter = char::from(byte);
					if !flags.set(letter) {
						return Err(RewriteError::UnknownFlag { flag: letter, line });
					}
				}
			}
		}

		CompiledPattern::compile(&pattern_source(&body), flags)
	}

	/// Replacement text up to the end of the line. The last line of the file
	/// does not need a trailing newline.
	fn replacement(&mut self) -> Result<Vec<u8>> {
		if self.peek().is_none() {
			return Err(self.eof());
		}
		let (text, _) = self.delimited(b'\n');
		Ok(text)
	}
}
