use regex::bytes::Captures;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
	Literal(Vec<u8>),
	Group(usize),
}

/// A rewrite template split into literal text and backreference tokens.
///
/// A backreference is a backslash followed by a single digit `1`..`9` naming a
/// group the pattern actually has. `\0`, and references past the pattern's
/// capture count, are kept as literal text. The template is split once when
/// the rule is built, so text inserted from a capture is never rescanned.
#[derive(Debug, Clone)]
pub struct Template {
	raw: Vec<u8>,
	segments: Vec<Segment>,
}

impl Template {
	/// Split `raw` for a pattern with `captures` capturing groups.
	pub fn parse(raw: &[u8], captures: usize) -> Self {
		let mut segments = Vec::new();
		let mut literal = Vec::new();
		let mut i = 0;

		while i < raw.len() {
			if raw[i] == b'\\'
				&& let Some(&digit) = raw.get(i + 1)
				&& (b'1'..=b'9').contains(&digit)
				&& usize::from(digit - b'0') <= captures
			{
				if !literal.is_empty() {
					segments.push(Segment::Literal(std::mem::take(&mut literal)));
				}
				segments.push(Segment::Group(usize::from(digit - b'0')));
				i += 2;
				continue;
			}
			literal.push(raw[i]);
			i += 1;
		}

		if !literal.is_empty() {
			segments.push(Segment::Literal(literal));
		}

		Template {
			raw: raw.to_vec(),
			segments,
		}
	}

	/// The template text as written in the rule file.
	pub fn raw(&self) -> &[u8] {
		&self.raw
	}

	/// Render the template, substituting each backreference with the text its
	/// group matched. Groups that did not take part in the match render empty.
	pub fn render(&self, captures: &Captures<'_>) -> Vec<u8> {
		let mut out = Vec::with_capacity(self.raw.len());
		for segment in &self.segments {
			match segment {
				Segment::Literal(text) => out.extend_from_slice(text),
				Segment::Group(index) => {
					if let Some(group) = captures.get(*index) {
						out.extend_from_slice(group.as_bytes());
					}
				}
			}
		}
		out
	}
}
