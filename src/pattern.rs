//! Path pattern matching for screen routes.
//!
//! A path mask is compiled into an anchored regex. Three placeholder forms are
//! accepted and may be mixed:
//!
//! - `:name` - one path segment (Express style)
//! - `{name}` - one path segment (Django style)
//! - `{name:*}` - the rest of the path, `/` included
//!
//! Everything else is matched literally.

use std::collections::HashMap;
use std::fmt;

use regex::Regex;
use thiserror::Error;

/// Parameters extracted from, or substituted into, a path.
pub type PathParams = HashMap<String, String>;

/// Maximum allowed length for a path mask in bytes.
const MAX_PATTERN_LENGTH: usize = 1024;

/// Maximum allowed number of path segments in a path mask.
const MAX_PATH_SEGMENTS: usize = 32;

/// Maximum allowed size for a compiled pattern regex (in bytes).
const MAX_REGEX_SIZE: usize = 1 << 20; // 1 MiB

/// Errors raised while compiling a path mask.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
	/// The mask is longer than [`MAX_PATTERN_LENGTH`].
	#[error("pattern length {0} exceeds maximum allowed length of {max} bytes", max = MAX_PATTERN_LENGTH)]
	TooLong(usize),

	/// The mask has more than [`MAX_PATH_SEGMENTS`] segments.
	#[error("pattern has {0} path segments, exceeding maximum of {max}", max = MAX_PATH_SEGMENTS)]
	TooManySegments(usize),

	/// A placeholder has no name, e.g. `/users/:/` or `{}`.
	#[error("empty parameter name at byte {0}")]
	EmptyParam(usize),

	/// A `{` placeholder is never closed.
	#[error("unclosed parameter starting at byte {0}")]
	Unclosed(usize),

	/// The generated regex failed to compile (duplicate names, size limit).
	#[error("failed to compile pattern regex: {0}")]
	Regex(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
	Literal(String),
	Param { name: String, wildcard: bool },
}

/// A compiled path matcher.
#[derive(Debug, Clone)]
pub struct PathPattern {
	source: String,
	regex: Regex,
	segments: Vec<Segment>,
	param_names: Vec<String>,
}

/// Result of running a [`PathPattern`] against a concrete path.
///
/// Index `0` is the whole match; indices `1..` are the captures in
/// placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
	groups: Vec<String>,
	params: PathParams,
}

impl PathMatch {
	/// The whole matched path.
	pub fn matched(&self) -> &str {
		&self.groups[0]
	}

	/// Group `index`; `0` is the whole match.
	pub fn get(&self, index: usize) -> Option<&str> {
		self.groups.get(index).map(String::as_str)
	}

	/// Captured values in placeholder order, without the whole match.
	pub fn captures(&self) -> &[String] {
		&self.groups[1..]
	}

	/// Whether at least one placeholder was captured.
	pub fn has_captures(&self) -> bool {
		self.groups.len() > 1
	}

	/// Named captures.
	pub fn params(&self) -> &PathParams {
		&self.params
	}

	/// Named capture `name`.
	pub fn param(&self, name: &str) -> Option<&str> {
		self.params.get(name).map(String::as_str)
	}
}

impl std::ops::Index<usize> for PathMatch {
	type Output = str;

	fn index(&self, index: usize) -> &str {
		&self.groups[index]
	}
}

impl PathPattern {
	/// Compiles a path mask.
	///
	/// # Errors
	///
	/// Returns [`PatternError`] when the mask is too long, has too many
	/// segments, contains a malformed placeholder, or produces a regex that
	/// does not compile (for example duplicate parameter names).
	pub fn new(mask: &str) -> Result<Self, PatternError> {
		if mask.len() > MAX_PATTERN_LENGTH {
			return Err(PatternError::TooLong(mask.len()));
		}
		let segment_count = mask.split('/').count();
		if segment_count > MAX_PATH_SEGMENTS {
			return Err(PatternError::TooManySegments(segment_count));
		}

		let segments = parse_mask(mask)?;
		let mut regex_str = String::from("^");
		let mut param_names = Vec::new();
		for segment in &segments {
			match segment {
				Segment::Literal(text) => regex_str.push_str(&regex::escape(text)),
				Segment::Param { name, wildcard } => {
					param_names.push(name.clone());
					if *wildcard {
						regex_str.push_str(&format!("(?P<{}>.*)", name));
					} else {
						regex_str.push_str(&format!("(?P<{}>[^/]+)", name));
					}
				}
			}
		}
		regex_str.push('$');

		let regex = regex::RegexBuilder::new(&regex_str)
			.size_limit(MAX_REGEX_SIZE)
			.build()
			.map_err(|e| PatternError::Regex(e.to_string()))?;

		Ok(Self {
			source: mask.to_string(),
			regex,
			segments,
			param_names,
		})
	}

	/// Compiles a pattern matching exactly `path`, with no placeholders.
	pub fn literal(path: &str) -> Result<Self, PatternError> {
		if path.len() > MAX_PATTERN_LENGTH {
			return Err(PatternError::TooLong(path.len()));
		}
		let regex = Regex::new(&format!("^{}$", regex::escape(path)))
			.map_err(|e| PatternError::Regex(e.to_string()))?;
		Ok(Self {
			source: path.to_string(),
			regex,
			segments: vec![Segment::Literal(path.to_string())],
			param_names: Vec::new(),
		})
	}

	/// Wraps an author-supplied regex.
	///
	/// Capture groups are reported positionally; named groups also populate
	/// [`PathMatch::params`]. Such a pattern has no mask, so
	/// [`reverse`](Self::reverse) always returns `None`.
	pub fn from_regex(regex: Regex) -> Self {
		let param_names = regex.capture_names().flatten().map(str::to_string).collect();
		Self {
			source: regex.as_str().to_string(),
			regex,
			segments: Vec::new(),
			param_names,
		}
	}

	/// The mask (or regex source) this pattern was built from.
	pub fn source(&self) -> &str {
		&self.source
	}

	/// Parameter names in placeholder order.
	pub fn param_names(&self) -> &[String] {
		&self.param_names
	}

	/// Whether this pattern has no placeholders.
	pub fn is_exact(&self) -> bool {
		self.regex.captures_len() == 1
	}

	/// Checks if this pattern matches `path`.
	pub fn test(&self, path: &str) -> bool {
		self.regex.is_match(path)
	}

	/// Runs the pattern against `path`.
	///
	/// Captured values are percent-decoded; a value that is not valid
	/// percent-encoding is returned as-is.
	pub fn exec(&self, path: &str) -> Option<PathMatch> {
		let caps = self.regex.captures(path)?;
		let groups: Vec<String> = caps
			.iter()
			.enumerate()
			.map(|(index, group)| {
				let raw = group.map(|m| m.as_str()).unwrap_or_default();
				if index == 0 { raw.to_string() } else { decode(raw) }
			})
			.collect();
		let params = self
			.param_names
			.iter()
			.filter_map(|name| caps.name(name).map(|m| (name.clone(), decode(m.as_str()))))
			.collect();
		Some(PathMatch { groups, params })
	}

	/// Generates a path by substituting `params` into the mask.
	///
	/// Values are percent-encoded so that [`exec`](Self::exec) on the result
	/// recovers them; wildcard values keep their `/` separators. Returns
	/// `None` when a parameter is missing or the pattern was built with
	/// [`from_regex`](Self::from_regex).
	pub fn reverse(&self, params: &PathParams) -> Option<String> {
		if self.segments.is_empty() {
			return None;
		}
		let mut path = String::new();
		for segment in &self.segments {
			match segment {
				Segment::Literal(text) => path.push_str(text),
				Segment::Param { name, wildcard } => {
					let value = params.get(name)?;
					if *wildcard {
						let encoded: Vec<String> = value.split('/').map(encode).collect();
						path.push_str(&encoded.join("/"));
					} else {
						path.push_str(&encode(value));
					}
				}
			}
		}
		Some(path)
	}
}

impl PartialEq for PathPattern {
	fn eq(&self, other: &Self) -> bool {
		self.source == other.source
	}
}

impl Eq for PathPattern {}

impl fmt::Display for PathPattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.source)
	}
}

/// Strips a trailing `/` from `path` (except the root) when
/// `ignore_trailing_slash` is set.
pub fn normalize_path(path: &str, ignore_trailing_slash: bool) -> &str {
	if ignore_trailing_slash && path.len() > 1 && path.ends_with('/') {
		&path[..path.len() - 1]
	} else {
		path
	}
}

fn is_name_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_'
}

fn parse_mask(mask: &str) -> Result<Vec<Segment>, PatternError> {
	let mut segments = Vec::new();
	let mut literal = String::new();
	let mut chars = mask.char_indices().peekable();

	while let Some((offset, c)) = chars.next() {
		match c {
			':' => {
				let mut name = String::new();
				while let Some(&(_, next)) = chars.peek() {
					if !is_name_char(next) {
						break;
					}
					name.push(next);
					chars.next();
				}
				if name.is_empty() {
					return Err(PatternError::EmptyParam(offset));
				}
				flush_literal(&mut literal, &mut segments);
				segments.push(Segment::Param {
					name,
					wildcard: false,
				});
			}
			'{' => {
				let mut body = String::new();
				let mut closed = false;
				for (_, next) in chars.by_ref() {
					if next == '}' {
						closed = true;
						break;
					}
					body.push(next);
				}
				if !closed {
					return Err(PatternError::Unclosed(offset));
				}
				let (name, wildcard) = match body.strip_suffix(":*") {
					Some(name) => (name.to_string(), true),
					None => (body, false),
				};
				if name.is_empty() || !name.chars().all(is_name_char) {
					return Err(PatternError::EmptyParam(offset));
				}
				flush_literal(&mut literal, &mut segments);
				segments.push(Segment::Param { name, wildcard });
			}
			_ => literal.push(c),
		}
	}
	flush_literal(&mut literal, &mut segments);
	Ok(segments)
}

fn flush_literal(literal: &mut String, segments: &mut Vec<Segment>) {
	if !literal.is_empty() {
		segments.push(Segment::Literal(core::mem::take(literal)));
	}
}

fn encode(value: &str) -> String {
	urlencoding::encode(value).into_owned()
}

fn decode(value: &str) -> String {
	urlencoding::decode(value)
		.map(|decoded| decoded.into_owned())
		.unwrap_or_else(|_| value.to_string())
}
