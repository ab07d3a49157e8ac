//! Data-access paths: chains of static names, literal indices and dynamic lookups.

use crate::{data::DataScope, value::Value};
use core::{
	fmt::{self, Debug, Display, Formatter},
	hash::{Hash, Hasher},
	iter,
	str::FromStr,
};
use std::{borrow::Cow, rc::Rc};
use thiserror::Error;

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
	/// A static field name (`.name`, `["name"]`).
	Name(Rc<str>),
	/// A literal index (`[3]`).
	Index(usize),
	/// A dynamic accessor evaluated against a data scope (`[cursor]`).
	Lookup(Path),
}

impl Segment {
	#[must_use]
	pub fn name(name: &str) -> Self {
		Self::Name(name.into())
	}

	/// Converts an evaluated lookup result into a static segment.
	#[must_use]
	pub fn from_value(value: &Value) -> Self {
		match value.as_index() {
			Some(index) => Self::Index(index),
			None => match value {
				Value::String(name) => Self::Name(Rc::clone(name)),
				other => Self::Name(other.to_string().into()),
			},
		}
	}

	/// The literal index this segment addresses, if any.
	///
	/// Names qualify only if they spell a non-negative integer.
	#[must_use]
	pub fn as_index(&self) -> Option<usize> {
		match self {
			Segment::Index(index) => Some(*index),
			Segment::Name(name) => name.parse().ok(),
			Segment::Lookup(_) => None,
		}
	}

	/// The property key this static segment stands for.
	#[must_use]
	pub fn key(&self) -> Option<Cow<'_, str>> {
		match self {
			Segment::Name(name) => Some(Cow::Borrowed(&**name)),
			Segment::Index(index) => Some(Cow::Owned(index.to_string())),
			Segment::Lookup(_) => None,
		}
	}

	/// Static key equality. `Name("3")` and `Index(3)` address the same entry.
	#[must_use]
	pub fn matches(&self, other: &Segment) -> bool {
		match (self, other) {
			(Segment::Name(a), Segment::Name(b)) => a == b,
			(Segment::Index(a), Segment::Index(b)) => a == b,
			(Segment::Name(name), Segment::Index(index)) | (Segment::Index(index), Segment::Name(name)) => **name == *index.to_string(),
			_ => false,
		}
	}
}

/// How two paths relate to each other, seen from the left-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRelation {
	Unrelated,
	Equal,
	/// The left path is a strict prefix of the right one, this many segments shorter.
	Ancestor(usize),
	/// The left path extends the right one by this many segments.
	Descendant(usize),
}

/// An immutable data-access path.
///
/// Paths created by [`Path::parse`] remember their source text, which serves as the
/// [`data_cache`](`crate::data_cache`) key. Constructed paths have no raw text.
#[derive(Clone)]
pub struct Path {
	segments: Rc<[Segment]>,
	raw: Option<Rc<str>>,
}

impl Path {
	#[must_use]
	pub fn new(segments: impl IntoIterator<Item = Segment>) -> Self {
		Self {
			segments: segments.into_iter().collect(),
			raw: None,
		}
	}

	/// Parses `ident ( "." ident | "[" ( integer | quoted-string | path ) "]" )*`.
	///
	/// # Errors
	///
	/// Iff `text` doesn't match the grammar above.
	pub fn parse(text: &str) -> Result<Self, PathError> {
		let mut parser = Parser { text, offset: 0 };
		parser.skip_whitespace();
		if parser.peek().is_none() {
			return Err(PathError::Empty);
		}
		let segments = parser.path()?;
		parser.skip_whitespace();
		match parser.peek() {
			None => Ok(Self {
				segments: segments.into(),
				raw: Some(text.trim().into()),
			}),
			Some(found) => Err(PathError::UnexpectedChar { found, offset: parser.offset }),
		}
	}

	#[must_use]
	pub fn segments(&self) -> &[Segment] {
		&self.segments
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.segments.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.segments.is_empty()
	}

	/// The source text, if this path was parsed.
	#[must_use]
	pub fn raw(&self) -> Option<&str> {
		self.raw.as_deref()
	}

	/// The leading name, if the path starts with a static name.
	#[must_use]
	pub fn root_name(&self) -> Option<&str> {
		match self.segments.first() {
			Some(Segment::Name(name)) => Some(&**name),
			_ => None,
		}
	}

	#[must_use]
	pub fn child(&self, segment: Segment) -> Self {
		Self::new(self.segments.iter().cloned().chain(iter::once(segment)))
	}

	/// `true` iff the path contains no [`Segment::Lookup`].
	#[must_use]
	pub fn is_static(&self) -> bool {
		!self.segments.iter().any(|segment| matches!(segment, Segment::Lookup(_)))
	}

	/// Evaluates every [`Segment::Lookup`] against `scope`.
	#[must_use]
	pub fn resolve(&self, scope: &dyn DataScope) -> Self {
		if self.is_static() {
			return self.clone();
		}
		Self::new(self.segments.iter().map(|segment| match segment {
			Segment::Lookup(lookup) => Segment::from_value(&scope.get(lookup)),
			other => other.clone(),
		}))
	}

	/// Structural comparison of two static paths.
	#[must_use]
	pub fn compare(&self, other: &Path) -> PathRelation {
		if !self.segments.iter().zip(other.segments.iter()).all(|(a, b)| a.matches(b)) {
			return PathRelation::Unrelated;
		}
		match self.len().cmp(&other.len()) {
			core::cmp::Ordering::Equal => PathRelation::Equal,
			core::cmp::Ordering::Less => PathRelation::Ancestor(other.len() - self.len()),
			core::cmp::Ordering::Greater => PathRelation::Descendant(self.len() - other.len()),
		}
	}
}

impl PartialEq for Path {
	fn eq(&self, other: &Self) -> bool {
		self.segments == other.segments
	}
}
impl Eq for Path {}

impl Hash for Path {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.segments.hash(state)
	}
}

impl Display for Path {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		for (i, segment) in self.segments.iter().enumerate() {
			match segment {
				Segment::Name(name) if is_identifier(name) => {
					if i > 0 {
						f.write_str(".")?;
					}
					f.write_str(name)?;
				}
				Segment::Name(name) => write!(f, "[{:?}]", name)?,
				Segment::Index(index) => write!(f, "[{}]", index)?,
				Segment::Lookup(lookup) => write!(f, "[{}]", lookup)?,
			}
		}
		Ok(())
	}
}

impl Debug for Path {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "Path({})", self)
	}
}

impl FromStr for Path {
	type Err = PathError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
	#[error("empty path")]
	Empty,
	#[error("unexpected {found:?} at offset {offset}")]
	UnexpectedChar { found: char, offset: usize },
	#[error("unexpected end of path at offset {offset}")]
	UnexpectedEnd { offset: usize },
	#[error("unterminated string starting at offset {offset}")]
	UnterminatedString { offset: usize },
	#[error("index out of range at offset {offset}")]
	IndexOverflow { offset: usize },
}

fn is_identifier_start(c: char) -> bool {
	c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_continue(c: char) -> bool {
	c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_identifier(text: &str) -> bool {
	let mut chars = text.chars();
	chars.next().map_or(false, is_identifier_start) && chars.all(is_identifier_continue)
}

struct Parser<'a> {
	text: &'a str,
	offset: usize,
}

impl Parser<'_> {
	fn peek(&self) -> Option<char> {
		self.text[self.offset..].chars().next()
	}

	fn bump(&mut self) -> Option<char> {
		let c = self.peek()?;
		self.offset += c.len_utf8();
		Some(c)
	}

	fn skip_whitespace(&mut self) {
		while self.peek().map_or(false, char::is_whitespace) {
			self.bump();
		}
	}

	fn expect(&mut self, expected: char) -> Result<(), PathError> {
		match self.peek() {
			Some(c) if c == expected => {
				self.bump();
				Ok(())
			}
			Some(found) => Err(PathError::UnexpectedChar { found, offset: self.offset }),
			None => Err(PathError::UnexpectedEnd { offset: self.offset }),
		}
	}

	fn path(&mut self) -> Result<Vec<Segment>, PathError> {
		let mut segments = vec![Segment::Name(self.identifier()?)];
		loop {
			self.skip_whitespace();
			match self.peek() {
				Some('.') => {
					self.bump();
					self.skip_whitespace();
					segments.push(Segment::Name(self.identifier()?));
				}
				Some('[') => {
					self.bump();
					self.skip_whitespace();
					segments.push(self.bracketed()?);
					self.skip_whitespace();
					self.expect(']')?;
				}
				_ => break Ok(segments),
			}
		}
	}

	fn identifier(&mut self) -> Result<Rc<str>, PathError> {
		let start = self.offset;
		match self.peek() {
			Some(c) if is_identifier_start(c) => {
				self.bump();
			}
			Some(found) => return Err(PathError::UnexpectedChar { found, offset: self.offset }),
			None => return Err(PathError::UnexpectedEnd { offset: self.offset }),
		}
		while self.peek().map_or(false, is_identifier_continue) {
			self.bump();
		}
		Ok(self.text[start..self.offset].into())
	}

	fn bracketed(&mut self) -> Result<Segment, PathError> {
		let start = self.offset;
		match self.peek() {
			Some(c) if c.is_ascii_digit() => {
				while self.peek().map_or(false, |c| c.is_ascii_digit()) {
					self.bump();
				}
				self.text[start..self.offset]
					.parse()
					.map(Segment::Index)
					.map_err(|_| PathError::IndexOverflow { offset: start })
			}
			Some(quote @ ('"' | '\'')) => {
				self.bump();
				let content_start = self.offset;
				loop {
					match self.bump() {
						Some(c) if c == quote => break,
						Some(_) => (),
						None => return Err(PathError::UnterminatedString { offset: start }),
					}
				}
				Ok(Segment::Name(self.text[content_start..self.offset - quote.len_utf8()].into()))
			}
			_ => {
				let segments = self.path()?;
				Ok(Segment::Lookup(Path {
					segments: segments.into(),
					raw: Some(self.text[start..self.offset].trim_end().into()),
				}))
			}
		}
	}
}
