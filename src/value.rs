//! Immutable, shared data values as held by a [`DataScope`](`crate::data::DataScope`).

use crate::path::Segment;
use core::fmt::{self, Display, Formatter};
use std::rc::Rc;

/// A data value.
///
/// Lists and maps are shared and never mutated in place: [`Value::with`] and
/// [`Value::spliced`] rebuild every container along the way, so an edited container has a
/// new identity as far as [`Value::same`] is concerned.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Null,
	Bool(bool),
	Number(f64),
	String(Rc<str>),
	List(Rc<Vec<Value>>),
	/// Entries keep their insertion order.
	Map(Rc<Vec<(Rc<str>, Value)>>),
}

impl Default for Value {
	fn default() -> Self {
		Self::Null
	}
}

impl Value {
	#[must_use]
	pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
		Self::List(Rc::new(items.into_iter().collect()))
	}

	#[must_use]
	pub fn map<K: Into<Rc<str>>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
		Self::Map(Rc::new(entries.into_iter().map(|(key, value)| (key.into(), value)).collect()))
	}

	/// Reference identity for lists and maps, value equality for everything else.
	#[must_use]
	pub fn same(&self, other: &Value) -> bool {
		match (self, other) {
			(Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
			(Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
			(Value::List(_), _) | (Value::Map(_), _) | (_, Value::List(_)) | (_, Value::Map(_)) => false,
			(a, b) => a == b,
		}
	}

	#[must_use]
	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	#[must_use]
	pub fn as_list(&self) -> Option<&[Value]> {
		match self {
			Value::List(items) => Some(items.as_slice()),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_number(&self) -> Option<f64> {
		match self {
			Value::Number(number) => Some(*number),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::String(string) => Some(&**string),
			_ => None,
		}
	}

	/// Non-negative integral numbers and strings spelling one.
	#[must_use]
	#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss, clippy::float_cmp)]
	pub fn as_index(&self) -> Option<usize> {
		match self {
			Value::Number(number) if *number >= 0.0 && number.fract() == 0.0 && *number <= usize::MAX as f64 => Some(*number as usize),
			Value::String(string) => string.parse().ok(),
			_ => None,
		}
	}

	/// Looks up a map entry by key.
	#[must_use]
	pub fn entry(&self, key: &str) -> Option<&Value> {
		match self {
			Value::Map(entries) => entries.iter().find(|(k, _)| &**k == key).map(|(_, value)| value),
			_ => None,
		}
	}

	/// The value one static step down, or [`Value::Null`] if there is none.
	#[must_use]
	pub fn child(&self, segment: &Segment) -> Value {
		match self {
			Value::List(items) => match segment.as_index() {
				Some(index) => items.get(index).cloned().unwrap_or_default(),
				None if segment.key().as_deref() == Some("length") => Value::from(items.len()),
				None => Value::Null,
			},
			Value::String(string) if segment.key().as_deref() == Some("length") => Value::from(string.chars().count()),
			Value::Map(_) => segment.key().and_then(|key| self.entry(&key).cloned()).unwrap_or_default(),
			_ => Value::Null,
		}
	}

	/// Follows a static path.
	#[must_use]
	pub fn get(&self, segments: &[Segment]) -> Value {
		match segments.split_first() {
			None => self.clone(),
			Some((first, rest)) => self.child(first).get(rest),
		}
	}

	/// Returns a copy with the value at `segments` replaced.
	///
	/// Missing containers are created as maps; lists are padded with [`Value::Null`] when
	/// written past their end.
	#[must_use]
	pub fn with(&self, segments: &[Segment], value: Value) -> Value {
		let (first, rest) = match segments.split_first() {
			None => return value,
			Some(split) => split,
		};

		match self {
			Value::List(items) => match first.as_index() {
				Some(index) => {
					let mut items = Vec::clone(items);
					if index >= items.len() {
						items.resize(index + 1, Value::Null);
					}
					items[index] = items[index].with(rest, value);
					Value::List(Rc::new(items))
				}
				None => {
					tracing::warn!("Ignoring non-index write into a list.");
					self.clone()
				}
			},
			Value::Map(entries) => {
				let key: Rc<str> = match first.key() {
					Some(key) => key.as_ref().into(),
					None => return self.clone(),
				};
				let mut entries = Vec::clone(entries);
				match entries.iter_mut().find(|(k, _)| *k == key) {
					Some((_, existing)) => *existing = existing.with(rest, value),
					None => entries.push((key, Value::Null.with(rest, value))),
				}
				Value::Map(Rc::new(entries))
			}
			_ => match first.key() {
				Some(key) => Value::map(vec![(key.as_ref(), Value::Null.with(rest, value))]),
				None => self.clone(),
			},
		}
	}

	/// Applies an array splice, clamping `index` and `delete_count` to the list bounds.
	///
	/// Returns `None` if this isn't a list.
	#[must_use]
	pub fn spliced(&self, index: usize, delete_count: usize, insertions: &[Value]) -> Option<Value> {
		let items = self.as_list()?;
		let start = index.min(items.len());
		let end = start.saturating_add(delete_count).min(items.len());

		let mut spliced = Vec::with_capacity(items.len() - (end - start) + insertions.len());
		spliced.extend_from_slice(&items[..start]);
		spliced.extend_from_slice(insertions);
		spliced.extend_from_slice(&items[end..]);
		Some(Value::List(Rc::new(spliced)))
	}
}

impl Display for Value {
	#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Value::Null => f.write_str("null"),
			Value::Bool(bool) => write!(f, "{}", bool),
			Value::Number(number) if number.fract() == 0.0 && number.abs() < 1e15 => write!(f, "{}", *number as i64),
			Value::Number(number) => write!(f, "{}", number),
			Value::String(string) => f.write_str(string),
			Value::List(items) => {
				for (i, item) in items.iter().enumerate() {
					if i > 0 {
						f.write_str(",")?;
					}
					write!(f, "{}", item)?;
				}
				Ok(())
			}
			Value::Map(_) => f.write_str("[object]"),
		}
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Self::Number(value)
	}
}

impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Self::Number(value.into())
	}
}

impl From<usize> for Value {
	#[allow(clippy::cast_precision_loss)]
	fn from(value: usize) -> Self {
		Self::Number(value as f64)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::String(value.into())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::String(value.into())
	}
}

impl From<Vec<Value>> for Value {
	fn from(items: Vec<Value>) -> Self {
		Self::List(Rc::new(items))
	}
}
