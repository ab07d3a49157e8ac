//! Mutation records as produced by a data scope and consumed by [`ForNode::update`](`crate::ForNode::update`).

use crate::{path::Path, value::Value};
use core::fmt::{self, Debug, Formatter};

/// Propagation control for a single mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeOption {
	/// Apply the mutation without recording a [`DataChange`].
	pub silent: bool,
	/// Record a [`DataChange`] even if the new value is identical to the old one.
	pub force: bool,
}

impl ChangeOption {
	pub const SILENT: Self = Self { silent: true, force: false };
	pub const FORCE: Self = Self { silent: false, force: true };
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChangeKind {
	Set {
		value: Value,
	},
	Splice {
		index: usize,
		delete_count: usize,
		insertions: Vec<Value>,
	},
}

/// One atomic change to the data store.
#[derive(Clone, PartialEq)]
pub struct DataChange {
	pub path: Path,
	pub kind: ChangeKind,
	pub option: ChangeOption,
}

impl DataChange {
	#[must_use]
	pub fn set(path: Path, value: Value, option: ChangeOption) -> Self {
		Self {
			path,
			kind: ChangeKind::Set { value },
			option,
		}
	}

	#[must_use]
	pub fn splice(path: Path, index: usize, delete_count: usize, insertions: Vec<Value>, option: ChangeOption) -> Self {
		Self {
			path,
			kind: ChangeKind::Splice { index, delete_count, insertions },
			option,
		}
	}

	#[must_use]
	pub fn is_set(&self) -> bool {
		matches!(self.kind, ChangeKind::Set { .. })
	}

	#[must_use]
	pub fn is_splice(&self) -> bool {
		matches!(self.kind, ChangeKind::Splice { .. })
	}

	/// The same change, retargeted.
	#[must_use]
	pub fn with_path(&self, path: Path) -> Self {
		Self {
			path,
			kind: self.kind.clone(),
			option: self.option,
		}
	}
}

/// Values are only printed with the `"dangerous-logging"` feature enabled.
impl Debug for DataChange {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let mut debug = f.debug_struct("DataChange");
		debug.field("path", &format_args!("{}", self.path));
		match &self.kind {
			ChangeKind::Set { value } => {
				debug.field("kind", &"Set");
				if cfg!(feature = "dangerous-logging") {
					debug.field("value", value);
				}
			}
			ChangeKind::Splice { index, delete_count, insertions } => {
				debug.field("kind", &"Splice").field("index", index).field("delete_count", delete_count);
				if cfg!(feature = "dangerous-logging") {
					debug.field("insertions", insertions);
				} else {
					debug.field("insertions.len()", &insertions.len());
				}
			}
		}
		debug.field("option", &self.option).finish()
	}
}
