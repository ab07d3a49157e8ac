//! The parsed `for` directive and construct-level configuration.

use crate::{
	change::DataChange,
	path::{Path, PathRelation, Segment},
	value::Value,
};
use core::fmt::{self, Debug, Formatter};
use core::iter::FromIterator;
use hashbrown::HashSet;
use std::rc::Rc;

/// Maps an item to its identity key.
pub type TrackBy = Rc<dyn Fn(&Value) -> Value>;

/// Virtual index name used when the directive doesn't declare one.
pub const DEFAULT_INDEX_NAME: &str = "$index";

/// A repeated region: `for item, index in value trackBy key(item)`.
///
/// Immutable once a [`ForNode`](`crate::ForNode`) is built from it.
#[derive(Clone)]
pub struct ForDirective {
	item: Rc<str>,
	index: Option<Rc<str>>,
	value: Path,
	track_by: Option<TrackBy>,
	transition: bool,
	data_refs: DataRefs,
	item_path: Path,
}

impl ForDirective {
	#[must_use]
	pub fn new(item: &str, value: Path) -> Self {
		Self {
			item: item.into(),
			index: None,
			value,
			track_by: None,
			transition: false,
			data_refs: DataRefs::default(),
			item_path: Path::new(Some(Segment::name(item))),
		}
	}

	#[must_use]
	pub fn with_index(self, index: &str) -> Self {
		Self { index: Some(index.into()), ..self }
	}

	#[must_use]
	pub fn with_track_by(self, track_by: impl Fn(&Value) -> Value + 'static) -> Self {
		Self {
			track_by: Some(Rc::new(track_by)),
			..self
		}
	}

	/// Marks the region as animated, which disables the bulk-clear and splice fast paths.
	#[must_use]
	pub fn with_transition(self, transition: bool) -> Self {
		Self { transition, ..self }
	}

	#[must_use]
	pub fn with_data_refs(self, data_refs: DataRefs) -> Self {
		Self { data_refs, ..self }
	}

	#[must_use]
	pub fn item(&self) -> &str {
		&self.item
	}

	/// The declared index name, if any.
	#[must_use]
	pub fn index(&self) -> Option<&str> {
		self.index.as_deref()
	}

	/// The name the current index is visible under inside an item.
	#[must_use]
	pub fn index_name(&self) -> &str {
		self.index.as_deref().unwrap_or(DEFAULT_INDEX_NAME)
	}

	/// The bound collection expression.
	#[must_use]
	pub fn value(&self) -> &Path {
		&self.value
	}

	#[must_use]
	pub fn track_by(&self) -> Option<&TrackBy> {
		self.track_by.as_ref()
	}

	#[must_use]
	pub fn has_transition(&self) -> bool {
		self.transition
	}

	#[must_use]
	pub fn data_refs(&self) -> &DataRefs {
		&self.data_refs
	}

	/// `item`, as seen from inside an item scope.
	#[must_use]
	pub fn item_path(&self) -> &Path {
		&self.item_path
	}

	/// The declared index name as a path.
	#[must_use]
	pub fn index_path(&self) -> Option<Path> {
		self.index.as_deref().map(|index| Path::new(Some(Segment::name(index))))
	}
}

impl Debug for ForDirective {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ForDirective")
			.field("item", &self.item)
			.field("index", &self.index)
			.field("value", &self.value)
			.field("track_by", &self.track_by.is_some())
			.field("transition", &self.transition)
			.field("data_refs", &self.data_refs)
			.finish()
	}
}

/// The data dependencies a template tracks.
#[derive(Debug, Clone, Default)]
pub struct DataRefs(HashSet<Path>);

impl DataRefs {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, path: Path) -> bool {
		self.0.insert(path)
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// `true` iff any of `changes` touches a tracked path, its ancestors or its descendants.
	#[must_use]
	pub fn references(&self, changes: &[DataChange]) -> bool {
		changes.iter().any(|change| self.0.iter().any(|tracked| change.path.compare(tracked) != PathRelation::Unrelated))
	}
}

impl FromIterator<Path> for DataRefs {
	fn from_iter<T: IntoIterator<Item = Path>>(iter: T) -> Self {
		Self(iter.into_iter().collect())
	}
}

/// Construct-wide switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForConfig {
	/// The renderer prefers flat rebuilds over structural splice patches.
	pub flatten_splice: bool,
}
