//! The data-scope interface and a root store that records its mutations.

use crate::{
	change::{ChangeOption, DataChange},
	path::Path,
	value::Value,
};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
	sync::atomic::{AtomicU64, Ordering},
};
use std::rc::Rc;
use tracing::{instrument, trace, warn};

pub type ScopeId = u64;

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// A process-unique identifier, used to key the [`data_cache`](`crate::data_cache`).
pub fn next_scope_id() -> ScopeId {
	NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Read and mutate access to data by [`Path`].
///
/// The derived mutators are expressed through [`get`](`DataScope::get`) and
/// [`splice`](`DataScope::splice`) by default.
pub trait DataScope {
	fn id(&self) -> ScopeId;

	/// [`Value::Null`] where nothing is found.
	fn get(&self, path: &Path) -> Value;

	fn set(&self, path: &Path, value: Value, option: ChangeOption);

	fn splice(&self, path: &Path, index: usize, delete_count: usize, insertions: Vec<Value>, option: ChangeOption);

	/// Removes the first item [`same`](`Value::same`) as `value`.
	fn remove(&self, path: &Path, value: &Value, option: ChangeOption) {
		let position = self.get(path).as_list().and_then(|items| items.iter().position(|item| item.same(value)));
		if let Some(index) = position {
			self.splice(path, index, 1, Vec::new(), option);
		}
	}

	fn push(&self, path: &Path, value: Value, option: ChangeOption) {
		let len = self.get(path).as_list().map_or(0, <[Value]>::len);
		self.splice(path, len, 0, vec![value], option);
	}

	fn pop(&self, path: &Path, option: ChangeOption) {
		match self.get(path).as_list().map_or(0, <[Value]>::len) {
			0 => (),
			len => self.splice(path, len - 1, 1, Vec::new(), option),
		}
	}

	fn shift(&self, path: &Path, option: ChangeOption) {
		if self.get(path).as_list().map_or(false, |items| !items.is_empty()) {
			self.splice(path, 0, 1, Vec::new(), option);
		}
	}

	fn unshift(&self, path: &Path, value: Value, option: ChangeOption) {
		self.splice(path, 0, 0, vec![value], option);
	}
}

/// A root data store.
///
/// Every non-silent mutation is recorded with a fully resolved path. Recorded changes are
/// drained in order with [`Data::take_changes`] and handed to the views as one batch.
pub struct Data {
	id: ScopeId,
	raw: RefCell<Value>,
	parent: Option<Rc<dyn DataScope>>,
	changes: RefCell<Vec<DataChange>>,
}

impl Data {
	#[must_use]
	pub fn new(raw: Value) -> Self {
		Self {
			id: next_scope_id(),
			raw: RefCell::new(raw),
			parent: None,
			changes: RefCell::default(),
		}
	}

	/// Names that aren't found locally are looked up in `parent`.
	#[must_use]
	pub fn with_parent(raw: Value, parent: Rc<dyn DataScope>) -> Self {
		Self { parent: Some(parent), ..Self::new(raw) }
	}

	#[must_use]
	pub fn raw(&self) -> Value {
		self.raw.borrow().clone()
	}

	/// Drains the recorded mutations, oldest first.
	pub fn take_changes(&self) -> Vec<DataChange> {
		self.changes.take()
	}

	#[must_use]
	pub fn pending_change_count(&self) -> usize {
		self.changes.borrow().len()
	}

	fn record(&self, change: DataChange) {
		if change.option.silent {
			return;
		}
		trace!(?change, "Recording change.");
		self.changes.borrow_mut().push(change)
	}
}

impl DataScope for Data {
	fn id(&self) -> ScopeId {
		self.id
	}

	fn get(&self, path: &Path) -> Value {
		let path = path.resolve(self);
		let raw = self.raw.borrow();
		match (&self.parent, path.segments().first()) {
			(Some(parent), Some(first)) if raw.child(first).is_null() => {
				drop(raw);
				parent.get(&path)
			}
			_ => raw.get(path.segments()),
		}
	}

	#[instrument(skip(self, value), fields(id = self.id, %path))]
	fn set(&self, path: &Path, value: Value, option: ChangeOption) {
		let path = path.resolve(self);
		if !option.force && self.get(&path).same(&value) {
			trace!("Value unchanged.");
			return;
		}

		{
			let mut raw = self.raw.borrow_mut();
			let updated = raw.with(path.segments(), value.clone());
			*raw = updated;
		}
		self.record(DataChange::set(path, value, option));
	}

	#[instrument(skip(self, insertions), fields(id = self.id, %path, insertions = insertions.len()))]
	fn splice(&self, path: &Path, index: usize, delete_count: usize, insertions: Vec<Value>, option: ChangeOption) {
		let path = path.resolve(self);
		let list = self.raw.borrow().get(path.segments());
		let len = match list.as_list() {
			Some(items) => items.len(),
			None => return warn!("Splice target is not a list. Ignoring."),
		};

		let index = index.min(len);
		let delete_count = delete_count.min(len - index);
		if let Some(spliced) = list.spliced(index, delete_count, &insertions) {
			let mut raw = self.raw.borrow_mut();
			let updated = raw.with(path.segments(), spliced);
			*raw = updated;
		}
		self.record(DataChange::splice(path, index, delete_count, insertions, option));
	}
}

impl Debug for Data {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Data")
			.field("id", &self.id)
			.field("has_parent", &self.parent.is_some())
			.field("pending_changes", &self.changes.borrow().len())
			.finish_non_exhaustive()
	}
}
