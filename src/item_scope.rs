//! The per-item data view that maps a repeated region's virtual names onto the bound collection.

use crate::{
	change::ChangeOption,
	data::{next_scope_id, DataScope, ScopeId},
	data_cache,
	directive::ForDirective,
	path::{Path, Segment},
	value::Value,
};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
	iter,
};
use std::rc::Rc;
use tracing::{trace, warn};

/// Where an item sits in its collection: a list position or a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemKey {
	Index(usize),
	Key(Rc<str>),
}

impl ItemKey {
	#[must_use]
	pub fn to_segment(&self) -> Segment {
		match self {
			ItemKey::Index(index) => Segment::Index(*index),
			ItemKey::Key(key) => Segment::Name(Rc::clone(key)),
		}
	}

	#[must_use]
	pub fn to_value(&self) -> Value {
		match self {
			ItemKey::Index(index) => Value::from(*index),
			ItemKey::Key(key) => Value::String(Rc::clone(key)),
		}
	}

	#[must_use]
	pub fn as_index(&self) -> Option<usize> {
		match self {
			ItemKey::Index(index) => Some(*index),
			ItemKey::Key(_) => None,
		}
	}
}

/// The data scope seen by one rendered item.
///
/// Reads of the item and index names are answered locally, everything else is read from the
/// parent scope. Mutations are rewritten onto the bound collection and forwarded to the
/// parent; the local item changes only when the owning [`ForNode`](`crate::ForNode`) pushes
/// the outcome back down.
pub struct ItemScope {
	id: ScopeId,
	parent: Rc<dyn DataScope>,
	directive: Rc<ForDirective>,
	item: RefCell<Value>,
	index: RefCell<ItemKey>,
}

impl ItemScope {
	#[must_use]
	pub fn new(parent: Rc<dyn DataScope>, directive: Rc<ForDirective>, item: Value, index: ItemKey) -> Self {
		Self {
			id: next_scope_id(),
			parent,
			directive,
			item: RefCell::new(item),
			index: RefCell::new(index),
		}
	}

	/// The current item value.
	#[must_use]
	pub fn item(&self) -> Value {
		self.item.borrow().clone()
	}

	/// The current position of the item in its collection.
	#[must_use]
	pub fn index(&self) -> ItemKey {
		self.index.borrow().clone()
	}

	#[must_use]
	pub fn directive(&self) -> &Rc<ForDirective> {
		&self.directive
	}

	pub(crate) fn replace_item(&self, item: Value) -> Value {
		self.item.replace(item)
	}

	pub(crate) fn replace_index(&self, index: ItemKey) -> ItemKey {
		self.index.replace(index)
	}

	/// Rewrites `path` from this item's point of view into a path on the parent scope.
	///
	/// A leading item name becomes `binding[index]`. A lookup of just the index name becomes
	/// the literal index. Other lookups are rewritten recursively.
	#[must_use]
	pub fn translate(&self, path: &Path) -> Path {
		let path = self.translate_item(path);
		if path.is_static() {
			return path;
		}

		let index_name = self.directive.index_name();
		Path::new(path.segments().iter().map(|segment| match segment {
			Segment::Lookup(lookup) if lookup.len() == 1 && lookup.root_name() == Some(index_name) => self.index.borrow().to_segment(),
			Segment::Lookup(lookup) => Segment::Lookup(self.translate(lookup)),
			other => other.clone(),
		}))
	}

	fn translate_item(&self, path: &Path) -> Path {
		if path.root_name() != Some(self.directive.item()) {
			return path.clone();
		}

		let binding = self.directive.value();
		Path::new(
			binding
				.segments()
				.iter()
				.cloned()
				.chain(iter::once(self.index.borrow().to_segment()))
				.chain(path.segments()[1..].iter().cloned()),
		)
	}

	/// Writes into the local item without forwarding or recording anything.
	///
	/// `path` is relative to this scope and must start with the item name.
	pub(crate) fn set_silent(&self, path: &Path, value: Value) {
		let path = path.resolve(self);
		match path.segments().split_first() {
			Some((Segment::Name(root), rest)) if **root == *self.directive.item() => {
				let mut item = self.item.borrow_mut();
				let updated = item.with(rest, value);
				*item = updated;
			}
			_ => trace!(%path, "Silent write outside the item. Ignoring."),
		}
	}

	/// Splices a list inside the local item without forwarding or recording anything.
	pub(crate) fn splice_silent(&self, path: &Path, index: usize, delete_count: usize, insertions: &[Value]) {
		let path = path.resolve(self);
		match path.segments().split_first() {
			Some((Segment::Name(root), rest)) if **root == *self.directive.item() => {
				let mut item = self.item.borrow_mut();
				match item.get(rest).spliced(index, delete_count, insertions) {
					Some(spliced) => {
						let updated = item.with(rest, spliced);
						*item = updated;
					}
					None => warn!(%path, "Silent splice target is not a list. Ignoring."),
				}
			}
			_ => trace!(%path, "Silent splice outside the item. Ignoring."),
		}
	}

	fn forward(&self, method: &'static str, path: &Path) -> Path {
		let translated = self.translate(path);
		data_cache::clear();
		trace!(id = self.id, method, %path, %translated, "Forwarding item mutation.");
		translated
	}
}

impl DataScope for ItemScope {
	fn id(&self) -> ScopeId {
		self.id
	}

	fn get(&self, path: &Path) -> Value {
		let path = path.resolve(self);
		match path.segments().split_first() {
			Some((Segment::Name(root), rest)) if **root == *self.directive.item() => self.item.borrow().get(rest),
			Some((Segment::Name(root), rest)) if **root == *self.directive.index_name() => self.index.borrow().to_value().get(rest),
			_ => self.parent.get(&path),
		}
	}

	fn set(&self, path: &Path, value: Value, option: ChangeOption) {
		let path = self.forward("set", path);
		self.parent.set(&path, value, option)
	}

	fn splice(&self, path: &Path, index: usize, delete_count: usize, insertions: Vec<Value>, option: ChangeOption) {
		let path = self.forward("splice", path);
		self.parent.splice(&path, index, delete_count, insertions, option)
	}

	fn remove(&self, path: &Path, value: &Value, option: ChangeOption) {
		let path = self.forward("remove", path);
		self.parent.remove(&path, value, option)
	}

	fn push(&self, path: &Path, value: Value, option: ChangeOption) {
		let path = self.forward("push", path);
		self.parent.push(&path, value, option)
	}

	fn pop(&self, path: &Path, option: ChangeOption) {
		let path = self.forward("pop", path);
		self.parent.pop(&path, option)
	}

	fn shift(&self, path: &Path, option: ChangeOption) {
		let path = self.forward("shift", path);
		self.parent.shift(&path, option)
	}

	fn unshift(&self, path: &Path, value: Value, option: ChangeOption) {
		let path = self.forward("unshift", path);
		self.parent.unshift(&path, value, option)
	}
}

impl Debug for ItemScope {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let mut debug = f.debug_struct("ItemScope");
		debug.field("id", &self.id).field("index", &*self.index.borrow());
		if cfg!(feature = "dangerous-logging") {
			debug.field("item", &*self.item.borrow());
		}
		debug.finish_non_exhaustive()
	}
}
