//! The live repeated region.

use crate::{
	change::DataChange,
	data::{next_scope_id, DataScope},
	data_cache,
	diff::{ArrayDiff, PassPlan},
	directive::{ForConfig, ForDirective},
	dispose::{can_clear_violently, dispose_slots, DisposeTicket},
	host::Host,
	item_scope::{ItemKey, ItemScope},
	value::Value,
	view::{ChildView, Slot, Template},
};
use core::{
	cell::{RefCell, RefMut},
	fmt::{self, Debug, Formatter},
	mem,
};
use std::rc::{Rc, Weak};
use tracing::{instrument, trace, trace_span, warn};

/// Work left for after the current disposals complete.
enum Pending<H: Host> {
	Nothing,
	/// Recreate every child from the current collection.
	Rebuild,
	Patch { plan: PassPlan<H>, new_list: Value },
}

struct Inner<H: Host> {
	id: String,
	directive: Rc<ForDirective>,
	config: ForConfig,
	scope: Rc<dyn DataScope>,
	host: H,
	template: Rc<dyn Template<H>>,
	anchor: Option<H::Node>,
	children: Vec<Slot<H>>,
	list_data: Value,
	pending: Option<(u64, Pending<H>)>,
	generation: u64,
	/// The generation whose children were disposed in place and still wait for the wipe.
	clear_owed: Option<u64>,
}

/// A `for` construct: renders one child view per item of a collection and keeps them in sync
/// with incremental [`DataChange`] batches.
///
/// The children are inserted in order in front of an invisible anchor node ("stump") that
/// marks the end of the region.
///
/// # Correct Use
///
/// [`update`](`ForNode::update`) must be called with every change batch drained from the
/// data scope, in order. Skipping a batch leaves children with stale items until the bound
/// collection is reassigned.
pub struct ForNode<H: Host> {
	inner: Rc<RefCell<Inner<H>>>,
}

impl<H: Host> ForNode<H> {
	#[must_use]
	pub fn new(directive: ForDirective, scope: Rc<dyn DataScope>, host: H, template: Rc<dyn Template<H>>) -> Self {
		Self {
			inner: Rc::new(RefCell::new(Inner {
				id: format!("for-{}", next_scope_id()),
				directive: Rc::new(directive),
				config: ForConfig::default(),
				scope,
				host,
				template,
				anchor: None,
				children: Vec::new(),
				list_data: Value::Null,
				pending: None,
				generation: 0,
				clear_owed: None,
			})),
		}
	}

	#[must_use]
	pub fn with_config(self, config: ForConfig) -> Self {
		self.inner.borrow_mut().config = config;
		self
	}

	/// Inserts the anchor into `parent` before `before` and renders the current collection.
	#[instrument(skip_all)]
	pub fn attach(&self, parent: &H::Node, before: Option<&H::Node>) {
		let mut guard = self.inner.borrow_mut();
		let inner = &mut *guard;
		if inner.anchor.is_some() {
			return warn!(id = %inner.id, "Already attached. Ignoring.");
		}

		let anchor = inner.host.create_stump(&inner.id);
		inner.host.insert_before(&anchor, parent, before);
		inner.anchor = Some(anchor);
		inner.list_data = inner.evaluate();
		inner.create_children()
	}

	/// Runs one reconciliation pass for `changes`.
	///
	/// Children that go are disposed first. Creation and updates follow once every disposal
	/// has completed, unless another pass was started in the meantime.
	#[instrument(skip_all, fields(changes = changes.len()))]
	pub fn update(&self, changes: &[DataChange]) {
		data_cache::clear();

		let mut guard = self.inner.borrow_mut();
		let inner = &mut *guard;
		if inner.anchor.is_none() {
			return warn!(id = %inner.id, "Update before attach. Ignoring.");
		}
		let new_data = inner.evaluate();

		if inner.children.is_empty() {
			trace!("No children. Creating from scratch.");
			inner.cancel_pending();
			inner.list_data = new_data;
			return inner.create_children();
		}

		if new_data.is_null() || new_data.as_list().map_or(false, <[Value]>::is_empty) {
			trace!("Collection emptied.");
			inner.list_data = new_data;
			let (slots, violent) = inner.take_all();
			return self.schedule(guard, slots, violent, Pending::Nothing);
		}

		let old_is_list = matches!(inner.list_data, Value::List(_));
		let new_is_list = matches!(new_data, Value::List(_));
		if old_is_list != new_is_list || !new_is_list {
			trace!(old_is_list, new_is_list, "Collection shape changed. Rebuilding.");
			inner.list_data = new_data;
			let (slots, violent) = inner.take_all();
			return self.schedule(guard, slots, violent, Pending::Rebuild);
		}

		let mut plan = {
			let old_list = inner.list_data.as_list().unwrap_or(&[]);
			let new_list = new_data.as_list().unwrap_or(&[]);
			ArrayDiff::new(&inner.directive, inner.config, &*inner.scope, &mut inner.children, old_list, new_list).run(changes)
		};
		inner.list_data = new_data.clone();
		let disposed = mem::take(&mut plan.disposed);
		self.schedule(guard, disposed, false, Pending::Patch { plan, new_list: new_data })
	}

	/// Disposes every child and removes the anchor. `ticket` completes after all children did.
	#[instrument(skip_all, fields(no_detach, no_unbind))]
	#[allow(clippy::fn_params_excessive_bools)]
	pub fn dispose(&self, no_detach: bool, no_unbind: bool, ticket: DisposeTicket) {
		let mut inner = self.inner.borrow_mut();
		inner.cancel_pending();
		let children = mem::take(&mut inner.children);
		let anchor = inner.anchor.take();
		let host = inner.host.clone();
		drop(inner);

		dispose_slots(children, no_detach, no_unbind, move || {
			if let Some(anchor) = anchor {
				if !no_detach {
					host.remove(&anchor)
				}
			}
			ticket.finish()
		})
	}

	/// The number of slots, including placeholders still awaiting creation.
	#[must_use]
	pub fn len(&self) -> usize {
		self.inner.borrow().children.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.inner.borrow().children.is_empty()
	}

	#[must_use]
	pub fn anchor(&self) -> Option<H::Node> {
		self.inner.borrow().anchor.clone()
	}

	/// The collection snapshot of the most recent pass.
	#[must_use]
	pub fn list_data(&self) -> Value {
		self.inner.borrow().list_data.clone()
	}

	/// `true` while a pass waits for disposals to complete.
	#[must_use]
	pub fn has_pending_pass(&self) -> bool {
		self.inner.borrow().pending.is_some()
	}

	pub fn with_children<R>(&self, f: impl FnOnce(&[Slot<H>]) -> R) -> R {
		f(&self.inner.borrow().children)
	}

	/// Hands `slots` to disposal and stores `pending` as the continuation.
	///
	/// `guard` is released first, since disposal may complete synchronously.
	fn schedule(&self, mut guard: RefMut<'_, Inner<H>>, slots: Vec<Slot<H>>, violent: bool, pending: Pending<H>) {
		guard.flush_clear();
		guard.generation += 1;
		let generation = guard.generation;
		guard.pending = Some((generation, pending));
		if violent {
			guard.clear_owed = Some(generation);
		}
		drop(guard);

		let weak = Rc::downgrade(&self.inner);
		dispose_slots(slots, violent, violent, move || Self::resume(&weak, generation))
	}

	fn resume(weak: &Weak<RefCell<Inner<H>>>, generation: u64) {
		let inner = match weak.upgrade() {
			Some(inner) => inner,
			None => return trace!("Dropped before disposal completed."),
		};
		let mut inner = inner.borrow_mut();

		match inner.pending.take() {
			Some((current, pending)) if current == generation => {
				if inner.clear_owed == Some(generation) {
					inner.clear_owed = None;
					inner.clear_container()
				}
				match pending {
					Pending::Nothing => (),
					Pending::Rebuild => inner.create_children(),
					Pending::Patch { plan, new_list } => inner.create_and_update(&plan, &new_list),
				}
			}
			other => {
				inner.pending = other;
				trace!(generation, "Skipping stale continuation.")
			}
		}
	}
}

impl<H: Host> Inner<H> {
	fn evaluate(&self) -> Value {
		let value = self.directive.value();
		data_cache::get_or_insert_with(self.scope.id(), value.raw(), || self.scope.get(value))
	}

	fn cancel_pending(&mut self) {
		self.flush_clear();
		self.generation += 1;
		if self.pending.take().is_some() {
			trace!("Cancelled pending pass.");
		}
	}

	fn insertion_point(&self) -> Option<(H::Node, H::Node)> {
		let anchor = self.anchor.clone()?;
		let parent = self.host.parent_node(&anchor)?;
		Some((parent, anchor))
	}

	/// Wipes the container now if a superseded pass still owes the wipe.
	fn flush_clear(&mut self) {
		if let Some(generation) = self.clear_owed.take() {
			trace!(generation, "Superseded bulk clear. Wiping now.");
			self.clear_container()
		}
	}

	/// Takes every slot out, and checks whether the container can simply be wiped.
	fn take_all(&mut self) -> (Vec<Slot<H>>, bool) {
		let violent = match self.insertion_point() {
			Some((parent, anchor)) => can_clear_violently(&self.host, self.directive.has_transition(), &self.children, &anchor, &parent),
			None => false,
		};
		(mem::take(&mut self.children), violent)
	}

	/// Replaces the container with an empty clone holding only a fresh anchor.
	fn clear_container(&mut self) {
		let (parent, _) = match self.insertion_point() {
			Some(insertion_point) => insertion_point,
			None => return warn!("Detached before bulk clear."),
		};
		let span = trace_span!("Clearing container", id = %self.id);
		let _enter = span.enter();

		let replacement = self.host.replace_with_empty_clone(&parent);
		let anchor = self.host.create_stump(&self.id);
		self.host.insert_before(&anchor, &replacement, None);
		self.anchor = Some(anchor);
	}

	fn create_child(&self, item: Value, key: ItemKey) -> Box<dyn ChildView<H>> {
		let scope = Rc::new(ItemScope::new(Rc::clone(&self.scope), Rc::clone(&self.directive), item, key));
		self.template.create(scope)
	}

	fn create_children(&mut self) {
		let (parent, anchor) = match self.insertion_point() {
			Some(insertion_point) => insertion_point,
			None => return warn!("Not in a container. Skipping child creation."),
		};

		let list_data = self.list_data.clone();
		let items: Vec<(Value, ItemKey)> = match &list_data {
			Value::List(items) => items.iter().enumerate().map(|(index, item)| (item.clone(), ItemKey::Index(index))).collect(),
			Value::Map(entries) => entries
				.iter()
				.filter(|(_, item)| !item.is_null())
				.map(|(key, item)| (item.clone(), ItemKey::Key(Rc::clone(key))))
				.collect(),
			_ => Vec::new(),
		};

		let span = trace_span!("Creating children", count = items.len());
		let _enter = span.enter();
		for (item, key) in items {
			let mut child = self.create_child(item, key);
			child.attach(&parent, Some(&anchor));
			self.children.push(Some(child));
		}
	}

	/// Dispatches collected changes, then creates placeholders and reinserts moved children
	/// back to front so each one goes in front of its already placed successor.
	fn create_and_update(&mut self, plan: &PassPlan<H>, new_list: &Value) {
		if plan.only_dispose {
			return trace!("Nothing to create or update.");
		}
		let (parent, anchor) = match self.insertion_point() {
			Some(insertion_point) => insertion_point,
			None => return warn!("Not in a container. Skipping creation."),
		};
		let span = trace_span!("Creating and updating", slots = self.children.len());
		let _enter = span.enter();

		for (index, slot) in self.children.iter_mut().enumerate() {
			if let Some(child) = slot {
				if plan.needs_update(index) {
					child.update(&plan.slots[index].changes)
				}
			}
		}

		let mut before = anchor;
		for index in (0..self.children.len()).rev() {
			let moved = plan.slots.get(index).map_or(false, |slot| slot.moved);
			match self.children[index].as_mut() {
				Some(child) => {
					if moved {
						child.attach(&parent, Some(&before))
					}
				}
				None => {
					let item = new_list.as_list().and_then(|items| items.get(index)).cloned().unwrap_or_default();
					let mut child = self.create_child(item, ItemKey::Index(index));
					child.attach(&parent, Some(&before));
					self.children[index] = Some(child);
				}
			}

			if let Some(first_node) = self.children[index].as_ref().and_then(|child| child.first_node()) {
				before = first_node;
			}
		}
	}
}

impl<H: Host> Debug for ForNode<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let inner = self.inner.borrow();
		f.debug_struct("ForNode")
			.field("id", &inner.id)
			.field("directive", &inner.directive)
			.field("config", &inner.config)
			.field("anchor", &inner.anchor)
			.field("slots", &inner.children.len())
			.field("pending", &inner.pending.as_ref().map(|(generation, _)| generation))
			.field("clear_owed", &inner.clear_owed)
			.finish_non_exhaustive()
	}
}
