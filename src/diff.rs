//! The incremental list diff: classifies a batch of changes against a repeated region's
//! child slots and edits the slot list in place.
//!
//! The result is a [`PassPlan`]: which slots go, what each remaining slot is told and which
//! ones need (re)insertion. Applying that plan to the DOM is up to
//! [`ForNode`](`crate::ForNode`).

use crate::{
	change::{ChangeKind, ChangeOption, DataChange},
	classify::{classify, Relation},
	data::DataScope,
	directive::{ForConfig, ForDirective},
	host::Host,
	item_scope::ItemKey,
	path::{Path, Segment},
	value::Value,
	view::Slot,
};
use core::{
	cmp::max,
	fmt::{self, Debug, Formatter},
	iter,
};
use hashbrown::HashSet;
use tracing::{instrument, trace, trace_span};

/// One step of an [`edit_script`], in terms of positions in the old and new sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
	/// `old[old]` is retained as `new[new]`.
	Keep { old: usize, new: usize },
	/// `new[new]` is inserted in front of `old[old]` (or at the end).
	Insert { old: usize, new: usize },
	Delete { old: usize },
}

/// Aligns `old` and `new` along their longest common subsequence.
///
/// The script is produced back to front, so applying each edit to a copy of `old` in the
/// returned order never invalidates the positions of the edits still to come.
#[must_use]
pub fn edit_script<K: PartialEq>(old: &[K], new: &[K]) -> Vec<Edit> {
	let width = new.len() + 1;
	let mut table = vec![0_usize; (old.len() + 1) * width];
	for o in 1..=old.len() {
		for n in 1..=new.len() {
			table[o * width + n] = if old[o - 1] == new[n - 1] {
				table[(o - 1) * width + n - 1] + 1
			} else {
				max(table[(o - 1) * width + n], table[o * width + n - 1])
			};
		}
	}

	let mut script = Vec::with_capacity(max(old.len(), new.len()));
	let (mut o, mut n) = (old.len(), new.len());
	loop {
		if o > 0 && n > 0 && old[o - 1] == new[n - 1] {
			o -= 1;
			n -= 1;
			script.push(Edit::Keep { old: o, new: n })
		} else if n > 0 && (o == 0 || table[o * width + n - 1] >= table[(o - 1) * width + n]) {
			n -= 1;
			script.push(Edit::Insert { old: o, new: n })
		} else if o > 0 {
			o -= 1;
			script.push(Edit::Delete { old: o })
		} else {
			break script;
		}
	}
}

/// Item keys compare like the items they were taken from.
struct TrackKey(Value);

impl PartialEq for TrackKey {
	fn eq(&self, other: &Self) -> bool {
		self.0.same(&other.0)
	}
}

/// What a pass decided for one slot.
#[derive(Debug, Default, Clone)]
pub struct SlotPlan {
	pub changes: Vec<DataChange>,
	/// The slot holds a reused child that must be reinserted at its new position.
	pub moved: bool,
}

/// The outcome of an [`ArrayDiff`], parallel to the edited slot list.
pub struct PassPlan<H: Host> {
	pub slots: Vec<SlotPlan>,
	/// Slots that must be updated, or `None` if every slot with changes must be.
	pub need_update: Option<HashSet<usize>>,
	/// Nothing is to be created or updated once the disposals complete.
	pub only_dispose: bool,
	pub disposed: Vec<Slot<H>>,
}

impl<H: Host> PassPlan<H> {
	fn new(len: usize) -> Self {
		Self {
			slots: iter::repeat_with(SlotPlan::default).take(len).collect(),
			need_update: Some(HashSet::new()),
			only_dispose: true,
			disposed: Vec::new(),
		}
	}

	fn broadcast(&mut self, change: &DataChange) {
		for slot in &mut self.slots {
			slot.changes.push(change.clone())
		}
		self.need_update = None;
		self.only_dispose = false;
	}

	fn push(&mut self, index: usize, change: DataChange) {
		self.slots[index].changes.push(change)
	}

	fn mark(&mut self, index: usize) {
		if let Some(need_update) = &mut self.need_update {
			need_update.insert(index);
		}
	}

	#[must_use]
	pub fn needs_update(&self, index: usize) -> bool {
		self.slots.get(index).map_or(false, |slot| !slot.changes.is_empty()) && self.need_update.as_ref().map_or(true, |need_update| need_update.contains(&index))
	}
}

impl<H: Host> Debug for PassPlan<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("PassPlan")
			.field("slots", &self.slots.len())
			.field("need_update", &self.need_update)
			.field("only_dispose", &self.only_dispose)
			.field("disposed", &self.disposed.len())
			.finish()
	}
}

/// One incremental pass over a list-shaped collection.
///
/// `children` is edited in place: placeholders (`None`) are inserted where children must be
/// created, and slots that go are moved into [`PassPlan::disposed`].
pub struct ArrayDiff<'a, H: Host> {
	directive: &'a ForDirective,
	config: ForConfig,
	scope: &'a dyn DataScope,
	children: &'a mut Vec<Slot<H>>,
	old_list: &'a [Value],
	new_list: &'a [Value],
	plan: PassPlan<H>,
	rebuilt: bool,
	/// Options of the last structural change, carried by the index updates it causes.
	structural_option: ChangeOption,
}

impl<'a, H: Host> ArrayDiff<'a, H> {
	#[must_use]
	pub fn new(directive: &'a ForDirective, config: ForConfig, scope: &'a dyn DataScope, children: &'a mut Vec<Slot<H>>, old_list: &'a [Value], new_list: &'a [Value]) -> Self {
		let plan = PassPlan::new(children.len());
		Self {
			directive,
			config,
			scope,
			children,
			old_list,
			new_list,
			plan,
			rebuilt: false,
			structural_option: ChangeOption::default(),
		}
	}

	#[instrument(skip_all, fields(changes = changes.len(), old_len = self.children.len(), new_len = self.new_list.len()))]
	pub fn run(mut self, changes: &[DataChange]) -> PassPlan<H> {
		let old_len = self.children.len();

		for change in changes {
			match classify(&change.path, self.directive.value(), self.scope) {
				Relation::Unrelated => {
					trace!(path = %change.path, "Unrelated change. Forwarding to every child.");
					self.plan.broadcast(change)
				}
				Relation::ItemDescendant { .. } | Relation::BindingOrAncestor { .. } if self.rebuilt => {
					trace!(path = %change.path, "Superseded by rebuild.");
				}
				Relation::ItemDescendant { index } => self.update_item(index, change),
				Relation::BindingOrAncestor { is_ancestor: false } if self.splice_allowed() => match &change.kind {
					ChangeKind::Splice { index, delete_count, insertions } => self.splice(*index, *delete_count, insertions, change.option),
					ChangeKind::Set { .. } => self.rebuild(change, false),
				},
				Relation::BindingOrAncestor { is_ancestor } => self.rebuild(change, is_ancestor),
			}
		}

		self.normalize_len();
		self.renumber();
		self.notify_length(old_len);
		self.plan
	}

	fn splice_allowed(&self) -> bool {
		self.directive.track_by().is_none() && !self.directive.has_transition() && !self.config.flatten_splice
	}

	fn item_change(&self, value: Value, option: ChangeOption) -> DataChange {
		DataChange::set(self.directive.item_path().clone(), value, option)
	}

	fn ensure_slot(&mut self, index: usize) {
		if index >= self.children.len() {
			self.children.resize_with(index + 1, || None);
			self.plan.slots.resize_with(index + 1, SlotPlan::default);
		}
	}

	/// Retargets a change below `binding[index]` onto the item name and applies it to the
	/// child's scope right away, so evaluations during this pass see the new item.
	fn update_item(&mut self, index: usize, change: &DataChange) {
		let span = trace_span!("Updating item", index, path = %change.path);
		let _enter = span.enter();

		self.plan.only_dispose = false;
		self.plan.mark(index);
		self.ensure_slot(index);

		if self.directive.index().is_some() {
			self.plan.push(index, change.clone());
		}

		let binding_len = self.directive.value().len();
		let translated = change.with_path(Path::new(
			self.directive
				.item_path()
				.segments()
				.iter()
				.chain(&change.path.segments()[binding_len + 1..])
				.cloned(),
		));

		match (&self.children[index], &translated.kind) {
			(Some(child), ChangeKind::Set { value }) => child.scope().set_silent(&translated.path, value.clone()),
			(Some(child), ChangeKind::Splice { index, delete_count, insertions }) => child.scope().splice_silent(&translated.path, *index, *delete_count, insertions),
			(None, _) => trace!("No child at this position yet. It will be created."),
		}
		self.plan.push(index, translated);
	}

	/// Patches the slot list for a splice on the collection itself.
	///
	/// Slots overlapping deleted and inserted items are kept and told their new item.
	fn splice(&mut self, index: usize, delete_count: usize, insertions: &[Value], option: ChangeOption) {
		let start = index.min(self.children.len());
		let delete_count = delete_count.min(self.children.len() - start);
		let span = trace_span!("Splicing slots", start, delete_count, insertions = insertions.len());
		let _enter = span.enter();

		self.plan.need_update = None;
		self.structural_option = option;

		for (offset, insertion) in insertions.iter().take(delete_count).enumerate() {
			self.plan.only_dispose = false;
			if let Some(child) = &self.children[start + offset] {
				child.scope().replace_item(insertion.clone());
			}
			let change = self.item_change(insertion.clone(), option);
			self.plan.push(start + offset, change);
		}

		if insertions.len() < delete_count {
			let range = start + insertions.len()..start + delete_count;
			self.plan.slots.drain(range.clone());
			self.plan.disposed.extend(self.children.drain(range));
		} else if insertions.len() > delete_count {
			self.plan.only_dispose = false;
			let at = start + delete_count;
			let added = insertions.len() - delete_count;
			self.children.splice(at..at, iter::repeat_with(|| None).take(added));
			self.plan.slots.splice(at..at, iter::repeat_with(SlotPlan::default).take(added));
		}
	}

	/// Rebuilds the slot list against the new collection, by key if possible.
	fn rebuild(&mut self, change: &DataChange, is_ancestor: bool) {
		self.plan.need_update = None;
		self.plan.only_dispose = false;
		self.rebuilt = true;
		self.structural_option = change.option;

		match self.directive.track_by().cloned() {
			Some(track_by) if !self.new_list.is_empty() && !self.children.is_empty() => self.rebuild_keyed(&*track_by, change, is_ancestor),
			_ => self.rebuild_positional(change, is_ancestor),
		}
	}

	/// Tells a kept slot about its (possibly new) item.
	fn keep(&mut self, index: usize, item: &Value, change: &DataChange, is_ancestor: bool) {
		if let Some(child) = &self.children[index] {
			if !child.scope().item().same(item) {
				child.scope().replace_item(item.clone());
				let item_change = self.item_change(item.clone(), change.option);
				self.plan.push(index, item_change);
			}
		}
		if is_ancestor {
			self.plan.push(index, change.clone());
		}
	}

	fn rebuild_keyed(&mut self, track_by: &dyn Fn(&Value) -> Value, change: &DataChange, is_ancestor: bool) {
		let span = trace_span!("Keyed rebuild");
		let _enter = span.enter();

		let old_keys: Vec<TrackKey> = self
			.children
			.iter()
			.enumerate()
			.map(|(i, slot)| {
				let item = match slot {
					Some(child) => child.scope().item(),
					None => self.old_list.get(i).cloned().unwrap_or_default(),
				};
				TrackKey(track_by(&item))
			})
			.collect();
		let new_keys: Vec<TrackKey> = self.new_list.iter().map(|item| TrackKey(track_by(item))).collect();

		let new_list = self.new_list;
		let mut stash = Vec::new();
		for edit in edit_script(&old_keys, &new_keys) {
			match edit {
				Edit::Keep { old, new } => self.keep(old, &new_list[new], change, is_ancestor),
				Edit::Insert { old, .. } => {
					self.children.insert(old, None);
					self.plan.slots.insert(old, SlotPlan::default());
				}
				Edit::Delete { old } => {
					self.plan.slots.remove(old);
					stash.push((old, self.children.remove(old)));
				}
			}
		}

		// Deleted children whose key reappears elsewhere are moved instead of recreated.
		for (index, key) in new_keys.iter().enumerate() {
			if self.children[index].is_some() {
				continue;
			}
			let position = stash.iter().position(|(old, slot)| slot.is_some() && old_keys[*old] == *key);
			if let Some((old, child)) = position.map(|position| stash.swap_remove(position)) {
				trace!(old, new = index, "Moving child.");
				self.children[index] = child;
				self.plan.slots[index].moved = true;
				self.keep(index, &new_list[index], change, is_ancestor);
			}
		}
		self.plan.disposed.extend(stash.into_iter().map(|(_, slot)| slot));
	}

	fn rebuild_positional(&mut self, change: &DataChange, is_ancestor: bool) {
		let span = trace_span!("Positional rebuild");
		let _enter = span.enter();

		let new_list = self.new_list;
		if self.children.len() > new_list.len() {
			self.plan.slots.truncate(new_list.len());
			self.plan.disposed.extend(self.children.drain(new_list.len()..));
		}
		self.ensure_slot_count(new_list.len());

		for (index, item) in new_list.iter().enumerate() {
			self.keep(index, item, change, is_ancestor)
		}
	}

	fn ensure_slot_count(&mut self, len: usize) {
		if len > 0 {
			self.ensure_slot(len - 1)
		}
	}

	/// Brings the slot list to the collection's length.
	fn normalize_len(&mut self) {
		let new_len = self.new_list.len();
		if self.children.len() > new_len {
			trace!(excess = self.children.len() - new_len, "Dropping trailing slots.");
			self.plan.slots.truncate(new_len);
			self.plan.disposed.extend(self.children.drain(new_len..));
		} else if self.children.len() < new_len {
			self.plan.only_dispose = false;
			self.ensure_slot_count(new_len);
		}
	}

	/// Makes every item scope's index match its slot.
	fn renumber(&mut self) {
		let index_path = self.directive.index_path();
		for index in 0..self.children.len() {
			let child = match &self.children[index] {
				Some(child) => child,
				None => continue,
			};
			if child.scope().index() == ItemKey::Index(index) {
				continue;
			}
			child.scope().replace_index(ItemKey::Index(index));

			if let Some(index_path) = &index_path {
				self.plan.only_dispose = false;
				self.plan.mark(index);
				self.plan.push(index, DataChange::set(index_path.clone(), Value::from(index), self.structural_option));
			}
		}
	}

	/// Tells every child about a length change, if anything tracks the length.
	fn notify_length(&mut self, old_len: usize) {
		let new_len = self.new_list.len();
		if new_len == old_len {
			return;
		}

		let path = self.directive.value().resolve(self.scope).child(Segment::name("length"));
		let change = DataChange::set(path, Value::from(new_len), ChangeOption::default());
		if self.directive.data_refs().references(core::slice::from_ref(&change)) {
			trace!(old_len, new_len, "Length change is referenced.");
			self.plan.broadcast(&change)
		}
	}
}
