#![allow(dead_code)]

use repeat_dom::{
	data::DataScope, host::Host, ChildView, DataChange, DisposeTicket, ForConfig, ForDirective, ForNode, ItemScope, Template, Value,
};
use std::{cell::RefCell, rc::Rc};
use tracing::Level;

pub fn init_tracing() {
	tracing_subscriber::fmt().with_max_level(Level::TRACE).with_test_writer().try_init().ok();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct NodeData {
	label: String,
	parent: Option<usize>,
	children: Vec<usize>,
}

/// A tiny DOM stand-in: labelled nodes in an arena.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
	nodes: Rc<RefCell<Vec<NodeData>>>,
}

impl MemoryHost {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn create(&self, label: &str) -> NodeId {
		let mut nodes = self.nodes.borrow_mut();
		nodes.push(NodeData {
			label: label.to_owned(),
			parent: None,
			children: Vec::new(),
		});
		NodeId(nodes.len() - 1)
	}

	pub fn append(&self, parent: NodeId, label: &str) -> NodeId {
		let node = self.create(label);
		self.insert_before(&node, &parent, None);
		node
	}

	pub fn set_label(&self, node: NodeId, label: &str) {
		self.nodes.borrow_mut()[node.0].label = label.to_owned()
	}

	pub fn label(&self, node: NodeId) -> String {
		self.nodes.borrow()[node.0].label.clone()
	}

	pub fn children(&self, parent: NodeId) -> Vec<NodeId> {
		self.nodes.borrow()[parent.0].children.iter().copied().map(NodeId).collect()
	}

	/// Child labels of `parent`, with stumps shown as `#`.
	pub fn labels(&self, parent: NodeId) -> Vec<String> {
		self.children(parent).into_iter().map(|child| self.label(child)).collect()
	}

	fn detach(&self, node: NodeId) {
		let mut nodes = self.nodes.borrow_mut();
		if let Some(parent) = nodes[node.0].parent.take() {
			nodes[parent].children.retain(|&child| child != node.0);
		}
	}
}

impl Host for MemoryHost {
	type Node = NodeId;

	fn create_stump(&self, _id: &str) -> NodeId {
		self.create("#")
	}

	fn insert_before(&self, node: &NodeId, parent: &NodeId, reference: Option<&NodeId>) {
		self.detach(*node);
		let mut nodes = self.nodes.borrow_mut();
		let position = reference.and_then(|reference| nodes[parent.0].children.iter().position(|&child| child == reference.0));
		let siblings = &mut nodes[parent.0].children;
		match position {
			Some(position) => siblings.insert(position, node.0),
			None => siblings.push(node.0),
		}
		nodes[node.0].parent = Some(parent.0);
	}

	fn remove(&self, node: &NodeId) {
		self.detach(*node)
	}

	fn parent_node(&self, node: &NodeId) -> Option<NodeId> {
		self.nodes.borrow()[node.0].parent.map(NodeId)
	}

	fn first_child(&self, node: &NodeId) -> Option<NodeId> {
		self.nodes.borrow()[node.0].children.first().copied().map(NodeId)
	}

	fn last_child(&self, node: &NodeId) -> Option<NodeId> {
		self.nodes.borrow()[node.0].children.last().copied().map(NodeId)
	}

	fn replace_with_empty_clone(&self, node: &NodeId) -> NodeId {
		let label = self.label(*node);
		let replacement = self.create(&label);
		let parent = self.parent_node(node);
		if let Some(parent) = parent {
			let mut nodes = self.nodes.borrow_mut();
			if let Some(position) = nodes[parent.0].children.iter().position(|&child| child == node.0) {
				nodes[parent.0].children[position] = replacement.0;
			}
			nodes[replacement.0].parent = Some(parent.0);
			nodes[node.0].parent = None;
		}
		replacement
	}
}

/// What the test views went through, by scope id.
#[derive(Debug, Default)]
pub struct Journal {
	pub created: Vec<(u64, Value)>,
	pub updates: Vec<(u64, Vec<DataChange>)>,
	pub disposed: Vec<u64>,
	pub violent_disposals: usize,
	/// Park dispose tickets instead of finishing them, to simulate exit animations.
	pub park_tickets: bool,
	pub parked: Vec<DisposeTicket>,
}

impl Journal {
	pub fn created_items(&self) -> Vec<String> {
		self.created.iter().map(|(_, item)| item.to_string()).collect()
	}

	pub fn updated_ids(&self) -> Vec<u64> {
		self.updates.iter().map(|(id, _)| *id).collect()
	}

	pub fn updates_for(&self, id: u64) -> Vec<DataChange> {
		self.updates.iter().filter(|(updated, _)| *updated == id).flat_map(|(_, changes)| changes.iter().cloned()).collect()
	}
}

/// Renders each item as one node labelled with the item's text.
pub struct TestTemplate {
	pub host: MemoryHost,
	pub journal: Rc<RefCell<Journal>>,
}

impl Template<MemoryHost> for TestTemplate {
	fn create(&self, scope: Rc<ItemScope>) -> Box<dyn ChildView<MemoryHost>> {
		let item = scope.item();
		self.journal.borrow_mut().created.push((scope.id(), item.clone()));
		Box::new(TestView {
			node: self.host.create(&item.to_string()),
			host: self.host.clone(),
			journal: Rc::clone(&self.journal),
			scope,
		})
	}
}

pub struct TestView {
	scope: Rc<ItemScope>,
	host: MemoryHost,
	node: NodeId,
	journal: Rc<RefCell<Journal>>,
}

impl ChildView<MemoryHost> for TestView {
	fn scope(&self) -> &Rc<ItemScope> {
		&self.scope
	}

	fn first_node(&self) -> Option<NodeId> {
		Some(self.node)
	}

	fn attach(&mut self, parent: &NodeId, before: Option<&NodeId>) {
		self.host.insert_before(&self.node, parent, before)
	}

	fn update(&mut self, changes: &[DataChange]) {
		self.host.set_label(self.node, &self.scope.item().to_string());
		self.journal.borrow_mut().updates.push((self.scope.id(), changes.to_vec()));
	}

	fn dispose(self: Box<Self>, no_detach: bool, _no_unbind: bool, ticket: DisposeTicket) {
		let mut journal = self.journal.borrow_mut();
		journal.disposed.push(self.scope.id());
		if no_detach {
			journal.violent_disposals += 1;
		} else {
			self.host.remove(&self.node);
		}
		if journal.park_tickets {
			journal.parked.push(ticket);
		} else {
			drop(journal);
			ticket.finish();
		}
	}
}

/// A mounted region over `data` inside a fresh `<container>`.
pub struct Fixture {
	pub host: MemoryHost,
	pub container: NodeId,
	pub journal: Rc<RefCell<Journal>>,
	pub node: ForNode<MemoryHost>,
}

impl Fixture {
	pub fn new(directive: ForDirective, scope: Rc<dyn DataScope>) -> Self {
		let host = MemoryHost::new();
		let root = host.create("root");
		let container = host.append(root, "container");
		Self::in_container(host, container, directive, scope)
	}

	pub fn with_config(directive: ForDirective, scope: Rc<dyn DataScope>, config: ForConfig) -> Self {
		let host = MemoryHost::new();
		let root = host.create("root");
		let container = host.append(root, "container");
		Self::mount(host, container, directive, scope, config)
	}

	pub fn in_container(host: MemoryHost, container: NodeId, directive: ForDirective, scope: Rc<dyn DataScope>) -> Self {
		Self::mount(host, container, directive, scope, ForConfig::default())
	}

	fn mount(host: MemoryHost, container: NodeId, directive: ForDirective, scope: Rc<dyn DataScope>, config: ForConfig) -> Self {
		init_tracing();
		repeat_dom::data_cache::init();
		let journal = Rc::new(RefCell::new(Journal::default()));
		let template = Rc::new(TestTemplate {
			host: host.clone(),
			journal: Rc::clone(&journal),
		});
		let node = ForNode::new(directive, scope, host.clone(), template).with_config(config);
		node.attach(&container, None);
		Self { host, container, journal, node }
	}

	/// The container of the region, which changes after a bulk clear.
	pub fn current_container(&self) -> NodeId {
		let anchor = self.node.anchor().expect("attached");
		self.host.parent_node(&anchor).expect("anchor in container")
	}

	pub fn labels(&self) -> Vec<String> {
		self.host.labels(self.current_container())
	}

	/// Scope ids of the live children, in order. Placeholders are `None`.
	pub fn child_ids(&self) -> Vec<Option<u64>> {
		self.node.with_children(|children| children.iter().map(|slot| slot.as_ref().map(|child| child.scope().id())).collect())
	}

	pub fn child_indices(&self) -> Vec<Option<usize>> {
		self.node
			.with_children(|children| children.iter().map(|slot| slot.as_ref().and_then(|child| child.scope().index().as_index())).collect())
	}

	pub fn clear_journal(&self) {
		let mut journal = self.journal.borrow_mut();
		journal.created.clear();
		journal.updates.clear();
		journal.disposed.clear();
		journal.violent_disposals = 0;
	}
}

pub fn list(items: &[&str]) -> Value {
	Value::list(items.iter().map(|&item| Value::from(item)))
}

pub fn strings(items: &[&str]) -> Vec<String> {
	items.iter().map(|&item| item.to_owned()).collect()
}
