#![cfg(target_arch = "wasm32")]

use repeat_dom::{
	data::DataScope, web::WebHost, ChangeOption, ChildView, Data, DataChange, DisposeTicket, ForDirective, ForNode, ItemScope, Path, Template, Value,
};
use std::rc::Rc;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::window;

wasm_bindgen_test_configure!(run_in_browser);

static mut LOG_INITIALIZED: bool = false;

struct SpanTemplate(WebHost);

impl Template<WebHost> for SpanTemplate {
	fn create(&self, scope: Rc<ItemScope>) -> Box<dyn ChildView<WebHost>> {
		let span: web_sys::Node = self.0.document().create_element("span").unwrap().into();
		span.set_text_content(Some(&scope.item().to_string()));
		Box::new(SpanView { scope, span })
	}
}

struct SpanView {
	scope: Rc<ItemScope>,
	span: web_sys::Node,
}

impl ChildView<WebHost> for SpanView {
	fn scope(&self) -> &Rc<ItemScope> {
		&self.scope
	}

	fn first_node(&self) -> Option<web_sys::Node> {
		Some(self.span.clone())
	}

	fn attach(&mut self, parent: &web_sys::Node, before: Option<&web_sys::Node>) {
		parent.insert_before(&self.span, before).unwrap();
	}

	fn update(&mut self, _changes: &[DataChange]) {
		self.span.set_text_content(Some(&self.scope.item().to_string()));
	}

	fn dispose(self: Box<Self>, no_detach: bool, _no_unbind: bool, ticket: DisposeTicket) {
		if !no_detach {
			if let Some(parent) = self.span.parent_node() {
				parent.remove_child(&self.span).unwrap();
			}
		}
		ticket.finish();
	}
}

fn mount(directive: ForDirective, data: &Rc<Data>) -> (web_sys::Node, ForNode<WebHost>) {
	unsafe {
		if !LOG_INITIALIZED {
			tracing_wasm::set_as_global_default();
			LOG_INITIALIZED = true;
		}
	}
	repeat_dom::data_cache::init();

	let document = window().unwrap().document().unwrap();
	let body: web_sys::Node = document.body().unwrap().into();
	let container: web_sys::Node = document.create_element("div").unwrap().into();
	body.append_child(&container).unwrap();

	let host = WebHost::new(document);
	let node = ForNode::new(directive, Rc::clone(data) as Rc<dyn DataScope>, host.clone(), Rc::new(SpanTemplate(host)));
	node.attach(&container, None);
	(container, node)
}

fn words(items: &[&str]) -> Value {
	Value::list(items.iter().map(|&item| Value::from(item)))
}

#[wasm_bindgen_test]
fn renders_and_splices() {
	let data = Rc::new(Data::new(Value::map(vec![("list", words(&["a", "b", "c"]))])));
	let (container, node) = mount(ForDirective::new("item", Path::parse("list").unwrap()), &data);
	assert_eq!(container.text_content().unwrap(), "abc");
	assert_eq!(container.last_child().unwrap().node_type(), web_sys::Node::COMMENT_NODE);

	data.splice(&Path::parse("list").unwrap(), 1, 1, vec!["x".into(), "y".into()], ChangeOption::default());
	node.update(&data.take_changes());
	assert_eq!(container.text_content().unwrap(), "axyc");
	assert_eq!(node.len(), 4);
}

#[wasm_bindgen_test]
fn keyed_reorder_moves_nodes() {
	let data = Rc::new(Data::new(Value::map(vec![("list", words(&["a", "b", "c"]))])));
	let directive = ForDirective::new("item", Path::parse("list").unwrap()).with_track_by(Value::clone);
	let (container, node) = mount(directive, &data);
	let first = container.first_child().unwrap();

	data.set(&Path::parse("list").unwrap(), words(&["c", "b", "a"]), ChangeOption::default());
	node.update(&data.take_changes());
	assert_eq!(container.text_content().unwrap(), "cba");
	assert!(container.child_nodes().item(2).unwrap().is_same_node(Some(&first)));
}

#[wasm_bindgen_test]
fn emptying_clears_the_container() {
	let data = Rc::new(Data::new(Value::map(vec![("list", words(&["a", "b"]))])));
	let (container, node) = mount(ForDirective::new("item", Path::parse("list").unwrap()), &data);

	data.set(&Path::parse("list").unwrap(), Value::list(Vec::new()), ChangeOption::default());
	node.update(&data.take_changes());

	let anchor = node.anchor().unwrap();
	let current = anchor.parent_node().unwrap();
	assert_eq!(current.text_content().unwrap(), "");
	assert_eq!(current.child_nodes().length(), 1);
	assert!(node.is_empty());
	drop(container);
}
