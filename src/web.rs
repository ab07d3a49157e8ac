//! [`Host`] over the browser DOM.

use crate::host::Host;
use tracing::{error, instrument};
use wasm_bindgen::JsValue;

fn report(action: &str, error: &JsValue) {
	error!("Failed to {}: {:?}", action, error)
}

/// Renders into a [`web_sys::Document`].
///
/// Stumps are empty [***Comment***](https://developer.mozilla.org/en-US/docs/Web/API/Comment)s
/// carrying the region's id, so they don't affect layout.
#[derive(Debug, Clone)]
pub struct WebHost {
	document: web_sys::Document,
}

impl WebHost {
	#[must_use]
	pub fn new(document: web_sys::Document) -> Self {
		Self { document }
	}

	#[must_use]
	pub fn document(&self) -> &web_sys::Document {
		&self.document
	}
}

impl Host for WebHost {
	type Node = web_sys::Node;

	fn create_stump(&self, id: &str) -> web_sys::Node {
		self.document.create_comment(id).into()
	}

	#[instrument(skip_all)]
	fn insert_before(&self, node: &web_sys::Node, parent: &web_sys::Node, reference: Option<&web_sys::Node>) {
		if let Err(error) = parent.insert_before(node, reference) {
			report("insert node", &error)
		}
	}

	#[instrument(skip_all)]
	fn remove(&self, node: &web_sys::Node) {
		match node.parent_node() {
			Some(parent) => {
				if let Err(error) = parent.remove_child(node) {
					report("remove the node", &error)
				}
			}
			None => error!("Could not find parent node of node to remove. Ignoring."),
		}
	}

	fn parent_node(&self, node: &web_sys::Node) -> Option<web_sys::Node> {
		node.parent_node()
	}

	fn first_child(&self, node: &web_sys::Node) -> Option<web_sys::Node> {
		node.first_child()
	}

	fn last_child(&self, node: &web_sys::Node) -> Option<web_sys::Node> {
		node.last_child()
	}

	/// Shallow `cloneNode` plus `replaceChild`.
	#[instrument(skip_all)]
	fn replace_with_empty_clone(&self, node: &web_sys::Node) -> web_sys::Node {
		let replacement = match node.clone_node() {
			Ok(replacement) => replacement,
			Err(error) => {
				report("clone the container", &error);
				return node.clone();
			}
		};

		match node.parent_node() {
			Some(parent) => match parent.replace_child(&replacement, node) {
				Ok(_) => replacement,
				Err(error) => {
					report("replace the container", &error);
					node.clone()
				}
			},
			None => {
				error!("Container has no parent node. Keeping it.");
				node.clone()
			}
		}
	}
}
