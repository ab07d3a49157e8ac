//! The child-view lifecycle as seen by a repeated region.

use crate::{change::DataChange, dispose::DisposeTicket, host::Host, item_scope::ItemScope};
use std::rc::Rc;

/// One materialized item of a repeated region.
pub trait ChildView<H: Host> {
	/// The item scope this view was created with. Never shared with another view.
	fn scope(&self) -> &Rc<ItemScope>;

	/// The first DOM node this view rendered, used as insertion reference for preceding items.
	fn first_node(&self) -> Option<H::Node>;

	/// Inserts this view's nodes into `parent` before `before`.
	///
	/// Attaching an already attached view moves its nodes.
	fn attach(&mut self, parent: &H::Node, before: Option<&H::Node>);

	/// Applies the changes collected for this item during one reconciliation pass.
	fn update(&mut self, changes: &[DataChange]);

	/// Tears the view down.
	///
	/// With `no_detach`, the DOM nodes may be left in place because their container is about
	/// to be discarded as a whole. `ticket` completes when it's finished or dropped, whichever
	/// comes first, so exit animations can hold on to it.
	#[allow(clippy::fn_params_excessive_bools)]
	fn dispose(self: Box<Self>, no_detach: bool, no_unbind: bool, ticket: DisposeTicket);
}

/// The compiled child template of a repeated region.
pub trait Template<H: Host> {
	fn create(&self, scope: Rc<ItemScope>) -> Box<dyn ChildView<H>>;
}

/// An entry of a repeated region's child list. `None` is a placeholder awaiting creation.
pub type Slot<H> = Option<Box<dyn ChildView<H>>>;
