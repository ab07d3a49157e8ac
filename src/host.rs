//! The DOM primitives a [`ForNode`](`crate::ForNode`) needs from its environment.
//!
//! Implementations log failures instead of reporting them; a failed DOM operation leaves the
//! document as it was and reconciliation carries on.

use core::fmt::Debug;

pub trait Host: Clone + 'static {
	type Node: Clone + PartialEq + Debug + 'static;

	/// Creates the detached, invisible anchor a repeated region inserts its items before.
	fn create_stump(&self, id: &str) -> Self::Node;

	/// Inserts (or moves) `node` into `parent` before `reference`, or at the end.
	fn insert_before(&self, node: &Self::Node, parent: &Self::Node, reference: Option<&Self::Node>);

	/// Detaches `node` from its parent, if it has one.
	fn remove(&self, node: &Self::Node);

	fn parent_node(&self, node: &Self::Node) -> Option<Self::Node>;

	fn first_child(&self, node: &Self::Node) -> Option<Self::Node>;

	fn last_child(&self, node: &Self::Node) -> Option<Self::Node>;

	/// Swaps `node` for an empty shallow clone of itself and returns the clone.
	///
	/// This discards `node`'s whole subtree in one step.
	fn replace_with_empty_clone(&self, node: &Self::Node) -> Self::Node;
}
