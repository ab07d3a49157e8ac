//! Decides how a mutation relates to a list binding.

use crate::{
	data::DataScope,
	path::{Path, PathRelation, Segment},
};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
	/// The mutation doesn't touch the collection.
	Unrelated,
	/// The collection itself was replaced or spliced (`is_ancestor == false`),
	/// or something containing it was (`is_ancestor == true`).
	BindingOrAncestor { is_ancestor: bool },
	/// The mutation targets the item at `index` or something inside it.
	ItemDescendant { index: usize },
}

/// Classifies a (resolved) mutation path against the binding path.
///
/// Dynamic lookups in `binding` are evaluated in `scope`. A binding whose lookup depends on
/// the mutated data is treated as replaced as a whole.
#[must_use]
pub fn classify(change_path: &Path, binding: &Path, scope: &dyn DataScope) -> Relation {
	if depends_on_lookup(change_path, binding, scope) {
		return Relation::BindingOrAncestor { is_ancestor: true };
	}

	let binding = binding.resolve(scope);
	match change_path.compare(&binding) {
		PathRelation::Unrelated => Relation::Unrelated,
		PathRelation::Equal => Relation::BindingOrAncestor { is_ancestor: false },
		PathRelation::Ancestor(_) => Relation::BindingOrAncestor { is_ancestor: true },
		PathRelation::Descendant(_) => match item_index(&change_path.segments()[binding.len()], scope) {
			Some(index) => Relation::ItemDescendant { index },
			None => {
				trace!(%change_path, "Item segment is not an index. Treating the change as unrelated.");
				Relation::Unrelated
			}
		},
	}
}

fn depends_on_lookup(change_path: &Path, binding: &Path, scope: &dyn DataScope) -> bool {
	binding.segments().iter().any(|segment| match segment {
		Segment::Lookup(lookup) => classify(change_path, lookup, scope) != Relation::Unrelated,
		_ => false,
	})
}

fn item_index(segment: &Segment, scope: &dyn DataScope) -> Option<usize> {
	match segment {
		Segment::Lookup(lookup) => scope.get(lookup).as_index(),
		segment => segment.as_index(),
	}
}
