#![doc(html_root_url = "https://docs.rs/repeat-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Incremental reconciliation for repeated (`for`) regions of a DOM view.
//!
//! A [`ForNode`] binds a collection in a [`DataScope`] to a [`Template`]. Each batch of
//! [`DataChange`]s drained from the data store is classified against the bound collection,
//! and only the affected children are created, updated, moved or disposed.

pub mod change;
pub mod classify;
pub mod data;
pub mod data_cache;
pub mod diff;
pub mod directive;
pub mod dispose;
pub mod for_node;
pub mod host;
pub mod item_scope;
pub mod path;
pub mod value;
pub mod view;
pub mod web;

pub use change::{ChangeKind, ChangeOption, DataChange};
pub use data::{Data, DataScope};
pub use directive::{DataRefs, ForConfig, ForDirective};
pub use dispose::DisposeTicket;
pub use for_node::ForNode;
pub use host::Host;
pub use item_scope::{ItemKey, ItemScope};
pub use path::{Path, PathError, Segment};
pub use value::Value;
pub use view::{ChildView, Slot, Template};
