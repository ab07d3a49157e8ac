//! Process-wide memo table for evaluated expressions, keyed by scope and raw expression text.
//!
//! Invalidation is batched: storing an entry marks the table dirty, and only the next
//! [`clear`] after that actually wipes it. Clearing a clean table is free.

use crate::{data::ScopeId, value::Value};
use core::cell::RefCell;
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::trace;

thread_local! {
	static DATA_CACHE: RefCell<DataCache> = RefCell::new(DataCache::new());
}

/// The table behind the module-level functions, usable on its own.
#[derive(Debug)]
pub struct DataCache {
	entries: HashMap<ScopeId, HashMap<Rc<str>, Value>>,
	clean: bool,
}

impl Default for DataCache {
	fn default() -> Self {
		Self::new()
	}
}

impl DataCache {
	#[must_use]
	pub fn new() -> Self {
		Self {
			entries: HashMap::new(),
			clean: true,
		}
	}

	pub fn clear(&mut self) {
		if !self.clean {
			trace!(scopes = self.entries.len(), "Wiping data cache.");
			self.clean = true;
			self.entries.clear();
		}
	}

	/// Does nothing without `raw` text.
	pub fn set(&mut self, scope: ScopeId, raw: Option<&str>, value: Value) {
		if let Some(raw) = raw {
			self.clean = false;
			self.entries.entry(scope).or_default().insert(raw.into(), value);
		}
	}

	#[must_use]
	pub fn get(&self, scope: ScopeId, raw: Option<&str>) -> Option<Value> {
		self.entries.get(&scope)?.get(raw?).cloned()
	}

	/// `true` iff nothing was stored since the last wipe.
	#[must_use]
	pub fn is_clean(&self) -> bool {
		self.clean
	}
}

/// Resets this thread's cache.
pub fn init() {
	DATA_CACHE.with(|cache| *cache.borrow_mut() = DataCache::new())
}

pub fn clear() {
	DATA_CACHE.with(|cache| cache.borrow_mut().clear())
}

pub fn set(scope: ScopeId, raw: Option<&str>, value: Value) {
	DATA_CACHE.with(|cache| cache.borrow_mut().set(scope, raw, value))
}

#[must_use]
pub fn get(scope: ScopeId, raw: Option<&str>) -> Option<Value> {
	DATA_CACHE.with(|cache| cache.borrow().get(scope, raw))
}

#[must_use]
pub fn is_clean() -> bool {
	DATA_CACHE.with(|cache| cache.borrow().is_clean())
}

/// Returns the cached value or evaluates and stores it.
///
/// `evaluate` runs without the cache borrowed, so it may read the cache itself.
pub fn get_or_insert_with(scope: ScopeId, raw: Option<&str>, evaluate: impl FnOnce() -> Value) -> Value {
	if let Some(cached) = get(scope, raw) {
		return cached;
	}
	let value = evaluate();
	set(scope, raw, value.clone());
	value
}
