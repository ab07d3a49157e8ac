//! Batched slot disposal with exactly-once completion.

use crate::{host::Host, view::Slot};
use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
};
use std::rc::Rc;
use tracing::{trace, trace_span};

struct Countdown {
	remaining: Cell<usize>,
	on_complete: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Countdown {
	fn tick(&self) {
		let remaining = self.remaining.get() - 1;
		self.remaining.set(remaining);
		if remaining == 0 {
			let on_complete = self.on_complete.borrow_mut().take();
			if let Some(on_complete) = on_complete {
				on_complete()
			}
		}
	}
}

/// Confirms that one disposed slot is gone.
///
/// Completes exactly once: on [`finish`](`DisposeTicket::finish`) or on drop.
#[must_use = "Dropping a `DisposeTicket` completes it immediately."]
pub struct DisposeTicket {
	countdown: Option<Rc<Countdown>>,
}

impl DisposeTicket {
	/// A ticket that nobody waits for.
	pub fn detached() -> Self {
		Self { countdown: None }
	}

	pub fn finish(mut self) {
		self.complete()
	}

	fn complete(&mut self) {
		if let Some(countdown) = self.countdown.take() {
			countdown.tick()
		}
	}
}

impl Drop for DisposeTicket {
	fn drop(&mut self) {
		self.complete()
	}
}

impl Debug for DisposeTicket {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("DisposeTicket").field("pending", &self.countdown.is_some()).finish()
	}
}

/// Issues `count` tickets and runs `on_complete` once all of them have completed.
///
/// With `count == 0`, `on_complete` runs immediately.
pub fn issue_tickets(count: usize, on_complete: impl FnOnce() + 'static) -> Vec<DisposeTicket> {
	if count == 0 {
		on_complete();
		return Vec::new();
	}

	let countdown = Rc::new(Countdown {
		remaining: Cell::new(count),
		on_complete: RefCell::new(Some(Box::new(on_complete))),
	});
	(0..count)
		.map(|_| DisposeTicket {
			countdown: Some(Rc::clone(&countdown)),
		})
		.collect()
}

/// Disposes each slot independently and runs `on_complete` after the last one confirms.
///
/// Placeholders confirm immediately. The order in which siblings finish is unspecified.
#[allow(clippy::fn_params_excessive_bools)]
pub fn dispose_slots<H: Host>(slots: Vec<Slot<H>>, no_detach: bool, no_unbind: bool, on_complete: impl FnOnce() + 'static) {
	let span = trace_span!("Disposing slots", count = slots.len(), no_detach, no_unbind);
	let _enter = span.enter();

	let tickets = issue_tickets(slots.len(), on_complete);
	for (slot, ticket) in slots.into_iter().zip(tickets) {
		match slot {
			Some(child) => child.dispose(no_detach, no_unbind, ticket),
			None => ticket.finish(),
		}
	}
}

/// Whether the whole container of a repeated region can be wiped instead of disposing its
/// items one by one.
///
/// This is the case only without transitions, when every slot goes, and when the region's
/// items followed by its anchor are exactly the container's content.
pub fn can_clear_violently<H: Host>(host: &H, transition: bool, slots: &[Slot<H>], anchor: &H::Node, container: &H::Node) -> bool {
	if transition {
		return false;
	}
	let first_node = match slots.first() {
		Some(Some(child)) => child.first_node(),
		_ => return false,
	};
	let violent = first_node.is_some() && host.first_child(container) == first_node && host.last_child(container).as_ref() == Some(anchor);
	trace!(violent, "Checked for sole ownership of the container.");
	violent
}
