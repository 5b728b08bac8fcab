/* src/signal/tracking.rs */

//! Per-thread bookkeeping for the signal graph.
//!
//! Two pieces of state live here: the stack of frames recording which sources
//! the running computation reads, and the queue of derivations waiting to be
//! refreshed once the current write (or [`batch`]) completes.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use super::node::{Dependent, NodeId, Source};
use super::{SignalError, panic_message, report};

struct Frame {
	sources: Vec<Arc<dyn Source>>,
}

thread_local! {
	// `None` marks an untracked region.
	static FRAMES: RefCell<Vec<Option<Frame>>> = const { RefCell::new(Vec::new()) };
	static BATCH_DEPTH: Cell<usize> = const { Cell::new(0) };
	static FLUSHING: Cell<bool> = const { Cell::new(false) };
	static PENDING: RefCell<VecDeque<Arc<dyn Dependent>>> = const { RefCell::new(VecDeque::new()) };
}

/// Records a read of `id` in the innermost tracking frame, if any.
pub(crate) fn record(id: NodeId, source: impl FnOnce() -> Arc<dyn Source>) {
	FRAMES.with(|frames| {
		let mut frames = frames.borrow_mut();
		if let Some(Some(frame)) = frames.last_mut()
			&& !frame.sources.iter().any(|known| known.node_id() == id)
		{
			frame.sources.push(source());
		}
	});
}

/// Pops the frame pushed by its constructor, also on unwind.
struct FrameGuard;

impl FrameGuard {
	fn push(frame: Option<Frame>) -> Self {
		FRAMES.with(|frames| frames.borrow_mut().push(frame));
		FrameGuard
	}

	fn finish(self) -> Option<Frame> {
		let frame = FRAMES.with(|frames| frames.borrow_mut().pop()).flatten();
		std::mem::forget(self);
		frame
	}
}

impl Drop for FrameGuard {
	fn drop(&mut self) {
		FRAMES.with(|frames| {
			frames.borrow_mut().pop();
		});
	}
}

/// Runs `f` inside a fresh frame and returns what it read.
pub(crate) fn tracked<R>(f: impl FnOnce() -> R) -> (R, Vec<Arc<dyn Source>>) {
	let guard = FrameGuard::push(Some(Frame {
		sources: Vec::new(),
	}));
	let result = f();
	let sources = guard.finish().map(|frame| frame.sources).unwrap_or_default();
	(result, sources)
}

/// Runs `f` without recording any of its reads as dependencies of the
/// enclosing computation.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
	let _guard = FrameGuard::push(None);
	f()
}

struct BatchGuard;

impl Drop for BatchGuard {
	fn drop(&mut self) {
		let depth = BATCH_DEPTH.with(|depth| {
			let next = depth.get().saturating_sub(1);
			depth.set(next);
			next
		});
		if depth == 0 && !std::thread::panicking() {
			flush();
		}
	}
}

/// Defers refreshing derived signals until `f` returns.
///
/// Direct subscribers of cells written inside `f` are still notified on each
/// write. Derived signals observe only the final state of all writes, so a
/// derivation reading two cells updated together never sees one updated and
/// the other not. Batches nest; the outermost one flushes.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
	BATCH_DEPTH.with(|depth| depth.set(depth.get() + 1));
	let _guard = BatchGuard;
	f()
}

/// Returns true while a [`batch`] is open on this thread.
pub fn in_batch() -> bool {
	BATCH_DEPTH.with(Cell::get) > 0
}

/// Queues `dependent` for refresh at the next flush. Duplicates are ignored.
pub(crate) fn enqueue(dependent: Arc<dyn Dependent>) {
	PENDING.with(|pending| {
		let mut pending = pending.borrow_mut();
		let id = dependent.node_id();
		if !pending.iter().any(|queued| queued.node_id() == id) {
			pending.push_back(dependent);
		}
	});
}

struct FlushGuard;

impl Drop for FlushGuard {
	fn drop(&mut self) {
		FLUSHING.with(|flushing| flushing.set(false));
	}
}

/// Refreshes queued derivations in the order they were invalidated.
///
/// No-op inside a batch or when a flush is already running further up the
/// stack; that flush picks up whatever gets queued meanwhile.
pub(crate) fn flush() {
	if in_batch() || FLUSHING.with(Cell::get) {
		return;
	}
	FLUSHING.with(|flushing| flushing.set(true));
	let _guard = FlushGuard;

	loop {
		let Some(next) = PENDING.with(|pending| pending.borrow_mut().pop_front()) else {
			break;
		};
		let node = next.node_id();
		if let Err(payload) = catch_unwind(AssertUnwindSafe(|| next.refresh())) {
			report(SignalError::RefreshPanicked {
				node,
				message: panic_message(payload.as_ref()),
			});
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn batch_depth_unwinds_after_nested_batches() {
		assert!(!in_batch());
		batch(|| {
			assert!(in_batch());
			batch(|| assert!(in_batch()));
			assert!(in_batch());
		});
		assert!(!in_batch());
	}

	#[test]
	fn untracked_frame_is_popped_on_panic() {
		let result = std::panic::catch_unwind(|| untracked(|| panic!("boom")));
		assert!(result.is_err());
		FRAMES.with(|frames| assert!(frames.borrow().is_empty()));
	}

	#[test]
	fn batch_depth_resets_when_body_panics() {
		let result = std::panic::catch_unwind(|| batch(|| panic!("boom")));
		assert!(result.is_err());
		assert!(!in_batch());
	}
}
