/* src/signal/subscription.rs */

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::node::NodeId;
use super::{SignalError, panic_message, report};

pub(crate) type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Something a [`Subscription`] can detach itself from.
pub(crate) trait Detach: Send + Sync {
	fn detach(&self, id: u64);
}

/// Ordered subscriber list shared by every signal kind.
pub(crate) struct Subscribers<T> {
	next_id: AtomicU64,
	callbacks: Mutex<Vec<(u64, Callback<T>)>>,
}

impl<T> Subscribers<T>
where
	T: Send + Sync + 'static,
{
	pub(crate) fn new() -> Arc<Self> {
		Arc::new(Self {
			next_id: AtomicU64::new(1),
			callbacks: Mutex::new(Vec::new()),
		})
	}

	pub(crate) fn insert(self: &Arc<Self>, callback: Callback<T>) -> Subscription {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		self.callbacks.lock().push((id, callback));

		let target: Weak<dyn Detach> = Arc::downgrade(self) as Weak<dyn Detach>;
		Subscription {
			target: Some(target),
			id,
			active: AtomicBool::new(true),
		}
	}

	pub(crate) fn is_empty(&self) -> bool {
		self.callbacks.lock().is_empty()
	}

	pub(crate) fn len(&self) -> usize {
		self.callbacks.lock().len()
	}

	/// Runs every callback registered when the call starts, in registration order.
	///
	/// A panicking callback is reported and skipped; the rest still run.
	pub(crate) fn notify(&self, value: &T, origin: NodeId) {
		let snapshot: Vec<(u64, Callback<T>)> = self
			.callbacks
			.lock()
			.iter()
			.map(|(id, callback)| (*id, Arc::clone(callback)))
			.collect();

		for (id, callback) in snapshot {
			if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback(value))) {
				report(SignalError::SubscriberPanicked {
					node: origin,
					subscriber: id,
					message: panic_message(payload.as_ref()),
				});
			}
		}
	}
}

impl<T> Detach for Subscribers<T>
where
	T: Send + Sync + 'static,
{
	fn detach(&self, id: u64) {
		self.callbacks.lock().retain(|(existing, _)| *existing != id);
	}
}

/// Handle to a registered subscriber callback.
///
/// Dropping the handle unsubscribes. [`unsubscribe`](Subscription::unsubscribe)
/// may be called any number of times; only the first call has an effect.
/// [`detach`](Subscription::detach) keeps the callback registered for as long
/// as the signal lives.
#[must_use = "dropping a Subscription unsubscribes it; call `detach` to keep it"]
pub struct Subscription {
	target: Option<Weak<dyn Detach>>,
	id: u64,
	active: AtomicBool,
}

impl Subscription {
	/// Removes the callback. Repeated calls are no-ops.
	pub fn unsubscribe(&self) {
		if !self.active.swap(false, Ordering::SeqCst) {
			return;
		}
		if let Some(target) = self.target.as_ref().and_then(Weak::upgrade) {
			target.detach(self.id);
		}
	}

	/// Returns true while the callback is still registered on a live signal.
	pub fn is_active(&self) -> bool {
		self.active.load(Ordering::SeqCst)
			&& self
				.target
				.as_ref()
				.is_some_and(|target| target.strong_count() > 0)
	}

	/// Gives up the handle without unsubscribing.
	pub fn detach(mut self) {
		self.target = None;
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		self.unsubscribe();
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("id", &self.id)
			.field("active", &self.is_active())
			.finish()
	}
}
