/* src/signal/cell.rs */

use std::cell::Cell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use arc_swap::ArcSwap;

use super::Readable;
use super::node::{Dependent, Dependents, NodeId, Source, next_node_id};
use super::subscription::{Subscribers, Subscription};
use super::tracking;

pub(crate) struct SignalInner<T> {
	id: NodeId,
	value: ArcSwap<T>,
	version: AtomicU64,
	dependents: Dependents,
	subscribers: Arc<Subscribers<T>>,
}

impl<T> Source for SignalInner<T>
where
	T: Send + Sync + 'static,
{
	fn node_id(&self) -> NodeId {
		self.id
	}

	fn add_dependent(&self, id: NodeId, dependent: Weak<dyn Dependent>) {
		self.dependents.add(id, dependent);
	}

	fn remove_dependent(&self, id: NodeId) {
		self.dependents.remove(id);
	}
}

/// A mutable reactive cell.
///
/// Reads inside a [`Derived`](super::Derived) computation register the cell
/// as a dependency. Writes notify direct subscribers synchronously, in
/// subscription order, and mark dependent derivations stale. Clones share the
/// same cell.
pub struct Signal<T> {
	inner: Arc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<T> Signal<T>
where
	T: Send + Sync + 'static,
{
	pub fn new(value: T) -> Self {
		Self {
			inner: Arc::new(SignalInner {
				id: next_node_id(),
				value: ArcSwap::from_pointee(value),
				version: AtomicU64::new(0),
				dependents: Dependents::default(),
				subscribers: Subscribers::new(),
			}),
		}
	}

	/// Current value. Tracked when called inside a derivation.
	pub fn get(&self) -> Arc<T> {
		self.track();
		self.inner.value.load_full()
	}

	/// Current value, never recorded as a dependency.
	pub fn get_untracked(&self) -> Arc<T> {
		self.inner.value.load_full()
	}

	/// Borrows the current value without cloning the `Arc`. Tracked.
	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		self.track();
		f(&self.inner.value.load())
	}

	/// Replaces the value and notifies.
	pub fn set(&self, value: T) {
		self.inner.value.store(Arc::new(value));
		self.changed();
	}

	/// Replaces the value with `f(current)` and notifies.
	///
	/// `f` may run more than once when other threads write concurrently.
	pub fn update(&self, mut f: impl FnMut(&T) -> T) {
		self.inner.value.rcu(|current| f(current.as_ref()));
		self.changed();
	}

	/// Like [`update`](Self::update), but `f` may decline the write by
	/// returning `None`. Returns whether a new value was published.
	pub fn try_update(&self, mut f: impl FnMut(&T) -> Option<T>) -> bool {
		let published = Cell::new(false);
		self.inner.value.rcu(|current| match f(current.as_ref()) {
			Some(next) => {
				published.set(true);
				Arc::new(next)
			}
			None => {
				published.set(false);
				Arc::clone(current)
			}
		});
		if published.get() {
			self.changed();
		}
		published.get()
	}

	/// Registers `f` to run after every write. Not called with the current value.
	pub fn subscribe(&self, f: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
		self.inner.subscribers.insert(Arc::new(f))
	}

	/// Number of writes since creation.
	pub fn version(&self) -> u64 {
		self.inner.version.load(Ordering::SeqCst)
	}

	pub fn subscriber_count(&self) -> usize {
		self.inner.subscribers.len()
	}

	/// A handle that can read and subscribe but not write.
	pub fn read_only(&self) -> ReadSignal<T> {
		ReadSignal {
			signal: self.clone(),
		}
	}

	fn track(&self) {
		let inner = &self.inner;
		tracking::record(inner.id, || Arc::clone(inner) as Arc<dyn Source>);
	}

	fn changed(&self) {
		self.inner.version.fetch_add(1, Ordering::SeqCst);
		self.inner.dependents.invalidate_all();

		let value = self.inner.value.load_full();
		self.inner.subscribers.notify(&value, self.inner.id);

		tracking::flush();
	}

	#[cfg(test)]
	pub(crate) fn dependent_count(&self) -> usize {
		self.inner.dependents.len()
	}
}

impl<T> Default for Signal<T>
where
	T: Default + Send + Sync + 'static,
{
	fn default() -> Self {
		Self::new(T::default())
	}
}

impl<T> fmt::Debug for Signal<T>
where
	T: fmt::Debug,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Signal")
			.field("id", &self.inner.id)
			.field("value", &*self.inner.value.load_full())
			.field("version", &self.inner.version.load(Ordering::SeqCst))
			.finish()
	}
}

impl<T> Readable<T> for Signal<T>
where
	T: Send + Sync + 'static,
{
	fn get(&self) -> Arc<T> {
		Signal::get(self)
	}

	fn get_untracked(&self) -> Arc<T> {
		Signal::get_untracked(self)
	}

	fn subscribe<F>(&self, f: F) -> Subscription
	where
		F: Fn(&T) + Send + Sync + 'static,
	{
		Signal::subscribe(self, f)
	}
}

/// Read-only view of a [`Signal`].
pub struct ReadSignal<T> {
	signal: Signal<T>,
}

impl<T> Clone for ReadSignal<T> {
	fn clone(&self) -> Self {
		Self {
			signal: self.signal.clone(),
		}
	}
}

impl<T> ReadSignal<T>
where
	T: Send + Sync + 'static,
{
	pub fn get(&self) -> Arc<T> {
		self.signal.get()
	}

	pub fn get_untracked(&self) -> Arc<T> {
		self.signal.get_untracked()
	}

	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		self.signal.with(f)
	}

	pub fn subscribe(&self, f: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
		self.signal.subscribe(f)
	}

	pub fn version(&self) -> u64 {
		self.signal.version()
	}
}

impl<T> fmt::Debug for ReadSignal<T>
where
	T: fmt::Debug,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ReadSignal").field(&self.signal).finish()
	}
}

impl<T> Readable<T> for ReadSignal<T>
where
	T: Send + Sync + 'static,
{
	fn get(&self) -> Arc<T> {
		ReadSignal::get(self)
	}

	fn get_untracked(&self) -> Arc<T> {
		ReadSignal::get_untracked(self)
	}

	fn subscribe<F>(&self, f: F) -> Subscription
	where
		F: Fn(&T) + Send + Sync + 'static,
	{
		ReadSignal::subscribe(self, f)
	}
}
