/* src/signal/derived.rs */

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::Readable;
use super::node::{Dependent, Dependents, NodeId, Source, next_node_id};
use super::subscription::{Subscribers, Subscription};
use super::tracking;

/// When a [`Derived`] recomputes after one of its dependencies changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeriveMode {
	/// Recompute on the next read, or right away while it has subscribers.
	#[default]
	Lazy,
	/// Recompute as soon as a dependency changes, even with no readers.
	Eager,
}

struct DerivedState<T> {
	cached: Option<Arc<T>>,
	dirty: bool,
	/// Bumped by every invalidation, so a recompute racing a write stays dirty.
	epoch: u64,
	/// Bumped each time a recompute produces a value unequal to the previous one.
	changes: u64,
	/// The `changes` count last delivered to subscribers.
	notified: u64,
	computations: u64,
	/// Recomputes currently running, on any thread.
	computing: usize,
	sources: Vec<Arc<dyn Source>>,
}

/// Counts a running recompute, also on unwind.
struct Computing<'a, T>(&'a Mutex<DerivedState<T>>);

impl<'a, T> Computing<'a, T> {
	fn start(state: &'a Mutex<DerivedState<T>>) -> (Self, u64) {
		let mut guard = state.lock();
		guard.computing += 1;
		let epoch = guard.epoch;
		drop(guard);
		(Computing(state), epoch)
	}
}

impl<T> Drop for Computing<'_, T> {
	fn drop(&mut self) {
		let mut state = self.0.lock();
		state.computing = state.computing.saturating_sub(1);
	}
}

struct DerivedInner<T> {
	id: NodeId,
	me: Weak<DerivedInner<T>>,
	mode: DeriveMode,
	compute: Box<dyn Fn() -> T + Send + Sync>,
	state: Mutex<DerivedState<T>>,
	dependents: Dependents,
	subscribers: Arc<Subscribers<T>>,
}

impl<T> DerivedInner<T>
where
	T: PartialEq + Send + Sync + 'static,
{
	fn current(&self) -> Arc<T> {
		{
			let state = self.state.lock();
			if !state.dirty
				&& let Some(cached) = &state.cached
			{
				return Arc::clone(cached);
			}
		}
		self.recompute()
	}

	fn recompute(&self) -> Arc<T> {
		let (running, epoch) = Computing::start(&self.state);

		// A panic here leaves the node dirty, so the next read retries.
		let (value, sources) = tracking::tracked(|| (self.compute)());
		drop(running);

		let (snapshot, stale) = {
			let mut state = self.state.lock();
			state.computations += 1;
			state.dirty = state.epoch != epoch;

			let snapshot = match &state.cached {
				Some(previous) if **previous == value => Arc::clone(previous),
				_ => {
					let next = Arc::new(value);
					state.cached = Some(Arc::clone(&next));
					state.changes += 1;
					next
				}
			};

			let stale = std::mem::replace(&mut state.sources, sources.clone());
			(snapshot, stale)
		};

		self.rewire(&stale, &sources);
		snapshot
	}

	/// Moves this node's edges from `stale` to `fresh` dependencies.
	fn rewire(&self, stale: &[Arc<dyn Source>], fresh: &[Arc<dyn Source>]) {
		for source in stale {
			let id = source.node_id();
			if !fresh.iter().any(|kept| kept.node_id() == id) {
				source.remove_dependent(self.id);
			}
		}
		let me: Weak<dyn Dependent> = self.me.clone() as Weak<dyn Dependent>;
		for source in fresh {
			source.add_dependent(self.id, me.clone());
		}
	}
}

impl<T> Source for DerivedInner<T>
where
	T: PartialEq + Send + Sync + 'static,
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

impl<T> Dependent for DerivedInner<T>
where
	T: PartialEq + Send + Sync + 'static,
{
	fn node_id(&self) -> NodeId {
		self.id
	}

	fn invalidate(&self) {
		let propagate = {
			let mut state = self.state.lock();
			state.epoch += 1;
			// A recompute in flight may already have read the old value, so
			// the write still has to reach subscribers and dependents.
			!std::mem::replace(&mut state.dirty, true) || state.computing > 0
		};
		if !propagate {
			return;
		}

		// Queued before dependents so refreshes run upstream first.
		if (self.mode == DeriveMode::Eager || !self.subscribers.is_empty())
			&& let Some(me) = self.me.upgrade()
		{
			tracking::enqueue(me);
		}

		self.dependents.invalidate_all();
	}

	fn refresh(&self) {
		let value = self.current();
		let (deliver, stale) = {
			let mut state = self.state.lock();
			let pending = state.notified != state.changes;
			state.notified = state.changes;
			(pending, state.dirty)
		};
		if deliver {
			self.subscribers.notify(&value, self.id);
		}
		// Written again while computing: refresh once more in this flush.
		if stale && let Some(me) = self.me.upgrade() {
			tracking::enqueue(me);
		}
	}
}

impl<T> Drop for DerivedInner<T> {
	fn drop(&mut self) {
		let sources = std::mem::take(&mut self.state.get_mut().sources);
		for source in sources {
			source.remove_dependent(self.id);
		}
	}
}

/// A memoized value computed from other signals.
///
/// Dependencies are whatever signals the computation reads, collected afresh
/// on every run, so a computation that switches branches stops depending on
/// the branch it no longer reads. A recompute producing a value equal to the
/// cached one notifies nobody downstream.
pub struct Derived<T> {
	inner: Arc<DerivedInner<T>>,
}

impl<T> Clone for Derived<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<T> Derived<T>
where
	T: PartialEq + Send + Sync + 'static,
{
	/// Creates a lazily refreshed derivation and computes its first value.
	pub fn new(compute: impl Fn() -> T + Send + Sync + 'static) -> Self {
		Self::with_mode(DeriveMode::Lazy, compute)
	}

	/// Creates a derivation that recomputes as soon as a dependency changes.
	pub fn eager(compute: impl Fn() -> T + Send + Sync + 'static) -> Self {
		Self::with_mode(DeriveMode::Eager, compute)
	}

	pub fn with_mode(mode: DeriveMode, compute: impl Fn() -> T + Send + Sync + 'static) -> Self {
		let inner = Arc::new_cyclic(|me| DerivedInner {
			id: next_node_id(),
			me: me.clone(),
			mode,
			compute: Box::new(compute),
			state: Mutex::new(DerivedState {
				cached: None,
				dirty: true,
				epoch: 0,
				changes: 0,
				notified: 0,
				computations: 0,
				computing: 0,
				sources: Vec::new(),
			}),
			dependents: Dependents::default(),
			subscribers: Subscribers::new(),
		});

		// The first value is computed outside any enclosing frame.
		tracking::untracked(|| inner.recompute());
		{
			let mut state = inner.state.lock();
			state.notified = state.changes;
		}
		Self { inner }
	}

	/// Current value, recomputed first if stale. Tracked.
	pub fn get(&self) -> Arc<T> {
		self.track();
		self.inner.current()
	}

	pub fn get_untracked(&self) -> Arc<T> {
		self.inner.current()
	}

	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		f(&self.get())
	}

	/// Registers `f` to run whenever the derived value changes.
	pub fn subscribe(&self, f: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
		self.inner.current();
		{
			let mut state = self.inner.state.lock();
			state.notified = state.changes;
		}
		self.inner.subscribers.insert(Arc::new(f))
	}

	pub fn mode(&self) -> DeriveMode {
		self.inner.mode
	}

	/// Returns true if a dependency changed since the last computation.
	pub fn is_stale(&self) -> bool {
		self.inner.state.lock().dirty
	}

	/// How many times the computation has run.
	pub fn computations(&self) -> u64 {
		self.inner.state.lock().computations
	}

	pub fn subscriber_count(&self) -> usize {
		self.inner.subscribers.len()
	}

	/// Returns true if both handles refer to the same derivation.
	pub fn ptr_eq(&self, other: &Derived<T>) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}

	/// Returns true if anything besides this handle keeps the node alive,
	/// such as another handle or a derivation reading it.
	pub(crate) fn is_shared(&self) -> bool {
		Arc::strong_count(&self.inner) > 1
	}

	fn track(&self) {
		let inner = &self.inner;
		tracking::record(inner.id, || Arc::clone(inner) as Arc<dyn Source>);
	}
}

impl<T> fmt::Debug for Derived<T>
where
	T: fmt::Debug,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.inner.state.lock();
		f.debug_struct("Derived")
			.field("id", &self.inner.id)
			.field("mode", &self.inner.mode)
			.field("cached", &state.cached)
			.field("dirty", &state.dirty)
			.finish()
	}
}

impl<T> Readable<T> for Derived<T>
where
	T: PartialEq + Send + Sync + 'static,
{
	fn get(&self) -> Arc<T> {
		Derived::get(self)
	}

	fn get_untracked(&self) -> Arc<T> {
		Derived::get_untracked(self)
	}

	fn subscribe<F>(&self, f: F) -> Subscription
	where
		F: Fn(&T) + Send + Sync + 'static,
	{
		Derived::subscribe(self, f)
	}
}
