/* src/scheduler/mod.rs */

//! Keyed, trailing-edge coalescing of side effects.
//!
//! Scheduling a key opens a window of `delay`; scheduling it again before the
//! window closes replaces the pending effect instead of adding another, so a
//! burst of triggers runs the effect once, with whatever state is current
//! when it runs. Once the effect starts the key is free again, and a trigger
//! arriving meanwhile opens a fresh window. Effects already running are
//! never cancelled.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::Notify;

use crate::effects::EffectError;
use crate::signal::panic_message;

mod error;

pub use error::SchedulerError;

/// A boxed effect run.
pub type EffectFuture = BoxFuture<'static, Result<(), EffectError>>;

type ErrorHandler = Arc<dyn Fn(&str, &EffectError) + Send + Sync>;

struct Pending {
	generation: u64,
	run: Box<dyn FnOnce() -> EffectFuture + Send>,
	triggers: u32,
}

#[derive(Clone)]
struct Registration {
	delay: Duration,
	effect: Arc<dyn Fn() -> EffectFuture + Send + Sync>,
}

struct Inner {
	handle: Handle,
	pending: Mutex<HashMap<String, Pending>>,
	registry: Mutex<HashMap<String, Registration>>,
	on_error: Mutex<Option<ErrorHandler>>,
	generation: AtomicU64,
	active: AtomicUsize,
	runs: AtomicU64,
	idle: Notify,
}

impl Inner {
	fn report(&self, key: &str, error: &EffectError) {
		tracing::warn!(key, %error, "effect failed");
		let handler = self.on_error.lock().clone();
		if let Some(handler) = handler {
			handler(key, error);
		}
	}

	fn finish(&self) {
		if self.active.fetch_sub(1, Ordering::SeqCst) == 1 {
			self.idle.notify_waiters();
		}
	}
}

/// Debounces effects per key on a tokio runtime. Clones share state.
#[derive(Clone)]
pub struct Scheduler {
	inner: Arc<Inner>,
}

impl Scheduler {
	/// Creates a scheduler on the runtime the caller is running in.
	pub fn new() -> Result<Self, SchedulerError> {
		Ok(Self::with_handle(Handle::try_current()?))
	}

	pub fn with_handle(handle: Handle) -> Self {
		Self {
			inner: Arc::new(Inner {
				handle,
				pending: Mutex::new(HashMap::new()),
				registry: Mutex::new(HashMap::new()),
				on_error: Mutex::new(None),
				generation: AtomicU64::new(0),
				active: AtomicUsize::new(0),
				runs: AtomicU64::new(0),
				idle: Notify::new(),
			}),
		}
	}

	/// Installs a handler called with the key and error of every failed or
	/// panicked effect. Failures are logged regardless.
	pub fn on_error(&self, handler: impl Fn(&str, &EffectError) + Send + Sync + 'static) {
		*self.inner.on_error.lock() = Some(Arc::new(handler));
	}

	/// Runs `effect` once `delay` has passed, unless `key` is scheduled again
	/// first, in which case the newer effect replaces this one and the
	/// original deadline stands.
	///
	/// Returns `true` if this call opened a new window, `false` if it was
	/// folded into one already pending.
	pub fn schedule<F, Fut>(&self, key: impl Into<String>, delay: Duration, effect: F) -> bool
	where
		F: FnOnce() -> Fut + Send + 'static,
		Fut: Future<Output = Result<(), EffectError>> + Send + 'static,
	{
		let key = key.into();
		let run: Box<dyn FnOnce() -> EffectFuture + Send> = Box::new(move || effect().boxed());

		let generation = {
			let mut pending = self.inner.pending.lock();
			if let Some(entry) = pending.get_mut(&key) {
				entry.run = run;
				entry.triggers += 1;
				tracing::trace!(key, triggers = entry.triggers, "effect coalesced");
				return false;
			}
			let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst);
			pending.insert(
				key.clone(),
				Pending {
					generation,
					run,
					triggers: 1,
				},
			);
			generation
		};

		self.inner.active.fetch_add(1, Ordering::SeqCst);
		let inner = Arc::clone(&self.inner);
		self.inner.handle.spawn(async move {
			tokio::time::sleep(delay).await;

			let entry = {
				let mut pending = inner.pending.lock();
				match pending.get(&key) {
					Some(entry) if entry.generation == generation => pending.remove(&key),
					_ => None,
				}
			};

			if let Some(entry) = entry {
				tracing::debug!(key, triggers = entry.triggers, "running effect");
				inner.runs.fetch_add(1, Ordering::SeqCst);
				let run = entry.run;
				match AssertUnwindSafe(async move { run().await }).catch_unwind().await {
					Ok(Ok(())) => {}
					Ok(Err(error)) => inner.report(&key, &error),
					Err(payload) => {
						inner.report(&key, &EffectError::Panicked(panic_message(payload.as_ref())))
					}
				}
			}

			inner.finish();
		});
		true
	}

	/// Registers a reusable effect under `key` for [`trigger`](Self::trigger).
	/// Re-registering a key replaces the previous effect.
	pub fn register<F, Fut>(&self, key: impl Into<String>, delay: Duration, effect: F)
	where
		F: Fn() -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<(), EffectError>> + Send + 'static,
	{
		let registration = Registration {
			delay,
			effect: Arc::new(move || effect().boxed()),
		};
		self.inner.registry.lock().insert(key.into(), registration);
	}

	pub fn unregister(&self, key: &str) -> bool {
		self.inner.registry.lock().remove(key).is_some()
	}

	pub fn is_registered(&self, key: &str) -> bool {
		self.inner.registry.lock().contains_key(key)
	}

	/// Schedules the effect registered under `key` with its registered delay.
	pub fn trigger(&self, key: &str) -> Result<bool, SchedulerError> {
		let registration = self
			.inner
			.registry
			.lock()
			.get(key)
			.cloned()
			.ok_or_else(|| SchedulerError::UnknownKey(key.to_string()))?;
		let effect = registration.effect;
		Ok(self.schedule(key, registration.delay, move || effect()))
	}

	/// Drops the pending run of `key`, if any. A run already in progress continues.
	pub fn cancel(&self, key: &str) -> bool {
		self.inner.pending.lock().remove(key).is_some()
	}

	pub fn is_pending(&self, key: &str) -> bool {
		self.inner.pending.lock().contains_key(key)
	}

	pub fn pending_keys(&self) -> Vec<String> {
		self.inner.pending.lock().keys().cloned().collect()
	}

	/// Number of effect runs started so far.
	pub fn runs(&self) -> u64 {
		self.inner.runs.load(Ordering::SeqCst)
	}

	/// Waits until no window is open and no effect is running.
	pub async fn idle(&self) {
		loop {
			let notified = self.inner.idle.notified();
			tokio::pin!(notified);
			notified.as_mut().enable();
			if self.inner.active.load(Ordering::SeqCst) == 0 {
				return;
			}
			notified.await;
		}
	}
}

impl std::fmt::Debug for Scheduler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Scheduler")
			.field("pending", &self.pending_keys())
			.field("active", &self.inner.active.load(Ordering::SeqCst))
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test(start_paused = true)]
	async fn cancelled_window_does_not_run_and_key_reopens() {
		let scheduler = Scheduler::new().unwrap();
		let runs = Arc::new(AtomicUsize::new(0));

		let counter = Arc::clone(&runs);
		scheduler.schedule("k", Duration::from_millis(50), move || async move {
			counter.fetch_add(1, Ordering::SeqCst);
			Ok(())
		});
		assert!(scheduler.cancel("k"));
		assert!(!scheduler.is_pending("k"));

		let counter = Arc::clone(&runs);
		assert!(scheduler.schedule("k", Duration::from_millis(100), move || async move {
			counter.fetch_add(1, Ordering::SeqCst);
			Ok(())
		}));

		// The stale 50ms task must not run the fresh 100ms window early.
		tokio::time::sleep(Duration::from_millis(60)).await;
		assert_eq!(runs.load(Ordering::SeqCst), 0);
		assert!(scheduler.is_pending("k"));

		scheduler.idle().await;
		assert_eq!(runs.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn trigger_unknown_key_is_an_error() {
		let scheduler = Scheduler::new().unwrap();
		assert!(matches!(scheduler.trigger("nope"), Err(SchedulerError::UnknownKey(_))));
	}

	#[test]
	fn new_outside_runtime_fails() {
		assert!(matches!(Scheduler::new(), Err(SchedulerError::NoRuntime(_))));
	}
}
