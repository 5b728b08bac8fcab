/* src/store/wiring.rs */

use std::future::Future;
use std::time::Duration;

use crate::effects::EffectError;

use super::event::StoreEvent;
use super::{SettingsStore, StoreError};

impl SettingsStore {
	/// Registers an effect under `key` on the store's scheduler. Failures
	/// are reported through the store's notifier and event channel.
	pub fn register_effect<F, Fut>(&self, key: impl Into<String>, delay: Duration, effect: F)
	where
		F: Fn() -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<(), EffectError>> + Send + 'static,
	{
		let key = key.into();
		let label = key.clone();
		let notifier = std::sync::Arc::clone(&self.notifier);
		let events = self.events.clone();

		self.scheduler.register(key, delay, move || {
			let run = effect();
			let notifier = std::sync::Arc::clone(&notifier);
			let events = events.clone();
			let label = label.clone();
			async move {
				let result = run.await;
				if let Err(error) = &result {
					notifier.notify(&format!("Error while running {label}"), &error.to_string());
					events.emit(|| StoreEvent::EffectFailed {
						key: label,
						error: error.to_string(),
					});
				}
				result
			}
		});
	}

	/// Triggers the effect registered under `key` whenever the value at `path` changes.
	///
	/// The wiring lives as long as the store, or until [`shutdown`](Self::shutdown).
	pub fn on_change(&self, path: &str, key: impl Into<String>) -> Result<(), StoreError> {
		let key = key.into();
		let scheduler = self.scheduler.clone();
		let subscription = self.subscribe(path, move |_| {
			if let Err(error) = scheduler.trigger(&key) {
				tracing::warn!(%error, "could not trigger effect");
			}
		})?;
		self.wiring.lock().push(subscription);
		Ok(())
	}
}
