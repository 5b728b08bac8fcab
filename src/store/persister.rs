/* src/store/persister.rs */

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use serde_json::Value;

use super::event::{Events, StoreEvent};
use super::lifecycle::PERSIST_KEY;
use crate::effects::{EffectError, Notifier};
use crate::persist::{PersistError, Persistence};
use crate::scheduler::Scheduler;
use crate::signal::Signal;

/// Writes the root document to persistence and remembers what it wrote.
#[derive(Clone)]
pub(crate) struct Persister {
	pub(crate) persistence: Persistence,
	root: Signal<Value>,
	notifier: Arc<dyn Notifier>,
	events: Events,
	last_written: Arc<ArcSwapOption<Value>>,
	// Serializes writes so a slow older write never lands after a newer one.
	gate: Arc<tokio::sync::Mutex<()>>,
}

impl Persister {
	pub(crate) fn new(
		persistence: Persistence,
		root: Signal<Value>,
		notifier: Arc<dyn Notifier>,
		events: Events,
	) -> Self {
		Self {
			persistence,
			root,
			notifier,
			events,
			last_written: Arc::new(ArcSwapOption::empty()),
			gate: Arc::new(tokio::sync::Mutex::new(())),
		}
	}

	/// Registers the persistence effect under [`PERSIST_KEY`].
	pub(crate) fn register(&self, scheduler: &Scheduler, delay: Duration) {
		let persister = self.clone();
		scheduler.register(PERSIST_KEY, delay, move || {
			let persister = persister.clone();
			async move { persister.persist().await.map_err(EffectError::from) }
		});
	}

	/// Writes the document as it is when the write starts.
	pub(crate) async fn persist(&self) -> Result<(), PersistError> {
		let _gate = self.gate.lock().await;
		let snapshot = self.root.get_untracked();
		let location = self.persistence.location();

		match self.persistence.save(&snapshot).await {
			Ok(()) => {
				tracing::debug!(%location, "settings persisted");
				self.last_written.store(Some(snapshot));
				self.events.emit(|| StoreEvent::Persisted { location });
				Ok(())
			}
			Err(error) => {
				tracing::warn!(%location, %error, "failed to persist settings");
				self.notifier
					.notify("Settings not saved", &format!("{location}: {error}"));
				self.events.emit(|| StoreEvent::PersistFailed {
					location,
					error: error.to_string(),
				});
				Err(error)
			}
		}
	}

	/// Records `document` as matching what is stored.
	pub(crate) fn remember(&self, document: Arc<Value>) {
		self.last_written.store(Some(document));
	}

	/// True if `document` is exactly what this store last wrote or loaded.
	pub(crate) fn matches_last(&self, document: &Value) -> bool {
		self.last_written
			.load_full()
			.is_some_and(|last| *last == *document)
	}
}
