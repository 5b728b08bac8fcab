/* src/store/mod.rs */

//! The settings document: one root signal holding the whole tree, addressed
//! by dotted paths, reconciled against a schema on load and persisted through
//! a coalesced effect.

mod error;
mod event;
mod lifecycle;
mod path;
mod persister;
mod read;
mod typed;
mod wiring;
mod write;

pub use error::StoreError;
pub use event::{DEFAULT_EVENT_CAPACITY, LoadKind, StoreEvent};
pub use lifecycle::{PERSIST_KEY, RELOAD_KEY};
pub use path::Path;
pub use typed::Setting;

#[cfg(feature = "stream")]
pub use event::EventStream;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;

use crate::effects::{LogNotifier, Notifier};
use crate::persist::{AnyFormat, Backend, Persistence};
use crate::scheduler::Scheduler;
use crate::signal::{Derived, Signal, Subscription};

use event::Events;
use persister::Persister;

/// Default coalescing window for the persistence effect. Zero still folds
/// every write made before the runtime gets control into one file write.
pub const DEFAULT_PERSIST_DELAY: Duration = Duration::ZERO;

/// The reactive settings store.
///
/// Reads hand out snapshots; the only way to change the document is through
/// the store's write operations, each of which publishes a new root and
/// notifies subscribers before returning.
pub struct SettingsStore {
	pub(crate) schema: Arc<Value>,
	pub(crate) root: Signal<Value>,
	pub(crate) persister: Option<Persister>,
	pub(crate) scheduler: Scheduler,
	pub(crate) notifier: Arc<dyn Notifier>,
	pub(crate) events: Events,
	pub(crate) selectors: Mutex<HashMap<Path, Derived<Option<Value>>>>,
	pub(crate) wiring: Mutex<Vec<Subscription>>,
}

impl SettingsStore {
	pub fn builder() -> SettingsStoreBuilder {
		SettingsStoreBuilder::new()
	}

	/// A store without persistence, starting from `schema`.
	pub fn in_memory(schema: Value) -> Result<Self, StoreError> {
		Self::builder().schema(schema).build()
	}

	pub fn scheduler(&self) -> &Scheduler {
		&self.scheduler
	}

	pub fn notifier(&self) -> &Arc<dyn Notifier> {
		&self.notifier
	}

	/// Where the document is persisted, if anywhere.
	pub fn location(&self) -> Option<String> {
		self.persister.as_ref().map(|p| p.persistence.location())
	}
}

impl std::fmt::Debug for SettingsStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SettingsStore")
			.field("location", &self.location())
			.field("version", &self.root.version())
			.field("selectors", &self.selectors.lock().len())
			.finish()
	}
}

/// Builder for [`SettingsStore`].
pub struct SettingsStoreBuilder {
	schema: Option<Value>,
	persistence: Option<Persistence>,
	scheduler: Option<Scheduler>,
	notifier: Option<Arc<dyn Notifier>>,
	persist_delay: Duration,
	event_capacity: usize,
}

impl SettingsStoreBuilder {
	pub fn new() -> Self {
		Self {
			schema: None,
			persistence: None,
			scheduler: None,
			notifier: None,
			persist_delay: DEFAULT_PERSIST_DELAY,
			event_capacity: DEFAULT_EVENT_CAPACITY,
		}
	}

	/// The default document. Defaults to [`crate::schema::shell_defaults`].
	pub fn schema(mut self, schema: Value) -> Self {
		self.schema = Some(schema);
		self
	}

	pub fn persistence(mut self, persistence: Persistence) -> Self {
		self.persistence = Some(persistence);
		self
	}

	pub fn backend(self, backend: impl Backend + 'static, format: AnyFormat) -> Self {
		self.persistence(Persistence::new(backend, format))
	}

	/// Persists to `path`, picking the format from its extension.
	#[cfg(feature = "fs")]
	pub fn file(self, path: impl Into<std::path::PathBuf>) -> Self {
		self.persistence(Persistence::file(path))
	}

	/// Shares an existing scheduler. By default the store creates its own on
	/// the current tokio runtime.
	pub fn scheduler(mut self, scheduler: Scheduler) -> Self {
		self.scheduler = Some(scheduler);
		self
	}

	/// Where persistence and effect failures are surfaced. Defaults to [`LogNotifier`].
	pub fn notifier(mut self, notifier: impl Notifier + 'static) -> Self {
		self.notifier = Some(Arc::new(notifier));
		self
	}

	pub fn persist_delay(mut self, delay: Duration) -> Self {
		self.persist_delay = delay;
		self
	}

	/// Note: events may be dropped if subscribers fall further behind than
	/// the channel capacity.
	pub fn event_capacity(mut self, capacity: usize) -> Self {
		self.event_capacity = capacity;
		self
	}

	/// Builds a store holding the schema defaults, without reading persistence.
	/// Changes are still persisted if persistence is configured.
	pub fn build(self) -> Result<SettingsStore, StoreError> {
		let store = self.assemble()?;
		store.wire();
		store.announce(LoadKind::Ephemeral, Vec::new(), Vec::new());
		Ok(store)
	}

	/// Builds the store and loads the persisted document, reconciling it
	/// against the schema and writing the result back if it had to change.
	pub async fn open(self) -> Result<SettingsStore, StoreError> {
		let store = self.assemble()?;
		let needs_write = store.load_initial().await;
		store.wire();
		if needs_write {
			// Failures are already logged and notified; the store stays usable.
			let _ = store.flush().await;
		}
		Ok(store)
	}

	fn assemble(self) -> Result<SettingsStore, StoreError> {
		let schema = Arc::new(self.schema.unwrap_or_else(crate::schema::shell_defaults));
		let scheduler = match self.scheduler {
			Some(scheduler) => scheduler,
			None => Scheduler::new()?,
		};
		let notifier = self.notifier.unwrap_or_else(|| Arc::new(LogNotifier));
		let events = Events::new(self.event_capacity);
		let root = Signal::new((*schema).clone());

		let persister = self.persistence.map(|persistence| {
			Persister::new(persistence, root.clone(), Arc::clone(&notifier), events.clone())
		});
		if let Some(persister) = &persister {
			persister.register(&scheduler, self.persist_delay);
		}

		Ok(SettingsStore {
			schema,
			root,
			persister,
			scheduler,
			notifier,
			events,
			selectors: Mutex::new(HashMap::new()),
			wiring: Mutex::new(Vec::new()),
		})
	}
}

impl Default for SettingsStoreBuilder {
	fn default() -> Self {
		Self::new()
	}
}
