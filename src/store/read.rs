/* src/store/read.rs */

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::signal::{Derived, ReadSignal, Subscription};

use super::{Path, SettingsStore, StoreError};

impl SettingsStore {
	/// The default document the store reconciles against.
	pub fn schema(&self) -> &Value {
		&self.schema
	}

	/// The whole document. Tracked inside derivations.
	pub fn snapshot(&self) -> Arc<Value> {
		self.root.get()
	}

	/// Read-only handle on the root signal.
	pub fn root(&self) -> ReadSignal<Value> {
		self.root.read_only()
	}

	/// Number of published writes since the store was created.
	pub fn version(&self) -> u64 {
		self.root.version()
	}

	/// The value at `path`, or `None` if it is missing or the path is malformed.
	/// Tracked inside derivations.
	pub fn get(&self, path: &str) -> Option<Value> {
		match Path::parse(path) {
			Ok(path) => self.get_at(&path),
			Err(error) => {
				tracing::debug!(%error, "read with malformed path");
				None
			}
		}
	}

	pub fn get_at(&self, path: &Path) -> Option<Value> {
		let document = self.root.get();
		path.lookup(&document).cloned()
	}

	/// Like [`get`](Self::get), without registering a dependency.
	pub(crate) fn peek_at(&self, path: &Path) -> Option<Value> {
		let document = self.root.get_untracked();
		path.lookup(&document).cloned()
	}

	/// Deserializes the value at `path` into `T`.
	pub fn get_as<T>(&self, path: &str) -> Result<T, StoreError>
	where
		T: DeserializeOwned,
	{
		let path = Path::parse(path)?;
		let value = self.get_at(&path).ok_or_else(|| StoreError::NotFound {
			path: path.to_string(),
		})?;
		serde_json::from_value(value).map_err(|source| StoreError::Type {
			path: path.to_string(),
			source,
		})
	}

	pub fn contains(&self, path: &str) -> bool {
		self.get(path).is_some()
	}

	/// A derived signal tracking the value at `path`.
	///
	/// Selectors are cached per path, so every caller shares one computation.
	/// Subscribers of a selector are notified only when the value at its path
	/// changes, not on every write to the document. A selector stays cached
	/// while it is held, read by a derivation, or subscribed to.
	pub fn select(&self, path: &str) -> Result<Derived<Option<Value>>, StoreError> {
		let path = Path::parse(path)?;
		let mut selectors = self.selectors.lock();
		if let Some(selector) = selectors.get(&path) {
			return Ok(selector.clone());
		}
		selectors.retain(|_, selector| selector.is_shared() || selector.subscriber_count() > 0);

		let root = self.root.clone();
		let key = path.clone();
		let selector = Derived::new(move || {
			let document = root.get();
			key.lookup(&document).cloned()
		});
		selectors.insert(path, selector.clone());
		Ok(selector)
	}

	/// Calls `f` with the new value whenever the value at `path` changes.
	/// `None` means the path no longer exists.
	pub fn subscribe(
		&self,
		path: &str,
		f: impl Fn(Option<&Value>) + Send + Sync + 'static,
	) -> Result<Subscription, StoreError> {
		let selector = self.select(path)?;
		Ok(selector.subscribe(move |value: &Option<Value>| f(value.as_ref())))
	}

	/// Calls `f` with the whole document after every write.
	pub fn subscribe_all(&self, f: impl Fn(&Value) + Send + Sync + 'static) -> Subscription {
		self.root.subscribe(f)
	}

	#[cfg(feature = "events")]
	pub fn events(&self) -> tokio::sync::broadcast::Receiver<super::StoreEvent> {
		self.events.subscribe()
	}

	#[cfg(feature = "stream")]
	pub fn event_stream(&self) -> super::EventStream {
		super::EventStream::new(self.events.subscribe())
	}
}
