/* src/watch/mod.rs */

//! Live reload: watch the persisted settings file and re-read it when
//! another process edits it.

use std::path::PathBuf;
use std::sync::{Arc, Weak};
use std::time::Duration;

use crate::effects::EffectError;
use crate::scheduler::Scheduler;
use crate::store::{RELOAD_KEY, SettingsStore, StoreError};

mod target;
mod watcher;

pub use watcher::Watcher;

#[derive(thiserror::Error, Debug)]
pub enum WatchError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Notify error: {0}")]
	Notify(#[from] notify::Error),

	#[error("Invalid configuration: {0}")]
	Config(String),

	#[error("Glob pattern error: {0}")]
	Glob(#[from] globset::Error),

	#[error("watching requires a tokio runtime: {0}")]
	NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

pub type Result<T> = std::result::Result<T, WatchError>;

/// Defines what file system entities to monitor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
	/// A single file. Its parent directory is watched so atomic replaces are seen.
	File(PathBuf),

	/// A directory, recursively.
	Directory(PathBuf),

	/// A directory with glob filtering relative to it.
	Filtered {
		path: PathBuf,
		include: Vec<String>,
		exclude: Vec<String>,
	},
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
	/// Coalescing window between a burst of file events and the reaction.
	pub debounce: Duration,

	/// Skip dotfiles.
	pub ignore_hidden: bool,

	/// Event kinds to forward; `None` forwards all of them.
	pub listen_events: Option<Vec<EventKind>>,
}

impl Default for WatchConfig {
	fn default() -> Self {
		Self {
			debounce: Duration::from_millis(200),
			ignore_hidden: true,
			listen_events: None,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
	Create,
	Modify,
	Remove,
}

/// A filesystem change that passed the target's filters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchEvent {
	pub paths: Vec<PathBuf>,
	pub kind: EventKind,
}

/// Triggers the effect registered under `key` on every matching file event.
/// Bursts fold into one run through the scheduler.
pub fn trigger_on_change(
	scheduler: Scheduler,
	key: impl Into<String>,
	target: Target,
	config: WatchConfig,
) -> Result<Watcher> {
	let key = key.into();
	Watcher::new(target, config, move |event| {
		tracing::trace!(key, ?event, "file change");
		if let Err(error) = scheduler.trigger(&key) {
			tracing::warn!(%error, key, "could not trigger effect for file change");
		}
	})
}

impl SettingsStore {
	/// Reloads the document whenever the persisted file changes on disk.
	///
	/// Writes made by this store are recognized and skipped. Reloading stops
	/// when the returned watcher is dropped.
	pub fn watch_file(self: &Arc<Self>, config: WatchConfig) -> std::result::Result<Watcher, StoreError> {
		let path = self
			.persister
			.as_ref()
			.and_then(|p| p.persistence.path())
			.map(|p| p.to_path_buf())
			.ok_or(StoreError::NotPersisted)?;

		let weak: Weak<SettingsStore> = Arc::downgrade(self);
		self.register_effect(RELOAD_KEY, config.debounce, move || {
			let store = weak.upgrade();
			async move {
				let Some(store) = store else {
					return Ok(());
				};
				store
					.reload()
					.await
					.map(|_| ())
					.map_err(|error| EffectError::Custom(error.to_string()))
			}
		});

		tracing::debug!(path = %path.display(), "watching settings file");
		let watcher = trigger_on_change(self.scheduler.clone(), RELOAD_KEY, Target::File(path), config)?;
		Ok(watcher)
	}
}
