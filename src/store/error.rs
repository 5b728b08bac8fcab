/* src/store/error.rs */

use crate::persist::PersistError;
use crate::scheduler::SchedulerError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	/// The path is empty or has an empty segment.
	#[error("invalid settings path: {path:?}")]
	InvalidPath { path: String },

	/// A write tried to descend through a value that is neither an object nor an array.
	#[error("cannot write through `{path}`: it holds a scalar")]
	NotAContainer { path: String },

	/// An array segment is not an index inside the array.
	#[error("`{path}` is not a valid index into an array of length {len}")]
	IndexOutOfBounds { path: String, len: usize },

	#[error("no setting at `{path}`")]
	NotFound { path: String },

	/// The value at `path` does not have the requested type.
	#[error("setting `{path}` has an unexpected shape: {source}")]
	Type {
		path: String,
		source: serde_json::Error,
	},

	/// `set_ranged` was called on something that is not a ranged descriptor.
	#[error("setting `{path}` is not a ranged descriptor")]
	NotRanged { path: String },

	#[error("store has no persistence configured")]
	NotPersisted,

	#[error(transparent)]
	Persist(#[from] PersistError),

	#[error(transparent)]
	Scheduler(#[from] SchedulerError),

	#[cfg(feature = "watch")]
	#[error(transparent)]
	Watch(#[from] crate::watch::WatchError),
}
