/* src/persist/backend/memory.rs */

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::super::PersistError;
use super::Backend;

#[derive(Default)]
struct Shared {
	contents: Mutex<Option<Vec<u8>>>,
	writes: AtomicUsize,
	reject_writes: AtomicBool,
}

/// An in-memory slot, useful for tests and ephemeral stores.
///
/// Clones share the slot, so a test can keep one clone to inspect what the
/// store wrote through another.
#[derive(Clone, Default)]
pub struct MemoryBackend {
	shared: Arc<Shared>,
}

impl MemoryBackend {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_contents(bytes: impl Into<Vec<u8>>) -> Self {
		let backend = Self::default();
		*backend.shared.contents.lock() = Some(bytes.into());
		backend
	}

	pub fn contents(&self) -> Option<Vec<u8>> {
		self.shared.contents.lock().clone()
	}

	pub fn set_contents(&self, bytes: impl Into<Vec<u8>>) {
		*self.shared.contents.lock() = Some(bytes.into());
	}

	/// Number of successful writes so far.
	pub fn write_count(&self) -> usize {
		self.shared.writes.load(Ordering::SeqCst)
	}

	/// While set, every write fails with [`PersistError::Rejected`].
	pub fn reject_writes(&self, reject: bool) {
		self.shared.reject_writes.store(reject, Ordering::SeqCst);
	}
}

#[async_trait]
impl Backend for MemoryBackend {
	async fn read(&self) -> Result<Vec<u8>, PersistError> {
		self.shared.contents.lock().clone().ok_or(PersistError::NotFound)
	}

	async fn write(&self, bytes: &[u8]) -> Result<(), PersistError> {
		if self.shared.reject_writes.load(Ordering::SeqCst) {
			return Err(PersistError::Rejected("memory backend is read-only".into()));
		}
		*self.shared.contents.lock() = Some(bytes.to_vec());
		self.shared.writes.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}

	fn location(&self) -> String {
		"memory".to_string()
	}
}

impl std::fmt::Debug for MemoryBackend {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MemoryBackend")
			.field("writes", &self.write_count())
			.finish()
	}
}
