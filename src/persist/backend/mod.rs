/* src/persist/backend/mod.rs */

use std::path::Path;

use async_trait::async_trait;

use super::PersistError;

mod memory;
pub use memory::MemoryBackend;

#[cfg(feature = "fs")]
mod file;
#[cfg(feature = "fs")]
pub use file::FileBackend;

/// Where the encoded document lives.
#[async_trait]
pub trait Backend: Send + Sync {
	/// Reads the stored bytes. Returns [`PersistError::NotFound`] when nothing is stored.
	async fn read(&self) -> Result<Vec<u8>, PersistError>;

	/// Replaces the stored bytes. Readers never observe a partial write.
	async fn write(&self, bytes: &[u8]) -> Result<(), PersistError>;

	/// Human-readable location used in logs and notifications.
	fn location(&self) -> String;

	/// Filesystem path, for backends that have one.
	fn path(&self) -> Option<&Path> {
		None
	}
}
