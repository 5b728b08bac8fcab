/* src/persist/mod.rs */

//! Loading and saving the settings document.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

pub mod backend;
mod error;
pub mod format;

pub use backend::{Backend, MemoryBackend};
pub use error::PersistError;
pub use format::{AnyFormat, Format, Json};

#[cfg(feature = "fs")]
pub use backend::FileBackend;
#[cfg(feature = "toml")]
pub use format::Toml;
#[cfg(feature = "yaml")]
pub use format::Yaml;

/// Result of reading the stored document.
#[derive(Debug)]
pub enum LoadOutcome {
	/// Successfully read and decoded.
	Loaded(Value),
	/// Nothing stored, or only whitespace.
	Missing,
	/// Stored but unreadable or undecodable.
	Invalid(PersistError),
}

/// A backend paired with the format used to encode documents in it.
#[derive(Clone)]
pub struct Persistence {
	backend: Arc<dyn Backend>,
	format: AnyFormat,
}

impl Persistence {
	pub fn new(backend: impl Backend + 'static, format: AnyFormat) -> Self {
		Self {
			backend: Arc::new(backend),
			format,
		}
	}

	/// A file whose format follows its extension, JSON when unrecognized.
	#[cfg(feature = "fs")]
	pub fn file(path: impl Into<std::path::PathBuf>) -> Self {
		let path = path.into();
		let format = AnyFormat::for_path(&path).unwrap_or_default();
		Self::new(FileBackend::new(path), format)
	}

	pub fn format(&self) -> AnyFormat {
		self.format
	}

	pub fn location(&self) -> String {
		self.backend.location()
	}

	pub fn path(&self) -> Option<&Path> {
		self.backend.path()
	}

	pub async fn load(&self) -> LoadOutcome {
		let bytes = match self.backend.read().await {
			Ok(bytes) => bytes,
			Err(PersistError::NotFound) => return LoadOutcome::Missing,
			Err(e) => return LoadOutcome::Invalid(e),
		};
		if bytes.iter().all(u8::is_ascii_whitespace) {
			return LoadOutcome::Missing;
		}
		match self.format.parse(&bytes) {
			Ok(document) => LoadOutcome::Loaded(document),
			Err(e) => LoadOutcome::Invalid(e),
		}
	}

	pub async fn save(&self, document: &Value) -> Result<(), PersistError> {
		let bytes = self.format.render(document)?;
		self.backend.write(&bytes).await
	}
}

impl std::fmt::Debug for Persistence {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Persistence")
			.field("location", &self.location())
			.field("format", &self.format)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[tokio::test]
	async fn whitespace_only_counts_as_missing() {
		let store = Persistence::new(MemoryBackend::with_contents("  \n\t"), AnyFormat::Json);
		assert!(matches!(store.load().await, LoadOutcome::Missing));
	}

	#[tokio::test]
	async fn malformed_document_is_invalid() {
		let store = Persistence::new(MemoryBackend::with_contents("{ nope"), AnyFormat::Json);
		assert!(matches!(store.load().await, LoadOutcome::Invalid(PersistError::Parse(_))));
	}

	#[tokio::test]
	async fn saved_document_loads_back() {
		let backend = MemoryBackend::new();
		let store = Persistence::new(backend.clone(), AnyFormat::Json);
		store.save(&json!({ "dateFormat": "%H:%M" })).await.unwrap();
		assert_eq!(backend.write_count(), 1);
		match store.load().await {
			LoadOutcome::Loaded(doc) => assert_eq!(doc, json!({ "dateFormat": "%H:%M" })),
			other => panic!("unexpected outcome: {other:?}"),
		}
	}
}
