/* src/persist/backend/file.rs */

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;

use super::super::PersistError;
use super::Backend;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A single file on disk, written through a sibling temp file and a rename.
#[derive(Debug, Clone)]
pub struct FileBackend {
	path: PathBuf,
}

impl FileBackend {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	fn temp_path(&self) -> PathBuf {
		let mut name = self
			.path
			.file_name()
			.map(|n| n.to_os_string())
			.unwrap_or_else(|| OsString::from("settings"));
		let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
		name.push(format!(".{}.{n}.tmp", std::process::id()));
		self.path.with_file_name(name)
	}
}

#[async_trait]
impl Backend for FileBackend {
	async fn read(&self) -> Result<Vec<u8>, PersistError> {
		match fs::read(&self.path).await {
			Ok(bytes) => Ok(bytes),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(PersistError::NotFound),
			Err(e) => Err(PersistError::Io(e)),
		}
	}

	async fn write(&self, bytes: &[u8]) -> Result<(), PersistError> {
		if let Some(parent) = self.path.parent()
			&& !parent.as_os_str().is_empty()
		{
			fs::create_dir_all(parent).await?;
		}

		let temp = self.temp_path();
		if let Err(e) = fs::write(&temp, bytes).await {
			let _ = fs::remove_file(&temp).await;
			return Err(e.into());
		}
		if let Err(e) = fs::rename(&temp, &self.path).await {
			let _ = fs::remove_file(&temp).await;
			return Err(e.into());
		}
		Ok(())
	}

	fn location(&self) -> String {
		self.path.display().to_string()
	}

	fn path(&self) -> Option<&Path> {
		Some(&self.path)
	}
}
