/* src/persist/error.rs */

/// Failures reading, decoding, encoding or writing the settings document.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
	/// The stored bytes are not a valid document in the configured format.
	#[error("parse error: {0}")]
	Parse(String),

	/// The document could not be encoded in the configured format.
	#[error("render error: {0}")]
	Render(String),

	/// Nothing is stored at the backend's location.
	#[error("not found")]
	NotFound,

	/// The backend refused the write.
	#[error("write rejected: {0}")]
	Rejected(String),

	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
}
