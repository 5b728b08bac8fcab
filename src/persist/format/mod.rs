/* src/persist/format/mod.rs */

use std::path::Path;

use serde_json::Value;

use super::PersistError;

mod json;
pub use json::Json;

#[cfg(feature = "toml")]
mod toml;
#[cfg(feature = "toml")]
pub use toml::Toml;

#[cfg(feature = "yaml")]
mod yaml;
#[cfg(feature = "yaml")]
pub use yaml::Yaml;

/// Encoding of the settings document at rest.
pub trait Format: Send + Sync {
	/// File extensions this format claims.
	fn extensions(&self) -> &'static [&'static str];

	fn parse(&self, input: &[u8]) -> Result<Value, PersistError>;

	fn render(&self, document: &Value) -> Result<Vec<u8>, PersistError>;
}

/// An enum over every compiled-in format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnyFormat {
	#[default]
	Json,
	#[cfg(feature = "toml")]
	Toml,
	#[cfg(feature = "yaml")]
	Yaml,
}

impl AnyFormat {
	/// Every compiled-in format, JSON first.
	pub fn all() -> &'static [AnyFormat] {
		&[
			AnyFormat::Json,
			#[cfg(feature = "toml")]
			AnyFormat::Toml,
			#[cfg(feature = "yaml")]
			AnyFormat::Yaml,
		]
	}

	pub fn from_extension(ext: &str) -> Option<Self> {
		Self::all()
			.iter()
			.copied()
			.find(|format| format.extensions().iter().any(|e| e.eq_ignore_ascii_case(ext)))
	}

	/// Picks the format from a file name's extension.
	pub fn for_path(path: &Path) -> Option<Self> {
		path.extension()
			.and_then(|ext| ext.to_str())
			.and_then(Self::from_extension)
	}
}

impl Format for AnyFormat {
	fn extensions(&self) -> &'static [&'static str] {
		match self {
			Self::Json => Json.extensions(),
			#[cfg(feature = "toml")]
			Self::Toml => Toml.extensions(),
			#[cfg(feature = "yaml")]
			Self::Yaml => Yaml.extensions(),
		}
	}

	fn parse(&self, input: &[u8]) -> Result<Value, PersistError> {
		match self {
			Self::Json => Json.parse(input),
			#[cfg(feature = "toml")]
			Self::Toml => Toml.parse(input),
			#[cfg(feature = "yaml")]
			Self::Yaml => Yaml.parse(input),
		}
	}

	fn render(&self, document: &Value) -> Result<Vec<u8>, PersistError> {
		match self {
			Self::Json => Json.render(document),
			#[cfg(feature = "toml")]
			Self::Toml => Toml.render(document),
			#[cfg(feature = "yaml")]
			Self::Yaml => Yaml.render(document),
		}
	}
}
