/* src/persist/format/yaml.rs */

use serde_json::Value;

use super::super::PersistError;
use super::Format;

/// YAML format using `serde_yaml`.
pub struct Yaml;

impl Format for Yaml {
	fn extensions(&self) -> &'static [&'static str] {
		&["yaml", "yml"]
	}

	fn parse(&self, input: &[u8]) -> Result<Value, PersistError> {
		serde_yaml::from_slice(input).map_err(|e| PersistError::Parse(e.to_string()))
	}

	fn render(&self, document: &Value) -> Result<Vec<u8>, PersistError> {
		serde_yaml::to_string(document)
			.map(String::into_bytes)
			.map_err(|e| PersistError::Render(e.to_string()))
	}
}
