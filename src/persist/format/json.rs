/* src/persist/format/json.rs */

use serde::Serialize;
use serde_json::Value;

use super::super::PersistError;
use super::Format;

/// JSON with four-space indentation, the layout hand-edited settings files use.
pub struct Json;

impl Format for Json {
	fn extensions(&self) -> &'static [&'static str] {
		&["json"]
	}

	fn parse(&self, input: &[u8]) -> Result<Value, PersistError> {
		serde_json::from_slice(input).map_err(|e| PersistError::Parse(e.to_string()))
	}

	fn render(&self, document: &Value) -> Result<Vec<u8>, PersistError> {
		let mut out = Vec::new();
		let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
		let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
		document
			.serialize(&mut serializer)
			.map_err(|e| PersistError::Render(e.to_string()))?;
		Ok(out)
	}
}
