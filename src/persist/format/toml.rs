/* src/persist/format/toml.rs */

use serde_json::Value;

use super::super::PersistError;
use super::Format;

/// TOML format using `toml`.
///
/// TOML has no null. Null object entries are left out when rendering;
/// reconciling on the next load puts the schema default back in their place.
/// A null inside an array cannot be left out without shifting the elements
/// after it, so such documents fail to render.
pub struct Toml;

impl Format for Toml {
	fn extensions(&self) -> &'static [&'static str] {
		&["toml"]
	}

	fn parse(&self, input: &[u8]) -> Result<Value, PersistError> {
		let s = std::str::from_utf8(input).map_err(|e| PersistError::Parse(e.to_string()))?;
		toml::from_str(s).map_err(|e| PersistError::Parse(e.to_string()))
	}

	fn render(&self, document: &Value) -> Result<Vec<u8>, PersistError> {
		let text = toml::to_string_pretty(&without_nulls(document, "")?)
			.map_err(|e| PersistError::Render(e.to_string()))?;
		Ok(text.into_bytes())
	}
}

fn without_nulls(value: &Value, at: &str) -> Result<Value, PersistError> {
	let child = |key: &str| if at.is_empty() { key.to_string() } else { format!("{at}.{key}") };
	match value {
		Value::Object(map) => map
			.iter()
			.filter(|(_, v)| !v.is_null())
			.map(|(k, v)| without_nulls(v, &child(k)).map(|v| (k.clone(), v)))
			.collect::<Result<serde_json::Map<String, Value>, PersistError>>()
			.map(Value::Object),
		Value::Array(items) => items
			.iter()
			.enumerate()
			.map(|(i, v)| match v {
				Value::Null => Err(PersistError::Render(format!(
					"null at {} cannot be stored in TOML",
					child(&i.to_string())
				))),
				v => without_nulls(v, &child(&i.to_string())),
			})
			.collect::<Result<Vec<Value>, PersistError>>()
			.map(Value::Array),
		other => Ok(other.clone()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn null_entries_are_omitted() {
		let doc = json!({ "waifu": { "current": null, "visibility": true } });
		let text = String::from_utf8(Toml.render(&doc).unwrap()).unwrap();
		assert!(!text.contains("current"));
		let back = Toml.parse(text.as_bytes()).unwrap();
		assert_eq!(back, json!({ "waifu": { "visibility": true } }));
	}

	#[test]
	fn array_positions_survive_a_round_trip() {
		let doc = json!({ "bar": { "layout": [{ "name": "a", "icon": null }, { "name": "b" }] } });
		let text = String::from_utf8(Toml.render(&doc).unwrap()).unwrap();
		let back = Toml.parse(text.as_bytes()).unwrap();
		assert_eq!(back["bar"]["layout"][1]["name"], json!("b"));
		assert_eq!(back["bar"]["layout"].as_array().map(Vec::len), Some(2));
	}

	#[test]
	fn null_array_element_is_a_render_error() {
		let doc = json!({ "booru": { "tags": ["a", null, "c"] } });
		let error = Toml.render(&doc).unwrap_err();
		assert!(matches!(&error, PersistError::Render(m) if m.contains("booru.tags.1")));
	}
}
