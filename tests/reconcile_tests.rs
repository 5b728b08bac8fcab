/* tests/reconcile_tests.rs */

mod common;

use common::document;
use livecell::reconcile::{reconcile, reconcile_with_report};
use livecell::schema::shell_defaults;
use proptest::prelude::*;
use serde_json::{Value, json};

/// Every object in `schema` has exactly its keys in `doc`.
fn same_shape(schema: &Value, doc: &Value) -> bool {
	match (schema, doc) {
		(Value::Object(defaults), Value::Object(found)) => {
			defaults.len() == found.len()
				&& defaults
					.iter()
					.all(|(key, default)| found.get(key).is_some_and(|v| same_shape(default, v)))
		}
		(Value::Object(_), _) => false,
		_ => true,
	}
}

proptest! {
	#[test]
	fn reconciled_document_has_schema_shape(schema in document(), loaded in document()) {
		let merged = reconcile(&schema, &loaded);
		prop_assert!(same_shape(&schema, &merged));
	}

	#[test]
	fn reconcile_is_idempotent(schema in document(), loaded in document()) {
		let once = reconcile(&schema, &loaded);
		let twice = reconcile(&schema, &once);
		prop_assert_eq!(once, twice);
	}

	#[test]
	fn schema_reconciles_to_itself(schema in document()) {
		let report = reconcile_with_report(&schema, &schema);
		prop_assert!(report.is_clean());
		prop_assert_eq!(report.document, schema);
	}
}

#[test]
fn test_shell_defaults_keep_user_choices() {
	let defaults = shell_defaults();
	let stored = json!({
		"bar": {
			"visibility": false,
			"layout": [{ "name": "utilities", "icon": "", "enabled": true }],
			"position": "top"
		},
		"globalOpacity": { "name": "Opacity", "value": 0.5, "type": "float", "min": 0, "max": 1 },
		"waifu": { "current": { "id": 7, "url": "https://example.invalid/7.jpg" } },
		"chatBot": { "imageGeneration": "yes" }
	});

	let report = reconcile_with_report(&defaults, &stored);
	let doc = &report.document;

	assert_eq!(doc["bar"]["visibility"], json!(false));
	assert_eq!(doc["bar"]["layout"].as_array().map(Vec::len), Some(1));
	assert_eq!(doc["globalOpacity"]["value"], json!(0.5));
	assert_eq!(doc["waifu"]["current"]["id"], json!(7));
	assert_eq!(doc["chatBot"]["imageGeneration"], json!(false));
	assert_eq!(doc["rightPanel"], defaults["rightPanel"]);

	assert_eq!(report.dropped, vec!["bar.position".to_string()]);
	assert_eq!(report.conflicts, vec!["chatBot.imageGeneration".to_string()]);
	assert!(report.defaulted.contains(&"leftPanel".to_string()));
}
