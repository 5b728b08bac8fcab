/* src/reconcile.rs */

//! Merging a stored document into the current default schema.
//!
//! The schema decides the shape: every key it defines is present in the
//! result and nothing else is. For each key, a stored value of the same kind
//! wins over the default; objects merge recursively; arrays are replaced
//! whole. A `null` default accepts any stored value.

use serde_json::{Map, Value};

/// What [`reconcile_with_report`] did besides producing the document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reconciliation {
	pub document: Value,
	/// Stored keys absent from the schema, as dotted paths.
	pub dropped: Vec<String>,
	/// Stored values whose kind disagreed with the schema; the default was kept.
	pub conflicts: Vec<String>,
	/// Schema keys missing from the stored document, filled from defaults.
	pub defaulted: Vec<String>,
}

impl Reconciliation {
	/// True when the stored document already had exactly the schema's shape.
	pub fn is_clean(&self) -> bool {
		self.dropped.is_empty() && self.conflicts.is_empty() && self.defaulted.is_empty()
	}
}

/// Merges `loaded` into `schema`. Pure and total.
pub fn reconcile(schema: &Value, loaded: &Value) -> Value {
	merge(schema, loaded, &mut None, "")
}

/// Like [`reconcile`], also listing which keys were dropped, defaulted or
/// rejected for having the wrong kind.
pub fn reconcile_with_report(schema: &Value, loaded: &Value) -> Reconciliation {
	let mut report = Some(Reconciliation::default());
	let document = merge(schema, loaded, &mut report, "");
	let mut report = report.unwrap_or_default();
	report.document = document;
	report
}

#[derive(PartialEq, Eq)]
enum Kind {
	Null,
	Bool,
	Number,
	String,
	Array,
	Object,
}

fn kind(value: &Value) -> Kind {
	match value {
		Value::Null => Kind::Null,
		Value::Bool(_) => Kind::Bool,
		Value::Number(_) => Kind::Number,
		Value::String(_) => Kind::String,
		Value::Array(_) => Kind::Array,
		Value::Object(_) => Kind::Object,
	}
}

fn join(prefix: &str, key: &str) -> String {
	if prefix.is_empty() {
		key.to_string()
	} else {
		format!("{prefix}.{key}")
	}
}

fn merge(schema: &Value, loaded: &Value, report: &mut Option<Reconciliation>, at: &str) -> Value {
	match (schema, loaded) {
		(Value::Object(defaults), Value::Object(stored)) => {
			let mut out = Map::with_capacity(defaults.len());
			for (key, default) in defaults {
				let path = join(at, key);
				let value = match stored.get(key) {
					Some(found) => merge(default, found, report, &path),
					None => {
						if let Some(r) = report.as_mut() {
							r.defaulted.push(path);
						}
						default.clone()
					}
				};
				out.insert(key.clone(), value);
			}
			if let Some(r) = report.as_mut() {
				r.dropped.extend(
					stored
						.keys()
						.filter(|key| !defaults.contains_key(*key))
						.map(|key| join(at, key)),
				);
			}
			Value::Object(out)
		}
		(Value::Null, found) => found.clone(),
		(default, found) if kind(default) == kind(found) => found.clone(),
		(default, _) => {
			if let Some(r) = report.as_mut() {
				r.conflicts.push(at.to_string());
			}
			default.clone()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn stored_scalars_override_defaults() {
		let schema = json!({ "a": 1, "b": { "c": true } });
		let loaded = json!({ "a": 5, "b": { "c": false } });
		assert_eq!(reconcile(&schema, &loaded), json!({ "a": 5, "b": { "c": false } }));
	}

	#[test]
	fn unknown_keys_are_dropped_and_reported() {
		let schema = json!({ "a": 1 });
		let loaded = json!({ "a": 2, "old": { "x": 1 } });
		let report = reconcile_with_report(&schema, &loaded);
		assert_eq!(report.document, json!({ "a": 2 }));
		assert_eq!(report.dropped, vec!["old".to_string()]);
		assert!(!report.is_clean());
	}

	#[test]
	fn arrays_are_replaced_whole() {
		let schema = json!({ "layout": [{ "name": "a" }, { "name": "b" }, { "name": "c" }] });
		let loaded = json!({ "layout": [{ "name": "c" }] });
		assert_eq!(reconcile(&schema, &loaded), loaded);
	}

	#[test]
	fn kind_mismatch_keeps_default() {
		let schema = json!({ "bar": { "lock": true } });
		let loaded = json!({ "bar": { "lock": "yes" } });
		let report = reconcile_with_report(&schema, &loaded);
		assert_eq!(report.document, schema);
		assert_eq!(report.conflicts, vec!["bar.lock".to_string()]);
	}

	#[test]
	fn null_default_accepts_anything() {
		let schema = json!({ "current": null });
		let loaded = json!({ "current": { "id": 42 } });
		assert_eq!(reconcile(&schema, &loaded), loaded);
	}

	#[test]
	fn non_object_document_yields_defaults() {
		let schema = json!({ "a": 1 });
		assert_eq!(reconcile(&schema, &json!([1, 2])), schema);
		assert_eq!(reconcile(&schema, &Value::Null), schema);
	}

	#[test]
	fn result_keeps_schema_key_order() {
		let schema = json!({ "first": 1, "second": 2 });
		let loaded = json!({ "second": 20, "first": 10 });
		let merged = reconcile(&schema, &loaded);
		let keys: Vec<_> = merged.as_object().unwrap().keys().cloned().collect();
		assert_eq!(keys, vec!["first", "second"]);
	}
}
