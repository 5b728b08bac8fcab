/* tests/common/mod.rs */

// Each test crate uses a different subset.
#![allow(dead_code)]

use proptest::prelude::*;
use serde_json::{Map, Value};

pub fn leaf() -> impl Strategy<Value = Value> {
	prop_oneof![
		Just(Value::Null),
		any::<bool>().prop_map(Value::Bool),
		any::<i32>().prop_map(Value::from),
		"[a-z]{0,6}".prop_map(Value::String),
	]
}

pub fn document() -> impl Strategy<Value = Value> {
	leaf().prop_recursive(4, 48, 6, |inner| {
		prop_oneof![
			prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
			prop::collection::btree_map("[a-e]", inner, 0..5)
				.prop_map(|map| Value::Object(map.into_iter().collect::<Map<_, _>>())),
		]
	})
}

/// A document whose root is an object.
pub fn object_document() -> impl Strategy<Value = Value> {
	prop::collection::btree_map("[a-e]", document(), 0..5)
		.prop_map(|map| Value::Object(map.into_iter().collect::<Map<_, _>>()))
}
