/* src/descriptor.rs */

//! Ranged setting descriptors: `{ name?, value, type, min, max }` objects
//! driving sliders and switches.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// How a ranged value is normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeKind {
	/// Rounded to the nearest integer.
	Int,
	/// Rounded to two decimals.
	Float,
	/// `true` from the midpoint of the range up.
	Bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranged {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	pub value: Value,
	#[serde(rename = "type")]
	pub kind: RangeKind,
	pub min: f64,
	pub max: f64,
}

impl Ranged {
	/// Clamps `input` into `[min, max]` and normalizes it by kind.
	pub fn normalize(&self, input: f64) -> Value {
		let (low, high) = if self.min <= self.max {
			(self.min, self.max)
		} else {
			(self.max, self.min)
		};
		let input = if input.is_nan() { low } else { input };
		let clamped = input.clamp(low, high);

		match self.kind {
			RangeKind::Int => Value::from(clamped.round() as i64),
			RangeKind::Float => Number::from_f64((clamped * 100.0).round() / 100.0)
				.map(Value::Number)
				.unwrap_or(Value::Null),
			RangeKind::Bool => Value::Bool(clamped >= (low + high) / 2.0),
		}
	}

	/// The current value as a number; booleans count as 0 and 1.
	pub fn as_f64(&self) -> Option<f64> {
		match &self.value {
			Value::Number(n) => n.as_f64(),
			Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
			_ => None,
		}
	}

	/// Position of the current value within the range, from 0 to 1.
	pub fn fraction(&self) -> Option<f64> {
		let span = self.max - self.min;
		if span == 0.0 {
			return None;
		}
		self.as_f64()
			.map(|value| ((value - self.min) / span).clamp(0.0, 1.0))
	}
}
