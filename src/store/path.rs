/* src/store/path.rs */

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use super::StoreError;

/// A dot-separated address into the settings document, e.g. `bar.layout.0.enabled`.
///
/// Segments name object keys; under an array a segment is a decimal index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
	raw: String,
	segments: Vec<String>,
}

impl Path {
	pub fn parse(raw: &str) -> Result<Self, StoreError> {
		let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
		if raw.is_empty() || segments.iter().any(String::is_empty) {
			return Err(StoreError::InvalidPath {
				path: raw.to_string(),
			});
		}
		Ok(Self {
			raw: raw.to_string(),
			segments,
		})
	}

	pub fn as_str(&self) -> &str {
		&self.raw
	}

	pub fn segments(&self) -> &[String] {
		&self.segments
	}

	pub fn leaf(&self) -> &str {
		self.segments.last().map(String::as_str).unwrap_or_default()
	}

	pub fn parent(&self) -> Option<Path> {
		let (_, rest) = self.segments.split_last()?;
		if rest.is_empty() {
			return None;
		}
		Some(Self::from_segments(rest.to_vec()))
	}

	/// `self` extended by one segment. `segment` must not contain a dot.
	pub fn child(&self, segment: &str) -> Path {
		let mut segments = self.segments.clone();
		segments.push(segment.to_string());
		Self::from_segments(segments)
	}

	/// True if `self` equals `other` or lies beneath it.
	pub fn starts_with(&self, other: &Path) -> bool {
		self.segments.starts_with(&other.segments)
	}

	fn from_segments(segments: Vec<String>) -> Self {
		Self {
			raw: segments.join("."),
			segments,
		}
	}

	fn prefix(&self, len: usize) -> String {
		self.segments[..len].join(".")
	}

	/// The value at this path, or `None` if any segment is missing.
	pub fn lookup<'a>(&self, document: &'a Value) -> Option<&'a Value> {
		self.segments
			.iter()
			.try_fold(document, |node, segment| match node {
				Value::Object(map) => map.get(segment),
				Value::Array(items) => index(segment).and_then(|i| items.get(i)),
				_ => None,
			})
	}

	/// Writes `value` at this path, creating missing objects on the way.
	/// A `null` on the way is replaced by an empty object.
	pub fn assign(&self, document: &mut Value, value: Value) -> Result<(), StoreError> {
		let (leaf, parents) = match self.segments.split_last() {
			Some(split) => split,
			None => {
				return Err(StoreError::InvalidPath {
					path: self.raw.clone(),
				});
			}
		};

		let mut node = document;
		for (depth, segment) in parents.iter().enumerate() {
			if node.is_null() {
				*node = Value::Object(Map::new());
			}
			node = match node {
				Value::Object(map) => map
					.entry(segment.clone())
					.or_insert_with(|| Value::Object(Map::new())),
				Value::Array(items) => {
					let len = items.len();
					match index(segment).filter(|i| *i < len) {
						Some(i) => &mut items[i],
						None => {
							return Err(StoreError::IndexOutOfBounds {
								path: self.prefix(depth + 1),
								len,
							});
						}
					}
				}
				_ => {
					return Err(StoreError::NotAContainer {
						path: self.prefix(depth),
					});
				}
			};
		}

		if node.is_null() {
			*node = Value::Object(Map::new());
		}
		match node {
			Value::Object(map) => {
				map.insert(leaf.clone(), value);
				Ok(())
			}
			Value::Array(items) => {
				let len = items.len();
				match index(leaf).filter(|i| *i < len) {
					Some(i) => {
						items[i] = value;
						Ok(())
					}
					None => Err(StoreError::IndexOutOfBounds {
						path: self.raw.clone(),
						len,
					}),
				}
			}
			_ => Err(StoreError::NotAContainer {
				path: self.prefix(parents.len()),
			}),
		}
	}

	/// Removes the value at this path and returns it. Missing paths remove nothing.
	pub fn take(&self, document: &mut Value) -> Option<Value> {
		let (leaf, parents) = self.segments.split_last()?;
		let mut node = document;
		for segment in parents {
			node = match node {
				Value::Object(map) => map.get_mut(segment)?,
				Value::Array(items) => {
					let i = index(segment)?;
					items.get_mut(i)?
				}
				_ => return None,
			};
		}
		match node {
			Value::Object(map) => map.shift_remove(leaf),
			Value::Array(items) => {
				let i = index(leaf).filter(|i| *i < items.len())?;
				Some(items.remove(i))
			}
			_ => None,
		}
	}
}

fn index(segment: &str) -> Option<usize> {
	if segment.bytes().all(|b| b.is_ascii_digit()) {
		segment.parse().ok()
	} else {
		None
	}
}

impl fmt::Display for Path {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.raw)
	}
}

impl FromStr for Path {
	type Err = StoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Path::parse(s)
	}
}

impl TryFrom<&str> for Path {
	type Error = StoreError;

	fn try_from(s: &str) -> Result<Self, Self::Error> {
		Path::parse(s)
	}
}

impl AsRef<str> for Path {
	fn as_ref(&self) -> &str {
		&self.raw
	}
}
