/* src/store/write.rs */

use std::cell::RefCell;

use serde::Serialize;
use serde_json::Value;

use crate::descriptor::Ranged;
use crate::reconcile::{Reconciliation, reconcile_with_report};

use super::{Path, SettingsStore, StoreError};

impl SettingsStore {
	/// Writes `value` at `path`, creating missing intermediate objects, and
	/// notifies before returning. Siblings along the path are untouched.
	pub fn set(&self, path: &str, value: impl Into<Value>) -> Result<(), StoreError> {
		self.set_at(&Path::parse(path)?, value.into())
	}

	pub fn set_at(&self, path: &Path, value: Value) -> Result<(), StoreError> {
		self.mutate(|document| path.assign(document, value.clone()).map(Some))?;
		Ok(())
	}

	/// Serializes `value` and writes it at `path`.
	pub fn set_as<T>(&self, path: &str, value: &T) -> Result<(), StoreError>
	where
		T: Serialize + ?Sized,
	{
		let value = serde_json::to_value(value).map_err(|source| StoreError::Type {
			path: path.to_string(),
			source,
		})?;
		self.set(path, value)
	}

	/// Removes the value at `path` and returns it. Removing a missing path
	/// publishes nothing.
	pub fn remove(&self, path: &str) -> Result<Option<Value>, StoreError> {
		self.remove_at(&Path::parse(path)?)
	}

	pub fn remove_at(&self, path: &Path) -> Result<Option<Value>, StoreError> {
		self.mutate(|document| Ok(path.take(document)))
	}

	/// Replaces the value at `path` with `f(current)`; `None` removes it.
	///
	/// `f` may run more than once if another thread writes concurrently.
	pub fn update(
		&self,
		path: &str,
		mut f: impl FnMut(Option<&Value>) -> Option<Value>,
	) -> Result<(), StoreError> {
		let path = Path::parse(path)?;
		self.mutate(|document| {
			let current = path.lookup(document).cloned();
			match f(current.as_ref()) {
				Some(next) => path.assign(document, next).map(Some),
				None => Ok(path.take(document).map(|_| ())),
			}
		})?;
		Ok(())
	}

	/// Restores the schema default at `path`. A path the schema does not
	/// define is removed.
	pub fn reset(&self, path: &str) -> Result<(), StoreError> {
		let path = Path::parse(path)?;
		match path.lookup(&self.schema).cloned() {
			Some(default) => self.set_at(&path, default),
			None => self.remove_at(&path).map(|_| ()),
		}
	}

	/// Restores the whole document to the schema defaults.
	pub fn reset_all(&self) {
		self.root.set((*self.schema).clone());
	}

	/// Reconciles `document` against the schema and publishes the result.
	pub fn replace(&self, document: &Value) -> Reconciliation {
		let report = reconcile_with_report(&self.schema, document);
		self.root.set(report.document.clone());
		report
	}

	/// Sets the `value` of the ranged descriptor at `path` from `input`,
	/// clamped to the descriptor's bounds and normalized by its type.
	/// Returns the stored value.
	pub fn set_ranged(&self, path: &str, input: f64) -> Result<Value, StoreError> {
		let path = Path::parse(path)?;
		let descriptor: Ranged = self
			.peek_at(&path)
			.and_then(|value| serde_json::from_value(value).ok())
			.ok_or_else(|| StoreError::NotRanged {
				path: path.to_string(),
			})?;
		let value = descriptor.normalize(input);
		self.set_at(&path.child("value"), value.clone())?;
		Ok(value)
	}

	/// Applies `edit` to a copy of the document. `Ok(Some(_))` publishes the
	/// copy; `Ok(None)` and errors leave the document untouched.
	pub(crate) fn mutate<R>(
		&self,
		mut edit: impl FnMut(&mut Value) -> Result<Option<R>, StoreError>,
	) -> Result<Option<R>, StoreError> {
		// Captured inside the rcu closure so the outcome matches the published copy.
		let outcome: RefCell<Option<Result<Option<R>, StoreError>>> = RefCell::new(None);

		self.root.try_update(|current| {
			let mut next = current.clone();
			let result = edit(&mut next);
			let publish = matches!(result, Ok(Some(_)));
			*outcome.borrow_mut() = Some(result);
			publish.then_some(next)
		});

		outcome.into_inner().unwrap_or(Ok(None))
	}
}
