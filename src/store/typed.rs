/* src/store/typed.rs */

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::signal::Derived;

use super::{SettingsStore, StoreError};

/// A statically known path paired with the type stored there.
pub struct Setting<T> {
	path: &'static str,
	_value: PhantomData<fn() -> T>,
}

impl<T> Setting<T> {
	pub const fn new(path: &'static str) -> Self {
		Self {
			path,
			_value: PhantomData,
		}
	}

	pub const fn path(&self) -> &'static str {
		self.path
	}
}

impl<T> Clone for Setting<T> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<T> Copy for Setting<T> {}

impl<T> fmt::Debug for Setting<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Setting").field(&self.path).finish()
	}
}

impl SettingsStore {
	pub fn read<T>(&self, setting: &Setting<T>) -> Result<T, StoreError>
	where
		T: DeserializeOwned,
	{
		self.get_as(setting.path())
	}

	pub fn write<T>(&self, setting: &Setting<T>, value: &T) -> Result<(), StoreError>
	where
		T: Serialize,
	{
		self.set_as(setting.path(), value)
	}

	/// A derived signal holding the typed value, `None` while the stored
	/// value is missing or does not deserialize into `T`.
	pub fn derive<T>(&self, setting: &Setting<T>) -> Result<Derived<Option<T>>, StoreError>
	where
		T: DeserializeOwned + PartialEq + Send + Sync + 'static,
	{
		let selector = self.select(setting.path())?;
		Ok(Derived::new(move || match &*selector.get() {
			Some(value) => <T as serde::Deserialize>::deserialize(value).ok(),
			None => None,
		}))
	}
}
