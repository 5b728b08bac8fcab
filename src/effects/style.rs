/* src/effects/style.rs */

//! Stylesheet regeneration driven by the global appearance settings.

use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use serde_json::Value;

use super::EffectError;
use crate::store::{SettingsStore, StoreError};

/// Scheduler key of the stylesheet effect.
pub const STYLE_KEY: &str = "style";

pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

/// Settings feeding the stylesheet, and the variable each one becomes.
pub const STYLE_SETTINGS: &[(&str, &str, &str)] = &[
	("globalOpacity", "OPACITY", ""),
	("globalFontSize", "FONT-SIZE", "px"),
	("globalScale", "SCALE", "px"),
];

/// Values of the appearance settings at the time the effect runs.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleVariables {
	entries: Vec<(&'static str, Value, &'static str)>,
}

impl StyleVariables {
	/// Reads every appearance setting present in `document`.
	pub fn from_document(document: &Value) -> Self {
		let entries = STYLE_SETTINGS
			.iter()
			.filter_map(|(path, name, unit)| {
				let value = document.get(*path)?.get("value")?;
				Some((*name, value.clone(), *unit))
			})
			.collect();
		Self { entries }
	}

	pub fn get(&self, name: &str) -> Option<&Value> {
		self.entries.iter().find(|(n, _, _)| *n == name).map(|(_, v, _)| v)
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// SCSS variable declarations to prepend to the stylesheet sources.
	pub fn scss(&self) -> String {
		self.entries
			.iter()
			.map(|(name, value, unit)| format!("${name}: {value}{unit};\n"))
			.collect()
	}
}

/// Registers `regenerate` under [`STYLE_KEY`] and triggers it whenever one of
/// [`STYLE_SETTINGS`] changes. A burst of changes runs it once, with the
/// values current when it runs.
pub fn install<F, Fut>(store: &Arc<SettingsStore>, delay: Duration, regenerate: F) -> Result<(), StoreError>
where
	F: Fn(StyleVariables) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<(), EffectError>> + Send + 'static,
{
	let weak: Weak<SettingsStore> = Arc::downgrade(store);
	store.register_effect(STYLE_KEY, delay, move || {
		let variables = weak
			.upgrade()
			.map(|store| StyleVariables::from_document(&store.snapshot()));
		let run = variables.map(&regenerate);
		async move {
			match run {
				Some(run) => run.await,
				None => Ok(()),
			}
		}
	});

	for (path, _, _) in STYLE_SETTINGS {
		if store.schema().get(*path).is_some() {
			store.on_change(path, STYLE_KEY)?;
		}
	}
	tracing::debug!(key = STYLE_KEY, "stylesheet effect installed");
	Ok(())
}

/// Also regenerates when a file under `dir` changes, such as the stylesheet
/// sources or a generated color palette.
#[cfg(feature = "watch")]
pub fn watch_sources(
	store: &SettingsStore,
	dir: impl Into<std::path::PathBuf>,
	config: crate::watch::WatchConfig,
) -> Result<crate::watch::Watcher, StoreError> {
	let watcher = crate::watch::trigger_on_change(
		store.scheduler().clone(),
		STYLE_KEY,
		crate::watch::Target::Directory(dir.into()),
		config,
	)?;
	Ok(watcher)
}
