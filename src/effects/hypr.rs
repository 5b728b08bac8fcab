/* src/effects/hypr.rs */

//! Hyprland compositor settings: every descriptor under `hyprland.<section>`
//! becomes a small config file and a live `hyprctl keyword` call.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;

use serde_json::Value;

use super::{CommandRunner, EffectError};
use crate::store::{SettingsStore, StoreError};

/// Settings subtree holding the compositor options.
pub const ROOT: &str = "hyprland";

pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

/// Scheduler key of the effect applying `section`.
pub fn trigger_key(section: &str) -> String {
	format!("hypr-config:{section}")
}

/// `["decoration", "blur", "size"]` becomes `decoration:blur:size`.
pub fn keyword(keys: &[String]) -> String {
	keys.join(":")
}

/// Renders `keys` as nested config blocks around `leaf=value`.
pub fn config_snippet(keys: &[String], value: &str) -> String {
	match keys {
		[] => String::new(),
		[leaf] => format!("{leaf}={value}"),
		[head, rest @ ..] => {
			let nested = config_snippet(rest, value).replace('\n', "\n\t");
			format!("{head} {{\n\t{nested}\n}}")
		}
	}
}

/// `<parent>.<leaf>.conf`, or `<leaf>.conf` for a single key.
pub fn config_file_name(keys: &[String]) -> String {
	match keys {
		[.., parent, leaf] => format!("{parent}.{leaf}.conf"),
		[leaf] => format!("{leaf}.conf"),
		[] => String::from(".conf"),
	}
}

pub fn render_value(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

/// One compositor option with its path under [`ROOT`].
#[derive(Debug, Clone, PartialEq)]
pub struct HyprSetting {
	pub keys: Vec<String>,
	pub value: Value,
}

impl HyprSetting {
	pub fn keyword(&self) -> String {
		keyword(&self.keys)
	}

	pub fn snippet(&self) -> String {
		config_snippet(&self.keys, &render_value(&self.value))
	}

	pub fn file_name(&self) -> String {
		config_file_name(&self.keys)
	}
}

/// Flattens the subtree of `section` into its options. Objects carrying a
/// `type` key are descriptors and contribute their `value`; plain scalars
/// are taken as they are.
pub fn collect(section: &str, value: &Value) -> Vec<HyprSetting> {
	let mut out = Vec::new();
	walk(&mut vec![section.to_string()], value, &mut out);
	out
}

fn walk(keys: &mut Vec<String>, value: &Value, out: &mut Vec<HyprSetting>) {
	match value {
		Value::Object(map) if map.contains_key("type") => out.push(HyprSetting {
			keys: keys.clone(),
			value: map.get("value").cloned().unwrap_or(Value::Null),
		}),
		Value::Object(map) => {
			for (key, child) in map {
				keys.push(key.clone());
				walk(keys, child, out);
				keys.pop();
			}
		}
		Value::Null | Value::Array(_) => {}
		scalar => out.push(HyprSetting {
			keys: keys.clone(),
			value: scalar.clone(),
		}),
	}
}

/// Writes compositor options to a config directory and, with a runner,
/// applies them to the running compositor.
#[derive(Clone)]
pub struct HyprSync {
	dir: PathBuf,
	runner: Option<Arc<dyn CommandRunner>>,
	delay: Duration,
}

impl std::fmt::Debug for HyprSync {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HyprSync")
			.field("dir", &self.dir)
			.field("live", &self.runner.is_some())
			.field("delay", &self.delay)
			.finish()
	}
}

impl HyprSync {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self {
			dir: dir.into(),
			runner: None,
			delay: DEFAULT_DELAY,
		}
	}

	/// Also runs `hyprctl keyword` for every applied option.
	pub fn runner(mut self, runner: impl CommandRunner + 'static) -> Self {
		self.runner = Some(Arc::new(runner));
		self
	}

	/// Coalescing window between a change and the write.
	pub fn delay(mut self, delay: Duration) -> Self {
		self.delay = delay;
		self
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	/// Applies every option of `section`. Returns how many were written.
	pub async fn apply(&self, section: &str, value: &Value) -> Result<usize, EffectError> {
		let settings = collect(section, value);
		if settings.is_empty() {
			return Ok(0);
		}
		tokio::fs::create_dir_all(&self.dir).await?;

		for setting in &settings {
			let mut contents = setting.snippet();
			contents.push('\n');
			tokio::fs::write(self.dir.join(setting.file_name()), contents).await?;

			if let Some(runner) = &self.runner {
				let args = vec![
					String::from("keyword"),
					setting.keyword(),
					render_value(&setting.value),
				];
				runner.run("hyprctl", &args).await?;
			}
		}

		tracing::debug!(section, count = settings.len(), dir = %self.dir.display(), "compositor settings applied");
		Ok(settings.len())
	}

	/// Registers one effect per section under [`ROOT`] in the store's schema
	/// and triggers it whenever that section changes. Returns the keys.
	pub fn install(self, store: &Arc<SettingsStore>) -> Result<Vec<String>, StoreError> {
		let sections: Vec<String> = match store.schema().get(ROOT) {
			Some(Value::Object(map)) => map.keys().cloned().collect(),
			_ => Vec::new(),
		};
		let sync = Arc::new(self);
		let mut keys = Vec::with_capacity(sections.len());

		for section in sections {
			let key = trigger_key(&section);
			let path = format!("{ROOT}.{section}");
			let weak: Weak<SettingsStore> = Arc::downgrade(store);
			let sync = Arc::clone(&sync);
			let effect_path = path.clone();

			store.register_effect(key.clone(), sync.delay, move || {
				let value = weak.upgrade().and_then(|store| store.get(&effect_path));
				let sync = Arc::clone(&sync);
				let section = section.clone();
				async move {
					match value {
						Some(value) => sync.apply(&section, &value).await.map(|_| ()),
						None => Ok(()),
					}
				}
			});
			store.on_change(&path, key.clone())?;
			keys.push(key);
		}
		Ok(keys)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn keys(parts: &[&str]) -> Vec<String> {
		parts.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn snippet_nests_blocks() {
		assert_eq!(config_snippet(&keys(&["gaps_in"]), "7"), "gaps_in=7");
		assert_eq!(
			config_snippet(&keys(&["decoration", "blur", "size"]), "3"),
			"decoration {\n\tblur {\n\t\tsize=3\n\t}\n}"
		);
	}

	#[test]
	fn file_name_uses_last_two_keys() {
		assert_eq!(
			config_file_name(&keys(&["decoration", "blur", "size"])),
			"blur.size.conf"
		);
		assert_eq!(config_file_name(&keys(&["general", "gaps_in"])), "general.gaps_in.conf");
	}

	#[test]
	fn collect_walks_descriptors() {
		let section = json!({
			"rounding": { "value": 16, "type": "int", "min": 0, "max": 50 },
			"blur": {
				"enabled": { "value": true, "type": "bool", "min": 0, "max": 1 }
			}
		});
		let settings = collect("decoration", &section);
		assert_eq!(settings.len(), 2);
		assert_eq!(settings[0].keyword(), "decoration:rounding");
		assert_eq!(settings[0].value, json!(16));
		assert_eq!(settings[1].keyword(), "decoration:blur:enabled");
		assert_eq!(render_value(&settings[1].value), "true");
	}

	#[tokio::test]
	async fn apply_writes_one_file_per_option() {
		let dir = tempfile::tempdir().unwrap();
		let sync = HyprSync::new(dir.path());
		let section = json!({ "gaps_in": { "value": 7, "type": "int", "min": 0, "max": 20 } });

		let written = sync.apply("general", &section).await.unwrap();
		assert_eq!(written, 1);
		let contents = std::fs::read_to_string(dir.path().join("general.gaps_in.conf")).unwrap();
		assert_eq!(contents, "general {\n\tgaps_in=7\n}\n");
	}
}
