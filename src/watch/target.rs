/* src/watch/target.rs */

use std::path::{Path, PathBuf};

use super::{Result, Target, WatchConfig};

#[derive(Debug)]
pub(crate) enum CompiledTarget {
	/// File name relative to the watched parent directory.
	File(PathBuf),
	Directory,
	Filtered {
		include: Option<globset::GlobSet>,
		exclude: globset::GlobSet,
	},
}

impl CompiledTarget {
	pub(crate) fn new(target: &Target) -> Result<Self> {
		match target {
			Target::File(p) => Ok(CompiledTarget::File(
				p.file_name().map(PathBuf::from).unwrap_or_else(|| p.clone()),
			)),
			Target::Directory(_) => Ok(CompiledTarget::Directory),
			Target::Filtered { include, exclude, .. } => {
				let include = if include.is_empty() {
					None
				} else {
					Some(build_set(include)?)
				};
				Ok(CompiledTarget::Filtered {
					include,
					exclude: build_set(exclude)?,
				})
			}
		}
	}

	pub(crate) fn matches(&self, path: &Path, config: &WatchConfig, root: &Path) -> bool {
		let relative_path = path.strip_prefix(root).unwrap_or(path);

		if config.ignore_hidden
			&& relative_path.components().any(|component| {
				component
					.as_os_str()
					.to_str()
					.is_some_and(|s| s.starts_with('.') && s != "." && s != "..")
			}) {
			return false;
		}

		match self {
			CompiledTarget::File(name) => relative_path == name,
			CompiledTarget::Directory => true,
			CompiledTarget::Filtered { include, exclude } => {
				if exclude.is_match(relative_path) {
					return false;
				}
				include.as_ref().is_none_or(|set| set.is_match(relative_path))
			}
		}
	}
}

fn build_set(patterns: &[String]) -> Result<globset::GlobSet> {
	let mut builder = globset::GlobSetBuilder::new();
	for pattern in patterns {
		builder.add(globset::Glob::new(pattern)?);
	}
	Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn file_target_ignores_siblings_and_temp_files() {
		let target = CompiledTarget::new(&Target::File(PathBuf::from("/cfg/settings.json"))).unwrap();
		let config = WatchConfig::default();
		let root = Path::new("/cfg");
		assert!(target.matches(Path::new("/cfg/settings.json"), &config, root));
		assert!(!target.matches(Path::new("/cfg/settings.json.41.0.tmp"), &config, root));
		assert!(!target.matches(Path::new("/cfg/other.json"), &config, root));
	}

	#[test]
	fn filtered_target_applies_globs_and_hidden_rule() {
		let target = CompiledTarget::new(&Target::Filtered {
			path: PathBuf::from("/cfg"),
			include: vec!["*.conf".into()],
			exclude: vec!["tmp/**".into()],
		})
		.unwrap();
		let config = WatchConfig::default();
		let root = Path::new("/cfg");
		assert!(target.matches(Path::new("/cfg/general.gaps_in.conf"), &config, root));
		assert!(!target.matches(Path::new("/cfg/tmp/a.conf"), &config, root));
		assert!(!target.matches(Path::new("/cfg/.hidden.conf"), &config, root));
		assert!(!target.matches(Path::new("/cfg/notes.txt"), &config, root));
	}
}
