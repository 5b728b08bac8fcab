/* src/watch/watcher.rs */

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::target::CompiledTarget;
use super::{EventKind, Result, Target, WatchConfig, WatchError, WatchEvent};

type Handler = Arc<dyn Fn(WatchEvent) + Send + Sync>;

/// Forwards filtered filesystem events to a callback until dropped.
pub struct Watcher {
	_internal_watcher: RecommendedWatcher,
	task_handle: JoinHandle<()>,
	root: PathBuf,
}

impl Watcher {
	/// Starts watching `target` on the current tokio runtime.
	#[must_use = "the watcher stops when dropped"]
	pub fn new<F>(target: Target, config: WatchConfig, on_event: F) -> Result<Self>
	where
		F: Fn(WatchEvent) + Send + Sync + 'static,
	{
		let handle = tokio::runtime::Handle::try_current()?;
		let (raw_tx, raw_rx) = mpsc::channel(100);

		let mut internal_watcher =
			notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
				let _ = raw_tx.blocking_send(res);
			})?;

		let (watch_path, mode) = match &target {
			Target::File(p) => match p.parent().filter(|parent| !parent.as_os_str().is_empty()) {
				Some(parent) => (parent.to_path_buf(), RecursiveMode::NonRecursive),
				None => (PathBuf::from("."), RecursiveMode::NonRecursive),
			},
			Target::Directory(p) | Target::Filtered { path: p, .. } => {
				(p.clone(), RecursiveMode::Recursive)
			}
		};

		if !watch_path.exists() {
			return Err(WatchError::Config(format!(
				"path does not exist: {}",
				watch_path.display()
			)));
		}

		let watch_path = watch_path.canonicalize()?;
		let compiled_target = CompiledTarget::new(&target)?;
		internal_watcher.watch(&watch_path, mode)?;

		let root = watch_path.clone();
		let on_event: Handler = Arc::new(on_event);
		let task_handle = handle.spawn(async move {
			forward(raw_rx, compiled_target, config, watch_path, on_event).await;
		});

		Ok(Self {
			_internal_watcher: internal_watcher,
			task_handle,
			root,
		})
	}

	/// The directory handed to the OS watcher.
	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn stop(&self) {
		self.task_handle.abort();
	}
}

impl Drop for Watcher {
	fn drop(&mut self) {
		self.task_handle.abort();
	}
}

impl std::fmt::Debug for Watcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Watcher")
			.field("root", &self.root)
			.field("running", &!self.task_handle.is_finished())
			.finish()
	}
}

async fn forward(
	mut raw_rx: mpsc::Receiver<notify::Result<notify::Event>>,
	target: CompiledTarget,
	config: WatchConfig,
	root: PathBuf,
	on_event: Handler,
) {
	while let Some(res) = raw_rx.recv().await {
		match res {
			Ok(event) => {
				if let Some(event) = classify(event, &target, &config, &root) {
					on_event(event);
				}
			}
			Err(error) => tracing::error!(%error, "notify error"),
		}
	}
}

fn classify(
	event: notify::Event,
	target: &CompiledTarget,
	config: &WatchConfig,
	root: &Path,
) -> Option<WatchEvent> {
	use notify::EventKind as NK;
	let kind = match event.kind {
		NK::Create(_) => EventKind::Create,
		NK::Modify(_) => EventKind::Modify,
		NK::Remove(_) => EventKind::Remove,
		_ => return None,
	};

	if let Some(list) = &config.listen_events
		&& !list.contains(&kind)
	{
		return None;
	}

	let paths: Vec<PathBuf> = event
		.paths
		.into_iter()
		.filter(|path| target.matches(path, config, root))
		.collect();

	(!paths.is_empty()).then_some(WatchEvent { paths, kind })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rename_into_place_counts_as_a_change_of_the_target() {
		let target = CompiledTarget::new(&Target::File(PathBuf::from("/cfg/settings.json"))).unwrap();
		let event = notify::Event::new(notify::EventKind::Modify(notify::event::ModifyKind::Name(
			notify::event::RenameMode::Both,
		)))
		.add_path(PathBuf::from("/cfg/settings.json.7.0.tmp"))
		.add_path(PathBuf::from("/cfg/settings.json"));

		let classified = classify(event, &target, &WatchConfig::default(), Path::new("/cfg")).unwrap();
		assert_eq!(classified.kind, EventKind::Modify);
		assert_eq!(classified.paths, vec![PathBuf::from("/cfg/settings.json")]);
	}

	#[test]
	fn unlisted_kinds_are_dropped() {
		let target = CompiledTarget::Directory;
		let config = WatchConfig {
			listen_events: Some(vec![EventKind::Modify]),
			..WatchConfig::default()
		};
		let event = notify::Event::new(notify::EventKind::Remove(notify::event::RemoveKind::File))
			.add_path(PathBuf::from("/cfg/a"));
		assert!(classify(event, &target, &config, Path::new("/cfg")).is_none());
	}
}
