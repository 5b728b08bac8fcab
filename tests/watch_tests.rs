/* tests/watch_tests.rs */

#![cfg(all(feature = "watch", feature = "fs"))]

use livecell::watch::{Target, WatchConfig, Watcher};
use livecell::{SettingsStore, StoreError};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

fn schema() -> Value {
	json!({ "notifications": { "dnd": false }, "bar": { "visibility": true } })
}

fn quick() -> WatchConfig {
	WatchConfig {
		debounce: Duration::from_millis(50),
		..WatchConfig::default()
	}
}

async fn eventually(mut check: impl FnMut() -> bool) -> bool {
	for _ in 0..100 {
		if check() {
			return true;
		}
		tokio::time::sleep(Duration::from_millis(50)).await;
	}
	false
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_external_edit_is_reloaded() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("settings.json");
	let store = Arc::new(
		SettingsStore::builder()
			.schema(schema())
			.file(&path)
			.open()
			.await
			.unwrap(),
	);
	let _watcher = store.watch_file(quick()).unwrap();

	std::fs::write(
		&path,
		json!({ "notifications": { "dnd": true }, "bar": { "visibility": true } }).to_string(),
	)
	.unwrap();

	let reloaded = eventually(|| store.get("notifications.dnd") == Some(json!(true))).await;
	assert!(reloaded, "external edit was not picked up");
}

#[tokio::test]
async fn test_watch_requires_a_file() {
	let store = Arc::new(SettingsStore::in_memory(schema()).unwrap());
	assert!(matches!(store.watch_file(quick()), Err(StoreError::NotPersisted)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watcher_forwards_matching_events() {
	let dir = tempfile::tempdir().unwrap();
	let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
	let sink = Arc::clone(&seen);
	let _watcher = Watcher::new(
		Target::Filtered {
			path: dir.path().to_path_buf(),
			include: vec!["*.conf".into()],
			exclude: vec![],
		},
		WatchConfig::default(),
		move |event| sink.lock().extend(event.paths),
	)
	.unwrap();

	std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
	std::fs::write(dir.path().join("general.gaps_in.conf"), "gaps_in=7\n").unwrap();

	let matched = eventually(|| {
		seen.lock()
			.iter()
			.any(|p| p.file_name().is_some_and(|n| n == "general.gaps_in.conf"))
	})
	.await;
	assert!(matched);
	assert!(seen.lock().iter().all(|p| p.extension().is_some_and(|e| e == "conf")));
}

#[test]
fn test_watcher_needs_a_runtime() {
	let dir = tempfile::tempdir().unwrap();
	let result = Watcher::new(Target::Directory(dir.path().to_path_buf()), WatchConfig::default(), |_| {});
	assert!(result.is_err());
}
