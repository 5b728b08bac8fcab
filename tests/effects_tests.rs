/* tests/effects_tests.rs */

use async_trait::async_trait;
use livecell::effects::hypr::{self, HyprSync};
use livecell::effects::style::{self, StyleVariables};
use livecell::effects::{CommandRunner, EffectError};
use livecell::schema::shell_defaults;
use livecell::SettingsStore;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Default)]
struct Recorder {
	calls: Arc<Mutex<Vec<String>>>,
	fail: bool,
}

#[async_trait]
impl CommandRunner for Recorder {
	async fn run(&self, program: &str, args: &[String]) -> Result<String, EffectError> {
		self.calls.lock().push(format!("{program} {}", args.join(" ")));
		if self.fail {
			return Err(EffectError::Command {
				program: program.to_string(),
				status: "exit status: 1".into(),
				stderr: "compositor not running".into(),
			});
		}
		Ok(String::from("ok"))
	}
}

#[tokio::test(start_paused = true)]
async fn test_section_change_rewrites_config_and_applies_keywords() {
	let dir = tempfile::tempdir().unwrap();
	let recorder = Recorder::default();
	let store = Arc::new(SettingsStore::in_memory(shell_defaults()).unwrap());

	let keys = HyprSync::new(dir.path())
		.runner(recorder.clone())
		.install(&store)
		.unwrap();
	assert_eq!(keys, vec![hypr::trigger_key("general"), hypr::trigger_key("decoration")]);

	store.set_ranged("hyprland.general.gaps_in", 12.4).unwrap();
	store.set_ranged("hyprland.general.gaps_out", 15.0).unwrap();
	tokio::time::sleep(Duration::from_millis(20)).await;
	assert!(recorder.calls.lock().is_empty());

	store.scheduler().idle().await;

	let gaps = std::fs::read_to_string(dir.path().join("general.gaps_in.conf")).unwrap();
	assert_eq!(gaps, "general {\n\tgaps_in=12\n}\n");

	let calls = recorder.calls.lock().clone();
	assert_eq!(calls.len(), 3);
	assert!(calls.contains(&"hyprctl keyword general:gaps_in 12".to_string()));
	assert!(calls.contains(&"hyprctl keyword general:gaps_out 15".to_string()));
	assert!(!dir.path().join("decoration.rounding.conf").exists());
}

#[tokio::test(start_paused = true)]
async fn test_nested_descriptor_uses_nested_blocks() {
	let dir = tempfile::tempdir().unwrap();
	let store = Arc::new(SettingsStore::in_memory(shell_defaults()).unwrap());
	HyprSync::new(dir.path()).install(&store).unwrap();

	store.set_ranged("hyprland.decoration.blur.enabled", 0.0).unwrap();
	store.scheduler().idle().await;

	let blur = std::fs::read_to_string(dir.path().join("blur.enabled.conf")).unwrap();
	assert_eq!(blur, "decoration {\n\tblur {\n\t\tenabled=false\n\t}\n}\n");
	let opacity = std::fs::read_to_string(dir.path().join("decoration.active_opacity.conf")).unwrap();
	assert_eq!(opacity, "decoration {\n\tactive_opacity=0.9\n}\n");
}

#[tokio::test]
async fn test_failed_command_is_surfaced_through_the_notifier() {
	let dir = tempfile::tempdir().unwrap();
	let notes = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&notes);
	let store = Arc::new(
		SettingsStore::builder()
			.schema(shell_defaults())
			.notifier(move |summary: &str, body: &str| {
				sink.lock().push(format!("{summary}: {body}"))
			})
			.build()
			.unwrap(),
	);
	HyprSync::new(dir.path())
		.runner(Recorder {
			fail: true,
			..Recorder::default()
		})
		.delay(Duration::ZERO)
		.install(&store)
		.unwrap();

	store.set_ranged("hyprland.general.border_size", 2.0).unwrap();
	store.scheduler().idle().await;

	let notes = notes.lock().clone();
	assert_eq!(notes.len(), 1);
	assert!(notes[0].starts_with("Error while running hypr-config:general"));
	assert!(notes[0].contains("compositor not running"));
	assert_eq!(store.get("hyprland.general.border_size.value"), Some(serde_json::json!(2)));
}

#[tokio::test]
async fn test_effects_stop_once_the_store_is_gone() {
	let dir = tempfile::tempdir().unwrap();
	let recorder = Recorder::default();
	let store = Arc::new(SettingsStore::in_memory(shell_defaults()).unwrap());
	HyprSync::new(dir.path())
		.runner(recorder.clone())
		.delay(Duration::ZERO)
		.install(&store)
		.unwrap();

	let scheduler = store.scheduler().clone();
	store.set_ranged("hyprland.general.gaps_in", 3.0).unwrap();
	drop(store);
	scheduler.idle().await;

	assert!(recorder.calls.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_appearance_burst_rebuilds_the_stylesheet_once() {
	let store = Arc::new(SettingsStore::in_memory(shell_defaults()).unwrap());
	let runs: Arc<Mutex<Vec<StyleVariables>>> = Arc::new(Mutex::new(Vec::new()));
	{
		let runs = Arc::clone(&runs);
		style::install(&store, Duration::from_millis(100), move |vars| {
			let runs = Arc::clone(&runs);
			async move {
				runs.lock().push(vars);
				Ok(())
			}
		})
		.unwrap();
	}

	store.set_ranged("globalOpacity", 0.5).unwrap();
	store.set_ranged("globalFontSize", 14.0).unwrap();
	store.set_ranged("globalScale", 12.0).unwrap();
	store.set("bar.visibility", false).unwrap();
	store.scheduler().idle().await;

	let runs = runs.lock().clone();
	assert_eq!(runs.len(), 1);
	assert_eq!(runs[0].scss(), "$OPACITY: 0.5;\n$FONT-SIZE: 14px;\n$SCALE: 12px;\n");
}

#[tokio::test(start_paused = true)]
async fn test_unrelated_change_leaves_the_stylesheet_alone() {
	let store = Arc::new(SettingsStore::in_memory(shell_defaults()).unwrap());
	let runs = Arc::new(std::sync::atomic::AtomicUsize::new(0));
	{
		let runs = Arc::clone(&runs);
		style::install(&store, Duration::from_millis(100), move |_| {
			runs.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
			async { Ok(()) }
		})
		.unwrap();
	}

	store.set("notifications.dnd", true).unwrap();
	store.scheduler().idle().await;
	assert_eq!(runs.load(std::sync::atomic::Ordering::SeqCst), 0);
	assert!(!store.scheduler().is_pending(style::STYLE_KEY));
}
