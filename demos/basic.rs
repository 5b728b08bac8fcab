/* demos/basic.rs */

use livecell::effects::{HyprSync, style};
use livecell::schema::{self, BAR_LAYOUT};
use livecell::signal::Derived;
use livecell::watch::WatchConfig;
use livecell::SettingsStore;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	// 0. A scratch directory standing in for ~/.config/ags/cache
	let dir = std::env::temp_dir().join("livecell-demo");
	let settings_path = dir.join("settings").join("settings.json");
	println!("Settings file: {}", settings_path.display());

	// 1. Open the store; a missing file is created from the defaults
	let store = Arc::new(
		SettingsStore::builder()
			.schema(schema::shell_defaults())
			.file(&settings_path)
			.open()
			.await?,
	);

	// 2. Derived views only recompute when their inputs change
	let layout = store.select("bar.layout")?;
	let enabled = Derived::new(move || {
		layout.with(|value| {
			value
				.as_ref()
				.and_then(|v| v.as_array())
				.map(|items| items.iter().filter(|w| w["enabled"] == true).count())
				.unwrap_or_default()
		})
	});
	let _sub = enabled.subscribe(|n| println!("Bar widgets enabled: {n}"));

	// 3. Compositor settings land in their own config directory
	let keys = HyprSync::new(dir.join("hypr")).install(&store)?;
	println!("Compositor effects: {keys:?}");
	style::install(&store, style::DEFAULT_DELAY, |vars| async move {
		print!("Stylesheet prelude:\n{}", vars.scss());
		Ok(())
	})?;

	// 4. External edits to the file are picked up
	let _watcher = store.watch_file(WatchConfig::default())?;

	// 5. Mutate
	let mut widgets = store.read(&BAR_LAYOUT)?;
	if let Some(first) = widgets.first_mut() {
		first.enabled = !first.enabled;
	}
	store.write(&BAR_LAYOUT, &widgets)?;
	store.set_ranged("hyprland.general.gaps_in", 9.0)?;
	store.set_ranged("globalOpacity", 0.75)?;

	println!("Edit {} to see reloads. Waiting 10 seconds...", settings_path.display());
	tokio::time::sleep(Duration::from_secs(10)).await;

	println!("Current opacity: {:?}", store.get("globalOpacity.value"));
	store.shutdown().await?;
	println!("Done.");
	Ok(())
}
