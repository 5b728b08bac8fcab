/* src/schema.rs */

//! The desktop shell's default settings document and typed keys into it.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::descriptor::Ranged;
use crate::store::Setting;

const PHI: f64 = 1.618;
const PHI_MIN: f64 = 0.618;

fn golden(factor: f64, base: f64) -> i64 {
	(factor * base).round() as i64
}

fn selector(name: &str, icon: char, enabled: bool) -> Value {
	json!({ "name": name, "icon": icon.to_string(), "enabled": enabled })
}

fn ranged(value: Value, kind: &str, min: i64, max: i64) -> Value {
	json!({ "value": value, "type": kind, "min": min, "max": max })
}

fn named(name: &str, value: Value, kind: &str, min: i64, max: i64) -> Value {
	json!({ "name": name, "value": value, "type": kind, "min": min, "max": max })
}

fn booru_api() -> Value {
	json!({
		"name": "Danbooru",
		"value": "danbooru",
		"idSearchUrl": "https://danbooru.donmai.us/posts/"
	})
}

/// The full default document of the shell.
pub fn shell_defaults() -> Value {
	json!({
		"dateFormat": "%H:%M",
		"hyprsunset": { "kelvin": 6500 },
		"hyprland": {
			"general": {
				"border_size": ranged(json!(0), "int", 0, 10),
				"gaps_in": ranged(json!(7), "int", 0, 20),
				"gaps_out": ranged(json!(10), "int", 0, 40),
			},
			"decoration": {
				"rounding": ranged(json!(golden(PHI, 10.0)), "int", 0, 50),
				"active_opacity": ranged(json!(0.9), "float", 0, 1),
				"inactive_opacity": ranged(json!(0.8), "float", 0, 1),
				"blur": {
					"enabled": ranged(json!(true), "bool", 0, 1),
					"size": ranged(json!(golden(PHI, 2.0)), "int", 0, 10),
					"passes": ranged(json!(golden(PHI, 2.0)), "int", 0, 10),
					"xray": ranged(json!(false), "bool", 0, 1),
				},
				"shadow": {
					"enabled": ranged(json!(true), "bool", 0, 1),
					"range": ranged(json!(15), "int", 0, 20),
					"render_power": ranged(json!(3), "int", 0, 20),
				},
			},
		},
		"notifications": { "dnd": false },
		"globalOpacity": named("Opacity", json!(PHI_MIN), "float", 0, 1),
		"globalScale": named("Scale", json!(golden(PHI, 6.0)), "int", 10, 30),
		"globalFontSize": named("Font Size", json!(12), "int", 10, 30),
		"autoWorkspaceSwitching": named("Auto Workspace Switching", json!(true), "bool", 0, 1),
		"bar": {
			"visibility": true,
			"lock": true,
			"orientation": named("Orientation", json!(true), "bool", 0, 1),
			"layout": [
				selector("workspaces", '\u{f0498}', true),
				selector("information", '\u{f0498}', true),
				selector("utilities", '\u{f0498}', true),
			],
		},
		"waifu": {
			"input_history": "",
			"visibility": true,
			"current": null,
			"api": booru_api(),
		},
		"rightPanel": {
			"exclusivity": true,
			"lock": true,
			"width": golden(300.0, PHI_MIN),
			"visibility": false,
			"widgets": [
				selector("Waifu", '\u{f004}', true),
				selector("Media", '\u{f04b}', true),
				selector("NotificationHistory", '\u{eb9a}', true),
				selector("ScriptTimer", '\u{f0020}', false),
				selector("Crypto", '\u{f15a}', false),
				selector("Calendar", '\u{f00f0}', true),
			],
		},
		"leftPanel": {
			"exclusivity": true,
			"lock": true,
			"width": golden(400.0, PHI),
			"visibility": false,
			"widget": selector("ChatBot", '\u{ee0d}', true),
		},
		"chatBot": {
			"api": {
				"name": "Gpt 4o mini",
				"value": "openai/gpt-4o-mini",
				"icon": "G4o",
				"description": "OpenAI's gpt-4o-mini model, versatile and efficient"
			},
			"imageGeneration": false,
		},
		"booru": {
			"api": booru_api(),
			"tags": [],
			"limit": golden(20.0, PHI_MIN),
			"page": 1,
			"columns": 3,
			"bookMarkWaifus": [],
		},
		"crypto": {
			"favorite": { "symbol": "", "timeframe": "" },
		},
	})
}

/// An entry of a widget layout list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetSelector {
	pub name: String,
	#[serde(default)]
	pub icon: String,
	pub enabled: bool,
}

/// A selectable backend such as a chat model or image board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Api {
	pub name: String,
	pub value: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub icon: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default, rename = "idSearchUrl", skip_serializing_if = "Option::is_none")]
	pub id_search_url: Option<String>,
}

pub const DATE_FORMAT: Setting<String> = Setting::new("dateFormat");
pub const HYPRSUNSET_KELVIN: Setting<u32> = Setting::new("hyprsunset.kelvin");
pub const NOTIFICATIONS_DND: Setting<bool> = Setting::new("notifications.dnd");
pub const GLOBAL_OPACITY: Setting<Ranged> = Setting::new("globalOpacity");
pub const GLOBAL_SCALE: Setting<Ranged> = Setting::new("globalScale");
pub const GLOBAL_FONT_SIZE: Setting<Ranged> = Setting::new("globalFontSize");
pub const AUTO_WORKSPACE_SWITCHING: Setting<Ranged> = Setting::new("autoWorkspaceSwitching");

pub const BAR_VISIBILITY: Setting<bool> = Setting::new("bar.visibility");
pub const BAR_LOCK: Setting<bool> = Setting::new("bar.lock");
pub const BAR_ORIENTATION: Setting<Ranged> = Setting::new("bar.orientation");
pub const BAR_LAYOUT: Setting<Vec<WidgetSelector>> = Setting::new("bar.layout");

pub const WAIFU_VISIBILITY: Setting<bool> = Setting::new("waifu.visibility");
pub const WAIFU_CURRENT: Setting<Value> = Setting::new("waifu.current");
pub const WAIFU_API: Setting<Api> = Setting::new("waifu.api");

pub const RIGHT_PANEL_VISIBILITY: Setting<bool> = Setting::new("rightPanel.visibility");
pub const RIGHT_PANEL_WIDTH: Setting<u32> = Setting::new("rightPanel.width");
pub const RIGHT_PANEL_WIDGETS: Setting<Vec<WidgetSelector>> = Setting::new("rightPanel.widgets");

pub const LEFT_PANEL_VISIBILITY: Setting<bool> = Setting::new("leftPanel.visibility");
pub const LEFT_PANEL_WIDTH: Setting<u32> = Setting::new("leftPanel.width");
pub const LEFT_PANEL_WIDGET: Setting<WidgetSelector> = Setting::new("leftPanel.widget");

pub const CHAT_BOT_API: Setting<Api> = Setting::new("chatBot.api");
pub const BOORU_TAGS: Setting<Vec<String>> = Setting::new("booru.tags");
pub const BOORU_LIMIT: Setting<u32> = Setting::new("booru.limit");
