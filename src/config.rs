//! Router configuration.
//!
//! [`ScreensSettings`] is plain data and can be loaded from TOML or JSON.
//! [`ScreensConfig`] wraps it together with the parts that can only be given
//! in code: global hooks and the condition table.
//!
//! ```toml
//! mode = "app"
//! home_screen = "Welcome"
//! user_home_screen = "Dashboard"
//! loading_template = "spinner"
//! ```

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::condition::ConditionTable;
use crate::error::ScreenError;
use crate::screen::Hook;

/// How navigation is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationMode {
	/// The URL bar and host history are the source of truth.
	#[default]
	Browser,
	/// An in-memory navigation stack, for standalone installed apps.
	App,
}

impl NavigationMode {
	/// Picks the mode from the host's "running standalone" flag.
	pub fn from_standalone(standalone: bool) -> Self {
		if standalone { Self::App } else { Self::Browser }
	}
}

impl fmt::Display for NavigationMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Browser => f.write_str("browser"),
			Self::App => f.write_str("app"),
		}
	}
}

/// Serializable router settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreensSettings {
	/// Navigation mode.
	pub mode: NavigationMode,
	/// Screen shown to anonymous sessions by `to_home`.
	pub home_screen: String,
	/// Screen shown to identified sessions by `to_home`. Falls back to
	/// `home_screen`.
	pub user_home_screen: Option<String>,
	/// Screen shown for unmatched paths.
	pub not_found_screen: String,
	/// Content rendered by the built-in "not found" screen.
	pub not_found_template: String,
	/// Screen shown when access is denied.
	pub access_denied_screen: String,
	/// Content rendered by the built-in "access denied" screen.
	pub access_denied_template: String,
	/// Helper that receives built-in and loading content.
	pub main_helper: String,
	/// Content put in the main helper while a condition is pending.
	pub loading_template: Option<String>,
	/// Treat `/about/` like `/about`.
	pub ignore_trailing_slash: bool,
	/// Whether condition waits started by the drivers show loading state.
	pub show_loading: bool,
}

impl Default for ScreensSettings {
	fn default() -> Self {
		Self {
			mode: NavigationMode::default(),
			home_screen: "Home".to_string(),
			user_home_screen: None,
			not_found_screen: "Not Found".to_string(),
			not_found_template: "notFound".to_string(),
			access_denied_screen: "Access Denied".to_string(),
			access_denied_template: "accessDenied".to_string(),
			main_helper: "main".to_string(),
			loading_template: None,
			ignore_trailing_slash: true,
			show_loading: true,
		}
	}
}

impl ScreensSettings {
	/// Parses settings from TOML. Missing keys take their defaults.
	pub fn from_toml_str(input: &str) -> Result<Self, ScreenError> {
		toml::from_str(input).map_err(|e| ScreenError::Validation(format!("settings: {}", e)))
	}

	/// Parses settings from JSON. Missing keys take their defaults.
	pub fn from_json_str(input: &str) -> Result<Self, ScreenError> {
		serde_json::from_str(input).map_err(|e| ScreenError::Validation(format!("settings: {}", e)))
	}

	/// The home screen for an identified or anonymous session.
	pub fn home_for(&self, identified: bool) -> &str {
		match (&self.user_home_screen, identified) {
			(Some(user_home), true) => user_home,
			_ => &self.home_screen,
		}
	}
}

/// Everything [`Screens::run`](crate::Screens::run) needs besides the host.
#[derive(Clone, Default)]
pub struct ScreensConfig {
	/// Serializable settings.
	pub settings: ScreensSettings,
	/// Runs before every screen's own before-hook.
	pub before: Option<Hook>,
	/// Runs after every screen's own after-hook.
	pub after: Option<Hook>,
	/// Named conditions.
	pub conditions: ConditionTable,
}

impl ScreensConfig {
	/// Wraps `settings` with no hooks and the default condition table.
	pub fn new(settings: ScreensSettings) -> Self {
		Self {
			settings,
			..Self::default()
		}
	}

	/// Sets the global before-hook.
	pub fn before<F>(mut self, f: F) -> Self
	where
		F: Fn() + 'static,
	{
		self.before = Some(Rc::new(f));
		self
	}

	/// Sets the global after-hook.
	pub fn after<F>(mut self, f: F) -> Self
	where
		F: Fn() + 'static,
	{
		self.after = Some(Rc::new(f));
		self
	}

	/// Replaces the condition table.
	pub fn conditions(mut self, conditions: ConditionTable) -> Self {
		self.conditions = conditions;
		self
	}
}

impl fmt::Debug for ScreensConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ScreensConfig")
			.field("settings", &self.settings)
			.field("has_before", &self.before.is_some())
			.field("has_after", &self.after.is_some())
			.field("conditions", &self.conditions)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_defaults() {
		let settings = ScreensSettings::default();

		assert_eq!(settings.mode, NavigationMode::Browser);
		assert_eq!(settings.home_screen, "Home");
		assert_eq!(settings.not_found_screen, "Not Found");
		assert_eq!(settings.access_denied_screen, "Access Denied");
		assert_eq!(settings.main_helper, "main");
		assert!(settings.ignore_trailing_slash);
		assert!(settings.show_loading);
	}

	#[rstest]
	fn test_from_toml_fills_missing_keys() {
		let settings = ScreensSettings::from_toml_str(
			r#"
			mode = "app"
			user_home_screen = "Dashboard"
			ignore_trailing_slash = false
			"#,
		)
		.unwrap();

		assert_eq!(settings.mode, NavigationMode::App);
		assert_eq!(settings.user_home_screen.as_deref(), Some("Dashboard"));
		assert!(!settings.ignore_trailing_slash);
		assert_eq!(settings.home_screen, "Home");
	}

	#[rstest]
	fn test_from_json() {
		let settings =
			ScreensSettings::from_json_str(r#"{ "home_screen": "Welcome", "loading_template": "spinner" }"#)
				.unwrap();

		assert_eq!(settings.home_screen, "Welcome");
		assert_eq!(settings.loading_template.as_deref(), Some("spinner"));
	}

	#[rstest]
	fn test_invalid_mode_rejected() {
		let result = ScreensSettings::from_toml_str(r#"mode = "kiosk""#);

		assert!(matches!(result, Err(ScreenError::Validation(_))));
	}

	#[rstest]
	#[case(true, NavigationMode::App)]
	#[case(false, NavigationMode::Browser)]
	fn test_mode_from_standalone(#[case] standalone: bool, #[case] expected: NavigationMode) {
		assert_eq!(NavigationMode::from_standalone(standalone), expected);
	}

	#[rstest]
	#[case(None, true, "Home")]
	#[case(Some("Dashboard"), true, "Dashboard")]
	#[case(Some("Dashboard"), false, "Home")]
	fn test_home_for(#[case] user_home: Option<&str>, #[case] identified: bool, #[case] expected: &str) {
		let settings = ScreensSettings {
			user_home_screen: user_home.map(str::to_string),
			..ScreensSettings::default()
		};

		assert_eq!(settings.home_for(identified), expected);
	}
}
