//! Screen transitions.
//!
//! [`ScreenRouter::to_screen`] is the only place the current screen changes.
//! Within one call the order is fixed: clear helpers and screen data, global
//! before-hook, screen before-hook, publish the new screen, record it with
//! the navigation driver. Once the renderer reports the screen as painted
//! the title is resolved and the screen and global after-hooks run.

use std::rc::Rc;

use reinhardt_reactive::{Effect, untrack};

use crate::error::{ScreenError, ScreenResult};
use crate::router::ScreenRouter;
use crate::screen::{Screen, ScreenData, ScreenTitle};

/// Options for [`ScreenRouter::to_screen`].
#[derive(Debug, Clone, PartialEq)]
pub struct ToScreenOptions {
	/// Record the transition in host history (browser mode).
	pub update_browser_history: bool,
	/// Record the transition on the navigation stack (app mode).
	pub update_nav_stack: bool,
	/// Data context for the new screen.
	pub screen_data: Option<ScreenData>,
	pub(crate) replace_history: bool,
}

impl Default for ToScreenOptions {
	fn default() -> Self {
		Self {
			update_browser_history: true,
			update_nav_stack: true,
			screen_data: None,
			replace_history: false,
		}
	}
}

impl ToScreenOptions {
	/// Records everywhere, with no screen data.
	pub fn new() -> Self {
		Self::default()
	}

	/// Enters the screen with `data`.
	pub fn with_data(mut self, data: ScreenData) -> Self {
		self.screen_data = Some(data);
		self
	}

	/// Leaves host history untouched.
	pub fn skip_history(mut self) -> Self {
		self.update_browser_history = false;
		self
	}

	/// Leaves the navigation stack untouched.
	pub fn skip_nav_stack(mut self) -> Self {
		self.update_nav_stack = false;
		self
	}

	pub(crate) fn with_screen_data(mut self, data: Option<ScreenData>) -> Self {
		self.screen_data = data;
		self
	}

	pub(crate) fn replacing_history(mut self, replace: bool) -> Self {
		self.replace_history = replace;
		self
	}
}

impl ScreenRouter {
	/// Makes `name` the current screen.
	///
	/// Returns `Ok(false)` without touching anything when `name` is already
	/// current.
	///
	/// # Errors
	///
	/// - [`ScreenError::Validation`] for an empty name
	/// - [`ScreenError::UnknownScreen`] if `name` is not registered
	pub fn to_screen(&self, name: &str, options: ToScreenOptions) -> ScreenResult<bool> {
		if name.trim().is_empty() {
			return Err(ScreenError::Validation(
				"screen name must be a non-empty string".to_string(),
			));
		}
		let inner = &self.inner;
		let screen = inner
			.registry
			.get(name)
			.ok_or_else(|| ScreenError::UnknownScreen(name.to_string()))?;
		if inner
			.current_screen
			.with_untracked(|current| current.as_deref() == Some(name))
		{
			tracing::debug!(screen = name, "already on screen");
			return Ok(false);
		}
		let transition = inner.transition.get() + 1;
		inner.transition.set(transition);

		untrack(|| {
			for helper in inner.helpers.values() {
				helper.set(None);
			}
			inner.screen_data.set(None);

			if let Some(before) = &inner.before {
				before();
			}
			if let Some(before) = &screen.before {
				before();
			}

			if let Some(data) = &options.screen_data {
				inner.screen_data.set(Some(data.clone()));
			}
			for (helper, content) in screen.content() {
				if let Some(signal) = inner.helpers.get(helper) {
					signal.set(Some(content.clone()));
				}
			}
			inner.current_screen.set(Some(name.to_string()));
		});

		tracing::debug!(
			screen = name,
			transition,
			has_data = options.screen_data.is_some(),
			"entered screen"
		);
		inner.driver.record(self, &screen, &options);

		let router = self.downgrade();
		let rendered = Rc::clone(&screen);
		inner.host.renderer.after_render(
			name,
			Box::new(move || {
				if let Some(router) = router.upgrade() {
					router.finish_transition(&rendered, transition);
				}
			}),
		);
		Ok(true)
	}

	/// Whether `transition` is still the latest committed transition.
	pub(crate) fn is_current_transition(&self, transition: u64) -> bool {
		self.inner.transition.get() == transition
	}

	fn finish_transition(&self, screen: &Rc<Screen>, transition: u64) {
		let inner = &self.inner;
		if !self.is_current_transition(transition) {
			tracing::warn!(
				screen = screen.name(),
				transition,
				"screen left before it rendered; skipping after hooks"
			);
			return;
		}

		match screen.title() {
			ScreenTitle::Static(title) => inner.host.renderer.set_title(title),
			ScreenTitle::Computed(compute) => {
				let compute = Rc::clone(compute);
				let screen_data = inner.screen_data.clone();
				let renderer = Rc::clone(&inner.host.renderer);
				let router = self.downgrade();
				Effect::new(move |computation| {
					let left = router
						.upgrade()
						.is_none_or(|router| !router.is_current_transition(transition));
					if left {
						computation.stop();
						return;
					}
					let title = screen_data.with(|data| compute(data.as_ref()));
					if let Some(title) = title {
						computation.stop();
						untrack(|| renderer.set_title(&title));
					}
				})
				.detach();
			}
		}

		untrack(|| {
			if let Some(after) = &screen.after {
				after();
			}
			if let Some(after) = &inner.after {
				after();
			}
		});
	}
}

/// The title of `screen` if it can be known right now.
pub(crate) fn title_now(screen: &Screen, data: Option<&ScreenData>) -> Option<String> {
	match screen.title() {
		ScreenTitle::Static(title) => Some(title.clone()),
		ScreenTitle::Computed(compute) => untrack(|| compute(data)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_default_options_record_everywhere() {
		let options = ToScreenOptions::default();

		assert!(options.update_browser_history);
		assert!(options.update_nav_stack);
		assert!(options.screen_data.is_none());
		assert!(!options.replace_history);
	}

	#[rstest]
	fn test_option_builders() {
		let options = ToScreenOptions::new()
			.with_data(json!({ "id": "7" }))
			.skip_history()
			.skip_nav_stack();

		assert!(!options.update_browser_history);
		assert!(!options.update_nav_stack);
		assert_eq!(options.screen_data, Some(json!({ "id": "7" })));
	}
}
