//! Browser-mode navigation.
//!
//! The URL decides the first screen. Paths go through matching, data
//! resolution, access control and the load condition before the transition
//! is committed; every committed transition is written to host history.

use std::rc::Rc;

use reinhardt_reactive::untrack;

use super::NavigationDriver;
use crate::access::check_access;
use crate::condition::{OK_TO_LOAD, OK_TO_RELOAD};
use crate::error::{ScreenError, ScreenResult};
use crate::history::HistoryEntry;
use crate::pattern::normalize_path;
use crate::router::ScreenRouter;
use crate::screen::{Screen, ScreenData, ScreenRoute};
use crate::transition::{ToScreenOptions, title_now};

pub(crate) struct BrowserDriver;

impl NavigationDriver for BrowserDriver {
	fn start(&self, router: &ScreenRouter) -> ScreenResult<()> {
		let path = router.inner.host.history.current_path();
		resolve_path(router, &path, true)
	}

	fn record(&self, router: &ScreenRouter, screen: &Rc<Screen>, options: &ToScreenOptions) {
		if !options.update_browser_history {
			return;
		}
		let inner = &router.inner;
		let data = options.screen_data.as_ref();
		let sid = inner.next_sid.get();
		inner.next_sid.set(sid + 1);

		let entry = HistoryEntry::new(sid, screen.name(), data.cloned());
		let title = title_now(screen, data).unwrap_or_default();
		let path = screen.path_for(data);
		if options.replace_history {
			inner.host.history.replace_state(&entry, &title, path.as_deref());
		} else {
			inner.host.history.push_state(&entry, &title, path.as_deref());
		}
		tracing::debug!(
			screen = screen.name(),
			sid,
			path = path.as_deref().unwrap_or("<unchanged>"),
			replace = options.replace_history,
			"recorded history entry"
		);
	}

	fn back(&self, router: &ScreenRouter) -> ScreenResult<bool> {
		Ok(router.inner.host.history.back())
	}

	fn to_home(&self, router: &ScreenRouter) -> ScreenResult<bool> {
		let home = router.home_screen();
		router.to_screen(&home, ToScreenOptions::default())
	}

	fn previous_title(&self, _router: &ScreenRouter) -> Option<String> {
		None
	}

	fn on_popstate(&self, router: &ScreenRouter, state: Option<HistoryEntry>) {
		let Some(entry) = state else {
			tracing::warn!("popstate without router state; ignoring");
			return;
		};
		tracing::debug!(screen = %entry.name, sid = entry.sid, "popstate");
		let options = ToScreenOptions::new()
			.skip_history()
			.with_screen_data(entry.screen_data);
		if let Err(err) = router.to_screen(&entry.name, options) {
			router.report(err);
		}
	}
}

/// Resolves `path` to a screen and enters it once its data, access rule
/// and load condition allow.
pub(crate) fn resolve_path(router: &ScreenRouter, path: &str, replace: bool) -> ScreenResult<()> {
	let inner = &router.inner;
	let path = normalize_path(path, inner.settings.ignore_trailing_slash);
	let Some((screen, path_match)) = inner.registry.match_path(path) else {
		tracing::debug!(path, "no screen matches path");
		let not_found = inner.settings.not_found_screen.clone();
		return load(router, &not_found, None, replace);
	};

	let resolve_data = match screen.route() {
		Some(ScreenRoute::Parameterized { resolve_data, .. }) if path_match.has_captures() => {
			Rc::clone(resolve_data)
		}
		_ => {
			tracing::debug!(path, screen = screen.name(), "path matched");
			return authorize(router, &screen, None, replace);
		}
	};

	tracing::debug!(path, screen = screen.name(), "path matched; resolving screen data");
	let weak = router.downgrade();
	let name = screen.name().to_string();
	resolve_data(
		&path_match,
		Box::new(move |result: Result<ScreenData, ScreenError>| {
			let Some(router) = weak.upgrade() else {
				return;
			};
			match result {
				Ok(data) => {
					let outcome = match router.inner.registry.get(&name) {
						Some(screen) => authorize(&router, &screen, Some(data), replace),
						None => Ok(()),
					};
					if let Err(err) = outcome {
						router.report(err);
					}
				}
				Err(err) => {
					tracing::error!(screen = %name, error = %err, "screen data resolution failed");
					router.inner.navigation_error.set(Some(err));
				}
			}
		}),
	);
	Ok(())
}

fn authorize(
	router: &ScreenRouter,
	screen: &Screen,
	data: Option<ScreenData>,
	replace: bool,
) -> ScreenResult<()> {
	let name = screen.name().to_string();
	check_access(router, screen, move |router, allowed| {
		if allowed {
			load(router, &name, data, replace)
		} else {
			tracing::debug!(screen = %name, "access denied");
			let denied = router.inner.settings.access_denied_screen.clone();
			load(router, &denied, None, replace)
		}
	})
}

/// Waits for the load (or reload) condition, then enters `name`.
fn load(router: &ScreenRouter, name: &str, data: Option<ScreenData>, replace: bool) -> ScreenResult<()> {
	let reloading = untrack(|| router.inner.host.history.state())
		.is_some_and(|entry| entry.name == name);
	let condition = if reloading { OK_TO_RELOAD } else { OK_TO_LOAD };
	tracing::debug!(screen = name, condition, "waiting to load screen");

	let weak = router.downgrade();
	let name = name.to_string();
	let options = ToScreenOptions::new()
		.with_screen_data(data)
		.replacing_history(replace);
	router.wait_for_condition(
		condition.into(),
		move || {
			if let Some(router) = weak.upgrade() {
				if let Err(err) = router.to_screen(&name, options) {
					router.report(err);
				}
			}
		},
		router.inner.settings.show_loading,
	)
}
