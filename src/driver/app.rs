//! App-mode navigation.
//!
//! Standalone apps have no meaningful URL, so the router keeps its own
//! navigation stack. The first screen is the home screen for the session,
//! `back` pops the stack and host popstate events are ignored.

use std::rc::Rc;

use reinhardt_reactive::{Effect, untrack};

use super::NavigationDriver;
use crate::condition::{Condition, OK_TO_LOAD};
use crate::error::{ScreenError, ScreenResult};
use crate::history::HistoryEntry;
use crate::nav_stack::ScreenState;
use crate::router::ScreenRouter;
use crate::screen::{Screen, ScreenTitle};
use crate::transition::ToScreenOptions;

pub(crate) struct AppDriver;

impl NavigationDriver for AppDriver {
	fn start(&self, router: &ScreenRouter) -> ScreenResult<()> {
		let top = router.inner.nav_stack.borrow().top().cloned();
		if let Some(top) = top {
			tracing::debug!(screen = %top.name, "re-entering restored navigation stack");
			let options = ToScreenOptions::new()
				.skip_nav_stack()
				.with_screen_data(top.screen_data);
			router.to_screen(&top.name, options)?;
			return Ok(());
		}

		let show_loading = router.inner.settings.show_loading;
		let identity = Rc::clone(&router.inner.host.identity);
		if untrack(|| identity.current_user_id().is_none()) {
			return enter_home_when_ready(router, false);
		}

		tracing::debug!("waiting for identity before entering user home");
		let weak = router.downgrade();
		router.wait_for_condition(
			Condition::predicate(move || identity.current_user().is_some()),
			move || {
				let Some(router) = weak.upgrade() else {
					return;
				};
				if let Err(err) = enter_home_when_ready(&router, true) {
					router.report(err);
				}
			},
			show_loading,
		)
	}

	fn record(&self, router: &ScreenRouter, screen: &Rc<Screen>, options: &ToScreenOptions) {
		if options.update_nav_stack {
			update_nav_stack(router, screen, options);
		}
	}

	fn back(&self, router: &ScreenRouter) -> ScreenResult<bool> {
		let Some(target) = router.inner.nav_stack.borrow().previous().cloned() else {
			return Ok(false);
		};
		if !router.inner.registry.contains(&target.name) {
			return Err(ScreenError::UnknownScreen(target.name));
		}
		router.inner.nav_stack.borrow_mut().pop();
		router.publish_nav_stack_length();

		tracing::debug!(screen = %target.name, "navigation stack popped");
		let options = ToScreenOptions::new()
			.skip_nav_stack()
			.with_screen_data(target.screen_data);
		router.to_screen(&target.name, options)
	}

	fn to_home(&self, router: &ScreenRouter) -> ScreenResult<bool> {
		let home = router.home_screen();
		router.reset_nav_stack(&home)
	}

	fn previous_title(&self, router: &ScreenRouter) -> Option<String> {
		router
			.inner
			.nav_stack
			.borrow()
			.previous()
			.and_then(|state| state.title.clone())
	}

	fn on_popstate(&self, _router: &ScreenRouter, state: Option<HistoryEntry>) {
		tracing::warn!(
			screen = state.as_ref().map(|entry| entry.name.as_str()),
			"popstate ignored in app mode"
		);
	}
}

fn enter_home_when_ready(router: &ScreenRouter, identified: bool) -> ScreenResult<()> {
	let home = router.inner.settings.home_for(identified).to_string();
	tracing::debug!(screen = %home, identified, "waiting to enter home screen");
	let weak = router.downgrade();
	router.wait_for_condition(
		OK_TO_LOAD.into(),
		move || {
			if let Some(router) = weak.upgrade() {
				if let Err(err) = router.to_screen(&home, ToScreenOptions::default()) {
					router.report(err);
				}
			}
		},
		router.inner.settings.show_loading,
	)
}

/// Pushes `screen` onto the navigation stack and republishes its length.
///
/// Computed titles are filled in once they yield a value, unless the screen
/// is left first.
pub(crate) fn update_nav_stack(router: &ScreenRouter, screen: &Rc<Screen>, options: &ToScreenOptions) {
	let data = options.screen_data.clone();
	let title = screen.title().as_static().map(str::to_string);
	let index = router
		.inner
		.nav_stack
		.borrow_mut()
		.push(ScreenState::new(screen.name(), title, data));
	router.publish_nav_stack_length();
	tracing::debug!(screen = screen.name(), depth = index + 1, "pushed navigation stack");

	let ScreenTitle::Computed(compute) = screen.title() else {
		return;
	};
	let compute = Rc::clone(compute);
	let screen_data = router.inner.screen_data.clone();
	let weak = router.downgrade();
	let name = screen.name().to_string();
	let transition = router.inner.transition.get();
	Effect::new(move |computation| {
		let Some(router) = weak.upgrade() else {
			computation.stop();
			return;
		};
		if !router.is_current_transition(transition) {
			computation.stop();
			return;
		}
		let Some(title) = screen_data.with(|data| compute(data.as_ref())) else {
			return;
		};
		computation.stop();
		router
			.inner
			.nav_stack
			.borrow_mut()
			.set_title(index, &name, title);
	})
	.detach();
}
