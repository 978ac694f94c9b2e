//! Access control.
//!
//! Decides whether a requested screen may be shown. A computed rule is only
//! evaluated once the identity it may depend on has loaded: for identified
//! sessions that means waiting until the user record is available.

use std::rc::Rc;

use reinhardt_reactive::untrack;

use crate::condition::Condition;
use crate::error::ScreenResult;
use crate::router::ScreenRouter;
use crate::screen::{AccessRule, Screen};

/// Resolves the access rule of `screen` and calls `on_decided` exactly once
/// with the verdict.
pub(crate) fn check_access<F>(router: &ScreenRouter, screen: &Screen, on_decided: F) -> ScreenResult<()>
where
	F: FnOnce(&ScreenRouter, bool) -> ScreenResult<()> + 'static,
{
	let rule = match screen.access() {
		AccessRule::Static(allowed) => return on_decided(router, *allowed),
		AccessRule::Computed(rule) => Rc::clone(rule),
	};

	let identity = Rc::clone(&router.inner.host.identity);
	if untrack(|| identity.current_user_id().is_none()) {
		let allowed = untrack(|| rule());
		tracing::debug!(screen = screen.name(), allowed, "access decided for anonymous session");
		return on_decided(router, allowed);
	}

	let weak = router.downgrade();
	let name = screen.name().to_string();
	router.wait_for_condition(
		Condition::predicate(move || identity.current_user().is_some()),
		move || {
			let Some(router) = weak.upgrade() else {
				return;
			};
			let allowed = rule();
			tracing::debug!(screen = %name, allowed, "access decided once identity loaded");
			if let Err(err) = on_decided(&router, allowed) {
				router.report(err);
			}
		},
		router.inner.settings.show_loading,
	)
}
