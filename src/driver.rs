//! Navigation drivers.
//!
//! The two navigation modes differ in where history lives. Browser mode
//! trusts the URL and the host history; app mode keeps its own stack and
//! ignores the host. The router picks one driver at startup and sends every
//! mode-specific decision through it.

use std::rc::Rc;

use crate::config::NavigationMode;
use crate::error::ScreenResult;
use crate::history::HistoryEntry;
use crate::router::ScreenRouter;
use crate::screen::Screen;
use crate::transition::ToScreenOptions;

pub(crate) mod app;
pub(crate) mod browser;

pub(crate) use app::AppDriver;
pub(crate) use browser::BrowserDriver;

/// Mode-specific navigation strategy.
pub(crate) trait NavigationDriver {
	/// Picks and enters the first screen of the session.
	fn start(&self, router: &ScreenRouter) -> ScreenResult<()>;

	/// Records a committed transition.
	fn record(&self, router: &ScreenRouter, screen: &Rc<Screen>, options: &ToScreenOptions);

	/// Goes back one step. `Ok(false)` when there is nowhere to go.
	fn back(&self, router: &ScreenRouter) -> ScreenResult<bool>;

	/// Enters the home screen for the current identity.
	fn to_home(&self, router: &ScreenRouter) -> ScreenResult<bool>;

	/// Title of the screen `back` would return to, when known.
	fn previous_title(&self, router: &ScreenRouter) -> Option<String>;

	/// Reacts to the host moving through its history.
	fn on_popstate(&self, router: &ScreenRouter, state: Option<HistoryEntry>);
}

impl NavigationMode {
	pub(crate) fn driver(self) -> Box<dyn NavigationDriver> {
		match self {
			Self::Browser => Box::new(BrowserDriver),
			Self::App => Box::new(AppDriver),
		}
	}
}
