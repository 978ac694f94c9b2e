//! Router facade.
//!
//! [`Screens`] collects screen definitions. [`Screens::run`] freezes them,
//! wires the host and returns a [`ScreenRouter`], the handle used to
//! navigate and to observe navigation state.
//!
//! ```ignore
//! let mut screens = Screens::new();
//! screens.register_screen("Home", ScreenSpec::new().content("main", "home").title("Home").path("/"))?;
//! let router = screens.run(ScreensConfig::default(), Host::memory())?;
//! router.to_screen("Home", ToScreenOptions::default())?;
//! ```

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use reinhardt_reactive::{Signal, untrack};

use crate::condition::{Condition, ConditionWaiter, LoadingSlot};
use crate::config::{NavigationMode, ScreensConfig, ScreensSettings};
use crate::driver::{NavigationDriver, app, browser};
use crate::error::{ScreenError, ScreenResult};
use crate::history::HistoryEntry;
use crate::host::Host;
use crate::nav_stack::NavStack;
use crate::registry::ScreenRegistry;
use crate::screen::{Hook, Screen, ScreenData, ScreenSpec};
use crate::transition::ToScreenOptions;

/// Screen definitions, before the router starts.
#[derive(Debug, Default)]
pub struct Screens {
	registry: ScreenRegistry,
	nav_stack: NavStack,
}

impl Screens {
	/// No screens registered.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a screen. See [`ScreenRegistry::register`] for the rules.
	pub fn register_screen(&mut self, name: &str, spec: ScreenSpec) -> ScreenResult<()> {
		self.registry.register(name, spec)
	}

	/// Looks a registered screen up.
	pub fn get_screen(&self, name: &str) -> Option<Rc<Screen>> {
		self.registry.get(name)
	}

	/// Restores a navigation stack saved before a live reload. App mode
	/// re-enters its top entry instead of the home screen.
	pub fn restore_nav_stack(&mut self, stack: NavStack) {
		self.nav_stack = stack;
	}

	/// Starts routing against `host`.
	///
	/// Registers the built-in "not found" and "access denied" screens when
	/// the application did not, then lets the navigation driver enter the
	/// first screen.
	pub fn run(mut self, config: ScreensConfig, host: Host) -> ScreenResult<ScreenRouter> {
		let ScreensConfig {
			settings,
			before,
			after,
			conditions,
		} = config;

		for (name, template) in [
			(&settings.not_found_screen, &settings.not_found_template),
			(&settings.access_denied_screen, &settings.access_denied_template),
		] {
			if !self.registry.contains(name) {
				self.registry.register(
					name,
					ScreenSpec::new()
						.content(settings.main_helper.clone(), template.clone())
						.title(name.clone()),
				)?;
			}
		}

		let mut helpers: BTreeMap<String, Signal<Option<String>>> = self
			.registry
			.helpers()
			.map(|helper| (helper.to_string(), Signal::new(None)))
			.collect();
		let main = helpers
			.entry(settings.main_helper.clone())
			.or_insert_with(|| Signal::new(None))
			.clone();

		let is_loading = Signal::new(false);
		let loading = settings.loading_template.clone().map(|template| LoadingSlot {
			helper: main,
			template,
		});
		let waiter = ConditionWaiter::new(conditions, is_loading.clone(), loading);
		let next_sid = host.history.state().map_or(1, |entry| entry.sid + 1);
		let mode = settings.mode;

		let router = ScreenRouter {
			inner: Rc::new(RouterInner {
				nav_stack_length: Signal::new(self.nav_stack.len()),
				nav_stack: RefCell::new(self.nav_stack),
				registry: self.registry,
				settings,
				before,
				after,
				waiter,
				host,
				current_screen: Signal::new(None),
				screen_data: Signal::new(None),
				is_loading,
				navigation_error: Signal::new(None),
				helpers,
				next_sid: Cell::new(next_sid),
				transition: Cell::new(0),
				driver: mode.driver(),
			}),
		};

		let weak = router.downgrade();
		router.inner.host.history.listen(Rc::new(move |state: Option<HistoryEntry>| {
			if let Some(router) = weak.upgrade() {
				router.handle_popstate(state);
			}
		}));

		tracing::info!(
			%mode,
			screens = router.inner.registry.len(),
			routes = router.inner.registry.routes().len(),
			"screen router started"
		);
		router.inner.driver.start(&router)?;
		Ok(router)
	}
}

pub(crate) struct RouterInner {
	pub(crate) registry: ScreenRegistry,
	pub(crate) settings: ScreensSettings,
	pub(crate) before: Option<Hook>,
	pub(crate) after: Option<Hook>,
	pub(crate) waiter: ConditionWaiter,
	pub(crate) host: Host,
	pub(crate) current_screen: Signal<Option<String>>,
	pub(crate) screen_data: Signal<Option<ScreenData>>,
	pub(crate) is_loading: Signal<bool>,
	pub(crate) nav_stack_length: Signal<usize>,
	pub(crate) navigation_error: Signal<Option<ScreenError>>,
	pub(crate) helpers: BTreeMap<String, Signal<Option<String>>>,
	pub(crate) nav_stack: RefCell<NavStack>,
	pub(crate) next_sid: Cell<u64>,
	/// Bumped by every committed transition.
	pub(crate) transition: Cell<u64>,
	pub(crate) driver: Box<dyn NavigationDriver>,
}

/// A running router.
///
/// Cheap to clone; every clone drives the same router. Callbacks handed to
/// the host hold weak references, so dropping the last handle stops
/// navigation.
#[derive(Clone)]
pub struct ScreenRouter {
	pub(crate) inner: Rc<RouterInner>,
}

#[derive(Clone)]
pub(crate) struct WeakRouter(Weak<RouterInner>);

impl WeakRouter {
	pub(crate) fn upgrade(&self) -> Option<ScreenRouter> {
		self.0.upgrade().map(|inner| ScreenRouter { inner })
	}
}

impl ScreenRouter {
	pub(crate) fn downgrade(&self) -> WeakRouter {
		WeakRouter(Rc::downgrade(&self.inner))
	}

	/// Name of the active screen.
	pub fn current_screen(&self) -> Signal<Option<String>> {
		self.inner.current_screen.clone()
	}

	/// Data context of the active screen.
	pub fn screen_data(&self) -> Signal<Option<ScreenData>> {
		self.inner.screen_data.clone()
	}

	/// Whether a condition wait with loading state is pending.
	pub fn is_loading(&self) -> Signal<bool> {
		self.inner.is_loading.clone()
	}

	/// Depth of the navigation stack.
	pub fn nav_stack_length(&self) -> Signal<usize> {
		self.inner.nav_stack_length.clone()
	}

	/// Last asynchronous navigation failure.
	pub fn navigation_error(&self) -> Signal<Option<ScreenError>> {
		self.inner.navigation_error.clone()
	}

	/// Content currently assigned to `helper`, if any screen uses it.
	pub fn content(&self, helper: &str) -> Option<Signal<Option<String>>> {
		self.inner.helpers.get(helper).cloned()
	}

	/// Navigation mode chosen at startup.
	pub fn mode(&self) -> NavigationMode {
		self.inner.settings.mode
	}

	/// Settings the router was started with.
	pub fn settings(&self) -> &ScreensSettings {
		&self.inner.settings
	}

	/// Looks a registered screen up.
	pub fn get_screen(&self, name: &str) -> Option<Rc<Screen>> {
		self.inner.registry.get(name)
	}

	/// A copy of the navigation stack, for saving across a live reload.
	pub fn nav_stack(&self) -> NavStack {
		self.inner.nav_stack.borrow().clone()
	}

	/// Goes back one step.
	///
	/// Browser mode asks the host to go back. App mode pops the navigation
	/// stack, refusing to pop its last entry. Returns `Ok(false)` when there
	/// is nowhere to go.
	pub fn back(&self) -> ScreenResult<bool> {
		self.inner.driver.back(self)
	}

	/// Enters the home screen for the current identity. In app mode the
	/// navigation stack is reset first.
	pub fn to_home(&self) -> ScreenResult<bool> {
		self.inner.driver.to_home(self)
	}

	/// Title of the screen `back` would return to. Always `None` in browser
	/// mode.
	pub fn previous_title(&self) -> Option<String> {
		self.inner.driver.previous_title(self)
	}

	/// Clears the navigation stack and enters `name`. If `name` is already
	/// current it becomes the only stack entry without a new transition.
	///
	/// # Errors
	///
	/// Same as [`to_screen`](Self::to_screen); the stack is left untouched on
	/// error.
	pub fn reset_nav_stack(&self, name: &str) -> ScreenResult<bool> {
		let screen = self
			.inner
			.registry
			.get(name)
			.ok_or_else(|| ScreenError::UnknownScreen(name.to_string()))?;
		self.inner.nav_stack.borrow_mut().clear();
		self.publish_nav_stack_length();
		tracing::debug!(screen = name, "navigation stack reset");

		let entered = self.to_screen(name, ToScreenOptions::default())?;
		if !entered && self.mode() == NavigationMode::App {
			let data = self.inner.screen_data.get_untracked();
			app::update_nav_stack(
				self,
				&screen,
				&ToScreenOptions::new().with_screen_data(data),
			);
		}
		Ok(entered)
	}

	/// Resolves `path` like a cold start would: matching, data resolution,
	/// access control and the load condition. Unmatched paths enter the
	/// "not found" screen.
	pub fn navigate_path(&self, path: &str) -> ScreenResult<()> {
		browser::resolve_path(self, path, false)
	}

	/// Feeds a host popstate event to the router. Hosts that call
	/// [`HostHistory::listen`](crate::host::HostHistory::listen) listeners
	/// do not need this.
	pub fn handle_popstate(&self, state: Option<HistoryEntry>) {
		self.inner.driver.on_popstate(self, state);
	}

	/// Calls `on_ready` once `condition` holds.
	///
	/// # Errors
	///
	/// [`ScreenError::InvalidCondition`] for an unknown named condition.
	pub fn wait_for_condition<F>(&self, condition: Condition, on_ready: F, show_loading: bool) -> ScreenResult<()>
	where
		F: FnOnce() + 'static,
	{
		self.inner.waiter.wait(condition, on_ready, show_loading)
	}

	/// Calls `on_ready(context)` once `condition` holds.
	pub fn wait_for_condition_with<C, F>(
		&self,
		condition: Condition,
		context: C,
		on_ready: F,
		show_loading: bool,
	) -> ScreenResult<()>
	where
		C: 'static,
		F: FnOnce(C) + 'static,
	{
		self.inner
			.waiter
			.wait_with(condition, context, on_ready, show_loading)
	}

	/// A click handler that navigates to `name`. Failures are logged and
	/// published on [`navigation_error`](Self::navigation_error).
	pub fn link(&self, name: &str) -> impl Fn() + 'static {
		let weak = self.downgrade();
		let name = name.to_string();
		move || {
			let Some(router) = weak.upgrade() else {
				return;
			};
			if let Err(err) = router.to_screen(&name, ToScreenOptions::default()) {
				router.report(err);
			}
		}
	}

	pub(crate) fn home_screen(&self) -> String {
		let identified = untrack(|| self.inner.host.is_identified());
		self.inner.settings.home_for(identified).to_string()
	}

	pub(crate) fn publish_nav_stack_length(&self) {
		let len = self.inner.nav_stack.borrow().len();
		self.inner.nav_stack_length.set_if_changed(len);
	}

	/// Logs a failure raised outside any caller's reach and publishes it.
	pub(crate) fn report(&self, err: ScreenError) {
		tracing::error!(error = %err, "navigation failed");
		self.inner.navigation_error.set(Some(err));
	}
}

impl fmt::Debug for ScreenRouter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ScreenRouter")
			.field("mode", &self.inner.settings.mode)
			.field("current_screen", &self.inner.current_screen.get_untracked())
			.field("nav_stack_length", &self.inner.nav_stack_length.get_untracked())
			.finish_non_exhaustive()
	}
}
