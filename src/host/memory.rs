//! In-memory host.
//!
//! Stands in for the browser in tests and native hosts. History is a vector
//! with a cursor, rendering completes immediately unless deferred, and the
//! identity is held in signals.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use reinhardt_reactive::Signal;

use super::{Host, HostHistory, IdentityProvider, PopStateListener, Renderer};
use crate::history::HistoryEntry;
use crate::screen::ScreenData;

#[derive(Debug, Clone)]
struct Location {
	path: String,
	title: String,
	state: Option<HistoryEntry>,
}

/// History kept in memory.
#[derive(Default)]
pub struct MemoryHistory {
	locations: RefCell<Vec<Location>>,
	cursor: Cell<usize>,
	listener: RefCell<Option<PopStateListener>>,
}

impl MemoryHistory {
	/// History with a single stateless entry at `path`.
	pub fn new(path: impl Into<String>) -> Self {
		Self::with_location(path.into(), None)
	}

	/// History whose current entry already carries `state`, as after a
	/// page reload.
	pub fn with_state(path: impl Into<String>, state: HistoryEntry) -> Self {
		Self::with_location(path.into(), Some(state))
	}

	fn with_location(path: String, state: Option<HistoryEntry>) -> Self {
		Self {
			locations: RefCell::new(vec![Location {
				path,
				title: String::new(),
				state,
			}]),
			cursor: Cell::new(0),
			listener: RefCell::new(None),
		}
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.locations.borrow().len()
	}

	/// Whether there are no entries. Never true in practice.
	pub fn is_empty(&self) -> bool {
		self.locations.borrow().is_empty()
	}

	/// Index of the current entry.
	pub fn position(&self) -> usize {
		self.cursor.get()
	}

	/// States of every entry, oldest first.
	pub fn states(&self) -> Vec<Option<HistoryEntry>> {
		self.locations
			.borrow()
			.iter()
			.map(|location| location.state.clone())
			.collect()
	}

	/// Paths of every entry, oldest first.
	pub fn paths(&self) -> Vec<String> {
		self.locations
			.borrow()
			.iter()
			.map(|location| location.path.clone())
			.collect()
	}

	/// Title passed with the current entry.
	pub fn current_title(&self) -> String {
		self.locations.borrow()[self.cursor.get()].title.clone()
	}

	/// Moves one entry forward. Returns `false` at the newest entry.
	pub fn forward(&self) -> bool {
		self.go(1)
	}

	/// Moves by `delta` entries and notifies the listener, like the user
	/// pressing back or forward.
	pub fn go(&self, delta: isize) -> bool {
		let target = self.cursor.get() as isize + delta;
		if delta == 0 || target < 0 || target as usize >= self.len() {
			return false;
		}
		self.cursor.set(target as usize);
		let state = self.state();
		let listener = self.listener.borrow().clone();
		if let Some(listener) = listener {
			listener(state);
		}
		true
	}

	fn write(&self, entry: &HistoryEntry, title: &str, path: Option<&str>, replace: bool) {
		let mut locations = self.locations.borrow_mut();
		let cursor = self.cursor.get();
		let path = path
			.map(str::to_string)
			.unwrap_or_else(|| locations[cursor].path.clone());
		let location = Location {
			path,
			title: title.to_string(),
			state: Some(entry.clone()),
		};
		if replace {
			locations[cursor] = location;
		} else {
			locations.truncate(cursor + 1);
			locations.push(location);
			self.cursor.set(cursor + 1);
		}
	}
}

impl HostHistory for MemoryHistory {
	fn push_state(&self, entry: &HistoryEntry, title: &str, path: Option<&str>) {
		self.write(entry, title, path, false);
	}

	fn replace_state(&self, entry: &HistoryEntry, title: &str, path: Option<&str>) {
		self.write(entry, title, path, true);
	}

	fn state(&self) -> Option<HistoryEntry> {
		self.locations.borrow()[self.cursor.get()].state.clone()
	}

	fn current_path(&self) -> String {
		self.locations.borrow()[self.cursor.get()].path.clone()
	}

	fn back(&self) -> bool {
		self.go(-1)
	}

	fn listen(&self, listener: PopStateListener) {
		*self.listener.borrow_mut() = Some(listener);
	}
}

/// Renderer that records what it was asked to do.
#[derive(Default)]
pub struct MemoryRenderer {
	deferred: Cell<bool>,
	pending: RefCell<Vec<Box<dyn FnOnce()>>>,
	rendered: RefCell<Vec<String>>,
	titles: RefCell<Vec<String>>,
}

impl MemoryRenderer {
	/// A renderer that completes every render immediately.
	pub fn new() -> Self {
		Self::default()
	}

	/// Holds render callbacks until [`complete_render`](Self::complete_render).
	pub fn set_deferred(&self, deferred: bool) {
		self.deferred.set(deferred);
	}

	/// Runs every held render callback, oldest first.
	pub fn complete_render(&self) -> usize {
		let pending = self.pending.take();
		let count = pending.len();
		for callback in pending {
			callback();
		}
		count
	}

	/// Screens passed to `after_render`, in order.
	pub fn rendered(&self) -> Vec<String> {
		self.rendered.borrow().clone()
	}

	/// Titles set so far, in order.
	pub fn titles(&self) -> Vec<String> {
		self.titles.borrow().clone()
	}

	/// The last title set.
	pub fn title(&self) -> Option<String> {
		self.titles.borrow().last().cloned()
	}
}

impl Renderer for MemoryRenderer {
	fn after_render(&self, screen: &str, callback: Box<dyn FnOnce()>) {
		self.rendered.borrow_mut().push(screen.to_string());
		if self.deferred.get() {
			self.pending.borrow_mut().push(callback);
		} else {
			callback();
		}
	}

	fn set_title(&self, title: &str) {
		self.titles.borrow_mut().push(title.to_string());
	}
}

/// Identity held in signals.
#[derive(Debug, Clone, Default)]
pub struct SignalIdentity {
	user_id: Signal<Option<String>>,
	user: Signal<Option<ScreenData>>,
}

impl SignalIdentity {
	/// An anonymous session.
	pub fn anonymous() -> Self {
		Self::default()
	}

	/// A session identified as `id` whose user record has not loaded yet.
	pub fn identified(id: impl Into<String>) -> Self {
		let identity = Self::default();
		identity.user_id.set(Some(id.into()));
		identity
	}

	/// Publishes the loaded user record.
	pub fn set_user(&self, user: ScreenData) {
		self.user.set(Some(user));
	}

	/// Identifies the session and publishes its record at once.
	pub fn log_in(&self, id: impl Into<String>, user: ScreenData) {
		self.user_id.set(Some(id.into()));
		self.user.set(Some(user));
	}

	/// Returns to an anonymous session.
	pub fn log_out(&self) {
		self.user_id.set(None);
		self.user.set(None);
	}
}

impl IdentityProvider for SignalIdentity {
	fn current_user_id(&self) -> Option<String> {
		self.user_id.get()
	}

	fn current_user(&self) -> Option<ScreenData> {
		self.user.get()
	}
}

/// Handles to the in-memory collaborators, for inspection in tests.
#[derive(Clone)]
pub struct MemoryHost {
	/// History.
	pub history: Rc<MemoryHistory>,
	/// Renderer.
	pub renderer: Rc<MemoryRenderer>,
	/// Identity.
	pub identity: Rc<SignalIdentity>,
}

impl MemoryHost {
	/// Collaborators for an anonymous session at `path`.
	pub fn new(path: impl Into<String>) -> Self {
		Self::from_parts(MemoryHistory::new(path), SignalIdentity::anonymous())
	}

	/// Collaborators with the given history and identity.
	pub fn from_parts(history: MemoryHistory, identity: SignalIdentity) -> Self {
		Self {
			history: Rc::new(history),
			renderer: Rc::new(MemoryRenderer::new()),
			identity: Rc::new(identity),
		}
	}

	/// The [`Host`] to pass to the router.
	pub fn host(&self) -> Host {
		Host::new(
			self.history.clone(),
			self.renderer.clone(),
			self.identity.clone(),
		)
	}
}
