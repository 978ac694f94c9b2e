//! Host collaborators.
//!
//! The router never touches the DOM or the browser directly. It talks to a
//! [`Host`]: a history implementation, a renderer and an identity provider.
//! [`memory`] provides implementations for tests and native hosts; [`web`]
//! binds to the browser on `wasm32-unknown-unknown`.

use std::rc::Rc;

use crate::history::HistoryEntry;
use crate::screen::ScreenData;

pub mod memory;
#[cfg(all(target_family = "wasm", target_os = "unknown"))]
pub mod web;

pub use memory::{MemoryHistory, MemoryHost, MemoryRenderer, SignalIdentity};

/// Receives the history state of a popstate event.
pub type PopStateListener = Rc<dyn Fn(Option<HistoryEntry>)>;

/// Host navigation history.
pub trait HostHistory {
	/// Appends an entry. `path` of `None` leaves the URL unchanged.
	fn push_state(&self, entry: &HistoryEntry, title: &str, path: Option<&str>);

	/// Replaces the current entry. `path` of `None` leaves the URL unchanged.
	fn replace_state(&self, entry: &HistoryEntry, title: &str, path: Option<&str>);

	/// State of the current entry, if it was written by the router.
	fn state(&self) -> Option<HistoryEntry>;

	/// Path of the current URL.
	fn current_path(&self) -> String;

	/// Moves one entry back. Returns `false` if the host cannot go back.
	fn back(&self) -> bool;

	/// Registers the popstate listener. Called once when the router starts.
	fn listen(&self, listener: PopStateListener);
}

/// Paints screens.
pub trait Renderer {
	/// Calls `callback` once `screen` has actually rendered.
	fn after_render(&self, screen: &str, callback: Box<dyn FnOnce()>);

	/// Sets the document title.
	fn set_title(&self, title: &str);
}

/// Who is using the application.
///
/// Both methods are reactive reads: calling them inside an effect subscribes
/// the effect to identity changes.
pub trait IdentityProvider {
	/// Id of the logged-in user, or `None` for anonymous sessions.
	fn current_user_id(&self) -> Option<String>;

	/// The logged-in user's record, once it has loaded.
	fn current_user(&self) -> Option<ScreenData>;
}

/// The collaborators a router runs against.
#[derive(Clone)]
pub struct Host {
	/// Navigation history.
	pub history: Rc<dyn HostHistory>,
	/// Renderer.
	pub renderer: Rc<dyn Renderer>,
	/// Identity provider.
	pub identity: Rc<dyn IdentityProvider>,
}

impl Host {
	/// Bundles the three collaborators.
	pub fn new(
		history: Rc<dyn HostHistory>,
		renderer: Rc<dyn Renderer>,
		identity: Rc<dyn IdentityProvider>,
	) -> Self {
		Self {
			history,
			renderer,
			identity,
		}
	}

	/// In-memory collaborators starting at `/` with an anonymous session.
	pub fn memory() -> Self {
		MemoryHost::new("/").host()
	}

	/// Whether the current session is identified.
	pub fn is_identified(&self) -> bool {
		self.identity.current_user_id().is_some()
	}
}

impl std::fmt::Debug for Host {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Host").finish_non_exhaustive()
	}
}
