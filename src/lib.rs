//! # Reinhardt Screens
//!
//! A client-side screen router for single-page applications.
//!
//! Applications register named *screens*, each assigning content to one or
//! more content helpers, with a title, an optional URL route and an optional
//! access rule. The router then keeps three views of navigation consistent:
//!
//! - the host history and URL (browser mode)
//! - an in-memory navigation stack (app mode, for standalone installs)
//! - the reactive current screen and its data
//!
//! ## Navigation Modes
//!
//! - **Browser**: the URL picks the first screen. Paths are matched against
//!   registered routes, parameterized routes resolve their data, access rules
//!   are checked and the `okToLoad` (or `okToReload`) condition is awaited
//!   before the screen is entered. Back and forward buttons arrive as
//!   popstate events.
//! - **App**: the session starts on the home screen for its identity and
//!   `back` pops the navigation stack.
//!
//! ## Quick Start
//!
//! ```ignore
//! use reinhardt_screens::{Host, ScreenSpec, Screens, ScreensConfig, ToScreenOptions};
//! use serde_json::json;
//!
//! let mut screens = Screens::new();
//! screens.register_screen(
//!     "Home",
//!     ScreenSpec::new().content("main", "home").title("Home").path("/"),
//! )?;
//! screens.register_screen(
//!     "Profile",
//!     ScreenSpec::new()
//!         .content("main", "profile")
//!         .title("Profile")
//!         .path_mask("/user/:id")
//!         .data_from_params(|m, done| done(Ok(json!({ "id": &m[1] })))),
//! )?;
//!
//! let router = screens.run(ScreensConfig::default(), Host::memory())?;
//! router.to_screen("Profile", ToScreenOptions::new().with_data(json!({ "id": "42" })))?;
//! ```
//!
//! ## Reactivity
//!
//! Every observable is a [`Signal`] from `reinhardt-reactive`. Condition
//! waits and computed titles are effects; they re-run when
//! [`flush`](reinhardt_reactive::flush) drains the queue, either from a host
//! scheduler or explicitly.

#![warn(missing_docs)]

mod access;
pub mod condition;
pub mod config;
mod driver;
pub mod error;
pub mod history;
pub mod host;
pub mod nav_stack;
pub mod pattern;
pub mod registry;
pub mod router;
pub mod screen;
pub mod transition;

pub use condition::{Condition, ConditionTable, ConditionWaiter, OK_TO_LOAD, OK_TO_RELOAD};
pub use config::{NavigationMode, ScreensConfig, ScreensSettings};
pub use error::{ScreenError, ScreenResult};
pub use history::HistoryEntry;
pub use host::{Host, HostHistory, IdentityProvider, Renderer};
pub use nav_stack::{NavStack, ScreenState};
pub use pattern::{PathMatch, PathParams, PathPattern, PatternError, normalize_path};
pub use registry::ScreenRegistry;
pub use router::{ScreenRouter, Screens};
pub use screen::{AccessRule, Screen, ScreenData, ScreenRoute, ScreenSpec, ScreenTitle};
pub use transition::ToScreenOptions;

pub use reinhardt_reactive::{self as reactive, Effect, Signal, flush};
