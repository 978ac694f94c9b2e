//! Browser host.
//!
//! Binds [`HostHistory`] to `window.history` and [`Renderer`] to
//! `requestAnimationFrame` and `document.title`. History state is stored as
//! plain JSON so that it survives reloads.

use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, PopStateEvent, window};

use super::{Host, HostHistory, IdentityProvider, PopStateListener, Renderer};
use crate::history::HistoryEntry;

fn to_js(entry: &HistoryEntry) -> JsValue {
	js_sys::JSON::parse(&entry.to_value().to_string()).unwrap_or(JsValue::NULL)
}

fn from_js(value: &JsValue) -> Option<HistoryEntry> {
	if value.is_null() || value.is_undefined() {
		return None;
	}
	let json: String = js_sys::JSON::stringify(value).ok()?.into();
	let value: serde_json::Value = serde_json::from_str(&json).ok()?;
	HistoryEntry::from_value(&value)
}

/// `window.history`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserHistory;

impl BrowserHistory {
	/// Creates the binding.
	pub fn new() -> Self {
		Self
	}

	fn history() -> Option<web_sys::History> {
		window()?.history().ok()
	}
}

impl HostHistory for BrowserHistory {
	fn push_state(&self, entry: &HistoryEntry, title: &str, path: Option<&str>) {
		let Some(history) = Self::history() else {
			return;
		};
		if let Err(err) = history.push_state_with_url(&to_js(entry), title, path) {
			tracing::error!(?err, screen = %entry.name, "history.pushState failed");
		}
	}

	fn replace_state(&self, entry: &HistoryEntry, title: &str, path: Option<&str>) {
		let Some(history) = Self::history() else {
			return;
		};
		if let Err(err) = history.replace_state_with_url(&to_js(entry), title, path) {
			tracing::error!(?err, screen = %entry.name, "history.replaceState failed");
		}
	}

	fn state(&self) -> Option<HistoryEntry> {
		let state = Self::history()?.state().ok()?;
		from_js(&state)
	}

	fn current_path(&self) -> String {
		window()
			.and_then(|w| w.location().pathname().ok())
			.unwrap_or_else(|| "/".to_string())
	}

	fn back(&self) -> bool {
		Self::history().is_some_and(|history| history.back().is_ok())
	}

	fn listen(&self, listener: PopStateListener) {
		let Some(window) = window() else {
			return;
		};
		let handler = Closure::wrap(Box::new(move |event: Event| {
			let state = event
				.dyn_into::<PopStateEvent>()
				.ok()
				.and_then(|event| from_js(&event.state()));
			listener(state);
		}) as Box<dyn FnMut(_)>);

		if let Err(err) =
			window.add_event_listener_with_callback("popstate", handler.as_ref().unchecked_ref())
		{
			tracing::error!(?err, "failed to register popstate listener");
			return;
		}
		// Lives as long as the page.
		handler.forget();
	}
}

/// Renders through the document.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentRenderer;

impl DocumentRenderer {
	/// Creates the binding.
	pub fn new() -> Self {
		Self
	}
}

impl Renderer for DocumentRenderer {
	fn after_render(&self, screen: &str, callback: Box<dyn FnOnce()>) {
		let Some(window) = window() else {
			callback();
			return;
		};
		let frame = Closure::once_into_js(callback);
		if let Err(err) = window.request_animation_frame(frame.unchecked_ref()) {
			tracing::warn!(?err, screen, "requestAnimationFrame unavailable; render callback dropped");
		}
	}

	fn set_title(&self, title: &str) {
		if let Some(document) = window().and_then(|w| w.document()) {
			document.set_title(title);
		}
	}
}

impl Host {
	/// Browser history and document rendering with the given identity.
	pub fn browser(identity: Rc<dyn IdentityProvider>) -> Self {
		Self::new(
			Rc::new(BrowserHistory::new()),
			Rc::new(DocumentRenderer::new()),
			identity,
		)
	}
}
