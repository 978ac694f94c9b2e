//! In-memory navigation stack used in app mode.

use serde::{Deserialize, Serialize};

use crate::screen::ScreenData;

/// One entry of the navigation stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenState {
	/// Screen name.
	pub name: String,
	/// Title, once known. Computed titles are filled in after rendering.
	#[serde(default)]
	pub title: Option<String>,
	/// Screen data the screen was entered with.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub screen_data: Option<ScreenData>,
}

impl ScreenState {
	/// Builds an entry.
	pub fn new(name: impl Into<String>, title: Option<String>, screen_data: Option<ScreenData>) -> Self {
		Self {
			name: name.into(),
			title,
			screen_data,
		}
	}
}

/// Ordered screen states, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NavStack {
	entries: Vec<ScreenState>,
}

impl NavStack {
	/// An empty stack.
	pub fn new() -> Self {
		Self::default()
	}

	/// Wraps saved entries.
	pub fn from_entries(entries: Vec<ScreenState>) -> Self {
		Self { entries }
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether the stack is empty.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Pushes an entry and returns its index.
	pub fn push(&mut self, state: ScreenState) -> usize {
		self.entries.push(state);
		self.entries.len() - 1
	}

	/// Removes the top entry, refusing to empty the stack.
	pub fn pop(&mut self) -> Option<ScreenState> {
		if self.entries.len() < 2 {
			return None;
		}
		self.entries.pop()
	}

	/// The top entry.
	pub fn top(&self) -> Option<&ScreenState> {
		self.entries.last()
	}

	/// The entry below the top.
	pub fn previous(&self) -> Option<&ScreenState> {
		self.entries.iter().rev().nth(1)
	}

	/// Sets the title of the entry at `index`, if it still holds `name`.
	pub fn set_title(&mut self, index: usize, name: &str, title: String) -> bool {
		match self.entries.get_mut(index) {
			Some(entry) if entry.name == name => {
				entry.title = Some(title);
				true
			}
			_ => false,
		}
	}

	/// Removes every entry.
	pub fn clear(&mut self) {
		self.entries.clear();
	}

	/// The entries, oldest first.
	pub fn entries(&self) -> &[ScreenState] {
		&self.entries
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn state(name: &str) -> ScreenState {
		ScreenState::new(name, Some(name.to_string()), None)
	}

	#[rstest]
	fn test_pop_keeps_last_entry() {
		let mut stack = NavStack::new();
		stack.push(state("Home"));

		assert_eq!(stack.pop(), None);
		assert_eq!(stack.len(), 1);

		stack.push(state("About"));
		assert_eq!(stack.pop().map(|s| s.name), Some("About".to_string()));
		assert_eq!(stack.top().map(|s| s.name.as_str()), Some("Home"));
	}

	#[rstest]
	fn test_previous() {
		let mut stack = NavStack::new();
		assert!(stack.previous().is_none());

		stack.push(state("Home"));
		assert!(stack.previous().is_none());

		stack.push(state("About"));
		assert_eq!(stack.previous().map(|s| s.name.as_str()), Some("Home"));
	}

	#[rstest]
	fn test_set_title_checks_name() {
		let mut stack = NavStack::new();
		let index = stack.push(ScreenState::new("Profile", None, None));

		assert!(!stack.set_title(index, "Home", "Ada".to_string()));
		assert!(stack.set_title(index, "Profile", "Ada".to_string()));
		assert_eq!(stack.top().unwrap().title.as_deref(), Some("Ada"));
	}

	#[rstest]
	fn test_serializes_as_array() {
		let stack = NavStack::from_entries(vec![
			ScreenState::new("Home", Some("Home".to_string()), None),
			ScreenState::new("Profile", None, Some(json!({ "id": "42" }))),
		]);

		let value = serde_json::to_value(&stack).unwrap();

		assert_eq!(
			value,
			json!([
				{ "name": "Home", "title": "Home" },
				{ "name": "Profile", "title": null, "screenData": { "id": "42" } }
			])
		);
		assert_eq!(serde_json::from_value::<NavStack>(value).unwrap(), stack);
	}
}
