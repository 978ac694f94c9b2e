//! State objects stored in host history.

use serde::{Deserialize, Serialize};

use crate::screen::ScreenData;

/// One browser-mode history entry.
///
/// Serialized as `{"sid": 3, "name": "Profile", "screenData": {...}}` so
/// that it can live in `history.state`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
	/// Sequence id, increasing with every recorded navigation.
	pub sid: u64,
	/// Screen name.
	pub name: String,
	/// Screen data the screen was entered with.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub screen_data: Option<ScreenData>,
}

impl HistoryEntry {
	/// Builds an entry.
	pub fn new(sid: u64, name: impl Into<String>, screen_data: Option<ScreenData>) -> Self {
		Self {
			sid,
			name: name.into(),
			screen_data,
		}
	}

	/// Parses an entry from a host state value, or `None` if it is not one.
	pub fn from_value(value: &serde_json::Value) -> Option<Self> {
		serde_json::from_value(value.clone()).ok()
	}

	/// Converts the entry to a host state value.
	pub fn to_value(&self) -> serde_json::Value {
		serde_json::to_value(self).unwrap_or_default()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_serialized_shape() {
		let entry = HistoryEntry::new(3, "Profile", Some(json!({ "id": "42" })));

		assert_eq!(
			entry.to_value(),
			json!({ "sid": 3, "name": "Profile", "screenData": { "id": "42" } })
		);
	}

	#[rstest]
	fn test_screen_data_omitted_when_absent() {
		let entry = HistoryEntry::new(1, "Home", None);

		assert_eq!(entry.to_value(), json!({ "sid": 1, "name": "Home" }));
	}

	#[rstest]
	#[case::null(json!(null))]
	#[case::foreign_state(json!({ "scroll": 120 }))]
	#[case::wrong_sid(json!({ "sid": "x", "name": "Home" }))]
	fn test_foreign_state_ignored(#[case] value: serde_json::Value) {
		assert_eq!(HistoryEntry::from_value(&value), None);
	}

	#[rstest]
	fn test_from_value() {
		let value = json!({ "sid": 7, "name": "About" });

		let entry = HistoryEntry::from_value(&value).unwrap();

		assert_eq!(entry, HistoryEntry::new(7, "About", None));
	}
}
