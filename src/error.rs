//! Error types for screen registration and navigation.

use thiserror::Error;

/// Errors raised by the screen router.
///
/// Every variant except [`ScreenError::DataResolution`] is a programming
/// error: it is reported synchronously to the caller and never retried.
/// Unmatched paths and denied access are not errors; they resolve to the
/// "Not Found" and "Access Denied" screens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScreenError {
	/// A screen definition or call argument is malformed.
	#[error("invalid screen definition: {0}")]
	Validation(String),

	/// Navigation was requested to a screen that was never registered.
	#[error("unknown screen: {0}")]
	UnknownScreen(String),

	/// A screen with this name is already registered.
	#[error("screen already registered: {0}")]
	DuplicateScreen(String),

	/// A wait was requested on a condition id missing from the condition table.
	#[error("unknown condition: {0}")]
	InvalidCondition(String),

	/// A parameterized screen was registered without a data resolver.
	#[error("screen {0} has a path mask but no data resolver")]
	MissingDataResolver(String),

	/// A data resolver reported a failure while loading screen data.
	#[error("failed to resolve data for screen {screen}: {message}")]
	DataResolution {
		/// Screen whose data failed to load.
		screen: String,
		/// Failure reported by the resolver.
		message: String,
	},
}

impl ScreenError {
	/// Builds a [`ScreenError::DataResolution`] for `screen`.
	pub fn data_resolution(screen: impl Into<String>, message: impl Into<String>) -> Self {
		Self::DataResolution {
			screen: screen.into(),
			message: message.into(),
		}
	}
}

/// Convenience alias used throughout the crate.
pub type ScreenResult<T> = Result<T, ScreenError>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(ScreenError::Validation("title is required".into()), "invalid screen definition: title is required")]
	#[case(ScreenError::UnknownScreen("Nope".into()), "unknown screen: Nope")]
	#[case(ScreenError::DuplicateScreen("Home".into()), "screen already registered: Home")]
	#[case(ScreenError::InvalidCondition("okToFly".into()), "unknown condition: okToFly")]
	#[case(ScreenError::MissingDataResolver("Profile".into()), "screen Profile has a path mask but no data resolver")]
	fn test_error_display(#[case] error: ScreenError, #[case] expected: &str) {
		assert_eq!(error.to_string(), expected);
	}

	#[rstest]
	fn test_data_resolution_display() {
		let error = ScreenError::data_resolution("Profile", "user 42 not found");

		let message = error.to_string();

		assert!(message.contains("Profile"));
		assert!(message.contains("user 42 not found"));
	}

	#[rstest]
	fn test_error_send_sync() {
		fn assert_send_sync<T: Send + Sync>() {}
		assert_send_sync::<ScreenError>();
	}
}
