//! Screen definitions.
//!
//! A [`ScreenSpec`] is what the application hands to
//! [`Screens::register_screen`](crate::Screens::register_screen). Registration
//! validates it and produces an immutable [`Screen`].

use std::fmt;
use std::rc::Rc;

use crate::error::ScreenError;
use crate::pattern::{PathMatch, PathParams, PathPattern};

/// Data context attached to the active screen.
pub type ScreenData = serde_json::Value;

/// A zero-argument lifecycle hook.
pub type Hook = Rc<dyn Fn()>;

/// Computes a screen title from the current screen data.
///
/// Returning `None` means "not ready yet"; the title is recomputed when the
/// signals it reads change.
pub type TitleFn = Rc<dyn Fn(Option<&ScreenData>) -> Option<String>>;

/// Decides at navigation time whether a screen may be shown.
pub type AccessFn = Rc<dyn Fn() -> bool>;

/// Builds a concrete path from a mask and parameters.
pub type PathGenerator = Rc<dyn Fn(&str, &PathParams) -> Option<String>>;

/// Receives the outcome of a [`DataResolver`].
pub type DataCallback = Box<dyn FnOnce(Result<ScreenData, ScreenError>)>;

/// Loads screen data for a parameterized path; may call back asynchronously.
pub type DataResolver = Rc<dyn Fn(&PathMatch, DataCallback)>;

/// Screen title: fixed, or computed from screen data.
#[derive(Clone)]
pub enum ScreenTitle {
	/// A fixed title.
	Static(String),
	/// A title computed reactively until it yields a value.
	Computed(TitleFn),
}

impl ScreenTitle {
	/// Builds a computed title.
	pub fn computed<F>(f: F) -> Self
	where
		F: Fn(Option<&ScreenData>) -> Option<String> + 'static,
	{
		Self::Computed(Rc::new(f))
	}

	/// The static title, if this is not a computed one.
	pub fn as_static(&self) -> Option<&str> {
		match self {
			Self::Static(title) => Some(title),
			Self::Computed(_) => None,
		}
	}
}

impl fmt::Debug for ScreenTitle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Static(title) => f.debug_tuple("Static").field(title).finish(),
			Self::Computed(_) => f.write_str("Computed(..)"),
		}
	}
}

impl From<&str> for ScreenTitle {
	fn from(title: &str) -> Self {
		Self::Static(title.to_string())
	}
}

impl From<String> for ScreenTitle {
	fn from(title: String) -> Self {
		Self::Static(title)
	}
}

/// Access rule: fixed, or decided when the screen is requested.
#[derive(Clone)]
pub enum AccessRule {
	/// Always allowed (`true`) or always denied (`false`).
	Static(bool),
	/// Evaluated once per navigation, after the identity is ready.
	Computed(AccessFn),
}

impl AccessRule {
	/// Builds a computed rule.
	pub fn computed<F>(f: F) -> Self
	where
		F: Fn() -> bool + 'static,
	{
		Self::Computed(Rc::new(f))
	}
}

impl Default for AccessRule {
	fn default() -> Self {
		Self::Static(true)
	}
}

impl From<bool> for AccessRule {
	fn from(allowed: bool) -> Self {
		Self::Static(allowed)
	}
}

impl fmt::Debug for AccessRule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Static(allowed) => f.debug_tuple("Static").field(allowed).finish(),
			Self::Computed(_) => f.write_str("Computed(..)"),
		}
	}
}

/// How a screen participates in URL routing.
#[derive(Clone)]
pub enum ScreenRoute {
	/// Reached through exactly one path.
	Literal {
		/// The path, e.g. `/about`.
		path: String,
		/// Matcher for `path`.
		pattern: PathPattern,
	},
	/// Reached through a parameterized mask such as `/user/:id`.
	Parameterized {
		/// The mask.
		mask: String,
		/// Matcher for `mask`.
		pattern: PathPattern,
		/// Builds a concrete path from parameters.
		generate_path: PathGenerator,
		/// Loads screen data from a match.
		resolve_data: DataResolver,
	},
}

impl ScreenRoute {
	/// The matcher for this route.
	pub fn pattern(&self) -> &PathPattern {
		match self {
			Self::Literal { pattern, .. } | Self::Parameterized { pattern, .. } => pattern,
		}
	}
}

impl fmt::Debug for ScreenRoute {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Literal { path, .. } => f.debug_struct("Literal").field("path", path).finish(),
			Self::Parameterized { mask, .. } => f
				.debug_struct("Parameterized")
				.field("mask", mask)
				.finish_non_exhaustive(),
		}
	}
}

/// A registered screen.
#[derive(Clone)]
pub struct Screen {
	pub(crate) name: String,
	pub(crate) content: Vec<(String, String)>,
	pub(crate) title: ScreenTitle,
	pub(crate) route: Option<ScreenRoute>,
	pub(crate) access: AccessRule,
	pub(crate) before: Option<Hook>,
	pub(crate) after: Option<Hook>,
}

impl Screen {
	/// Screen name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// `(helper, content)` pairs in registration order.
	pub fn content(&self) -> &[(String, String)] {
		&self.content
	}

	/// Screen title.
	pub fn title(&self) -> &ScreenTitle {
		&self.title
	}

	/// Routing information, if the screen is reachable by URL.
	pub fn route(&self) -> Option<&ScreenRoute> {
		self.route.as_ref()
	}

	/// Access rule.
	pub fn access(&self) -> &AccessRule {
		&self.access
	}

	/// Path to show in the address bar when this screen is entered with
	/// `data`.
	///
	/// Literal routes always produce their path. Parameterized routes use the
	/// string and number fields of `data` as parameters and produce `None`
	/// when a parameter is missing.
	pub fn path_for(&self, data: Option<&ScreenData>) -> Option<String> {
		match self.route.as_ref()? {
			ScreenRoute::Literal { path, .. } => Some(path.clone()),
			ScreenRoute::Parameterized {
				mask,
				generate_path,
				..
			} => generate_path(mask, &params_from_data(data?)),
		}
	}
}

impl fmt::Debug for Screen {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Screen")
			.field("name", &self.name)
			.field("content", &self.content)
			.field("title", &self.title)
			.field("route", &self.route)
			.field("access", &self.access)
			.field("has_before", &self.before.is_some())
			.field("has_after", &self.after.is_some())
			.finish()
	}
}

/// Flattens the scalar fields of a JSON object into path parameters.
pub fn params_from_data(data: &ScreenData) -> PathParams {
	let Some(object) = data.as_object() else {
		return PathParams::new();
	};
	object
		.iter()
		.filter_map(|(key, value)| {
			let value = match value {
				serde_json::Value::String(s) => s.clone(),
				serde_json::Value::Number(n) => n.to_string(),
				serde_json::Value::Bool(b) => b.to_string(),
				_ => return None,
			};
			Some((key.clone(), value))
		})
		.collect()
}

/// Builder for a screen definition.
///
/// ```ignore
/// let spec = ScreenSpec::new()
///     .content("main", "profile")
///     .title(ScreenTitle::computed(|data| {
///         data.and_then(|d| d["id"].as_str()).map(|id| format!("User {id}"))
///     }))
///     .path_mask("/user/:id")
///     .data_from_params(|m, done| done(Ok(serde_json::json!({ "id": &m[1] }))));
/// ```
#[derive(Clone, Default)]
pub struct ScreenSpec {
	pub(crate) content: Option<Vec<(String, String)>>,
	pub(crate) title: Option<ScreenTitle>,
	pub(crate) path: Option<String>,
	pub(crate) path_mask: Option<String>,
	pub(crate) path_pattern: Option<PathPattern>,
	pub(crate) generate_path: Option<PathGenerator>,
	pub(crate) data_from_params: Option<DataResolver>,
	pub(crate) access: Option<AccessRule>,
	pub(crate) before: Option<Hook>,
	pub(crate) after: Option<Hook>,
}

impl ScreenSpec {
	/// Starts an empty definition.
	pub fn new() -> Self {
		Self::default()
	}

	/// Renders `content` into `helper` while the screen is active.
	pub fn content(mut self, helper: impl Into<String>, content: impl Into<String>) -> Self {
		self.content
			.get_or_insert_with(Vec::new)
			.push((helper.into(), content.into()));
		self
	}

	/// Sets the title.
	pub fn title(mut self, title: impl Into<ScreenTitle>) -> Self {
		self.title = Some(title.into());
		self
	}

	/// Routes a literal path to this screen.
	pub fn path(mut self, path: impl Into<String>) -> Self {
		self.path = Some(path.into());
		self
	}

	/// Routes a parameterized mask to this screen.
	pub fn path_mask(mut self, mask: impl Into<String>) -> Self {
		self.path_mask = Some(mask.into());
		self
	}

	/// Overrides the matcher compiled from the path or mask.
	pub fn path_pattern(mut self, pattern: PathPattern) -> Self {
		self.path_pattern = Some(pattern);
		self
	}

	/// Overrides the path generator derived from the mask.
	pub fn generate_path<F>(mut self, f: F) -> Self
	where
		F: Fn(&str, &PathParams) -> Option<String> + 'static,
	{
		self.generate_path = Some(Rc::new(f));
		self
	}

	/// Loads screen data from a mask match. Required with
	/// [`path_mask`](Self::path_mask).
	pub fn data_from_params<F>(mut self, f: F) -> Self
	where
		F: Fn(&PathMatch, DataCallback) + 'static,
	{
		self.data_from_params = Some(Rc::new(f));
		self
	}

	/// Sets the access rule. Defaults to always allowed.
	pub fn allowed(mut self, rule: impl Into<AccessRule>) -> Self {
		self.access = Some(rule.into());
		self
	}

	/// Runs `f` before the screen is entered.
	pub fn before<F>(mut self, f: F) -> Self
	where
		F: Fn() + 'static,
	{
		self.before = Some(Rc::new(f));
		self
	}

	/// Runs `f` after the screen has rendered.
	pub fn after<F>(mut self, f: F) -> Self
	where
		F: Fn() + 'static,
	{
		self.after = Some(Rc::new(f));
		self
	}
}

impl fmt::Debug for ScreenSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ScreenSpec")
			.field("content", &self.content)
			.field("title", &self.title)
			.field("path", &self.path)
			.field("path_mask", &self.path_mask)
			.field("has_data_from_params", &self.data_from_params.is_some())
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_params_from_data_keeps_scalars() {
		let data = json!({ "id": "42", "page": 3, "draft": false, "tags": ["a"] });

		let params = params_from_data(&data);

		assert_eq!(params.len(), 3);
		assert_eq!(params["id"], "42");
		assert_eq!(params["page"], "3");
		assert_eq!(params["draft"], "false");
	}

	#[rstest]
	fn test_params_from_non_object_is_empty() {
		assert!(params_from_data(&json!("42")).is_empty());
	}

	#[rstest]
	fn test_spec_content_keeps_order() {
		let spec = ScreenSpec::new()
			.content("main", "profile")
			.content("sidebar", "profileNav");

		assert_eq!(
			spec.content.unwrap(),
			vec![
				("main".to_string(), "profile".to_string()),
				("sidebar".to_string(), "profileNav".to_string()),
			]
		);
	}

	#[rstest]
	fn test_title_conversions() {
		assert_eq!(ScreenTitle::from("Home").as_static(), Some("Home"));
		assert_eq!(ScreenTitle::computed(|_| None).as_static(), None);
	}
}
