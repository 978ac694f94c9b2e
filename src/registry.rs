//! Screen registry.
//!
//! Holds every screen in registration order and a routing table of the
//! screens reachable by URL. The registry is filled before the router starts
//! and never shrinks.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{ScreenError, ScreenResult};
use crate::pattern::{PathMatch, PathParams, PathPattern};
use crate::screen::{PathGenerator, Screen, ScreenRoute, ScreenSpec};

/// One entry of the routing table.
#[derive(Debug, Clone)]
pub struct RouteEntry {
	/// Screen name.
	pub name: String,
	/// Matcher for the screen's path or mask.
	pub pattern: PathPattern,
}

/// Registered screens and the routing table.
#[derive(Debug, Default)]
pub struct ScreenRegistry {
	screens: Vec<Rc<Screen>>,
	index: HashMap<String, usize>,
	routes: Vec<RouteEntry>,
}

impl ScreenRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Validates `spec` and stores it under `name`.
	///
	/// # Errors
	///
	/// - [`ScreenError::Validation`] for a blank name, a missing or empty
	///   content map, a missing title, conflicting or malformed routing fields
	/// - [`ScreenError::MissingDataResolver`] for a mask without a data
	///   resolver
	/// - [`ScreenError::DuplicateScreen`] if `name` is taken
	pub fn register(&mut self, name: &str, spec: ScreenSpec) -> ScreenResult<()> {
		if name.trim().is_empty() {
			return Err(ScreenError::Validation(
				"screen name must be a non-empty string".to_string(),
			));
		}
		let invalid = |reason: &str| ScreenError::Validation(format!("{}: {}", name, reason));

		let content = spec
			.content
			.ok_or_else(|| invalid("content map is required"))?;
		if content.is_empty() {
			return Err(invalid("content map must assign at least one helper"));
		}
		if content
			.iter()
			.any(|(helper, template)| helper.is_empty() || template.is_empty())
		{
			return Err(invalid("content map entries need a helper and a content id"));
		}
		let title = spec.title.ok_or_else(|| invalid("title is required"))?;

		let route = match (spec.path, spec.path_mask) {
			(Some(_), Some(_)) => {
				return Err(invalid("path and path mask are mutually exclusive"));
			}
			(Some(path), None) => {
				if !path.starts_with('/') {
					return Err(invalid("path must start with '/'"));
				}
				let pattern = match spec.path_pattern {
					Some(pattern) if !pattern.test(&path) => {
						return Err(invalid("path pattern does not match path"));
					}
					Some(pattern) => pattern,
					None => PathPattern::literal(&path).map_err(|e| invalid(&e.to_string()))?,
				};
				Some(ScreenRoute::Literal { path, pattern })
			}
			(None, Some(mask)) => {
				if !mask.starts_with('/') {
					return Err(invalid("path mask must start with '/'"));
				}
				let compiled = PathPattern::new(&mask).map_err(|e| invalid(&e.to_string()))?;
				let resolve_data = spec
					.data_from_params
					.ok_or_else(|| ScreenError::MissingDataResolver(name.to_string()))?;
				let generate_path: PathGenerator = match spec.generate_path {
					Some(generate_path) => generate_path,
					None => {
						let compiled = compiled.clone();
						Rc::new(move |_mask: &str, params: &PathParams| compiled.reverse(params))
					}
				};
				Some(ScreenRoute::Parameterized {
					mask,
					pattern: spec.path_pattern.unwrap_or(compiled),
					generate_path,
					resolve_data,
				})
			}
			(None, None) => {
				if spec.path_pattern.is_some() {
					return Err(invalid("path pattern given without a path or path mask"));
				}
				None
			}
		};

		if self.index.contains_key(name) {
			return Err(ScreenError::DuplicateScreen(name.to_string()));
		}

		if let Some(route) = &route {
			self.routes.push(RouteEntry {
				name: name.to_string(),
				pattern: route.pattern().clone(),
			});
		}
		self.index.insert(name.to_string(), self.screens.len());
		self.screens.push(Rc::new(Screen {
			name: name.to_string(),
			content,
			title,
			route,
			access: spec.access.unwrap_or_default(),
			before: spec.before,
			after: spec.after,
		}));
		tracing::debug!(screen = name, "registered screen");
		Ok(())
	}

	/// Looks a screen up by name.
	pub fn get(&self, name: &str) -> Option<Rc<Screen>> {
		self.index.get(name).map(|&i| Rc::clone(&self.screens[i]))
	}

	/// Whether `name` is registered.
	pub fn contains(&self, name: &str) -> bool {
		self.index.contains_key(name)
	}

	/// Screens in registration order.
	pub fn screens(&self) -> impl Iterator<Item = &Rc<Screen>> {
		self.screens.iter()
	}

	/// The routing table, in registration order.
	pub fn routes(&self) -> &[RouteEntry] {
		&self.routes
	}

	/// Number of registered screens.
	pub fn len(&self) -> usize {
		self.screens.len()
	}

	/// Whether no screen is registered.
	pub fn is_empty(&self) -> bool {
		self.screens.is_empty()
	}

	/// Finds the first routed screen whose pattern matches `path`.
	pub fn match_path(&self, path: &str) -> Option<(Rc<Screen>, PathMatch)> {
		self.routes.iter().find_map(|entry| {
			let path_match = entry.pattern.exec(path)?;
			let screen = self.get(&entry.name)?;
			Some((screen, path_match))
		})
	}

	/// Every content helper named by a registered screen.
	pub fn helpers(&self) -> impl Iterator<Item = &str> {
		self.screens
			.iter()
			.flat_map(|screen| screen.content.iter().map(|(helper, _)| helper.as_str()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::screen::{ScreenData, ScreenTitle};
	use regex::Regex;
	use rstest::{fixture, rstest};
	use serde_json::json;

	fn basic() -> ScreenSpec {
		ScreenSpec::new().content("main", "home").title("Home")
	}

	fn profile() -> ScreenSpec {
		ScreenSpec::new()
			.content("main", "profile")
			.title("Profile")
			.path_mask("/user/:id")
			.data_from_params(|m, done| done(Ok(json!({ "id": &m[1] }))))
	}

	#[fixture]
	fn registry() -> ScreenRegistry {
		ScreenRegistry::new()
	}

	#[rstest]
	fn test_register_and_get(mut registry: ScreenRegistry) {
		registry.register("Home", basic().path("/")).unwrap();

		let screen = registry.get("Home").unwrap();

		assert_eq!(screen.name(), "Home");
		assert!(matches!(screen.access(), crate::AccessRule::Static(true)));
		assert_eq!(registry.routes().len(), 1);
		assert!(registry.get("Missing").is_none());
	}

	#[rstest]
	fn test_unrouted_screen_has_no_route_entry(mut registry: ScreenRegistry) {
		registry.register("Settings", basic()).unwrap();

		assert!(registry.contains("Settings"));
		assert!(registry.routes().is_empty());
	}

	#[rstest]
	fn test_duplicate_rejected(mut registry: ScreenRegistry) {
		registry.register("Home", basic()).unwrap();

		let result = registry.register("Home", basic());

		assert_eq!(result, Err(ScreenError::DuplicateScreen("Home".to_string())));
		assert_eq!(registry.len(), 1);
	}

	#[rstest]
	fn test_mask_without_resolver_rejected(mut registry: ScreenRegistry) {
		let spec = ScreenSpec::new()
			.content("main", "profile")
			.title("Profile")
			.path_mask("/user/:id");

		let result = registry.register("Profile", spec);

		assert_eq!(result, Err(ScreenError::MissingDataResolver("Profile".to_string())));
	}

	#[rstest]
	#[case::blank_name("  ", basic())]
	#[case::missing_content("X", ScreenSpec::new().title("X"))]
	#[case::missing_title("X", ScreenSpec::new().content("main", "x"))]
	#[case::empty_helper("X", ScreenSpec::new().content("", "x").title("X"))]
	#[case::relative_path("X", basic().path("about"))]
	#[case::path_and_mask("X", profile().path("/user"))]
	#[case::pattern_without_path("X", basic().path_pattern(PathPattern::literal("/x").unwrap()))]
	#[case::pattern_mismatch("X", basic().path("/about").path_pattern(PathPattern::literal("/team").unwrap()))]
	#[case::bad_mask("X", profile().path_mask("/user/{id"))]
	fn test_validation_errors(mut registry: ScreenRegistry, #[case] name: &str, #[case] spec: ScreenSpec) {
		let result = registry.register(name, spec);

		assert!(matches!(result, Err(ScreenError::Validation(_))), "{:?}", result);
		assert!(registry.is_empty());
	}

	#[rstest]
	fn test_match_path_extracts_params(mut registry: ScreenRegistry) {
		registry.register("Profile", profile()).unwrap();

		let (screen, path_match) = registry.match_path("/user/42").unwrap();

		assert_eq!(screen.name(), "Profile");
		assert_eq!(path_match.get(1), Some("42"));
		assert!(registry.match_path("/unknown").is_none());
	}

	#[rstest]
	fn test_first_registered_route_wins(mut registry: ScreenRegistry) {
		registry.register("Me", basic().path("/user/me")).unwrap();
		registry.register("Profile", profile()).unwrap();

		let (screen, _) = registry.match_path("/user/me").unwrap();

		assert_eq!(screen.name(), "Me");
	}

	#[rstest]
	fn test_custom_regex_pattern(mut registry: ScreenRegistry) {
		let spec = profile().path_pattern(PathPattern::from_regex(
			Regex::new(r"^/user/([0-9]+)$").unwrap(),
		));
		registry.register("Profile", spec).unwrap();

		assert!(registry.match_path("/user/42").is_some());
		assert!(registry.match_path("/user/abc").is_none());
	}

	#[rstest]
	fn test_generated_path_round_trips(mut registry: ScreenRegistry) {
		registry.register("Profile", profile()).unwrap();
		let screen = registry.get("Profile").unwrap();
		let data: ScreenData = json!({ "id": "42" });

		let path = screen.path_for(Some(&data)).unwrap();
		let (matched, path_match) = registry.match_path(&path).unwrap();

		assert_eq!(path, "/user/42");
		assert_eq!(matched.name(), "Profile");
		assert_eq!(path_match.param("id"), Some("42"));
	}

	#[rstest]
	fn test_helpers_lists_every_slot(mut registry: ScreenRegistry) {
		registry
			.register(
				"Home",
				ScreenSpec::new()
					.content("main", "home")
					.content("nav", "homeNav")
					.title(ScreenTitle::from("Home")),
			)
			.unwrap();

		let helpers: Vec<&str> = registry.helpers().collect();

		assert_eq!(helpers, vec!["main", "nav"]);
	}
}
