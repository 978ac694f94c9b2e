//! Condition waiter.
//!
//! A condition is a list of predicates that must all return `true` before a
//! gated action runs. Waiting is reactive: the predicates are evaluated
//! inside an [`Effect`], so any [`Signal`] they read re-triggers the check
//! on the next [`flush`](reinhardt_reactive::flush). Once satisfied the
//! effect stops for good and the callback fires exactly once.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use reinhardt_reactive::{Effect, Signal, untrack};

use crate::error::{ScreenError, ScreenResult};

/// Condition checked before the first screen of a session is entered.
pub const OK_TO_LOAD: &str = "okToLoad";

/// Condition checked when the page is reloaded on the screen it showed.
pub const OK_TO_RELOAD: &str = "okToReload";

/// A zero-argument predicate.
pub type Predicate = Rc<dyn Fn() -> bool>;

/// Named conditions, each an ordered list of predicates.
#[derive(Clone)]
pub struct ConditionTable {
	conditions: BTreeMap<String, Vec<Predicate>>,
}

impl ConditionTable {
	/// A table with no conditions at all.
	pub fn empty() -> Self {
		Self {
			conditions: BTreeMap::new(),
		}
	}

	/// Declares `id` with no predicates (always satisfied) if it is missing.
	pub fn define(mut self, id: impl Into<String>) -> Self {
		self.conditions.entry(id.into()).or_default();
		self
	}

	/// Appends `predicate` to condition `id`, declaring it if needed.
	pub fn add<F>(mut self, id: impl Into<String>, predicate: F) -> Self
	where
		F: Fn() -> bool + 'static,
	{
		self.conditions
			.entry(id.into())
			.or_default()
			.push(Rc::new(predicate));
		self
	}

	/// The predicates of `id`.
	pub fn get(&self, id: &str) -> Option<&[Predicate]> {
		self.conditions.get(id).map(Vec::as_slice)
	}

	/// Whether `id` is declared.
	pub fn contains(&self, id: &str) -> bool {
		self.conditions.contains_key(id)
	}
}

/// Holds `okToLoad` and `okToReload`, both empty.
impl Default for ConditionTable {
	fn default() -> Self {
		Self::empty().define(OK_TO_LOAD).define(OK_TO_RELOAD)
	}
}

impl fmt::Debug for ConditionTable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map()
			.entries(self.conditions.iter().map(|(id, predicates)| (id, predicates.len())))
			.finish()
	}
}

/// What to wait for.
#[derive(Clone)]
pub enum Condition {
	/// A condition from the table.
	Named(String),
	/// An ad-hoc predicate.
	Predicate(Predicate),
}

impl Condition {
	/// Wraps an ad-hoc predicate.
	pub fn predicate<F>(f: F) -> Self
	where
		F: Fn() -> bool + 'static,
	{
		Self::Predicate(Rc::new(f))
	}
}

impl From<&str> for Condition {
	fn from(id: &str) -> Self {
		Self::Named(id.to_string())
	}
}

impl From<String> for Condition {
	fn from(id: String) -> Self {
		Self::Named(id)
	}
}

impl fmt::Debug for Condition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Named(id) => f.debug_tuple("Named").field(id).finish(),
			Self::Predicate(_) => f.write_str("Predicate(..)"),
		}
	}
}

/// Where loading state is published while a wait is pending.
#[derive(Clone)]
pub struct LoadingSlot {
	/// The main content helper.
	pub helper: Signal<Option<String>>,
	/// Content shown in `helper` while loading.
	pub template: String,
}

/// Runs callbacks once their condition holds.
///
/// `is_loading` stays `true` while any wait started with `show_loading` is
/// still pending.
#[derive(Clone)]
pub struct ConditionWaiter {
	table: ConditionTable,
	is_loading: Signal<bool>,
	loading: Option<LoadingSlot>,
	pending_loading: Rc<Cell<usize>>,
}

impl ConditionWaiter {
	/// Creates a waiter over `table` that reports pending waits on
	/// `is_loading` and, when given, in `loading`.
	pub fn new(table: ConditionTable, is_loading: Signal<bool>, loading: Option<LoadingSlot>) -> Self {
		Self {
			table,
			is_loading,
			loading,
			pending_loading: Rc::new(Cell::new(0)),
		}
	}

	/// The condition table.
	pub fn table(&self) -> &ConditionTable {
		&self.table
	}

	/// Calls `on_ready` once `condition` holds.
	///
	/// # Errors
	///
	/// [`ScreenError::InvalidCondition`] if a named condition is not in the
	/// table. Nothing is scheduled in that case.
	pub fn wait<F>(&self, condition: Condition, on_ready: F, show_loading: bool) -> ScreenResult<()>
	where
		F: FnOnce() + 'static,
	{
		self.wait_with(condition, (), move |()| on_ready(), show_loading)
	}

	/// Calls `on_ready(context)` once `condition` holds.
	///
	/// If the condition already holds, `on_ready` runs before this returns.
	/// A new wait never cancels an earlier one.
	pub fn wait_with<C, F>(
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
		let predicates: Vec<Predicate> = match condition {
			Condition::Named(id) => match self.table.get(&id) {
				Some(predicates) => predicates.to_vec(),
				None => return Err(ScreenError::InvalidCondition(id)),
			},
			Condition::Predicate(predicate) => vec![predicate],
		};

		let is_loading = self.is_loading.clone();
		let loading = self.loading.clone();
		let pending_loading = Rc::clone(&self.pending_loading);
		let mut counted = false;
		let mut pending = Some((context, on_ready));

		Effect::new(move |computation| {
			if !predicates.iter().all(|predicate| predicate()) {
				if show_loading && !counted {
					counted = true;
					pending_loading.set(pending_loading.get() + 1);
					untrack(|| {
						is_loading.set_if_changed(true);
						if let Some(slot) = &loading {
							slot.helper.set(Some(slot.template.clone()));
						}
					});
				}
				return;
			}

			computation.stop();
			let Some((context, on_ready)) = pending.take() else {
				return;
			};
			untrack(|| {
				if counted {
					let remaining = pending_loading.get().saturating_sub(1);
					pending_loading.set(remaining);
					if remaining == 0 {
						is_loading.set(false);
						if let Some(slot) = &loading {
							if slot.helper.get_untracked().as_deref() == Some(slot.template.as_str()) {
								slot.helper.set(None);
							}
						}
					}
				}
				on_ready(context);
			});
		})
		.detach();
		Ok(())
	}
}

impl fmt::Debug for ConditionWaiter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ConditionWaiter")
			.field("table", &self.table)
			.field("is_loading", &self.is_loading.get_untracked())
			.field("pending_loading", &self.pending_loading.get())
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use reinhardt_reactive::flush;
	use rstest::rstest;
	use serial_test::serial;

	fn waiter(table: ConditionTable) -> (ConditionWaiter, Signal<bool>, Signal<Option<String>>) {
		let is_loading = Signal::new(false);
		let main = Signal::new(None);
		let slot = LoadingSlot {
			helper: main.clone(),
			template: "loading".to_string(),
		};
		(ConditionWaiter::new(table, is_loading.clone(), Some(slot)), is_loading, main)
	}

	#[rstest]
	#[serial]
	fn test_satisfied_condition_fires_immediately() {
		let (waiter, is_loading, _) = waiter(ConditionTable::default());
		let fired = Rc::new(Cell::new(0));
		let counter = fired.clone();

		waiter
			.wait(OK_TO_LOAD.into(), move || counter.set(counter.get() + 1), true)
			.unwrap();

		assert_eq!(fired.get(), 1);
		assert!(!is_loading.get_untracked());
	}

	#[rstest]
	#[serial]
	fn test_fires_once_after_flip() {
		let ready = Signal::new(false);
		let flag = ready.clone();
		let table = ConditionTable::default().add(OK_TO_LOAD, move || flag.get());
		let (waiter, is_loading, main) = waiter(table);
		let fired = Rc::new(Cell::new(0));
		let counter = fired.clone();

		waiter
			.wait(OK_TO_LOAD.into(), move || counter.set(counter.get() + 1), true)
			.unwrap();
		flush();

		assert_eq!(fired.get(), 0);
		assert!(is_loading.get_untracked());
		assert_eq!(main.get_untracked().as_deref(), Some("loading"));

		ready.set(true);
		flush();
		assert_eq!(fired.get(), 1);
		assert!(!is_loading.get_untracked());
		assert_eq!(main.get_untracked(), None);

		ready.set(false);
		flush();
		ready.set(true);
		flush();
		assert_eq!(fired.get(), 1);
	}

	#[rstest]
	#[serial]
	fn test_every_predicate_must_hold() {
		let (first, second) = (Signal::new(false), Signal::new(false));
		let (a, b) = (first.clone(), second.clone());
		let table = ConditionTable::empty()
			.add("ready", move || a.get())
			.add("ready", move || b.get());
		let (waiter, _, _) = waiter(table);
		let fired = Rc::new(Cell::new(false));
		let flag = fired.clone();

		waiter.wait("ready".into(), move || flag.set(true), false).unwrap();
		first.set(true);
		flush();
		assert!(!fired.get());

		second.set(true);
		flush();
		assert!(fired.get());
	}

	#[rstest]
	#[serial]
	fn test_without_loading_leaves_signals_alone() {
		let (waiter, is_loading, main) = waiter(ConditionTable::default());

		waiter.wait(Condition::predicate(|| false), || {}, false).unwrap();

		assert!(!is_loading.get_untracked());
		assert_eq!(main.get_untracked(), None);
	}

	#[rstest]
	#[serial]
	fn test_unknown_condition() {
		let (waiter, _, _) = waiter(ConditionTable::default());

		let result = waiter.wait("okToFly".into(), || {}, true);

		assert_eq!(result, Err(ScreenError::InvalidCondition("okToFly".to_string())));
	}

	#[rstest]
	#[serial]
	fn test_context_passed_to_callback() {
		let (waiter, _, _) = waiter(ConditionTable::default());
		let seen = Rc::new(Cell::new(0));
		let sink = seen.clone();

		waiter
			.wait_with(Condition::predicate(|| true), 42, move |n| sink.set(n), false)
			.unwrap();

		assert_eq!(seen.get(), 42);
	}

	#[rstest]
	#[serial]
	fn test_later_wait_does_not_cancel_earlier() {
		let gate = Signal::new(false);
		let (g1, g2) = (gate.clone(), gate.clone());
		let (waiter, _, _) = waiter(ConditionTable::default());
		let fired = Rc::new(Cell::new(0));
		let (c1, c2) = (fired.clone(), fired.clone());

		waiter
			.wait(Condition::predicate(move || g1.get()), move || c1.set(c1.get() + 1), true)
			.unwrap();
		waiter
			.wait(Condition::predicate(move || g2.get()), move || c2.set(c2.get() + 1), true)
			.unwrap();
		gate.set(true);
		flush();

		assert_eq!(fired.get(), 2);
	}

	#[rstest]
	#[serial]
	fn test_loading_held_until_last_wait_fires() {
		let (first, second) = (Signal::new(false), Signal::new(false));
		let (a, b) = (first.clone(), second.clone());
		let (waiter, is_loading, main) = waiter(ConditionTable::default());
		let fired = Rc::new(Cell::new(0));
		let (c1, c2) = (fired.clone(), fired.clone());

		waiter
			.wait(Condition::predicate(move || a.get()), move || c1.set(c1.get() + 1), true)
			.unwrap();
		waiter
			.wait(Condition::predicate(move || b.get()), move || c2.set(c2.get() + 1), true)
			.unwrap();
		first.set(true);
		flush();

		assert_eq!(fired.get(), 1);
		assert!(is_loading.get_untracked());
		assert_eq!(main.get_untracked().as_deref(), Some("loading"));

		second.set(true);
		flush();

		assert_eq!(fired.get(), 2);
		assert!(!is_loading.get_untracked());
		assert_eq!(main.get_untracked(), None);
	}
}
