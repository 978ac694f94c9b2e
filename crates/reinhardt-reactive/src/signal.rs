//! Signal - Fine-grained Reactive Primitive
//!
//! `Signal<T>` holds a value and records a dependency whenever it is read from
//! inside an [`Effect`](crate::Effect). Writing the value queues every effect
//! that read it.
//!
//! ## Example
//!
//! ```ignore
//! use reinhardt_reactive::Signal;
//!
//! let count = Signal::new(0);
//! assert_eq!(count.get(), 0);
//!
//! count.set(42);
//! count.update(|n| *n += 1);
//! assert_eq!(count.get(), 43);
//! ```

use core::cell::RefCell;
use core::fmt;

use std::rc::Rc;

use crate::runtime::{NodeId, try_with_runtime, with_runtime};

/// A reactive value shared between clones.
///
/// All clones of a `Signal` observe the same value; cloning is cheap.
pub struct Signal<T: 'static> {
	id: NodeId,
	value: Rc<RefCell<T>>,
}

impl<T: 'static> Clone for Signal<T> {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			value: Rc::clone(&self.value),
		}
	}
}

impl<T: 'static> Signal<T> {
	/// Create a new Signal with the given initial value
	pub fn new(value: T) -> Self {
		Self {
			id: NodeId::new(),
			value: Rc::new(RefCell::new(value)),
		}
	}

	/// Get a clone of the value, tracking the read.
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		with_runtime(|rt| rt.track_dependency(self.id));
		self.get_untracked()
	}

	/// Get a clone of the value without tracking the read.
	pub fn get_untracked(&self) -> T
	where
		T: Clone,
	{
		self.value.borrow().clone()
	}

	/// Borrow the value for the duration of `f`, tracking the read.
	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		with_runtime(|rt| rt.track_dependency(self.id));
		self.with_untracked(f)
	}

	/// Borrow the value for the duration of `f` without tracking the read.
	pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		f(&self.value.borrow())
	}

	/// Replace the value and queue every dependent effect.
	pub fn set(&self, value: T) {
		let previous = self.value.replace(value);
		drop(previous);
		with_runtime(|rt| rt.notify_signal_change(self.id));
	}

	/// Replace the value only when it differs from the current one.
	///
	/// Returns whether dependents were notified.
	pub fn set_if_changed(&self, value: T) -> bool
	where
		T: PartialEq,
	{
		if *self.value.borrow() == value {
			return false;
		}
		self.set(value);
		true
	}

	/// Mutate the value in place and queue every dependent effect.
	pub fn update<F>(&self, f: F)
	where
		F: FnOnce(&mut T),
	{
		f(&mut self.value.borrow_mut());
		with_runtime(|rt| rt.notify_signal_change(self.id));
	}

	/// Get the NodeId of this signal
	pub fn id(&self) -> NodeId {
		self.id
	}
}

impl<T: Default + 'static> Default for Signal<T> {
	fn default() -> Self {
		Self::new(T::default())
	}
}

impl<T: 'static> Drop for Signal<T> {
	fn drop(&mut self) {
		// Last clone going away: forget its subscriber edges.
		if Rc::strong_count(&self.value) == 1 {
			let _ = try_with_runtime(|rt| rt.remove_node(self.id));
		}
	}
}

impl<T: fmt::Debug + 'static> fmt::Debug for Signal<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Signal")
			.field("id", &self.id)
			.field("value", &*self.value.borrow())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;

	#[rstest]
	#[serial]
	fn test_signal_set_and_update() {
		let signal = Signal::new(0);

		signal.set(100);
		assert_eq!(signal.get_untracked(), 100);

		signal.update(|n| *n += 1);
		assert_eq!(signal.get_untracked(), 101);
	}

	#[rstest]
	#[serial]
	fn test_signal_clones_share_value() {
		let signal1 = Signal::new(String::from("home"));
		let signal2 = signal1.clone();

		signal1.set(String::from("profile"));

		assert_eq!(signal2.get_untracked(), "profile");
		assert_eq!(signal1.id(), signal2.id());
	}

	#[rstest]
	#[serial]
	fn test_signal_with_borrows_without_clone() {
		let signal = Signal::new(vec![1, 2, 3]);

		let len = signal.with(|v| v.len());

		assert_eq!(len, 3);
	}

	#[rstest]
	#[case(5, false)]
	#[case(6, true)]
	fn test_set_if_changed(#[case] next: i32, #[case] expected: bool) {
		let signal = Signal::new(5);

		assert_eq!(signal.set_if_changed(next), expected);
		assert_eq!(signal.get_untracked(), next);
	}

	#[rstest]
	#[serial]
	fn test_signal_read_is_tracked_by_observer() {
		let signal = Signal::new(42);
		let observer_id = NodeId::new();

		with_runtime(|rt| rt.push_observer(observer_id));
		let _ = signal.get();
		with_runtime(|rt| rt.pop_observer());

		with_runtime(|rt| {
			let graph = rt.dependency_graph.borrow();
			assert!(graph[&signal.id()].subscribers.contains(&observer_id));
		});
	}

	#[rstest]
	#[serial]
	fn test_untracked_read_is_not_tracked() {
		let signal = Signal::new(42);
		let observer_id = NodeId::new();

		with_runtime(|rt| rt.push_observer(observer_id));
		let _ = signal.get_untracked();
		with_runtime(|rt| rt.pop_observer());

		with_runtime(|rt| assert_eq!(rt.subscriber_count(signal.id()), 0));
	}

	#[rstest]
	#[serial]
	fn test_dropping_last_clone_removes_node() {
		let observer_id = NodeId::new();
		let signal = Signal::new(1);
		let id = signal.id();

		with_runtime(|rt| rt.push_observer(observer_id));
		let _ = signal.get();
		with_runtime(|rt| rt.pop_observer());
		assert!(with_runtime(|rt| rt.has_node(id)));

		drop(signal);

		assert!(!with_runtime(|rt| rt.has_node(id)));
	}
}
