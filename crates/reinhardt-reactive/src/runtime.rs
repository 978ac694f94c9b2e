//! Reactive Runtime
//!
//! This module owns the dependency graph between signals and the effects that
//! read them, the observer stack used for automatic dependency tracking, and
//! the queue of effects waiting to be re-run.
//!
//! ## Architecture
//!
//! 1. **Observer Stack**: tracks the effect that is currently executing
//! 2. **Dependency Tracking**: `Signal::get()` records an edge from the signal
//!    to the observer on top of the stack
//! 3. **Update Queue**: `Signal::set()` queues every subscriber; the queue is
//!    drained by [`flush`](crate::flush), either explicitly or from a host
//!    scheduler installed with [`set_scheduler`]
//!
//! Everything is thread-local. In WASM there is a single thread, so this is
//! effectively one global runtime.

use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicUsize, Ordering};

use std::collections::BTreeMap;

/// Unique identifier for reactive nodes (signals and effects).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
	/// Create a new unique NodeId
	pub fn new() -> Self {
		static COUNTER: AtomicUsize = AtomicUsize::new(0);
		Self(COUNTER.fetch_add(1, Ordering::Relaxed))
	}
}

impl Default for NodeId {
	fn default() -> Self {
		Self::new()
	}
}

/// Dependency graph node
#[derive(Debug, Default)]
pub(crate) struct DependencyNode {
	/// Effects that re-run when this node changes
	pub(crate) subscribers: Vec<NodeId>,
	/// Signals this node read during its last run
	pub(crate) dependencies: Vec<NodeId>,
}

/// Host hook used to schedule a flush of pending effects.
type SchedulerFn = Box<dyn Fn(Box<dyn FnOnce()>)>;

thread_local! {
	static SCHEDULER: RefCell<Option<SchedulerFn>> = const { RefCell::new(None) };
}

/// Install the function used to schedule a flush of pending effects.
///
/// Without a scheduler, pending effects only run when
/// [`flush`](crate::flush) is called. A browser host would typically defer
/// to a microtask:
///
/// ```ignore
/// reinhardt_reactive::set_scheduler(|task| {
///     wasm_bindgen_futures::spawn_local(async move { task() });
/// });
/// ```
pub fn set_scheduler<F>(scheduler: F)
where
	F: Fn(Box<dyn FnOnce()>) + 'static,
{
	SCHEDULER.with(|slot| *slot.borrow_mut() = Some(Box::new(scheduler)));
}

/// Remove a previously installed scheduler.
pub fn clear_scheduler() {
	let _ = SCHEDULER.try_with(|slot| slot.borrow_mut().take());
}

/// Per-thread reactive runtime.
pub struct Runtime {
	/// Effects currently executing, innermost last
	pub(crate) observer_stack: RefCell<Vec<NodeId>>,
	/// NodeId -> DependencyNode
	pub(crate) dependency_graph: RefCell<BTreeMap<NodeId, DependencyNode>>,
	/// Effects waiting to be re-run
	pub(crate) pending_updates: RefCell<Vec<NodeId>>,
	/// Whether a flush has been handed to the scheduler
	pub(crate) flush_scheduled: Cell<bool>,
	/// Whether a flush loop is running on this thread
	pub(crate) flushing: Cell<bool>,
}

impl Runtime {
	/// Create a new Runtime instance
	pub fn new() -> Self {
		Self {
			observer_stack: RefCell::new(Vec::new()),
			dependency_graph: RefCell::new(BTreeMap::new()),
			pending_updates: RefCell::new(Vec::new()),
			flush_scheduled: Cell::new(false),
			flushing: Cell::new(false),
		}
	}

	/// Get the effect currently being executed, if any.
	pub fn current_observer(&self) -> Option<NodeId> {
		self.observer_stack.borrow().last().copied()
	}

	pub(crate) fn push_observer(&self, id: NodeId) {
		self.observer_stack.borrow_mut().push(id);
	}

	pub(crate) fn pop_observer(&self) -> Option<NodeId> {
		self.observer_stack.borrow_mut().pop()
	}

	/// Record that the current observer read `signal_id`.
	///
	/// Called by `Signal::get()`. Does nothing outside an effect.
	pub fn track_dependency(&self, signal_id: NodeId) {
		let Some(observer_id) = self.current_observer() else {
			return;
		};
		let mut graph = self.dependency_graph.borrow_mut();

		let signal_node = graph.entry(signal_id).or_default();
		if !signal_node.subscribers.contains(&observer_id) {
			signal_node.subscribers.push(observer_id);
		}

		let observer_node = graph.entry(observer_id).or_default();
		if !observer_node.dependencies.contains(&signal_id) {
			observer_node.dependencies.push(signal_id);
		}
	}

	/// Queue every subscriber of `signal_id` for re-execution.
	pub fn notify_signal_change(&self, signal_id: NodeId) {
		let subscribers = match self.dependency_graph.borrow().get(&signal_id) {
			Some(node) => node.subscribers.clone(),
			None => return,
		};
		for subscriber_id in subscribers {
			self.schedule_update(subscriber_id);
		}
	}

	/// Queue a node for re-execution and ask the scheduler for a flush.
	pub fn schedule_update(&self, node_id: NodeId) {
		{
			let mut pending = self.pending_updates.borrow_mut();
			if !pending.contains(&node_id) {
				pending.push(node_id);
			}
		}

		if self.flush_scheduled.replace(true) {
			return;
		}
		let scheduled = SCHEDULER.with(|slot| match slot.borrow().as_ref() {
			Some(scheduler) => {
				scheduler(Box::new(crate::effect::flush));
				true
			}
			None => false,
		});
		if !scheduled {
			// Without a scheduler the queue waits for an explicit flush.
			self.flush_scheduled.set(false);
		}
	}

	/// Take every queued node, leaving the queue empty.
	pub(crate) fn take_pending(&self) -> Vec<NodeId> {
		self.flush_scheduled.set(false);
		core::mem::take(&mut *self.pending_updates.borrow_mut())
	}

	/// Number of effects waiting for a flush.
	pub fn pending_count(&self) -> usize {
		self.pending_updates.borrow().len()
	}

	/// Forget everything `node_id` read during its last run.
	pub fn clear_dependencies(&self, node_id: NodeId) {
		let mut graph = self.dependency_graph.borrow_mut();

		let dependencies = match graph.get_mut(&node_id) {
			Some(node) => core::mem::take(&mut node.dependencies),
			None => return,
		};
		for dep_id in dependencies {
			if let Some(dep_node) = graph.get_mut(&dep_id) {
				dep_node.subscribers.retain(|&id| id != node_id);
			}
		}
	}

	/// Remove a node from the dependency graph and the update queue.
	pub fn remove_node(&self, node_id: NodeId) {
		self.clear_dependencies(node_id);
		self.dependency_graph.borrow_mut().remove(&node_id);
		self.pending_updates
			.borrow_mut()
			.retain(|&id| id != node_id);
	}

	/// Check if a node exists in the dependency graph (for testing)
	pub fn has_node(&self, node_id: NodeId) -> bool {
		self.dependency_graph.borrow().contains_key(&node_id)
	}

	/// Get the number of subscribers for a node (for testing)
	pub fn subscriber_count(&self, node_id: NodeId) -> usize {
		self.dependency_graph
			.borrow()
			.get(&node_id)
			.map(|node| node.subscribers.len())
			.unwrap_or(0)
	}
}

impl Default for Runtime {
	fn default() -> Self {
		Self::new()
	}
}

thread_local! {
	static RUNTIME: Runtime = Runtime::new();
}

/// Run `f` with the thread's runtime.
pub fn with_runtime<F, R>(f: F) -> R
where
	F: FnOnce(&Runtime) -> R,
{
	RUNTIME.with(f)
}

/// Like [`with_runtime`] but returns `None` once thread-local storage has
/// been torn down (safe inside `Drop`).
pub(crate) fn try_with_runtime<F, R>(f: F) -> Option<R>
where
	F: FnOnce(&Runtime) -> R,
{
	RUNTIME.try_with(f).ok()
}

/// Run `f` without tracking any signal it reads.
///
/// Effects created inside `f` still track their own dependencies.
pub fn untrack<F, R>(f: F) -> R
where
	F: FnOnce() -> R,
{
	let saved = with_runtime(|rt| rt.observer_stack.take());
	let result = f();
	with_runtime(|rt| {
		let mut stack = rt.observer_stack.borrow_mut();
		debug_assert!(stack.is_empty(), "unbalanced observer stack in untrack");
		*stack = saved;
	});
	result
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;

	#[rstest]
	#[serial]
	fn test_node_id_uniqueness() {
		let id1 = NodeId::new();
		let id2 = NodeId::new();
		let id3 = NodeId::new();

		assert_ne!(id1, id2);
		assert_ne!(id2, id3);
		assert_ne!(id1, id3);
	}

	#[rstest]
	#[serial]
	fn test_runtime_observer_stack() {
		let runtime = Runtime::new();
		assert!(runtime.current_observer().is_none());

		let id1 = NodeId::new();
		runtime.push_observer(id1);
		assert_eq!(runtime.current_observer(), Some(id1));

		let id2 = NodeId::new();
		runtime.push_observer(id2);
		assert_eq!(runtime.current_observer(), Some(id2));

		runtime.pop_observer();
		assert_eq!(runtime.current_observer(), Some(id1));

		runtime.pop_observer();
		assert!(runtime.current_observer().is_none());
	}

	#[rstest]
	#[serial]
	fn test_dependency_tracking() {
		let runtime = Runtime::new();
		let signal_id = NodeId::new();
		let effect_id = NodeId::new();

		runtime.push_observer(effect_id);
		runtime.track_dependency(signal_id);
		runtime.pop_observer();

		let graph = runtime.dependency_graph.borrow();
		assert!(graph[&signal_id].subscribers.contains(&effect_id));
		assert!(graph[&effect_id].dependencies.contains(&signal_id));
	}

	#[rstest]
	#[serial]
	fn test_tracking_without_observer_is_noop() {
		let runtime = Runtime::new();
		let signal_id = NodeId::new();

		runtime.track_dependency(signal_id);

		assert!(!runtime.has_node(signal_id));
	}

	#[rstest]
	#[serial]
	fn test_notify_signal_change_queues_subscribers_once() {
		let runtime = Runtime::new();
		let signal_id = NodeId::new();
		let effect_id = NodeId::new();

		runtime.push_observer(effect_id);
		runtime.track_dependency(signal_id);
		runtime.pop_observer();

		runtime.notify_signal_change(signal_id);
		runtime.notify_signal_change(signal_id);

		assert_eq!(*runtime.pending_updates.borrow(), vec![effect_id]);
	}

	#[rstest]
	#[serial]
	fn test_clear_dependencies() {
		let runtime = Runtime::new();
		let signal_id = NodeId::new();
		let effect_id = NodeId::new();

		runtime.push_observer(effect_id);
		runtime.track_dependency(signal_id);
		runtime.pop_observer();

		runtime.clear_dependencies(effect_id);

		assert_eq!(runtime.subscriber_count(signal_id), 0);
		let graph = runtime.dependency_graph.borrow();
		assert!(graph[&effect_id].dependencies.is_empty());
	}

	#[rstest]
	#[serial]
	fn test_remove_node_drops_pending_update() {
		let runtime = Runtime::new();
		let effect_id = NodeId::new();

		runtime.schedule_update(effect_id);
		assert_eq!(runtime.pending_count(), 1);

		runtime.remove_node(effect_id);
		assert_eq!(runtime.pending_count(), 0);
	}

	#[rstest]
	#[serial]
	fn test_untrack_hides_current_observer() {
		let effect_id = NodeId::new();
		with_runtime(|rt| rt.push_observer(effect_id));

		let inside = untrack(|| with_runtime(|rt| rt.current_observer()));
		let after = with_runtime(|rt| rt.current_observer());
		with_runtime(|rt| rt.pop_observer());

		assert_eq!(inside, None);
		assert_eq!(after, Some(effect_id));
	}
}
