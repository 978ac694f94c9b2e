//! Effect - Reactive Side Effects
//!
//! An [`Effect`] runs a closure immediately and re-runs it whenever a
//! [`Signal`](crate::Signal) read during the previous run changes. The closure
//! receives its [`Computation`], which it can use to stop itself; a stopped
//! effect never runs again.
//!
//! ## Example
//!
//! ```ignore
//! use reinhardt_reactive::{Effect, Signal, flush};
//!
//! let ready = Signal::new(false);
//! let watcher = ready.clone();
//!
//! Effect::new(move |computation| {
//!     if watcher.get() {
//!         println!("ready");
//!         computation.stop();
//!     }
//! })
//! .detach();
//!
//! ready.set(true);
//! flush(); // prints "ready", then the effect is gone
//! ```

use core::cell::{Cell, RefCell};

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::runtime::{NodeId, try_with_runtime, with_runtime};

/// Upper bound on flush rounds before the loop gives up.
///
/// Effects that keep re-triggering each other would otherwise spin forever.
const MAX_FLUSH_ROUNDS: usize = 1000;

struct EffectSlot {
	computation: Computation,
	run: RefCell<Box<dyn FnMut(&Computation)>>,
}

thread_local! {
	static EFFECTS: RefCell<BTreeMap<NodeId, Rc<EffectSlot>>> = const { RefCell::new(BTreeMap::new()) };
}

/// Handle passed to an effect closure on every run.
#[derive(Clone)]
pub struct Computation {
	id: NodeId,
	stopped: Rc<Cell<bool>>,
	first_run: Rc<Cell<bool>>,
}

impl Computation {
	/// Identifier of the effect in the dependency graph.
	pub fn id(&self) -> NodeId {
		self.id
	}

	/// Whether the closure is being run for the first time.
	pub fn is_first_run(&self) -> bool {
		self.first_run.get()
	}

	/// Whether [`stop`](Self::stop) has been called.
	pub fn is_stopped(&self) -> bool {
		self.stopped.get()
	}

	/// Stop the effect. It will not re-run, even if called from inside its
	/// own closure; the current run finishes normally.
	pub fn stop(&self) {
		if self.stopped.replace(true) {
			return;
		}
		let _ = try_with_runtime(|rt| rt.remove_node(self.id));
		let _ = EFFECTS.try_with(|effects| effects.borrow_mut().remove(&self.id));
	}
}

impl core::fmt::Debug for Computation {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Computation")
			.field("id", &self.id)
			.field("stopped", &self.stopped.get())
			.finish()
	}
}

/// A reactive side effect.
///
/// Dropping an `Effect` stops it. Call [`detach`](Self::detach) to let it
/// live until it stops itself through its [`Computation`].
#[must_use = "dropping an Effect stops it; call `detach` to keep it running"]
pub struct Effect {
	computation: Computation,
	detached: bool,
}

impl Effect {
	/// Create an effect and run it once, immediately.
	pub fn new<F>(f: F) -> Self
	where
		F: FnMut(&Computation) + 'static,
	{
		let computation = Computation {
			id: NodeId::new(),
			stopped: Rc::new(Cell::new(false)),
			first_run: Rc::new(Cell::new(true)),
		};
		let slot = Rc::new(EffectSlot {
			computation: computation.clone(),
			run: RefCell::new(Box::new(f)),
		});
		EFFECTS.with(|effects| {
			effects.borrow_mut().insert(computation.id, slot);
		});

		run_effect(computation.id);

		Self {
			computation,
			detached: false,
		}
	}

	/// Get the NodeId of this effect (for testing)
	pub fn id(&self) -> NodeId {
		self.computation.id
	}

	/// Whether the effect has been stopped.
	pub fn is_stopped(&self) -> bool {
		self.computation.is_stopped()
	}

	/// Stop the effect.
	pub fn stop(&self) {
		self.computation.stop();
	}

	/// Give up ownership; the effect keeps running until its closure stops
	/// it.
	pub fn detach(mut self) {
		self.detached = true;
	}
}

impl Drop for Effect {
	fn drop(&mut self) {
		if !self.detached {
			self.computation.stop();
		}
	}
}

/// Run one effect: clear its old dependencies, then execute it with itself
/// as the current observer.
pub(crate) fn run_effect(effect_id: NodeId) {
	// The slot is cloned out so that the closure can create or stop other
	// effects (or itself) while it runs.
	let Some(slot) = EFFECTS.with(|effects| effects.borrow().get(&effect_id).cloned()) else {
		return;
	};
	let computation = &slot.computation;
	if computation.is_stopped() {
		return;
	}

	let Ok(mut guard) = slot.run.try_borrow_mut() else {
		tracing::warn!(?effect_id, "effect re-entered itself; skipping nested run");
		return;
	};

	with_runtime(|rt| {
		rt.clear_dependencies(effect_id);
		rt.push_observer(effect_id);
	});
	let run = &mut *guard;
	run(computation);
	with_runtime(|rt| {
		rt.pop_observer();
	});
	drop(guard);

	computation.first_run.set(false);
	if computation.is_stopped() {
		// Reads made after `stop()` inside the same run must not resubscribe.
		let _ = try_with_runtime(|rt| rt.remove_node(effect_id));
	}
}

/// Re-run every queued effect until the queue is empty.
///
/// Effects queued while flushing run in the same call. Calling `flush` from
/// inside a running flush is a no-op; the outer loop picks up the work.
pub fn flush() {
	if with_runtime(|rt| rt.flushing.replace(true)) {
		return;
	}

	let mut rounds = 0;
	loop {
		let pending = with_runtime(|rt| rt.take_pending());
		if pending.is_empty() {
			break;
		}
		rounds += 1;
		if rounds > MAX_FLUSH_ROUNDS {
			tracing::warn!(
				remaining = pending.len(),
				"reactive flush exceeded {} rounds; dropping remaining updates",
				MAX_FLUSH_ROUNDS
			);
			break;
		}
		for effect_id in pending {
			run_effect(effect_id);
		}
	}

	with_runtime(|rt| rt.flushing.set(false));
}

/// Number of live effects on this thread.
pub fn effect_count() -> usize {
	EFFECTS.with(|effects| effects.borrow().len())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Signal;
	use rstest::rstest;
	use serial_test::serial;

	#[rstest]
	#[serial]
	fn test_effect_runs_immediately() {
		let run_count = Rc::new(Cell::new(0));
		let counter = run_count.clone();

		let _effect = Effect::new(move |_| counter.set(counter.get() + 1));

		assert_eq!(run_count.get(), 1);
	}

	#[rstest]
	#[serial]
	fn test_effect_reruns_on_flush() {
		let signal = Signal::new(0);
		let values = Rc::new(RefCell::new(Vec::new()));
		let sink = values.clone();
		let source = signal.clone();

		let _effect = Effect::new(move |_| sink.borrow_mut().push(source.get()));

		signal.set(10);
		assert_eq!(*values.borrow(), vec![0]);
		flush();
		assert_eq!(*values.borrow(), vec![0, 10]);

		signal.set(20);
		flush();
		assert_eq!(*values.borrow(), vec![0, 10, 20]);
	}

	#[rstest]
	#[serial]
	fn test_effect_stops_itself() {
		let signal = Signal::new(0);
		let runs = Rc::new(Cell::new(0));
		let counter = runs.clone();
		let source = signal.clone();

		Effect::new(move |computation| {
			counter.set(counter.get() + 1);
			if source.get() >= 2 {
				computation.stop();
			}
		})
		.detach();

		signal.set(2);
		flush();
		assert_eq!(runs.get(), 2);

		signal.set(3);
		flush();
		assert_eq!(runs.get(), 2);
		with_runtime(|rt| assert_eq!(rt.subscriber_count(signal.id()), 0));
	}

	#[rstest]
	#[serial]
	fn test_first_run_flag() {
		let signal = Signal::new(0);
		let flags = Rc::new(RefCell::new(Vec::new()));
		let sink = flags.clone();
		let source = signal.clone();

		let _effect = Effect::new(move |computation| {
			let _ = source.get();
			sink.borrow_mut().push(computation.is_first_run());
		});
		signal.set(1);
		flush();

		assert_eq!(*flags.borrow(), vec![true, false]);
	}

	#[rstest]
	#[serial]
	fn test_drop_stops_effect() {
		let signal = Signal::new(0);
		let runs = Rc::new(Cell::new(0));

		{
			let counter = runs.clone();
			let source = signal.clone();
			let _effect = Effect::new(move |_| {
				let _ = source.get();
				counter.set(counter.get() + 1);
			});
		}

		signal.set(10);
		flush();
		assert_eq!(runs.get(), 1);
	}

	#[rstest]
	#[serial]
	fn test_effect_created_inside_effect() {
		let outer_signal = Signal::new(0);
		let inner_runs = Rc::new(Cell::new(0));
		let counter = inner_runs.clone();
		let source = outer_signal.clone();

		Effect::new(move |computation| {
			if source.get() == 1 {
				let counter = counter.clone();
				Effect::new(move |inner| {
					counter.set(counter.get() + 1);
					inner.stop();
				})
				.detach();
				computation.stop();
			}
		})
		.detach();

		outer_signal.set(1);
		flush();

		assert_eq!(inner_runs.get(), 1);
	}

	#[rstest]
	#[serial]
	fn test_effect_writing_signal_cascades_within_one_flush() {
		let count = Signal::new(1);
		let doubled = Signal::new(0);
		let seen = Rc::new(Cell::new(0));

		let (source, target) = (count.clone(), doubled.clone());
		let _writer = Effect::new(move |_| target.set(source.get() * 2));
		let (watched, sink) = (doubled.clone(), seen.clone());
		let _reader = Effect::new(move |_| sink.set(watched.get()));

		count.set(5);
		flush();

		assert_eq!(seen.get(), 10);
	}

	#[rstest]
	#[serial]
	fn test_scheduler_runs_flush() {
		crate::runtime::set_scheduler(|task| task());
		let signal = Signal::new(0);
		let seen = Rc::new(Cell::new(0));
		let (source, sink) = (signal.clone(), seen.clone());
		let _effect = Effect::new(move |_| sink.set(source.get()));

		signal.set(7);
		crate::runtime::clear_scheduler();

		assert_eq!(seen.get(), 7);
	}
}
