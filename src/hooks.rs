use crate::element::Value;
use crate::error::RenderError;
use crate::fiber::{FiberRef, FiberWeak};
use crate::schedule::{self, Scheduler};
use core::marker::PhantomData;
use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{error, trace, trace_span, warn};

/// Teardown action returned by an effect; invoked before the effect's next
/// re-run, or when the owning instance is unmounted.
pub type Cleanup = Box<dyn FnOnce()>;

pub(crate) type StateUpdate = Box<dyn Fn(Rc<dyn Any>) -> Rc<dyn Any>>;
pub(crate) type EffectCallback = Rc<dyn Fn() -> Option<Cleanup>>;

/// One positional state slot. `queue` holds updates enqueued since the
/// slot's generation rendered; they are folded into the value, in enqueue
/// order, by the next render of the owning instance.
pub(crate) struct StateCell {
	pub value: Rc<dyn Any>,
	pub queue: Vec<StateUpdate>,
}

/// One positional effect slot. `cleanup` always holds the teardown of the
/// most recent run; when an effect is skipped, the previous generation's
/// teardown is carried forward so it stays reachable for the next re-run and
/// for unmount.
pub(crate) struct EffectCell {
	pub callback: EffectCallback,
	pub deps: Vec<Value>,
	pub cleanup: Option<Cleanup>,
}

/// Hook access for the component instance currently being rendered.
///
/// A `Scope` is handed to the component function for exactly one render and
/// is the only way to reach the hook primitives, so a hook can never be
/// invoked outside an active instance. The positional contract remains:
/// a component must register the same hooks, in the same order, on every
/// render of the same instance.
pub struct Scope {
	fiber: FiberRef,
	scheduler: Rc<RefCell<Scheduler>>,
	state_slot: usize,
	error: Option<RenderError>,
}

impl Scope {
	pub(crate) fn new(fiber: FiberRef, scheduler: Rc<RefCell<Scheduler>>) -> Self {
		Self {
			fiber,
			scheduler,
			state_slot: 0,
			error: None,
		}
	}

	/// Returns the current value of this instance's next positional state
	/// slot, together with a setter that schedules a re-render rooted at
	/// this instance.
	///
	/// On the first render the slot is seeded with `initial`; on later
	/// renders the slot is recovered from the previous generation at the
	/// same index and any queued updates are folded into it first.
	pub fn use_state<T: Clone + PartialEq + 'static>(&mut self, initial: T) -> (T, StateSetter<T>) {
		let slot = self.state_slot;
		self.state_slot += 1;
		let span = trace_span!("use_state", slot);
		let _enter = span.enter();

		let previous_cell = {
			let fiber = self.fiber.borrow();
			fiber.previous.as_ref().and_then(|previous| previous.borrow().state_hooks.get(slot).cloned())
		};

		let folded = previous_cell.map(|cell| {
			let mut cell = cell.borrow_mut();
			let mut value = Rc::clone(&cell.value);
			let pending = cell.queue.len();
			if pending != 0 {
				trace!("Folding {} pending update(s) into slot {}.", pending, slot);
			}
			for update in cell.queue.drain(..) {
				value = update(value);
			}
			value
		});

		let (current, value): (T, Rc<dyn Any>) = match folded {
			Some(value) => {
				let recovered = value.downcast_ref::<T>().cloned();
				match recovered {
					Some(current) => (current, value),
					None => {
						error!("State slot {} was recovered with an unexpected value type; reseeding it.", slot);
						self.error.get_or_insert(RenderError::HookTypeMismatch { slot });
						(initial.clone(), Rc::new(initial))
					}
				}
			}
			None => (initial.clone(), Rc::new(initial)),
		};

		let cell = Rc::new(RefCell::new(StateCell {
			value,
			queue: Vec::new(),
		}));
		let setter = StateSetter {
			cell: Rc::downgrade(&cell),
			instance: Rc::downgrade(&self.fiber),
			scheduler: Rc::downgrade(&self.scheduler),
			marker: PhantomData,
		};
		self.fiber.borrow_mut().state_hooks.push(cell);
		(current, setter)
	}

	/// Registers an effect for this render. Nothing runs here: the commit
	/// pass invokes the callback after the host tree has been patched, and
	/// only when `deps` differs element-wise from the previous generation's
	/// list for the same slot (always on first mount).
	pub fn use_effect(&mut self, deps: Vec<Value>, callback: impl Fn() -> Option<Cleanup> + 'static) {
		let cell = Rc::new(RefCell::new(EffectCell {
			callback: Rc::new(callback),
			deps,
			cleanup: None,
		}));
		self.fiber.borrow_mut().effect_hooks.push(cell);
	}

	/// Validates the positional hook contract against the previous
	/// generation once the component function has returned.
	pub(crate) fn finish(self) -> Result<(), RenderError> {
		if let Some(error) = self.error {
			return Err(error);
		}
		let fiber = self.fiber.borrow();
		if let Some(previous) = &fiber.previous {
			let previous = previous.borrow();
			if previous.state_hooks.len() != fiber.state_hooks.len()
				|| previous.effect_hooks.len() != fiber.effect_hooks.len()
			{
				return Err(RenderError::HookOrderMismatch {
					previous: previous.state_hooks.len() + previous.effect_hooks.len(),
					current: fiber.state_hooks.len() + fiber.effect_hooks.len(),
				});
			}
		}
		Ok(())
	}
}

/// Updates one state slot and requests a re-render rooted at the slot's
/// owning instance (captured explicitly at registration time), so a state
/// change deep in the tree re-diffs only its own subtree.
///
/// Setters hold no ownership: one captured from a superseded generation
/// degrades to a logged no-op instead of resurrecting its tree.
pub struct StateSetter<T> {
	cell: Weak<RefCell<StateCell>>,
	instance: FiberWeak,
	scheduler: Weak<RefCell<Scheduler>>,
	marker: PhantomData<fn(T) -> T>,
}

impl<T> Clone for StateSetter<T> {
	fn clone(&self) -> Self {
		Self {
			cell: Weak::clone(&self.cell),
			instance: Weak::clone(&self.instance),
			scheduler: Weak::clone(&self.scheduler),
			marker: PhantomData,
		}
	}
}

impl<T: Clone + PartialEq + 'static> StateSetter<T> {
	/// Replaces the slot's value.
	pub fn set(&self, value: T) {
		self.apply(move |_| value.clone());
	}

	/// Derives the slot's next value from its current one.
	pub fn update(&self, update: impl Fn(&T) -> T + 'static) {
		self.apply(update);
	}

	fn apply(&self, update: impl Fn(&T) -> T + 'static) {
		let Some(cell) = self.cell.upgrade() else {
			warn!("State setter outlived its component instance; ignoring the update.");
			return;
		};

		// Eagerly fold the pending queue to learn the value this update
		// would produce. The update function must be pure: it may run again
		// when the render pass folds the queue for real.
		let folded = {
			let cell = cell.borrow();
			let mut value = Rc::clone(&cell.value);
			for queued in &cell.queue {
				value = queued(value);
			}
			value
		};
		let Some(base) = folded.downcast_ref::<T>() else {
			error!("State cell holds an unexpected value type; ignoring the update.");
			return;
		};
		let next = update(base);
		if next == *base {
			trace!("State update produced an unchanged value; skipping the re-render.");
			return;
		}

		cell.borrow_mut().queue.push(Box::new(move |value: Rc<dyn Any>| -> Rc<dyn Any> {
			if let Some(current) = value.downcast_ref::<T>() {
				return Rc::new(update(current));
			}
			error!("State cell changed value type under a queued update; keeping the previous value.");
			value
		}));

		match (self.scheduler.upgrade(), self.instance.upgrade()) {
			(Some(scheduler), Some(instance)) => schedule::request_rerender(&scheduler, &instance),
			_ => warn!("State update arrived after the renderer was dropped; nothing to re-render."),
		}
	}
}
