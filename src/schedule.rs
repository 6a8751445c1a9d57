use crate::commit::apply_properties;
use crate::diff::reconcile_children;
use crate::element::{ComponentFn, Element, ElementKind, Props};
use crate::error::RenderError;
use crate::fiber::{Fiber, FiberRef, MutationTag};
use crate::hooks::Scope;
use crate::host::{Host, HostId, HostKind};
use core::mem;
use core::time::Duration;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{info, trace, trace_span, warn};

/// Tag of the synthetic work node wrapping the container.
const ROOT_TAG: &str = "#root";

/// The work loop yields once less than this much slice time remains. A unit
/// is never split: suspension only happens between units.
const YIELD_MARGIN: Duration = Duration::from_millis(1);

/// View of the host environment's scheduling slice, polled between units.
pub trait Deadline {
	/// Remaining time in the current slice.
	fn time_remaining(&self) -> Duration;
}

/// A deadline that never expires.
///
/// Runs the pass to completion in one call; only suitable when nothing else
/// needs the thread, e.g. tests or a synchronous first paint. An effect that
/// unconditionally schedules new work never lets this return.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unbounded;

impl Deadline for Unbounded {
	fn time_remaining(&self) -> Duration {
		Duration::MAX
	}
}

/// What a [`Renderer::run`] call left behind, so the embedder's scheduling
/// primitive knows whether to re-register for another slice.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WorkStatus {
	/// Everything requested so far is committed and visible.
	Idle,
	/// The slice budget ran out with work left; call `run` again.
	Pending,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum WorkState {
	Idle,
	Working,
	CommitPending,
}

/// All mutable scheduler state, in one place behind one `RefCell`.
///
/// Shared (via `Rc`) between the renderer and the state setters it hands
/// out. Single-threaded by construction; user code (components, effects,
/// event handlers) is always invoked with no outstanding borrow, so a
/// callback may freely schedule new work.
pub(crate) struct Scheduler {
	/// Root of the committed generation that matches the host tree.
	pub current_root: Option<FiberRef>,
	/// Root of the generation being built, if a pass is in flight.
	pub wip_root: Option<FiberRef>,
	pub next_unit: Option<FiberRef>,
	/// Previous-generation nodes displaced during this pass.
	pub deletions: Vec<FiberRef>,
	pub state: WorkState,
}

/// The reconciliation engine: owns the dual-tree bookkeeping and drives the
/// description tree into the host tree across cooperative slices.
///
/// # Correct use
///
/// One `Renderer` per container node. Seed work with [`mount`](Self::mount)
/// (or [`unmount`](Self::unmount)), then call [`run`](Self::run) with the
/// host environment's deadline until it reports [`WorkStatus::Idle`]; keep
/// polling `run` afterwards if event handlers or effects may schedule
/// updates. Host mutations only ever happen inside `run`, and only in the
/// uninterruptible commit step at the end of a completed pass, so an
/// observer of the host tree never sees a half-applied generation.
///
/// Everything is single-threaded; the type is deliberately neither `Send`
/// nor `Sync`.
pub struct Renderer {
	pub(crate) host: Rc<RefCell<dyn Host>>,
	pub(crate) container: HostId,
	pub(crate) scheduler: Rc<RefCell<Scheduler>>,
}

impl Renderer {
	#[must_use]
	pub fn new(host: Rc<RefCell<dyn Host>>, container: HostId) -> Self {
		Self {
			host,
			container,
			scheduler: Rc::new(RefCell::new(Scheduler {
				current_root: None,
				wip_root: None,
				next_unit: None,
				deletions: Vec::new(),
				state: WorkState::Idle,
			})),
		}
	}

	/// Requests a render of `element` into the container. Returns
	/// immediately; the work happens across subsequent [`run`](Self::run)
	/// calls. A pass already in flight is abandoned in place, uncommitted.
	pub fn mount(&mut self, element: Element) {
		self.seed_root(vec![element]);
	}

	/// Requests removal of everything previously mounted, running effect
	/// teardowns for the deleted subtree at commit time.
	pub fn unmount(&mut self) {
		self.seed_root(Vec::new());
	}

	#[must_use]
	pub fn is_idle(&self) -> bool {
		self.scheduler.borrow().state == WorkState::Idle
	}

	fn seed_root(&mut self, children: Vec<Element>) {
		let current = self.scheduler.borrow().current_root.clone();
		let root = Fiber::new_ref(ElementKind::Host(ROOT_TAG), Props::new(), children, MutationTag::Update);
		{
			let mut fiber = root.borrow_mut();
			fiber.host = Some(self.container);
			fiber.previous = current;
		}
		let mut scheduler = self.scheduler.borrow_mut();
		if scheduler.wip_root.is_some() {
			info!("Superseding the in-progress pass with a new root request.");
		}
		scheduler.deletions.clear();
		scheduler.next_unit = Some(Rc::clone(&root));
		scheduler.wip_root = Some(root);
		scheduler.state = WorkState::Working;
	}

	/// Advances the engine one unit at a time until the deadline's slice is
	/// spent or no work remains, committing exactly once per completed pass.
	///
	/// On error the pending pass is dropped wholesale and the previously
	/// committed generation stays visible.
	pub fn run(&mut self, deadline: &dyn Deadline) -> Result<WorkStatus, RenderError> {
		let span = trace_span!("Work loop slice");
		let _enter = span.enter();

		loop {
			let unit = self.scheduler.borrow().next_unit.clone();
			let Some(unit) = unit else {
				if self.scheduler.borrow().wip_root.is_some() {
					// The pass walked every unit; apply it atomically. An
					// effect may seed fresh work, hence the loop continues.
					self.commit_root().map_err(|error| {
						self.abandon();
						error
					})?;
					continue;
				}
				return Ok(WorkStatus::Idle);
			};

			if deadline.time_remaining() < YIELD_MARGIN {
				trace!("Slice budget exhausted; suspending between units.");
				return Ok(WorkStatus::Pending);
			}

			match self.perform_unit(&unit) {
				Ok(next) => {
					let mut scheduler = self.scheduler.borrow_mut();
					// The unit's own render may have scheduled a superseding
					// pass; never clobber a fresh work root.
					if scheduler.next_unit.as_ref().is_some_and(|pending| Rc::ptr_eq(pending, &unit)) {
						scheduler.next_unit = next;
					} else {
						trace!("Pass superseded mid-unit; continuing from the fresh root.");
					}
				}
				Err(error) => {
					self.abandon();
					return Err(error);
				}
			}
		}
	}

	/// One indivisible step: visit a work node (expand its component or
	/// create its host node) and reconcile its children, then pick the next
	/// unit child-first, falling back to the nearest ancestor's sibling.
	fn perform_unit(&mut self, unit: &FiberRef) -> Result<Option<FiberRef>, RenderError> {
		let kind = unit.borrow().kind;
		let span = trace_span!("Visiting work node", kind = ?kind);
		let _enter = span.enter();

		let children = match kind {
			ElementKind::Component(component) => vec![self.render_component(unit, component)?],
			ElementKind::Host(_) | ElementKind::Text => {
				self.prepare_host(unit);
				mem::take(&mut unit.borrow_mut().children)
			}
		};

		reconcile_children(&mut self.scheduler.borrow_mut().deletions, unit, children);

		let root = self.scheduler.borrow().wip_root.clone();
		Ok(next_unit_after(unit, root.as_ref()))
	}

	fn render_component(&mut self, unit: &FiberRef, component: ComponentFn) -> Result<Element, RenderError> {
		let props = unit.borrow().props.clone();
		let mut scope = Scope::new(Rc::clone(unit), Rc::clone(&self.scheduler));
		let rendered = component(&mut scope, &props);
		scope.finish()?;
		Ok(rendered)
	}

	/// Creates the host node for a first-visited host/text work node. The
	/// node starts detached; its initial properties are applied here, before
	/// anything can observe it, and it is only attached during commit.
	fn prepare_host(&mut self, unit: &FiberRef) {
		let created = {
			let fiber = unit.borrow();
			if fiber.host.is_some() {
				None
			} else {
				let kind = match fiber.kind {
					ElementKind::Text => HostKind::Text,
					ElementKind::Host(tag) => HostKind::Element(tag),
					ElementKind::Component(_) => unreachable!("component nodes never own a host node"),
				};
				Some(self.host.borrow_mut().create_node(kind))
			}
		};
		if let Some(node) = created {
			trace!(?node, "Created detached host node.");
			let props = {
				let mut fiber = unit.borrow_mut();
				fiber.host = Some(node);
				fiber.props.clone()
			};
			apply_properties(&mut *self.host.borrow_mut(), node, &Props::new(), &props);
		}
	}

	fn abandon(&mut self) {
		warn!("Abandoning the pending pass; the last committed generation stays visible.");
		let mut scheduler = self.scheduler.borrow_mut();
		scheduler.wip_root = None;
		scheduler.next_unit = None;
		scheduler.deletions.clear();
		scheduler.state = WorkState::Idle;
	}
}

/// Fixed unit-selection priority: first child, else the nearest ancestor's
/// next unvisited sibling, else none: the pass is complete. Never climbs
/// past the pass root: a locally rooted pass must not wander into the
/// enclosing committed tree.
fn next_unit_after(unit: &FiberRef, root: Option<&FiberRef>) -> Option<FiberRef> {
	if let Some(child) = unit.borrow().child.clone() {
		return Some(child);
	}
	let mut current = Rc::clone(unit);
	loop {
		if root.is_some_and(|root| Rc::ptr_eq(&current, root)) {
			return None;
		}
		let (sibling, parent) = {
			let fiber = current.borrow();
			(fiber.sibling.clone(), fiber.parent.upgrade())
		};
		if let Some(sibling) = sibling {
			return Some(sibling);
		}
		match parent {
			Some(parent) => current = parent,
			None => return None,
		}
	}
}

/// Seeds a work-in-progress pass rooted at `instance` (an interior work
/// node captured by a state setter at hook-registration time), so a deep
/// state change re-diffs only its own subtree.
pub(crate) fn request_rerender(scheduler: &Rc<RefCell<Scheduler>>, instance: &FiberRef) {
	let root = {
		let fiber = instance.borrow();
		let root = Fiber::new_ref(fiber.kind, fiber.props.clone(), fiber.children.clone(), MutationTag::Update);
		{
			let mut wip = root.borrow_mut();
			wip.parent = fiber.parent.clone();
			wip.host = fiber.host;
			wip.previous = Some(Rc::clone(instance));
		}
		root
	};
	trace!("Re-render requested at an interior instance.");
	let mut scheduler = scheduler.borrow_mut();
	if scheduler.wip_root.is_some() {
		info!("Superseding the in-progress pass with a localized request.");
	}
	scheduler.deletions.clear();
	scheduler.next_unit = Some(Rc::clone(&root));
	scheduler.wip_root = Some(root);
	scheduler.state = WorkState::Working;
}
