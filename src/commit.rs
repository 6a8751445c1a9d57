use crate::element::{Props, Value};
use crate::error::RenderError;
use crate::fiber::{host_ancestor, FiberRef, MutationTag};
use crate::hooks::Cleanup;
use crate::host::{Host, HostId};
use crate::schedule::{Renderer, WorkState};
use core::mem;
use std::rc::Rc;
use tracing::{info, trace, trace_span, warn};

enum EffectDue {
	/// Invoke: first the carried teardown (if any), then the callback.
	Run(Option<Cleanup>),
	/// Dependencies unchanged; only carry the teardown forward so it stays
	/// reachable for the next re-run and for unmount.
	Skip(Option<Cleanup>),
}

impl Renderer {
	/// Applies a completed pass to the host tree in one uninterrupted sweep:
	/// deletions, then placements and property patches in depth-first
	/// pre-order, then due effects, then the generation swap. Nothing here
	/// yields, so the host tree is never observable half-patched.
	pub(crate) fn commit_root(&mut self) -> Result<(), RenderError> {
		let (deletions, wip) = {
			let mut scheduler = self.scheduler.borrow_mut();
			scheduler.state = WorkState::CommitPending;
			(mem::take(&mut scheduler.deletions), scheduler.wip_root.take())
		};
		let Some(wip) = wip else {
			self.scheduler.borrow_mut().state = WorkState::Idle;
			return Ok(());
		};

		let span = trace_span!("Committing pass", deletions = deletions.len());
		let _enter = span.enter();

		for deleted in &deletions {
			self.commit_deletion(deleted)?;
		}

		let first_child = wip.borrow().child.clone();
		self.commit_work(first_child.as_ref())?;
		self.run_effects(&wip);
		self.finish_commit(&wip);
		info!("Committed one generation.");
		Ok(())
	}

	/// Runs the deleted subtree's effect teardowns, then detaches its
	/// topmost host nodes from the nearest host-owning ancestor. A
	/// component-kind node owns no host node itself; its host presence is
	/// whatever its descendants own.
	fn commit_deletion(&self, deleted: &FiberRef) -> Result<(), RenderError> {
		let span = trace_span!("Committing deletion", kind = ?deleted.borrow().kind);
		let _enter = span.enter();

		let mut cleanups = Vec::new();
		collect_cleanups(deleted, &mut cleanups);
		if !cleanups.is_empty() {
			trace!("Running {} effect teardown(s) before detaching.", cleanups.len());
		}
		for cleanup in cleanups {
			cleanup();
		}

		let parent_host = host_ancestor(deleted)?;
		self.remove_host_subtree(deleted, parent_host);
		Ok(())
	}

	fn remove_host_subtree(&self, fiber: &FiberRef, parent_host: HostId) {
		let (host, child) = {
			let fiber = fiber.borrow();
			(fiber.host, fiber.child.clone())
		};
		match host {
			Some(node) => {
				trace!(?node, "Detaching host subtree.");
				self.host.borrow_mut().remove_child(parent_host, node);
			}
			None => {
				let mut cursor = child;
				while let Some(node) = cursor {
					self.remove_host_subtree(&node, parent_host);
					cursor = node.borrow().sibling.clone();
				}
			}
		}
	}

	/// Depth-first pre-order placement and property patching.
	fn commit_work(&self, fiber: Option<&FiberRef>) -> Result<(), RenderError> {
		let Some(fiber) = fiber else {
			return Ok(());
		};
		let (tag, host, previous, props, child, sibling) = {
			let fiber = fiber.borrow();
			(
				fiber.tag,
				fiber.host,
				fiber.previous.clone(),
				fiber.props.clone(),
				fiber.child.clone(),
				fiber.sibling.clone(),
			)
		};

		if let Some(node) = host {
			match tag {
				MutationTag::Insert => {
					// Deletions ran first and positional diffing recreates
					// any displaced tail, so plain appends land in document
					// order matching tree order.
					let parent = host_ancestor(fiber)?;
					trace!(?node, ?parent, "Attaching host node.");
					self.host.borrow_mut().append_child(parent, node);
				}
				MutationTag::Update => {
					let old_props = previous.as_ref().map(|previous| previous.borrow().props.clone()).unwrap_or_default();
					apply_properties(&mut *self.host.borrow_mut(), node, &old_props, &props);
				}
			}
		}

		self.commit_work(child.as_ref())?;
		self.commit_work(sibling.as_ref())
	}

	/// Depth-first effect pass over the committed tree. A first-mounted node
	/// runs every effect; an updated node runs an effect only when its
	/// dependency list differs element-wise from the previous generation's.
	/// A due effect's carried teardown runs before the callback re-fires.
	fn run_effects(&self, fiber: &FiberRef) {
		let (previous, cells, child, sibling) = {
			let fiber = fiber.borrow();
			(
				fiber.previous.clone(),
				fiber.effect_hooks.clone(),
				fiber.child.clone(),
				fiber.sibling.clone(),
			)
		};
		let old_cells = previous.map(|previous| previous.borrow().effect_hooks.clone());

		for (slot, cell) in cells.iter().enumerate() {
			let due = match &old_cells {
				None => EffectDue::Run(None),
				Some(old_cells) => match old_cells.get(slot) {
					None => {
						warn!("Effect slot {} has no previous counterpart; treating it as a mount.", slot);
						EffectDue::Run(None)
					}
					Some(old_cell) => {
						let changed = old_cell.borrow().deps != cell.borrow().deps;
						let carried = old_cell.borrow_mut().cleanup.take();
						if changed {
							EffectDue::Run(carried)
						} else {
							EffectDue::Skip(carried)
						}
					}
				},
			};

			// User code below; no engine borrow may be outstanding.
			match due {
				EffectDue::Run(carried) => {
					if let Some(cleanup) = carried {
						cleanup();
					}
					let callback = Rc::clone(&cell.borrow().callback);
					let cleanup = callback();
					cell.borrow_mut().cleanup = cleanup;
				}
				EffectDue::Skip(carried) => {
					cell.borrow_mut().cleanup = carried;
				}
			}
		}

		if let Some(child) = child {
			self.run_effects(&child);
		}
		if let Some(sibling) = sibling {
			self.run_effects(&sibling);
		}
	}

	/// The generation swap: promote (or splice) the committed tree, sever
	/// every back link so at most one prior generation stays reachable, and
	/// settle the state machine, unless an effect already seeded new work.
	fn finish_commit(&self, wip: &FiberRef) {
		let parent = wip.borrow().parent.upgrade();
		match parent {
			None => {
				self.scheduler.borrow_mut().current_root = Some(Rc::clone(wip));
			}
			Some(parent) => splice(&parent, wip),
		}
		clear_previous(wip);

		let mut scheduler = self.scheduler.borrow_mut();
		if scheduler.state != WorkState::Working {
			scheduler.state = WorkState::Idle;
		}
	}
}

/// Replaces the instance a locally rooted pass re-rendered with its new
/// generation, inside the enclosing committed tree.
fn splice(parent: &FiberRef, wip: &FiberRef) {
	let Some(old) = wip.borrow().previous.clone() else {
		warn!("Locally rooted pass without a previous generation; cannot splice it into the committed tree.");
		return;
	};
	wip.borrow_mut().sibling = old.borrow().sibling.clone();

	if parent.borrow().child.as_ref().is_some_and(|child| Rc::ptr_eq(child, &old)) {
		parent.borrow_mut().child = Some(Rc::clone(wip));
		return;
	}
	let mut cursor = parent.borrow().child.clone();
	while let Some(node) = cursor {
		let next = node.borrow().sibling.clone();
		if next.as_ref().is_some_and(|next| Rc::ptr_eq(next, &old)) {
			node.borrow_mut().sibling = Some(Rc::clone(wip));
			return;
		}
		cursor = next;
	}
	warn!("The re-rendered instance is not in its parent's child chain; the update targeted a superseded generation.");
}

fn clear_previous(fiber: &FiberRef) {
	let child = {
		let mut fiber = fiber.borrow_mut();
		fiber.previous = None;
		fiber.child.clone()
	};
	let mut cursor = child;
	while let Some(node) = cursor {
		clear_previous(&node);
		cursor = node.borrow().sibling.clone();
	}
}

fn collect_cleanups(fiber: &FiberRef, cleanups: &mut Vec<Cleanup>) {
	let child = {
		let fiber = fiber.borrow();
		for cell in &fiber.effect_hooks {
			if let Some(cleanup) = cell.borrow_mut().cleanup.take() {
				cleanups.push(cleanup);
			}
		}
		fiber.child.clone()
	};
	let mut cursor = child;
	while let Some(node) = cursor {
		collect_cleanups(&node, cleanups);
		cursor = node.borrow().sibling.clone();
	}
}

/// Patches one host node from `old` to `new`: names present in `old` but
/// absent in `new` are unset, names whose value differs are set, and names
/// matching the `on…` event-binding scheme go through the listener
/// primitives instead of plain assignment.
pub(crate) fn apply_properties(host: &mut dyn Host, node: HostId, old: &Props, new: &Props) {
	for (name, value) in old {
		if new.contains_key(name) {
			continue;
		}
		match (listener_event(name), value) {
			(Some(event), Value::Handler(_)) => host.remove_listener(node, &event),
			_ => host.remove_property(node, name),
		}
	}

	for (name, value) in new {
		let prior = old.get(name);
		if prior == Some(value) {
			continue;
		}
		match (listener_event(name), value) {
			(Some(event), Value::Handler(handler)) => {
				if matches!(prior, Some(Value::Handler(_))) {
					host.remove_listener(node, &event);
				} else if prior.is_some() {
					host.remove_property(node, name);
				}
				host.add_listener(node, &event, handler.clone());
			}
			(Some(event), value) => {
				warn!("Listener-named property {:?} holds a non-handler value; assigning it as a plain property.", name);
				if matches!(prior, Some(Value::Handler(_))) {
					host.remove_listener(node, &event);
				}
				host.set_property(node, name, value);
			}
			(None, value) => host.set_property(node, name, value),
		}
	}
}

fn listener_event(name: &str) -> Option<String> {
	name.strip_prefix("on").filter(|event| !event.is_empty()).map(str::to_ascii_lowercase)
}
