use crate::element::Element;
use crate::fiber::{Fiber, FiberRef, MutationTag};
use std::rc::Rc;
use tracing::{trace, trace_span};

/// Produces the new generation's child chain for `wip` from its resolved
/// child descriptions, recording displaced previous-generation nodes on the
/// deletions side list.
///
/// The previous sibling chain is walked in lockstep with the new child list:
/// one previous sibling is consumed per child produced, match or not. There
/// is no cross-index search: a reordered child is observed as a deletion
/// plus an insertion, which bounds the diff to one pass over each level.
pub(crate) fn reconcile_children(deletions: &mut Vec<FiberRef>, wip: &FiberRef, children: Vec<Element>) {
	let span = trace_span!("Reconciling children", "children.len()" = children.len());
	let _enter = span.enter();

	let mut old = wip.borrow().previous.as_ref().and_then(|previous| previous.borrow().child.clone());
	let mut last_linked: Option<FiberRef> = None;

	for element in children {
		let reusable = old.as_ref().filter(|old_fiber| old_fiber.borrow().kind == element.kind).cloned();

		let fiber = match reusable {
			Some(old_fiber) => {
				// The only path that keeps a host node in place.
				trace!(kind = ?element.kind, "Kinds match; updating in place.");
				let fiber = Fiber::new_ref(element.kind, element.props, element.children, MutationTag::Update);
				{
					let mut fiber = fiber.borrow_mut();
					fiber.host = old_fiber.borrow().host;
					fiber.previous = Some(Rc::clone(&old_fiber));
				}
				fiber
			}
			None => {
				if let Some(displaced) = &old {
					trace!(old = ?displaced.borrow().kind, new = ?element.kind, "Kinds differ; replacing the whole subtree.");
					deletions.push(Rc::clone(displaced));
				} else {
					trace!(kind = ?element.kind, "No previous counterpart; inserting.");
				}
				Fiber::new_ref(element.kind, element.props, element.children, MutationTag::Insert)
			}
		};

		fiber.borrow_mut().parent = Rc::downgrade(wip);
		match &last_linked {
			None => wip.borrow_mut().child = Some(Rc::clone(&fiber)),
			Some(previous_sibling) => previous_sibling.borrow_mut().sibling = Some(Rc::clone(&fiber)),
		}
		last_linked = Some(fiber);

		old = old.and_then(|old_fiber| old_fiber.borrow().sibling.clone());
	}

	// The description shrank: everything left on the previous chain goes.
	let mut trailing = 0_usize;
	while let Some(old_fiber) = old {
		trailing += 1;
		deletions.push(Rc::clone(&old_fiber));
		old = old_fiber.borrow().sibling.clone();
	}
	if trailing != 0 {
		trace!("Marked {} trailing previous child(ren) for deletion.", trailing);
	}
}
