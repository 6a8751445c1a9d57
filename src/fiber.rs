use crate::element::{Element, ElementKind, Props};
use crate::error::RenderError;
use crate::hooks::{EffectCell, StateCell};
use crate::host::HostId;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub(crate) type FiberRef = Rc<RefCell<Fiber>>;
pub(crate) type FiberWeak = Weak<RefCell<Fiber>>;

/// How the commit pass treats a work node. Deletion is not a tag: deleted
/// previous-generation nodes are collected on the scheduler's side list
/// instead, since they are no longer part of the new tree at all.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum MutationTag {
	Insert,
	Update,
}

/// One mutable work node, the engine-side counterpart of one description-tree
/// position.
///
/// Ownership is strictly top-down: `child` and `sibling` are the only owning
/// links, `parent` is weak, and `previous` points one generation back purely
/// for diffing and hook continuity. `previous` is severed when a pass
/// commits, so at most two generations are ever alive.
pub(crate) struct Fiber {
	pub kind: ElementKind,
	pub parent: FiberWeak,
	pub child: Option<FiberRef>,
	pub sibling: Option<FiberRef>,
	/// Set at most once, when this node is first visited, and only for
	/// host/text kinds. Replacing a host node means replacing the work node.
	pub host: Option<HostId>,
	pub props: Props,
	/// Child descriptions still to be reconciled; drained when visited.
	pub children: Vec<Element>,
	pub previous: Option<FiberRef>,
	pub tag: MutationTag,
	pub state_hooks: Vec<Rc<RefCell<StateCell>>>,
	pub effect_hooks: Vec<Rc<RefCell<EffectCell>>>,
}

impl Fiber {
	pub fn new_ref(kind: ElementKind, props: Props, children: Vec<Element>, tag: MutationTag) -> FiberRef {
		Rc::new(RefCell::new(Self {
			kind,
			parent: Weak::new(),
			child: None,
			sibling: None,
			host: None,
			props,
			children,
			previous: None,
			tag,
			state_hooks: Vec::new(),
			effect_hooks: Vec::new(),
		}))
	}
}

/// Resolves the nearest ancestor that owns a host node, skipping
/// component-kind ancestors.
pub(crate) fn host_ancestor(fiber: &FiberRef) -> Result<HostId, RenderError> {
	let mut current = fiber.borrow().parent.upgrade();
	while let Some(ancestor) = current {
		let ancestor = ancestor.borrow();
		if let Some(host) = ancestor.host {
			return Ok(host);
		}
		current = ancestor.parent.upgrade();
	}
	Err(RenderError::MissingHostAncestor)
}
