use crate::element::{EventHandler, Value};

/// Opaque handle to one node of the host presentation tree.
///
/// Handles are minted by [`Host::create_node`] and stay valid until the node
/// is removed from its parent; the engine never forges or reinterprets them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct HostId(pub u64);

/// The kind of host node to create.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HostKind<'a> {
	/// An empty container node with the given tag.
	Element(&'a str),
	/// An empty text node.
	Text,
}

/// The narrow mutation contract of the host presentation tree.
///
/// The engine calls these primitives only during host-node creation and the
/// commit pass; it never reads the host tree back. Event-binding properties
/// are routed through [`add_listener`](Host::add_listener) /
/// [`remove_listener`](Host::remove_listener) rather than
/// [`set_property`](Host::set_property), mirroring how listeners and plain
/// attributes have different lifetimes on real presentation trees.
pub trait Host {
	fn create_node(&mut self, kind: HostKind<'_>) -> HostId;
	fn set_property(&mut self, node: HostId, name: &str, value: &Value);
	fn remove_property(&mut self, node: HostId, name: &str);
	fn add_listener(&mut self, node: HostId, event: &str, handler: EventHandler);
	fn remove_listener(&mut self, node: HostId, event: &str);
	fn append_child(&mut self, parent: HostId, child: HostId);
	fn remove_child(&mut self, parent: HostId, child: HostId);
}
