#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use xylem::{EventHandler, Host, HostId, HostKind, Renderer, Value};

/// One recorded host mutation, in call order.
#[derive(Clone, PartialEq, Debug)]
pub enum Mutation {
	Create { node: HostId, kind: String },
	SetProperty { node: HostId, name: String },
	RemoveProperty { node: HostId, name: String },
	AddListener { node: HostId, event: String },
	RemoveListener { node: HostId, event: String },
	Append { parent: HostId, child: HostId },
	Remove { parent: HostId, child: HostId },
}

pub struct Record {
	pub kind: String,
	pub props: BTreeMap<String, Value>,
	pub listeners: BTreeMap<String, EventHandler>,
	pub children: Vec<HostId>,
}

/// A host tree that records every mutation the engine performs against it.
#[derive(Default)]
pub struct MockHost {
	next: u64,
	pub nodes: HashMap<HostId, Record>,
	pub mutations: Vec<Mutation>,
}

impl MockHost {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates the container node to render into, without logging a mutation.
	pub fn container(&mut self) -> HostId {
		self.insert("#container")
	}

	fn insert(&mut self, kind: &str) -> HostId {
		let node = HostId(self.next);
		self.next += 1;
		self.nodes.insert(
			node,
			Record {
				kind: kind.to_owned(),
				props: BTreeMap::new(),
				listeners: BTreeMap::new(),
				children: Vec::new(),
			},
		);
		node
	}

	pub fn take_mutations(&mut self) -> Vec<Mutation> {
		std::mem::take(&mut self.mutations)
	}

	pub fn children(&self, node: HostId) -> Vec<HostId> {
		self.nodes[&node].children.clone()
	}

	pub fn listener(&self, node: HostId, event: &str) -> EventHandler {
		self.nodes[&node].listeners[event].clone()
	}

	/// Compact textual rendering of the subtree under `node`:
	/// `tag{prop=value}[listeners](children…)`, text nodes as quoted strings.
	pub fn dump(&self, node: HostId) -> String {
		let record = &self.nodes[&node];
		if record.kind == "#text" {
			return match record.props.get("text") {
				Some(Value::Text(text)) => format!("{text:?}"),
				other => format!("{other:?}"),
			};
		}
		let mut out = record.kind.clone();
		if !record.props.is_empty() {
			let props = record
				.props
				.iter()
				.map(|(name, value)| format!("{name}={}", value_text(value)))
				.collect::<Vec<_>>()
				.join(" ");
			out.push_str(&format!("{{{props}}}"));
		}
		if !record.listeners.is_empty() {
			let listeners = record.listeners.keys().cloned().collect::<Vec<_>>().join(" ");
			out.push_str(&format!("[{listeners}]"));
		}
		if !record.children.is_empty() {
			let children = record
				.children
				.iter()
				.map(|child| self.dump(*child))
				.collect::<Vec<_>>()
				.join(" ");
			out.push_str(&format!("({children})"));
		}
		out
	}
}

fn value_text(value: &Value) -> String {
	match value {
		Value::Bool(value) => value.to_string(),
		Value::Int(value) => value.to_string(),
		Value::Float(value) => value.to_string(),
		Value::Text(value) => format!("{value:?}"),
		Value::Handler(_) => "fn".to_owned(),
	}
}

impl Host for MockHost {
	fn create_node(&mut self, kind: HostKind<'_>) -> HostId {
		let kind = match kind {
			HostKind::Element(tag) => tag.to_owned(),
			HostKind::Text => "#text".to_owned(),
		};
		let node = self.insert(&kind);
		self.mutations.push(Mutation::Create { node, kind });
		node
	}

	fn set_property(&mut self, node: HostId, name: &str, value: &Value) {
		self.nodes.get_mut(&node).unwrap().props.insert(name.to_owned(), value.clone());
		self.mutations.push(Mutation::SetProperty { node, name: name.to_owned() });
	}

	fn remove_property(&mut self, node: HostId, name: &str) {
		self.nodes.get_mut(&node).unwrap().props.remove(name);
		self.mutations.push(Mutation::RemoveProperty { node, name: name.to_owned() });
	}

	fn add_listener(&mut self, node: HostId, event: &str, handler: EventHandler) {
		self.nodes.get_mut(&node).unwrap().listeners.insert(event.to_owned(), handler);
		self.mutations.push(Mutation::AddListener { node, event: event.to_owned() });
	}

	fn remove_listener(&mut self, node: HostId, event: &str) {
		self.nodes.get_mut(&node).unwrap().listeners.remove(event);
		self.mutations.push(Mutation::RemoveListener { node, event: event.to_owned() });
	}

	fn append_child(&mut self, parent: HostId, child: HostId) {
		self.nodes.get_mut(&parent).unwrap().children.push(child);
		self.mutations.push(Mutation::Append { parent, child });
	}

	fn remove_child(&mut self, parent: HostId, child: HostId) {
		self.nodes.get_mut(&parent).unwrap().children.retain(|existing| *existing != child);
		self.mutations.push(Mutation::Remove { parent, child });
	}
}

/// A renderer wired to a fresh recording host.
pub fn renderer() -> (Rc<RefCell<MockHost>>, HostId, Renderer) {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
	let host = Rc::new(RefCell::new(MockHost::new()));
	let container = host.borrow_mut().container();
	let renderer = Renderer::new(host.clone(), container);
	(host, container, renderer)
}
