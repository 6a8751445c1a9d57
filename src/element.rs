use crate::hooks::Scope;
use core::fmt::{self, Debug, Formatter};
use core::ptr;
use std::rc::Rc;

/// Property map of a single description node.
///
/// Property names matching the `on…` event-binding scheme (`"onclick"`,
/// `"oninput"`, …) are routed through the host's listener primitives instead
/// of plain property assignment; everything else is an ordinary property.
pub type Props = hashbrown::HashMap<String, Value>;

/// A component: a pure function from properties to a subtree.
///
/// Hooks are only available through the [`Scope`] handed to the function,
/// which is valid for exactly one render of one instance.
pub type ComponentFn = fn(&mut Scope, &Props) -> Element;

/// Property under which a synthetic text node carries its content.
pub(crate) const TEXT_PROP: &str = "text";

/// The kind of a description node, resolved once per work-node visit.
#[derive(Clone, Copy, Debug)]
pub enum ElementKind {
	/// A primitive host node with the given tag.
	Host(&'static str),
	/// A synthetic text node; its content lives under the `"text"` property.
	Text,
	/// A component function producing a subtree.
	Component(ComponentFn),
}

impl PartialEq for ElementKind {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Host(a), Self::Host(b)) => a == b,
			(Self::Text, Self::Text) => true,
			(Self::Component(a), Self::Component(b)) => ptr::fn_addr_eq(*a, *b),
			_ => false,
		}
	}
}

/// An invokable event callback, compared by identity.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn()>);

impl EventHandler {
	pub fn new(handler: impl Fn() + 'static) -> Self {
		Self(Rc::new(handler))
	}

	pub fn invoke(&self) {
		(self.0)();
	}
}

impl PartialEq for EventHandler {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl Debug for EventHandler {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0))
	}
}

/// A property value.
///
/// `PartialEq` is value equality except for [`Value::Handler`], which
/// compares by callback identity, and [`Value::Float`], which keeps IEEE
/// semantics: a `NaN` never equals itself, so it defeats equality-based
/// no-op detection without ever being an error.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
	Bool(bool),
	Int(i64),
	Float(f64),
	Text(String),
	Handler(EventHandler),
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Self::Int(value.into())
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::Text(value.to_owned())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}

impl From<EventHandler> for Value {
	fn from(value: EventHandler) -> Self {
		Self::Handler(value)
	}
}

/// One node of the immutable description tree: a kind, a property map and an
/// ordered child list. Produced fresh on every render and never mutated
/// afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
	pub kind: ElementKind,
	pub props: Props,
	pub children: Vec<Element>,
}

impl Element {
	#[must_use]
	pub fn host(tag: &'static str) -> Self {
		Self {
			kind: ElementKind::Host(tag),
			props: Props::new(),
			children: Vec::new(),
		}
	}

	/// A synthetic text node carrying `content`.
	#[must_use]
	pub fn text(content: impl Into<String>) -> Self {
		let mut props = Props::new();
		props.insert(TEXT_PROP.to_owned(), Value::Text(content.into()));
		Self {
			kind: ElementKind::Text,
			props,
			children: Vec::new(),
		}
	}

	#[must_use]
	pub fn component(component: ComponentFn) -> Self {
		Self {
			kind: ElementKind::Component(component),
			props: Props::new(),
			children: Vec::new(),
		}
	}

	#[must_use]
	pub fn prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.props.insert(name.into(), value.into());
		self
	}

	/// Binds `handler` to the host event `event` ("click", "input", …).
	#[must_use]
	pub fn on(mut self, event: &str, handler: impl Fn() + 'static) -> Self {
		self.props.insert(format!("on{event}"), Value::Handler(EventHandler::new(handler)));
		self
	}

	#[must_use]
	pub fn child(mut self, child: Element) -> Self {
		self.children.push(child);
		self
	}

	/// Normalizes inline text into a synthetic text-kind child.
	#[must_use]
	pub fn child_text(mut self, content: impl Into<String>) -> Self {
		self.children.push(Self::text(content));
		self
	}

	#[must_use]
	pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
		self.children.extend(children);
		self
	}
}
