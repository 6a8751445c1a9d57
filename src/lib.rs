#![warn(clippy::pedantic)]

//! An incremental UI-tree reconciler.
//!
//! Given a declarative description of a UI, a tree of typed [`Element`]s,
//! the engine produces and keeps synchronized a mutable host-presentation
//! tree, reached only through the narrow [`Host`] contract. Re-rendering
//! never rebuilds the host tree: each pass diffs the new description against
//! the committed generation one work node at a time, cooperatively yielding
//! between nodes when the [`Deadline`]'s slice runs out, and applies the
//! computed mutations in one atomic commit step, so an observer of the host
//! tree never sees a half-updated generation.
//!
//! Components are plain functions ([`ComponentFn`]). Their per-instance
//! state and effects live in positional hook slots reached through the
//! [`Scope`] each render receives, and a [`StateSetter`] captured from a
//! hook re-renders just the subtree of the instance that owns it.

mod commit;
mod diff;
mod element;
mod error;
mod fiber;
mod hooks;
mod host;
mod schedule;

pub use element::{ComponentFn, Element, ElementKind, EventHandler, Props, Value};
pub use error::RenderError;
pub use hooks::{Cleanup, Scope, StateSetter};
pub use host::{Host, HostId, HostKind};
pub use schedule::{Deadline, Renderer, Unbounded, WorkStatus};
