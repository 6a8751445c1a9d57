use thiserror::Error;

/// A structural violation that aborts the in-progress render pass.
///
/// None of these leave the host tree half-updated: a pass only commits after
/// it has completed in full, so on error the previously committed generation
/// stays intact and visible.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum RenderError {
	/// A component registered a different number of hooks than its previous
	/// generation did. Hook identity is positional; recovering here would
	/// silently attach state to the wrong slot.
	#[error("hook list changed between generations: {previous} hook(s) previously, {current} now")]
	HookOrderMismatch { previous: usize, current: usize },

	/// A state slot was recovered with a different value type than it was
	/// seeded with, which is the same positional violation in disguise.
	#[error("state hook at slot {slot} changed value type between generations")]
	HookTypeMismatch { slot: usize },

	/// A host mutation had no host-owning ancestor to attach to. Every
	/// work-node tree is rooted at a node owning the container, so this
	/// indicates a defect in the engine itself.
	#[error("no host-owning ancestor reachable while committing a mutation")]
	MissingHostAncestor,
}
