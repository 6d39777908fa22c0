use thiserror::Error;
use tracing::error;

/// Caller errors reported by [`Reconciler`](`crate::Reconciler`) instructions.
///
/// With the exception of [`Error::NotInPatch`], these are only detected while [`Config::diagnostics`](`crate::Config::diagnostics`) is enabled.
/// The target tree is left as-is when one is returned, which means it may be partially patched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	#[error("`{operation}` can only be called during a patch")]
	NotInPatch { operation: &'static str },

	#[error("`{operation}` can't be called while declaring the attributes of <{tag}>")]
	InAttributes { operation: &'static str, tag: String },

	#[error("`{operation}` can only be called after `element_open_start`")]
	NotInAttributes { operation: &'static str },

	#[error("the attribute declaration of <{tag}> was never finished with `element_open_end`")]
	AttributesNotClosed { tag: String },

	#[error("was expecting node with key {key:?} to be a {expected}, not a {found}")]
	KeyedKindMismatch { key: String, expected: String, found: String },

	#[error("key {key:?} was declared more than once among the children of <{parent}>")]
	DuplicateKey { key: String, parent: String },

	#[error("received a call to close <{found}> but <{expected}> was open")]
	MismatchedClose { expected: String, found: String },

	#[error("received a call to close <{found}> but no element was open")]
	UnmatchedClose { found: String },

	#[error("one or more tags were not closed: {}", .tags.join(", "))]
	UnclosedTags { tags: Vec<String> },

	#[error("`skip` must be called before any child is declared inside <{parent}>")]
	SkipAfterChildren { parent: String },

	#[error("`{operation}` can't be called after `skip` inside <{parent}>")]
	AfterSkip { operation: &'static str, parent: String },

	#[error("there must be exactly one top level call corresponding to the patched element")]
	OuterPatchShape,

	#[error("can't patch the outside of a node that has no parent")]
	NoParent,
}

/// Logs `error` before it's returned to the caller.
pub(crate) fn report(error: Error) -> Error {
	error!("{}", error);
	error
}
