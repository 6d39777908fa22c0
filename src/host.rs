//! The target tree provider a [`Reconciler`](`crate::Reconciler`) patches.

use crate::{attributes::Value, record::RecordKey};
use core::fmt::Debug;

/// A mutable tree the [`Reconciler`](`crate::Reconciler`) can align with descriptions.
///
/// Implementations only need to provide the primitives below. All bookkeeping (keys, attribute caches, child order)
/// happens in the reconciler's own [records](`crate::record`), which mirror the parts of the tree under management.
///
/// # Correct Use
///
/// Subtrees that are patched must not be restructured by anything other than the reconciler in between patches,
/// since the recorded child order would otherwise go stale.
///
/// Each tree should be managed by at most one [`Reconciler`](`crate::Reconciler`), as record slots are not shared.
pub trait Host: 'static {
	/// A cheap handle to one node in the tree. Equality must be identity.
	type Node: Clone + PartialEq + Debug;

	/// Non-primitive attribute payloads, which are assigned as properties by default.
	type Property: Clone + PartialEq + Debug + 'static;

	/// Creates a detached element.
	///
	/// `namespace` is [`None`] for elements in the host's default namespace.
	fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> Self::Node;

	/// Creates a detached empty text node.
	fn create_text(&mut self) -> Self::Node;

	/// Inserts `child` into `parent` before `reference`, or at the end if `reference` is [`None`].
	///
	/// `child` may currently be attached anywhere, in which case it is moved.
	fn insert_before(&mut self, parent: &Self::Node, child: &Self::Node, reference: Option<&Self::Node>);

	/// Puts `new_child` into the place of `old_child`, which is detached afterwards.
	fn replace_child(&mut self, parent: &Self::Node, new_child: &Self::Node, old_child: &Self::Node);

	/// Detaches `child` from `parent`.
	fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node);

	fn set_text(&mut self, node: &Self::Node, text: &str);

	fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);

	fn remove_attribute(&mut self, node: &Self::Node, name: &str);

	/// Assigns a property directly. [`None`] stands for an undefined value.
	fn set_property(&mut self, node: &Self::Node, name: &str, value: Option<&Value<Self::Property>>);

	/// Replaces the inline style of an element.
	///
	/// Primitive values are the whole declaration text. A [`Value::Object`] holds individual declarations,
	/// which are applied one by one after clearing the previous ones. [`None`] clears the inline style.
	fn set_style(&mut self, node: &Self::Node, style: Option<&Value<Self::Property>>);

	fn parent_node(&self, node: &Self::Node) -> Option<Self::Node>;

	fn first_child(&self, node: &Self::Node) -> Option<Self::Node>;

	fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

	/// The node kind as it is declared in descriptions: `"#text"` for text nodes, otherwise the tag name.
	fn node_name(&self, node: &Self::Node) -> String;

	/// The `key` attribute of pre-existing elements, which is adopted as their key when they are first encountered.
	fn key_attribute(&self, node: &Self::Node) -> Option<String>;

	fn namespace(&self, node: &Self::Node) -> Option<String>;

	/// The node that currently holds input focus, if any.
	fn focused(&self) -> Option<Self::Node>;

	/// Retrieves the record key attached through [`Host::set_record`].
	fn record(&self, node: &Self::Node) -> Option<RecordKey>;

	fn set_record(&mut self, node: &Self::Node, record: Option<RecordKey>);
}
