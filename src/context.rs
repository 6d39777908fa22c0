//! State of one pass, and the observer it reports to once it's done.

use crate::{
	attributes::Value,
	record::RecordKey,
	walk::Walk,
};
use core::fmt;
use hashbrown::HashSet;

/// A node created during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created<N> {
	pub node: N,
	/// The parent the node was created for.
	pub parent: N,
	/// `"#text"` or the element's tag.
	pub kind: String,
	pub key: Option<String>,
}

/// A node that was removed during a pass and not reattached before it ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deleted<N> {
	pub node: N,
	/// The parent the node was removed from.
	pub parent: N,
}

type Callback<T> = Box<dyn FnMut(&[T])>;

/// Optional observers of structural changes.
///
/// Each callback is called at most once per pass, after its structural work is complete, and only with a non-empty list.
pub struct Notifications<N> {
	nodes_created: Option<Callback<Created<N>>>,
	nodes_deleted: Option<Callback<Deleted<N>>>,
}

impl<N> Notifications<N> {
	#[must_use]
	pub fn new() -> Self {
		Self {
			nodes_created: None,
			nodes_deleted: None,
		}
	}

	/// Created nodes are only collected while this callback is set.
	pub fn set_nodes_created(&mut self, callback: impl 'static + FnMut(&[Created<N>])) {
		self.nodes_created = Some(Box::new(callback));
	}

	pub fn clear_nodes_created(&mut self) {
		self.nodes_created = None;
	}

	pub fn set_nodes_deleted(&mut self, callback: impl 'static + FnMut(&[Deleted<N>])) {
		self.nodes_deleted = Some(Box::new(callback));
	}

	pub fn clear_nodes_deleted(&mut self) {
		self.nodes_deleted = None;
	}

	pub(crate) fn wants_created(&self) -> bool {
		self.nodes_created.is_some()
	}

	pub(crate) fn nodes_created(&mut self, created: &[Created<N>]) {
		if let (Some(callback), false) = (&mut self.nodes_created, created.is_empty()) {
			callback(created);
		}
	}

	pub(crate) fn nodes_deleted(&mut self, deleted: &[Deleted<N>]) {
		if let (Some(callback), false) = (&mut self.nodes_deleted, deleted.is_empty()) {
			callback(deleted);
		}
	}
}

impl<N> Default for Notifications<N> {
	fn default() -> Self {
		Self::new()
	}
}

impl<N> fmt::Debug for Notifications<N> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Notifications")
			.field("nodes_created", &self.nodes_created.is_some())
			.field("nodes_deleted", &self.nodes_deleted.is_some())
			.finish()
	}
}

/// An element whose attributes are still being declared through [`Reconciler::attr`](`crate::Reconciler::attr`).
#[derive(Debug)]
pub(crate) struct OpenStart<P> {
	pub(crate) tag: String,
	pub(crate) key: Option<String>,
	pub(crate) statics: Vec<(String, Value<P>)>,
	pub(crate) attributes: Vec<(String, Value<P>)>,
}

#[derive(Debug)]
pub(crate) struct Context<N, P> {
	pub(crate) walk: Walk,
	/// How many elements are open within this pass.
	pub(crate) depth: usize,
	/// Namespace of each open level, starting with that of the patched parent.
	namespaces: Vec<Option<String>>,
	/// The parent each open level was entered from.
	parents: Vec<RecordKey>,

	/// [`None`] if nobody listens.
	created: Option<Vec<(RecordKey, N)>>,
	/// Always collected, since detached records are freed based on it.
	deleted: Vec<(RecordKey, N)>,

	pub(crate) open: Option<OpenStart<P>>,
	pub(crate) in_skip: bool,
	/// Keys declared per open level. Only tracked with diagnostics enabled.
	seen_keys: Option<Vec<HashSet<String>>>,
}

impl<N, P> Context<N, P> {
	pub(crate) fn new(walk: Walk, namespace: Option<String>, collect_created: bool, diagnostics: bool) -> Self {
		Self {
			walk,
			depth: 0,
			namespaces: vec![namespace],
			parents: Vec::new(),
			created: collect_created.then(Vec::new),
			deleted: Vec::new(),
			open: None,
			in_skip: false,
			seen_keys: diagnostics.then(|| vec![HashSet::new()]),
		}
	}

	pub(crate) fn namespace(&self) -> Option<&str> {
		self.namespaces.last().and_then(Option::as_deref)
	}

	/// Descends into `parent`, whose children are declared next.
	pub(crate) fn enter(&mut self, parent: RecordKey, namespace: Option<String>) {
		self.parents.push(self.walk.current_parent);
		self.walk.descend(parent);
		self.depth += 1;
		self.namespaces.push(namespace);
		if let Some(seen_keys) = &mut self.seen_keys {
			seen_keys.push(HashSet::new());
		}
	}

	pub(crate) fn exit(&mut self) {
		if let Some(parent) = self.parents.pop() {
			self.walk.ascend(parent);
		}
		self.depth -= 1;
		self.namespaces.pop();
		if let Some(seen_keys) = &mut self.seen_keys {
			seen_keys.pop();
		}
		self.in_skip = false;
	}

	/// Returns `false` if `key` was already declared at the current level.
	///
	/// Always `true` without diagnostics.
	pub(crate) fn declare_key(&mut self, key: &str) -> bool {
		match self.seen_keys.as_mut().and_then(|seen_keys| seen_keys.last_mut()) {
			Some(seen) => seen.insert(key.to_owned()),
			None => true,
		}
	}

	pub(crate) fn mark_created(&mut self, record: RecordKey, parent: N) {
		if let Some(created) = &mut self.created {
			created.push((record, parent));
		}
	}

	pub(crate) fn mark_deleted(&mut self, record: RecordKey, parent: N) {
		self.deleted.push((record, parent));
	}

	pub(crate) fn into_changes(self) -> (Option<Vec<(RecordKey, N)>>, Vec<(RecordKey, N)>) {
		(self.created, self.deleted)
	}
}
