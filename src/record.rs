//! Per-node bookkeeping that mirrors the managed parts of a [`Host`](`crate::Host`) tree.

use crate::{attributes::Value, key_index::KeyIndex};
use core::ops::{Index, IndexMut};
use hashbrown::HashMap;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
	/// Identifies a node record within one [`Reconciler`](`crate::Reconciler`).
	///
	/// Keys are generational: A key attached to a host node outlives its record harmlessly and is simply ignored.
	pub struct RecordKey;
}

#[derive(Debug)]
pub(crate) struct NodeRecord<N, P> {
	pub(crate) node: N,
	/// `"#text"` or the element's tag.
	pub(crate) kind: String,
	pub(crate) key: Option<String>,
	pub(crate) namespace: Option<String>,

	/// Last applied attribute values.
	pub(crate) attributes: HashMap<String, Value<P>>,
	/// The dynamic attribute list of the previous pass, in declaration order.
	pub(crate) dynamic_attributes: Vec<(String, Value<P>)>,
	/// Last written text, for text nodes.
	pub(crate) text: Option<String>,

	pub(crate) parent: Option<RecordKey>,
	pub(crate) previous_sibling: Option<RecordKey>,
	pub(crate) next_sibling: Option<RecordKey>,
	pub(crate) first_child: Option<RecordKey>,
	pub(crate) last_child: Option<RecordKey>,

	pub(crate) key_index: KeyIndex,
	/// Set during a pass if this node or one of its descendants holds input focus.
	pub(crate) focused: bool,
	/// Whether the child links above reflect the host's children yet.
	/// Records of nodes found in the host tree load their children only once they are needed.
	pub(crate) children_loaded: bool,
}

impl<N, P> NodeRecord<N, P> {
	pub(crate) fn new(node: N, kind: String, key: Option<String>, namespace: Option<String>, children_loaded: bool) -> Self {
		Self {
			node,
			kind,
			key,
			namespace,
			attributes: HashMap::new(),
			dynamic_attributes: Vec::new(),
			text: None,
			parent: None,
			previous_sibling: None,
			next_sibling: None,
			first_child: None,
			last_child: None,
			key_index: KeyIndex::new(),
			focused: false,
			children_loaded,
		}
	}

	/// Absent and [`None`] keys are the same here, since keys are normalized on the way in.
	pub(crate) fn matches(&self, kind: &str, key: Option<&str>) -> bool {
		self.kind == kind && self.key.as_deref() == key
	}
}

/// Arena of all records owned by one [`Reconciler`](`crate::Reconciler`).
///
/// The link operations here only touch records.
/// Callers pair each of them with the matching [`Host`](`crate::Host`) mutation.
#[derive(Debug)]
pub(crate) struct Records<N, P>(SlotMap<RecordKey, NodeRecord<N, P>>);

impl<N, P> Index<RecordKey> for Records<N, P> {
	type Output = NodeRecord<N, P>;

	fn index(&self, key: RecordKey) -> &Self::Output {
		&self.0[key]
	}
}

impl<N, P> IndexMut<RecordKey> for Records<N, P> {
	fn index_mut(&mut self, key: RecordKey) -> &mut Self::Output {
		&mut self.0[key]
	}
}

impl<N, P> Records<N, P> {
	pub(crate) fn new() -> Self {
		Self(SlotMap::with_key())
	}

	pub(crate) fn insert(&mut self, record: NodeRecord<N, P>) -> RecordKey {
		self.0.insert(record)
	}

	pub(crate) fn get(&self, key: RecordKey) -> Option<&NodeRecord<N, P>> {
		self.0.get(key)
	}

	pub(crate) fn get_mut(&mut self, key: RecordKey) -> Option<&mut NodeRecord<N, P>> {
		self.0.get_mut(key)
	}

	pub(crate) fn len(&self) -> usize {
		self.0.len()
	}

	pub(crate) fn children(&self, parent: RecordKey) -> Children<'_, N, P> {
		Children {
			records: self,
			next: self[parent].first_child,
		}
	}

	/// Detaches `child` from its parent, if any.
	pub(crate) fn unlink(&mut self, child: RecordKey) {
		let (parent, previous, next) = {
			let record = &mut self[child];
			(record.parent.take(), record.previous_sibling.take(), record.next_sibling.take())
		};
		let parent = match parent {
			Some(parent) => parent,
			None => return,
		};

		match previous {
			Some(previous) => self[previous].next_sibling = next,
			None => self[parent].first_child = next,
		}
		match next {
			Some(next) => self[next].previous_sibling = previous,
			None => self[parent].last_child = previous,
		}
	}

	/// Links a detached `child` into `parent` before `reference`, or last.
	fn link_before(&mut self, parent: RecordKey, child: RecordKey, reference: Option<RecordKey>) {
		debug_assert!(self[child].parent.is_none());

		let previous = match reference {
			Some(reference) => self[reference].previous_sibling.replace(child),
			None => self[parent].last_child.replace(child),
		};
		match previous {
			Some(previous) => self[previous].next_sibling = Some(child),
			None => self[parent].first_child = Some(child),
		}

		let record = &mut self[child];
		record.parent = Some(parent);
		record.previous_sibling = previous;
		record.next_sibling = reference;
	}

	/// Mirrors [`Host::insert_before`](`crate::Host::insert_before`).
	pub(crate) fn insert_before(&mut self, parent: RecordKey, child: RecordKey, reference: Option<RecordKey>) {
		if reference == Some(child) {
			return;
		}
		self.unlink(child);
		self.link_before(parent, child, reference);
	}

	/// Mirrors [`Host::replace_child`](`crate::Host::replace_child`).
	pub(crate) fn replace(&mut self, parent: RecordKey, new_child: RecordKey, old_child: RecordKey) {
		if new_child == old_child {
			return;
		}
		self.unlink(new_child);
		let reference = self[old_child].next_sibling;
		self.unlink(old_child);
		self.link_before(parent, new_child, reference);
	}

	/// Removes the record and all of its loaded descendants, returning their nodes.
	pub(crate) fn free_subtree(&mut self, root: RecordKey) -> Vec<N> {
		let mut freed = Vec::new();
		let mut stack = vec![root];
		while let Some(key) = stack.pop() {
			if let Some(record) = self.0.remove(key) {
				let mut child = record.first_child;
				while let Some(current) = child {
					stack.push(current);
					child = self.0.get(current).and_then(|record| record.next_sibling);
				}
				// Held keyed children are only reachable through the index.
				for held in record.key_index.values() {
					if self.0.get(held).map_or(false, |held| held.parent.is_none()) {
						stack.push(held);
					}
				}
				freed.push(record.node);
			}
		}
		freed
	}
}

pub(crate) struct Children<'a, N, P> {
	records: &'a Records<N, P>,
	next: Option<RecordKey>,
}

impl<'a, N, P> Iterator for Children<'a, N, P> {
	type Item = RecordKey;

	fn next(&mut self) -> Option<Self::Item> {
		let current = self.next?;
		self.next = self.records[current].next_sibling;
		Some(current)
	}
}

#[cfg(test)]
mod tests {
	use super::{NodeRecord, RecordKey, Records};

	fn records(count: u32) -> (Records<u32, ()>, RecordKey, Vec<RecordKey>) {
		let mut records = Records::new();
		let parent = records.insert(NodeRecord::new(0, "div".to_owned(), None, None, true));
		let children = (1..=count)
			.map(|i| {
				let child = records.insert(NodeRecord::new(i, "p".to_owned(), Some(i.to_string()), None, true));
				records.insert_before(parent, child, None);
				child
			})
			.collect();
		(records, parent, children)
	}

	fn order(records: &Records<u32, ()>, parent: RecordKey) -> Vec<u32> {
		let forward: Vec<_> = records.children(parent).map(|child| records[child].node).collect();

		let mut backward = Vec::new();
		let mut current = records[parent].last_child;
		while let Some(child) = current {
			assert_eq!(records[child].parent, Some(parent));
			backward.push(records[child].node);
			current = records[child].previous_sibling;
		}
		backward.reverse();
		assert_eq!(forward, backward, "links are inconsistent");

		forward
	}

	#[test]
	fn append_and_insert() {
		let (mut records, parent, children) = records(3);
		assert_eq!(order(&records, parent), [1, 2, 3]);

		records.insert_before(parent, children[2], Some(children[0]));
		assert_eq!(order(&records, parent), [3, 1, 2]);

		records.insert_before(parent, children[2], Some(children[2]));
		assert_eq!(order(&records, parent), [3, 1, 2]);

		records.insert_before(parent, children[2], None);
		assert_eq!(order(&records, parent), [1, 2, 3]);
	}

	#[test]
	fn replace_detaches_old_child() {
		let (mut records, parent, children) = records(3);

		records.replace(parent, children[2], children[0]);
		assert_eq!(order(&records, parent), [3, 2]);
		assert_eq!(records[children[0]].parent, None);
		assert_eq!(records[children[0]].next_sibling, None);

		records.replace(parent, children[0], children[1]);
		assert_eq!(order(&records, parent), [3, 1]);
	}

	#[test]
	fn replace_with_next_sibling() {
		let (mut records, parent, children) = records(3);

		records.replace(parent, children[1], children[0]);
		assert_eq!(order(&records, parent), [2, 3]);
	}

	#[test]
	fn unlink_last_child_empties_parent() {
		let (mut records, parent, children) = records(1);
		records.unlink(children[0]);
		assert_eq!(order(&records, parent), Vec::<u32>::new());
		assert_eq!(records[parent].first_child, None);
		assert_eq!(records[parent].last_child, None);
	}

	#[test]
	fn free_subtree_removes_descendants() {
		let (mut records, parent, children) = records(2);
		let grandchild = records.insert(NodeRecord::new(10, "#text".to_owned(), None, None, true));
		records.insert_before(children[0], grandchild, None);
		records.unlink(children[0]);

		let mut freed = records.free_subtree(children[0]);
		freed.sort_unstable();
		assert_eq!(freed, [1, 10]);
		assert!(records.get(grandchild).is_none());
		assert_eq!(order(&records, parent), [2]);
		assert_eq!(records.len(), 2);
	}
}
