//! Importing nodes that already exist in the host tree.

use crate::{
	record::{NodeRecord, RecordKey},
	Host, Reconciler, TEXT,
};
use tracing::trace;

impl<H: Host> Reconciler<H> {
	/// Finds the record of `node`, importing it on first encounter.
	///
	/// Imported records don't know their children yet, see [`Reconciler::load_children`].
	pub(crate) fn ensure_record(&mut self, node: &H::Node) -> RecordKey {
		if let Some(record) = self.host.record(node) {
			if self.records.get(record).map_or(false, |record| record.node == *node) {
				return record;
			}
		}

		let kind = self.host.node_name(node);
		let key = if kind == TEXT {
			None
		} else {
			self.host.key_attribute(node).filter(|key| !key.is_empty())
		};
		let namespace = self.host.namespace(node);
		trace!(kind = kind.as_str(), key = ?key, "Importing node");

		let record = self.records.insert(NodeRecord::new(node.clone(), kind, key, namespace, false));
		self.host.set_record(node, Some(record));
		record
	}

	/// Mirrors the host children of `parent` in its record, once.
	pub(crate) fn load_children(&mut self, parent: RecordKey) {
		if self.records[parent].children_loaded {
			return;
		}
		self.records[parent].children_loaded = true;

		let mut child = self.host.first_child(&self.records[parent].node);
		while let Some(node) = child {
			let record = self.ensure_record(&node);
			self.records.insert_before(parent, record, None);
			child = self.host.next_sibling(&node);
		}
	}

	/// Builds the key index of `parent` from its current children, unless that already happened.
	pub(crate) fn ensure_key_index(&mut self, parent: RecordKey) {
		if self.records[parent].key_index.is_built() {
			return;
		}

		let entries: Vec<_> = self
			.records
			.children(parent)
			.filter_map(|child| self.records[child].key.clone().map(|key| (key, child)))
			.collect();
		trace!(entries = entries.len(), "Building key index");
		self.records[parent].key_index.rebuild(entries);
	}

	/// Marks the ancestry of the focused node below `root` (exclusive) as focused.
	///
	/// Returns only the records that weren't marked yet, so that nested passes leave the outer pass's marks alone.
	pub(crate) fn mark_focus_path(&mut self, root: RecordKey) -> Vec<RecordKey> {
		let mut node = match self.host.focused() {
			Some(focused) => focused,
			None => return Vec::new(),
		};

		let mut path = Vec::new();
		while node != self.records[root].node {
			node = match self.host.parent_node(&node) {
				Some(parent) => {
					path.push(node);
					parent
				}
				None => return Vec::new(),
			};
		}

		let mut marked = Vec::new();
		let mut parent = root;
		for node in path.iter().rev() {
			self.load_children(parent);
			let record = self.ensure_record(node);
			if !self.records[record].focused {
				self.records[record].focused = true;
				marked.push(record);
			}
			parent = record;
		}
		trace!(depth = path.len(), newly_marked = marked.len(), "Marked focus path");
		marked
	}

	pub(crate) fn unmark_focus_path(&mut self, marked: Vec<RecordKey>) {
		for record in marked {
			if let Some(record) = self.records.get_mut(record) {
				record.focused = false;
			}
		}
	}
}
