//! Matching declared nodes with existing ones, and removing what wasn't declared.

use crate::{
	attributes::Value,
	error::{report, Error},
	logging::content,
	record::{NodeRecord, RecordKey},
	walk::Walk,
	Host, Reconciler, TEXT,
};
use core::mem;
use tracing::{trace, trace_span, warn};

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

impl<H: Host> Reconciler<H> {
	/// Advances the cursor and makes sure a node of `kind` and `key` sits at its position.
	///
	/// `statics` are only applied if the node has to be created.
	pub(crate) fn align<S: AsRef<str>>(
		&mut self,
		operation: &'static str,
		kind: &str,
		key: Option<&str>,
		statics: &[(S, Value<H::Property>)],
	) -> Result<RecordKey, Error> {
		let span = trace_span!("align", kind, key = ?content(&key));
		let _enter = span.enter();

		let diagnostics = self.config.diagnostics;
		let context = self.context.as_mut().ok_or_else(|| report(Error::NotInPatch { operation }))?;
		context.walk.advance(&self.records);
		let Walk {
			current_node: current,
			current_parent: parent,
		} = context.walk;

		if let Some(key) = key {
			if !context.declare_key(key) {
				return Err(report(Error::DuplicateKey {
					key: key.to_owned(),
					parent: self.records[parent].kind.clone(),
				}));
			}
		}

		if let Some(current) = current {
			if self.records[current].matches(kind, key) {
				trace!("Reusing node in place");
				return Ok(current);
			}
		}

		let mut candidate = None;
		if let Some(key) = key {
			self.ensure_key_index(parent);
			if let Some(hit) = self.records[parent].key_index.get(key) {
				if self.records[hit].kind == kind {
					trace!("Found keyed node");
					candidate = Some(hit);
				} else {
					let found = self.records[hit].kind.clone();
					if diagnostics {
						return Err(report(Error::KeyedKindMismatch {
							key: key.to_owned(),
							expected: kind.to_owned(),
							found,
						}));
					}

					warn!(expected = kind, found = found.as_str(), "Keyed node changed its kind and will be replaced");
					if Some(hit) == current {
						self.mark_deleted(hit, parent);
					} else {
						self.remove_child(parent, hit);
					}
				}
			}
		}

		let candidate = match candidate {
			Some(candidate) => candidate,
			None => self.create(parent, kind, key, statics),
		};
		self.reposition(parent, candidate, current);

		if let Some(context) = &mut self.context {
			context.walk.current_node = Some(candidate);
		}
		Ok(candidate)
	}

	fn create<S: AsRef<str>>(&mut self, parent: RecordKey, kind: &str, key: Option<&str>, statics: &[(S, Value<H::Property>)]) -> RecordKey {
		let (node, namespace) = if kind == TEXT {
			(self.host.create_text(), None)
		} else {
			let namespace = self.namespace_for_tag(kind, parent);
			(self.host.create_element(kind, namespace.as_deref()), namespace)
		};
		trace!(namespace = ?namespace, "Created node");

		let record = self
			.records
			.insert(NodeRecord::new(node.clone(), kind.to_owned(), key.map(ToOwned::to_owned), namespace, true));
		self.host.set_record(&node, Some(record));
		if let Some(key) = key {
			self.records[parent].key_index.insert(key.to_owned(), record);
		}

		for (name, value) in statics {
			self.update_attribute(record, name.as_ref(), Some(value));
		}

		let parent_node = self.records[parent].node.clone();
		if let Some(context) = &mut self.context {
			context.mark_created(record, parent_node);
		}
		record
	}

	fn namespace_for_tag(&self, tag: &str, parent: RecordKey) -> Option<String> {
		if tag == "svg" {
			Some(SVG_NAMESPACE.to_owned())
		} else if self.records[parent].kind == "foreignObject" {
			None
		} else {
			self.context.as_ref().and_then(|context| context.namespace()).map(ToOwned::to_owned)
		}
	}

	/// Puts `candidate` at the position of `current`, which is dislodged.
	fn reposition(&mut self, parent: RecordKey, candidate: RecordKey, current: Option<RecordKey>) {
		let record = &self.records[candidate];
		if record.parent == Some(parent) && record.next_sibling == current {
			trace!("Already in position");
			return;
		}

		if record.focused {
			trace!("Keeping focused node in place");
			self.move_before(parent, candidate, current);
			return;
		}

		match current {
			Some(current) if self.records[current].key.is_some() && !self.records[current].focused => {
				// The key index holds on to `current`, so it can be reattached later in this pass.
				trace!("Dislodging keyed node");
				self.replace_child(parent, candidate, current);
				self.records[parent].key_index.invalidate();
			}
			_ => self.insert_before(parent, candidate, current),
		}
	}

	/// Like [`Reconciler::insert_before`], but moves the siblings from `reference` up to `node` behind it instead,
	/// so that `node` itself stays attached.
	fn move_before(&mut self, parent: RecordKey, node: RecordKey, reference: Option<RecordKey>) {
		if self.records[node].parent != Some(parent) || reference.is_none() {
			return self.insert_before(parent, node, reference);
		}

		let insert_reference = self.records[node].next_sibling;
		let mut cursor = reference;
		while let Some(current) = cursor.filter(|&current| current != node) {
			cursor = self.records[current].next_sibling;
			self.insert_before(parent, current, insert_reference);
		}
	}

	fn insert_before(&mut self, parent: RecordKey, child: RecordKey, reference: Option<RecordKey>) {
		if reference == Some(child) {
			return;
		}

		let reference_node = reference.map(|reference| self.records[reference].node.clone());
		self.host
			.insert_before(&self.records[parent].node, &self.records[child].node, reference_node.as_ref());
		self.records.insert_before(parent, child, reference);
	}

	fn replace_child(&mut self, parent: RecordKey, new_child: RecordKey, old_child: RecordKey) {
		self.host
			.replace_child(&self.records[parent].node, &self.records[new_child].node, &self.records[old_child].node);
		self.records.replace(parent, new_child, old_child);
	}

	/// Detaches `child` from `parent` if it's still attached there and reports it as deleted.
	pub(crate) fn remove_child(&mut self, parent: RecordKey, child: RecordKey) {
		if self.records[child].parent == Some(parent) {
			self.host.remove_child(&self.records[parent].node, &self.records[child].node);
			self.records.unlink(child);
		}
		self.mark_deleted(child, parent);

		if let Some(key) = self.records[child].key.clone() {
			self.records[parent].key_index.remove(&key, child);
		}
	}

	pub(crate) fn mark_deleted(&mut self, record: RecordKey, parent: RecordKey) {
		let parent_node = self.records[parent].node.clone();
		if let Some(context) = &mut self.context {
			context.mark_deleted(record, parent_node);
		}
	}

	/// Removes the children of `parent` after `last_visited` and drops held keyed children that weren't reattached.
	pub(crate) fn clear_unvisited(&mut self, parent: RecordKey, last_visited: Option<RecordKey>) {
		let valid = self.records[parent].key_index.is_valid();
		if self.records[parent].last_child == last_visited && valid {
			return;
		}

		let span = trace_span!("Clearing unvisited children", key_index_valid = valid);
		let _enter = span.enter();

		let mut removed = 0_usize;
		while let Some(child) = self.records[parent].last_child.filter(|&child| Some(child) != last_visited) {
			self.remove_child(parent, child);
			removed += 1;
		}

		let mut key_index = mem::take(&mut self.records[parent].key_index);
		let stale = if valid {
			Vec::new()
		} else {
			let records = &self.records;
			key_index.sweep(|held| records.get(held).map_or(true, |held| held.parent != Some(parent)))
		};
		trace!(removed, stale = stale.len(), remaining_keys = key_index.len(), "Cleared");
		self.records[parent].key_index = key_index;

		for held in stale {
			if self.records.get(held).is_some() {
				self.mark_deleted(held, parent);
			}
		}
	}
}
