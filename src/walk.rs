use crate::record::{RecordKey, Records};

/// The cursor of one pass, positioned among the children of `current_parent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Walk {
	/// The child that was aligned last, or [`None`] if no child was declared yet at this level.
	pub(crate) current_node: Option<RecordKey>,
	pub(crate) current_parent: RecordKey,
}

impl Walk {
	pub(crate) fn new(current_parent: RecordKey, current_node: Option<RecordKey>) -> Self {
		Self { current_node, current_parent }
	}

	/// The record the next instruction is aligned with, if any is left at this level.
	pub(crate) fn peek<N, P>(&self, records: &Records<N, P>) -> Option<RecordKey> {
		match self.current_node {
			Some(current) => records[current].next_sibling,
			None => records[self.current_parent].first_child,
		}
	}

	pub(crate) fn advance<N, P>(&mut self, records: &Records<N, P>) {
		self.current_node = self.peek(records);
	}

	/// Moves into the children of `parent`, before the first one.
	pub(crate) fn descend(&mut self, parent: RecordKey) {
		self.current_parent = parent;
		self.current_node = None;
	}

	/// Moves out of `current_parent` back into `parent`, where it becomes the last aligned node.
	///
	/// Unvisited children must have been cleaned up before this.
	/// `parent` is the level the walk descended from, which is not necessarily the current host parent anymore.
	pub(crate) fn ascend(&mut self, parent: RecordKey) {
		self.current_node = Some(self.current_parent);
		self.current_parent = parent;
	}
}
