use crate::record::RecordKey;
use hashbrown::HashMap;

/// Maps the keys of a parent's direct children to their records.
///
/// The index is built lazily on first lookup. Dislodging a keyed child doesn't remove its entry
/// (the index holds on to it so it can be reattached later in the same pass), but marks the index invalid.
/// An invalid index is swept during cleanup, which is when held entries that were never reattached are dropped.
#[derive(Debug)]
pub(crate) struct KeyIndex {
	map: Option<HashMap<String, RecordKey>>,
	valid: bool,
}

impl Default for KeyIndex {
	fn default() -> Self {
		Self::new()
	}
}

impl KeyIndex {
	pub(crate) fn new() -> Self {
		Self { map: None, valid: true }
	}

	pub(crate) fn is_built(&self) -> bool {
		self.map.is_some()
	}

	/// Replaces the whole index with the given entries.
	pub(crate) fn rebuild(&mut self, entries: impl IntoIterator<Item = (String, RecordKey)>) {
		self.map = Some(entries.into_iter().collect());
		self.valid = true;
	}

	pub(crate) fn get(&self, key: &str) -> Option<RecordKey> {
		self.map.as_ref()?.get(key).copied()
	}

	pub(crate) fn insert(&mut self, key: String, record: RecordKey) {
		self.map.get_or_insert_with(HashMap::new).insert(key, record);
	}

	/// Removes the entry for `key` only if it still refers to `record`.
	pub(crate) fn remove(&mut self, key: &str, record: RecordKey) -> bool {
		match self.map.as_mut() {
			Some(map) if map.get(key) == Some(&record) => map.remove(key).is_some(),
			_ => false,
		}
	}

	pub(crate) fn invalidate(&mut self) {
		self.valid = false;
	}

	pub(crate) fn is_valid(&self) -> bool {
		self.valid
	}

	pub(crate) fn values(&self) -> impl Iterator<Item = RecordKey> + '_ {
		self.map.iter().flat_map(HashMap::values).copied()
	}

	pub(crate) fn len(&self) -> usize {
		self.map.as_ref().map_or(0, HashMap::len)
	}

	/// Drops all entries for which `is_stale` returns `true` and returns their records.
	///
	/// The index is valid afterwards.
	pub(crate) fn sweep(&mut self, mut is_stale: impl FnMut(RecordKey) -> bool) -> Vec<RecordKey> {
		let mut removed = Vec::new();
		if let Some(map) = &mut self.map {
			map.retain(|_, &mut record| {
				if is_stale(record) {
					removed.push(record);
					false
				} else {
					true
				}
			});
		}
		self.valid = true;
		removed
	}
}
