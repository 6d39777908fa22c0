use crate::attributes::Value;
use hashbrown::HashMap;

/// Reusable staging map for attribute diffs, so that steady-state patches don't allocate.
pub struct TempAttributeMap<P: 'static>(HashMap<&'static str, Option<&'static Value<P>>>);

impl<P: 'static> TempAttributeMap<P> {
	pub fn new() -> Self {
		Self(HashMap::new())
	}

	pub fn temp<'a>(&mut self) -> &mut HashMap<&'a str, Option<&'a Value<P>>> {
		unsafe {
			//SAFETY: The collection is cleared before each borrow, so no values can leak between them.
			// Nothing with drop glue is stored, so the dangling references left behind after a borrow are never touched.
			self.0.clear();
			&mut *(&mut self.0 as *mut HashMap<&'static str, Option<&'static Value<P>>>).cast()
		}
	}

	/// Retrieves the cache map's capacity without clearing it first.
	pub fn capacity(&self) -> usize {
		self.0.capacity()
	}
}

impl<P: 'static> Default for TempAttributeMap<P> {
	fn default() -> Self {
		Self::new()
	}
}

impl<P: 'static> core::fmt::Debug for TempAttributeMap<P> {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("TempAttributeMap").field("capacity", &self.capacity()).finish()
	}
}
