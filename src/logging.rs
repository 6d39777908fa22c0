//! Keeps document content out of log messages unless the `"dangerous-logging"` feature is enabled.

use core::fmt::Debug;

#[cfg(not(feature = "dangerous-logging"))]
struct Redacted;

#[cfg(not(feature = "dangerous-logging"))]
impl Debug for Redacted {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.write_str("<redacted>")
	}
}

#[cfg(feature = "dangerous-logging")]
pub(crate) fn content<T: Debug>(value: &T) -> &dyn Debug {
	value
}

#[cfg(not(feature = "dangerous-logging"))]
pub(crate) fn content<T: Debug>(_value: &T) -> &dyn Debug {
	&Redacted
}
