//! Opaque wrapper for access and refresh token material.
//!
//! Every credential that crosses the bridge is wrapped before it is stored or
//! handed between flows; formatting a wrapped value can never put the raw
//! material into a span, a log line, or an error message.

// self
use crate::_prelude::*;

/// Opaque credential value; all formatters print a placeholder.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps raw token material.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Grants access to the raw value.
	///
	/// The returned reference belongs in an `Authorization` header or a form
	/// body, never in anything that gets formatted.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenSecret(<redacted>)")
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
