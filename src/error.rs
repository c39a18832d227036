//! Bridge-level error types shared across flows, sessions, and stores.
//!
//! Classification happens exactly once, at the refresh coordinator boundary:
//! an exchange failure becomes a [`RefreshError`] carrying a
//! [`Classification`], and every upstream flow trusts that value instead of
//! re-deriving it. Permanent failures always surface as
//! [`Error::AuthenticationRequired`]; unknown-user conditions are a variant of
//! the same terminal state with their own reason text.

// self
use crate::_prelude::*;

/// Bridge-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical bridge error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Store(#[from] crate::store::StoreError),
	/// Session registry failure.
	#[error(transparent)]
	Session(#[from] crate::session::SessionError),
	/// A refresh cycle settled with a failure; retryable when transient.
	#[error(transparent)]
	Refresh(#[from] RefreshError),

	/// Terminal condition: no usable token exists and none can be obtained
	/// without a fresh authorization flow.
	#[error("Authentication is required: {reason}")]
	AuthenticationRequired {
		/// Sanitized cause; never contains token material.
		reason: String,
	},
}
impl Error {
	/// Builds the terminal [`Error::AuthenticationRequired`] variant.
	pub fn authentication_required(reason: impl Into<String>) -> Self {
		Self::AuthenticationRequired { reason: reason.into() }
	}

	/// Returns `true` if this error instructs the caller to re-authenticate.
	pub fn is_authentication_required(&self) -> bool {
		matches!(self, Self::AuthenticationRequired { .. })
	}
}

/// Verdict assigned to a failed refresh attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
	/// The refresh credential itself is invalid; re-authentication is required.
	Permanent,
	/// Infrastructure-layer failure; the stored credential stays valid.
	Transient,
}
impl Classification {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Classification::Permanent => "permanent",
			Classification::Transient => "transient",
		}
	}

	/// Returns `true` for the permanent verdict.
	pub const fn is_permanent(self) -> bool {
		matches!(self, Classification::Permanent)
	}

	/// Returns `true` for the transient verdict.
	pub const fn is_transient(self) -> bool {
		matches!(self, Classification::Transient)
	}
}
impl Display for Classification {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Settled outcome of a failed refresh cycle.
///
/// Cloneable because every caller attached to a deduplicated refresh attempt
/// receives the same value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error("Token refresh failed: {reason}")]
pub struct RefreshError {
	/// Verdict recorded when the cycle settled.
	pub classification: Classification,
	/// Sanitized cause; never contains token material.
	pub reason: String,
}
impl RefreshError {
	/// Builds a permanent-classified refresh error.
	pub fn permanent(reason: impl Into<String>) -> Self {
		Self { classification: Classification::Permanent, reason: reason.into() }
	}

	/// Builds a transient-classified refresh error.
	pub fn transient(reason: impl Into<String>) -> Self {
		Self { classification: Classification::Transient, reason: reason.into() }
	}
}
