//! Storage contracts and the built-in in-memory token store.
//!
//! The store is the only piece of shared mutable token state in the bridge.
//! Entries are keyed by [`UserId`] and replaced wholesale: `save` is atomic
//! with respect to `fetch`, so no caller ever observes a half-written set.
//! Entries outlive sessions by design; nothing in this module knows sessions
//! exist.

pub mod memory;

pub use memory::MemoryTokenStore;

// self
use crate::{
	_prelude::*,
	auth::{TokenSet, UserId},
};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for per-user token sets.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the token set for the provided user.
	fn save(&self, user: UserId, tokens: TokenSet) -> StoreFuture<'_, ()>;

	/// Fetches the token set associated with the user, if present.
	fn fetch<'a>(&'a self, user: &'a UserId) -> StoreFuture<'a, Option<TokenSet>>;

	/// Removes the entry for the user, returning the removed set.
	///
	/// Sessions still mapped to this user will observe "no token" on their
	/// next lookup, which signals that re-authentication is needed; it is not
	/// a fatal condition.
	fn delete<'a>(&'a self, user: &'a UserId) -> StoreFuture<'a, Option<TokenSet>>;

	/// Drops every entry; used on full shutdown.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
