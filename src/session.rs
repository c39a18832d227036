//! Session lifecycle bookkeeping, decoupled from token state.
//!
//! A session moves through `Anonymous -> Authenticated -> Closed`; it may stay
//! anonymous for its whole life when the operations it performs tolerate
//! missing authentication. The registry stores only the session-to-user link:
//! the user id is a lookup key into the token store, never a shared handle,
//! so closing a session cannot reach token state. Tokens outlive sessions,
//! which is what allows seamless reconnection under the same user identity.

// self
use crate::{
	_prelude::*,
	auth::{SessionId, UserId},
	obs,
};

/// Error type produced by [`SessionRegistry`] operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum SessionError {
	/// A session with this identifier is already established.
	#[error("Session `{session}` is already established.")]
	Duplicate {
		/// The colliding session identifier.
		session: SessionId,
	},
	/// No session with this identifier is established.
	#[error("Session `{session}` is unknown.")]
	Unknown {
		/// The missing session identifier.
		session: SessionId,
	},
	/// The session is already bound to a user; the link is set once.
	#[error("Session `{session}` is already bound to a user.")]
	AlreadyAuthenticated {
		/// The already-authenticated session identifier.
		session: SessionId,
	},
}

/// Per-connection record owned by the registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRecord {
	/// Identifier assigned by the transport layer.
	pub session_id: SessionId,
	/// Back-reference to the authenticated user, once set.
	pub user_id: Option<UserId>,
	/// Instant the connection was established.
	pub established_at: OffsetDateTime,
}
impl SessionRecord {
	/// Returns `true` once the session has completed authentication.
	pub fn is_authenticated(&self) -> bool {
		self.user_id.is_some()
	}
}

/// Thread-safe registry of live sessions and their user links.
#[derive(Clone, Debug, Default)]
pub struct SessionRegistry(Arc<RwLock<HashMap<SessionId, SessionRecord>>>);
impl SessionRegistry {
	/// Registers a newly established connection in the anonymous state.
	pub fn establish(&self, session_id: SessionId) -> Result<SessionRecord, SessionError> {
		let mut guard = self.0.write();

		if guard.contains_key(&session_id) {
			return Err(SessionError::Duplicate { session: session_id });
		}

		let record = SessionRecord {
			session_id: session_id.clone(),
			user_id: None,
			established_at: OffsetDateTime::now_utc(),
		};

		guard.insert(session_id, record.clone());

		Ok(record)
	}

	/// Binds the session to a user identity.
	///
	/// The link is set once and never reassigned. Callers must write the
	/// user's token set before attaching, so a set link always references a
	/// stored set.
	pub fn attach_user(&self, session: &SessionId, user: UserId) -> Result<(), SessionError> {
		let mut guard = self.0.write();
		let record = guard
			.get_mut(session)
			.ok_or_else(|| SessionError::Unknown { session: session.clone() })?;

		if record.user_id.is_some() {
			return Err(SessionError::AlreadyAuthenticated { session: session.clone() });
		}

		record.user_id = Some(user);

		Ok(())
	}

	/// Resolves the user identity bound to the session, if any.
	pub fn lookup_user(&self, session: &SessionId) -> Option<UserId> {
		self.0.read().get(session).and_then(|record| record.user_id.clone())
	}

	/// Returns a snapshot of the session record, if established.
	pub fn record(&self, session: &SessionId) -> Option<SessionRecord> {
		self.0.read().get(session).cloned()
	}

	/// Removes the session on disconnect, returning its final record.
	///
	/// Only session-scoped state is cleaned up; the user's token set is
	/// deliberately preserved for reconnection.
	pub fn close(&self, session: &SessionId) -> Option<SessionRecord> {
		let removed = self.0.write().remove(session);

		if let Some(record) = &removed {
			#[cfg(feature = "tracing")]
			tracing::info!(
				session = %record.session_id,
				user = record.user_id.as_ref().map_or("unauthenticated", |user| user.as_ref()),
				"Session closed.",
			);

			obs::record_session_closed(record.user_id.is_some());
		}

		removed
	}

	/// Number of live sessions.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no sessions are live.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Removes every session, returning how many were dropped; used on shutdown.
	pub fn drain(&self) -> usize {
		let mut guard = self.0.write();
		let count = guard.len();

		guard.clear();

		count
	}
}
