//! High-level token-lifecycle flows powered by the bridge facade.

pub mod common;
pub mod recovery;
pub mod refresh;
pub mod renewal;

pub use common::*;
pub use recovery::*;
pub use refresh::*;

// self
use crate::{
	_prelude::*,
	auth::{SessionId, TokenSet, UserId},
	exchange::TokenExchanger,
	session::SessionRegistry,
	store::TokenStore,
};
#[cfg(feature = "reqwest")]
use crate::exchange::ReqwestExchanger;

#[cfg(feature = "reqwest")]
/// Bridge specialized for the crate's default reqwest exchanger.
pub type ReqwestBridge = Bridge<ReqwestExchanger>;

/// Coordinates the token lifecycle for every authenticated user of the server.
///
/// The bridge owns the token exchanger, token store, and session registry so
/// individual flow implementations can focus on lifecycle logic (coordinated
/// refreshes, proactive renewal, reactive recovery). One bridge serves every
/// session; per-user refresh deduplication lives in the shared in-flight map,
/// keyed by [`UserId`] rather than by session.
pub struct Bridge<X>
where
	X: ?Sized + TokenExchanger,
{
	/// Transport used for every `grant_type=refresh_token` exchange.
	pub exchanger: Arc<X>,
	/// Storage backend that persists per-user token sets.
	pub store: Arc<dyn TokenStore>,
	/// Registry of live sessions and their user links.
	pub sessions: SessionRegistry,
	/// Policy deciding when a token is close enough to expiry to renew.
	pub renewal_policy: RenewalPolicy,
	/// Shared counters for refresh flow outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	pub(crate) inflight: Arc<Mutex<HashMap<UserId, SharedRefresh>>>,
}
impl<X> Bridge<X>
where
	X: ?Sized + TokenExchanger,
{
	/// Creates a bridge that reuses the caller-provided exchanger.
	pub fn with_exchanger(store: Arc<dyn TokenStore>, exchanger: impl Into<Arc<X>>) -> Self {
		Self {
			exchanger: exchanger.into(),
			store,
			sessions: Default::default(),
			renewal_policy: Default::default(),
			refresh_metrics: Default::default(),
			inflight: Default::default(),
		}
	}

	/// Overrides the proactive renewal policy.
	pub fn with_renewal_policy(mut self, policy: RenewalPolicy) -> Self {
		self.renewal_policy = policy;

		self
	}

	/// Finalizes authentication for a session.
	///
	/// The token set is written before the session-to-user link is set, so an
	/// established link always references a stored set.
	pub async fn complete_authentication(
		&self,
		session: &SessionId,
		user: UserId,
		tokens: TokenSet,
	) -> Result<()> {
		self.store.save(user.clone(), tokens).await?;
		self.sessions.attach_user(session, user)?;

		Ok(())
	}

	/// Discards the user's credentials on explicit logout.
	///
	/// Sessions still mapped to this user stay open; their next token lookup
	/// reports that re-authentication is required.
	pub async fn logout(&self, user: &UserId) -> Result<Option<TokenSet>> {
		Ok(self.store.delete(user).await?)
	}

	/// Drops all sessions and all stored credentials; used on full shutdown.
	pub async fn shutdown(&self) -> Result<()> {
		self.sessions.drain();
		self.store.clear().await?;

		Ok(())
	}
}
#[cfg(feature = "reqwest")]
impl Bridge<ReqwestExchanger> {
	/// Creates a new bridge for the provided token endpoint and client identifier.
	///
	/// The bridge provisions its own reqwest-backed exchanger so callers do not
	/// need to pass HTTP handles explicitly.
	pub fn new(store: Arc<dyn TokenStore>, token_endpoint: Url, client_id: impl Into<String>) -> Self {
		Self::with_exchanger(store, ReqwestExchanger::new(token_endpoint, client_id))
	}
}
impl<X> Clone for Bridge<X>
where
	X: ?Sized + TokenExchanger,
{
	fn clone(&self) -> Self {
		Self {
			exchanger: self.exchanger.clone(),
			store: self.store.clone(),
			sessions: self.sessions.clone(),
			renewal_policy: self.renewal_policy,
			refresh_metrics: self.refresh_metrics.clone(),
			inflight: self.inflight.clone(),
		}
	}
}
impl<X> Debug for Bridge<X>
where
	X: ?Sized + TokenExchanger,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Bridge")
			.field("sessions", &self.sessions.len())
			.field("renewal_policy", &self.renewal_policy)
			.finish()
	}
}
