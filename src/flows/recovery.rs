//! Reactive recovery from downstream credential rejections.
//!
//! Proactive renewal cannot catch out-of-band revocations, so every
//! token-bearing downstream call is wrapped in a recovery loop: when the
//! resource server rejects the credentials, the bridge forces one coordinated
//! refresh and replays the call exactly once. A second rejection is terminal;
//! unbounded retry loops against a misbehaving server are never entered.

// self
use crate::{
	_prelude::*,
	auth::{TokenSet, UserId},
	exchange::TokenExchanger,
	flows::Bridge,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Downstream verdict reported by a wrapped call attempt.
///
/// Only a credential rejection (an HTTP 401 in practice) maps to
/// [`CallOutcome::Unauthorized`]; every other downstream failure is the
/// caller's own error and belongs in the attempt's `Err` channel, where it
/// passes through recovery untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallOutcome<T> {
	/// The call went through; recovery returns the payload as-is.
	Completed(T),
	/// The resource server rejected the presented credentials.
	Unauthorized,
}

impl<X> Bridge<X>
where
	X: ?Sized + TokenExchanger,
{
	/// Runs a token-bearing downstream call, recovering once from a rejection.
	///
	/// The attempt closure receives a usable token set and reports whether the
	/// resource server accepted it. On rejection the bridge refreshes and
	/// replays with the new set; at most two attempts are ever made.
	pub async fn call_with_recovery<T, F, Fut>(&self, user: &UserId, mut attempt: F) -> Result<T>
	where
		F: FnMut(TokenSet) -> Fut,
		Fut: Future<Output = Result<CallOutcome<T>>>,
	{
		const KIND: FlowKind = FlowKind::Recovery;

		let span = FlowSpan::new(KIND, "call_with_recovery");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async {
				let tokens = self.ensure_usable_token(user).await?;

				match attempt(tokens).await? {
					CallOutcome::Completed(value) => return Ok(value),
					CallOutcome::Unauthorized => (),
				}

				#[cfg(feature = "tracing")]
				tracing::info!(
					user = %user,
					"Downstream call rejected the credentials; refreshing and replaying once.",
				);

				let refreshed = self.refresh_token(user).await.map_err(|err| {
					if err.classification.is_permanent() {
						Error::AuthenticationRequired { reason: err.reason }
					} else {
						Error::Refresh(err)
					}
				})?;

				match attempt(refreshed).await? {
					CallOutcome::Completed(value) => Ok(value),
					CallOutcome::Unauthorized => Err(Error::authentication_required(
						"The resource server rejected the refreshed credentials.",
					)),
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
