//! Proactive renewal on token use.
//!
//! Before a stored token is handed out, it is checked against the renewal
//! policy; a near-expiry set triggers a coordinated refresh first. Transient
//! refresh failures degrade gracefully: the still-valid stored set is served
//! as-is, on the reasoning that a token near expiry is better than an error
//! while the authorization server has an outage. Permanent failures are
//! terminal and surface as [`Error::AuthenticationRequired`].

// self
use crate::{
	_prelude::*,
	auth::{TokenSet, UserId},
	exchange::TokenExchanger,
	flows::Bridge,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl<X> Bridge<X>
where
	X: ?Sized + TokenExchanger,
{
	/// Returns a token set ready for downstream use, renewing it when close to
	/// expiry.
	pub async fn ensure_usable_token(&self, user: &UserId) -> Result<TokenSet> {
		const KIND: FlowKind = FlowKind::Renewal;

		let span = FlowSpan::new(KIND, "ensure_usable_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let current = self.store.fetch(user).await?.ok_or_else(|| {
					Error::authentication_required("No credentials are cached for this user.")
				})?;

				if !self.renewal_policy.should_renew(&current, OffsetDateTime::now_utc()) {
					return Ok(current);
				}

				match self.refresh_token(user).await {
					Ok(updated) => Ok(updated),
					Err(err) if err.classification.is_transient() => {
						// The stored set may already be expired here; serving
						// it lets the downstream call decide, and a rejection
						// there funnels into reactive recovery.
						#[cfg(feature = "tracing")]
						tracing::warn!(
							user = %user,
							reason = %err.reason,
							"Serving the stored token set despite a transient refresh failure.",
						);
						#[cfg(not(feature = "tracing"))]
						let _ = &err;

						Ok(current)
					},
					Err(err) => Err(Error::AuthenticationRequired { reason: err.reason }),
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
