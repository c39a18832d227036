//! Coordinated refresh-grant exchanges with per-user deduplication.
//!
//! The bridge exposes [`Bridge::refresh_token`] so any session can request a
//! fresh token set for its user without worrying about concurrent rotations.
//! All callers for the same user share one in-flight exchange: the first
//! caller starts the cycle, later callers attach to it, and every caller
//! observes the same settled outcome. Different users never block each other.
//!
//! Classification happens exactly once per cycle, at the exchange boundary.
//! Permanent failures delete the stored credentials so later lookups report
//! that re-authentication is required; transient failures leave them intact.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{TokenSet, UserId},
	classify,
	error::RefreshError,
	exchange::TokenExchanger,
	flows::{Bridge, common::SharedRefresh},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl<X> Bridge<X>
where
	X: ?Sized + TokenExchanger,
{
	/// Refreshes the user's stored token set, deduplicating concurrent calls.
	pub async fn refresh_token(&self, user: &UserId) -> Result<TokenSet, RefreshError> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.join_or_start(user)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(err) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				obs::record_refresh_failed(err.classification);
			},
		}

		result
	}

	/// Returns the in-flight refresh for the user, starting one if none exists.
	///
	/// The map lookup and insertion happen under a single lock acquisition, so
	/// exactly one cycle can ever be live per user. The cycle future removes
	/// its own map entry before settling; callers arriving after that point
	/// start a fresh cycle instead of observing a stale outcome.
	async fn join_or_start(&self, user: &UserId) -> Result<TokenSet, RefreshError> {
		let shared = {
			let mut inflight = self.inflight.lock();

			match inflight.get(user) {
				Some(existing) => {
					self.refresh_metrics.record_join();

					existing.clone()
				},
				None => {
					self.refresh_metrics.record_attempt();

					let bridge = self.clone();
					let owner = user.clone();
					let cycle: SharedRefresh = async move {
						let outcome = bridge.refresh_cycle(&owner).await;

						bridge.inflight.lock().remove(&owner);

						outcome
					}
					.boxed()
					.shared();

					inflight.insert(user.clone(), cycle.clone());

					cycle
				},
			}
		};

		shared.await
	}

	/// Performs one full refresh cycle: fetch, exchange, classify, persist.
	async fn refresh_cycle(&self, user: &UserId) -> Result<TokenSet, RefreshError> {
		let current = self
			.store
			.fetch(user)
			.await
			.map_err(|err| {
				self.refresh_metrics.record_failure();

				RefreshError::transient(err.to_string())
			})?
			.ok_or_else(|| {
				self.refresh_metrics.record_failure();

				RefreshError::permanent("No token set is cached for this user.")
			})?;
		let refresh_secret = match &current.refresh_token {
			Some(secret) => secret.expose().to_owned(),
			None => {
				// Only the refresh capability is gone; the entry stays until it expires.
				self.refresh_metrics.record_failure();

				return Err(RefreshError::permanent(
					"No refresh credential is available for this user.",
				));
			},
		};
		let grant = match self.exchanger.refresh_grant(&refresh_secret, &current.scope).await {
			Ok(grant) => grant,
			Err(err) => {
				let classification = classify::classify(&err);

				if classification.is_permanent()
					&& let Err(store_err) = self.store.delete(user).await
				{
					#[cfg(feature = "tracing")]
					tracing::warn!(
						user = %user,
						error = %store_err,
						"Failed to delete the revoked token set.",
					);
					#[cfg(not(feature = "tracing"))]
					let _ = &store_err;
				}

				#[cfg(feature = "tracing")]
				tracing::warn!(
					user = %user,
					classification = %classification,
					"Refresh exchange failed.",
				);

				self.refresh_metrics.record_failure();

				return Err(RefreshError { classification, reason: classify::describe(&err) });
			},
		};
		let issued_at = OffsetDateTime::now_utc();
		let mut builder = TokenSet::builder(grant.scope.unwrap_or_else(|| current.scope.clone()))
			.access_token(grant.access_token)
			.issued_at(issued_at)
			.expires_in(grant.expires_in);

		// Providers that do not rotate omit the refresh token; the prior
		// credential stays valid and is carried forward.
		builder = match grant.refresh_token {
			Some(rotated) => builder.refresh_token(rotated),
			None => builder.refresh_token(refresh_secret),
		};

		let updated = builder.build().map_err(|err| {
			self.refresh_metrics.record_failure();

			RefreshError::transient(err.to_string())
		})?;

		self.store.save(user.clone(), updated.clone()).await.map_err(|err| {
			self.refresh_metrics.record_failure();

			RefreshError::transient(err.to_string())
		})?;
		self.refresh_metrics.record_success();

		Ok(updated)
	}
}
