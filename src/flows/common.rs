//! Shared helpers for flow implementations (renewal policy, in-flight refresh handles).

// self
use crate::{_prelude::*, auth::TokenSet, error::RefreshError};

/// Handle to an in-flight refresh cycle, cloneable by late joiners.
///
/// Every caller that awaits the same handle observes the same settled outcome,
/// success or failure alike, which is what makes refresh deduplication
/// transparent: joiners cannot tell whether they started the cycle or merely
/// attached to one.
pub(crate) type SharedRefresh = Shared<BoxFuture<'static, Result<TokenSet, RefreshError>>>;

/// Decides when a token is close enough to expiry to renew proactively.
///
/// The threshold is a fraction of the token's total lifetime rather than a
/// fixed window, so short-lived and long-lived tokens renew at comparable
/// points of their life. A token with a quarter of its lifetime left and a
/// threshold of `0.2` is still served as-is; at one fifth or less it renews.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenewalPolicy {
	threshold: f64,
}
impl RenewalPolicy {
	/// Default remaining-lifetime fraction below which renewal triggers.
	pub const DEFAULT_THRESHOLD: f64 = 0.2;

	/// Creates a policy with the provided lifetime fraction, clamped to `[0, 1]`.
	///
	/// A threshold of `0` renews only once the token has actually expired; a
	/// threshold of `1` renews on every use.
	pub fn new(threshold: f64) -> Self {
		Self { threshold: threshold.clamp(0., 1.) }
	}

	/// Returns the configured lifetime fraction.
	pub fn threshold(&self) -> f64 {
		self.threshold
	}

	/// Determines whether the token set should be renewed at the given instant.
	pub fn should_renew(&self, tokens: &TokenSet, now: OffsetDateTime) -> bool {
		if tokens.is_expired_at(now) {
			return true;
		}

		let lifetime = tokens.lifetime();

		if lifetime <= Duration::ZERO {
			return true;
		}

		let remaining = tokens.remaining_at(now);

		remaining.as_seconds_f64() <= lifetime.as_seconds_f64() * self.threshold
	}
}
impl Default for RenewalPolicy {
	fn default() -> Self {
		Self::new(Self::DEFAULT_THRESHOLD)
	}
}
