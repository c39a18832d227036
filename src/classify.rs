//! Failure classification for token-exchange errors.
//!
//! The classifier is a pure, total function: every [`ExchangeError`] maps to
//! exactly one [`Classification`], the same input always yields the same
//! verdict, and nothing here touches stored state. The default is asymmetric
//! on purpose: only a fixed set of OAuth error codes proves the refresh
//! credential itself is dead, so anything ambiguous (network failures,
//! timeouts, 5xx responses, unparseable bodies, unknown codes) stays
//! transient and never destroys a potentially valid credential.

// self
use crate::{error::Classification, exchange::ExchangeError};

/// OAuth error codes that conclusively invalidate the refresh credential.
pub const PERMANENT_ERROR_CODES: [&str; 4] =
	["invalid_client", "invalid_grant", "invalid_token", "unauthorized_client"];

/// Classifies a failed token-exchange attempt.
pub fn classify(error: &ExchangeError) -> Classification {
	match error {
		ExchangeError::Rejected { code, .. } if is_permanent_code(code) =>
			Classification::Permanent,
		_ => Classification::Transient,
	}
}

/// Returns `true` if the OAuth error code belongs to the permanent set.
pub fn is_permanent_code(code: &str) -> bool {
	PERMANENT_ERROR_CODES.iter().any(|candidate| candidate.eq_ignore_ascii_case(code))
}

/// Produces the caller-visible reason for a failed exchange.
///
/// Only the OAuth error code and its provider-supplied description are ever
/// included; response bodies and credential material are not.
pub fn describe(error: &ExchangeError) -> String {
	match error {
		ExchangeError::Rejected { code, description: Some(description), .. } =>
			format!("Token endpoint rejected the refresh grant ({code}): {description}."),
		ExchangeError::Rejected { code, .. } =>
			format!("Token endpoint rejected the refresh grant ({code})."),
		ExchangeError::MalformedResponse { status, .. } =>
			format!("Token endpoint returned malformed JSON (status {status})."),
		ExchangeError::NonPositiveExpiresIn { .. } =>
			"Token endpoint returned a non-positive expires_in value.".into(),
		ExchangeError::InvalidScope(_) => "Token endpoint returned invalid scopes.".into(),
		ExchangeError::Timeout => "Request timed out while calling the token endpoint.".into(),
		ExchangeError::Network { .. } =>
			"Network error occurred while calling the token endpoint.".into(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn rejected(code: &str) -> ExchangeError {
		ExchangeError::Rejected { code: code.into(), description: None, status: 400 }
	}

	#[test]
	fn permanent_codes_classify_permanent() {
		for code in PERMANENT_ERROR_CODES {
			assert_eq!(classify(&rejected(code)), Classification::Permanent, "{code}");
		}

		assert_eq!(classify(&rejected("INVALID_GRANT")), Classification::Permanent);
	}

	#[test]
	fn unknown_codes_default_to_transient() {
		assert_eq!(classify(&rejected("temporarily_unavailable")), Classification::Transient);
		assert_eq!(classify(&rejected("server_error")), Classification::Transient);
		assert_eq!(classify(&rejected("made_up_code")), Classification::Transient);
	}

	#[test]
	fn infrastructure_failures_classify_transient() {
		assert_eq!(classify(&ExchangeError::Timeout), Classification::Transient);
		assert_eq!(
			classify(&ExchangeError::NonPositiveExpiresIn { value: 0 }),
			Classification::Transient,
		);
	}

	#[test]
	fn classification_is_deterministic() {
		let error = rejected("invalid_grant");

		assert_eq!(classify(&error), classify(&error));

		let transient = ExchangeError::Timeout;

		assert_eq!(classify(&transient), classify(&transient));
	}

	#[test]
	fn descriptions_carry_code_and_description_only() {
		let error = ExchangeError::Rejected {
			code: "invalid_grant".into(),
			description: Some("Token has been revoked".into()),
			status: 400,
		};
		let reason = describe(&error);

		assert!(reason.contains("invalid_grant"));
		assert!(reason.contains("Token has been revoked"));

		assert_eq!(
			describe(&rejected("invalid_client")),
			"Token endpoint rejected the refresh grant (invalid_client).",
		);
		assert_eq!(
			describe(&ExchangeError::Timeout),
			"Request timed out while calling the token endpoint.",
		);
	}
}
