//! Transport primitives for the `grant_type=refresh_token` exchange.
//!
//! The module exposes [`TokenExchanger`], the bridge's only dependency on an
//! HTTP stack. The coordinator treats the exchange as an opaque async call
//! returning either a [`TokenGrant`] or a structured [`ExchangeError`]; wire
//! handling is split into pure parsing functions so transports stay thin and
//! the error surface stays testable without a network.

// std
#[cfg(feature = "reqwest")]
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, ScopeValidationError},
};

type BoxError = Box<dyn StdError + Send + Sync>;

/// Boxed future returned by [`TokenExchanger`] implementations.
pub type ExchangeFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TokenGrant, ExchangeError>> + 'a + Send>>;

/// Abstraction over transports capable of executing a refresh-grant exchange.
///
/// Implementations must be `Send + Sync + 'static` so they can be shared
/// behind `Arc` across every session's concurrent flows. Each call performs at
/// most one downstream request with a bounded timeout; retry policy belongs to
/// the flows above, never to the transport.
pub trait TokenExchanger
where
	Self: 'static + Send + Sync,
{
	/// Performs one `grant_type=refresh_token` exchange against the
	/// authorization server's token endpoint.
	fn refresh_grant<'a>(
		&'a self,
		refresh_token: &'a str,
		scope: &'a ScopeSet,
	) -> ExchangeFuture<'a>;
}

/// Successful token-endpoint response, decoded and validated.
#[derive(Clone)]
pub struct TokenGrant {
	/// Newly issued access token value.
	pub access_token: String,
	/// Rotated refresh token, when the provider issued one.
	pub refresh_token: Option<String>,
	/// Relative lifetime reported by the provider; always positive.
	pub expires_in: Duration,
	/// Scopes reported by the provider, when present in the response.
	pub scope: Option<ScopeSet>,
}
impl Debug for TokenGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenGrant")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_in", &self.expires_in)
			.field("scope", &self.scope)
			.finish()
	}
}

/// Error produced by a token-exchange attempt.
#[derive(Debug, ThisError)]
pub enum ExchangeError {
	/// The token endpoint returned a standard OAuth error body.
	#[error("Token endpoint rejected the refresh grant ({code}).")]
	Rejected {
		/// OAuth error code from the response body.
		code: String,
		/// Provider-supplied human-readable description, if any.
		description: Option<String>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// The response body could not be parsed as the expected JSON shape.
	#[error("Token endpoint returned malformed JSON.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// The response carried a non-positive `expires_in` value.
	#[error("Token endpoint returned a non-positive expires_in value.")]
	NonPositiveExpiresIn {
		/// The offending value.
		value: i64,
	},
	/// The response `scope` field failed validation.
	#[error("Token endpoint returned invalid scopes.")]
	InvalidScope(#[from] ScopeValidationError),
	/// The request exceeded its bounded timeout.
	#[error("Request timed out while calling the token endpoint.")]
	Timeout,
	/// Underlying transport reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl ExchangeError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Returns the OAuth error code, when the endpoint supplied one.
	pub fn error_code(&self) -> Option<&str> {
		match self {
			Self::Rejected { code, .. } => Some(code),
			_ => None,
		}
	}
}

#[derive(Deserialize)]
struct WireTokenResponse {
	access_token: String,
	expires_in: i64,
	#[serde(default)]
	refresh_token: Option<String>,
	#[serde(default)]
	scope: Option<String>,
}

#[derive(Deserialize)]
struct WireTokenError {
	error: String,
	#[serde(default)]
	error_description: Option<String>,
}

/// Decodes a token-endpoint response into a grant or a structured error.
///
/// 2xx bodies must carry `access_token` and a positive `expires_in`; anything
/// else is expected to follow the standard `{error, error_description}`
/// vocabulary. Bodies that fit neither shape surface as
/// [`ExchangeError::MalformedResponse`], which classifies transient.
pub fn parse_token_response(status: u16, body: &[u8]) -> Result<TokenGrant, ExchangeError> {
	if (200..300).contains(&status) {
		let de = &mut serde_json::Deserializer::from_slice(body);
		let wire: WireTokenResponse = serde_path_to_error::deserialize(de)
			.map_err(|source| ExchangeError::MalformedResponse { source, status })?;

		if wire.expires_in <= 0 {
			return Err(ExchangeError::NonPositiveExpiresIn { value: wire.expires_in });
		}

		let scope = match wire.scope.as_deref().map(str::trim) {
			None | Some("") => None,
			Some(raw) => Some(raw.parse::<ScopeSet>()?),
		};

		Ok(TokenGrant {
			access_token: wire.access_token,
			refresh_token: wire.refresh_token,
			expires_in: Duration::seconds(wire.expires_in),
			scope,
		})
	} else {
		let de = &mut serde_json::Deserializer::from_slice(body);
		let wire: WireTokenError = serde_path_to_error::deserialize(de)
			.map_err(|source| ExchangeError::MalformedResponse { source, status })?;

		Err(ExchangeError::Rejected {
			code: wire.error,
			description: wire.error_description,
			status,
		})
	}
}

/// Default [`TokenExchanger`] backed by [`ReqwestClient`].
///
/// Issues public-client refresh grants: `client_id` travels in the form body
/// and no client secret is ever attached. Every request carries a bounded
/// timeout so a hung authorization server cannot stall unrelated sessions.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestExchanger {
	client: ReqwestClient,
	token_endpoint: Url,
	client_id: String,
	timeout: StdDuration,
}
#[cfg(feature = "reqwest")]
impl ReqwestExchanger {
	/// Default per-request timeout applied to every exchange.
	pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);

	/// Creates an exchanger for the provided token endpoint and client identifier.
	pub fn new(token_endpoint: Url, client_id: impl Into<String>) -> Self {
		Self {
			client: ReqwestClient::default(),
			token_endpoint,
			client_id: client_id.into(),
			timeout: Self::DEFAULT_TIMEOUT,
		}
	}

	/// Replaces the underlying reqwest client.
	pub fn with_client(mut self, client: ReqwestClient) -> Self {
		self.client = client;

		self
	}

	/// Overrides the per-request timeout.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}
}
#[cfg(feature = "reqwest")]
impl TokenExchanger for ReqwestExchanger {
	fn refresh_grant<'a>(
		&'a self,
		refresh_token: &'a str,
		scope: &'a ScopeSet,
	) -> ExchangeFuture<'a> {
		Box::pin(async move {
			let mut form = vec![
				("grant_type", "refresh_token".to_owned()),
				("refresh_token", refresh_token.to_owned()),
				("client_id", self.client_id.clone()),
			];

			if !scope.is_empty() {
				form.push(("scope", scope.normalized()));
			}

			let response = self
				.client
				.post(self.token_endpoint.clone())
				.timeout(self.timeout)
				.form(&form)
				.send()
				.await
				.map_err(map_reqwest_error)?;
			let status = response.status().as_u16();
			let body = response.bytes().await.map_err(map_reqwest_error)?;

			parse_token_response(status, &body)
		})
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(err: ReqwestError) -> ExchangeError {
	if err.is_timeout() { ExchangeError::Timeout } else { ExchangeError::network(err) }
}
