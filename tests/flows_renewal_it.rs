#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use oauth2_bridge::{
	_preludet::*,
	auth::{ScopeSet, TokenSet, UserId},
	flows::RenewalPolicy,
	store::{MemoryTokenStore, TokenStore},
};

const CLIENT_ID: &str = "client-renewal";

fn user(id: &str) -> UserId {
	UserId::new(id).expect("User identifier should be valid for renewal test.")
}

fn token_endpoint(server: &MockServer) -> Url {
	Url::parse(&server.url("/token")).expect("Mock token endpoint should parse successfully.")
}

/// Seeds a token set whose lifetime started `elapsed` ago out of `lifetime` total.
async fn seed_aged_tokens(
	store: &MemoryTokenStore,
	owner: UserId,
	access: &str,
	elapsed: Duration,
	lifetime: Duration,
) {
	let issued = OffsetDateTime::now_utc() - elapsed;
	let tokens = TokenSet::builder(
		ScopeSet::new(["openid"]).expect("Scope set should be valid for renewal test."),
	)
	.access_token(access)
	.refresh_token("refresh-old")
	.issued_at(issued)
	.expires_at(issued + lifetime)
	.build()
	.expect("Token set fixture should build successfully.");

	store.save(owner, tokens).await.expect("Failed to seed token set into the store.");
}

#[tokio::test]
async fn fresh_tokens_are_served_without_contacting_the_endpoint() {
	let server = MockServer::start_async().await;
	let (bridge, store) = build_reqwest_test_bridge(token_endpoint(&server), CLIENT_ID);
	let owner = user("user-fresh");

	// 10% of the lifetime elapsed: far from the renewal threshold.
	seed_aged_tokens(&store, owner.clone(), "access-fresh", Duration::minutes(1), Duration::minutes(10))
		.await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200);
		})
		.await;
	let tokens = bridge.ensure_usable_token(&owner).await.expect("Fresh tokens should be served.");

	assert_eq!(mock.hits_async().await, 0);
	assert_eq!(tokens.access_token.expose(), "access-fresh");
}

#[tokio::test]
async fn near_expiry_tokens_are_renewed_first() {
	let server = MockServer::start_async().await;
	let (bridge, store) = build_reqwest_test_bridge(token_endpoint(&server), CLIENT_ID);
	let owner = user("user-stale");

	// 10 of 100 minutes remain: inside the default 20% renewal window.
	seed_aged_tokens(
		&store,
		owner.clone(),
		"access-stale",
		Duration::minutes(90),
		Duration::minutes(100),
	)
	.await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-new\",\"token_type\":\"bearer\",\"expires_in\":1800}");
		})
		.await;
	let tokens = bridge.ensure_usable_token(&owner).await.expect("Renewal should succeed.");

	mock.assert_async().await;

	assert_eq!(tokens.access_token.expose(), "access-new");
}

#[tokio::test]
async fn transient_outage_serves_the_stored_tokens() {
	let server = MockServer::start_async().await;
	let (bridge, store) = build_reqwest_test_bridge(token_endpoint(&server), CLIENT_ID);
	let owner = user("user-degraded");

	seed_aged_tokens(
		&store,
		owner.clone(),
		"access-stale",
		Duration::minutes(90),
		Duration::minutes(100),
	)
	.await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(503)
				.header("content-type", "application/json")
				.body("{\"error\":\"temporarily_unavailable\"}");
		})
		.await;
	let tokens = bridge
		.ensure_usable_token(&owner)
		.await
		.expect("A transient outage must degrade to the stored tokens, not to an error.");

	mock.assert_async().await;

	assert_eq!(tokens.access_token.expose(), "access-stale");
	assert!(
		store.fetch(&owner).await.expect("Token store fetch should succeed.").is_some(),
		"Transient failures must preserve the stored credentials.",
	);
}

#[tokio::test]
async fn permanent_rejection_requires_reauthentication() {
	let server = MockServer::start_async().await;
	let (bridge, store) = build_reqwest_test_bridge(token_endpoint(&server), CLIENT_ID);
	let owner = user("user-revoked");

	seed_aged_tokens(
		&store,
		owner.clone(),
		"access-stale",
		Duration::minutes(90),
		Duration::minutes(100),
	)
	.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\"}");
		})
		.await;

	let err = bridge
		.ensure_usable_token(&owner)
		.await
		.expect_err("A revoked grant must not be papered over.");

	assert!(err.is_authentication_required());
	assert!(err.to_string().contains("invalid_grant"));
	assert!(
		store.fetch(&owner).await.expect("Token store fetch should succeed.").is_none(),
		"Permanent failures must delete the stored credentials.",
	);
}

#[tokio::test]
async fn unknown_users_require_authentication_without_network_calls() {
	let server = MockServer::start_async().await;
	let (bridge, _store) = build_reqwest_test_bridge(token_endpoint(&server), CLIENT_ID);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200);
		})
		.await;
	let err = bridge
		.ensure_usable_token(&user("user-unknown"))
		.await
		.expect_err("Users with no cached credentials must be told to authenticate.");

	assert_eq!(mock.hits_async().await, 0);
	assert!(err.is_authentication_required());
}

#[tokio::test]
async fn renewal_policy_override_is_honored() {
	let server = MockServer::start_async().await;
	let (bridge, store) = build_reqwest_test_bridge(token_endpoint(&server), CLIENT_ID);
	let bridge = bridge.with_renewal_policy(RenewalPolicy::new(0.));
	let owner = user("user-lazy");

	// 1 of 100 minutes remains, but a zero threshold renews only on expiry.
	seed_aged_tokens(
		&store,
		owner.clone(),
		"access-stale",
		Duration::minutes(99),
		Duration::minutes(100),
	)
	.await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200);
		})
		.await;
	let tokens = bridge
		.ensure_usable_token(&owner)
		.await
		.expect("Unexpired tokens should be served under a zero threshold.");

	assert_eq!(mock.hits_async().await, 0);
	assert_eq!(tokens.access_token.expose(), "access-stale");
}
