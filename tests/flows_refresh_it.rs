#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use oauth2_bridge::{
	_preludet::*,
	auth::{ScopeSet, TokenSet, UserId},
	error::Classification,
	store::{MemoryTokenStore, TokenStore},
};

const CLIENT_ID: &str = "client-refresh";

fn user(id: &str) -> UserId {
	UserId::new(id).expect("User identifier should be valid for refresh test.")
}

fn token_endpoint(server: &MockServer) -> Url {
	Url::parse(&server.url("/token")).expect("Mock token endpoint should parse successfully.")
}

async fn seed_tokens(
	store: &MemoryTokenStore,
	owner: UserId,
	access: &str,
	refresh: Option<&str>,
	expires_in: Duration,
) {
	let issued = OffsetDateTime::now_utc() - Duration::minutes(5);
	let mut builder = TokenSet::builder(
		ScopeSet::new(["openid", "profile"]).expect("Scope set should be valid for refresh test."),
	)
	.access_token(access)
	.issued_at(issued)
	.expires_at(issued + expires_in);

	if let Some(refresh) = refresh {
		builder = builder.refresh_token(refresh);
	}

	let tokens = builder.build().expect("Token set fixture should build successfully.");

	store.save(owner, tokens).await.expect("Failed to seed token set into the store.");
}

#[tokio::test]
async fn refresh_rotates_tokens_and_updates_store() {
	let server = MockServer::start_async().await;
	let (bridge, store) = build_reqwest_test_bridge(token_endpoint(&server), CLIENT_ID);
	let owner = user("user-refresh");

	seed_tokens(&store, owner.clone(), "access-old", Some("refresh-old"), Duration::minutes(10))
		.await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-new\",\"refresh_token\":\"refresh-new\",\"token_type\":\"bearer\",\"expires_in\":1800}",
			);
		})
		.await;
	let updated = bridge.refresh_token(&owner).await.expect("Refresh rotation should succeed.");

	mock.assert_async().await;

	assert_eq!(updated.access_token.expose(), "access-new");
	assert_eq!(updated.refresh_token.as_ref().map(|secret| secret.expose()), Some("refresh-new"));

	let stored = store
		.fetch(&owner)
		.await
		.expect("Token store fetch should succeed.")
		.expect("Entry should remain present after refresh.");

	assert_eq!(stored.access_token.expose(), "access-new");
	assert_eq!(stored.refresh_token.as_ref().map(|secret| secret.expose()), Some("refresh-new"));
	assert_eq!(bridge.refresh_metrics.attempts(), 1);
	assert_eq!(bridge.refresh_metrics.successes(), 1);
}

#[tokio::test]
async fn concurrent_refreshes_share_one_exchange() {
	let server = MockServer::start_async().await;
	let (bridge, store) = build_reqwest_test_bridge(token_endpoint(&server), CLIENT_ID);
	let owner = user("user-dedup");

	seed_tokens(&store, owner.clone(), "access-old", Some("refresh-old"), Duration::minutes(10))
		.await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.delay(std::time::Duration::from_millis(100))
				.body("{\"access_token\":\"access-new\",\"token_type\":\"bearer\",\"expires_in\":1800}");
		})
		.await;
	let (first, second, third) = tokio::join!(
		bridge.refresh_token(&owner),
		bridge.refresh_token(&owner),
		bridge.refresh_token(&owner),
	);
	let first = first.expect("First refresh caller should succeed.");
	let second = second.expect("Second refresh caller should succeed.");
	let third = third.expect("Third refresh caller should succeed.");

	assert_eq!(mock.hits_async().await, 1);
	assert_eq!(first.access_token.expose(), "access-new");
	assert_eq!(second.access_token.expose(), "access-new");
	assert_eq!(third.access_token.expose(), "access-new");
	assert_eq!(bridge.refresh_metrics.attempts(), 1);
	assert_eq!(bridge.refresh_metrics.joins(), 2);
}

#[tokio::test]
async fn sequential_refreshes_start_fresh_cycles() {
	let server = MockServer::start_async().await;
	let (bridge, store) = build_reqwest_test_bridge(token_endpoint(&server), CLIENT_ID);
	let owner = user("user-sequential");

	seed_tokens(&store, owner.clone(), "access-old", Some("refresh-old"), Duration::minutes(10))
		.await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-new\",\"token_type\":\"bearer\",\"expires_in\":1800}");
		})
		.await;

	bridge.refresh_token(&owner).await.expect("First refresh should succeed.");
	bridge.refresh_token(&owner).await.expect("Second refresh should succeed.");

	assert_eq!(mock.hits_async().await, 2);
	assert_eq!(bridge.refresh_metrics.attempts(), 2);
	assert_eq!(bridge.refresh_metrics.joins(), 0);
}

#[tokio::test]
async fn permanent_rejection_deletes_credentials() {
	let server = MockServer::start_async().await;
	let (bridge, store) = build_reqwest_test_bridge(token_endpoint(&server), CLIENT_ID);
	let owner = user("user-revoked");

	seed_tokens(&store, owner.clone(), "access-old", Some("refresh-old"), Duration::minutes(10))
		.await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"Token revoked\"}");
		})
		.await;
	let err = bridge.refresh_token(&owner).await.expect_err("Revoked grants must fail.");

	mock.assert_async().await;

	assert_eq!(err.classification, Classification::Permanent);
	assert!(err.reason.contains("invalid_grant"));
	assert!(
		store.fetch(&owner).await.expect("Token store fetch should succeed.").is_none(),
		"Permanent failures must delete the stored credentials.",
	);
}

#[tokio::test]
async fn transient_failure_preserves_credentials_and_is_shared() {
	let server = MockServer::start_async().await;
	let (bridge, store) = build_reqwest_test_bridge(token_endpoint(&server), CLIENT_ID);
	let owner = user("user-outage");

	seed_tokens(&store, owner.clone(), "access-old", Some("refresh-old"), Duration::minutes(10))
		.await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(503)
				.header("content-type", "application/json")
				.delay(std::time::Duration::from_millis(100))
				.body("{\"error\":\"temporarily_unavailable\"}");
		})
		.await;
	let (first, second) = tokio::join!(bridge.refresh_token(&owner), bridge.refresh_token(&owner));
	let first = first.expect_err("Outage must fail the first caller.");
	let second = second.expect_err("Outage must fail the joined caller.");

	assert_eq!(mock.hits_async().await, 1);
	assert_eq!(first.classification, Classification::Transient);
	assert_eq!(first, second, "Joined callers must observe the same settled outcome.");
	assert!(
		store.fetch(&owner).await.expect("Token store fetch should succeed.").is_some(),
		"Transient failures must preserve the stored credentials.",
	);
}

#[tokio::test]
async fn missing_refresh_credential_fails_without_contacting_the_endpoint() {
	let server = MockServer::start_async().await;
	let (bridge, store) = build_reqwest_test_bridge(token_endpoint(&server), CLIENT_ID);
	let owner = user("user-no-refresh");

	seed_tokens(&store, owner.clone(), "access-old", None, Duration::minutes(10)).await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200);
		})
		.await;
	let err = bridge
		.refresh_token(&owner)
		.await
		.expect_err("A set without a refresh credential cannot be refreshed.");

	assert_eq!(mock.hits_async().await, 0);
	assert_eq!(err.classification, Classification::Permanent);
	assert!(
		store.fetch(&owner).await.expect("Token store fetch should succeed.").is_some(),
		"The still-valid access token must stay usable until it expires.",
	);
}

#[tokio::test]
async fn omitted_rotation_carries_the_refresh_credential_forward() {
	let server = MockServer::start_async().await;
	let (bridge, store) = build_reqwest_test_bridge(token_endpoint(&server), CLIENT_ID);
	let owner = user("user-no-rotation");

	seed_tokens(&store, owner.clone(), "access-old", Some("refresh-old"), Duration::minutes(10))
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-new\",\"token_type\":\"bearer\",\"expires_in\":1800}");
		})
		.await;

	let updated = bridge.refresh_token(&owner).await.expect("Refresh should succeed.");

	assert_eq!(updated.access_token.expose(), "access-new");
	assert_eq!(updated.refresh_token.as_ref().map(|secret| secret.expose()), Some("refresh-old"));
}

#[tokio::test]
async fn scope_in_the_response_replaces_the_stored_scope() {
	let server = MockServer::start_async().await;
	let (bridge, store) = build_reqwest_test_bridge(token_endpoint(&server), CLIENT_ID);
	let owner = user("user-narrowed");

	seed_tokens(&store, owner.clone(), "access-old", Some("refresh-old"), Duration::minutes(10))
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-new\",\"token_type\":\"bearer\",\"expires_in\":1800,\"scope\":\"openid\"}",
			);
		})
		.await;

	let updated = bridge.refresh_token(&owner).await.expect("Refresh should succeed.");

	assert_eq!(updated.scope.normalized(), "openid");

	let stored = store
		.fetch(&owner)
		.await
		.expect("Token store fetch should succeed.")
		.expect("Entry should remain present after refresh.");

	assert_eq!(stored.scope.normalized(), "openid");
}

#[tokio::test]
async fn refreshes_for_different_users_run_independently() {
	let server = MockServer::start_async().await;
	let (bridge, store) = build_reqwest_test_bridge(token_endpoint(&server), CLIENT_ID);
	let alice = user("user-alice");
	let bob = user("user-bob");

	seed_tokens(&store, alice.clone(), "access-a", Some("refresh-a"), Duration::minutes(10)).await;
	seed_tokens(&store, bob.clone(), "access-b", Some("refresh-b"), Duration::minutes(10)).await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-new\",\"token_type\":\"bearer\",\"expires_in\":1800}");
		})
		.await;
	let (first, second) = tokio::join!(bridge.refresh_token(&alice), bridge.refresh_token(&bob));

	first.expect("Alice's refresh should succeed.");
	second.expect("Bob's refresh should succeed.");

	assert_eq!(mock.hits_async().await, 2);
	assert_eq!(bridge.refresh_metrics.attempts(), 2);
	assert_eq!(bridge.refresh_metrics.joins(), 0);
}
