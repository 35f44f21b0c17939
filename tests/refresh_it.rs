#![cfg(feature = "reqwest")]

mod common;

// crates.io
use httpmock::prelude::*;
use serde_json::json;
use time::{Duration, OffsetDateTime};
// self
use bearer_fetch::{
	error::Error,
	http::ReqwestHttpClient,
	refresh::{RefreshState, TokenRefresher},
};
use common::*;

#[tokio::test]
async fn concurrent_stale_calls_share_one_exchange() {
	let server = MockServer::start_async().await;
	let config = config_for(&server);
	let refresher = <TokenRefresher<ReqwestHttpClient>>::new(&config, ReqwestHttpClient::default());
	let stale = pair_expiring_in(Duration::minutes(-5), "refresh-burst");
	let fresh_access = unsigned_token(OffsetDateTime::now_utc() + Duration::hours(1), "burst");
	let mock = server
		.mock_async(|when, then| {
			when.method(PUT).path("/tokens").header("authorization", "Bearer refresh-burst");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "accessToken": fresh_access }));
		})
		.await;
	let (a, b, c, d) = tokio::join!(
		refresher.ensure_fresh(&stale),
		refresher.ensure_fresh(&stale),
		refresher.ensure_fresh(&stale),
		refresher.ensure_fresh(&stale),
	);

	for pair in [a, b, c, d] {
		let pair = pair.expect("Every joined caller should receive the refreshed pair.");

		assert_eq!(pair.access_token.expose(), fresh_access);
		assert_eq!(pair.refresh_token.expose(), "refresh-burst");
	}

	mock.assert_calls_async(1).await;

	assert_eq!(refresher.metrics().attempts(), 1);
	assert_eq!(refresher.metrics().joined(), 3);
	assert_eq!(refresher.refresh_state(&stale), RefreshState::Idle);
}

#[tokio::test]
async fn settled_exchange_does_not_cache_future_expirations() {
	let server = MockServer::start_async().await;
	let config = config_for(&server);
	let refresher = <TokenRefresher<ReqwestHttpClient>>::new(&config, ReqwestHttpClient::default());
	let stale = pair_expiring_in(Duration::seconds(30), "refresh-again");
	let fresh_access = unsigned_token(OffsetDateTime::now_utc() + Duration::hours(1), "again");
	let mock = server
		.mock_async(|when, then| {
			when.method(PUT).path("/tokens");
			then.status(200).json_body(json!({ "accessToken": fresh_access }));
		})
		.await;

	refresher.ensure_fresh(&stale).await.expect("First refresh should succeed.");
	refresher.ensure_fresh(&stale).await.expect("Second refresh should succeed.");

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn rejected_refresh_surfaces_server_message() {
	let server = MockServer::start_async().await;
	let config = config_for(&server);
	let refresher = <TokenRefresher<ReqwestHttpClient>>::new(&config, ReqwestHttpClient::default());
	let stale = pair_expiring_in(Duration::minutes(-1), "refresh-revoked");
	let mock = server
		.mock_async(|when, then| {
			when.method(PUT).path("/tokens");
			then.status(401)
				.header("content-type", "application/json")
				.json_body(json!({ "success": false, "message": "refresh token expired" }));
		})
		.await;
	let err = refresher.ensure_fresh(&stale).await.expect_err("Revoked refresh must fail.");

	assert!(matches!(
		&err,
		Error::RefreshFailed { message, status: Some(401) } if message == "refresh token expired"
	));
	assert!(err.requires_authentication());
	assert_eq!(refresher.metrics().failures(), 1);

	mock.assert_calls_async(1).await;
}
