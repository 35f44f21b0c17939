//! Shared fixtures for the integration tests.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use httpmock::MockServer;
use time::{Duration, OffsetDateTime};
use url::Url;
// self
use bearer_fetch::{
	auth::TokenPair,
	config::AuthConfig,
	dispatch::ReqwestDispatcher,
	source::TokenSource,
	store::{MemoryStore, TokenStore},
};

pub const NAMESPACE: &str = "it-session";

/// Builds an unsigned JWT-shaped token whose payload carries `exp`.
pub fn unsigned_token(exp: OffsetDateTime, label: &str) -> String {
	let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
	let payload = URL_SAFE_NO_PAD.encode(format!(
		r#"{{"exp":{},"sub":"{label}"}}"#,
		exp.unix_timestamp()
	));

	format!("{header}.{payload}.")
}

/// Pair whose access token expires `offset` from now.
pub fn pair_expiring_in(offset: Duration, refresh: &str) -> TokenPair {
	TokenPair::new(unsigned_token(OffsetDateTime::now_utc() + offset, refresh), refresh)
}

pub fn config_for(server: &MockServer) -> AuthConfig {
	AuthConfig::new(
		NAMESPACE,
		Url::parse(&server.url("/tokens")).expect("Mock tokens endpoint should parse successfully."),
	)
	.with_api_base(
		Url::parse(&server.url("/api/")).expect("Mock API base should parse successfully."),
	)
}

pub fn build_dispatcher(server: &MockServer) -> (ReqwestDispatcher, TokenStore, Arc<MemoryStore>) {
	let config = config_for(server);
	let driver = Arc::new(MemoryStore::default());
	let store = TokenStore::new(NAMESPACE, driver.clone());

	(ReqwestDispatcher::new(&config), store, driver)
}

pub fn source_with(store: &TokenStore, pair: Option<TokenPair>) -> TokenSource {
	TokenSource::new(store.clone()).with_candidate(pair)
}
