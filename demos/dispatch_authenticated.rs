//! Sends one public and one authenticated request against a live backend.
//!
//! ```sh
//! BEARER_FETCH_API=https://api.example.com/ \
//! BEARER_FETCH_ACCESS=<access token> BEARER_FETCH_REFRESH=<refresh token> \
//! cargo run --example dispatch_authenticated
//! ```
//!
//! Tokens are persisted to a JSON file in the temp directory, so later runs can omit them.

// std
use std::{env, sync::Arc};
// crates.io
use color_eyre::{Result, eyre::eyre};
use url::Url;
// self
use bearer_fetch::{
	auth::TokenPair,
	config::AuthConfig,
	dispatch::{ReqwestDispatcher, RequestSpec},
	source::TokenSource,
	store::{FileStore, TokenStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let api = Url::parse(
		&env::var("BEARER_FETCH_API").map_err(|_| eyre!("Set BEARER_FETCH_API to the API base."))?,
	)?;
	let config = AuthConfig::new("dispatch-demo", api.join("tokens")?).with_api_base(api);

	config.validate()?;

	let dispatcher = ReqwestDispatcher::new(&config);
	let driver = Arc::new(FileStore::open(env::temp_dir().join("bearer-fetch-dispatch.json"))?);
	let store = TokenStore::new(config.name.clone(), driver);
	let candidate = TokenPair::from_parts(
		env::var("BEARER_FETCH_ACCESS").ok(),
		env::var("BEARER_FETCH_REFRESH").ok(),
	);

	if let Some(pair) = &candidate {
		store.save(pair).await?;
	}

	let health = dispatcher
		.dispatch(&RequestSpec::new("health").public(), &TokenSource::new(store.clone()))
		.await?;

	println!("Health check: success={} message={:?}.", health.success, health.message);

	let source = TokenSource::new(store).with_candidate(candidate);

	match dispatcher.dispatch_tracked(&RequestSpec::new("me"), &source).await {
		Ok(me) => {
			if me.refreshed.is_some() {
				println!("Access token was refreshed and persisted.");
			}

			println!("Authenticated call returned {:?}.", me.response.payload);
		},
		Err(e) if e.requires_authentication() => println!("Session expired: {e}"),
		Err(e) => return Err(e.into()),
	}

	Ok(())
}
