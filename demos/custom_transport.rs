//! Demonstrates plugging a custom [`HttpTransport`] into the dispatcher and middleware.
//!
//! 1. Implement [`HttpTransport`] so the dispatcher can run without reqwest (here an in-process
//!    backend that answers the tokens endpoint and one API route).
//! 2. Seed the application state with an already-expired access token.
//! 3. Run thunks through [`Middleware`]; the first API call refreshes the token transparently
//!    and [`Middleware::on_refresh`] writes the new pair back into the state.
//! 4. Show how a rejected refresh surfaces as an error that requires re-authentication.

// std
use std::{
	env,
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
};
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use color_eyre::Result;
use parking_lot::Mutex;
use time::{Duration, OffsetDateTime};
use url::Url;
// self
use bearer_fetch::{
	auth::TokenPair,
	config::AuthConfig,
	dispatch::{Dispatcher, RequestSpec},
	http::{HttpFuture, HttpMethod, HttpRequest, HttpResponse, HttpTransport},
	middleware::{Action, Handled, Middleware, SessionState, ThunkContext},
	store::{FileStore, TokenStore},
};

#[derive(Clone, Debug, Default)]
struct AppState {
	tokens: Option<TokenPair>,
}
impl SessionState for AppState {
	fn tokens(&self) -> Option<TokenPair> {
		self.tokens.clone()
	}
}

#[derive(Debug)]
enum AppAction {
	Profile(String),
	Failed(String),
}

type DemoContext = ThunkContext<AppState, AppAction, InProcessBackend>;

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = AuthConfig::new("demo-app", Url::parse("https://backend.invalid/tokens")?)
		.with_api_base(Url::parse("https://backend.invalid/api/")?);
	let backend = Arc::new(InProcessBackend::default());
	let dispatcher = <Dispatcher<InProcessBackend>>::with_http_client(&config, backend.clone());
	let driver = Arc::new(FileStore::open(env::temp_dir().join("bearer-fetch-demo.json"))?);
	let store = TokenStore::new(config.name.clone(), driver);
	let stale_pair = || {
		TokenPair::new(
			InProcessBackend::mint(OffsetDateTime::now_utc() - Duration::minutes(5)),
			"demo-refresh",
		)
	};
	let state = Arc::new(Mutex::new(AppState { tokens: Some(stale_pair()) }));
	let middleware = Middleware::new(
		dispatcher,
		store.clone(),
		{
			let state = state.clone();

			move || state.lock().clone()
		},
		|action: AppAction| println!("Reducer received {action:?}."),
	)
	.on_refresh({
		let state = state.clone();

		move |pair| state.lock().tokens = Some(pair)
	});
	let load_profile = || {
		Action::thunk(|ctx: DemoContext| async move {
			match ctx.api.call(&RequestSpec::new("me")).await {
				Ok(response) => (ctx.dispatch)(AppAction::Profile(response.message)),
				Err(e) => (ctx.dispatch)(AppAction::Failed(format!(
					"{e} (re-authenticate: {})",
					e.requires_authentication()
				))),
			}
		})
	};

	// The first call refreshes; the sink stores the new pair, so the second one reuses it.
	for _ in 0..2 {
		if let Handled::Thunk(fut) = middleware.handle(load_profile()) {
			fut.await;
		}
	}

	println!("Refresh exchanges so far: {}.", *backend.refreshes.lock());

	backend.revoked.store(true, Ordering::SeqCst);
	state.lock().tokens = Some(stale_pair());

	if let Handled::Thunk(fut) = middleware.handle(load_profile()) {
		fut.await;
	}

	store.clear().await?;

	Ok(())
}

#[derive(Debug, Default)]
struct InProcessBackend {
	refreshes: Mutex<u32>,
	revoked: AtomicBool,
}
impl InProcessBackend {
	fn mint(exp: OffsetDateTime) -> String {
		let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{}}}"#, exp.unix_timestamp()));

		format!("eyJhbGciOiJub25lIn0.{payload}.")
	}

	fn respond(&self, request: &HttpRequest) -> HttpResponse {
		match (request.method, request.url.path()) {
			(HttpMethod::Put, "/tokens") if self.revoked.load(Ordering::SeqCst) => HttpResponse {
				status: 401,
				body: br#"{"success":false,"message":"refresh token expired"}"#.to_vec(),
			},
			(HttpMethod::Put, "/tokens") => {
				*self.refreshes.lock() += 1;

				let access = Self::mint(OffsetDateTime::now_utc() + Duration::hours(1));

				HttpResponse {
					status: 200,
					body: format!(r#"{{"accessToken":"{access}"}}"#).into_bytes(),
				}
			},
			(HttpMethod::Get, "/api/me") => HttpResponse {
				status: 200,
				body: br#"{"success":true,"message":"demo user"}"#.to_vec(),
			},
			_ => HttpResponse { status: 404, body: br#"{"message":"not found"}"#.to_vec() },
		}
	}
}
impl HttpTransport for InProcessBackend {
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
		let response = self.respond(&request);

		Box::pin(async move { Ok(response) })
	}
}
