//! Access token refresh with a per-session single-flight guard.
//!
//! [`TokenRefresher::ensure_fresh`] decodes the access token's claims, and when the
//! [`ExpirationPolicy`] reports the token as near expiry it exchanges the refresh token for a new
//! access token with `PUT <tokens_url>`. Exchanges are keyed by a fingerprint of the refresh
//! token: while one is pending, every other caller for the same session awaits that exchange
//! instead of issuing its own, so a burst of requests with a stale token costs one round trip and
//! the refresh token is never raced against itself. The in-flight entry is released once the
//! exchange settles, so the next expiry (or a retry after failure) starts fresh. A cancelled
//! leader hands the exchange to a waiting caller, and the entry stays until that one settles.

mod metrics;

pub use metrics::RefreshMetrics;

// crates.io
use async_lock::OnceCell;
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::{ExpirationPolicy, TokenPair, decode_claims},
	config::{AuthConfig, JsonHeaders},
	http::{HttpMethod, HttpRequest, HttpTransport},
	obs::{self, FlowKind},
};

type RefreshOutcome = Result<TokenPair, RefreshFailure>;
type InFlightCell = Arc<OnceCell<RefreshOutcome>>;
type InFlightMap = Mutex<HashMap<SessionKey, InFlightCell>>;

/// Identity of a logical session, derived from its refresh token.
///
/// The refresh token survives access-token rotation, so every pair minted from the same login
/// maps to the same key. Only a SHA-256 fingerprint is retained.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionKey(String);
impl SessionKey {
	/// Derives the key for `pair`.
	pub fn for_pair(pair: &TokenPair) -> Self {
		let digest = Sha256::digest(pair.refresh_token.expose().as_bytes());

		Self(STANDARD_NO_PAD.encode(digest))
	}

	/// Returns the base64 fingerprint.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

/// Refresh lifecycle for one session, as observed from outside the refresher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshState {
	/// No exchange is pending; the next stale call starts one.
	Idle,
	/// An exchange is pending; stale callers join it.
	InFlight,
}

#[derive(Clone, Debug)]
struct RefreshFailure {
	message: String,
	status: Option<u16>,
}
impl From<RefreshFailure> for Error {
	fn from(failure: RefreshFailure) -> Self {
		Error::RefreshFailed { message: failure.message, status: failure.status }
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
	access_token: String,
}

/// Held by every caller attached to an in-flight cell; prunes the entry on drop.
///
/// The entry is removed once the cell holds an outcome, or when the last attached caller goes
/// away before one was produced. While any caller is still waiting on an empty cell the entry
/// stays, so a caller taking over from a cancelled leader keeps late arrivals joined to it.
struct InFlightRelease<'a> {
	in_flight: &'a InFlightMap,
	key: &'a SessionKey,
	cell: &'a InFlightCell,
}
impl Drop for InFlightRelease<'_> {
	fn drop(&mut self) {
		let mut in_flight = self.in_flight.lock();
		let Some(current) = in_flight.get(self.key) else { return };

		// The map and this caller hold one reference each.
		if Arc::ptr_eq(current, self.cell)
			&& (self.cell.is_initialized() || Arc::strong_count(self.cell) <= 2)
		{
			in_flight.remove(self.key);
		}
	}
}

/// Keeps access tokens fresh, exchanging refresh tokens at most once per session at a time.
pub struct TokenRefresher<C>
where
	C: ?Sized + HttpTransport,
{
	http_client: Arc<C>,
	tokens_url: Url,
	json_headers: JsonHeaders,
	policy: ExpirationPolicy,
	metrics: Arc<RefreshMetrics>,
	in_flight: Arc<InFlightMap>,
}
impl<C> TokenRefresher<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a refresher for the configured tokens endpoint, window, and headers.
	pub fn new(config: &AuthConfig, http_client: impl Into<Arc<C>>) -> Self {
		Self {
			http_client: http_client.into(),
			tokens_url: config.tokens_url.clone(),
			json_headers: config.json_headers.clone(),
			policy: config.expiration_policy(),
			metrics: Default::default(),
			in_flight: Default::default(),
		}
	}

	/// Returns the expiry policy applied before each use.
	pub fn policy(&self) -> ExpirationPolicy {
		self.policy
	}

	/// Returns the exchange counters shared by every clone of this refresher.
	pub fn metrics(&self) -> &RefreshMetrics {
		&self.metrics
	}

	/// Reports whether an exchange is pending for `pair`'s session.
	pub fn refresh_state(&self, pair: &TokenPair) -> RefreshState {
		match self.in_flight.lock().get(&SessionKey::for_pair(pair)) {
			Some(cell) if !cell.is_initialized() => RefreshState::InFlight,
			_ => RefreshState::Idle,
		}
	}

	/// Returns `pair` unchanged when its access token is fresh, or a refreshed copy otherwise.
	pub async fn ensure_fresh(&self, pair: &TokenPair) -> Result<TokenPair> {
		self.ensure_fresh_at(pair, OffsetDateTime::now_utc()).await
	}

	/// [`TokenRefresher::ensure_fresh`] evaluated at an injected instant.
	pub async fn ensure_fresh_at(
		&self,
		pair: &TokenPair,
		now: OffsetDateTime,
	) -> Result<TokenPair> {
		obs::observe(FlowKind::Refresh, "ensure_fresh", self.refresh_if_near_expiry(pair, now))
			.await
	}

	/// Exchanges the refresh token regardless of the access token's claims.
	///
	/// Useful after the server rejected an access token early. Shares the single-flight guard with
	/// [`TokenRefresher::ensure_fresh`].
	pub async fn force_refresh(&self, pair: &TokenPair) -> Result<TokenPair> {
		obs::observe(FlowKind::Refresh, "force_refresh", self.refresh_now(pair)).await
	}

	async fn refresh_if_near_expiry(
		&self,
		pair: &TokenPair,
		now: OffsetDateTime,
	) -> Result<TokenPair> {
		let claims = decode_claims(pair.access_token.expose())?;

		if !self.policy.is_near_expiry(&claims, now) {
			return Ok(pair.clone());
		}

		self.refresh_now(pair).await
	}

	async fn refresh_now(&self, pair: &TokenPair) -> Result<TokenPair> {
		Ok(self.refresh_single_flight(pair).await?)
	}

	async fn refresh_single_flight(&self, pair: &TokenPair) -> RefreshOutcome {
		let key = SessionKey::for_pair(pair);
		let cell: InFlightCell = {
			let mut in_flight = self.in_flight.lock();

			if let Some(existing) = in_flight.get(&key) {
				self.metrics.record_join();

				existing.clone()
			} else {
				let cell = Arc::new(OnceCell::new());

				in_flight.insert(key.clone(), cell.clone());

				cell
			}
		};

		let _release = InFlightRelease { in_flight: &self.in_flight, key: &key, cell: &cell };

		cell.get_or_init(|| self.exchange(pair)).await.clone()
	}

	async fn exchange(&self, pair: &TokenPair) -> RefreshOutcome {
		self.metrics.record_attempt();

		let outcome =
			self.request_access_token(pair).await.map(|access| pair.with_access_token(access));

		match &outcome {
			Ok(_) => self.metrics.record_success(),
			Err(_) => self.metrics.record_failure(),
		}

		outcome
	}

	async fn request_access_token(&self, pair: &TokenPair) -> Result<String, RefreshFailure> {
		let mut headers = self.json_headers.to_map();

		headers.insert("Authorization".into(), pair.refresh_token.bearer());

		let request = HttpRequest {
			method: HttpMethod::Put,
			url: self.tokens_url.clone(),
			headers,
			body: None,
		};
		let response = self.http_client.execute(request).await.map_err(|err| RefreshFailure {
			message: err.to_string().trim_end_matches('.').to_owned(),
			status: None,
		})?;

		if !response.is_success() {
			return Err(RefreshFailure {
				message: response.error_message().unwrap_or_else(|| {
					format!("Tokens endpoint responded with HTTP status {}", response.status)
				}),
				status: Some(response.status),
			});
		}

		let de = &mut serde_json::Deserializer::from_slice(&response.body);
		let body: RefreshResponse =
			serde_path_to_error::deserialize(de).map_err(|err| RefreshFailure {
				message: format!("Tokens endpoint returned an unreadable body: {err}"),
				status: Some(response.status),
			})?;

		if body.access_token.is_empty() {
			return Err(RefreshFailure {
				message: "Tokens endpoint returned an empty access token".into(),
				status: Some(response.status),
			});
		}

		Ok(body.access_token)
	}
}
impl<C> Clone for TokenRefresher<C>
where
	C: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			tokens_url: self.tokens_url.clone(),
			json_headers: self.json_headers.clone(),
			policy: self.policy,
			metrics: self.metrics.clone(),
			in_flight: self.in_flight.clone(),
		}
	}
}
impl<C> Debug for TokenRefresher<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRefresher")
			.field("tokens_url", &self.tokens_url.as_str())
			.field("policy", &self.policy)
			.field("in_flight", &self.in_flight.lock().len())
			.finish()
	}
}
