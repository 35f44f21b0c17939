//! Authenticated JSON requests with transparent token attachment.
//!
//! [`Dispatcher::dispatch`] turns a [`RequestSpec`] into an outgoing request. Public requests go
//! out as-is; authenticated ones resolve the session's [`TokenPair`] through a [`TokenSource`],
//! run it through the dispatcher's [`TokenRefresher`], and attach the selected token as a bearer
//! credential. A refreshed pair is written back through the source's store before the request goes
//! out, and [`Dispatcher::dispatch_tracked`] also hands it to the caller. Responses are normalized into an [`ApiResponse`] or a typed [`Error`]; the
//! dispatcher never retries.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::TokenPair,
	config::{AuthConfig, JsonHeaders},
	error::ConfigError,
	http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport},
	obs::{self, FlowKind},
	refresh::TokenRefresher,
	source::TokenSource,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Dispatcher specialized for the crate's default reqwest transport.
pub type ReqwestDispatcher = Dispatcher<ReqwestHttpClient>;

/// Description of one outgoing API call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSpec {
	/// Absolute URL, or a path joined onto [`AuthConfig::api_base`].
	pub url: String,
	/// HTTP method (defaults to `GET`).
	#[serde(default)]
	pub method: HttpMethod,
	/// JSON body, serialized when present.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub body: Option<serde_json::Value>,
	/// Attach a bearer token (defaults to `true`).
	#[serde(default = "default_true")]
	pub require_auth: bool,
	/// Present the refresh token instead of the access token (defaults to `false`).
	#[serde(default)]
	pub use_refresh_token: bool,
}
impl RequestSpec {
	/// Creates an authenticated `GET` request for `url`.
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			method: HttpMethod::Get,
			body: None,
			require_auth: true,
			use_refresh_token: false,
		}
	}

	/// Overrides the HTTP method.
	pub fn with_method(mut self, method: HttpMethod) -> Self {
		self.method = method;

		self
	}

	/// Sets the JSON body.
	pub fn with_body(mut self, body: serde_json::Value) -> Self {
		self.body = Some(body);

		self
	}

	/// Serializes `body` and sets it as the JSON body.
	pub fn with_json<T>(self, body: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		Ok(self.with_body(serde_json::to_value(body)?))
	}

	/// Sends the request without an `Authorization` header.
	pub fn public(mut self) -> Self {
		self.require_auth = false;

		self
	}

	/// Presents the refresh token as the bearer credential (e.g. logout or token revocation).
	pub fn with_refresh_token(mut self) -> Self {
		self.use_refresh_token = true;

		self
	}
}

/// Envelope every backend endpoint answers with.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
	/// Endpoint-reported success flag.
	#[serde(default = "default_true")]
	pub success: bool,
	/// Endpoint-reported message.
	#[serde(default)]
	pub message: String,
	/// Remaining fields of the body.
	#[serde(flatten)]
	pub payload: serde_json::Map<String, serde_json::Value>,
}
impl ApiResponse {
	/// Deserializes the payload fields into `T`.
	pub fn payload_as<T>(&self) -> Result<T, serde_json::Error>
	where
		T: DeserializeOwned,
	{
		serde_json::from_value(serde_json::Value::Object(self.payload.clone()))
	}

	fn empty() -> Self {
		Self { success: true, ..Default::default() }
	}
}

/// [`ApiResponse`] plus the pair a refresh produced while preparing the request.
#[derive(Clone, Debug, PartialEq)]
pub struct Dispatched {
	/// Normalized response envelope.
	pub response: ApiResponse,
	/// Replacement pair, when the access token had to be refreshed; already persisted.
	pub refreshed: Option<TokenPair>,
}

fn default_true() -> bool {
	true
}

/// Sends [`RequestSpec`]s, attaching fresh bearer tokens when required.
///
/// The dispatcher owns a [`TokenRefresher`]; clones share it, so the single-flight guard covers
/// every request issued through the same dispatcher.
pub struct Dispatcher<C>
where
	C: ?Sized + HttpTransport,
{
	http_client: Arc<C>,
	refresher: TokenRefresher<C>,
	json_headers: JsonHeaders,
	api_base: Option<Url>,
}
impl<C> Dispatcher<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a dispatcher that reuses the caller-provided transport.
	pub fn with_http_client(config: &AuthConfig, http_client: impl Into<Arc<C>>) -> Self {
		let http_client = http_client.into();

		Self {
			refresher: TokenRefresher::new(config, http_client.clone()),
			http_client,
			json_headers: config.json_headers.clone(),
			api_base: config.api_base.clone(),
		}
	}

	/// Returns the refresher used for authenticated requests.
	pub fn refresher(&self) -> &TokenRefresher<C> {
		&self.refresher
	}

	/// Sends `spec`, resolving and refreshing tokens from `source` when authentication is required.
	pub async fn dispatch(&self, spec: &RequestSpec, source: &TokenSource) -> Result<ApiResponse> {
		Ok(self.dispatch_tracked(spec, source).await?.response)
	}

	/// [`Dispatcher::dispatch`], also returning the refreshed pair so callers can update state.
	pub async fn dispatch_tracked(
		&self,
		spec: &RequestSpec,
		source: &TokenSource,
	) -> Result<Dispatched> {
		obs::observe(FlowKind::Dispatch, "dispatch", self.send(spec, source)).await
	}

	async fn send(&self, spec: &RequestSpec, source: &TokenSource) -> Result<Dispatched> {
		let mut request = self.build_request(spec)?;
		let mut refreshed = None;

		if spec.require_auth {
			let resolved = source.resolve().await?;
			let pair = self.refresher.ensure_fresh(&resolved).await?;

			request.headers.insert("Authorization".into(), Self::bearer_for(spec, &pair));

			if pair != resolved {
				source.persist(&pair).await?;

				refreshed = Some(pair);
			}
		}

		let response = self.http_client.execute(request).await?;

		Ok(Dispatched { response: Self::read_response(response)?, refreshed })
	}

	fn build_request(&self, spec: &RequestSpec) -> Result<HttpRequest, ConfigError> {
		let body = spec.body.as_ref().map(serde_json::to_vec).transpose()?;

		Ok(HttpRequest {
			method: spec.method,
			url: self.resolve_url(&spec.url)?,
			headers: self.json_headers.to_map(),
			body,
		})
	}

	fn resolve_url(&self, raw: &str) -> Result<Url, ConfigError> {
		match (Url::parse(raw), &self.api_base) {
			(Ok(url), _) => Ok(url),
			(Err(url::ParseError::RelativeUrlWithoutBase), Some(base)) => base
				.join(raw)
				.map_err(|source| ConfigError::InvalidRequestUrl { url: raw.to_owned(), source }),
			(Err(source), _) => Err(ConfigError::InvalidRequestUrl { url: raw.to_owned(), source }),
		}
	}

	fn bearer_for(spec: &RequestSpec, pair: &TokenPair) -> String {
		if spec.use_refresh_token { pair.refresh_token.bearer() } else { pair.access_token.bearer() }
	}

	fn read_response(response: HttpResponse) -> Result<ApiResponse> {
		if !response.is_success() {
			return Err(Error::Api {
				message: response.error_message().unwrap_or_else(|| {
					format!("Request failed with HTTP status {}", response.status)
				}),
				status: response.status,
			});
		}
		if response.body.iter().all(u8::is_ascii_whitespace) {
			return Ok(ApiResponse::empty());
		}

		let de = &mut serde_json::Deserializer::from_slice(&response.body);

		serde_path_to_error::deserialize(de)
			.map_err(|source| Error::ResponseParse { source, status: response.status })
	}
}
#[cfg(feature = "reqwest")]
impl Dispatcher<ReqwestHttpClient> {
	/// Creates a dispatcher backed by a default reqwest client.
	pub fn new(config: &AuthConfig) -> Self {
		Self::with_http_client(config, ReqwestHttpClient::default())
	}
}
impl<C> Clone for Dispatcher<C>
where
	C: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			refresher: self.refresher.clone(),
			json_headers: self.json_headers.clone(),
			api_base: self.api_base.clone(),
		}
	}
}
impl<C> Debug for Dispatcher<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Dispatcher")
			.field("refresher", &self.refresher)
			.field("api_base", &self.api_base.as_ref().map(Url::as_str))
			.finish()
	}
}
