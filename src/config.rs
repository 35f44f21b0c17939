//! Session configuration: storage namespace, refresh endpoint, expiry window, and JSON headers.

// std
use std::ops::Deref;
// self
use crate::{_prelude::*, auth::ExpirationPolicy, error::ConfigError};

/// Header set attached to every refresh exchange and API request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonHeaders(BTreeMap<String, String>);
impl JsonHeaders {
	/// Creates a header set from arbitrary name/value pairs.
	pub fn new<I, K, V>(headers: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self(headers.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}

	/// Returns a copy of the headers as an owned map.
	pub fn to_map(&self) -> BTreeMap<String, String> {
		self.0.clone()
	}
}
impl Default for JsonHeaders {
	fn default() -> Self {
		Self::new([("Content-Type", "application/json"), ("Accept", "application/json")])
	}
}
impl Deref for JsonHeaders {
	type Target = BTreeMap<String, String>;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

/// Recognized configuration options for a token session.
///
/// Built in code with [`AuthConfig::new`] plus the `with_*` helpers, or from camelCase JSON via
/// [`AuthConfig::from_json`]:
///
/// ```json
/// { "name": "my-app", "tokensUrl": "https://api.example.com/tokens", "tokenExpirationWindow": 600 }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
	/// Storage namespace used by the token store.
	pub name: String,
	/// Refresh endpoint receiving `PUT` exchanges.
	pub tokens_url: Url,
	/// Safety margin before the access token's expiry.
	#[serde(default = "default_window", with = "window_seconds")]
	pub token_expiration_window: Duration,
	/// Headers attached to every request.
	#[serde(default)]
	pub json_headers: JsonHeaders,
	/// Base URL that relative request URLs are joined onto.
	#[serde(default)]
	pub api_base: Option<Url>,
}
impl AuthConfig {
	/// Creates a configuration with the default expiry window and JSON headers.
	pub fn new(name: impl Into<String>, tokens_url: Url) -> Self {
		Self {
			name: name.into(),
			tokens_url,
			token_expiration_window: ExpirationPolicy::DEFAULT_WINDOW,
			json_headers: JsonHeaders::default(),
			api_base: None,
		}
	}

	/// Parses and validates a camelCase JSON configuration document.
	pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
		let de = &mut serde_json::Deserializer::from_str(raw);
		let config: Self = serde_path_to_error::deserialize(de)?;

		config.validate()?;

		Ok(config)
	}

	/// Overrides the expiry window.
	pub fn with_token_expiration_window(mut self, window: Duration) -> Self {
		self.token_expiration_window = window;

		self
	}

	/// Replaces the header set attached to every request.
	pub fn with_json_headers(mut self, headers: JsonHeaders) -> Self {
		self.json_headers = headers;

		self
	}

	/// Sets the base URL for relative request URLs.
	pub fn with_api_base(mut self, base: Url) -> Self {
		self.api_base = Some(base);

		self
	}

	/// Returns the expiry policy derived from the configured window.
	pub fn expiration_policy(&self) -> ExpirationPolicy {
		ExpirationPolicy::new(self.token_expiration_window)
	}

	/// Rejects empty namespaces and non-HTTP(S) endpoints.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.name.trim().is_empty() {
			return Err(ConfigError::EmptyNamespace);
		}

		ensure_http("tokensUrl", &self.tokens_url)?;

		if let Some(base) = &self.api_base {
			ensure_http("apiBase", base)?;
		}

		Ok(())
	}
}

fn ensure_http(field: &'static str, url: &Url) -> Result<(), ConfigError> {
	match url.scheme() {
		"http" | "https" => Ok(()),
		_ => Err(ConfigError::UnsupportedScheme { field, url: url.to_string() }),
	}
}

fn default_window() -> Duration {
	ExpirationPolicy::DEFAULT_WINDOW
}

mod window_seconds {
	// crates.io
	use serde::{Deserialize, Deserializer, Serializer};
	use time::Duration;

	pub fn serialize<S>(window: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(window.whole_seconds())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		u32::deserialize(deserializer).map(|secs| Duration::seconds(i64::from(secs)))
	}
}
