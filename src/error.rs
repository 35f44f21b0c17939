//! Crate-level error types shared across the decoder, stores, refresher, and dispatcher.

// self
use crate::{_prelude::*, auth::MalformedTokenError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Access token claims could not be read; the token is unusable and is not retried.
	#[error(transparent)]
	MalformedToken(#[from] MalformedTokenError),

	/// Neither the caller nor the persistent store holds a token pair.
	#[error("No stored tokens are available; the session must authenticate.")]
	NoStoredTokens,
	/// The refresh exchange was rejected or could not reach the tokens endpoint.
	#[error("Token refresh failed: {message}.")]
	RefreshFailed {
		/// Server-provided or transport-derived reason string.
		message: String,
		/// HTTP status code, when a response was received.
		status: Option<u16>,
	},
	/// A downstream endpoint answered with a non-success HTTP status.
	#[error("API request failed: {message}.")]
	Api {
		/// Server-provided message, or a generic fallback when the body is unreadable.
		message: String,
		/// HTTP status code returned by the endpoint.
		status: u16,
	},
	/// A success response carried a body that is not a JSON envelope.
	#[error("Endpoint returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
}
impl Error {
	/// Returns `true` when the session must re-authenticate before further calls can succeed.
	pub fn requires_authentication(&self) -> bool {
		matches!(self, Self::NoStoredTokens | Self::RefreshFailed { .. } | Self::MalformedToken(_))
	}

	/// Stable snake_case label for the variant, used in spans and metrics.
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::Storage(_) => "storage",
			Self::Config(_) => "config",
			Self::Transport(_) => "transport",
			Self::MalformedToken(_) => "malformed_token",
			Self::NoStoredTokens => "no_stored_tokens",
			Self::RefreshFailed { .. } => "refresh_failed",
			Self::Api { .. } => "api",
			Self::ResponseParse { .. } => "response_parse",
		}
	}

	/// HTTP status attached to the failure, when a response was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::RefreshFailed { status, .. } => *status,
			Self::Api { status, .. } | Self::ResponseParse { status, .. } => Some(*status),
			_ => None,
		}
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Configuration JSON could not be deserialized.
	#[error("Configuration is invalid.")]
	Parse(#[from] serde_path_to_error::Error<serde_json::error::Error>),
	/// Storage namespace is empty.
	#[error("Storage namespace must not be empty.")]
	EmptyNamespace,
	/// A configured URL does not use HTTP(S).
	#[error("The {field} URL must use HTTP or HTTPS: {url}.")]
	UnsupportedScheme {
		/// Which configuration field failed validation.
		field: &'static str,
		/// URL that failed validation.
		url: String,
	},
	/// Request URL cannot be parsed or joined onto the configured API base.
	#[error("Request URL `{url}` is invalid.")]
	InvalidRequestUrl {
		/// URL as supplied by the request spec.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request body could not be serialized to JSON.
	#[error("Request body could not be serialized.")]
	Body(#[from] serde_json::Error),
	/// HTTP method string is not recognized.
	#[error("HTTP method `{method}` is not supported.")]
	UnsupportedMethod {
		/// Method string that failed to parse.
		method: String,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling `{url}`.")]
	Network {
		/// Request URL that failed.
		url: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error for the provided URL.
	pub fn network(url: &Url, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { url: url.to_string(), source: Box::new(src) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::StoreError;

	#[test]
	fn store_error_converts_into_crate_error_with_source() {
		let store_error = StoreError::Backend { message: "disk unavailable".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("disk unavailable"));

		let source = StdError::source(&error)
			.expect("Crate error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn session_ending_errors_require_authentication() {
		let refresh = Error::RefreshFailed { message: "refresh token expired".into(), status: None };
		let api = Error::Api { message: "forbidden".into(), status: 403 };

		assert!(Error::NoStoredTokens.requires_authentication());
		assert!(refresh.requires_authentication());
		assert!(!api.requires_authentication());
		assert_eq!(refresh.to_string(), "Token refresh failed: refresh token expired.");
	}

	#[test]
	fn kind_and_status_label_failures() {
		let refresh = Error::RefreshFailed { message: "offline".into(), status: None };
		let api = Error::Api { message: "conflict".into(), status: 409 };

		assert_eq!((refresh.kind(), refresh.status()), ("refresh_failed", None));
		assert_eq!((api.kind(), api.status()), ("api", Some(409)));
		assert_eq!(Error::NoStoredTokens.kind(), "no_stored_tokens");
	}
}
