//! Transport primitives for refresh exchanges and authenticated API calls.
//!
//! The crate depends on an HTTP stack only through [`HttpTransport`]: a request goes out as an
//! [`HttpRequest`] (method, absolute URL, headers, optional body) and comes back as an
//! [`HttpResponse`] carrying the status and raw body bytes. Status interpretation and JSON
//! parsing stay in the refresher and dispatcher, so custom transports only move bytes.

// std
use std::ops::Deref;
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`HttpTransport::execute`].
pub type HttpFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks able to send one request and return its raw response.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can back many
/// dispatchers and refreshers behind an `Arc`. Non-2xx statuses are not transport failures:
/// they must be returned as an [`HttpResponse`] so callers can read the error body.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with the response status and body.
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_>;
}

/// Standard HTTP verbs accepted by request specs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
	/// `GET`
	#[default]
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
	/// `HEAD`
	Head,
	/// `OPTIONS`
	Options,
}
impl HttpMethod {
	/// Returns the canonical upper-case method name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Patch => "PATCH",
			Self::Delete => "DELETE",
			Self::Head => "HEAD",
			Self::Options => "OPTIONS",
		}
	}
}
impl Display for HttpMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for HttpMethod {
	type Err = crate::error::ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_uppercase().as_str() {
			"GET" => Ok(Self::Get),
			"POST" => Ok(Self::Post),
			"PUT" => Ok(Self::Put),
			"PATCH" => Ok(Self::Patch),
			"DELETE" => Ok(Self::Delete),
			"HEAD" => Ok(Self::Head),
			"OPTIONS" => Ok(Self::Options),
			_ => Err(crate::error::ConfigError::UnsupportedMethod { method: s.to_owned() }),
		}
	}
}

/// Outgoing request handed to an [`HttpTransport`].
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
	/// HTTP method.
	pub method: HttpMethod,
	/// Absolute request URL.
	pub url: Url,
	/// Header name/value pairs, including `Authorization` when attached.
	pub headers: BTreeMap<String, String>,
	/// Serialized request body.
	pub body: Option<Vec<u8>>,
}
impl HttpRequest {
	/// Returns the value of header `name` (case-insensitive), if set.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}
impl Debug for HttpRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let headers = self
			.headers
			.iter()
			.map(|(name, value)| {
				let value =
					if name.eq_ignore_ascii_case("authorization") { "<redacted>" } else { value };

				(name.as_str(), value)
			})
			.collect::<Vec<_>>();

		f.debug_struct("HttpRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("headers", &headers)
			.field("body_len", &self.body.as_ref().map(Vec::len))
			.finish()
	}
}

/// Raw response returned by an [`HttpTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Reads the `message` field of a JSON error body, if the body has one.
	pub fn error_message(&self) -> Option<String> {
		#[derive(Deserialize)]
		struct ErrorBody {
			message: Option<String>,
		}

		serde_json::from_slice::<ErrorBody>(&self.body)
			.ok()
			.and_then(|body| body.message)
			.filter(|message| !message.is_empty())
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	fn method(method: HttpMethod) -> reqwest::Method {
		match method {
			HttpMethod::Get => reqwest::Method::GET,
			HttpMethod::Post => reqwest::Method::POST,
			HttpMethod::Put => reqwest::Method::PUT,
			HttpMethod::Patch => reqwest::Method::PATCH,
			HttpMethod::Delete => reqwest::Method::DELETE,
			HttpMethod::Head => reqwest::Method::HEAD,
			HttpMethod::Options => reqwest::Method::OPTIONS,
		}
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
		Box::pin(async move {
			let HttpRequest { method, url, headers, body } = request;
			let mut builder = self.0.request(Self::method(method), url.clone());

			for (name, value) in &headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if let Some(body) = body {
				builder = builder.body(body);
			}

			let response =
				builder.send().await.map_err(|e| TransportError::network(&url, e))?;
			let status = response.status().as_u16();
			let body =
				response.bytes().await.map_err(|e| TransportError::network(&url, e))?.to_vec();

			Ok(HttpResponse { status, body })
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn methods_parse_case_insensitively() {
		assert_eq!("put".parse::<HttpMethod>().ok(), Some(HttpMethod::Put));
		assert_eq!(HttpMethod::default(), HttpMethod::Get);
		assert!("BREW".parse::<HttpMethod>().is_err());
	}

	#[test]
	fn error_message_tolerates_non_json_bodies() {
		let json = HttpResponse { status: 401, body: br#"{"message":"expired"}"#.to_vec() };
		let html = HttpResponse { status: 502, body: b"<html>bad gateway</html>".to_vec() };

		assert_eq!(json.error_message().as_deref(), Some("expired"));
		assert_eq!(html.error_message(), None);
		assert!(!json.is_success());
	}

	#[test]
	fn request_debug_redacts_authorization() {
		let request = HttpRequest {
			method: HttpMethod::Get,
			url: Url::parse("https://api.example.com/resource")
				.expect("Fixture URL should parse successfully."),
			headers: BTreeMap::from([("Authorization".to_owned(), "Bearer secret".to_owned())]),
			body: None,
		};

		assert_eq!(request.header("authorization"), Some("Bearer secret"));
		assert!(!format!("{request:?}").contains("secret"));
	}
}
