//! Access/refresh token pairs.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Access and refresh tokens issued together for one session.
///
/// Both secrets are non-empty by construction. A pair that is missing either half is treated as
/// absent, so callers obtain one through [`TokenPair::from_parts`] when the halves come from
/// untrusted state.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
	/// Short-lived bearer credential used on API calls.
	pub access_token: TokenSecret,
	/// Longer-lived credential exchanged for new access tokens.
	pub refresh_token: TokenSecret,
}
impl TokenPair {
	/// Creates a pair from two token strings.
	///
	/// Prefer [`TokenPair::from_parts`] when either value may be empty.
	pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
		}
	}

	/// Returns a pair only when both halves are present and non-empty.
	pub fn from_parts(
		access_token: Option<impl Into<String>>,
		refresh_token: Option<impl Into<String>>,
	) -> Option<Self> {
		let access_token = access_token.map(Into::into).filter(|v: &String| !v.is_empty())?;
		let refresh_token = refresh_token.map(Into::into).filter(|v: &String| !v.is_empty())?;

		Some(Self::new(access_token, refresh_token))
	}

	/// Returns a copy carrying `access_token` and the original refresh token.
	pub fn with_access_token(&self, access_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: self.refresh_token.clone(),
		}
	}

	/// Returns `true` when both halves are non-empty.
	pub fn is_complete(&self) -> bool {
		!self.access_token.expose().is_empty() && !self.refresh_token.expose().is_empty()
	}
}
impl Debug for TokenPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenPair")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn partial_parts_are_absent() {
		assert!(TokenPair::from_parts(Some("access"), None::<String>).is_none());
		assert!(TokenPair::from_parts(None::<String>, Some("refresh")).is_none());
		assert!(TokenPair::from_parts(Some(""), Some("refresh")).is_none());

		let pair = TokenPair::from_parts(Some("access"), Some("refresh"))
			.expect("Complete parts should build a pair.");

		assert!(pair.is_complete());
		assert_eq!(pair.access_token.expose(), "access");
	}

	#[test]
	fn splicing_keeps_refresh_token() {
		let pair = TokenPair::new("old-access", "refresh");
		let spliced = pair.with_access_token("new-access");

		assert_eq!(spliced.access_token.expose(), "new-access");
		assert_eq!(spliced.refresh_token, pair.refresh_token);
	}

	#[test]
	fn serializes_with_camel_case_keys() {
		let json = serde_json::to_value(TokenPair::new("a", "r"))
			.expect("Token pair should serialize to JSON.");

		assert_eq!(json, serde_json::json!({ "accessToken": "a", "refreshToken": "r" }));
		assert!(!format!("{:?}", TokenPair::new("a", "r")).contains("\"a\""));
	}
}
