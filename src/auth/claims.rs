//! Unsigned claims decoding for expiry bookkeeping.
//!
//! [`decode_claims`] reads the payload segment of a dot-delimited token and nothing more. It does
//! not verify the signature, so the resulting [`Claims`] must never be treated as proof that the
//! token is authentic; the server remains the only authority on that. The crate reads `exp` so it
//! can refresh ahead of server-side rejection.

// crates.io
use base64::{
	Engine as _,
	alphabet,
	engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
// self
use crate::_prelude::*;

const LENIENT: GeneralPurposeConfig =
	GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Errors raised while reading a token's claims segment.
#[derive(Debug, ThisError)]
pub enum MalformedTokenError {
	/// The token has no second dot-delimited segment.
	#[error("Token does not contain a claims segment.")]
	MissingPayload,
	/// The claims segment is not valid base64.
	#[error("Token claims segment is not valid base64.")]
	Base64(#[from] base64::DecodeError),
	/// The decoded claims are not a JSON object with a numeric `exp`.
	#[error("Token claims are not valid JSON.")]
	Json(#[from] serde_path_to_error::Error<serde_json::error::Error>),
}

/// Decoded token payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
	/// Expiration instant in seconds since the Unix epoch.
	pub exp: i64,
	/// Remaining claims, kept opaque.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}
impl Claims {
	/// Returns the expiration as an [`OffsetDateTime`], when it fits the supported range.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		OffsetDateTime::from_unix_timestamp(self.exp).ok()
	}
}

/// Decodes the claims segment of `token` without verifying its signature.
pub fn decode_claims(token: &str) -> Result<Claims, MalformedTokenError> {
	let payload = token.split('.').nth(1).ok_or(MalformedTokenError::MissingPayload)?;
	let bytes = URL_SAFE_LENIENT.decode(payload).or_else(|err| {
		// Fall back for issuers that emit the standard alphabet.
		STANDARD_LENIENT.decode(payload).map_err(|_| err)
	})?;
	let de = &mut serde_json::Deserializer::from_slice(&bytes);

	Ok(serde_path_to_error::deserialize(de)?)
}

#[cfg(test)]
mod tests {
	// crates.io
	use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
	// self
	use super::*;

	fn token_with_payload(payload: &str) -> String {
		format!("eyJhbGciOiJIUzI1NiJ9.{payload}.sig")
	}

	#[test]
	fn decodes_url_safe_claims_and_keeps_extra_fields() {
		let payload = URL_SAFE_NO_PAD.encode(r#"{"exp":1700000000,"sub":"user-1"}"#);
		let claims = decode_claims(&token_with_payload(&payload))
			.expect("Well-formed claims should decode.");

		assert_eq!(claims.exp, 1_700_000_000);
		assert_eq!(claims.extra.get("sub").and_then(|v| v.as_str()), Some("user-1"));
		assert_eq!(
			claims.expires_at().map(OffsetDateTime::unix_timestamp),
			Some(1_700_000_000)
		);
	}

	#[test]
	fn decodes_padded_standard_alphabet() {
		// `~~~?` encodes with a `+`, which only the standard alphabet accepts.
		let payload = STANDARD.encode(r#"{"exp":42,"note":"~~~?"}"#);

		assert!(payload.contains('+'));

		let claims = decode_claims(&token_with_payload(&payload))
			.expect("Standard-alphabet claims should decode.");

		assert_eq!(claims.exp, 42);
	}

	#[test]
	fn single_segment_token_is_malformed() {
		let err = decode_claims("not-a-jwt").expect_err("A token without dots must be rejected.");

		assert!(matches!(err, MalformedTokenError::MissingPayload));
	}

	#[test]
	fn invalid_base64_is_malformed() {
		let err = decode_claims("header.***.sig").expect_err("Invalid base64 must be rejected.");

		assert!(matches!(err, MalformedTokenError::Base64(_)));
	}

	#[test]
	fn missing_exp_is_a_hard_error() {
		let payload = URL_SAFE_NO_PAD.encode(r#"{"sub":"user-1"}"#);
		let err = decode_claims(&token_with_payload(&payload))
			.expect_err("Claims without exp must be rejected.");

		assert!(matches!(err, MalformedTokenError::Json(_)));

		let payload = URL_SAFE_NO_PAD.encode("not json");
		let err = decode_claims(&token_with_payload(&payload))
			.expect_err("Non-JSON claims must be rejected.");

		assert!(matches!(err, MalformedTokenError::Json(_)));
	}
}
