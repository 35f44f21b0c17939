//! Preemptive expiry window applied before using an access token.

// self
use crate::{_prelude::*, auth::Claims};

/// Decides whether an access token is too close to expiring to be used safely.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpirationPolicy {
	/// Safety margin subtracted from the token's stated expiry.
	pub window: Duration,
}
impl ExpirationPolicy {
	/// Default safety margin applied when none is configured.
	pub const DEFAULT_WINDOW: Duration = Duration::seconds(600);

	/// Creates a policy with the provided window; negative windows clamp to zero.
	pub fn new(window: Duration) -> Self {
		Self { window: if window.is_negative() { Duration::ZERO } else { window } }
	}

	/// Returns `true` when `claims.exp <= now + window`.
	pub fn is_near_expiry(&self, claims: &Claims, now: OffsetDateTime) -> bool {
		let deadline = now.unix_timestamp().saturating_add(self.window.whole_seconds());

		claims.exp <= deadline
	}
}
impl Default for ExpirationPolicy {
	fn default() -> Self {
		Self::new(Self::DEFAULT_WINDOW)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn claims(exp: i64) -> Claims {
		Claims { exp, extra: Default::default() }
	}

	#[test]
	fn boundary_is_inclusive() {
		let policy = ExpirationPolicy::default();
		let now = macros::datetime!(2025-11-10 12:00 UTC);
		let window = ExpirationPolicy::DEFAULT_WINDOW.whole_seconds();
		let base = now.unix_timestamp() + window;

		assert!(policy.is_near_expiry(&claims(base - 1), now));
		assert!(policy.is_near_expiry(&claims(base), now));
		assert!(!policy.is_near_expiry(&claims(base + 1), now));
	}

	#[test]
	fn already_expired_tokens_are_near_expiry() {
		let policy = ExpirationPolicy::new(Duration::ZERO);
		let now = macros::datetime!(2025-11-10 12:00 UTC);

		assert!(policy.is_near_expiry(&claims(now.unix_timestamp() - 300), now));
		assert!(!policy.is_near_expiry(&claims(now.unix_timestamp() + 1), now));
	}

	#[test]
	fn negative_window_clamps_to_zero() {
		let policy = ExpirationPolicy::new(Duration::seconds(-30));

		assert_eq!(policy.window, Duration::ZERO);
	}
}
