//! Optional observability helpers for token and request flows.
//!
//! # Feature Flags
//!
//! - `tracing`: every observed flow runs in a `bearer_fetch.flow` span carrying `flow` and `stage`.
//!   Failures fill the span's `error` and `status` fields and emit a `warn` event.
//! - `metrics`: `bearer_fetch_flow_total{flow,outcome}` counts attempts and their outcomes;
//!   `bearer_fetch_flow_failures_total{flow,error}` breaks failures down by [`Error::kind`].

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Flow kinds observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Token pair resolution from caller state or storage.
	Resolve,
	/// Access token refresh exchange.
	Refresh,
	/// Outgoing API request.
	Dispatch,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Resolve => "resolve",
			FlowKind::Refresh => "refresh",
			FlowKind::Dispatch => "dispatch",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Labels attached to a failed flow, derived from the crate [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlowFailure {
	/// [`Error::kind`] of the failure.
	pub error: &'static str,
	/// HTTP status, when the failure came from a response.
	pub status: Option<u16>,
	/// Whether the session has to log in again.
	pub reauthenticate: bool,
}
impl FlowFailure {
	/// Extracts labels from `err`.
	pub fn of(err: &Error) -> Self {
		Self { error: err.kind(), status: err.status(), reauthenticate: err.requires_authentication() }
	}
}

/// Runs `fut` inside a [`FlowSpan`], recording the attempt and its outcome.
///
/// Failures are tagged on the span and counted by [`FlowFailure::error`].
pub async fn observe<T, Fut>(kind: FlowKind, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = FlowSpan::new(kind, stage);

	record_flow_outcome(kind, FlowOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => record_flow_outcome(kind, FlowOutcome::Success),
		Err(err) => {
			let failure = FlowFailure::of(err);

			span.record_failure(&failure, err);
			record_flow_failure(kind, &failure);
		},
	}

	result
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn observe_passes_results_through() {
		let ok = observe(FlowKind::Resolve, "ok", async { Ok(7) }).await;
		let err = observe(FlowKind::Refresh, "err", async {
			Err::<u8, _>(Error::RefreshFailed { message: "rejected".into(), status: Some(401) })
		})
		.await;

		assert_eq!(ok.ok(), Some(7));
		assert!(matches!(err, Err(Error::RefreshFailed { status: Some(401), .. })));
	}

	#[test]
	fn failure_labels_follow_the_error() {
		let refresh = Error::RefreshFailed { message: "expired".into(), status: Some(401) };
		let api = Error::Api { message: "busy".into(), status: 503 };

		assert_eq!(
			FlowFailure::of(&refresh),
			FlowFailure { error: "refresh_failed", status: Some(401), reauthenticate: true }
		);
		assert_eq!(
			FlowFailure::of(&api),
			FlowFailure { error: "api", status: Some(503), reauthenticate: false }
		);
		assert_eq!(FlowFailure::of(&Error::NoStoredTokens).status, None);
	}
}
