// self
use crate::{
	_prelude::*,
	obs::{FlowFailure, FlowKind},
};

/// Span wrapping one observed flow; a no-op without the `tracing` feature.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens a `bearer_fetch.flow` span; `error` and `status` stay empty until a failure.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"bearer_fetch.flow",
				flow = kind.as_str(),
				stage,
				error = tracing::field::Empty,
				status = tracing::field::Empty,
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Enters the span for a synchronous section.
	pub fn entered(self) -> FlowSpanGuard {
		FlowSpanGuard {
			#[cfg(feature = "tracing")]
			_guard: self.span.entered(),
		}
	}

	/// Runs `fut` inside the span.
	pub fn instrument<Fut>(&self, fut: Fut) -> impl Future<Output = Fut::Output>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			tracing::Instrument::instrument(fut, self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}

	/// Tags the span with `failure` and logs `err` as a warning inside it.
	pub fn record_failure(&self, failure: &FlowFailure, err: &Error) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("error", failure.error);

			if let Some(status) = failure.status {
				self.span.record("status", status);
			}

			tracing::warn!(
				parent: &self.span,
				reauthenticate = failure.reauthenticate,
				detail = %err,
				"flow failed"
			);
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (failure, err);
		}
	}
}

/// Guard returned by [`FlowSpan::entered`]; exits the span on drop.
pub struct FlowSpanGuard {
	#[cfg(feature = "tracing")]
	_guard: tracing::span::EnteredSpan,
}
impl Debug for FlowSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FlowSpanGuard(..)")
	}
}
