// self
use crate::obs::{FlowFailure, FlowKind, FlowOutcome};

/// Bumps `bearer_fetch_flow_total{flow,outcome}`.
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"bearer_fetch_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records a failed flow: the `failure` outcome plus `bearer_fetch_flow_failures_total{flow,error}`.
pub fn record_flow_failure(kind: FlowKind, failure: &FlowFailure) {
	record_flow_outcome(kind, FlowOutcome::Failure);

	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"bearer_fetch_flow_failures_total",
			"flow" => kind.as_str(),
			"error" => failure.error
		)
		.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = failure;
	}
}
