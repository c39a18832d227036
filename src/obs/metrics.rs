// self
use crate::{
	error::Classification,
	obs::{FlowKind, FlowOutcome},
};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_bridge_flow_total",
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

/// Records a failed refresh, labeled by its classification.
pub fn record_refresh_failed(classification: Classification) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_bridge_refresh_failed_total",
			"classification" => classification.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = classification;
	}
}

/// Records a closed session, labeled by whether it was authenticated.
pub fn record_session_closed(authenticated: bool) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_bridge_session_closed_total",
			"authenticated" => if authenticated { "true" } else { "false" }
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = authenticated;
	}
}
