// self
use crate::obs::{DispatchOutcome, PoolBackend, PoolEvent, RefreshOutcome};

/// Counts one finished dispatch, labeled by profile and outcome.
pub(super) fn record_dispatch(api: &str, outcome: DispatchOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"betconstruct_dispatch_total",
		"api" => api.to_owned(),
		"outcome" => outcome.as_str()
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (api, outcome);
}

/// Counts one pool event, labeled by backend.
pub(super) fn record_pool_event(backend: PoolBackend, event: PoolEvent) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"betconstruct_pool_events_total",
		"backend" => backend.as_str(),
		"event" => event.as_str()
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (backend, event);
}

/// Counts how one caller's pass through the refresh guard ended.
pub(super) fn record_refresh(outcome: RefreshOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!("betconstruct_session_refresh_total", "outcome" => outcome.as_str())
		.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = outcome;
}
