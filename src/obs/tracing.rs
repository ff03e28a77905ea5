// self
use crate::{
	_prelude::*,
	obs::{DispatchOutcome, PoolBackend, RefreshOutcome},
};

/// Future type produced by [`DispatchSpan::instrument`].
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// Span wrapped around a dispatch, a session refresh, or a platform login.
#[derive(Clone, Debug)]
pub struct DispatchSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl DispatchSpan {
	/// Span for one platform call against `api`; `stage` names the entry point.
	pub fn dispatch(api: &str, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self { span: tracing::info_span!("betconstruct.dispatch", api, stage) }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (api, stage);

			Self {}
		}
	}

	/// Span for a login performed under the refresh guard, starting from `generation`.
	pub fn refresh(generation: u64) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self { span: tracing::info_span!("betconstruct.refresh", generation) }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = generation;

			Self {}
		}
	}

	/// Span for a platform-token exchange against `api`.
	pub fn login(api: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self { span: tracing::info_span!("betconstruct.login", api) }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = api;

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

pub(super) fn dispatch_finished(api: &str, stage: &'static str, outcome: DispatchOutcome) {
	#[cfg(feature = "tracing")]
	{
		let label = outcome.as_str();

		match outcome {
			DispatchOutcome::Success => tracing::debug!(api, stage, "Platform call succeeded."),
			DispatchOutcome::Transport | DispatchOutcome::PoolError =>
				tracing::warn!(api, stage, outcome = label, "Platform call failed."),
			_ => tracing::info!(api, stage, outcome = label, "Platform call rejected."),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (api, stage, outcome);
	}
}

pub(super) fn credential_selected(backend: PoolBackend, fingerprint: &str) {
	#[cfg(feature = "tracing")]
	tracing::debug!(backend = backend.as_str(), credential = fingerprint, "Selected credential.");
	#[cfg(not(feature = "tracing"))]
	let _ = (backend, fingerprint);
}

pub(super) fn credential_rate_limited(
	backend: PoolBackend,
	fingerprint: &str,
	cooldown: Duration,
) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		backend = backend.as_str(),
		credential = fingerprint,
		cooldown_ms = cooldown.whole_milliseconds() as u64,
		"Credential rejected by the platform; cooling down."
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (backend, fingerprint, cooldown);
}

pub(super) fn pool_exhausted(backend: PoolBackend, size: usize) {
	#[cfg(feature = "tracing")]
	tracing::warn!(backend = backend.as_str(), size, "Every pooled credential is cooling down.");
	#[cfg(not(feature = "tracing"))]
	let _ = (backend, size);
}

pub(super) fn refresh_finished(outcome: RefreshOutcome, generation: u64) {
	#[cfg(feature = "tracing")]
	{
		match outcome {
			RefreshOutcome::LoggedIn =>
				tracing::info!(generation, "Installed a fresh session token."),
			RefreshOutcome::Coalesced =>
				tracing::debug!(generation, "Reusing session refreshed by a concurrent call."),
			RefreshOutcome::Suppressed =>
				tracing::debug!(generation, "A login after this request already failed."),
			RefreshOutcome::Failed => tracing::warn!(generation, "Session login failed."),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (outcome, generation);
	}
}
