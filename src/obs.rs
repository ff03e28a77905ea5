//! Optional observability for dispatches, session refreshes, and credential pools.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to wrap calls in spans named `betconstruct.dispatch` (`api`, `stage`),
//!   `betconstruct.refresh` (`generation`), and `betconstruct.login` (`api`), and to emit events
//!   for pool activity and refresh decisions. Credentials only ever appear as
//!   [`fingerprint`](crate::auth::CredentialSecret::fingerprint) tags.
//! - Enable `metrics` to feed three counters:
//!   - `betconstruct_dispatch_total{api, outcome}`
//!   - `betconstruct_pool_events_total{backend, event}`
//!   - `betconstruct_session_refresh_total{outcome}`

mod metrics;
mod tracing;

pub use self::tracing::{DispatchSpan, InstrumentedOp};

// self
use crate::{_prelude::*, error::StatusError};

/// Pool implementation that produced an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolBackend {
	/// [`LocalPool`](crate::pool::LocalPool).
	Local,
	/// [`DistributedPool`](crate::pool::DistributedPool).
	Distributed,
}
impl PoolBackend {
	/// Label used in span fields and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			PoolBackend::Local => "local",
			PoolBackend::Distributed => "distributed",
		}
	}
}

/// Pool activity counted per backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolEvent {
	/// A credential was handed out.
	Selected,
	/// A credential entered its cooldown.
	RateLimited,
	/// Every credential was cooling down.
	Exhausted,
}
impl PoolEvent {
	/// Label used in span fields and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			PoolEvent::Selected => "selected",
			PoolEvent::RateLimited => "rate_limited",
			PoolEvent::Exhausted => "exhausted",
		}
	}
}

/// How a coordinated refresh ended for the caller that entered it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshOutcome {
	/// This caller performed the login and installed a new token.
	LoggedIn,
	/// Another caller had already installed a newer token.
	Coalesced,
	/// A login started after this caller's request had already failed; no new attempt was made.
	Suppressed,
	/// The login performed by this caller failed.
	Failed,
}
impl RefreshOutcome {
	/// Label used in span fields and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			RefreshOutcome::LoggedIn => "logged_in",
			RefreshOutcome::Coalesced => "coalesced",
			RefreshOutcome::Suppressed => "suppressed",
			RefreshOutcome::Failed => "failed",
		}
	}
}

/// Coarse classification of a finished dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DispatchOutcome {
	/// 2xx with a clean envelope.
	Success,
	/// HTTP 401.
	Unauthorized,
	/// HTTP 403.
	Forbidden,
	/// HTTP 429.
	TooManyRequests,
	/// Any other non-2xx status.
	Status,
	/// No pooled credential was usable.
	PoolExhausted,
	/// The pool's backing store failed.
	PoolError,
	/// The envelope carried `HasError`.
	Application,
	/// The request never produced a response.
	Transport,
	/// The payload did not match the expected shape.
	Decode,
	/// The request could not be built.
	Config,
	/// A report export was requested before the file existed.
	ReportNotReady,
}
impl DispatchOutcome {
	/// Classifies a dispatch result.
	pub fn of<T>(result: &Result<T>) -> Self {
		let Err(e) = result else {
			return DispatchOutcome::Success;
		};

		match e {
			Error::Status(StatusError::Unauthorized) => DispatchOutcome::Unauthorized,
			Error::Status(StatusError::Forbidden) => DispatchOutcome::Forbidden,
			Error::Status(StatusError::TooManyRequests { .. }) => DispatchOutcome::TooManyRequests,
			Error::Status(_) => DispatchOutcome::Status,
			Error::NoCredentialAvailable => DispatchOutcome::PoolExhausted,
			Error::Pool(_) => DispatchOutcome::PoolError,
			Error::Application { .. } => DispatchOutcome::Application,
			Error::Transport(_) => DispatchOutcome::Transport,
			Error::Decode { .. } => DispatchOutcome::Decode,
			Error::Config(_) => DispatchOutcome::Config,
			Error::ReportNotReady => DispatchOutcome::ReportNotReady,
		}
	}

	/// Label used in span fields and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			DispatchOutcome::Success => "success",
			DispatchOutcome::Unauthorized => "unauthorized",
			DispatchOutcome::Forbidden => "forbidden",
			DispatchOutcome::TooManyRequests => "too_many_requests",
			DispatchOutcome::Status => "status",
			DispatchOutcome::PoolExhausted => "pool_exhausted",
			DispatchOutcome::PoolError => "pool_error",
			DispatchOutcome::Application => "application",
			DispatchOutcome::Transport => "transport",
			DispatchOutcome::Decode => "decode",
			DispatchOutcome::Config => "config",
			DispatchOutcome::ReportNotReady => "report_not_ready",
		}
	}
}

/// Records a finished dispatch for `api`.
pub fn dispatch_finished(api: &str, stage: &'static str, outcome: DispatchOutcome) {
	self::tracing::dispatch_finished(api, stage, outcome);
	self::metrics::record_dispatch(api, outcome);
}

/// Records that `backend` handed out the credential tagged `fingerprint`.
pub fn credential_selected(backend: PoolBackend, fingerprint: &str) {
	self::tracing::credential_selected(backend, fingerprint);
	self::metrics::record_pool_event(backend, PoolEvent::Selected);
}

/// Records that the credential tagged `fingerprint` entered a cooldown of `cooldown`.
pub fn credential_rate_limited(backend: PoolBackend, fingerprint: &str, cooldown: Duration) {
	self::tracing::credential_rate_limited(backend, fingerprint, cooldown);
	self::metrics::record_pool_event(backend, PoolEvent::RateLimited);
}

/// Records that all `size` credentials of `backend` were cooling down.
pub fn pool_exhausted(backend: PoolBackend, size: usize) {
	self::tracing::pool_exhausted(backend, size);
	self::metrics::record_pool_event(backend, PoolEvent::Exhausted);
}

/// Records how a refresh ended; `generation` is the session generation afterwards.
pub fn refresh_finished(outcome: RefreshOutcome, generation: u64) {
	self::tracing::refresh_finished(outcome, generation);
	self::metrics::record_refresh(outcome);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{error::TransportError, pool::PoolError, store::StoreError};

	#[test]
	fn dispatch_outcomes_follow_the_error_kind() {
		let cases: [(Result<()>, &str); 7] = [
			(Ok(()), "success"),
			(Err(StatusError::Unauthorized.into()), "unauthorized"),
			(Err(StatusError::TooManyRequests { retry_after: None }.into()), "too_many_requests"),
			(Err(StatusError::NotFound.into()), "status"),
			(Err(Error::NoCredentialAvailable), "pool_exhausted"),
			(Err(PoolError::from(StoreError::InvalidTtl).into()), "pool_error"),
			(
				Err(TransportError::Io(std::io::ErrorKind::ConnectionRefused.into()).into()),
				"transport",
			),
		];

		for (result, label) in cases {
			assert_eq!(DispatchOutcome::of(&result).as_str(), label);
		}
	}

	#[test]
	fn helpers_run_without_optional_features() {
		dispatch_finished("backoffice", "execute", DispatchOutcome::Application);
		credential_selected(PoolBackend::Local, "aec80848");
		credential_rate_limited(PoolBackend::Distributed, "aec80848", Duration::minutes(4));
		pool_exhausted(PoolBackend::Local, 2);
		refresh_finished(RefreshOutcome::Coalesced, 3);
	}
}
