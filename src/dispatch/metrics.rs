// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters shared by a dispatcher and its clones.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
	calls: AtomicU64,
	retries: AtomicU64,
	logins: AtomicU64,
	login_failures: AtomicU64,
	rate_limit_marks: AtomicU64,
	pool_exhaustions: AtomicU64,
}
impl DispatchMetrics {
	/// Returns the number of dispatch calls started.
	pub fn calls(&self) -> u64 {
		self.calls.load(Ordering::Relaxed)
	}

	/// Returns the number of requests replayed after a session refresh.
	pub fn retries(&self) -> u64 {
		self.retries.load(Ordering::Relaxed)
	}

	/// Returns the number of session logins performed.
	pub fn logins(&self) -> u64 {
		self.logins.load(Ordering::Relaxed)
	}

	/// Returns the number of session logins that failed.
	pub fn login_failures(&self) -> u64 {
		self.login_failures.load(Ordering::Relaxed)
	}

	/// Returns the number of credentials marked rate-limited by this dispatcher.
	pub fn rate_limit_marks(&self) -> u64 {
		self.rate_limit_marks.load(Ordering::Relaxed)
	}

	/// Returns the number of calls rejected because the pool had no usable credential.
	pub fn pool_exhaustions(&self) -> u64 {
		self.pool_exhaustions.load(Ordering::Relaxed)
	}

	pub(crate) fn record_call(&self) {
		self.calls.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_retry(&self) {
		self.retries.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_login(&self) {
		self.logins.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_login_failure(&self) {
		self.login_failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_rate_limit_mark(&self) {
		self.rate_limit_marks.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_pool_exhaustion(&self) {
		self.pool_exhaustions.fetch_add(1, Ordering::Relaxed);
	}
}
