//! Credential records owned by pools; callers only ever see cloned snapshots.

// self
use crate::{_prelude::*, auth::CredentialSecret};

/// Default cooldown applied after the platform rejects a pooled credential.
pub const RATE_LIMIT_COOLDOWN: Duration = Duration::minutes(4);

/// Bearer secret plus the usage metadata a pool tracks for it.
///
/// Fields are private so that only the owning pool can stamp usage or cooldown markers. Values
/// returned from [`CredentialPool::acquire`](crate::pool::CredentialPool::acquire) are snapshots
/// taken under the pool lock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
	secret: CredentialSecret,
	last_used_at: Option<OffsetDateTime>,
	rate_limited_at: Option<OffsetDateTime>,
}
impl Credential {
	/// Creates a fresh credential that has never been used or rate-limited.
	pub fn new(secret: impl Into<CredentialSecret>) -> Self {
		Self { secret: secret.into(), last_used_at: None, rate_limited_at: None }
	}

	/// Bearer secret sent on the wire.
	pub fn secret(&self) -> &CredentialSecret {
		&self.secret
	}

	/// Instant the credential was last handed out.
	pub fn last_used_at(&self) -> Option<OffsetDateTime> {
		self.last_used_at
	}

	/// Instant the platform last rejected a call made with this credential.
	pub fn rate_limited_at(&self) -> Option<OffsetDateTime> {
		self.rate_limited_at
	}

	/// Whether the credential is still cooling down at `now`.
	pub fn is_rate_limited_at(&self, now: OffsetDateTime, cooldown: Duration) -> bool {
		match self.rate_limited_at {
			Some(marked) => now - marked < cooldown,
			None => false,
		}
	}

	/// Convenience wrapper for [`Credential::is_rate_limited_at`] using the current time and
	/// [`RATE_LIMIT_COOLDOWN`].
	pub fn is_rate_limited(&self) -> bool {
		self.is_rate_limited_at(OffsetDateTime::now_utc(), RATE_LIMIT_COOLDOWN)
	}

	pub(crate) fn touch(&mut self, now: OffsetDateTime) {
		self.last_used_at = Some(now);
	}

	pub(crate) fn mark_rate_limited(&mut self, now: OffsetDateTime) {
		self.rate_limited_at = Some(now);
	}

	pub(crate) fn clear_rate_limit(&mut self) {
		self.rate_limited_at = None;
	}
}
