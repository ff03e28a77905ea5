//! In-process credential pool guarded by a single mutex.

// self
use crate::{
	_prelude::*,
	auth::{Credential, CredentialSecret, RATE_LIMIT_COOLDOWN},
	obs::{self, PoolBackend},
	pool::{self, CredentialPool, PoolError, PoolFuture},
};

#[derive(Debug)]
struct LocalState {
	credentials: Vec<Credential>,
	cursor: usize,
}

/// Round-robin pool that owns its credentials in-process.
///
/// The scan-and-stamp sequence runs under one [`Mutex`], so two concurrent callers can never be
/// handed the same rotation slot and `last_used_at` is always recorded before the lock is
/// released. The lock is never held across an await point.
#[derive(Debug)]
pub struct LocalPool {
	state: Mutex<LocalState>,
	cooldown: Duration,
}
impl LocalPool {
	/// Builds a pool from unique secrets, in rotation order.
	pub fn new<I, S>(secrets: I) -> Result<Self, PoolError>
	where
		I: IntoIterator<Item = S>,
		S: Into<CredentialSecret>,
	{
		let credentials = secrets.into_iter().map(Credential::new).collect::<Vec<_>>();

		pool::ensure_unique(credentials.iter().map(|credential| credential.secret().expose()))?;

		Ok(Self {
			state: Mutex::new(LocalState { credentials, cursor: 0 }),
			cooldown: RATE_LIMIT_COOLDOWN,
		})
	}

	/// Overrides the cooldown (defaults to [`RATE_LIMIT_COOLDOWN`]).
	pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
		self.cooldown = if cooldown.is_negative() { Duration::ZERO } else { cooldown };

		self
	}

	/// Cooldown applied after a rate-limit mark.
	pub fn cooldown(&self) -> Duration {
		self.cooldown
	}

	/// Number of credentials in the pool.
	pub fn len(&self) -> usize {
		self.state.lock().credentials.len()
	}

	/// Whether the pool holds no credentials at all.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Copies every credential record in rotation order.
	pub fn snapshot(&self) -> Vec<Credential> {
		self.state.lock().credentials.clone()
	}

	/// Selects the next usable credential as of `now`.
	pub fn acquire_at(&self, now: OffsetDateTime) -> Option<Credential> {
		let mut state = self.state.lock();
		let n = state.credentials.len();

		for offset in 0..n {
			let idx = (state.cursor + offset) % n;
			let credential = &mut state.credentials[idx];

			if credential.is_rate_limited_at(now, self.cooldown) {
				continue;
			}

			credential.touch(now);

			let selected = credential.clone();

			state.cursor = (idx + 1) % n;

			return Some(selected);
		}

		None
	}

	/// Stamps the cooldown marker on the matching credential as of `now`.
	pub fn mark_rate_limited_at(&self, secret: &str, now: OffsetDateTime) -> bool {
		let mut state = self.state.lock();

		match state.credentials.iter_mut().find(|credential| credential.secret().expose() == secret)
		{
			Some(credential) => {
				credential.mark_rate_limited(now);

				true
			},
			None => false,
		}
	}

	/// Removes the cooldown marker from the matching credential.
	pub fn clear_rate_limit_now(&self, secret: &str) -> bool {
		let mut state = self.state.lock();

		match state.credentials.iter_mut().find(|credential| credential.secret().expose() == secret)
		{
			Some(credential) => {
				credential.clear_rate_limit();

				true
			},
			None => false,
		}
	}
}
impl CredentialPool for LocalPool {
	fn acquire(&self) -> PoolFuture<'_, Option<Credential>> {
		Box::pin(async move {
			let selected = self.acquire_at(OffsetDateTime::now_utc());

			match &selected {
				Some(credential) => obs::credential_selected(
					PoolBackend::Local,
					&credential.secret().fingerprint(),
				),
				None => obs::pool_exhausted(PoolBackend::Local, self.len()),
			}

			Ok(selected)
		})
	}

	fn mark_rate_limited<'a>(&'a self, secret: &'a str) -> PoolFuture<'a, ()> {
		Box::pin(async move {
			if self.mark_rate_limited_at(secret, OffsetDateTime::now_utc()) {
				obs::credential_rate_limited(
					PoolBackend::Local,
					&CredentialSecret::from(secret).fingerprint(),
					self.cooldown,
				);
			}

			Ok(())
		})
	}

	fn clear_rate_limit<'a>(&'a self, secret: &'a str) -> PoolFuture<'a, ()> {
		Box::pin(async move {
			self.clear_rate_limit_now(secret);

			Ok(())
		})
	}
}
