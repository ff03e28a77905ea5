//! Credential pool shared across processes through a [`PoolStore`].
//!
//! Rotation order lives in one list under the pool key; each probe is the store's atomic
//! head-to-tail rotation, so concurrent processes advance the shared cursor without a lock.
//! Cooldowns are marker keys that the store expires on its own, which keeps expiry independent of
//! the clocks of individual clients.

// self
use crate::{
	_prelude::*,
	auth::{Credential, CredentialSecret, RATE_LIMIT_COOLDOWN},
	obs::{self, PoolBackend},
	pool::{self, CredentialPool, PoolError, PoolFuture},
	store::PoolStore,
};

/// Pool key used when the caller does not supply one.
pub const DEFAULT_POOL_KEY: &str = "auth_token_pool";

/// Pool whose rotation and cooldown state live in a shared store.
///
/// Store failures are returned as [`PoolError::Store`] so callers can tell an unreachable store
/// apart from a pool whose credentials are all cooling down (`Ok(None)`).
pub struct DistributedPool<S>
where
	S: ?Sized + PoolStore,
{
	store: Arc<S>,
	key: String,
	marker_prefix: String,
	cooldown: Duration,
}
impl<S> DistributedPool<S>
where
	S: ?Sized + PoolStore,
{
	/// Creates a pool view over `key` in `store` (empty keys fall back to [`DEFAULT_POOL_KEY`]).
	pub fn new(store: impl Into<Arc<S>>, key: impl Into<String>) -> Self {
		let key = key.into();
		let key = if key.is_empty() { DEFAULT_POOL_KEY.to_owned() } else { key };
		let marker_prefix = format!("{key}:ratelimit");

		Self { store: store.into(), key, marker_prefix, cooldown: RATE_LIMIT_COOLDOWN }
	}

	/// Overrides the cooldown written as the marker time-to-live.
	///
	/// Negative values clamp to zero, and a zero cooldown writes no marker at all.
	pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
		self.cooldown = if cooldown.is_negative() { Duration::ZERO } else { cooldown };

		self
	}

	/// Cooldown applied after a rate-limit mark.
	pub fn cooldown(&self) -> Duration {
		self.cooldown
	}

	/// Shared list key.
	pub fn key(&self) -> &str {
		&self.key
	}

	/// Store key of the cooldown marker for `secret`.
	pub fn marker_key(&self, secret: &str) -> String {
		format!("{}:{secret}", self.marker_prefix)
	}

	/// Atomically replaces the shared membership with `secrets`, in rotation order.
	pub async fn seed<I, T>(&self, secrets: I) -> Result<(), PoolError>
	where
		I: IntoIterator<Item = T>,
		T: Into<CredentialSecret>,
	{
		let secrets = secrets
			.into_iter()
			.map(|secret| secret.into().expose().to_owned())
			.collect::<Vec<_>>();

		pool::ensure_unique(secrets.iter().map(String::as_str))?;

		self.store.replace_list(&self.key, secrets).await?;

		Ok(())
	}

	/// Number of credentials currently registered in the shared list.
	pub async fn len(&self) -> Result<usize, PoolError> {
		Ok(self.store.list_len(&self.key).await?)
	}

	async fn acquire_from_store(&self) -> Result<Option<Credential>, PoolError> {
		let n = self.store.list_len(&self.key).await?;

		for _ in 0..n {
			let Some(secret) = self.store.rotate(&self.key).await? else {
				return Ok(None);
			};

			if self.store.exists(&self.marker_key(&secret)).await? {
				continue;
			}

			let mut credential = Credential::new(secret);

			credential.touch(OffsetDateTime::now_utc());
			obs::credential_selected(PoolBackend::Distributed, &credential.secret().fingerprint());

			return Ok(Some(credential));
		}

		obs::pool_exhausted(PoolBackend::Distributed, n);

		Ok(None)
	}

	async fn mark_in_store(&self, secret: &str) -> Result<(), PoolError> {
		if self.cooldown.is_positive() {
			let marked_at = OffsetDateTime::now_utc().unix_timestamp().to_string();

			self.store.set_expiring(&self.marker_key(secret), marked_at, self.cooldown).await?;
		}

		obs::credential_rate_limited(
			PoolBackend::Distributed,
			&CredentialSecret::from(secret).fingerprint(),
			self.cooldown,
		);

		Ok(())
	}
}
impl<S> CredentialPool for DistributedPool<S>
where
	S: ?Sized + PoolStore,
{
	fn acquire(&self) -> PoolFuture<'_, Option<Credential>> {
		Box::pin(self.acquire_from_store())
	}

	fn mark_rate_limited<'a>(&'a self, secret: &'a str) -> PoolFuture<'a, ()> {
		Box::pin(self.mark_in_store(secret))
	}

	fn clear_rate_limit<'a>(&'a self, secret: &'a str) -> PoolFuture<'a, ()> {
		Box::pin(async move {
			self.store.delete(&self.marker_key(secret)).await?;

			Ok(())
		})
	}
}
impl<S> Debug for DistributedPool<S>
where
	S: ?Sized + PoolStore,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DistributedPool")
			.field("key", &self.key)
			.field("cooldown", &self.cooldown)
			.finish()
	}
}
