//! Rotating credential pools with rate-limit cooldowns.
//!
//! [`CredentialPool`] is the seam the dispatcher draws credentials from. Two backends ship with
//! the crate:
//!
//! - [`LocalPool`] keeps credentials in-process behind one mutex.
//! - [`DistributedPool`] keeps rotation order and cooldown markers in a shared
//!   [`PoolStore`](crate::store::PoolStore) so independent processes share one pool fairly. With
//!   the `redis` feature that store can be a Redis server.
//!
//! Both backends return `Ok(None)` when every credential is cooling down. That is an admission
//! decision, not an error, and is never retried internally.

pub mod distributed;
pub mod local;

pub use distributed::DistributedPool;
pub use local::LocalPool;

// self
use crate::{_prelude::*, auth::Credential, store::StoreError};

/// Boxed future returned by [`CredentialPool`] operations.
pub type PoolFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, PoolError>> + 'a + Send>>;

/// Source of interchangeable credentials for pool-backed dispatchers.
pub trait CredentialPool
where
	Self: Send + Sync,
{
	/// Returns the next usable credential in rotation order, or `None` when all are cooling down.
	fn acquire(&self) -> PoolFuture<'_, Option<Credential>>;

	/// Starts the cooldown for the credential with the given secret. Unknown secrets are ignored.
	fn mark_rate_limited<'a>(&'a self, secret: &'a str) -> PoolFuture<'a, ()>;

	/// Ends the cooldown early for the credential with the given secret.
	fn clear_rate_limit<'a>(&'a self, secret: &'a str) -> PoolFuture<'a, ()>;
}

/// Errors raised by credential pools.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum PoolError {
	/// The shared store backing a distributed pool failed.
	#[error(transparent)]
	Store(#[from] StoreError),
	/// The same secret was supplied twice; pool members must be unique.
	#[error("Credential pool members must be unique (duplicate at position {position}).")]
	DuplicateSecret {
		/// Zero-based position of the repeated secret.
		position: usize,
	},
}

/// Rejects duplicate secrets while preserving order.
pub(crate) fn ensure_unique<'a, I>(secrets: I) -> Result<(), PoolError>
where
	I: IntoIterator<Item = &'a str>,
{
	let mut seen = HashSet::new();

	for (position, secret) in secrets.into_iter().enumerate() {
		if !seen.insert(secret) {
			return Err(PoolError::DuplicateSecret { position });
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn duplicates_are_reported_by_position() {
		assert_eq!(ensure_unique(["a", "b", "c"]), Ok(()));
		assert_eq!(ensure_unique(["a", "b", "a"]), Err(PoolError::DuplicateSecret { position: 2 }));
	}
}
