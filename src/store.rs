//! Shared-store contracts backing the distributed credential pool.
//!
//! A [`PoolStore`] models the small slice of a key/value server the pool needs: one ordered list
//! per pool plus expiring marker keys. Every method is a single round-trip; in particular
//! [`PoolStore::rotate`] must be one indivisible operation so that concurrent processes never
//! observe the same rotation step.

pub mod memory;
#[cfg(feature = "redis")] pub mod redis;

pub use memory::MemoryPoolStore;
#[cfg(feature = "redis")] pub use self::redis::RedisPoolStore;

// self
use crate::_prelude::*;

/// Boxed future returned by [`PoolStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract implemented by shared pool stores.
pub trait PoolStore
where
	Self: Send + Sync,
{
	/// Returns the number of elements in the list stored at `key` (0 when absent).
	fn list_len<'a>(&'a self, key: &'a str) -> StoreFuture<'a, usize>;

	/// Atomically moves the head of the list at `key` to its tail and returns it.
	fn rotate<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

	/// Atomically replaces the list at `key` with `values`.
	fn replace_list<'a>(&'a self, key: &'a str, values: Vec<String>) -> StoreFuture<'a, ()>;

	/// Returns a copy of the list at `key`.
	fn list<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Vec<String>>;

	/// Whether a non-expired value exists at `key`.
	fn exists<'a>(&'a self, key: &'a str) -> StoreFuture<'a, bool>;

	/// Writes `value` at `key` with a store-managed time-to-live.
	fn set_expiring<'a>(
		&'a self,
		key: &'a str,
		value: String,
		ttl: Duration,
	) -> StoreFuture<'a, ()>;

	/// Deletes `key`, returning whether something was removed.
	fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, bool>;
}

/// Error type produced by [`PoolStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// The store could not be reached or refused the command.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// A key holds a value of the wrong kind for the requested command.
	#[error("Key `{key}` holds an incompatible value.")]
	WrongType {
		/// Offending key.
		key: String,
	},
	/// Time-to-live values must be positive.
	#[error("Time-to-live must be positive.")]
	InvalidTtl,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{error::Error, pool::PoolError};

	#[test]
	fn store_error_converts_into_crate_error_with_source() {
		let store_error = StoreError::Backend { message: "store unreachable".into() };
		let err: Error = PoolError::from(store_error.clone()).into();

		assert!(err.to_string().contains("store unreachable"));

		let pool_error = match &err {
			Error::Pool(inner) => inner,
			other => panic!("Expected a pool error, got {other:?}."),
		};

		assert_eq!(pool_error, &PoolError::Store(store_error));
	}

	#[test]
	fn store_error_can_be_serialized() {
		let payload = serde_json::to_string(&StoreError::InvalidTtl)
			.expect("StoreError should serialize to JSON.");

		assert_eq!(payload, "\"InvalidTtl\"");
	}
}
