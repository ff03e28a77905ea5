//! Thread-safe in-memory [`PoolStore`] for single-host deployments and tests.

// self
use crate::{
	_prelude::*,
	store::{PoolStore, StoreError, StoreFuture},
};

type StoreState = Arc<Mutex<MemoryState>>;

#[derive(Debug, Default)]
struct MemoryState {
	lists: HashMap<String, VecDeque<String>>,
	values: HashMap<String, (String, OffsetDateTime)>,
}
impl MemoryState {
	fn purge_expired(&mut self, key: &str, now: OffsetDateTime) {
		if self.values.get(key).is_some_and(|(_, expires_at)| *expires_at <= now) {
			self.values.remove(key);
		}
	}

	fn sweep_expired(&mut self, now: OffsetDateTime) {
		self.values.retain(|_, (_, expires_at)| *expires_at > now);
	}

	fn ensure_not_value(&self, key: &str) -> Result<(), StoreError> {
		if self.values.contains_key(key) {
			Err(StoreError::WrongType { key: key.to_owned() })
		} else {
			Ok(())
		}
	}

	fn ensure_not_list(&self, key: &str) -> Result<(), StoreError> {
		if self.lists.contains_key(key) {
			Err(StoreError::WrongType { key: key.to_owned() })
		} else {
			Ok(())
		}
	}
}

/// Store that keeps lists and expiring keys in-process.
///
/// Clones share state, so every [`DistributedPool`](crate::pool::DistributedPool) built from clones
/// of one store sees the same rotation and markers. Each command runs under a single lock, which
/// gives [`PoolStore::rotate`] the required atomicity.
#[derive(Clone, Debug, Default)]
pub struct MemoryPoolStore(StoreState);
impl MemoryPoolStore {
	fn list_len_now(state: &StoreState, key: &str) -> Result<usize, StoreError> {
		let guard = state.lock();

		guard.ensure_not_value(key)?;

		Ok(guard.lists.get(key).map_or(0, VecDeque::len))
	}

	fn rotate_now(state: &StoreState, key: &str) -> Result<Option<String>, StoreError> {
		let mut guard = state.lock();

		guard.ensure_not_value(key)?;

		let Some(list) = guard.lists.get_mut(key) else {
			return Ok(None);
		};
		let Some(head) = list.pop_front() else {
			return Ok(None);
		};

		list.push_back(head.clone());

		Ok(Some(head))
	}

	fn replace_list_now(
		state: &StoreState,
		key: &str,
		values: Vec<String>,
		now: OffsetDateTime,
	) -> Result<(), StoreError> {
		let mut guard = state.lock();

		guard.sweep_expired(now);
		guard.ensure_not_value(key)?;

		if values.is_empty() {
			guard.lists.remove(key);
		} else {
			guard.lists.insert(key.to_owned(), values.into());
		}

		Ok(())
	}

	fn exists_now(state: &StoreState, key: &str, now: OffsetDateTime) -> bool {
		let mut guard = state.lock();

		guard.purge_expired(key, now);

		guard.values.contains_key(key) || guard.lists.contains_key(key)
	}

	fn set_expiring_now(
		state: &StoreState,
		key: &str,
		value: String,
		ttl: Duration,
		now: OffsetDateTime,
	) -> Result<(), StoreError> {
		if !ttl.is_positive() {
			return Err(StoreError::InvalidTtl);
		}

		let mut guard = state.lock();

		guard.sweep_expired(now);
		guard.ensure_not_list(key)?;
		guard.values.insert(key.to_owned(), (value, now + ttl));

		Ok(())
	}

	fn delete_now(state: &StoreState, key: &str, now: OffsetDateTime) -> bool {
		let mut guard = state.lock();

		guard.purge_expired(key, now);

		guard.values.remove(key).is_some() | guard.lists.remove(key).is_some()
	}
}
impl PoolStore for MemoryPoolStore {
	fn list_len<'a>(&'a self, key: &'a str) -> StoreFuture<'a, usize> {
		Box::pin(async move { Self::list_len_now(&self.0, key) })
	}

	fn rotate<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		Box::pin(async move { Self::rotate_now(&self.0, key) })
	}

	fn replace_list<'a>(&'a self, key: &'a str, values: Vec<String>) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			Self::replace_list_now(&self.0, key, values, OffsetDateTime::now_utc())
		})
	}

	fn list<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Vec<String>> {
		Box::pin(async move {
			let guard = self.0.lock();

			guard.ensure_not_value(key)?;

			Ok(guard.lists.get(key).map(|list| list.iter().cloned().collect()).unwrap_or_default())
		})
	}

	fn exists<'a>(&'a self, key: &'a str) -> StoreFuture<'a, bool> {
		Box::pin(async move { Ok(Self::exists_now(&self.0, key, OffsetDateTime::now_utc())) })
	}

	fn set_expiring<'a>(
		&'a self,
		key: &'a str,
		value: String,
		ttl: Duration,
	) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			Self::set_expiring_now(&self.0, key, value, ttl, OffsetDateTime::now_utc())
		})
	}

	fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, bool> {
		Box::pin(async move { Ok(Self::delete_now(&self.0, key, OffsetDateTime::now_utc())) })
	}
}
