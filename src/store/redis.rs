//! [`PoolStore`] backed by a Redis server, shared by every process that points at it.

// crates.io
use redis::{Client, Cmd, FromRedisValue, Pipeline, RedisError, aio::ConnectionManager};
// self
use crate::{
	_prelude::*,
	store::{PoolStore, StoreError, StoreFuture},
};

/// Store issuing one Redis round-trip per [`PoolStore`] call.
///
/// Rotation is a single `LMOVE key key LEFT RIGHT`, which Redis applies atomically, so processes
/// sharing a pool never take the same rotation step. Cooldown markers are `SET .. PX` keys that
/// Redis expires on its own.
#[derive(Clone)]
pub struct RedisPoolStore {
	connection: ConnectionManager,
}
impl RedisPoolStore {
	/// Opens a managed connection to `url` (`redis://host:port/db`) and checks it with `PING`.
	pub async fn connect(url: &str) -> Result<Self, StoreError> {
		let client = Client::open(url).map_err(|e| store_error(e, url))?;
		let connection = ConnectionManager::new(client).await.map_err(|e| store_error(e, url))?;

		Self::with_connection(connection).await
	}

	/// Wraps an existing managed connection once it answers `PING`.
	pub async fn with_connection(connection: ConnectionManager) -> Result<Self, StoreError> {
		let store = Self { connection };

		store.query::<String>(command("PING", &[]), "").await?;

		Ok(store)
	}

	async fn query<T>(&self, cmd: Cmd, key: &str) -> Result<T, StoreError>
	where
		T: FromRedisValue,
	{
		let mut connection = self.connection.clone();

		cmd.query_async(&mut connection).await.map_err(|e| store_error(e, key))
	}
}
impl PoolStore for RedisPoolStore {
	fn list_len<'a>(&'a self, key: &'a str) -> StoreFuture<'a, usize> {
		Box::pin(self.query(command("LLEN", &[key]), key))
	}

	fn rotate<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		Box::pin(self.query(rotate_command(key), key))
	}

	fn replace_list<'a>(&'a self, key: &'a str, values: Vec<String>) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut connection = self.connection.clone();

			replace_list_pipeline(key, &values)
				.query_async::<()>(&mut connection)
				.await
				.map_err(|e| store_error(e, key))
		})
	}

	fn list<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Vec<String>> {
		Box::pin(self.query(command("LRANGE", &[key, "0", "-1"]), key))
	}

	fn exists<'a>(&'a self, key: &'a str) -> StoreFuture<'a, bool> {
		Box::pin(async move { Ok(self.query::<i64>(command("EXISTS", &[key]), key).await? > 0) })
	}

	fn set_expiring<'a>(
		&'a self,
		key: &'a str,
		value: String,
		ttl: Duration,
	) -> StoreFuture<'a, ()> {
		Box::pin(async move { self.query(set_expiring_command(key, &value, ttl)?, key).await })
	}

	fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, bool> {
		Box::pin(async move { Ok(self.query::<i64>(command("DEL", &[key]), key).await? > 0) })
	}
}
impl Debug for RedisPoolStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RedisPoolStore").finish_non_exhaustive()
	}
}

fn command(name: &str, args: &[&str]) -> Cmd {
	let mut cmd = redis::cmd(name);

	for arg in args {
		cmd.arg(*arg);
	}

	cmd
}

fn rotate_command(key: &str) -> Cmd {
	command("LMOVE", &[key, key, "LEFT", "RIGHT"])
}

fn set_expiring_command(key: &str, value: &str, ttl: Duration) -> Result<Cmd, StoreError> {
	if !ttl.is_positive() {
		return Err(StoreError::InvalidTtl);
	}

	let millis = ttl.whole_milliseconds().max(1).to_string();

	Ok(command("SET", &[key, value, "PX", &millis]))
}

fn replace_list_pipeline(key: &str, values: &[String]) -> Pipeline {
	let mut pipe = redis::pipe();

	pipe.atomic().add_command(command("DEL", &[key])).ignore();

	if !values.is_empty() {
		let mut push = command("RPUSH", &[key]);

		for value in values {
			push.arg(value.as_str());
		}

		pipe.add_command(push).ignore();
	}

	pipe
}

fn store_error(e: RedisError, key: &str) -> StoreError {
	if e.code() == Some("WRONGTYPE") {
		StoreError::WrongType { key: key.to_owned() }
	} else {
		StoreError::Backend { message: e.to_string() }
	}
}
