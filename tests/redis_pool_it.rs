#![cfg(feature = "redis")]

// std
use std::env;
// crates.io
use betconstruct::{
	pool::{CredentialPool, DistributedPool},
	store::{PoolStore, RedisPoolStore},
};
use time::Duration;

async fn store() -> RedisPoolStore {
	let url = env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/".into());

	RedisPoolStore::connect(&url).await.expect("Redis should answer PING.")
}

async fn next(pool: &DistributedPool<RedisPoolStore>) -> String {
	pool.acquire()
		.await
		.expect("Redis should not fail.")
		.expect("Pool should yield a credential.")
		.secret()
		.expose()
		.to_owned()
}

#[tokio::test]
#[ignore = "needs a Redis server at REDIS_URL"]
async fn two_processes_share_rotation_and_markers() {
	let key = format!("betconstruct_it_{}", std::process::id());
	let first: DistributedPool<RedisPoolStore> =
		DistributedPool::new(store().await, key.as_str()).with_cooldown(Duration::seconds(5));
	let second: DistributedPool<RedisPoolStore> =
		DistributedPool::new(store().await, key.as_str()).with_cooldown(Duration::seconds(5));

	first.seed(["a", "b", "c"]).await.expect("Seeding should succeed.");

	assert_eq!(next(&first).await, "a");
	assert_eq!(next(&second).await, "b");

	second.mark_rate_limited("c").await.expect("Marking should succeed.");

	assert_eq!(next(&first).await, "a");
	assert_eq!(next(&second).await, "b");

	let raw = store().await;

	assert!(raw.exists(&first.marker_key("c")).await.expect("Redis should not fail."));

	first.clear_rate_limit("c").await.expect("Clearing should succeed.");
	first.seed(Vec::<String>::new()).await.expect("Clearing the list should succeed.");

	assert_eq!(raw.list_len(&key).await, Ok(0));
}
