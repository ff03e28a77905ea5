#![cfg(feature = "reqwest")]

// std
use std::{net::TcpListener, sync::Arc, time::Duration as StdDuration};
// crates.io
use betconstruct::{
	dispatch::{DispatcherBuilder, ForbiddenPolicy, ReqwestDispatcher},
	error::{Error, StatusError, TransportError},
	pool::LocalPool,
	profile::ApiProfile,
};
use http::Method;
use httpmock::prelude::*;
use serde_json::{Value, json};
use time::{Duration, OffsetDateTime};

fn pool(secrets: &[&str]) -> Arc<LocalPool> {
	Arc::new(LocalPool::new(secrets.iter().copied()).expect("Pool fixture should build."))
}

fn pooled(server: &MockServer, pool: Arc<LocalPool>) -> ReqwestDispatcher {
	DispatcherBuilder::new(ApiProfile::backoffice().with_base_url(server.base_url()))
		.pool(pool)
		.build()
		.expect("Pool-backed dispatcher should build.")
}

fn ok_envelope() -> Value {
	json!({ "Data": { "Objects": [] }, "HasError": false, "AlertMessage": null })
}

#[tokio::test]
async fn rejected_credential_cools_down_and_the_next_one_is_used() {
	let server = MockServer::start_async().await;
	let rejected = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/Financial/GetDocumentsWithPaging")
				.header("Authentication", "a");
			then.status(401);
		})
		.await;
	let accepted = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/Financial/GetDocumentsWithPaging")
				.header("Authentication", "b");
			then.status(200).json_body(ok_envelope());
		})
		.await;
	let pool = pool(&["a", "b"]);
	let dispatcher = pooled(&server, pool.clone());
	let err = dispatcher
		.execute::<Value>(Method::POST, "/Financial/GetDocumentsWithPaging", Some(b"{}".to_vec()))
		.await
		.expect_err("Credential `a` should be rejected.");

	assert!(err.is_unauthorized());
	assert!(pool.snapshot()[0].is_rate_limited());

	for _ in 0..2 {
		dispatcher
			.execute::<Value>(Method::POST, "/Financial/GetDocumentsWithPaging", None)
			.await
			.expect("Credential `b` should be accepted.");
	}

	rejected.assert_calls_async(1).await;
	accepted.assert_calls_async(2).await;
	assert_eq!(dispatcher.metrics().rate_limit_marks(), 1);
}

#[tokio::test]
async fn exhausted_pool_fails_fast_without_a_request() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.any_request();
			then.status(200).json_body(ok_envelope());
		})
		.await;
	let pool = pool(&["a", "b"]);
	let now = OffsetDateTime::now_utc();

	pool.mark_rate_limited_at("a", now);
	pool.mark_rate_limited_at("b", now);

	let dispatcher = pooled(&server, pool);
	let err = dispatcher
		.execute::<Value>(Method::POST, "/Financial/GetDocumentsWithPaging", None)
		.await
		.expect_err("An exhausted pool should fail.");

	assert!(matches!(err, Error::NoCredentialAvailable));
	assert_eq!(dispatcher.metrics().pool_exhaustions(), 1);

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn flagged_envelope_is_an_application_error_despite_200() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/Client/GetClientWithdrawalRequestsWithTotals");
			then.status(200).json_body(json!({
				"Data": null,
				"HasError": true,
				"AlertMessage": "Session expired"
			}));
		})
		.await;

	let dispatcher = pooled(&server, pool(&["a"]));
	let err = dispatcher
		.execute::<Value>(Method::POST, "/Client/GetClientWithdrawalRequestsWithTotals", None)
		.await
		.expect_err("Flagged envelope should fail.");

	assert!(matches!(err, Error::Application { ref message } if message == "Session expired"));
}

#[tokio::test]
async fn forbidden_marks_the_credential_unless_surfaced() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/Client/Get");
			then.status(403);
		})
		.await;

	let marking_pool = pool(&["a"]);
	let marking = pooled(&server, marking_pool.clone());
	let err = marking
		.execute::<Value>(Method::GET, "/Client/Get", None)
		.await
		.expect_err("403 should fail.");

	assert!(matches!(err, Error::Status(StatusError::Forbidden)));
	assert!(marking_pool.snapshot()[0].is_rate_limited());

	let surfacing_pool = pool(&["a"]);
	let profile = ApiProfile::backoffice().with_base_url(server.base_url());
	let surfacing = DispatcherBuilder::new(profile)
		.pool(surfacing_pool.clone())
		.forbidden_policy(ForbiddenPolicy::Surface)
		.build()
		.expect("Surfacing dispatcher should build.");
	let err = surfacing
		.execute::<Value>(Method::GET, "/Client/Get", None)
		.await
		.expect_err("403 should fail.");

	assert!(matches!(err, Error::Status(StatusError::Forbidden)));
	assert!(!surfacing_pool.snapshot()[0].is_rate_limited());
	assert_eq!(surfacing.metrics().rate_limit_marks(), 0);
}

#[tokio::test]
async fn too_many_requests_carries_retry_after() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/Client/Get");
			then.status(429).header("Retry-After", "120");
		})
		.await;

	let dispatcher = pooled(&server, pool(&["a"]));
	let err = dispatcher
		.execute::<Value>(Method::GET, "/Client/Get", None)
		.await
		.expect_err("429 should fail.");

	assert!(matches!(
		err,
		Error::Status(StatusError::TooManyRequests { retry_after: Some(delay) })
			if delay == Duration::seconds(120)
	));
}

#[tokio::test]
async fn pooled_rotation_follows_the_cooldown_scenario() {
	let server = MockServer::start_async().await;
	let mut mocks = Vec::new();

	for secret in ["A", "B", "C"] {
		let status = if secret == "A" { 401 } else { 200 };
		let mock = server
			.mock_async(|when, then| {
				when.method(GET).path("/Client/Get").header("Authentication", secret);
				then.status(status).json_body(ok_envelope());
			})
			.await;

		mocks.push(mock);
	}

	let pool = Arc::new(
		LocalPool::new(["A", "B", "C"])
			.expect("Pool fixture should build.")
			.with_cooldown(Duration::milliseconds(300)),
	);
	let dispatcher = pooled(&server, pool.clone());
	let mut results = Vec::new();

	for _ in 0..4 {
		results.push(dispatcher.execute::<Value>(Method::GET, "/Client/Get", None).await.is_ok());
	}

	assert_eq!(results, [false, true, true, true]);

	mocks[0].assert_calls_async(1).await;
	mocks[1].assert_calls_async(2).await;
	mocks[2].assert_calls_async(1).await;

	tokio::time::sleep(StdDuration::from_millis(400)).await;

	let cycle = (0..3)
		.filter_map(|_| pool.acquire_at(OffsetDateTime::now_utc()))
		.map(|credential| credential.secret().expose().to_owned())
		.collect::<Vec<_>>();

	assert!(cycle.contains(&"A".to_owned()));
}

#[tokio::test]
async fn refused_connections_map_to_transport_errors() {
	let port = {
		let listener = TcpListener::bind("127.0.0.1:0").expect("Ephemeral port should bind.");

		listener.local_addr().expect("Listener should have an address.").port()
	};
	let profile = ApiProfile::backoffice().with_base_url(format!("http://127.0.0.1:{port}"));
	let dispatcher = DispatcherBuilder::new(profile)
		.static_token("t")
		.build()
		.expect("Static dispatcher should build.");
	let err = dispatcher
		.execute::<Value>(Method::GET, "/Client/Get", None)
		.await
		.expect_err("Nothing listens on the released port.");

	assert!(matches!(err, Error::Transport(TransportError::Network { .. })));
	assert_eq!(err.status(), None);
}
