//! Fixtures shared by the integration tests.

#![allow(dead_code)]

// std
use std::{
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration as StdDuration,
};
// crates.io
use betconstruct::{
	auth::CredentialSecret,
	dispatch::Dispatcher,
	error::StatusError,
	login::{LoginFuture, SessionLogin},
	profile::AUTH_HEADER,
	transport::{ApiHttpClient, HttpFuture, HttpRequest, HttpResponse, NetworkErrorMapper},
};
use http::StatusCode;
use parking_lot::Mutex;
use serde_json::{Value, json};

/// Dispatcher running on [`ScriptedTransport`].
pub type ScriptedDispatcher = Dispatcher<ScriptedTransport, NetworkErrorMapper>;

type Responder = Box<dyn Fn(Option<&str>) -> (u16, Value) + Send + Sync>;

/// Successful envelope carrying `data`.
pub fn envelope(data: Value) -> Value {
	json!({ "Data": data, "HasError": false, "AlertMessage": null })
}

/// Error raised by [`ScriptedTransport`] when a script asks for a dropped connection.
#[derive(Debug)]
pub struct ScriptedFailure;
impl Display for ScriptedFailure {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("scripted connection failure")
	}
}
impl StdError for ScriptedFailure {}

/// In-process transport answering from a closure over the `Authentication` header.
pub struct ScriptedTransport {
	responder: Responder,
	delay: StdDuration,
	seen: Mutex<Vec<Option<String>>>,
}
impl ScriptedTransport {
	pub fn new(responder: impl 'static + Fn(Option<&str>) -> (u16, Value) + Send + Sync) -> Self {
		Self {
			responder: Box::new(responder),
			delay: StdDuration::ZERO,
			seen: Mutex::new(Vec::new()),
		}
	}

	/// Holds every response for `delay` so concurrent callers overlap.
	pub fn with_delay(mut self, delay: StdDuration) -> Self {
		self.delay = delay;

		self
	}

	/// Authorization header of every request, in arrival order.
	pub fn seen(&self) -> Vec<Option<String>> {
		self.seen.lock().clone()
	}

	pub fn calls(&self) -> usize {
		self.seen.lock().len()
	}
}
impl ApiHttpClient for ScriptedTransport {
	type TransportError = ScriptedFailure;

	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError> {
		let auth = request
			.headers()
			.get(AUTH_HEADER)
			.and_then(|value| value.to_str().ok())
			.map(str::to_owned);

		self.seen.lock().push(auth.clone());

		let (status, body) = (self.responder)(auth.as_deref());
		let delay = self.delay;

		Box::pin(async move {
			if !delay.is_zero() {
				tokio::time::sleep(delay).await;
			}
			if status == 0 {
				return Err(ScriptedFailure);
			}

			let body = serde_json::to_vec(&body).expect("Scripted body should serialize.");
			let mut response = HttpResponse::new(body);

			*response.status_mut() =
				StatusCode::from_u16(status).expect("Scripted status should be valid.");

			Ok(response)
		})
	}
}

/// Login handing out `fresh-1`, `fresh-2`, ... and counting invocations.
pub struct CountingLogin {
	calls: AtomicUsize,
	fail: bool,
	delay: StdDuration,
}
impl CountingLogin {
	pub fn succeeding() -> Arc<Self> {
		Arc::new(Self { calls: AtomicUsize::new(0), fail: false, delay: StdDuration::ZERO })
	}

	pub fn failing() -> Arc<Self> {
		Arc::new(Self { calls: AtomicUsize::new(0), fail: true, delay: StdDuration::ZERO })
	}

	pub fn slow(delay: StdDuration) -> Arc<Self> {
		Arc::new(Self { calls: AtomicUsize::new(0), fail: false, delay })
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl SessionLogin for CountingLogin {
	fn login(&self) -> LoginFuture<'_> {
		Box::pin(async move {
			let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

			if !self.delay.is_zero() {
				tokio::time::sleep(self.delay).await;
			}
			if self.fail {
				return Err(StatusError::BadRequest.into());
			}

			Ok(CredentialSecret::new(format!("fresh-{n}")))
		})
	}
}
