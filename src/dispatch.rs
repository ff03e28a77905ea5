//! Request dispatcher with credential resolution, status mapping, and session refresh.
//!
//! A [`Dispatcher`] executes one platform call end to end:
//!
//! 1. resolve the credential (none, the shared static session token, or the next pooled one),
//! 2. send the request through an [`ApiHttpClient`],
//! 3. mark pooled credentials rate-limited on 401 (and 403 under [`ForbiddenPolicy::RateLimit`]),
//! 4. on a 401 with a refreshable session, coordinate one login and replay the request once,
//! 5. map non-2xx statuses to [`StatusError`](crate::error::StatusError) and decode the envelope.

pub mod builder;
pub mod envelope;

mod metrics;
mod refresh;
mod status;

pub use builder::DispatcherBuilder;
pub use envelope::Envelope;
pub use metrics::DispatchMetrics;

// crates.io
use http::{Method, StatusCode, header::CONTENT_TYPE};
// self
use crate::{
	_prelude::*,
	auth::CredentialSecret,
	dispatch::refresh::Session,
	error::ConfigError,
	obs::{self, DispatchOutcome, DispatchSpan},
	pool::CredentialPool,
	profile::ApiProfile,
	transport::{ApiHttpClient, HttpResponse, TransportErrorMapper},
};
#[cfg(feature = "reqwest")]
use crate::transport::{ReqwestHttpClient, ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Dispatcher specialized for the crate's default reqwest transport stack.
pub type ReqwestDispatcher = Dispatcher<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// How a pool-backed dispatcher treats HTTP 403.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForbiddenPolicy {
	/// Treat 403 like 401: start the credential's cooldown, then surface `Forbidden`.
	#[default]
	RateLimit,
	/// Surface `Forbidden` without touching the pool.
	Surface,
}

#[derive(Clone)]
enum AuthSource {
	None,
	Session(Arc<Session>),
	Pool(Arc<dyn CredentialPool>),
}

/// Executes platform calls for one [`ApiProfile`].
///
/// Clones share the transport, the static session (including its refresh guard), the pool, and
/// the [`DispatchMetrics`] counters.
pub struct Dispatcher<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	http_client: Arc<C>,
	transport_mapper: Arc<M>,
	profile: Arc<ApiProfile>,
	auth: AuthSource,
	forbidden_policy: ForbiddenPolicy,
	metrics: Arc<DispatchMetrics>,
}
impl<C, M> Dispatcher<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Profile this dispatcher sends requests with.
	pub fn profile(&self) -> &ApiProfile {
		&self.profile
	}

	/// Counters shared by this dispatcher and its clones.
	pub fn metrics(&self) -> &DispatchMetrics {
		&self.metrics
	}

	/// Policy applied to pool-backed 403 responses.
	pub fn forbidden_policy(&self) -> ForbiddenPolicy {
		self.forbidden_policy
	}

	/// Current static session token, if this dispatcher uses one.
	pub fn session_token(&self) -> Option<CredentialSecret> {
		match &self.auth {
			AuthSource::Session(session) => session.snapshot().secret,
			_ => None,
		}
	}

	/// Logs in through the attached [`SessionLogin`](crate::login::SessionLogin) and installs the
	/// resulting session token.
	pub async fn refresh_now(&self) -> Result<()> {
		match &self.auth {
			AuthSource::Session(session) => session.refresh_now(&self.metrics).await,
			_ => Err(ConfigError::RefreshRequiresStaticCredential.into()),
		}
	}

	/// Sends a request and decodes the envelope's `Data` into `T`.
	pub async fn execute<T>(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.observe("execute", self.dispatch_decoded(method, path, body)).await
	}

	/// Sends a request and returns the raw body of a 2xx response.
	pub async fn execute_raw(
		&self,
		method: Method,
		path: &str,
		body: Option<Vec<u8>>,
	) -> Result<Vec<u8>> {
		let raw = async move {
			self.dispatch(method, path, body).await.map(HttpResponse::into_body)
		};

		self.observe("execute_raw", raw).await
	}

	/// Serializes `body` as JSON, POSTs it, and decodes the envelope's `Data` into `T`.
	pub async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T>
	where
		T: DeserializeOwned,
		B: ?Sized + Serialize,
	{
		let body = serde_json::to_vec(body).map_err(ConfigError::from)?;

		self.execute(Method::POST, path, Some(body)).await
	}

	async fn observe<T, F>(&self, stage: &'static str, fut: F) -> Result<T>
	where
		F: Future<Output = Result<T>>,
	{
		let api = self.profile.name.as_str();
		let result = DispatchSpan::dispatch(api, stage).instrument(fut).await;

		obs::dispatch_finished(api, stage, DispatchOutcome::of(&result));

		result
	}

	async fn dispatch_decoded<T>(
		&self,
		method: Method,
		path: &str,
		body: Option<Vec<u8>>,
	) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let response = self.dispatch(method, path, body).await?;

		envelope::decode(response.status().as_u16(), response.body())
	}

	async fn dispatch(
		&self,
		method: Method,
		path: &str,
		body: Option<Vec<u8>>,
	) -> Result<HttpResponse> {
		let url = self.profile.endpoint(path)?;
		let body = body.unwrap_or_default();

		self.metrics.record_call();

		match &self.auth {
			AuthSource::None =>
				status::ensure_success(self.send(&method, &url, &body, None).await?),
			AuthSource::Pool(pool) =>
				self.dispatch_pooled(pool.as_ref(), &method, &url, &body).await,
			AuthSource::Session(session) =>
				self.dispatch_with_session(session, &method, &url, &body).await,
		}
	}

	async fn dispatch_pooled(
		&self,
		pool: &dyn CredentialPool,
		method: &Method,
		url: &Url,
		body: &[u8],
	) -> Result<HttpResponse> {
		let Some(credential) = pool.acquire().await? else {
			self.metrics.record_pool_exhaustion();

			return Err(Error::NoCredentialAvailable);
		};
		let secret = credential.secret().expose();
		let response = self.send(method, url, body, Some(secret)).await?;
		let rejected = match response.status() {
			StatusCode::UNAUTHORIZED => true,
			StatusCode::FORBIDDEN => self.forbidden_policy == ForbiddenPolicy::RateLimit,
			_ => false,
		};

		if rejected {
			pool.mark_rate_limited(secret).await?;
			self.metrics.record_rate_limit_mark();
		}

		status::ensure_success(response)
	}

	async fn dispatch_with_session(
		&self,
		session: &Session,
		method: &Method,
		url: &Url,
		body: &[u8],
	) -> Result<HttpResponse> {
		let ticket = session.ticket();
		let (secret, generation) = session.current(&self.metrics).await?;
		let response = self.send(method, url, body, Some(secret.expose())).await?;

		if response.status() != StatusCode::UNAUTHORIZED || !session.can_refresh() {
			return status::ensure_success(response);
		}

		let (secret, _) = session.refresh_after_rejection(generation, ticket, &self.metrics).await?;

		self.metrics.record_retry();

		status::ensure_success(self.send(method, url, body, Some(secret.expose())).await?)
	}

	async fn send(
		&self,
		method: &Method,
		url: &Url,
		body: &[u8],
		secret: Option<&str>,
	) -> Result<HttpResponse> {
		let mut builder = http::Request::builder()
			.method(method.clone())
			.uri(url.as_str())
			.header(CONTENT_TYPE, self.profile.content_type.as_str());

		if let Some(secret) = secret {
			builder =
				builder.header(self.profile.header_name()?, self.profile.header_value(secret)?);
		}

		let request = builder.body(body.to_vec()).map_err(ConfigError::from)?;

		self.http_client
			.execute(request)
			.await
			.map_err(|e| self.transport_mapper.map_transport_error(e))
	}
}
#[cfg(feature = "reqwest")]
impl Dispatcher<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Starts a builder for `profile`; finish it with [`DispatcherBuilder::build`].
	pub fn builder(profile: ApiProfile) -> DispatcherBuilder {
		DispatcherBuilder::new(profile)
	}
}
impl<C, M> Clone for Dispatcher<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			profile: self.profile.clone(),
			auth: self.auth.clone(),
			forbidden_policy: self.forbidden_policy,
			metrics: self.metrics.clone(),
		}
	}
}
impl<C, M> Debug for Dispatcher<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let auth = match &self.auth {
			AuthSource::None => "none",
			AuthSource::Session(_) => "session",
			AuthSource::Pool(_) => "pool",
		};

		f.debug_struct("Dispatcher")
			.field("profile", &self.profile.name)
			.field("auth", &auth)
			.field("forbidden_policy", &self.forbidden_policy)
			.finish()
	}
}
