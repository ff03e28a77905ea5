//! Builder validating credential-source combinations for [`Dispatcher`].

// self
use crate::{
	_prelude::*,
	auth::CredentialSecret,
	dispatch::{AuthSource, DispatchMetrics, Dispatcher, ForbiddenPolicy, refresh::Session},
	error::ConfigError,
	login::SessionLogin,
	pool::CredentialPool,
	profile::ApiProfile,
	transport::{ApiHttpClient, TransportErrorMapper},
};
#[cfg(feature = "reqwest")]
use crate::{
	dispatch::ReqwestDispatcher,
	transport::{ReqwestHttpClient, ReqwestTransportErrorMapper},
};

/// Builder for [`Dispatcher`] values.
///
/// At most one credential source may be configured. Attaching a [`SessionLogin`] turns on refresh
/// on expiry and is only valid for static-session dispatchers, which may start without a token.
pub struct DispatcherBuilder {
	/// Profile the dispatcher sends requests with.
	pub profile: ApiProfile,
	/// Optional initial static session token.
	pub static_token: Option<CredentialSecret>,
	/// Optional shared credential pool.
	pub pool: Option<Arc<dyn CredentialPool>>,
	/// Optional login used to refresh the static session.
	pub login: Option<Arc<dyn SessionLogin>>,
	/// Treatment of pool-backed 403 responses.
	pub forbidden_policy: ForbiddenPolicy,
}
impl DispatcherBuilder {
	/// Creates a builder without any credential source.
	pub fn new(profile: ApiProfile) -> Self {
		Self {
			profile,
			static_token: None,
			pool: None,
			login: None,
			forbidden_policy: ForbiddenPolicy::default(),
		}
	}

	/// Uses a single static session token.
	pub fn static_token(mut self, token: impl Into<CredentialSecret>) -> Self {
		self.static_token = Some(token.into());

		self
	}

	/// Draws a credential from `pool` for every call.
	pub fn pool(mut self, pool: Arc<dyn CredentialPool>) -> Self {
		self.pool = Some(pool);

		self
	}

	/// Enables refresh on expiry through `login`.
	pub fn refresh_with(mut self, login: Arc<dyn SessionLogin>) -> Self {
		self.login = Some(login);

		self
	}

	/// Overrides the 403 policy (defaults to [`ForbiddenPolicy::RateLimit`]).
	pub fn forbidden_policy(mut self, policy: ForbiddenPolicy) -> Self {
		self.forbidden_policy = policy;

		self
	}

	/// Builds a dispatcher on the default reqwest transport.
	#[cfg(feature = "reqwest")]
	pub fn build(self) -> Result<ReqwestDispatcher, ConfigError> {
		self.build_with(ReqwestHttpClient::default(), ReqwestTransportErrorMapper)
	}

	/// Builds a dispatcher on a caller-provided transport + mapper pair.
	pub fn build_with<C, M>(
		self,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Dispatcher<C, M>, ConfigError>
	where
		C: ?Sized + ApiHttpClient,
		M: ?Sized + TransportErrorMapper<C::TransportError>,
	{
		self.profile.validate()?;

		let auth = match (self.static_token, self.pool, self.login) {
			(Some(_), Some(_), _) => return Err(ConfigError::ConflictingAuth),
			(None, Some(_), Some(_)) => return Err(ConfigError::RefreshRequiresStaticCredential),
			(None, Some(pool), None) => AuthSource::Pool(pool),
			(None, None, None) => AuthSource::None,
			(token, None, login) => AuthSource::Session(Arc::new(Session::new(token, login))),
		};

		Ok(Dispatcher {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			profile: Arc::new(self.profile),
			auth,
			forbidden_policy: self.forbidden_policy,
			metrics: Arc::new(DispatchMetrics::default()),
		})
	}
}
impl Debug for DispatcherBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DispatcherBuilder")
			.field("profile", &self.profile)
			.field("static_token_set", &self.static_token.is_some())
			.field("pool_set", &self.pool.is_some())
			.field("refresh_enabled", &self.login.is_some())
			.field("forbidden_policy", &self.forbidden_policy)
			.finish()
	}
}
