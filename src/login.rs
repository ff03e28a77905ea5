//! Session login flows that exchange a platform token for a session token.

// self
use crate::{
	_prelude::*,
	auth::CredentialSecret,
	dispatch::{Dispatcher, DispatcherBuilder},
	error::ConfigError,
	obs::DispatchSpan,
	profile::ApiProfile,
	transport::{ApiHttpClient, TransportErrorMapper},
};
#[cfg(feature = "reqwest")]
use crate::transport::{ReqwestHttpClient, ReqwestTransportErrorMapper};

/// CRM endpoint exchanging a platform token for a session token.
pub const LOGIN_PATH: &str = "/User/LoginWithPlatform";

/// Boxed future returned by [`SessionLogin::login`].
pub type LoginFuture<'a> = Pin<Box<dyn Future<Output = Result<CredentialSecret>> + 'a + Send>>;

/// Produces a fresh session token for a static-session dispatcher.
pub trait SessionLogin
where
	Self: Send + Sync,
{
	/// Performs the login exchange.
	fn login(&self) -> LoginFuture<'_>;
}

/// Login against `/User/LoginWithPlatform` using a long-lived platform token.
///
/// The platform token is posted as a JSON string; the session token comes back in the envelope's
/// `Data`, sometimes with a `Bearer ` prefix that is stripped before use.
pub struct PlatformLogin<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	dispatcher: Dispatcher<C, M>,
	platform_token: CredentialSecret,
}
impl<C, M> PlatformLogin<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a login that posts to `profile` through the provided transport + mapper pair.
	pub fn with_http_client(
		profile: ApiProfile,
		platform_token: impl Into<CredentialSecret>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self, ConfigError> {
		let dispatcher = DispatcherBuilder::new(profile).build_with(http_client, mapper)?;

		Ok(Self { dispatcher, platform_token: platform_token.into() })
	}

	/// Exchanges the platform token for a session token.
	pub async fn exchange(&self) -> Result<CredentialSecret> {
		let span = DispatchSpan::login(&self.dispatcher.profile().name);
		let token = span
			.instrument(
				self.dispatcher.post_json::<String, _>(LOGIN_PATH, self.platform_token.expose()),
			)
			.await?;

		Ok(CredentialSecret::new(strip_bearer(&token)))
	}
}
#[cfg(feature = "reqwest")]
impl PlatformLogin<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a login against `profile` on the default reqwest transport.
	pub fn new(
		profile: ApiProfile,
		platform_token: impl Into<CredentialSecret>,
	) -> Result<Self, ConfigError> {
		Self::with_http_client(
			profile,
			platform_token,
			ReqwestHttpClient::default(),
			ReqwestTransportErrorMapper,
		)
	}
}
impl<C, M> SessionLogin for PlatformLogin<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn login(&self) -> LoginFuture<'_> {
		Box::pin(self.exchange())
	}
}
impl<C, M> Debug for PlatformLogin<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PlatformLogin")
			.field("dispatcher", &self.dispatcher)
			.field("platform_token", &self.platform_token)
			.finish()
	}
}

fn strip_bearer(token: &str) -> &str {
	token.strip_prefix("Bearer ").unwrap_or(token)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn bearer_prefix_is_stripped_once() {
		assert_eq!(strip_bearer("Bearer abc"), "abc");
		assert_eq!(strip_bearer("abc"), "abc");
		assert_eq!(strip_bearer("Bearer Bearer abc"), "Bearer abc");
	}
}
