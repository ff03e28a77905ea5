//! Accounts client: unauthenticated raw calls.
//!
//! The accounts API answers without the JSON envelope, so both helpers return the body bytes of a
//! 2xx response and leave decoding to the caller.

// crates.io
use http::Method;
// self
use crate::{
	_prelude::*,
	dispatch::Dispatcher,
	transport::{ApiHttpClient, TransportErrorMapper},
};
#[cfg(feature = "reqwest")]
use crate::{
	dispatch::DispatcherBuilder,
	error::ConfigError,
	profile::ApiProfile,
	transport::{ReqwestHttpClient, ReqwestTransportErrorMapper},
};

#[cfg(feature = "reqwest")]
/// Accounts client on the crate's default reqwest transport stack.
pub type ReqwestAccountsClient = AccountsClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Client for the accounts API.
pub struct AccountsClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	dispatcher: Dispatcher<C, M>,
}
impl<C, M> AccountsClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Wraps an already configured dispatcher.
	pub fn new(dispatcher: Dispatcher<C, M>) -> Self {
		Self { dispatcher }
	}

	/// Underlying dispatcher.
	pub fn dispatcher(&self) -> &Dispatcher<C, M> {
		&self.dispatcher
	}

	/// GETs `path` and returns the response body.
	pub async fn get(&self, path: &str) -> Result<Vec<u8>> {
		self.dispatcher.execute_raw(Method::GET, path, None).await
	}

	/// POSTs `body` to `path` and returns the response body.
	pub async fn post(&self, path: &str, body: impl Into<Vec<u8>>) -> Result<Vec<u8>> {
		self.dispatcher.execute_raw(Method::POST, path, Some(body.into())).await
	}
}
#[cfg(feature = "reqwest")]
impl AccountsClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Connects to the default accounts host without a credential.
	pub fn connect() -> Result<Self, ConfigError> {
		Self::with_profile(ApiProfile::accounts())
	}

	/// Connects to `profile` without a credential.
	pub fn with_profile(profile: ApiProfile) -> Result<Self, ConfigError> {
		Ok(Self { dispatcher: DispatcherBuilder::new(profile).build()? })
	}
}
impl<C, M> Debug for AccountsClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccountsClient").field("dispatcher", &self.dispatcher).finish()
	}
}
