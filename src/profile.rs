//! Per-API request profiles.
//!
//! An [`ApiProfile`] captures what differs between the platform's three HTTP surfaces: the base
//! URL, the fixed content type, and how the credential is written into the authorization header.

// crates.io
use http::{HeaderName, HeaderValue};
// self
use crate::{_prelude::*, error::ConfigError};

/// Header carrying the credential on every authenticated platform API.
pub const AUTH_HEADER: &str = "Authentication";
/// Default back-office base URL.
pub const BACKOFFICE_BASE_URL: &str = "https://backofficewebadmin.betconstruct.com/api/en";
/// Default CRM base URL.
pub const CRM_BASE_URL: &str = "https://crm-t.betconstruct.com/api/en";
/// Default accounts base URL.
pub const ACCOUNTS_BASE_URL: &str = "https://api.accounts-bc.com/";

/// How the secret is rendered into the authorization header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
	/// The secret is sent as-is.
	#[default]
	Raw,
	/// The secret is prefixed with `Bearer `.
	Bearer,
}
impl AuthScheme {
	/// Renders the header value for `secret`.
	pub fn header_value(self, secret: &str) -> String {
		match self {
			AuthScheme::Raw => secret.to_owned(),
			AuthScheme::Bearer => format!("Bearer {secret}"),
		}
	}
}

/// Static request settings for one platform API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiProfile {
	/// Short label used in logs.
	pub name: String,
	/// Base URL every request path is appended to.
	pub base_url: String,
	/// `Content-Type` sent with every request.
	pub content_type: String,
	/// Header carrying the credential.
	pub auth_header: String,
	/// Rendering of the credential inside [`ApiProfile::auth_header`].
	pub auth_scheme: AuthScheme,
}
impl ApiProfile {
	/// Back-office admin API: JSON bodies, raw token in `Authentication`.
	pub fn backoffice() -> Self {
		Self::json("backoffice", BACKOFFICE_BASE_URL, AuthScheme::Raw)
	}

	/// CRM API: JSON bodies, `Bearer` session token in `Authentication`.
	pub fn crm() -> Self {
		Self::json("crm", CRM_BASE_URL, AuthScheme::Bearer)
	}

	/// Accounts API: `text/html` bodies and no envelope; usually called without a credential.
	pub fn accounts() -> Self {
		Self {
			name: "accounts".into(),
			base_url: ACCOUNTS_BASE_URL.into(),
			content_type: "text/html".into(),
			auth_header: AUTH_HEADER.into(),
			auth_scheme: AuthScheme::Raw,
		}
	}

	fn json(name: &str, base_url: &str, auth_scheme: AuthScheme) -> Self {
		Self {
			name: name.into(),
			base_url: base_url.into(),
			content_type: "application/json".into(),
			auth_header: AUTH_HEADER.into(),
			auth_scheme,
		}
	}

	/// Overrides the base URL (staging hosts, mock servers).
	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into();

		self
	}

	/// Overrides the content type.
	pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
		self.content_type = content_type.into();

		self
	}

	/// Checks that the base URL and header settings are usable.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let url = Url::parse(&self.base_url)
			.map_err(|source| ConfigError::InvalidUrl { url: self.base_url.clone(), source })?;

		if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
			return Err(ConfigError::InvalidBaseUrl { url: self.base_url.clone() });
		}

		self.header_name()?;
		HeaderValue::from_str(&self.content_type)
			.map_err(|_| ConfigError::InvalidHeader { header: "Content-Type".into() })?;

		Ok(())
	}

	/// Joins `path` onto the base URL, tolerating missing or doubled slashes.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		let raw = format!(
			"{}/{}",
			self.base_url.trim_end_matches('/'),
			path.trim_start_matches('/')
		);

		Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { url: raw, source })
	}

	pub(crate) fn header_name(&self) -> Result<HeaderName, ConfigError> {
		HeaderName::from_bytes(self.auth_header.as_bytes())
			.map_err(|_| ConfigError::InvalidHeader { header: self.auth_header.clone() })
	}

	pub(crate) fn header_value(&self, secret: &str) -> Result<HeaderValue, ConfigError> {
		let mut value = HeaderValue::from_str(&self.auth_scheme.header_value(secret))
			.map_err(|_| ConfigError::InvalidHeader { header: self.auth_header.clone() })?;

		value.set_sensitive(true);

		Ok(value)
	}
}
