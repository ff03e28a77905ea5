//! Dispatcher-level error types shared across pools, transports, and API clients.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The call never reached the server or never returned from it.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The server answered with a non-success status code.
	#[error(transparent)]
	Status(#[from] StatusError),
	/// Credential pool failure (including its backing store).
	#[error(transparent)]
	Pool(#[from] crate::pool::PoolError),

	/// A 2xx envelope carried a business-level failure.
	#[error("Platform reported an error: {message}.")]
	Application {
		/// `AlertMessage` value copied from the envelope.
		message: String,
	},
	/// Every credential in the pool is cooling down; no request was sent.
	#[error("No credential in the pool is currently usable.")]
	NoCredentialAvailable,
	/// Response body did not match the expected envelope or payload shape.
	#[error("Response body could not be decoded (HTTP {status}).")]
	Decode {
		/// Structured parsing failure including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// A report download returned a JSON envelope instead of the spreadsheet.
	#[error("Report result is not ready for download yet.")]
	ReportNotReady,
}
impl Error {
	/// Returns `true` when the error is an HTTP 401.
	pub fn is_unauthorized(&self) -> bool {
		matches!(self, Self::Status(StatusError::Unauthorized))
	}

	/// Returns the HTTP status that produced this error, when one exists.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status(status) => Some(status.code()),
			Self::Decode { status, .. } => Some(*status),
			_ => None,
		}
	}
}

/// Configuration and validation failures raised before any request is sent.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] http::Error),
	/// Request body could not be serialized to JSON.
	#[error("Request body could not be serialized.")]
	RequestBody(#[from] serde_json::Error),
	/// Base URL joined with the request path is not a valid URL.
	#[error("Request URL `{url}` is invalid.")]
	InvalidUrl {
		/// Offending URL string.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Profile base URL cannot carry a path.
	#[error("Base URL `{url}` cannot be used as a base.")]
	InvalidBaseUrl {
		/// Offending URL string.
		url: String,
	},
	/// Authorization header name or value is not valid header text.
	#[error("Authorization header `{header}` is invalid.")]
	InvalidHeader {
		/// Header name being written.
		header: String,
	},

	/// Both a static credential and a pool were configured.
	#[error("A dispatcher accepts either a static credential or a pool, not both.")]
	ConflictingAuth,
	/// Refresh-on-expiry was enabled without a static credential source.
	#[error("Refresh on expiry requires a static, refreshable credential.")]
	RefreshRequiresStaticCredential,
	/// Refresh on expiry was requested without a platform token to log in with.
	#[error("Refresh on expiry requires a platform token.")]
	MissingPlatformToken,
	/// A static-credential dispatcher has no token yet.
	#[error("No session token is available; log in first.")]
	MissingSessionToken,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// HTTP status classes observed from the platform.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StatusError {
	/// HTTP 400.
	#[error("Bad request.")]
	BadRequest,
	/// HTTP 401.
	#[error("Unauthorized.")]
	Unauthorized,
	/// HTTP 403.
	#[error("Forbidden.")]
	Forbidden,
	/// HTTP 404.
	#[error("Not found.")]
	NotFound,
	/// HTTP 405.
	#[error("Method not allowed.")]
	MethodNotAllowed,
	/// HTTP 429.
	#[error("Too many requests.")]
	TooManyRequests {
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// HTTP 500.
	#[error("Internal server error.")]
	InternalServerError,
	/// HTTP 502.
	#[error("Bad gateway.")]
	BadGateway,
	/// HTTP 503.
	#[error("Service unavailable.")]
	ServiceUnavailable,
	/// Any other non-2xx status.
	#[error("Unexpected status {status}.")]
	UnexpectedStatus {
		/// Raw HTTP status code.
		status: u16,
	},
}
impl StatusError {
	/// Returns the canonical status code for the variant.
	pub fn code(&self) -> u16 {
		match self {
			Self::BadRequest => 400,
			Self::Unauthorized => 401,
			Self::Forbidden => 403,
			Self::NotFound => 404,
			Self::MethodNotAllowed => 405,
			Self::TooManyRequests { .. } => 429,
			Self::InternalServerError => 500,
			Self::BadGateway => 502,
			Self::ServiceUnavailable => 503,
			Self::UnexpectedStatus { status } => *status,
		}
	}
}

/// Transport-level failures (network, timeout, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the platform.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The call did not complete within the configured timeout.
	#[error("Request timed out while calling the platform.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the platform.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}
