//! Maps non-success HTTP statuses onto [`StatusError`].

// crates.io
use http::StatusCode;
// self
use crate::{
	_prelude::*,
	error::StatusError,
	transport::{self, HttpResponse},
};

/// Passes 2xx responses through and turns everything else into a [`StatusError`].
pub(crate) fn ensure_success(response: HttpResponse) -> Result<HttpResponse> {
	if response.status().is_success() {
		Ok(response)
	} else {
		Err(classify(&response).into())
	}
}

/// Classifies a non-success response.
pub(crate) fn classify(response: &HttpResponse) -> StatusError {
	match response.status() {
		StatusCode::BAD_REQUEST => StatusError::BadRequest,
		StatusCode::UNAUTHORIZED => StatusError::Unauthorized,
		StatusCode::FORBIDDEN => StatusError::Forbidden,
		StatusCode::NOT_FOUND => StatusError::NotFound,
		StatusCode::METHOD_NOT_ALLOWED => StatusError::MethodNotAllowed,
		StatusCode::TOO_MANY_REQUESTS => StatusError::TooManyRequests {
			retry_after: transport::parse_retry_after(response.headers()),
		},
		StatusCode::INTERNAL_SERVER_ERROR => StatusError::InternalServerError,
		StatusCode::BAD_GATEWAY => StatusError::BadGateway,
		StatusCode::SERVICE_UNAVAILABLE => StatusError::ServiceUnavailable,
		other => StatusError::UnexpectedStatus { status: other.as_u16() },
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use http::{HeaderValue, header::RETRY_AFTER};
	// self
	use super::*;

	fn response(status: u16) -> HttpResponse {
		let mut response = HttpResponse::new(Vec::new());

		*response.status_mut() =
			StatusCode::from_u16(status).expect("Test status codes should be valid.");

		response
	}

	#[test]
	fn known_statuses_map_to_their_variants() {
		let cases = [
			(400, StatusError::BadRequest),
			(401, StatusError::Unauthorized),
			(403, StatusError::Forbidden),
			(404, StatusError::NotFound),
			(405, StatusError::MethodNotAllowed),
			(429, StatusError::TooManyRequests { retry_after: None }),
			(500, StatusError::InternalServerError),
			(502, StatusError::BadGateway),
			(503, StatusError::ServiceUnavailable),
			(418, StatusError::UnexpectedStatus { status: 418 }),
			(302, StatusError::UnexpectedStatus { status: 302 }),
		];

		for (status, expected) in cases {
			assert_eq!(classify(&response(status)), expected, "status {status}");
		}
	}

	#[test]
	fn too_many_requests_carries_retry_after() {
		let mut response = response(429);

		response.headers_mut().insert(RETRY_AFTER, HeaderValue::from_static("30"));

		assert_eq!(
			classify(&response),
			StatusError::TooManyRequests { retry_after: Some(Duration::seconds(30)) }
		);
	}

	#[test]
	fn success_statuses_pass_through() {
		assert!(ensure_success(response(200)).is_ok());
		assert!(ensure_success(response(204)).is_ok());
		assert!(matches!(
			ensure_success(response(401)),
			Err(Error::Status(StatusError::Unauthorized))
		));
	}
}
