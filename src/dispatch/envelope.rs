//! The `{ Data, HasError, AlertMessage }` response envelope.

// self
use crate::_prelude::*;

/// Response wrapper used by the back-office and CRM APIs.
///
/// A missing `Data` member decodes as JSON `null`, so payload-free acknowledgements and error-only
/// envelopes both parse.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Envelope<T> {
	/// Operation payload.
	#[serde(rename = "Data", default)]
	pub data: T,
	/// Business-level failure flag.
	#[serde(rename = "HasError", default)]
	pub has_error: bool,
	/// Human-readable failure message.
	#[serde(rename = "AlertMessage", default)]
	pub alert_message: Option<String>,
}
impl Envelope<serde_json::Value> {
	/// Decodes the envelope frame without interpreting `Data`.
	pub fn frame(status: u16, body: &[u8]) -> Result<Self> {
		let mut de = serde_json::Deserializer::from_slice(body);

		serde_path_to_error::deserialize(&mut de).map_err(|source| Error::Decode { source, status })
	}

	/// Converts a flagged envelope into [`Error::Application`], then decodes `Data` into `T`.
	pub fn into_data<T>(self, status: u16) -> Result<T>
	where
		T: DeserializeOwned,
	{
		if self.has_error {
			return Err(Error::Application { message: self.alert_message.unwrap_or_default() });
		}

		serde_path_to_error::deserialize(self.data)
			.map_err(|source| Error::Decode { source, status })
	}
}

/// Decodes a 2xx body, giving `HasError` precedence over the payload shape.
pub(crate) fn decode<T>(status: u16, body: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	Envelope::frame(status, body)?.into_data(status)
}
