//! Serde adapters for the platform's date formats.

// crates.io
use time::{PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description};
// self
use crate::_prelude::*;

/// `2024-03-01T12:30:00`, optionally with fractional seconds.
const RESPONSE_FORMAT: &[BorrowedFormatItem<'static>] =
	format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]");
/// `01-03-24 - 12:30:00`, as expected by back-office list filters.
const FILTER_FORMAT: &[BorrowedFormatItem<'static>] =
	format_description!("[day]-[month]-[year repr:last_two] - [hour]:[minute]:[second]");

/// Local timestamps in responses (`CreatedLocal`, `RequestTimeLocal`, ...).
pub(crate) mod local {
	// self
	use super::*;

	pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<PrimitiveDateTime, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let raw = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;

		PrimitiveDateTime::parse(&raw, RESPONSE_FORMAT).map_err(serde::de::Error::custom)
	}

	/// Nullable variant of [`deserialize`].
	pub(crate) mod option {
		// self
		use super::*;

		pub(crate) fn deserialize<'de, D>(
			deserializer: D,
		) -> Result<Option<PrimitiveDateTime>, D::Error>
		where
			D: serde::Deserializer<'de>,
		{
			let raw = <Option<std::borrow::Cow<'de, str>>>::deserialize(deserializer)?;

			raw.map(|raw| PrimitiveDateTime::parse(&raw, RESPONSE_FORMAT))
				.transpose()
				.map_err(serde::de::Error::custom)
		}
	}
}

/// Instants that arrive either as RFC 3339 or as a zone-less UTC timestamp.
pub(crate) mod instant {
	// crates.io
	use time::format_description::well_known::Rfc3339;
	// self
	use super::*;

	pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let raw = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;

		OffsetDateTime::parse(&raw, &Rfc3339)
			.or_else(|_| {
				PrimitiveDateTime::parse(&raw, RESPONSE_FORMAT).map(PrimitiveDateTime::assume_utc)
			})
			.map_err(serde::de::Error::custom)
	}
}

/// Optional filter timestamps in back-office list requests.
pub(crate) mod filter {
	// self
	use super::*;

	pub(crate) fn serialize<S>(
		value: &Option<PrimitiveDateTime>,
		serializer: S,
	) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		match value {
			Some(value) => {
				let formatted = value.format(FILTER_FORMAT).map_err(serde::ser::Error::custom)?;

				serializer.serialize_some(&formatted)
			},
			None => serializer.serialize_none(),
		}
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	#[derive(Debug, Deserialize)]
	struct Row {
		#[serde(with = "local")]
		at: PrimitiveDateTime,
		#[serde(default, with = "local::option")]
		maybe: Option<PrimitiveDateTime>,
	}

	#[derive(Debug, Deserialize)]
	struct Stamp {
		#[serde(with = "instant")]
		at: OffsetDateTime,
	}

	#[derive(Serialize)]
	struct Filter {
		#[serde(serialize_with = "filter::serialize")]
		from: Option<PrimitiveDateTime>,
	}

	#[test]
	fn response_dates_parse_with_and_without_fractions() {
		let row: Row = serde_json::from_str(r#"{"at":"2024-03-01T12:30:05","maybe":null}"#)
			.expect("Plain timestamp should parse.");

		assert_eq!(row.at, datetime!(2024-03-01 12:30:05));
		assert_eq!(row.maybe, None);

		let row: Row =
			serde_json::from_str(r#"{"at":"2024-03-01T12:30:05.25","maybe":"2024-03-02T00:00:00"}"#)
				.expect("Fractional timestamp should parse.");

		assert_eq!(row.at, datetime!(2024-03-01 12:30:05.25));
		assert_eq!(row.maybe, Some(datetime!(2024-03-02 00:00:00)));
	}

	#[test]
	fn zoned_response_dates_are_rejected() {
		assert!(serde_json::from_str::<Row>(r#"{"at":"2024-03-01T12:30:05Z"}"#).is_err());
	}

	#[test]
	fn instants_accept_zoned_and_zone_less_forms() {
		let zoned: Stamp = serde_json::from_str(r#"{"at":"2024-03-01T12:30:05+03:00"}"#)
			.expect("RFC 3339 timestamp should parse.");
		let naive: Stamp = serde_json::from_str(r#"{"at":"2024-03-01T09:30:05"}"#)
			.expect("Zone-less timestamp should parse.");

		assert_eq!(zoned.at, naive.at);
		assert_eq!(naive.at, datetime!(2024-03-01 09:30:05 UTC));
	}

	#[test]
	fn filter_dates_use_two_digit_years() {
		let json = serde_json::to_string(&Filter { from: Some(datetime!(2024-03-01 09:05:00)) })
			.expect("Filter should serialize.");

		assert_eq!(json, r#"{"from":"01-03-24 - 09:05:00"}"#);
		assert_eq!(
			serde_json::to_string(&Filter { from: None }).expect("Filter should serialize."),
			r#"{"from":null}"#
		);
	}
}
