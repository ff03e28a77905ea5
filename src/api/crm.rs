//! CRM client: report execution and export.

// crates.io
use http::Method;
use serde::de::IgnoredAny;
use serde_json::json;
// self
use crate::{
	_prelude::*,
	api::dates,
	auth::CredentialSecret,
	dispatch::{Dispatcher, DispatcherBuilder, Envelope},
	error::ConfigError,
	login::PlatformLogin,
	profile::ApiProfile,
	transport::{ApiHttpClient, TransportErrorMapper},
};
#[cfg(feature = "reqwest")]
use crate::transport::{ReqwestHttpClient, ReqwestTransportErrorMapper};

const EXECUTE_REPORT_PATH: &str = "/Report/Execute";
const LIST_REPORT_RESULTS_PATH: &str = "/ReportResult/List";
const EXCEL_EXPORT_PATH: &str = "/AdHocReportResult/GetExcel";

#[cfg(feature = "reqwest")]
/// CRM client on the crate's default reqwest transport stack.
pub type ReqwestCrmClient = CrmClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Connection settings for [`CrmClient`].
#[derive(Clone, Debug)]
pub struct CrmOptions {
	/// Profile to send requests with (defaults to [`ApiProfile::crm`]).
	pub profile: ApiProfile,
	/// Session token to start with.
	pub session_token: Option<CredentialSecret>,
	/// Platform token exchanged for a session token at connect time.
	pub platform_token: Option<CredentialSecret>,
	/// Log in again and replay the call once when the session token is rejected.
	pub refresh_on_expiry: bool,
}
impl CrmOptions {
	/// Overrides the profile.
	pub fn with_profile(mut self, profile: ApiProfile) -> Self {
		self.profile = profile;

		self
	}

	/// Starts with an existing session token.
	pub fn session_token(mut self, token: impl Into<CredentialSecret>) -> Self {
		self.session_token = Some(token.into());

		self
	}

	/// Logs in with `token` at connect time.
	pub fn platform_token(mut self, token: impl Into<CredentialSecret>) -> Self {
		self.platform_token = Some(token.into());

		self
	}

	/// Enables refresh on expiry; requires a platform token.
	pub fn refresh_on_expiry(mut self) -> Self {
		self.refresh_on_expiry = true;

		self
	}
}
impl Default for CrmOptions {
	fn default() -> Self {
		Self {
			profile: ApiProfile::crm(),
			session_token: None,
			platform_token: None,
			refresh_on_expiry: false,
		}
	}
}

/// Body of `/Report/Execute`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExecuteReportRequest {
	/// Report type code.
	#[serde(rename = "Type")]
	pub kind: i32,
	/// Custom report identifier.
	#[serde(rename = "CustomReportId")]
	pub report_id: i32,
}
impl ExecuteReportRequest {
	/// Runs custom report `report_id` with type code 0.
	pub fn new(report_id: i32) -> Self {
		Self { kind: 0, report_id }
	}

	/// Overrides the report type code.
	pub fn with_kind(mut self, kind: i32) -> Self {
		self.kind = kind;

		self
	}
}

/// One stored run of a custom report.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ReportResult {
	/// Result identifier, used for downloads.
	#[serde(rename = "AdHocReportResultId")]
	pub id: i32,
	/// Name of the user who ran the report.
	#[serde(rename = "CreatorName", default)]
	pub creator_name: String,
	/// When the result was produced.
	#[serde(rename = "CreatedDate", with = "dates::instant")]
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
struct ReportResultPage {
	#[serde(rename = "Data", default)]
	data: Vec<ReportResult>,
}

/// Body of `/AdHocReportResult/GetExcel`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExcelExportRequest {
	/// Report result to export.
	#[serde(rename = "ReportResultId")]
	pub report_result_id: i32,
	/// Currency amounts are converted to.
	#[serde(rename = "CurrencyCode")]
	pub currency_code: String,
	/// Spreadsheet format.
	#[serde(rename = "DocumentType")]
	pub document_type: String,
	/// Report type code, as a string.
	#[serde(rename = "ReportType")]
	pub report_type: String,
	/// UTC offset in hours used for timestamps.
	#[serde(rename = "UserTimeZone")]
	pub user_time_zone: i32,
	/// Suggested file name.
	#[serde(rename = "fileName")]
	pub file_name: String,
}
impl ExcelExportRequest {
	/// Exports `report_result_id` as `xlsx` in TRY at UTC+3.
	pub fn new(report_result_id: i32) -> Self {
		Self {
			report_result_id,
			currency_code: "TRY".into(),
			document_type: "xlsx".into(),
			report_type: "0".into(),
			user_time_zone: 3,
			file_name: "report".into(),
		}
	}

	/// Overrides the currency.
	pub fn with_currency(mut self, currency_code: impl Into<String>) -> Self {
		self.currency_code = currency_code.into();

		self
	}

	/// Overrides the UTC offset in hours.
	pub fn with_time_zone(mut self, hours: i32) -> Self {
		self.user_time_zone = hours;

		self
	}
}

/// Client for the CRM API.
pub struct CrmClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	dispatcher: Dispatcher<C, M>,
}
impl<C, M> CrmClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Wraps an already configured dispatcher.
	pub fn new(dispatcher: Dispatcher<C, M>) -> Self {
		Self { dispatcher }
	}

	/// Builds the client on a caller-provided transport and performs the initial login when a
	/// platform token is configured.
	pub async fn connect_with(
		options: CrmOptions,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let http_client = http_client.into();
		let mapper = mapper.into();
		let mut builder = DispatcherBuilder::new(options.profile.clone());

		if let Some(token) = options.session_token {
			builder = builder.static_token(token);
		}

		let login = options
			.platform_token
			.map(|token| {
				PlatformLogin::<C, M>::with_http_client(
					options.profile,
					token,
					http_client.clone(),
					mapper.clone(),
				)
			})
			.transpose()?;

		if options.refresh_on_expiry {
			let login = login.ok_or(ConfigError::MissingPlatformToken)?;
			let dispatcher = builder
				.refresh_with(Arc::new(login))
				.build_with::<C, M>(http_client, mapper)?;

			dispatcher.refresh_now().await?;

			return Ok(Self { dispatcher });
		}
		if let Some(login) = login {
			builder = builder.static_token(login.exchange().await?);
		}

		Ok(Self { dispatcher: builder.build_with(http_client, mapper)? })
	}

	/// Underlying dispatcher.
	pub fn dispatcher(&self) -> &Dispatcher<C, M> {
		&self.dispatcher
	}

	/// Forces a new platform login (refresh-enabled clients only).
	pub async fn refresh_session(&self) -> Result<()> {
		self.dispatcher.refresh_now().await
	}

	/// Queues a custom report run.
	pub async fn execute_report(&self, request: &ExecuteReportRequest) -> Result<()> {
		self.dispatcher.post_json::<IgnoredAny, _>(EXECUTE_REPORT_PATH, request).await?;

		Ok(())
	}

	/// Lists the first page of stored results for custom report `report_id`.
	pub async fn list_report_results(&self, report_id: i32) -> Result<Vec<ReportResult>> {
		let body = json!({
			"ReportId": report_id.to_string(),
			"Type": "0",
			"Searchmodel": {
				"Filters": [{ "Comparision": 2, "Name": "Name", "Values": [""] }],
				"Pageing": { "PageSize": 20, "PageNumber": 1 },
				"Sorting": { "Name": "ArchivedDate", "Direction": "asc" },
				"SortingThen": { "Name": "CreatedDate", "Direction": "desc" }
			}
		});
		let page = self
			.dispatcher
			.post_json::<ReportResultPage, _>(LIST_REPORT_RESULTS_PATH, &body)
			.await?;

		Ok(page.data)
	}

	/// Downloads a report result as a spreadsheet.
	///
	/// The endpoint answers with a JSON envelope instead of the file while the result is still
	/// being generated; that case is reported as [`Error::ReportNotReady`].
	pub async fn download_report_as_excel(&self, request: &ExcelExportRequest) -> Result<Vec<u8>> {
		let body = serde_json::to_vec(request).map_err(ConfigError::from)?;
		let bytes = self.dispatcher.execute_raw(Method::POST, EXCEL_EXPORT_PATH, Some(body)).await?;

		match serde_json::from_slice::<Envelope<serde_json::Value>>(&bytes) {
			Ok(envelope) if envelope.has_error =>
				Err(Error::Application { message: envelope.alert_message.unwrap_or_default() }),
			Ok(_) => Err(Error::ReportNotReady),
			Err(_) => Ok(bytes),
		}
	}
}
#[cfg(feature = "reqwest")]
impl CrmClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Connects on the default reqwest transport.
	pub async fn connect(options: CrmOptions) -> Result<Self> {
		Self::connect_with(options, ReqwestHttpClient::default(), ReqwestTransportErrorMapper).await
	}
}
impl<C, M> Debug for CrmClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CrmClient").field("dispatcher", &self.dispatcher).finish()
	}
}
