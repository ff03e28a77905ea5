#![cfg(feature = "reqwest")]

// crates.io
use betconstruct::{
	api::crm::{CrmClient, CrmOptions, ExcelExportRequest, ExecuteReportRequest},
	error::{ConfigError, Error},
	profile::ApiProfile,
};
use httpmock::prelude::*;
use serde_json::{Value, json};

fn options(server: &MockServer) -> CrmOptions {
	CrmOptions::default().with_profile(ApiProfile::crm().with_base_url(server.base_url()))
}

fn envelope(data: Value) -> Value {
	json!({ "Data": data, "HasError": false, "AlertMessage": null })
}

#[tokio::test]
async fn connect_logs_in_and_sends_the_bearer_session() {
	let server = MockServer::start_async().await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/User/LoginWithPlatform").body("\"platform-token\"");
			then.status(200).json_body(envelope(json!("Bearer session-1")));
		})
		.await;
	let execute = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/Report/Execute")
				.header("Authentication", "Bearer session-1")
				.header("Content-Type", "application/json")
				.json_body(json!({ "Type": 0, "CustomReportId": 42 }));
			then.status(200).json_body(envelope(Value::Null));
		})
		.await;
	let list = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/ReportResult/List")
				.header("Authentication", "Bearer session-1");
			then.status(200).json_body(envelope(json!({
				"Data": [{
					"AdHocReportResultId": 11,
					"CreatorName": "ops",
					"CreatedDate": "2024-05-01T10:00:00.123"
				}]
			})));
		})
		.await;
	let settings = options(&server).platform_token("platform-token").refresh_on_expiry();
	let client = CrmClient::connect(settings).await.expect("Connecting should log in.");

	client
		.execute_report(&ExecuteReportRequest::new(42))
		.await
		.expect("Report execution should succeed.");

	let results = client.list_report_results(42).await.expect("Listing results should succeed.");

	assert_eq!(results.len(), 1);
	assert_eq!(results[0].id, 11);
	assert_eq!(
		client.dispatcher().session_token().map(|secret| secret.expose().to_owned()),
		Some("session-1".to_owned())
	);

	login.assert_calls_async(1).await;
	execute.assert_calls_async(1).await;
	list.assert_calls_async(1).await;
}

#[tokio::test]
async fn excel_envelope_means_the_report_is_not_ready() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/AdHocReportResult/GetExcel")
				.header("Authentication", "Bearer s");
			then.status(200).json_body(envelope(Value::Null));
		})
		.await;

	let client = CrmClient::connect(options(&server).session_token("s"))
		.await
		.expect("Connecting with a session token should not log in.");
	let err = client
		.download_report_as_excel(&ExcelExportRequest::new(11))
		.await
		.expect_err("An envelope instead of a file should fail.");

	assert!(matches!(err, Error::ReportNotReady));
}

#[tokio::test]
async fn excel_download_returns_the_file_bytes() {
	let server = MockServer::start_async().await;
	let file = b"PK\x03\x04spreadsheet".to_vec();

	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/AdHocReportResult/GetExcel")
				.json_body(json!({
					"ReportResultId": 11,
					"CurrencyCode": "EUR",
					"DocumentType": "xlsx",
					"ReportType": "0",
					"UserTimeZone": 0,
					"fileName": "report"
				}));
			then.status(200).header("Content-Type", "application/octet-stream").body(&file);
		})
		.await;

	let client = CrmClient::connect(options(&server).session_token("s"))
		.await
		.expect("Connecting with a session token should not log in.");
	let request = ExcelExportRequest::new(11).with_currency("EUR").with_time_zone(0);
	let bytes = client.download_report_as_excel(&request).await.expect("Download should succeed.");

	assert_eq!(bytes, file);
}

#[tokio::test]
async fn excel_envelope_with_error_is_an_application_error() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/AdHocReportResult/GetExcel");
			then.status(200).json_body(json!({
				"Data": null,
				"HasError": true,
				"AlertMessage": "Unknown report"
			}));
		})
		.await;

	let client = CrmClient::connect(options(&server).session_token("s"))
		.await
		.expect("Connecting with a session token should not log in.");
	let err = client
		.download_report_as_excel(&ExcelExportRequest::new(404))
		.await
		.expect_err("A flagged envelope should fail.");

	assert!(matches!(err, Error::Application { ref message } if message == "Unknown report"));
}

#[tokio::test]
async fn rejected_platform_token_fails_connect() {
	let server = MockServer::start_async().await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/User/LoginWithPlatform");
			then.status(200).json_body(json!({
				"Data": null,
				"HasError": true,
				"AlertMessage": "Invalid token"
			}));
		})
		.await;
	let err = CrmClient::connect(options(&server).platform_token("bad").refresh_on_expiry())
		.await
		.expect_err("A rejected platform token should fail.");

	assert!(matches!(err, Error::Application { ref message } if message == "Invalid token"));

	login.assert_calls_async(1).await;
}

#[tokio::test]
async fn refresh_without_a_platform_token_is_a_config_error() {
	let server = MockServer::start_async().await;
	let err = CrmClient::connect(options(&server).refresh_on_expiry())
		.await
		.expect_err("Refresh without a platform token should fail.");

	assert!(matches!(err, Error::Config(ConfigError::MissingPlatformToken)));
}
