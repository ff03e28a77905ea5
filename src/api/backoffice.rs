//! Back-office admin client: financial documents and withdrawal requests.
//!
//! Requests carry the raw token in the `Authentication` header, either one static token or the
//! next credential from a pool. List filters use the back-office's `dd-mm-yy - HH:MM:SS` local
//! timestamps, and responses carry zone-less local timestamps and numeric enum codes.

// crates.io
use time::PrimitiveDateTime;
// self
use crate::{
	_prelude::*,
	api::dates,
	dispatch::Dispatcher,
	transport::{ApiHttpClient, TransportErrorMapper},
};
#[cfg(feature = "reqwest")]
use crate::{
	auth::CredentialSecret,
	dispatch::{DispatcherBuilder, ForbiddenPolicy},
	error::ConfigError,
	pool::CredentialPool,
	profile::ApiProfile,
	transport::{ReqwestHttpClient, ReqwestTransportErrorMapper},
};

const TRANSACTIONS_PATH: &str = "/Financial/GetDocumentsWithPaging";
const DEPOSITS_PATH: &str = "/Financial/GetDepositsWithdrawalsWithPaging";
const WITHDRAWALS_PATH: &str = "/Client/GetClientWithdrawalRequestsWithTotals";

#[cfg(feature = "reqwest")]
/// Back-office client on the crate's default reqwest transport stack.
pub type ReqwestBackOfficeClient = BackOfficeClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Player identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub i64);

/// Financial document type, decoded from its numeric code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "i64")]
pub enum TransactionType {
	/// Code 15.
	Winning,
	/// Code 10.
	Bet,
	/// Code 301.
	CorrectionUp,
	/// Code 302.
	CorrectionDown,
	/// Code 3.
	Deposit,
	/// Any other code.
	Unknown(i64),
}
impl From<i64> for TransactionType {
	fn from(code: i64) -> Self {
		match code {
			15 => Self::Winning,
			10 => Self::Bet,
			301 => Self::CorrectionUp,
			302 => Self::CorrectionDown,
			3 => Self::Deposit,
			other => Self::Unknown(other),
		}
	}
}

/// Withdrawal request state, decoded from its numeric code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "i64")]
pub enum WithdrawalStatus {
	/// Code 0.
	Pending,
	/// Code 3.
	Paid,
	/// Code -2.
	Rejected,
	/// Code -1.
	Cancelled,
	/// Any other code.
	Unknown(i64),
}
impl From<i64> for WithdrawalStatus {
	fn from(code: i64) -> Self {
		match code {
			0 => Self::Pending,
			3 => Self::Paid,
			-2 => Self::Rejected,
			-1 => Self::Cancelled,
			other => Self::Unknown(other),
		}
	}
}

/// Financial document.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Transaction {
	/// Document identifier.
	#[serde(rename = "Id")]
	pub id: i64,
	/// Signed amount.
	#[serde(rename = "Amount")]
	pub amount: f64,
	/// Owning player.
	#[serde(rename = "ClientId")]
	pub player_id: PlayerId,
	/// Document type.
	#[serde(rename = "TypeId")]
	pub kind: TransactionType,
	/// Operator note.
	#[serde(rename = "Note", default)]
	pub note: Option<String>,
	/// Local creation time.
	#[serde(rename = "CreatedLocal", with = "dates::local")]
	pub created_at: PrimitiveDateTime,
}

/// Deposit document.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Deposit {
	/// Document identifier.
	#[serde(rename = "Id")]
	pub id: i64,
	/// Deposited amount.
	#[serde(rename = "Amount")]
	pub amount: f64,
	/// Owning player.
	#[serde(rename = "ClientId")]
	pub player_id: PlayerId,
	/// Local creation time.
	#[serde(rename = "CreatedLocal", with = "dates::local")]
	pub created_at: PrimitiveDateTime,
	/// Payment system name.
	#[serde(rename = "PaymentSystemName", default)]
	pub payment_method: String,
}

/// Withdrawal request.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Withdrawal {
	/// Request identifier.
	#[serde(rename = "Id")]
	pub id: i64,
	/// Requested amount.
	#[serde(rename = "Amount")]
	pub amount: f64,
	/// Owning player.
	#[serde(rename = "ClientId")]
	pub player_id: PlayerId,
	/// Local request time.
	#[serde(rename = "RequestTimeLocal", with = "dates::local")]
	pub requested_at: PrimitiveDateTime,
	/// Payment system name.
	#[serde(rename = "PaymentSystemName", default)]
	pub payment_method: String,
	/// Local approval time, once approved.
	#[serde(rename = "AllowTimeLocal", default, with = "dates::local::option")]
	pub allowed_at: Option<PrimitiveDateTime>,
	/// Operator note.
	#[serde(rename = "Info", default)]
	pub info: Option<String>,
	/// Request state.
	#[serde(rename = "State")]
	pub status: WithdrawalStatus,
}

/// Filter for [`BackOfficeClient::list_transactions`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ListTransactionsRequest {
	/// Earliest local creation time.
	#[serde(rename = "FromCreatedDateLocal", serialize_with = "dates::filter::serialize")]
	pub from: Option<PrimitiveDateTime>,
	/// Latest local creation time.
	#[serde(rename = "ToCreatedDateLocal", serialize_with = "dates::filter::serialize")]
	pub to: Option<PrimitiveDateTime>,
	/// Page size.
	#[serde(rename = "MaxRows")]
	pub max_rows: u32,
}

/// Filter for [`BackOfficeClient::list_deposits`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ListDepositsRequest {
	/// Earliest local creation time.
	#[serde(rename = "FromCreatedDateLocal", serialize_with = "dates::filter::serialize")]
	pub from: Option<PrimitiveDateTime>,
	/// Latest local creation time.
	#[serde(rename = "ToCreatedDateLocal", serialize_with = "dates::filter::serialize")]
	pub to: Option<PrimitiveDateTime>,
}

/// Filter for [`BackOfficeClient::list_withdrawals`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ListWithdrawalsRequest {
	/// Earliest request time.
	#[serde(rename = "FromDateLocal", with = "time::serde::rfc3339::option")]
	pub from: Option<OffsetDateTime>,
	/// Latest request time.
	#[serde(rename = "ToDateLocal", with = "time::serde::rfc3339::option")]
	pub to: Option<OffsetDateTime>,
	/// Restricts the result to one request.
	#[serde(rename = "Id")]
	pub id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(bound = "T: Deserialize<'de>")]
struct Objects<T> {
	#[serde(rename = "Objects", default)]
	objects: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct DepositPage {
	#[serde(rename = "Documents")]
	documents: Objects<Deposit>,
}

#[derive(Debug, Deserialize)]
struct WithdrawalPage {
	#[serde(rename = "ClientRequests", default)]
	requests: Vec<Withdrawal>,
}

/// Client for the back-office admin API.
pub struct BackOfficeClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	dispatcher: Dispatcher<C, M>,
}
impl<C, M> BackOfficeClient<C, M>
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

	/// Lists financial documents.
	pub async fn list_transactions(
		&self,
		request: &ListTransactionsRequest,
	) -> Result<Vec<Transaction>> {
		let page =
			self.dispatcher.post_json::<Objects<Transaction>, _>(TRANSACTIONS_PATH, request).await?;

		Ok(page.objects)
	}

	/// Lists deposit documents.
	pub async fn list_deposits(&self, request: &ListDepositsRequest) -> Result<Vec<Deposit>> {
		let page = self.dispatcher.post_json::<DepositPage, _>(DEPOSITS_PATH, request).await?;

		Ok(page.documents.objects)
	}

	/// Lists withdrawal requests.
	pub async fn list_withdrawals(
		&self,
		request: &ListWithdrawalsRequest,
	) -> Result<Vec<Withdrawal>> {
		let page =
			self.dispatcher.post_json::<WithdrawalPage, _>(WITHDRAWALS_PATH, request).await?;

		Ok(page.requests)
	}
}
#[cfg(feature = "reqwest")]
impl BackOfficeClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Client authenticating every call with one static token.
	pub fn with_token(token: impl Into<CredentialSecret>) -> Result<Self, ConfigError> {
		let dispatcher =
			DispatcherBuilder::new(ApiProfile::backoffice()).static_token(token).build()?;

		Ok(Self { dispatcher })
	}

	/// Client drawing a credential from `pool` for every call.
	pub fn with_pool(pool: Arc<dyn CredentialPool>) -> Result<Self, ConfigError> {
		Self::with_pool_and_policy(pool, ForbiddenPolicy::default())
	}

	/// Pool-backed client with an explicit 403 policy.
	pub fn with_pool_and_policy(
		pool: Arc<dyn CredentialPool>,
		policy: ForbiddenPolicy,
	) -> Result<Self, ConfigError> {
		let dispatcher = DispatcherBuilder::new(ApiProfile::backoffice())
			.pool(pool)
			.forbidden_policy(policy)
			.build()?;

		Ok(Self { dispatcher })
	}
}
impl<C, M> Debug for BackOfficeClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BackOfficeClient").field("dispatcher", &self.dispatcher).finish()
	}
}
