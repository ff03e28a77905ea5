//! Typed clients for the platform's HTTP surfaces.
//!
//! Each client wraps a [`Dispatcher`](crate::dispatch::Dispatcher) configured with the matching
//! [`ApiProfile`](crate::profile::ApiProfile) and exposes a representative set of operations.

pub mod accounts;
pub mod backoffice;
pub mod crm;

mod dates;

pub use accounts::AccountsClient;
pub use backoffice::BackOfficeClient;
pub use crm::CrmClient;
