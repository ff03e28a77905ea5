//! Credential secrets and the rate-limit-aware credential record handed out by pools.

pub mod credential;
pub mod secret;

pub use credential::*;
pub use secret::*;
