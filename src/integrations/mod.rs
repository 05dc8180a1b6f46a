//! External integrations module.
//!
//! Provides the client for the runbook automation (RBA) service.

pub mod rba;

pub use rba::{FetchMode, RbaClient, RemoteError, RemoteResult, RunbookService};
