//! # rbsync
//!
//! Two-way synchronization between a local directory of runbook files and a
//! runbook automation (RBA) service.
//!
//! ## Features
//!
//! - **Export**: Pull every runbook into one JSON file each, with automation
//!   ids rewritten to the ids the service resolves on import
//! - **Split HTML**: Optionally move step descriptions into `stepNNN.html`
//!   files next to the runbook for easier editing and review
//! - **Import**: Create runbooks the service does not know, patch the ones
//!   that changed, and leave everything else alone
//!
//! ## Quick Start
//!
//! ```bash
//! export NOI_HOST=noi.example.com NOI_API_KEY_USER=user NOI_API_KEY_PW=secret
//!
//! # Export into ./runbooks with step descriptions split out
//! rbsync export runbooks --splithtml
//!
//! # Push local edits back and publish them
//! rbsync import runbooks --publish
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::map_unwrap_or)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unnecessary_map_or)]

pub mod core;
pub mod integrations;
pub mod runbook;

pub use crate::core::{Config, RemoteConfig};
pub use integrations::{FetchMode, RbaClient, RemoteError, RunbookService};
pub use runbook::{Automation, Runbook, Step};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "rbsync";
