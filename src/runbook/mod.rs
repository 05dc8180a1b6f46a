//! Runbook synchronization.
//!
//! Runbooks are stored locally as JSON files, optionally with their step
//! descriptions split out into HTML files, and kept in sync with the
//! runbook automation service.

pub mod html;
mod reconcile;
mod remap;
mod schema;
pub mod steps;
mod store;
mod sync;

pub use reconcile::{index_by_id, reconcile, ReconcilePlan};
pub use remap::{apply as apply_id_map, correspondence, remap, IdMap, RemapError};
pub use schema::{Automation, Runbook, Step};
pub use steps::{merge_step_files, split_descriptions, step_dir_for, write_step_files, StepFile};
pub use store::{
    assign_file_names, file_name_for, file_names_by_id, load_runbook_files, parse_runbook_str,
    write_runbook_file, RunbookFile,
};
pub use sync::{
    export_runbooks, import_runbooks, remap_automation_ids, ExportOptions, ExportSummary,
    ImportOptions, ImportSummary,
};
