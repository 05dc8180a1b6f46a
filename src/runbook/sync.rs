//! Export and import flows.
//!
//! Export pulls runbooks from the service into a directory; import pushes the
//! directory back, creating unknown runbooks and patching changed ones.

use std::path::Path;

use anyhow::Context;
use futures::future::{join_all, try_join_all};

use super::reconcile::{index_by_id, reconcile};
use super::remap::remap;
use super::steps::split_descriptions;
use super::store::{assign_file_names, file_names_by_id, load_runbook_files, write_runbook_file};
use super::Runbook;
use crate::integrations::rba::{FetchMode, RunbookService};

/// Options for an export run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Move step descriptions into separate HTML files
    pub split_html: bool,
}

/// Options for an import run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Publish created and patched runbooks
    pub publish: bool,
}

/// What an export run wrote.
#[derive(Debug, Default)]
pub struct ExportSummary {
    /// Runbook files written
    pub written: Vec<String>,
    /// Step files written across all runbooks
    pub step_files: usize,
}

/// What an import run did.
#[derive(Debug, Default)]
pub struct ImportSummary {
    /// Runbooks sent in the create batch
    pub created: usize,
    /// Runbooks patched successfully
    pub patched: usize,
    /// Runbooks whose patch failed
    pub failed: Vec<String>,
    /// Local runbooks identical to the service copy
    pub unchanged: usize,
    /// Service runbooks with no local file
    pub remote_only: usize,
    /// Report returned by the create request
    pub create_report: Option<serde_json::Value>,
}

/// Export every runbook from the service into `dir`.
pub async fn export_runbooks<S: RunbookService + ?Sized>(
    service: &S,
    dir: &Path,
    options: ExportOptions,
) -> anyhow::Result<ExportSummary> {
    let (files, mut runbooks) = tokio::try_join!(
        load_runbook_files(dir, false),
        async { service.list_runbooks(FetchMode::Export).await.context("Failed to list runbooks") },
    )?;
    tracing::info!(count = runbooks.len(), "Fetched runbooks for export");

    remap_automation_ids(service, &mut runbooks).await?;

    let filenames = assign_file_names(&runbooks, &file_names_by_id(&files))?;
    let writes = runbooks.into_iter().zip(filenames).map(|(mut runbook, filename)| async move {
        let step_files = options.split_html.then(|| split_descriptions(&mut runbook));
        write_runbook_file(dir, &filename, &runbook, step_files.as_deref()).await?;
        anyhow::Ok((filename, step_files.map_or(0, |f| f.len())))
    });
    let written = try_join_all(writes).await?;

    let mut summary = ExportSummary::default();
    for (filename, step_files) in written {
        summary.written.push(filename);
        summary.step_files += step_files;
    }
    Ok(summary)
}

/// Replace export-mode automation ids with the service's internal ids.
pub async fn remap_automation_ids<S: RunbookService + ?Sized>(
    service: &S,
    runbooks: &mut [Runbook],
) -> anyhow::Result<()> {
    let fetches = runbooks.iter_mut().filter(|r| r.has_automations()).map(|exported| async move {
        let standard = service
            .get_runbook(&exported.id)
            .await
            .with_context(|| format!("Failed to fetch runbook {}", exported.id))?;
        remap(exported, &standard)?;
        anyhow::Ok(())
    });
    try_join_all(fetches).await?;
    Ok(())
}

/// Import the runbooks in `dir` into the service.
pub async fn import_runbooks<S: RunbookService + ?Sized>(
    service: &S,
    dir: &Path,
    options: ImportOptions,
) -> anyhow::Result<ImportSummary> {
    let (current, files) = tokio::try_join!(
        async {
            service.list_runbooks(FetchMode::Standard).await.context("Failed to list runbooks")
        },
        load_runbook_files(dir, true),
    )?;

    let remote = index_by_id(current);
    let plan = reconcile(&remote, files.into_iter().map(|f| f.runbook).collect());

    let mut summary = ImportSummary {
        created: plan.to_create.len(),
        unchanged: plan.unchanged.len(),
        remote_only: plan.remote_only.len(),
        ..Default::default()
    };

    if !plan.to_create.is_empty() {
        let report = service
            .create_runbooks(&plan.to_create, options.publish, true)
            .await
            .context("Failed to create runbooks")?;
        tracing::info!(count = plan.to_create.len(), "Created runbooks");
        summary.create_report = Some(report);
    }

    let patches = plan.to_patch.iter().map(|runbook| async move {
        let result = service.patch_runbook(&runbook.id, runbook, options.publish).await;
        (runbook.id.as_str(), result)
    });
    for (id, result) in join_all(patches).await {
        match result {
            Ok(()) => summary.patched += 1,
            Err(e) => {
                tracing::error!(runbook = id, error = %e, "Runbook patch failed");
                summary.failed.push(id.to_string());
            }
        }
    }

    Ok(summary)
}
