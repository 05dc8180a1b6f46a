//! Step description files.
//!
//! On export, non-empty step descriptions are moved out of the runbook JSON
//! into `<stem>_steps/stepNNN.html`; on import the files are read back into
//! the matching steps.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;

use super::html;
use super::Runbook;

/// Highest step number representable in a `stepNNN.html` file name.
pub const MAX_STEP_NUMBER: u32 = 999;

static STEP_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^step(\d{3})\.html$").expect("valid step file regex"));

/// A description pulled out of a step, ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFile {
    /// Step number the content belongs to
    pub number: u32,
    /// File name inside the step directory
    pub file_name: String,
    /// Pretty-printed HTML
    pub content: String,
}

/// File name for a step number, e.g. `step007.html`.
pub fn step_file_name(number: u32) -> String {
    format!("step{number:03}.html")
}

/// Parse the step number out of a `stepNNN.html` file name.
///
/// Only numbers in `1..=999` are accepted, the range export writes.
pub fn parse_step_file_name(file_name: &str) -> Option<u32> {
    STEP_FILE
        .captures(file_name)
        .and_then(|c| c[1].parse().ok())
        .filter(|n| (1..=MAX_STEP_NUMBER).contains(n))
}

/// Step directory that belongs to a runbook JSON file.
pub fn step_dir_for(json_path: &Path) -> PathBuf {
    let stem = json_path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    json_path.with_file_name(format!("{stem}_steps"))
}

/// Marker left in place of an exported description.
pub fn export_marker(file_name: &str) -> String {
    format!("Exported into {file_name}")
}

/// Move every non-empty step description out of the runbook.
///
/// Each extracted description is replaced by an export marker. Steps whose
/// number does not fit the three-digit file name keep their description.
pub fn split_descriptions(runbook: &mut Runbook) -> Vec<StepFile> {
    let mut files = Vec::new();

    for step in &mut runbook.steps {
        if !step.has_description() {
            continue;
        }
        if step.number == 0 || step.number > MAX_STEP_NUMBER {
            tracing::warn!(
                runbook = %runbook.id,
                step = step.number,
                "Step number out of range for a step file, keeping description inline"
            );
            continue;
        }

        let file_name = step_file_name(step.number);
        let content = html::pretty(step.description.as_deref().unwrap_or_default());
        step.description = Some(export_marker(&file_name));
        files.push(StepFile { number: step.number, file_name, content });
    }

    files
}

/// Remove a runbook's step directory, if any, and write the given files.
///
/// The directory is only recreated when there is something to write.
pub async fn write_step_files(step_dir: &Path, files: &[StepFile]) -> anyhow::Result<()> {
    match tokio::fs::remove_dir_all(step_dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to remove {}", step_dir.display()));
        }
    }

    if files.is_empty() {
        return Ok(());
    }

    tokio::fs::create_dir_all(step_dir)
        .await
        .with_context(|| format!("Failed to create {}", step_dir.display()))?;

    futures::future::try_join_all(files.iter().map(|file| async move {
        let path = step_dir.join(&file.file_name);
        tracing::info!(file = %file.file_name, dir = %step_dir.display(), "Writing step file");
        tokio::fs::write(&path, &file.content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))
    }))
    .await?;

    Ok(())
}

/// Read step files back into the runbook's step descriptions.
///
/// A missing directory is not an error. Files for step numbers the runbook
/// does not have are ignored. Contents are used as-is, with invalid UTF-8
/// replaced rather than rejected.
pub async fn merge_step_files(runbook: &mut Runbook, step_dir: &Path) -> anyhow::Result<()> {
    match tokio::fs::metadata(step_dir).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", step_dir.display()));
        }
    }

    let mut entries = tokio::fs::read_dir(step_dir)
        .await
        .with_context(|| format!("Failed to read {}", step_dir.display()))?;

    let mut numbered = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("Failed to read {}", step_dir.display()))?
    {
        let file_name = entry.file_name();
        if let Some(number) = file_name.to_str().and_then(parse_step_file_name) {
            numbered.push((number, entry.path()));
        }
    }

    let reads = numbered.into_iter().map(|(number, path)| async move {
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        anyhow::Ok((number, String::from_utf8_lossy(&bytes).into_owned()))
    });
    let contents = futures::future::try_join_all(reads).await?;

    let by_number: HashMap<u32, String> = contents.into_iter().collect();
    for (number, content) in by_number {
        match runbook.step_mut(number) {
            Some(step) => step.description = Some(content),
            None => tracing::debug!(runbook = %runbook.id, step = number, "No step for step file"),
        }
    }

    Ok(())
}
