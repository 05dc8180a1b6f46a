//! Local runbook store.
//!
//! One pretty-printed JSON file per runbook, optionally with a sibling
//! `<stem>_steps` directory holding step descriptions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;

use super::steps::{merge_step_files, step_dir_for, write_step_files, StepFile};
use super::Runbook;

/// Maximum length of a file stem derived from a runbook name.
const MAX_STEM_LEN: usize = 100;

/// Characters that are not allowed in generated file names.
const UNSAFE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// A runbook loaded from disk together with its file name.
#[derive(Debug, Clone)]
pub struct RunbookFile {
    /// File name relative to the runbook directory
    pub filename: String,
    /// Parsed runbook
    pub runbook: Runbook,
}

/// Parse a runbook from a JSON string.
pub fn parse_runbook_str(content: &str) -> anyhow::Result<Runbook> {
    Ok(serde_json::from_str(content)?)
}

/// Serialize a runbook the way it is stored on disk.
pub fn to_file_content(runbook: &Runbook) -> anyhow::Result<String> {
    let mut content = serde_json::to_string_pretty(runbook)?;
    content.push('\n');
    Ok(content)
}

/// Load every `*.json` runbook in a directory.
///
/// With `merge_steps`, step files from each runbook's step directory are
/// folded back into the step descriptions.
pub async fn load_runbook_files(
    dir: &Path,
    merge_steps: bool,
) -> anyhow::Result<Vec<RunbookFile>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read directory {}", dir.display()))?;

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
    {
        let path = entry.path();
        if path.extension().map_or(false, |e| e == "json")
            && tokio::fs::metadata(&path).await.map(|m| m.is_file()).unwrap_or(false)
        {
            paths.push(path);
        }
    }
    paths.sort();

    let files =
        futures::future::try_join_all(paths.into_iter().map(|path| load_one(path, merge_steps)))
            .await?;

    tracing::debug!(dir = %dir.display(), count = files.len(), "Loaded runbook files");
    Ok(files)
}

async fn load_one(path: PathBuf, merge_steps: bool) -> anyhow::Result<RunbookFile> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(String::from)
        .with_context(|| format!("Invalid file name {}", path.display()))?;

    let content = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read file {filename}"))?;
    let mut runbook = parse_runbook_str(&content)
        .with_context(|| format!("Failed to parse file {filename}"))?;

    if merge_steps {
        merge_step_files(&mut runbook, &step_dir_for(&path))
            .await
            .with_context(|| format!("Failed to merge step files for {filename}"))?;
    }

    Ok(RunbookFile { filename, runbook })
}

fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| !UNSAFE_CHARS.contains(c) && !c.is_control())
        .collect()
}

fn file_stem_for(runbook: &Runbook) -> String {
    let stem: String = sanitize(&runbook.name).chars().take(MAX_STEM_LEN).collect();
    if stem.trim_matches('.').is_empty() {
        sanitize(&runbook.id)
    } else {
        stem
    }
}

/// Derive a file name from a runbook name.
///
/// Whitespace becomes `_`, characters unsafe in file names are dropped and
/// the stem is capped in length. Falls back to the runbook id when nothing
/// usable is left.
pub fn file_name_for(runbook: &Runbook) -> String {
    format!("{}.json", file_stem_for(runbook))
}

/// Map runbook ids to the file names they were previously exported under.
pub fn file_names_by_id(files: &[RunbookFile]) -> HashMap<String, String> {
    files.iter().map(|f| (f.runbook.id.clone(), f.filename.clone())).collect()
}

/// Choose a distinct file name for every runbook of an export, in order.
///
/// Runbooks keep the file they were previously exported to. Others get a
/// name derived from the runbook name, with the id appended when another
/// runbook of the export already holds that name. Names are compared
/// case-insensitively.
pub fn assign_file_names(
    runbooks: &[Runbook],
    previous: &HashMap<String, String>,
) -> anyhow::Result<Vec<String>> {
    let mut taken: HashMap<String, &str> = runbooks
        .iter()
        .filter_map(|r| previous.get(&r.id).map(|name| (name.to_lowercase(), r.id.as_str())))
        .collect();

    let mut names = Vec::with_capacity(runbooks.len());
    for runbook in runbooks {
        if let Some(name) = previous.get(&runbook.id) {
            names.push(name.clone());
            continue;
        }

        let preferred = file_name_for(runbook);
        let with_id = format!("{}_{}.json", file_stem_for(runbook), sanitize(&runbook.id));
        let Some(name) = [preferred.clone(), with_id]
            .into_iter()
            .find(|candidate| !taken.contains_key(&candidate.to_lowercase()))
        else {
            let owner = taken.get(&preferred.to_lowercase()).copied().unwrap_or_default();
            anyhow::bail!(
                "Runbooks {} and {} would both be written to {}",
                owner,
                runbook.id,
                preferred
            );
        };

        if name != preferred {
            tracing::warn!(runbook = %runbook.id, file = %name, "File name taken, appending id");
        }
        taken.insert(name.to_lowercase(), &runbook.id);
        names.push(name);
    }

    Ok(names)
}

/// Write a runbook file, replacing its step directory when `step_files` is given.
pub async fn write_runbook_file(
    dir: &Path,
    filename: &str,
    runbook: &Runbook,
    step_files: Option<&[StepFile]>,
) -> anyhow::Result<()> {
    let path = dir.join(filename);

    if let Some(files) = step_files {
        write_step_files(&step_dir_for(&path), files)
            .await
            .with_context(|| format!("Failed to write step files for {filename}"))?;
    }

    tracing::info!(file = %filename, runbook = %runbook.id, "Writing runbook file");
    let content = to_file_content(runbook)?;
    tokio::fs::write(&path, content)
        .await
        .with_context(|| format!("Failed to write file {filename}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runbook::Step;
    use tempfile::TempDir;

    fn named(id: &str, name: &str) -> Runbook {
        Runbook { id: id.to_string(), name: name.to_string(), ..Default::default() }
    }

    fn step_with(description: &str) -> Step {
        Step { number: 1, description: Some(description.to_string()), ..Default::default() }
    }

    #[test]
    fn test_file_name_for_sanitizes() {
        assert_eq!(file_name_for(&named("1", "Restart web tier")), "Restart_web_tier.json");
        assert_eq!(file_name_for(&named("1", "a/b: c?*")), "ab_c.json");
        assert_eq!(file_name_for(&named("1", "tab\there")), "tab_here.json");
    }

    #[test]
    fn test_file_name_for_falls_back_to_id() {
        assert_eq!(file_name_for(&named("rb-42", "???")), "rb-42.json");
        assert_eq!(file_name_for(&named("rb-42", "..")), "rb-42.json");
    }

    #[test]
    fn test_file_name_for_truncates() {
        let name = "x".repeat(300);
        assert_eq!(file_name_for(&named("1", &name)).len(), MAX_STEM_LEN + ".json".len());
    }

    #[tokio::test]
    async fn test_write_then_load() {
        let temp = TempDir::new().unwrap();
        let runbook = Runbook { steps: vec![step_with("<p>a</p>")], ..named("rb-1", "Book") };

        write_runbook_file(temp.path(), "Book.json", &runbook, None).await.unwrap();
        std::fs::write(temp.path().join("notes.txt"), "not a runbook").unwrap();

        let files = load_runbook_files(temp.path(), false).await.unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "Book.json");
        assert_eq!(files[0].runbook, runbook);
    }

    #[tokio::test]
    async fn test_load_merges_step_files() {
        let temp = TempDir::new().unwrap();
        let mut runbook = named("rb-1", "Book");
        runbook.steps.push(step_with("<p>a</p>"));

        let files = crate::runbook::steps::split_descriptions(&mut runbook);
        write_runbook_file(temp.path(), "Book.json", &runbook, Some(&files)).await.unwrap();

        let without = load_runbook_files(temp.path(), false).await.unwrap();
        let marker = without[0].runbook.steps[0].description.as_deref();
        assert_eq!(marker, Some("Exported into step001.html"));

        let merged = load_runbook_files(temp.path(), true).await.unwrap();
        assert_eq!(merged[0].runbook.steps[0].description.as_deref(), Some("<p>a</p>\n"));
    }

    #[tokio::test]
    async fn test_load_reports_bad_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("broken.json"), "{ not json").unwrap();

        let err = load_runbook_files(temp.path(), true).await.unwrap_err();
        assert!(format!("{err:#}").contains("broken.json"));
    }

    #[test]
    fn test_assign_file_names_disambiguates_collisions() {
        let runbooks =
            [named("a", "Restart web"), named("b", "Restart_web"), named("c", "restart WEB")];

        let names = assign_file_names(&runbooks, &HashMap::new()).unwrap();

        assert_eq!(names, ["Restart_web.json", "Restart_web_b.json", "restart_WEB_c.json"]);
    }

    #[test]
    fn test_assign_file_names_keeps_previous_files() {
        let runbooks = [named("a", "Book"), named("b", "Anything")];
        let previous = HashMap::from([("b".to_string(), "Book.json".to_string())]);

        let names = assign_file_names(&runbooks, &previous).unwrap();

        assert_eq!(names, ["Book_a.json", "Book.json"]);
    }

    #[test]
    fn test_assign_file_names_fails_when_no_name_is_free() {
        let runbooks = [named("a", "Book"), named("b", "Book"), named("c", "Other")];
        let previous = HashMap::from([("c".to_string(), "Book_b.json".to_string())]);

        let err = assign_file_names(&runbooks, &previous).unwrap_err().to_string();

        assert!(err.contains("a and b"), "{err}");
        assert!(err.contains("Book.json"), "{err}");
    }

    #[test]
    fn test_file_names_by_id() {
        let files =
            vec![RunbookFile { filename: "old.json".into(), runbook: named("rb-1", "New") }];
        let map = file_names_by_id(&files);
        assert_eq!(map.get("rb-1").map(String::as_str), Some("old.json"));
    }
}
