use anyhow::{Context, Result};
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error_helpers::{is_permission_denied, permission_error, read_text};
use crate::excision::{Excision, ExcisionOutcome, RemovedBlock};

#[derive(Debug, Clone, PartialEq)]
pub enum ChangeType {
    Unchanged,
    Deleted,
    Added, // a partially removed line comes back as Deleted + Added
}

#[derive(Debug, Clone)]
pub struct LineChange {
    pub line_number: usize,
    pub change_type: ChangeType,
    pub content: String,
}

#[derive(Debug)]
pub struct FileDiff {
    pub file_path: String,
    pub changes: Vec<LineChange>,
    pub all_lines: Vec<(usize, String, ChangeType)>, // (line_number, content, change_type)
    pub blocks: Vec<RemovedBlock>,
}

impl FileDiff {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// What `apply_to_file` did to the file on disk
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyReport {
    pub file_path: PathBuf,
    pub blocks_removed: usize,
    pub bytes_removed: usize,
    /// False when nothing matched and the file was left untouched
    pub written: bool,
}

pub struct FileProcessor {
    excision: Excision,
}

impl FileProcessor {
    pub fn new(excision: Excision) -> Self {
        Self { excision }
    }

    pub fn excision(&self) -> &Excision {
        &self.excision
    }

    fn run(&self, file_path: &Path) -> Result<(String, ExcisionOutcome)> {
        let content = read_text(file_path, "reading the file to excise")?;
        debug!(
            file = %file_path.display(),
            bytes = content.len(),
            pattern = self.excision.pattern(),
            "loaded file"
        );

        let outcome = self.excision.apply(&content);
        Ok((content, outcome))
    }

    /// Run the excision without touching the file and describe the result
    pub fn preview(&self, file_path: &Path) -> Result<FileDiff> {
        let (original, outcome) = self.run(file_path)?;
        Ok(Self::build_diff(file_path, &original, outcome))
    }

    fn build_diff(file_path: &Path, original: &str, outcome: ExcisionOutcome) -> FileDiff {
        let mut all_lines = Vec::new();

        if !outcome.is_unchanged() {
            let diff = TextDiff::from_lines(original, outcome.content.as_str());
            for change in diff.iter_all_changes() {
                let content = change
                    .value()
                    .trim_end_matches('\n')
                    .trim_end_matches('\r')
                    .to_string();

                let entry = match change.tag() {
                    ChangeTag::Equal => (
                        change.old_index().unwrap_or_default() + 1,
                        content,
                        ChangeType::Unchanged,
                    ),
                    ChangeTag::Delete => (
                        change.old_index().unwrap_or_default() + 1,
                        content,
                        ChangeType::Deleted,
                    ),
                    ChangeTag::Insert => (
                        change.new_index().unwrap_or_default() + 1,
                        content,
                        ChangeType::Added,
                    ),
                };
                all_lines.push(entry);
            }
        }

        let changes = all_lines
            .iter()
            .filter(|(_, _, change_type)| *change_type != ChangeType::Unchanged)
            .map(|(line_number, content, change_type)| LineChange {
                line_number: *line_number,
                change_type: change_type.clone(),
                content: content.clone(),
            })
            .collect();

        FileDiff {
            file_path: file_path.display().to_string(),
            changes,
            all_lines,
            blocks: outcome.removed,
        }
    }

    /// Excise in place. The new text goes to a temp file next to the target
    /// and is renamed over it, so a failed write never leaves a truncated file.
    pub fn apply_to_file(&self, file_path: &Path) -> Result<ApplyReport> {
        let (original, outcome) = self.run(file_path)?;

        if outcome.is_unchanged() {
            warn!(
                file = %file_path.display(),
                pattern = self.excision.pattern(),
                "nothing to remove; file left as is"
            );
            return Ok(ApplyReport {
                file_path: file_path.to_path_buf(),
                blocks_removed: 0,
                bytes_removed: 0,
                written: false,
            });
        }

        write_atomically(file_path, &outcome.content)?;

        let report = ApplyReport {
            file_path: file_path.to_path_buf(),
            blocks_removed: outcome.removed.len(),
            bytes_removed: original.len().saturating_sub(outcome.content.len()),
            written: true,
        };

        for block in &outcome.removed {
            info!(
                file = %file_path.display(),
                start_line = block.start_line,
                end_line = block.end_line,
                "removed block"
            );
        }

        Ok(report)
    }
}

/// Replace `file_path` with `content`, keeping its permissions
pub fn write_atomically(file_path: &Path, content: &str) -> Result<()> {
    let dir = match file_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let permissions = fs::metadata(file_path)
        .with_context(|| format!("Failed to read metadata: {}", file_path.display()))?
        .permissions();

    let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| {
        if is_permission_denied(&e) {
            anyhow::anyhow!(permission_error(dir, "creating a temp file in"))
        } else {
            anyhow::Error::new(e).context(format!(
                "Failed to create temp file in {}",
                dir.display()
            ))
        }
    })?;

    temp_file
        .write_all(content.as_bytes())
        .with_context(|| "Failed to write temp file")?;
    temp_file
        .flush()
        .with_context(|| "Failed to flush temp file")?;

    fs::set_permissions(temp_file.path(), permissions)
        .with_context(|| format!("Failed to copy permissions to {}", temp_file.path().display()))?;

    temp_file
        .persist(file_path)
        .with_context(|| format!("Failed to persist temp file to {}", file_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SCREEN: &str = "export function FishingScreen() {\n  const onCast = () => {\n    startCast();\n    if (nearbyFish && user) {\n      catchFish(nearbyFish);\n    } else {\n      setShowMinigame(true);\n    }\n  };\n  return null;\n}\n";

    const CLEANED: &str = "export function FishingScreen() {\n  const onCast = () => {\n    startCast();\n  };\n  return null;\n}\n";

    fn write_screen(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("FishingScreenModular.tsx");
        fs::write(&path, content).unwrap();
        path
    }

    fn processor() -> FileProcessor {
        FileProcessor::new(Excision::dead_block().unwrap())
    }

    #[test]
    fn test_apply_removes_block() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_screen(&temp_dir, SCREEN);

        let report = processor().apply_to_file(&path).unwrap();

        assert!(report.written);
        assert_eq!(report.blocks_removed, 1);
        assert_eq!(report.bytes_removed, SCREEN.len() - CLEANED.len());
        assert_eq!(fs::read_to_string(&path).unwrap(), CLEANED);
    }

    #[test]
    fn test_apply_twice_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_screen(&temp_dir, SCREEN);

        processor().apply_to_file(&path).unwrap();
        let second = processor().apply_to_file(&path).unwrap();

        assert!(!second.written);
        assert_eq!(second.blocks_removed, 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), CLEANED);
    }

    #[test]
    fn test_preview_does_not_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_screen(&temp_dir, SCREEN);

        let diff = processor().preview(&path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), SCREEN);
        assert_eq!(diff.blocks.len(), 1);

        let deleted: Vec<usize> = diff
            .changes
            .iter()
            .filter(|c| c.change_type == ChangeType::Deleted)
            .map(|c| c.line_number)
            .collect();
        assert_eq!(deleted, vec![4, 5, 6, 7, 8]);
        assert!(diff
            .changes
            .iter()
            .all(|c| c.change_type != ChangeType::Added));
    }

    #[test]
    fn test_preview_without_match_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_screen(&temp_dir, CLEANED);

        let diff = processor().preview(&path).unwrap();
        assert!(diff.is_empty());
        assert!(diff.all_lines.is_empty());
    }

    #[test]
    fn test_matches_that_change_nothing_leave_file_alone() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_screen(&temp_dir, "abc\n");

        for (pattern, replacement) in [("z*", ""), ("abc", "abc")] {
            let processor = FileProcessor::new(Excision::new(pattern, replacement).unwrap());

            let diff = processor.preview(&path).unwrap();
            assert!(diff.is_empty(), "{} should not count as a change", pattern);

            let report = processor.apply_to_file(&path).unwrap();
            assert!(!report.written);
            assert_eq!(report.blocks_removed, 0);
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "abc\n");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nope.tsx");

        let err = processor().apply_to_file(&path).unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_partial_line_shows_as_replaced() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_screen(&temp_dir, "a(); /* dead */ b();\nc();\n");
        let processor = FileProcessor::new(Excision::new(r" /\*.*?\*/", "").unwrap());

        let diff = processor.preview(&path).unwrap();
        let kinds: Vec<ChangeType> = diff.changes.iter().map(|c| c.change_type.clone()).collect();
        assert_eq!(kinds, vec![ChangeType::Deleted, ChangeType::Added]);
        assert_eq!(diff.changes[1].content, "a(); b();");
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_are_preserved() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = write_screen(&temp_dir, SCREEN);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        processor().apply_to_file(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }
}
