//! One excision run: preview, snapshot, rewrite, report
//!
//! `execute` returns everything the binary prints, so the whole run can be
//! checked without a terminal.

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

use crate::backup_manager::BackupManager;
use crate::config::Config;
use crate::diff_formatter::DiffFormatter;
use crate::excision::Excision;
use crate::file_processor::FileProcessor;

/// Command-line values resolved against the config
#[derive(Debug, Clone)]
pub struct ExciseRequest {
    pub file: PathBuf,
    pub pattern: String,
    pub replacement: String,
    pub expand: bool,
    pub dry_run: bool,
    pub context: usize,
    pub no_backup: bool,
    pub backup_dir: Option<String>,
}

impl ExciseRequest {
    /// The built-in target and pattern, or whatever the config overrides them with
    pub fn from_config(config: &Config) -> Self {
        Self {
            file: PathBuf::from(&config.target.file),
            pattern: config.target.pattern.clone(),
            replacement: config.target.replacement.clone(),
            expand: false,
            dry_run: false,
            context: config.output.context_lines,
            no_backup: false,
            backup_dir: None,
        }
    }
}

/// `--backup-dir`, then `[backup] backup_dir`, then ~/.excise/backups
pub fn backup_manager(dir: Option<String>, config: &Config) -> Result<BackupManager> {
    let manager = match dir.or_else(|| config.backup.backup_dir.clone()) {
        Some(dir) => BackupManager::with_directory(dir)?,
        None => BackupManager::new()?,
    };
    Ok(manager.with_max_backups(config.backup.max_backups))
}

/// Run one excision and return the console output.
///
/// A dry run renders the preview only. Otherwise the success line is always
/// the last line, whether or not the pattern matched.
pub fn execute(request: &ExciseRequest, config: &Config) -> Result<String> {
    let excision =
        Excision::new(&request.pattern, &request.replacement)?.with_capture_expansion(request.expand);
    let processor = FileProcessor::new(excision);
    let formatter = DiffFormatter::new(config.output.color);
    let mut output = String::new();

    let diff = processor.preview(&request.file)?;

    if request.dry_run {
        output.push_str(&formatter.format_dry_run_header(&request.pattern));
        output.push_str(&formatter.format_diff_with_context(&diff, request.context));
        return Ok(output);
    }

    // Nothing to snapshot when the run would leave the file as it is
    let backup_id = if diff.is_empty() || request.no_backup {
        None
    } else {
        let manager = backup_manager(request.backup_dir.clone(), config)?;
        Some(manager.create_backup(&request.pattern, &request.file)?)
    };

    let report = processor.apply_to_file(&request.file)?;
    info!(
        file = %request.file.display(),
        blocks = report.blocks_removed,
        written = report.written,
        "excision finished"
    );

    output.push_str(&formatter.format_apply_report(&report));
    if let Some(id) = backup_id {
        output.push_str(&formatter.format_backup_hint(&id));
    }
    output.push_str(&formatter.format_success());

    Ok(output)
}
