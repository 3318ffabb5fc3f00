use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error_helpers::{is_permission_denied, permission_error};

pub const DEFAULT_MAX_BACKUPS: usize = 50;

const METADATA_FILE: &str = "operation.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupMetadata {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Pattern of the excision the snapshot was taken for
    pub pattern: String,
    pub file: FileBackup,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileBackup {
    pub original_path: PathBuf,
    pub backup_path: PathBuf,
    pub size: u64,
}

pub struct BackupManager {
    backups_dir: PathBuf,
    max_backups: usize,
}

impl BackupManager {
    /// Backups under `~/.excise/backups`
    pub fn new() -> Result<Self> {
        let home_dir =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
        Self::with_directory(home_dir.join(".excise").join("backups"))
    }

    pub fn with_directory(dir: impl Into<PathBuf>) -> Result<Self> {
        let backups_dir = dir.into();

        fs::create_dir_all(&backups_dir).map_err(|e| {
            if is_permission_denied(&e) {
                anyhow::anyhow!(permission_error(&backups_dir, "creating backups directory"))
            } else {
                anyhow::Error::new(e).context(format!(
                    "Failed to create backups directory: {}",
                    backups_dir.display()
                ))
            }
        })?;

        Ok(Self {
            backups_dir,
            max_backups: DEFAULT_MAX_BACKUPS,
        })
    }

    pub fn with_max_backups(mut self, max_backups: usize) -> Self {
        self.max_backups = max_backups.max(1);
        self
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Snapshot `file_path` before it is rewritten. Returns the backup id.
    pub fn create_backup(&self, pattern: &str, file_path: &Path) -> Result<String> {
        let original_path = fs::canonicalize(file_path)
            .with_context(|| format!("Failed to resolve path: {}", file_path.display()))?;

        // Millisecond precision keeps ids sortable
        let id = format!(
            "{}-{}",
            Utc::now().format("%Y%m%d-%H%M%S%3f"),
            Uuid::new_v4().to_string().split_at(8).0
        );
        let backup_dir = self.backups_dir.join(&id);

        fs::create_dir_all(&backup_dir).with_context(|| {
            format!(
                "Failed to create backup directory: {}",
                backup_dir.display()
            )
        })?;

        let file_name = original_path
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", file_path.display()))?;
        let backup_path = backup_dir.join(file_name);

        let size = fs::copy(&original_path, &backup_path)
            .with_context(|| format!("Failed to backup file: {}", file_path.display()))?;

        let metadata = BackupMetadata {
            id: id.clone(),
            timestamp: Utc::now(),
            pattern: pattern.to_string(),
            file: FileBackup {
                original_path,
                backup_path,
                size,
            },
        };

        let metadata_path = backup_dir.join(METADATA_FILE);
        let metadata_json =
            serde_json::to_string_pretty(&metadata).context("Failed to serialize metadata")?;

        fs::write(&metadata_path, metadata_json)
            .with_context(|| format!("Failed to write metadata: {}", metadata_path.display()))?;

        info!(id = %id, file = %file_path.display(), bytes = size, "created backup");

        self.cleanup_old_backups()?;

        Ok(id)
    }

    fn load_metadata(&self, id: &str) -> Result<BackupMetadata> {
        let backup_dir = self.backups_dir.join(id);
        if !backup_dir.exists() {
            anyhow::bail!("Backup not found: {}", id);
        }

        let metadata_path = backup_dir.join(METADATA_FILE);
        let metadata_json = fs::read_to_string(&metadata_path)
            .with_context(|| format!("Failed to read metadata: {}", metadata_path.display()))?;

        Self::parse_backup_metadata(&metadata_json)
    }

    pub fn parse_backup_metadata(json: &str) -> Result<BackupMetadata> {
        serde_json::from_str(json).context("Failed to parse backup metadata")
    }

    /// Copy the snapshot back over the original and drop the backup.
    /// Returns the restored path.
    pub fn restore_backup(&self, id: &str) -> Result<PathBuf> {
        let metadata = self.load_metadata(id)?;
        let file = &metadata.file;

        if !file.backup_path.exists() {
            anyhow::bail!(
                "Backup {} is damaged: snapshot missing at {}",
                id,
                file.backup_path.display()
            );
        }

        fs::copy(&file.backup_path, &file.original_path).with_context(|| {
            format!("Failed to restore file: {}", file.original_path.display())
        })?;

        self.remove_backup(id)?;
        info!(id = %id, file = %file.original_path.display(), "restored backup");

        Ok(file.original_path.clone())
    }

    pub fn remove_backup(&self, id: &str) -> Result<()> {
        let backup_dir = self.backups_dir.join(id);
        fs::remove_dir_all(&backup_dir)
            .with_context(|| format!("Failed to remove backup: {}", backup_dir.display()))
    }

    pub fn get_last_backup_id(&self) -> Result<Option<String>> {
        Ok(self.list_backups()?.last().map(|b| b.id.clone()))
    }

    /// All readable backups, oldest first
    pub fn list_backups(&self) -> Result<Vec<BackupMetadata>> {
        let mut backups = Vec::new();

        for entry in fs::read_dir(&self.backups_dir).with_context(|| {
            format!(
                "Failed to read backups directory: {}",
                self.backups_dir.display()
            )
        })? {
            let entry = entry?;
            let metadata_path = entry.path().join(METADATA_FILE);

            if !metadata_path.exists() {
                continue;
            }

            let metadata_json = fs::read_to_string(&metadata_path)?;
            match Self::parse_backup_metadata(&metadata_json) {
                Ok(metadata) => backups.push(metadata),
                Err(e) => debug!(path = %metadata_path.display(), error = %e, "skipping unreadable backup"),
            }
        }

        // Equal timestamps fall back to id order
        backups.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(backups)
    }

    /// Keep only the `keep_count` most recent backups; returns how many were removed
    pub fn prune_backups(&self, keep_count: usize) -> Result<usize> {
        let backups = self.list_backups()?;
        if backups.len() <= keep_count {
            return Ok(0);
        }

        let to_remove = backups.len() - keep_count;
        for backup in backups.iter().take(to_remove) {
            self.remove_backup(&backup.id)?;
        }

        Ok(to_remove)
    }

    fn cleanup_old_backups(&self) -> Result<()> {
        let removed = self.prune_backups(self.max_backups)?;
        if removed > 0 {
            debug!(removed, "pruned old backups");
        }
        Ok(())
    }
}
