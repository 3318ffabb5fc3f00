//! excise: remove a dead code block from a source file
//!
//! The library exposes the excision pipeline for the binary and for the
//! property tests. The binary is at src/main.rs.

pub mod backup_manager;
pub mod cli;
pub mod config;
pub mod diff_formatter;
pub mod error_helpers;
pub mod excision;
pub mod file_processor;
pub mod logger;
pub mod regex_error;
pub mod run;

// Re-export commonly used types for convenience
pub use backup_manager::{BackupManager, BackupMetadata, FileBackup};
pub use diff_formatter::{DiffFormatter, SUCCESS_MESSAGE};
pub use excision::{Excision, ExcisionOutcome, RemovedBlock, DEFAULT_PATTERN, DEFAULT_TARGET};
pub use file_processor::{ApplyReport, ChangeType, FileDiff, FileProcessor, LineChange};
pub use run::ExciseRequest;
