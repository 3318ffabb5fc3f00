use crate::backup_manager::BackupMetadata;
use crate::file_processor::{ApplyReport, ChangeType, FileDiff};
use colored::*;
use std::io::IsTerminal;

/// Printed after every run, whether or not anything matched.
pub const SUCCESS_MESSAGE: &str = "Código órfão removido com sucesso!";

pub struct DiffFormatter {
    use_color: bool,
}

impl DiffFormatter {
    /// `color_enabled` comes from the config; NO_COLOR and a non-terminal
    /// stdout switch colors off regardless.
    pub fn new(color_enabled: bool) -> Self {
        Self {
            use_color: color_enabled && Self::should_use_color(),
        }
    }

    pub fn plain() -> Self {
        Self { use_color: false }
    }

    // https://no-color.org/
    fn should_use_color() -> bool {
        if std::env::var_os("NO_COLOR").is_some() {
            return false;
        }
        std::io::stdout().is_terminal()
    }

    pub fn format_dry_run_header(&self, pattern: &str) -> String {
        if self.use_color {
            format!("{} {}\n\n", "Dry run:".bold().cyan(), pattern.white().bold())
        } else {
            format!("Dry run: {}\n\n", pattern)
        }
    }

    /// Removed lines with `context_size` lines around each block
    pub fn format_diff_with_context(&self, diff: &FileDiff, context_size: usize) -> String {
        let mut output = String::new();

        if self.use_color {
            output.push_str(&format!("{}\n", diff.file_path.bold().cyan()));
        } else {
            output.push_str(&format!("{}\n", diff.file_path));
        }

        if diff.is_empty() {
            output.push_str("No block matched the pattern.\n");
            return output;
        }

        for (line_num, content, change_type) in Self::filter_lines_with_context(&diff.all_lines, context_size) {
            if content == "..." && line_num == 0 {
                if self.use_color {
                    output.push_str(&format!("{}\n", "...".dimmed()));
                } else {
                    output.push_str("...\n");
                }
                continue;
            }

            let indicator = match change_type {
                ChangeType::Unchanged => "=",
                ChangeType::Deleted => "-",
                ChangeType::Added => "+",
            };

            if self.use_color {
                let colored_line = match change_type {
                    ChangeType::Unchanged => format!("L{}: {} {}\n", line_num, indicator.dimmed(), content.dimmed()),
                    ChangeType::Deleted => format!("L{}: {} {}\n", line_num, indicator.red().bold(), content.red()),
                    ChangeType::Added => format!("L{}: {} {}\n", line_num, indicator.green().bold(), content.green().bold()),
                };
                output.push_str(&colored_line);
            } else {
                output.push_str(&format!("L{}: {} {}\n", line_num, indicator, content));
            }
        }

        let blocks = diff.blocks.len();
        let deleted = diff.changes.iter().filter(|c| c.change_type == ChangeType::Deleted).count();
        let summary = format!(
            "\nTotal: {} block{} ({} line{} removed)\n",
            blocks,
            if blocks == 1 { "" } else { "s" },
            deleted,
            if deleted == 1 { "" } else { "s" }
        );
        if self.use_color {
            output.push_str(&summary.bold().to_string());
        } else {
            output.push_str(&summary);
        }

        output
    }

    /// Changed lines plus context, with "..." between distant groups
    fn filter_lines_with_context(
        lines: &[(usize, String, ChangeType)],
        context_size: usize,
    ) -> Vec<(usize, String, ChangeType)> {
        if context_size == 0 {
            return lines.iter()
                .filter(|(_, _, ct)| *ct != ChangeType::Unchanged)
                .cloned()
                .collect();
        }

        let changed_indices: Vec<usize> = lines.iter()
            .enumerate()
            .filter(|(_, (_, _, ct))| *ct != ChangeType::Unchanged)
            .map(|(i, _)| i)
            .collect();

        let Some((&first, rest)) = changed_indices.split_first() else {
            return Vec::new();
        };

        // Changes within (context_size * 2 + 1) lines share one window
        let group_threshold = context_size * 2 + 1;
        let mut groups: Vec<(usize, usize)> = vec![(first, first)];
        for &idx in rest {
            match groups.last_mut() {
                Some(group) if idx - group.1 <= group_threshold => group.1 = idx,
                _ => groups.push((idx, idx)),
            }
        }

        let mut result = Vec::new();
        let mut last_end: Option<usize> = None;

        for (group_start, group_end) in groups {
            let mut start = group_start.saturating_sub(context_size);
            let end = (group_end + context_size + 1).min(lines.len());

            if let Some(prev_end) = last_end {
                if start > prev_end {
                    result.push((0, "...".to_string(), ChangeType::Unchanged));
                }
                start = start.max(prev_end);
            }

            result.extend(lines[start..end].iter().cloned());
            last_end = Some(end);
        }

        result
    }

    /// Short line per rewritten file, shown before the success message
    pub fn format_apply_report(&self, report: &ApplyReport) -> String {
        if !report.written {
            return String::new();
        }
        let line = format!(
            "{}: {} block{} removed ({} bytes)\n",
            report.file_path.display(),
            report.blocks_removed,
            if report.blocks_removed == 1 { "" } else { "s" },
            report.bytes_removed
        );
        if self.use_color { line.cyan().to_string() } else { line }
    }

    pub fn format_backup_hint(&self, backup_id: &str) -> String {
        if self.use_color {
            format!(
                "{} {}\n{} {}\n",
                "Backup ID:".white(),
                backup_id.yellow().bold(),
                "Rollback with:".white(),
                format!("excise rollback {}", backup_id).bold().yellow()
            )
        } else {
            format!(
                "Backup ID: {}\nRollback with: excise rollback {}\n",
                backup_id, backup_id
            )
        }
    }

    pub fn format_success(&self) -> String {
        if self.use_color {
            format!("{}\n", SUCCESS_MESSAGE.green().bold())
        } else {
            format!("{}\n", SUCCESS_MESSAGE)
        }
    }

    pub fn format_history(&self, backups: &[BackupMetadata]) -> String {
        let mut output = String::new();

        if backups.is_empty() {
            output.push_str("No backup history found.\n");
            return output;
        }

        if self.use_color {
            output.push_str(&"Operation History:\n\n".bold().white().to_string());
        } else {
            output.push_str("Operation History:\n\n");
        }

        // Most recent first
        for backup in backups.iter().rev() {
            let id = if self.use_color { backup.id.yellow().to_string() } else { backup.id.clone() };
            let pattern = if self.use_color { backup.pattern.cyan().to_string() } else { backup.pattern.clone() };

            output.push_str(&format!("ID: {}\n", id));
            output.push_str(&format!("  Time: {}\n", backup.timestamp.format("%Y-%m-%d %H:%M:%S")));
            output.push_str(&format!("  Pattern: {}\n", pattern));
            output.push_str(&format!("  File: {}\n", backup.file.original_path.display()));
            output.push('\n');
        }

        output
    }
}
