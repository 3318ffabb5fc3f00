use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "excise")]
#[command(about = "Remove a dead code block from a source file")]
#[command(long_about = "excise deletes a multi-line block of code matched by a regular expression
and writes the file back in place.

With no arguments it removes the orphaned
  if (nearbyFish && user) { ... } else { ... setShowMinigame(true); }
block from src/components/Screens/FishingScreenModular.tsx. The pattern is
matched with '.' spanning newlines, and every match is removed.

A snapshot of the file is taken before it is rewritten, so any run can be
undone with 'excise rollback'.

EXAMPLES:
  excise                                  Remove the default block
  excise --dry-run                        Preview what would be removed
  excise src/App.tsx                      Same pattern, different file
  excise -p '\\s*// legacy:.*?// end' f.ts Remove a custom block
  excise rollback                         Undo the last run")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
struct Cli {
    /// File to rewrite (default: [target] file from the config)
    #[arg(value_name = "FILE")]
    file: Option<String>,

    /// Pattern of the block to remove
    #[arg(short, long, value_name = "REGEX")]
    pattern: Option<String>,

    /// Text that replaces each match (default: empty)
    #[arg(short, long, value_name = "TEXT")]
    replacement: Option<String>,

    /// Expand $1 / ${name} capture references in the replacement
    #[arg(long)]
    expand: bool,

    /// Preview the removal without modifying the file
    #[arg(short = 'd', long)]
    dry_run: bool,

    /// Number of context lines to show around removed blocks
    #[arg(short = 'n', long, value_name = "NUM")]
    context: Option<usize>,

    /// Show only removed lines
    #[arg(long = "no-context", conflicts_with = "context")]
    no_context: bool,

    /// Skip the snapshot (requires --force)
    #[arg(long = "no-backup", requires = "force")]
    no_backup: bool,

    /// Confirm --no-backup
    #[arg(long = "force", requires = "no_backup")]
    force: bool,

    /// Custom backup directory (default: ~/.excise/backups/)
    #[arg(long, value_name = "DIR")]
    backup_dir: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Restore the file from a snapshot
    #[command(long_about = "Restore a file from a snapshot.

If no backup ID is given, the most recent run is rolled back.
Use 'excise history' to see all available snapshots.")]
    Rollback {
        /// Backup ID (defaults to the last run)
        #[arg(value_name = "ID")]
        id: Option<String>,

        #[arg(long, value_name = "DIR")]
        backup_dir: Option<String>,
    },

    /// Show previous runs
    History {
        #[arg(long, value_name = "DIR")]
        backup_dir: Option<String>,
    },

    /// Show the configuration
    Config {
        /// Print the effective configuration
        #[arg(long = "show")]
        show: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Args {
    Excise {
        file: Option<String>,
        pattern: Option<String>,
        replacement: Option<String>,
        expand: bool,
        dry_run: bool,
        context: Option<usize>,
        no_backup: bool,
        backup_dir: Option<String>,
    },
    Rollback {
        id: Option<String>,
        backup_dir: Option<String>,
    },
    History {
        backup_dir: Option<String>,
    },
    Config {
        show: bool,
    },
}

pub fn parse_args() -> Result<Args> {
    Ok(into_args(Cli::parse()))
}

pub fn parse_from<I, T>(itr: I) -> Result<Args>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Ok(into_args(Cli::try_parse_from(itr)?))
}

fn into_args(cli: Cli) -> Args {
    match cli.command {
        Some(Commands::Rollback { id, backup_dir }) => Args::Rollback {
            id,
            backup_dir: backup_dir.or(cli.backup_dir),
        },
        Some(Commands::History { backup_dir }) => Args::History {
            backup_dir: backup_dir.or(cli.backup_dir),
        },
        Some(Commands::Config { show }) => Args::Config { show },
        None => {
            // None here means "use the config value"
            let context = if cli.no_context { Some(0) } else { cli.context };

            Args::Excise {
                file: cli.file,
                pattern: cli.pattern,
                replacement: cli.replacement,
                expand: cli.expand,
                dry_run: cli.dry_run,
                context,
                no_backup: cli.no_backup,
                backup_dir: cli.backup_dir,
            }
        }
    }
}
