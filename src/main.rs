use anyhow::Result;
use excise::cli::{parse_args, Args};
use excise::config::{self, Config};
use excise::run::{self, ExciseRequest};
use excise::{logger, DiffFormatter};
use std::path::PathBuf;

fn main() -> Result<()> {
    let args = parse_args()?;
    let config = config::load_config()?;
    let _log = logger::init_debug_logging(config.logging.debug, &config::config_dir()?)?;

    match args {
        Args::Excise {
            file,
            pattern,
            replacement,
            expand,
            dry_run,
            context,
            no_backup,
            backup_dir,
        } => {
            let mut request = ExciseRequest::from_config(&config);
            if let Some(file) = file {
                request.file = PathBuf::from(file);
            }
            if let Some(pattern) = pattern {
                request.pattern = pattern;
            }
            if let Some(replacement) = replacement {
                request.replacement = replacement;
            }
            if let Some(context) = context {
                request.context = context;
            }
            request.expand = expand;
            request.dry_run = dry_run;
            request.no_backup = no_backup;
            request.backup_dir = backup_dir;

            print!("{}", run::execute(&request, &config)?);
        }
        Args::Rollback { id, backup_dir } => {
            rollback(id, backup_dir, &config)?;
        }
        Args::History { backup_dir } => {
            show_history(backup_dir, &config)?;
        }
        Args::Config { show } => {
            println!("{}", config::config_file_path()?.display());
            if show {
                println!();
                print!("{}", config::show_config(&config)?);
            }
        }
    }

    Ok(())
}

fn rollback(id: Option<String>, backup_dir: Option<String>, config: &Config) -> Result<()> {
    let manager = run::backup_manager(backup_dir, config)?;

    let backup_id = match id {
        Some(id) => id,
        None => match manager.get_last_backup_id()? {
            Some(id) => {
                println!("Rolling back last operation: {}\n", id);
                id
            }
            None => anyhow::bail!("No backups found to rollback"),
        },
    };

    let restored = manager.restore_backup(&backup_id)?;
    println!("Restored: {}", restored.display());
    println!("Rollback complete");

    Ok(())
}

fn show_history(backup_dir: Option<String>, config: &Config) -> Result<()> {
    let manager = run::backup_manager(backup_dir, config)?;
    let backups = manager.list_backups()?;

    let formatter = DiffFormatter::new(config.output.color);
    print!("{}", formatter.format_history(&backups));

    Ok(())
}
