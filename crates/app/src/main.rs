mod cli;
mod commands;
mod config;
mod logging;

use std::fmt;

use clap::Parser;
use services::AppServices;

use crate::cli::{Cli, Command};
use crate::config::load_config;
use crate::logging::LoggingConfig;

#[derive(Debug)]
enum ArgsError {
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn normalize_sqlite_url(raw: &str) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw.to_string();
    }

    let trimmed = raw.trim();
    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.db.trim().is_empty() {
        return Err(ArgsError::InvalidDbUrl { raw: cli.db }.into());
    }
    let db_url = normalize_sqlite_url(&cli.db);
    let config = load_config(cli.config.as_deref())?;

    // Open + migrate SQLite at startup; the library crates never touch the filesystem.
    prepare_sqlite_file(&db_url)?;
    let services = AppServices::new_sqlite(&db_url, config).await?;
    tracing::debug!(db = %db_url, "storage ready");

    match cli.command {
        Command::Status { lang } => commands::status(&services, &lang).await?,
        Command::Open { lang, lesson } => commands::open(&services, &lang, lesson).await?,
        Command::Complete { lang, lesson } => {
            commands::complete(&services, &lang, lesson).await?;
        }
        Command::Play {
            lang,
            lesson,
            catalog,
        } => commands::play(services.clone(), &lang, lesson, &catalog).await?,
        Command::Enter { lang } => commands::enter(&services, &lang).await?,
        Command::Quiz { lang, answers } => commands::quiz(&services, &lang, answers).await?,
    }

    if services.is_degraded() {
        eprintln!("warning: storage unavailable, progress from this run was not saved");
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = LoggingConfig::new(cli.log_format, cli.verbose).init() {
        eprintln!("cannot initialize logging: {err}");
    }

    if let Err(err) = run(cli).await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
