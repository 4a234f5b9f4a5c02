use std::path::PathBuf;

use clap::{Parser, Subcommand};
use course_core::model::{LanguageCode, LessonId};

use crate::logging::LogFormat;

#[derive(Parser, Debug)]
#[command(name = "course")]
#[command(about = "Inspect and drive vocabulary course progress", long_about = None)]
pub struct Cli {
    /// SQLite database URL or path
    #[arg(long, global = true, env = "COURSE_DB_URL", default_value = "sqlite://course.sqlite3")]
    pub db: String,

    /// Course configuration (TOML); built-in defaults when omitted
    #[arg(long, global = true, env = "COURSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format: text, json or pretty
    #[arg(long, global = true, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show progress and tile states for a language
    Status {
        #[arg(long)]
        lang: LanguageCode,
    },
    /// Ask whether a lesson tile can be opened
    Open {
        #[arg(long)]
        lang: LanguageCode,
        #[arg(long)]
        lesson: LessonId,
    },
    /// Record a lesson as completed
    Complete {
        #[arg(long)]
        lang: LanguageCode,
        #[arg(long)]
        lesson: LessonId,
    },
    /// Walk through a lesson on virtual time
    Play {
        #[arg(long)]
        lang: LanguageCode,
        #[arg(long)]
        lesson: LessonId,
        /// Lesson catalog (JSON)
        #[arg(long, env = "COURSE_CATALOG")]
        catalog: PathBuf,
    },
    /// Select a language: show where it leads and play due home narrations
    Enter {
        #[arg(long)]
        lang: LanguageCode,
    },
    /// Walk through the onboarding quiz on virtual time
    Quiz {
        #[arg(long)]
        lang: LanguageCode,
        /// Option index per question, comma-separated; the first option otherwise
        #[arg(long, value_delimiter = ',')]
        answers: Vec<usize>,
    },
}
