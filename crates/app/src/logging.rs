//! Subscriber setup for the `course` binary.
//!
//! The filter comes from `COURSE_LOG` when set, otherwise from `--verbose`
//! (`debug`) or the default level (`warn`).

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "COURSE_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Plain text without colors, for piping.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
    /// Multi-line, colored output for development.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!(
                "invalid log format '{s}', expected one of: text, json, pretty"
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
            LogFormat::Pretty => write!(f, "pretty"),
        }
    }
}

pub struct LoggingConfig {
    pub format: LogFormat,
    pub verbose: bool,
}

impl LoggingConfig {
    #[must_use]
    pub fn new(format: LogFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    fn filter(&self) -> EnvFilter {
        let fallback = if self.verbose { "debug" } else { "warn" };
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback))
    }

    /// Installs the global subscriber. Call once, before any command runs.
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed.
    pub fn init(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let filter = self.filter();
        match self.format {
            LogFormat::Json => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .flatten_event(true)
                .with_target(true)
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .try_init(),
            LogFormat::Text => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .try_init(),
        }
    }
}
