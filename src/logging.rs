//! Logging configuration and subscriber setup.
//!
//! Diagnostics go to stdout as plain text lines by default. `RUST_LOG`
//! overrides both the config file level and `-v`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Log severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Raise verbosity by `steps` levels, saturating at `trace`.
    pub fn raised(self, steps: u8) -> Self {
        let mut level = self;
        for _ in 0..steps {
            level = match level {
                Self::Error => Self::Warn,
                Self::Warn => Self::Info,
                Self::Info => Self::Debug,
                Self::Debug | Self::Trace => Self::Trace,
            };
        }
        level
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log format
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            level: default_log_level(),
        }
    }
}

/// Install the global subscriber.
///
/// `verbose` is the `-v` count; `format_override` is `--log-format`.
/// Calling this twice is harmless: the second install is ignored.
pub fn init_logging(config: &LoggingConfig, verbose: u8, format_override: Option<LogFormat>) {
    use std::io::IsTerminal;
    use tracing_subscriber::{fmt, EnvFilter};

    let level = config.level.raised(verbose);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mimir_sync={}", level)));

    match format_override.unwrap_or(config.format) {
        LogFormat::Text => {
            let _ = fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(std::io::stdout().is_terminal())
                .with_writer(std::io::stdout)
                .try_init();
        }
        LogFormat::Json => {
            let _ = fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stdout)
                .try_init();
        }
    }
}
