//! Logger initialization.
//!
//! Everything logs through the `log` facade. While the terminal monitor owns
//! the screen, records go to a file instead of stderr.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Once;

use anyhow::{Context, Result};

/// Log file used while the monitor is drawing.
pub const DEFAULT_LOG_FILE: &str = "painter_error.log";

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "pixel_painter=debug"). When absent, `RUST_LOG` is consulted, then "info".
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
    /// Append records here instead of writing to stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
            log_file: None,
        }
    }
}

impl LoggingConfig {
    /// Filter for `-v` repetitions, unless an explicit filter wins.
    pub fn verbosity(verbose: u8) -> Option<String> {
        match verbose {
            0 => None,
            1 => Some("debug".into()),
            _ => Some("trace".into()),
        }
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once; later calls are ignored.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let target = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(env_logger::Target::Pipe(Box::new(file)))
        }
        None => None,
    };

    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = &config.env_filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
        }

        match target {
            Some(target) => {
                builder.target(target);
                builder.write_style(env_logger::WriteStyle::Never);
            }
            None => {
                builder.write_style(config.write_style);
            }
        }

        // Another logger may already be installed (e.g. by a test harness).
        let _ = builder.try_init();

        log::debug!("logging initialized");
    });
    Ok(())
}
