use std::path::PathBuf;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_log::LogTracer;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level for the application (default: WARN)
    pub level: Level,
    /// Whether to use json format for logs (default: false)
    pub json_format: bool,
    /// Path to store log files. If None, logs only go to stderr
    pub log_dir: Option<String>,
    /// Whether to colorize logs when output is a terminal (default: true)
    pub colorize: bool,
    /// Log file name to use if log_dir is specified (default: "think-segmenter")
    pub log_file_name: String,
    /// Log targets to filter (default: "think_segmenter")
    pub log_targets: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            json_format: false,
            log_dir: None,
            colorize: true,
            log_file_name: "think-segmenter".to_string(),
            log_targets: vec!["think_segmenter".to_string()],
        }
    }
}

/// Guard that keeps the file appender worker thread alive
///
/// Must stay in scope for the duration of the program so buffered log
/// lines are flushed to the file.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Build the `<target>=<level>,...` filter directive for `config`
pub fn filter_directive(config: &LoggingConfig) -> String {
    let level = config.level.as_str().to_lowercase();
    if config.log_targets.is_empty() {
        return level;
    }
    config
        .log_targets
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the logging system with the given configuration
///
/// `RUST_LOG` takes precedence over the configured level and targets.
/// Initialization errors (for example a subscriber that is already set) are
/// ignored so this can be called more than once.
pub fn init_logging(config: LoggingConfig) -> LogGuard {
    // Forward `log` records to tracing
    let _ = LogTracer::init();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(&config)));

    let mut layers = Vec::new();

    // Standard timestamp format: YYYY-MM-DD HH:MM:SS
    let time_format = "%Y-%m-%d %H:%M:%S".to_string();

    // Segments go to stdout, so console logs go to stderr
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(config.colorize)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::new(time_format.clone()));

    let console_layer = if config.json_format {
        console_layer.json().flatten_event(true).boxed()
    } else {
        console_layer.boxed()
    };

    layers.push(console_layer);

    let mut file_guard = None;

    if let Some(log_dir) = &config.log_dir {
        let log_dir = PathBuf::from(log_dir);

        if !log_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(&log_dir) {
                eprintln!("Failed to create log directory: {}", e);
                return LogGuard { _file_guard: None };
            }
        }

        let file_appender =
            RollingFileAppender::new(Rotation::DAILY, log_dir, config.log_file_name.clone());

        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        file_guard = Some(guard);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::new(time_format))
            .with_writer(non_blocking);

        let file_layer = if config.json_format {
            file_layer.json().flatten_event(true).boxed()
        } else {
            file_layer.boxed()
        };

        layers.push(file_layer);
    }

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init();

    LogGuard {
        _file_guard: file_guard,
    }
}
