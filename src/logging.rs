//! Logging setup for the `storyreel` binary.
//!
//! Logs go to stderr so that frame output on stdout stays clean. `RUST_LOG`
//! wins over the level chosen on the command line.

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Log level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    /// Default: only recovered faults and refused requests are shown.
    #[default]
    Warn,
    Error,
    /// Disable logging entirely
    Off,
}

impl LogLevel {
    /// Filter directive for this level.
    pub fn directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Off => "off",
        }
    }
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            // Off is handled by the filter directive.
            LogLevel::Error | LogLevel::Off => Level::ERROR,
        }
    }
}

impl From<u8> for LogLevel {
    /// Map a `-v` count: 0 = warn, 1 = info, 2 = debug, 3+ = trace.
    fn from(verbosity: u8) -> Self {
        match verbosity {
            0 => LogLevel::Warn,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

/// Subscriber settings.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub with_timestamps: bool,
    /// Include the module path of each event.
    pub with_target: bool,
    pub with_ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            with_timestamps: false,
            with_target: true,
            with_ansi: true,
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.with_timestamps = enabled;
        self
    }

    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    pub fn with_ansi(mut self, enabled: bool) -> Self {
        self.with_ansi = enabled;
        self
    }

    /// Build from CLI flags; `quiet` keeps errors only.
    pub fn from_flags(verbosity: u8, quiet: bool) -> Self {
        let level = if quiet {
            LogLevel::Error
        } else {
            LogLevel::from(verbosity)
        };
        Self::default()
            .with_level(level)
            .with_timestamps(verbosity >= 2)
    }
}

/// Install the global subscriber.
///
/// Returns an error if a subscriber is already installed, which callers
/// that may initialise twice (tests) can ignore.
///
/// # Examples
///
/// ```no_run
/// use storyreel::logging::{init_logging, LogLevel, LoggingConfig};
///
/// init_logging(LoggingConfig::new().with_level(LogLevel::Debug)).ok();
/// ```
pub fn init_logging(
    config: LoggingConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(config.level.directive())
    };

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(config.with_target)
        .with_ansi(config.with_ansi);

    if config.with_timestamps {
        subscriber.try_init()
    } else {
        subscriber.without_time().try_init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_verbosity() {
        assert_eq!(LogLevel::from(0), LogLevel::Warn);
        assert_eq!(LogLevel::from(1), LogLevel::Info);
        assert_eq!(LogLevel::from(2), LogLevel::Debug);
        assert_eq!(LogLevel::from(9), LogLevel::Trace);
    }

    #[test]
    fn test_from_flags() {
        let quiet = LoggingConfig::from_flags(3, true);
        assert_eq!(quiet.level, LogLevel::Error);

        let verbose = LoggingConfig::from_flags(2, false);
        assert_eq!(verbose.level, LogLevel::Debug);
        assert!(verbose.with_timestamps);

        let default = LoggingConfig::from_flags(0, false);
        assert_eq!(default.level, LogLevel::Warn);
        assert!(!default.with_timestamps);
    }

    #[test]
    fn test_builder() {
        let config = LoggingConfig::new()
            .with_level(LogLevel::Off)
            .with_target(false)
            .with_ansi(false);
        assert_eq!(config.level.directive(), "off");
        assert!(!config.with_target);
        assert!(!config.with_ansi);
    }

    #[test]
    fn test_level_conversion() {
        assert_eq!(Level::from(LogLevel::Debug), Level::DEBUG);
        assert_eq!(Level::from(LogLevel::Off), Level::ERROR);
    }

    #[test]
    fn test_second_init_is_an_error_not_a_panic() {
        let _ = init_logging(LoggingConfig::new().with_level(LogLevel::Off));
        assert!(init_logging(LoggingConfig::new().with_level(LogLevel::Off)).is_err());
    }
}
