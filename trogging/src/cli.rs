//! `clap`-derived flags shared by every `czar run ...` subcommand.

use crate::{init, Error, LogFormat};

/// Logging-related CLI flags, `#[clap(flatten)]`-ed into each subcommand's
/// config struct (mirrors the teacher's per-subcommand `run_config` idiom).
#[derive(Debug, Clone, clap::Parser)]
pub struct LoggingConfig {
    /// Log message format.
    #[clap(
        long = "log-format",
        env = "CZAR_LOG_FORMAT",
        default_value = "logfmt",
        arg_enum
    )]
    pub log_format: LogFormatArg,

    /// Logs filter directives, using `tracing_subscriber::EnvFilter` syntax,
    /// e.g. `debug,czar_qdisp=trace`. Falls back to `info` when empty.
    #[clap(long = "log-filter", env = "CZAR_LOG_FILTER", default_value = "")]
    pub log_filter: String,

    /// Increase log verbosity; repeatable (`-vv`). Each occurrence lowers
    /// the effective default level by one step.
    #[clap(short, long, parse(from_occurrences))]
    pub verbose_count: u8,
}

/// `clap::ArgEnum` mirror of [`LogFormat`] (kept distinct so the public
/// `LogFormat` enum stays clap-independent for non-CLI callers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ArgEnum)]
pub enum LogFormatArg {
    /// See [`LogFormat::Logfmt`].
    Logfmt,
    /// See [`LogFormat::Json`].
    Json,
}

impl LoggingConfig {
    /// Resolve the effective filter directive string, applying `-v` as a
    /// coarse override when no explicit `--log-filter` was given.
    pub fn resolved_filter(&self) -> String {
        if !self.log_filter.is_empty() {
            return self.log_filter.clone();
        }
        match self.verbose_count {
            0 => "info".to_string(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    }

    /// Install the global subscriber described by this configuration.
    pub fn install(&self) -> Result<(), Error> {
        let format = match self.log_format {
            LogFormatArg::Logfmt => LogFormat::Logfmt,
            LogFormatArg::Json => LogFormat::Json,
        };
        init(format, &self.resolved_filter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_count_escalates_default_level() {
        let cfg = LoggingConfig {
            log_format: LogFormatArg::Logfmt,
            log_filter: String::new(),
            verbose_count: 0,
        };
        assert_eq!(cfg.resolved_filter(), "info");

        let cfg = LoggingConfig {
            verbose_count: 2,
            ..cfg
        };
        assert_eq!(cfg.resolved_filter(), "trace");
    }

    #[test]
    fn explicit_filter_wins_over_verbose_count() {
        let cfg = LoggingConfig {
            log_format: LogFormatArg::Logfmt,
            log_filter: "warn".to_string(),
            verbose_count: 2,
        };
        assert_eq!(cfg.resolved_filter(), "warn");
    }
}
