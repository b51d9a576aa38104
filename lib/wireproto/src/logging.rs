//! Structured logging init (§11.1). Builds a `slog::Logger` through
//! `sloggers`' `Config`/`LoggerConfig`, the same indirection the
//! reference logging module uses, so the concrete drain (terminal for
//! interactive runs, JSON for production) is a configuration choice
//! rather than a call-site one. Every long-lived component then derives
//! its own child logger with `log.new(o!("component" => ..))` so log
//! lines carry their originating subsystem.

use slog::o;
use sloggers::types::Severity;
use sloggers::{Config, LoggerConfig};

/// Builds the terminal-formatted drain used for interactive runs, at the
/// given minimum severity.
pub fn init_terminal(level: Severity) -> slog::Logger {
    let toml = format!(
        r#"
type = "terminal"
level = "{}"
destination = "stderr"
"#,
        severity_name(level)
    );
    build(&toml)
}

/// Builds the JSON drain selectable for production deployments.
pub fn init_json(level: Severity) -> slog::Logger {
    let toml = format!(
        r#"
type = "file"
path = "/dev/stdout"
level = "{}"
"#,
        severity_name(level)
    );
    build(&toml)
}

fn build(toml: &str) -> slog::Logger {
    let config: LoggerConfig =
        serdeconv::from_toml_str(toml).expect("built-in logger config template is valid TOML");
    let logger = config
        .build_logger()
        .expect("built-in logger config always builds");
    logger.new(o!("crate" => "wireproto"))
}

fn severity_name(level: Severity) -> &'static str {
    match level {
        Severity::Trace => "trace",
        Severity::Debug => "debug",
        Severity::Info => "info",
        Severity::Warning => "warning",
        Severity::Error => "error",
        Severity::Critical => "critical",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slog::info;

    #[test]
    fn terminal_logger_builds_and_logs() {
        let log = init_terminal(Severity::Debug);
        info!(log, "logger smoke test"; "ok" => true);
    }
}
