//! Log output setup: one JSON object per line, or plain text.

use env_logger::{Builder, Env, Target};
use log::{LevelFilter, Record};
use std::io::Write;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Output format of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    /// Anything other than `text` means JSON.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("text") {
            LogFormat::Text
        } else {
            LogFormat::Json
        }
    }
}

/// Map a level name (including `WARNING` and `CRITICAL`) to a filter.
pub fn parse_level(value: &str) -> LevelFilter {
    match value.trim().to_ascii_uppercase().as_str() {
        "TRACE" => LevelFilter::Trace,
        "DEBUG" => LevelFilter::Debug,
        "WARN" | "WARNING" => LevelFilter::Warn,
        "ERROR" | "CRITICAL" => LevelFilter::Error,
        "OFF" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

/// Install the global logger. `RUST_LOG`, when set, refines the level.
pub fn init(level: &str, format: &str) {
    let mut builder = Builder::new();
    builder
        .filter_level(parse_level(level))
        .parse_env(Env::default())
        .target(Target::Stdout);

    match LogFormat::parse(format) {
        LogFormat::Json => builder.format(|buf, record| {
            writeln!(buf, "{}", json_line(&timestamp(), record))
        }),
        LogFormat::Text => builder.format(|buf, record| {
            writeln!(buf, "{}", text_line(&timestamp(), record))
        }),
    };

    // A logger may already be installed (tests, embedding)
    let _ = builder.try_init();
}

fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

fn json_line(timestamp: &str, record: &Record) -> String {
    serde_json::json!({
        "timestamp": timestamp,
        "level": record.level().as_str(),
        "logger": record.target(),
        "message": record.args().to_string(),
    })
    .to_string()
}

fn text_line(timestamp: &str, record: &Record) -> String {
    format!(
        "{} - {} - {} - {}",
        timestamp,
        record.target(),
        record.level(),
        record.args()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn test_level_names() {
        assert_eq!(parse_level("INFO"), LevelFilter::Info);
        assert_eq!(parse_level("warning"), LevelFilter::Warn);
        assert_eq!(parse_level("CRITICAL"), LevelFilter::Error);
        assert_eq!(parse_level("nonsense"), LevelFilter::Info);
    }

    #[test]
    fn test_format_names() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("TEXT"), LogFormat::Text);
        assert_eq!(LogFormat::parse(""), LogFormat::Json);
    }

    #[test]
    fn test_json_line_escapes_message() {
        let line = json_line(
            "2025-01-01 00:00:00",
            &Record::builder()
                .args(format_args!("said \"hi\""))
                .level(Level::Warn)
                .target("deck_server::api")
                .build(),
        );

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["level"], "WARN");
        assert_eq!(value["logger"], "deck_server::api");
        assert_eq!(value["message"], "said \"hi\"");
        assert_eq!(value["timestamp"], "2025-01-01 00:00:00");
    }

    #[test]
    fn test_text_line() {
        let line = text_line(
            "2025-01-01 00:00:00",
            &Record::builder()
                .args(format_args!("ready"))
                .level(Level::Info)
                .target("deck_server")
                .build(),
        );
        assert_eq!(line, "2025-01-01 00:00:00 - deck_server - INFO - ready");
    }
}
