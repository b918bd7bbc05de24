use std::env;
use tracing_subscriber::EnvFilter;

const LOG_LEVEL: &str = "AWS_LAMBDA_LOG_LEVEL";
const LOG_FORMAT: &str = "AWS_LAMBDA_LOG_FORMAT";

/// Output format selected through Lambda's advanced logging controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Plain text lines.
    Text,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(raw) if raw.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// The filter directive in effect: Lambda's `AWS_LAMBDA_LOG_LEVEL`, then
/// `RUST_LOG`, then `info`.
fn directive(log_level: Option<String>, rust_log: Option<String>) -> String {
    log_level
        .filter(|level| !level.is_empty())
        .map(|level| level.to_lowercase())
        .or(rust_log.filter(|d| !d.is_empty()))
        .unwrap_or_else(|| String::from("info"))
}

/// Installs a global `tracing` subscriber writing to stdout, which Lambda
/// forwards to CloudWatch Logs. Timestamps and ANSI colors are left out since
/// CloudWatch adds its own and renders escapes literally.
///
/// Does nothing if a global subscriber is already set.
pub fn init_default_subscriber() {
    let filter = EnvFilter::try_new(directive(env::var(LOG_LEVEL).ok(), env::var("RUST_LOG").ok()))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .without_time();

    let _ = match LogFormat::parse(env::var(LOG_FORMAT).ok().as_deref()) {
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
        LogFormat::Text => builder.try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_precedence() {
        assert_eq!(directive(Some("DEBUG".into()), Some("trace".into())), "debug");
        assert_eq!(directive(None, Some("tickets=trace".into())), "tickets=trace");
        assert_eq!(directive(None, None), "info");
        assert_eq!(directive(Some(String::new()), None), "info");
        assert_eq!(directive(Some(String::new()), Some("warn".into())), "warn");
    }

    #[test]
    fn format_selection() {
        assert_eq!(LogFormat::parse(Some("JSON")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("Text")), LogFormat::Text);
        assert_eq!(LogFormat::parse(None), LogFormat::Text);
    }
}
