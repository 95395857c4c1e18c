//! Logging and observability infrastructure for prdforge
//!
//! Structured `tracing` events with `project_id` / `phase` / `path` fields,
//! plus a single subscriber initializer for hosts embedding the engine.

use serde::{Deserialize, Serialize};
use tracing::{Level, debug, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single-line events
    #[default]
    Compact,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// Parse a format name (`compact` or `json`, case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Default filter directive when `RUST_LOG` is unset.
#[must_use]
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "prdforge=debug,info"
    } else {
        "prdforge=info,warn"
    }
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise [`default_directive`] is used.
/// Verbose mode adds targets and span close events.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(
    verbose: bool,
    format: LogFormat,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbose)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let span_events = if verbose {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    match format {
        LogFormat::Compact => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(verbose)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_span_events(span_events)
                    .compact(),
            )
            .try_init()?,
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_span_events(span_events)
                    .json(),
            )
            .try_init()?,
    }

    Ok(())
}

/// Span covering one phase submission.
pub fn project_span(project_id: &str, phase: u32) -> tracing::Span {
    span!(
        Level::INFO,
        "phase_submission",
        project_id = %project_id,
        phase = phase,
    )
}

pub fn log_project_created(project_id: &str, title: &str) {
    info!(project_id = %project_id, title = %title, "Project created");
}

pub fn log_phase_submitted(project_id: &str, phase: u32, content_bytes: usize) {
    info!(
        project_id = %project_id,
        phase = phase,
        content_bytes = content_bytes,
        "Phase content recorded"
    );
}

/// Log the outcome of one background sweep.
pub fn log_sweep_complete(expired_entries: usize, deleted_files: usize, duration_ms: u128) {
    if expired_entries == 0 && deleted_files == 0 {
        debug!(duration_ms = %duration_ms, "Sweep found nothing to clean");
    } else {
        info!(
            expired_entries = expired_entries,
            deleted_files = deleted_files,
            duration_ms = %duration_ms,
            "Sweep complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("Compact"), Some(LogFormat::Compact));
        assert_eq!(LogFormat::parse("yaml"), None);
        assert_eq!(LogFormat::default(), LogFormat::Compact);
    }

    #[test]
    fn test_default_directive_depends_on_verbosity() {
        assert!(default_directive(true).contains("prdforge=debug"));
        assert!(default_directive(false).contains("prdforge=info"));
    }

    #[test]
    fn test_init_tracing_twice_reports_error() {
        // The first call may race with other tests; only the second must fail.
        let _ = init_tracing(false, LogFormat::Compact);
        assert!(init_tracing(true, LogFormat::Json).is_err());
    }

    #[test]
    fn test_project_span_carries_metadata() {
        let span = project_span("abc", 2);
        // Without a subscriber the span is disabled but still constructible.
        let _guard = span.enter();
        log_phase_submitted("abc", 2, 10);
    }
}
