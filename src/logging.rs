//! # Structured Logging Module
//!
//! Environment-aware `tracing` setup for applications embedding guards, plus helpers for
//! logging guard activity with consistent fields.

use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
///
/// `RUST_LOG` wins over the environment default. Set `SAFE_CALLBACK_LOG_FORMAT=json` for
/// JSON lines.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));
        let json = std::env::var("SAFE_CALLBACK_LOG_FORMAT")
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let layer = if json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // Another subscriber (e.g. the host application's) may already be installed
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            environment = %environment,
            json = json,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("SAFE_CALLBACK_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "test" => "debug".to_string(),
        "development" => "debug".to_string(),
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log structured data for guard lifecycle operations (build, registration, replacement)
pub fn log_guard_operation(guard: &str, operation: &str, status: &str, details: Option<&str>) {
    tracing::debug!(
        guard = %guard,
        operation = %operation,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "🛡️ GUARD_OPERATION"
    );
}

/// Log a failure that no handler matched; the caller receives it unchanged
pub fn log_unhandled_failure(guard: &str, kind: &str, error: &str) {
    tracing::debug!(
        guard = %guard,
        kind = %kind,
        error = %error,
        timestamp = %Utc::now().to_rfc3339(),
        "↩️ UNHANDLED_FAILURE: propagating to caller"
    );
}
