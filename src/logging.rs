//! # Structured Logging Module
//!
//! Environment-aware structured logging for resolution and narrative runs.

use crate::config::{ConfigLoader, LoggingConfig};
use crate::models::Provenance;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once per process.
///
/// `RUST_LOG` wins over `config.level`, which wins over the environment
/// default.
pub fn init_structured_logging(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = ConfigLoader::detect_environment();
        let level = config
            .level
            .clone()
            .unwrap_or_else(|| default_log_level(&environment).to_string());
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

        let result = if config.json {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(true).with_thread_ids(true))
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true).with_thread_ids(true))
                .try_init()
        };

        // A subscriber installed by the host application is fine to keep
        if result.is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            environment = %environment,
            level = %level,
            json = config.json,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

fn default_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log the tier a block was resolved from
pub fn log_resolution_outcome(
    block_id: &str,
    report_id: &str,
    provenance: Provenance,
    current_rows: usize,
    comparison_rows: usize,
) {
    if provenance.is_demo() {
        tracing::warn!(
            block_id = %block_id,
            report_id = %report_id,
            provenance = %provenance,
            current_rows = current_rows,
            "📊 RESOLUTION: Serving synthetic demo data"
        );
    } else {
        tracing::info!(
            block_id = %block_id,
            report_id = %report_id,
            provenance = %provenance,
            current_rows = current_rows,
            comparison_rows = comparison_rows,
            "📊 RESOLUTION: Block resolved"
        );
    }
}

/// Log one narrative task transition
pub fn log_narrative_operation(block_id: &str, status: &str, details: Option<&str>) {
    tracing::info!(
        block_id = %block_id,
        status = %status,
        details = details,
        "📝 NARRATIVE_OPERATION"
    );
}
