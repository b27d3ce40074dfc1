//! # Engine Configuration
//!
//! Typed configuration for resolution, the narrative scheduler, the provider
//! circuit breaker and logging. Values come from built-in defaults, an
//! optional TOML file, then `BLOCK_ENGINE__*` environment overrides.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use block_engine::config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::load()?;
//! let workers = config.scheduler.max_concurrency;
//! let debounce = config.resolution.debounce();
//! # Ok(())
//! # }
//! ```
//!
//! ```toml
//! [scheduler]
//! max_concurrency = 3
//! completion_grace_ms = 3000
//!
//! [resolution]
//! provider_timeout_ms = 30000
//! ```

pub mod loader;

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use loader::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub resolution: ResolutionConfig,
    pub scheduler: SchedulerConfig,
    pub circuit_breaker: CircuitBreakerSettings,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Quiet period before a configuration change triggers resolution
    pub debounce_ms: u64,
    /// Upper bound on a single live provider call
    pub provider_timeout_ms: u64,
    /// Rows generated for non-date dimensions in synthetic data
    pub synthetic_entity_count: usize,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 400,
            provider_timeout_ms: 30_000,
            synthetic_entity_count: 5,
        }
    }
}

impl ResolutionConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Narrative tasks allowed to run at once
    pub max_concurrency: usize,
    /// How long the terminal progress summary stays observable
    pub completion_grace_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 3,
            completion_grace_ms: 3_000,
        }
    }
}

impl SchedulerConfig {
    pub fn completion_grace(&self) -> Duration {
        Duration::from_millis(self.completion_grace_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    pub enabled: bool,
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,
    /// Successful probes needed to close a half-open circuit
    pub success_threshold: u32,
    /// Cool-down before an open circuit admits a probe
    pub timeout_ms: u64,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            failure_threshold: 5,
            success_threshold: 1,
            timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset; `None` picks by environment
    pub level: Option<String>,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl EngineConfig {
    /// Configuration with short timers for tests
    pub fn for_test() -> Self {
        Self {
            resolution: ResolutionConfig {
                debounce_ms: 20,
                provider_timeout_ms: 500,
                ..ResolutionConfig::default()
            },
            scheduler: SchedulerConfig {
                max_concurrency: 3,
                completion_grace_ms: 20,
            },
            circuit_breaker: CircuitBreakerSettings {
                enabled: false,
                ..CircuitBreakerSettings::default()
            },
            logging: LoggingConfig {
                level: Some("debug".to_string()),
                json: false,
            },
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.scheduler.max_concurrency == 0 {
            return Err(EngineError::Configuration(
                "scheduler.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.resolution.provider_timeout_ms == 0 {
            return Err(EngineError::Configuration(
                "resolution.provider_timeout_ms must be positive".to_string(),
            ));
        }
        if self.circuit_breaker.enabled && self.circuit_breaker.failure_threshold == 0 {
            return Err(EngineError::Configuration(
                "circuit_breaker.failure_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
