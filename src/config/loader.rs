//! Configuration Loader
//!
//! Layers built-in defaults, an optional TOML file and `BLOCK_ENGINE__*`
//! environment overrides (`BLOCK_ENGINE__SCHEDULER__MAX_CONCURRENCY=5`),
//! then validates the result.

use super::EngineConfig;
use crate::error::{EngineError, EngineResult};
use config::{Config, Environment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming the TOML configuration file
pub const CONFIG_PATH_VAR: &str = "BLOCK_ENGINE_CONFIG_PATH";
/// Environment variable naming the deployment environment
pub const ENVIRONMENT_VAR: &str = "BLOCK_ENGINE_ENV";

const ENV_PREFIX: &str = "BLOCK_ENGINE";
const ENV_SEPARATOR: &str = "__";

/// Zero-state loader; all functions are associated
#[derive(Debug)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Detect environment from `BLOCK_ENGINE_ENV` or default to "development"
    pub fn detect_environment() -> String {
        env::var(ENVIRONMENT_VAR).unwrap_or_else(|_| "development".to_string())
    }

    /// Load using the file named by `BLOCK_ENGINE_CONFIG_PATH`, if set
    pub fn load() -> EngineResult<EngineConfig> {
        let path = env::var(CONFIG_PATH_VAR).ok().map(PathBuf::from);
        Self::load_from(path.as_deref())
    }

    /// Load from an explicit file (or none), still applying env overrides
    pub fn load_from(path: Option<&Path>) -> EngineResult<EngineConfig> {
        let environment = Self::detect_environment();
        let mut builder = Config::builder().add_source(Config::try_from(&EngineConfig::default())?);

        if let Some(path) = path {
            if !path.is_file() {
                return Err(EngineError::Configuration(format!(
                    "configuration file not found: {}",
                    path.display()
                )));
            }
            debug!(path = %path.display(), "Reading configuration file");
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        let config: EngineConfig = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;

        info!(
            environment = %environment,
            config_file = path.map(|p| p.display().to_string()).as_deref(),
            max_concurrency = config.scheduler.max_concurrency,
            provider_timeout_ms = config.resolution.provider_timeout_ms,
            "Configuration loaded successfully"
        );

        Ok(config)
    }
}
