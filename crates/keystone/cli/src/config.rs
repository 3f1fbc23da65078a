//! Configuration for the keystone CLI

use keystone_definitions::DefinitionLimits;
use serde::{Deserialize, Serialize};

use crate::error::CliResult;

/// Top-level CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeystoneConfig {
    /// Batch bounds applied when loading bundles
    #[serde(default)]
    pub limits: DefinitionLimits,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level, used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl KeystoneConfig {
    /// Layer defaults, then the optional file, then `KEYSTONE_*` variables.
    ///
    /// Nested keys use a double underscore, e.g. `KEYSTONE_LIMITS__MAX_SCHEMAS`.
    pub fn load(path: Option<&str>) -> CliResult<Self> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&KeystoneConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("KEYSTONE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }
}
