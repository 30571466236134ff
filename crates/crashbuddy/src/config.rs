//! Firmware configuration

use crate::sample::CrashSample;
use gatt_table::CrashServiceConfig;
use ring_buffer::Record;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "CRASHBUDDY_CONFIG";

/// Default config file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "crashbuddy.toml";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// CrashBuddy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrashBuddyConfig {
    /// Bytes reserved for the crash log ring
    pub buffer_bytes: usize,

    /// Sensor sample rate in Hz
    pub sample_rate_hz: u32,

    /// Crash threshold (milli-g)
    pub threshold_milli_g: u16,

    /// Samples still logged after a crash before the window freezes
    pub post_crash_samples: u32,

    /// Stop sampling after this many samples (0 = unlimited)
    pub max_samples: u32,

    /// Sample number of the simulated impact, if any
    pub impact_at_sample: Option<u32>,

    /// Peak acceleration of the simulated impact (milli-g)
    pub impact_milli_g: i16,

    /// First GATT handle of the service
    pub start_handle: u16,

    /// Bytes per data points read
    pub char_size: u16,

    /// Verbose debug output
    pub enable_debug: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format
    pub log_format: LogFormat,
}

impl Default for CrashBuddyConfig {
    fn default() -> Self {
        Self {
            buffer_bytes: 16 * 1024,
            sample_rate_hz: 100,
            threshold_milli_g: 4000,
            post_crash_samples: 200,
            max_samples: 3000,
            impact_at_sample: Some(1500),
            impact_milli_g: 9000,
            start_handle: 0x0028,
            char_size: 240,
            enable_debug: false,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl CrashBuddyConfig {
    /// Load from the config file and `CRASHBUDDY_*` environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let settings = config::Config::builder()
            .add_source(config::File::with_name(&path).required(false))
            .add_source(config::Environment::with_prefix("CRASHBUDDY").try_parsing(true))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the firmware cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate_hz == 0 {
            return Err(ConfigError::Invalid("sample_rate_hz must be non-zero".into()));
        }
        if self.buffer_bytes < CrashSample::SIZE {
            return Err(ConfigError::Invalid(format!(
                "buffer_bytes {} cannot hold one {}-byte sample",
                self.buffer_bytes,
                CrashSample::SIZE
            )));
        }
        self.log_level()?;
        Ok(())
    }

    /// Parsed log level
    pub fn log_level(&self) -> Result<Level, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("unknown log level '{}'", self.log_level)))
    }

    /// Settings for the GATT service
    pub fn service_config(&self) -> CrashServiceConfig {
        CrashServiceConfig {
            threshold_milli_g: self.threshold_milli_g,
            char_size: self.char_size,
            enable_debug: self.enable_debug,
        }
    }
}
