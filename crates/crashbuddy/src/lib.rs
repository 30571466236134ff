//! CrashBuddy Firmware
//!
//! Samples the IMU, keeps a rolling crash log in a fixed ring buffer, and
//! exposes the log through the CrashBuddy GATT service.

pub mod config;
mod recorder;
mod sample;
mod sensor;

pub use crate::config::{ConfigError, CrashBuddyConfig, LogFormat};
pub use recorder::{GattHandle, RecordOutcome, Recorder, RecorderError};
pub use sample::CrashSample;
pub use sensor::{SensorService, SensorSimulator};

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize logging
pub fn init_logging(level: Level, format: LogFormat) {
    let result = match format {
        LogFormat::Text => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_target(true)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
        LogFormat::Json => {
            let subscriber = FmtSubscriber::builder()
                .json()
                .with_max_level(level)
                .with_target(true)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
    };

    result.expect("Failed to set tracing subscriber");
}
