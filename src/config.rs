//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::crsf::protocol::CRSF_NUM_CHANNELS;
use crate::error::{LinkError, Result};
use crate::output::{PULSE_MAX_US, PULSE_MIN_US};

/// Serial port value that probes the default device paths
pub const AUTO_PORT: &str = "auto";

/// Baud rates a CRSF receiver can be configured for
pub const SUPPORTED_BAUD_RATES: &[u32] = &[115200, 400000, 420000, 921600, 1870000, 3750000];

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub serial: SerialConfig,
    pub link: LinkConfig,
    #[serde(default)]
    pub outputs: Vec<OutputConfig>,
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    /// Device path, or `auto` to probe the usual device paths
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// How long to wait for a sync byte before reporting a quiet line
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

/// RC link supervision
#[derive(Debug, Deserialize, Clone)]
pub struct LinkConfig {
    #[serde(default = "default_failsafe_timeout_ms")]
    pub failsafe_timeout_ms: u64,

    /// Interval between decoder statistics log lines
    #[serde(default = "default_stats_interval_ms")]
    pub stats_interval_ms: u64,
}

/// One servo output fed from an RC channel
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    pub output: usize,

    /// Zero-based RC channel index
    pub channel: usize,

    #[serde(default = "default_min_us")]
    pub min_us: u16,

    #[serde(default = "default_max_us")]
    pub max_us: u16,

    #[serde(default = "default_failsafe_us")]
    pub failsafe_us: u16,

    #[serde(default)]
    pub reversed: bool,
}

/// Telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,
}

/// Application log configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: None,
        }
    }
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyAMA0".to_string() }
fn default_baud_rate() -> u32 { 420000 }
fn default_idle_timeout_ms() -> u64 { 100 }

fn default_failsafe_timeout_ms() -> u64 { 500 }
fn default_stats_interval_ms() -> u64 { 5000 }

fn default_min_us() -> u16 { 1000 }
fn default_max_us() -> u16 { 2000 }
fn default_failsafe_us() -> u16 { 1500 }

fn default_telemetry_enabled() -> bool { true }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }

fn default_log_level() -> String { "info".to_string() }

fn invalid(msg: impl std::fmt::Display) -> LinkError {
    LinkError::Config(toml::de::Error::custom(msg))
}

impl SerialConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn is_auto(&self) -> bool {
        self.port == AUTO_PORT
    }
}

impl LinkConfig {
    pub fn failsafe_timeout(&self) -> Duration {
        Duration::from_millis(self.failsafe_timeout_ms)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use crsf_link::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Validate serial port configuration
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if !SUPPORTED_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(invalid(
                "baud_rate must be one of: 115200, 400000, 420000, 921600, 1870000, 3750000",
            ));
        }

        if self.serial.idle_timeout_ms == 0 || self.serial.idle_timeout_ms > 10000 {
            return Err(invalid("idle_timeout_ms must be between 1 and 10000"));
        }

        // Validate link supervision
        if self.link.failsafe_timeout_ms == 0 || self.link.failsafe_timeout_ms > 60000 {
            return Err(invalid("failsafe_timeout_ms must be between 1 and 60000"));
        }

        if self.link.stats_interval_ms == 0 || self.link.stats_interval_ms > 60000 {
            return Err(invalid("stats_interval_ms must be between 1 and 60000"));
        }

        self.validate_outputs()?;

        // Validate telemetry configuration
        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        // Validate logging
        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(invalid(format!(
                "logging level '{}' must be one of: trace, debug, info, warn, error",
                self.logging.level
            )));
        }

        Ok(())
    }

    fn validate_outputs(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for out in &self.outputs {
            if !seen.insert(out.output) {
                return Err(invalid(format!("output {} is configured twice", out.output)));
            }

            // CRSF has 16 channels: 0-15
            if out.channel >= CRSF_NUM_CHANNELS {
                return Err(invalid(format!(
                    "output {}: channel {} is out of bounds (must be 0-15)",
                    out.output, out.channel
                )));
            }

            if out.min_us < PULSE_MIN_US || out.max_us > PULSE_MAX_US {
                return Err(invalid(format!(
                    "output {}: pulse range must be within 500-2500 us",
                    out.output
                )));
            }

            if out.min_us >= out.max_us {
                return Err(invalid(format!(
                    "output {}: min_us must be less than max_us",
                    out.output
                )));
            }

            if out.failsafe_us < out.min_us || out.failsafe_us > out.max_us {
                return Err(invalid(format!(
                    "output {}: failsafe_us must be within min_us to max_us",
                    out.output
                )));
            }
        }

        Ok(())
    }
}
