//! Configuration management with environment variable support.
//!
//! This module provides centralized configuration for flowpoint, supporting:
//! - Environment variables for the default poll policy and report location
//! - Sensible defaults matching the timings UI suites settle on
//! - A cached global plus explicit `from_env` / `defaults` constructors
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `FLOWPOINT_TIMEOUT_MS` | Default poll timeout (ms) | `15000` |
//! | `FLOWPOINT_INTERVAL_MS` | Default poll interval (ms) | `500` |
//! | `FLOWPOINT_INITIAL_DELAY_MS` | Default delay before the first probe (ms) | `0` |
//! | `FLOWPOINT_REPORT_DIR` | Base directory for report sessions | `/tmp/flowpoint` |
//! | `FLOWPOINT_LOG` | Log filter used when `RUST_LOG` is unset | `info` |
//!
//! # Example
//!
//! ```bash
//! # Slow CI runners need more patience
//! export FLOWPOINT_TIMEOUT_MS=45000
//! export FLOWPOINT_REPORT_DIR="/var/tmp/flowpoint-reports"
//! ```

use std::env;
use std::sync::OnceLock;

// ============================================================================
// Default Values
// ============================================================================

/// Default poll timeout (milliseconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

/// Default poll interval (milliseconds)
pub const DEFAULT_INTERVAL_MS: u64 = 500;

/// Default delay before the first evaluation (milliseconds)
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 0;

/// Default report session base directory
pub const DEFAULT_REPORT_DIR: &str = "/tmp/flowpoint";

/// Default log filter
pub const DEFAULT_LOG_FILTER: &str = "info";

// ============================================================================
// Environment Variable Names
// ============================================================================

pub const ENV_TIMEOUT_MS: &str = "FLOWPOINT_TIMEOUT_MS";
pub const ENV_INTERVAL_MS: &str = "FLOWPOINT_INTERVAL_MS";
pub const ENV_INITIAL_DELAY_MS: &str = "FLOWPOINT_INITIAL_DELAY_MS";
pub const ENV_REPORT_DIR: &str = "FLOWPOINT_REPORT_DIR";
pub const ENV_LOG: &str = "FLOWPOINT_LOG";

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Centralized configuration for flowpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Default poll timings
    pub poll: PollSettings,
    /// Report session settings
    pub report: ReportSettings,
    /// Log filter directive used when `RUST_LOG` is absent
    pub log_filter: String,
}

/// Poll timing defaults, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub timeout_ms: u64,
    pub interval_ms: u64,
    pub initial_delay_ms: u64,
}

/// Report-related settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    /// Base directory for report sessions
    pub base_dir: String,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            poll: PollSettings::defaults(),
            report: ReportSettings {
                base_dir: DEFAULT_REPORT_DIR.to_string(),
            },
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Unparsable numeric values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let millis = |key: &str, default: u64| {
            lookup(key)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(default)
        };

        Self {
            poll: PollSettings {
                timeout_ms: millis(ENV_TIMEOUT_MS, DEFAULT_TIMEOUT_MS),
                interval_ms: millis(ENV_INTERVAL_MS, DEFAULT_INTERVAL_MS),
                initial_delay_ms: millis(ENV_INITIAL_DELAY_MS, DEFAULT_INITIAL_DELAY_MS),
            },
            report: ReportSettings {
                base_dir: lookup(ENV_REPORT_DIR).unwrap_or_else(|| DEFAULT_REPORT_DIR.to_string()),
            },
            log_filter: lookup(ENV_LOG).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl PollSettings {
    pub fn defaults() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            interval_ms: DEFAULT_INTERVAL_MS,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
        }
    }
}

/// Get the report base directory (convenience function)
pub fn report_base_dir() -> String {
    get().report.base_dir.clone()
}

/// Get the log filter directive (convenience function)
pub fn log_filter() -> String {
    get().log_filter.clone()
}
