//! Configuration schema definitions.
//!
//! Every section is `#[serde(default)]`, so a file only needs the keys it
//! changes.

use super::error::{ConfigError, ConfigResult};
use crate::encoding::TextEncoding;
use crate::negotiation::{NegotiationOptions, STANDARD_BAUD_RATES};
use crate::port::{Parity, StopBits};
use crate::relay::RelayOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial link defaults
    pub serial: SerialConfig,
    /// Baud rate negotiation tuning
    pub negotiation: NegotiationConfig,
    /// Relay loop timing
    pub relay: RelayConfig,
    /// Diagnostics and session log
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.serial.default_baud == 0 {
            return Err(ConfigError::validation(
                "serial.default_baud",
                "must be greater than zero",
            ));
        }
        if self.negotiation.baud_rates.is_empty() {
            return Err(ConfigError::validation(
                "negotiation.baud_rates",
                "at least one candidate is required",
            ));
        }
        if self.negotiation.baud_rates.contains(&0) {
            return Err(ConfigError::validation(
                "negotiation.baud_rates",
                "baud rates must be greater than zero",
            ));
        }
        if self.negotiation.attempts == 0 {
            return Err(ConfigError::validation(
                "negotiation.attempts",
                "must be at least 1",
            ));
        }

        let timeouts = [
            ("negotiation.probe_timeout_ms", self.negotiation.probe_timeout_ms),
            ("relay.read_timeout_ms", self.relay.read_timeout_ms),
            ("relay.poll_interval_ms", self.relay.poll_interval_ms),
            ("relay.write_timeout_ms", self.relay.write_timeout_ms),
        ];
        for (key, value) in timeouts {
            if value == 0 {
                return Err(ConfigError::validation(key, "must be greater than zero"));
            }
        }

        Ok(())
    }
}

/// Serial link defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Baud rate used when negotiation is off or detects nothing
    pub default_baud: u32,
    /// Encoding used when detection is off or inconclusive
    pub default_encoding: TextEncoding,
    pub parity: Parity,
    pub stop_bits: StopBits,
    /// Probe the device for its baud rate before connecting
    pub auto_negotiate: bool,
    /// Guess the encoding from the negotiation sample
    pub auto_detect_encoding: bool,
    /// Port aliases for convenience
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            default_baud: 9600,
            default_encoding: TextEncoding::Utf8,
            parity: Parity::None,
            stop_bits: StopBits::One,
            auto_negotiate: true,
            auto_detect_encoding: true,
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

/// Negotiation tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegotiationConfig {
    /// Candidates in priority order; earlier wins ties
    pub baud_rates: Vec<u32>,
    /// Open/probe/close rounds per candidate
    pub attempts: u32,
    /// Wait for each probe response, in milliseconds
    pub probe_timeout_ms: u64,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            baud_rates: STANDARD_BAUD_RATES.to_vec(),
            attempts: 3,
            probe_timeout_ms: 300,
        }
    }
}

impl NegotiationConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Engine options; encoding detection comes from the serial section.
    pub fn options(&self, detect_encoding: bool) -> NegotiationOptions {
        NegotiationOptions {
            baud_rates: self.baud_rates.clone(),
            attempts: self.attempts,
            probe_timeout: self.probe_timeout(),
            detect_encoding,
        }
    }
}

/// Relay loop timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Inbound read timeout in milliseconds
    pub read_timeout_ms: u64,
    /// Pause between inbound cycles in milliseconds
    pub poll_interval_ms: u64,
    /// Outbound write timeout in milliseconds
    pub write_timeout_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: 10,
            poll_interval_ms: 10,
            write_timeout_ms: 1000,
        }
    }
}

impl RelayConfig {
    pub fn options(&self) -> RelayOptions {
        RelayOptions {
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            write_timeout: Duration::from_millis(self.write_timeout_ms),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive when RUST_LOG is unset: "trace" .. "error"
    pub level: String,
    /// Diagnostic output format
    pub format: LogFormat,
    /// Session transcript file (optional)
    pub session_log: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            session_log: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}
