//! Finalized link parameters handed from negotiation to the relay.

use crate::encoding::TextEncoding;
use crate::port::{DataBits, Parity, PortConfiguration, StopBits};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Everything needed to open and run a terminal session.
///
/// Baud rate and encoding are always concrete values; auto-detection
/// happens before a `LinkConfig` reaches the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub encoding: TextEncoding,
    /// Session log file, appended to when set.
    pub log_path: Option<PathBuf>,
}

impl LinkConfig {
    /// 8 data bits, no parity, one stop bit, UTF-8, no session log.
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            encoding: TextEncoding::Utf8,
            log_path: None,
        }
    }

    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_framing(mut self, parity: Parity, stop_bits: StopBits) -> Self {
        self.parity = parity;
        self.stop_bits = stop_bits;
        self
    }

    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Port settings for opening this link with the given timeout.
    pub fn port_configuration(&self, timeout: Duration) -> PortConfiguration {
        PortConfiguration {
            baud_rate: self.baud_rate,
            data_bits: self.data_bits,
            parity: self.parity,
            stop_bits: self.stop_bits,
            timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults_to_8n1_utf8() {
        let config = LinkConfig::new("/dev/ttyUSB0", 9600);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.stop_bits, StopBits::One);
        assert_eq!(config.encoding, TextEncoding::Utf8);
        assert!(config.log_path.is_none());
    }

    #[test]
    fn test_port_configuration_mapping() {
        let config = LinkConfig::new("COM3", 19200).with_framing(Parity::Even, StopBits::Two);
        let port = config.port_configuration(Duration::from_millis(10));

        assert_eq!(port.baud_rate, 19200);
        assert_eq!(port.parity, Parity::Even);
        assert_eq!(port.stop_bits, StopBits::Two);
        assert_eq!(port.timeout, Duration::from_millis(10));
    }
}
