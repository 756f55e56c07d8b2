//! autoterm library
//!
//! Core of an auto-negotiating serial console terminal: the link
//! abstraction, baud rate negotiation, encoding detection and the
//! bidirectional relay with its optional session log.
//!
//! # Modules
//!
//! - `config`: Configuration management with TOML support
//! - `encoding`: Supported text encodings, detection and streaming decode
//! - `error`: Application-level error and exit codes
//! - `link`: Finalized link parameters
//! - `negotiation`: Baud rate probing and scoring
//! - `port`: Port abstraction layer for serial communication
//! - `relay`: Operator <-> device relay loop
//! - `session_log`: Plain-text session transcript

pub mod config;
pub mod encoding;
pub mod error;
pub mod link;
pub mod negotiation;
pub mod port;
pub mod relay;
pub mod session_log;

// Re-export commonly used types for convenience
pub use encoding::TextEncoding;
pub use error::{AppError, AppResult};
pub use link::LinkConfig;
pub use negotiation::{AutoNegotiator, NegotiationOptions, NegotiationOutcome, NegotiationReport};
pub use port::{
    DataBits, MockPortOpener, MockSerialPort, Parity, PortConfiguration, PortError, PortOpener,
    SerialPortAdapter, StopBits, SyncSerialPort, SystemPortOpener,
};
pub use relay::{Relay, RelayError, RelayOptions, Session};

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
