//! Configuration module for autoterm.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `--config PATH` on the command line
//! 2. `AUTOTERM_CONFIG` environment variable (explicit path)
//! 3. `./autoterm.toml` (current directory)
//! 4. `autoterm.toml` in the platform config directory
//!    (`~/.config/autoterm/` on Linux, `%APPDATA%\autoterm\config\` on Windows)
//! 5. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! - `AUTOTERM_SERIAL_DEFAULT_BAUD`
//! - `AUTOTERM_SERIAL_DEFAULT_ENCODING`
//! - `AUTOTERM_NEGOTIATION_PROBE_TIMEOUT_MS`
//! - `AUTOTERM_LOGGING_LEVEL`
//! - `AUTOTERM_LOGGING_SESSION_LOG`
//!
//! # Example
//!
//! ```rust,ignore
//! use autoterm::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load()?;
//! println!("Default baud: {}", loader.config().serial.default_baud);
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{
    Config, LogFormat, LoggingConfig, NegotiationConfig, RelayConfig, SerialConfig,
};
