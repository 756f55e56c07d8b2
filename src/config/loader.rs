//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use crate::encoding::UnknownEncoding;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "AUTOTERM";

/// Config file name
const CONFIG_FILE_NAME: &str = "autoterm.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "AUTOTERM_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `AUTOTERM_CONFIG` environment variable (explicit path)
    /// 2. `./autoterm.toml` (current directory)
    /// 3. `autoterm.toml` in the platform config directory
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables override file values; the result is validated.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = match config_path {
            Some(ref path) => load_from_file(path)?,
            None => Config::default(),
        };

        apply_env_overrides(&mut config)?;
        config.validate()?;

        debug!(path = ?config_path, "Configuration loaded");
        Ok(Self { config_path, config })
    }

    /// Load configuration from a specific file path.
    ///
    /// Unlike [`ConfigLoader::load`], a missing file is an error.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }

        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file, no overrides).
    pub fn with_defaults() -> Self {
        Self {
            config_path: None,
            config: Config::default(),
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. Platform config directory
    get_default_config_path().filter(|path| path.exists())
}

/// Get the platform-specific config directory.
pub fn get_default_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "autoterm").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the default config file path.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `AUTOTERM_<SECTION>_<KEY>`
/// For example:
/// - `AUTOTERM_SERIAL_DEFAULT_BAUD=115200`
/// - `AUTOTERM_SERIAL_DEFAULT_ENCODING=Shift-JIS`
/// - `AUTOTERM_LOGGING_SESSION_LOG=logs/session.log`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Serial overrides
    let var = format!("{}_SERIAL_DEFAULT_BAUD", ENV_PREFIX);
    if let Ok(val) = std::env::var(&var) {
        config.serial.default_baud = val
            .parse()
            .map_err(|_| ConfigError::env_parse(&var, "Invalid baud rate"))?;
    }
    let var = format!("{}_SERIAL_DEFAULT_ENCODING", ENV_PREFIX);
    if let Ok(val) = std::env::var(&var) {
        config.serial.default_encoding = val
            .parse()
            .map_err(|e: UnknownEncoding| ConfigError::env_parse(&var, e.to_string()))?;
    }

    // Negotiation overrides
    let var = format!("{}_NEGOTIATION_PROBE_TIMEOUT_MS", ENV_PREFIX);
    if let Ok(val) = std::env::var(&var) {
        config.negotiation.probe_timeout_ms = val
            .parse()
            .map_err(|_| ConfigError::env_parse(&var, "Invalid timeout"))?;
    }

    // Logging overrides
    if let Ok(val) = std::env::var(format!("{}_LOGGING_LEVEL", ENV_PREFIX)) {
        config.logging.level = val;
    }
    if let Ok(val) = std::env::var(format!("{}_LOGGING_SESSION_LOG", ENV_PREFIX)) {
        config.logging.session_log = Some(PathBuf::from(val));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::TextEncoding;
    use serial_test::serial;
    use std::env;

    #[test]
    fn test_default_loader() {
        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().serial.default_baud, 9600);
        assert!(loader.config_path.is_none());
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("AUTOTERM_SERIAL_DEFAULT_BAUD", "57600");
        env::set_var("AUTOTERM_SERIAL_DEFAULT_ENCODING", "euc-jp");

        let mut config = Config::default();
        let result = apply_env_overrides(&mut config);

        env::remove_var("AUTOTERM_SERIAL_DEFAULT_BAUD");
        env::remove_var("AUTOTERM_SERIAL_DEFAULT_ENCODING");

        result.unwrap();
        assert_eq!(config.serial.default_baud, 57600);
        assert_eq!(config.serial.default_encoding, TextEncoding::EucJp);
    }

    #[test]
    #[serial]
    fn test_invalid_env_override() {
        env::set_var("AUTOTERM_NEGOTIATION_PROBE_TIMEOUT_MS", "soon");

        let mut config = Config::default();
        let result = apply_env_overrides(&mut config);

        env::remove_var("AUTOTERM_NEGOTIATION_PROBE_TIMEOUT_MS");

        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "[serial]\ndefault_baud = 19200\n\n[logging]\nsession_log = \"out.log\"\n",
        )
        .unwrap();

        let loader = ConfigLoader::load_from(&path).unwrap();
        assert_eq!(loader.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(loader.config().serial.default_baud, 19200);
        assert_eq!(
            loader.config().logging.session_log,
            Some(PathBuf::from("out.log"))
        );
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::load_from(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    #[serial]
    fn test_load_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[negotiation]\nattempts = 0\n").unwrap();

        let err = ConfigLoader::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[serial\n").unwrap();

        let err = load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
    }
}
