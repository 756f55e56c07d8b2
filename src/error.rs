use crate::config::ConfigError;
use crate::port::PortError;
use crate::relay::RelayError;
use std::fmt;

/// A specialized `Result` type for the binary's top level.
pub type AppResult<T> = Result<T, AppError>;

/// Unified application error type.
///
/// Library modules return their own error enums; this type collects them
/// at the binary boundary and decides the process exit code.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Relay(RelayError),
    Port(PortError),
    NoPorts,
    InvalidSelection(String),
    Io(std::io::Error),
    Task(String),
}

impl AppError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Relay(RelayError::LinkOpen { .. } | RelayError::LinkSplit(_)) => 3,
            Self::Relay(RelayError::LinkRead(_)) => 4,
            Self::Relay(RelayError::LogDirectory { .. } | RelayError::LogOpen { .. }) => 5,
            Self::NoPorts | Self::InvalidSelection(_) => 6,
            Self::Relay(_) | Self::Port(_) | Self::Io(_) | Self::Task(_) => 1,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Relay(e) => write!(f, "{e}"),
            Self::Port(e) => write!(f, "Serial port error: {e}"),
            Self::NoPorts => write!(f, "No serial ports found."),
            Self::InvalidSelection(input) => write!(f, "Invalid port selection: '{input}'"),
            Self::Io(e) => write!(f, "An I/O error occurred: {e}"),
            Self::Task(details) => write!(f, "Background task failed: {details}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Relay(e) => Some(e),
            Self::Port(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::NoPorts | Self::InvalidSelection(_) | Self::Task(_) => None,
        }
    }
}

// Implement `From` conversions to allow the `?` operator to work seamlessly.
impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<RelayError> for AppError {
    fn from(err: RelayError) -> Self {
        AppError::Relay(err)
    }
}

impl From<PortError> for AppError {
    fn from(err: PortError) -> Self {
        AppError::Port(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_exit_codes() {
        let config = AppError::from(ConfigError::validation("negotiation.attempts", "zero"));
        assert_eq!(config.exit_code(), 2);

        let open = AppError::from(RelayError::LinkOpen {
            port: "COM3".to_string(),
            source: PortError::not_found("COM3"),
        });
        assert_eq!(open.exit_code(), 3);

        let read = AppError::from(RelayError::LinkRead(PortError::Io(std::io::Error::other(
            "unplugged",
        ))));
        assert_eq!(read.exit_code(), 4);

        let log = AppError::from(RelayError::LogOpen {
            path: PathBuf::from("/nope/session.log"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        });
        assert_eq!(log.exit_code(), 5);

        assert_eq!(AppError::NoPorts.exit_code(), 6);
        assert_eq!(AppError::InvalidSelection("x".into()).exit_code(), 6);
        assert_eq!(AppError::Task("panicked".into()).exit_code(), 1);
    }

    #[test]
    fn test_display_includes_cause() {
        let err = AppError::from(RelayError::LinkOpen {
            port: "COM3".to_string(),
            source: PortError::not_found("COM3"),
        });
        let text = err.to_string();
        assert!(text.contains("COM3"));
    }
}
