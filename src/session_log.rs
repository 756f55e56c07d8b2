//! Plain-text session log.
//!
//! Each session appends a start banner followed by the decoded traffic,
//! with no further framing:
//!
//! ```text
//! ===== Session start: 2024-05-01 09:30:00 =====
//! Port: /dev/ttyUSB0, Baud: 9600, Encoding: UTF-8
//! Router>
//! ```

use crate::link::LinkConfig;
use crate::relay::RelayError;
use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Append-only sink for decoded session output.
#[derive(Debug)]
pub struct SessionLog {
    file: File,
    path: PathBuf,
}

impl SessionLog {
    /// Create the parent directory if needed, open `path` for appending and
    /// write the session-start banner.
    pub fn open(path: &Path, config: &LinkConfig) -> Result<Self, RelayError> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && dir != Path::new(".") {
                fs::create_dir_all(dir).map_err(|source| RelayError::LogDirectory {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }
        }

        let open_error = |source| RelayError::LogOpen {
            path: path.to_path_buf(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(open_error)?;

        // Keep earlier sessions visually apart.
        let separator = if file.metadata().map_err(open_error)?.len() > 0 {
            "\n\n"
        } else {
            ""
        };

        let banner = format!(
            "{}{}\n{}\n",
            separator,
            start_banner(&Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
            session_summary(config),
        );
        file.write_all(banner.as_bytes()).map_err(open_error)?;

        info!(path = %path.display(), "Session log opened");

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Append decoded session output.
    pub fn append(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// First banner line.
pub fn start_banner(timestamp: &str) -> String {
    format!("===== Session start: {} =====", timestamp)
}

/// Second banner line.
pub fn session_summary(config: &LinkConfig) -> String {
    format!(
        "Port: {}, Baud: {}, Encoding: {}",
        config.port_name, config.baud_rate, config.encoding
    )
}
