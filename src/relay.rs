//! Bidirectional terminal relay.
//!
//! Two activities share the link:
//!
//! ```text
//! operator input ──(outbound thread, byte at a time)──> link
//! link ──(inbound poll loop)──> decoder ──> display (+ session log)
//! ```
//!
//! The outbound side owns a duplicated handle and only writes; the inbound
//! side owns the opened handle, the decoder and the log sink and only
//! reads. Neither needs a lock.

use crate::encoding::StreamDecoder;
use crate::link::LinkConfig;
use crate::port::{PortError, PortOpener, SerialPortAdapter};
use crate::session_log::SessionLog;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Size of the per-cycle receive buffer.
const READ_CHUNK: usize = 1024;

/// Failures that end a relay session.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The link for the finalized configuration could not be opened.
    #[error("Failed to open {port}: {source}")]
    LinkOpen {
        port: String,
        #[source]
        source: PortError,
    },

    /// The link could not be duplicated for full-duplex use.
    #[error("Failed to duplicate link handle: {0}")]
    LinkSplit(#[source] PortError),

    /// A read failed for a reason other than the poll timeout.
    #[error("Read error: {0}")]
    LinkRead(#[source] PortError),

    /// The session log directory could not be created.
    #[error("Failed to create log directory '{}': {source}", path.display())]
    LogDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The session log file could not be opened or its banner written.
    #[error("Failed to open log file '{}': {source}", path.display())]
    LogOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The operator display is no longer writable.
    #[error("Failed to write to display: {0}")]
    Display(#[source] io::Error),

    /// The outbound activity could not be started.
    #[error("Failed to start input forwarding: {0}")]
    Spawn(#[source] io::Error),
}

/// Timing of the relay loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayOptions {
    /// Read timeout on the inbound handle.
    pub read_timeout: Duration,
    /// Pause after every inbound cycle.
    pub poll_interval: Duration,
    /// Write timeout on the outbound handle.
    pub write_timeout: Duration,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(10),
            poll_interval: Duration::from_millis(10),
            write_timeout: Duration::from_secs(1),
        }
    }
}

/// Live state of one terminal session.
///
/// Dropping the session releases the link and closes the log sink.
#[derive(Debug)]
pub struct Session {
    link: Box<dyn SerialPortAdapter>,
    log: Option<SessionLog>,
    decoder: StreamDecoder,
    pending: Vec<u8>,
}

impl Session {
    /// Open the session log (if configured) and then the link.
    pub fn open(
        opener: &dyn PortOpener,
        config: &LinkConfig,
        options: &RelayOptions,
    ) -> Result<Self, RelayError> {
        let log = config
            .log_path
            .as_deref()
            .map(|path| SessionLog::open(path, config))
            .transpose()?;

        let link = opener
            .open(
                &config.port_name,
                &config.port_configuration(options.read_timeout),
            )
            .map_err(|source| RelayError::LinkOpen {
                port: config.port_name.clone(),
                source,
            })?;

        Ok(Self::new(link, config, log))
    }

    /// Build a session around an already open link.
    pub fn new(
        link: Box<dyn SerialPortAdapter>,
        config: &LinkConfig,
        log: Option<SessionLog>,
    ) -> Self {
        Self {
            link,
            log,
            decoder: StreamDecoder::new(config.encoding),
            pending: Vec::with_capacity(READ_CHUNK),
        }
    }

    /// One inbound cycle: read, decode, show and log.
    ///
    /// Returns the number of raw bytes received; zero when the read timed out.
    pub fn poll(&mut self, display: &mut dyn Write) -> Result<usize, RelayError> {
        let mut buffer = [0u8; READ_CHUNK];
        let n = match self.link.read_bytes(&mut buffer) {
            Ok(n) => n,
            Err(e) if e.is_timeout() => 0,
            Err(e) => return Err(RelayError::LinkRead(e)),
        };

        if n == 0 {
            return Ok(0);
        }

        self.pending.extend_from_slice(&buffer[..n]);
        let output = self.decoder.decode(&self.pending);

        if !output.is_empty() {
            display
                .write_all(&output)
                .and_then(|_| display.flush())
                .map_err(RelayError::Display)?;

            if let Some(log) = self.log.as_mut() {
                if let Err(e) = log.append(&output) {
                    warn!(
                        path = %log.path().display(),
                        error = %e,
                        "Failed to append to session log"
                    );
                }
            }
        }

        drop(output);
        self.pending.clear();
        Ok(n)
    }

    /// Handle for the outbound direction.
    fn writer(&self, write_timeout: Duration) -> Result<Box<dyn SerialPortAdapter>, RelayError> {
        let mut writer = self.link.try_clone().map_err(RelayError::LinkSplit)?;
        if let Err(e) = writer.set_timeout(write_timeout) {
            debug!(error = %e, "Could not set write timeout on outbound handle");
        }
        Ok(writer)
    }
}

/// Runs a session until shutdown is requested or the link fails.
#[derive(Debug, Clone)]
pub struct Relay {
    options: RelayOptions,
    shutdown: Arc<AtomicBool>,
}

impl Relay {
    pub fn new(options: RelayOptions) -> Self {
        Self {
            options,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn options(&self) -> &RelayOptions {
        &self.options
    }

    /// Flag that stops the inbound loop at its next cycle when set.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Open a session for `config` and run it.
    pub fn connect<R>(
        &self,
        opener: &dyn PortOpener,
        config: &LinkConfig,
        input: R,
        display: &mut dyn Write,
    ) -> Result<(), RelayError>
    where
        R: Read + Send + 'static,
    {
        let session = Session::open(opener, config, &self.options)?;
        info!(
            port = %config.port_name,
            baud_rate = config.baud_rate,
            encoding = %config.encoding,
            "Session started"
        );
        self.run(session, input, display)
    }

    /// Forward `input` to the link on a separate thread and poll the link
    /// into `display` on this one.
    ///
    /// The outbound thread is not joined; it ends with the input stream,
    /// on a write failure, or with the process.
    pub fn run<R>(
        &self,
        mut session: Session,
        input: R,
        display: &mut dyn Write,
    ) -> Result<(), RelayError>
    where
        R: Read + Send + 'static,
    {
        let writer = session.writer(self.options.write_timeout)?;
        thread::Builder::new()
            .name("relay-outbound".to_string())
            .spawn(move || forward_input(input, writer))
            .map_err(RelayError::Spawn)?;

        while !self.shutdown.load(Ordering::SeqCst) {
            session.poll(display)?;
            thread::sleep(self.options.poll_interval);
        }

        info!("Shutdown requested, closing session");
        Ok(())
    }
}

/// Copy operator input to the link one byte at a time.
fn forward_input<R: Read>(mut input: R, mut link: Box<dyn SerialPortAdapter>) {
    let mut byte = [0u8; 1];
    loop {
        match input.read(&mut byte) {
            Ok(0) => {
                debug!("Operator input closed, outbound direction stopped");
                return;
            }
            Ok(_) => {
                if let Err(e) = link.write_bytes(&byte) {
                    error!(error = %e, "Write to link failed, outbound direction stopped");
                    return;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                error!(error = %e, "Failed to read operator input, outbound direction stopped");
                return;
            }
        }
    }
}
