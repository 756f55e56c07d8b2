//! Mock serial port implementation for testing.
//!
//! Provides a `MockSerialPort` that simulates serial port behavior without
//! requiring actual hardware, and a `MockPortOpener` that hands such ports
//! out the way the host serial driver would. Supports scripted reads,
//! per-baud device responders, injected failures and tracking of which
//! handles are still open.

use super::error::PortError;
use super::traits::{PortConfiguration, PortOpener, SerialPortAdapter};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::ErrorKind;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Simulated device behavior: given the baud rate the port was opened at and
/// the bytes just written, optionally produce a response to be read back.
pub type Responder = Arc<dyn Fn(u32, &[u8]) -> Option<Vec<u8>> + Send + Sync>;

/// One scripted outcome of a read call.
#[derive(Debug, Clone)]
enum ScriptedRead {
    Data(Vec<u8>),
    Error(ErrorKind),
}

/// Inner state of the mock port, shared between clones of a handle.
#[derive(Debug)]
struct MockPortState {
    /// Scripted read outcomes, consumed front to back.
    reads: VecDeque<ScriptedRead>,
    /// Log of all bytes written to the port.
    write_log: Vec<Vec<u8>>,
    /// Whether write operations should fail.
    fail_writes: bool,
    /// Configured timeout duration.
    timeout: Duration,
}

/// Decrements the opener's live-handle count once every clone is gone.
#[derive(Debug)]
struct HandleGuard {
    live: Arc<AtomicUsize>,
}

impl Drop for HandleGuard {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Mock serial port implementation for testing.
///
/// Each call to [`SerialPortAdapter::read_bytes`] consumes at most one
/// enqueued chunk, which makes it easy to script distinct read cycles.
/// An empty script reads as a timeout.
///
/// # Example
/// ```
/// use autoterm::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.enqueue_read(b"Router>");
///
/// let mut buffer = [0u8; 16];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"Router>");
///
/// port.write_bytes(b"\r").unwrap();
/// assert_eq!(port.get_write_log(), vec![b"\r".to_vec()]);
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    /// The port name/identifier.
    name: String,
    /// Baud rate the port was opened at.
    baud_rate: u32,
    /// The internal state, shared with clones.
    state: Arc<Mutex<MockPortState>>,
    /// Simulated device attached to the port.
    responder: Option<Responder>,
    /// Present when the port was handed out by a `MockPortOpener`.
    guard: Option<Arc<HandleGuard>>,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            baud_rate: 9600,
            state: Arc::new(Mutex::new(MockPortState {
                reads: VecDeque::new(),
                write_log: Vec::new(),
                fail_writes: false,
                timeout: Duration::from_secs(1),
            })),
            responder: None,
            guard: None,
        }
    }

    /// Attach a simulated device that answers writes.
    pub fn with_responder(mut self, responder: Responder) -> Self {
        self.responder = Some(responder);
        self
    }

    /// Set the baud rate reported to the responder.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Baud rate the port was opened at.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Enqueue one chunk to be returned by a single read call.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        self.state
            .lock()
            .reads
            .push_back(ScriptedRead::Data(data.to_vec()));
    }

    /// Enqueue a read that fails with the given I/O error kind.
    pub fn enqueue_read_error(&mut self, kind: ErrorKind) {
        self.state.lock().reads.push_back(ScriptedRead::Error(kind));
    }

    /// Get a copy of all data written to the port.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// All written bytes, concatenated.
    pub fn written_bytes(&self) -> Vec<u8> {
        self.state.lock().write_log.concat()
    }

    /// Make subsequent writes fail.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Number of scripted reads not yet consumed.
    pub fn pending_reads(&self) -> usize {
        self.state.lock().reads.len()
    }

    /// Timeout most recently set on the port.
    pub fn timeout(&self) -> Duration {
        self.state.lock().timeout
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();

        if state.fail_writes {
            return Err(PortError::Io(std::io::Error::new(
                ErrorKind::BrokenPipe,
                "simulated write failure",
            )));
        }

        state.write_log.push(data.to_vec());

        if let Some(responder) = &self.responder {
            if let Some(response) = responder(self.baud_rate, data) {
                state.reads.push_back(ScriptedRead::Data(response));
            }
        }

        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();

        match state.reads.pop_front() {
            Some(ScriptedRead::Data(mut chunk)) => {
                let n = chunk.len().min(buffer.len());
                buffer[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    let rest = chunk.split_off(n);
                    state.reads.push_front(ScriptedRead::Data(rest));
                }
                Ok(n)
            }
            Some(ScriptedRead::Error(kind)) => Err(PortError::Io(std::io::Error::new(
                kind,
                "simulated read failure",
            ))),
            None => Err(PortError::timeout(state.timeout)),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.state.lock().timeout = timeout;
        Ok(())
    }

    fn try_clone(&self) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        Ok(Box::new(self.clone()))
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("baud_rate", &self.baud_rate)
            .field("pending_reads", &self.pending_reads())
            .finish()
    }
}

/// Where a `MockPortOpener` gets its ports from.
#[derive(Clone)]
enum PortSource {
    /// A fresh port per open, attached to the same simulated device.
    Device(Responder),
    /// The same scripted port (shared state) on every open.
    Shared(MockSerialPort),
}

/// Hands out mock ports in place of the host serial driver.
///
/// Records every open attempt and counts handles that have not been
/// released yet, so tests can prove that acquisition is scoped.
#[derive(Clone)]
pub struct MockPortOpener {
    source: PortSource,
    busy_baud_rates: Vec<u32>,
    open_attempts: Arc<Mutex<Vec<u32>>>,
    live: Arc<AtomicUsize>,
}

impl MockPortOpener {
    /// Opener whose ports talk to the given simulated device.
    pub fn with_device<F>(responder: F) -> Self
    where
        F: Fn(u32, &[u8]) -> Option<Vec<u8>> + Send + Sync + 'static,
    {
        Self::from_source(PortSource::Device(Arc::new(responder)))
    }

    /// Opener that never gets an answer from the device.
    pub fn silent() -> Self {
        Self::with_device(|_, _| None)
    }

    /// Opener that returns handles onto one pre-scripted port.
    pub fn with_port(port: MockSerialPort) -> Self {
        Self::from_source(PortSource::Shared(port))
    }

    fn from_source(source: PortSource) -> Self {
        Self {
            source,
            busy_baud_rates: Vec::new(),
            open_attempts: Arc::new(Mutex::new(Vec::new())),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Opening at any of these baud rates fails as if the port were busy.
    pub fn with_busy_baud_rates(mut self, baud_rates: Vec<u32>) -> Self {
        self.busy_baud_rates = baud_rates;
        self
    }

    /// Baud rates of every open attempt, in order, including failed ones.
    pub fn open_attempts(&self) -> Vec<u32> {
        self.open_attempts.lock().clone()
    }

    /// Handles opened and not yet dropped.
    pub fn live_handles(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl PortOpener for MockPortOpener {
    fn open(
        &self,
        port_name: &str,
        config: &PortConfiguration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        self.open_attempts.lock().push(config.baud_rate);

        if self.busy_baud_rates.contains(&config.baud_rate) {
            return Err(PortError::Io(std::io::Error::other(format!(
                "{} is busy",
                port_name
            ))));
        }

        let mut port = match &self.source {
            PortSource::Device(responder) => {
                MockSerialPort::new(port_name).with_responder(Arc::clone(responder))
            }
            PortSource::Shared(port) => port.clone(),
        }
        .with_baud_rate(config.baud_rate);
        port.set_timeout(config.timeout)?;

        self.live.fetch_add(1, Ordering::SeqCst);
        port.guard = Some(Arc::new(HandleGuard {
            live: Arc::clone(&self.live),
        }));

        Ok(Box::new(port))
    }
}
