//! Port abstraction layer for serial communication.
//!
//! Provides the link handle trait, its real and simulated implementations,
//! and host port enumeration.

pub mod discovery;
pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use discovery::{list_ports, PortInfo};
pub use error::PortError;
pub use mock::{MockPortOpener, MockSerialPort};
pub use sync_port::{SyncSerialPort, SystemPortOpener};
pub use traits::*;
