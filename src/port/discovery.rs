//! Host serial port enumeration.

use super::error::PortError;
use serialport::SerialPortType;
use std::fmt;

/// One serial adapter visible to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Identifier passed to the opener (e.g. "/dev/ttyUSB0", "COM3").
    pub name: String,
    pub is_usb: bool,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub product: Option<String>,
}

impl From<serialport::SerialPortInfo> for PortInfo {
    fn from(info: serialport::SerialPortInfo) -> Self {
        match info.port_type {
            SerialPortType::UsbPort(usb) => Self {
                name: info.port_name,
                is_usb: true,
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                product: usb.product,
            },
            _ => Self {
                name: info.port_name,
                is_usb: false,
                vid: None,
                pid: None,
                product: None,
            },
        }
    }
}

impl fmt::Display for PortInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let (true, Some(vid), Some(pid)) = (self.is_usb, self.vid, self.pid) {
            write!(f, " [USB: {:04x}:{:04x}]", vid, pid)?;
        }
        if let Some(product) = self.product.as_deref().filter(|p| !p.is_empty()) {
            write!(f, " - {}", product)?;
        }
        Ok(())
    }
}

/// List the serial ports currently available on this host.
pub fn list_ports() -> Result<Vec<PortInfo>, PortError> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(PortInfo::from).collect())
}
