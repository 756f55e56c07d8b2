//! Shared test utilities for autoterm integration tests.
//!
//! This module provides common test infrastructure including:
//! - Simulated console devices that only answer at one baud rate
//! - Negotiation options that do not wait on real timeouts
//! - Sample console output in each supported encoding

#![allow(dead_code)]

use autoterm::link::LinkConfig;
use autoterm::negotiation::NegotiationOptions;
use autoterm::port::{MockPortOpener, MockSerialPort};
use std::time::{Duration, Instant};

pub const PORT: &str = "MOCK0";

/// "こんにちは>" in Shift-JIS.
pub const SJIS_PROMPT: &[u8] = &[0x82, 0xB1, 0x82, 0xF1, 0x82, 0xC9, 0x82, 0xBF, 0x82, 0xCD, b'>'];

/// "こんにちは>" in EUC-JP.
pub const EUC_PROMPT: &[u8] = &[0xA4, 0xB3, 0xA4, 0xF3, 0xA4, 0xCB, 0xA4, 0xC1, 0xA4, 0xCF, b'>'];

/// "こん" in ISO-2022-JP, shifted in and back out.
pub const ISO2022_HELLO: &[u8] = &[0x1B, 0x24, 0x42, 0x24, 0x33, 0x24, 0x73, 0x1B, 0x28, 0x42];

/// Link defaults for the mock port: 9600 8N1 UTF-8.
pub fn base_config() -> LinkConfig {
    LinkConfig::new(PORT, 9600)
}

/// Standard options with a 1ms probe timeout.
pub fn quick_options() -> NegotiationOptions {
    NegotiationOptions {
        probe_timeout: Duration::from_millis(1),
        ..NegotiationOptions::default()
    }
}

/// Device that answers every probe with `response`, but only at `live_baud`.
pub fn console_device(live_baud: u32, response: &'static [u8]) -> MockPortOpener {
    MockPortOpener::with_device(move |baud, _probe| (baud == live_baud).then(|| response.to_vec()))
}

/// Device that answers only the bare carriage return probe, at `live_baud`.
pub fn cr_only_device(live_baud: u32, response: &'static [u8]) -> MockPortOpener {
    MockPortOpener::with_device(move |baud, probe| {
        (baud == live_baud && probe == b"\r").then(|| response.to_vec())
    })
}

/// Mock port preloaded with the given read chunks.
pub fn create_mock_port_with_responses(port_name: &str, responses: Vec<&[u8]>) -> MockSerialPort {
    let mut mock = MockSerialPort::new(port_name);
    for response in responses {
        mock.enqueue_read(response);
    }
    mock
}

/// Poll `condition` until it holds or two seconds pass.
pub fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
