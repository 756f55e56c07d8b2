//! Tests requiring actual serial hardware.
//!
//! # Running Hardware Tests
//!
//! ```bash
//! export TEST_PORT=/dev/ttyUSB0     # or COM3 on Windows
//! export TEST_BAUD=9600             # optional fallback, default: 9600
//! cargo test --features hardware-tests --test integration_hardware -- --ignored --nocapture
//! ```
//!
//! A console device (router, switch, embedded shell) should be attached so
//! negotiation has something to talk to.

use super::utils::{print_available_ports, skip_without_hardware, TimingHelper};
use autoterm::negotiation::{AutoNegotiator, NegotiationOptions, STANDARD_BAUD_RATES};
use autoterm::port::{
    list_ports, PortConfiguration, PortOpener, SerialPortAdapter, SystemPortOpener,
};
use autoterm::relay::{RelayOptions, Session};
use std::time::Duration;

#[test]
#[ignore] // Run with --ignored flag
fn test_port_listed() {
    let Some(test) = skip_without_hardware() else {
        return;
    };
    print_available_ports();

    let ports = list_ports().expect("port enumeration failed");
    assert!(
        ports.iter().any(|p| p.name == test.port_name),
        "{} not among enumerated ports",
        test.port_name
    );
}

#[test]
#[ignore]
fn test_open_write_close() {
    let Some(test) = skip_without_hardware() else {
        return;
    };

    let config = PortConfiguration::default()
        .with_baud_rate(test.baud_rate)
        .with_timeout(Duration::from_millis(200));
    let mut port = SystemPortOpener
        .open(&test.port_name, &config)
        .expect("failed to open test port");

    assert_eq!(port.write_bytes(b"\r").expect("write failed"), 1);
    drop(port);

    // Released handle can be reopened straight away.
    SystemPortOpener
        .open(&test.port_name, &config)
        .expect("port was not released");
}

#[test]
#[ignore]
fn test_negotiate_real_device() {
    let Some(test) = skip_without_hardware() else {
        return;
    };

    let timer = TimingHelper::new("negotiation");
    let negotiator = AutoNegotiator::new(SystemPortOpener, NegotiationOptions::default());
    let report = negotiator.negotiate(&test.port_name, &test.link_config());
    timer.finish();

    println!("Outcome: {:?}", report.outcome);
    for candidate in &report.candidates {
        println!("  {} bps: {}", candidate.baud_rate, candidate.score);
    }

    assert_eq!(report.candidates.len(), STANDARD_BAUD_RATES.len());
    if report.is_detected() {
        assert!(STANDARD_BAUD_RATES.contains(&report.config.baud_rate));
    } else {
        assert_eq!(report.config.baud_rate, test.baud_rate);
    }
}

#[test]
#[ignore]
fn test_session_poll_real_device() {
    let Some(test) = skip_without_hardware() else {
        return;
    };

    let options = RelayOptions::default();
    let mut session = Session::open(&SystemPortOpener, &test.link_config(), &options)
        .expect("failed to open session");

    let mut display = Vec::new();
    for _ in 0..50 {
        session.poll(&mut display).expect("read failed");
        std::thread::sleep(Duration::from_millis(10));
    }
    println!("Received {} bytes while idle", display.len());
}
