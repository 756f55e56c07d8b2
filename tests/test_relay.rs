//! Integration tests for the terminal relay and session log.

mod common;

use autoterm::encoding::TextEncoding;
use autoterm::link::LinkConfig;
use autoterm::port::{MockPortOpener, MockSerialPort};
use autoterm::relay::{Relay, RelayError, RelayOptions};
use common::*;
use pretty_assertions::assert_eq;
use std::io::{Cursor, ErrorKind};
use std::time::Duration;

fn fast_options() -> RelayOptions {
    RelayOptions {
        read_timeout: Duration::from_millis(1),
        poll_interval: Duration::from_millis(1),
        write_timeout: Duration::from_millis(100),
    }
}

#[test]
fn test_session_log_receives_banner_and_output() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("logs").join("session.log");

    let mut port = create_mock_port_with_responses(PORT, vec![b"login: ", b"password: "]);
    port.enqueue_read_error(ErrorKind::BrokenPipe);
    let opener = MockPortOpener::with_port(port);

    let config = LinkConfig::new(PORT, 9600).with_log_path(&log_path);
    let mut display = Vec::new();
    let result = Relay::new(fast_options()).connect(
        &opener,
        &config,
        Cursor::new(Vec::new()),
        &mut display,
    );

    assert!(matches!(result, Err(RelayError::LinkRead(_))));
    assert_eq!(display, b"login: password: ");

    let content = std::fs::read_to_string(&log_path).unwrap();
    let mut parts = content.splitn(3, '\n');
    let banner = parts.next().unwrap();
    assert!(banner.starts_with("===== Session start: "));
    assert!(banner.ends_with(" ====="));
    assert_eq!(parts.next().unwrap(), "Port: MOCK0, Baud: 9600, Encoding: UTF-8");
    assert_eq!(parts.next().unwrap(), "login: password: ");
}

#[test]
fn test_utf8_output_is_byte_identical() {
    let raw: &[u8] = &[b'o', b'k', 0xE3, 0x81, 0x82, 0xFF, b'\r', b'\n'];
    let mut port = create_mock_port_with_responses(PORT, vec![raw]);
    port.enqueue_read_error(ErrorKind::BrokenPipe);
    let opener = MockPortOpener::with_port(port);

    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("session.log");
    let config = LinkConfig::new(PORT, 115200).with_log_path(&log_path);

    let mut display = Vec::new();
    let _ = Relay::new(fast_options()).connect(
        &opener,
        &config,
        Cursor::new(Vec::new()),
        &mut display,
    );

    assert_eq!(display, raw);

    // Everything after the two banner lines is the device output as received.
    let content = std::fs::read(&log_path).unwrap();
    let line_end = |from: usize| from + content[from..].iter().position(|&b| b == b'\n').unwrap();
    let body_start = line_end(line_end(0) + 1) + 1;
    assert_eq!(&content[body_start..], raw);
}

#[test]
fn test_failed_writes_leave_inbound_running() {
    let mut port = create_mock_port_with_responses(PORT, vec![b"one ", b"two"]);
    port.enqueue_read_error(ErrorKind::BrokenPipe);
    port.set_fail_writes(true);
    let opener = MockPortOpener::with_port(port.clone());

    let mut display = Vec::new();
    let result = Relay::new(fast_options()).connect(
        &opener,
        &LinkConfig::new(PORT, 9600),
        Cursor::new(b"abc".to_vec()),
        &mut display,
    );

    assert!(matches!(result, Err(RelayError::LinkRead(_))));
    assert_eq!(display, b"one two");
    assert!(port.get_write_log().is_empty());
}

#[test]
fn test_shift_jis_output_decoded_across_reads() {
    // Split the second character between reads.
    let chunks = vec![&SJIS_PROMPT[..3], &SJIS_PROMPT[3..]];
    let mut port = create_mock_port_with_responses(PORT, chunks);
    port.enqueue_read_error(ErrorKind::BrokenPipe);
    let opener = MockPortOpener::with_port(port);

    let config = LinkConfig::new(PORT, 9600).with_encoding(TextEncoding::ShiftJis);
    let mut display = Vec::new();
    let _ = Relay::new(fast_options()).connect(
        &opener,
        &config,
        Cursor::new(Vec::new()),
        &mut display,
    );

    assert_eq!(String::from_utf8(display).unwrap(), "こんにちは>");
}

#[test]
fn test_operator_input_forwarded_byte_by_byte() {
    let port = MockSerialPort::new(PORT);
    let opener = MockPortOpener::with_port(port.clone());
    let relay = Relay::new(fast_options());
    let shutdown = relay.shutdown_handle();

    let worker = std::thread::spawn(move || {
        relay.connect(
            &opener,
            &LinkConfig::new(PORT, 9600),
            Cursor::new(b"show ver\r".to_vec()),
            &mut Vec::new(),
        )
    });

    assert!(wait_for(|| port.get_write_log().len() == 9));
    shutdown.store(true, std::sync::atomic::Ordering::SeqCst);
    worker.join().unwrap().unwrap();

    let writes = port.get_write_log();
    assert!(writes.iter().all(|w| w.len() == 1));
    assert_eq!(port.written_bytes(), b"show ver\r");
}

#[test]
fn test_bad_log_path_fails_before_link_opens() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let opener = MockPortOpener::silent();
    let config = LinkConfig::new(PORT, 9600).with_log_path(blocker.join("session.log"));
    let result = Relay::new(fast_options()).connect(
        &opener,
        &config,
        Cursor::new(Vec::new()),
        &mut Vec::new(),
    );

    assert!(matches!(result, Err(RelayError::LogDirectory { .. })));
    assert!(opener.open_attempts().is_empty());
}

#[test]
fn test_unopenable_link_is_reported() {
    let opener = MockPortOpener::silent().with_busy_baud_rates(vec![9600]);
    let result = Relay::new(fast_options()).connect(
        &opener,
        &LinkConfig::new(PORT, 9600),
        Cursor::new(Vec::new()),
        &mut Vec::new(),
    );

    match result {
        Err(RelayError::LinkOpen { port, .. }) => assert_eq!(port, PORT),
        other => panic!("expected LinkOpen, got {:?}", other),
    }
}
