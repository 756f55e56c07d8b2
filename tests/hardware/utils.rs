//! Utility functions for hardware testing.

use autoterm::link::LinkConfig;
use autoterm::port::list_ports;
use std::env;
use std::time::{Duration, Instant};

/// Test port configuration from environment.
pub struct TestPortConfig {
    pub port_name: String,
    pub baud_rate: u32,
}

impl TestPortConfig {
    /// Get test configuration from environment variables.
    pub fn from_env() -> Option<Self> {
        let port_name = env::var("TEST_PORT").ok()?;
        let baud_rate = env::var("TEST_BAUD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(9600);

        Some(TestPortConfig {
            port_name,
            baud_rate,
        })
    }

    /// Link defaults for the port under test.
    pub fn link_config(&self) -> LinkConfig {
        LinkConfig::new(&self.port_name, self.baud_rate)
    }
}

/// Skip test if hardware is not available.
pub fn skip_without_hardware() -> Option<TestPortConfig> {
    let config = TestPortConfig::from_env();
    if config.is_none() {
        println!("Skipping hardware test: TEST_PORT not set");
    }
    config
}

/// Print available ports for debugging.
pub fn print_available_ports() {
    match list_ports() {
        Ok(ports) if ports.is_empty() => println!("No serial ports detected on this system"),
        Ok(ports) => {
            println!("Available serial ports ({}):", ports.len());
            for (idx, port) in ports.iter().enumerate() {
                println!("  {}. {}", idx + 1, port);
            }
        }
        Err(e) => println!("Port enumeration failed: {}", e),
    }
}

/// Timing helper for measuring operation duration.
pub struct TimingHelper {
    start: Instant,
    name: String,
}

impl TimingHelper {
    pub fn new(name: &str) -> Self {
        println!("Starting: {}", name);
        TimingHelper {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn finish(self) -> Duration {
        let elapsed = self.start.elapsed();
        println!("Completed: {} in {:?}", self.name, elapsed);
        elapsed
    }
}
