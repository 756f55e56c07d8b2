//! Baud rate auto-negotiation engine.
//!
//! `AutoNegotiator` opens the port at every candidate baud rate, sends the
//! console probes, scores whatever comes back and keeps the best-scoring
//! rate. The winning rate's first response sample feeds encoding detection.

use super::probe::{score_response, CommonProbes, ProbeSequence};
use crate::encoding::{self, TextEncoding};
use crate::link::LinkConfig;
use crate::port::PortOpener;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Candidate baud rates, most common first.
///
/// Order only matters for tie-breaking: the earlier rate wins a tie.
pub const STANDARD_BAUD_RATES: [u32; 8] = [9600, 115200, 19200, 38400, 57600, 4800, 2400, 1200];

/// Independent open/probe/close rounds per candidate.
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// How long to wait for an answer to each probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(300);

/// Largest response read per probe.
const RESPONSE_BUFFER: usize = 1024;

/// Tuning for a negotiation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationOptions {
    /// Candidates in priority order.
    pub baud_rates: Vec<u32>,
    pub attempts: u32,
    pub probe_timeout: Duration,
    /// Run encoding detection on the winning sample.
    pub detect_encoding: bool,
}

impl Default for NegotiationOptions {
    fn default() -> Self {
        Self {
            baud_rates: STANDARD_BAUD_RATES.to_vec(),
            attempts: DEFAULT_ATTEMPTS,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            detect_encoding: true,
        }
    }
}

/// Accumulated evidence for one candidate baud rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub baud_rate: u32,
    pub score: u32,
    /// First non-empty response seen at this rate.
    pub sample: Option<Vec<u8>>,
}

impl ProbeResult {
    pub fn new(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            score: 0,
            sample: None,
        }
    }

    /// Add one probe response to the tally.
    pub fn record(&mut self, response: &[u8]) {
        if response.is_empty() {
            return;
        }
        self.score += score_response(response);
        if self.sample.is_none() {
            self.sample = Some(response.to_vec());
        }
    }
}

/// Final score of a candidate, kept for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateScore {
    pub baud_rate: u32,
    pub score: u32,
}

/// Whether negotiation found a working baud rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationOutcome {
    Detected {
        baud_rate: u32,
        score: u32,
        /// Set when encoding detection ran on the winning sample.
        encoding: Option<TextEncoding>,
    },
    /// Every candidate scored zero; the base configuration was kept.
    NotDetected,
}

/// Result of [`AutoNegotiator::negotiate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationReport {
    /// Configuration to run the session with.
    pub config: LinkConfig,
    pub outcome: NegotiationOutcome,
    /// Every candidate's score in evaluation order.
    pub candidates: Vec<CandidateScore>,
}

impl NegotiationReport {
    pub fn is_detected(&self) -> bool {
        matches!(self.outcome, NegotiationOutcome::Detected { .. })
    }
}

/// Baud rate negotiation engine.
pub struct AutoNegotiator<O: PortOpener> {
    opener: O,
    options: NegotiationOptions,
    probes: Vec<ProbeSequence>,
}

impl<O: PortOpener> AutoNegotiator<O> {
    /// Create a negotiator sending the standard console probes.
    pub fn new(opener: O, options: NegotiationOptions) -> Self {
        Self {
            opener,
            options,
            probes: CommonProbes::console_set(),
        }
    }

    /// Replace the probe set.
    pub fn with_probes(mut self, probes: Vec<ProbeSequence>) -> Self {
        self.probes = probes;
        self
    }

    pub fn options(&self) -> &NegotiationOptions {
        &self.options
    }

    pub fn probes(&self) -> &[ProbeSequence] {
        &self.probes
    }

    /// Find the baud rate (and optionally the encoding) the device on
    /// `port_name` talks at.
    ///
    /// Never fails: when no candidate gets any response, the returned
    /// configuration keeps the baud rate and encoding from `base`.
    pub fn negotiate(&self, port_name: &str, base: &LinkConfig) -> NegotiationReport {
        let mut config = base.clone();
        config.port_name = port_name.to_string();

        info!(
            "Detecting baud rate on {} ({} candidates)",
            port_name,
            self.options.baud_rates.len()
        );

        let mut best: Option<ProbeResult> = None;
        let mut candidates = Vec::with_capacity(self.options.baud_rates.len());

        for &baud_rate in &self.options.baud_rates {
            let result = self.probe_candidate(port_name, baud_rate, &config);

            if result.score > 0 {
                info!("  {} bps: response (score {})", baud_rate, result.score);
            } else {
                info!("  {} bps: no response", baud_rate);
            }

            candidates.push(CandidateScore {
                baud_rate,
                score: result.score,
            });

            if result.score > best.as_ref().map_or(0, |b| b.score) {
                best = Some(result);
            }
        }

        let Some(winner) = best else {
            warn!(
                "Baud rate detection failed, using defaults ({} bps, {})",
                config.baud_rate, config.encoding
            );
            return NegotiationReport {
                config,
                outcome: NegotiationOutcome::NotDetected,
                candidates,
            };
        };

        config.baud_rate = winner.baud_rate;
        info!(
            "Best baud rate: {} bps (score {})",
            winner.baud_rate, winner.score
        );

        let mut detected = None;
        if self.options.detect_encoding {
            if let Some(sample) = winner.sample.as_deref().filter(|s| !s.is_empty()) {
                let encoding = encoding::detect(sample);
                info!("Detected encoding: {}", encoding);
                config.encoding = encoding;
                detected = Some(encoding);
            }
        }

        NegotiationReport {
            config,
            outcome: NegotiationOutcome::Detected {
                baud_rate: winner.baud_rate,
                score: winner.score,
                encoding: detected,
            },
            candidates,
        }
    }

    /// Run every attempt for one candidate and total the scores.
    ///
    /// Each attempt holds the port only for its own scope; failures to open,
    /// write or read just contribute nothing.
    pub fn probe_candidate(
        &self,
        port_name: &str,
        baud_rate: u32,
        base: &LinkConfig,
    ) -> ProbeResult {
        let mut result = ProbeResult::new(baud_rate);
        let port_config = base
            .port_configuration(self.options.probe_timeout)
            .with_baud_rate(baud_rate);

        for attempt in 1..=self.options.attempts {
            let mut link = match self.opener.open(port_name, &port_config) {
                Ok(link) => link,
                Err(e) => {
                    debug!(baud_rate, attempt, error = %e, "Failed to open port");
                    continue;
                }
            };

            for probe in &self.probes {
                if let Err(e) = link.write_bytes(&probe.command) {
                    debug!(
                        baud_rate,
                        probe = probe.description,
                        error = %e,
                        "Failed to send probe"
                    );
                    continue;
                }

                let mut buffer = [0u8; RESPONSE_BUFFER];
                match link.read_bytes(&mut buffer) {
                    Ok(n) if n > 0 => {
                        trace!(
                            baud_rate,
                            probe = probe.description,
                            response = %String::from_utf8_lossy(&buffer[..n]),
                            "Probe answered"
                        );
                        result.record(&buffer[..n]);
                    }
                    Ok(_) => {}
                    Err(e) if e.is_timeout() => {
                        trace!(baud_rate, probe = probe.description, "No answer to probe");
                    }
                    Err(e) => {
                        debug!(baud_rate, probe = probe.description, error = %e, "Read failed");
                    }
                }
            }
        }

        result
    }
}
