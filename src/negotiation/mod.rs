//! Link parameter auto-negotiation.
//!
//! Probes an unknown device at each candidate baud rate, scores the
//! responses and picks the best rate, then guesses the text encoding from
//! the winning response.

pub mod detector;
pub mod probe;

pub use detector::{
    AutoNegotiator, CandidateScore, NegotiationOptions, NegotiationOutcome, NegotiationReport,
    ProbeResult, DEFAULT_ATTEMPTS, DEFAULT_PROBE_TIMEOUT, STANDARD_BAUD_RATES,
};
pub use probe::{score_response, CommonProbes, ProbeSequence};
