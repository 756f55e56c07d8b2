//! Probe sequences and response scoring.
//!
//! Probes are short wake-up/prompt triggers; different device firmwares
//! answer different ones. A response is scored on how much it looks like a
//! correctly framed console.

/// Probe sequence definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSequence {
    /// The bytes to send.
    pub command: Vec<u8>,

    /// Human-readable description.
    pub description: &'static str,
}

impl ProbeSequence {
    /// Create a new probe sequence.
    pub fn new(command: impl Into<Vec<u8>>, description: &'static str) -> Self {
        Self {
            command: command.into(),
            description,
        }
    }
}

/// Common probe sequences for console devices.
pub struct CommonProbes;

impl CommonProbes {
    /// Bare carriage return.
    pub fn carriage_return() -> ProbeSequence {
        ProbeSequence::new(b"\r".to_vec(), "CR")
    }

    /// Carriage return and line feed.
    pub fn crlf() -> ProbeSequence {
        ProbeSequence::new(b"\r\n".to_vec(), "CR+LF")
    }

    /// VT100 cursor-up, as sent by an arrow key.
    pub fn arrow_up() -> ProbeSequence {
        ProbeSequence::new(b"\x1b[A".to_vec(), "Arrow up")
    }

    /// "?" + CR, the help request on most router CLIs.
    pub fn help() -> ProbeSequence {
        ProbeSequence::new(b"?\r".to_vec(), "Help")
    }

    /// The four probes, in the order they are sent.
    pub fn console_set() -> Vec<ProbeSequence> {
        vec![
            Self::carriage_return(),
            Self::crlf(),
            Self::arrow_up(),
            Self::help(),
        ]
    }
}

/// Points for any non-empty response.
pub const RESPONSE_POINTS: u32 = 1;

/// Bonus when the response contains a prompt terminator.
pub const PROMPT_BONUS: u32 = 3;

/// Bonus when the response is mostly readable text.
pub const READABLE_BONUS: u32 = 2;

/// Common shell/device prompt terminators.
pub const PROMPT_CHARS: &[u8] = b">#$:";

/// Printable ASCII, CR, LF or TAB.
pub fn is_readable(byte: u8) -> bool {
    (32..=126).contains(&byte) || matches!(byte, b'\r' | b'\n' | b'\t')
}

/// Whether more than 70% of the bytes are readable.
pub fn is_mostly_readable(response: &[u8]) -> bool {
    let readable = response.iter().filter(|&&b| is_readable(b)).count();
    readable * 10 > response.len() * 7
}

/// Score one probe response. An empty response scores zero.
pub fn score_response(response: &[u8]) -> u32 {
    if response.is_empty() {
        return 0;
    }

    let mut score = RESPONSE_POINTS;
    if response.iter().any(|b| PROMPT_CHARS.contains(b)) {
        score += PROMPT_BONUS;
    }
    if is_mostly_readable(response) {
        score += READABLE_BONUS;
    }
    score
}
