//! Encoding auto-detection heuristic.
//!
//! Each candidate decoder is run over a response sample; the candidate whose
//! output has the fewest high-bit bytes not followed by a UTF-8 continuation
//! byte wins. This is a structural plausibility check, not a validity check.

use super::TextEncoding;
use tracing::{debug, trace};

/// Candidates in evaluation order. Ties keep the earlier entry.
pub const DETECTION_CANDIDATES: [TextEncoding; 3] = [
    TextEncoding::ShiftJis,
    TextEncoding::EucJp,
    TextEncoding::Iso2022Jp,
];

/// Count bytes `>= 0x80` whose next byte is missing or not of the form `10xxxxxx`.
pub fn count_malformed(decoded: &[u8]) -> usize {
    decoded
        .iter()
        .enumerate()
        .filter(|&(i, &byte)| {
            byte >= 0x80
                && decoded
                    .get(i + 1)
                    .map_or(true, |&next| next & 0xC0 != 0x80)
        })
        .count()
}

/// Guess the encoding of a device response sample. Never fails; UTF-8 is
/// returned when no candidate beats the baseline.
///
/// The baseline is the sample length. A candidate is skipped when strict
/// decoding rejects the sample, or when decoding leaves it byte-identical
/// (plain ASCII carries no evidence for any legacy encoding).
pub fn detect(sample: &[u8]) -> TextEncoding {
    let mut best = TextEncoding::Utf8;
    let mut fewest_malformed = sample.len();

    for candidate in DETECTION_CANDIDATES {
        let Some(codec) = candidate.codec() else {
            continue;
        };

        let Some(decoded) = codec.decode_without_bom_handling_and_without_replacement(sample)
        else {
            trace!(encoding = %candidate, "Sample is not valid in candidate encoding");
            continue;
        };

        if decoded.as_bytes() == sample {
            continue;
        }

        let malformed = count_malformed(decoded.as_bytes());
        trace!(encoding = %candidate, malformed, "Scored encoding candidate");

        if malformed < fewest_malformed {
            fewest_malformed = malformed;
            best = candidate;
        }
    }

    debug!(encoding = %best, sample_len = sample.len(), "Encoding detection finished");
    best
}
