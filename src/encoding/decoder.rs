use super::TextEncoding;
use encoding_rs::{DecoderResult, Encoding};
use std::borrow::Cow;
use tracing::debug;

/// Longest incomplete character or escape sequence held back between reads.
const MAX_HELD: usize = 3;

const ESC: u8 = 0x1B;

/// ISO-2022-JP designation of plain ASCII; needs no replay.
const ASCII_DESIGNATION: [u8; 3] = [ESC, b'(', b'B'];

/// Incremental decoder for the relay's receive path.
///
/// Trailing bytes of a multibyte character split across two reads are held
/// back and put in front of the next chunk; the last ISO-2022-JP escape
/// sequence is replayed so shift state also carries over. UTF-8 input is
/// passed through untouched.
#[derive(Debug)]
pub struct StreamDecoder {
    encoding: TextEncoding,
    held: Vec<u8>,
    shift: Vec<u8>,
}

impl StreamDecoder {
    pub fn new(encoding: TextEncoding) -> Self {
        Self {
            encoding,
            held: Vec::new(),
            shift: Vec::new(),
        }
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Bytes waiting for the rest of their character.
    pub fn held(&self) -> &[u8] {
        &self.held
    }

    /// Decode one received chunk to UTF-8.
    ///
    /// Malformed input makes this chunk, together with any bytes held from
    /// the previous one, fall back to the raw bytes and resets the shift
    /// state.
    pub fn decode<'a>(&mut self, input: &'a [u8]) -> Cow<'a, [u8]> {
        let Some(codec) = self.encoding.codec() else {
            return Cow::Borrowed(input);
        };

        let mut buf = std::mem::take(&mut self.held);
        buf.extend_from_slice(input);

        let shortest = buf.len().saturating_sub(MAX_HELD);
        for end in (shortest..=buf.len()).rev() {
            let (complete, tail) = buf.split_at(end);
            let shift = self.shift_after(complete);
            if !tail.is_empty() && !self.is_partial(codec, &shift, tail) {
                continue;
            }
            if let Some(text) = self.decode_complete(codec, complete) {
                self.held = tail.to_vec();
                self.shift = shift;
                return Cow::Owned(text.into_bytes());
            }
        }

        debug!(
            encoding = %self.encoding,
            len = buf.len(),
            "Undecodable input, passing raw bytes through"
        );
        self.shift.clear();
        Cow::Owned(buf)
    }

    /// Strict decode of whole characters, replaying the current shift.
    fn decode_complete(&self, codec: &'static Encoding, complete: &[u8]) -> Option<String> {
        if complete.is_empty() {
            return Some(String::new());
        }
        let input = with_shift(self.replayed(&self.shift, complete), complete);
        codec
            .decode_without_bom_handling_and_without_replacement(&input)
            .map(Cow::into_owned)
    }

    /// Whether `tail` is the start of a character that more bytes can finish.
    fn is_partial(&self, codec: &'static Encoding, shift: &[u8], tail: &[u8]) -> bool {
        let input = with_shift(self.replayed(shift, tail), tail);
        let mut decoder = codec.new_decoder_without_bom_handling();
        let mut output = String::with_capacity(16);
        let (result, _read) =
            decoder.decode_to_string_without_replacement(&input, &mut output, false);
        matches!(result, DecoderResult::InputEmpty) && output.is_empty()
    }

    /// Escape sequence in effect once `complete` has been decoded.
    fn shift_after(&self, complete: &[u8]) -> Vec<u8> {
        if self.encoding != TextEncoding::Iso2022Jp {
            return Vec::new();
        }
        complete
            .windows(ASCII_DESIGNATION.len())
            .rposition(|window| window[0] == ESC)
            .map(|start| complete[start..start + ASCII_DESIGNATION.len()].to_vec())
            .unwrap_or_else(|| self.shift.clone())
    }

    /// Shift to put in front of `segment`, if any.
    ///
    /// A segment opening with its own escape needs none: two escapes in a
    /// row are an error in ISO-2022-JP.
    fn replayed<'s>(&self, shift: &'s [u8], segment: &[u8]) -> &'s [u8] {
        if shift == ASCII_DESIGNATION || segment.first() == Some(&ESC) {
            return &[];
        }
        shift
    }
}

fn with_shift<'a>(shift: &[u8], segment: &'a [u8]) -> Cow<'a, [u8]> {
    if shift.is_empty() {
        return Cow::Borrowed(segment);
    }
    let mut joined = Vec::with_capacity(shift.len() + segment.len());
    joined.extend_from_slice(shift);
    joined.extend_from_slice(segment);
    Cow::Owned(joined)
}
