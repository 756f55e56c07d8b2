//! Integration tests for encoding detection and streaming decode.

mod common;

use autoterm::encoding::{detect, StreamDecoder, TextEncoding};
use common::*;
use proptest::prelude::*;

#[test]
fn test_detects_each_japanese_encoding() {
    assert_eq!(detect(SJIS_PROMPT), TextEncoding::ShiftJis);
    assert_eq!(detect(EUC_PROMPT), TextEncoding::EucJp);
    assert_eq!(detect(ISO2022_HELLO), TextEncoding::Iso2022Jp);
}

#[test]
fn test_ascii_and_empty_stay_utf8() {
    assert_eq!(detect(b"Router>"), TextEncoding::Utf8);
    assert_eq!(detect(b"Password:\r\n"), TextEncoding::Utf8);
    assert_eq!(detect(b""), TextEncoding::Utf8);
}

#[test]
fn test_detected_encoding_decodes_sample() {
    let encoding = detect(EUC_PROMPT);
    let mut decoder = StreamDecoder::new(encoding);
    assert_eq!(decoder.decode(EUC_PROMPT).as_ref(), "こんにちは>".as_bytes());
}

proptest! {
    #[test]
    fn prop_printable_ascii_is_utf8(text in "[ -~\r\n\t]{0,64}") {
        prop_assert_eq!(detect(text.as_bytes()), TextEncoding::Utf8);
    }

    /// Splitting Shift-JIS output at any byte must not change what is shown.
    #[test]
    fn prop_split_reads_decode_like_one(split in 0usize..=SJIS_PROMPT.len()) {
        let mut decoder = StreamDecoder::new(TextEncoding::ShiftJis);
        let mut shown = decoder.decode(&SJIS_PROMPT[..split]).into_owned();
        shown.extend_from_slice(&decoder.decode(&SJIS_PROMPT[split..]));
        prop_assert_eq!(String::from_utf8(shown).unwrap(), "こんにちは>");
    }
}
