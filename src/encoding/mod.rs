//! Text encodings the terminal can decode device output from.
//!
//! The set is closed: UTF-8 (pass-through) plus the three Japanese legacy
//! encodings commonly found on network equipment consoles.

mod decoder;
mod detector;

pub use decoder::StreamDecoder;
pub use detector::{count_malformed, detect, DETECTION_CANDIDATES};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A text encoding identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextEncoding {
    #[default]
    #[serde(rename = "UTF-8")]
    Utf8,
    #[serde(rename = "Shift-JIS")]
    ShiftJis,
    #[serde(rename = "EUC-JP")]
    EucJp,
    #[serde(rename = "ISO-2022-JP")]
    Iso2022Jp,
}

impl TextEncoding {
    /// Every supported encoding, UTF-8 first.
    pub const ALL: [TextEncoding; 4] = [
        TextEncoding::Utf8,
        TextEncoding::ShiftJis,
        TextEncoding::EucJp,
        TextEncoding::Iso2022Jp,
    ];

    /// Display name, also accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "UTF-8",
            TextEncoding::ShiftJis => "Shift-JIS",
            TextEncoding::EucJp => "EUC-JP",
            TextEncoding::Iso2022Jp => "ISO-2022-JP",
        }
    }

    /// Decoder backing this encoding; `None` for UTF-8, which is passed through.
    pub fn codec(self) -> Option<&'static encoding_rs::Encoding> {
        match self {
            TextEncoding::Utf8 => None,
            TextEncoding::ShiftJis => Some(encoding_rs::SHIFT_JIS),
            TextEncoding::EucJp => Some(encoding_rs::EUC_JP),
            TextEncoding::Iso2022Jp => Some(encoding_rs::ISO_2022_JP),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when parsing an encoding name that is not in the supported set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown encoding '{0}' (expected UTF-8, Shift-JIS, EUC-JP or ISO-2022-JP)")]
pub struct UnknownEncoding(pub String);

impl FromStr for TextEncoding {
    type Err = UnknownEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "utf8" => Ok(TextEncoding::Utf8),
            "shiftjis" | "sjis" | "cp932" => Ok(TextEncoding::ShiftJis),
            "eucjp" => Ok(TextEncoding::EucJp),
            "iso2022jp" | "jis" => Ok(TextEncoding::Iso2022Jp),
            _ => Err(UnknownEncoding(s.to_string())),
        }
    }
}
