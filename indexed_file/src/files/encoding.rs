//! BOM-based encoding detection and the per-encoding newline padding rules
//!.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Utf16Be,
    Utf16Le,
    Utf32Be,
    Utf32Le,
}

impl Encoding {
    /// Bytes trimmed off the *front* of a line once the newline byte has
    /// been found, to drop the encoding's own zero-padding before the first
    /// character of the next line. Only relevant to BE variants, where the
    /// ASCII newline byte is the *low* byte and is followed, not preceded,
    /// by padding.
    pub fn eol_left_padding(self) -> usize {
        match self {
            Encoding::Utf8 => 0,
            Encoding::Utf16Be => 1,
            Encoding::Utf16Le => 0,
            Encoding::Utf32Be => 3,
            Encoding::Utf32Le => 0,
        }
    }

    /// Bytes that follow the ASCII `\n` byte and must be consumed (but not
    /// kept) as part of the newline sequence itself.
    pub fn eol_right_padding(self) -> usize {
        match self {
            Encoding::Utf8 => 0,
            Encoding::Utf16Be => 0,
            Encoding::Utf16Le => 1,
            Encoding::Utf32Be => 0,
            Encoding::Utf32Le => 3,
        }
    }

    pub fn char_width(self) -> usize {
        match self {
            Encoding::Utf8 => 1,
            Encoding::Utf16Be | Encoding::Utf16Le => 2,
            Encoding::Utf32Be | Encoding::Utf32Le => 4,
        }
    }

    /// Decode a raw byte slice (already stripped of left padding, not
    /// including the terminating newline sequence) into UTF-8.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Encoding::Utf16Be | Encoding::Utf16Le => {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|c| match self {
                        Encoding::Utf16Be => u16::from_be_bytes([c[0], c[1]]),
                        _ => u16::from_le_bytes([c[0], c[1]]),
                    })
                    .collect();
                String::from_utf16_lossy(&units)
            }
            Encoding::Utf32Be | Encoding::Utf32Le => bytes
                .chunks_exact(4)
                .map(|c| {
                    let v = match self {
                        Encoding::Utf32Be => u32::from_be_bytes([c[0], c[1], c[2], c[3]]),
                        _ => u32::from_le_bytes([c[0], c[1], c[2], c[3]]),
                    };
                    char::from_u32(v).unwrap_or(char::REPLACEMENT_CHARACTER)
                })
                .collect(),
        }
    }
}

/// The low byte of the ASCII newline character in each encoding, used to
/// scan raw byte buffers for line boundaries before any decoding happens.
pub fn newline_byte() -> u8 {
    b'\n'
}

/// Detect a leading byte-order mark and return the encoding plus the
/// number of bytes it occupies. Defaults to UTF-8 with no BOM.
pub fn detect_bom(bytes: &[u8]) -> (Encoding, usize) {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        (Encoding::Utf8, 3)
    } else if bytes.starts_with(&[0x00, 0x00, 0xFE, 0xFF]) {
        (Encoding::Utf32Be, 4)
    } else if bytes.starts_with(&[0xFF, 0xFE, 0x00, 0x00]) {
        (Encoding::Utf32Le, 4)
    } else if bytes.starts_with(&[0xFE, 0xFF]) {
        (Encoding::Utf16Be, 2)
    } else if bytes.starts_with(&[0xFF, 0xFE]) {
        (Encoding::Utf16Le, 2)
    } else {
        (Encoding::Utf8, 0)
    }
}

}
