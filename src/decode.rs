use encoding_rs::SHIFT_JIS;

use crate::error::{KakeiError, Result};

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// A candidate character encoding for a raw export.
///
/// `Cp932` decodes through encoding_rs' SHIFT_JIS table, which is the
/// Windows-31J superset these bank exports actually use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8Sig,
    Cp932,
    Utf8,
}

impl Encoding {
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Utf8Sig => "utf-8-sig",
            Encoding::Cp932 => "cp932",
            Encoding::Utf8 => "utf-8",
        }
    }

    /// Strict decode: `None` on any malformed byte. Lossy decoding is never
    /// acceptable here — downstream alias matching depends on exact text.
    fn try_decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            Encoding::Utf8Sig => {
                let body = bytes.strip_prefix(&UTF8_BOM).unwrap_or(bytes);
                std::str::from_utf8(body).ok().map(str::to_string)
            }
            Encoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_string),
            Encoding::Cp932 => SHIFT_JIS
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|cow| cow.into_owned()),
        }
    }
}

/// Decode raw export bytes by trying each candidate encoding in priority
/// order; the first strict success wins.
pub fn decode(bytes: &[u8], candidates: &[Encoding]) -> Result<(String, &'static str)> {
    for candidate in candidates {
        if let Some(text) = candidate.try_decode(bytes) {
            return Ok((text, candidate.name()));
        }
    }
    Err(KakeiError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD_ORDER: [Encoding; 3] = [Encoding::Utf8Sig, Encoding::Cp932, Encoding::Utf8];
    const BANK_ORDER: [Encoding; 3] = [Encoding::Cp932, Encoding::Utf8Sig, Encoding::Utf8];

    #[test]
    fn test_utf8_with_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("利用日,金額".as_bytes());
        let (text, name) = decode(&bytes, &CARD_ORDER).unwrap();
        assert_eq!(text, "利用日,金額");
        assert_eq!(name, "utf-8-sig");
    }

    #[test]
    fn test_utf8_without_bom() {
        let (text, name) = decode("取引日,摘要".as_bytes(), &CARD_ORDER).unwrap();
        assert_eq!(text, "取引日,摘要");
        assert_eq!(name, "utf-8-sig");
    }

    #[test]
    fn test_cp932_fallback() {
        let (bytes, _, _) = SHIFT_JIS.encode("取扱日付,お支払金額");
        // Shift_JIS kanji bytes are not valid UTF-8.
        assert!(std::str::from_utf8(&bytes).is_err());
        let (text, name) = decode(&bytes, &CARD_ORDER).unwrap();
        assert_eq!(text, "取扱日付,お支払金額");
        assert_eq!(name, "cp932");
    }

    #[test]
    fn test_bank_order_prefers_cp932() {
        let (text, name) = decode(b"date,amount", &BANK_ORDER).unwrap();
        assert_eq!(text, "date,amount");
        assert_eq!(name, "cp932");
    }

    #[test]
    fn test_undecodable_bytes() {
        // 0xFF is invalid in UTF-8 and not a Shift_JIS lead byte.
        let bytes = [0xFFu8, 0xFF, 0xFF];
        assert!(matches!(decode(&bytes, &CARD_ORDER), Err(KakeiError::Decode)));
    }
}
