use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Text encoding of a lint report on disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    /// Sniff a BOM, then the NUL pattern of BOM-less UTF-16, else UTF-8.
    #[default]
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "utf-16le")]
    Utf16Le,
    #[serde(rename = "utf-16be")]
    Utf16Be,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Auto => "auto",
            Encoding::Utf8 => "utf-8",
            Encoding::Utf16Le => "utf-16le",
            Encoding::Utf16Be => "utf-16be",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "auto" => Ok(Encoding::Auto),
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "utf-16le" | "utf16le" | "utf-16" | "utf16" => Ok(Encoding::Utf16Le),
            "utf-16be" | "utf16be" => Ok(Encoding::Utf16Be),
            other => Err(format!("unsupported encoding: {other} (expected auto, utf-8, utf-16le, utf-16be)")),
        }
    }
}

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: [u8; 2] = [0xFF, 0xFE];
const UTF16BE_BOM: [u8; 2] = [0xFE, 0xFF];

/// Bytes inspected when guessing BOM-less UTF-16.
const SNIFF_LEN: usize = 512;

pub fn detect_encoding(bytes: &[u8]) -> Encoding {
    if bytes.starts_with(&UTF8_BOM) {
        return Encoding::Utf8;
    }
    if bytes.starts_with(&UTF16LE_BOM) {
        return Encoding::Utf16Le;
    }
    if bytes.starts_with(&UTF16BE_BOM) {
        return Encoding::Utf16Be;
    }

    // ASCII-heavy UTF-16 text has a NUL in every other byte.
    let head = &bytes[..bytes.len().min(SNIFF_LEN)];
    if head.len() >= 2 {
        let pairs = head.len() / 2;
        let odd_nul = head.chunks_exact(2).filter(|p| p[0] != 0 && p[1] == 0).count();
        let even_nul = head.chunks_exact(2).filter(|p| p[0] == 0 && p[1] != 0).count();
        if odd_nul * 4 >= pairs * 3 {
            return Encoding::Utf16Le;
        }
        if even_nul * 4 >= pairs * 3 {
            return Encoding::Utf16Be;
        }
    }
    Encoding::Utf8
}

/// Decode report bytes. Never fails: bad sequences become U+FFFD and a BOM is dropped.
pub fn decode(bytes: &[u8], encoding: Encoding) -> String {
    let encoding = match encoding {
        Encoding::Auto => detect_encoding(bytes),
        other => other,
    };
    let text = match encoding {
        Encoding::Utf16Le => decode_utf16(bytes, u16::from_le_bytes),
        Encoding::Utf16Be => decode_utf16(bytes, u16::from_be_bytes),
        Encoding::Utf8 | Encoding::Auto => String::from_utf8_lossy(bytes).into_owned(),
    };
    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    // a dangling odd byte is ignored
    let units = bytes.chunks_exact(2).map(|p| unit([p[0], p[1]]));
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

pub fn read_report(path: &Path, encoding: Encoding) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("read report {}", path.display()))?;
    Ok(decode(&bytes, encoding))
}

/// A missing report counts as an empty one.
pub fn read_report_or_empty(path: &Path, encoding: Encoding) -> Result<String> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "report not found; treating as empty");
        return Ok(String::new());
    }
    read_report(path, encoding)
}

/// Split into lines, keeping each line's terminator.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

/// Write lines as UTF-8. Lines are expected to carry their own terminators.
pub fn write_report(path: &Path, lines: &[&str]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
    }
    std::fs::write(path, lines.concat()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le(s: &str, bom: bool) -> Vec<u8> {
        let mut out = if bom { UTF16LE_BOM.to_vec() } else { vec![] };
        for u in s.encode_utf16() {
            out.extend_from_slice(&u.to_le_bytes());
        }
        out
    }

    fn utf16be(s: &str, bom: bool) -> Vec<u8> {
        let mut out = if bom { UTF16BE_BOM.to_vec() } else { vec![] };
        for u in s.encode_utf16() {
            out.extend_from_slice(&u.to_be_bytes());
        }
        out
    }

    #[test]
    fn detects_boms() {
        assert_eq!(detect_encoding(&utf16le("File a.c", true)), Encoding::Utf16Le);
        assert_eq!(detect_encoding(&[0xFE, 0xFF, 0x00, 0x46]), Encoding::Utf16Be);
        assert_eq!(detect_encoding(b"\xEF\xBB\xBFFile a.c"), Encoding::Utf8);
        assert_eq!(detect_encoding(b"File a.c"), Encoding::Utf8);
        assert_eq!(detect_encoding(b""), Encoding::Utf8);
    }

    #[test]
    fn detects_bomless_utf16le() {
        assert_eq!(detect_encoding(&utf16le("File application\\source\\a.c\r\n", false)), Encoding::Utf16Le);
    }

    #[test]
    fn decodes_utf16_and_drops_bom() {
        let text = "File application\\source\\a.c: x\r\n  advisory\r\n";
        assert_eq!(decode(&utf16le(text, true), Encoding::Auto), text);
        assert_eq!(decode(&utf16le(text, true), Encoding::Utf16Le), text);
    }

    #[test]
    fn decodes_utf16be_with_and_without_bom() {
        let text = "File application\\source\\a.c: x [Rule 9.1, mandatory]\r\n  required: ö\r\n";
        assert_eq!(decode(&utf16be(text, true), Encoding::Auto), text);
        assert_eq!(decode(&utf16be(text, true), Encoding::Utf16Be), text);
        assert_eq!(decode(&utf16be(text, false), Encoding::Auto), text);
    }

    #[test]
    fn odd_trailing_byte_is_ignored() {
        let mut bytes = utf16le("ab", false);
        bytes.push(0x41);
        assert_eq!(decode(&bytes, Encoding::Utf16Le), "ab");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        assert_eq!(decode(b"ok \xFF", Encoding::Utf8), "ok \u{fffd}");
    }

    #[test]
    fn split_keeps_terminators() {
        assert_eq!(split_lines("a\r\nb\n\nc"), vec!["a\r\n", "b\n", "\n", "c"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn parse_encoding_names() {
        assert_eq!("UTF-16".parse::<Encoding>().unwrap(), Encoding::Utf16Le);
        assert_eq!("utf8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert!("latin1".parse::<Encoding>().is_err());
    }
}
