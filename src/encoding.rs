//! Character decoding of raw XML bytes per the `<?xml encoding="..."?>` declaration.

use thiserror::Error;

/// Only the leading declaration is inspected.
const DECLARATION_SCAN_LIMIT: usize = 1024;

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("Unsupported encoding: {0}")]
    Unsupported(String),
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Latin1,
}

impl Encoding {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" | "us-ascii" | "ascii" => Some(Self::Utf8),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" | "l1" => Some(Self::Latin1),
            _ => None,
        }
    }

    /// Encoding named by the XML declaration; UTF-8 when there is none.
    pub fn sniff(bytes: &[u8]) -> Result<Self, EncodingError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        match declared_label(bytes) {
            Some(label) => Self::from_label(&label).ok_or(EncodingError::Unsupported(label)),
            None => Ok(Self::Utf8),
        }
    }

    pub fn decode(self, bytes: Vec<u8>) -> Result<String, EncodingError> {
        match self {
            Self::Utf8 => Ok(String::from_utf8(bytes)?),
            // Latin-1 bytes are the first 256 code points.
            Self::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }
}

fn declared_label(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(DECLARATION_SCAN_LIMIT)];
    if !head.starts_with(b"<?xml") {
        return None;
    }
    let end = head.windows(2).position(|w| w == b"?>")?;
    let decl = String::from_utf8_lossy(&head[..end]);

    let rest = &decl[decl.find("encoding")? + "encoding".len()..];
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| matches!(c, '"' | '\''))?;
    let value = &rest[1..];
    Some(value[..value.find(quote)?].to_string())
}

/// Decode raw XML bytes into a string.
pub fn decode_xml(bytes: Vec<u8>) -> Result<String, EncodingError> {
    Encoding::sniff(&bytes)?.decode(bytes)
}
