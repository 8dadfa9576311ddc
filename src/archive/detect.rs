//! Container signature sniffing
//!
//! Extensions are advisory; the leading bytes decide.

use super::tar::is_ustar_header;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// How many leading bytes are inspected for binary content
const TEXT_PROBE_LEN: usize = 8192;

/// What the leading bytes of a bundle look like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    Empty,
    Gzip,
    Tar,
    /// JSON object, i.e. a candidate object export
    Json,
    Text,
    Unknown,
}

pub fn sniff(bytes: &[u8]) -> Signature {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Signature::Empty;
    }
    if bytes.starts_with(&GZIP_MAGIC) {
        return Signature::Gzip;
    }
    if is_ustar_header(bytes) {
        return Signature::Tar;
    }
    if !looks_like_text(bytes) {
        return Signature::Unknown;
    }
    let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
    if first == Some(&b'{') {
        Signature::Json
    } else {
        Signature::Text
    }
}

/// No NUL bytes and no invalid UTF-8 within the probe window
pub fn looks_like_text(bytes: &[u8]) -> bool {
    let probe = &bytes[..bytes.len().min(TEXT_PROBE_LEN)];
    if probe.contains(&0) {
        return false;
    }
    match std::str::from_utf8(probe) {
        Ok(_) => true,
        // a multi-byte character cut by the probe window is fine
        Err(e) => e.error_len().is_none() && probe.len() == TEXT_PROBE_LEN,
    }
}
