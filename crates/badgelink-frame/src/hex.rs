//! Hex helpers for frame dumps and captured traces.

use std::fmt::Write;

use crate::error::{FrameError, Result};

/// Parse a hex dump into bytes.
///
/// Accepts whitespace, `,` and `:` separated tokens with an optional `0x`
/// prefix (`"00 00 bb fa"`, `"0xBB,0xFA"`) as well as unseparated pairs
/// (`"0000bbfa"`).
pub fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for token in input
        .split(|c: char| c.is_whitespace() || c == ',' || c == ':')
        .filter(|t| !t.is_empty())
    {
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        if digits.is_empty() || digits.len() % 2 != 0 || !digits.is_ascii() {
            return Err(invalid(token));
        }
        for pair in digits.as_bytes().chunks(2) {
            let pair = std::str::from_utf8(pair).map_err(|_| invalid(token))?;
            let byte = u8::from_str_radix(pair, 16).map_err(|_| invalid(token))?;
            out.push(byte);
        }
    }
    Ok(out)
}

/// Format bytes as space separated upper-case hex pairs.
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{b:02X}");
    }
    out
}

fn invalid(token: &str) -> FrameError {
    FrameError::InvalidHex {
        token: token.to_string(),
    }
}
