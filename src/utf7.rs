//! Modified UTF-7 codec for mailbox names (RFC 3501 §5.1.3).
//!
//! Differs from RFC 2152 UTF-7 in two ways: the modified Base64 alphabet
//! uses `,` where standard Base64 uses `/`, and no `=` padding is ever
//! emitted. `&` is escaped as `&-`; any other non-ASCII or non-printable
//! character starts a shifted run that ends at an explicit `-` or at the
//! first character outside the modified Base64 alphabet.

use base64::Engine;
use base64::alphabet::Alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};

use crate::error::{Error, Result};

fn engine() -> GeneralPurpose {
    let alphabet = Alphabet::new(
        "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+,",
    )
    .expect("modified Base64 alphabet is a valid 64-character set");
    GeneralPurpose::new(&alphabet, GeneralPurposeConfig::new().with_encode_padding(false))
}

/// Encodes a mailbox name into modified UTF-7.
#[must_use]
pub fn encode(input: &str) -> String {
    let mut out = String::new();
    let mut pending: Vec<u16> = Vec::new();
    for ch in input.chars() {
        if ch == '&' {
            flush_shifted(&mut out, &mut pending);
            out.push_str("&-");
        } else if (' '..='~').contains(&ch) {
            flush_shifted(&mut out, &mut pending);
            out.push(ch);
        } else {
            let mut buf = [0_u16; 2];
            pending.extend_from_slice(ch.encode_utf16(&mut buf));
        }
    }
    flush_shifted(&mut out, &mut pending);
    out
}

fn flush_shifted(out: &mut String, pending: &mut Vec<u16>) {
    if pending.is_empty() {
        return;
    }
    let mut bytes = Vec::with_capacity(pending.len() * 2);
    for unit in pending.iter() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    out.push('&');
    out.push_str(&engine().encode(&bytes));
    out.push('-');
    pending.clear();
}

/// Decodes a mailbox name out of modified UTF-7.
pub fn decode(input: &str) -> Result<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '&' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        i += 1;
        if chars.get(i) == Some(&'-') {
            out.push('&');
            i += 1;
            continue;
        }
        let start = i;
        while i < chars.len() && is_modified_b64_char(chars[i]) {
            i += 1;
        }
        let payload: String = chars[start..i].iter().collect();
        if chars.get(i) == Some(&'-') {
            i += 1;
        }
        let decoded = engine()
            .decode(payload.as_bytes())
            .map_err(|e| Error::ProtocolError(format!("invalid modified UTF-7 sequence: {e}")))?;
        if decoded.len() % 2 != 0 {
            return Err(Error::ProtocolError(
                "modified UTF-7 shifted run has an odd byte length".into(),
            ));
        }
        let units: Vec<u16> = decoded
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        for unit in char::decode_utf16(units) {
            let c = unit
                .map_err(|_| Error::ProtocolError("invalid UTF-16 in modified UTF-7".into()))?;
            out.push(c);
        }
    }
    Ok(out)
}

fn is_modified_b64_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '+' || c == ','
}
