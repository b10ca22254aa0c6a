//! Byte-level scanner for credential material in outbound command traffic.
//!
//! The protocol logger must never print a password or a SASL
//! challenge-response, but it still wants to show the command shape (tag,
//! verb, argument count) for diagnostics. [`SecretRedactor`] scans each
//! outbound line and returns the byte ranges that must be masked before the
//! line reaches a log sink; it never touches the bytes actually sent on the
//! wire.
//!
//! The redactor fails closed: once `AUTHENTICATE` is seen it stays armed —
//! redacting every subsequent line in full — until the engine explicitly
//! calls [`SecretRedactor::disarm`] after observing that command's tagged
//! response. A scanner that cannot cleanly identify the argument boundary
//! redacts to the end of the line rather than guessing. The mechanism name
//! on the `AUTHENTICATE` line itself (`PLAIN`, `XOAUTH2`, ...) is not a
//! secret; only a trailing SASL-IR argument and every continuation line
//! after it are.
//!
//! `LOGIN`'s two astring arguments (username, password) may each be split
//! across several writes when one is sent as a literal: a `{n}\r\n` marker
//! frame, a dedicated frame for the literal's raw bytes, and then whatever
//! finishes the command. The redactor stays armed across all of them —
//! every write from the `LOGIN` keyword onward is secret — and only
//! disarms itself once it sees a write that actually ends the command
//! (terminates in a bare `\r\n`, not a pending literal marker).

/// A byte range within a line that must be masked before logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redaction {
    /// Offset of the first byte to mask.
    pub offset: usize,
    /// Number of bytes to mask, starting at `offset`.
    pub length: usize,
}

/// Tracks whether outbound traffic is inside a multi-line AUTHENTICATE
/// exchange or a multi-write LOGIN command, across calls to
/// [`SecretRedactor::scan_outbound_line`].
#[derive(Debug, Default)]
pub struct SecretRedactor {
    armed: bool,
    /// Set for every write belonging to a `LOGIN` command still in
    /// progress — from the write carrying the `LOGIN` keyword through
    /// however many literal-marker/literal-payload writes its username
    /// and password need, until the write that actually terminates the
    /// command (see [`ends_with_pending_literal`]).
    login_in_progress: bool,
}

impl SecretRedactor {
    /// Creates a redactor with no exchange in progress.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans one outbound write (a `Frame`'s bytes) and returns the ranges
    /// that must be masked before it is logged.
    pub fn scan_outbound_line(&mut self, line: &[u8]) -> Vec<Redaction> {
        if self.armed {
            return vec![Redaction { offset: 0, length: line.len() }];
        }
        if self.login_in_progress {
            self.login_in_progress = !command_write_is_terminal(line);
            return vec![Redaction { offset: 0, length: line.len() }];
        }
        match find_command_keyword(line) {
            Some((keyword, arg_start)) if keyword.eq_ignore_ascii_case("LOGIN") => {
                self.login_in_progress = !command_write_is_terminal(line);
                vec![Redaction { offset: arg_start, length: line.len() - arg_start }]
            }
            Some((keyword, arg_start)) if keyword.eq_ignore_ascii_case("AUTHENTICATE") => {
                self.armed = true;
                // The mechanism name (e.g. "PLAIN") is protocol data, not a
                // secret; only a trailing SASL-IR argument after it is.
                let mech_len = line[arg_start..].iter().position(|&b| b == b' ').unwrap_or(0);
                if mech_len == 0 {
                    Vec::new()
                } else {
                    let ir_start = arg_start + mech_len + 1;
                    if ir_start >= line.len() {
                        Vec::new()
                    } else {
                        vec![Redaction { offset: ir_start, length: line.len() - ir_start }]
                    }
                }
            }
            _ => Vec::new(),
        }
    }

    /// Ends the current AUTHENTICATE exchange. Must be called once the
    /// tagged response completing that command has been observed, so
    /// unrelated traffic stops being redacted.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Returns `true` while a multi-line AUTHENTICATE exchange is in
    /// progress and every outbound line is being redacted in full.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

/// Finds the command keyword following the leading tag token, returning the
/// keyword text and the byte offset immediately after it (where its
/// argument, if any, begins).
fn find_command_keyword(line: &[u8]) -> Option<(&str, usize)> {
    let mut pos = 0;
    // tag token: run of non-space bytes (allow untagged continuations
    // with no leading tag, e.g. a bare "AUTHENTICATE" retry is never
    // sent without a tag in practice, but guard against an empty line).
    while pos < line.len() && line[pos] != b' ' {
        pos += 1;
    }
    if pos >= line.len() {
        return None;
    }
    pos += 1; // space after tag
    let keyword_start = pos;
    while pos < line.len() && line[pos] != b' ' {
        pos += 1;
    }
    if pos == keyword_start {
        return None;
    }
    let keyword = std::str::from_utf8(&line[keyword_start..pos]).ok()?;
    let arg_start = (pos + 1).min(line.len());
    Some((keyword, arg_start))
}

/// Returns `true` when `line` ends with a synchronizing or non-synchronizing
/// literal-length marker (`{n}\r\n` or `{n+}\r\n`) whose payload has not yet
/// been written — i.e. the next outbound write on this connection will be
/// that literal's body.
fn ends_with_pending_literal(line: &[u8]) -> bool {
    let Some(rest) = line.strip_suffix(b"\r\n") else { return false };
    let Some(rest) = rest.strip_suffix(b"}") else { return false };
    let rest = rest.strip_suffix(b"+").unwrap_or(rest);
    let Some(brace) = rest.iter().rposition(|&b| b == b'{') else { return false };
    let digits = &rest[brace + 1..];
    !digits.is_empty() && digits.iter().all(u8::is_ascii_digit)
}

/// Returns `true` when `line` is the write that finishes the command it
/// belongs to: it ends the line with a bare `\r\n` that is *not* a pending
/// literal marker. A write ending in a literal marker, or a raw literal
/// payload with no trailing `\r\n` at all, still has more of the command
/// to come.
fn command_write_is_terminal(line: &[u8]) -> bool {
    line.ends_with(b"\r\n") && !ends_with_pending_literal(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_redacts_from_username_onward() {
        let mut r = SecretRedactor::new();
        let line = b"A1 LOGIN alice secretpw\r\n";
        let redactions = r.scan_outbound_line(line);
        assert_eq!(redactions, vec![Redaction { offset: 9, length: line.len() - 9 }]);
        assert!(!r.is_armed());

        // The command's single write already terminated it; unrelated
        // follow-up traffic is not redacted.
        assert!(r.scan_outbound_line(b"A2 NOOP\r\n").is_empty());
    }

    #[test]
    fn login_with_literal_password_redacts_the_literal_payload_write() {
        let mut r = SecretRedactor::new();
        let prefix = b"A1 LOGIN \"al ice\" {1}\r\n";
        let redactions = r.scan_outbound_line(prefix);
        assert_eq!(redactions, vec![Redaction { offset: 9, length: prefix.len() - 9 }]);

        // The literal payload arrives as its own write; it must still be
        // masked even though it carries no LOGIN/AUTHENTICATE keyword.
        let payload = r.scan_outbound_line(b"p");
        assert_eq!(payload, vec![Redaction { offset: 0, length: 1 }]);

        // The command's bare CRLF terminator write is still part of the
        // command, so it is masked too (harmlessly, it carries no text),
        // and disarms the redactor.
        let terminator = r.scan_outbound_line(b"\r\n");
        assert_eq!(terminator, vec![Redaction { offset: 0, length: 2 }]);

        assert!(r.scan_outbound_line(b"A2 NOOP\r\n").is_empty());
    }

    #[test]
    fn login_with_literal_username_and_plain_password_redacts_every_write() {
        // Exact frame split driven by a LOGIN whose username contains a
        // bare CR, forcing a literal: `Command::Login { username: "al\rice",
        // password: "secret" }` serializes to these three writes.
        let mut r = SecretRedactor::new();
        let marker = b"A0000 LOGIN {6}\r\n";
        let redactions = r.scan_outbound_line(marker);
        assert_eq!(redactions, vec![Redaction { offset: 12, length: marker.len() - 12 }]);

        let literal_payload = r.scan_outbound_line(b"al\rice");
        assert_eq!(literal_payload, vec![Redaction { offset: 0, length: 6 }]);

        // The password, sent as a plain astring, shares a write with the
        // separating space and the command's CRLF terminator. It carries
        // no LOGIN/AUTHENTICATE keyword of its own, but the command is
        // still in progress — this write must be fully masked.
        let password_write = r.scan_outbound_line(b" secret\r\n");
        assert_eq!(password_write, vec![Redaction { offset: 0, length: 9 }]);

        assert!(r.scan_outbound_line(b"A0001 NOOP\r\n").is_empty());
    }

    #[test]
    fn authenticate_arms_and_redacts_continuation_lines() {
        let mut r = SecretRedactor::new();
        // "A1 AUTHENTICATE PLAIN" carries no trailing SASL-IR argument, so
        // nothing on this line is secret yet — the mechanism name is
        // protocol data, not a credential.
        let first = r.scan_outbound_line(b"A1 AUTHENTICATE PLAIN");
        assert!(first.is_empty());
        assert!(r.is_armed());

        let continuation = r.scan_outbound_line(b"AGFsaWNlAHNlY3JldHB3");
        assert_eq!(continuation, vec![Redaction { offset: 0, length: 20 }]);

        r.disarm();
        assert!(!r.is_armed());
        let after = r.scan_outbound_line(b"A2 NOOP");
        assert!(after.is_empty());
    }

    #[test]
    fn authenticate_with_sasl_ir_redacts_only_the_initial_response() {
        let mut r = SecretRedactor::new();
        let line = b"A1 AUTHENTICATE PLAIN AGFsaWNlAHNlY3JldHB3";
        let redactions = r.scan_outbound_line(line);
        assert_eq!(redactions, vec![Redaction { offset: 22, length: line.len() - 22 }]);
        assert!(r.is_armed());
    }

    #[test]
    fn unrelated_commands_are_not_redacted() {
        let mut r = SecretRedactor::new();
        assert!(r.scan_outbound_line(b"A1 CAPABILITY").is_empty());
        assert!(r.scan_outbound_line(b"A2 SELECT INBOX").is_empty());
    }

    #[test]
    fn malformed_line_with_no_recognizable_keyword_is_left_alone() {
        let mut r = SecretRedactor::new();
        assert!(r.scan_outbound_line(b"DONE").is_empty());
    }
}
