//! Lexical tokens produced while scanning an IMAP response or greeting line.
//!
//! Unlike a slice-based lexer, [`Token::Literal`] carries only the byte count
//! a server announced with `{n}` or `{n+}` — the literal's body is read
//! separately from the underlying byte stream once the caller is ready to
//! consume it. This lets a literal of arbitrary size flow through without
//! ever being buffered whole inside a token.

use std::fmt;

/// A single lexical token from the IMAP wire grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// An unquoted atom (a run of atom-chars).
    Atom(String),
    /// A `\Flag` or `\*` system/keyword flag atom, kept distinct from a plain
    /// atom so callers don't need to re-inspect the leading backslash.
    Flag(String),
    /// A quoted string, already unescaped.
    QString(String),
    /// A literal announcement. `length` is the declared byte count; `sync`
    /// is `false` when the server used the non-synchronizing `{n+}` form.
    Literal {
        /// Declared length of the literal body, in bytes.
        length: u64,
        /// Whether the server expects a `+ ` continuation before sending
        /// the body (`true`) or will send it immediately (`false`, LITERAL+).
        sync: bool,
    },
    /// The atom `NIL`.
    Nil,
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
    /// `*`
    Asterisk,
    /// `[`
    OpenBracket,
    /// `]`
    CloseBracket,
    /// End of line (CRLF consumed).
    Eoln,
    /// Explicit "nothing more on this line" marker, distinct from `Eoln`,
    /// used by the tokenizer to signal a line that was entirely whitespace
    /// after the last meaningful token.
    NoData,
    /// A lexical error; the tokenizer is no longer trustworthy past this
    /// point and the caller should treat the response as malformed.
    Error(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(s) => write!(f, "{s}"),
            Self::Flag(s) => write!(f, "\\{s}"),
            Self::QString(s) => write!(f, "{s:?}"),
            Self::Literal { length, sync } => {
                if *sync {
                    write!(f, "{{{length}}}")
                } else {
                    write!(f, "{{{length}+}}")
                }
            }
            Self::Nil => write!(f, "NIL"),
            Self::OpenParen => write!(f, "("),
            Self::CloseParen => write!(f, ")"),
            Self::Asterisk => write!(f, "*"),
            Self::OpenBracket => write!(f, "["),
            Self::CloseBracket => write!(f, "]"),
            Self::Eoln => write!(f, "<eoln>"),
            Self::NoData => write!(f, "<no-data>"),
            Self::Error(msg) => write!(f, "<error: {msg}>"),
        }
    }
}

impl Token {
    /// Returns the atom text if this token is an [`Token::Atom`].
    #[must_use]
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Self::Atom(s) => Some(s),
            _ => None,
        }
    }

    /// Returns `true` if the token represents any kind of string-shaped
    /// value (atom, quoted string, or literal) as opposed to punctuation.
    #[must_use]
    pub fn is_string_like(&self) -> bool {
        matches!(self, Self::Atom(_) | Self::QString(_) | Self::Literal { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_literal_sync() {
        let tok = Token::Literal { length: 42, sync: true };
        assert_eq!(tok.to_string(), "{42}");
    }

    #[test]
    fn display_literal_nonsync() {
        let tok = Token::Literal { length: 7, sync: false };
        assert_eq!(tok.to_string(), "{7+}");
    }

    #[test]
    fn as_atom_roundtrip() {
        let tok = Token::Atom("FETCH".into());
        assert_eq!(tok.as_atom(), Some("FETCH"));
        assert_eq!(Token::Nil.as_atom(), None);
    }

    #[test]
    fn string_like_classification() {
        assert!(Token::Atom("A".into()).is_string_like());
        assert!(Token::QString("a".into()).is_string_like());
        assert!(Token::Literal { length: 0, sync: true }.is_string_like());
        assert!(!Token::OpenParen.is_string_like());
    }
}
