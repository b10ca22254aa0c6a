//! Streaming tokenizer over a [`ByteStream`].
//!
//! The tokenizer reads one response line at a time. When it encounters a
//! literal announcement (`{n}` or `{n+}`) it emits [`Token::Literal`] and
//! then refuses further tokens until the caller retrieves the literal's body
//! with [`Tokenizer::read_literal_body`] — this is the suspension point that
//! keeps large literals from ever being buffered whole inside a token.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

use crate::bytestream::ByteStream;
use crate::error::{Error, Result};
use crate::token::Token;

/// Scans IMAP wire tokens out of a buffered byte stream.
pub struct Tokenizer<S> {
    stream: ByteStream<S>,
    line: Vec<u8>,
    pos: usize,
    line_exhausted: bool,
    awaiting_literal: Option<u64>,
    peeked: Option<Token>,
}

impl<S> Tokenizer<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a byte stream with no line currently buffered.
    pub fn new(stream: ByteStream<S>) -> Self {
        Self {
            stream,
            line: Vec::new(),
            pos: 0,
            line_exhausted: true,
            awaiting_literal: None,
            peeked: None,
        }
    }

    /// Gives back the underlying byte stream, discarding any partially
    /// scanned line. Used when handing the transport to a different layer
    /// (e.g. after STARTTLS or COMPRESS negotiation).
    pub fn into_stream(self) -> ByteStream<S> {
        self.stream
    }

    /// Mutable access to the underlying byte stream, for writes.
    pub fn stream_mut(&mut self) -> &mut ByteStream<S> {
        &mut self.stream
    }

    /// The raw bytes of the line currently (or most recently) being
    /// scanned, CRLF stripped. Used by the engine to hand the server's
    /// literal wire bytes to a [`crate::logger::ProtocolLogger`] without
    /// the tokenizer needing to know anything about logging itself.
    #[must_use]
    pub fn current_line(&self) -> &[u8] {
        &self.line
    }

    /// Returns the next token, reading more of the line (or a new line) as
    /// needed. Errors if a literal is pending consumption.
    pub async fn next_token(&mut self, cancel: &CancellationToken) -> Result<Token> {
        if let Some(tok) = self.peeked.take() {
            return Ok(tok);
        }
        self.next_token_uncached(cancel).await
    }

    /// Returns the next token without consuming it; a second call returns
    /// the same token again.
    pub async fn peek_token(&mut self, cancel: &CancellationToken) -> Result<Token> {
        if let Some(tok) = &self.peeked {
            return Ok(tok.clone());
        }
        let tok = self.next_token_uncached(cancel).await?;
        self.peeked = Some(tok.clone());
        Ok(tok)
    }

    async fn next_token_uncached(&mut self, cancel: &CancellationToken) -> Result<Token> {
        if self.awaiting_literal.is_some() {
            return Err(Error::ProtocolError(
                "literal body must be read before continuing to tokenize".into(),
            ));
        }
        if self.line_exhausted {
            self.line = self.stream.read_line(cancel).await?;
            self.pos = 0;
            self.line_exhausted = false;
        }
        self.skip_spaces();
        if self.pos >= self.line.len() {
            self.line_exhausted = true;
            return Ok(Token::Eoln);
        }
        self.scan_one()
    }

    /// Reads the body of a pending literal announced by the last
    /// [`Token::Literal`]. Must be called exactly once before tokenizing
    /// resumes.
    pub async fn read_literal_body(&mut self, cancel: &CancellationToken) -> Result<Vec<u8>> {
        let length = self
            .awaiting_literal
            .take()
            .ok_or_else(|| Error::ProtocolError("no literal is pending".into()))?;
        let body = self.stream.read_literal(length, cancel).await?;
        self.line = self.stream.read_line(cancel).await?;
        self.pos = 0;
        Ok(body)
    }

    fn skip_spaces(&mut self) {
        while self.pos < self.line.len() && self.line[self.pos] == b' ' {
            self.pos += 1;
        }
    }

    fn scan_one(&mut self) -> Result<Token> {
        let byte = self.line[self.pos];
        match byte {
            b'(' => {
                self.pos += 1;
                Ok(Token::OpenParen)
            }
            b')' => {
                self.pos += 1;
                Ok(Token::CloseParen)
            }
            b'[' => {
                self.pos += 1;
                Ok(Token::OpenBracket)
            }
            b']' => {
                self.pos += 1;
                Ok(Token::CloseBracket)
            }
            b'*' => {
                self.pos += 1;
                Ok(Token::Asterisk)
            }
            b'"' => self.scan_quoted_string(),
            b'{' => self.scan_literal_prefix(),
            b'\\' => self.scan_flag(),
            _ => self.scan_atom(),
        }
    }

    fn scan_quoted_string(&mut self) -> Result<Token> {
        self.pos += 1; // opening quote
        let mut out = Vec::new();
        loop {
            if self.pos >= self.line.len() {
                return Err(Error::ProtocolError("unterminated quoted string".into()));
            }
            match self.line[self.pos] {
                b'"' => {
                    self.pos += 1;
                    break;
                }
                b'\\' => {
                    self.pos += 1;
                    let escaped = *self
                        .line
                        .get(self.pos)
                        .ok_or_else(|| Error::ProtocolError("dangling escape in quoted string".into()))?;
                    if escaped != b'"' && escaped != b'\\' {
                        return Err(Error::ProtocolError(format!(
                            "invalid escape sequence \\{}",
                            escaped as char
                        )));
                    }
                    out.push(escaped);
                    self.pos += 1;
                }
                b => {
                    out.push(b);
                    self.pos += 1;
                }
            }
        }
        let text = String::from_utf8(out)
            .map_err(|e| Error::ProtocolError(format!("non-UTF-8 quoted string: {e}")))?;
        Ok(Token::QString(text))
    }

    fn scan_literal_prefix(&mut self) -> Result<Token> {
        self.pos += 1; // '{'
        let start = self.pos;
        while self.pos < self.line.len() && self.line[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(Error::ProtocolError("literal marker missing length".into()));
        }
        let length: u64 = std::str::from_utf8(&self.line[start..self.pos])
            .unwrap_or_default()
            .parse()
            .map_err(|_| Error::ProtocolError("literal length is not a valid number".into()))?;
        let sync = if self.line.get(self.pos) == Some(&b'+') {
            self.pos += 1;
            false
        } else {
            true
        };
        if self.line.get(self.pos) != Some(&b'}') {
            return Err(Error::ProtocolError("literal marker missing closing brace".into()));
        }
        self.pos += 1;
        if self.pos != self.line.len() {
            return Err(Error::ProtocolError(
                "literal marker must be the last thing on its line".into(),
            ));
        }
        self.awaiting_literal = Some(length);
        Ok(Token::Literal { length, sync })
    }

    fn scan_flag(&mut self) -> Result<Token> {
        self.pos += 1; // '\'
        if self.line.get(self.pos) == Some(&b'*') {
            self.pos += 1;
            return Ok(Token::Flag("*".into()));
        }
        let start = self.pos;
        while self.pos < self.line.len() && is_atom_char(self.line[self.pos]) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(Error::ProtocolError("empty flag name after backslash".into()));
        }
        let name = String::from_utf8_lossy(&self.line[start..self.pos]).into_owned();
        Ok(Token::Flag(name))
    }

    fn scan_atom(&mut self) -> Result<Token> {
        let start = self.pos;
        while self.pos < self.line.len() && is_atom_char(self.line[self.pos]) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(Error::ProtocolError(format!(
                "unexpected character '{}' at position {}",
                self.line[self.pos] as char, self.pos
            )));
        }
        let text = String::from_utf8_lossy(&self.line[start..self.pos]).into_owned();
        if text.eq_ignore_ascii_case("NIL") {
            Ok(Token::Nil)
        } else {
            Ok(Token::Atom(text))
        }
    }

    /// Reads an astring (atom, quoted string, or literal) as raw bytes.
    pub async fn read_astring(&mut self, cancel: &CancellationToken) -> Result<Vec<u8>> {
        match self.next_token(cancel).await? {
            Token::Atom(s) => Ok(s.into_bytes()),
            Token::QString(s) => Ok(s.into_bytes()),
            Token::Literal { .. } => self.read_literal_body(cancel).await,
            other => Err(Error::ProtocolError(format!("expected astring, found {other}"))),
        }
    }

    /// Reads an nstring (astring or NIL), returning `None` for NIL.
    pub async fn read_nstring(&mut self, cancel: &CancellationToken) -> Result<Option<Vec<u8>>> {
        match self.peek_token(cancel).await? {
            Token::Nil => {
                self.next_token(cancel).await?;
                Ok(None)
            }
            _ => Ok(Some(self.read_astring(cancel).await?)),
        }
    }

    /// Takes the remainder of the current line verbatim (lossily decoded),
    /// without re-lexing it into tokens. Used for response text following a
    /// status/resp-code and for continuation-request text, both of which are
    /// free-form rather than token-structured.
    pub fn read_rest_of_line(&mut self) -> String {
        self.skip_spaces();
        let text = String::from_utf8_lossy(&self.line[self.pos..]).into_owned();
        self.pos = self.line.len();
        self.line_exhausted = true;
        text
    }
}

fn is_atom_char(b: u8) -> bool {
    !matches!(b, b'(' | b')' | b'{' | b'}' | b'%' | b'*' | b'"' | b'\\' | b'[' | b']' | b' ') && b > 0x1f && b != 0x7f
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer_for(bytes: &'static [u8]) -> Tokenizer<tokio_test::io::Mock> {
        let mock = tokio_test::io::Builder::new().read(bytes).build();
        Tokenizer::new(ByteStream::new(mock))
    }

    #[tokio::test]
    async fn scans_simple_tagged_ok() {
        let mut tok = tokenizer_for(b"A1 OK LOGIN completed\r\n");
        let cancel = CancellationToken::new();
        assert_eq!(tok.next_token(&cancel).await.unwrap(), Token::Atom("A1".into()));
        assert_eq!(tok.next_token(&cancel).await.unwrap(), Token::Atom("OK".into()));
        assert_eq!(tok.next_token(&cancel).await.unwrap(), Token::Atom("LOGIN".into()));
        assert_eq!(tok.next_token(&cancel).await.unwrap(), Token::Atom("completed".into()));
        assert_eq!(tok.next_token(&cancel).await.unwrap(), Token::Eoln);
    }

    #[tokio::test]
    async fn scans_untagged_with_brackets_and_parens() {
        let mut tok = tokenizer_for(b"* OK [CAPABILITY IMAP4rev1 IDLE] ready\r\n");
        let cancel = CancellationToken::new();
        assert_eq!(tok.next_token(&cancel).await.unwrap(), Token::Asterisk);
        assert_eq!(tok.next_token(&cancel).await.unwrap(), Token::Atom("OK".into()));
        assert_eq!(tok.next_token(&cancel).await.unwrap(), Token::OpenBracket);
        assert_eq!(tok.next_token(&cancel).await.unwrap(), Token::Atom("CAPABILITY".into()));
        assert_eq!(tok.next_token(&cancel).await.unwrap(), Token::Atom("IMAP4rev1".into()));
        assert_eq!(tok.next_token(&cancel).await.unwrap(), Token::Atom("IDLE".into()));
        assert_eq!(tok.next_token(&cancel).await.unwrap(), Token::CloseBracket);
        assert_eq!(tok.next_token(&cancel).await.unwrap(), Token::Atom("ready".into()));
    }

    #[tokio::test]
    async fn scans_quoted_string_with_escapes() {
        let mut tok = tokenizer_for(b"\"hello \\\"world\\\"\"\r\n");
        let cancel = CancellationToken::new();
        assert_eq!(
            tok.next_token(&cancel).await.unwrap(),
            Token::QString("hello \"world\"".into())
        );
    }

    #[tokio::test]
    async fn literal_requires_explicit_body_read() {
        let mut tok = tokenizer_for(b"{5}\r\nhello FLAGS\r\n");
        let cancel = CancellationToken::new();
        let t = tok.next_token(&cancel).await.unwrap();
        assert_eq!(t, Token::Literal { length: 5, sync: true });
        assert!(matches!(
            tok.next_token(&cancel).await,
            Err(Error::ProtocolError(_))
        ));
        let body = tok.read_literal_body(&cancel).await.unwrap();
        assert_eq!(body, b"hello");
        assert_eq!(tok.next_token(&cancel).await.unwrap(), Token::Atom("FLAGS".into()));
        assert_eq!(tok.next_token(&cancel).await.unwrap(), Token::Eoln);
    }

    #[tokio::test]
    async fn literal_plus_marks_nonsync() {
        let mut tok = tokenizer_for(b"{3+}\r\nabc\r\n");
        let cancel = CancellationToken::new();
        assert_eq!(
            tok.next_token(&cancel).await.unwrap(),
            Token::Literal { length: 3, sync: false }
        );
    }

    #[tokio::test]
    async fn peek_does_not_consume() {
        let mut tok = tokenizer_for(b"A1 NOOP\r\n");
        let cancel = CancellationToken::new();
        assert_eq!(tok.peek_token(&cancel).await.unwrap(), Token::Atom("A1".into()));
        assert_eq!(tok.peek_token(&cancel).await.unwrap(), Token::Atom("A1".into()));
        assert_eq!(tok.next_token(&cancel).await.unwrap(), Token::Atom("A1".into()));
        assert_eq!(tok.next_token(&cancel).await.unwrap(), Token::Atom("NOOP".into()));
    }

    #[tokio::test]
    async fn backslash_star_is_permanent_flag_wildcard() {
        let mut tok = tokenizer_for(b"\\*\r\n");
        let cancel = CancellationToken::new();
        assert_eq!(tok.next_token(&cancel).await.unwrap(), Token::Flag("*".into()));
    }

    #[tokio::test]
    async fn read_rest_of_line_takes_remaining_text_verbatim() {
        let mut tok = tokenizer_for(b"A001 OK [READ-WRITE] LOGIN completed, welcome!\r\n");
        let cancel = CancellationToken::new();
        assert_eq!(tok.next_token(&cancel).await.unwrap(), Token::Atom("A001".into()));
        assert_eq!(tok.next_token(&cancel).await.unwrap(), Token::Atom("OK".into()));
        assert_eq!(tok.next_token(&cancel).await.unwrap(), Token::OpenBracket);
        assert_eq!(tok.next_token(&cancel).await.unwrap(), Token::Atom("READ-WRITE".into()));
        assert_eq!(tok.next_token(&cancel).await.unwrap(), Token::CloseBracket);
        assert_eq!(tok.read_rest_of_line(), "LOGIN completed, welcome!");
        assert_eq!(tok.next_token(&cancel).await.unwrap(), Token::Eoln);
    }
}
