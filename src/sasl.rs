//! SASL mechanism framing for the AUTHENTICATE command.
//!
//! The engine only ships the mandatory-to-implement PLAIN mechanism
//! (RFC 4616); anything else (OAUTHBEARER, XOAUTH2, SCRAM) is expected to
//! be supplied by the caller as a [`SaslMechanism`] implementation so this
//! crate never has to track third-party token refresh logic.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Error, Result};

/// One step of a SASL authentication exchange.
///
/// Implementations are driven by [`crate::engine::Engine::authenticate`]:
/// it sends [`SaslMechanism::initial_response`] (if any, as SASL-IR), then
/// calls [`SaslMechanism::respond`] once per server challenge until the
/// server returns a tagged response.
pub trait SaslMechanism: Send {
    /// The mechanism name as advertised in `AUTH=` capabilities.
    fn name(&self) -> &'static str;

    /// The initial response to send with `AUTHENTICATE <mechanism>
    /// <initial-response>` when the server supports SASL-IR. Returning
    /// `None` means the mechanism always waits for a server challenge
    /// first.
    fn initial_response(&mut self) -> Option<Vec<u8>>;

    /// Computes the response to a decoded server challenge.
    fn respond(&mut self, challenge: &[u8]) -> Result<Vec<u8>>;
}

/// RFC 4616 PLAIN mechanism: `authzid\0authcid\0password`.
pub struct Plain {
    authzid: String,
    username: String,
    password: String,
}

impl Plain {
    /// Creates a PLAIN mechanism with no separate authorization identity.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            authzid: String::new(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Creates a PLAIN mechanism that authenticates as `username` but acts
    /// on behalf of `authzid`.
    #[must_use]
    pub fn with_authzid(
        authzid: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            authzid: authzid.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

impl SaslMechanism for Plain {
    fn name(&self) -> &'static str {
        "PLAIN"
    }

    fn initial_response(&mut self) -> Option<Vec<u8>> {
        let mut out = Vec::new();
        out.extend_from_slice(self.authzid.as_bytes());
        out.push(0);
        out.extend_from_slice(self.username.as_bytes());
        out.push(0);
        out.extend_from_slice(self.password.as_bytes());
        Some(out)
    }

    fn respond(&mut self, _challenge: &[u8]) -> Result<Vec<u8>> {
        Err(Error::AuthenticationError(
            "PLAIN does not expect a server challenge after its initial response".into(),
        ))
    }
}

/// Encodes a SASL response for transmission as a continuation line.
#[must_use]
pub fn encode_response(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes a base64 SASL challenge received as a `+ ` continuation line.
pub fn decode_challenge(line: &[u8]) -> Result<Vec<u8>> {
    STANDARD
        .decode(line)
        .map_err(|e| Error::ProtocolError(format!("malformed base64 SASL challenge: {e}")))
}
