//! Flow control for STARTTLS, COMPRESS=DEFLATE, ENABLE, ID, and NOTIFY
//! (RFC 2595, RFC 4978, RFC 5161, RFC 2971, RFC 5465).
//!
//! STARTTLS and COMPRESS both rewrap the transport in place once the
//! server agrees, which [`crate::bytestream::ByteStream`] only implements
//! for the concrete [`Transport`] enum (see its `impl ByteStream<Transport>`
//! block) — so those two methods live in a `Transport`-specific `impl`
//! here, consuming `self` and returning the rewrapped `Engine<Transport>`.
//! ENABLE, ID, and NOTIFY are ordinary commands and stay generic over `S`.

use tokio_rustls::TlsConnector;
use tokio_util::sync::CancellationToken;

use super::{CommandOutcome, Engine, EngineState};
use crate::bytestream::{ByteStream, Transport};
use crate::command::{Command, NotifyEntry};
use crate::error::{Error, Result};
use crate::tokenizer::Tokenizer;
use crate::types::Capability;

impl Engine<Transport> {
    /// Negotiates STARTTLS: issues the command, and on a tagged `OK`
    /// upgrades the transport to TLS and re-queries capabilities (the
    /// server's pre-TLS capability list must never be trusted after the
    /// handshake, since a network attacker could have forged it).
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] if the session is not currently
    /// `Connected` (RFC 3501 only permits STARTTLS before authentication).
    /// Returns [`Error::ProtocolError`] if the server pipelined plaintext
    /// data past the `OK`, which [`ByteStream::upgrade_to_tls`] detects and
    /// refuses as a command-injection attempt.
    pub async fn starttls(mut self, host: &str, connector: &TlsConnector, cancel: &CancellationToken) -> Result<Self> {
        if self.session.state() != EngineState::Connected {
            return Err(Error::InvalidState(format!(
                "STARTTLS is only valid in the Connected state, currently {:?}",
                self.session.state()
            )));
        }
        self.call(&Command::StartTls, cancel).await?;

        let stream = self.tokenizer.into_stream().upgrade_to_tls(host, connector).await?;
        let mut engine = self.rewrap(Tokenizer::new(stream));
        engine.capabilities = crate::types::CapabilitySet::new();
        engine.call(&Command::Capability, cancel).await?;
        Ok(engine)
    }

    /// Negotiates `COMPRESS=DEFLATE`: issues the command, and on a tagged
    /// `OK` wraps the transport's reader and writer in DEFLATE framing.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] if a mailbox is currently selected
    /// (RFC 4978 does not forbid this outright, but this engine only
    /// offers COMPRESS before SELECT, matching how it is used in
    /// practice: negotiated once, immediately after authentication).
    /// Returns [`Error::NotSupported`] if the server never advertised
    /// `COMPRESS=DEFLATE`.
    pub async fn compress(mut self, cancel: &CancellationToken) -> Result<Self> {
        if matches!(self.session.state(), EngineState::Selected | EngineState::Idle) {
            return Err(Error::InvalidState(
                "COMPRESS is not supported once a mailbox is selected".into(),
            ));
        }
        if !self.capabilities.contains(&Capability::CompressDeflate) {
            return Err(Error::NotSupported("COMPRESS=DEFLATE".into()));
        }
        self.call(&Command::Compress, cancel).await?;

        let stream = self.tokenizer.into_stream().upgrade_to_deflate().await?;
        Ok(self.rewrap(Tokenizer::new(stream)))
    }
}

impl<S> Engine<S>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    /// Enables extensions via `ENABLE` (RFC 5161). Returns the extensions
    /// the server actually turned on, which may be a subset of what was
    /// requested.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] unless the session is
    /// `Authenticated` (RFC 5161 forbids ENABLE once a mailbox is
    /// selected).
    pub async fn enable(&mut self, capabilities: Vec<String>, cancel: &CancellationToken) -> Result<Vec<Capability>> {
        if self.session.state() != EngineState::Authenticated {
            return Err(Error::InvalidState(format!(
                "ENABLE is only valid in the Authenticated state, currently {:?}",
                self.session.state()
            )));
        }
        let mut enabled = Vec::new();
        self.call_collecting(&Command::Enable { capabilities }, cancel, |untagged, out| {
            if let super::UntaggedResponse::Enabled(caps) = untagged {
                out.extend(caps.iter().cloned());
            }
        }, &mut enabled)
        .await?;
        Ok(enabled)
    }

    /// Sends client identification, or `ID NIL` to decline answering the
    /// server's own ID, and returns the server's identification fields if
    /// it sent any (RFC 2971).
    pub async fn id(
        &mut self,
        parameters: Option<Vec<(String, String)>>,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<(String, String)>>> {
        let mut server_id = None;
        self.call_collecting(&Command::Id { parameters }, cancel, |untagged, out| {
            if let super::UntaggedResponse::Id(fields) = untagged {
                *out = fields.clone();
            }
        }, &mut server_id)
        .await?;
        Ok(server_id)
    }

    /// Subscribes to a set of mailbox event groups via `NOTIFY SET`,
    /// replacing any previously registered set (RFC 5465).
    ///
    /// # Errors
    /// Returns [`Error::NotSupported`] if the server never advertised
    /// `NOTIFY`.
    pub async fn notify(&mut self, entries: Vec<NotifyEntry>, cancel: &CancellationToken) -> Result<CommandOutcome> {
        if !self.capabilities.contains(&Capability::Notify) {
            return Err(Error::NotSupported("NOTIFY".into()));
        }
        self.call(&Command::Notify { entries }, cancel).await
    }

    /// Stops all push notifications via `NOTIFY NONE`.
    pub async fn disable_notify(&mut self, cancel: &CancellationToken) -> Result<CommandOutcome> {
        self.call(&Command::DisableNotify, cancel).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn authenticated_engine(mock: tokio_test::io::Mock) -> Engine<tokio_test::io::Mock> {
        let mut engine = Engine::new(mock);
        engine.session.transition_connected().unwrap();
        engine.session.transition_authenticated().unwrap();
        engine
    }

    #[tokio::test]
    async fn enable_returns_server_confirmed_extensions() {
        let mock = tokio_test::io::Builder::new()
            .write(b"A0000 ENABLE UTF8=ACCEPT\r\n")
            .read(b"* ENABLED UTF8=ACCEPT\r\n")
            .read(b"A0000 OK ENABLE completed\r\n")
            .build();
        let mut engine = authenticated_engine(mock);
        let cancel = CancellationToken::new();
        let enabled = engine.enable(vec!["UTF8=ACCEPT".to_string()], &cancel).await.unwrap();
        assert_eq!(enabled, vec![Capability::Utf8Accept]);
    }

    #[tokio::test]
    async fn enable_is_rejected_once_a_mailbox_is_selected() {
        let mock = tokio_test::io::Builder::new().build();
        let mut engine = authenticated_engine(mock);
        engine
            .session
            .select(crate::types::Mailbox::inbox(), crate::types::MailboxStatus::default())
            .unwrap();
        let cancel = CancellationToken::new();
        let err = engine.enable(vec!["UTF8=ACCEPT".to_string()], &cancel).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[tokio::test]
    async fn notify_requires_the_capability() {
        let mock = tokio_test::io::Builder::new().build();
        let mut engine = authenticated_engine(mock);
        let cancel = CancellationToken::new();
        let err = engine.notify(vec![], &cancel).await.unwrap_err();
        assert!(matches!(err, Error::NotSupported(_)));
    }

    #[tokio::test]
    async fn id_nil_round_trips_server_identification() {
        let mock = tokio_test::io::Builder::new()
            .write(b"A0000 ID NIL\r\n")
            .read(b"* ID (\"name\" \"testserver\")\r\n")
            .read(b"A0000 OK ID completed\r\n")
            .build();
        let mut engine = authenticated_engine(mock);
        let cancel = CancellationToken::new();
        let server_id = engine.id(None, &cancel).await.unwrap();
        assert_eq!(server_id, Some(vec![("name".to_string(), "testserver".to_string())]));
    }
}
