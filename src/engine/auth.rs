//! Authenticator: drives SASL `AUTHENTICATE` continuations and the `LOGIN`
//! fallback (RFC 3501 §6.2, RFC 4959 SASL-IR).
//!
//! Like [`super::idle`], this does not go through [`Engine::call`]: the
//! continuation exchange here is a SASL challenge/response dance, not a
//! literal synchronization wait, and a failed mechanism must not abort the
//! whole authentication attempt the way an ordinary command's `NO`/`BAD`
//! would.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

use super::{CommandOutcome, Engine, EngineState, Response};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::sasl::{decode_challenge, encode_response, SaslMechanism};
use crate::types::Capability;

impl<S> Engine<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Authenticates the connection, trying each SASL mechanism in
    /// `mechanisms` (in order, skipping any the server does not advertise
    /// an `AUTH=` capability for) before falling back to plaintext `LOGIN`.
    ///
    /// # Errors
    /// Returns [`Error::AuthenticationError`] if every SASL mechanism
    /// failed and the server advertises `LOGINDISABLED` (so `LOGIN` would
    /// only fail too), or if `LOGIN` itself is rejected. Returns
    /// [`Error::InvalidState`] if the session is not currently
    /// `Connected`.
    pub async fn authenticate(
        &mut self,
        mechanisms: Vec<Box<dyn SaslMechanism>>,
        username: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> Result<CommandOutcome> {
        if self.session.state() != EngineState::Connected {
            return Err(Error::InvalidState(format!(
                "cannot authenticate from state {:?}",
                self.session.state()
            )));
        }

        let version_before = self.capabilities.version();

        for mechanism in mechanisms {
            if !self.capabilities.sasl_mechanisms().iter().any(|name| name.eq_ignore_ascii_case(mechanism.name())) {
                continue;
            }
            match self.try_mechanism(mechanism, cancel).await? {
                Some(outcome) => {
                    self.session.transition_authenticated()?;
                    self.after_authenticated(version_before, cancel).await;
                    return Ok(outcome);
                }
                None => continue,
            }
        }

        if self.capabilities.contains(&Capability::LoginDisabled) {
            return Err(Error::AuthenticationError(
                "no SASL mechanism succeeded and LOGIN is disabled".into(),
            ));
        }

        let tag = self.tags.next();
        let literal_plus = self.literal_plus();
        let frames = Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        }
        .serialize_frames(&tag, literal_plus);
        self.write_frames(&frames, literal_plus, cancel).await?;
        let result = self.await_tagged(&tag, "LOGIN", cancel).await;
        match result {
            Ok(outcome) => {
                self.session.transition_authenticated()?;
                self.after_authenticated(version_before, cancel).await;
                Ok(outcome)
            }
            Err(err) => Err(Error::AuthenticationError(err.to_string())),
        }
    }

    /// Drives one SASL mechanism's `AUTHENTICATE` exchange to completion.
    ///
    /// Returns `Ok(Some(outcome))` on a tagged `OK`, `Ok(None)` on a tagged
    /// `NO`/`BAD` (try the next mechanism), and propagates any transport or
    /// protocol error.
    async fn try_mechanism(
        &mut self,
        mut mechanism: Box<dyn SaslMechanism>,
        cancel: &CancellationToken,
    ) -> Result<Option<CommandOutcome>> {
        let tag = self.tags.next();
        let sasl_ir = self.capabilities.contains(&Capability::SaslIr);
        let initial_response = mechanism.initial_response();

        let mut line = format!("{} AUTHENTICATE {}", tag, mechanism.name());
        if sasl_ir {
            if let Some(ir) = &initial_response {
                line.push(' ');
                line.push_str(&encode_response(ir));
            }
        }
        self.write_line(line.as_bytes(), cancel).await?;

        let outcome = loop {
            match self.read_response(cancel).await? {
                Response::Continuation { text } => {
                    let challenge = decode_challenge(text.unwrap_or_default().as_bytes())?;
                    match mechanism.respond(&challenge) {
                        Ok(response) => {
                            let encoded = encode_response(&response);
                            self.write_line(encoded.as_bytes(), cancel).await?;
                        }
                        Err(_) => {
                            // RFC 3501 §6.2.2: a lone "*" cancels the
                            // AUTHENTICATE exchange in progress.
                            self.write_line(b"*", cancel).await?;
                        }
                    }
                }
                Response::Tagged { tag: reply_tag, status, code, text } => {
                    if reply_tag.as_str() != tag {
                        return Err(Error::ProtocolError(format!(
                            "expected tagged reply {tag}, got {}",
                            reply_tag.as_str()
                        )));
                    }
                    break match status {
                        crate::types::Status::Ok | crate::types::Status::PreAuth => {
                            Some(CommandOutcome { status, code, text })
                        }
                        _ => None,
                    };
                }
                Response::Untagged(_) => continue,
            }
        };
        self.redactor.disarm();
        Ok(outcome)
    }

    /// After a successful AUTHENTICATE/LOGIN: refreshes capabilities if
    /// they did not change during the exchange, then opportunistically
    /// populates the namespace table and folder cache.
    ///
    /// All of this is best-effort: a server that rejects NAMESPACE or LIST
    /// post-authentication does not invalidate the authentication itself.
    async fn after_authenticated(&mut self, version_before: u64, cancel: &CancellationToken) {
        if self.capabilities.version() == version_before {
            let _ = self.call(&Command::Capability, cancel).await;
        }
        if self.capabilities.contains(&Capability::Namespace) {
            let _ = self.call(&Command::Namespace, cancel).await;
        }
        let _ = self
            .call(
                &Command::List { reference: String::new(), pattern: "*".to_string() },
                cancel,
            )
            .await;
    }
}
