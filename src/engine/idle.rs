//! IDLE controller (RFC 2177).
//!
//! IDLE's wire choreography does not fit [`Engine::call`]: the server's `+`
//! continuation does not ask for a literal body, it marks the point after
//! which the client must send nothing until it writes `DONE`, and the
//! command is ended by the *caller*, not by anything the server sends.
//! [`Engine::idle`] therefore drives its own read/write loop instead of
//! going through the generic command path.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

use super::{CommandOutcome, Engine, EngineState, Response};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::types::Capability;

impl<S> Engine<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Enters IDLE and stays there until `done_signal` fires.
    ///
    /// `done_signal` must be a distinct token from `cancel`: firing it ends
    /// IDLE cleanly (`DONE` is written, the tagged `OK` is awaited, and the
    /// session returns to `Selected`). Firing `cancel` instead aborts the
    /// read immediately without sending `DONE`, which the server will
    /// eventually notice as a dead connection rather than a clean exit —
    /// callers that want a graceful stop must always signal via
    /// `done_signal`, not `cancel`.
    ///
    /// Untagged data received while idling (EXISTS, EXPUNGE, FETCH,
    /// RECENT, ...) is dispatched to the registered
    /// [`crate::handler::ResponseHandler`] exactly as it would be outside
    /// IDLE; [`Engine::idle`] never buffers it separately.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] if `done_signal` is already
    /// cancelled before IDLE even starts (there would be no way to
    /// distinguish "ended immediately" from "never really idled"), or if
    /// the session is not currently `Selected`. Returns
    /// [`Error::NotSupported`] if the server never advertised IDLE.
    /// Returns [`Error::ProtocolError`] if the server's reply to `IDLE` is
    /// anything but a `+` continuation.
    pub async fn idle(&mut self, done_signal: &CancellationToken, cancel: &CancellationToken) -> Result<CommandOutcome> {
        if done_signal.is_cancelled() {
            return Err(Error::InvalidState(
                "IDLE done signal must not already be cancelled".into(),
            ));
        }
        self.session.require_selected()?;
        if !self.capabilities.contains(&Capability::Idle) {
            return Err(Error::NotSupported("IDLE".into()));
        }

        let tag = self.tags.next();
        let literal_plus = self.literal_plus();
        let frames = Command::Idle.serialize_frames(&tag, literal_plus);
        self.write_frames(&frames, literal_plus, cancel).await?;
        self.await_continuation(cancel).await?;
        self.session.enter_idle()?;

        loop {
            tokio::select! {
                biased;
                () = done_signal.cancelled() => break,
                response = self.read_response(cancel) => {
                    match response? {
                        Response::Untagged(_) => {}
                        Response::Continuation { .. } => {
                            return Err(Error::ProtocolError(
                                "unexpected continuation while idling".into(),
                            ));
                        }
                        Response::Tagged { tag: reply_tag, status, .. } => {
                            return Err(Error::ProtocolError(format!(
                                "server ended IDLE unprompted with tagged reply {} {status:?}",
                                reply_tag.as_str()
                            )));
                        }
                    }
                }
            }
        }

        self.write_line(b"DONE", cancel).await?;
        let outcome = self.await_tagged(&tag, "IDLE", cancel).await;
        if outcome.is_ok() {
            self.session.exit_idle()?;
        }
        outcome
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Mailbox, MailboxStatus};

    async fn selected_engine(mock: tokio_test::io::Mock) -> Engine<tokio_test::io::Mock> {
        let mut engine = Engine::new(mock);
        engine.session.transition_connected().unwrap();
        engine.session.transition_authenticated().unwrap();
        engine
            .session
            .select(Mailbox::inbox(), MailboxStatus::default())
            .unwrap();
        engine.capabilities.replace(vec![Capability::Idle]);
        engine
    }

    #[tokio::test]
    async fn idle_ends_cleanly_when_done_signal_fires() {
        let mock = tokio_test::io::Builder::new()
            .write(b"A0000 IDLE\r\n")
            .read(b"+ idling\r\n")
            .read(b"* 4 EXISTS\r\n")
            .write(b"DONE\r\n")
            .read(b"A0000 OK IDLE completed\r\n")
            .build();
        let mut engine = selected_engine(mock).await;
        let cancel = CancellationToken::new();
        let done = CancellationToken::new();

        let done_clone = done.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            done_clone.cancel();
        });

        let outcome = engine.idle(&done, &cancel).await.unwrap();
        assert_eq!(outcome.status, crate::types::Status::Ok);
        assert_eq!(engine.session().state(), EngineState::Selected);
        assert_eq!(engine.session().selected().unwrap().status.exists, 4);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn pre_cancelled_done_signal_is_rejected() {
        let mock = tokio_test::io::Builder::new().build();
        let mut engine = selected_engine(mock).await;
        let cancel = CancellationToken::new();
        let done = CancellationToken::new();
        done.cancel();
        let err = engine.idle(&done, &cancel).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[tokio::test]
    async fn idle_requires_the_server_to_advertise_it() {
        let mock = tokio_test::io::Builder::new().build();
        let mut engine = Engine::new(mock);
        engine.session.transition_connected().unwrap();
        engine.session.transition_authenticated().unwrap();
        engine
            .session
            .select(Mailbox::inbox(), MailboxStatus::default())
            .unwrap();
        // No `Capability::Idle` in the cache, unlike `selected_engine`.
        let cancel = CancellationToken::new();
        let done = CancellationToken::new();
        let err = engine.idle(&done, &cancel).await.unwrap_err();
        assert!(matches!(err, Error::NotSupported(_)));
    }

    #[tokio::test]
    async fn idle_requires_a_selected_mailbox() {
        let mock = tokio_test::io::Builder::new().build();
        let mut engine = Engine::new(mock);
        engine.session.transition_connected().unwrap();
        engine.session.transition_authenticated().unwrap();
        let cancel = CancellationToken::new();
        let done = CancellationToken::new();
        let err = engine.idle(&done, &cancel).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }
}
