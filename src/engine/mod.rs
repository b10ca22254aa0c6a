//! Drives one IMAP connection: tag generation, capability tracking,
//! session lifecycle, and command/response framing.
//!
//! Generalizes the teacher's `pipeline.rs` queue-and-drain loop: instead of
//! overlapping several in-flight commands, [`Engine::call`] writes one
//! command's frames (pausing for literal continuations as needed) and then
//! reads until that command's tagged reply arrives before returning control
//! to the caller. IDLE and AUTHENTICATE have their own wire choreography
//! that does not fit this shape, so they get dedicated drivers in
//! [`idle`] and [`auth`] built on the same lower-level primitives.

pub mod auth;
pub mod extensions;
pub mod idle;
pub mod response;
pub mod state;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

use crate::command::{Command, Frame, TagGenerator};
use crate::error::{Error, Result};
use crate::handler::{NoopHandler, ResponseHandler};
use crate::logger::{NoopLogger, ProtocolLogger};
use crate::redactor::SecretRedactor;
use crate::tokenizer::Tokenizer;
use crate::types::{Capability, CapabilitySet, Mailbox, MailboxAttribute, MailboxStatus, ResponseCode, Status};

pub use response::{Response, UntaggedResponse};
pub use state::{EngineState, FolderDescriptor, SelectedFolder, SessionState};

/// The tagged completion a finished command ended with.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    /// Completion status. Always `Ok` unless the caller chose to inspect a
    /// `CommandError` without propagating it.
    pub status: Status,
    /// Response code accompanying the tagged reply, if any.
    pub code: Option<ResponseCode>,
    /// Human-readable completion text.
    pub text: String,
}

/// Drives one IMAP connection over transport `S`.
///
/// `S` is generic everywhere except the STARTTLS/COMPRESS upgrade methods
/// in [`extensions`], which consume and rewrap the transport and therefore
/// only make sense for the concrete [`crate::bytestream::Transport`] enum.
pub struct Engine<S> {
    tokenizer: Tokenizer<S>,
    tags: TagGenerator,
    capabilities: CapabilitySet,
    session: SessionState,
    logger: Box<dyn ProtocolLogger + Send>,
    handler: Box<dyn ResponseHandler + Send>,
    redactor: SecretRedactor,
}

impl<S> Engine<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a freshly connected transport with no logger and a no-op
    /// unsolicited-response handler. Call [`Engine::read_greeting`] before
    /// issuing any command.
    #[must_use]
    pub fn new(transport: S) -> Self {
        Self::with_handler(transport, Box::new(NoopHandler))
    }

    /// Wraps a transport with a caller-supplied unsolicited-response
    /// handler.
    #[must_use]
    pub fn with_handler(transport: S, handler: Box<dyn ResponseHandler + Send>) -> Self {
        Self {
            tokenizer: Tokenizer::new(crate::bytestream::ByteStream::new(transport)),
            tags: TagGenerator::default(),
            capabilities: CapabilitySet::new(),
            session: SessionState::new(),
            logger: Box::new(NoopLogger),
            handler,
            redactor: SecretRedactor::new(),
        }
    }

    /// Installs a protocol logger (the default is a no-op).
    pub fn set_logger(&mut self, logger: Box<dyn ProtocolLogger + Send>) {
        self.logger = logger;
    }

    /// Replaces the unsolicited-response handler.
    pub fn set_handler(&mut self, handler: Box<dyn ResponseHandler + Send>) {
        self.handler = handler;
    }

    /// The server's advertised capabilities, as of the last CAPABILITY
    /// response (greeting, explicit CAPABILITY command, or a `[CAPABILITY
    /// ...]` resp-code riding a tagged reply).
    #[must_use]
    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    /// The connection's lifecycle and mailbox state.
    #[must_use]
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Mutable access to the connection's lifecycle and mailbox state, for
    /// callers (namely [`crate::client::Client`]) that drive transitions
    /// CLOSE/UNSELECT leave for them to record.
    pub(crate) fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    /// Reassembles `tokenizer`/`tags`/`capabilities`/`session`/`logger`/
    /// `handler`/`redactor` into a new engine wrapping a different
    /// transport. Used by [`extensions`] after a STARTTLS or COMPRESS
    /// upgrade rewraps the underlying I/O type.
    fn rewrap<T>(self, tokenizer: Tokenizer<T>) -> Engine<T>
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        Engine {
            tokenizer,
            tags: self.tags,
            capabilities: self.capabilities,
            session: self.session,
            logger: self.logger,
            handler: self.handler,
            redactor: self.redactor,
        }
    }

    /// Consumes the engine, discarding session state, and returns the
    /// tokenizer (and, transitively, the transport) underneath it.
    pub fn into_tokenizer(self) -> Tokenizer<S> {
        self.tokenizer
    }

    /// Reads and processes the server's opening greeting.
    ///
    /// Per RFC 3501 §7.1.1, the first untagged response after connecting
    /// must be `OK` (not yet authenticated), `PREAUTH` (already
    /// authenticated, e.g. via an external trust mechanism), or `BYE`
    /// (server is refusing the connection). If the greeting did not carry
    /// a `[CAPABILITY ...]` resp-code, this issues an explicit CAPABILITY
    /// command so the capability cache is always populated afterward.
    ///
    /// # Errors
    /// Returns [`Error::ProtocolError`] if the first line is not one of
    /// the three permitted greeting forms, or any transport error.
    pub async fn read_greeting(&mut self, cancel: &CancellationToken) -> Result<()> {
        let had_capability = match self.read_response(cancel).await? {
            Response::Untagged(UntaggedResponse::Ok { code, .. }) => {
                self.session.transition_connected()?;
                matches!(code, Some(ResponseCode::Capability(_)))
            }
            Response::Untagged(UntaggedResponse::PreAuth { code, .. }) => {
                self.session.transition_preauth()?;
                matches!(code, Some(ResponseCode::Capability(_)))
            }
            Response::Untagged(UntaggedResponse::Bye { text, .. }) => {
                return Err(Error::ProtocolError(format!(
                    "server refused connection: {text}"
                )));
            }
            other => {
                return Err(Error::ProtocolError(format!(
                    "expected a greeting, got {other:?}"
                )));
            }
        };
        if !had_capability {
            self.call(&Command::Capability, cancel).await?;
        }
        Ok(())
    }

    /// Runs one command to completion: writes its frames (pausing for `+`
    /// continuations between a literal marker and its body as needed),
    /// then reads responses until the matching tagged reply arrives.
    ///
    /// Not for [`Command::Idle`] or [`Command::Authenticate`], whose
    /// continuation exchanges are not literal synchronization and have
    /// their own drivers in [`idle`] and [`auth`].
    ///
    /// # Errors
    /// Returns [`Error::CommandError`] if the tagged reply is `NO`/`BAD`,
    /// or if the server sends `BYE` before replying. Returns
    /// [`Error::InvalidState`] if `command` requires more session state
    /// than is currently gated (callers are expected to check this
    /// themselves via [`SessionState`] before calling).
    pub async fn call(&mut self, command: &Command, cancel: &CancellationToken) -> Result<CommandOutcome> {
        debug_assert!(
            !matches!(command, Command::Idle | Command::Authenticate { .. }),
            "IDLE and AUTHENTICATE must be driven through engine::idle / engine::auth"
        );
        let tag = self.tags.next();
        let literal_plus = self.literal_plus();
        let frames = command.serialize_frames(&tag, literal_plus);
        self.write_frames(&frames, literal_plus, cancel).await?;
        self.await_tagged(&tag, command_name(command), cancel).await
    }

    /// `true` once the server has advertised non-synchronizing literals.
    pub(crate) fn literal_plus(&self) -> bool {
        self.capabilities.contains(&Capability::LiteralPlus)
            || self.capabilities.contains(&Capability::LiteralMinus)
    }

    /// Writes a complete frame sequence, pausing for a `+` continuation
    /// between a synchronizing literal marker and its body.
    pub(crate) async fn write_frames(
        &mut self,
        frames: &[Frame],
        literal_plus: bool,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut iter = frames.iter().peekable();
        while let Some(frame) = iter.next() {
            match frame {
                Frame::Bytes(bytes) => {
                    self.write_raw(bytes, cancel).await?;
                    let next_is_literal = matches!(iter.peek(), Some(Frame::Literal(_)));
                    if next_is_literal && !literal_plus {
                        self.await_continuation(cancel).await?;
                    }
                }
                Frame::Literal(bytes) => {
                    self.write_raw(bytes, cancel).await?;
                }
            }
        }
        Ok(())
    }

    /// Writes one frame's bytes through the redactor and logger, then
    /// flushes.
    async fn write_raw(&mut self, bytes: &[u8], cancel: &CancellationToken) -> Result<()> {
        let _ = cancel;
        let redactions = self.redactor.scan_outbound_line(bytes);
        self.logger.log_client(bytes, &redactions);
        self.tokenizer.stream_mut().write(bytes).await?;
        self.tokenizer.stream_mut().flush().await?;
        Ok(())
    }

    /// Writes a bare command line (tag, keyword, CRLF) built outside the
    /// [`Command`]/[`Frame`] machinery. Used by [`idle`] and [`auth`] for
    /// `DONE` and SASL continuation responses.
    pub(crate) async fn write_line(&mut self, line: &[u8], cancel: &CancellationToken) -> Result<()> {
        let mut buf = Vec::with_capacity(line.len() + 2);
        buf.extend_from_slice(line);
        buf.extend_from_slice(b"\r\n");
        self.write_raw(&buf, cancel).await
    }

    /// Reads responses until a `+` continuation arrives, dispatching any
    /// untagged data encountered along the way exactly as it would be
    /// dispatched outside a command.
    ///
    /// # Errors
    /// Returns [`Error::ProtocolError`] if a tagged reply arrives instead
    /// of the expected continuation (an unsolicited tagged reply here
    /// means the server and client have desynchronized).
    pub(crate) async fn await_continuation(&mut self, cancel: &CancellationToken) -> Result<Option<String>> {
        loop {
            match self.read_response(cancel).await? {
                Response::Continuation { text } => return Ok(text),
                Response::Untagged(_) => continue,
                Response::Tagged { tag, status, .. } => {
                    return Err(Error::ProtocolError(format!(
                        "expected a continuation but got tagged reply {tag} {status:?}"
                    )));
                }
            }
        }
    }

    /// Reads responses until the tagged reply for `tag` arrives,
    /// dispatching untagged data as it comes in.
    ///
    /// A `BYE` observed before the tagged reply ends the command early: the
    /// session is moved to [`EngineState::Disconnected`] and the result is
    /// surfaced as a `CommandError` with [`Status::Bye`].
    async fn await_tagged(&mut self, tag: &str, command: &str, cancel: &CancellationToken) -> Result<CommandOutcome> {
        loop {
            match self.read_response(cancel).await? {
                Response::Tagged { tag: reply_tag, status, code, text } => {
                    if reply_tag.as_str() != tag {
                        return Err(Error::ProtocolError(format!(
                            "expected tagged reply {tag}, got {}",
                            reply_tag.as_str()
                        )));
                    }
                    return match status {
                        Status::Ok | Status::PreAuth => Ok(CommandOutcome { status, code, text }),
                        _ => Err(Error::CommandError {
                            command: command.to_string(),
                            status,
                            code,
                            text,
                        }),
                    };
                }
                Response::Untagged(UntaggedResponse::Bye { text, .. }) => {
                    self.session.disconnect();
                    return Err(Error::CommandError {
                        command: command.to_string(),
                        status: Status::Bye,
                        code: None,
                        text,
                    });
                }
                Response::Untagged(_) => continue,
                Response::Continuation { text } => {
                    return Err(Error::ProtocolError(format!(
                        "unexpected continuation while awaiting tagged reply {tag}: {text:?}"
                    )));
                }
            }
        }
    }

    /// Reads and parses exactly one response line, applying its effects to
    /// `capabilities`/`session` and forwarding it to the unsolicited
    /// handler if it is untagged, then returns it to the caller so
    /// `call`/`await_tagged`/`await_continuation`/[`idle`]/[`auth`] can act
    /// on `Tagged`/`Continuation` variants themselves.
    pub(crate) async fn read_response(&mut self, cancel: &CancellationToken) -> Result<Response> {
        let response = response::parse_response(&mut self.tokenizer, cancel).await?;
        self.logger.log_server(self.tokenizer.current_line());
        if let Response::Untagged(untagged) = &response {
            self.dispatch_untagged(untagged);
        }
        Ok(response)
    }

    /// Applies an untagged response's effects to session/capability state
    /// and forwards it to the registered [`ResponseHandler`].
    fn dispatch_untagged(&mut self, untagged: &UntaggedResponse) {
        match untagged {
            UntaggedResponse::Ok { code, text } => {
                self.apply_code(code.as_ref());
                self.handler.on_ok(text);
            }
            UntaggedResponse::No { code, text } => {
                self.apply_code(code.as_ref());
                self.handler.on_no(text);
            }
            UntaggedResponse::Bad { code, text } => {
                self.apply_code(code.as_ref());
                self.handler.on_bad(text);
            }
            UntaggedResponse::PreAuth { code, .. } => {
                self.apply_code(code.as_ref());
            }
            UntaggedResponse::Bye { text, .. } => {
                self.session.disconnect();
                self.handler.on_bye(text);
            }
            UntaggedResponse::Capability(caps) => {
                self.capabilities.replace(caps.clone());
            }
            UntaggedResponse::Enabled(_) => {}
            UntaggedResponse::Flags(flags) => {
                self.handler.on_flags(flags);
                self.session.update_selected_status(|status| status.flags = flags.clone());
            }
            UntaggedResponse::List(entry) => {
                self.session.cache_folder(
                    entry.mailbox.as_str().to_string(),
                    FolderDescriptor {
                        attributes: entry.attributes.clone(),
                        delimiter: entry.delimiter,
                    },
                );
            }
            UntaggedResponse::Lsub(_) => {}
            UntaggedResponse::Namespace(namespaces) => {
                self.session.record_namespaces(namespaces.clone());
            }
            UntaggedResponse::Exists(count) => {
                self.handler.on_exists(*count);
                self.session.update_selected_status(|status| status.exists = *count);
            }
            UntaggedResponse::Recent(count) => {
                self.handler.on_recent(*count);
                self.session.update_selected_status(|status| status.recent = *count);
            }
            UntaggedResponse::Expunge(seq) => {
                self.handler.on_expunge(*seq);
                self.session.update_selected_status(|status| {
                    status.exists = status.exists.saturating_sub(1);
                });
            }
            UntaggedResponse::Fetch { seq, items } => {
                self.handler.on_fetch(*seq, items);
            }
            UntaggedResponse::Search(_) | UntaggedResponse::Status { .. } | UntaggedResponse::Id(_) => {}
        }
    }

    /// Applies the effects of a bracketed resp-code shared by any untagged
    /// status response (`CAPABILITY`, `ALERT`, `APPENDLIMIT`, ...).
    fn apply_code(&mut self, code: Option<&ResponseCode>) {
        match code {
            Some(ResponseCode::Capability(caps)) => self.capabilities.replace(caps.clone()),
            Some(ResponseCode::Alert) => self.handler.on_alert(""),
            _ => {}
        }
    }

    /// Records a successful SELECT/EXAMINE, updating both the session's
    /// selected-folder state and, if the server reported one, the APPEND
    /// size limit.
    pub(crate) fn record_select(&mut self, mailbox: Mailbox, status: MailboxStatus) -> Result<()> {
        self.session.select(mailbox, status)
    }

    /// Looks up a cached special-use folder (Sent, Trash, Drafts, ...) by
    /// its LIST attribute, without re-issuing LIST.
    #[must_use]
    pub fn special_use_folder(&self, attribute: &MailboxAttribute) -> Option<&str> {
        self.session.special_use_folder(attribute)
    }

    /// Runs `command` through the same write/read cycle as [`Engine::call`]
    /// while also folding every untagged response through `collect` into
    /// `acc`, for commands (ENABLE, ID, LIST, STATUS, SEARCH, FETCH, SELECT,
    /// ...) whose useful result rides an untagged line rather than session
    /// state [`Engine::dispatch_untagged`] already tracks.
    pub(crate) async fn call_collecting<T>(
        &mut self,
        command: &Command,
        cancel: &CancellationToken,
        collect: impl Fn(&UntaggedResponse, &mut T),
        acc: &mut T,
    ) -> Result<CommandOutcome> {
        let tag = self.tags.next();
        let literal_plus = self.literal_plus();
        let frames = command.serialize_frames(&tag, literal_plus);
        self.write_frames(&frames, literal_plus, cancel).await?;
        loop {
            match self.read_response(cancel).await? {
                Response::Tagged { tag: reply_tag, status, code, text } => {
                    if reply_tag.as_str() != tag {
                        return Err(Error::ProtocolError(format!(
                            "expected tagged reply {tag}, got {}",
                            reply_tag.as_str()
                        )));
                    }
                    return match status {
                        Status::Ok | Status::PreAuth => Ok(CommandOutcome { status, code, text }),
                        _ => Err(Error::CommandError {
                            command: command_name(command).to_string(),
                            status,
                            code,
                            text,
                        }),
                    };
                }
                Response::Untagged(untagged) => {
                    collect(&untagged, acc);
                }
                Response::Continuation { text } => {
                    return Err(Error::ProtocolError(format!(
                        "unexpected continuation for {}: {text:?}",
                        command_name(command)
                    )));
                }
            }
        }
    }
}

/// The keyword used to identify a command in a [`Error::CommandError`].
fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Capability => "CAPABILITY",
        Command::Noop => "NOOP",
        Command::Logout => "LOGOUT",
        Command::StartTls => "STARTTLS",
        Command::Login { .. } => "LOGIN",
        Command::Authenticate { .. } => "AUTHENTICATE",
        Command::Id { .. } => "ID",
        Command::Enable { .. } => "ENABLE",
        Command::Select { .. } => "SELECT",
        Command::Examine { .. } => "EXAMINE",
        Command::Create { .. } => "CREATE",
        Command::Delete { .. } => "DELETE",
        Command::Rename { .. } => "RENAME",
        Command::Subscribe { .. } => "SUBSCRIBE",
        Command::Unsubscribe { .. } => "UNSUBSCRIBE",
        Command::List { .. } => "LIST",
        Command::Namespace => "NAMESPACE",
        Command::Status { .. } => "STATUS",
        Command::Append { .. } => "APPEND",
        Command::Close => "CLOSE",
        Command::Unselect => "UNSELECT",
        Command::Expunge => "EXPUNGE",
        Command::UidExpunge { .. } => "UID EXPUNGE",
        Command::Search { .. } => "SEARCH",
        Command::Fetch { .. } => "FETCH",
        Command::Store { .. } => "STORE",
        Command::Copy { .. } => "COPY",
        Command::Move { .. } => "MOVE",
        Command::Idle => "IDLE",
        Command::Done => "DONE",
        Command::Compress => "COMPRESS",
        Command::Notify { .. } => "NOTIFY",
        Command::DisableNotify => "NOTIFY",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::handler::CollectingHandler;
    use tokio_util::sync::CancellationToken;

    fn engine_over(script: tokio_test::io::Mock) -> Engine<tokio_test::io::Mock> {
        Engine::new(script)
    }

    #[tokio::test]
    async fn reads_ok_greeting_and_issues_capability_when_absent() {
        let mock = tokio_test::io::Builder::new()
            .read(b"* OK IMAP4rev1 Service Ready\r\n")
            .write(b"A0000 CAPABILITY\r\n")
            .read(b"* CAPABILITY IMAP4rev1 IDLE LITERAL+\r\n")
            .read(b"A0000 OK CAPABILITY completed\r\n")
            .build();
        let mut engine = engine_over(mock);
        let cancel = CancellationToken::new();
        engine.read_greeting(&cancel).await.unwrap();
        assert_eq!(engine.session().state(), EngineState::Connected);
        assert!(engine.capabilities().contains(&Capability::Idle));
        assert!(engine.literal_plus());
    }

    #[tokio::test]
    async fn preauth_greeting_skips_straight_to_authenticated() {
        let mock = tokio_test::io::Builder::new()
            .read(b"* PREAUTH [CAPABILITY IMAP4rev1 IDLE] already authenticated\r\n")
            .build();
        let mut engine = engine_over(mock);
        let cancel = CancellationToken::new();
        engine.read_greeting(&cancel).await.unwrap();
        assert_eq!(engine.session().state(), EngineState::Authenticated);
    }

    #[tokio::test]
    async fn bye_greeting_is_rejected_and_disconnects() {
        let mock = tokio_test::io::Builder::new()
            .read(b"* BYE too many connections\r\n")
            .build();
        let mut engine = engine_over(mock);
        let cancel = CancellationToken::new();
        let err = engine.read_greeting(&cancel).await.unwrap_err();
        assert!(matches!(err, Error::ProtocolError(_)));
        assert_eq!(engine.session().state(), EngineState::Disconnected);
    }

    #[tokio::test]
    async fn ordinary_command_round_trips() {
        let mock = tokio_test::io::Builder::new()
            .write(b"A0000 NOOP\r\n")
            .read(b"A0000 OK done\r\n")
            .build();
        let mut engine = engine_over(mock);
        let cancel = CancellationToken::new();
        let outcome = engine.call(&Command::Noop, &cancel).await.unwrap();
        assert_eq!(outcome.status, Status::Ok);
    }

    #[tokio::test]
    async fn no_reply_becomes_command_error_carrying_the_keyword() {
        let mock = tokio_test::io::Builder::new()
            .write(b"A0000 CREATE Archive\r\n")
            .read(b"A0000 NO [TRYCREATE] parent missing\r\n")
            .build();
        let mut engine = engine_over(mock);
        let cancel = CancellationToken::new();
        let err = engine
            .call(&Command::Create { mailbox: Mailbox::new("Archive") }, &cancel)
            .await
            .unwrap_err();
        match err {
            Error::CommandError { command, status, code, .. } => {
                assert_eq!(command, "CREATE");
                assert_eq!(status, Status::No);
                assert_eq!(code, Some(ResponseCode::TryCreate));
            }
            other => panic!("expected CommandError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn bye_before_tagged_reply_ends_the_command_with_status_bye() {
        let mock = tokio_test::io::Builder::new()
            .write(b"A0000 LOGOUT\r\n")
            .read(b"* BYE shutting down\r\n")
            .build();
        let mut engine = engine_over(mock);
        let cancel = CancellationToken::new();
        let err = engine.call(&Command::Logout, &cancel).await.unwrap_err();
        match err {
            Error::CommandError { status, .. } => assert_eq!(status, Status::Bye),
            other => panic!("expected CommandError, got {other:?}"),
        }
        assert_eq!(engine.session().state(), EngineState::Disconnected);
    }

    #[tokio::test]
    async fn literal_without_literal_plus_waits_for_continuation() {
        let mock = tokio_test::io::Builder::new()
            .write(b"A0000 LOGIN {6}\r\n")
            .read(b"+ go ahead\r\n")
            .write(b"al\rice")
            .write(b" secret\r\n")
            .read(b"A0000 OK LOGIN completed\r\n")
            .build();
        let mut engine = engine_over(mock);
        let cancel = CancellationToken::new();
        let outcome = engine
            .call(
                &Command::Login { username: "al\rice".to_string(), password: "secret".to_string() },
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(outcome.status, Status::Ok);
    }

    #[tokio::test]
    async fn untagged_exists_updates_selected_status_and_handler() {
        let mock = tokio_test::io::Builder::new()
            .write(b"A0000 NOOP\r\n")
            .read(b"* 42 EXISTS\r\n")
            .read(b"A0000 OK done\r\n")
            .build();
        let mut engine = Engine::with_handler(mock, Box::new(CollectingHandler::new()));
        engine.session.transition_connected().unwrap();
        engine.session.transition_authenticated().unwrap();
        engine
            .session
            .select(Mailbox::inbox(), MailboxStatus::default())
            .unwrap();
        let cancel = CancellationToken::new();
        engine.call(&Command::Noop, &cancel).await.unwrap();
        assert_eq!(engine.session().selected().unwrap().status.exists, 42);
    }

    #[tokio::test]
    async fn untagged_capability_resp_code_refreshes_capability_cache() {
        let mock = tokio_test::io::Builder::new()
            .write(b"A0000 LOGIN jo hunter2\r\n")
            .read(b"A0000 OK [CAPABILITY IMAP4rev1 IDLE] LOGIN completed\r\n")
            .build();
        let mut engine = engine_over(mock);
        let cancel = CancellationToken::new();
        let before = engine.capabilities().version();
        engine
            .call(&Command::Login { username: "jo".to_string(), password: "hunter2".to_string() }, &cancel)
            .await
            .unwrap();
        assert!(engine.capabilities().contains(&Capability::Idle));
        assert!(engine.capabilities().version() > before);
    }

    #[tokio::test]
    async fn unexpected_tagged_reply_while_awaiting_continuation_is_a_protocol_error() {
        let mock = tokio_test::io::Builder::new()
            .write(b"A0000 LOGIN {6}\r\n")
            .read(b"A0000 BAD unexpected literal\r\n")
            .build();
        let mut engine = engine_over(mock);
        let cancel = CancellationToken::new();
        let err = engine
            .call(
                &Command::Login { username: "al\rice".to_string(), password: "secret".to_string() },
                &cancel,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ProtocolError(_)));
    }
}
