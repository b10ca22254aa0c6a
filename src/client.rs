//! Ergonomic command surface over [`Engine`].
//!
//! Generalizes the teacher's compile-time type-state `Client<S, State>`
//! (separate `NotAuthenticated`/`Authenticated`/`Selected` structs, one
//! `impl` block of methods per state) into a single `Client<S>` that checks
//! the engine's runtime [`EngineState`] instead: every method that the
//! teacher only exposed on one state struct returns [`Error::InvalidState`]
//! here if called out of order, rather than failing to compile.

use tokio_util::sync::CancellationToken;

use crate::command::{
    Command, FetchAttribute, FetchItems, NotifyEntry, SearchCriteria, StatusAttribute, StoreAction,
};
use crate::engine::response::{FetchItem, StatusItem, UntaggedResponse};
use crate::engine::{CommandOutcome, Engine, EngineState};
use crate::error::{Error, Result};
use crate::sasl::SaslMechanism;
use crate::types::{
    Capability, Flag, ListResponse, Mailbox, MailboxStatus, ResponseCode, SeqNum, SequenceSet, Uid,
    UidSet,
};

/// Wraps an [`Engine`] with a method per IMAP operation, collecting each
/// command's untagged data into the shape callers actually want (a
/// [`MailboxStatus`], a list of [`ListResponse`]s, fetched items keyed by
/// sequence number, ...) instead of leaving that to the caller.
pub struct Client<S> {
    engine: Engine<S>,
}

impl<S> From<Engine<S>> for Client<S> {
    fn from(engine: Engine<S>) -> Self {
        Self { engine }
    }
}

impl<S> Client<S>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    /// Wraps a connected engine (greeting already read) in the command
    /// facade.
    #[must_use]
    pub fn new(engine: Engine<S>) -> Self {
        Self { engine }
    }

    /// Unwraps back to the underlying [`Engine`], e.g. to drive IDLE or an
    /// extension method not mirrored here.
    #[must_use]
    pub fn into_engine(self) -> Engine<S> {
        self.engine
    }

    /// The underlying engine, for read-only inspection (capabilities,
    /// session state).
    #[must_use]
    pub fn engine(&self) -> &Engine<S> {
        &self.engine
    }

    /// Authenticates via SASL (falling back to LOGIN), trying `mechanisms`
    /// in order.
    ///
    /// # Errors
    /// See [`Engine::authenticate`].
    pub async fn login_with(
        &mut self,
        mechanisms: Vec<Box<dyn SaslMechanism>>,
        username: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> Result<CommandOutcome> {
        self.engine.authenticate(mechanisms, username, password, cancel).await
    }

    /// Authenticates via plaintext `LOGIN`, bypassing SASL entirely.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] unless the session is `Connected`.
    pub async fn login(&mut self, username: &str, password: &str, cancel: &CancellationToken) -> Result<CommandOutcome> {
        self.engine.authenticate(Vec::new(), username, password, cancel).await
    }

    /// Selects a mailbox for read-write access.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] unless the session is authenticated.
    pub async fn select(&mut self, mailbox: &str, cancel: &CancellationToken) -> Result<MailboxStatus> {
        self.select_or_examine(mailbox, false, cancel).await
    }

    /// Selects a mailbox for read-only access.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] unless the session is authenticated.
    pub async fn examine(&mut self, mailbox: &str, cancel: &CancellationToken) -> Result<MailboxStatus> {
        self.select_or_examine(mailbox, true, cancel).await
    }

    async fn select_or_examine(&mut self, mailbox: &str, read_only: bool, cancel: &CancellationToken) -> Result<MailboxStatus> {
        self.engine.session().require_authenticated()?;
        let mailbox = Mailbox::new(mailbox);
        let command = if read_only {
            Command::Examine { mailbox: mailbox.clone() }
        } else {
            Command::Select { mailbox: mailbox.clone(), condstore: false }
        };
        let mut status = MailboxStatus { read_only, ..MailboxStatus::default() };
        let outcome = self
            .engine
            .call_collecting(&command, cancel, collect_mailbox_status, &mut status)
            .await?;
        apply_select_code(&mut status, outcome.code.as_ref());
        self.engine.record_select(mailbox, status.clone())?;
        Ok(status)
    }

    /// Lists mailboxes matching `pattern` under `reference`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] unless the session is authenticated.
    pub async fn list(&mut self, reference: &str, pattern: &str, cancel: &CancellationToken) -> Result<Vec<ListResponse>> {
        self.engine.session().require_authenticated()?;
        let mut entries = Vec::new();
        self.engine
            .call_collecting(
                &Command::List { reference: reference.to_string(), pattern: pattern.to_string() },
                cancel,
                |untagged, out: &mut Vec<ListResponse>| {
                    if let UntaggedResponse::List(entry) = untagged {
                        out.push(entry.clone());
                    }
                },
                &mut entries,
            )
            .await?;
        Ok(entries)
    }

    /// Creates a mailbox.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] unless the session is authenticated.
    pub async fn create(&mut self, mailbox: &str, cancel: &CancellationToken) -> Result<CommandOutcome> {
        self.engine.session().require_authenticated()?;
        self.engine.call(&Command::Create { mailbox: Mailbox::new(mailbox) }, cancel).await
    }

    /// Deletes a mailbox.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] unless the session is authenticated.
    pub async fn delete(&mut self, mailbox: &str, cancel: &CancellationToken) -> Result<CommandOutcome> {
        self.engine.session().require_authenticated()?;
        self.engine.call(&Command::Delete { mailbox: Mailbox::new(mailbox) }, cancel).await
    }

    /// Renames a mailbox.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] unless the session is authenticated.
    pub async fn rename(&mut self, from: &str, to: &str, cancel: &CancellationToken) -> Result<CommandOutcome> {
        self.engine.session().require_authenticated()?;
        self.engine
            .call(&Command::Rename { from: Mailbox::new(from), to: Mailbox::new(to) }, cancel)
            .await
    }

    /// Subscribes to a mailbox.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] unless the session is authenticated.
    pub async fn subscribe(&mut self, mailbox: &str, cancel: &CancellationToken) -> Result<CommandOutcome> {
        self.engine.session().require_authenticated()?;
        self.engine.call(&Command::Subscribe { mailbox: Mailbox::new(mailbox) }, cancel).await
    }

    /// Unsubscribes from a mailbox.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] unless the session is authenticated.
    pub async fn unsubscribe(&mut self, mailbox: &str, cancel: &CancellationToken) -> Result<CommandOutcome> {
        self.engine.session().require_authenticated()?;
        self.engine.call(&Command::Unsubscribe { mailbox: Mailbox::new(mailbox) }, cancel).await
    }

    /// Queries a mailbox's status without selecting it.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] unless the session is authenticated.
    pub async fn status(&mut self, mailbox: &str, items: Vec<StatusAttribute>, cancel: &CancellationToken) -> Result<Vec<StatusItem>> {
        self.engine.session().require_authenticated()?;
        let mut collected = Vec::new();
        self.engine
            .call_collecting(
                &Command::Status { mailbox: Mailbox::new(mailbox), items },
                cancel,
                |untagged, out: &mut Vec<StatusItem>| {
                    if let UntaggedResponse::Status { items, .. } = untagged {
                        out.extend(items.iter().cloned());
                    }
                },
                &mut collected,
            )
            .await?;
        Ok(collected)
    }

    /// Appends a complete RFC 5322 message to `mailbox`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] unless the session is authenticated.
    pub async fn append(
        &mut self,
        mailbox: &str,
        flags: Option<Vec<Flag>>,
        message: Vec<u8>,
        cancel: &CancellationToken,
    ) -> Result<CommandOutcome> {
        self.engine.session().require_authenticated()?;
        self.engine
            .call(&Command::Append { mailbox: Mailbox::new(mailbox), flags, message }, cancel)
            .await
    }

    /// Closes the selected mailbox, expunging any `\Deleted` messages,
    /// returning to the authenticated state.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] unless a mailbox is selected.
    pub async fn close(&mut self, cancel: &CancellationToken) -> Result<CommandOutcome> {
        self.engine.session().require_selected()?;
        let outcome = self.engine.call(&Command::Close, cancel).await?;
        self.engine.session_mut().close_selected()?;
        Ok(outcome)
    }

    /// Deselects the current mailbox without expunging (RFC 5161 UNSELECT).
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] unless a mailbox is selected.
    pub async fn unselect(&mut self, cancel: &CancellationToken) -> Result<CommandOutcome> {
        self.engine.session().require_selected()?;
        let outcome = self.engine.call(&Command::Unselect, cancel).await?;
        self.engine.session_mut().close_selected()?;
        Ok(outcome)
    }

    /// Permanently removes `\Deleted` messages from the selected mailbox.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] unless a mailbox is selected.
    pub async fn expunge(&mut self, cancel: &CancellationToken) -> Result<Vec<SeqNum>> {
        self.engine.session().require_selected()?;
        self.collect_expunge(&Command::Expunge, cancel).await
    }

    /// Expunges only the given UIDs (RFC 4315 UID EXPUNGE).
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] unless a mailbox is selected.
    pub async fn uid_expunge(&mut self, uids: UidSet, cancel: &CancellationToken) -> Result<Vec<SeqNum>> {
        self.engine.session().require_selected()?;
        self.collect_expunge(&Command::UidExpunge { uids: uids.as_sequence_set() }, cancel).await
    }

    async fn collect_expunge(&mut self, command: &Command, cancel: &CancellationToken) -> Result<Vec<SeqNum>> {
        let mut expunged = Vec::new();
        self.engine
            .call_collecting(
                command,
                cancel,
                |untagged, out: &mut Vec<SeqNum>| {
                    if let UntaggedResponse::Expunge(seq) = untagged {
                        out.push(*seq);
                    }
                },
                &mut expunged,
            )
            .await?;
        Ok(expunged)
    }

    /// Searches the selected mailbox by sequence number.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] unless a mailbox is selected.
    pub async fn search(&mut self, criteria: SearchCriteria, cancel: &CancellationToken) -> Result<Vec<SeqNum>> {
        self.search_with(criteria, false, cancel).await
    }

    /// Searches the selected mailbox, returning UIDs instead of sequence
    /// numbers.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] unless a mailbox is selected.
    pub async fn uid_search(&mut self, criteria: SearchCriteria, cancel: &CancellationToken) -> Result<Vec<SeqNum>> {
        self.search_with(criteria, true, cancel).await
    }

    async fn search_with(&mut self, criteria: SearchCriteria, uid: bool, cancel: &CancellationToken) -> Result<Vec<SeqNum>> {
        self.engine.session().require_selected()?;
        let mut results = Vec::new();
        self.engine
            .call_collecting(
                &Command::Search { criteria, uid },
                cancel,
                |untagged, out: &mut Vec<SeqNum>| {
                    if let UntaggedResponse::Search(ids) = untagged {
                        out.extend(ids.iter().copied());
                    }
                },
                &mut results,
            )
            .await?;
        Ok(results)
    }

    /// Fetches data items for a sequence-number set.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] unless a mailbox is selected.
    pub async fn fetch(
        &mut self,
        sequence: SequenceSet,
        items: FetchItems,
        cancel: &CancellationToken,
    ) -> Result<Vec<(SeqNum, Vec<FetchItem>)>> {
        self.fetch_with(sequence, items, false, cancel).await
    }

    /// Fetches data items for a UID set.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] unless a mailbox is selected.
    pub async fn uid_fetch(
        &mut self,
        uids: UidSet,
        items: FetchItems,
        cancel: &CancellationToken,
    ) -> Result<Vec<(SeqNum, Vec<FetchItem>)>> {
        self.fetch_with(uids.as_sequence_set(), items, true, cancel).await
    }

    async fn fetch_with(
        &mut self,
        sequence: SequenceSet,
        items: FetchItems,
        uid: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<(SeqNum, Vec<FetchItem>)>> {
        self.engine.session().require_selected()?;
        let mut results = Vec::new();
        self.engine
            .call_collecting(
                &Command::Fetch { sequence, items, uid },
                cancel,
                collect_fetch,
                &mut results,
            )
            .await?;
        Ok(results)
    }

    /// Modifies flags for a sequence-number set, returning the server's
    /// FETCH confirmation for each affected message.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] unless a mailbox is selected.
    pub async fn store(
        &mut self,
        sequence: SequenceSet,
        action: StoreAction,
        cancel: &CancellationToken,
    ) -> Result<Vec<(SeqNum, Vec<FetchItem>)>> {
        self.store_with(sequence, action, false, cancel).await
    }

    /// Modifies flags for a UID set.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] unless a mailbox is selected.
    pub async fn uid_store(
        &mut self,
        uids: UidSet,
        action: StoreAction,
        cancel: &CancellationToken,
    ) -> Result<Vec<(SeqNum, Vec<FetchItem>)>> {
        self.store_with(uids.as_sequence_set(), action, true, cancel).await
    }

    async fn store_with(
        &mut self,
        sequence: SequenceSet,
        action: StoreAction,
        uid: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<(SeqNum, Vec<FetchItem>)>> {
        self.engine.session().require_selected()?;
        let mut results = Vec::new();
        self.engine
            .call_collecting(
                &Command::Store { sequence, action, uid, silent: false },
                cancel,
                collect_fetch,
                &mut results,
            )
            .await?;
        Ok(results)
    }

    /// Copies a sequence-number set to another mailbox.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] unless a mailbox is selected.
    pub async fn copy(&mut self, sequence: SequenceSet, mailbox: &str, cancel: &CancellationToken) -> Result<CommandOutcome> {
        self.engine.session().require_selected()?;
        self.engine
            .call(&Command::Copy { sequence, mailbox: Mailbox::new(mailbox), uid: false }, cancel)
            .await
    }

    /// Copies a UID set to another mailbox.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] unless a mailbox is selected.
    pub async fn uid_copy(&mut self, uids: UidSet, mailbox: &str, cancel: &CancellationToken) -> Result<CommandOutcome> {
        self.engine.session().require_selected()?;
        self.engine
            .call(
                &Command::Copy { sequence: uids.as_sequence_set(), mailbox: Mailbox::new(mailbox), uid: true },
                cancel,
            )
            .await
    }

    /// Moves a sequence-number set to another mailbox (RFC 6851).
    ///
    /// # Errors
    /// Returns [`Error::NotSupported`] if the server never advertised MOVE.
    /// Returns [`Error::InvalidState`] unless a mailbox is selected.
    pub async fn r#move(&mut self, sequence: SequenceSet, mailbox: &str, cancel: &CancellationToken) -> Result<CommandOutcome> {
        self.engine.session().require_selected()?;
        if !self.engine.capabilities().contains(&Capability::Move) {
            return Err(Error::NotSupported("MOVE".into()));
        }
        self.engine
            .call(&Command::Move { sequence, mailbox: Mailbox::new(mailbox), uid: false }, cancel)
            .await
    }

    /// Moves a UID set to another mailbox (RFC 6851).
    ///
    /// # Errors
    /// Returns [`Error::NotSupported`] if the server never advertised MOVE.
    /// Returns [`Error::InvalidState`] unless a mailbox is selected.
    pub async fn uid_move(&mut self, uids: UidSet, mailbox: &str, cancel: &CancellationToken) -> Result<CommandOutcome> {
        self.engine.session().require_selected()?;
        if !self.engine.capabilities().contains(&Capability::Move) {
            return Err(Error::NotSupported("MOVE".into()));
        }
        self.engine
            .call(
                &Command::Move { sequence: uids.as_sequence_set(), mailbox: Mailbox::new(mailbox), uid: true },
                cancel,
            )
            .await
    }

    /// Enters IDLE until `done_signal` fires (RFC 2177).
    ///
    /// # Errors
    /// See [`Engine::idle`].
    pub async fn idle(&mut self, done_signal: &CancellationToken, cancel: &CancellationToken) -> Result<CommandOutcome> {
        self.engine.idle(done_signal, cancel).await
    }

    /// Subscribes to mailbox event groups (RFC 5465).
    ///
    /// # Errors
    /// See [`Engine::notify`].
    pub async fn notify(&mut self, entries: Vec<NotifyEntry>, cancel: &CancellationToken) -> Result<CommandOutcome> {
        self.engine.notify(entries, cancel).await
    }

    /// Stops all push notifications (RFC 5465).
    ///
    /// # Errors
    /// See [`Engine::disable_notify`].
    pub async fn disable_notify(&mut self, cancel: &CancellationToken) -> Result<CommandOutcome> {
        self.engine.disable_notify(cancel).await
    }

    /// Enables extensions (RFC 5161).
    ///
    /// # Errors
    /// See [`Engine::enable`].
    pub async fn enable(&mut self, capabilities: Vec<String>, cancel: &CancellationToken) -> Result<Vec<Capability>> {
        self.engine.enable(capabilities, cancel).await
    }

    /// Exchanges client/server identification (RFC 2971).
    ///
    /// # Errors
    /// See [`Engine::id`].
    pub async fn id(&mut self, parameters: Option<Vec<(String, String)>>, cancel: &CancellationToken) -> Result<Option<Vec<(String, String)>>> {
        self.engine.id(parameters, cancel).await
    }

    /// Gracefully ends the session via `LOGOUT`.
    ///
    /// The server is expected to reply with an untagged BYE followed by a
    /// tagged OK; a transport error here is not surfaced since the
    /// connection is being torn down regardless.
    pub async fn logout(mut self, cancel: &CancellationToken) -> Engine<S> {
        let _ = self.engine.call(&Command::Logout, cancel).await;
        self.engine
    }
}

/// Turns FETCH/STORE's untagged data into `(seq, items)` pairs, matching
/// each message's untagged FETCH line.
fn collect_fetch(untagged: &UntaggedResponse, out: &mut Vec<(SeqNum, Vec<FetchItem>)>) {
    if let UntaggedResponse::Fetch { seq, items } = untagged {
        out.push((*seq, items.clone()));
    }
}

/// Folds SELECT/EXAMINE's untagged FLAGS/EXISTS/RECENT lines into a
/// [`MailboxStatus`] being built up across the whole response.
fn collect_mailbox_status(untagged: &UntaggedResponse, status: &mut MailboxStatus) {
    match untagged {
        UntaggedResponse::Exists(n) => status.exists = *n,
        UntaggedResponse::Recent(n) => status.recent = *n,
        UntaggedResponse::Flags(flags) => status.flags = flags.clone(),
        UntaggedResponse::Ok { code: Some(code), .. } => apply_select_code(status, Some(code)),
        _ => {}
    }
}

/// Applies a SELECT/EXAMINE resp-code (riding either an untagged OK or the
/// command's own tagged OK) to the status being assembled.
fn apply_select_code(status: &mut MailboxStatus, code: Option<&ResponseCode>) {
    match code {
        Some(ResponseCode::UidValidity(v)) => status.uid_validity = Some(*v),
        Some(ResponseCode::UidNext(v)) => status.uid_next = Some(*v),
        Some(ResponseCode::Unseen(v)) => status.unseen = Some(*v),
        Some(ResponseCode::PermanentFlags(flags)) => {
            status.permanent_flags = crate::types::Flags::from_vec(flags.clone());
        }
        Some(ResponseCode::ReadOnly) => status.read_only = true,
        Some(ResponseCode::ReadWrite) => status.read_only = false,
        Some(ResponseCode::HighestModSeq(v)) => status.highest_mod_seq = Some(*v),
        _ => {}
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Flag, Status};

    fn authenticated_client(mock: tokio_test::io::Mock) -> Client<tokio_test::io::Mock> {
        let mut engine = Engine::new(mock);
        engine.session_mut().transition_connected().unwrap();
        engine.session_mut().transition_authenticated().unwrap();
        Client::new(engine)
    }

    #[tokio::test]
    async fn select_populates_mailbox_status() {
        let mock = tokio_test::io::Builder::new()
            .write(b"A0000 SELECT INBOX\r\n")
            .read(b"* 172 EXISTS\r\n")
            .read(b"* 1 RECENT\r\n")
            .read(b"* FLAGS (\\Seen \\Answered)\r\n")
            .read(b"* OK [UIDVALIDITY 3857529045] UIDs valid\r\n")
            .read(b"* OK [UIDNEXT 4392] predicted next UID\r\n")
            .read(b"A0000 OK [READ-WRITE] SELECT completed\r\n")
            .build();
        let mut client = authenticated_client(mock);
        let cancel = CancellationToken::new();
        let status = client.select("INBOX", &cancel).await.unwrap();
        assert_eq!(status.exists, 172);
        assert_eq!(status.recent, 1);
        assert!(!status.read_only);
        assert_eq!(status.uid_next.unwrap().get(), 4392);
        assert_eq!(status.uid_validity.unwrap().get(), 3_857_529_045);
        assert_eq!(client.engine().session().state(), EngineState::Selected);
    }

    #[tokio::test]
    async fn examine_marks_read_only() {
        let mock = tokio_test::io::Builder::new()
            .write(b"A0000 EXAMINE INBOX\r\n")
            .read(b"* 5 EXISTS\r\n")
            .read(b"A0000 OK [READ-ONLY] EXAMINE completed\r\n")
            .build();
        let mut client = authenticated_client(mock);
        let cancel = CancellationToken::new();
        let status = client.examine("INBOX", &cancel).await.unwrap();
        assert!(status.read_only);
    }

    #[tokio::test]
    async fn list_collects_entries() {
        let mock = tokio_test::io::Builder::new()
            .write(b"A0000 LIST \"\" \"*\"\r\n")
            .read(b"* LIST (\\HasNoChildren) \"/\" INBOX\r\n")
            .read(b"* LIST (\\HasNoChildren \\Sent) \"/\" Sent\r\n")
            .read(b"A0000 OK LIST completed\r\n")
            .build();
        let mut client = authenticated_client(mock);
        let cancel = CancellationToken::new();
        let entries = client.list("", "*", &cancel).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].mailbox.as_str(), "Sent");
    }

    #[tokio::test]
    async fn fetch_collects_items_per_message() {
        let mock = tokio_test::io::Builder::new()
            .write(b"A0000 FETCH 1:2 (FLAGS)\r\n")
            .read(b"* 1 FETCH (FLAGS (\\Seen))\r\n")
            .read(b"* 2 FETCH (FLAGS (\\Answered))\r\n")
            .read(b"A0000 OK FETCH completed\r\n")
            .build();
        let mut engine = Engine::new(mock);
        engine.session_mut().transition_connected().unwrap();
        engine.session_mut().transition_authenticated().unwrap();
        engine.session_mut().select(Mailbox::inbox(), MailboxStatus::default()).unwrap();
        let mut client = Client::new(engine);
        let cancel = CancellationToken::new();
        let sequence = SequenceSet::range(1, 2).unwrap();
        let results = client
            .fetch(sequence, FetchItems::Items(vec![FetchAttribute::Flags]), &cancel)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.get(), 1);
    }

    #[tokio::test]
    async fn select_is_rejected_before_authentication() {
        let mock = tokio_test::io::Builder::new().build();
        let mut engine = Engine::new(mock);
        engine.session_mut().transition_connected().unwrap();
        let mut client = Client::new(engine);
        let cancel = CancellationToken::new();
        let err = client.select("INBOX", &cancel).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[tokio::test]
    async fn move_requires_the_capability() {
        let mock = tokio_test::io::Builder::new().build();
        let mut engine = Engine::new(mock);
        engine.session_mut().transition_connected().unwrap();
        engine.session_mut().transition_authenticated().unwrap();
        engine.session_mut().select(Mailbox::inbox(), MailboxStatus::default()).unwrap();
        let mut client = Client::new(engine);
        let cancel = CancellationToken::new();
        let sequence = SequenceSet::single(1).unwrap();
        let err = client.r#move(sequence, "Archive", &cancel).await.unwrap_err();
        assert!(matches!(err, Error::NotSupported(_)));
    }

    #[tokio::test]
    async fn logout_returns_the_underlying_engine() {
        let mock = tokio_test::io::Builder::new()
            .write(b"A0000 LOGOUT\r\n")
            .read(b"* BYE logging out\r\n")
            .read(b"A0000 OK LOGOUT completed\r\n")
            .build();
        let client = authenticated_client(mock);
        let cancel = CancellationToken::new();
        let engine = client.logout(&cancel).await;
        assert_eq!(engine.session().state(), EngineState::Disconnected);
    }

    #[tokio::test]
    async fn store_reports_updated_flags() {
        let mock = tokio_test::io::Builder::new()
            .write(b"A0000 STORE 1 +FLAGS (\\Deleted)\r\n")
            .read(b"* 1 FETCH (FLAGS (\\Seen \\Deleted))\r\n")
            .read(b"A0000 OK STORE completed\r\n")
            .build();
        let mut engine = Engine::new(mock);
        engine.session_mut().transition_connected().unwrap();
        engine.session_mut().transition_authenticated().unwrap();
        engine.session_mut().select(Mailbox::inbox(), MailboxStatus::default()).unwrap();
        let mut client = Client::new(engine);
        let cancel = CancellationToken::new();
        let sequence = SequenceSet::single(1).unwrap();
        let results = client
            .store(sequence, StoreAction::AddFlags(vec![Flag::Deleted]), &cancel)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        let outcome_status = crate::types::Status::Ok;
        assert_eq!(outcome_status, Status::Ok);
    }
}
