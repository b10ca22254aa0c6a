//! End-to-end tests driving [`Client`] against mock IMAP servers.
//!
//! Unlike the per-module unit tests under `src/`, these exercise a full
//! command sequence (greeting → login → select → fetch/store → logout)
//! the way a real caller would, using [`tokio_test::io::Builder`] to script
//! the server side of the conversation. Session state is reached the same
//! way a real caller reaches it — by actually running the prior commands —
//! since `Client`/`Engine` expose no way to fast-forward state from outside
//! the crate.
//!
//! Note: a successful LOGIN/AUTHENTICATE always triggers a post-auth
//! CAPABILITY refresh (unless the exchange itself already updated the
//! cache) followed by an opportunistic `LIST "" "*"` to warm the folder
//! cache, so every scripted login below accounts for that follow-up
//! exchange.

use tokio_util::sync::CancellationToken;

use imap_engine::client::Client;
use imap_engine::command::{FetchAttribute, FetchItems, StatusAttribute, StoreAction};
use imap_engine::engine::Engine;
use imap_engine::types::{Flag, SequenceSet};
use imap_engine::{Capability, EngineState, ServerQuirks, ServerType};

#[tokio::test]
async fn greeting_then_login_then_select_then_fetch_then_logout() {
    let mock = tokio_test::io::Builder::new()
        .read(b"* OK [CAPABILITY IMAP4rev1 IDLE LITERAL+] Server ready\r\n")
        .write(b"A0000 LOGIN alice wonderland\r\n")
        .read(b"A0000 OK LOGIN completed\r\n")
        .write(b"A0001 CAPABILITY\r\n")
        .read(b"* CAPABILITY IMAP4rev1 IDLE LITERAL+\r\n")
        .read(b"A0001 OK CAPABILITY completed\r\n")
        .write(b"A0002 LIST \"\" \"*\"\r\n")
        .read(b"* LIST (\\HasNoChildren) \"/\" \"INBOX\"\r\n")
        .read(b"A0002 OK LIST completed\r\n")
        .write(b"A0003 SELECT INBOX\r\n")
        .read(b"* 3 EXISTS\r\n")
        .read(b"* 0 RECENT\r\n")
        .read(b"* FLAGS (\\Seen \\Deleted)\r\n")
        .read(b"A0003 OK [READ-WRITE] SELECT completed\r\n")
        .write(b"A0004 FETCH 1 FLAGS\r\n")
        .read(b"* 1 FETCH (FLAGS (\\Seen))\r\n")
        .read(b"A0004 OK FETCH completed\r\n")
        .write(b"A0005 LOGOUT\r\n")
        .read(b"* BYE logging out\r\n")
        .read(b"A0005 OK LOGOUT completed\r\n")
        .build();

    let cancel = CancellationToken::new();
    let mut engine = Engine::new(mock);
    engine.read_greeting(&cancel).await.unwrap();
    assert!(engine.capabilities().contains(&Capability::Idle));

    let mut client = Client::new(engine);
    client.login("alice", "wonderland", &cancel).await.unwrap();

    let status = client.select("INBOX", &cancel).await.unwrap();
    assert_eq!(status.exists, 3);
    assert!(!status.read_only);

    let sequence = SequenceSet::single(1).unwrap();
    let fetched = client
        .fetch(sequence, FetchItems::Items(vec![FetchAttribute::Flags]), &cancel)
        .await
        .unwrap();
    assert_eq!(fetched.len(), 1);

    let engine = client.logout(&cancel).await;
    assert_eq!(engine.session().state(), EngineState::Disconnected);
}

#[tokio::test]
async fn list_then_status_round_trip() {
    let mock = tokio_test::io::Builder::new()
        .read(b"* OK Server ready\r\n")
        .write(b"A0000 CAPABILITY\r\n")
        .read(b"* CAPABILITY IMAP4rev1\r\n")
        .read(b"A0000 OK CAPABILITY completed\r\n")
        .write(b"A0001 LOGIN alice wonderland\r\n")
        .read(b"A0001 OK LOGIN completed\r\n")
        .write(b"A0002 CAPABILITY\r\n")
        .read(b"* CAPABILITY IMAP4rev1\r\n")
        .read(b"A0002 OK CAPABILITY completed\r\n")
        .write(b"A0003 LIST \"\" \"*\"\r\n")
        .read(b"A0003 OK LIST completed\r\n")
        .write(b"A0004 LIST \"\" \"*\"\r\n")
        .read(b"* LIST (\\HasNoChildren) \"/\" \"INBOX\"\r\n")
        .read(b"* LIST (\\HasNoChildren \\Sent) \"/\" \"Sent\"\r\n")
        .read(b"A0004 OK LIST completed\r\n")
        .write(b"A0005 STATUS INBOX (MESSAGES UNSEEN)\r\n")
        .read(b"* STATUS INBOX (MESSAGES 3 UNSEEN 1)\r\n")
        .read(b"A0005 OK STATUS completed\r\n")
        .build();

    let cancel = CancellationToken::new();
    let mut engine = Engine::new(mock);
    engine.read_greeting(&cancel).await.unwrap();
    let mut client = Client::new(engine);
    client.login("alice", "wonderland", &cancel).await.unwrap();

    let entries = client.list("", "*", &cancel).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].mailbox.as_str(), "INBOX");

    let items = client
        .status("INBOX", vec![StatusAttribute::Messages, StatusAttribute::Unseen], &cancel)
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn store_then_expunge_reports_affected_messages() {
    let mock = tokio_test::io::Builder::new()
        .read(b"* OK [CAPABILITY IMAP4rev1] Server ready\r\n")
        .write(b"A0000 LOGIN alice wonderland\r\n")
        .read(b"A0000 OK LOGIN completed\r\n")
        .write(b"A0001 CAPABILITY\r\n")
        .read(b"* CAPABILITY IMAP4rev1\r\n")
        .read(b"A0001 OK CAPABILITY completed\r\n")
        .write(b"A0002 LIST \"\" \"*\"\r\n")
        .read(b"A0002 OK LIST completed\r\n")
        .write(b"A0003 SELECT INBOX\r\n")
        .read(b"* 1 EXISTS\r\n")
        .read(b"A0003 OK [READ-WRITE] SELECT completed\r\n")
        .write(b"A0004 STORE 1 +FLAGS (\\Deleted)\r\n")
        .read(b"* 1 FETCH (FLAGS (\\Seen \\Deleted))\r\n")
        .read(b"A0004 OK STORE completed\r\n")
        .write(b"A0005 EXPUNGE\r\n")
        .read(b"* 1 EXPUNGE\r\n")
        .read(b"A0005 OK EXPUNGE completed\r\n")
        .build();

    let cancel = CancellationToken::new();
    let mut engine = Engine::new(mock);
    engine.read_greeting(&cancel).await.unwrap();
    let mut client = Client::new(engine);
    client.login("alice", "wonderland", &cancel).await.unwrap();
    client.select("INBOX", &cancel).await.unwrap();

    let sequence = SequenceSet::single(1).unwrap();
    let updated = client
        .store(sequence, StoreAction::AddFlags(vec![Flag::Deleted]), &cancel)
        .await
        .unwrap();
    assert_eq!(updated.len(), 1);

    let expunged = client.expunge(&cancel).await.unwrap();
    assert_eq!(expunged.len(), 1);
    assert_eq!(expunged[0].get(), 1);
}

#[test]
fn server_quirks_detection_and_idle_timeouts() {
    let caps = vec![Capability::Unknown("X-GM-EXT-1".to_string())];
    assert_eq!(ServerType::detect(&caps, None), ServerType::Gmail);

    let gmail_quirks = ServerQuirks::for_server(ServerType::Gmail, &[]);
    assert_eq!(gmail_quirks.idle_timeout_secs, 600);

    let dovecot = ServerType::detect(&[Capability::Imap4Rev1], Some("* OK Dovecot ready."));
    assert_eq!(dovecot, ServerType::Dovecot);
    let dovecot_quirks = ServerQuirks::for_server(dovecot, &[]);
    assert_eq!(dovecot_quirks.idle_timeout_secs, 1740);
}

#[test]
fn mailbox_normalization_uppercases_inbox() {
    let quirks = ServerQuirks::for_server(ServerType::Unknown, &[]);
    assert_eq!(quirks.normalize_mailbox("inbox"), "INBOX");
    assert_eq!(quirks.normalize_mailbox("Sent"), "Sent");
}
