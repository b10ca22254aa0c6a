//! # imap-engine
//!
//! An IMAP4rev1 client protocol engine (RFC 3501): tokenizer, command
//! pipelining, a runtime-checked connection state machine, IDLE, and
//! authentication.
//!
//! ## Features
//!
//! - **Runtime-checked connection state**: every command checks the
//!   engine's current [`engine::EngineState`] before it is allowed on the
//!   wire, returning [`Error::InvalidState`] rather than silently
//!   misbehaving
//! - **Full protocol support**: LOGIN/AUTHENTICATE, SELECT/EXAMINE, LIST,
//!   STATUS, FETCH, STORE, COPY, MOVE, SEARCH, APPEND, EXPUNGE, IDLE,
//!   STARTTLS, COMPRESS=DEFLATE, ENABLE, ID, NOTIFY
//! - **TLS via rustls**: no OpenSSL dependency, `webpki-roots` trust store
//!   by default with an escape hatch for custom verifiers
//! - **Server quirks handling**: workarounds for Gmail, Outlook, Dovecot,
//!   and other common servers ([`quirks`])
//! - **Outbound secret redaction**: passwords and SASL responses never
//!   reach a [`logger::ProtocolLogger`] in the clear ([`redactor`])
//!
//! ## Quick Start
//!
//! ```no_run
//! use imap_engine::{Client, Config, Security, FetchItems, SequenceSet};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> imap_engine::Result<()> {
//! let cancel = CancellationToken::new();
//! let config = Config::new("imap.example.com", Security::Implicit);
//! let engine = imap_engine::connect::connect(&config, &cancel).await?;
//! let mut client = Client::new(engine);
//!
//! client.login("user@example.com", "password", &cancel).await?;
//!
//! let folders = client.list("", "*", &cancel).await?;
//! for folder in &folders {
//!     println!("Folder: {}", folder.mailbox.as_str());
//! }
//!
//! let status = client.select("INBOX", &cancel).await?;
//! println!("Messages: {}", status.exists);
//!
//! let sequence = SequenceSet::range(1, 10).unwrap();
//! let messages = client.fetch(sequence, FetchItems::Fast, &cancel).await?;
//! println!("Fetched {} messages", messages.len());
//!
//! let engine = client.logout(&cancel).await;
//! let _ = engine;
//! # Ok(())
//! # }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! Disconnected ── read_greeting ──→ Connected
//! Connected ── authenticate/login ──→ Authenticated
//! Authenticated ── select/examine ──→ Selected
//! Selected ── idle ──→ Idle ── done ──→ Selected
//! Selected ── close/unselect ──→ Authenticated
//! ```
//!
//! ## Modules
//!
//! - [`client`]: ergonomic command surface over [`engine::Engine`]
//! - [`command`]: IMAP command types and wire serialization
//! - [`config`]: connection configuration
//! - [`connect`]: TCP/TLS bootstrap
//! - [`engine`]: the protocol driver (state machine, IDLE, auth, extensions)
//! - [`handler`]: unsolicited-response callbacks
//! - [`logger`]: protocol tracing
//! - [`quirks`]: server-specific workarounds
//! - [`redactor`]: outbound secret redaction
//! - [`sasl`]: SASL mechanism framing
//! - [`time`]: injectable clock for IDLE timeouts
//! - [`types`]: core IMAP types (flags, mailboxes, sequences, ...)
//! - [`utf7`]: modified UTF-7 mailbox name encoding

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod bytestream;
pub mod client;
pub mod command;
pub mod config;
pub mod connect;
pub mod engine;
mod error;
pub mod handler;
pub mod logger;
pub mod quirks;
pub mod redactor;
pub mod sasl;
pub mod time;
mod token;
mod tokenizer;
pub mod types;
pub mod utf7;

pub use client::Client;
pub use command::{Command, FetchAttribute, FetchItems, SearchCriteria, StoreAction, TagGenerator};
pub use config::{Config, ConfigBuilder, Security};
pub use engine::{Engine, EngineState};
pub use error::{Error, Result};
pub use quirks::{ServerQuirks, ServerType};
pub use types::{
    Capability, Flag, Flags, ListResponse, Mailbox, MailboxAttribute, MailboxStatus, ResponseCode,
    SeqNum, SequenceSet, Status, Tag, Uid, UidSet, UidValidity,
};

/// IMAP protocol version supported.
pub const IMAP_VERSION: &str = "IMAP4rev1";
