//! IMAP command model and wire serialization.
//!
//! Commands serialize to a sequence of [`Frame`]s rather than one eager
//! byte buffer: a literal argument (an APPEND message body, or any astring
//! containing CR/LF/NUL that cannot be represented as a quoted string)
//! produces its own [`Frame::Literal`], with a synchronizing or
//! non-synchronizing `{n}`/`{n+}` marker written into the preceding
//! [`Frame::Bytes`]. The command engine is what decides whether to pause
//! for a `+` continuation between frames, based on whether the server
//! advertises LITERAL+/LITERAL- and whether the marker was emitted as
//! synchronizing.

mod serialize;
mod tag_generator;
mod types;

use crate::types::{Flag, Mailbox, SequenceSet};

pub use tag_generator::TagGenerator;
pub use types::{
    FetchAttribute, FetchItems, NotifyEntry, NotifyEvent, NotifyFilter, SearchCriteria,
    StatusAttribute, StoreAction,
};

use serialize::needs_literal;

/// IMAP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Any State Commands
    /// CAPABILITY command.
    Capability,
    /// NOOP command.
    Noop,
    /// LOGOUT command.
    Logout,

    // Not Authenticated State Commands
    /// STARTTLS command.
    StartTls,
    /// LOGIN command.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// AUTHENTICATE command.
    Authenticate {
        /// Authentication mechanism.
        mechanism: String,
        /// Initial response (optional, sent only under SASL-IR).
        initial_response: Option<Vec<u8>>,
    },

    // Authenticated State Commands
    /// ID command (RFC 2971) - client/server identification.
    Id {
        /// Client identification parameters (field-value pairs).
        /// None = ID NIL (no identification).
        parameters: Option<Vec<(String, String)>>,
    },
    /// ENABLE command.
    Enable {
        /// Capabilities to enable.
        capabilities: Vec<String>,
    },
    /// SELECT command.
    Select {
        /// Mailbox to select.
        mailbox: Mailbox,
        /// Enable CONDSTORE.
        condstore: bool,
    },
    /// EXAMINE command (read-only SELECT).
    Examine {
        /// Mailbox to examine.
        mailbox: Mailbox,
    },
    /// CREATE command.
    Create {
        /// Mailbox to create.
        mailbox: Mailbox,
    },
    /// DELETE command.
    Delete {
        /// Mailbox to delete.
        mailbox: Mailbox,
    },
    /// RENAME command.
    Rename {
        /// Current mailbox name.
        from: Mailbox,
        /// New mailbox name.
        to: Mailbox,
    },
    /// SUBSCRIBE command.
    Subscribe {
        /// Mailbox to subscribe.
        mailbox: Mailbox,
    },
    /// UNSUBSCRIBE command.
    Unsubscribe {
        /// Mailbox to unsubscribe.
        mailbox: Mailbox,
    },
    /// LIST command.
    List {
        /// Reference name.
        reference: String,
        /// Mailbox pattern.
        pattern: String,
    },
    /// NAMESPACE command.
    Namespace,
    /// STATUS command.
    Status {
        /// Mailbox name.
        mailbox: Mailbox,
        /// Status items to request.
        items: Vec<StatusAttribute>,
    },
    /// APPEND command.
    Append {
        /// Target mailbox.
        mailbox: Mailbox,
        /// Flags to set.
        flags: Option<Vec<Flag>>,
        /// Message data, always sent as a literal.
        message: Vec<u8>,
    },

    // Selected State Commands
    /// CLOSE command.
    Close,
    /// UNSELECT command.
    Unselect,
    /// EXPUNGE command.
    Expunge,
    /// UID EXPUNGE command (RFC 4315 UIDPLUS) - expunge specific UIDs.
    UidExpunge {
        /// UIDs to expunge.
        uids: SequenceSet,
    },
    /// SEARCH command.
    Search {
        /// Search criteria.
        criteria: SearchCriteria,
        /// Use UIDs.
        uid: bool,
    },
    /// FETCH command.
    Fetch {
        /// Sequence set.
        sequence: SequenceSet,
        /// Items to fetch.
        items: FetchItems,
        /// Use UIDs.
        uid: bool,
    },
    /// STORE command.
    Store {
        /// Sequence set.
        sequence: SequenceSet,
        /// Store action.
        action: StoreAction,
        /// Use UIDs.
        uid: bool,
        /// Silent mode (no FETCH response).
        silent: bool,
    },
    /// COPY command.
    Copy {
        /// Sequence set.
        sequence: SequenceSet,
        /// Target mailbox.
        mailbox: Mailbox,
        /// Use UIDs.
        uid: bool,
    },
    /// MOVE command.
    Move {
        /// Sequence set.
        sequence: SequenceSet,
        /// Target mailbox.
        mailbox: Mailbox,
        /// Use UIDs.
        uid: bool,
    },
    /// IDLE command.
    Idle,
    /// DONE (to end IDLE).
    Done,

    // Extensions (any authenticated state, subject to each extension's gate)
    /// COMPRESS DEFLATE command (RFC 4978).
    Compress,
    /// NOTIFY SET command (RFC 5465) - subscribes to a set of mailbox event
    /// groups, replacing any previously registered set.
    Notify {
        /// Event groups to watch.
        entries: Vec<NotifyEntry>,
    },
    /// NOTIFY NONE command (RFC 5465) - stops all push notifications.
    DisableNotify,
}

/// One piece of a serialized command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Literal wire bytes, including any `{n}`/`{n+}` markers and the
    /// final CRLF.
    Bytes(Vec<u8>),
    /// The raw body of a literal announced by the preceding [`Frame::Bytes`].
    /// The command engine pauses for a `+` continuation before sending this
    /// unless the preceding marker was non-synchronizing.
    Literal(Vec<u8>),
}

impl Command {
    /// Returns `true` if this command carries at least one literal
    /// argument (and therefore cannot be sent as a single write).
    #[must_use]
    pub fn has_literal_argument(&self) -> bool {
        match self {
            Self::Login { username, password } => {
                needs_literal(username) || needs_literal(password)
            }
            Self::Append { .. } => true,
            _ => false,
        }
    }

    /// Serializes the command to a sequence of frames, tagged with `tag`.
    ///
    /// `literal_plus` should be `true` only when the server advertises
    /// LITERAL+ (or LITERAL-, for literals under 4096 bytes); it controls
    /// whether emitted literal markers use the non-synchronizing `{n+}`
    /// form.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn serialize_frames(&self, tag: &str, literal_plus: bool) -> Vec<Frame> {
        let mut b = serialize::FrameBuilder::new(literal_plus);

        if !matches!(self, Self::Done) {
            b.push_bytes(tag.as_bytes());
            b.push_bytes(b" ");
        }

        match self {
            Self::Capability => b.push_bytes(b"CAPABILITY"),
            Self::Noop => b.push_bytes(b"NOOP"),
            Self::Logout => b.push_bytes(b"LOGOUT"),
            Self::StartTls => b.push_bytes(b"STARTTLS"),

            Self::Login { username, password } => {
                b.push_bytes(b"LOGIN ");
                b.push_astring(username);
                b.push_bytes(b" ");
                b.push_astring(password);
            }

            Self::Authenticate { mechanism, initial_response } => {
                b.push_bytes(b"AUTHENTICATE ");
                b.push_bytes(mechanism.as_bytes());
                if let Some(resp) = initial_response {
                    b.push_bytes(b" ");
                    let encoded = crate::sasl::encode_response(resp);
                    b.push_bytes(encoded.as_bytes());
                }
            }

            Self::Id { parameters } => {
                b.push_bytes(b"ID ");
                if let Some(params) = parameters {
                    b.push_bytes(b"(");
                    for (i, (key, value)) in params.iter().enumerate() {
                        if i > 0 {
                            b.push_bytes(b" ");
                        }
                        b.push_astring(key);
                        b.push_bytes(b" ");
                        b.push_astring(value);
                    }
                    b.push_bytes(b")");
                } else {
                    b.push_bytes(b"NIL");
                }
            }

            Self::Enable { capabilities } => {
                b.push_bytes(b"ENABLE");
                for cap in capabilities {
                    b.push_bytes(b" ");
                    b.push_bytes(cap.as_bytes());
                }
            }

            Self::Select { mailbox, condstore } => {
                b.push_bytes(b"SELECT ");
                b.push_astring(mailbox.as_str());
                if *condstore {
                    b.push_bytes(b" (CONDSTORE)");
                }
            }

            Self::Examine { mailbox } => {
                b.push_bytes(b"EXAMINE ");
                b.push_astring(mailbox.as_str());
            }

            Self::Create { mailbox } => {
                b.push_bytes(b"CREATE ");
                b.push_astring(mailbox.as_str());
            }

            Self::Delete { mailbox } => {
                b.push_bytes(b"DELETE ");
                b.push_astring(mailbox.as_str());
            }

            Self::Rename { from, to } => {
                b.push_bytes(b"RENAME ");
                b.push_astring(from.as_str());
                b.push_bytes(b" ");
                b.push_astring(to.as_str());
            }

            Self::Subscribe { mailbox } => {
                b.push_bytes(b"SUBSCRIBE ");
                b.push_astring(mailbox.as_str());
            }

            Self::Unsubscribe { mailbox } => {
                b.push_bytes(b"UNSUBSCRIBE ");
                b.push_astring(mailbox.as_str());
            }

            Self::List { reference, pattern } => {
                b.push_bytes(b"LIST ");
                b.push_astring(reference);
                b.push_bytes(b" ");
                b.push_astring(pattern);
            }

            Self::Namespace => b.push_bytes(b"NAMESPACE"),

            Self::Status { mailbox, items } => {
                b.push_bytes(b"STATUS ");
                b.push_astring(mailbox.as_str());
                b.push_bytes(b" (");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        b.push_bytes(b" ");
                    }
                    b.push_bytes(item.as_str().as_bytes());
                }
                b.push_bytes(b")");
            }

            Self::Append { mailbox, flags, message } => {
                b.push_bytes(b"APPEND ");
                b.push_astring(mailbox.as_str());
                if let Some(flags) = flags {
                    b.push_bytes(b" (");
                    for (i, flag) in flags.iter().enumerate() {
                        if i > 0 {
                            b.push_bytes(b" ");
                        }
                        b.push_bytes(flag.as_str().as_bytes());
                    }
                    b.push_bytes(b")");
                }
                b.push_bytes(b" ");
                b.push_literal(message);
            }

            Self::Close => b.push_bytes(b"CLOSE"),
            Self::Unselect => b.push_bytes(b"UNSELECT"),
            Self::Expunge => b.push_bytes(b"EXPUNGE"),

            Self::UidExpunge { uids } => {
                b.push_bytes(b"UID EXPUNGE ");
                b.push_bytes(uids.to_string().as_bytes());
            }

            Self::Search { criteria, uid } => {
                if *uid {
                    b.push_bytes(b"UID ");
                }
                b.push_bytes(b"SEARCH ");
                serialize::write_search_criteria_bytes(&mut b, criteria);
            }

            Self::Fetch { sequence, items, uid } => {
                if *uid {
                    b.push_bytes(b"UID ");
                }
                b.push_bytes(b"FETCH ");
                b.push_bytes(sequence.to_string().as_bytes());
                b.push_bytes(b" ");
                serialize::write_fetch_items_bytes(&mut b, items);
            }

            Self::Store { sequence, action, uid, silent } => {
                if *uid {
                    b.push_bytes(b"UID ");
                }
                b.push_bytes(b"STORE ");
                b.push_bytes(sequence.to_string().as_bytes());
                b.push_bytes(b" ");
                serialize::write_store_action_bytes(&mut b, action, *silent);
            }

            Self::Copy { sequence, mailbox, uid } => {
                if *uid {
                    b.push_bytes(b"UID ");
                }
                b.push_bytes(b"COPY ");
                b.push_bytes(sequence.to_string().as_bytes());
                b.push_bytes(b" ");
                b.push_astring(mailbox.as_str());
            }

            Self::Move { sequence, mailbox, uid } => {
                if *uid {
                    b.push_bytes(b"UID ");
                }
                b.push_bytes(b"MOVE ");
                b.push_bytes(sequence.to_string().as_bytes());
                b.push_bytes(b" ");
                b.push_astring(mailbox.as_str());
            }

            Self::Idle => b.push_bytes(b"IDLE"),
            Self::Done => b.push_bytes(b"DONE"),

            Self::Compress => b.push_bytes(b"COMPRESS DEFLATE"),

            Self::Notify { entries } => {
                b.push_bytes(b"NOTIFY SET");
                for entry in entries {
                    b.push_bytes(b" (");
                    b.push_bytes(entry.filter.as_str().as_bytes());
                    if let NotifyFilter::Mailboxes(mailboxes) = &entry.filter {
                        b.push_bytes(b" (");
                        for (i, mailbox) in mailboxes.iter().enumerate() {
                            if i > 0 {
                                b.push_bytes(b" ");
                            }
                            b.push_astring(mailbox.as_str());
                        }
                        b.push_bytes(b")");
                    }
                    for event in &entry.events {
                        b.push_bytes(b" ");
                        b.push_bytes(event.as_str().as_bytes());
                    }
                    b.push_bytes(b")");
                }
            }

            Self::DisableNotify => b.push_bytes(b"NOTIFY NONE"),
        }

        b.push_bytes(b"\r\n");
        b.finish()
    }
}
