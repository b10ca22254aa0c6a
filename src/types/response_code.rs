//! Response codes.

use super::{Capability, Flag, SeqNum, Uid, UidValidity};

/// Response code from a tagged response.
///
/// These provide additional information about command completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// ALERT: Human-readable message that MUST be shown to user.
    Alert,
    /// CAPABILITY response.
    Capability(Vec<Capability>),
    /// PARSE: Error parsing message.
    Parse,
    /// PERMANENTFLAGS: Flags that can be changed permanently.
    PermanentFlags(Vec<Flag>),
    /// READ-ONLY: Mailbox selected as read-only.
    ReadOnly,
    /// READ-WRITE: Mailbox selected as read-write.
    ReadWrite,
    /// TRYCREATE: Mailbox doesn't exist, but can be created.
    TryCreate,
    /// UIDNEXT: Next UID to be assigned.
    UidNext(Uid),
    /// UIDVALIDITY: Unique identifier validity value.
    UidValidity(UidValidity),
    /// UNSEEN: First unseen message sequence number.
    Unseen(SeqNum),
    /// APPENDUID: UID assigned to appended message.
    AppendUid {
        /// UIDVALIDITY of the mailbox.
        uidvalidity: UidValidity,
        /// UID of the appended message.
        uid: Uid,
    },
    /// COPYUID: UIDs of copied messages.
    CopyUid {
        /// UIDVALIDITY of the destination mailbox.
        uidvalidity: UidValidity,
        /// Source UIDs.
        source_uids: Vec<Uid>,
        /// Destination UIDs.
        dest_uids: Vec<Uid>,
    },
    /// HIGHESTMODSEQ: Highest mod-sequence value (CONDSTORE).
    HighestModSeq(u64),
    /// NOMODSEQ: Server doesn't support mod-sequences for this mailbox.
    NoModSeq,
    /// BADCHARSET: SEARCH charset not supported, optionally listing what is.
    BadCharset(Vec<String>),
    /// REFERRAL: Remote mailbox referral URL (RFC 2193).
    Referral(String),
    /// UIDNOTSTICKY: Server will not preserve UIDs across sessions for this
    /// mailbox (RFC 4315).
    UidNotSticky,
    /// URLMECH: URLAUTH mechanism supported (RFC 4467).
    UrlMech(String),
    /// BADURL: The given URLAUTH URL is invalid (RFC 4467).
    BadUrl(String),
    /// TOOBIG: The submitted message/literal exceeds a server limit.
    TooBig,
    /// MODIFIED: Entries not updated because of an UNCHANGEDSINCE conflict
    /// (CONDSTORE).
    Modified(String),
    /// COMPRESSIONACTIVE: COMPRESS already active on this connection.
    CompressionActive,
    /// CLOSED: Previously selected mailbox has been closed as a side effect
    /// of a SELECT/EXAMINE on another mailbox (QRESYNC).
    Closed,
    /// NOTSAVED: Search result variable could not be saved.
    NotSaved,
    /// BADCOMPARATOR: Requested collation algorithm not supported.
    BadComparator,
    /// ANNOTATE: Server-defined restriction on annotation use applies.
    Annotate,
    /// ANNOTATIONS: Response carries annotation data.
    Annotations,
    /// MAXCONVERTMESSAGES: CONVERT limit on message count exceeded.
    MaxConvertMessages,
    /// MAXCONVERTPARTS: CONVERT limit on body part count exceeded.
    MaxConvertParts,
    /// TEMPFAIL: Temporary failure; retrying later might succeed.
    TempFail,
    /// NOUPDATE: PUSH/NOTIFY update suppressed, carrying the requested tag.
    NoUpdate(Option<String>),
    /// METADATA: metadata-related response data (RFC 5464).
    Metadata(MetadataCode),
    /// NOTIFICATIONOVERFLOW: Too many pending NOTIFY events (RFC 5465).
    NotificationOverflow,
    /// BADEVENT: Unsupported NOTIFY event name, optionally listing what is
    /// supported.
    BadEvent(Vec<String>),
    /// UNDEFINED-FILTER: Referenced NOTIFY filter is not defined.
    UndefinedFilter(String),
    /// UNAVAILABLE: Temporary server resource unavailability (RFC 5530).
    Unavailable,
    /// AUTHENTICATIONFAILED: Generic authentication failure.
    AuthenticationFailed,
    /// AUTHORIZATIONFAILED: Authentication succeeded but authorization
    /// (e.g. to act as another identity) failed.
    AuthorizationFailed,
    /// EXPIRED: Credentials have expired.
    Expired,
    /// PRIVACYREQUIRED: A stronger security layer is required.
    PrivacyRequired,
    /// CONTACTADMIN: Operation requires contacting the server administrator.
    ContactAdmin,
    /// NOPERM: Insufficient permission for the requested operation.
    NoPerm,
    /// INUSE: Resource is in use by another operation; retry later.
    InUse,
    /// EXPUNGEISSUED: An EXPUNGE was issued on this mailbox during the
    /// current command.
    ExpungeIssued,
    /// CORRUPTION: Detected a server-side data corruption problem.
    Corruption,
    /// SERVERBUG: Operation failed because of a server bug.
    ServerBug,
    /// CLIENTBUG: Server detected a client protocol violation.
    ClientBug,
    /// CANNOT: Operation is not possible for any client.
    Cannot,
    /// LIMIT: Operation exceeds a server-imposed limit.
    Limit,
    /// OVERQUOTA: Operation would exceed the user's quota.
    OverQuota,
    /// ALREADYEXISTS: Target mailbox/object already exists.
    AlreadyExists,
    /// NONEXISTENT: Target mailbox/object does not exist.
    NonExistent,
    /// USEATTR: SPECIAL-USE attribute conflicts with the request
    /// (RFC 6154).
    UseAttr,
    /// Unknown response code.
    Unknown(String),
}

/// METADATA-specific response code detail (RFC 5464 §4.2.1, §4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataCode {
    /// LONGENTRIES: A GETMETADATA response was truncated; carries the
    /// octet count of the longest untruncated entry value.
    LongEntries(u64),
    /// MAXSIZE: SETMETADATA value exceeds the server's maximum entry size.
    MaxSize(u64),
    /// TOOMANY: Too many entries for this mailbox.
    TooMany,
    /// NOPRIVATE: Server does not support private annotations.
    NoPrivate,
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn alert() {
        let code = ResponseCode::Alert;
        assert!(matches!(code, ResponseCode::Alert));
    }

    #[test]
    fn capability_with_list() {
        let caps = vec![Capability::Imap4Rev1, Capability::Idle];
        let code = ResponseCode::Capability(caps.clone());
        if let ResponseCode::Capability(c) = code {
            assert_eq!(c.len(), 2);
        } else {
            panic!("Expected Capability variant");
        }
    }

    #[test]
    fn parse() {
        let code = ResponseCode::Parse;
        assert!(matches!(code, ResponseCode::Parse));
    }

    #[test]
    fn permanent_flags() {
        let flags = vec![Flag::Seen, Flag::Answered, Flag::Deleted];
        let code = ResponseCode::PermanentFlags(flags.clone());
        if let ResponseCode::PermanentFlags(f) = code {
            assert_eq!(f.len(), 3);
        } else {
            panic!("Expected PermanentFlags variant");
        }
    }

    #[test]
    fn read_only() {
        let code = ResponseCode::ReadOnly;
        assert!(matches!(code, ResponseCode::ReadOnly));
    }

    #[test]
    fn read_write() {
        let code = ResponseCode::ReadWrite;
        assert!(matches!(code, ResponseCode::ReadWrite));
    }

    #[test]
    fn try_create() {
        let code = ResponseCode::TryCreate;
        assert!(matches!(code, ResponseCode::TryCreate));
    }

    #[test]
    fn uid_next() {
        let uid = Uid::new(100).unwrap();
        let code = ResponseCode::UidNext(uid);
        if let ResponseCode::UidNext(u) = code {
            assert_eq!(u.get(), 100);
        } else {
            panic!("Expected UidNext variant");
        }
    }

    #[test]
    fn uid_validity() {
        let uv = UidValidity::new(123456).unwrap();
        let code = ResponseCode::UidValidity(uv);
        if let ResponseCode::UidValidity(v) = code {
            assert_eq!(v.get(), 123456);
        } else {
            panic!("Expected UidValidity variant");
        }
    }

    #[test]
    fn unseen() {
        let seq = SeqNum::new(42).unwrap();
        let code = ResponseCode::Unseen(seq);
        if let ResponseCode::Unseen(s) = code {
            assert_eq!(s.get(), 42);
        } else {
            panic!("Expected Unseen variant");
        }
    }

    #[test]
    fn append_uid() {
        let uv = UidValidity::new(999).unwrap();
        let uid = Uid::new(50).unwrap();
        let code = ResponseCode::AppendUid {
            uidvalidity: uv,
            uid,
        };
        if let ResponseCode::AppendUid { uidvalidity, uid } = code {
            assert_eq!(uidvalidity.get(), 999);
            assert_eq!(uid.get(), 50);
        } else {
            panic!("Expected AppendUid variant");
        }
    }

    #[test]
    fn copy_uid() {
        let uv = UidValidity::new(888).unwrap();
        let src = vec![Uid::new(1).unwrap(), Uid::new(2).unwrap()];
        let dst = vec![Uid::new(101).unwrap(), Uid::new(102).unwrap()];
        let code = ResponseCode::CopyUid {
            uidvalidity: uv,
            source_uids: src,
            dest_uids: dst,
        };
        if let ResponseCode::CopyUid {
            uidvalidity,
            source_uids,
            dest_uids,
        } = code
        {
            assert_eq!(uidvalidity.get(), 888);
            assert_eq!(source_uids.len(), 2);
            assert_eq!(dest_uids.len(), 2);
        } else {
            panic!("Expected CopyUid variant");
        }
    }

    #[test]
    fn highest_mod_seq() {
        let code = ResponseCode::HighestModSeq(987654321);
        if let ResponseCode::HighestModSeq(seq) = code {
            assert_eq!(seq, 987654321);
        } else {
            panic!("Expected HighestModSeq variant");
        }
    }

    #[test]
    fn no_mod_seq() {
        let code = ResponseCode::NoModSeq;
        assert!(matches!(code, ResponseCode::NoModSeq));
    }

    #[test]
    fn unknown() {
        let code = ResponseCode::Unknown("CUSTOM-CODE".to_string());
        if let ResponseCode::Unknown(s) = code {
            assert_eq!(s, "CUSTOM-CODE");
        } else {
            panic!("Expected Unknown variant");
        }
    }

    #[test]
    fn bad_charset_lists_alternatives() {
        let code = ResponseCode::BadCharset(vec!["UTF-8".into(), "US-ASCII".into()]);
        if let ResponseCode::BadCharset(charsets) = code {
            assert_eq!(charsets, vec!["UTF-8", "US-ASCII"]);
        } else {
            panic!("Expected BadCharset variant");
        }
    }

    #[test]
    fn uid_not_sticky() {
        assert!(matches!(ResponseCode::UidNotSticky, ResponseCode::UidNotSticky));
    }

    #[test]
    fn modified_carries_sequence_set_text() {
        let code = ResponseCode::Modified("2,4:7".into());
        if let ResponseCode::Modified(set) = code {
            assert_eq!(set, "2,4:7");
        } else {
            panic!("Expected Modified variant");
        }
    }

    #[test]
    fn no_update_with_and_without_tag() {
        assert!(matches!(ResponseCode::NoUpdate(None), ResponseCode::NoUpdate(None)));
        let code = ResponseCode::NoUpdate(Some("A001".into()));
        if let ResponseCode::NoUpdate(Some(tag)) = code {
            assert_eq!(tag, "A001");
        } else {
            panic!("Expected NoUpdate(Some(_)) variant");
        }
    }

    #[test]
    fn metadata_long_entries() {
        let code = ResponseCode::Metadata(MetadataCode::LongEntries(4096));
        if let ResponseCode::Metadata(MetadataCode::LongEntries(n)) = code {
            assert_eq!(n, 4096);
        } else {
            panic!("Expected Metadata(LongEntries) variant");
        }
    }

    #[test]
    fn bad_event_lists_supported_events() {
        let code = ResponseCode::BadEvent(vec!["MessageNew".into(), "MessageExpunge".into()]);
        if let ResponseCode::BadEvent(events) = code {
            assert_eq!(events.len(), 2);
        } else {
            panic!("Expected BadEvent variant");
        }
    }

    #[test]
    fn rfc5530_style_codes_roundtrip_through_matches() {
        for code in [
            ResponseCode::Unavailable,
            ResponseCode::AuthenticationFailed,
            ResponseCode::AuthorizationFailed,
            ResponseCode::Expired,
            ResponseCode::PrivacyRequired,
            ResponseCode::ContactAdmin,
            ResponseCode::NoPerm,
            ResponseCode::InUse,
            ResponseCode::ExpungeIssued,
            ResponseCode::Corruption,
            ResponseCode::ServerBug,
            ResponseCode::ClientBug,
            ResponseCode::Cannot,
            ResponseCode::Limit,
            ResponseCode::OverQuota,
            ResponseCode::AlreadyExists,
            ResponseCode::NonExistent,
            ResponseCode::UseAttr,
        ] {
            assert_eq!(code, code.clone());
        }
    }
}
