//! Server capabilities and response status.

/// Response status from a tagged response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Command failed (operational error).
    No,
    /// Command failed (protocol/syntax error).
    Bad,
    /// Server greeting (pre-authenticated).
    PreAuth,
    /// Server is closing connection.
    Bye,
}

impl Status {
    /// Returns true if this is a successful status.
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok | Self::PreAuth)
    }
}

/// Server capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `IMAP4rev1` (RFC 3501)
    Imap4Rev1,
    /// `IMAP4rev2` (RFC 9051)
    Imap4Rev2,
    /// IDLE command support (RFC 2177)
    Idle,
    /// NAMESPACE command support (RFC 2342)
    Namespace,
    /// UIDPLUS extension (RFC 4315)
    UidPlus,
    /// MOVE extension (RFC 6851)
    Move,
    /// LITERAL+ extension (RFC 7888)
    LiteralPlus,
    /// LITERAL- extension (RFC 7888)
    LiteralMinus,
    /// STARTTLS support
    StartTls,
    /// LOGIN disabled
    LoginDisabled,
    /// AUTH mechanism
    Auth(String),
    /// ENABLE command (RFC 5161)
    Enable,
    /// UTF8=ACCEPT (RFC 6855)
    Utf8Accept,
    /// CONDSTORE (RFC 7162)
    CondStore,
    /// QRESYNC (RFC 7162)
    QResync,
    /// Unstrict (RFC 9586)
    Unstrict,
    /// ID extension (RFC 2971)
    Id,
    /// SPECIAL-USE mailboxes (RFC 6154)
    SpecialUse,
    /// SASL-IR: initial response may be sent with AUTHENTICATE (RFC 4959)
    SaslIr,
    /// COMPRESS=DEFLATE extension (RFC 4978)
    CompressDeflate,
    /// NOTIFY extension (RFC 5465)
    Notify,
    /// Unknown capability
    Unknown(String),
}

impl Capability {
    /// Parses a capability string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let upper = s.to_uppercase();
        match upper.as_str() {
            "IMAP4REV1" => Self::Imap4Rev1,
            "IMAP4REV2" => Self::Imap4Rev2,
            "IDLE" => Self::Idle,
            "NAMESPACE" => Self::Namespace,
            "UIDPLUS" => Self::UidPlus,
            "MOVE" => Self::Move,
            "LITERAL+" => Self::LiteralPlus,
            "LITERAL-" => Self::LiteralMinus,
            "STARTTLS" => Self::StartTls,
            "LOGINDISABLED" => Self::LoginDisabled,
            "ENABLE" => Self::Enable,
            "UTF8=ACCEPT" => Self::Utf8Accept,
            "CONDSTORE" => Self::CondStore,
            "QRESYNC" => Self::QResync,
            "UNSTRICT" => Self::Unstrict,
            "ID" => Self::Id,
            "SPECIAL-USE" => Self::SpecialUse,
            "SASL-IR" => Self::SaslIr,
            "COMPRESS=DEFLATE" => Self::CompressDeflate,
            "NOTIFY" => Self::Notify,
            _ if upper.starts_with("AUTH=") => Self::Auth(s[5..].to_string()),
            _ => Self::Unknown(s.to_string()),
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Imap4Rev1 => write!(f, "IMAP4rev1"),
            Self::Imap4Rev2 => write!(f, "IMAP4rev2"),
            Self::Idle => write!(f, "IDLE"),
            Self::Namespace => write!(f, "NAMESPACE"),
            Self::UidPlus => write!(f, "UIDPLUS"),
            Self::Move => write!(f, "MOVE"),
            Self::LiteralPlus => write!(f, "LITERAL+"),
            Self::LiteralMinus => write!(f, "LITERAL-"),
            Self::StartTls => write!(f, "STARTTLS"),
            Self::LoginDisabled => write!(f, "LOGINDISABLED"),
            Self::Auth(mech) => write!(f, "AUTH={mech}"),
            Self::Enable => write!(f, "ENABLE"),
            Self::Utf8Accept => write!(f, "UTF8=ACCEPT"),
            Self::CondStore => write!(f, "CONDSTORE"),
            Self::QResync => write!(f, "QRESYNC"),
            Self::Unstrict => write!(f, "UNSTRICT"),
            Self::Id => write!(f, "ID"),
            Self::SpecialUse => write!(f, "SPECIAL-USE"),
            Self::SaslIr => write!(f, "SASL-IR"),
            Self::CompressDeflate => write!(f, "COMPRESS=DEFLATE"),
            Self::Notify => write!(f, "NOTIFY"),
            Self::Unknown(s) => write!(f, "{s}"),
        }
    }
}

/// The server's advertised capability list, paired with a monotonic
/// version counter.
///
/// Capabilities can change mid-session (after STARTTLS, after
/// authentication, or following an explicit CAPABILITY response); any code
/// holding a stale snapshot needs a way to notice. `capabilities_version`
/// increments every time [`CapabilitySet::replace`] installs a new list, so
/// callers can cheaply compare "have the capabilities changed since I last
/// looked" without diffing the vectors themselves.
#[derive(Debug, Clone, Default)]
pub struct CapabilitySet {
    capabilities: Vec<Capability>,
    version: u64,
}

impl CapabilitySet {
    /// An empty set at version 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the capability list, incrementing the version counter.
    pub fn replace(&mut self, capabilities: Vec<Capability>) {
        self.capabilities = capabilities;
        self.version += 1;
    }

    /// The current capability list.
    #[must_use]
    pub fn as_slice(&self) -> &[Capability] {
        &self.capabilities
    }

    /// The version counter: increments once per [`CapabilitySet::replace`]
    /// call, starting at 0 for a freshly created set that has never been
    /// populated.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns `true` if `capability` is present in the current list.
    #[must_use]
    pub fn contains(&self, capability: &Capability) -> bool {
        self.capabilities.contains(capability)
    }

    /// Returns the list of SASL mechanisms advertised via `AUTH=` entries.
    #[must_use]
    pub fn sasl_mechanisms(&self) -> Vec<&str> {
        self.capabilities
            .iter()
            .filter_map(|c| match c {
                Capability::Auth(mech) => Some(mech.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod capability_set_tests {
        use super::*;

        #[test]
        fn replace_increments_version() {
            let mut set = CapabilitySet::new();
            assert_eq!(set.version(), 0);
            set.replace(vec![Capability::Imap4Rev1]);
            assert_eq!(set.version(), 1);
            set.replace(vec![Capability::Imap4Rev1, Capability::Idle]);
            assert_eq!(set.version(), 2);
        }

        #[test]
        fn contains_and_sasl_mechanisms() {
            let mut set = CapabilitySet::new();
            set.replace(vec![
                Capability::Imap4Rev1,
                Capability::Auth("PLAIN".into()),
                Capability::Auth("XOAUTH2".into()),
            ]);
            assert!(set.contains(&Capability::Imap4Rev1));
            assert!(!set.contains(&Capability::Idle));
            assert_eq!(set.sasl_mechanisms(), vec!["PLAIN", "XOAUTH2"]);
        }
    }

    mod status_tests {
        use super::*;

        #[test]
        fn is_ok_for_ok() {
            assert!(Status::Ok.is_ok());
        }

        #[test]
        fn is_ok_for_preauth() {
            assert!(Status::PreAuth.is_ok());
        }

        #[test]
        fn is_ok_false_for_no() {
            assert!(!Status::No.is_ok());
        }

        #[test]
        fn is_ok_false_for_bad() {
            assert!(!Status::Bad.is_ok());
        }

        #[test]
        fn is_ok_false_for_bye() {
            assert!(!Status::Bye.is_ok());
        }
    }

    mod capability_parse_tests {
        use super::*;

        #[test]
        fn parse_imap4rev1() {
            assert_eq!(Capability::parse("IMAP4REV1"), Capability::Imap4Rev1);
            assert_eq!(Capability::parse("imap4rev1"), Capability::Imap4Rev1);
        }

        #[test]
        fn parse_imap4rev2() {
            assert_eq!(Capability::parse("IMAP4REV2"), Capability::Imap4Rev2);
        }

        #[test]
        fn parse_idle() {
            assert_eq!(Capability::parse("IDLE"), Capability::Idle);
        }

        #[test]
        fn parse_namespace() {
            assert_eq!(Capability::parse("NAMESPACE"), Capability::Namespace);
        }

        #[test]
        fn parse_uidplus() {
            assert_eq!(Capability::parse("UIDPLUS"), Capability::UidPlus);
        }

        #[test]
        fn parse_move() {
            assert_eq!(Capability::parse("MOVE"), Capability::Move);
        }

        #[test]
        fn parse_literal_plus() {
            assert_eq!(Capability::parse("LITERAL+"), Capability::LiteralPlus);
        }

        #[test]
        fn parse_literal_minus() {
            assert_eq!(Capability::parse("LITERAL-"), Capability::LiteralMinus);
        }

        #[test]
        fn parse_starttls() {
            assert_eq!(Capability::parse("STARTTLS"), Capability::StartTls);
        }

        #[test]
        fn parse_logindisabled() {
            assert_eq!(
                Capability::parse("LOGINDISABLED"),
                Capability::LoginDisabled
            );
        }

        #[test]
        fn parse_auth() {
            let cap = Capability::parse("AUTH=PLAIN");
            assert_eq!(cap, Capability::Auth("PLAIN".to_string()));
        }

        #[test]
        fn parse_auth_xoauth2() {
            let cap = Capability::parse("AUTH=XOAUTH2");
            assert_eq!(cap, Capability::Auth("XOAUTH2".to_string()));
        }

        #[test]
        fn parse_enable() {
            assert_eq!(Capability::parse("ENABLE"), Capability::Enable);
        }

        #[test]
        fn parse_utf8_accept() {
            assert_eq!(Capability::parse("UTF8=ACCEPT"), Capability::Utf8Accept);
        }

        #[test]
        fn parse_condstore() {
            assert_eq!(Capability::parse("CONDSTORE"), Capability::CondStore);
        }

        #[test]
        fn parse_qresync() {
            assert_eq!(Capability::parse("QRESYNC"), Capability::QResync);
        }

        #[test]
        fn parse_unstrict() {
            assert_eq!(Capability::parse("UNSTRICT"), Capability::Unstrict);
        }

        #[test]
        fn parse_id() {
            assert_eq!(Capability::parse("ID"), Capability::Id);
        }

        #[test]
        fn parse_special_use() {
            assert_eq!(Capability::parse("SPECIAL-USE"), Capability::SpecialUse);
        }

        #[test]
        fn parse_sasl_ir() {
            assert_eq!(Capability::parse("SASL-IR"), Capability::SaslIr);
        }

        #[test]
        fn parse_compress_deflate() {
            assert_eq!(
                Capability::parse("COMPRESS=DEFLATE"),
                Capability::CompressDeflate
            );
        }

        #[test]
        fn parse_notify() {
            assert_eq!(Capability::parse("NOTIFY"), Capability::Notify);
        }

        #[test]
        fn parse_unknown() {
            let cap = Capability::parse("XSOMETHING");
            assert_eq!(cap, Capability::Unknown("XSOMETHING".to_string()));
        }
    }

    mod capability_display_tests {
        use super::*;

        #[test]
        fn display_imap4rev1() {
            assert_eq!(format!("{}", Capability::Imap4Rev1), "IMAP4rev1");
        }

        #[test]
        fn display_imap4rev2() {
            assert_eq!(format!("{}", Capability::Imap4Rev2), "IMAP4rev2");
        }

        #[test]
        fn display_auth() {
            assert_eq!(
                format!("{}", Capability::Auth("PLAIN".to_string())),
                "AUTH=PLAIN"
            );
        }

        #[test]
        fn display_unknown() {
            assert_eq!(
                format!("{}", Capability::Unknown("CUSTOM".to_string())),
                "CUSTOM"
            );
        }
    }
}
