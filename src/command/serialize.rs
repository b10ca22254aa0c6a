//! Frame-based command serialization helpers.

use super::Frame;
use super::types::{FetchAttribute, FetchItems, SearchCriteria, StoreAction};

/// Returns `true` if `s` cannot be represented as a quoted string and must
/// be sent as a literal (quoted-string excludes CR, LF, and NUL).
#[must_use]
pub fn needs_literal(s: &str) -> bool {
    s.bytes().any(|b| b == b'\r' || b == b'\n' || b == 0)
}

/// Returns true if the byte needs the astring to be quoted.
const fn needs_quoting(b: u8) -> bool {
    matches!(b, b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*') || b < 0x20 || b == 0x7F
}

/// Accumulates a command's wire representation into a sequence of frames,
/// splitting out literal arguments as they're encountered.
pub struct FrameBuilder {
    frames: Vec<Frame>,
    current: Vec<u8>,
    literal_plus: bool,
}

impl FrameBuilder {
    /// Starts a new builder. `literal_plus` controls whether literal
    /// markers are emitted as non-synchronizing (`{n+}`).
    #[must_use]
    pub fn new(literal_plus: bool) -> Self {
        Self { frames: Vec::new(), current: Vec::new(), literal_plus }
    }

    /// Appends raw bytes to the current frame.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.current.extend_from_slice(bytes);
    }

    /// Appends an astring, quoting it if needed or splitting it out as a
    /// literal if it contains bytes a quoted string cannot represent.
    pub fn push_astring(&mut self, s: &str) {
        if needs_literal(s) {
            self.push_literal(s.as_bytes());
        } else if s.is_empty() || s.bytes().any(needs_quoting) {
            self.current.push(b'"');
            for b in s.bytes() {
                if b == b'"' || b == b'\\' {
                    self.current.push(b'\\');
                }
                self.current.push(b);
            }
            self.current.push(b'"');
        } else {
            self.current.extend_from_slice(s.as_bytes());
        }
    }

    /// Appends a literal: a `{n}`/`{n+}` marker into the current frame,
    /// followed by a dedicated [`Frame::Literal`] for `data`.
    pub fn push_literal(&mut self, data: &[u8]) {
        if self.literal_plus {
            self.current.extend_from_slice(format!("{{{}+}}\r\n", data.len()).as_bytes());
        } else {
            self.current.extend_from_slice(format!("{{{}}}\r\n", data.len()).as_bytes());
        }
        self.flush_current();
        self.frames.push(Frame::Literal(data.to_vec()));
    }

    fn flush_current(&mut self) {
        if !self.current.is_empty() {
            self.frames.push(Frame::Bytes(std::mem::take(&mut self.current)));
        }
    }

    /// Finishes building, returning the accumulated frames.
    #[must_use]
    pub fn finish(mut self) -> Vec<Frame> {
        self.flush_current();
        self.frames
    }
}

/// Writes FETCH items into the builder.
pub fn write_fetch_items_bytes(b: &mut FrameBuilder, items: &FetchItems) {
    match items {
        FetchItems::All => b.push_bytes(b"ALL"),
        FetchItems::Full => b.push_bytes(b"FULL"),
        FetchItems::Fast => b.push_bytes(b"FAST"),
        FetchItems::Items(attrs) => {
            if attrs.len() == 1 {
                write_fetch_attribute_bytes(b, &attrs[0]);
            } else {
                b.push_bytes(b"(");
                for (i, attr) in attrs.iter().enumerate() {
                    if i > 0 {
                        b.push_bytes(b" ");
                    }
                    write_fetch_attribute_bytes(b, attr);
                }
                b.push_bytes(b")");
            }
        }
    }
}

/// Writes a single FETCH attribute into the builder.
pub fn write_fetch_attribute_bytes(b: &mut FrameBuilder, attr: &FetchAttribute) {
    match attr {
        FetchAttribute::Flags => b.push_bytes(b"FLAGS"),
        FetchAttribute::InternalDate => b.push_bytes(b"INTERNALDATE"),
        FetchAttribute::Rfc822Size => b.push_bytes(b"RFC822.SIZE"),
        FetchAttribute::Envelope => b.push_bytes(b"ENVELOPE"),
        FetchAttribute::BodyStructure => b.push_bytes(b"BODYSTRUCTURE"),
        FetchAttribute::Uid => b.push_bytes(b"UID"),
        FetchAttribute::Rfc822 => b.push_bytes(b"RFC822"),
        FetchAttribute::Rfc822Header => b.push_bytes(b"RFC822.HEADER"),
        FetchAttribute::Rfc822Text => b.push_bytes(b"RFC822.TEXT"),
        FetchAttribute::ModSeq => b.push_bytes(b"MODSEQ"),
        FetchAttribute::Body { section, peek, partial } => {
            if *peek {
                b.push_bytes(b"BODY.PEEK[");
            } else {
                b.push_bytes(b"BODY[");
            }
            if let Some(s) = section {
                b.push_bytes(s.as_bytes());
            }
            b.push_bytes(b"]");
            if let Some((start, len)) = partial {
                b.push_bytes(format!("<{start}.{len}>").as_bytes());
            }
        }
    }
}

/// Writes a STORE action into the builder.
pub fn write_store_action_bytes(b: &mut FrameBuilder, action: &StoreAction, silent: bool) {
    match action {
        StoreAction::SetFlags(f) | StoreAction::AddFlags(f) | StoreAction::RemoveFlags(f) => {
            let prefix = match action {
                StoreAction::SetFlags(_) => "FLAGS",
                StoreAction::AddFlags(_) => "+FLAGS",
                StoreAction::RemoveFlags(_) => "-FLAGS",
                _ => unreachable!(),
            };
            b.push_bytes(prefix.as_bytes());
            if silent {
                b.push_bytes(b".SILENT");
            }
            b.push_bytes(b" (");
            for (i, flag) in f.iter().enumerate() {
                if i > 0 {
                    b.push_bytes(b" ");
                }
                b.push_bytes(flag.as_str().as_bytes());
            }
            b.push_bytes(b")");
        }
        StoreAction::SetFlagsUnchangedSince { flags, modseq }
        | StoreAction::AddFlagsUnchangedSince { flags, modseq }
        | StoreAction::RemoveFlagsUnchangedSince { flags, modseq } => {
            let prefix = match action {
                StoreAction::SetFlagsUnchangedSince { .. } => "FLAGS",
                StoreAction::AddFlagsUnchangedSince { .. } => "+FLAGS",
                StoreAction::RemoveFlagsUnchangedSince { .. } => "-FLAGS",
                _ => unreachable!(),
            };
            b.push_bytes(prefix.as_bytes());
            if silent {
                b.push_bytes(b".SILENT");
            }
            b.push_bytes(format!(" (UNCHANGEDSINCE {modseq}) (").as_bytes());
            for (i, flag) in flags.iter().enumerate() {
                if i > 0 {
                    b.push_bytes(b" ");
                }
                b.push_bytes(flag.as_str().as_bytes());
            }
            b.push_bytes(b")");
        }
    }
}

/// Writes SEARCH criteria into the builder.
pub fn write_search_criteria_bytes(b: &mut FrameBuilder, criteria: &SearchCriteria) {
    match criteria {
        SearchCriteria::All => b.push_bytes(b"ALL"),
        SearchCriteria::Answered => b.push_bytes(b"ANSWERED"),
        SearchCriteria::Deleted => b.push_bytes(b"DELETED"),
        SearchCriteria::Draft => b.push_bytes(b"DRAFT"),
        SearchCriteria::Flagged => b.push_bytes(b"FLAGGED"),
        SearchCriteria::New => b.push_bytes(b"NEW"),
        SearchCriteria::Undeleted => b.push_bytes(b"UNDELETED"),
        SearchCriteria::Unseen => b.push_bytes(b"UNSEEN"),
        SearchCriteria::Seen => b.push_bytes(b"SEEN"),
        SearchCriteria::SequenceSet(set) => b.push_bytes(set.to_string().as_bytes()),
        SearchCriteria::UidSet(set) => {
            b.push_bytes(b"UID ");
            b.push_bytes(set.to_string().as_bytes());
        }
        SearchCriteria::Subject(s) => {
            b.push_bytes(b"SUBJECT ");
            b.push_astring(s);
        }
        SearchCriteria::From(s) => {
            b.push_bytes(b"FROM ");
            b.push_astring(s);
        }
        SearchCriteria::To(s) => {
            b.push_bytes(b"TO ");
            b.push_astring(s);
        }
        SearchCriteria::Body(s) => {
            b.push_bytes(b"BODY ");
            b.push_astring(s);
        }
        SearchCriteria::Text(s) => {
            b.push_bytes(b"TEXT ");
            b.push_astring(s);
        }
        SearchCriteria::Since(date) => {
            b.push_bytes(b"SINCE ");
            b.push_bytes(date.as_bytes());
        }
        SearchCriteria::Before(date) => {
            b.push_bytes(b"BEFORE ");
            b.push_bytes(date.as_bytes());
        }
        SearchCriteria::On(date) => {
            b.push_bytes(b"ON ");
            b.push_bytes(date.as_bytes());
        }
        SearchCriteria::Larger(size) => b.push_bytes(format!("LARGER {size}").as_bytes()),
        SearchCriteria::Smaller(size) => b.push_bytes(format!("SMALLER {size}").as_bytes()),
        SearchCriteria::Header(name, value) => {
            b.push_bytes(b"HEADER ");
            b.push_astring(name);
            b.push_bytes(b" ");
            b.push_astring(value);
        }
        SearchCriteria::ModSeq(modseq) => b.push_bytes(format!("MODSEQ {modseq}").as_bytes()),
        SearchCriteria::And(criteria) => {
            for (i, c) in criteria.iter().enumerate() {
                if i > 0 {
                    b.push_bytes(b" ");
                }
                write_search_criteria_bytes(b, c);
            }
        }
        SearchCriteria::Or(a, c) => {
            b.push_bytes(b"OR ");
            write_search_criteria_bytes(b, a);
            b.push_bytes(b" ");
            write_search_criteria_bytes(b, c);
        }
        SearchCriteria::Not(c) => {
            b.push_bytes(b"NOT ");
            write_search_criteria_bytes(b, c);
        }
    }
}
