//! Engine state machine.
//!
//! Generalizes the teacher's four-state `ProtocolState` into five states by
//! splitting `Idle` out of `Selected`: IDLE has its own write-suppression
//! rules (see [`crate::engine::idle`]) that no other selected-state command
//! shares, so folding it back into `Selected` would let a caller issue an
//! ordinary command while the connection is actually idling.

use std::collections::HashMap;

use crate::engine::response::Namespaces;
use crate::error::{Error, Result};
use crate::types::{Mailbox, MailboxAttribute, MailboxStatus};

/// Connection lifecycle state, per RFC 3501 §3 plus an explicit IDLE state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    /// No connection has been established yet.
    #[default]
    Disconnected,
    /// Connected and greeted, not yet authenticated.
    Connected,
    /// Authenticated, no mailbox selected.
    Authenticated,
    /// A mailbox is selected and commands may be issued against it.
    Selected,
    /// IDLE is active; only `DONE` may be written until it ends.
    Idle,
}

impl EngineState {
    /// `true` once authentication has succeeded (Authenticated, Selected, or Idle).
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated | Self::Selected | Self::Idle)
    }

    /// `true` if a mailbox is currently selected (Selected or Idle).
    #[must_use]
    pub const fn is_selected(self) -> bool {
        matches!(self, Self::Selected | Self::Idle)
    }
}

/// Cached LIST attributes for one mailbox, used to resolve special-use
/// folders (Sent, Trash, Drafts, ...) without re-issuing LIST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderDescriptor {
    /// Attributes last reported by LIST for this mailbox.
    pub attributes: Vec<MailboxAttribute>,
    /// Hierarchy delimiter reported alongside this mailbox.
    pub delimiter: Option<char>,
}

/// The currently selected mailbox and its last-known status.
#[derive(Debug, Clone)]
pub struct SelectedFolder {
    /// The selected mailbox's name.
    pub mailbox: Mailbox,
    /// Status fields as of the last SELECT/EXAMINE or subsequent untagged update.
    pub status: MailboxStatus,
}

/// All session data that persists across commands: the state machine
/// position plus everything SELECT, NAMESPACE, and LIST populate.
///
/// Written only by the engine's driver task; external readers only ever see
/// a snapshot consistent with the last completed command.
#[derive(Debug, Default)]
pub struct SessionState {
    state: EngineState,
    selected: Option<SelectedFolder>,
    namespaces: Option<Namespaces>,
    folder_cache: HashMap<String, FolderDescriptor>,
    append_limit: Option<u32>,
}

impl SessionState {
    /// A fresh session, not yet connected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current state.
    #[must_use]
    pub const fn state(&self) -> EngineState {
        self.state
    }

    /// The selected mailbox, if any.
    #[must_use]
    pub fn selected(&self) -> Option<&SelectedFolder> {
        self.selected.as_ref()
    }

    /// The server's namespace tables, once NAMESPACE has been queried.
    #[must_use]
    pub fn namespaces(&self) -> Option<&Namespaces> {
        self.namespaces.as_ref()
    }

    /// The server's advertised APPEND size limit, if it reported one via
    /// an `APPENDLIMIT` capability or resp-code.
    #[must_use]
    pub fn append_limit(&self) -> Option<u32> {
        self.append_limit
    }

    /// Sets the APPEND size limit.
    pub fn set_append_limit(&mut self, limit: u32) {
        self.append_limit = Some(limit);
    }

    /// Records the server's NAMESPACE tables.
    pub fn record_namespaces(&mut self, namespaces: Namespaces) {
        self.namespaces = Some(namespaces);
    }

    /// Caches a mailbox's LIST attributes, used later to resolve
    /// special-use folders.
    pub fn cache_folder(&mut self, mailbox: String, descriptor: FolderDescriptor) {
        self.folder_cache.insert(mailbox, descriptor);
    }

    /// The folder cache, keyed by mailbox name.
    #[must_use]
    pub fn folder_cache(&self) -> &HashMap<String, FolderDescriptor> {
        &self.folder_cache
    }

    /// Finds the first cached mailbox advertising `attribute`, e.g. looking
    /// up the Sent or Trash folder by its SPECIAL-USE attribute.
    #[must_use]
    pub fn special_use_folder(&self, attribute: &MailboxAttribute) -> Option<&str> {
        self.folder_cache
            .iter()
            .find(|(_, desc)| desc.attributes.contains(attribute))
            .map(|(name, _)| name.as_str())
    }

    /// Transitions Disconnected -> Connected, following a greeting.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] if not currently Disconnected.
    pub fn transition_connected(&mut self) -> Result<()> {
        if self.state != EngineState::Disconnected {
            return Err(Error::InvalidState(format!(
                "cannot connect from state {:?}",
                self.state
            )));
        }
        self.state = EngineState::Connected;
        Ok(())
    }

    /// Transitions directly to Authenticated, for a PREAUTH greeting.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] if not currently Disconnected.
    pub fn transition_preauth(&mut self) -> Result<()> {
        if self.state != EngineState::Disconnected {
            return Err(Error::InvalidState(format!(
                "cannot PREAUTH from state {:?}",
                self.state
            )));
        }
        self.state = EngineState::Authenticated;
        Ok(())
    }

    /// Transitions Connected -> Authenticated, following successful
    /// AUTHENTICATE or LOGIN.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] if not currently Connected.
    pub fn transition_authenticated(&mut self) -> Result<()> {
        if self.state != EngineState::Connected {
            return Err(Error::InvalidState(format!(
                "cannot authenticate from state {:?}",
                self.state
            )));
        }
        self.state = EngineState::Authenticated;
        Ok(())
    }

    /// Transitions to Selected, following a successful SELECT/EXAMINE.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] if not currently Authenticated or Selected.
    pub fn select(&mut self, mailbox: Mailbox, status: MailboxStatus) -> Result<()> {
        if !matches!(self.state, EngineState::Authenticated | EngineState::Selected) {
            return Err(Error::InvalidState(format!(
                "cannot select a mailbox from state {:?}",
                self.state
            )));
        }
        self.selected = Some(SelectedFolder { mailbox, status });
        self.state = EngineState::Selected;
        Ok(())
    }

    /// Applies an untagged status update (EXISTS/RECENT/flags/...) to the
    /// currently selected folder, if any.
    pub fn update_selected_status(&mut self, update: impl FnOnce(&mut MailboxStatus)) {
        if let Some(folder) = &mut self.selected {
            update(&mut folder.status);
        }
    }

    /// Transitions Selected -> Authenticated, following CLOSE or a second
    /// SELECT replacing the current mailbox.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] if not currently Selected.
    pub fn close_selected(&mut self) -> Result<()> {
        if self.state != EngineState::Selected {
            return Err(Error::InvalidState(format!(
                "cannot close a mailbox from state {:?}",
                self.state
            )));
        }
        self.selected = None;
        self.state = EngineState::Authenticated;
        Ok(())
    }

    /// Transitions Selected -> Idle.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] if not currently Selected.
    pub fn enter_idle(&mut self) -> Result<()> {
        if self.state != EngineState::Selected {
            return Err(Error::InvalidState(format!(
                "cannot enter IDLE from state {:?}",
                self.state
            )));
        }
        self.state = EngineState::Idle;
        Ok(())
    }

    /// Transitions Idle -> Selected, following the tagged OK that completes IDLE.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] if not currently Idle.
    pub fn exit_idle(&mut self) -> Result<()> {
        if self.state != EngineState::Idle {
            return Err(Error::InvalidState(format!(
                "cannot exit IDLE from state {:?}",
                self.state
            )));
        }
        self.state = EngineState::Selected;
        Ok(())
    }

    /// Unconditionally transitions to Disconnected, as happens on BYE or an
    /// unrecoverable I/O or protocol error.
    pub fn disconnect(&mut self) {
        self.state = EngineState::Disconnected;
        self.selected = None;
    }

    /// Returns an error unless the session is authenticated.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] if not authenticated.
    pub fn require_authenticated(&self) -> Result<()> {
        if self.state.is_authenticated() {
            Ok(())
        } else {
            Err(Error::InvalidState(format!(
                "operation requires an authenticated session, currently {:?}",
                self.state
            )))
        }
    }

    /// Returns the selected folder, or an error if none is selected.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] if no mailbox is selected.
    pub fn require_selected(&self) -> Result<&SelectedFolder> {
        self.selected.as_ref().ok_or_else(|| {
            Error::InvalidState(format!(
                "operation requires a selected mailbox, currently {:?}",
                self.state
            ))
        })
    }
}
