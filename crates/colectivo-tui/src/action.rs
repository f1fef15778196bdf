//! Actions: what components ask the App to do.

use colectivo_proto::protocol::RadioCommand;

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    ChatPanel,
    RadioPanel,
    LinksOverlay,
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Radio ────────────────────────────────────────────────────────────────
    SendCommand(RadioCommand),

    // ── Chat ─────────────────────────────────────────────────────────────────
    /// The chat panel queued a reply; the App starts its typing timer.
    ReplyQueued(colectivo_proto::chat::PendingReply),
    ResetChat,

    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,

    // ── Links ────────────────────────────────────────────────────────────────
    ToggleLinks,
    /// Copy `url` and tell the user which link it was.
    CopyLink { label: String, url: String },

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
}
