use std::fmt;

use serde::Deserialize;

/// State of one pending path, as tracked by the merge table.
///
/// `Suppressed` is a sentinel: a record that merged away to nothing and must
/// never reach the downstream listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Deleted,
    Created,
    RenamedCreated,
    RenamedDeleted,
    FolderCreated,
    Changed,
    AttributeChanged,
    Suppressed,
}

impl EventKind {
    /// Every kind that can enter the merge table as an incoming event.
    pub const REGISTRABLE: [EventKind; 7] = [
        EventKind::Deleted,
        EventKind::Created,
        EventKind::RenamedCreated,
        EventKind::RenamedDeleted,
        EventKind::FolderCreated,
        EventKind::Changed,
        EventKind::AttributeChanged,
    ];

    /// Kinds the dispatch worker never hands to the listener.
    pub fn is_dispatchable(self) -> bool {
        !matches!(self, EventKind::Suppressed | EventKind::RenamedDeleted)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::Deleted => "deleted",
            EventKind::Created => "created",
            EventKind::RenamedCreated => "renamed-created",
            EventKind::RenamedDeleted => "renamed-deleted",
            EventKind::FolderCreated => "folder-created",
            EventKind::Changed => "changed",
            EventKind::AttributeChanged => "attribute-changed",
            EventKind::Suppressed => "suppressed",
        };
        f.write_str(s)
    }
}

/// What to do when the merge table hits a pairing that upstream should never
/// produce.
///
/// - `Log`: report at `error` level and adopt the incoming event (default).
/// - `Panic`: same report, then panic in debug builds. Release builds always
///   behave like `Log`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvariantPolicy {
    Log,
    Panic,
}

impl Default for InvariantPolicy {
    fn default() -> Self {
        InvariantPolicy::Log
    }
}

/// Log level accepted by [`crate::logging::init_logging`] and the
/// `[logging]` config section.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}
