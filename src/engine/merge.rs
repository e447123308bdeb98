// src/engine/merge.rs

//! The merge table.
//!
//! Given the pending record for a key (if any) and a newly arrived
//! `(kind, raw)` pair, decide what the key's pending state becomes. This is a
//! pure function: no locks, no IO, no logging. Callers report
//! [`Transition::Invalid`] themselves.

use crate::errors::{CoalesceError, Result};
use crate::types::EventKind;
use crate::watch::RawEvent;

/// Immutable `(kind, raw)` pair: the best-known state of one key.
#[derive(Debug, Clone)]
pub struct EventRecord {
    kind: EventKind,
    raw: RawEvent,
}

impl EventRecord {
    pub fn new(kind: EventKind, raw: RawEvent) -> Self {
        Self { kind, raw }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn raw(&self) -> &RawEvent {
        &self.raw
    }

    pub fn is_suppressed(&self) -> bool {
        self.kind == EventKind::Suppressed
    }
}

/// Cell of the merge table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Replace the previous record with the incoming one.
    Incoming,
    /// The previous record already subsumes the incoming event.
    KeepPrevious,
    /// Both events cancel out; nothing is dispatched for the key.
    Suppress,
    /// Collapse into a `Changed` record carrying the incoming raw event.
    Changed,
    /// Pairing that correct upstream behaviour never produces. Resolved like
    /// `Incoming`.
    Invalid,
}

/// Look up the cell for `(incoming, previous)`.
///
/// Returns an error only when `incoming` has no row, which is a programming
/// error rather than an upstream protocol violation.
pub fn transition(incoming: EventKind, previous: EventKind) -> Result<Transition> {
    use EventKind::*;
    use Transition as T;

    let cell = match (incoming, previous) {
        (Suppressed, _) => return Err(CoalesceError::UnregistrableKind(incoming)),
        (_, Suppressed) => T::Incoming,

        (Deleted, Deleted) => T::KeepPrevious,
        (Deleted, Created | RenamedCreated | FolderCreated) => T::Suppress,
        (Deleted, RenamedDeleted) => T::Invalid,
        (Deleted, Changed | AttributeChanged) => T::Incoming,

        (Created, Deleted | RenamedDeleted) => T::Changed,
        (Created, Created | Changed) => T::KeepPrevious,
        (Created, RenamedCreated | FolderCreated | AttributeChanged) => T::Invalid,

        (RenamedCreated, Deleted | RenamedDeleted) => T::Changed,
        (RenamedCreated, _) => T::Invalid,

        (RenamedDeleted, Deleted | RenamedDeleted) => T::Invalid,
        (RenamedDeleted, Created | RenamedCreated | FolderCreated) => T::Suppress,
        (RenamedDeleted, Changed | AttributeChanged) => T::Incoming,

        (FolderCreated, Deleted | RenamedDeleted) => T::Changed,
        (FolderCreated, FolderCreated) => T::Incoming,
        (FolderCreated, Changed) => T::KeepPrevious,
        (FolderCreated, Created | RenamedCreated | AttributeChanged) => T::Invalid,

        (Changed, Deleted | RenamedDeleted) => T::Invalid,
        (Changed, Created | RenamedCreated | FolderCreated) => T::KeepPrevious,
        (Changed, Changed | AttributeChanged) => T::Incoming,

        (AttributeChanged, Deleted | RenamedDeleted) => T::Invalid,
        (AttributeChanged, Created | RenamedCreated | FolderCreated | Changed) => T::KeepPrevious,
        (AttributeChanged, AttributeChanged) => T::Incoming,
    };

    Ok(cell)
}

/// Result of merging one incoming event into a key's pending state.
#[derive(Debug, Clone)]
pub struct Merged {
    pub record: EventRecord,
    pub transition: Transition,
}

/// Merge `(kind, raw)` into `previous`.
///
/// With no previous record (or a suppressed one) the incoming event is
/// adopted as-is. A `Suppressed` result means the key must be removed from
/// the pending table.
pub fn merge(previous: Option<&EventRecord>, kind: EventKind, raw: &RawEvent) -> Result<Merged> {
    let incoming = || EventRecord::new(kind, raw.clone());

    let Some(previous) = previous else {
        if kind == EventKind::Suppressed {
            return Err(CoalesceError::UnregistrableKind(kind));
        }
        return Ok(Merged {
            record: incoming(),
            transition: Transition::Incoming,
        });
    };

    let transition = transition(kind, previous.kind())?;
    let record = match transition {
        Transition::Incoming | Transition::Invalid => incoming(),
        Transition::KeepPrevious => previous.clone(),
        Transition::Suppress => EventRecord::new(EventKind::Suppressed, raw.clone()),
        Transition::Changed => EventRecord::new(EventKind::Changed, raw.clone()),
    };

    Ok(Merged { record, transition })
}
