// src/engine/core.rs

//! Synchronous coalescing core.
//!
//! Owns the pending table and suspend counter behind one mutex, plus the
//! downstream listener. Everything here runs on whatever thread calls it;
//! the [`super::dispatch`] worker decides *where* draining happens.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, trace, warn};

use crate::engine::merge::{merge, EventRecord, Transition};
use crate::engine::report::ViolationReporter;
use crate::engine::suspend::{Resume, SuspendCounter};
use crate::engine::table::PendingTable;
use crate::errors::Result;
use crate::fs::{EventKey, FileRef, IdentityResolver};
use crate::types::{EventKind, InvariantPolicy};
use crate::watch::{FileChangeListener, RawEvent};

#[derive(Debug, Default)]
struct State {
    table: PendingTable,
    suspend: SuspendCounter,
}

pub struct CoalescerCore {
    state: Mutex<State>,
    listener: Arc<dyn FileChangeListener>,
    resolver: Arc<dyn IdentityResolver>,
    reporter: ViolationReporter,
}

impl fmt::Debug for CoalescerCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoalescerCore")
            .field("resolver", &self.resolver)
            .field("reporter", &self.reporter)
            .finish_non_exhaustive()
    }
}

impl CoalescerCore {
    pub fn new(
        listener: Arc<dyn FileChangeListener>,
        resolver: Arc<dyn IdentityResolver>,
        policy: InvariantPolicy,
    ) -> Self {
        Self {
            state: Mutex::new(State::default()),
            listener,
            resolver,
            reporter: ViolationReporter::new(policy),
        }
    }

    pub fn resolver(&self) -> &dyn IdentityResolver {
        self.resolver.as_ref()
    }

    pub fn key_for(&self, file: &FileRef) -> EventKey {
        self.resolver.key_for(file)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("pending table mutex poisoned; continuing with its current contents");
            poisoned.into_inner()
        })
    }

    /// Merge `(kind, raw)` into the pending record for `key`.
    ///
    /// Holds the lock only for the merge itself. Violations are reported
    /// after the lock is released.
    pub fn merge_into_table(&self, key: EventKey, kind: EventKind, raw: &RawEvent) -> Result<()> {
        let violation = {
            let mut state = self.lock();
            merge_locked(&mut state, key, kind, raw)?
        };

        if let Some(violation) = violation {
            self.report(violation, kind);
        }
        Ok(())
    }

    /// Merge both halves of a rename under one lock, so a concurrent drain
    /// sees either neither half or both.
    pub fn merge_rename(
        &self,
        old_key: EventKey,
        old_half: &RawEvent,
        new_key: EventKey,
        raw: &RawEvent,
    ) -> Result<()> {
        let (old_violation, new_violation) = {
            let mut state = self.lock();
            let old_violation = merge_locked(&mut state, old_key, EventKind::Deleted, old_half)?;
            let new_violation = merge_locked(&mut state, new_key, EventKind::Created, raw)?;
            (old_violation, new_violation)
        };

        if let Some(violation) = old_violation {
            self.report(violation, EventKind::Deleted);
        }
        if let Some(violation) = new_violation {
            self.report(violation, EventKind::Created);
        }
        Ok(())
    }

    fn report(&self, (key, previous): (EventKey, EventKind), incoming: EventKind) {
        self.reporter.invalid_transition(&key, incoming, previous);
    }

    /// Returns the new suspend count.
    pub fn suspend(&self) -> usize {
        let count = self.lock().suspend.suspend();
        debug!(count, "removes suspended");
        count
    }

    pub fn resume(&self) -> Resume {
        let outcome = self.lock().suspend.resume();
        match outcome {
            Resume::Unbalanced => self.reporter.unbalanced_resume(),
            Resume::Released => debug!("removes resumed"),
            Resume::StillSuspended(count) => debug!(count, "removes still suspended"),
        }
        outcome
    }

    /// Swap out the records that may be dispatched now.
    ///
    /// While removes are suspended, delete-like records stay behind and
    /// become the new active table.
    pub fn take_dispatchable(&self) -> Vec<(EventKey, EventRecord)> {
        let mut state = self.lock();
        if state.table.is_empty() {
            return Vec::new();
        }

        let table = std::mem::take(&mut state.table);
        if !state.suspend.is_suspended() {
            return table.into_entries();
        }

        let (held, eligible) = table.partition(is_held_back);
        debug!(
            held_back = held.len(),
            eligible = eligible.len(),
            "partitioned pending events while removes are suspended"
        );
        state.table = held;
        eligible
    }

    /// Hand `entries` to the listener, in order. Must be called without the
    /// lock held.
    pub fn dispatch(&self, entries: Vec<(EventKey, EventRecord)>) -> usize {
        let mut dispatched = 0;
        for (key, record) in entries {
            let kind = record.kind();
            if !kind.is_dispatchable() {
                trace!(%key, %kind, "dropping non-dispatchable record");
                continue;
            }

            trace!(%key, %kind, "dispatching");
            let listener = self.listener.as_ref();
            let outcome = catch_unwind(AssertUnwindSafe(|| deliver(listener, &record)));
            if outcome.is_err() {
                error!(%key, %kind, "listener panicked while handling event");
            }
            dispatched += 1;
        }
        dispatched
    }

    /// One full drain pass: take, then dispatch outside the lock.
    pub fn drain(&self) -> usize {
        let entries = self.take_dispatchable();
        if entries.is_empty() {
            return 0;
        }
        let dispatched = self.dispatch(entries);
        debug!(dispatched, "drain finished");
        dispatched
    }

    pub fn pending_len(&self) -> usize {
        self.lock().table.len()
    }

    pub fn pending_kind(&self, key: &EventKey) -> Option<EventKind> {
        self.lock().table.get(key).map(EventRecord::kind)
    }

    pub fn suspend_count(&self) -> usize {
        self.lock().suspend.count()
    }

    pub fn violation_count(&self) -> u64 {
        self.reporter.count()
    }
}

/// Merge into the locked table. Returns the key and previous kind when the
/// pairing was invalid.
fn merge_locked(
    state: &mut State,
    key: EventKey,
    kind: EventKind,
    raw: &RawEvent,
) -> Result<Option<(EventKey, EventKind)>> {
    let previous = state.table.get(&key);
    let previous_kind = previous.map(EventRecord::kind);
    let merged = merge(previous, kind, raw)?;

    trace!(%key, %kind, transition = ?merged.transition, "merged event");

    if merged.record.is_suppressed() {
        state.table.remove(&key);
    } else {
        state.table.upsert(key.clone(), merged.record);
    }

    Ok(match (merged.transition, previous_kind) {
        (Transition::Invalid, Some(previous)) => Some((key, previous)),
        _ => None,
    })
}

/// A record stays pending during suspension if it is a delete, or the
/// new-path half of a rename.
fn is_held_back(record: &EventRecord) -> bool {
    match record.kind() {
        EventKind::Deleted => true,
        EventKind::Created => record.raw().is_rename(),
        _ => false,
    }
}

fn deliver(listener: &dyn FileChangeListener, record: &EventRecord) {
    let raw = record.raw();
    match record.kind() {
        EventKind::Deleted => listener.file_deleted(raw),
        EventKind::Created if raw.is_rename() => listener.file_renamed(raw),
        EventKind::Created => listener.file_data_created(raw),
        EventKind::RenamedCreated => listener.file_renamed(raw),
        EventKind::Changed => listener.file_changed(raw),
        EventKind::FolderCreated => listener.file_folder_created(raw),
        EventKind::AttributeChanged => listener.file_attribute_changed(raw),
        EventKind::Suppressed | EventKind::RenamedDeleted => {}
    }
}
