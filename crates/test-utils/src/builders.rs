#![allow(dead_code)]

use fsevent_coalesce::fs::{FileRef, FileSystemId};
use fsevent_coalesce::{DeliveryRound, RawEvent};

/// Builds raw events on one filesystem, optionally all belonging to the same
/// delivery round.
#[derive(Debug, Clone)]
pub struct EventFactory {
    filesystem: FileSystemId,
    round: Option<DeliveryRound>,
}

impl EventFactory {
    pub fn new(filesystem: &str) -> Self {
        Self {
            filesystem: FileSystemId::new(filesystem),
            round: None,
        }
    }

    pub fn local() -> Self {
        Self::new("local")
    }

    /// Events built from the returned factory fire their delivery-over hooks
    /// only when `round.finish()` is called.
    pub fn in_round(&self, round: &DeliveryRound) -> Self {
        Self {
            filesystem: self.filesystem.clone(),
            round: Some(round.clone()),
        }
    }

    pub fn filesystem(&self) -> &FileSystemId {
        &self.filesystem
    }

    pub fn file(&self, path: &str) -> FileRef {
        FileRef::new(self.filesystem.clone(), path)
    }

    pub fn event(&self, path: &str) -> RawEvent {
        let builder = RawEvent::builder(self.file(path));
        match &self.round {
            Some(round) => builder.delivered_by(round.clone()).build(),
            None => builder.build(),
        }
    }

    /// Rename of `old_name.old_ext` (same directory) to `new_path`.
    pub fn rename(&self, old_name: &str, old_ext: &str, new_path: &str) -> RawEvent {
        let builder = RawEvent::builder(self.file(new_path)).renamed_from(old_name, old_ext);
        match &self.round {
            Some(round) => builder.delivered_by(round.clone()).build(),
            None => builder.build(),
        }
    }
}
