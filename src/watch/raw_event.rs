// src/watch/raw_event.rs

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use crate::fs::FileRef;
use crate::watch::delivery::{DeliveryCallback, DeliveryNotifier, ImmediateDelivery};

/// Previous name of a renamed file, split the way sources report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameInfo {
    pub old_name: String,
    pub old_ext: String,
}

impl RenameInfo {
    /// `name.ext`, or just `name` when the extension is empty.
    pub fn old_file_name(&self) -> String {
        if self.old_ext.is_empty() {
            self.old_name.clone()
        } else {
            format!("{}.{}", self.old_name, self.old_ext)
        }
    }
}

struct RawEventInner {
    file: FileRef,
    expected: bool,
    timestamp: SystemTime,
    rename: Option<RenameInfo>,
    delivery: Arc<dyn DeliveryNotifier>,
}

/// A raw filesystem notification as handed over by the source.
///
/// Cloning is cheap and yields a handle to the *same* event; use
/// [`RawEvent::same_event`] to compare identity.
#[derive(Clone)]
pub struct RawEvent {
    inner: Arc<RawEventInner>,
}

impl fmt::Debug for RawEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawEvent")
            .field("file", &self.inner.file)
            .field("expected", &self.inner.expected)
            .field("timestamp", &self.inner.timestamp)
            .field("rename", &self.inner.rename)
            .finish_non_exhaustive()
    }
}

impl RawEvent {
    /// Event for `file` that is delivered immediately, stamped now.
    pub fn new(file: FileRef) -> Self {
        RawEventBuilder::new(file).build()
    }

    pub fn builder(file: FileRef) -> RawEventBuilder {
        RawEventBuilder::new(file)
    }

    pub fn file(&self) -> &FileRef {
        &self.inner.file
    }

    /// Whether the change was announced in advance by the source (e.g. a
    /// write the application made itself).
    pub fn is_expected(&self) -> bool {
        self.inner.expected
    }

    pub fn timestamp(&self) -> SystemTime {
        self.inner.timestamp
    }

    pub fn rename(&self) -> Option<&RenameInfo> {
        self.inner.rename.as_ref()
    }

    pub fn is_rename(&self) -> bool {
        self.inner.rename.is_some()
    }

    /// Path the file had before a rename: the new path's parent joined with
    /// the old name and extension.
    pub fn old_path(&self) -> Option<PathBuf> {
        let rename = self.inner.rename.as_ref()?;
        let old_file_name = rename.old_file_name();
        Some(match self.inner.file.path().parent() {
            Some(parent) => parent.join(old_file_name),
            None => PathBuf::from(old_file_name),
        })
    }

    /// A sibling event for a different file: same flags, timestamp, rename
    /// info and delivery round, but its own identity.
    pub fn with_file(&self, file: FileRef) -> RawEvent {
        RawEvent {
            inner: Arc::new(RawEventInner {
                file,
                expected: self.inner.expected,
                timestamp: self.inner.timestamp,
                rename: self.inner.rename.clone(),
                delivery: Arc::clone(&self.inner.delivery),
            }),
        }
    }

    /// True when both handles refer to the same underlying notification.
    pub fn same_event(&self, other: &RawEvent) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Run `callback` once this event's notification round is over.
    pub fn on_delivery_over(&self, callback: DeliveryCallback) {
        self.inner.delivery.on_delivery_over(callback);
    }
}

/// Builder for [`RawEvent`].
pub struct RawEventBuilder {
    file: FileRef,
    expected: bool,
    timestamp: Option<SystemTime>,
    rename: Option<RenameInfo>,
    delivery: Arc<dyn DeliveryNotifier>,
}

impl RawEventBuilder {
    pub fn new(file: FileRef) -> Self {
        Self {
            file,
            expected: false,
            timestamp: None,
            rename: None,
            delivery: Arc::new(ImmediateDelivery),
        }
    }

    pub fn expected(mut self, expected: bool) -> Self {
        self.expected = expected;
        self
    }

    pub fn timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Mark the event as a rename from `old_name.old_ext` to the event's file.
    pub fn renamed_from(mut self, old_name: impl Into<String>, old_ext: impl Into<String>) -> Self {
        self.rename = Some(RenameInfo {
            old_name: old_name.into(),
            old_ext: old_ext.into(),
        });
        self
    }

    pub fn delivered_by(mut self, notifier: impl DeliveryNotifier + 'static) -> Self {
        self.delivery = Arc::new(notifier);
        self
    }

    pub fn build(self) -> RawEvent {
        RawEvent {
            inner: Arc::new(RawEventInner {
                file: self.file,
                expected: self.expected,
                timestamp: self.timestamp.unwrap_or_else(SystemTime::now),
                rename: self.rename,
                delivery: self.delivery,
            }),
        }
    }
}
