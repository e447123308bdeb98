use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use fsevent_coalesce::{FileChangeListener, RawEvent};

/// Which listener method was called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Changed,
    DataCreated,
    Deleted,
    FolderCreated,
    Renamed,
    AttributeChanged,
}

impl CallKind {
    fn label(self) -> &'static str {
        match self {
            CallKind::Changed => "changed",
            CallKind::DataCreated => "created",
            CallKind::Deleted => "deleted",
            CallKind::FolderCreated => "folder",
            CallKind::Renamed => "renamed",
            CallKind::AttributeChanged => "attr",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub kind: CallKind,
    pub path: PathBuf,
    pub thread: Option<String>,
    pub event: RawEvent,
}

/// A listener that records every callback, and notices if two callbacks
/// ever overlap.
#[derive(Debug, Default)]
pub struct RecordingListener {
    calls: Mutex<Vec<RecordedCall>>,
    arrived: Condvar,
    in_callback: AtomicBool,
    overlaps: AtomicUsize,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, kind: CallKind, event: &RawEvent) {
        if self.in_callback.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }

        let call = RecordedCall {
            kind,
            path: event.file().path().to_path_buf(),
            thread: std::thread::current().name().map(str::to_string),
            event: event.clone(),
        };
        self.calls.lock().unwrap().push(call);

        self.in_callback.store(false, Ordering::SeqCst);
        self.arrived.notify_all();
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls rendered as `"<kind> <path>"`, in order.
    pub fn summary(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| format!("{} {}", c.kind.label(), c.path.display()))
            .collect()
    }

    /// Like [`RecordingListener::summary`], clearing the record.
    pub fn take_summary(&self) -> Vec<String> {
        let summary = self.summary();
        self.calls.lock().unwrap().clear();
        summary
    }

    pub fn len(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of times a callback started while another was still running.
    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }

    /// Block until at least `n` calls were recorded or `timeout` passed.
    /// Returns whether the count was reached.
    pub fn wait_for(&self, n: usize, timeout: Duration) -> bool {
        let guard = self.calls.lock().unwrap();
        let (guard, _) = self
            .arrived
            .wait_timeout_while(guard, timeout, |calls| calls.len() < n)
            .unwrap();
        guard.len() >= n
    }
}

impl FileChangeListener for RecordingListener {
    fn file_changed(&self, event: &RawEvent) {
        self.record(CallKind::Changed, event);
    }

    fn file_data_created(&self, event: &RawEvent) {
        self.record(CallKind::DataCreated, event);
    }

    fn file_deleted(&self, event: &RawEvent) {
        self.record(CallKind::Deleted, event);
    }

    fn file_folder_created(&self, event: &RawEvent) {
        self.record(CallKind::FolderCreated, event);
    }

    fn file_renamed(&self, event: &RawEvent) {
        self.record(CallKind::Renamed, event);
    }

    fn file_attribute_changed(&self, event: &RawEvent) {
        self.record(CallKind::AttributeChanged, event);
    }
}
