// src/watch/coalescer.rs

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, trace};

use crate::config::{CoalescerSection, ConfigFile};
use crate::engine::{CoalescerCore, DispatchWorker, DrainTrigger, Resume};
use crate::errors::{CoalesceError, Result};
use crate::fs::{EventKey, FileRef, IdentityResolver};
use crate::types::EventKind;
use crate::watch::filter::AcceptFilter;
use crate::watch::listener::FileChangeListener;
use crate::watch::raw_event::RawEvent;

/// Public entry point: receives raw file events, coalesces them per path and
/// forwards the result to a downstream [`FileChangeListener`] from a single
/// dispatch thread.
///
/// Sources call the [`FileChangeListener`] methods (or [`register`] /
/// [`rename`] directly) from any thread. Each raw event's delivery-over hook
/// schedules a drain, so the downstream listener sees one coalesced event per
/// path once the notification round that produced it is over.
///
/// [`register`]: FileEventCoalescer::register
/// [`rename`]: FileEventCoalescer::rename
pub struct FileEventCoalescer {
    core: Arc<CoalescerCore>,
    worker: DispatchWorker,
    trigger: DrainTrigger,
    filter: AcceptFilter,
    forward_attribute_changes: bool,
}

impl fmt::Debug for FileEventCoalescer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileEventCoalescer")
            .field("filter", &self.filter)
            .field("forward_attribute_changes", &self.forward_attribute_changes)
            .field("pending", &self.core.pending_len())
            .field("suspend_count", &self.core.suspend_count())
            .finish_non_exhaustive()
    }
}

impl FileEventCoalescer {
    /// Coalescer with default settings apart from `remote_only`.
    pub fn new(
        listener: Arc<dyn FileChangeListener>,
        resolver: Arc<dyn IdentityResolver>,
        remote_only: bool,
    ) -> Result<Self> {
        let settings = CoalescerSection {
            remote_only,
            ..CoalescerSection::default()
        };
        Self::with_settings(listener, resolver, &settings)
    }

    pub fn with_settings(
        listener: Arc<dyn FileChangeListener>,
        resolver: Arc<dyn IdentityResolver>,
        settings: &CoalescerSection,
    ) -> Result<Self> {
        let core = Arc::new(CoalescerCore::new(
            listener,
            resolver,
            settings.invariant_policy,
        ));
        let worker = DispatchWorker::spawn(Arc::clone(&core), &settings.worker_thread_name)?;
        let trigger = worker.trigger();

        debug!(
            remote_only = settings.remote_only,
            forward_attribute_changes = settings.forward_attribute_changes,
            "file event coalescer created"
        );

        Ok(Self {
            core,
            worker,
            trigger,
            filter: AcceptFilter::new(settings.remote_only),
            forward_attribute_changes: settings.forward_attribute_changes,
        })
    }

    /// Build from a validated config, using the built-in path resolver
    /// described by its `[resolver]` section.
    pub fn from_config(listener: Arc<dyn FileChangeListener>, config: &ConfigFile) -> Result<Self> {
        let resolver = Arc::new(config.resolver.build());
        Self::with_settings(listener, resolver, &config.coalescer)
    }

    /// Merge `(kind, raw)` into the pending state of the event's path and
    /// schedule a drain for when `raw`'s delivery round is over.
    ///
    /// Fails only for kinds that have no row in the merge table
    /// (`Suppressed`); nothing is stored in that case.
    pub fn register(&self, kind: EventKind, raw: &RawEvent) -> Result<()> {
        let key = self.core.key_for(raw.file());
        self.core.merge_into_table(key, kind, raw)?;
        self.drain_when_delivered(raw);
        Ok(())
    }

    /// Register a rename as a delete at the old path plus a create at the new
    /// path, with one drain hook for both.
    ///
    /// The delete half carries a sibling of `raw` whose file is a
    /// placeholder for the old path.
    pub fn rename(&self, raw: &RawEvent) -> Result<()> {
        let old_path = raw.old_path().ok_or(CoalesceError::MissingRenameInfo)?;
        let resolver = self.core.resolver();
        let placeholder = resolver.placeholder_for(raw.file().filesystem(), &old_path);
        let old_key = resolver.key_for(&placeholder);
        let old_half = raw.with_file(placeholder);

        trace!(from = %old_key, to = %raw.file().path().display(), "registering rename");

        let new_key = self.core.key_for(raw.file());
        self.core.merge_rename(old_key, &old_half, new_key, raw)?;

        self.drain_when_delivered(raw);
        Ok(())
    }

    /// Start holding back delete-like events. Calls nest; every call must be
    /// paired with [`FileEventCoalescer::resume_removes`].
    pub fn suspend_removes(&self) {
        self.core.suspend();
    }

    /// Undo one [`FileEventCoalescer::suspend_removes`]. The last resume
    /// releases held-back events immediately. Unbalanced calls are reported
    /// and ignored.
    pub fn resume_removes(&self) {
        if self.core.resume() == Resume::Released {
            self.trigger.fire();
        }
    }

    /// Drain on the dispatch worker and block until it has finished.
    ///
    /// Intended for shutdown and tests. Must not be called from inside an
    /// async runtime; use [`FileEventCoalescer::flush_async`] there.
    pub fn flush(&self) -> Result<()> {
        self.worker.flush().map(|_| ())
    }

    pub async fn flush_async(&self) -> Result<()> {
        self.worker.flush_async().await.map(|_| ())
    }

    pub fn pending_len(&self) -> usize {
        self.core.pending_len()
    }

    /// Kind currently pending for `file`, if any.
    pub fn pending_kind(&self, file: &FileRef) -> Option<EventKind> {
        self.core.pending_kind(&self.core.key_for(file))
    }

    pub fn key_for(&self, file: &FileRef) -> EventKey {
        self.core.key_for(file)
    }

    pub fn suspend_count(&self) -> usize {
        self.core.suspend_count()
    }

    /// Number of unexpected event sequences and unbalanced resumes seen.
    pub fn violation_count(&self) -> u64 {
        self.core.violation_count()
    }

    fn drain_when_delivered(&self, raw: &RawEvent) {
        let trigger = self.trigger.clone();
        raw.on_delivery_over(Box::new(move || trigger.fire()));
    }

    fn accept_and_register(&self, kind: EventKind, raw: &RawEvent) {
        if !self.filter.accept(self.core.resolver(), raw) {
            trace!(%kind, file = %raw.file().path().display(), "event filtered out");
            return;
        }
        if let Err(err) = self.register(kind, raw) {
            error!(%kind, error = %err, "failed to register file event");
        }
    }
}

impl FileChangeListener for FileEventCoalescer {
    fn file_changed(&self, event: &RawEvent) {
        self.accept_and_register(EventKind::Changed, event);
    }

    fn file_data_created(&self, event: &RawEvent) {
        self.accept_and_register(EventKind::Created, event);
    }

    fn file_deleted(&self, event: &RawEvent) {
        self.accept_and_register(EventKind::Deleted, event);
    }

    fn file_folder_created(&self, event: &RawEvent) {
        self.accept_and_register(EventKind::FolderCreated, event);
    }

    fn file_renamed(&self, event: &RawEvent) {
        if !self.filter.accept(self.core.resolver(), event) {
            return;
        }
        if let Err(err) = self.rename(event) {
            error!(error = %err, "failed to register rename");
        }
    }

    fn file_attribute_changed(&self, event: &RawEvent) {
        if self.forward_attribute_changes {
            self.accept_and_register(EventKind::AttributeChanged, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockResolver;
    use crate::fs::FileSystemId;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Paths(Mutex<Vec<(String, PathBuf)>>);

    impl FileChangeListener for Paths {
        fn file_changed(&self, event: &RawEvent) {
            self.push("changed", event);
        }
        fn file_deleted(&self, event: &RawEvent) {
            self.push("deleted", event);
        }
        fn file_renamed(&self, event: &RawEvent) {
            self.push("renamed", event);
        }
    }

    impl Paths {
        fn push(&self, what: &str, event: &RawEvent) {
            self.0
                .lock()
                .unwrap()
                .push((what.to_string(), event.file().path().to_path_buf()));
        }
    }

    fn file(path: &str) -> FileRef {
        FileRef::new(FileSystemId::new("local"), path)
    }

    #[test]
    fn aliased_paths_coalesce_under_one_key() {
        let resolver = MockResolver::new();
        resolver.add_alias("/link/a", "/real/a");
        let listener = Arc::new(Paths::default());
        let coalescer =
            FileEventCoalescer::new(listener.clone(), Arc::new(resolver), false).unwrap();

        coalescer.suspend_removes();
        coalescer.file_deleted(&RawEvent::new(file("/real/a")));
        coalescer.file_data_created(&RawEvent::new(file("/link/a")));
        coalescer.resume_removes();
        coalescer.flush().unwrap();

        let seen = listener.0.lock().unwrap().clone();
        assert_eq!(seen, vec![("changed".to_string(), PathBuf::from("/link/a"))]);
    }

    #[test]
    fn rename_asks_the_resolver_for_a_placeholder() {
        let resolver = MockResolver::new();
        let listener = Arc::new(Paths::default());
        let coalescer =
            FileEventCoalescer::new(listener.clone(), Arc::new(resolver.clone()), false).unwrap();

        let raw = RawEvent::builder(file("/dir/new.txt"))
            .renamed_from("old", "txt")
            .build();
        coalescer.file_renamed(&raw);
        coalescer.flush().unwrap();

        assert_eq!(resolver.placeholders(), vec![PathBuf::from("/dir/old.txt")]);
        let seen = listener.0.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                ("deleted".to_string(), PathBuf::from("/dir/old.txt")),
                ("renamed".to_string(), PathBuf::from("/dir/new.txt")),
            ]
        );
    }

    #[test]
    fn remote_only_consults_the_resolver() {
        let resolver = MockResolver::new();
        let remote = FileSystemId::new("remote");
        resolver.set_remote(&remote, true);
        let listener = Arc::new(Paths::default());
        let coalescer = FileEventCoalescer::new(listener.clone(), Arc::new(resolver), true).unwrap();

        coalescer.file_changed(&RawEvent::new(file("/a")));
        coalescer.file_changed(&RawEvent::new(FileRef::new(remote, "/b")));
        coalescer.flush().unwrap();

        let seen = listener.0.lock().unwrap().clone();
        assert_eq!(seen, vec![("changed".to_string(), PathBuf::from("/b"))]);
    }
}
