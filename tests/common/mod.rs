#![allow(dead_code)]

use std::sync::Arc;

use fsevent_coalesce::FileEventCoalescer;
use fsevent_coalesce::config::CoalescerSection;
use fsevent_coalesce::fs::PathResolver;

pub use fsevent_coalesce_test_utils::builders::EventFactory;
pub use fsevent_coalesce_test_utils::init_tracing;
pub use fsevent_coalesce_test_utils::recording::{CallKind, RecordingListener};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub const WORKER_NAME: &str = "fs-event-dispatch-test";

/// A coalescer over a plain path resolver that knows `remote` filesystems,
/// wired to a fresh recording listener.
pub fn coalescer_with(
    remote: &[&str],
    settings: CoalescerSection,
) -> (FileEventCoalescer, Arc<RecordingListener>) {
    init_tracing();
    let listener = Arc::new(RecordingListener::new());
    let resolver = Arc::new(PathResolver::with_remote(remote.iter().copied()));
    let settings = CoalescerSection {
        worker_thread_name: WORKER_NAME.to_string(),
        ..settings
    };
    let coalescer = FileEventCoalescer::with_settings(listener.clone(), resolver, &settings)
        .expect("coalescer should start");
    (coalescer, listener)
}

pub fn coalescer() -> (FileEventCoalescer, Arc<RecordingListener>) {
    coalescer_with(&[], CoalescerSection::default())
}

pub use fsevent_coalesce_test_utils::with_timeout;
