// src/watch/filter.rs

use tracing::trace;

use crate::fs::IdentityResolver;
use crate::watch::RawEvent;

/// Decides which raw events enter the coalescer at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptFilter {
    remote_only: bool,
}

impl AcceptFilter {
    pub fn new(remote_only: bool) -> Self {
        Self { remote_only }
    }

    /// With `remote_only`, accept only events on remote filesystems. Events
    /// whose filesystem cannot be resolved are accepted.
    pub fn accept(&self, resolver: &dyn IdentityResolver, event: &RawEvent) -> bool {
        if !self.remote_only {
            return true;
        }

        match resolver.is_remote(event.file()) {
            Some(remote) => remote,
            None => {
                trace!(
                    file = %event.file().path().display(),
                    "could not resolve owning filesystem; accepting event"
                );
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockResolver;
    use crate::fs::{FileRef, FileSystemId};

    #[test]
    fn disabled_filter_accepts_everything() {
        let resolver = MockResolver::new();
        let event = RawEvent::new(FileRef::new(FileSystemId::new("local"), "/a"));
        assert!(AcceptFilter::new(false).accept(&resolver, &event));
    }

    #[test]
    fn remote_only_filters_local_and_fails_open() {
        let resolver = MockResolver::new();
        let remote = FileSystemId::new("sftp");
        let lost = FileSystemId::new("lost");
        resolver.set_remote(&remote, true);
        resolver.set_unresolvable(&lost);

        let filter = AcceptFilter::new(true);
        let local_event = RawEvent::new(FileRef::new(FileSystemId::new("local"), "/a"));
        let remote_event = RawEvent::new(FileRef::new(remote, "/a"));
        let lost_event = RawEvent::new(FileRef::new(lost, "/a"));

        assert!(!filter.accept(&resolver, &local_event));
        assert!(filter.accept(&resolver, &remote_event));
        assert!(filter.accept(&resolver, &lost_event));
    }
}
