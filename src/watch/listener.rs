// src/watch/listener.rs

use crate::watch::raw_event::RawEvent;

/// Receiver of file change notifications.
///
/// The same shape is used on both sides of the coalescer: sources call these
/// methods on a [`crate::FileEventCoalescer`], and the coalescer calls them
/// on its downstream listener from the dispatch worker. All methods default
/// to doing nothing.
pub trait FileChangeListener: Send + Sync {
    fn file_changed(&self, _event: &RawEvent) {}

    fn file_data_created(&self, _event: &RawEvent) {}

    fn file_deleted(&self, _event: &RawEvent) {}

    fn file_folder_created(&self, _event: &RawEvent) {}

    /// `event.rename()` carries the previous name and extension.
    fn file_renamed(&self, _event: &RawEvent) {}

    fn file_attribute_changed(&self, _event: &RawEvent) {}
}
