// src/lib.rs

//! Filesystem-change event coalescing.
//!
//! Raw per-file notifications (changed / created / deleted / folder created /
//! renamed) arrive on arbitrary threads, possibly duplicated or reordered.
//! [`FileEventCoalescer`] merges them per path through a fixed transition
//! table and delivers one consistent event per path to a downstream
//! [`FileChangeListener`] from a single dispatch thread.
//!
//! Delete-like events can be held back with
//! [`FileEventCoalescer::suspend_removes`], so that a delete followed by a
//! re-create surfaces as a single "changed" event.
//!
//! ```no_run
//! use std::sync::Arc;
//! use fsevent_coalesce::{FileChangeListener, FileEventCoalescer, RawEvent};
//! use fsevent_coalesce::fs::{FileRef, FileSystemId, PathResolver};
//!
//! struct Printer;
//! impl FileChangeListener for Printer {
//!     fn file_changed(&self, event: &RawEvent) {
//!         println!("changed: {}", event.file().path().display());
//!     }
//! }
//!
//! # fn main() -> fsevent_coalesce::errors::Result<()> {
//! let coalescer = FileEventCoalescer::new(Arc::new(Printer), Arc::new(PathResolver::new()), false)?;
//! let local = FileSystemId::new("local");
//! coalescer.file_changed(&RawEvent::new(FileRef::new(local, "/src/main.rs")));
//! coalescer.flush()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

pub use crate::errors::{CoalesceError, Result};
pub use crate::types::EventKind;
pub use crate::watch::{
    DeliveryRound, FileChangeListener, FileEventCoalescer, ImmediateDelivery, RawEvent,
};

/// Load and validate the config at `config_path`, then build a coalescer
/// that forwards to `listener`.
///
/// When the config has a `[logging] level`, a global subscriber is installed
/// through [`logging::init_logging`]. A subscriber the application installed
/// earlier is left in place.
pub fn open(
    config_path: impl AsRef<Path>,
    listener: Arc<dyn FileChangeListener>,
) -> Result<FileEventCoalescer> {
    let config_path = config_path.as_ref();
    let cfg = config::load_and_validate(config_path)?;

    if let Some(level) = cfg.logging.level {
        if let Err(err) = logging::init_logging(Some(level)) {
            debug!(error = %err, "tracing subscriber already installed; keeping it");
        }
    }

    info!(config = %config_path.display(), "building file event coalescer");
    FileEventCoalescer::from_config(listener, &cfg)
}
