// src/config/model.rs

use std::collections::HashSet;

use serde::Deserialize;

use crate::fs::{FileSystemId, PathResolver};
use crate::types::{InvariantPolicy, LogLevel};

/// Default name of the dispatch worker thread.
pub const DEFAULT_WORKER_THREAD_NAME: &str = "fs-event-dispatch";

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [coalescer]
/// remote_only = false
/// forward_attribute_changes = false
/// invariant_policy = "log"
/// worker_thread_name = "fs-event-dispatch"
///
/// [resolver]
/// remote_filesystems = ["sftp://build-host"]
///
/// [logging]
/// level = "debug"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub coalescer: CoalescerSection,

    #[serde(default)]
    pub resolver: ResolverSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

/// Validated configuration. Build it through `TryFrom<RawConfigFile>` (see
/// `validate.rs`) or [`crate::config::load_and_validate`].
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub coalescer: CoalescerSection,
    pub resolver: ResolverSection,
    pub logging: LoggingSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        coalescer: CoalescerSection,
        resolver: ResolverSection,
        logging: LoggingSection,
    ) -> Self {
        Self {
            coalescer,
            resolver,
            logging,
        }
    }
}

/// `[coalescer]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoalescerSection {
    /// Only register events whose file lives on a remote filesystem.
    #[serde(default)]
    pub remote_only: bool,

    /// Register attribute-change notifications as `AttributeChanged`
    /// instead of ignoring them.
    #[serde(default)]
    pub forward_attribute_changes: bool,

    /// `"log"` (default) or `"panic"`.
    #[serde(default)]
    pub invariant_policy: InvariantPolicy,

    #[serde(default = "default_worker_thread_name")]
    pub worker_thread_name: String,
}

fn default_worker_thread_name() -> String {
    DEFAULT_WORKER_THREAD_NAME.to_string()
}

impl Default for CoalescerSection {
    fn default() -> Self {
        Self {
            remote_only: false,
            forward_attribute_changes: false,
            invariant_policy: InvariantPolicy::default(),
            worker_thread_name: default_worker_thread_name(),
        }
    }
}

/// `[resolver]` section, consumed by the built-in [`PathResolver`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverSection {
    /// Filesystem ids treated as remote.
    #[serde(default)]
    pub remote_filesystems: Vec<String>,

    /// Filesystem ids whose remoteness cannot be determined. Events on them
    /// always pass the remote-only filter.
    #[serde(default)]
    pub unresolvable_filesystems: Vec<String>,
}

impl ResolverSection {
    pub fn build(&self) -> PathResolver {
        let mut resolver = PathResolver::with_remote(&self.remote_filesystems);
        for name in &self.unresolvable_filesystems {
            resolver.mark_unresolvable(FileSystemId::new(name));
        }
        resolver
    }

    pub(crate) fn duplicate_remote(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.remote_filesystems
            .iter()
            .find(|name| !seen.insert(name.as_str()))
            .map(String::as_str)
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Overrides `FSEVENT_COALESCE_LOG` when set.
    #[serde(default)]
    pub level: Option<LogLevel>,
}
