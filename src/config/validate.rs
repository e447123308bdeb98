// src/config/validate.rs

use tracing::warn;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{CoalesceError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::CoalesceError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.coalescer, raw.resolver, raw.logging))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_worker_thread_name(cfg)?;
    validate_filesystem_names(cfg)?;
    warn_on_ineffective_remote_only(cfg);
    Ok(())
}

fn validate_worker_thread_name(cfg: &RawConfigFile) -> Result<()> {
    let name = &cfg.coalescer.worker_thread_name;
    if name.trim().is_empty() {
        return Err(CoalesceError::ConfigError(
            "[coalescer].worker_thread_name must not be empty".to_string(),
        ));
    }
    if name.contains('\0') {
        return Err(CoalesceError::ConfigError(
            "[coalescer].worker_thread_name must not contain NUL bytes".to_string(),
        ));
    }
    Ok(())
}

fn validate_filesystem_names(cfg: &RawConfigFile) -> Result<()> {
    let resolver = &cfg.resolver;
    let all = resolver
        .remote_filesystems
        .iter()
        .chain(resolver.unresolvable_filesystems.iter());
    for name in all {
        if name.trim().is_empty() {
            return Err(CoalesceError::ConfigError(
                "[resolver] filesystem names must not be empty".to_string(),
            ));
        }
    }

    if let Some(dup) = resolver.duplicate_remote() {
        return Err(CoalesceError::ConfigError(format!(
            "[resolver].remote_filesystems lists '{}' more than once",
            dup
        )));
    }

    if let Some(both) = resolver
        .remote_filesystems
        .iter()
        .find(|name| resolver.unresolvable_filesystems.contains(name))
    {
        return Err(CoalesceError::ConfigError(format!(
            "filesystem '{}' cannot be both remote and unresolvable",
            both
        )));
    }

    Ok(())
}

fn warn_on_ineffective_remote_only(cfg: &RawConfigFile) {
    let resolver = &cfg.resolver;
    if cfg.coalescer.remote_only
        && resolver.remote_filesystems.is_empty()
        && resolver.unresolvable_filesystems.is_empty()
    {
        warn!(
            "[coalescer].remote_only is set but no remote filesystems are configured; \
             the built-in resolver will filter out every event"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{CoalescerSection, ResolverSection};

    fn raw_with(coalescer: CoalescerSection, resolver: ResolverSection) -> RawConfigFile {
        RawConfigFile {
            coalescer,
            resolver,
            ..RawConfigFile::default()
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(ConfigFile::try_from(RawConfigFile::default()).is_ok());
    }

    #[test]
    fn empty_thread_name_is_rejected() {
        let coalescer = CoalescerSection {
            worker_thread_name: "  ".to_string(),
            ..CoalescerSection::default()
        };
        let err = ConfigFile::try_from(raw_with(coalescer, ResolverSection::default())).unwrap_err();
        assert!(matches!(err, CoalesceError::ConfigError(msg) if msg.contains("worker_thread_name")));
    }

    #[test]
    fn duplicate_remote_is_rejected() {
        let resolver = ResolverSection {
            remote_filesystems: vec!["sftp".into(), "nfs".into(), "sftp".into()],
            ..ResolverSection::default()
        };
        let err = ConfigFile::try_from(raw_with(CoalescerSection::default(), resolver)).unwrap_err();
        assert!(matches!(err, CoalesceError::ConfigError(msg) if msg.contains("'sftp'")));
    }

    #[test]
    fn remote_and_unresolvable_overlap_is_rejected() {
        let resolver = ResolverSection {
            remote_filesystems: vec!["sftp".into()],
            unresolvable_filesystems: vec!["sftp".into()],
        };
        assert!(ConfigFile::try_from(raw_with(CoalescerSection::default(), resolver)).is_err());
    }
}
