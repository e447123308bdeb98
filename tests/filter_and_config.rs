// tests/filter_and_config.rs
mod common;
use crate::common::{coalescer_with, init_tracing, EventFactory, RecordingListener, TestResult};

use std::fs;
use std::sync::Arc;

use fsevent_coalesce::config::{load_and_validate, parse_str, CoalescerSection, ConfigFile};
use fsevent_coalesce::types::InvariantPolicy;
use fsevent_coalesce::{CoalesceError, DeliveryRound, FileChangeListener, FileEventCoalescer};

fn remote_only() -> CoalescerSection {
    CoalescerSection {
        remote_only: true,
        ..CoalescerSection::default()
    }
}

#[test]
fn remote_only_drops_local_events() -> TestResult {
    let (coalescer, listener) = coalescer_with(&["sftp"], remote_only());

    coalescer.file_changed(&EventFactory::local().event("/p/local"));
    coalescer.file_changed(&EventFactory::new("sftp").event("/p/remote"));
    coalescer.flush()?;

    assert_eq!(listener.summary(), vec!["changed /p/remote"]);
    Ok(())
}

#[test]
fn remote_only_accepts_unresolvable_filesystems() -> TestResult {
    let (coalescer, listener) = coalescer_with(&["sftp"], remote_only());

    // An empty filesystem id cannot be resolved.
    coalescer.file_deleted(&EventFactory::new("").event("/p/unknown"));
    coalescer.flush()?;

    assert_eq!(listener.summary(), vec!["deleted /p/unknown"]);
    Ok(())
}

#[test]
fn direct_register_bypasses_the_filter() -> TestResult {
    let (coalescer, listener) = coalescer_with(&[], remote_only());

    coalescer.register(
        fsevent_coalesce::EventKind::Changed,
        &EventFactory::local().event("/p/a"),
    )?;
    coalescer.flush()?;
    assert_eq!(listener.summary(), vec!["changed /p/a"]);
    Ok(())
}

#[test]
fn attribute_changes_are_ignored_by_default() -> TestResult {
    let (coalescer, listener) = coalescer_with(&[], CoalescerSection::default());
    coalescer.file_attribute_changed(&EventFactory::local().event("/p/a"));
    coalescer.flush()?;
    assert!(listener.is_empty());
    Ok(())
}

#[test]
fn attribute_changes_are_forwarded_when_enabled() -> TestResult {
    let settings = CoalescerSection {
        forward_attribute_changes: true,
        ..CoalescerSection::default()
    };
    let (coalescer, listener) = coalescer_with(&[], settings);
    let round = DeliveryRound::new();
    let events = EventFactory::local().in_round(&round);

    coalescer.file_attribute_changed(&events.event("/p/a"));
    coalescer.file_attribute_changed(&events.event("/p/a"));
    round.finish();
    coalescer.flush()?;
    assert_eq!(listener.take_summary(), vec!["attr /p/a"]);

    // A content change subsumes the attribute change.
    let round = DeliveryRound::new();
    let events = EventFactory::local().in_round(&round);
    coalescer.file_attribute_changed(&events.event("/p/b"));
    coalescer.file_changed(&events.event("/p/b"));
    round.finish();
    coalescer.flush()?;
    assert_eq!(listener.take_summary(), vec!["changed /p/b"]);
    Ok(())
}

#[test]
fn config_file_drives_the_coalescer() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("fsevent-coalesce.toml");
    fs::write(
        &path,
        r#"
[coalescer]
remote_only = true
worker_thread_name = "configured-dispatch"

[resolver]
remote_filesystems = ["nfs"]

[logging]
level = "debug"
"#,
    )?;

    let listener = Arc::new(RecordingListener::new());
    let coalescer = fsevent_coalesce::open(&path, listener.clone())?;

    coalescer.file_changed(&EventFactory::local().event("/p/local"));
    coalescer.file_changed(&EventFactory::new("nfs").event("/p/remote"));
    coalescer.flush()?;

    let calls = listener.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].thread.as_deref(), Some("configured-dispatch"));
    Ok(())
}

#[test]
fn missing_sections_fall_back_to_defaults() -> TestResult {
    let raw = parse_str("")?;
    let cfg = ConfigFile::try_from(raw)?;
    assert!(!cfg.coalescer.remote_only);
    assert!(!cfg.coalescer.forward_attribute_changes);
    assert_eq!(cfg.coalescer.invariant_policy, InvariantPolicy::Log);
    assert!(cfg.resolver.remote_filesystems.is_empty());
    assert!(cfg.logging.level.is_none());
    Ok(())
}

#[test]
fn unknown_fields_are_rejected() {
    let err = parse_str("[coalescer]\nremote_olny = true\n").unwrap_err();
    assert!(matches!(err, CoalesceError::TomlError(_)));
}

#[test]
fn invalid_config_on_disk_is_reported() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[resolver]\nremote_filesystems = [\"a\", \"a\"]\n")?;

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, CoalesceError::ConfigError(_)));
    Ok(())
}

#[test]
fn missing_config_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = load_and_validate(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, CoalesceError::IoError(_)));
}

#[test]
fn from_config_uses_invariant_policy() -> TestResult {
    let raw = parse_str("[coalescer]\ninvariant_policy = \"panic\"\n")?;
    let cfg = ConfigFile::try_from(raw)?;
    assert_eq!(cfg.coalescer.invariant_policy, InvariantPolicy::Panic);

    let listener = Arc::new(RecordingListener::new());
    let coalescer = FileEventCoalescer::from_config(listener, &cfg)?;
    coalescer.flush()?;
    Ok(())
}
