// src/engine/report.rs

//! Reporting of recoverable invariant violations.
//!
//! Violations never stop the coalescer: they are logged, counted, and the
//! caller carries on with its recovery path. Under
//! [`InvariantPolicy::Panic`] debug builds additionally panic so that test
//! suites notice broken upstream event streams.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{error, warn};

use crate::fs::EventKey;
use crate::types::{EventKind, InvariantPolicy};

#[derive(Debug, Default)]
pub struct ViolationReporter {
    policy: InvariantPolicy,
    count: AtomicU64,
}

impl ViolationReporter {
    pub fn new(policy: InvariantPolicy) -> Self {
        Self {
            policy,
            count: AtomicU64::new(0),
        }
    }

    /// Total violations reported so far.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// An incoming event hit an impossible cell of the merge table.
    pub fn invalid_transition(&self, key: &EventKey, incoming: EventKind, previous: EventKind) {
        self.count.fetch_add(1, Ordering::Relaxed);
        error!(
            %key,
            %incoming,
            %previous,
            "unexpected event sequence; adopting incoming event"
        );
        self.escalate(|| format!("unexpected {incoming} after {previous} for {key}"));
    }

    /// `resume_removes` was called with no matching `suspend_removes`.
    pub fn unbalanced_resume(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
        warn!("resume_removes called without matching suspend_removes; ignoring");
        self.escalate(|| "unbalanced resume_removes".to_string());
    }

    fn escalate(&self, message: impl FnOnce() -> String) {
        if cfg!(debug_assertions) && self.policy == InvariantPolicy::Panic {
            panic!("invariant violation: {}", message());
        }
    }
}
