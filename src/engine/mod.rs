// src/engine/mod.rs

//! Coalescing engine.
//!
//! - [`merge`]: the pure transition table.
//! - [`table`]: the insertion-ordered pending table.
//! - [`suspend`]: the "hold removes" reference count.
//! - [`report`]: reporting of recoverable invariant violations.
//! - [`core`]: the lock-owning synchronous core tying the above together.
//! - [`dispatch`]: the single worker thread that drains the core.

pub mod core;
pub mod dispatch;
pub mod merge;
pub mod report;
pub mod suspend;
pub mod table;

pub use self::core::CoalescerCore;
pub use dispatch::{DispatchWorker, DrainTrigger};
pub use merge::{merge, transition, EventRecord, Merged, Transition};
pub use report::ViolationReporter;
pub use suspend::{Resume, SuspendCounter};
pub use table::PendingTable;
