// src/watch/mod.rs

//! Raw-event side of the coalescer.
//!
//! This module is responsible for:
//! - The raw event handle and its delivery-over hook.
//! - The listener interface shared by sources and consumers.
//! - The remote-only accept filter.
//! - The [`FileEventCoalescer`] façade that sources talk to.
//!
//! It does **not** produce raw events; whoever watches the filesystem calls
//! into it.

pub mod coalescer;
pub mod delivery;
pub mod filter;
pub mod listener;
pub mod raw_event;

pub use coalescer::FileEventCoalescer;
pub use delivery::{DeliveryCallback, DeliveryNotifier, DeliveryRound, ImmediateDelivery};
pub use filter::AcceptFilter;
pub use listener::FileChangeListener;
pub use raw_event::{RawEvent, RawEventBuilder, RenameInfo};
