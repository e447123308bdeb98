// src/engine/table.rs

use std::collections::{BTreeMap, HashMap};

use crate::engine::merge::EventRecord;
use crate::fs::EventKey;

/// Pending records keyed by [`EventKey`], in first-insertion order.
///
/// Replacing the record of a key keeps its position; removing a key and
/// inserting it again moves it to the end. Each key gets a sequence number on
/// insertion, so removal does not scan the table.
#[derive(Debug, Default)]
pub struct PendingTable {
    order: BTreeMap<u64, EventKey>,
    records: HashMap<EventKey, (u64, EventRecord)>,
    next_seq: u64,
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &EventKey) -> Option<&EventRecord> {
        self.records.get(key).map(|(_, record)| record)
    }

    /// Store `record` for `key`, replacing in place if the key is pending.
    pub fn upsert(&mut self, key: EventKey, record: EventRecord) {
        if let Some((_, slot)) = self.records.get_mut(&key) {
            *slot = record;
            return;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, key.clone());
        self.records.insert(key, (seq, record));
    }

    pub fn remove(&mut self, key: &EventKey) -> Option<EventRecord> {
        let (seq, removed) = self.records.remove(key)?;
        self.order.remove(&seq);
        Some(removed)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&EventKey, &EventRecord)> {
        self.order
            .values()
            .filter_map(|key| self.records.get(key).map(|(_, record)| (key, record)))
    }

    /// Consume the table, returning its entries in insertion order.
    pub fn into_entries(mut self) -> Vec<(EventKey, EventRecord)> {
        let mut entries = Vec::with_capacity(self.records.len());
        for key in self.order.into_values() {
            if let Some((_, record)) = self.records.remove(&key) {
                entries.push((key, record));
            }
        }
        entries
    }

    /// Split the table into `(held, eligible)`.
    ///
    /// `held` keeps every entry for which `hold` returns true, in the same
    /// relative order; `eligible` holds the rest, in insertion order.
    pub fn partition<F>(self, mut hold: F) -> (PendingTable, Vec<(EventKey, EventRecord)>)
    where
        F: FnMut(&EventRecord) -> bool,
    {
        let mut held = PendingTable::new();
        let mut eligible = Vec::new();
        for (key, record) in self.into_entries() {
            if hold(&record) {
                held.upsert(key, record);
            } else {
                eligible.push((key, record));
            }
        }
        (held, eligible)
    }
}
