//! Insertion-ordered slot map with packed-field coalescing.

use alloy_primitives::U256;
use rustc_hash::FxHashMap;

use crate::walker::SlotRecord;

/// Maps each slot number to the single record representing it, preserving
/// first-insertion order for output.
///
/// Slots are keyed by their big-integer value, so `5` and `05` can never
/// produce two records. When several packed scalars share a slot, the first
/// one reads the word and later ones only extend its label; the raw value
/// already represents all packed fields jointly.
#[derive(Debug, Default)]
pub struct SlotMap {
    records: Vec<SlotRecord>,
    index: FxHashMap<U256, usize>,
}

impl SlotMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Inserts `record`, replacing any existing record at the same slot while
    /// keeping its original position in the output order.
    pub fn insert(&mut self, record: SlotRecord) {
        match self.index.get(&record.slot) {
            Some(&at) => self.records[at] = record,
            None => {
                self.index.insert(record.slot, self.records.len());
                self.records.push(record);
            }
        }
    }

    /// If `slot` already has a record, appends `, <label>` to its label and
    /// returns true; the caller then skips both the read and the insert.
    pub fn coalesce_packed(&mut self, slot: U256, label: &str) -> bool {
        let Some(&at) = self.index.get(&slot) else { return false };
        let existing = &mut self.records[at];
        existing.label.push_str(", ");
        existing.label.push_str(label);
        true
    }

    /// Folds a child traversal's records into this map, in order.
    pub fn merge(&mut self, records: Vec<SlotRecord>) {
        for record in records {
            self.insert(record);
        }
    }

    /// The accumulated records, in first-insertion order.
    pub fn into_records(self) -> Vec<SlotRecord> {
        self.records
    }
}
