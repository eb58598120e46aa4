//! The slot-read capability and keccak-based slot addressing.
//!
//! Reading a raw storage word is the only I/O the engine performs, and it is
//! injected through [`SlotReader`] so traversals can run against a fake
//! in-memory word store in tests.

use alloy_primitives::{keccak256, B256, U256};
use async_trait::async_trait;
use eyre::Result;
use rustc_hash::FxHashMap;

/// Reads one raw 32-byte word of contract storage per call.
///
/// Implementations perform exactly one read per call and do not cache;
/// deduplication of reads is the traversal's concern.
#[async_trait]
pub trait SlotReader: Send + Sync {
    async fn read_slot(&self, slot: U256) -> Result<B256>;
}

/// Canonical 32-byte big-endian key for a slot number.
pub fn slot_key(slot: U256) -> B256 {
    B256::from(slot)
}

/// First data slot of a dynamic array's elements or a long string's bytes:
/// `keccak256(leftPad32(slot))`, interpreted as a big-endian integer.
pub fn data_slot(slot: U256) -> U256 {
    U256::from_be_bytes(keccak256(slot_key(slot)).0)
}

/// Deterministic in-memory word store.
///
/// Unset slots read as the zero word, matching what an RPC node returns for
/// untouched storage. Used as the test double for [`SlotReader`], and usable
/// for inspecting offline storage snapshots.
#[derive(Debug, Default)]
pub struct StaticSlotReader {
    words: FxHashMap<U256, B256>,
    reads: std::sync::atomic::AtomicUsize,
}

impl StaticSlotReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the raw word stored at `slot`.
    pub fn set(&mut self, slot: U256, value: B256) -> &mut Self {
        self.words.insert(slot, value);
        self
    }

    /// Sets the word at `slot` to the big-endian encoding of `value`.
    pub fn set_uint(&mut self, slot: U256, value: u64) -> &mut Self {
        self.set(slot, B256::from(U256::from(value)))
    }

    /// Number of reads served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl SlotReader for StaticSlotReader {
    async fn read_slot(&self, slot: U256) -> Result<B256> {
        self.reads.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(self.words.get(&slot).copied().unwrap_or(B256::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::b256;

    use super::*;

    #[test]
    fn slot_key_left_pads_to_32_bytes() {
        assert_eq!(slot_key(U256::ZERO), B256::ZERO);
        assert_eq!(
            slot_key(U256::from(0x1234)),
            b256!("0000000000000000000000000000000000000000000000000000000000001234")
        );
        // Close to 256 bits must not overflow or truncate.
        assert_eq!(slot_key(U256::MAX), B256::repeat_byte(0xff));
    }

    #[test]
    fn data_slot_matches_known_keccak_images() {
        // keccak256(leftPad32(0)) and keccak256(leftPad32(1)), the canonical
        // base data slots for variables declared at slots 0 and 1.
        assert_eq!(
            slot_key(data_slot(U256::ZERO)),
            b256!("290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563")
        );
        assert_eq!(
            slot_key(data_slot(U256::from(1))),
            b256!("b10e2d527612073b26eecdfd717e6a320cf44b4afac2b0732d9fcbe2b7fa0cf6")
        );
    }

    #[tokio::test]
    async fn static_reader_returns_zero_for_unset_slots() {
        let mut reader = StaticSlotReader::new();
        reader.set_uint(U256::from(7), 99);

        let set = reader.read_slot(U256::from(7)).await.unwrap();
        let unset = reader.read_slot(U256::from(8)).await.unwrap();
        assert_eq!(set, B256::from(U256::from(99)));
        assert_eq!(unset, B256::ZERO);
        assert_eq!(reader.reads(), 2);
    }
}
