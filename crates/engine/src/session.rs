//! Refresh sessions over one contract's storage.
//!
//! Every refresh rebuilds the tree from scratch against current chain state.
//! Refreshes are epoch-guarded: when a newer refresh starts while an older
//! traversal is still in flight, the older result is discarded instead of
//! clobbering the newer tree with stale reads.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    layout::StorageLayout,
    reader::SlotReader,
    tree::{build_tree, TreeNode},
    walker::StorageWalker,
};

/// One fully decoded view of a contract's storage.
#[derive(Debug)]
pub struct Snapshot {
    pub tree: Vec<TreeNode>,
    /// Entries the traversal could not decode (unrecognized types, struct
    /// elements of fixed arrays).
    pub skipped: usize,
}

/// Owns the layout and the injected reader, and serializes refreshes through
/// a monotonically increasing epoch.
#[derive(Debug)]
pub struct Inspector<R> {
    layout: StorageLayout,
    reader: R,
    epoch: AtomicU64,
}

impl<R: SlotReader> Inspector<R> {
    pub fn new(layout: StorageLayout, reader: R) -> Self {
        Self { layout, reader, epoch: AtomicU64::new(0) }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Walks the full storage layout and rebuilds the tree.
    ///
    /// Returns `None` when another refresh superseded this one while its
    /// traversal was still in flight.
    pub async fn refresh(&self) -> Option<Snapshot> {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        let traversal = StorageWalker::new(&self.layout, &self.reader).walk_storage().await;

        if self.epoch.load(Ordering::SeqCst) != epoch {
            debug!(epoch, "refresh superseded mid-flight, discarding traversal");
            return None;
        }
        if traversal.skipped > 0 {
            debug!(skipped = traversal.skipped, "traversal skipped undecodable entries");
        }
        Some(Snapshot { tree: build_tree(traversal.records), skipped: traversal.skipped })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use alloy_primitives::{B256, U256};
    use async_trait::async_trait;
    use eyre::Result;
    use tokio::sync::Notify;

    use super::*;
    use crate::reader::StaticSlotReader;

    fn single_uint_layout() -> StorageLayout {
        serde_json::from_value(serde_json::json!({
            "storage": [ { "label": "total", "slot": "0", "type": "t_uint256" } ],
            "types": {
                "t_uint256": { "encoding": "inplace", "label": "uint256", "numberOfBytes": "32" }
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn refresh_produces_a_snapshot() {
        let mut reader = StaticSlotReader::new();
        reader.set_uint(U256::ZERO, 7);
        let inspector = Inspector::new(single_uint_layout(), reader);

        let snapshot = inspector.refresh().await.unwrap();
        assert_eq!(snapshot.skipped, 0);
        assert_eq!(snapshot.tree.len(), 1);
        assert_eq!(snapshot.tree[0].label, "total");
        assert_eq!(snapshot.tree[0].value, B256::from(U256::from(7)));
    }

    #[tokio::test]
    async fn superseded_refresh_is_discarded() {
        // The first read of the first refresh parks until released, letting a
        // second refresh start and finish in between.
        struct GatedReader {
            release: Arc<Notify>,
            armed: AtomicBool,
        }

        #[async_trait]
        impl SlotReader for GatedReader {
            async fn read_slot(&self, _slot: U256) -> Result<B256> {
                if self.armed.swap(false, Ordering::SeqCst) {
                    self.release.notified().await;
                }
                Ok(B256::ZERO)
            }
        }

        let release = Arc::new(Notify::new());
        let reader = GatedReader { release: release.clone(), armed: AtomicBool::new(true) };
        let inspector = Arc::new(Inspector::new(single_uint_layout(), reader));

        let stale = tokio::spawn({
            let inspector = inspector.clone();
            async move { inspector.refresh().await }
        });
        // Let the stale refresh claim its epoch and park on the gated read.
        tokio::task::yield_now().await;

        let fresh = inspector.refresh().await;
        assert!(fresh.is_some());

        release.notify_one();
        assert!(stale.await.unwrap().is_none());
    }
}
