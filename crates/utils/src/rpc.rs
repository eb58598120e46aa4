use std::marker::PhantomData;

use alloy_network::Network;
use alloy_primitives::{Address, B256, U256};
use alloy_provider::Provider;
use alloy_rpc_types::BlockId;
use alloy_transport::Transport;
use async_trait::async_trait;
use eyre::{Result, WrapErr};
use slotscope_engine::SlotReader;

/// [`SlotReader`] backed by a JSON-RPC provider.
///
/// One `eth_getStorageAt` round-trip per call, no caching and no retries;
/// read deduplication is the traversal's concern. Reads run against latest
/// state unless pinned to a block.
#[derive(Debug, Clone)]
pub struct RpcSlotReader<P, T, N> {
    provider: P,
    address: Address,
    block: Option<BlockId>,
    _marker: PhantomData<fn() -> (T, N)>,
}

impl<P, T, N> RpcSlotReader<P, T, N> {
    /// A reader over the storage of the contract at `address`.
    pub fn new(provider: P, address: Address) -> Self {
        Self { provider, address, block: None, _marker: PhantomData }
    }

    /// Pins every read to `block` instead of latest.
    pub fn with_block(mut self, block: BlockId) -> Self {
        self.block = Some(block);
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

#[async_trait]
impl<P, T, N> SlotReader for RpcSlotReader<P, T, N>
where
    P: Provider<T, N>,
    T: Transport + Clone,
    N: Network,
{
    async fn read_slot(&self, slot: U256) -> Result<B256> {
        trace!(address = %self.address, %slot, "reading storage slot");

        let mut call = self.provider.get_storage_at(self.address, slot);
        if let Some(block) = self.block {
            call = call.block_id(block);
        }
        let word = call.await.wrap_err_with(|| {
            format!("failed to read storage slot {slot} of {}", self.address)
        })?;
        Ok(B256::from(word))
    }
}
