use std::path::PathBuf;

use alloy_network::Ethereum;
use alloy_primitives::Address;
use alloy_provider::{ProviderBuilder, RootProvider};
use alloy_transport::BoxTransport;
use clap::Parser;
use eyre::{OptionExt, Result};
use slotscope_engine::{Inspector, Snapshot, TreeNode};
use slotscope_utils::{artifact::load_storage_layout, rpc::RpcSlotReader};
use yansi::Paint;

type Reader = RpcSlotReader<RootProvider<BoxTransport>, BoxTransport, Ethereum>;

#[derive(Debug, Clone, Parser)]
pub struct InspectArgs {
    /// The contract address to inspect.
    pub address: Address,

    /// Path to the storage layout JSON (a bare solc layout or a forge
    /// artifact containing one).
    #[arg(long, value_name = "FILE")]
    pub layout: PathBuf,

    /// The RPC endpoint to read storage from.
    #[arg(
        long,
        env = "ETH_RPC_URL",
        default_value = "http://127.0.0.1:8545",
        value_name = "URL"
    )]
    pub rpc_url: String,

    /// Read storage at this block instead of latest.
    #[arg(long, short = 'B', value_name = "BLOCK")]
    pub block: Option<u64>,

    /// Pretty-print the tree instead of emitting JSON.
    #[arg(long)]
    pub pretty: bool,
}

impl InspectArgs {
    pub async fn run(self) -> Result<()> {
        let inspector = self.inspector().await?;
        let snapshot = inspector.refresh().await.ok_or_eyre("refresh was superseded")?;
        print_snapshot(&snapshot, self.pretty)
    }

    pub(crate) async fn inspector(&self) -> Result<Inspector<Reader>> {
        let layout = load_storage_layout(&self.layout)?;
        debug!(address = %self.address, rpc = %self.rpc_url, "connecting");

        let provider: RootProvider<BoxTransport> =
            ProviderBuilder::new().on_builtin(&self.rpc_url).await?;
        let mut reader = RpcSlotReader::new(provider, self.address);
        if let Some(block) = self.block {
            reader = reader.with_block(block.into());
        }
        Ok(Inspector::new(layout, reader))
    }
}

pub(crate) fn print_snapshot(snapshot: &Snapshot, pretty: bool) -> Result<()> {
    if snapshot.skipped > 0 {
        warn!(skipped = snapshot.skipped, "undecodable storage entries were skipped");
    }
    if pretty {
        for node in &snapshot.tree {
            print_node(node, 0);
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&snapshot.tree)?);
    }
    Ok(())
}

fn print_node(node: &TreeNode, indent: usize) {
    println!(
        "{:indent$}{} @ {} = {}",
        "",
        node.label.bold(),
        node.slot.to_string().yellow(),
        node.value
    );
    if let Some(children) = &node.nested_storage {
        for child in children {
            print_node(child, indent + 2);
        }
    }
}
