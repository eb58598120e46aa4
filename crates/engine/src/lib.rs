//! # slotscope-engine
//!
//! Decodes a contract's on-chain storage into a nested, human-readable tree,
//! driven by the compiler-emitted storage layout metadata.

#[macro_use]
extern crate tracing;

pub mod coalesce;
pub mod layout;
pub mod reader;
pub mod resolver;
pub mod session;
pub mod tree;
pub mod walker;

pub use layout::StorageLayout;
pub use reader::SlotReader;
pub use session::{Inspector, Snapshot};
pub use tree::{build_tree, TreeNode};
pub use walker::{SlotRecord, StorageWalker, Traversal};
