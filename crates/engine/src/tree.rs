//! Rebuilds the nested tree from the flat, depth-annotated record list.

use alloy_primitives::{B256, U256};
use rustc_hash::FxHashMap;
use serde::{Serialize, Serializer};

use crate::walker::SlotRecord;

/// One node of the nested storage tree, shaped for direct rendering by a
/// generic JSON/tree viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    #[serde(serialize_with = "slot_as_decimal")]
    pub slot: U256,
    pub label: String,
    pub value: B256,
    #[serde(rename = "nestedStorage", skip_serializing_if = "Option::is_none")]
    pub nested_storage: Option<Vec<TreeNode>>,
}

fn slot_as_decimal<S: Serializer>(slot: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(slot)
}

impl From<SlotRecord> for TreeNode {
    fn from(record: SlotRecord) -> Self {
        Self { slot: record.slot, label: record.label, value: record.value, nested_storage: None }
    }
}

/// Nests the flat record list using depth plus emission order.
///
/// A record at depth D becomes a child of the last node seen at depth D - 1;
/// depth-0 records become roots. An orphan whose parent depth was never seen
/// is promoted to a root rather than dropped. The "last node seen at depth"
/// table stores index paths from the root set, so chains of increasing depth
/// nest arbitrarily deep.
pub fn build_tree(records: Vec<SlotRecord>) -> Vec<TreeNode> {
    let mut roots: Vec<TreeNode> = Vec::new();
    let mut last_at_depth: FxHashMap<usize, Vec<usize>> = FxHashMap::default();

    for record in records {
        let depth = record.depth;
        let node = TreeNode::from(record);

        let parent_path =
            if depth == 0 { None } else { last_at_depth.get(&(depth - 1)).cloned() };
        let attached = match parent_path {
            Some(path) => attach(&mut roots, &path, node),
            None => Err(node),
        };
        let path = match attached {
            Ok(path) => path,
            // Malformed nesting: promote to root.
            Err(node) => {
                roots.push(node);
                vec![roots.len() - 1]
            }
        };
        last_at_depth.insert(depth, path);
    }

    roots
}

/// Appends `node` to the children of the node at `path`, returning the new
/// child's path, or gives the node back when the path no longer resolves.
fn attach(roots: &mut [TreeNode], path: &[usize], node: TreeNode) -> Result<Vec<usize>, TreeNode> {
    let Some(parent) = node_at_mut(roots, path) else { return Err(node) };
    let children = parent.nested_storage.get_or_insert_with(Vec::new);
    children.push(node);
    let mut child_path = path.to_vec();
    child_path.push(children.len() - 1);
    Ok(child_path)
}

fn node_at_mut<'t>(roots: &'t mut [TreeNode], path: &[usize]) -> Option<&'t mut TreeNode> {
    let (&first, rest) = path.split_first()?;
    let mut node = roots.get_mut(first)?;
    for &index in rest {
        node = node.nested_storage.as_mut()?.get_mut(index)?;
    }
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(label: &str, depth: usize) -> SlotRecord {
        SlotRecord {
            slot: U256::from(label.as_bytes()[0] as u64),
            label: label.to_string(),
            value: B256::ZERO,
            depth,
        }
    }

    fn labels(nodes: &[TreeNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.label.as_str()).collect()
    }

    #[test]
    fn nests_children_under_the_preceding_shallower_record() {
        let tree = build_tree(vec![
            record("A", 0),
            record("B", 1),
            record("C", 1),
            record("D", 0),
        ]);

        assert_eq!(labels(&tree), ["A", "D"]);
        let children = tree[0].nested_storage.as_ref().unwrap();
        assert_eq!(labels(children), ["B", "C"]);
        assert!(tree[1].nested_storage.is_none());
    }

    #[test]
    fn deep_chains_nest_recursively() {
        let tree = build_tree(vec![
            record("A", 0),
            record("B", 1),
            record("C", 2),
            record("D", 1),
        ]);

        assert_eq!(labels(&tree), ["A"]);
        let level1 = tree[0].nested_storage.as_ref().unwrap();
        assert_eq!(labels(level1), ["B", "D"]);
        let level2 = level1[0].nested_storage.as_ref().unwrap();
        assert_eq!(labels(level2), ["C"]);
    }

    #[test]
    fn orphans_fall_back_to_roots() {
        // Depth 2 with no depth-1 parent ever seen.
        let tree = build_tree(vec![record("A", 0), record("B", 2)]);
        assert_eq!(labels(&tree), ["A", "B"]);
    }

    #[test]
    fn empty_input_builds_empty_tree() {
        assert!(build_tree(Vec::new()).is_empty());
    }

    #[test]
    fn serializes_for_a_generic_tree_viewer() {
        let tree = build_tree(vec![record("A", 0), record("B", 1)]);
        let json = serde_json::to_value(&tree).unwrap();

        assert_eq!(json[0]["slot"], "65");
        assert_eq!(json[0]["nestedStorage"][0]["label"], "B");
        // Leaf nodes omit the key entirely instead of emitting null.
        assert!(json[0]["nestedStorage"][0].get("nestedStorage").is_none());
    }
}
