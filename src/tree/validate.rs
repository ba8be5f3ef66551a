//! Full-tree consistency check

use std::cmp::Ordering;

use serde::Serialize;
use thiserror::Error;

use super::{NodeId, RedBlackTree, compare};

/// Shape summary of a tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    /// Number of entries
    pub len: usize,
    /// Longest root-to-node path, counted in nodes
    pub height: usize,
    /// Black nodes on any root-to-leaf path, root included
    pub black_height: usize,
}

/// A broken tree invariant, as reported by [`RedBlackTree::validate`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("root node is red")]
    RedRoot,

    #[error("root node has a parent link")]
    RootHasParent,

    #[error("node {key:?} is reached more than once")]
    SharedNode { key: Vec<u8> },

    #[error("parent link of node {key:?} does not point at its parent")]
    ParentMismatch { key: Vec<u8> },

    #[error("key {key:?} is out of order")]
    OutOfOrder { key: Vec<u8> },

    #[error("red node {key:?} has a red child")]
    RedRed { key: Vec<u8> },

    #[error("black height below {key:?} differs: {left} on the left, {right} on the right")]
    BlackHeightMismatch {
        key: Vec<u8>,
        left: usize,
        right: usize,
    },

    #[error("only {reachable} of {stored} nodes are reachable from the root")]
    Unreachable { reachable: usize, stored: usize },
}

impl RedBlackTree {
    /// Check ordering, coloring, black height and link consistency of the
    /// whole tree.
    ///
    /// Walks the tree with an explicit work list, so a corrupted tree is
    /// reported instead of overflowing the stack or looping.
    pub fn validate(&self) -> Result<TreeStats, InvariantViolation> {
        let Some(root) = self.root else {
            return match self.nodes.len() {
                0 => Ok(TreeStats::default()),
                stored => Err(InvariantViolation::Unreachable { reachable: 0, stored }),
            };
        };

        let root_node = self.node(root);
        if root_node.is_red() {
            return Err(InvariantViolation::RedRoot);
        }
        if root_node.parent.is_some() {
            return Err(InvariantViolation::RootHasParent);
        }

        // Pre-order pass: links, ordering bounds, red-red edges.
        let mut seen = vec![false; self.nodes.len()];
        let mut preorder = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(NodeId, Option<NodeId>, Option<NodeId>)> = vec![(root, None, None)];

        while let Some((id, lower, upper)) = stack.pop() {
            let node = self.node(id);
            if std::mem::replace(&mut seen[id.0], true) {
                return Err(InvariantViolation::SharedNode { key: node.key.clone() });
            }

            let above_lower = lower.is_none_or(|lower| compare(&self.node(lower).key, &node.key) == Ordering::Less);
            let below_upper = upper.is_none_or(|upper| compare(&node.key, &self.node(upper).key) == Ordering::Less);
            if !above_lower || !below_upper {
                return Err(InvariantViolation::OutOfOrder { key: node.key.clone() });
            }

            for child in [node.left, node.right].into_iter().flatten() {
                let child_node = self.node(child);
                if child_node.parent != Some(id) {
                    return Err(InvariantViolation::ParentMismatch { key: child_node.key.clone() });
                }
                if node.is_red() && child_node.is_red() {
                    return Err(InvariantViolation::RedRed { key: node.key.clone() });
                }
            }

            preorder.push(id);
            if let Some(right) = node.right {
                stack.push((right, Some(id), upper));
            }
            if let Some(left) = node.left {
                stack.push((left, lower, Some(id)));
            }
        }

        if preorder.len() != self.nodes.len() {
            return Err(InvariantViolation::Unreachable {
                reachable: preorder.len(),
                stored: self.nodes.len(),
            });
        }

        // Reversed pre-order visits every node after all of its descendants.
        let mut black_heights = vec![0usize; self.nodes.len()];
        let mut heights = vec![0usize; self.nodes.len()];
        for &id in preorder.iter().rev() {
            let node = self.node(id);
            let left = node.left.map_or(0, |child| black_heights[child.0]);
            let right = node.right.map_or(0, |child| black_heights[child.0]);
            if left != right {
                return Err(InvariantViolation::BlackHeightMismatch {
                    key: node.key.clone(),
                    left,
                    right,
                });
            }
            black_heights[id.0] = left + usize::from(!node.is_red());

            let left = node.left.map_or(0, |child| heights[child.0]);
            let right = node.right.map_or(0, |child| heights[child.0]);
            heights[id.0] = 1 + left.max(right);
        }

        Ok(TreeStats {
            len: self.nodes.len(),
            height: heights[root.0],
            black_height: black_heights[root.0],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Color, Node};

    fn sample_tree() -> RedBlackTree {
        let mut tree = RedBlackTree::new();
        for key in [b"d", b"b", b"f", b"a", b"c", b"e", b"g"] {
            tree.put(key, b"v");
        }
        tree
    }

    fn id_of(tree: &RedBlackTree, key: &[u8]) -> NodeId {
        tree.find(key).unwrap()
    }

    #[test]
    fn test_valid_tree_reports_stats() {
        let stats = sample_tree().validate().unwrap();
        assert_eq!(stats.len, 7);
        assert_eq!(stats.height, 3);
        assert!(stats.black_height >= 2);
    }

    #[test]
    fn test_red_root() {
        let mut tree = sample_tree();
        let root = tree.root.unwrap();
        tree.node_mut(root).color = Color::Red;
        assert_eq!(tree.validate(), Err(InvariantViolation::RedRoot));
    }

    #[test]
    fn test_red_red_edge() {
        let mut tree = sample_tree();
        let b = id_of(&tree, b"b");
        let a = id_of(&tree, b"a");
        tree.node_mut(b).color = Color::Red;
        tree.node_mut(a).color = Color::Red;
        assert!(matches!(
            tree.validate(),
            Err(InvariantViolation::RedRed { .. } | InvariantViolation::BlackHeightMismatch { .. })
        ));
    }

    #[test]
    fn test_black_height_mismatch() {
        let mut tree = sample_tree();
        for key in [b"a", b"b", b"c"] {
            let id = id_of(&tree, key);
            tree.node_mut(id).color = Color::Black;
        }
        let g = id_of(&tree, b"g");
        tree.node_mut(g).color = Color::Red;
        assert!(matches!(
            tree.validate(),
            Err(InvariantViolation::BlackHeightMismatch { .. })
        ));
    }

    #[test]
    fn test_out_of_order_key() {
        let mut tree = sample_tree();
        let a = id_of(&tree, b"a");
        tree.node_mut(a).key = b"z".to_vec();
        assert_eq!(
            tree.validate(),
            Err(InvariantViolation::OutOfOrder { key: b"z".to_vec() })
        );
    }

    #[test]
    fn test_parent_mismatch() {
        let mut tree = sample_tree();
        let a = id_of(&tree, b"a");
        let f = id_of(&tree, b"f");
        tree.node_mut(a).parent = Some(f);
        assert_eq!(
            tree.validate(),
            Err(InvariantViolation::ParentMismatch { key: b"a".to_vec() })
        );
    }

    #[test]
    fn test_unreachable_node() {
        let mut tree = sample_tree();
        tree.nodes.push(Node::new(b"orphan".to_vec(), Vec::new(), None));
        assert_eq!(
            tree.validate(),
            Err(InvariantViolation::Unreachable { reachable: 7, stored: 8 })
        );
    }

    #[test]
    fn test_cycle_is_reported() {
        let mut tree = sample_tree();
        let a = id_of(&tree, b"a");
        let root = tree.root.unwrap();
        tree.node_mut(a).left = Some(root);
        assert!(tree.validate().is_err());
    }
}
