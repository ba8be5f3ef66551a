//! Red-black tree keyed by byte strings
//!
//! Nodes live in an arena owned by the tree and refer to each other by
//! index. Child links form the tree; parent links are back-references used
//! by rotations and insertion fixup. The tree does no locking of its own,
//! see [`crate::store::Store`] for the shared wrapper.

mod compare;
mod node;
mod validate;

use std::cmp::Ordering;

pub use compare::compare;
pub use node::{Color, Node, NodeId};
pub use validate::{InvariantViolation, TreeStats};

use node::Side;

/// Sorted map from byte keys to byte values
#[derive(Debug, Default)]
pub struct RedBlackTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl RedBlackTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up the value stored for `key`
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.find(key).map(|id| self.node(id).value.as_slice())
    }

    /// Insert `key` or overwrite its value.
    ///
    /// Returns the previous value when the key was already present. An
    /// overwrite leaves the shape and colors of the tree untouched.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Option<Vec<u8>> {
        let mut parent = None;
        let mut side = Side::Left;
        let mut cursor = self.root;

        while let Some(id) = cursor {
            let node = self.node_mut(id);
            side = match compare(key, &node.key) {
                Ordering::Equal => return Some(std::mem::replace(&mut node.value, value.to_vec())),
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
            };
            parent = Some(id);
            cursor = node.child(side);
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(key.to_vec(), value.to_vec(), parent));
        match parent {
            Some(parent) => *self.node_mut(parent).child_mut(side) = Some(id),
            None => self.root = Some(id),
        }

        self.fix_insert(id);
        None
    }

    /// Height and black height of the current tree
    pub fn stats(&self) -> TreeStats {
        let mut height = 0;
        let mut stack: Vec<(NodeId, usize)> = self.root.map(|id| (id, 1)).into_iter().collect();
        while let Some((id, depth)) = stack.pop() {
            height = height.max(depth);
            let node = self.node(id);
            stack.extend(node.left.map(|child| (child, depth + 1)));
            stack.extend(node.right.map(|child| (child, depth + 1)));
        }

        let mut black_height = 0;
        let mut cursor = self.root;
        while let Some(id) = cursor {
            let node = self.node(id);
            if !node.is_red() {
                black_height += 1;
            }
            cursor = node.left;
        }

        TreeStats {
            len: self.len(),
            height,
            black_height,
        }
    }

    fn find(&self, key: &[u8]) -> Option<NodeId> {
        let mut cursor = self.root;
        while let Some(id) = cursor {
            let node = self.node(id);
            cursor = match compare(key, &node.key) {
                Ordering::Equal => return Some(id),
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        None
    }

    /// Restore the red-black properties after linking the red node `node`
    fn fix_insert(&mut self, mut node: NodeId) {
        while let Some(mut parent) = self.node(node).parent {
            if !self.node(parent).is_red() {
                break;
            }
            let Some(grandparent) = self.node(parent).parent else {
                break;
            };
            let side = self.side_of(parent, grandparent);
            let uncle = self.node(grandparent).child(side.opposite());

            if let Some(uncle) = uncle.filter(|&uncle| self.node(uncle).is_red()) {
                self.node_mut(parent).color = Color::Black;
                self.node_mut(uncle).color = Color::Black;
                self.node_mut(grandparent).color = Color::Red;
                node = grandparent;
                continue;
            }

            // Inner grandchild: straighten the line first.
            if self.node(parent).child(side.opposite()) == Some(node) {
                self.rotate(parent, side);
                std::mem::swap(&mut node, &mut parent);
            }

            self.node_mut(parent).color = Color::Black;
            self.node_mut(grandparent).color = Color::Red;
            self.rotate(grandparent, side.opposite());
        }

        if let Some(root) = self.root {
            self.node_mut(root).color = Color::Black;
        }
    }

    /// Rotate `pivot` down towards `direction`; its child on the other side
    /// takes its place.
    fn rotate(&mut self, pivot: NodeId, direction: Side) {
        let Some(child) = self.node(pivot).child(direction.opposite()) else {
            return;
        };

        let inner = self.node(child).child(direction);
        *self.node_mut(pivot).child_mut(direction.opposite()) = inner;
        if let Some(inner) = inner {
            self.node_mut(inner).parent = Some(pivot);
        }

        let parent = self.node(pivot).parent;
        self.node_mut(child).parent = parent;
        self.replace_child(parent, pivot, child);

        *self.node_mut(child).child_mut(direction) = Some(pivot);
        self.node_mut(pivot).parent = Some(child);
    }

    /// Point the slot that held `old` (or the root) at `new`
    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: NodeId) {
        match parent {
            Some(parent) => {
                let side = self.side_of(old, parent);
                *self.node_mut(parent).child_mut(side) = Some(new);
            }
            None => self.root = Some(new),
        }
    }

    fn side_of(&self, child: NodeId, parent: NodeId) -> Side {
        if self.node(parent).left == Some(child) {
            Side::Left
        } else {
            Side::Right
        }
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }
}
