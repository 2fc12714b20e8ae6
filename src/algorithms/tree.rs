use core::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::algorithms::frequency::FrequencyTable;
use crate::compressor::{CodecError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuffNode {
    Leaf {
        weight: u64,
        symbol: u8,
    },
    Internal {
        weight: u64,
        left: Box<HuffNode>,
        /// Always present, except under the synthetic root built for
        /// single-symbol inputs, which only has a left child.
        right: Option<Box<HuffNode>>,
    },
}

impl HuffNode {
    pub const fn leaf(symbol: u8, weight: u64) -> Self {
        HuffNode::Leaf { weight, symbol }
    }

    pub const fn weight(&self) -> u64 {
        match self {
            HuffNode::Leaf { weight, .. } | HuffNode::Internal { weight, .. } => *weight,
        }
    }

    /// `first` becomes the left child.
    pub fn merge(first: Self, second: Self) -> Self {
        HuffNode::Internal {
            weight: first.weight() + second.weight(),
            left: Box::new(first),
            right: Some(Box::new(second)),
        }
    }

    /// Follows one edge: `false` goes left, `true` goes right.
    pub fn child(&self, bit: bool) -> Option<&HuffNode> {
        match self {
            HuffNode::Leaf { .. } => None,
            HuffNode::Internal { left, right, .. } => {
                if bit {
                    right.as_deref()
                } else {
                    Some(left)
                }
            }
        }
    }

    pub const fn symbol(&self) -> Option<u8> {
        match self {
            HuffNode::Leaf { symbol, .. } => Some(*symbol),
            HuffNode::Internal { .. } => None,
        }
    }
}

/// Heap entry ordered by `(weight, sequence)`, smallest first.
///
/// The sequence number is the insertion order, so equal weights always resolve
/// the same way and both sides of the codec rebuild the same tree.
struct Pending {
    weight: u64,
    sequence: usize,
    node: HuffNode,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed, BinaryHeap is a max-heap
        (other.weight, other.sequence).cmp(&(self.weight, self.sequence))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    root: HuffNode,
}

impl HuffmanTree {
    /// Builds the tree by repeatedly merging the two lightest nodes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EmptyInput`] if the table has no entries.
    pub fn from_frequencies(table: &FrequencyTable) -> Result<Self> {
        let mut heap = BinaryHeap::with_capacity(table.len());
        let mut sequence = 0usize;

        for (symbol, weight) in table.iter() {
            heap.push(Pending {
                weight,
                sequence,
                node: HuffNode::leaf(symbol, weight),
            });
            sequence += 1;
        }

        if heap.is_empty() {
            return Err(CodecError::EmptyInput);
        }

        while heap.len() > 1 {
            let (Some(first), Some(second)) = (heap.pop(), heap.pop()) else {
                unreachable!("heap holds at least two nodes");
            };
            let node = HuffNode::merge(first.node, second.node);
            heap.push(Pending {
                weight: node.weight(),
                sequence,
                node,
            });
            sequence += 1;
        }

        let root = match heap.pop() {
            Some(Pending {
                node: leaf @ HuffNode::Leaf { .. },
                ..
            }) => HuffNode::Internal {
                weight: leaf.weight(),
                left: Box::new(leaf),
                right: None,
            },
            Some(pending) => pending.node,
            None => unreachable!("heap was checked to be non-empty"),
        };

        if_tracing! {
            tracing::debug!(target = "tree", leaves = table.len(), root_weight = root.weight(), "huffman tree built");
        }

        Ok(Self { root })
    }

    pub const fn root(&self) -> &HuffNode {
        &self.root
    }

    /// Number of leaves, equal to the number of distinct symbols.
    pub fn leaf_count(&self) -> usize {
        fn count(node: &HuffNode) -> usize {
            match node {
                HuffNode::Leaf { .. } => 1,
                HuffNode::Internal { left, right, .. } => count(left) + right.as_deref().map_or(0, count),
            }
        }
        count(&self.root)
    }

    /// Length of the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        fn depth(node: &HuffNode) -> usize {
            match node {
                HuffNode::Leaf { .. } => 0,
                HuffNode::Internal { left, right, .. } => 1 + depth(left).max(right.as_deref().map_or(0, depth)),
            }
        }
        depth(&self.root)
    }
}
