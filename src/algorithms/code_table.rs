use core::fmt;
use std::collections::BTreeMap;

use crate::algorithms::frequency::FrequencyTable;
use crate::algorithms::tree::{HuffNode, HuffmanTree};

/// A root-to-leaf path. Bits are right-aligned in `bits`, first edge in the most
/// significant position; `0` is a left edge and `1` a right edge.
///
/// 128 bits is more than any tree over `u64` weights can reach: a path of depth `d`
/// needs a total weight of at least the `d + 2`th Fibonacci number.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code {
    bits: u128,
    len: u8,
}

impl Code {
    pub const EMPTY: Code = Code { bits: 0, len: 0 };

    /// Appends one edge.
    pub const fn push(self, bit: bool) -> Self {
        assert!(self.len < 128, "code longer than 128 bits");
        Code {
            bits: (self.bits << 1) | bit as u128,
            len: self.len + 1,
        }
    }

    pub const fn len(&self) -> usize {
        self.len as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bits in path order.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).rev().map(move |shift| (self.bits >> shift) & 1 == 1)
    }

    /// Whether `self` is a prefix of `other` (every code is a prefix of itself).
    pub const fn is_prefix_of(&self, other: &Code) -> bool {
        if self.len > other.len {
            return false;
        }
        match other.bits.checked_shr((other.len - self.len) as u32) {
            Some(head) => head == self.bits,
            None => self.bits == 0,
        }
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Code({self})")
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// byte -> code mapping derived from a [`HuffmanTree`]. Never persisted; the
/// decoder rebuilds it (or just walks the tree) from the stored frequencies.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeTable {
    codes: BTreeMap<u8, Code>,
}

impl CodeTable {
    pub fn from_tree(tree: &HuffmanTree) -> Self {
        let mut codes = BTreeMap::new();
        collect(tree.root(), Code::EMPTY, &mut codes);
        Self { codes }
    }

    pub fn get(&self, symbol: u8) -> Option<Code> {
        self.codes.get(&symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, Code)> + '_ {
        self.codes.iter().map(|(&symbol, &code)| (symbol, code))
    }

    /// Payload size in bits when encoding data with the given frequencies.
    /// Symbols without a code count as zero.
    pub fn encoded_bit_len(&self, freqs: &FrequencyTable) -> u64 {
        freqs
            .iter()
            .filter_map(|(symbol, count)| self.get(symbol).map(|code| count * code.len() as u64))
            .sum()
    }
}

// depth-first, left before right
fn collect(node: &HuffNode, prefix: Code, codes: &mut BTreeMap<u8, Code>) {
    match node {
        HuffNode::Leaf { symbol, .. } => {
            codes.insert(*symbol, prefix);
        }
        HuffNode::Internal { left, right, .. } => {
            collect(left, prefix.push(false), codes);
            if let Some(right) = right {
                collect(right, prefix.push(true), codes);
            }
        }
    }
}
