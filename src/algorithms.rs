pub mod bits;
pub mod code_table;
pub mod frequency;
pub mod huffman;
pub mod tree;

pub use self::code_table::{Code, CodeTable};
pub use self::frequency::FrequencyTable;
pub use self::huffman::HuffmanCoding;
pub use self::tree::{HuffNode, HuffmanTree};
