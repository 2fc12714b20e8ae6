use core::fmt::{self, Display};

use crate::compressor::{Compressor, Result};
use crate::container;

/// In-memory Huffman coding through the container format, with no extension tag.
#[derive(Clone, Copy, Debug, Default)]
pub struct HuffmanCoding;

impl Compressor for HuffmanCoding {
    fn compress_bytes(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        container::compress_bytes(data, "")
    }

    fn decompress_bytes(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        container::decompress_bytes(data).map(|(_, decoded)| decoded)
    }

    fn compressor_name(&self) -> String {
        self.to_string()
    }
}

impl Display for HuffmanCoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Huffman Coding")
    }
}
