use std::io;

use thiserror::Error;

/// Represents an error emitted by the codec while compressing or decompressing data.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The input contained no bytes, so no tree can be built from it.
    #[error("input is empty, there is nothing to compress")]
    EmptyInput,

    /// A byte had no code in the code table it was being encoded with.
    ///
    /// Only reachable when a code table is paired with data it was not built from.
    #[error("byte {0:#04x} has no code in the code table")]
    UnknownSymbol(u8),

    /// A symbol occurs more often than the container's 4-byte count field can record.
    #[error("byte {symbol:#04x} occurs {count} times, which does not fit the container's count field")]
    FrequencyOverflow { symbol: u8, count: u64 },

    /// The container header or payload is structurally invalid.
    ///
    /// The argument is a string that describes what went wrong.
    #[error("container is malformed and could not be decoded: {0}")]
    MalformedContainer(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CodecError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedContainer(message.into())
    }
}

pub type Result<T, E = CodecError> = core::result::Result<T, E>;

/// Represents shared behavior for in-memory compressors.
///
/// Provides a method [`compress_bytes`](Compressor::compress_bytes) to compress data and
/// [`decompress_bytes`](Compressor::decompress_bytes) to decompress data.
///
/// # Note
///
/// No guarantees are made about the length of the resulting [`Vec<u8>`] from
/// [`compress_bytes`](Compressor::compress_bytes). It can be shorter, equal in length, or longer.
/// The only guarantee is that [`decompress_bytes`](Compressor::decompress_bytes) will be able to
/// reconstruct the original data.
pub trait Compressor {
    /// Compresses a given byte slice and returns the encoded data.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EmptyInput`] for an empty slice, and
    /// [`CodecError::FrequencyOverflow`] if a byte occurs more than [`u32::MAX`] times.
    fn compress_bytes(&mut self, data: &[u8]) -> Result<Vec<u8>>;

    /// Decompresses a given byte slice and returns the decoded data.
    ///
    /// # Errors
    ///
    /// Returns an error if the input data was malformed.
    fn decompress_bytes(&mut self, data: &[u8]) -> Result<Vec<u8>>;

    /// Human readable name of the compressor.
    fn compressor_name(&self) -> String {
        core::any::type_name::<Self>().to_string()
    }

    /// Performs a round-trip test on the compressor.
    ///
    /// Use for sanity checking the compressor and decompressor.
    fn test_roundtrip<'orig>(&mut self, data: &'orig [u8]) -> Result<RoundTripTestResult<'orig>> {
        let compressed = self.compress_bytes(data)?;
        let decompressed = self.decompress_bytes(&compressed)?;
        let equal = data == decompressed.as_slice();

        Ok(RoundTripTestResult {
            equal,
            original: data,
            compressed,
            decompressed,
        })
    }
}

/// Represents the result of a round-trip test.
///
/// Use accessor methods to retrieve the [`result`][RoundTripTestResult::is_successful],
/// the [`original data`][RoundTripTestResult::get_original],
/// the [`compressed data`][RoundTripTestResult::get_compressed],
/// and the [`decompressed data`][RoundTripTestResult::get_decompressed].
#[derive(Clone, Debug, Hash)]
pub struct RoundTripTestResult<'orig> {
    pub(crate) equal: bool,
    pub(crate) original: &'orig [u8],
    pub(crate) compressed: Vec<u8>,
    pub(crate) decompressed: Vec<u8>,
}

impl<'orig> RoundTripTestResult<'orig> {
    /// Whether the original and decompressed data were equal.
    pub const fn is_successful(&self) -> bool {
        self.equal
    }

    /// The original data before any action was taken.
    pub const fn get_original(&self) -> &'orig [u8] {
        self.original
    }

    /// The data after it has been encoded by the compressor.
    pub fn get_compressed(&self) -> &[u8] {
        self.compressed.as_slice()
    }

    /// The data after it has been decoded by the decompressor.
    pub fn get_decompressed(&self) -> &[u8] {
        self.decompressed.as_slice()
    }

    /// Compressed size divided by original size; 0 for empty originals.
    pub fn ratio(&self) -> f64 {
        if self.original.is_empty() {
            return 0.0;
        }
        self.compressed.len() as f64 / self.original.len() as f64
    }
}
