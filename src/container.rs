//! On-disk container format and the file-level compress/decompress operations.
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! [ext_len: u64][ext: ext_len bytes, utf-8]
//! [table_count: u64]
//!     table_count times, ascending symbol order: [symbol: u8][count: u32]
//! [original_len: u64]
//! [payload: packed code bits, MSB-first, final byte zero-padded]
//! ```
//!
//! `original_len` is what the decoder stops on. The payload has no bit count, so
//! without it padding zeros in the last byte would decode as extra symbols.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::algorithms::bits::{BitReader, BitWriter};
use crate::algorithms::code_table::CodeTable;
use crate::algorithms::frequency::FrequencyTable;
use crate::algorithms::tree::HuffmanTree;
use crate::compressor::{CodecError, Result};

/// File extension given to compressed files.
pub const COMPRESSED_EXTENSION: &str = "huf";

/// Longest extension tag accepted in either direction. Anything longer is not a
/// file name suffix on any common filesystem.
pub const MAX_EXTENSION_LEN: u64 = 255;

/// Size of one persisted `(symbol, count)` pair.
const PAIR_LEN: u64 = 1 + 4;

const OUT_CHUNK_SIZE: usize = 32 * 1024;

/// Everything in a container before the payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    /// Suffix of the original file name, without the dot. Empty when there was none.
    pub extension: String,
    pub frequencies: FrequencyTable,
    pub original_len: u64,
}

impl Header {
    /// Serialized size in bytes.
    pub fn encoded_len(&self) -> u64 {
        8 + self.extension.len() as u64 + 8 + PAIR_LEN * self.frequencies.len() as u64 + 8
    }

    /// Checks that the header can be persisted, without writing anything.
    pub fn check_writable(&self) -> Result<()> {
        if self.extension.len() as u64 > MAX_EXTENSION_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("extension is {} bytes long, at most {MAX_EXTENSION_LEN} are supported", self.extension.len()),
            )
            .into());
        }
        for (symbol, count) in self.frequencies.iter() {
            if count > u64::from(u32::MAX) {
                return Err(CodecError::FrequencyOverflow { symbol, count });
            }
        }
        Ok(())
    }

    pub fn write_to(&self, mut writer: impl Write) -> Result<()> {
        self.check_writable()?;

        writer.write_all(&(self.extension.len() as u64).to_le_bytes())?;
        writer.write_all(self.extension.as_bytes())?;

        writer.write_all(&(self.frequencies.len() as u64).to_le_bytes())?;
        for (symbol, count) in self.frequencies.iter() {
            // range checked above
            let count = count as u32;
            writer.write_all(&[symbol])?;
            writer.write_all(&count.to_le_bytes())?;
        }

        writer.write_all(&self.original_len.to_le_bytes())?;
        Ok(())
    }

    /// Parses and validates a header, leaving the reader at the start of the payload.
    ///
    /// # Errors
    ///
    /// [`CodecError::MalformedContainer`] for truncated input or impossible field values,
    /// [`CodecError::Io`] for any other read failure.
    pub fn read_from(mut reader: impl Read) -> Result<Self> {
        let ext_len = u64::from_le_bytes(read_array(&mut reader, "extension length")?);
        if ext_len > MAX_EXTENSION_LEN {
            return Err(CodecError::malformed(format!(
                "extension length {ext_len} exceeds the maximum of {MAX_EXTENSION_LEN}"
            )));
        }
        let mut ext = vec![0u8; ext_len as usize];
        read_exact(&mut reader, &mut ext, "extension")?;
        let extension = String::from_utf8(ext).map_err(|_| CodecError::malformed("extension is not valid utf-8"))?;

        let table_count = u64::from_le_bytes(read_array(&mut reader, "frequency table length")?);
        if table_count == 0 {
            return Err(CodecError::malformed("frequency table is empty"));
        }
        if table_count > 256 {
            return Err(CodecError::malformed(format!(
                "frequency table claims {table_count} entries, but there are only 256 byte values"
            )));
        }

        let mut seen = [false; 256];
        let mut pairs = Vec::with_capacity(table_count as usize);
        for _ in 0..table_count {
            let [symbol, c0, c1, c2, c3] = read_array::<5>(&mut reader, "frequency table entry")?;
            let count = u32::from_le_bytes([c0, c1, c2, c3]);
            if seen[symbol as usize] {
                return Err(CodecError::malformed(format!("byte {symbol:#04x} appears twice in the frequency table")));
            }
            if count == 0 {
                return Err(CodecError::malformed(format!("byte {symbol:#04x} has a count of zero")));
            }
            seen[symbol as usize] = true;
            pairs.push((symbol, u64::from(count)));
        }
        let frequencies = FrequencyTable::from_pairs(pairs);

        let original_len = u64::from_le_bytes(read_array(&mut reader, "original length")?);
        if frequencies.total() != original_len {
            return Err(CodecError::malformed(format!(
                "frequency counts sum to {}, but the original length is {original_len}",
                frequencies.total()
            )));
        }

        Ok(Self {
            extension,
            frequencies,
            original_len,
        })
    }
}

fn read_exact(reader: &mut impl Read, buf: &mut [u8], what: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => CodecError::malformed(format!("container ended while reading the {what}")),
        _ => CodecError::Io(e),
    })
}

fn read_array<const N: usize>(reader: &mut impl Read, what: &str) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    read_exact(reader, &mut buf, what)?;
    Ok(buf)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressionSummary {
    pub extension: String,
    pub original_len: u64,
    pub distinct_symbols: usize,
    /// Significant payload bits, padding excluded.
    pub payload_bits: u64,
    /// Header plus payload bytes.
    pub container_len: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecompressionSummary {
    pub extension: String,
    pub original_len: u64,
}

/// Compresses `source` into `dest`.
///
/// The source is read twice: once to count byte frequencies, and again from the
/// start to encode. `extension` is stored in the header as-is.
///
/// # Errors
///
/// [`CodecError::EmptyInput`] if the source has no bytes, in which case nothing is written.
/// Any other error can leave a partial container in `dest`.
pub fn compress_stream<R, W>(mut source: R, extension: &str, mut dest: W) -> Result<CompressionSummary>
where
    R: Read + Seek,
    W: Write,
{
    if_tracing! {
        tracing::debug!(target = "container", extension, "compress start");
    }

    source.seek(SeekFrom::Start(0))?;
    let frequencies = FrequencyTable::from_reader(BufReader::new(&mut source))?;
    if frequencies.is_empty() {
        if_tracing! {
            tracing::warn!(target = "container", "compress error: input empty");
        }
        return Err(CodecError::EmptyInput);
    }

    let header = Header {
        extension: extension.to_owned(),
        original_len: frequencies.total(),
        frequencies,
    };
    header.write_to(&mut dest)?;

    let tree = HuffmanTree::from_frequencies(&header.frequencies)?;
    let codes = CodeTable::from_tree(&tree);

    source.seek(SeekFrom::Start(0))?;
    let (encoded, payload_bits) = encode_payload(BufReader::new(&mut source), &codes, &mut dest)?;
    if encoded != header.original_len {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("source changed between passes: counted {} bytes, encoded {encoded}", header.original_len),
        )
        .into());
    }

    let summary = CompressionSummary {
        original_len: header.original_len,
        distinct_symbols: header.frequencies.len(),
        payload_bits,
        container_len: header.encoded_len() + payload_bits.div_ceil(8),
        extension: header.extension,
    };

    if_tracing! {
        tracing::info!(
            target = "container",
            input_len = summary.original_len,
            distinct = summary.distinct_symbols,
            max_code_len = tree.depth(),
            payload_bits = summary.payload_bits,
            output_len = summary.container_len,
            "compress complete"
        );
    }

    Ok(summary)
}

/// Encodes every byte of `source` with `codes` and packs the result into `dest`,
/// padding the final byte.
///
/// Returns the number of bytes consumed and the number of significant bits written.
///
/// # Errors
///
/// [`CodecError::UnknownSymbol`] for the first byte that has no code.
pub fn encode_payload(mut source: impl Read, codes: &CodeTable, dest: impl Write) -> Result<(u64, u64)> {
    let mut dest = BufWriter::with_capacity(OUT_CHUNK_SIZE, dest);
    let mut writer = BitWriter::new(&mut dest);
    let mut chunk = vec![0u8; OUT_CHUNK_SIZE];
    let mut consumed = 0u64;

    loop {
        let n = match source.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        for &byte in &chunk[..n] {
            let code = codes.get(byte).ok_or(CodecError::UnknownSymbol(byte))?;
            writer.write_code(code)?;
        }
        consumed += n as u64;
    }

    let bits = writer.finish()?;
    dest.flush()?;
    Ok((consumed, bits))
}

/// Decompresses a whole container from `source` into `dest`.
///
/// # Errors
///
/// [`CodecError::MalformedContainer`] if the header is invalid or the payload does not
/// decode to exactly the stored number of bytes.
pub fn decompress_stream<R, W>(mut source: R, mut dest: W) -> Result<DecompressionSummary>
where
    R: Read,
    W: Write,
{
    let header = Header::read_from(&mut source)?;
    if_tracing! {
        tracing::debug!(
            target = "container",
            extension = %header.extension,
            distinct = header.frequencies.len(),
            original_len = header.original_len,
            "decompress header parsed"
        );
    }

    let tree = HuffmanTree::from_frequencies(&header.frequencies)?;

    let mut payload = Vec::new();
    source.read_to_end(&mut payload)?;

    let result = decode_payload(&tree, &payload, header.original_len, &mut dest);
    if_tracing! {
        if let Err(ref err) = result {
            tracing::warn!(target = "container", error = %err, "decompress failed");
        }
    }
    result?;

    if_tracing! {
        tracing::info!(target = "container", input_len = payload.len(), output_len = header.original_len, "decompress complete");
    }

    Ok(DecompressionSummary {
        extension: header.extension,
        original_len: header.original_len,
    })
}

/// Walks `tree` bit by bit over `payload`, emitting a byte at every leaf until
/// `original_len` bytes are out. Remaining bits must be padding.
fn decode_payload(tree: &HuffmanTree, payload: &[u8], original_len: u64, mut dest: impl Write) -> Result<()> {
    let root = tree.root();
    let mut bits = BitReader::new(payload);
    let mut out = Vec::with_capacity(OUT_CHUNK_SIZE);
    let mut emitted = 0u64;

    while emitted < original_len {
        let mut node = root;
        let symbol = loop {
            if let Some(symbol) = node.symbol() {
                break symbol;
            }
            let bit = bits.next().ok_or_else(|| {
                CodecError::malformed(format!("payload ended after {emitted} of {original_len} bytes"))
            })?;
            node = node
                .child(bit)
                .ok_or_else(|| CodecError::malformed(format!("bit {} has no branch in the tree", bits.position() - 1)))?;
        };

        out.push(symbol);
        emitted += 1;
        if out.len() == OUT_CHUNK_SIZE {
            dest.write_all(&out)?;
            out.clear();
        }
    }

    if bits.remaining() >= 8 {
        return Err(CodecError::malformed(format!(
            "{} trailing bytes after the payload",
            bits.remaining() / 8
        )));
    }

    dest.write_all(&out)?;
    dest.flush()?;
    Ok(())
}

/// Suffix of `path` without the dot, or an empty string.
pub fn extension_of(path: &Path) -> String {
    path.extension().map(|ext| ext.to_string_lossy().into_owned()).unwrap_or_default()
}

/// Compresses the file at `source_path` into a new container at `dest_path`.
///
/// The source's extension is stored in the header. An empty source is rejected
/// before the destination is created.
pub fn compress(source_path: impl AsRef<Path>, dest_path: impl AsRef<Path>) -> Result<CompressionSummary> {
    let source_path = source_path.as_ref();
    let source = File::open(source_path)?;
    if source.metadata()?.len() == 0 {
        return Err(CodecError::EmptyInput);
    }

    let mut dest = BufWriter::new(File::create(dest_path.as_ref())?);
    let summary = compress_stream(source, &extension_of(source_path), &mut dest)?;
    dest.flush()?;
    Ok(summary)
}

/// Decompresses the container at `source_path` into `dest_path`.
///
/// The whole container is decoded in memory first, so nothing is written to
/// `dest_path` when decoding fails.
pub fn decompress(source_path: impl AsRef<Path>, dest_path: impl AsRef<Path>) -> Result<DecompressionSummary> {
    let container = fs::read(source_path.as_ref())?;
    let mut decoded = Vec::new();
    let summary = decompress_stream(container.as_slice(), &mut decoded)?;
    fs::write(dest_path.as_ref(), &decoded)?;
    Ok(summary)
}

/// Reads only the header of the container at `path`.
pub fn read_header(path: impl AsRef<Path>) -> Result<Header> {
    Header::read_from(BufReader::new(File::open(path.as_ref())?))
}

/// In-memory [`compress_stream`].
pub fn compress_bytes(data: &[u8], extension: &str) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    compress_stream(Cursor::new(data), extension, &mut out)?;
    Ok(out)
}

/// In-memory [`decompress_stream`]; returns the extension tag with the data.
pub fn decompress_bytes(data: &[u8]) -> Result<(String, Vec<u8>)> {
    let mut out = Vec::new();
    let summary = decompress_stream(data, &mut out)?;
    Ok((summary.extension, out))
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn header_of(container: &[u8]) -> Header {
        Header::read_from(container).unwrap()
    }

    #[test]
    fn aaab_layout() {
        let container = compress_bytes(b"aaab", "txt").unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(&3u64.to_le_bytes());
        expected.extend_from_slice(b"txt");
        expected.extend_from_slice(&2u64.to_le_bytes());
        expected.push(b'a');
        expected.extend_from_slice(&3u32.to_le_bytes());
        expected.push(b'b');
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.extend_from_slice(&4u64.to_le_bytes());
        // a -> 1, b -> 0: 1110 padded
        expected.push(0b1110_0000);

        assert_eq!(container, expected);
        assert_eq!(decompress_bytes(&container).unwrap(), ("txt".to_string(), b"aaab".to_vec()));
    }

    #[test]
    fn header_matches_source_frequencies() {
        let data = b"mississippi river banks";
        let container = compress_bytes(data, "").unwrap();
        let header = header_of(&container);
        assert_eq!(header.frequencies, FrequencyTable::from_bytes(data));
        assert_eq!(header.original_len, data.len() as u64);
        assert_eq!(header.extension, "");

        let symbols: Vec<u8> = header.frequencies.iter().map(|(s, _)| s).collect();
        let mut sorted = symbols.clone();
        sorted.sort_unstable();
        assert_eq!(symbols, sorted);
    }

    #[test]
    fn empty_input_writes_nothing() {
        let mut out = Vec::new();
        let result = compress_stream(Cursor::new(&[][..]), "bin", &mut out);
        assert!(matches!(result, Err(CodecError::EmptyInput)));
        assert!(out.is_empty());
    }

    #[test_case(1 ; "one byte")]
    #[test_case(7 ; "just under a byte of bits")]
    #[test_case(8 ; "exactly a byte of bits")]
    #[test_case(9 ; "one bit over")]
    #[test_case(10_000 ; "many")]
    fn single_symbol_roundtrip(n: usize) {
        let data = vec![0u8; n];
        let container = compress_bytes(&data, "dat").unwrap();
        let header = header_of(&container);
        assert_eq!(container.len() as u64, header.encoded_len() + (n as u64).div_ceil(8));
        let (_, decoded) = decompress_bytes(&container).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn padding_zeros_are_not_decoded() {
        // b -> 0, so the four padding zeros would otherwise decode as four extra b's
        let container = compress_bytes(b"aaab", "").unwrap();
        let (_, decoded) = decompress_bytes(&container).unwrap();
        assert_eq!(decoded, b"aaab");
    }

    #[test]
    fn summary_reports_sizes() {
        let data = b"aaaaaaaabbbbccde";
        let mut out = Vec::new();
        let summary = compress_stream(Cursor::new(&data[..]), "log", &mut out).unwrap();
        assert_eq!(summary.original_len, 16);
        assert_eq!(summary.distinct_symbols, 5);
        // 8*1 + 4*2 + 2*3 + 1*4 + 1*4
        assert_eq!(summary.payload_bits, 30);
        assert_eq!(summary.container_len, out.len() as u64);
    }

    #[test]
    fn unknown_symbol_is_reported() {
        let tree = HuffmanTree::from_frequencies(&FrequencyTable::from_bytes(b"abc")).unwrap();
        let codes = CodeTable::from_tree(&tree);
        let result = encode_payload(&b"abcd"[..], &codes, Vec::new());
        assert!(matches!(result, Err(CodecError::UnknownSymbol(b'd'))));
    }

    #[test]
    fn truncated_header_is_malformed() {
        let container = compress_bytes(b"hello world", "txt").unwrap();
        let header_len = header_of(&container).encoded_len() as usize;
        for cut in [0, 4, 8, 10, 11, 19, 20, header_len - 1] {
            let result = decompress_bytes(&container[..cut]);
            assert!(
                matches!(result, Err(CodecError::MalformedContainer(_))),
                "cut at {cut} gave {result:?}"
            );
        }
    }

    #[test]
    fn truncated_payload_is_malformed() {
        let data: Vec<u8> = (0..=255u8).cycle().take(2000).collect();
        let container = compress_bytes(&data, "").unwrap();
        let result = decompress_bytes(&container[..container.len() - 10]);
        assert!(matches!(result, Err(CodecError::MalformedContainer(_))));
    }

    #[test]
    fn trailing_bytes_are_malformed() {
        let mut container = compress_bytes(b"abcabcabc", "").unwrap();
        container.extend_from_slice(&[0, 0]);
        assert!(matches!(decompress_bytes(&container), Err(CodecError::MalformedContainer(_))));
    }

    #[test]
    fn impossible_table_count_is_malformed() {
        let mut container = Vec::new();
        container.extend_from_slice(&0u64.to_le_bytes());
        container.extend_from_slice(&1000u64.to_le_bytes());
        assert!(matches!(decompress_bytes(&container), Err(CodecError::MalformedContainer(_))));
    }

    #[test]
    fn huge_extension_length_is_malformed() {
        let container = u64::MAX.to_le_bytes();
        assert!(matches!(decompress_bytes(&container), Err(CodecError::MalformedContainer(_))));
    }

    #[test]
    fn duplicate_symbol_is_malformed() {
        let mut container = Vec::new();
        container.extend_from_slice(&0u64.to_le_bytes());
        container.extend_from_slice(&2u64.to_le_bytes());
        for _ in 0..2 {
            container.push(b'x');
            container.extend_from_slice(&1u32.to_le_bytes());
        }
        container.extend_from_slice(&2u64.to_le_bytes());
        container.push(0);
        assert!(matches!(decompress_bytes(&container), Err(CodecError::MalformedContainer(_))));
    }

    #[test]
    fn mismatched_original_length_is_malformed() {
        let mut container = compress_bytes(b"aaab", "").unwrap();
        // original_len sits right before the single payload byte
        let at = container.len() - 1 - 8;
        container[at..at + 8].copy_from_slice(&5u64.to_le_bytes());
        assert!(matches!(decompress_bytes(&container), Err(CodecError::MalformedContainer(_))));
    }

    #[test]
    fn right_branch_under_single_symbol_root_is_malformed() {
        let mut container = compress_bytes(b"qqq", "").unwrap();
        let last = container.len() - 1;
        container[last] = 0b0100_0000;
        assert!(matches!(decompress_bytes(&container), Err(CodecError::MalformedContainer(_))));
    }

    #[test]
    fn oversized_counts_cannot_be_written() {
        let header = Header {
            extension: String::new(),
            frequencies: FrequencyTable::from_pairs([(b'a', u64::from(u32::MAX) + 1)]),
            original_len: u64::from(u32::MAX) + 1,
        };
        let mut out = Vec::new();
        assert!(matches!(
            header.write_to(&mut out),
            Err(CodecError::FrequencyOverflow { symbol: b'a', .. })
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn file_roundtrip_keeps_extension() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("notes.md");
        let packed = dir.path().join("notes.huf");
        let restored = dir.path().join("restored.md");
        let data = b"# heading\n\nsome *markdown* text with \x00 a null\n".repeat(40);
        fs::write(&source, &data)?;

        let summary = compress(&source, &packed)?;
        assert_eq!(summary.extension, "md");
        assert_eq!(summary.container_len, fs::metadata(&packed)?.len());
        assert_eq!(read_header(&packed)?.extension, "md");

        let summary = decompress(&packed, &restored)?;
        assert_eq!(summary.extension, "md");
        assert_eq!(summary.original_len, data.len() as u64);
        assert_eq!(fs::read(&restored)?, data);
        Ok(())
    }

    #[test]
    fn empty_file_creates_no_container() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("empty.txt");
        let packed = dir.path().join("empty.huf");
        fs::write(&source, b"")?;

        assert!(matches!(compress(&source, &packed), Err(CodecError::EmptyInput)));
        assert!(!packed.exists());
        Ok(())
    }

    #[test]
    fn failed_decompress_writes_nothing() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let packed = dir.path().join("broken.huf");
        let restored = dir.path().join("broken.txt");
        fs::write(&packed, [1, 2, 3])?;

        assert!(matches!(decompress(&packed, &restored), Err(CodecError::MalformedContainer(_))));
        assert!(!restored.exists());
        Ok(())
    }

    #[test]
    fn missing_source_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = compress(dir.path().join("nope.txt"), dir.path().join("nope.huf"));
        assert!(matches!(result, Err(CodecError::Io(_))));
    }
}
