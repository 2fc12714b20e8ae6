use std::collections::BTreeMap;
use std::io::{self, Read};

/// Sparse byte -> occurrence count mapping over one input.
///
/// Bytes that never occur have no entry. Iteration is in ascending byte order,
/// which is also the order the container persists entries in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: BTreeMap<u8, u64>,
}

impl FrequencyTable {
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut histogram = [0u64; 256];
        for &byte in data {
            histogram[byte as usize] += 1;
        }
        Self::from_histogram(&histogram)
    }

    /// Scans a reader to its end. Only I/O errors can fail this.
    pub fn from_reader(mut reader: impl Read) -> io::Result<Self> {
        let mut histogram = [0u64; 256];
        let mut chunk = [0u8; 8 * 1024];
        loop {
            let n = match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            for &byte in &chunk[..n] {
                histogram[byte as usize] += 1;
            }
        }

        let table = Self::from_histogram(&histogram);
        if_tracing! {
            tracing::debug!(target = "frequency", distinct = table.len(), total = table.total(), "frequency scan complete");
        }
        Ok(table)
    }

    fn from_histogram(histogram: &[u64; 256]) -> Self {
        let counts = histogram
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count != 0)
            .map(|(byte, &count)| (byte as u8, count))
            .collect();
        Self { counts }
    }

    /// Builds a table from explicit pairs. Later duplicates overwrite earlier ones;
    /// callers that must reject duplicates check before inserting.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (u8, u64)>) -> Self {
        Self {
            counts: pairs.into_iter().collect(),
        }
    }

    pub fn get(&self, symbol: u8) -> Option<u64> {
        self.counts.get(&symbol).copied()
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts.iter().map(|(&symbol, &count)| (symbol, count))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn counts_only_present_bytes() {
        let table = FrequencyTable::from_bytes(b"abracadabra");
        assert_eq!(table.len(), 5);
        assert_eq!(table.get(b'a'), Some(5));
        assert_eq!(table.get(b'b'), Some(2));
        assert_eq!(table.get(b'r'), Some(2));
        assert_eq!(table.get(b'c'), Some(1));
        assert_eq!(table.get(b'd'), Some(1));
        assert_eq!(table.get(b'z'), None);
        assert_eq!(table.total(), 11);
    }

    #[test]
    fn iterates_in_ascending_symbol_order() {
        let table = FrequencyTable::from_bytes(&[0xff, 0x00, 0x7f, 0x00]);
        let pairs: Vec<_> = table.iter().collect();
        assert_eq!(pairs, vec![(0x00, 2), (0x7f, 1), (0xff, 1)]);
    }

    #[test]
    fn reader_and_slice_agree() -> io::Result<()> {
        let data: Vec<u8> = (0..50_000u32).map(|i| (i * 31 % 251) as u8).collect();
        let from_reader = FrequencyTable::from_reader(Cursor::new(&data))?;
        assert_eq!(from_reader, FrequencyTable::from_bytes(&data));
        assert_eq!(from_reader.total(), data.len() as u64);
        Ok(())
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let table = FrequencyTable::from_bytes(&[]);
        assert!(table.is_empty());
        assert_eq!(table.total(), 0);
    }
}
