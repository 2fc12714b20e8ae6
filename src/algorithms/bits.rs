use std::io::{self, Write};

use bitbit::{BitReader as RawReader, BitWriter as RawWriter, MSB};

use crate::algorithms::code_table::Code;

/// MSB-first bit sink that counts significant bits.
///
/// [`finish`](BitWriter::finish) zero-pads the low bits of a trailing partial byte.
pub struct BitWriter<W: Write> {
    inner: RawWriter<W>,
    bits_written: u64,
}

impl<W: Write> BitWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: RawWriter::new(inner),
            bits_written: 0,
        }
    }

    pub fn write_bit(&mut self, bit: bool) -> io::Result<()> {
        self.inner.write_bit(bit)?;
        self.bits_written += 1;
        Ok(())
    }

    pub fn write_code(&mut self, code: Code) -> io::Result<()> {
        for bit in code.iter() {
            self.write_bit(bit)?;
        }
        Ok(())
    }

    /// Significant bits written so far, padding excluded.
    pub const fn bits_written(&self) -> u64 {
        self.bits_written
    }

    /// Pads the trailing partial byte, if any, and returns the number of significant bits.
    pub fn finish(mut self) -> io::Result<u64> {
        if self.bits_written % 8 != 0 {
            self.inner.pad_to_byte()?;
        }
        Ok(self.bits_written)
    }
}

/// Lazily unpacks bytes into bits, MSB-first.
pub struct BitReader<'a> {
    inner: RawReader<&'a [u8], MSB>,
    total: usize,
    position: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            inner: RawReader::new(bytes),
            total: bytes.len() * 8,
            position: 0,
        }
    }

    /// Bits consumed so far.
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Bits not yet consumed, padding included.
    pub const fn remaining(&self) -> usize {
        self.total - self.position
    }
}

impl Iterator for BitReader<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.position == self.total {
            return None;
        }
        let bit = self.inner.read_bit().ok()?;
        self.position += 1;
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BitReader<'_> {}
