use core::fmt::Write as _;
use std::fs;

use anyhow::{Context, Result};

use crate::algorithms::{CodeTable, HuffmanTree};
use crate::cli::InspectArgs;
use crate::container::{self, Header};

fn symbol_label(symbol: u8) -> String {
    if symbol.is_ascii_graphic() {
        format!("'{}'", symbol as char)
    } else {
        format!("{symbol:#04x}")
    }
}

/// Human readable dump of a header, with each symbol's code if `codes` is set.
pub fn describe(header: &Header, container_len: u64, codes: bool) -> Result<String> {
    let tree = HuffmanTree::from_frequencies(&header.frequencies)?;
    let table = CodeTable::from_tree(&tree);
    let payload_bits = table.encoded_bit_len(&header.frequencies);
    let expected_len = header.encoded_len() + payload_bits.div_ceil(8);

    let mut out = String::new();
    let extension = if header.extension.is_empty() { "(none)" } else { &header.extension };
    writeln!(out, "extension: {extension}")?;
    writeln!(out, "original length: {} bytes", header.original_len)?;
    writeln!(out, "distinct symbols: {}", header.frequencies.len())?;
    writeln!(out, "longest code: {} bits", tree.depth())?;
    writeln!(out, "header: {} bytes", header.encoded_len())?;
    writeln!(out, "payload: {} bits ({} bytes)", payload_bits, payload_bits.div_ceil(8))?;
    if expected_len != container_len {
        writeln!(out, "warning: file is {container_len} bytes, header implies {expected_len}")?;
    }

    for (symbol, count) in header.frequencies.iter() {
        write!(out, "{:>6} {:>12}", symbol_label(symbol), count)?;
        if codes {
            if let Some(code) = table.get(symbol) {
                write!(out, "  {code}")?;
            }
        }
        out.push('\n');
    }
    Ok(out)
}

pub fn inspect(args: InspectArgs) -> Result<()> {
    let header = container::read_header(&args.input).with_context(|| format!("failed to read {}", args.input.display()))?;
    let container_len = fs::metadata(&args.input)?.len();
    print!("{}", describe(&header, container_len, args.codes)?);
    Ok(())
}
