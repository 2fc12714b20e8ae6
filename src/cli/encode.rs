use anyhow::{Context, Result};
use voxell_timer::time_fn;

use crate::cli::{EncodeArgs, check_output};
use crate::config::Settings;
use crate::container;
use crate::history::{History, HistoryEntry, Operation, compressed_name};

pub fn encode(args: EncodeArgs, settings: &Settings, history: &mut dyn History) -> Result<()> {
    let input_path = &args.input;
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| compressed_name(input_path, &settings.compressed_extension));
    check_output(input_path, &output_path, args.force)?;

    let (summary, elapsed) = time_fn(|| container::compress(input_path, &output_path));
    let summary = summary.with_context(|| format!("failed to compress {}", input_path.display()))?;

    if_tracing! {
        tracing::info!(event = "encode_complete", input = %input_path.display(), output = %output_path.display(), elapsed_us = %elapsed.as_micros(), compressed_len = summary.container_len, "encode finished");
    }

    let ratio = summary.container_len as f64 / summary.original_len as f64;
    println!(
        "{} -> {}\n\toriginal: {} bytes\n\tcompressed: {} bytes ({} distinct symbols, {} payload bits)\n\tratio: {:.1}% (compressed/original)\n\t{:.0?}",
        input_path.display(),
        output_path.display(),
        summary.original_len,
        summary.container_len,
        summary.distinct_symbols,
        summary.payload_bits,
        ratio * 100.0,
        elapsed,
    );

    history
        .record(&HistoryEntry::now(Operation::Compressed, input_path, &output_path, summary.extension))
        .context("failed to write history log")?;
    Ok(())
}
