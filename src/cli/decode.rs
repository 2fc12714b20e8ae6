use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use voxell_timer::time_fn;

use crate::cli::{DecodeArgs, check_output};
use crate::container;
use crate::history::{History, HistoryEntry, Operation, restored_name};

/// Default output: the stored extension put back on the container's name, or
/// `.out` when that would land on the container itself.
fn default_output(input: &Path) -> Result<PathBuf> {
    let header = container::read_header(input).with_context(|| format!("failed to read header of {}", input.display()))?;
    let output = restored_name(input, &header.extension);
    if output == input {
        return Ok(input.with_extension("out"));
    }
    Ok(output)
}

pub fn decode(args: DecodeArgs, history: &mut dyn History) -> Result<()> {
    let input_path = &args.input;
    let output_path = match &args.output {
        Some(path) => path.clone(),
        None => default_output(input_path)?,
    };
    check_output(input_path, &output_path, args.force)?;

    let (summary, elapsed) = time_fn(|| container::decompress(input_path, &output_path));
    let summary = summary.with_context(|| format!("failed to decompress {}", input_path.display()))?;

    if_tracing! {
        tracing::info!(event = "decode_complete", input = %input_path.display(), output = %output_path.display(), elapsed_us = %elapsed.as_micros(), decompressed_len = summary.original_len, "decode finished");
    }

    println!(
        "{} -> {}\n\trestored: {} bytes\n\t{:.0?}",
        input_path.display(),
        output_path.display(),
        summary.original_len,
        elapsed,
    );

    history
        .record(&HistoryEntry::now(Operation::Decompressed, input_path, &output_path, summary.extension))
        .context("failed to write history log")?;
    Ok(())
}
