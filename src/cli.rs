//! cli component of huffpack.
//!
//! lines starting with `> ` are valid invocations. `<description>` is a required
//! argument and `[description]` an optional one.
//!
//! > `huffpack encode <input> [output] [--force]`
//!
//! compresses a file. without an output path the result lands next to the input,
//! with the extension replaced by `huf` (or `compressed_extension` from the settings
//! file). the original extension is stored in the container.
//!
//! > `huffpack decode <input> [output] [--force]`
//!
//! restores a file. without an output path the stored extension is put back on
//! the container's file name: `notes.huf` holding a `txt` file becomes `notes.txt`.
//!
//! > `huffpack test <input>`
//!
//! compresses and decompresses in memory and reports sizes. nothing is written.
//!
//! > `huffpack inspect <input> [--codes]`
//!
//! prints the container header, the frequency table and, with `--codes`, the code
//! assigned to every symbol.
//!
//! every command accepts `--config <settings.json>`, `--history-log <path>` and
//! `--no-history`. successful encodes and decodes are appended to the history log.
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::Settings;
use crate::history::{History, HistoryLog, NoHistory};

pub mod decode;
pub mod encode;
pub mod inspect;

/// Error types for CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0} already exists, pass --force to overwrite it")]
    OutputExists(PathBuf),

    #[error("input and output are the same file: {0}")]
    SameFile(PathBuf),

    #[error("roundtrip of {0} did not reproduce the original bytes")]
    RoundTripMismatch(PathBuf),
}

/// CLI arguments for huffpack
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// JSON settings file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// History log path, overrides the settings file
    #[arg(long, global = true)]
    pub history_log: Option<PathBuf>,

    /// Do not record this operation in the history log
    #[arg(long, global = true)]
    pub no_history: bool,
}

/// Supported commands for huffpack
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode (compress) a file
    #[command(alias = "enc")]
    Encode(EncodeArgs),

    /// Decode (decompress) a file
    #[command(alias = "dec")]
    Decode(DecodeArgs),

    /// Test compression/decompression roundtrip in memory
    Test(TestArgs),

    /// Print a container's header
    Inspect(InspectArgs),
}

/// Arguments specific to the encode command
#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Path to the input file
    pub input: PathBuf,

    /// Path for the output file
    pub output: Option<PathBuf>,

    /// Overwrite the output if it exists
    #[arg(long, short)]
    pub force: bool,
}

/// Arguments specific to the decode command
#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Path to the compressed file
    pub input: PathBuf,

    /// Path for the restored file
    pub output: Option<PathBuf>,

    /// Overwrite the output if it exists
    #[arg(long, short)]
    pub force: bool,
}

/// Arguments specific to the test command
#[derive(Args, Debug)]
pub struct TestArgs {
    /// Path to the file to roundtrip
    pub input: PathBuf,
}

/// Arguments specific to the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the compressed file
    pub input: PathBuf,

    /// Also print the code assigned to each symbol
    #[arg(long)]
    pub codes: bool,
}

impl GlobalArgs {
    /// Loads the settings file and applies command-line overrides.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = Settings::load_or_default(self.config.as_deref())?;
        if let Some(path) = &self.history_log {
            settings.history_log = path.clone();
        }
        if self.no_history {
            settings.record_history = false;
        }
        Ok(settings)
    }
}

pub fn history_for(settings: &Settings) -> Box<dyn History> {
    if settings.record_history {
        Box::new(HistoryLog::new(settings.history_log.clone()))
    } else {
        Box::new(NoHistory)
    }
}

/// Refuses to clobber the input, or an existing output without `force`.
pub(crate) fn check_output(input: &Path, output: &Path, force: bool) -> Result<(), CliError> {
    if input == output {
        return Err(CliError::SameFile(output.to_path_buf()));
    }
    if output.exists() && !force {
        return Err(CliError::OutputExists(output.to_path_buf()));
    }
    Ok(())
}

pub fn execute_command(cli: Cli) -> anyhow::Result<()> {
    let settings = cli.global.settings()?;
    let mut history = history_for(&settings);

    match cli.command {
        Command::Encode(args) => encode::encode(args, &settings, history.as_mut()),
        Command::Decode(args) => decode::decode(args, history.as_mut()),
        Command::Test(args) => test::test(args),
        Command::Inspect(args) => inspect::inspect(args),
    }
}

/// Function to parse CLI arguments and execute appropriate command
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    execute_command(cli)
}
