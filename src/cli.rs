use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommands,

    /// The verbosity of the log messages written to stderr.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: LevelFilter,
}

#[derive(Subcommand)]
pub enum CliCommands {
    /// Train a Markov chain on a sequence and generate pseudo-replicates of it.
    Generate(GenerateCommand),
}

#[derive(Args)]
pub struct GenerateCommand {
    /// A fasta file containing exactly one training sequence.
    #[arg(long, short)]
    pub input: PathBuf,

    /// The order of the Markov chain, i.e. the number of preceding nucleotides used as context.
    #[arg(long, short = 'k')]
    pub order: usize,

    /// The length of each generated sequence. Defaults to the length of the training sequence.
    #[arg(long, short)]
    pub length: Option<usize>,

    /// The number of sequences to generate.
    ///
    /// If omitted, sequences are generated until the output is closed,
    /// and written to stdout one per line.
    #[arg(long, short = 'n', requires = "output")]
    pub count: Option<usize>,

    /// The fasta file the generated sequences are written to.
    #[arg(long, short, requires = "count")]
    pub output: Option<PathBuf>,

    /// Treat the training sequence as circular.
    #[arg(long)]
    pub circular: bool,

    /// The seed of the random number generator.
    #[arg(long, default_value = "0")]
    pub random_seed: u64,

    /// Write a CBOR summary of the trained model to this file.
    #[arg(long)]
    pub model_summary: Option<PathBuf>,
}
