use std::{
    fs::File,
    io::{self, BufWriter, Write},
};

use clap::Parser;
use cli::{Cli, CliCommands, GenerateCommand};
use compact_genome::{
    implementation::{
        alphabets::dna_alphabet::DnaAlphabet, handle_sequence_store::HandleSequenceStore,
        DefaultGenome, DefaultSubGenome,
    },
    interface::{alphabet::Alphabet, sequence::GenomeSequence},
    io::fasta::{read_fasta_file, write_fasta_file, FastaRecord},
};
use log::info;
use mcgen::{
    error::{Error, Result},
    MarkovChain, Topology,
};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

mod cli;

type DnaSequenceStore =
    HandleSequenceStore<DnaAlphabet, DefaultGenome<DnaAlphabet>, DefaultSubGenome<DnaAlphabet>>;

fn main() {
    let cli = Cli::parse();

    initialise_logging(&cli)
        .and_then(|()| match cli.command {
            CliCommands::Generate(generate_command) => generate(generate_command),
        })
        .unwrap_or_else(|error| {
            eprintln!("Error: {error}");
            std::process::exit(1);
        });
}

fn initialise_logging(cli: &Cli) -> Result<()> {
    TermLogger::init(
        cli.log_level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;
    Ok(())
}

fn generate(generate_command: GenerateCommand) -> Result<()> {
    // Load training sequence.
    let mut sequence_store = DnaSequenceStore::new();
    let records = read_fasta_file(
        &generate_command.input,
        &mut sequence_store,
        false,
        true,
    )?;
    let [record] = <[_; 1]>::try_from(records)
        .map_err(|records: Vec<_>| Error::InputRecordCount(records.len()))?;
    let sequence = record.sequence_handle.as_string();
    info!(
        "Loaded training sequence {:?} of length {}",
        record.id,
        sequence.len()
    );

    // Train model.
    let topology = if generate_command.circular {
        Topology::Circular
    } else {
        Topology::Linear
    };
    let mut chain = MarkovChain::with_topology(generate_command.order, topology)?;
    chain.train(&sequence)?;

    if let Some(model_summary) = &generate_command.model_summary {
        let mut output = BufWriter::new(File::create(model_summary)?);
        ciborium::into_writer(chain.trained()?, &mut output)?;
        output.flush()?;
    }

    // Initialise random number generator.
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(generate_command.random_seed);

    match (generate_command.count, &generate_command.output) {
        (Some(count), Some(output)) => {
            let records = chain
                .generate(generate_command.length, count, &mut rng)?
                .into_iter()
                .enumerate()
                .map(|(index, sequence)| -> Result<_> {
                    Ok(FastaRecord {
                        id: format!("generated_{index}"),
                        comment: String::new(),
                        sequence_handle: sequence
                            .bytes()
                            .map(DnaAlphabet::ascii_to_character)
                            .collect::<std::result::Result<DefaultGenome<DnaAlphabet>, _>>()?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            write_fasta_file(output, &records, &DnaSequenceStore::new())?;
            info!("Wrote {count} sequences to {output:?}");
        }
        _ => stream_to_stdout(&chain, generate_command.length, &mut rng)?,
    }

    Ok(())
}

/// Writes generated sequences to stdout, one per line, until stdout is closed.
fn stream_to_stdout(
    chain: &MarkovChain,
    length: Option<usize>,
    rng: &mut Xoshiro256PlusPlus,
) -> Result<()> {
    let mut output = BufWriter::new(io::stdout().lock());

    for sequence in chain.stream(length, None, rng)? {
        let written = writeln!(output, "{}", sequence?);
        if !is_open(written)? {
            return Ok(());
        }
    }

    is_open(output.flush())?;
    Ok(())
}

/// Returns false if the write failed because the reader closed the pipe.
fn is_open(result: io::Result<()>) -> Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => {
            info!("Output was closed");
            Ok(false)
        }
        Err(error) => Err(error.into()),
    }
}
