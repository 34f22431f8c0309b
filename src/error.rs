use rand::distributions::WeightedError;
use thiserror::Error;

use crate::markov_chain::context::MAX_ORDER;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),

    #[error("genome IO error: {0}")]
    GenomeIO(#[from] compact_genome::io::error::IOError),

    #[error("alphabet error: {0}")]
    Alphabet(#[from] compact_genome::interface::alphabet::AlphabetError),

    #[error("model serialisation error: {0}")]
    ModelSerialisation(#[from] ciborium::ser::Error<std::io::Error>),

    #[error("could not initialise logger: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("order = {0} is not supported, the maximum order is {}", MAX_ORDER)]
    UnsupportedOrder(usize),

    #[error("the training sequence of length {length} is too short for order {order}, it must be longer than the order")]
    SequenceTooShort { length: usize, order: usize },

    #[error("the training sequence contains the character {character:?} at position {position}, which is not one of A, C, G, T")]
    InvalidCharacter { character: char, position: usize },

    #[error("the context {context:?} has length {actual}, but at least {expected} characters are required")]
    ContextLength {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("the input must contain exactly one sequence, but it contains {0}")]
    InputRecordCount(usize),

    #[error("the requested sequence length is zero")]
    ZeroLength,

    #[error("the requested sequence count is zero")]
    ZeroCount,

    #[error("the model has not been trained")]
    Untrained,

    #[error("the primary table of a trained chain is empty")]
    EmptyPrimaryTable,

    #[error("the auxiliary stack is empty, an order 0 model has no fallback")]
    EmptyAuxiliaryStack,

    #[error("no auxiliary order has an entry for every possible context")]
    NoCompleteFallback,

    #[error("could not build a categorical distribution: {0}")]
    Distribution(#[from] WeightedError),

    #[error("the context {context:?} is missing from the fallback table of order {order}")]
    FallbackMiss { context: String, order: usize },
}

/// Coarse classification of [`Error`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ErrorKind {
    /// The caller supplied an unusable sequence, order, length or count.
    InvalidInput,
    /// Fallback resolution could not produce a usable model.
    Configuration,
    /// The coverage guarantee of the fallback table was violated.
    FallbackMiss,
    /// Reading or writing files, or setting up the process.
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnsupportedOrder(_)
            | Error::SequenceTooShort { .. }
            | Error::InvalidCharacter { .. }
            | Error::ContextLength { .. }
            | Error::InputRecordCount(_)
            | Error::ZeroLength
            | Error::ZeroCount
            | Error::Untrained => ErrorKind::InvalidInput,
            Error::EmptyPrimaryTable
            | Error::EmptyAuxiliaryStack
            | Error::NoCompleteFallback
            | Error::Distribution(_) => ErrorKind::Configuration,
            Error::FallbackMiss { .. } => ErrorKind::FallbackMiss,
            Error::IO(_)
            | Error::GenomeIO(_)
            | Error::Alphabet(_)
            | Error::ModelSerialisation(_)
            | Error::Logger(_) => ErrorKind::Io,
        }
    }
}
