//! Markov chain models of DNA sequences.
//!
//! A [`MarkovChain`] of order `k` is trained on a single sequence and then generates new sequences
//! that preserve the `k`-mer transition statistics of the training sequence.
//! Contexts that never occurred as the start of a transition are resolved by a lower order
//! fallback table that covers every possible context of its order.
//!
//! ```
//! use mcgen::MarkovChain;
//! use rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256PlusPlus;
//!
//! let mut chain = MarkovChain::new(2)?;
//! chain.train("GATTACAGATTACA")?;
//!
//! let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
//! let sequences = chain.generate(Some(20), 3, &mut rng)?;
//! assert!(sequences.iter().all(|sequence| sequence.len() == 20));
//! # Ok::<(), mcgen::error::Error>(())
//! ```

pub mod alphabet;
pub mod error;
pub mod markov_chain;

pub use alphabet::Nucleotide;
pub use error::{Error, ErrorKind, Result};
pub use markov_chain::{MarkovChain, Topology, TrainedChain};
