use log::{debug, info, trace};
use rand::Rng;

use crate::{
    alphabet::Nucleotide,
    error::{Error, Result},
};

use context::{pack, suffix, ContextWindow, PackedContext, MAX_ORDER};
use fallback::Fallback;
use frequency_table::{FrequencyTable, TransitionCounts};
use generator::{NucleotideGenerator, SequenceStream};

pub mod context;
pub mod fallback;
pub mod frequency_table;
pub mod generator;
mod serde;

/// How the ends of the training sequence are treated.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum Topology {
    /// The sequence has two ends, the last `order` nucleotides are never a context.
    #[default]
    Linear,
    /// The sequence is a ring, its end continues at its beginning.
    Circular,
}

/// A k-th order Markov chain over DNA.
///
/// Construct with an order, then [`train`](Self::train) on a sequence before generating.
#[derive(Debug, Clone)]
pub struct MarkovChain {
    order: usize,
    topology: Topology,
    trained: Option<TrainedChain>,
}

/// The immutable state derived from one training sequence.
#[derive(Debug, Clone)]
pub struct TrainedChain {
    order: usize,
    topology: Topology,
    primary: FrequencyTable,
    fallback: Option<Fallback>,
    sequence: String,
}

impl MarkovChain {
    pub fn new(order: usize) -> Result<Self> {
        Self::with_topology(order, Topology::Linear)
    }

    pub fn with_topology(order: usize, topology: Topology) -> Result<Self> {
        if order > MAX_ORDER {
            return Err(Error::UnsupportedOrder(order));
        }

        Ok(Self {
            order,
            topology,
            trained: None,
        })
    }

    /// Trains the chain on the given sequence, replacing any previous training.
    ///
    /// If training fails, the chain is left untrained.
    pub fn train(&mut self, sequence: &str) -> Result<()> {
        self.trained = None;
        self.trained = Some(TrainedChain::train(self.order, self.topology, sequence)?);
        Ok(())
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn is_trained(&self) -> bool {
        self.trained.is_some()
    }

    pub fn trained(&self) -> Result<&TrainedChain> {
        self.trained.as_ref().ok_or(Error::Untrained)
    }

    pub fn sample(&self, context: &str, rng: &mut impl Rng) -> Result<Nucleotide> {
        self.trained()?.sample(context, rng)
    }

    pub fn generate(
        &self,
        length: Option<usize>,
        count: usize,
        rng: &mut impl Rng,
    ) -> Result<Vec<String>> {
        self.trained()?.generate(length, count, rng)
    }

    pub fn stream<RandomNumberGenerator: Rng>(
        &self,
        length: Option<usize>,
        count: Option<usize>,
        rng: RandomNumberGenerator,
    ) -> Result<SequenceStream<'_, RandomNumberGenerator>> {
        self.trained()?.stream(length, count, rng)
    }
}

impl TrainedChain {
    pub fn train(order: usize, topology: Topology, sequence: &str) -> Result<Self> {
        if order > MAX_ORDER {
            return Err(Error::UnsupportedOrder(order));
        }

        let nucleotides = parse_nucleotides(sequence)?;
        let length = nucleotides.len();
        if length <= order {
            return Err(Error::SequenceTooShort { length, order });
        }

        let transition_count = match topology {
            Topology::Linear => length - order,
            Topology::Circular => length,
        };

        // Auxiliary tables for all lower orders are counted in the same pass.
        let mut primary = TransitionCounts::new(order);
        let mut auxiliary_stack: Vec<_> = (0..order).map(TransitionCounts::new).collect();
        let mut window =
            ContextWindow::from_context(pack(nucleotides[..order].iter().copied()), order);

        for offset in 0..transition_count {
            let successor = nucleotides[(offset + order) % length];
            let context = window.context();
            primary.record(context, successor);
            for (auxiliary_order, counts) in auxiliary_stack.iter_mut().enumerate() {
                counts.record(suffix(context, auxiliary_order), successor);
            }
            window.push(successor);
        }

        debug!(
            "Counted {transition_count} transitions out of {} contexts of order {order}",
            primary.len()
        );

        let primary = primary.normalize()?;
        let fallback = if order == 0 {
            None
        } else {
            Some(fallback::resolve(auxiliary_stack)?)
        };

        info!(
            "Trained {topology:?} chain of order {order} on {length} nucleotides with {} primary contexts",
            primary.len()
        );

        Ok(Self {
            order,
            topology,
            primary,
            fallback,
            sequence: nucleotides.into_iter().map(Nucleotide::to_char).collect(),
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn primary_table(&self) -> &FrequencyTable {
        &self.primary
    }

    pub fn fallback(&self) -> Option<&Fallback> {
        self.fallback.as_ref()
    }

    pub fn fallback_order(&self) -> Option<usize> {
        self.fallback.as_ref().map(Fallback::order)
    }

    pub fn fallback_table(&self) -> Option<&FrequencyTable> {
        self.fallback.as_ref().map(Fallback::table)
    }

    /// The upper case training sequence.
    pub fn training_sequence(&self) -> &str {
        &self.sequence
    }

    /// Samples a successor of the last `order` nucleotides of `context`.
    pub fn sample(&self, context: &str, rng: &mut impl Rng) -> Result<Nucleotide> {
        let nucleotides = parse_nucleotides(context)?;
        if nucleotides.len() < self.order {
            return Err(Error::ContextLength {
                context: context.to_string(),
                expected: self.order,
                actual: nucleotides.len(),
            });
        }

        let context = pack(nucleotides[nucleotides.len() - self.order..].iter().copied());
        self.sample_packed(context, rng)
    }

    pub(crate) fn sample_packed(
        &self,
        context: PackedContext,
        rng: &mut impl Rng,
    ) -> Result<Nucleotide> {
        if let Some(distribution) = self.primary.get(context) {
            return Ok(distribution.sample(rng));
        }

        let Some(fallback) = &self.fallback else {
            return Err(Error::FallbackMiss {
                context: context::to_string(context, self.order),
                order: self.order,
            });
        };
        let fallback_context = suffix(context, fallback.order);
        trace!(
            "Context {} is unknown, sampling from fallback context {}",
            context::to_string(context, self.order),
            context::to_string(fallback_context, fallback.order),
        );

        fallback
            .table
            .get(fallback_context)
            .map(|distribution| distribution.sample(rng))
            .ok_or_else(|| Error::FallbackMiss {
                context: context::to_string(fallback_context, fallback.order),
                order: fallback.order,
            })
    }

    /// Generates one sequence of exactly `length` nucleotides.
    pub fn generate_sequence(&self, length: usize, rng: &mut impl Rng) -> Result<String> {
        if length == 0 {
            return Err(Error::ZeroLength);
        }

        NucleotideGenerator::new(self, rng)
            .take(length)
            .map(|nucleotide| nucleotide.map(Nucleotide::to_char))
            .collect()
    }

    /// Generates `count` sequences, each of `length` nucleotides or as long as the training sequence.
    pub fn generate(
        &self,
        length: Option<usize>,
        count: usize,
        rng: &mut impl Rng,
    ) -> Result<Vec<String>> {
        if count == 0 {
            return Err(Error::ZeroCount);
        }

        self.stream(length, Some(count), rng)?.collect()
    }

    /// Like [`generate`](Self::generate), but lazily and without bound if `count` is `None`.
    pub fn stream<RandomNumberGenerator: Rng>(
        &self,
        length: Option<usize>,
        count: Option<usize>,
        rng: RandomNumberGenerator,
    ) -> Result<SequenceStream<'_, RandomNumberGenerator>> {
        let length = length.unwrap_or(self.sequence.len());
        if length == 0 {
            return Err(Error::ZeroLength);
        }
        if count == Some(0) {
            return Err(Error::ZeroCount);
        }

        Ok(SequenceStream::new(self, length, count, rng))
    }
}

fn parse_nucleotides(sequence: &str) -> Result<Vec<Nucleotide>> {
    sequence
        .chars()
        .enumerate()
        .map(|(position, character)| {
            u8::try_from(character)
                .ok()
                .and_then(Nucleotide::from_ascii)
                .ok_or(Error::InvalidCharacter {
                    character,
                    position,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    use crate::{
        alphabet::Nucleotide,
        error::{Error, ErrorKind},
    };

    use super::{
        context::{context_count, pack},
        fallback::Fallback,
        frequency_table::TransitionCounts,
        MarkovChain, Topology, TrainedChain,
    };

    /// Contains every 2-mer.
    const DE_BRUIJN_2: &str = "AACAGATCCGCTGGTTA";

    fn assert_normalised(chain: &TrainedChain) {
        let tables = std::iter::once(chain.primary_table()).chain(chain.fallback_table());
        for table in tables {
            for (_, distribution) in table.iter() {
                let sum: f64 = distribution.probabilities().iter().sum();
                assert!((sum - 1.0).abs() < 1e-9, "{sum}");
                assert!(distribution.total() > 0);
            }
        }
    }

    #[test]
    fn order_one_tables() {
        let mut chain = MarkovChain::new(1).unwrap();
        chain.train("AATAAT").unwrap();
        let trained = chain.trained().unwrap();

        let primary = trained.primary_table();
        assert_eq!(primary.len(), 2);
        let a = primary.get(pack([Nucleotide::A])).unwrap();
        assert_eq!(a.probabilities(), &[0.5, 0.0, 0.0, 0.5]);
        assert_eq!(a.total(), 4);
        let t = primary.get(pack([Nucleotide::T])).unwrap();
        assert_eq!(t.probabilities(), &[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(t.total(), 1);

        assert_eq!(trained.fallback_order(), Some(0));
        assert_normalised(trained);
    }

    #[test]
    fn order_zero_is_base_composition() {
        let mut chain = MarkovChain::new(0).unwrap();
        chain.train("acgtaaca").unwrap();
        let trained = chain.trained().unwrap();

        let primary = trained.primary_table();
        assert_eq!(primary.len(), 1);
        let composition = primary.get(0).unwrap();
        assert_eq!(composition.total(), 8);
        assert_eq!(composition.probabilities(), &[0.5, 0.25, 0.125, 0.125]);
        assert!(trained.fallback().is_none());
        assert_eq!(trained.training_sequence(), "ACGTAACA");
    }

    #[test]
    fn order_zero_generation() {
        let mut chain = MarkovChain::new(0).unwrap();
        chain.train("AAAAC").unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(13);

        let sequences = chain.generate(Some(2000), 2, &mut rng).unwrap();
        assert_eq!(sequences.len(), 2);
        for sequence in &sequences {
            assert_eq!(sequence.len(), 2000);
            assert!(sequence.bytes().all(|ascii| ascii == b'A' || ascii == b'C'));
            assert!(sequence.contains('A'));
        }

        let default_length = chain.generate(None, 1, &mut rng).unwrap();
        assert_eq!(default_length[0].len(), 5);
    }

    #[test]
    fn fallback_uses_highest_complete_order() {
        let mut chain = MarkovChain::new(2).unwrap();
        chain.train(DE_BRUIJN_2).unwrap();
        let trained = chain.trained().unwrap();

        // The final 2-mer "TA" has no successor.
        assert_eq!(trained.primary_table().len(), 15);
        assert_eq!(trained.fallback_order(), Some(1));
        assert_eq!(trained.fallback_table().unwrap().len(), 4);
        assert_normalised(trained);
    }

    #[test]
    fn fallback_coverage() {
        for (sequence, order) in [
            ("AACAAC", 2),
            ("ACGTT", 2),
            (DE_BRUIJN_2, 3),
            ("TGAGGACTTTaggatAGGATTTTGTCATCATCAAAAGACATTCTTGTAAATTATATGAAACGTCGGT", 4),
        ] {
            let mut chain = MarkovChain::new(order).unwrap();
            chain.train(sequence).unwrap();
            let trained = chain.trained().unwrap();
            let fallback_order = trained.fallback_order().unwrap();
            assert!(fallback_order < order);
            assert_eq!(
                trained.fallback_table().unwrap().len() as u64,
                context_count(fallback_order)
            );
            assert_normalised(trained);
        }
    }

    #[test]
    fn incomplete_order_one() {
        let mut chain = MarkovChain::new(2).unwrap();
        chain.train("AACAAC").unwrap();
        assert_eq!(chain.trained().unwrap().fallback_order(), Some(0));
    }

    #[test]
    fn transition_count() {
        let sequence = "TGAGGACTTTAGGATAGGATTTTGTCATCATCAAAAGACATTCTTG";
        for order in 0..6 {
            let mut chain = MarkovChain::new(order).unwrap();
            chain.train(sequence).unwrap();
            assert_eq!(
                chain.trained().unwrap().primary_table().total_observations(),
                (sequence.len() - order) as u64
            );
        }
    }

    #[test]
    fn circular_training() {
        let mut chain = MarkovChain::with_topology(2, Topology::Circular).unwrap();
        chain.train("ACGTT").unwrap();
        let trained = chain.trained().unwrap();

        let primary = trained.primary_table();
        assert_eq!(primary.total_observations(), 5);
        // The ring also contains TT -> A and TA -> C.
        assert_eq!(primary.len(), 5);
        let tt = primary.get(pack([Nucleotide::T, Nucleotide::T])).unwrap();
        assert_eq!(tt.probability(Nucleotide::A), 1.0);
        assert_eq!(trained.training_sequence(), "ACGTT");

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
        let sequences = chain.generate(None, 10, &mut rng).unwrap();
        assert!(sequences.iter().all(|sequence| sequence.len() == 5));
    }

    #[test]
    fn too_short_sequence() {
        let mut chain = MarkovChain::new(3).unwrap();
        chain.train("ACGTACGT").unwrap();

        for sequence in ["", "ACG", "acg"] {
            let error = chain.train(sequence).unwrap_err();
            assert!(matches!(error, Error::SequenceTooShort { order: 3, .. }));
            assert_eq!(error.kind(), ErrorKind::InvalidInput);
            assert!(!chain.is_trained());
            assert!(matches!(chain.trained(), Err(Error::Untrained)));
        }
    }

    #[test]
    fn invalid_character() {
        let mut chain = MarkovChain::new(1).unwrap();
        let error = chain.train("ACGNT").unwrap_err();
        assert!(matches!(
            error,
            Error::InvalidCharacter {
                character: 'N',
                position: 3
            }
        ));
        assert!(matches!(
            chain.train("ACGTä").unwrap_err(),
            Error::InvalidCharacter {
                character: 'ä',
                position: 4
            }
        ));
        assert!(!chain.is_trained());
    }

    #[test]
    fn unsupported_order() {
        assert!(matches!(
            MarkovChain::new(32),
            Err(Error::UnsupportedOrder(32))
        ));
        assert!(MarkovChain::new(31).is_ok());
    }

    #[test]
    fn generated_sequences_have_requested_length() {
        let mut chain = MarkovChain::new(4).unwrap();
        chain
            .train("TGAGGACTTTaggatAGGATTTTGTCATCATCAAAAGACATTCTTGTAAATTATATGAAACGTCGGT")
            .unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

        for length in [1, 2, 3, 4, 5, 17, 100, 1000] {
            let sequences = chain.generate(Some(length), 5, &mut rng).unwrap();
            assert_eq!(sequences.len(), 5);
            for sequence in sequences {
                assert_eq!(sequence.len(), length);
                assert!(sequence.bytes().all(|ascii| b"ACGT".contains(&ascii)));
            }
        }

        let default_length = chain.generate(None, 1, &mut rng).unwrap();
        assert_eq!(default_length[0].len(), 67);
    }

    #[test]
    fn generation_is_deterministic() {
        let mut chain = MarkovChain::new(3).unwrap();
        chain.train(DE_BRUIJN_2).unwrap();

        let first = chain
            .generate(Some(200), 4, &mut Xoshiro256PlusPlus::seed_from_u64(1))
            .unwrap();
        let second = chain
            .generate(Some(200), 4, &mut Xoshiro256PlusPlus::seed_from_u64(1))
            .unwrap();
        let streamed: Vec<_> = chain
            .stream(Some(200), Some(4), Xoshiro256PlusPlus::seed_from_u64(1))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first, streamed);
    }

    #[test]
    fn generation_errors() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let mut chain = MarkovChain::new(2).unwrap();
        assert!(matches!(
            chain.generate(None, 1, &mut rng),
            Err(Error::Untrained)
        ));

        chain.train("ACGTT").unwrap();
        assert!(matches!(
            chain.generate(Some(0), 1, &mut rng),
            Err(Error::ZeroLength)
        ));
        assert!(matches!(
            chain.generate(None, 0, &mut rng),
            Err(Error::ZeroCount)
        ));
        assert!(matches!(
            chain.stream(None, Some(0), &mut rng),
            Err(Error::ZeroCount)
        ));
    }

    #[test]
    fn sample_falls_back_on_unknown_context() {
        let mut chain = MarkovChain::new(2).unwrap();
        chain.train("ACGTT").unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(9);

        // "AC" is always followed by "G".
        assert_eq!(chain.sample("AC", &mut rng).unwrap(), Nucleotide::G);
        assert_eq!(chain.sample("ttac", &mut rng).unwrap(), Nucleotide::G);
        // "TT" was never followed by anything, the base composition of the transitions is used.
        for _ in 0..100 {
            let nucleotide = chain.sample("TT", &mut rng).unwrap();
            assert!(matches!(nucleotide, Nucleotide::G | Nucleotide::T));
        }

        assert!(matches!(
            chain.sample("A", &mut rng),
            Err(Error::ContextLength {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn fallback_miss_is_reported() {
        let mut chain = MarkovChain::new(2).unwrap();
        chain.train("ACGTT").unwrap();
        let mut trained = chain.trained().unwrap().clone();

        let mut broken = TransitionCounts::new(1);
        broken.record(pack([Nucleotide::A]), Nucleotide::A);
        trained.fallback = Some(Fallback {
            order: 1,
            table: broken.normalize().unwrap(),
        });

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let error = trained.sample("TT", &mut rng).unwrap_err();
        assert!(matches!(
            &error,
            Error::FallbackMiss { context, order: 1 } if context == "T"
        ));
        assert_eq!(error.kind(), ErrorKind::FallbackMiss);
    }

    #[test]
    fn retraining_replaces_tables() {
        let mut chain = MarkovChain::new(1).unwrap();
        chain.train("AAAA").unwrap();
        chain.train("CCCCG").unwrap();
        let trained = chain.trained().unwrap();
        assert_eq!(trained.primary_table().len(), 1);
        assert_eq!(trained.primary_table().total_observations(), 4);
        assert!(trained.primary_table().get(pack([Nucleotide::A])).is_none());
    }
}
