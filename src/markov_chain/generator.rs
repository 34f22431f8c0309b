use rand::{seq::IteratorRandom, Rng};

use crate::{
    alphabet::Nucleotide,
    error::{Error, Result},
};

use super::{
    context::{nucleotide_at, ContextWindow, PackedContext},
    TrainedChain,
};

/// An endless stream of nucleotides walking the chain.
///
/// The first `order` nucleotides are an initial context chosen uniformly from the contexts of the
/// primary table, every further nucleotide is sampled from the context formed by its predecessors.
pub struct NucleotideGenerator<'model, 'rng, RandomNumberGenerator: Rng> {
    chain: &'model TrainedChain,
    rng: &'rng mut RandomNumberGenerator,
    initial_context: Option<PackedContext>,
    next_index: usize,
    window: ContextWindow,
}

impl<'model, 'rng, RandomNumberGenerator: Rng>
    NucleotideGenerator<'model, 'rng, RandomNumberGenerator>
{
    pub fn new(chain: &'model TrainedChain, rng: &'rng mut RandomNumberGenerator) -> Self {
        Self {
            chain,
            rng,
            initial_context: None,
            next_index: 0,
            window: ContextWindow::from_context(0, chain.order),
        }
    }
}

impl<RandomNumberGenerator: Rng> Iterator for NucleotideGenerator<'_, '_, RandomNumberGenerator> {
    type Item = Result<Nucleotide>;

    fn next(&mut self) -> Option<Self::Item> {
        let order = self.chain.order;

        if let Some(initial_context) = self.initial_context {
            if self.next_index < order {
                let result = nucleotide_at(initial_context, order, self.next_index);
                self.next_index += 1;
                Some(Ok(result))
            } else {
                let result = self.chain.sample_packed(self.window.context(), self.rng);
                if let Ok(nucleotide) = result {
                    self.window.push(nucleotide);
                }
                Some(result)
            }
        } else {
            // Training always observes at least one context.
            let Some(initial_context) = self.chain.primary.contexts().choose(self.rng) else {
                return Some(Err(Error::EmptyPrimaryTable));
            };
            self.initial_context = Some(initial_context);
            self.window = ContextWindow::from_context(initial_context, order);
            self.next_index = 0;
            self.next()
        }
    }
}

/// A lazy producer of generated sequences.
///
/// Each call to `next` generates one full sequence.
/// Without a count the stream never ends, dropping it is the only way of stopping it.
/// After the first error the stream is exhausted.
pub struct SequenceStream<'model, RandomNumberGenerator: Rng> {
    chain: &'model TrainedChain,
    rng: RandomNumberGenerator,
    length: usize,
    remaining: Option<usize>,
}

impl<'model, RandomNumberGenerator: Rng> SequenceStream<'model, RandomNumberGenerator> {
    pub(super) fn new(
        chain: &'model TrainedChain,
        length: usize,
        count: Option<usize>,
        rng: RandomNumberGenerator,
    ) -> Self {
        Self {
            chain,
            rng,
            length,
            remaining: count,
        }
    }
}

impl<RandomNumberGenerator: Rng> Iterator for SequenceStream<'_, RandomNumberGenerator> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.remaining {
            Some(0) => return None,
            Some(remaining) => *remaining -= 1,
            None => {}
        }

        let result = self.chain.generate_sequence(self.length, &mut self.rng);
        if result.is_err() {
            self.remaining = Some(0);
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.remaining {
            Some(remaining) => (0, Some(remaining)),
            None => (usize::MAX, None),
        }
    }
}
