use std::collections::BTreeMap;

use rand::{
    distributions::{Distribution as _, WeightedIndex},
    Rng,
};

use crate::{
    alphabet::{Nucleotide, ALPHABET_SIZE},
    error::Result,
};

use super::context::{context_count, PackedContext};

/// Raw transition counts out of every observed context of a fixed order.
#[derive(Debug, Clone)]
pub struct TransitionCounts {
    order: usize,
    counts: BTreeMap<PackedContext, [u64; ALPHABET_SIZE]>,
}

/// Normalised transition probabilities out of every observed context of a fixed order.
#[derive(Debug, Clone)]
pub struct FrequencyTable {
    order: usize,
    distributions: BTreeMap<PackedContext, Distribution>,
}

/// The categorical distribution of the successors of one context.
#[derive(Debug, Clone)]
pub struct Distribution {
    probabilities: [f64; ALPHABET_SIZE],
    total: u64,
    sampler: WeightedIndex<f64>,
}

impl TransitionCounts {
    pub fn new(order: usize) -> Self {
        Self {
            order,
            counts: Default::default(),
        }
    }

    pub fn record(&mut self, context: PackedContext, successor: Nucleotide) {
        self.counts.entry(context).or_insert([0; ALPHABET_SIZE])[successor.index()] += 1;
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// True if every one of the `4^order` contexts has been observed.
    pub fn is_complete(&self) -> bool {
        self.counts.len() as u64 == context_count(self.order)
    }

    pub fn normalize(self) -> Result<FrequencyTable> {
        let distributions = self
            .counts
            .into_iter()
            .map(|(context, counts)| Ok((context, Distribution::from_counts(counts)?)))
            .collect::<Result<_>>()?;

        Ok(FrequencyTable {
            order: self.order,
            distributions,
        })
    }
}

impl FrequencyTable {
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn len(&self) -> usize {
        self.distributions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distributions.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.distributions.len() as u64 == context_count(self.order)
    }

    pub fn get(&self, context: PackedContext) -> Option<&Distribution> {
        self.distributions.get(&context)
    }

    /// Iterates over all contexts in ascending packed order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (PackedContext, &Distribution)> {
        self.distributions
            .iter()
            .map(|(context, distribution)| (*context, distribution))
    }

    pub fn contexts(&self) -> impl ExactSizeIterator<Item = PackedContext> + '_ {
        self.distributions.keys().copied()
    }

    /// The number of transitions this table was built from.
    pub fn total_observations(&self) -> u64 {
        self.distributions
            .values()
            .map(|distribution| distribution.total)
            .sum()
    }
}

impl Distribution {
    fn from_counts(counts: [u64; ALPHABET_SIZE]) -> Result<Self> {
        let total: u64 = counts.iter().sum();
        debug_assert!(total > 0);
        let probabilities = counts.map(|count| count as f64 / total as f64);
        let sampler = WeightedIndex::new(probabilities)?;

        Ok(Self {
            probabilities,
            total,
            sampler,
        })
    }

    pub fn probability(&self, nucleotide: Nucleotide) -> f64 {
        self.probabilities[nucleotide.index()]
    }

    pub fn probabilities(&self) -> &[f64; ALPHABET_SIZE] {
        &self.probabilities
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn sample(&self, rng: &mut impl Rng) -> Nucleotide {
        Nucleotide::ALL[self.sampler.sample(rng)]
    }
}
