//! Packed k-mer contexts.
//!
//! A context of order `k` is stored as `2 * k` bits of a `u64`, two bits per nucleotide.
//! The most recent nucleotide occupies the lowest two bits, so the suffix of length `j`
//! of a context is simply its lowest `2 * j` bits.

use crate::alphabet::{Nucleotide, ALPHABET_SIZE};

/// The highest supported order, limited by the width of the packed representation.
pub const MAX_ORDER: usize = 31;

const BITS_PER_NUCLEOTIDE: usize = 2;

pub type PackedContext = u64;

pub fn mask(order: usize) -> PackedContext {
    debug_assert!(order <= MAX_ORDER);
    (1 << (BITS_PER_NUCLEOTIDE * order)) - 1
}

/// The number of distinct contexts of the given order, i.e. `4^order`.
pub fn context_count(order: usize) -> u64 {
    debug_assert!(order <= MAX_ORDER);
    (ALPHABET_SIZE as u64).pow(order as u32)
}

pub fn suffix(context: PackedContext, order: usize) -> PackedContext {
    context & mask(order)
}

pub fn pack(nucleotides: impl IntoIterator<Item = Nucleotide>) -> PackedContext {
    nucleotides.into_iter().fold(0, |context, nucleotide| {
        (context << BITS_PER_NUCLEOTIDE) | nucleotide.index() as PackedContext
    })
}

/// The nucleotide at `position` of a context, counting from the oldest nucleotide.
pub fn nucleotide_at(context: PackedContext, order: usize, position: usize) -> Nucleotide {
    debug_assert!(position < order);
    let shift = BITS_PER_NUCLEOTIDE * (order - position - 1);
    Nucleotide::ALL[((context >> shift) & 0b11) as usize]
}

/// Decodes a context of the given order, oldest nucleotide first.
pub fn unpack(context: PackedContext, order: usize) -> impl Iterator<Item = Nucleotide> {
    (0..order).map(move |position| nucleotide_at(context, order, position))
}

pub fn to_string(context: PackedContext, order: usize) -> String {
    unpack(context, order).map(Nucleotide::to_char).collect()
}

/// A window over the last `order` nucleotides of a growing sequence.
///
/// Pushing a nucleotide advances the window by one position.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ContextWindow {
    order: usize,
    context: PackedContext,
}

impl ContextWindow {
    pub fn from_context(context: PackedContext, order: usize) -> Self {
        debug_assert!(order <= MAX_ORDER);
        Self {
            order,
            context: suffix(context, order),
        }
    }

    pub fn push(&mut self, nucleotide: Nucleotide) {
        self.context =
            ((self.context << BITS_PER_NUCLEOTIDE) | nucleotide.index() as PackedContext)
                & mask(self.order);
    }

    pub fn context(&self) -> PackedContext {
        self.context
    }
}
