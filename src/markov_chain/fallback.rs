use log::{debug, info, warn};

use crate::error::{Error, Result};

use super::frequency_table::{FrequencyTable, TransitionCounts};

/// The lower order table consulted when the primary table has no entry for a context.
#[derive(Debug, Clone)]
pub struct Fallback {
    pub(super) order: usize,
    pub(super) table: FrequencyTable,
}

impl Fallback {
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn table(&self) -> &FrequencyTable {
        &self.table
    }
}

/// Selects the highest order of the auxiliary stack that has an entry for every possible context.
///
/// The stack is indexed by order, i.e. `stack[j]` counts transitions out of contexts of length `j`.
/// Only the selected table gets normalised, the others are dropped.
pub fn resolve(stack: Vec<TransitionCounts>) -> Result<Fallback> {
    if stack.is_empty() {
        return Err(Error::EmptyAuxiliaryStack);
    }
    let highest_order = stack.len() - 1;

    for counts in stack.into_iter().rev() {
        debug_assert!(counts.order() <= highest_order);
        debug!(
            "Auxiliary order {} has {} of {} contexts",
            counts.order(),
            counts.len(),
            super::context::context_count(counts.order()),
        );

        if counts.is_complete() {
            let order = counts.order();
            if order == 0 && highest_order > 0 {
                warn!("No auxiliary order above 0 covers all contexts, unseen contexts will be sampled from the base composition");
            }
            info!("Using fallback of order {order}");

            return Ok(Fallback {
                order,
                table: counts.normalize()?,
            });
        }
    }

    Err(Error::NoCompleteFallback)
}
