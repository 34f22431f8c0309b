//! Serialisation of trained chains for inspection.
//!
//! Contexts are written as k-mer strings. There is no deserialisation, a summary cannot be loaded
//! back into a chain.

use serde::{
    ser::{SerializeMap, SerializeStruct},
    Serialize, Serializer,
};

use crate::alphabet::Nucleotide;

use super::{
    context,
    fallback::Fallback,
    frequency_table::{Distribution, FrequencyTable},
    Topology, TrainedChain,
};

impl Serialize for Distribution {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Distribution", 5)?;
        state.serialize_field("A", &self.probability(Nucleotide::A))?;
        state.serialize_field("C", &self.probability(Nucleotide::C))?;
        state.serialize_field("G", &self.probability(Nucleotide::G))?;
        state.serialize_field("T", &self.probability(Nucleotide::T))?;
        state.serialize_field("total", &self.total())?;
        state.end()
    }
}

impl Serialize for FrequencyTable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (context, distribution) in self.iter() {
            map.serialize_entry(&context::to_string(context, self.order()), distribution)?;
        }
        map.end()
    }
}

impl Serialize for Fallback {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Fallback", 2)?;
        state.serialize_field("order", &self.order)?;
        state.serialize_field("table", &self.table)?;
        state.end()
    }
}

impl Serialize for Topology {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Topology::Linear => serializer.serialize_unit_variant("Topology", 0, "linear"),
            Topology::Circular => serializer.serialize_unit_variant("Topology", 1, "circular"),
        }
    }
}

impl Serialize for TrainedChain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("TrainedChain", 5)?;
        state.serialize_field("order", &self.order)?;
        state.serialize_field("topology", &self.topology)?;
        state.serialize_field("training_sequence_length", &self.sequence.len())?;
        state.serialize_field("primary", &self.primary)?;
        state.serialize_field("fallback", &self.fallback)?;
        state.end()
    }
}
