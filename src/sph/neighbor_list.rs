pub type ParticleIndex = u32;

/// Per-destination neighbor lists, flattened into a single compact array.
///
/// Produced once per step by an external neighborhood search; this core never
/// searches itself. Lists are semantically unordered (all reductions over them
/// are commutative sums). The mixed correction walks each list twice and
/// relies on the list staying stable within one assembly call, which holding
/// the flattened copy guarantees.
pub struct NeighborLists {
    starts: Vec<u32>, // num_destinations + 1 entries
    entries: Vec<ParticleIndex>,
}

impl NeighborLists {
    pub fn from_lists(lists: &[Vec<ParticleIndex>]) -> NeighborLists {
        let mut starts = Vec::with_capacity(lists.len() + 1);
        let mut entries = Vec::with_capacity(lists.iter().map(|l| l.len()).sum());
        starts.push(0);
        for list in lists {
            entries.extend_from_slice(list);
            starts.push(entries.len() as u32);
        }
        NeighborLists { starts, entries }
    }

    pub fn num_destinations(&self) -> usize {
        self.starts.len() - 1
    }

    #[inline]
    pub fn neighbors(&self, destination: usize) -> &[ParticleIndex] {
        &self.entries[self.starts[destination] as usize..self.starts[destination + 1] as usize]
    }

    pub fn num_neighbors(&self, destination: usize) -> usize {
        self.neighbors(destination).len()
    }
}
