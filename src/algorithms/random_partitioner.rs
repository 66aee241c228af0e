use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::algorithms::{check_part_count, part_id, Error, Metadata};
use crate::{Partition, PartId};

/// Random Partitioner
///
/// Assigns every element a uniformly random part. Useful as a worst case to
/// compare the other partitioners against; it gives no balance guarantee, so
/// the reported capacity is the largest load it happened to produce.
#[derive(Debug, Clone, Copy)]
pub struct RandomPartitioner {
    /// Number of partitions
    pub num_parts: usize,

    /// Seed for the random source; `None` draws one from the operating system.
    pub seed: Option<u64>,
}

impl Default for RandomPartitioner {
    fn default() -> Self {
        RandomPartitioner { num_parts: 2, seed: None }
    }
}

impl Partition<()> for RandomPartitioner {
    type Metadata = Metadata;
    type Error = Error;

    fn partition(&mut self, part_ids: &mut [Option<PartId>], _: ()) -> Result<Self::Metadata, Self::Error> {
        check_part_count(self.num_parts)?;

        let mut rng = match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        let mut loads = vec![0u64; self.num_parts];
        for slot in part_ids.iter_mut() {
            let part = rng.gen_range(0..self.num_parts);
            loads[part] += 1;
            *slot = Some(part_id(part)?);
        }

        Ok(Metadata {
            parts_opened: self.num_parts,
            max_component: loads.into_iter().max().unwrap_or(0),
        })
    }
}
