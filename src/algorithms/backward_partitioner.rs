// Backward critical-path partitioning over a decomposition forest.
//
// The heaviest leaf-to-root chain is found by descending from the heaviest
// node into its heaviest child. The chain is then cut greedily into parts
// from the leaf up, and every node off the chain follows its parent.

use tracing::debug;

use crate::algorithms::{part_id, run_forest_partitioner, Error, Metadata};
use crate::balance::{BalanceMode, PartitionConfig};
use crate::forest::Forest;
use crate::{Partition, PartId};

// Index of the heaviest element; ties go to the element listed first.
fn first_heaviest<I>(nodes: I, weights: &[u64]) -> Option<usize>
where
    I: DoubleEndedIterator<Item = usize>,
{
    nodes.rev().max_by_key(|&node| weights[node])
}

fn backward_partitioner(
    partition: &mut [Option<PartId>],
    forest: &Forest,
    mode: BalanceMode,
    max_component: u64,
) -> Result<usize, Error> {
    let mut component_below = forest.subtree_weights(mode);

    let Some(mut critical) = first_heaviest(0..forest.len(), &component_below) else {
        return Err(Error::EmptyForest);
    };
    while let Some(kid) = first_heaviest(forest.kids(critical).iter().copied(), &component_below) {
        // The chain below `critical` is cut separately, so it no longer counts
        // towards the weight recorded for `critical` itself.
        component_below[critical] -= component_below[kid];
        critical = kid;
    }

    let mut cur_part = 0usize;
    let mut part_size = 0u64;
    let mut chain = Some(critical);
    while let Some(node) = chain {
        if part_size > 0 && part_size + component_below[node] > max_component {
            cur_part += 1;
            part_size = 0;
            debug!(node, part = cur_part, "opened part on critical chain");
        }
        part_size += component_below[node];
        partition[node] = Some(part_id(cur_part)?);
        chain = forest.parent(node);
    }

    let last_part = part_id(cur_part)?;
    for node in (0..forest.len()).rev() {
        if partition[node].is_none() {
            partition[node] = match forest.parent(node) {
                Some(parent) => partition[parent],
                None => Some(last_part),
            };
        }
    }

    Ok(cur_part + 1)
}

/// Backward Critical-Path Partitioner
///
/// Cuts the heaviest root-to-leaf chain of the forest into consecutive parts of
/// at most `max_component` weight; the rest of the forest follows the chain
/// node it hangs from. Other trees of the forest join the last part. Runs whose
/// result would overflow a part are reported as
/// [`Error::CapacityExceeded`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BackwardPartitioner {
    /// Number of parts, balance mode and slack.
    pub config: PartitionConfig,
}

impl<'a> Partition<&'a Forest> for BackwardPartitioner {
    type Metadata = Metadata;
    type Error = Error;

    fn partition(
        &mut self,
        part_ids: &mut [Option<PartId>],
        forest: &'a Forest,
    ) -> Result<Self::Metadata, Self::Error> {
        let mode = self.config.mode;
        run_forest_partitioner("backward", &self.config, part_ids, forest, |part_ids, max_component| {
            backward_partitioner(part_ids, forest, mode, max_component)
        })
    }
}
