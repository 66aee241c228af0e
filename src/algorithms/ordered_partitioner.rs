// Baseline partitioners: walk the forest in a fixed order and fill parts one
// after another. No packing, no backtracking.

use rayon::slice::ParallelSliceMut;

use crate::algorithms::{part_id, run_forest_partitioner, Error, Metadata};
use crate::balance::{BalanceMode, PartitionConfig};
use crate::forest::Forest;
use crate::{Partition, PartId};

/// Order in which [`OrderedPartitioner`] visits forest nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeOrder {
    /// Deepest nodes first.
    #[default]
    Depth,

    /// Lowest nodes (leaves) first.
    Height,

    /// Plain id order.
    Naive,
}

// Both sorts are stable, so nodes with equal keys stay in id order no matter
// how many threads rayon uses.
fn node_order(forest: &Forest, order: NodeOrder) -> Vec<usize> {
    let mut nodes: Vec<usize> = (0..forest.len()).collect();
    match order {
        NodeOrder::Depth => {
            let depth = forest.depths();
            nodes.par_sort_by(|&lhs, &rhs| depth[rhs].cmp(&depth[lhs]));
        }
        NodeOrder::Height => {
            let height = forest.heights();
            nodes.par_sort_by_key(|&node| height[node]);
        }
        NodeOrder::Naive => {}
    }
    nodes
}

fn ordered_partitioner(
    partition: &mut [Option<PartId>],
    forest: &Forest,
    order: NodeOrder,
    mode: BalanceMode,
    max_component: u64,
) -> Result<usize, Error> {
    let mut cur_part = 0usize;
    let mut cur_size = 0u64;

    for node in node_order(forest, order) {
        let weight = forest.weight(node, mode);
        if cur_size > 0 && cur_size + weight > max_component {
            cur_part += 1;
            cur_size = 0;
        }

        partition[node] = Some(part_id(cur_part)?);
        cur_size += weight;
        if cur_size >= max_component {
            cur_part += 1;
            cur_size = 0;
        }
    }

    Ok(if cur_size > 0 { cur_part + 1 } else { cur_part })
}

/// Depth-first, height-first and naive sequential baselines.
///
/// Nodes are sorted by the chosen [`NodeOrder`] and assigned to the current
/// part until its weight reaches `max_component`, then the next part is
/// started. A node that does not fit the room left in a non-empty part starts
/// the next part. Only a node heavier than `max_component` on its own overflows,
/// which is reported as [`Error::CapacityExceeded`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderedPartitioner {
    /// Number of parts, balance mode and slack.
    pub config: PartitionConfig,

    /// Visiting order of the forest nodes.
    pub order: NodeOrder,
}

impl<'a> Partition<&'a Forest> for OrderedPartitioner {
    type Metadata = Metadata;
    type Error = Error;

    fn partition(
        &mut self,
        part_ids: &mut [Option<PartId>],
        forest: &'a Forest,
    ) -> Result<Self::Metadata, Self::Error> {
        let (mode, order) = (self.config.mode, self.order);
        let algorithm = match order {
            NodeOrder::Depth => "depth",
            NodeOrder::Height => "height",
            NodeOrder::Naive => "naive",
        };
        run_forest_partitioner(algorithm, &self.config, part_ids, forest, |part_ids, max_component| {
            ordered_partitioner(part_ids, forest, order, mode, max_component)
        })
    }
}
