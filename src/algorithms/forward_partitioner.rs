// Forward bin-packing over a decomposition forest.
//
// Nodes are visited child before parent while the weight of the still uncut
// subtree below each node is accumulated. As soon as a subtree outgrows the
// part capacity, its direct children are packed into parts first-fit
// decreasing until the remainder fits again.

use tracing::debug;

use crate::algorithms::{part_id, run_forest_partitioner, Error, Metadata};
use crate::balance::{BalanceMode, PartSizes, PartitionConfig};
use crate::forest::Forest;
use crate::{Partition, PartId};

fn forward_partitioner(
    partition: &mut [Option<PartId>],
    forest: &Forest,
    mode: BalanceMode,
    max_component: u64,
) -> Result<usize, Error> {
    let mut part_sizes = PartSizes::growable(max_component);
    let mut component_below = vec![0u64; forest.len()];
    let mut kids = Vec::new();

    for node in 0..forest.len() {
        component_below[node] += forest.weight(node, mode);

        if component_below[node] > max_component {
            // Heaviest children first. The sort is stable so equal weights keep
            // their id order.
            kids.clear();
            kids.extend_from_slice(forest.kids(node));
            kids.sort_by(|&lhs, &rhs| component_below[rhs].cmp(&component_below[lhs]));

            loop {
                for &kid in &kids {
                    if component_below[node] <= max_component {
                        break;
                    }
                    if partition[kid].is_some() {
                        continue;
                    }
                    debug_assert!(component_below[kid] <= max_component);

                    if let Some(part) = part_sizes.first_fit(component_below[kid]) {
                        component_below[node] -= component_below[kid];
                        part_sizes.add(part, component_below[kid]);
                        partition[kid] = Some(part_id(part)?);
                    }
                }

                if component_below[node] <= max_component {
                    break;
                }
                if kids.iter().all(|&kid| partition[kid].is_some()) {
                    return Err(Error::Unpackable {
                        node,
                        weight: component_below[node],
                        max_component,
                    });
                }

                // Packing failed with the parts at hand.
                let part = part_sizes.open();
                debug!(node, part, "opened part");
            }
        }

        if let Some(parent) = forest.parent(node) {
            component_below[parent] += component_below[node];
        }
    }

    // Whatever was never packed follows its parent. Roots, and nodes whose
    // parent was never placed, go to the most recently opened part that still
    // has room for their remaining subtree.
    for node in (0..forest.len()).rev() {
        if partition[node].is_none() {
            if let Some(parent) = forest.parent(node) {
                partition[node] = partition[parent];
            }
        }

        if partition[node].is_none() {
            let part = match part_sizes.last_fit(component_below[node]) {
                Some(part) => part,
                None => {
                    let part = part_sizes.open();
                    debug!(node, part, "opened part for unpacked subtree");
                    part
                }
            };
            part_sizes.add(part, component_below[node]);
            partition[node] = Some(part_id(part)?);
        }
    }

    Ok(part_sizes.high_water())
}

/// Forward Bin-Packing Partitioner
///
/// Partitions a decomposition forest by packing subtrees into parts of at most
/// `max_component` weight, visiting nodes from the leaves up. The number of
/// parts requested only sets the capacity; more parts are opened when the
/// subtrees cannot be packed into fewer.
///
/// # Example
///
/// ```rust
/// use forestcut::algorithms::ForwardPartitioner;
/// use forestcut::balance::{BalanceMode, PartitionConfig};
/// use forestcut::forest::Forest;
/// use forestcut::Partition;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
///
///     let forest = Forest::with_unit_weights(vec![Some(2), Some(2), None])?;
///     let config = PartitionConfig::new(2, BalanceMode::Vertex, 2.0)?;
///     let mut partition = vec![None; forest.len()];
///
///     ForwardPartitioner { config }.partition(&mut partition, &forest)?;
///
///     assert_eq!(partition, vec![Some(0), Some(1), Some(1)]);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardPartitioner {
    /// Number of parts, balance mode and slack.
    pub config: PartitionConfig,
}

impl<'a> Partition<&'a Forest> for ForwardPartitioner {
    type Metadata = Metadata;
    type Error = Error;

    fn partition(
        &mut self,
        part_ids: &mut [Option<PartId>],
        forest: &'a Forest,
    ) -> Result<Self::Metadata, Self::Error> {
        let mode = self.config.mode;
        run_forest_partitioner("forward", &self.config, part_ids, forest, |part_ids, max_component| {
            forward_partitioner(part_ids, forest, mode, max_component)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::compute_parts_load;

    fn vertex_config(num_parts: usize, balance_factor: f64) -> PartitionConfig {
        PartitionConfig::new(num_parts, BalanceMode::Vertex, balance_factor).unwrap()
    }

    #[test]
    fn test_three_node_forest_without_slack() {
        // Arrange
        let forest = Forest::with_unit_weights(vec![Some(2), Some(2), None]).unwrap();
        let mut partition = vec![None; 3];

        // Act
        let metadata = ForwardPartitioner { config: vertex_config(2, 1.0) }
            .partition(&mut partition, &forest)
            .unwrap();

        // Assert
        // A capacity of one node per part leaves every node on its own.
        assert_eq!(metadata.max_component, 1);
        assert_eq!(metadata.parts_opened, 3);
        assert_eq!(partition, vec![Some(0), Some(1), Some(2)]);
        let loads = compute_parts_load(&partition, metadata.parts_opened, &[1, 1, 1]);
        assert!(loads.iter().all(|&load| load <= 2));
    }

    #[test]
    fn test_three_node_forest_with_slack() {
        // Arrange
        let forest = Forest::with_unit_weights(vec![Some(2), Some(2), None]).unwrap();
        let mut partition = vec![None; 3];

        // Act
        let metadata = ForwardPartitioner { config: vertex_config(2, 2.0) }
            .partition(&mut partition, &forest)
            .unwrap();

        // Assert
        assert_eq!(metadata, Metadata { parts_opened: 2, max_component: 2 });
        assert_eq!(partition, vec![Some(0), Some(1), Some(1)]);
    }

    #[test]
    fn test_heaviest_child_is_packed_first() {
        // Arrange
        //          5
        //       /  |  \
        //      0   3   4
        //         / \
        //        1   2
        let forest = Forest::new(
            vec![Some(5), Some(3), Some(3), Some(5), Some(5), None],
            vec![1, 1, 1, 1, 1, 1],
        )
        .unwrap();
        let mut partition = vec![None; forest.len()];

        // Act
        let metadata = ForwardPartitioner { config: vertex_config(2, 1.0) }
            .partition(&mut partition, &forest)
            .unwrap();

        // Assert
        // Node 5 holds 6 > 3: child 3 (weight 3) is packed into part 0, which
        // leaves 3 below the root.
        assert_eq!(metadata, Metadata { parts_opened: 2, max_component: 3 });
        assert_eq!(partition, vec![Some(1), Some(0), Some(0), Some(0), Some(1), Some(1)]);
    }

    #[test]
    fn test_edge_weighted_chain() {
        // Arrange
        let forest = Forest::new(vec![Some(1), Some(2), Some(3), None], vec![2, 2, 2, 2]).unwrap();
        let config = PartitionConfig::new(2, BalanceMode::Edge, 1.0).unwrap();
        let mut partition = vec![None; forest.len()];

        // Act
        let metadata = ForwardPartitioner { config }.partition(&mut partition, &forest).unwrap();

        // Assert
        assert_eq!(metadata, Metadata { parts_opened: 2, max_component: 4 });
        assert_eq!(partition, vec![Some(0), Some(0), Some(1), Some(1)]);
    }

    #[test]
    fn test_unpackable_leaf() {
        // Arrange
        let forest = Forest::new(vec![Some(1), None], vec![10, 1]).unwrap();
        let config = PartitionConfig::new(2, BalanceMode::Edge, 1.0).unwrap();
        let mut partition = vec![None; 2];

        // Act
        let result = ForwardPartitioner { config }.partition(&mut partition, &forest);

        // Assert
        assert!(matches!(
            result,
            Err(Error::Unpackable { node: 0, weight: 10, max_component: 5 })
        ));
    }

    #[test]
    fn test_input_length_mismatch() {
        let forest = Forest::with_unit_weights(vec![None, None]).unwrap();
        let mut partition = vec![None; 3];
        let result = ForwardPartitioner::default().partition(&mut partition, &forest);
        assert!(matches!(result, Err(Error::InputLenMismatch { expected: 2, actual: 3 })));
    }
}
