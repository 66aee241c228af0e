// This file contains the implementation of the FENNEL one-pass streaming partitioner.
// # Reference
//
// Tsourakakis, Charalampos, et al. "FENNEL: Streaming graph partitioning for massive scale graphs."
// Proceedings of the 7th ACM International Conference on Web Search and Data Mining (2014): 333-342.

use tracing::{debug, info};

use crate::algorithms::{part_id, Error, Metadata};
use crate::balance::{parts_used, BalanceMode, PartSizes, PartitionConfig};
use crate::graph::GraphAccess;
use crate::{Partition, PartId};

/// Scale of the balance penalty `a * size^gamma`.
///
/// `nodes` is the vertex count, `directed_edges` twice the undirected edge
/// count and `num_parts` the number of parts.
pub(crate) fn balance_scale(nodes: f64, directed_edges: f64, num_parts: f64, gamma: f64, mode: BalanceMode) -> f64 {
    match mode {
        BalanceMode::Edge => nodes * (num_parts / directed_edges).powf(gamma),
        BalanceMode::Vertex => directed_edges * (num_parts.powf(gamma - 1.0) / nodes.powf(gamma)),
    }
}

/// Marginal balance penalty of growing a part from `size` to `size + weight`.
pub(crate) fn balance_cost(scale: f64, gamma: f64, size: f64, weight: f64) -> f64 {
    scale * (size + weight).powf(gamma) - scale * size.powf(gamma)
}

/// Pick the part with the best score among the parts that can take `weight`.
///
/// `part_value[p]` is the affinity of the element to part `p`. Only opened parts
/// and the first fresh one are scanned: a fresh part scores the same as any
/// later fresh part, and the first of equal scores wins.
pub(crate) fn best_part(
    part_sizes: &PartSizes,
    part_value: &[f64],
    weight: u64,
    scale: f64,
    gamma: f64,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for part in part_sizes.candidates() {
        // Hard balance limit.
        if !part_sizes.fits(part, weight) {
            continue;
        }
        let cost = balance_cost(scale, gamma, part_sizes.size(part) as f64, weight as f64);
        let value = part_value[part] - cost;
        if best.map_or(true, |(_, best_value)| value > best_value) {
            best = Some((part, value));
        }
    }
    best.map(|(part, _)| part)
}

#[allow(clippy::too_many_arguments)]
fn fennel_partitioner<G: GraphAccess>(
    partition: &mut [Option<PartId>],
    graph: &G,
    order: &[usize],
    mode: BalanceMode,
    num_parts: usize,
    max_component: u64,
    scale: f64,
    gamma: f64,
) -> Result<(), Error> {
    let mut part_sizes = PartSizes::bounded(num_parts, max_component);
    let mut part_value = vec![0.0; num_parts];
    let mut unordered = 0usize;

    // Vertices the order leaves out are streamed afterwards in id order.
    let stream = order.iter().copied().map(|vertex| (vertex, true))
        .chain(graph.nodes().map(|vertex| (vertex, false)));

    for (vertex, ordered) in stream {
        if !graph.contains(vertex) || partition[vertex].is_some() {
            continue;
        }
        if !ordered {
            unordered += 1;
        }

        let weight = match mode {
            BalanceMode::Edge => graph.degree(vertex) as u64,
            BalanceMode::Vertex => 1,
        };

        part_value.fill(0.0);
        for neighbor in graph.neighbors(vertex) {
            if let Some(part) = partition[neighbor] {
                part_value[usize::from(part)] += 1.0;
            }
        }

        let Some(part) = best_part(&part_sizes, &part_value, weight, scale, gamma) else {
            return Err(Error::NoRoom { vertex, weight, max_component });
        };
        if part == part_sizes.high_water() {
            debug!(vertex, part, "opened part");
        }
        partition[vertex] = Some(part_id(part)?);
        part_sizes.add(part, weight);
    }

    if unordered > 0 {
        info!(unordered, "vertices missing from the order were streamed last");
    }
    Ok(())
}

/// FENNEL Streaming Partitioner
///
/// Visits the vertices of a graph once, in the given order, and places each in
/// the part that maximises the number of already placed neighbors it joins
/// minus a convex balance penalty. No part ever exceeds `max_component`; a run
/// that cannot place a vertex fails with [`Error::NoRoom`].
///
/// # Example
///
/// ```rust
/// use forestcut::algorithms::FennelPartitioner;
/// use forestcut::balance::{BalanceMode, PartitionConfig};
/// use forestcut::graph::{Graph, GraphAccess};
/// use forestcut::Partition;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
///
///     let graph = Graph::from_edges(&[(0, 1), (1, 2), (2, 3), (3, 0)]);
///     let order = [0, 1, 2, 3];
///     let mut partition = vec![None; graph.vertex_bound()];
///
///     FennelPartitioner { config: PartitionConfig::new(2, BalanceMode::Edge, 1.03)?, ..Default::default() }
///         .partition(&mut partition, (&graph, &order[..]))?;
///
///     assert_eq!(partition, vec![Some(0), Some(1), Some(1), Some(0)]);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FennelPartitioner {
    /// Number of parts, balance mode and slack.
    pub config: PartitionConfig,

    /// Exponent of the balance penalty.
    pub gamma: f64,
}

impl Default for FennelPartitioner {
    fn default() -> Self {
        FennelPartitioner {
            config: PartitionConfig::default(),
            gamma: 1.5,
        }
    }
}

impl<'a, G: GraphAccess> Partition<(&'a G, &'a [usize])> for FennelPartitioner {
    type Metadata = Metadata;
    type Error = Error;

    fn partition(
        &mut self,
        part_ids: &mut [Option<PartId>],
        (graph, order): (&'a G, &'a [usize]),
    ) -> Result<Self::Metadata, Self::Error> {
        self.config.validate()?;
        if part_ids.len() != graph.vertex_bound() {
            return Err(Error::InputLenMismatch {
                expected: graph.vertex_bound(),
                actual: part_ids.len(),
            });
        }

        let nodes = graph.node_count();
        let edges = graph.edge_count();
        let total_weight = match self.config.mode {
            BalanceMode::Edge => 2 * edges as u64,
            BalanceMode::Vertex => nodes as u64,
        };
        let max_component = self.config.max_component(total_weight);
        let scale = balance_scale(
            nodes as f64,
            2.0 * edges as f64,
            self.config.num_parts as f64,
            self.gamma,
            self.config.mode,
        );
        let _span = tracing::info_span!("fennel", nodes, edges, max_component).entered();

        part_ids.fill(None);
        fennel_partitioner(
            part_ids,
            graph,
            order,
            self.config.mode,
            self.config.num_parts,
            max_component,
            scale,
            self.gamma,
        )?;

        let parts_opened = parts_used(part_ids);
        info!(parts_opened, "graph streamed");
        Ok(Metadata { parts_opened, max_component })
    }
}

/// Stream `graph` in `order` with the default penalty exponent and return the
/// vertex-indexed assignment.
pub fn fennel_partition<G: GraphAccess>(
    graph: &G,
    order: &[usize],
    config: PartitionConfig,
) -> Result<Vec<Option<PartId>>, Error> {
    let mut partition = vec![None; graph.vertex_bound()];
    FennelPartitioner { config, ..Default::default() }.partition(&mut partition, (graph, order))?;
    Ok(partition)
}
