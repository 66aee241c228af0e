use std::fmt;
use std::io;

mod backward_partitioner;
mod edge_stream_partitioner;
mod fennel_partitioner;
mod forward_partitioner;
mod ordered_partitioner;
mod random_partitioner;

pub use backward_partitioner::BackwardPartitioner;
pub use edge_stream_partitioner::EdgeStreamPartitioner;
pub use fennel_partitioner::{fennel_partition, FennelPartitioner};
pub use forward_partitioner::ForwardPartitioner;
pub use ordered_partitioner::{NodeOrder, OrderedPartitioner};
pub use random_partitioner::RandomPartitioner;

use tracing::info;

use crate::balance::{check_balance, PartitionConfig};
use crate::forest::Forest;
use crate::remap::to_vertex_index;
use crate::{Partition, PartId};

/// Common errors thrown by algorithms.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Input sets don't have matching lengths.
    InputLenMismatch { expected: usize, actual: usize },

    /// A partition was requested with zero parts.
    ZeroParts,

    /// More parts were requested than a `PartId` can address.
    TooManyParts { requested: usize, max: usize },

    /// The balance slack must allow at least a perfectly even split.
    InvalidBalanceFactor(f64),

    /// The decomposition forest has no nodes.
    EmptyForest,

    /// A child id does not precede its parent id.
    ForestOrder { node: usize, parent: usize },

    /// The subtree below `node` cannot be brought under the part capacity by
    /// packing its direct children.
    Unpackable { node: usize, weight: u64, max_component: u64 },

    /// No part can accept an element without exceeding the capacity, or a
    /// finished assignment overflows a part.
    CapacityExceeded { part: usize, load: u64, max_component: u64 },

    /// No part has room left for `vertex`.
    NoRoom { vertex: usize, weight: u64, max_component: u64 },

    /// An element that should carry a part has none.
    Unassigned { vertex: usize },

    /// A vertex is missing from the traversal order.
    MissingFromOrder { vertex: usize },

    /// Reading or writing partition data failed.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InputLenMismatch { expected, actual } => write!(
                f,
                "input sets don't have the same length (expected {expected} items, got {actual})",
            ),
            Error::ZeroParts => write!(f, "number of parts must be greater than zero"),
            Error::TooManyParts { requested, max } => {
                write!(f, "{requested} parts requested, at most {max} are supported")
            }
            Error::InvalidBalanceFactor(factor) => {
                write!(f, "balance factor must be at least 1.0 (got {factor})")
            }
            Error::EmptyForest => write!(f, "decomposition forest is empty"),
            Error::ForestOrder { node, parent } => write!(
                f,
                "forest node {node} does not precede its parent {parent}",
            ),
            Error::Unpackable { node, weight, max_component } => write!(
                f,
                "subtree below node {node} weighs {weight} after packing, capacity is {max_component}",
            ),
            Error::CapacityExceeded { part, load, max_component } => write!(
                f,
                "part {part} holds {load}, capacity is {max_component}",
            ),
            Error::NoRoom { vertex, weight, max_component } => write!(
                f,
                "no part has room for vertex {vertex} of weight {weight}, capacity is {max_component}",
            ),
            Error::Unassigned { vertex } => write!(f, "vertex {vertex} has no part"),
            Error::MissingFromOrder { vertex } => {
                write!(f, "vertex {vertex} is missing from the traversal order")
            }
            Error::Io(err) => write!(f, "i/o error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

/// Diagnostic data returned by a partitioner run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    /// Number of parts the run actually used. Bin-packing may open more parts
    /// than requested when the capacity cannot be met with fewer.
    pub parts_opened: usize,

    /// Hard per-part capacity the run was held to.
    pub max_component: u64,
}

/// Run a forest-guided partitioner and translate its forest-indexed result to
/// vertex ids through `seq`.
pub fn partition_forest<P>(
    partitioner: &mut P,
    forest: &Forest,
    seq: &[usize],
) -> Result<(Vec<Option<PartId>>, Metadata), Error>
where
    P: for<'a> Partition<&'a Forest, Metadata = Metadata, Error = Error>,
{
    if seq.len() != forest.len() {
        return Err(Error::InputLenMismatch {
            expected: forest.len(),
            actual: seq.len(),
        });
    }
    let mut forest_parts = vec![None; forest.len()];
    let metadata = partitioner.partition(&mut forest_parts, forest)?;
    Ok((to_vertex_index(&forest_parts, seq)?, metadata))
}

/// Shared driver of the forest-guided partitioners: validates the input,
/// derives the capacity, runs `assign` and checks the finished assignment
/// against the capacity before reporting success.
pub(crate) fn run_forest_partitioner<F>(
    algorithm: &'static str,
    config: &PartitionConfig,
    part_ids: &mut [Option<PartId>],
    forest: &Forest,
    assign: F,
) -> Result<Metadata, Error>
where
    F: FnOnce(&mut [Option<PartId>], u64) -> Result<usize, Error>,
{
    config.validate()?;
    if forest.is_empty() {
        return Err(Error::EmptyForest);
    }
    if part_ids.len() != forest.len() {
        return Err(Error::InputLenMismatch {
            expected: forest.len(),
            actual: part_ids.len(),
        });
    }

    let max_component = config.max_component(forest.total_weight(config.mode));
    let _span = tracing::info_span!("forest_partition", algorithm, nodes = forest.len(), max_component).entered();

    part_ids.fill(None);
    let parts_opened = assign(part_ids, max_component)?;
    let loads = check_balance(part_ids, &forest.weights(config.mode), max_component)?;
    if parts_opened > config.num_parts {
        info!(parts_opened, requested = config.num_parts, "more parts opened than requested");
    }
    info!(parts_opened, heaviest = loads.iter().max().copied().unwrap_or(0), "forest partitioned");

    Ok(Metadata { parts_opened, max_component })
}

pub(crate) fn check_part_count(num_parts: usize) -> Result<(), Error> {
    if num_parts == 0 {
        return Err(Error::ZeroParts);
    }
    let max = PartId::MAX as usize;
    if num_parts > max {
        return Err(Error::TooManyParts { requested: num_parts, max });
    }
    Ok(())
}

pub(crate) fn part_id(part: usize) -> Result<PartId, Error> {
    PartId::try_from(part).map_err(|_| Error::TooManyParts {
        requested: part + 1,
        max: PartId::MAX as usize,
    })
}
