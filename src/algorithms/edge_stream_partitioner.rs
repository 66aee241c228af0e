// File-backed FENNEL: streams a binary edge file and assigns every edge a part.
// Neighbor tallies are replaced by one bit per (vertex, part) recording whether
// the vertex already touches the part.

use std::path::Path;

use bitvec::prelude::*;
use tracing::{debug, info};

use crate::algorithms::fennel_partitioner::{balance_scale, best_part};
use crate::algorithms::{part_id, Error, Metadata};
use crate::balance::{max_component, parts_used, BalanceMode, PartSizes, PartitionConfig};
use crate::io::open_edge_records;
use crate::{Partition, PartId};

/// Figures gathered by the first pass over the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EdgeFileStats {
    edges: usize,
    nodes: usize,
    vertex_bound: usize,
}

fn scan_edge_file(path: &Path) -> Result<EdgeFileStats, Error> {
    let mut seen = BitVec::<usize, Lsb0>::new();
    let mut edges = 0;
    for record in open_edge_records(path)? {
        let record = record?;
        for vertex in [record.tail as usize, record.head as usize] {
            if vertex >= seen.len() {
                seen.resize(vertex + 1, false);
            }
            seen.set(vertex, true);
        }
        edges += 1;
    }
    Ok(EdgeFileStats {
        edges,
        nodes: seen.count_ones(),
        vertex_bound: seen.len(),
    })
}

/// Bit `vertex * num_parts + part` is set once `vertex` is an endpoint of an
/// edge placed in `part`.
struct TouchedParts {
    bits: BitVec<usize, Lsb0>,
    num_parts: usize,
}

impl TouchedParts {
    fn new(vertex_bound: usize, num_parts: usize) -> Self {
        TouchedParts {
            bits: bitvec![usize, Lsb0; 0; vertex_bound * num_parts],
            num_parts,
        }
    }

    fn touches(&self, vertex: usize, part: usize) -> bool {
        self.bits[vertex * self.num_parts + part]
    }

    fn mark(&mut self, vertex: usize, part: usize) {
        self.bits.set(vertex * self.num_parts + part, true);
    }
}

#[allow(clippy::too_many_arguments)]
fn edge_stream_partitioner(
    partition: &mut [Option<PartId>],
    path: &Path,
    stats: EdgeFileStats,
    num_parts: usize,
    max_component: u64,
    scale: f64,
    gamma: f64,
) -> Result<(), Error> {
    let mut part_sizes = PartSizes::bounded(num_parts, max_component);
    let mut touched = TouchedParts::new(stats.vertex_bound, num_parts);
    let mut part_value = vec![0.0; num_parts];

    for (edge, record) in open_edge_records(path)?.enumerate() {
        let record = record?;
        let (tail, head) = (record.tail as usize, record.head as usize);

        for (part, value) in part_value.iter_mut().enumerate() {
            *value = f64::from(u8::from(touched.touches(tail, part))) + f64::from(u8::from(touched.touches(head, part)));
        }

        let Some(part) = best_part(&part_sizes, &part_value, 1, scale, gamma) else {
            return Err(Error::NoRoom { vertex: tail, weight: 1, max_component });
        };
        if part == part_sizes.high_water() {
            debug!(edge, part, "opened part");
        }
        let slot = partition.get_mut(edge).ok_or(Error::InputLenMismatch {
            expected: stats.edges,
            actual: edge,
        })?;
        *slot = Some(part_id(part)?);
        part_sizes.add(part, 1);
        touched.mark(tail, part);
        touched.mark(head, part);
    }
    Ok(())
}

/// FENNEL Edge File Partitioner
///
/// Streams a headerless file of `{u32 tail, u32 head, f32 weight}`
/// little-endian records (see [`crate::io::EdgeRecord`]) and assigns each edge,
/// in file order, to a part. Every edge weighs one, so parts are balanced by
/// edge count. The file is read twice: once to count edges and vertices, once to
/// assign. The part ids are indexed by edge position in the file.
#[derive(Debug, Clone, Copy)]
pub struct EdgeStreamPartitioner {
    /// Number of parts
    pub num_parts: usize,

    /// Slack over a perfectly even split, at least 1.0.
    pub balance_factor: f64,

    /// Exponent of the balance penalty.
    pub gamma: f64,
}

impl Default for EdgeStreamPartitioner {
    fn default() -> Self {
        EdgeStreamPartitioner {
            num_parts: 2,
            balance_factor: 1.03,
            gamma: 1.5,
        }
    }
}

impl EdgeStreamPartitioner {
    fn validate(&self) -> Result<(), Error> {
        PartitionConfig::new(self.num_parts, BalanceMode::Edge, self.balance_factor).map(drop)
    }

    fn run(&self, part_ids: &mut [Option<PartId>], path: &Path, stats: EdgeFileStats) -> Result<Metadata, Error> {
        if part_ids.len() != stats.edges {
            return Err(Error::InputLenMismatch {
                expected: stats.edges,
                actual: part_ids.len(),
            });
        }

        let max_component = max_component(stats.edges as u64, self.num_parts, self.balance_factor);
        let scale = balance_scale(
            stats.nodes as f64,
            2.0 * stats.edges as f64,
            self.num_parts as f64,
            self.gamma,
            BalanceMode::Vertex,
        );
        let _span = tracing::info_span!("fennel_edge_file", edges = stats.edges, nodes = stats.nodes, max_component).entered();

        part_ids.fill(None);
        edge_stream_partitioner(part_ids, path, stats, self.num_parts, max_component, scale, self.gamma)?;

        let parts_opened = parts_used(part_ids);
        info!(parts_opened, "edge file streamed");
        Ok(Metadata { parts_opened, max_component })
    }

    /// Partition the edges of the file at `path` and return one part per edge.
    pub fn partition_file(&self, path: &Path) -> Result<(Vec<PartId>, Metadata), Error> {
        self.validate()?;
        let stats = scan_edge_file(path)?;
        let mut part_ids = vec![None; stats.edges];
        let metadata = self.run(&mut part_ids, path, stats)?;
        let part_ids = part_ids
            .into_iter()
            .enumerate()
            .map(|(edge, part)| part.ok_or(Error::Unassigned { vertex: edge }))
            .collect::<Result<_, _>>()?;
        Ok((part_ids, metadata))
    }
}

impl<'a> Partition<&'a Path> for EdgeStreamPartitioner {
    type Metadata = Metadata;
    type Error = Error;

    fn partition(&mut self, part_ids: &mut [Option<PartId>], path: &'a Path) -> Result<Self::Metadata, Self::Error> {
        self.validate()?;
        let stats = scan_edge_file(path)?;
        self.run(part_ids, path, stats)
    }
}
