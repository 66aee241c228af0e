// Quality metrics of a finished assignment.
//
// Every metric except the edge cut is a communication volume: for each vertex,
// the number of distinct parts that own one of its edges (or, for the plain
// vertex volume, that hold one of its neighbors or the vertex itself), minus
// one. The variants differ only in which endpoint owns an edge.

use std::fmt;

use rand::Rng;
use rustc_hash::FxHashSet;

use crate::algorithms::Error;
use crate::graph::GraphAccess;
use crate::remap::positions;
use crate::PartId;

/// `floor(2^32 * (sqrt(5) - 1) / 2)`
const CORMEN_MULTIPLIER: u32 = 2_654_435_769;
const KNUTH_MULTIPLIER: u32 = 2_654_435_761;

/// Knuth's multiplicative hash.
pub fn knuth_hash(key: u32) -> u32 {
    key.wrapping_mul(KNUTH_MULTIPLIER)
}

/// Multiplicative hash with the golden ratio constant from Cormen et al.
pub fn cormen_hash(key: u32) -> u32 {
    key.wrapping_mul(CORMEN_MULTIPLIER)
}

/// Hash used to decide edge ownership for the hashed volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VertexHash {
    #[default]
    Knuth,
    Cormen,
}

impl VertexHash {
    pub fn hash(self, vertex: usize) -> u32 {
        // Ids are hashed in 32 bits.
        let key = vertex as u32;
        match self {
            VertexHash::Knuth => knuth_hash(key),
            VertexHash::Cormen => cormen_hash(key),
        }
    }
}

/// Counts produced by [`evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Metrics {
    /// Undirected edges of the graph, self loops included.
    pub edge_count: usize,
    pub edges_cut: usize,
    pub vertex_comm_volume: usize,
    /// A coin flip picks the owning endpoint of each edge.
    pub ecv_rand: usize,
    /// The endpoint with the smaller hash owns the edge.
    pub ecv_hash: usize,
    /// The endpoint visited first owns the edge. Needs an order.
    pub ecv_down: Option<usize>,
    /// The endpoint visited last owns the edge. Needs an order.
    pub ecv_up: Option<usize>,
}

impl Metrics {
    /// `count` as a percentage of the edge count.
    pub fn percent(&self, count: usize) -> f64 {
        if self.edge_count == 0 {
            return 0.0;
        }
        100.0 * count as f64 / self.edge_count as f64
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut line = |label: &str, count: usize| writeln!(f, "{label}: {count} ({:.6}%)", self.percent(count));
        line("edges cut", self.edges_cut)?;
        line("Vcom. vol", self.vertex_comm_volume)?;
        line("ECV(rand)", self.ecv_rand)?;
        line("ECV(hash)", self.ecv_hash)?;
        if let Some(count) = self.ecv_down {
            line("ECV(down)", count)?;
        }
        if let Some(count) = self.ecv_up {
            line("ECV(up)  ", count)?;
        }
        Ok(())
    }
}

fn part_of(partition: &[Option<PartId>], vertex: usize) -> Result<PartId, Error> {
    partition
        .get(vertex)
        .copied()
        .flatten()
        .ok_or(Error::Unassigned { vertex })
}

fn position_of(position: &[Option<usize>], vertex: usize) -> Result<usize, Error> {
    position
        .get(vertex)
        .copied()
        .flatten()
        .ok_or(Error::MissingFromOrder { vertex })
}

/// Distinct parts seen around one vertex, minus one.
fn volume(parts: &FxHashSet<PartId>) -> usize {
    parts.len().saturating_sub(1)
}

/// Score `partition` on `graph`.
///
/// Every vertex of the graph must be assigned, otherwise
/// [`Error::Unassigned`] is returned. When `order` is given the order-based
/// volumes are computed as well and every vertex must appear in it
/// ([`Error::MissingFromOrder`]).
pub fn evaluate<G, R>(
    graph: &G,
    partition: &[Option<PartId>],
    order: Option<&[usize]>,
    hash: VertexHash,
    rng: &mut R,
) -> Result<Metrics, Error>
where
    G: GraphAccess,
    R: Rng + ?Sized,
{
    let _span = tracing::debug_span!("evaluate", nodes = graph.node_count()).entered();

    let position = order.map(positions);
    let mut metrics = Metrics {
        edge_count: graph.edge_count(),
        ecv_down: position.as_ref().map(|_| 0),
        ecv_up: position.as_ref().map(|_| 0),
        ..Default::default()
    };

    let mut neighbor_parts = FxHashSet::default();
    let mut rand_owners = FxHashSet::default();
    let mut hash_owners = FxHashSet::default();
    let mut down_owners = FxHashSet::default();
    let mut up_owners = FxHashSet::default();

    for x in graph.nodes() {
        let x_part = part_of(partition, x)?;
        let x_pos = position.as_deref().map(|position| position_of(position, x)).transpose()?;

        neighbor_parts.clear();
        neighbor_parts.insert(x_part);
        rand_owners.clear();
        hash_owners.clear();
        down_owners.clear();
        up_owners.clear();

        for y in graph.neighbors(x) {
            let y_part = part_of(partition, y)?;

            if x < y && x_part != y_part {
                metrics.edges_cut += 1;
            }
            neighbor_parts.insert(y_part);
            rand_owners.insert(if rng.gen::<bool>() { x_part } else { y_part });
            hash_owners.insert(if hash.hash(x) < hash.hash(y) { x_part } else { y_part });

            if let (Some(position), Some(x_pos)) = (position.as_deref(), x_pos) {
                let y_pos = position_of(position, y)?;
                down_owners.insert(if x_pos < y_pos { x_part } else { y_part });
                up_owners.insert(if x_pos > y_pos { x_part } else { y_part });
            }
        }

        metrics.vertex_comm_volume += volume(&neighbor_parts);
        metrics.ecv_rand += volume(&rand_owners);
        metrics.ecv_hash += volume(&hash_owners);
        if let Some(count) = metrics.ecv_down.as_mut() {
            *count += volume(&down_owners);
        }
        if let Some(count) = metrics.ecv_up.as_mut() {
            *count += volume(&up_owners);
        }
    }

    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;
    use crate::graph::Graph;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(7)
    }

    #[test]
    fn test_hashes() {
        assert_eq!(knuth_hash(0), 0);
        assert_eq!(knuth_hash(1), 2_654_435_761);
        assert_eq!(knuth_hash(2), 2_654_435_761u32.wrapping_mul(2));
        assert_eq!(cormen_hash(1), 2_654_435_769);
        assert_eq!(VertexHash::Cormen.hash(3), cormen_hash(3));
    }

    #[test]
    fn test_path_with_one_cut() {
        // Arrange
        let graph = Graph::from_edges(&[(0, 1), (1, 2)]);
        let partition = [Some(0), Some(0), Some(1)];

        // Act
        let metrics = evaluate(&graph, &partition, None, VertexHash::Knuth, &mut rng()).unwrap();

        // Assert
        assert_eq!(metrics.edge_count, 2);
        assert_eq!(metrics.edges_cut, 1);
        // Vertex 0 sees only part 0; vertices 1 and 2 both see parts 0 and 1.
        assert_eq!(metrics.vertex_comm_volume, 2);
        assert_eq!(metrics.ecv_down, None);
    }

    #[test]
    fn test_single_part_complete_graph() {
        // Arrange
        let edges: Vec<_> = (0..5).flat_map(|x| (x + 1..5).map(move |y| (x, y))).collect();
        let graph = Graph::from_edges(&edges);
        let partition = vec![Some(0); 5];
        let order = [4, 3, 2, 1, 0];

        // Act
        let metrics = evaluate(&graph, &partition, Some(&order[..]), VertexHash::Knuth, &mut rng()).unwrap();

        // Assert
        assert_eq!(
            metrics,
            Metrics {
                edge_count: 10,
                ecv_down: Some(0),
                ecv_up: Some(0),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_hash_volume() {
        // Arrange
        // knuth_hash(0) = 0 is the smallest, so vertex 0 owns both of its edges.
        let graph = Graph::from_edges(&[(0, 1), (0, 2)]);
        let partition = [Some(0), Some(1), Some(2)];

        // Act
        let metrics = evaluate(&graph, &partition, None, VertexHash::Knuth, &mut rng()).unwrap();

        // Assert
        // Vertex 0 sees owner {0}, vertices 1 and 2 see owner {0} too.
        assert_eq!(metrics.ecv_hash, 0);
        assert_eq!(metrics.vertex_comm_volume, 2 + 1 + 1);
        assert_eq!(metrics.edges_cut, 2);
    }

    #[test]
    fn test_order_volumes() {
        // Arrange
        // Star centered on 0, visited last.
        let graph = Graph::from_edges(&[(0, 1), (0, 2)]);
        let partition = [Some(0), Some(1), Some(2)];
        let order = [1, 2, 0];

        // Act
        let metrics = evaluate(&graph, &partition, Some(&order[..]), VertexHash::Knuth, &mut rng()).unwrap();

        // Assert
        // Down: the leaves own their edges, so vertex 0 sees {1, 2}.
        assert_eq!(metrics.ecv_down, Some(1));
        // Up: vertex 0 owns both edges, so every vertex sees {0}.
        assert_eq!(metrics.ecv_up, Some(0));
    }

    #[test]
    fn test_random_volume_is_seeded() {
        let graph = Graph::from_edges(&[(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)]);
        let partition = [Some(0), Some(1), Some(0), Some(1)];

        let first = evaluate(&graph, &partition, None, VertexHash::Knuth, &mut rng()).unwrap();
        let second = evaluate(&graph, &partition, None, VertexHash::Knuth, &mut rng()).unwrap();

        assert_eq!(first, second);
        assert!(first.ecv_rand <= first.vertex_comm_volume);
    }

    #[test]
    fn test_unassigned_and_missing_vertices() {
        let graph = Graph::from_edges(&[(0, 1), (1, 2)]);

        let unassigned = evaluate(&graph, &[Some(0), None, Some(0)], None, VertexHash::Knuth, &mut rng());
        let missing = evaluate(&graph, &[Some(0); 3], Some(&[0, 2][..]), VertexHash::Knuth, &mut rng());

        assert!(matches!(unassigned, Err(Error::Unassigned { vertex: 1 })));
        assert!(matches!(missing, Err(Error::MissingFromOrder { vertex: 1 })));
    }

    #[test]
    fn test_display() {
        let metrics = Metrics {
            edge_count: 4,
            edges_cut: 1,
            vertex_comm_volume: 2,
            ecv_rand: 1,
            ecv_hash: 1,
            ecv_down: Some(0),
            ecv_up: None,
        };

        let text = metrics.to_string();

        assert!(text.starts_with("edges cut: 1 (25.000000%)\nVcom. vol: 2 (50.000000%)\n"));
        assert!(text.contains("ECV(down): 0 (0.000000%)\n"));
        assert!(!text.contains("ECV(up)"));
    }
}
