use std::iter::{Cloned, Zip};
use std::slice::Iter;

use rustc_hash::FxHashSet;
use sprs::{CsMat, TriMat};

/// Read access to an undirected graph, as needed by the streaming
/// partitioner, the evaluation engine and the output writer.
pub trait GraphAccess {
    /// Vertices present in the graph, in ascending id order.
    fn nodes(&self) -> impl Iterator<Item = usize> + '_;

    /// Neighbors of `vertex`; every undirected edge is seen from both ends.
    fn neighbors(&self, vertex: usize) -> impl Iterator<Item = usize> + '_;

    fn degree(&self, vertex: usize) -> usize;

    /// Whether `vertex` is one of the graph's nodes.
    fn contains(&self, vertex: usize) -> bool;

    /// Number of vertices present in the graph.
    fn node_count(&self) -> usize;

    /// Number of undirected edges, self loops included.
    fn edge_count(&self) -> usize;

    /// Largest vertex id present, `None` for an empty graph.
    fn max_vid(&self) -> Option<usize>;

    /// Size of a vertex-indexed assignment for this graph.
    fn vertex_bound(&self) -> usize {
        self.max_vid().map_or(0, |vid| vid + 1)
    }
}

/// Struct that represents a graph
#[derive(Clone)]
pub struct Graph {
    /// The CsMat (from sprs) is used to store the graph as a symmetric sparse
    /// matrix in CSR format. A vertex is present when its row is not empty.
    pub graph_csr: CsMat<f64>
}

impl Graph {

    /// Create a new graph
    pub fn new() -> Self {
        Self {
            graph_csr: CsMat::empty(sprs::CSR, 0)
        }
    }

    /// Build an undirected, unit weight graph from a list of edges.
    /// Each pair is inserted in both directions; repeated pairs collapse.
    pub fn from_edges(edges: &[(usize, usize)]) -> Self {
        let size = edges
            .iter()
            .map(|&(tail, head)| tail.max(head) + 1)
            .max()
            .unwrap_or(0);
        let mut triplet_matrix = TriMat::with_capacity((size, size), 2 * edges.len());
        let mut seen = FxHashSet::default();
        for &(tail, head) in edges {
            let key = (tail.min(head), tail.max(head));
            if !seen.insert(key) {
                continue;
            }
            triplet_matrix.add_triplet(tail, head, 1.0);
            if tail != head {
                triplet_matrix.add_triplet(head, tail, 1.0);
            }
        }
        Self {
            graph_csr: triplet_matrix.to_csr()
        }
    }

    /// The number of rows of the adjacency matrix.
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.graph_csr.rows(), self.graph_csr.cols());
        self.graph_csr.rows()
    }

    /// Whether the graph has no vertices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// An iterator over the neighbors of the given vertex with the weight of
    /// the connecting edge.
    pub fn weighted_neighbors(&self, vertex: usize) -> Zip<Cloned<Iter<'_, usize>>, Cloned<Iter<'_, f64>>> {
        let (indices, data): (&[usize], &[f64]) = match self.graph_csr.outer_view(vertex) {
            Some(row) => row.into_raw_storage(),
            None => (&[], &[]),
        };
        indices.iter().cloned().zip(data.iter().cloned())
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphAccess for Graph {
    fn nodes(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(move |&vertex| self.degree(vertex) > 0)
    }

    fn neighbors(&self, vertex: usize) -> impl Iterator<Item = usize> + '_ {
        self.weighted_neighbors(vertex).map(|(neighbor, _edge_weight)| neighbor)
    }

    fn degree(&self, vertex: usize) -> usize {
        self.graph_csr.outer_view(vertex).map_or(0, |row| row.nnz())
    }

    fn contains(&self, vertex: usize) -> bool {
        vertex < self.len() && self.degree(vertex) > 0
    }

    fn node_count(&self) -> usize {
        self.nodes().count()
    }

    fn edge_count(&self) -> usize {
        (0..self.len())
            .map(|vertex| self.neighbors(vertex).take_while(|&neighbor| neighbor <= vertex).count())
            .sum()
    }

    fn max_vid(&self) -> Option<usize> {
        (0..self.len()).rev().find(|&vertex| self.degree(vertex) > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_edges_is_symmetric() {
        // Arrange
        let graph = Graph::from_edges(&[(0, 1), (1, 2), (2, 0), (1, 0)]);

        // Act / Assert
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.neighbors(0).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(graph.neighbors(1).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(graph.degree(2), 2);
        assert_eq!(graph.weighted_neighbors(2).collect::<Vec<_>>(), vec![(0, 1.0), (1, 1.0)]);
    }

    #[test]
    fn test_absent_vertices_and_self_loops() {
        // Arrange
        let graph = Graph::from_edges(&[(1, 3), (3, 3)]);

        // Act / Assert
        assert_eq!(graph.nodes().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.degree(0), 0);
        assert!(!graph.contains(0));
        assert!(graph.contains(1));
        assert!(!graph.contains(9));
        assert_eq!(graph.degree(3), 2);
        assert_eq!(graph.max_vid(), Some(3));
        assert_eq!(graph.vertex_bound(), 4);
    }

    #[test]
    fn test_empty_graph() {
        let graph = Graph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.max_vid(), None);
        assert_eq!(graph.vertex_bound(), 0);
        assert_eq!(graph.edge_count(), 0);
    }
}
