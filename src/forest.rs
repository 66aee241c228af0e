// Hierarchical decomposition of a graph, stored as an arena of nodes.
//
// Node ids are dense and topologically ordered: every child id is smaller
// than its parent id. Parent links are plain indices into the arena.

use crate::algorithms::Error;
use crate::balance::BalanceMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forest {
    parents: Vec<Option<usize>>,
    kids: Vec<Vec<usize>>,
    weights: Vec<u64>,
}

impl Forest {
    /// Build a forest from a parent table and per-node partial spanning tree
    /// weights. Children are listed in ascending id order.
    pub fn new(parents: Vec<Option<usize>>, weights: Vec<u64>) -> Result<Self, Error> {
        if parents.len() != weights.len() {
            return Err(Error::InputLenMismatch {
                expected: parents.len(),
                actual: weights.len(),
            });
        }
        if parents.is_empty() {
            return Err(Error::EmptyForest);
        }

        let mut kids = vec![Vec::new(); parents.len()];
        for (node, parent) in parents.iter().enumerate() {
            if let Some(parent) = *parent {
                if parent <= node || parent >= parents.len() {
                    return Err(Error::ForestOrder { node, parent });
                }
                kids[parent].push(node);
            }
        }

        Ok(Forest { parents, kids, weights })
    }

    /// A forest in which every node weighs 1.
    pub fn with_unit_weights(parents: Vec<Option<usize>>) -> Result<Self, Error> {
        let weights = vec![1; parents.len()];
        Forest::new(parents, weights)
    }

    /// Number of nodes in the forest.
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn parent(&self, node: usize) -> Option<usize> {
        self.parents[node]
    }

    pub fn kids(&self, node: usize) -> &[usize] {
        &self.kids[node]
    }

    pub fn pst_weight(&self, node: usize) -> u64 {
        self.weights[node]
    }

    /// Weight of a single node under the given balance mode.
    pub fn weight(&self, node: usize, mode: BalanceMode) -> u64 {
        match mode {
            BalanceMode::Vertex => 1,
            BalanceMode::Edge => self.weights[node],
        }
    }

    pub fn weights(&self, mode: BalanceMode) -> Vec<u64> {
        (0..self.len()).map(|node| self.weight(node, mode)).collect()
    }

    pub fn total_weight(&self, mode: BalanceMode) -> u64 {
        match mode {
            BalanceMode::Vertex => self.len() as u64,
            BalanceMode::Edge => self.weights.iter().sum(),
        }
    }

    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(|&node| self.parents[node].is_none())
    }

    /// Weight of the subtree rooted at every node, accumulated in one
    /// child-before-parent pass.
    pub fn subtree_weights(&self, mode: BalanceMode) -> Vec<u64> {
        let mut below = vec![0; self.len()];
        for node in 0..self.len() {
            below[node] += self.weight(node, mode);
            if let Some(parent) = self.parents[node] {
                below[parent] += below[node];
            }
        }
        below
    }

    /// Distance of every node from its root.
    pub fn depths(&self) -> Vec<usize> {
        let mut depth = vec![0; self.len()];
        for node in (0..self.len()).rev() {
            if let Some(parent) = self.parents[node] {
                depth[node] = depth[parent] + 1;
            }
        }
        depth
    }

    /// Length of the longest path from every node down to a leaf.
    pub fn heights(&self) -> Vec<usize> {
        let mut height = vec![0; self.len()];
        for node in 0..self.len() {
            if let Some(parent) = self.parents[node] {
                height[parent] = height[parent].max(height[node] + 1);
            }
        }
        height
    }
}
