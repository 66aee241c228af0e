// Translation between forest-node positions and vertex ids.
//
// A sequence `seq` maps forest position `i` to vertex `seq[i]`. The same
// sequence doubles as a traversal order over vertices.

use crate::algorithms::Error;
use crate::PartId;

/// Re-index a forest-indexed assignment by vertex id. The result has one slot
/// per vertex id up to the largest id in `seq`; ids absent from `seq` stay
/// `None`.
pub fn to_vertex_index(forest_parts: &[Option<PartId>], seq: &[usize]) -> Result<Vec<Option<PartId>>, Error> {
    if forest_parts.len() != seq.len() {
        return Err(Error::InputLenMismatch {
            expected: seq.len(),
            actual: forest_parts.len(),
        });
    }
    let size = seq.iter().max().map_or(0, |&vid| vid + 1);
    let mut vertex_parts = vec![None; size];
    for (&vid, &part) in seq.iter().zip(forest_parts) {
        vertex_parts[vid] = part;
    }
    Ok(vertex_parts)
}

/// Inverse of [`to_vertex_index`]: read back the part of every forest
/// position.
pub fn to_forest_index(vertex_parts: &[Option<PartId>], seq: &[usize]) -> Vec<Option<PartId>> {
    seq.iter()
        .map(|&vid| vertex_parts.get(vid).copied().flatten())
        .collect()
}

/// Position of every vertex within `order`, `None` for vertices it skips.
/// A vertex listed twice keeps its last position.
pub fn positions(order: &[usize]) -> Vec<Option<usize>> {
    let size = order.iter().max().map_or(0, |&vid| vid + 1);
    let mut pos = vec![None; size];
    for (idx, &vid) in order.iter().enumerate() {
        pos[vid] = Some(idx);
    }
    pos
}
