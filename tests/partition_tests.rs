use std::fs;

use forestcut::algorithms::{
    fennel_partition, partition_forest, BackwardPartitioner, Error, ForwardPartitioner, NodeOrder,
    OrderedPartitioner,
};
use forestcut::balance::{compute_parts_load, parts_used, BalanceMode, PartitionConfig};
use forestcut::evaluate::{evaluate, VertexHash};
use forestcut::forest::Forest;
use forestcut::graph::{Graph, GraphAccess};
use forestcut::io::load_partition;
use forestcut::remap::{to_forest_index, to_vertex_index};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tempfile::tempdir;

// A single tree of 200 nodes with uneven fan-out and weights 1..=4.
fn sample_forest() -> Forest {
    let parents = (0..200usize)
        .map(|node| (node < 199).then(|| (node + 1 + node % 3).min(199)))
        .collect();
    let weights = (0..200u64).map(|node| node % 4 + 1).collect();
    Forest::new(parents, weights).unwrap()
}

// Forest positions are visited in reverse vertex order.
fn sample_sequence() -> Vec<usize> {
    (0..200).rev().collect()
}

// Weight of every vertex under `sample_sequence`.
fn sample_vertex_weights(forest: &Forest, mode: BalanceMode) -> Vec<u64> {
    (0..200).map(|vertex| forest.weight(199 - vertex, mode)).collect()
}

fn grid(side: usize) -> Graph {
    let mut edges = Vec::new();
    for row in 0..side {
        for col in 0..side {
            let vertex = row * side + col;
            if col + 1 < side {
                edges.push((vertex, vertex + 1));
            }
            if row + 1 < side {
                edges.push((vertex, vertex + side));
            }
        }
    }
    Graph::from_edges(&edges)
}

#[test]
fn forward_partition_covers_forest_within_capacity() {
    // Arrange
    let forest = sample_forest();
    let seq = sample_sequence();
    let config = PartitionConfig::new(4, BalanceMode::Edge, 1.03).unwrap();

    // Act
    let (partition, metadata) = partition_forest(&mut ForwardPartitioner { config }, &forest, &seq).unwrap();

    // Assert
    assert!(partition.iter().all(Option::is_some));
    let weights = sample_vertex_weights(&forest, BalanceMode::Edge);
    let loads = compute_parts_load(&partition, parts_used(&partition), &weights);
    assert!(loads.iter().all(|&load| load <= metadata.max_component));
    assert_eq!(metadata.max_component, config.max_component(forest.total_weight(BalanceMode::Edge)));
}

#[test]
fn forward_partition_is_deterministic() {
    // Arrange
    let forest = sample_forest();
    let seq = sample_sequence();
    let config = PartitionConfig::new(4, BalanceMode::Edge, 1.03).unwrap();

    // Act
    let first = partition_forest(&mut ForwardPartitioner { config }, &forest, &seq).unwrap();
    let second = partition_forest(&mut ForwardPartitioner { config }, &forest, &seq).unwrap();

    // Assert
    assert_eq!(first, second);
}

#[test]
fn backward_partition_covers_forest_within_capacity() {
    // Arrange
    let forest = sample_forest();
    let seq = sample_sequence();
    let config = PartitionConfig::new(4, BalanceMode::Edge, 1.5).unwrap();

    // Act
    let (partition, metadata) = partition_forest(&mut BackwardPartitioner { config }, &forest, &seq).unwrap();

    // Assert
    // floor(500 / 4) = 125, and 125 * 1.5 = 187.5.
    assert_eq!(metadata.max_component, 187);
    assert!(partition.iter().all(Option::is_some));
    let weights = sample_vertex_weights(&forest, BalanceMode::Edge);
    let loads = compute_parts_load(&partition, parts_used(&partition), &weights);
    assert!(loads.iter().all(|&load| load <= metadata.max_component));
}

#[test]
fn backward_partition_is_deterministic() {
    // Arrange
    let forest = sample_forest();
    let seq = sample_sequence();
    let config = PartitionConfig::new(4, BalanceMode::Edge, 1.5).unwrap();

    // Act
    let first = partition_forest(&mut BackwardPartitioner { config }, &forest, &seq).unwrap();
    let second = partition_forest(&mut BackwardPartitioner { config }, &forest, &seq).unwrap();

    // Assert
    assert_eq!(first, second);
}

#[test]
fn ordered_partitions_cover_forest_within_capacity() {
    let forest = sample_forest();
    let seq = sample_sequence();
    let config = PartitionConfig::new(3, BalanceMode::Vertex, 1.1).unwrap();

    for order in [NodeOrder::Depth, NodeOrder::Height, NodeOrder::Naive] {
        let (partition, metadata) =
            partition_forest(&mut OrderedPartitioner { config, order }, &forest, &seq).unwrap();

        let loads = compute_parts_load(&partition, parts_used(&partition), &[1; 200]);
        assert!(partition.iter().all(Option::is_some), "{order:?}");
        assert!(loads.iter().all(|&load| load <= metadata.max_component), "{order:?}");
    }
}

#[test]
fn ordered_partitions_stay_within_edge_capacity() {
    // Arrange
    let forest = sample_forest();
    let seq = sample_sequence();
    let weights = sample_vertex_weights(&forest, BalanceMode::Edge);

    for balance_factor in [1.03, 1.5] {
        let config = PartitionConfig::new(4, BalanceMode::Edge, balance_factor).unwrap();
        for order in [NodeOrder::Depth, NodeOrder::Height, NodeOrder::Naive] {
            // Act
            let (partition, metadata) =
                partition_forest(&mut OrderedPartitioner { config, order }, &forest, &seq).unwrap();

            // Assert
            let loads = compute_parts_load(&partition, parts_used(&partition), &weights);
            assert!(partition.iter().all(Option::is_some), "{order:?} {balance_factor}");
            assert!(loads.iter().all(|&load| load <= metadata.max_component), "{order:?} {balance_factor}");
        }
    }
}

#[test]
fn three_node_forest_in_two_vertex_balanced_parts() {
    // Arrange
    let forest = Forest::with_unit_weights(vec![Some(2), Some(2), None]).unwrap();
    let config = PartitionConfig::new(2, BalanceMode::Vertex, 1.0).unwrap();

    // Act
    let (partition, metadata) = partition_forest(&mut ForwardPartitioner { config }, &forest, &[0, 1, 2]).unwrap();

    // Assert
    // floor(3 / 2) leaves room for a single node per part.
    assert_eq!(metadata.max_component, 1);
    let loads = compute_parts_load(&partition, parts_used(&partition), &[1, 1, 1]);
    assert!(partition.iter().all(Option::is_some));
    assert!(loads.iter().all(|&load| load <= 2));
}

#[test]
fn fennel_on_four_cycle() {
    // Arrange
    let graph = Graph::from_edges(&[(0, 1), (1, 2), (2, 3), (3, 0)]);
    let config = PartitionConfig::new(2, BalanceMode::Edge, 1.03).unwrap();

    // Act
    let partition = fennel_partition(&graph, &[0, 1, 2, 3], config).unwrap();

    // Assert
    assert_eq!(partition, vec![Some(0), Some(1), Some(1), Some(0)]);
    let degrees: Vec<u64> = (0..4).map(|vertex| graph.degree(vertex) as u64).collect();
    let loads = compute_parts_load(&partition, 2, &degrees);
    assert!(loads.iter().all(|&load| load <= 4));
}

#[test]
fn fennel_is_deterministic_and_balanced() {
    // Arrange
    let graph = grid(12);
    let order: Vec<usize> = (0..graph.vertex_bound()).collect();
    let config = PartitionConfig::new(4, BalanceMode::Vertex, 1.05).unwrap();

    // Act
    let first = fennel_partition(&graph, &order, config).unwrap();
    let second = fennel_partition(&graph, &order, config).unwrap();

    // Assert
    assert_eq!(first, second);
    let loads = compute_parts_load(&first, 4, &[1; 144]);
    assert!(loads.iter().all(|&load| load <= config.max_component(144)));
    let metrics = evaluate(&graph, &first, Some(&order[..]), VertexHash::Knuth, &mut SmallRng::seed_from_u64(1)).unwrap();
    assert!(metrics.edges_cut < metrics.edge_count);
}

#[test]
fn evaluation_of_a_path() {
    let graph = Graph::from_edges(&[(0, 1), (1, 2)]);
    let partition = [Some(0), Some(0), Some(1)];

    let metrics = evaluate(&graph, &partition, None, VertexHash::Knuth, &mut SmallRng::seed_from_u64(3)).unwrap();

    assert_eq!(metrics.edges_cut, 1);
    assert_eq!(metrics.vertex_comm_volume, 2);
}

#[test]
fn complete_graph_in_one_part() {
    let edges: Vec<_> = (0..6).flat_map(|x| (x + 1..6).map(move |y| (x, y))).collect();
    let graph = Graph::from_edges(&edges);
    let partition = vec![Some(0); 6];

    let metrics = evaluate(&graph, &partition, None, VertexHash::Cormen, &mut SmallRng::seed_from_u64(3)).unwrap();

    assert_eq!(metrics.edges_cut, 0);
    assert_eq!(metrics.vertex_comm_volume, 0);
}

#[test]
fn load_partition_file() -> Result<(), Error> {
    let dir = tempdir()?;
    let path = dir.path().join("parts");
    fs::write(&path, "0\n0\n1\n1\n")?;

    let (partition, num_parts) = load_partition(&path, &[0, 1, 2, 3])?;

    assert_eq!(partition, vec![Some(0), Some(0), Some(1), Some(1)]);
    assert_eq!(num_parts, 2);
    Ok(())
}

#[test]
fn remap_is_idempotent() {
    let seq = [4, 0, 3, 1];
    let forest_parts = [Some(1), Some(0), Some(2), Some(0)];

    let vertex_parts = to_vertex_index(&forest_parts, &seq).unwrap();

    assert_eq!(vertex_parts.len(), 5);
    assert_eq!(vertex_parts[2], None);
    assert_eq!(to_forest_index(&vertex_parts, &seq), forest_parts);
    assert_eq!(to_vertex_index(&to_forest_index(&vertex_parts, &seq), &seq).unwrap(), vertex_parts);
}
