use depan_core::{DependencyGraph, Edge, EdgeId, Node, NodeId, RelationId, RelationRegistry};

pub fn relations() -> RelationRegistry {
    RelationRegistry::from_names(["contains", "calls"])
}

/// A containment tree with `branching` children per node plus `calls`
/// cross links. Deterministic for a given size.
pub fn generate_synthetic_graph(node_count: usize, branching: usize, calls_per_node: usize) -> DependencyGraph {
    let branching = branching.max(1);
    let nodes = (0..node_count)
        .map(|i| Node {
            id: NodeId(i as i64),
            kind: if i % branching == 0 { "package" } else { "class" }.to_string(),
            name: format!("Node_{i}"),
        })
        .collect();

    let mut edges = Vec::new();
    let mut next_edge = 0i64;
    let mut push = |source: usize, target: usize, relation: u32| {
        edges.push(Edge {
            id: EdgeId(next_edge),
            source: NodeId(source as i64),
            target: NodeId(target as i64),
            relation: RelationId(relation),
        });
        next_edge += 1;
    };

    for child in 1..node_count {
        push((child - 1) / branching, child, 0);
    }
    let mut state = 0x2545_f491_4f6c_dd1du64;
    for source in 0..node_count {
        for _ in 0..calls_per_node {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            push(source, (state % node_count as u64) as usize, 1);
        }
    }
    DependencyGraph::from_parts(nodes, edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_graph_shape() {
        let graph = generate_synthetic_graph(100, 4, 2);
        assert_eq!(graph.node_count(), 100);
        assert_eq!(graph.edge_count(), 99 + 200);
        assert!(graph.validate().is_ok());
        let again = generate_synthetic_graph(100, 4, 2);
        assert_eq!(graph.edges, again.edges);
    }
}
