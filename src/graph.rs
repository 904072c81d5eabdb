use crate::{grid::Point, symmetric_map::SymmetricMap};

use petgraph::{
    algo::tarjan_scc,
    graph::NodeIndex,
    stable_graph::StableGraph,
    visit::{depth_first_search, Control, DfsEvent, NodeIndexable},
    EdgeType, Undirected,
};

/// One node per room, weighted by room index, with an edge for every carved corridor. Node `i`
/// holds room `i`.
pub fn room_graph(
    num_rooms: usize,
    corridors: &SymmetricMap<Vec<Point>>,
) -> StableGraph<usize, (), Undirected> {
    let mut graph = StableGraph::default();
    for i in 0..num_rooms {
        graph.add_node(i);
    }

    let mut edges: Vec<_> = corridors.iter().map(|(pair, _)| pair).collect();
    // Map iteration order is arbitrary.
    edges.sort();
    for (i, j) in edges.into_iter() {
        graph.add_edge(NodeIndex::new(i), NodeIndex::new(j), ());
    }

    graph
}

/// True iff the graph has at most one connected component.
pub fn is_connected<N, E, Ty: EdgeType>(graph: &StableGraph<N, E, Ty>) -> bool {
    tarjan_scc(graph).len() <= 1
}

/// The node reached from `root` with the most tree edges in between, and each reached node's
/// parent in the search tree.
fn deepest_node<N, E>(
    graph: &StableGraph<N, E, Undirected>,
    root: NodeIndex,
) -> (NodeIndex, Vec<NodeIndex>) {
    let bound = graph.node_bound();
    let mut parents = vec![NodeIndex::end(); bound];
    let mut depths: Vec<Option<usize>> = vec![None; bound];
    depths[root.index()] = Some(0);
    depth_first_search(graph, Some(root), |event| {
        if let DfsEvent::TreeEdge(u, v) = event {
            parents[v.index()] = u;
            depths[v.index()] = depths[u.index()].map(|d| d + 1);
        }

        Control::<()>::Continue
    });

    let deepest = graph
        .node_indices()
        .filter_map(|i| depths[i.index()].map(|d| (d, i)))
        .max_by_key(|(d, _)| *d)
        .map_or(root, |(_, i)| i);

    (deepest, parents)
}

/// Assumes `graph` is a tree. Returns the longest path that ends at `target`, starting from the
/// far end.
pub fn longest_path_to_point_in_tree<N, E>(
    graph: &StableGraph<N, E, Undirected>,
    target: NodeIndex,
) -> Vec<NodeIndex> {
    let (far_end, predecessors) = deepest_node(graph, target);

    let mut path = vec![far_end];
    let mut next = far_end;
    while next != target {
        next = predecessors[next.index()];
        path.push(next);
    }

    path
}

/// Assumes `graph` is a tree.
pub fn longest_path_in_tree<N, E>(graph: &StableGraph<N, E, Undirected>) -> Vec<NodeIndex> {
    let start = match graph.node_indices().next() {
        Some(n) => n,
        None => return Vec::new(),
    };
    // The node farthest from any node is one end of a diameter.
    let (end, _) = deepest_node(graph, start);

    longest_path_to_point_in_tree(graph, end)
}
