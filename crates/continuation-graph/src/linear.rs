//! Optional pass producing a graph where every non-composite node has
//! in-degree ≤ 1 and out-degree ≤ 1: breaks cycles, then enumerates every
//! linear path from a source (or composite node) to a sink (or composite
//! node) (§4.6).

use crate::graph::{Graph, NodeId};
use crate::warnings::{Warning, Warnings};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Iterative DFS from every unvisited node, colouring ENTER on push and
/// EXIT once all out-edges are processed. An edge to a Gray node is a back
/// edge: it is removed and the cycle is reported.
pub fn break_cycles(graph: &mut Graph, warnings: &mut Warnings) {
    let n = graph.nodes.len();
    let mut color = vec![Color::White; n];
    let mut to_remove = Vec::new();

    for start in 0..n {
        if color[start] != Color::White {
            continue;
        }
        let mut stack: Vec<(NodeId, usize)> = vec![(start, 0)];
        color[start] = Color::Gray;

        while let Some(&(node, i)) = stack.last() {
            let out = graph.out_edge_indices(node);
            if i < out.len() {
                stack.last_mut().unwrap().1 += 1;
                let edge_idx = out[i];
                let to = graph.edges[edge_idx].to;
                match color[to] {
                    Color::White => {
                        color[to] = Color::Gray;
                        stack.push((to, 0));
                    }
                    Color::Gray => {
                        to_remove.push(edge_idx);
                        warnings.push(Warning::CycleBroken {
                            from_trip: graph.nodes[node].trip_id.to_string(),
                            to_trip: graph.nodes[to].trip_id.to_string(),
                        });
                    }
                    Color::Black => {}
                }
            } else {
                color[node] = Color::Black;
                stack.pop();
            }
        }
    }

    to_remove.sort_unstable();
    to_remove.dedup();
    for idx in to_remove.into_iter().rev() {
        graph.edges.remove(idx);
    }
}

/// One linear chain of nodes from a source (or composite node) to a sink
/// (or composite node). Composite nodes are never duplicated across paths;
/// every other node is private to its path once the exporter materialises
/// clones.
pub type LinearPath = Vec<NodeId>;

/// Enumerates every linear path, assuming `break_cycles` already ran.
/// Seeds the walk at every node with no incoming edges and every composite
/// node, join or split; stops a path at a sink or a composite
/// (vehicle-split) node reached mid-walk.
pub fn enumerate_linear_paths(graph: &Graph) -> Vec<LinearPath> {
    let sources: Vec<NodeId> = (0..graph.nodes.len())
        .filter(|&n| {
            graph.in_edge_indices(n).is_empty()
                || graph.nodes[n].composite_join
                || graph.nodes[n].composite_split
        })
        .collect();

    let mut paths = Vec::new();
    for start in sources {
        walk(graph, start, vec![start], &mut paths);
    }
    paths
}

fn walk(graph: &Graph, node: NodeId, path: Vec<NodeId>, paths: &mut Vec<LinearPath>) {
    if graph.nodes[node].composite_split && path.len() > 1 {
        paths.push(path);
        return;
    }
    let out = graph.out_edge_indices(node);
    if out.is_empty() {
        paths.push(path);
        return;
    }
    for edge_idx in out {
        let to = graph.edges[edge_idx].to;
        let mut next_path = path.clone();
        next_path.push(to);
        walk(graph, to, next_path, paths);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::continuation_type::ContinuationType;
    use crate::dayset::DaySet;
    use crate::graph::Edge;
    use utility::id::Id;

    fn node(graph: &mut Graph, id: &str) -> NodeId {
        graph.node_for_trip(&Id::new(id.to_owned()), &DaySet::empty(4))
    }

    fn edge(graph: &mut Graph, from: NodeId, to: NodeId, rank: u32) {
        graph.edges.push(Edge {
            from,
            to,
            shift: 0,
            days: DaySet::empty(4),
            kind: ContinuationType::InSeat,
            rank,
            pre_declared: false,
        });
    }

    #[test]
    fn back_edge_is_removed_and_warned() {
        let mut graph = Graph::new();
        let a = node(&mut graph, "A");
        let b = node(&mut graph, "B");
        edge(&mut graph, a, b, 1);
        edge(&mut graph, b, a, 1);

        let mut warnings = Warnings::new();
        break_cycles(&mut graph, &mut warnings);
        assert_eq!(graph.edges.len(), 1);
        assert!(warnings.any_fired());
    }

    #[test]
    fn branching_graph_yields_one_path_per_branch() {
        let mut graph = Graph::new();
        let a = node(&mut graph, "A");
        let b = node(&mut graph, "B");
        let c = node(&mut graph, "C");
        edge(&mut graph, a, b, 1);
        edge(&mut graph, a, c, 2);

        let paths = enumerate_linear_paths(&graph);
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().any(|p| p == &vec![a, b]));
        assert!(paths.iter().any(|p| p == &vec![a, c]));
    }

    #[test]
    fn linear_chain_yields_a_single_path() {
        let mut graph = Graph::new();
        let a = node(&mut graph, "A");
        let b = node(&mut graph, "B");
        let c = node(&mut graph, "C");
        edge(&mut graph, a, b, 1);
        edge(&mut graph, b, c, 1);

        let paths = enumerate_linear_paths(&graph);
        assert_eq!(paths, vec![vec![a, b, c]]);
    }

    #[test]
    fn composite_split_with_incoming_edge_still_seeds_its_branches() {
        let mut graph = Graph::new();
        let a = node(&mut graph, "A");
        let b = node(&mut graph, "B");
        let d = node(&mut graph, "D");
        let e = node(&mut graph, "E");
        edge(&mut graph, a, b, 1);
        edge(&mut graph, b, d, 1);
        edge(&mut graph, b, e, 2);
        graph.nodes[b].composite_split = true;

        let paths = enumerate_linear_paths(&graph);
        assert_eq!(paths.len(), 3);
        assert!(paths.iter().any(|p| p == &vec![a, b]));
        assert!(paths.iter().any(|p| p == &vec![b, d]));
        assert!(paths.iter().any(|p| p == &vec![b, e]));
    }
}
