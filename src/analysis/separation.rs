//! separation.rs
//! Decides whether two variable sets are graph-separated given a conditioning
//! set, honoring the collider rules induced by conditioning.
//!
//! The test never enumerates paths. It runs the standard reduction: expand
//! each bidirected edge into a synthetic latent parent, restrict to the
//! ancestors of the query sets, moralize, drop the conditioning set, and
//! check plain undirected reachability. Tractable on wide graphs where path
//! enumeration is not.

use crate::graph::{CausalGraph, EdgeKind, NodeId};
use petgraph::visit::{EdgeRef, IntoEdgeReferences, NodeIndexable};
use smallvec::SmallVec;
use std::collections::HashSet;

pub struct SeparationOracle<'a> {
    model: &'a CausalGraph,
}

impl<'a> SeparationOracle<'a> {
    pub fn new(model: &'a CausalGraph) -> Self {
        Self { model }
    }

    /// True iff every path between `x` and `y` is blocked by `z`: blocked at a
    /// non-collider in `z`, or at a collider with neither itself nor a
    /// descendant in `z`.
    pub fn is_separated(&self, x: &[NodeId], y: &[NodeId], z: &[NodeId]) -> bool {
        self.separated(&[], x, y, z)
    }

    /// The same test on the graph with the directed edges *leaving* `cut`
    /// deleted. Backdoor and front-door checks phrase "ignore the causal
    /// route" this way; arrowheads into `cut` survive.
    pub fn is_separated_removing_outgoing(
        &self,
        cut: &[NodeId],
        x: &[NodeId],
        y: &[NodeId],
        z: &[NodeId],
    ) -> bool {
        self.separated(cut, x, y, z)
    }

    fn separated(&self, cut: &[NodeId], x: &[NodeId], y: &[NodeId], z: &[NodeId]) -> bool {
        let n = self.model.graph.node_bound();
        let cut_set: HashSet<usize> = cut.iter().map(|id| id.index()).collect();

        // 1. Parent lists, with each bidirected edge expanded into a fresh
        //    latent parent of both endpoints. Latents occupy indices >= n and
        //    can never be conditioned on.
        let mut parents: Vec<SmallVec<[usize; 4]>> = vec![SmallVec::new(); n];
        for edge in self.model.graph.edge_references() {
            let (source, target) = (edge.source().index(), edge.target().index());
            match edge.weight() {
                EdgeKind::Directed => {
                    if !cut_set.contains(&source) {
                        parents[target].push(source);
                    }
                }
                EdgeKind::Bidirected => {
                    let latent = parents.len();
                    parents.push(SmallVec::new());
                    parents[source].push(latent);
                    parents[target].push(latent);
                }
            }
        }
        let total = parents.len();

        let mut conditioned = vec![false; total];
        for id in z {
            conditioned[id.index()] = true;
        }

        // Query nodes swallowed by the conditioning set cannot carry a path.
        let sources: Vec<usize> = x
            .iter()
            .map(|id| id.index())
            .filter(|i| !conditioned[*i])
            .collect();
        let mut is_sink = vec![false; total];
        let mut any_sink = false;
        for id in y {
            let i = id.index();
            if !conditioned[i] {
                is_sink[i] = true;
                any_sink = true;
            }
        }
        if sources.is_empty() || !any_sink {
            return true;
        }
        if sources.iter().any(|&i| is_sink[i]) {
            return false;
        }

        // 2. Restrict to ancestors of x, y and z.
        let mut ancestral = vec![false; total];
        let mut stack: Vec<usize> = x
            .iter()
            .chain(y.iter())
            .chain(z.iter())
            .map(|id| id.index())
            .collect();
        while let Some(node) = stack.pop() {
            if ancestral[node] {
                continue;
            }
            ancestral[node] = true;
            // Every parent of an ancestral node is itself ancestral.
            stack.extend(parents[node].iter().copied());
        }

        // 3. Moralize: undirect every surviving edge and marry co-parents.
        let mut adjacency: Vec<SmallVec<[usize; 8]>> = vec![SmallVec::new(); total];
        for child in 0..total {
            if !ancestral[child] {
                continue;
            }
            let family = &parents[child];
            for (i, &p) in family.iter().enumerate() {
                adjacency[p].push(child);
                adjacency[child].push(p);
                for &q in &family[i + 1..] {
                    adjacency[p].push(q);
                    adjacency[q].push(p);
                }
            }
        }

        // 4. Plain reachability, with conditioned nodes deleted.
        let mut visited = vec![false; total];
        let mut queue: Vec<usize> = Vec::new();
        for &s in &sources {
            if !visited[s] {
                visited[s] = true;
                queue.push(s);
            }
        }
        while let Some(node) = queue.pop() {
            for &next in &adjacency[node] {
                if visited[next] || conditioned[next] {
                    continue;
                }
                if is_sink[next] {
                    return false;
                }
                visited[next] = true;
                queue.push(next);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::CausalGraphBuilder;
    use rstest::rstest;

    fn ids(graph: &CausalGraph, names: &[&str]) -> Vec<NodeId> {
        names.iter().map(|n| graph.node_id(n).unwrap()).collect()
    }

    fn collider_graph() -> CausalGraph {
        // a -> c <- b, c -> d
        CausalGraphBuilder::new(["a"], ["b"])
            .edge("a", "c")
            .edge("b", "c")
            .edge("c", "d")
            .build()
            .unwrap()
    }

    #[rstest]
    #[case::chain_open(&[("a", "b"), ("b", "c")], "a", "c", &[], false)]
    #[case::chain_blocked(&[("a", "b"), ("b", "c")], "a", "c", &["b"], true)]
    #[case::fork_open(&[("z", "a"), ("z", "b")], "a", "b", &[], false)]
    #[case::fork_blocked(&[("z", "a"), ("z", "b")], "a", "b", &["z"], true)]
    fn chains_and_forks(
        #[case] edges: &[(&str, &str)],
        #[case] x_name: &str,
        #[case] y_name: &str,
        #[case] conditioning: &[&str],
        #[case] expect_separated: bool,
    ) {
        let mut builder = CausalGraphBuilder::new([x_name], [y_name]);
        for (from, to) in edges {
            builder = builder.edge(*from, *to);
        }
        let graph = builder.build().unwrap();
        let oracle = SeparationOracle::new(&graph);
        let x = ids(&graph, &[x_name]);
        let y = ids(&graph, &[y_name]);
        let z = ids(&graph, conditioning);
        assert_eq!(oracle.is_separated(&x, &y, &z), expect_separated);
    }

    #[test]
    fn collider_blocks_until_conditioned() {
        let graph = collider_graph();
        let oracle = SeparationOracle::new(&graph);
        let a = ids(&graph, &["a"]);
        let b = ids(&graph, &["b"]);

        // Unconditioned collider blocks the path.
        assert!(oracle.is_separated(&a, &b, &[]));
        // Conditioning on the collider opens it.
        assert!(!oracle.is_separated(&a, &b, &ids(&graph, &["c"])));
        // Conditioning on a descendant of the collider also opens it.
        assert!(!oracle.is_separated(&a, &b, &ids(&graph, &["d"])));
    }

    #[test]
    fn latent_link_connects_endpoints_regardless_of_conditioning() {
        let graph = CausalGraphBuilder::new(["t"], ["y"])
            .edge("t", "y")
            .edge("z", "t")
            .edge("z", "y")
            .bidirected("t", "y")
            .build()
            .unwrap();
        let oracle = SeparationOracle::new(&graph);
        let t = ids(&graph, &["t"]);
        let y = ids(&graph, &["y"]);
        let z = ids(&graph, &["z"]);

        // Even cutting the causal edge and adjusting for z, the latent link
        // keeps t and y connected.
        assert!(!oracle.is_separated_removing_outgoing(&t, &t, &y, &z));
    }

    #[test]
    fn removing_outgoing_edges_isolates_the_causal_route() {
        let graph = CausalGraphBuilder::new(["t"], ["y"])
            .edge("t", "m")
            .edge("m", "y")
            .build()
            .unwrap();
        let oracle = SeparationOracle::new(&graph);
        let t = ids(&graph, &["t"]);
        let y = ids(&graph, &["y"]);

        // The only t-y path is causal, so cutting t's outgoing edges
        // separates the pair without any conditioning.
        assert!(!oracle.is_separated(&t, &y, &[]));
        assert!(oracle.is_separated_removing_outgoing(&t, &t, &y, &[]));
    }

    #[test]
    fn query_nodes_inside_the_conditioning_set_carry_no_path() {
        let graph = collider_graph();
        let oracle = SeparationOracle::new(&graph);
        let a = ids(&graph, &["a"]);
        let b = ids(&graph, &["b"]);
        assert!(oracle.is_separated(&a, &b, &ids(&graph, &["a"])));
    }
}
