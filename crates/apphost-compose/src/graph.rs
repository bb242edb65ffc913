//! Wait-for graph management using `petgraph`.
//!
//! Builds a directed acyclic graph from wait-for declarations and
//! resolves the order in which resources may be started.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, VecDeque};

use apphost_common::error::{AppHostError, Result, Violation};
use petgraph::Direction;
use petgraph::graph::NodeIndex;

/// A wait-for graph of resources.
///
/// Nodes are added in declaration order, so a node's index is also its
/// declaration position and is used to break ties deterministically.
#[derive(Debug, Clone, Default)]
pub struct WaitGraph {
    /// Internal petgraph representation.
    graph: petgraph::Graph<String, ()>,
}

impl WaitGraph {
    /// Creates an empty wait graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: petgraph::Graph::new(),
        }
    }

    /// Adds a resource node to the graph.
    pub fn add_resource(&mut self, name: impl Into<String>) -> NodeIndex {
        self.graph.add_node(name.into())
    }

    /// Number of resources in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns `true` if the graph has no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Adds a wait-for edge: `consumer` waits for `provider`.
    ///
    /// The graph edge points from `provider` to `consumer`
    /// so that a topological sort yields providers first.
    /// Repeated edges are ignored.
    pub fn add_wait(&mut self, consumer: NodeIndex, provider: NodeIndex) {
        if self.graph.find_edge(provider, consumer).is_none() {
            let _ = self.graph.add_edge(provider, consumer, ());
        }
    }

    /// Returns the chain that adding `consumer` waits-for `provider` would close.
    ///
    /// The chain starts at `provider` and follows what it already waits for
    /// down to `consumer`. `None` means the edge is safe to add.
    #[must_use]
    pub fn find_wait_chain(&self, consumer: NodeIndex, provider: NodeIndex) -> Option<Vec<String>> {
        if consumer == provider {
            return Some(Vec::new());
        }

        // Breadth-first from consumer along provider -> consumer edges.
        // Reaching provider means provider already (transitively) waits on consumer.
        let mut previous: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut queue = VecDeque::from([consumer]);
        while let Some(node) = queue.pop_front() {
            if node == provider {
                let mut chain = vec![self.graph[node].clone()];
                let mut current = node;
                while let Some(&prev) = previous.get(&current) {
                    chain.push(self.graph[prev].clone());
                    current = prev;
                }
                return Some(chain);
            }
            for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
                if next != consumer && !previous.contains_key(&next) {
                    let _ = previous.insert(next, node);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    /// Returns every group of resources that wait for each other.
    ///
    /// Members of each group are listed in declaration order.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut groups: Vec<Vec<NodeIndex>> = petgraph::algo::tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .collect();
        for group in &mut groups {
            group.sort_unstable();
        }
        groups.sort_unstable();
        groups
            .into_iter()
            .map(|group| group.into_iter().map(|i| self.graph[i].clone()).collect())
            .collect()
    }

    /// Returns a start ordering of resources.
    ///
    /// Providers appear before the resources that wait for them. Among
    /// resources that are ready at the same time, the one declared first
    /// comes first.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the resources caught in a cycle.
    pub fn resolve_order(&self) -> Result<Vec<String>> {
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|i| {
                self.graph
                    .neighbors_directed(i, Direction::Incoming)
                    .count()
            })
            .collect();

        let mut ready: BinaryHeap<Reverse<NodeIndex>> = self
            .graph
            .node_indices()
            .filter(|i| in_degree[i.index()] == 0)
            .map(Reverse)
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse(node)) = ready.pop() {
            order.push(self.graph[node].clone());
            for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
                let degree = &mut in_degree[next.index()];
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        if order.len() == self.graph.node_count() {
            Ok(order)
        } else {
            let violations = self
                .cycles()
                .into_iter()
                .map(|members| Violation::Cycle { members })
                .collect();
            Err(AppHostError::Validation { violations })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_graph_resolves_to_empty() {
        let graph = WaitGraph::new();
        let order = graph.resolve_order().expect("should resolve");
        assert!(order.is_empty());
        assert!(graph.is_empty());
    }

    #[test]
    fn single_node_resolves() {
        let mut graph = WaitGraph::new();
        let _ = graph.add_resource("apiservice");
        let order = graph.resolve_order().expect("should resolve");
        assert_eq!(order, vec!["apiservice"]);
    }

    #[test]
    fn provider_comes_before_consumer() {
        let mut graph = WaitGraph::new();
        let frontend = graph.add_resource("frontend");
        let api = graph.add_resource("apiservice");
        graph.add_wait(frontend, api);

        let order = graph.resolve_order().expect("should resolve");
        assert_eq!(order, vec!["apiservice", "frontend"]);
    }

    #[test]
    fn diamond_dependency() {
        let mut graph = WaitGraph::new();
        let a = graph.add_resource("a");
        let b = graph.add_resource("b");
        let c = graph.add_resource("c");
        let d = graph.add_resource("d");
        graph.add_wait(a, b);
        graph.add_wait(a, c);
        graph.add_wait(b, d);
        graph.add_wait(c, d);

        let order = graph.resolve_order().expect("should resolve");
        assert_eq!(order, vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn unrelated_nodes_keep_declaration_order() {
        let mut graph = WaitGraph::new();
        for name in ["x", "y", "z"] {
            let _ = graph.add_resource(name);
        }
        let order = graph.resolve_order().expect("should resolve");
        assert_eq!(order, vec!["x", "y", "z"]);
    }

    #[test]
    fn wait_chain_detects_closing_edge() {
        let mut graph = WaitGraph::new();
        let api = graph.add_resource("apiservice");
        let cache = graph.add_resource("cache");
        let frontend = graph.add_resource("frontend");
        graph.add_wait(api, cache);
        graph.add_wait(frontend, api);

        assert!(graph.find_wait_chain(frontend, cache).is_none());
        let chain = graph.find_wait_chain(cache, frontend).expect("cycle");
        assert_eq!(chain, vec!["frontend", "apiservice", "cache"]);
    }

    #[test]
    fn wait_chain_for_self_is_empty() {
        let mut graph = WaitGraph::new();
        let a = graph.add_resource("a");
        assert_eq!(graph.find_wait_chain(a, a), Some(Vec::new()));
    }

    #[test]
    fn cycle_detection() {
        let mut graph = WaitGraph::new();
        let a = graph.add_resource("a");
        let b = graph.add_resource("b");
        graph.add_wait(a, b);
        graph.add_wait(b, a);

        let err = graph.resolve_order().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("wait-for cycle between a, b"), "got: {msg}");
    }

    #[test]
    fn cycles_lists_each_component_once() {
        let mut graph = WaitGraph::new();
        let a = graph.add_resource("a");
        let b = graph.add_resource("b");
        let c = graph.add_resource("c");
        let d = graph.add_resource("d");
        let e = graph.add_resource("e");
        graph.add_wait(a, b);
        graph.add_wait(b, c);
        graph.add_wait(c, a);
        graph.add_wait(d, e);
        graph.add_wait(e, d);

        let cycles = graph.cycles();
        assert_eq!(
            cycles,
            vec![vec!["a", "b", "c"], vec!["d", "e"]]
        );
    }

    #[test]
    fn duplicate_wait_is_ignored() {
        let mut graph = WaitGraph::new();
        let a = graph.add_resource("a");
        let b = graph.add_resource("b");
        graph.add_wait(a, b);
        graph.add_wait(a, b);
        assert_eq!(graph.graph.edge_count(), 1);
        assert_eq!(graph.resolve_order().expect("resolve"), vec!["b", "a"]);
    }
}
