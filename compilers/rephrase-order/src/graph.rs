use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

/// Evidence behind an `a -> b` edge ("a comes before b").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Precedence {
    /// `a` preceded `b` in every example where both occurred.
    pub unanimous: bool,
    /// Examples in favour minus examples against.
    pub support: u32,
}

/// Pairwise precedence between ordering elements, learned from example
/// sequences.
#[derive(Debug, Clone, Default)]
pub struct PrecedenceGraph {
    graph: DiGraph<String, Precedence>,
    index_map: HashMap<String, NodeIndex>,
}

impl PrecedenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts, for every ordered pair, the sequences where the first element
    /// comes before the second, then keeps one edge per pair: unanimous when
    /// the opposite order never occurs, majority otherwise. Ties add nothing.
    pub fn from_sequences<'a, I>(sequences: I) -> Self
    where
        I: IntoIterator<Item = &'a [String]>,
    {
        let mut before: BTreeMap<(&'a str, &'a str), u32> = BTreeMap::new();
        let mut elements: BTreeSet<&'a str> = BTreeSet::new();

        for sequence in sequences {
            for (i, a) in sequence.iter().enumerate() {
                elements.insert(a.as_str());
                for b in &sequence[i + 1..] {
                    if a != b {
                        *before.entry((a.as_str(), b.as_str())).or_insert(0) += 1;
                    }
                }
            }
        }

        let mut graph = PrecedenceGraph::new();
        for element in &elements {
            graph.add_element(element);
        }

        for (&(a, b), &ab) in &before {
            let ba = before.get(&(b, a)).copied().unwrap_or(0);
            if ba == 0 {
                graph.add_precedence(a, b, Precedence { unanimous: true, support: ab });
            } else if ab > ba {
                graph.add_precedence(a, b, Precedence { unanimous: false, support: ab - ba });
            } else if ab == ba && a < b {
                debug!(a, b, count = ab, "contested pair left unordered");
            }
        }
        graph
    }

    pub fn add_element(&mut self, element: &str) -> NodeIndex {
        if let Some(index) = self.index_map.get(element) {
            return *index;
        }
        let index = self.graph.add_node(element.to_string());
        self.index_map.insert(element.to_string(), index);
        index
    }

    pub fn add_precedence(&mut self, before: &str, after: &str, evidence: Precedence) {
        let from = self.add_element(before);
        let to = self.add_element(after);
        self.graph.update_edge(from, to, evidence);
    }

    pub fn precedence(&self, before: &str, after: &str) -> Option<Precedence> {
        let from = *self.index_map.get(before)?;
        let to = *self.index_map.get(after)?;
        self.graph.find_edge(from, to).map(|edge| self.graph[edge])
    }

    pub fn element_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Drops the weakest edge of each cyclic component until the graph is
    /// acyclic. Weakest means majority before unanimous, then lower
    /// support, then the lexically larger edge. Returns the dropped edges.
    pub fn break_cycles(&mut self) -> Vec<(String, String)> {
        let mut dropped = Vec::new();
        loop {
            let Some(edge) = self.weakest_cyclic_edge() else {
                break;
            };
            let Some((from, to)) = self.graph.edge_endpoints(edge) else {
                break;
            };
            let pair = (self.graph[from].clone(), self.graph[to].clone());
            warn!(before = %pair.0, after = %pair.1, evidence = ?self.graph[edge], "dropping edge to break an ordering cycle");
            self.graph.remove_edge(edge);
            dropped.push(pair);
        }
        dropped
    }

    fn weakest_cyclic_edge(&self) -> Option<EdgeIndex> {
        let component = tarjan_scc(&self.graph).into_iter().find(|scc| scc.len() > 1)?;
        let members: BTreeSet<NodeIndex> = component.into_iter().collect();

        self.graph
            .edge_references()
            .filter(|edge| members.contains(&edge.source()) && members.contains(&edge.target()))
            .min_by_key(|edge| {
                let names = (&self.graph[edge.source()], &self.graph[edge.target()]);
                (*edge.weight(), Reverse(names))
            })
            .map(|edge| edge.id())
    }

    /// Kahn's algorithm, always emitting the lexically smallest ready
    /// element. Anything left over by a remaining cycle is appended in
    /// lexical order.
    pub fn topological_order(&self) -> Vec<String> {
        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|node| (node, self.graph.neighbors_directed(node, Direction::Incoming).count()))
            .collect();
        let mut ready: BTreeSet<(&str, NodeIndex)> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(node, _)| (self.graph[*node].as_str(), *node))
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(next) = ready.iter().next().copied() {
            ready.remove(&next);
            let (name, node) = next;
            order.push(name.to_string());
            for successor in self.graph.neighbors_directed(node, Direction::Outgoing) {
                if let Some(degree) = in_degree.get_mut(&successor) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert((self.graph[successor].as_str(), successor));
                    }
                }
            }
        }

        if order.len() < self.graph.node_count() {
            let mut rest: Vec<String> = self
                .graph
                .node_weights()
                .filter(|name| !order.contains(name))
                .cloned()
                .collect();
            rest.sort();
            order.extend(rest);
        }
        order
    }
}

/// Learns one canonical order from example sequences.
pub fn learn_order<'a, I>(sequences: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut graph = PrecedenceGraph::from_sequences(sequences);
    graph.break_cycles();
    graph.topological_order()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn seqs(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|s| s.iter().map(|e| e.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_unanimous_and_majority_edges() {
        let sequences = seqs(&[&["A", "B", "C"], &["A", "C", "B"], &["A", "C", "B"]]);
        let graph = PrecedenceGraph::from_sequences(sequences.iter().map(Vec::as_slice));

        assert_eq!(graph.precedence("A", "B"), Some(Precedence { unanimous: true, support: 3 }));
        assert_eq!(graph.precedence("C", "B"), Some(Precedence { unanimous: false, support: 1 }));
        assert_eq!(graph.precedence("B", "C"), None);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_ties_leave_pair_unordered() {
        let sequences = seqs(&[&["X", "Y"], &["Y", "X"]]);
        let graph = PrecedenceGraph::from_sequences(sequences.iter().map(Vec::as_slice));
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.topological_order(), vec!["X", "Y"]);
    }

    #[test]
    fn test_cycle_drops_lexically_largest_weakest_edge() {
        let sequences = seqs(&[&["A", "B"], &["B", "C"], &["C", "A"]]);
        let mut graph = PrecedenceGraph::from_sequences(sequences.iter().map(Vec::as_slice));
        let dropped = graph.break_cycles();
        assert_eq!(dropped, vec![("C".to_string(), "A".to_string())]);
        assert_eq!(graph.topological_order(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_majority_edge_dropped_before_unanimous() {
        // A<B and B<C always; C<A twice, A<C once.
        let sequences = seqs(&[&["A", "B"], &["B", "C"], &["C", "A"], &["C", "A"], &["A", "C"]]);
        let mut graph = PrecedenceGraph::from_sequences(sequences.iter().map(Vec::as_slice));
        let dropped = graph.break_cycles();
        assert_eq!(dropped, vec![("C".to_string(), "A".to_string())]);
        assert_eq!(graph.topological_order(), vec!["A", "B", "C"]);
    }

    fn examples() -> impl Strategy<Value = Vec<Vec<String>>> {
        let pool = vec!["M1", "M2", "O1", "S", "V", "wh"];
        let example = (Just(pool).prop_shuffle(), prop::collection::vec(any::<bool>(), 6)).prop_map(|(order, keep)| {
            let mut kept: Vec<String> = order
                .iter()
                .zip(keep)
                .filter(|(e, k)| *k || **e == "S" || **e == "V")
                .map(|(e, _)| e.to_string())
                .collect();
            let s = kept.iter().position(|e| e == "S");
            let v = kept.iter().position(|e| e == "V");
            if let (Some(s), Some(v)) = (s, v) {
                if v < s {
                    kept.swap(s, v);
                }
            }
            kept
        });
        prop::collection::vec(example, 1..12)
    }

    proptest! {
        #[test]
        fn prop_unanimous_order_survives(sequences in examples()) {
            let order = learn_order(sequences.iter().map(Vec::as_slice));
            let s = order.iter().position(|e| e == "S").unwrap();
            let v = order.iter().position(|e| e == "V").unwrap();
            prop_assert!(s < v);
        }
    }
}
