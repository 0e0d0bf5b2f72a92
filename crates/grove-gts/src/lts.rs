//! Explicit labelled transition systems as a [`RuleSystem`].
//!
//! Every state is a named node and every edge a rule application. This is
//! the smallest engine that exercises the whole exploration stack, which is
//! what the tests, benches and fuzz targets use it for.

use crate::rules::{ApplyError, RuleSystem};
use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// A node of an [`Lts`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LtsNode(u32);

impl LtsNode {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An outgoing edge of a node, offered as a match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LtsMatch {
    pub edge: usize,
    pub rule: Arc<str>,
}

#[derive(Clone, Debug)]
struct Edge {
    from: LtsNode,
    rule: Arc<str>,
    to: LtsNode,
}

#[derive(Clone, Debug)]
struct NodeData {
    name: String,
    transient: bool,
    size: usize,
}

/// A labelled transition system with named nodes.
#[derive(Debug, Default)]
pub struct Lts {
    nodes: Vec<NodeData>,
    names: HashMap<String, LtsNode>,
    edges: Vec<Edge>,
    start: Option<LtsNode>,
    /// Remaining number of interruptions to raise, per rule.
    interrupts: BTreeMap<Arc<str>, Cell<usize>>,
}

impl Lts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a system from `(from, rule, to)` triples, starting at `start`.
    pub fn from_edges(start: &str, edges: &[(&str, &str, &str)]) -> Self {
        let mut lts = Self::new();
        lts.set_start(start);
        for (from, rule, to) in edges {
            lts.add_edge(from, rule, to);
        }
        lts
    }

    /// The node called `name`, creating it if needed.
    pub fn node(&mut self, name: &str) -> LtsNode {
        if let Some(&node) = self.names.get(name) {
            return node;
        }
        let node = LtsNode(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            name: name.to_string(),
            transient: false,
            size: 1,
        });
        self.names.insert(name.to_string(), node);
        node
    }

    pub fn find(&self, name: &str) -> Option<LtsNode> {
        self.names.get(name).copied()
    }

    pub fn name(&self, node: LtsNode) -> &str {
        &self.nodes[node.index()].name
    }

    pub fn set_start(&mut self, name: &str) -> &mut Self {
        let node = self.node(name);
        self.start = Some(node);
        self
    }

    pub fn add_edge(&mut self, from: &str, rule: &str, to: &str) -> &mut Self {
        let from = self.node(from);
        let to = self.node(to);
        self.edges.push(Edge {
            from,
            rule: Arc::from(rule),
            to,
        });
        self
    }

    pub fn set_transient(&mut self, name: &str) -> &mut Self {
        let node = self.node(name);
        self.nodes[node.index()].transient = true;
        self
    }

    /// Set the node count reported for `name` (default 1).
    pub fn set_size(&mut self, name: &str, size: usize) -> &mut Self {
        let node = self.node(name);
        self.nodes[node.index()].size = size;
        self
    }

    /// Make the next `times` applications of `rule` fail with
    /// [`ApplyError::Interrupted`].
    pub fn interrupt_on(&mut self, rule: &str, times: usize) -> &mut Self {
        self.interrupts.insert(Arc::from(rule), Cell::new(times));
        self
    }

    pub fn node_len(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_len(&self) -> usize {
        self.edges.len()
    }
}

impl RuleSystem for Lts {
    type Graph = LtsNode;
    type Match = LtsMatch;

    fn start_graph(&self) -> LtsNode {
        self.start.unwrap_or(LtsNode(0))
    }

    fn matches(&self, graph: &LtsNode) -> Vec<LtsMatch> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.from == *graph)
            .map(|(edge, e)| LtsMatch {
                edge,
                rule: e.rule.clone(),
            })
            .collect()
    }

    fn apply(&self, graph: &LtsNode, m: &LtsMatch) -> Result<LtsNode, ApplyError> {
        if let Some(remaining) = self.interrupts.get(&m.rule) {
            if remaining.get() > 0 {
                remaining.set(remaining.get() - 1);
                return Err(ApplyError::Interrupted);
            }
        }
        match self.edges.get(m.edge) {
            Some(e) if e.from == *graph => Ok(e.to),
            _ => Err(ApplyError::Failed {
                rule: m.rule.clone(),
                message: format!("edge {} does not leave {}", m.edge, self.name(*graph)),
            }),
        }
    }

    fn rule_name(&self, m: &LtsMatch) -> Arc<str> {
        m.rule.clone()
    }

    fn is_transient(&self, graph: &LtsNode) -> bool {
        self.nodes[graph.index()].transient
    }

    fn node_count(&self, graph: &LtsNode) -> usize {
        self.nodes[graph.index()].size
    }
}
