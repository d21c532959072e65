use bstr::BString;

use crate::orientation::Orientation;

use super::{AssemblyGraph, VertexId};

/// A vertex read in one orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Node {
    pub vertex: VertexId,
    pub orientation: Orientation,
}

impl Node {
    #[inline]
    pub fn new(vertex: VertexId, orientation: Orientation) -> Self {
        Node {
            vertex,
            orientation,
        }
    }

    #[inline]
    pub fn flip(self) -> Self {
        Node::new(self.vertex, self.orientation.flip())
    }
}

/// A walk through the assembly graph. `weights[i]` is the weight of
/// the edge between `nodes[i]` and `nodes[i + 1]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphPath {
    nodes: Vec<Node>,
    weights: Vec<i64>,
}

impl GraphPath {
    pub fn new(start: Node) -> Self {
        GraphPath {
            nodes: vec![start],
            weights: Vec::new(),
        }
    }

    pub fn push(&mut self, node: Node, weight: i64) {
        if self.nodes.is_empty() {
            self.nodes.push(node);
        } else {
            self.nodes.push(node);
            self.weights.push(weight);
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn start(&self) -> Option<Node> {
        self.nodes.first().copied()
    }

    pub fn end(&self) -> Option<Node> {
        self.nodes.last().copied()
    }

    /// The same walk on the opposite strand.
    pub fn reverse_complement(&self) -> Self {
        GraphPath {
            nodes: self.nodes.iter().rev().map(|n| n.flip()).collect(),
            weights: self.weights.iter().rev().copied().collect(),
        }
    }

    /// Number of bases spelled by the path.
    pub fn length(&self, graph: &AssemblyGraph) -> i64 {
        let nodes: i64 = self
            .nodes
            .iter()
            .map(|n| graph.vertex(n.vertex).len() as i64)
            .sum();
        nodes + self.weights.iter().sum::<i64>()
    }

    /// Sequence spelled by the path. Overlapping bases are taken from
    /// the later node, and positive gaps between nodes are padded
    /// with N.
    pub fn spelling(&self, graph: &AssemblyGraph) -> BString {
        let mut seq: Vec<u8> = Vec::new();
        for (ix, node) in self.nodes.iter().enumerate() {
            let node_seq = graph.node_sequence(*node);
            match self.weights.get(ix) {
                Some(&w) if w <= 0 => {
                    let keep = (node_seq.len() as i64 + w).max(0) as usize;
                    seq.extend_from_slice(&node_seq[..keep]);
                }
                Some(&w) => {
                    seq.extend_from_slice(&node_seq);
                    seq.extend(std::iter::repeat(b'N').take(w as usize));
                }
                None => seq.extend_from_slice(&node_seq),
            }
        }
        seq.into()
    }
}

impl std::fmt::Display for GraphPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (ix, node) in self.nodes.iter().enumerate() {
            if ix > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}{}", node.vertex, node.orientation)?;
        }
        Ok(())
    }
}
