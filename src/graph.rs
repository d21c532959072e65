//! The auxiliary bidirected assembly graph used to fill short gaps
//! between bridged contigs.

pub mod gfa;
pub mod path;
pub mod search;

pub use self::gfa::{load_gfa, parse_gfa};
pub use self::path::{GraphPath, Node};
pub use self::search::{find_paths, Clock, PathHit, SearchOutcome, WallClock};

use bstr::{BStr, BString, ByteSlice};
use fnv::FnvHashMap;

use crate::orientation::Orientation;

pub type VertexId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub label: BString,
    pub sequence: BString,
    pub coverage: f64,
}

impl Vertex {
    #[inline]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Leaving `from` while reading it in `from_orient` leads into `to`,
/// read in `to_orient`. The weight is the signed gap between the two,
/// so an overlap of k bases has weight `-k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: VertexId,
    pub from_orient: Orientation,
    pub to: VertexId,
    pub to_orient: Orientation,
    pub weight: i64,
}

impl Edge {
    /// The same adjacency read from the other strand.
    #[inline]
    pub fn twin(&self) -> Self {
        Edge {
            from: self.to,
            from_orient: self.to_orient.flip(),
            to: self.from,
            to_orient: self.from_orient.flip(),
            weight: self.weight,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AssemblyGraph {
    vertices: Vec<Vertex>,
    labels: FnvHashMap<BString, VertexId>,
    adjacency: Vec<Vec<Edge>>,
    paths: FnvHashMap<BString, Vec<GraphPath>>,
    kmer: usize,
}

impl AssemblyGraph {
    pub fn new() -> Self {
        Default::default()
    }

    /// Add a vertex, or return the id of the existing vertex with the
    /// same label.
    pub fn add_vertex<L, S>(
        &mut self,
        label: L,
        sequence: S,
        coverage: f64,
    ) -> VertexId
    where
        L: Into<BString>,
        S: Into<BString>,
    {
        let label = label.into();
        if let Some(&id) = self.labels.get(&label) {
            return id;
        }
        let id = self.vertices.len();
        self.labels.insert(label.clone(), id);
        self.vertices.push(Vertex {
            label,
            sequence: sequence.into(),
            coverage,
        });
        self.adjacency.push(Vec::new());
        id
    }

    /// Insert an edge along with its twin on the opposite strand. A
    /// duplicate of an existing edge is ignored.
    pub fn add_edge(&mut self, edge: Edge) {
        let twin = edge.twin();
        for e in std::iter::once(edge).chain(std::iter::once(twin)) {
            let out = &mut self.adjacency[e.from];
            if !out.contains(&e) {
                out.push(e);
            }
        }
    }

    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id]
    }

    pub fn vertex_id(&self, label: &[u8]) -> Option<VertexId> {
        self.labels.get(label.as_bstr()).copied()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Edges leaving `node` in its orientation.
    pub fn edges_from(&self, node: Node) -> impl Iterator<Item = &Edge> + '_ {
        self.adjacency[node.vertex]
            .iter()
            .filter(move |e| e.from_orient == node.orientation)
    }

    pub fn edge_between(&self, from: Node, to: Node) -> Option<&Edge> {
        self.edges_from(from)
            .find(|e| e.to == to.vertex && e.to_orient == to.orientation)
    }

    /// The k-mer size of the assembler, estimated from link overlaps.
    pub fn kmer(&self) -> usize {
        self.kmer
    }

    pub fn set_kmer(&mut self, kmer: usize) {
        self.kmer = kmer;
    }

    /// Register a path decomposition for the contig called `name`.
    pub fn add_path<N: Into<BString>>(&mut self, name: N, path: GraphPath) {
        self.paths.entry(name.into()).or_default().push(path);
    }

    pub fn paths_of(&self, name: &BStr) -> Option<&[GraphPath]> {
        self.paths.get(name).map(Vec::as_slice)
    }

    /// Sequence of `node`, reverse complemented for a backward node.
    pub fn node_sequence(&self, node: Node) -> BString {
        let seq = &self.vertices[node.vertex].sequence;
        if node.orientation.is_reverse() {
            crate::contig::reverse_complement(seq)
        } else {
            seq.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Orientation::*;

    #[test]
    fn edges_come_with_twins() {
        let mut graph = AssemblyGraph::new();
        let a = graph.add_vertex("1", "ACGTA", 10.0);
        let b = graph.add_vertex("2", "TAGG", 10.0);
        assert_eq!(graph.add_vertex("1", "", 0.0), a);

        let edge = Edge {
            from: a,
            from_orient: Forward,
            to: b,
            to_orient: Backward,
            weight: -2,
        };
        graph.add_edge(edge);
        graph.add_edge(edge.twin());
        assert_eq!(graph.edge_count(), 1);

        let from_b = Node::new(b, Forward);
        let twin = graph.edge_between(from_b, Node::new(a, Backward));
        assert_eq!(twin.map(|e| e.weight), Some(-2));
        assert_eq!(graph.edges_from(Node::new(a, Backward)).count(), 0);
        assert_eq!(graph.node_sequence(Node::new(b, Backward)), "CCTA");
    }
}
