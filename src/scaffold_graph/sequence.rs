//! Turning a scaffold into sequence: contig slices joined by read
//! bases, assembly graph paths, or N padding.

use bstr::{BStr, BString, ByteSlice};
use log::{debug, trace, warn};

use std::sync::Arc;

use crate::alignment::{AlignmentRecord, ReadFilling};
use crate::bridge::{BridgeKey, CachedPath, Connection, Filling};
use crate::contig::{reverse_complement, ContigId};
use crate::graph::search::{find_paths, WallClock};
use crate::scaffold::Placed;

use super::ScaffoldGraph;

/// Where a stretch of scaffold sequence came from.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentSource {
    /// `start..end` is 0-based and half-open on the contig's forward
    /// strand.
    Contig {
        id: ContigId,
        name: BString,
        forward: bool,
        start: usize,
        end: usize,
    },
    /// 1-based inclusive range on the read, as oriented along the
    /// scaffold.
    Read { name: BString, start: i64, end: i64 },
    GraphPath { name: BString },
    /// Unknown bases.
    Padding,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub offset: usize,
    pub len: usize,
    pub source: SegmentSource,
}

/// The sequence of one finished scaffold.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaffoldSequence {
    pub head: ContigId,
    pub name: BString,
    pub circular: bool,
    pub sequence: BString,
    pub segments: Vec<Segment>,
}

impl ScaffoldSequence {
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

#[derive(Default)]
struct Builder {
    sequence: Vec<u8>,
    segments: Vec<Segment>,
}

impl Builder {
    fn push(&mut self, bases: &[u8], source: SegmentSource) {
        if bases.is_empty() {
            return;
        }
        self.segments.push(Segment {
            offset: self.sequence.len(),
            len: bases.len(),
            source,
        });
        self.sequence.extend_from_slice(bases);
    }

    fn push_fill(&mut self, fill: Filling, from_graph: bool) {
        let source = match fill.source {
            _ if fill.padded => SegmentSource::Padding,
            Some((name, _, _)) if from_graph => SegmentSource::GraphPath { name },
            Some((name, start, end)) => SegmentSource::Read { name, start, end },
            None => SegmentSource::Padding,
        };
        self.push(&fill.bases, source);
    }
}

/// Where the contig on the left of `conn` stops, as a 0-based
/// boundary on its forward strand.
fn left_end(conn: &Connection, dir: i8) -> i64 {
    if dir > 0 {
        conn.first_alignment.ref_end
    } else {
        conn.first_alignment.ref_start - 1
    }
}

fn synthetic_alignment(
    read: &BStr,
    contig: ContigId,
    (ref_start, ref_end): (i64, i64),
    (read_start, read_end): (i64, i64),
    read_length: i64,
    strand: bool,
) -> AlignmentRecord {
    AlignmentRecord {
        read_id: read.into(),
        contig,
        ref_start,
        ref_end,
        read_start,
        read_end,
        read_length,
        strand,
        useful: true,
        score: ref_end - ref_start + 1,
    }
}

impl ScaffoldGraph {
    /// Look for a path through the assembly graph between the two
    /// contigs of a bridge, placed in directions `first_dir` and
    /// `second_dir`. A path found is cached on the bridge and its
    /// length replaces the distance estimated from the reads.
    pub(crate) fn update_path(
        &mut self,
        key: BridgeKey,
        first_dir: i8,
        second_dir: i8,
    ) -> Option<Connection> {
        let graph = self.assembly.as_ref()?;
        let bridge = self.bridges.get(&key)?;
        let (c1, c2) = (&self.contigs[key.first], &self.contigs[key.second]);

        let tip1 = if first_dir > 0 {
            c1.paths.last()?.end()?
        } else {
            c1.paths.first()?.start()?.flip()
        };
        let tip2 = if second_dir > 0 {
            c2.paths.first()?.start()?
        } else {
            c2.paths.last()?.end()?.flip()
        };
        let (t1, t2) = (
            graph.vertex(tip1.vertex).len() as i64,
            graph.vertex(tip2.vertex).len() as i64,
        );

        let distance = bridge.distance(c1.len(), c2.len());
        if !self.config.force_fill && distance > self.config.search_radius {
            trace!("{} spans {} bases, too far to search", key, distance);
            return None;
        }

        let cached = match &bridge.path {
            Some(cached) if cached.first_dir == first_dir => cached.clone(),
            _ => {
                let outcome = find_paths(
                    graph,
                    tip1,
                    tip2,
                    distance,
                    &self.config.search,
                    &WallClock::start(),
                );
                if outcome.cut_off {
                    debug!("Path search for {} ran out of time", key);
                }
                let path = outcome.best()?.clone();
                let found = path.length(graph) - t1 - t2;
                let mut trans = bridge.trans();
                trans.set_magnitude(
                    trans.magnitude() + (found - distance) * i64::from(first_dir),
                );
                debug!(
                    "{}: path {} spans {} bases, reads said {}",
                    key, path, found, distance
                );
                CachedPath {
                    first_dir,
                    path,
                    connection_trans: trans,
                }
            }
        };

        let spelling = cached.path.spelling(graph);
        let total = spelling.len() as i64;
        let name = BString::from(cached.path.to_string());
        let (len1, len2) = (c1.len() as i64, c2.len() as i64);

        let first = if first_dir > 0 {
            synthetic_alignment(name.as_bstr(), key.first, ((len1 - t1 + 1).max(1), len1), (1, t1), total, true)
        } else {
            synthetic_alignment(name.as_bstr(), key.first, (1, t1.min(len1)), (t1, 1), total, false)
        };
        let second = if second_dir > 0 {
            synthetic_alignment(
                name.as_bstr(),
                key.second,
                (1, t2.min(len2)),
                (total - t2 + 1, total),
                total,
                true,
            )
        } else {
            synthetic_alignment(
                name.as_bstr(),
                key.second,
                ((len2 - t2 + 1).max(1), len2),
                (total, total - t2 + 1),
                total,
                false,
            )
        };

        let trans = cached.connection_trans;
        let read = Arc::new(ReadFilling::new(
            name,
            Some(spelling),
            vec![first.clone(), second.clone()],
        ));
        let mut connection = Connection::new(read, first, second, trans);
        connection.from_graph = true;

        if let Some(bridge) = self.bridges.get_mut(&key) {
            bridge.set_trans(trans);
            bridge.path = Some(cached);
        }
        if let Some(twin) = self.bridges.get_mut(&key.twin()) {
            twin.set_trans(trans.reverse());
        }
        Some(connection)
    }

    /// The connection used to fill the gap of a bridge: a graph path
    /// when one is found, the representative read otherwise.
    pub(crate) fn best_connection(
        &mut self,
        key: BridgeKey,
        first_dir: i8,
        second_dir: i8,
    ) -> Option<Connection> {
        if let Some(connection) = self.update_path(key, first_dir, second_dir) {
            return Some(connection);
        }
        self.bridges.get(&key).map(|b| b.representative().clone())
    }

    fn push_contig(&self, out: &mut Builder, placed: &Placed, start: i64, end: i64) {
        let ctg = &self.contigs[placed.id];
        let len = ctg.len() as i64;
        let clamp = |x: i64| x.max(0).min(len) as usize;
        let forward = placed.direction() > 0;
        let (lo, hi) = if forward {
            (clamp(start), clamp(end))
        } else {
            (clamp(end), clamp(start))
        };
        if hi <= lo {
            return;
        }
        let slice = &ctg.sequence[lo..hi];
        let bases = if forward {
            BString::from(slice)
        } else {
            reverse_complement(slice)
        };
        out.push(
            &bases,
            SegmentSource::Contig {
                id: ctg.id,
                name: ctg.name.clone(),
                forward,
                start: lo,
                end: hi,
            },
        );
    }

    /// Spell out the scaffold headed by `head`.
    pub fn materialize(&mut self, head: ContigId) -> Option<ScaffoldSequence> {
        let scf = self.scaffold(head)?;
        let members: Vec<Placed> = scf.contigs().iter().copied().collect();
        let bridges: Vec<BridgeKey> = scf.bridges().iter().copied().collect();
        let close = scf.close_bridge();
        let (first, last) = (*members.first()?, *members.last()?);

        let mut out = Builder::default();
        let mut start = if first.direction() > 0 {
            0
        } else {
            self.len_of(first.id) as i64
        };

        let close_conn = match close {
            Some(key) => {
                let conn = self.best_connection(key, last.direction(), first.direction());
                if conn.is_none() {
                    warn!("Scaffold {} is closed by a missing bridge {}", head, key);
                }
                conn
            }
            None => None,
        };
        if let Some(conn) = &close_conn {
            start = conn
                .filling(last.direction(), first.direction(), self.len_of(first.id))
                .resume;
        }

        for (ix, &key) in bridges.iter().enumerate() {
            let (left, right) = (members[ix], members[ix + 1]);
            let conn = match self.best_connection(key, left.direction(), right.direction()) {
                Some(conn) => conn,
                None => {
                    warn!("Scaffold {} refers to a missing bridge {}", head, key);
                    return None;
                }
            };
            let end = left_end(&conn, left.direction());
            self.push_contig(&mut out, &left, start, end);

            let fill = conn.filling(left.direction(), right.direction(), self.len_of(right.id));
            start = fill.resume;
            out.push_fill(fill, conn.from_graph);
        }

        let end = match &close_conn {
            Some(conn) => left_end(conn, last.direction()),
            None if last.direction() > 0 => self.len_of(last.id) as i64,
            None => 0,
        };
        self.push_contig(&mut out, &last, start, end);
        if let Some(conn) = &close_conn {
            let fill = conn.filling(last.direction(), first.direction(), self.len_of(first.id));
            out.push_fill(fill, conn.from_graph);
        }

        Some(ScaffoldSequence {
            head,
            name: format!("scaffold{}", head).into(),
            circular: close_conn.is_some(),
            sequence: out.sequence.into(),
            segments: out.segments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::BridgeKey;
    use crate::config::ScaffoldConfig;
    use crate::contig::Contig;
    use crate::graph::{AssemblyGraph, Edge, GraphPath, Node};
    use crate::orientation::Orientation::Forward;
    use crate::scaffold::Scaffold;
    use crate::scaffold_graph::tests::bases;
    use crate::vector::ScaffoldVector;

    fn aln(
        contig: ContigId,
        contig_len: usize,
        ref_range: (i64, i64),
        read_range: (i64, i64),
        read_len: i64,
        strand: bool,
    ) -> AlignmentRecord {
        let config = ScaffoldConfig::default();
        AlignmentRecord::new(
            "r",
            contig,
            contig_len,
            ref_range,
            read_range,
            read_len,
            strand,
            config.margin,
            config.min_contig_length,
        )
    }

    /// Two contigs with a read running through both, 100 T's in
    /// between and ctg1 reverse complemented.
    fn spanned() -> (ScaffoldGraph, Vec<u8>) {
        let s0 = bases(1000, 1);
        let s1 = bases(1000, 2);
        let contigs = vec![
            Contig::new(0, "ctg0", s0.clone()).with_coverage(20.0),
            Contig::new(1, "ctg1", s1.clone()).with_coverage(20.0),
        ];
        let mut graph = ScaffoldGraph::new(contigs, ScaffoldConfig::default());

        let mut read = s0;
        read.extend(std::iter::repeat(b'T').take(100));
        read.extend_from_slice(&reverse_complement(&s1));
        let a = aln(0, 1000, (1, 1000), (1, 1000), 2100, true);
        // 1101..2100 on the read is 1..1000 on its reverse complement
        let b = aln(1, 1000, (1, 1000), (1, 1000), 2100, false);
        let filling = ReadFilling::new("r", Some(read.clone().into()), vec![a, b]);
        graph.ingest_read(filling).unwrap();
        (graph, read)
    }

    fn link(graph: &mut ScaffoldGraph, head: ContigId, key: BridgeKey) {
        let trans = graph.bridge(&key).unwrap().trans();
        let last = *graph.scaffolds[head].last().unwrap();
        let placed = Placed::new(key.second, ScaffoldVector::compose(last.vector, trans));
        graph.scaffolds[head].add_rear(placed, key);
        graph.scaffolds[key.second] = Scaffold::default();
        graph.settle(head);
    }

    #[test]
    fn read_bases_fill_the_gap() {
        let (mut graph, read) = spanned();
        link(&mut graph, 0, BridgeKey::new(0, 1, 0));
        let seq = graph.materialize(0).unwrap();
        assert!(!seq.circular);
        assert_eq!(seq.name, "scaffold0");
        assert_eq!(seq.sequence, read);

        assert_eq!(seq.segments.len(), 3);
        assert_eq!(
            seq.segments[1],
            Segment {
                offset: 1000,
                len: 100,
                source: SegmentSource::Read {
                    name: "r".into(),
                    start: 1001,
                    end: 1100
                },
            }
        );
        match &seq.segments[2].source {
            SegmentSource::Contig { id, forward, .. } => {
                assert_eq!(*id, 1);
                assert!(!forward);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn reversed_scaffold_spells_the_reverse_complement() {
        let (mut graph, read) = spanned();
        link(&mut graph, 0, BridgeKey::new(0, 1, 0));
        let scf = std::mem::take(&mut graph.scaffolds[0]);
        graph.change_head(scf, 1);

        let seq = graph.materialize(1).unwrap();
        assert_eq!(seq.sequence, reverse_complement(&read));
        assert_eq!(
            seq.segments[1].source,
            SegmentSource::Read {
                name: "REVr".into(),
                start: 1001,
                end: 1100
            }
        );
    }

    #[test]
    fn missing_read_sequence_is_padded() {
        let (mut graph, _) = spanned();
        let key = BridgeKey::new(0, 1, 0);
        let conn = graph.bridge(&key).unwrap().representative().clone();
        let bare = ReadFilling::new("r", None, conn.read.alignments.clone());
        let mut bare_conn = conn.clone();
        bare_conn.read = Arc::new(bare);
        let fill = bare_conn.filling(1, -1, 1000);
        assert!(fill.padded);
        assert_eq!(fill.bases, vec![b'N'; 100]);
    }

    #[test]
    fn circular_contig() {
        let s0 = bases(1000, 3);
        let contigs = vec![Contig::new(0, "ctg0", s0.clone()).with_coverage(20.0)];
        let mut graph = ScaffoldGraph::new(contigs, ScaffoldConfig::default());
        // the read wraps around the origin
        let mut read = s0[600..].to_vec();
        read.extend_from_slice(&s0);
        let a = aln(0, 1000, (601, 1000), (1, 400), 1400, true);
        let b = aln(0, 1000, (1, 1000), (401, 1400), 1400, true);
        graph
            .ingest_read(ReadFilling::new("r", Some(read.into()), vec![a, b]))
            .unwrap();

        let key = BridgeKey::new(0, 0, 0);
        assert_eq!(graph.bridge(&key).unwrap().trans(), ScaffoldVector::new(1000, 1));
        graph.set_close_bridge(0, key);
        assert_eq!(graph.scaffold(0).unwrap().length(|_| 1000), 1000);

        let seq = graph.materialize(0).unwrap();
        assert!(seq.circular);
        assert_eq!(seq.sequence, s0);
    }

    #[test]
    fn graph_path_fills_the_gap() {
        let s1 = bases(500, 4);
        let s3 = bases(500, 5);
        let middle = bases(80, 6);
        let mut s2 = s1[480..].to_vec();
        s2.extend_from_slice(&middle);
        s2.extend_from_slice(&s3[..20]);

        let mut assembly = AssemblyGraph::new();
        let v1 = assembly.add_vertex("1", s1.clone(), 20.0);
        let v2 = assembly.add_vertex("2", s2, 20.0);
        let v3 = assembly.add_vertex("3", s3.clone(), 20.0);
        for &(from, to) in [(v1, v2), (v2, v3)].iter() {
            assembly.add_edge(Edge {
                from,
                from_orient: Forward,
                to,
                to_orient: Forward,
                weight: -20,
            });
        }
        assembly.add_path("ctg0", GraphPath::new(Node::new(v1, Forward)));
        assembly.add_path("ctg1", GraphPath::new(Node::new(v3, Forward)));

        let contigs = vec![
            Contig::new(0, "ctg0", s1.clone()).with_coverage(20.0),
            Contig::new(1, "ctg1", s3.clone()).with_coverage(20.0),
        ];
        let mut graph =
            ScaffoldGraph::new(contigs, ScaffoldConfig::default()).with_assembly_graph(assembly);
        assert!(graph.contig(0).unwrap().has_graph_paths());

        // no read sequence, only the alignments
        let a = aln(0, 500, (1, 500), (1, 500), 1080, true);
        let b = aln(1, 500, (1, 500), (581, 1080), 1080, true);
        graph
            .ingest_read(ReadFilling::new("r", None, vec![a, b]))
            .unwrap();
        let key = BridgeKey::new(0, 1, 0);
        link(&mut graph, 0, key);

        let seq = graph.materialize(0).unwrap();
        let mut expected = s1;
        expected.extend_from_slice(&middle);
        expected.extend_from_slice(&s3);
        assert_eq!(seq.sequence, expected);
        assert!(matches!(seq.segments[1].source, SegmentSource::GraphPath { .. }));
        assert!(graph.bridge(&key).unwrap().path().is_some());
    }
}
