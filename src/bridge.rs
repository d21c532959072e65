//! Bridges: aggregated long-read evidence that two contigs sit next to
//! each other.

use bstr::BString;

use std::fmt;
use std::sync::Arc;

use crate::alignment::{AlignmentRecord, ReadFilling};
use crate::config::ScaffoldConfig;
use crate::contig::ContigId;
use crate::graph::GraphPath;
use crate::vector::ScaffoldVector;

/// Identifies a bridge by the ordered contig pair and a discriminator
/// separating mutually inconsistent placements of the same pair.
///
/// Bridges between two different contigs share the discriminator with
/// their twin. Self bridges use `2k` for one direction and `2k + 1` for
/// the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BridgeKey {
    pub first: ContigId,
    pub second: ContigId,
    pub discriminator: u32,
}

impl BridgeKey {
    #[inline]
    pub fn new(first: ContigId, second: ContigId, discriminator: u32) -> Self {
        BridgeKey {
            first,
            second,
            discriminator,
        }
    }

    /// The same adjacency seen from the second contig.
    #[inline]
    pub fn twin(&self) -> Self {
        if self.is_self() {
            BridgeKey::new(self.first, self.second, self.discriminator ^ 1)
        } else {
            BridgeKey::new(self.second, self.first, self.discriminator)
        }
    }

    #[inline]
    pub fn is_self(&self) -> bool {
        self.first == self.second
    }

    /// The contig on the other side of `id`, if `id` is one of the
    /// two ends.
    #[inline]
    pub fn partner(&self, id: ContigId) -> Option<ContigId> {
        if self.first == id {
            Some(self.second)
        } else if self.second == id {
            Some(self.first)
        } else {
            None
        }
    }

    #[inline]
    pub fn contains(&self, id: ContigId) -> bool {
        self.first == id || self.second == id
    }
}

impl fmt::Display for BridgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}#{}", self.first, self.second, self.discriminator)
    }
}

/// One long read aligned to both contigs of a bridge.
#[derive(Debug, Clone)]
pub struct Connection {
    pub read: Arc<ReadFilling>,
    pub first_alignment: AlignmentRecord,
    pub second_alignment: AlignmentRecord,
    pub trans: ScaffoldVector,
    pub score: i64,
    /// Synthesized from an assembly graph path rather than a read.
    pub from_graph: bool,
}

/// Bases inserted between two neighbouring contigs.
#[derive(Debug, Clone, PartialEq)]
pub struct Filling {
    pub bases: BString,
    /// Name of the read (or graph path) the bases came from and the
    /// 1-based inclusive range on it. `None` if nothing was inserted.
    pub source: Option<(BString, i64, i64)>,
    /// The read sequence was unknown and the gap was padded with N.
    pub padded: bool,
    /// Where the next contig resumes, as a 0-based boundary on its
    /// forward strand: the first emitted base for a forward contig,
    /// one past it for a reverse one.
    pub resume: i64,
}

impl Connection {
    pub fn new(
        read: Arc<ReadFilling>,
        first_alignment: AlignmentRecord,
        second_alignment: AlignmentRecord,
        trans: ScaffoldVector,
    ) -> Self {
        let a = (first_alignment.ref_start - first_alignment.ref_end).abs();
        let b = (second_alignment.ref_start - second_alignment.ref_end).abs();
        let score = if a + b > 0 { a * b / (a + b) } else { 0 };
        Connection {
            read,
            first_alignment,
            second_alignment,
            trans,
            score,
            from_graph: false,
        }
    }

    /// Unaligned read bases between the two alignments.
    #[inline]
    pub fn gaps(&self) -> i64 {
        self.read
            .gaps_between(&self.first_alignment, &self.second_alignment)
    }

    /// Compute the filling between the first contig, placed in
    /// direction `left_dir`, and the second contig of length
    /// `right_len` placed in direction `right_dir`.
    ///
    /// The read is first turned so that it runs along the scaffold.
    /// When the alignments overlap on the read nothing is inserted and
    /// the second contig resumes just after the overlap.
    pub fn filling(&self, left_dir: i8, right_dir: i8, right_len: usize) -> Filling {
        let (name, sequence, from, to) = if (left_dir > 0) == self.first_alignment.strand
        {
            (
                self.read.name.clone(),
                self.read.sequence.clone(),
                self.first_alignment.clone(),
                self.second_alignment.clone(),
            )
        } else {
            let rev = self.read.reverse();
            (
                rev.name,
                rev.sequence,
                self.first_alignment.reverse_read(),
                self.second_alignment.reverse_read(),
            )
        };

        let read_end = from.read_alignment_end();
        let read_final = to.read_alignment_start();

        let mut filling = Filling {
            bases: BString::from(""),
            source: None,
            padded: false,
            resume: 0,
        };

        let last = if read_end >= read_final {
            std::cmp::min(read_end + 1, to.read_alignment_end())
        } else {
            let (start, end) = (read_end + 1, read_final - 1);
            if end >= start {
                let slice = sequence.as_ref().and_then(|seq| {
                    seq.get((start - 1) as usize..end as usize)
                });
                match slice {
                    Some(bases) => filling.bases = bases.into(),
                    None => {
                        filling.bases = vec![b'N'; (end - start + 1) as usize].into();
                        filling.padded = true;
                    }
                }
                filling.source = Some((name, start, end));
            }
            read_final
        };

        let position = to.position_on_ref(last).unwrap_or(if right_dir > 0 {
            to.ref_start
        } else {
            to.ref_end
        });
        let resume = if right_dir > 0 { position - 1 } else { position };
        filling.resume = resume.max(0).min(right_len as i64);
        filling
    }
}

/// Which side of each contig a bridge is attached to: +1 for the right
/// (next) side, -1 for the left (previous) side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeSides {
    pub first: i8,
    pub second: i8,
}

/// Path found through the assembly graph for a bridge, with the
/// placement of the first contig it was searched for.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CachedPath {
    pub first_dir: i8,
    pub path: GraphPath,
    pub connection_trans: ScaffoldVector,
}

/// All connections supporting one placement of `key.second` relative
/// to `key.first`.
#[derive(Debug, Clone)]
pub struct ContigBridge {
    pub key: BridgeKey,
    trans: ScaffoldVector,
    score: f64,
    count: usize,
    representative: Connection,
    pub(crate) path: Option<CachedPath>,
}

impl ContigBridge {
    /// A bridge holding its first piece of evidence.
    pub fn new(key: BridgeKey, connection: Connection, score: f64) -> Self {
        ContigBridge {
            key,
            trans: connection.trans,
            score,
            count: 1,
            representative: connection,
            path: None,
        }
    }

    #[inline]
    pub fn trans(&self) -> ScaffoldVector {
        self.trans
    }

    #[inline]
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Number of connections seen.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn representative(&self) -> &Connection {
        &self.representative
    }

    pub fn path(&self) -> Option<&GraphPath> {
        self.path.as_ref().map(|c| &c.path)
    }

    /// Distance between the two contigs implied by the bridge.
    #[inline]
    pub fn distance(&self, first_len: usize, second_len: usize) -> i64 {
        self.trans.distance(first_len, second_len)
    }

    /// Whether `vector` agrees with this bridge's placement: same
    /// direction, and a magnitude within 25% or within the tolerance.
    pub fn consistent_with(&self, vector: ScaffoldVector, config: &ScaffoldConfig) -> bool {
        let tolerance = if self.key.is_self() {
            config.self_bridge_tolerance
        } else {
            config.bridge_tolerance
        };
        if vector.direction() != self.trans.direction() {
            return false;
        }
        let ratio = vector.magnitude() as f64 / self.trans.magnitude() as f64;
        (ratio > 0.75 && ratio < 1.25)
            || (vector.magnitude() - self.trans.magnitude()).abs() < tolerance
    }

    /// Add one more supporting connection. The connection leaving the
    /// fewest unaligned read bases is kept as the representative.
    pub fn add_connection(&mut self, connection: Connection, score: f64) -> f64 {
        self.count += 1;
        self.score += score;
        if connection.gaps() < self.representative.gaps() {
            self.trans = connection.trans;
            self.representative = connection;
        }
        self.score
    }

    /// The sides of the two contigs this bridge attaches to, where
    /// `first_len` is the length of the first contig.
    pub fn sides(&self, first_len: usize) -> BridgeSides {
        let mag = self.trans.magnitude();
        let dir = self.trans.direction();
        if mag < 0 {
            BridgeSides {
                first: -1,
                second: if dir < 0 { -1 } else { 1 },
            }
        } else if mag < first_len as i64 && dir < 0 {
            BridgeSides {
                first: -1,
                second: -1,
            }
        } else {
            BridgeSides {
                first: 1,
                second: if dir > 0 { -1 } else { 1 },
            }
        }
    }

    pub(crate) fn set_trans(&mut self, trans: ScaffoldVector) {
        self.trans = trans;
    }
}
