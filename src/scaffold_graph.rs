//! The scaffold graph owns every contig, every bridge between contigs
//! and the scaffolds built from them.
//!
//! Scaffolds live in a table indexed by contig id. Only the slot of a
//! scaffold's head contig holds it; the slots of the other members are
//! empty.

mod merge;
mod sequence;
mod stats;

pub use self::sequence::{ScaffoldSequence, Segment, SegmentSource};
pub use self::stats::Summary;

use bstr::{BString, ByteSlice};
use fnv::{FnvHashMap, FnvHashSet};
use log::{debug, info, log_enabled, trace, Level};

use std::sync::Arc;

use crate::alignment::{AlignmentRecord, ReadFilling};
use crate::bridge::{BridgeKey, Connection, ContigBridge};
use crate::config::ScaffoldConfig;
use crate::contig::{Contig, ContigId};
use crate::error::{Error, Result};
use crate::graph::AssemblyGraph;
use crate::paf::PafRecord;
use crate::scaffold::{Placed, Scaffold};
use crate::vector::ScaffoldVector;

/// A strategy for ordering contigs into scaffolds from the bridges of
/// a graph.
pub trait Scaffolder {
    fn connect_bridges(&self, graph: &mut ScaffoldGraph);
}

#[derive(Debug, Clone)]
pub struct ScaffoldGraph {
    pub(crate) config: ScaffoldConfig,
    pub(crate) contigs: Vec<Contig>,
    names: FnvHashMap<BString, ContigId>,
    pub(crate) bridges: FnvHashMap<BridgeKey, ContigBridge>,
    /// Keys of the bridges whose first contig is the index.
    pub(crate) bridges_by_contig: Vec<Vec<BridgeKey>>,
    pub(crate) scaffolds: Vec<Scaffold>,
    pub(crate) assembly: Option<AssemblyGraph>,
    /// Repeat contigs placed into some scaffold as a clone.
    pub(crate) fillers: FnvHashSet<ContigId>,
    estimated_coverage: f64,
    estimated_length: usize,
    read_count: usize,
    base_count: usize,
}

impl ScaffoldGraph {
    /// Build a graph where every contig is a scaffold of its own.
    /// Contigs are renumbered in the order given.
    pub fn new(mut contigs: Vec<Contig>, config: ScaffoldConfig) -> Self {
        let mut names = FnvHashMap::default();
        for (id, ctg) in contigs.iter_mut().enumerate() {
            ctg.id = id;
            ctg.head = id;
            ctg.vector = ScaffoldVector::identity();
            ctg.set_eukaryotic(config.eukaryotic);
            names.insert(ctg.name.clone(), id);
        }

        let estimated_length: usize = contigs.iter().map(Contig::len).sum();
        let weighted: f64 = contigs.iter().map(|c| c.coverage * c.len() as f64).sum();
        let estimated_coverage = if estimated_length > 0 {
            weighted / estimated_length as f64
        } else {
            1.0
        };
        info!(
            "{} contigs, {} bases, estimated coverage {:.2}",
            contigs.len(),
            estimated_length,
            estimated_coverage
        );

        let n = contigs.len();
        ScaffoldGraph {
            config,
            contigs,
            names,
            bridges: FnvHashMap::default(),
            bridges_by_contig: vec![Vec::new(); n],
            scaffolds: (0..n).map(Scaffold::singleton).collect(),
            assembly: None,
            fillers: FnvHashSet::default(),
            estimated_coverage,
            estimated_length,
            read_count: 0,
            base_count: 0,
        }
    }

    /// Attach an assembly graph and look up each contig's path
    /// decomposition in it by name.
    pub fn set_assembly_graph(&mut self, graph: AssemblyGraph) {
        let mut found = 0;
        for ctg in self.contigs.iter_mut() {
            if let Some(paths) = graph.paths_of(ctg.name.as_bstr()) {
                ctg.paths = paths.to_vec();
                found += 1;
            }
        }
        info!(
            "{} of {} contigs have a path in the assembly graph",
            found,
            self.contigs.len()
        );
        self.assembly = Some(graph);
    }

    pub fn with_assembly_graph(mut self, graph: AssemblyGraph) -> Self {
        self.set_assembly_graph(graph);
        self
    }

    #[inline]
    pub fn config(&self) -> &ScaffoldConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ScaffoldConfig {
        &mut self.config
    }

    pub fn has_assembly_graph(&self) -> bool {
        self.assembly.is_some()
    }

    #[inline]
    pub fn contigs(&self) -> &[Contig] {
        &self.contigs
    }

    #[inline]
    pub fn contig(&self, id: ContigId) -> Option<&Contig> {
        self.contigs.get(id)
    }

    pub fn contig_id(&self, name: &[u8]) -> Option<ContigId> {
        self.names.get(name.as_bstr()).copied()
    }

    /// The scaffold headed by `head`, if that slot is live.
    pub fn scaffold(&self, head: ContigId) -> Option<&Scaffold> {
        self.scaffolds.get(head).filter(|s| !s.is_empty())
    }

    pub fn scaffolds(&self) -> &[Scaffold] {
        &self.scaffolds
    }

    pub fn bridge(&self, key: &BridgeKey) -> Option<&ContigBridge> {
        self.bridges.get(key)
    }

    /// Bridges whose first contig is `id`.
    pub fn bridges_from(&self, id: ContigId) -> impl Iterator<Item = &ContigBridge> + '_ {
        self.bridges_by_contig
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(move |key| self.bridges.get(key))
    }

    pub fn bridge_count(&self) -> usize {
        self.bridges.len()
    }

    #[inline]
    pub fn estimated_coverage(&self) -> f64 {
        self.estimated_coverage
    }

    #[inline]
    pub fn estimated_length(&self) -> usize {
        self.estimated_length
    }

    /// Reads ingested so far.
    pub fn read_count(&self) -> usize {
        self.read_count
    }

    pub fn base_count(&self) -> usize {
        self.base_count
    }

    #[inline]
    pub(crate) fn len_of(&self, id: ContigId) -> usize {
        self.contigs[id].len()
    }

    /// Summarize the PAF records of one read into a `ReadFilling`.
    /// Records below the quality threshold are dropped; a record whose
    /// target is not a known contig is an error.
    pub fn read_from_paf(
        &self,
        records: &[PafRecord],
        sequence: Option<BString>,
    ) -> Result<ReadFilling> {
        let name = records
            .first()
            .map(|r| r.query_seq_name.clone())
            .unwrap_or_default();
        let mut alignments = Vec::with_capacity(records.len());
        for rec in records {
            let contig = self.contig_id(&rec.target_seq_name).ok_or_else(|| {
                Error::UnknownContig {
                    read: rec.query_seq_name.to_str_lossy().into_owned(),
                    contig: rec.target_seq_name.to_str_lossy().into_owned(),
                }
            })?;
            if rec.quality < self.config.min_quality {
                continue;
            }
            alignments.push(rec.to_alignment(contig, &self.config));
        }
        Ok(ReadFilling::new(name, sequence, alignments))
    }

    /// Record every alignment of a read and bridge each pair of its
    /// useful alignments.
    pub fn ingest_read(&mut self, read: ReadFilling) -> Result<()> {
        let n = self.contigs.len();
        if let Some(aln) = read.alignments.iter().find(|a| a.contig >= n) {
            return Err(Error::ContigOutOfRange(aln.contig));
        }

        self.read_count += 1;
        self.base_count += read.read_length().max(0) as usize;

        for aln in read.alignments.iter() {
            self.contigs[aln.contig]
                .mark_mapped(aln.ref_start.max(1) as usize, aln.ref_end.max(0) as usize);
        }

        let read = Arc::new(read);
        let useful: Vec<&AlignmentRecord> = read.alignments.iter().filter(|a| a.useful).collect();
        for (ix, a) in useful.iter().enumerate() {
            for b in useful[ix + 1..].iter() {
                self.add_bridge(&read, a, b)?;
            }
        }
        Ok(())
    }

    /// Add the evidence that one read aligns to the contigs of `a` and
    /// `b`. Evidence that looks like a split alignment, or touches a
    /// contig below the coverage threshold, is dropped. An alignment to
    /// a contig outside the registry is an error.
    pub fn add_bridge(
        &mut self,
        read: &Arc<ReadFilling>,
        a: &AlignmentRecord,
        b: &AlignmentRecord,
    ) -> Result<()> {
        let n = self.contigs.len();
        if let Some(bad) = [a, b].iter().find(|r| r.contig >= n) {
            return Err(Error::ContigOutOfRange(bad.contig));
        }
        let (a, b) = if a.contig > b.contig { (b, a) } else { (a, b) };

        let aligned_read = (a.read_end - a.read_start).abs() + (b.read_end - b.read_start).abs();
        let aligned_ref = (a.ref_end - a.ref_start).abs() + (b.ref_end - b.ref_start).abs();
        if aligned_read == 0 {
            return Ok(());
        }
        let rate = aligned_ref as f64 / aligned_read as f64;

        let score = a.score.min(b.score) as f64;
        let align_p = ((b.read_start - a.read_start) as f64 * rate) as i64;
        let align_d: i8 = if a.strand == b.strand { 1 } else { -1 };

        let signed_start = |r: &AlignmentRecord| if r.strand { r.ref_start } else { -r.ref_start };
        let mut gap = align_p + signed_start(a) - signed_start(b);
        if !a.strand {
            gap = -gap;
        }

        let a_len = self.len_of(a.contig) as f64;
        let ratio = gap.abs() as f64 / a_len;
        if a.contig == b.contig
            && align_d > 0
            && ratio > 0.9
            && ratio < 1.1
            && (a.read_length as f64) < 1.1 * a_len
        {
            if aligned_read as f64 / a.read_length as f64 > 0.8 {
                self.contigs[a.contig].circular_score += 1;
            }
            debug!(
                "Contig {} may be circular or a tandem repeat: read {} of length {} gives ({}, {}), score {}",
                self.contigs[a.contig].name,
                a.read_id,
                a.read_length,
                gap,
                align_d,
                self.contigs[a.contig].circular_score
            );
        } else {
            self.contigs[a.contig].circular_score -= 1;
            self.contigs[b.contig].circular_score -= 1;
        }

        let overlap = std::cmp::min(
            a.read_alignment_end() - b.read_alignment_start(),
            b.read_alignment_end() - a.read_alignment_start(),
        );
        let shorter = std::cmp::min(
            a.read_alignment_end() - a.read_alignment_start(),
            b.read_alignment_end() - b.read_alignment_start(),
        );
        let min_cov = self.config.min_coverage;
        if overlap as f64 > (0.5 * shorter as f64).min(self.config.min_contig_length as f64)
            || self.contigs[a.contig].coverage < min_cov
            || self.contigs[b.contig].coverage < min_cov
        {
            trace!("Dropping evidence {} -> {} from read {}", a.contig, b.contig, a.read_id);
            return Ok(());
        }

        let trans = ScaffoldVector::new(gap, align_d);
        let same = a.contig == b.contig;
        let mut count = 0u32;
        loop {
            let discriminator = if same { 2 * count } else { count };
            let key = BridgeKey::new(a.contig, b.contig, discriminator);
            let rev = key.twin();

            let (consistent, reverse_consistent) = match self.bridges.get(&key) {
                None => {
                    let forward = Connection::new(read.clone(), a.clone(), b.clone(), trans);
                    let backward = Connection::new(read.clone(), b.clone(), a.clone(), trans.reverse());
                    self.bridges.insert(key, ContigBridge::new(key, forward, score));
                    self.bridges.insert(rev, ContigBridge::new(rev, backward, score));
                    self.bridges_by_contig[key.first].push(key);
                    self.bridges_by_contig[rev.first].push(rev);
                    trace!("New bridge {} with vector {}", key, trans);
                    return Ok(());
                }
                Some(bridge) => (
                    bridge.consistent_with(trans, &self.config),
                    same && bridge.consistent_with(trans.reverse(), &self.config),
                ),
            };

            if consistent {
                self.connect(key, read, a, b, trans, score);
                self.connect(rev, read, b, a, trans.reverse(), score);
                return Ok(());
            }
            if reverse_consistent {
                self.connect(rev, read, b, a, trans, score);
                self.connect(key, read, b, a, trans.reverse(), score);
                return Ok(());
            }
            count += 1;
        }
    }

    fn connect(
        &mut self,
        key: BridgeKey,
        read: &Arc<ReadFilling>,
        first: &AlignmentRecord,
        second: &AlignmentRecord,
        trans: ScaffoldVector,
        score: f64,
    ) {
        if let Some(bridge) = self.bridges.get_mut(&key) {
            let connection = Connection::new(read.clone(), first.clone(), second.clone(), trans);
            bridge.add_connection(connection, score);
        }
    }

    /// Whether a contig is unfit to anchor a scaffold, judged from its
    /// length, its coverage against the estimate, and how it overlaps
    /// its neighbours.
    pub fn is_repeat(&self, id: ContigId) -> bool {
        let ctg = &self.contigs[id];
        let config = &self.config;
        let est = self.estimated_coverage;
        let (len, cov) = (ctg.len(), ctg.coverage);

        // no coverage information at all
        #[allow(clippy::float_cmp)]
        {
            if est == 1.0 && cov == 1.0 {
                return len <= config.max_repeat_length;
            }
        }

        if len < config.min_contig_length || cov < 0.3 * est {
            return true;
        }
        if len > config.max_repeat_length || cov < 1.3 * est {
            return false;
        }
        if cov > 1.5 * est {
            return true;
        }

        for key in self.bridges_by_contig[id].iter() {
            let other = key.second;
            if other == id {
                continue;
            }
            let bridge = match self.bridges.get(key) {
                Some(bridge) => bridge,
                None => continue,
            };
            let other_ctg = &self.contigs[other];
            let dist = bridge.distance(len, other_ctg.len());
            if dist < 0
                && dist as f64 > -0.25 * len as f64
                && (other_ctg.len() > config.max_repeat_length || other_ctg.coverage < 1.3 * est)
            {
                return true;
            }
        }

        len < 2 * config.min_contig_length
    }

    fn apply_scores(&mut self, key: BridgeKey, reset: bool) {
        let bridge = match self.bridges.get(&key) {
            Some(bridge) => bridge,
            None => return,
        };
        let sides = bridge.sides(self.contigs[key.first].len());
        let score = if reset { 0.0 } else { bridge.score() };
        for &(id, side) in [(key.first, sides.first), (key.second, sides.second)].iter() {
            let ctg = &mut self.contigs[id];
            if side > 0 {
                ctg.next_score = score;
            } else {
                ctg.prev_score = score;
            }
        }
    }

    /// Record a bridge's score on the sides of the two contigs it
    /// attaches to.
    pub(crate) fn set_contig_scores(&mut self, key: BridgeKey) {
        self.apply_scores(key, false);
    }

    pub(crate) fn reset_contig_scores(&mut self, key: BridgeKey) {
        self.apply_scores(key, true);
    }

    /// Write the members' placement back to the registry, for every
    /// member that isn't a clone.
    pub(crate) fn settle(&mut self, head: ContigId) {
        let scf = &self.scaffolds[head];
        for placed in scf.contigs().iter().filter(|p| !p.cloned) {
            let ctg = &mut self.contigs[placed.id];
            ctg.vector = placed.vector;
            ctg.head = head;
        }
    }

    /// Give every non-clone member of a dismantled scaffold its own
    /// singleton scaffold back.
    pub(crate) fn restore_singletons<I>(&mut self, dropped: I)
    where
        I: IntoIterator<Item = Placed>,
    {
        for placed in dropped.into_iter().filter(|p| !p.cloned) {
            let id = placed.id;
            if self.scaffolds[id].is_empty() {
                self.scaffolds[id] = Scaffold::singleton(id);
                self.contigs[id].head = id;
                self.contigs[id].vector = ScaffoldVector::identity();
            }
        }
    }

    /// Pop repeats off both ends of a linear scaffold, dropping their
    /// bridges. Returns the removed members.
    pub(crate) fn trim_scaffold(&mut self, scf: &mut Scaffold) -> Vec<Placed> {
        let mut dropped = Vec::new();
        if scf.is_closed() || scf.is_empty() {
            return dropped;
        }
        while scf.last().map_or(false, |p| self.is_repeat(p.id)) {
            if let Some((placed, bridge)) = scf.pop_back() {
                if let Some(key) = bridge {
                    self.reset_contig_scores(key);
                }
                dropped.push(placed);
            }
        }
        while scf.first().map_or(false, |p| self.is_repeat(p.id)) {
            if let Some((placed, bridge)) = scf.pop_front() {
                if let Some(key) = bridge {
                    self.reset_contig_scores(key);
                }
                dropped.push(placed);
            }
        }
        if scf.len() <= 1 {
            scf.clear_bridges();
        }
        if !dropped.is_empty() {
            debug!(
                "Trimmed {} repeats off scaffold {}",
                dropped.len(),
                scf.head()
            );
        }
        dropped
    }

    /// Trim the scaffold headed by `head` in place. If its head was
    /// trimmed away the rest moves under a new head.
    pub(crate) fn trim(&mut self, head: ContigId) {
        let mut scf = std::mem::take(&mut self.scaffolds[head]);
        let dropped = self.trim_scaffold(&mut scf);
        let head_kept = scf
            .index_of(head)
            .and_then(|ix| scf.get(ix))
            .map_or(false, |p| !p.cloned);
        if scf.is_empty() || head_kept {
            self.scaffolds[head] = scf;
        } else {
            self.rehome(scf);
        }
        self.restore_singletons(dropped);
    }

    /// Index of the closest non-repeat contig other than the one at
    /// `index`, looking forward or backward. Closed scaffolds are
    /// searched around the circle.
    pub(crate) fn nearest_marker(&self, scf: &Scaffold, index: usize, forward: bool) -> Option<usize> {
        let id = scf.get(index)?.id;
        if self.is_repeat(id) {
            return None;
        }
        let members = scf.contigs();
        let is_marker = |i: &usize| {
            let p = &members[*i];
            p.id != id && !self.is_repeat(p.id)
        };
        let n = members.len();
        let found = if forward {
            (index..n).find(is_marker)
        } else {
            (0..index).rev().find(is_marker)
        };
        if found.is_some() || !scf.is_closed() {
            return found;
        }
        if forward {
            (0..index).find(is_marker)
        } else {
            (index + 1..n).rev().find(is_marker)
        }
    }

    /// Close the scaffold headed by `head` with the bridge `key`, which
    /// must leave its last contig.
    pub(crate) fn set_close_bridge(&mut self, head: ContigId, key: BridgeKey) {
        let trans = match self.bridges.get(&key) {
            Some(bridge) => bridge.trans(),
            None => return,
        };
        self.scaffolds[head].set_close_bridge(key, trans);
        if log_enabled!(Level::Debug) {
            debug!(
                "Scaffold {} closed by {}, circle {:?}",
                head,
                key,
                self.scaffolds[head].circle()
            );
        }
    }

    /// Order contigs into scaffolds with the greedy strategy.
    pub fn connect_bridges(&mut self) {
        crate::greedy::GreedyScaffolder::default().connect_bridges(self);
    }

    pub fn connect_bridges_with<S: Scaffolder>(&mut self, scaffolder: &S) {
        scaffolder.connect_bridges(self);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Deterministic pseudo-random bases.
    pub(crate) fn bases(len: usize, seed: u64) -> Vec<u8> {
        let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        (0..len)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                b"ACGT"[(state >> 62) as usize]
            })
            .collect()
    }

    pub(crate) fn contig(id: ContigId, len: usize, cov: f64) -> Contig {
        let seq: Vec<u8> = b"ACGT".iter().cycle().take(len).copied().collect();
        Contig::new(id, format!("ctg{}", id), seq).with_coverage(cov)
    }

    /// An alignment covering `contig` entirely on the forward strand of
    /// the read.
    pub(crate) fn whole(
        graph: &ScaffoldGraph,
        read_len: i64,
        contig: ContigId,
        read_start: i64,
        strand: bool,
    ) -> AlignmentRecord {
        let len = graph.len_of(contig) as i64;
        // coordinates along the aligned strand
        let read = if strand {
            (read_start, read_start + len - 1)
        } else {
            (read_len - (read_start + len - 1) + 1, read_len - read_start + 1)
        };
        AlignmentRecord::new(
            "read",
            contig,
            len as usize,
            (1, len),
            read,
            read_len,
            strand,
            graph.config.margin,
            graph.config.min_contig_length,
        )
    }

    pub(crate) fn read_of(name: &str, alignments: Vec<AlignmentRecord>) -> ReadFilling {
        let alignments = alignments
            .into_iter()
            .map(|mut a| {
                a.read_id = name.into();
                a
            })
            .collect();
        ReadFilling::new(name, None, alignments)
    }

    fn two_contigs() -> ScaffoldGraph {
        ScaffoldGraph::new(
            vec![contig(0, 5000, 20.0), contig(1, 4000, 20.0)],
            ScaffoldConfig::default(),
        )
    }

    #[test]
    fn estimated_coverage() {
        let graph = ScaffoldGraph::new(
            vec![contig(0, 3000, 10.0), contig(1, 1000, 30.0)],
            ScaffoldConfig::default(),
        );
        assert!((graph.estimated_coverage() - 15.0).abs() < 1e-9);
        assert_eq!(graph.estimated_length(), 4000);
        assert_eq!(graph.scaffolds().len(), 2);
        assert_eq!(graph.contig_id(b"ctg1"), Some(1));
    }

    #[test]
    fn bridge_between_two_contigs() {
        let mut graph = two_contigs();
        // ctg0 on read 1..5000, ctg1 on read 5101..9100
        let a = whole(&graph, 9100, 0, 1, true);
        let b = whole(&graph, 9100, 1, 5101, true);
        graph.ingest_read(read_of("r1", vec![a, b])).unwrap();

        let key = BridgeKey::new(0, 1, 0);
        let bridge = graph.bridge(&key).unwrap();
        assert_eq!(bridge.trans(), ScaffoldVector::new(5100, 1));
        assert_eq!(bridge.distance(5000, 4000), 100);
        assert_eq!(bridge.count(), 1);
        let twin = graph.bridge(&key.twin()).unwrap();
        assert_eq!(twin.trans(), ScaffoldVector::new(-5100, 1));
        assert_eq!(graph.bridges_from(1).count(), 1);
        assert!(graph.contig(0).unwrap().is_mapped());
        assert_eq!(graph.read_count(), 1);
    }

    #[test]
    fn reverse_strand_bridge() {
        let mut graph = two_contigs();
        // ctg1 reverse complemented after ctg0
        let a = whole(&graph, 9100, 0, 1, true);
        let b = whole(&graph, 9100, 1, 5101, false);
        graph.ingest_read(read_of("r1", vec![a, b])).unwrap();
        let bridge = graph.bridge(&BridgeKey::new(0, 1, 0)).unwrap();
        // ctg1's right end, counted from its 1-based start on the read
        assert_eq!(bridge.trans(), ScaffoldVector::new(9101, -1));
        assert_eq!(bridge.distance(5000, 4000), 101);
    }

    #[test]
    fn same_evidence_twice_lands_in_one_bucket() {
        let mut graph = two_contigs();
        let a = whole(&graph, 9100, 0, 1, true);
        let b = whole(&graph, 9100, 1, 5101, true);
        let read = read_of("r1", vec![a.clone(), b.clone()]).shared();
        graph.add_bridge(&read, &a, &b).unwrap();
        graph.add_bridge(&read, &b, &a).unwrap();

        assert_eq!(graph.bridge_count(), 2);
        let bridge = graph.bridge(&BridgeKey::new(0, 1, 0)).unwrap();
        assert_eq!(bridge.count(), 2);
        assert!((bridge.score() - 2.0 * 4000.0).abs() < 1e-9);
        assert_eq!(graph.bridge(&BridgeKey::new(1, 0, 0)).unwrap().count(), 2);
    }

    #[test]
    fn inconsistent_evidence_opens_a_new_bucket() {
        let mut graph = two_contigs();
        let a = whole(&graph, 12000, 0, 1, true);
        let b = whole(&graph, 12000, 1, 5101, true);
        let far = whole(&graph, 12000, 1, 8001, true);
        graph.ingest_read(read_of("r1", vec![a.clone(), b])).unwrap();
        graph.ingest_read(read_of("r2", vec![a, far])).unwrap();
        assert_eq!(graph.bridge(&BridgeKey::new(0, 1, 1)).unwrap().trans(), ScaffoldVector::new(8000, 1));
        assert_eq!(graph.bridges_from(0).count(), 2);
    }

    #[test]
    fn split_alignments_are_dropped() {
        let mut graph = two_contigs();
        let a = whole(&graph, 9000, 0, 1, true);
        // overlaps ctg0's alignment by 1000 read bases
        let b = whole(&graph, 9000, 1, 4001, true);
        graph.ingest_read(read_of("r1", vec![a, b])).unwrap();
        assert_eq!(graph.bridge_count(), 0);
    }

    #[test]
    fn unknown_contigs_are_fatal() {
        let graph = two_contigs();
        let line = b"read9\t9000\t0\t1000\t+\tctg7\t5000\t4000\t5000\t990\t1000\t60";
        let rec = crate::paf::parse_paf(line.split_str(b"\t")).unwrap();
        match graph.read_from_paf(&[rec], None) {
            Err(Error::UnknownContig { read, contig }) => {
                assert_eq!(read, "read9");
                assert_eq!(contig, "ctg7");
            }
            other => panic!("unexpected {:?}", other.map(|r| r.name)),
        }

        let mut graph = two_contigs();
        let mut aln = whole(&graph, 9000, 0, 1, true);
        aln.contig = 12;
        assert!(graph.ingest_read(read_of("r", vec![aln])).is_err());
    }

    #[test]
    fn bridging_a_contig_outside_the_registry() {
        let mut graph = two_contigs();
        let a = whole(&graph, 9100, 0, 1, true);
        let mut b = whole(&graph, 9100, 1, 5101, true);
        b.contig = 99;
        let read = read_of("r", vec![a.clone(), b.clone()]).shared();

        match graph.add_bridge(&read, &a, &b) {
            Err(Error::ContigOutOfRange(id)) => assert_eq!(id, 99),
            other => panic!("unexpected {:?}", other),
        }
        match graph.add_bridge(&read, &b, &a) {
            Err(Error::ContigOutOfRange(id)) => assert_eq!(id, 99),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(graph.bridge_count(), 0);
        assert_eq!(graph.contigs()[0].circular_score, -1);
    }

    #[test]
    fn low_quality_records_are_skipped() {
        let graph = two_contigs();
        let line = b"r\t9000\t0\t1000\t+\tctg0\t5000\t4000\t5000\t990\t1000\t0";
        let rec = crate::paf::parse_paf(line.split_str(b"\t")).unwrap();
        let read = graph.read_from_paf(&[rec], None).unwrap();
        assert!(read.alignments.is_empty());
    }

    #[test]
    fn short_contigs_are_repeats() {
        let graph = ScaffoldGraph::new(
            vec![
                contig(0, 5000, 20.0),
                contig(1, 150, 20.0),
                contig(2, 150, 1.0),
                contig(3, 300, 32.0),
                contig(4, 5000, 40.0),
                contig(5, 9000, 35.0),
                contig(6, 50000, 20.0),
            ],
            ScaffoldConfig::default(),
        );
        assert!(!graph.is_repeat(0));
        assert!(!graph.is_repeat(6));
        assert!(graph.is_repeat(1));
        assert!(graph.is_repeat(2));
        // below twice the minimum length
        assert!(graph.is_repeat(3));
        // more than 1.5 times the estimate
        assert!(40.0 > 1.5 * graph.estimated_coverage());
        assert!(graph.is_repeat(4));
        // too long to be a repeat
        assert!(!graph.is_repeat(5));
    }

    #[test]
    fn without_coverage_length_decides() {
        let graph = ScaffoldGraph::new(
            vec![contig(0, 8000, 1.0), contig(1, 5000, 1.0)],
            ScaffoldConfig::default(),
        );
        assert!(!graph.is_repeat(0));
        assert!(graph.is_repeat(1));
    }

    #[test]
    fn contig_scores_follow_the_bridge() {
        let mut graph = two_contigs();
        let a = whole(&graph, 9100, 0, 1, true);
        let b = whole(&graph, 9100, 1, 5101, true);
        graph.ingest_read(read_of("r1", vec![a, b])).unwrap();
        let key = BridgeKey::new(0, 1, 0);
        graph.set_contig_scores(key);
        assert!((graph.contigs[0].next_score - 4000.0).abs() < 1e-9);
        assert!((graph.contigs[1].prev_score - 4000.0).abs() < 1e-9);
        graph.reset_contig_scores(key.twin());
        assert_eq!(graph.contigs[0].next_score, 0.0);
        assert_eq!(graph.contigs[1].prev_score, 0.0);
    }
}
