use bit_vec::BitVec;
use bstr::{BStr, BString, ByteSlice};

use lazy_static::lazy_static;
use regex::bytes::Regex;

use crate::graph::GraphPath;
use crate::vector::ScaffoldVector;

/// Contigs are addressed by their position in the registry.
pub type ContigId = usize;

/// Fraction of a contig's bases that must be covered by alignments
/// for it to count as mapped.
const MAPPED_FRACTION: f64 = 0.8;

/// Header convention used to recover a contig's coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageFormat {
    /// `NODE_1_length_5000_cov_20.5`
    Spades,
    /// `1 5000 102500`, i.e. name, length and k-mer sum.
    Abyss,
}

impl Default for CoverageFormat {
    fn default() -> Self {
        CoverageFormat::Spades
    }
}

/// Parse the coverage out of a FASTA header (name and description
/// joined by a space). Falls back to 1.0.
pub fn parse_coverage(header: &[u8], format: CoverageFormat) -> f64 {
    lazy_static! {
        static ref RE_SPADES: Regex =
            Regex::new(r"(?-u)_cov_([0-9]*\.?[0-9]+([eE][-+]?[0-9]+)?)")
                .unwrap();
    }

    match format {
        CoverageFormat::Spades => RE_SPADES
            .captures(header)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_bytes().to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0),
        CoverageFormat::Abyss => {
            let mut fields = header.fields_with(|c| c.is_ascii_whitespace()).skip(1);
            let len = fields
                .next()
                .and_then(|f| f.to_str().ok())
                .and_then(|s| s.parse::<f64>().ok());
            let kmers = fields
                .next()
                .and_then(|f| f.to_str().ok())
                .and_then(|s| s.parse::<f64>().ok());
            match (len, kmers) {
                (Some(len), Some(kmers)) if len > 0.0 => kmers / len,
                _ => 1.0,
            }
        }
    }
}

/// Reverse complement of a nucleotide sequence; anything that isn't
/// ACGT becomes N.
pub fn reverse_complement(seq: &[u8]) -> BString {
    seq.iter()
        .rev()
        .map(|b| match b {
            b'A' => b'T',
            b'C' => b'G',
            b'G' => b'C',
            b'T' => b'A',
            b'a' => b't',
            b'c' => b'g',
            b'g' => b'c',
            b't' => b'a',
            _ => b'N',
        })
        .collect::<Vec<u8>>()
        .into()
}

/// A short-read contig along with its current placement.
///
/// The sequence never changes after loading. The vector and head are
/// rewritten whenever the contig's scaffold is extended, merged or
/// re-rooted.
#[derive(Debug, Clone)]
pub struct Contig {
    pub id: ContigId,
    pub name: BString,
    pub sequence: BString,
    pub coverage: f64,
    /// Position relative to the head contig of its scaffold.
    pub vector: ScaffoldVector,
    pub head: ContigId,
    /// Score of the bridge attached to the contig's left side.
    pub prev_score: f64,
    pub next_score: f64,
    /// Running evidence of the contig being circular or a tandem
    /// repeat.
    pub circular_score: i32,
    /// Decomposition into assembly graph paths.
    pub paths: Vec<GraphPath>,
    mapped: BitVec,
    eukaryotic: bool,
}

impl Contig {
    pub fn new<N, S>(id: ContigId, name: N, sequence: S) -> Self
    where
        N: Into<BString>,
        S: Into<BString>,
    {
        let sequence: BString = sequence.into();
        let mapped = BitVec::from_elem(sequence.len(), false);
        Contig {
            id,
            name: name.into(),
            sequence,
            coverage: 1.0,
            vector: ScaffoldVector::identity(),
            head: id,
            prev_score: 0.0,
            next_score: 0.0,
            circular_score: -1,
            paths: Vec::new(),
            mapped,
            eukaryotic: false,
        }
    }

    pub fn with_coverage(mut self, coverage: f64) -> Self {
        self.coverage = coverage;
        self
    }

    pub(crate) fn set_eukaryotic(&mut self, eukaryotic: bool) {
        self.eukaryotic = eukaryotic;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    #[inline]
    pub fn name(&self) -> &BStr {
        self.name.as_bstr()
    }

    #[inline]
    pub fn left_most(&self) -> i64 {
        self.vector.left_most(self.len())
    }

    #[inline]
    pub fn right_most(&self) -> i64 {
        self.vector.right_most(self.len())
    }

    #[inline]
    pub fn is_circular(&self) -> bool {
        !self.eukaryotic && self.circular_score > 1
    }

    pub fn has_graph_paths(&self) -> bool {
        !self.paths.is_empty()
    }

    /// Mark the 1-based inclusive range `start..=end` as covered by an
    /// alignment. Out of range positions are clamped.
    pub fn mark_mapped(&mut self, start: usize, end: usize) {
        let len = self.len();
        if len == 0 || end < start {
            return;
        }
        let from = start.saturating_sub(1).min(len);
        let to = end.min(len);
        for pos in from..to {
            self.mapped.set(pos, true);
        }
    }

    pub fn mapped_bases(&self) -> usize {
        self.mapped.blocks().map(|b| b.count_ones() as usize).sum()
    }

    pub fn is_mapped(&self) -> bool {
        !self.is_empty()
            && self.mapped_bases() as f64 > MAPPED_FRACTION * self.len() as f64
    }
}
