use bstr::BString;

use std::sync::Arc;

use crate::contig::{reverse_complement, ContigId};

/// Summary of one alignment of a long read against a contig.
///
/// Coordinates are 1-based and inclusive. The read coordinates follow
/// the read's own direction, so for a reverse strand alignment
/// `read_start > read_end`, with `read_start` being the read position
/// that lines up with `ref_start`.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentRecord {
    pub read_id: BString,
    pub contig: ContigId,
    pub ref_start: i64,
    pub ref_end: i64,
    pub read_start: i64,
    pub read_end: i64,
    pub read_length: i64,
    /// true for the forward strand
    pub strand: bool,
    pub useful: bool,
    pub score: i64,
}

impl AlignmentRecord {
    /// Build a record from read coordinates measured along the aligned
    /// strand of the read, i.e. on its reverse complement for reverse
    /// strand alignments. Computes `useful` and `score`.
    ///
    /// `useful` is set when the alignment reaches within `margin` of
    /// either the read or the contig on both sides, and is longer than
    /// `min_length`.
    #[allow(clippy::too_many_arguments)]
    pub fn new<N: Into<BString>>(
        read_id: N,
        contig: ContigId,
        contig_len: usize,
        (ref_start, ref_end): (i64, i64),
        (read_start, read_end): (i64, i64),
        read_length: i64,
        strand: bool,
        margin: usize,
        min_length: usize,
    ) -> Self {
        let margin = margin as i64;
        let read_left = read_start - 1;
        let read_right = read_length - read_end;
        let ref_left = ref_start - 1;
        let ref_right = contig_len as i64 - ref_end;
        let score = ref_end + 1 - ref_start;

        let useful = (read_left < margin || ref_left < margin)
            && (read_right < margin || ref_right < margin)
            && score > min_length as i64;

        let (read_start, read_end) = if strand {
            (read_start, read_end)
        } else {
            (read_length + 1 - read_start, read_length + 1 - read_end)
        };

        AlignmentRecord {
            read_id: read_id.into(),
            contig,
            ref_start,
            ref_end,
            read_start,
            read_end,
            read_length,
            strand,
            useful,
            score,
        }
    }

    #[inline]
    pub fn read_alignment_start(&self) -> i64 {
        std::cmp::min(self.read_start, self.read_end)
    }

    #[inline]
    pub fn read_alignment_end(&self) -> i64 {
        std::cmp::max(self.read_start, self.read_end)
    }

    /// The same alignment seen from the reverse complement of the read.
    pub fn reverse_read(&self) -> Self {
        AlignmentRecord {
            read_start: self.read_length - self.read_start + 1,
            read_end: self.read_length - self.read_end + 1,
            strand: !self.strand,
            ..self.clone()
        }
    }

    /// Reference position aligned to read position `read_pos`, assuming
    /// an ungapped alignment. Returns `None` if the position falls
    /// outside the aligned part of the read.
    pub fn position_on_ref(&self, read_pos: i64) -> Option<i64> {
        if read_pos < self.read_alignment_start()
            || read_pos > self.read_alignment_end()
        {
            return None;
        }
        let (look, on_read) = if self.strand {
            (read_pos, self.read_start)
        } else {
            (
                self.read_length - read_pos + 1,
                self.read_length + 1 - self.read_start,
            )
        };
        Some(self.ref_start + look - on_read)
    }
}

/// A long read together with every alignment it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadFilling {
    pub name: BString,
    /// Absent when only alignments were provided.
    pub sequence: Option<BString>,
    pub alignments: Vec<AlignmentRecord>,
}

impl ReadFilling {
    pub fn new<N: Into<BString>>(
        name: N,
        sequence: Option<BString>,
        mut alignments: Vec<AlignmentRecord>,
    ) -> Self {
        alignments.sort_by_key(|a| a.read_alignment_start());
        ReadFilling {
            name: name.into(),
            sequence,
            alignments,
        }
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn read_length(&self) -> i64 {
        self.sequence
            .as_ref()
            .map(|s| s.len() as i64)
            .or_else(|| self.alignments.first().map(|a| a.read_length))
            .unwrap_or(0)
    }

    /// The reverse complemented read, with all alignments flipped.
    pub fn reverse(&self) -> Self {
        let mut name = BString::from("REV");
        name.extend_from_slice(&self.name);
        let sequence = self.sequence.as_ref().map(|s| reverse_complement(s));
        let alignments =
            self.alignments.iter().map(|a| a.reverse_read()).collect();
        ReadFilling::new(name, sequence, alignments)
    }

    /// Number of read bases strictly between two alignments that no
    /// alignment of this read covers.
    pub fn gaps_between(
        &self,
        first: &AlignmentRecord,
        second: &AlignmentRecord,
    ) -> i64 {
        let (start, end) =
            if first.read_alignment_start() < second.read_alignment_start() {
                (first.read_alignment_end(), second.read_alignment_start())
            } else {
                (second.read_alignment_end(), first.read_alignment_start())
            };
        if start >= end {
            return 0;
        }

        let mut covered: Vec<(i64, i64)> = self
            .alignments
            .iter()
            .map(|a| {
                (
                    a.read_alignment_start().max(start),
                    a.read_alignment_end().min(end),
                )
            })
            .filter(|(s, e)| s < e)
            .collect();
        covered.sort_unstable();

        let mut uncovered = end - start;
        let mut reach = start;
        for (s, e) in covered {
            let s = s.max(reach);
            if e > s {
                uncovered -= e - s;
                reach = e;
            }
        }
        uncovered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(
        contig: ContigId,
        contig_len: usize,
        refr: (i64, i64),
        read: (i64, i64),
        strand: bool,
    ) -> AlignmentRecord {
        AlignmentRecord::new("r", contig, contig_len, refr, read, 9000, strand, 1000, 200)
    }

    #[test]
    fn usefulness() {
        // spans the contig's right end and the read's left end
        let a = rec(0, 5000, (4001, 5000), (1, 1000), true);
        assert!(a.useful);
        assert_eq!(a.score, 1000);
        // sits in the middle of both
        let b = rec(0, 10000, (4001, 5000), (3001, 4000), true);
        assert!(!b.useful);
        // too short
        let c = rec(0, 150, (1, 150), (1, 150), true);
        assert!(!c.useful);
    }

    #[test]
    fn reverse_strand_coordinates() {
        let a = rec(0, 5000, (1, 1000), (101, 1100), false);
        assert_eq!(a.read_start, 9000 + 1 - 101);
        assert_eq!(a.read_end, 9000 + 1 - 1100);
        assert_eq!(a.read_alignment_start(), 7901);
        assert_eq!(a.read_alignment_end(), 8900);

        let r = a.reverse_read();
        assert!(r.strand);
        assert_eq!(r.read_start, 101);
        assert_eq!(r.read_end, 1100);
        assert_eq!(r.reverse_read(), a);
    }

    #[test]
    fn ungapped_positions() {
        let a = rec(0, 5000, (11, 1010), (1, 1000), true);
        assert_eq!(a.position_on_ref(1), Some(11));
        assert_eq!(a.position_on_ref(1000), Some(1010));
        assert_eq!(a.position_on_ref(1001), None);

        // reverse strand: read position 8900 lines up with ref 1
        let b = rec(0, 5000, (1, 1000), (101, 1100), false);
        assert_eq!(b.position_on_ref(8900), Some(1));
        assert_eq!(b.position_on_ref(7901), Some(1000));
    }

    #[test]
    fn gaps_ignore_intervening_alignments() {
        let a = rec(0, 5000, (4001, 5000), (1, 1000), true);
        let mid = rec(2, 300, (1, 300), (1101, 1400), true);
        let b = rec(1, 5000, (1, 1000), (1501, 2500), true);
        let read = ReadFilling::new("r", None, vec![b.clone(), mid, a.clone()]);
        // 1000..1501 is 501 positions, 1101..1400 are aligned
        assert_eq!(read.gaps_between(&a, &b), 501 - 299);
        assert_eq!(read.gaps_between(&b, &a), 501 - 299);
        assert_eq!(read.alignments[0].contig, 0);
    }

    #[test]
    fn reversed_read() {
        let a = rec(0, 5000, (4001, 5000), (1, 1000), true);
        let read = ReadFilling::new("r", Some("AACG".into()), vec![a]);
        let rev = read.reverse();
        assert_eq!(rev.name, BString::from("REVr"));
        assert_eq!(rev.sequence, Some(BString::from("CGTT")));
        assert!(!rev.alignments[0].strand);
    }
}
