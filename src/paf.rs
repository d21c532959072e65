//! PAF alignments of long reads (queries) against contigs (targets).

use bstr::{BString, ByteSlice};
use log::warn;

use std::fmt::Display;
use std::io::BufRead;

use crate::alignment::AlignmentRecord;
use crate::config::ScaffoldConfig;
use crate::contig::ContigId;
use crate::error::{Error, ParseFieldError, ParserTolerance, Result};
use crate::orientation::Orientation;

/// The twelve mandatory columns of a PAF line. Ranges are 0-based and
/// half-open.
#[derive(Debug, Clone, PartialEq)]
pub struct PafRecord {
    pub query_seq_name: BString,
    pub query_seq_len: usize,
    pub query_seq_range: (usize, usize),
    pub strand: Orientation,
    pub target_seq_name: BString,
    pub target_seq_len: usize,
    pub target_seq_range: (usize, usize),
    pub residue_matches: usize,
    pub block_length: usize,
    pub quality: u8,
}

impl Display for PafRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.query_seq_name,
            self.query_seq_len,
            self.query_seq_range.0,
            self.query_seq_range.1,
            self.strand
        )?;

        write!(
            f,
            "\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.target_seq_name,
            self.target_seq_len,
            self.target_seq_range.0,
            self.target_seq_range.1,
            self.residue_matches,
            self.block_length,
            self.quality
        )
    }
}

fn parse_next<I, T>(mut input: I) -> Option<T>
where
    I: Iterator,
    I::Item: AsRef<[u8]>,
    T: std::str::FromStr,
{
    let tmp = input.next()?;
    let bytes = tmp.as_ref();
    std::str::from_utf8(bytes).ok().and_then(|p| p.parse().ok())
}

fn parse_seq_fields<I>(mut input: I) -> Option<(BString, usize, (usize, usize))>
where
    I: Iterator,
    I::Item: AsRef<[u8]>,
{
    let name = input.next()?.as_ref().into();
    let len = parse_next(&mut input)?;
    let start = parse_next(&mut input)?;
    let end = parse_next(&mut input)?;

    Some((name, len, (start, end)))
}

/// Parse a PAF record from an iterator over the tab-delimited fields
/// of bytes. Optional tags are ignored.
pub fn parse_paf<I>(mut input: I) -> Option<PafRecord>
where
    I: Iterator,
    I::Item: AsRef<[u8]>,
{
    let (query_seq_name, query_seq_len, query_seq_range) =
        parse_seq_fields(&mut input)?;

    let strand = input
        .next()
        .and_then(|s| Orientation::from_bytes_plus_minus(s.as_ref()))?;

    let (target_seq_name, target_seq_len, target_seq_range) =
        parse_seq_fields(&mut input)?;

    let residue_matches = parse_next(&mut input)?;
    let block_length = parse_next(&mut input)?;
    let quality = parse_next(&mut input)?;

    Some(PafRecord {
        query_seq_name,
        query_seq_len,
        query_seq_range,
        strand,
        target_seq_name,
        target_seq_len,
        target_seq_range,
        residue_matches,
        block_length,
        quality,
    })
}

impl PafRecord {
    /// Summarize the record against the contig registered as `contig`.
    pub fn to_alignment(
        &self,
        contig: ContigId,
        config: &ScaffoldConfig,
    ) -> AlignmentRecord {
        let read_len = self.query_seq_len as i64;
        let (q_start, q_end) = self.query_seq_range;
        let (q_start, q_end) = (q_start as i64, q_end as i64);
        let strand = self.strand.is_forward();
        // read coordinates along the aligned strand
        let read = if strand {
            (q_start + 1, q_end)
        } else {
            (read_len - q_end + 1, read_len - q_start)
        };
        let (t_start, t_end) = self.target_seq_range;
        AlignmentRecord::new(
            self.query_seq_name.clone(),
            contig,
            self.target_seq_len,
            (t_start as i64 + 1, t_end as i64),
            read,
            read_len,
            strand,
            config.margin,
            config.min_contig_length,
        )
    }
}

/// Consecutive PAF records sharing a query name, i.e. all alignments
/// of one read when the file is grouped by read.
pub struct PafGroups<R> {
    reader: R,
    tolerance: ParserTolerance,
    pending: Option<PafRecord>,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> PafGroups<R> {
    pub fn new(reader: R, tolerance: ParserTolerance) -> Self {
        PafGroups {
            reader,
            tolerance,
            pending: None,
            buf: Vec::new(),
            done: false,
        }
    }

    fn next_record(&mut self) -> Result<Option<PafRecord>> {
        loop {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
                return Ok(None);
            }
            let line = self.buf.trim_end_with(|c| c == '\n' || c == '\r');
            if line.is_empty() {
                continue;
            }
            match parse_paf(line.split_str(b"\t")) {
                Some(rec) => return Ok(Some(rec)),
                None => {
                    let err =
                        Error::invalid_line(ParseFieldError::MissingFields, line);
                    if err.can_safely_continue(&self.tolerance) {
                        warn!("Skipping PAF line: {}", err);
                    } else {
                        return Err(err);
                    }
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for PafGroups<R> {
    type Item = Result<Vec<PafRecord>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut group: Vec<PafRecord> = self.pending.take().into_iter().collect();
        loop {
            match self.next_record() {
                Ok(Some(rec)) => {
                    let same = group
                        .first()
                        .map_or(true, |g| g.query_seq_name == rec.query_seq_name);
                    if same {
                        group.push(rec);
                    } else {
                        self.pending = Some(rec);
                        return Some(Ok(group));
                    }
                }
                Ok(None) => {
                    self.done = true;
                    return if group.is_empty() {
                        None
                    } else {
                        Some(Ok(group))
                    };
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}
