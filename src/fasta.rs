//! Memory-mapped loading of contig and read sequences.

use anyhow::{bail, Context, Result};
use bstr::{BString, ByteSlice};
use fnv::FnvHashMap;
use log::info;
use memmap::Mmap;

use std::fs::File;
use std::path::Path;

use crate::contig::{parse_coverage, Contig, CoverageFormat};

#[derive(Debug, Clone, PartialEq)]
pub struct FastaRecord {
    pub name: BString,
    /// Everything on the header line after the name.
    pub description: BString,
    pub sequence: BString,
}

impl FastaRecord {
    /// Name and description joined by a space.
    pub fn header(&self) -> BString {
        let mut header = self.name.clone();
        if !self.description.is_empty() {
            header.push(b' ');
            header.extend_from_slice(&self.description);
        }
        header
    }
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    bytes.trim_with(|c| c.is_ascii_whitespace())
}

fn split_header(line: &[u8]) -> (BString, BString) {
    let line = trim_ascii(line);
    match line.find_byteset(b" \t") {
        Some(ix) => (line[..ix].into(), trim_ascii(&line[ix + 1..]).into()),
        None => (line.into(), BString::from("")),
    }
}

/// Parse FASTA or FASTQ records out of a byte buffer.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<FastaRecord>> {
    let mut records: Vec<FastaRecord> = Vec::new();
    let mut lines = bytes.lines().enumerate();

    while let Some((ix, line)) = lines.next() {
        match line.first() {
            Some(b'>') => {
                let (name, description) = split_header(&line[1..]);
                records.push(FastaRecord {
                    name,
                    description,
                    sequence: BString::from(""),
                });
            }
            Some(b'@') => {
                let (name, description) = split_header(&line[1..]);
                let sequence = match lines.next() {
                    Some((_, seq)) => trim_ascii(seq).into(),
                    None => bail!("FASTQ record at line {} has no sequence", ix + 1),
                };
                // separator and qualities
                lines.next();
                lines.next();
                records.push(FastaRecord {
                    name,
                    description,
                    sequence,
                });
            }
            Some(_) => match records.last_mut() {
                Some(rec) => rec.sequence.extend_from_slice(trim_ascii(line)),
                None => bail!("Sequence data before the first header at line {}", ix + 1),
            },
            None => (),
        }
    }
    Ok(records)
}

/// A sequence file mapped into memory.
pub struct MmapFasta {
    mmap: Mmap,
}

impl MmapFasta {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("opening {}", path.display()))?;
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(MmapFasta { mmap })
    }

    pub fn get_ref(&self) -> &[u8] {
        self.mmap.as_ref()
    }

    pub fn records(&self) -> Result<Vec<FastaRecord>> {
        parse_records(self.get_ref())
    }
}

/// Turn FASTA records into contigs, numbered in file order.
pub fn contigs_from_records(
    records: Vec<FastaRecord>,
    format: CoverageFormat,
) -> Vec<Contig> {
    records
        .into_iter()
        .enumerate()
        .map(|(id, rec)| {
            let coverage = parse_coverage(&rec.header(), format);
            Contig::new(id, rec.name, rec.sequence).with_coverage(coverage)
        })
        .collect()
}

pub fn read_contigs<P: AsRef<Path>>(
    path: P,
    format: CoverageFormat,
) -> Result<Vec<Contig>> {
    let fasta = MmapFasta::new(path)?;
    let contigs = contigs_from_records(fasta.records()?, format);
    info!("Read {} contigs", contigs.len());
    Ok(contigs)
}

/// Long read sequences by name.
pub fn read_sequences<P: AsRef<Path>>(
    path: P,
) -> Result<FnvHashMap<BString, BString>> {
    let fasta = MmapFasta::new(path)?;
    let reads: FnvHashMap<_, _> = fasta
        .records()?
        .into_iter()
        .map(|rec| (rec.name, rec.sequence))
        .collect();
    info!("Read {} read sequences", reads.len());
    Ok(reads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn multi_line_fasta() {
        let records =
            parse_records(b">ctg1 some words\nACGT\nAC\n\n>ctg2\r\nGG\r\n")
                .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "ctg1");
        assert_eq!(records[0].description, "some words");
        assert_eq!(records[0].sequence, "ACGTAC");
        assert_eq!(records[1].sequence, "GG");
        assert_eq!(records[0].header(), "ctg1 some words");
    }

    #[test]
    fn surrounding_whitespace_is_dropped() {
        let records =
            parse_records(b">ctg1\t padded words \t\n  ACGT \n\tAC\r\n@r1  \n GG \n+\nII\n")
                .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "ctg1");
        assert_eq!(records[0].description, "padded words");
        assert_eq!(records[0].sequence, "ACGTAC");
        assert_eq!(records[1].name, "r1");
        assert_eq!(records[1].sequence, "GG");
    }

    #[test]
    fn fastq_reads() {
        let records = parse_records(b"@r1\nACGT\n+\nIIII\n@r2 x\nTT\n+\nII\n")
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name, "r2");
        assert_eq!(records[1].sequence, "TT");
    }

    #[test]
    fn headless_sequence() {
        assert!(parse_records(b"ACGT\n>ctg1\nAC\n").is_err());
    }

    #[test]
    fn contigs_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            ">NODE_1_length_8_cov_12.5\nACGTACGT\n>NODE_2_length_4_cov_3\nTTTT\n"
        )
        .unwrap();
        let contigs = read_contigs(file.path(), CoverageFormat::Spades).unwrap();
        assert_eq!(contigs.len(), 2);
        assert_eq!(contigs[1].id, 1);
        assert_eq!(contigs[1].len(), 4);
        assert!((contigs[0].coverage - 12.5).abs() < 1e-9);
        assert!((contigs[1].coverage - 3.0).abs() < 1e-9);

        let reads = read_sequences(file.path()).unwrap();
        assert_eq!(
            reads.get(&BString::from("NODE_2_length_4_cov_3")),
            Some(&BString::from("TTTT"))
        );
    }
}
