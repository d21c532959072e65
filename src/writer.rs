use anyhow::{Context, Result};
use bstr::ByteSlice;
use log::info;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::scaffold_graph::{ScaffoldGraph, ScaffoldSequence, Segment, SegmentSource};

pub const FASTA_WIDTH: usize = 80;

// Write a scaffold as a FASTA record
pub fn write_fasta<W: Write>(scaffold: &ScaffoldSequence, stream: &mut W) -> io::Result<()> {
    let shape = if scaffold.circular { "circular" } else { "linear" };
    writeln!(
        stream,
        ">{} length={} {}",
        scaffold.name,
        scaffold.len(),
        shape
    )?;
    for line in scaffold.sequence.chunks(FASTA_WIDTH) {
        stream.write_all(line)?;
        stream.write_all(b"\n")?;
    }
    Ok(())
}

pub fn fasta_string(scaffold: &ScaffoldSequence) -> String {
    let mut result = Vec::new();
    // writes into a Vec can't fail
    let _ = write_fasta(scaffold, &mut result);
    String::from_utf8_lossy(&result).into_owned()
}

// Write one BED line per segment: scaffold, start, end, source, score, strand
pub fn write_segment<W: Write>(
    scaffold: &ScaffoldSequence,
    segment: &Segment,
    stream: &mut W,
) -> io::Result<()> {
    write!(
        stream,
        "{}\t{}\t{}\t",
        scaffold.name,
        segment.offset,
        segment.offset + segment.len
    )?;
    match &segment.source {
        SegmentSource::Contig {
            name,
            forward,
            start,
            end,
            ..
        } => writeln!(
            stream,
            "{}:{}-{}\t0\t{}",
            name,
            start,
            end,
            if *forward { '+' } else { '-' }
        ),
        SegmentSource::Read { name, start, end } => writeln!(
            stream,
            "{}:{}-{}\t0\t{}",
            name,
            start,
            end,
            if start <= end { '+' } else { '-' }
        ),
        SegmentSource::GraphPath { name } => writeln!(stream, "{}\t0\t.", name),
        SegmentSource::Padding => writeln!(stream, "N\t0\t."),
    }
}

pub fn write_bed<W: Write>(scaffold: &ScaffoldSequence, stream: &mut W) -> io::Result<()> {
    for segment in scaffold.segments.iter() {
        write_segment(scaffold, segment, stream)?;
    }
    Ok(())
}

pub fn bed_string(scaffold: &ScaffoldSequence) -> String {
    let mut result = Vec::new();
    let _ = write_bed(scaffold, &mut result);
    String::from_utf8_lossy(&result).into_owned()
}

/// `<prefix>.fin.fasta` and `<prefix>.fin.bed`.
pub fn output_paths<P: AsRef<Path>>(prefix: P) -> (PathBuf, PathBuf) {
    let prefix = prefix.as_ref().as_os_str().to_string_lossy();
    (
        PathBuf::from(format!("{}.fin.fasta", prefix)),
        PathBuf::from(format!("{}.fin.bed", prefix)),
    )
}

/// Materialize every finished scaffold and write the sequences and
/// their segment tables next to `prefix`. Returns the number of
/// scaffolds written.
pub fn write_assembly<P: AsRef<Path>>(graph: &mut ScaffoldGraph, prefix: P) -> Result<usize> {
    let (fasta_path, bed_path) = output_paths(prefix);
    let mut fasta = BufWriter::new(
        File::create(&fasta_path)
            .with_context(|| format!("creating {}", fasta_path.display()))?,
    );
    let mut bed = BufWriter::new(
        File::create(&bed_path).with_context(|| format!("creating {}", bed_path.display()))?,
    );

    let mut written = 0;
    for head in graph.finished_scaffolds() {
        let scaffold = match graph.materialize(head) {
            Some(scaffold) if !scaffold.is_empty() => scaffold,
            _ => continue,
        };
        write_fasta(&scaffold, &mut fasta)
            .with_context(|| format!("writing {}", fasta_path.display()))?;
        write_bed(&scaffold, &mut bed)
            .with_context(|| format!("writing {}", bed_path.display()))?;
        written += 1;
    }
    fasta.flush()?;
    bed.flush()?;

    info!(
        "Wrote {} scaffolds to {} and {}",
        written,
        fasta_path.display(),
        bed_path.display()
    );
    Ok(written)
}

/// Scaffold names in the order they appear in a written FASTA file.
pub fn fasta_names(fasta: &[u8]) -> Vec<&[u8]> {
    fasta
        .lines()
        .filter_map(|line| line.strip_prefix(b">"))
        .filter_map(|header| header.split_str(" ").next())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScaffoldConfig;
    use crate::scaffold_graph::tests::{bases, contig, read_of, whole};

    fn scaffold(len: usize) -> ScaffoldSequence {
        ScaffoldSequence {
            head: 0,
            name: "scaffold0".into(),
            circular: false,
            sequence: bases(len, 7).into(),
            segments: vec![
                Segment {
                    offset: 0,
                    len: 100,
                    source: SegmentSource::Contig {
                        id: 0,
                        name: "ctg0".into(),
                        forward: true,
                        start: 0,
                        end: 100,
                    },
                },
                Segment {
                    offset: 100,
                    len: 20,
                    source: SegmentSource::Read {
                        name: "r".into(),
                        start: 40,
                        end: 21,
                    },
                },
                Segment {
                    offset: 120,
                    len: 10,
                    source: SegmentSource::Padding,
                },
                Segment {
                    offset: 130,
                    len: 70,
                    source: SegmentSource::Contig {
                        id: 1,
                        name: "ctg1".into(),
                        forward: false,
                        start: 30,
                        end: 100,
                    },
                },
            ],
        }
    }

    #[test]
    fn fasta_lines_wrap() {
        let scf = scaffold(200);
        let string = fasta_string(&scf);
        let lines: Vec<&str> = string.lines().collect();
        assert_eq!(lines[0], ">scaffold0 length=200 linear");
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1].len(), 80);
        assert_eq!(lines[2].len(), 80);
        assert_eq!(lines[3].len(), 40);
        assert_eq!(lines[1..].concat().as_bytes(), scf.sequence.as_slice());
    }

    #[test]
    fn segment_table() {
        let string = bed_string(&scaffold(200));
        assert_eq!(
            string,
            "scaffold0\t0\t100\tctg0:0-100\t0\t+
scaffold0\t100\t120\tr:40-21\t0\t-
scaffold0\t120\t130\tN\t0\t.
scaffold0\t130\t200\tctg1:30-100\t0\t-
"
        );
    }

    #[test]
    fn write_to_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("out");

        let contigs = vec![contig(0, 5000, 20.0), contig(1, 4000, 20.0)];
        let mut graph = ScaffoldGraph::new(contigs, ScaffoldConfig::default());
        let a = whole(&graph, 9100, 0, 1, true);
        let b = whole(&graph, 9100, 1, 5101, true);
        graph.ingest_read(read_of("r", vec![a, b])).unwrap();
        graph.connect_bridges();

        let written = write_assembly(&mut graph, &prefix).unwrap();
        assert_eq!(written, 1);

        let (fasta_path, bed_path) = output_paths(&prefix);
        let fasta = std::fs::read(&fasta_path).unwrap();
        assert_eq!(fasta_names(&fasta), vec![&b"scaffold0"[..]]);
        assert!(fasta.starts_with(b">scaffold0 length=9100 linear\n"));

        let bed = std::fs::read_to_string(&bed_path).unwrap();
        let rows: Vec<&str> = bed.lines().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with("scaffold0\t0\t5000\tctg0:0-5000"));
        assert!(rows[1].starts_with("scaffold0\t5000\t5100\tN"));
        assert!(rows[2].starts_with("scaffold0\t5100\t9100\tctg1:0-4000"));
    }
}
