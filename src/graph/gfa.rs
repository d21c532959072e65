//! Loading an assembly graph from GFA1 segment, link and path lines.

use bstr::{BString, ByteSlice};
use fnv::FnvHashMap;
use log::{debug, info, warn};

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::cigar::CIGAR;
use crate::error::{Error, FieldResult, ParseFieldError, ParserTolerance, Result};
use crate::orientation::Orientation;

use super::{AssemblyGraph, Edge, GraphPath, Node};

struct RawLink {
    from: BString,
    from_orient: Orientation,
    to: BString,
    to_orient: Orientation,
    overlap: Option<usize>,
    line: BString,
}

struct RawPath {
    name: BString,
    steps: Vec<(BString, Orientation)>,
    line: BString,
}

fn next_field<'a, I>(fields: &mut I) -> FieldResult<&'a [u8]>
where
    I: Iterator<Item = &'a [u8]>,
{
    fields.next().ok_or(ParseFieldError::MissingFields)
}

fn parse_orient(bytes: &[u8]) -> FieldResult<Orientation> {
    Orientation::parse_error(Orientation::from_bytes_plus_minus(bytes))
}

/// Coverage from a `DP:f:` depth tag, or a `KC:i:` k-mer count divided
/// by the segment length.
fn segment_coverage<'a, I>(tags: I, len: usize) -> f64
where
    I: Iterator<Item = &'a [u8]>,
{
    let mut coverage = 1.0;
    for tag in tags {
        let value = tag.get(5..).and_then(|v| v.to_str().ok());
        match (tag.get(..5), value) {
            (Some(b"DP:f:"), Some(v)) | (Some(b"dp:f:"), Some(v)) => {
                if let Ok(dp) = v.parse() {
                    return dp;
                }
            }
            (Some(b"KC:i:"), Some(v)) if len > 0 => {
                if let Ok(kc) = v.parse::<f64>() {
                    coverage = kc / len as f64;
                }
            }
            _ => (),
        }
    }
    coverage
}

fn parse_segment(
    graph: &mut AssemblyGraph,
    line: &[u8],
) -> FieldResult<()> {
    let mut fields = line.split_str(b"\t").skip(1);
    let name = next_field(&mut fields)?;
    let seq = next_field(&mut fields)?;
    let seq = if seq == b"*" { &[][..] } else { seq };
    let coverage = segment_coverage(fields, seq.len());
    graph.add_vertex(name, seq, coverage);
    Ok(())
}

fn parse_link(line: &[u8]) -> FieldResult<RawLink> {
    let mut fields = line.split_str(b"\t").skip(1);
    let from = next_field(&mut fields)?.into();
    let from_orient = parse_orient(next_field(&mut fields)?)?;
    let to = next_field(&mut fields)?.into();
    let to_orient = parse_orient(next_field(&mut fields)?)?;
    let overlap = match fields.next() {
        None | Some(b"*") => None,
        Some(cg) => Some(
            CIGAR::from_bytestring(cg)
                .ok_or(ParseFieldError::InvalidField("overlap"))?
                .overlap(),
        ),
    };
    Ok(RawLink {
        from,
        from_orient,
        to,
        to_orient,
        overlap,
        line: line.into(),
    })
}

fn parse_path(line: &[u8]) -> FieldResult<RawPath> {
    let mut fields = line.split_str(b"\t").skip(1);
    let name = next_field(&mut fields)?.into();
    let steps = next_field(&mut fields)?
        .split_str(b",")
        .map(|step| {
            if step.len() < 2 {
                return Err(ParseFieldError::InvalidField("segment names"));
            }
            let (seg, orient) = step.split_at(step.len() - 1);
            Ok((seg.into(), parse_orient(orient)?))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(RawPath {
        name,
        steps,
        line: line.into(),
    })
}

fn most_common(overlaps: impl Iterator<Item = usize>) -> usize {
    let mut counts: FnvHashMap<usize, usize> = FnvHashMap::default();
    for o in overlaps {
        *counts.entry(o).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by_key(|&(o, c)| (c, o))
        .map(|(o, _)| o)
        .unwrap_or(0)
}

fn handle(err: Error, tolerance: &ParserTolerance) -> Result<()> {
    if err.can_safely_continue(tolerance) {
        warn!("Skipping GFA line: {}", err);
        Ok(())
    } else {
        Err(err)
    }
}

/// Build an assembly graph from GFA1 text. Header, containment and
/// unknown lines are ignored.
pub fn parse_gfa<R: BufRead>(
    mut reader: R,
    tolerance: ParserTolerance,
) -> Result<AssemblyGraph> {
    let mut graph = AssemblyGraph::new();
    let mut links = Vec::new();
    let mut paths = Vec::new();

    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = buf.trim_end_with(|c| c == '\n' || c == '\r');
        let parsed = match line.first() {
            Some(b'S') => parse_segment(&mut graph, line),
            Some(b'L') => parse_link(line).map(|l| links.push(l)),
            Some(b'P') => parse_path(line).map(|p| paths.push(p)),
            _ => Ok(()),
        };
        if let Err(err) = parsed {
            handle(Error::invalid_line(err, line), &tolerance)?;
        }
    }

    let kmer = most_common(links.iter().filter_map(|l| l.overlap));
    graph.set_kmer(kmer);

    for link in links {
        let ids = (graph.vertex_id(&link.from), graph.vertex_id(&link.to));
        let (from, to) = match ids {
            (Some(from), Some(to)) => (from, to),
            _ => {
                let err = ParseFieldError::InvalidField("segment name");
                handle(Error::invalid_line(err, &link.line), &tolerance)?;
                continue;
            }
        };
        graph.add_edge(Edge {
            from,
            from_orient: link.from_orient,
            to,
            to_orient: link.to_orient,
            weight: -(link.overlap.unwrap_or(kmer) as i64),
        });
    }

    for raw in paths {
        let nodes: Option<Vec<Node>> = raw
            .steps
            .iter()
            .map(|(seg, o)| graph.vertex_id(seg).map(|v| Node::new(v, *o)))
            .collect();
        let nodes = match nodes {
            Some(nodes) if !nodes.is_empty() => nodes,
            _ => {
                let err = ParseFieldError::InvalidField("segment name");
                handle(Error::invalid_line(err, &raw.line), &tolerance)?;
                continue;
            }
        };

        let mut path = GraphPath::new(nodes[0]);
        for pair in nodes.windows(2) {
            let weight = graph
                .edge_between(pair[0], pair[1])
                .map(|e| e.weight)
                .unwrap_or(-(kmer as i64));
            path.push(pair[1], weight);
        }
        debug!("Contig {} decomposes into {}", raw.name, path);
        graph.add_path(raw.name, path);
    }

    info!(
        "Loaded assembly graph with {} vertices, {} edges, k = {}",
        graph.vertex_count(),
        graph.edge_count(),
        graph.kmer()
    );
    Ok(graph)
}

pub fn load_gfa<P: AsRef<Path>>(
    path: P,
    tolerance: ParserTolerance,
) -> Result<AssemblyGraph> {
    let file = File::open(path)?;
    parse_gfa(BufReader::new(file), tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::Orientation::*;
    use bstr::B;

    const GFA: &[u8] = b"H\tVN:Z:1.0
S\t1\tAACCGGT\tKC:i:70
S\t2\tGGTTA\tDP:f:4.5
S\t3\tCCAAT
L\t1\t+\t2\t+\t3M
L\t2\t+\t3\t-\t3M
L\t1\t-\t3\t+\t*
P\tNODE_1\t1+,2+\t3M
";

    #[test]
    fn segments_links_and_paths() {
        let graph = parse_gfa(GFA, ParserTolerance::Safe).unwrap();
        assert_eq!(graph.vertex_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.kmer(), 3);

        let one = graph.vertex_id(b"1").unwrap();
        let two = graph.vertex_id(b"2").unwrap();
        assert!((graph.vertex(one).coverage - 10.0).abs() < 1e-9);
        assert!((graph.vertex(two).coverage - 4.5).abs() < 1e-9);

        // the starred overlap takes the k-mer size
        let three = graph.vertex_id(b"3").unwrap();
        let edge = graph
            .edge_between(Node::new(one, Backward), Node::new(three, Forward))
            .unwrap();
        assert_eq!(edge.weight, -3);

        let paths = graph.paths_of(B("NODE_1").as_bstr()).unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].length(&graph), 9);
        assert_eq!(paths[0].spelling(&graph), "AACCGGTTA");
    }

    #[test]
    fn malformed_lines_follow_tolerance() {
        let gfa = b"S\t1\tACGT\nL\t1\t+\t9\t+\t2M\nL\t1\tx\n";
        let graph = parse_gfa(&gfa[..], ParserTolerance::Safe).unwrap();
        assert_eq!(graph.edge_count(), 0);
        assert!(parse_gfa(&gfa[..], ParserTolerance::Pedantic).is_err());
    }

    #[test]
    fn from_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(GFA).unwrap();
        let graph = load_gfa(file.path(), ParserTolerance::Safe).unwrap();
        assert_eq!(graph.vertex_count(), 3);
    }
}
