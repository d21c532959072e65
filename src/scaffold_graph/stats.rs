use std::fmt;

use crate::contig::ContigId;
use crate::scaffold::Scaffold;

use super::ScaffoldGraph;

/// Assembly statistics over the scaffolds that would be reported.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize))]
pub struct Summary {
    pub scaffolds: usize,
    pub circular: usize,
    pub total_length: u64,
    pub longest: u64,
    pub n50: u64,
    /// Gaps in long scaffolds not yet resolved by a graph path.
    pub gaps: usize,
    pub max_gap: i64,
    pub reads: usize,
    pub bases: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} reads ({} bases): {} scaffolds ({} circular), total {}, longest {}, N50 {}, {} gaps (max {})",
            self.reads,
            self.bases,
            self.scaffolds,
            self.circular,
            self.total_length,
            self.longest,
            self.n50,
            self.gaps,
            self.max_gap
        )
    }
}

/// The length L such that scaffolds of length at least L cover half of
/// the total.
pub fn n50(lengths: &[u64]) -> u64 {
    let mut sorted = lengths.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    let total: u64 = sorted.iter().sum();
    let mut acc = 0;
    for len in sorted {
        acc += len;
        if 2 * acc >= total {
            return len;
        }
    }
    0
}

impl ScaffoldGraph {
    fn is_reported(&self, head: ContigId, scf: &Scaffold) -> bool {
        if self.config.select_mapped && !self.contigs[head].is_mapped() {
            return false;
        }
        if self.is_repeat(head) && !scf.is_closed() {
            return self.config.report_all && !self.fillers.contains(&head);
        }
        true
    }

    /// Heads of the scaffolds that make up the final assembly.
    pub fn finished_scaffolds(&self) -> Vec<ContigId> {
        self.scaffolds
            .iter()
            .enumerate()
            .filter(|(ix, scf)| !scf.is_empty() && scf.head() == *ix)
            .filter(|(ix, scf)| self.is_reported(*ix, scf))
            .map(|(ix, _)| ix)
            .collect()
    }

    /// Estimated length of the scaffold headed by `head`, from contig
    /// placements rather than sequence.
    pub fn scaffold_length(&self, head: ContigId) -> u64 {
        self.scaffold(head)
            .map_or(0, |scf| scf.length(|id| self.len_of(id)).max(0) as u64)
    }

    pub fn summary(&self) -> Summary {
        let heads = self.finished_scaffolds();
        let lengths: Vec<u64> = heads.iter().map(|&h| self.scaffold_length(h)).collect();

        let mut summary = Summary {
            scaffolds: heads.len(),
            circular: heads
                .iter()
                .filter(|&&h| self.scaffolds[h].is_closed())
                .count(),
            total_length: lengths.iter().sum(),
            longest: lengths.iter().copied().max().unwrap_or(0),
            n50: n50(&lengths),
            reads: self.read_count(),
            bases: self.base_count(),
            ..Summary::default()
        };

        for (head, scf) in self.scaffolds.iter().enumerate() {
            if scf.is_empty() || scf.head() != head {
                continue;
            }
            let long = !self.is_repeat(head)
                && self.scaffold_length(head) > self.config.max_repeat_length as u64;
            if !long && !scf.is_closed() {
                continue;
            }
            for key in scf.bridges().iter().chain(scf.close_bridge().iter()) {
                let bridge = match self.bridges.get(key) {
                    Some(bridge) => bridge,
                    None => continue,
                };
                if bridge.path().is_some() {
                    continue;
                }
                summary.gaps += 1;
                let gap = bridge.distance(self.len_of(key.first), self.len_of(key.second));
                summary.max_gap = summary.max_gap.max(gap);
            }
        }
        summary
    }
}
