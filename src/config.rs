#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use std::time::Duration;

/// Caps on the assembly graph path search used for gap filling.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(default))]
pub struct SearchLimits {
    /// Maximum number of vertices traversed beyond the source.
    pub max_depth: usize,
    pub max_time: Duration,
    /// Largest accepted difference between a path's length and the
    /// gap it should fill.
    pub tolerance: i64,
}

impl Default for SearchLimits {
    fn default() -> Self {
        SearchLimits {
            max_depth: 50,
            max_time: Duration::from_secs(10),
            tolerance: 500,
        }
    }
}

/// Thresholds for evidence filtering, repeat classification and
/// scaffold output.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(default))]
pub struct ScaffoldConfig {
    /// Longest contig that may still be treated as a repeat.
    pub max_repeat_length: usize,
    /// Unaligned overhang allowed at either end of an alignment for it
    /// to count as spanning a contig end.
    pub margin: usize,
    pub min_contig_length: usize,
    pub min_support_reads: usize,
    /// Contigs with lower coverage are ignored when bridging.
    pub min_coverage: f64,
    pub min_quality: u8,
    /// Disables circular contig detection.
    pub eukaryotic: bool,
    pub report_all: bool,
    /// Only report scaffolds whose head contig is covered by reads.
    pub select_mapped: bool,
    /// Search the assembly graph regardless of the gap size.
    pub force_fill: bool,
    /// Largest gap for which the assembly graph is searched.
    pub search_radius: i64,
    pub bridge_tolerance: i64,
    pub self_bridge_tolerance: i64,
    pub search: SearchLimits,
}

impl Default for ScaffoldConfig {
    fn default() -> Self {
        ScaffoldConfig {
            max_repeat_length: 7500,
            margin: 1000,
            min_contig_length: 200,
            min_support_reads: 1,
            min_coverage: 0.0,
            min_quality: 1,
            eukaryotic: false,
            report_all: false,
            select_mapped: false,
            force_fill: false,
            search_radius: 300,
            bridge_tolerance: 250,
            self_bridge_tolerance: 100,
            search: SearchLimits::default(),
        }
    }
}

#[cfg(feature = "serde1")]
impl ScaffoldConfig {
    /// Read a config from a JSON file; missing keys take their default
    /// values.
    pub fn from_json_file<P: AsRef<std::path::Path>>(
        path: P,
    ) -> anyhow::Result<Self> {
        use anyhow::Context;
        let file = std::fs::File::open(path.as_ref()).with_context(|| {
            format!("opening config {}", path.as_ref().display())
        })?;
        let config = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(config)
    }
}
