use anyhow::{Context, Result};
use clap::Parser;
use fnv::FnvHashMap;
use log::{info, LevelFilter};

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

use scarf::contig::CoverageFormat;
use scarf::error::ParserTolerance;
use scarf::fasta;
use scarf::graph;
use scarf::paf::PafGroups;
use scarf::writer;
use scarf::{RealtimeScaffolder, ScaffoldConfig, ScaffoldGraph};

#[derive(Parser, Debug)]
#[command(name = "scarf")]
#[command(about = "Scaffold a short-read assembly with long-read alignments", long_about = None)]
struct Cli {
    /// Contigs in FASTA format
    #[arg(short = 's', long, value_name = "FASTA")]
    contigs: PathBuf,

    /// Long reads aligned to the contigs, in PAF format, grouped by read
    #[arg(short = 'i', long, value_name = "PAF")]
    alignments: PathBuf,

    /// Long read sequences, used to fill gaps
    #[arg(short = 'r', long, value_name = "FASTA")]
    reads: Option<PathBuf>,

    /// Assembly graph in GFA1 format, used to fill short gaps
    #[arg(short = 'g', long, value_name = "GFA")]
    graph: Option<PathBuf>,

    /// Output prefix; writes <prefix>.fin.fasta and <prefix>.fin.bed
    #[arg(short = 'o', long, default_value = "scarf")]
    output: PathBuf,

    /// Read contig coverage from ABySS style headers
    #[arg(long)]
    abyss: bool,

    /// JSON file with scaffolding thresholds, overridden by flags below
    #[cfg(feature = "serde1")]
    #[arg(long, value_name = "JSON")]
    config: Option<PathBuf>,

    /// Also write the summary statistics to <prefix>.stats.json
    #[cfg(feature = "serde1")]
    #[arg(long)]
    stats: bool,

    #[arg(long)]
    max_repeat_length: Option<usize>,

    #[arg(long)]
    margin: Option<usize>,

    #[arg(long)]
    min_contig_length: Option<usize>,

    #[arg(long)]
    min_support_reads: Option<usize>,

    #[arg(long)]
    min_coverage: Option<f64>,

    #[arg(long)]
    min_quality: Option<u8>,

    /// Don't look for circular contigs
    #[arg(long)]
    eukaryotic: bool,

    /// Also report repeat contigs that were not used in a scaffold
    #[arg(long)]
    report_all: bool,

    /// Only report scaffolds whose head contig is covered by reads
    #[arg(long)]
    select_mapped: bool,

    /// Search the assembly graph for every gap
    #[arg(long)]
    force_fill: bool,

    /// Scaffold periodically while reading the alignments
    #[arg(long)]
    realtime: bool,

    /// Minimum number of new reads between two realtime passes
    #[arg(long, default_value_t = 50)]
    read_interval: usize,

    /// Minimum number of seconds between two realtime passes
    #[arg(long, default_value_t = 10)]
    time_interval: u64,

    /// Skip malformed input lines instead of failing
    #[arg(long)]
    lenient: bool,

    /// Increase verbosity; repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn scaffold_config(&self) -> Result<ScaffoldConfig> {
        #[cfg(feature = "serde1")]
        let mut config = match &self.config {
            Some(path) => ScaffoldConfig::from_json_file(path)?,
            None => ScaffoldConfig::default(),
        };
        #[cfg(not(feature = "serde1"))]
        let mut config = ScaffoldConfig::default();

        if let Some(x) = self.max_repeat_length {
            config.max_repeat_length = x;
        }
        if let Some(x) = self.margin {
            config.margin = x;
        }
        if let Some(x) = self.min_contig_length {
            config.min_contig_length = x;
        }
        if let Some(x) = self.min_support_reads {
            config.min_support_reads = x;
        }
        if let Some(x) = self.min_coverage {
            config.min_coverage = x;
        }
        if let Some(x) = self.min_quality {
            config.min_quality = x;
        }
        config.eukaryotic |= self.eukaryotic;
        config.report_all |= self.report_all;
        config.select_mapped |= self.select_mapped;
        config.force_fill |= self.force_fill;
        Ok(config)
    }

    fn tolerance(&self) -> ParserTolerance {
        if self.lenient {
            ParserTolerance::IgnoreAll
        } else {
            ParserTolerance::Safe
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();

    let config = cli.scaffold_config()?;
    let format = if cli.abyss {
        CoverageFormat::Abyss
    } else {
        CoverageFormat::Spades
    };

    let contigs = fasta::read_contigs(&cli.contigs, format)
        .with_context(|| format!("loading contigs from {}", cli.contigs.display()))?;
    let mut scaffolds = ScaffoldGraph::new(contigs, config);

    if let Some(path) = &cli.graph {
        let assembly = graph::load_gfa(path, cli.tolerance())
            .with_context(|| format!("loading assembly graph from {}", path.display()))?;
        scaffolds.set_assembly_graph(assembly);
    }

    let reads = match &cli.reads {
        Some(path) => fasta::read_sequences(path)
            .with_context(|| format!("loading reads from {}", path.display()))?,
        None => FnvHashMap::default(),
    };

    let paf = File::open(&cli.alignments)
        .with_context(|| format!("opening {}", cli.alignments.display()))?;
    let groups = PafGroups::new(BufReader::new(paf), cli.tolerance());

    if cli.realtime {
        let driver = RealtimeScaffolder::new(
            cli.read_interval,
            Duration::from_secs(cli.time_interval),
        );
        scaffolds = driver
            .run(scaffolds, groups, &reads, |_| ())
            .with_context(|| format!("scaffolding {}", cli.alignments.display()))?;
    } else {
        for group in groups {
            let group = group?;
            let sequence = group
                .first()
                .and_then(|rec| reads.get(&rec.query_seq_name))
                .cloned();
            let read = scaffolds.read_from_paf(&group, sequence)?;
            scaffolds.ingest_read(read)?;
        }
        info!(
            "Ingested {} reads ({} bases), {} bridges",
            scaffolds.read_count(),
            scaffolds.base_count(),
            scaffolds.bridge_count()
        );
        scaffolds.connect_bridges();
    }

    writer::write_assembly(&mut scaffolds, &cli.output)?;

    let summary = scaffolds.summary();
    info!("{}", summary);

    #[cfg(feature = "serde1")]
    {
        if cli.stats {
            let path = format!("{}.stats.json", cli.output.display());
            let file = File::create(&path).with_context(|| format!("creating {}", path))?;
            serde_json::to_writer_pretty(file, &summary)?;
        }
    }

    Ok(())
}
