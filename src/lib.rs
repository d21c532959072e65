//! Long-read scaffolding of short-read assemblies.
//!
//! Contigs are linked by bridges built from long-read alignments,
//! greedily ordered into scaffolds, and gaps are filled either from
//! the reads themselves or from paths through the assembly graph.

pub mod alignment;
pub mod bridge;
pub mod cigar;
pub mod config;
pub mod contig;
pub mod error;
pub mod fasta;
pub mod graph;
pub mod greedy;
pub mod orientation;
pub mod paf;
pub mod realtime;
pub mod scaffold;
pub mod scaffold_graph;
pub mod vector;
pub mod writer;

pub use self::config::{ScaffoldConfig, SearchLimits};
pub use self::contig::{Contig, ContigId, CoverageFormat};
pub use self::error::{Error, ParserTolerance, Result};
pub use self::greedy::GreedyScaffolder;
pub use self::realtime::{Progress, RealtimeScaffolder};
pub use self::scaffold_graph::{ScaffoldGraph, ScaffoldSequence, Scaffolder, Summary};
pub use self::vector::ScaffoldVector;
