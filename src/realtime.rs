//! Scaffolding while alignments are still arriving.
//!
//! Read groups are ingested on the calling thread. A worker thread
//! shares the graph through a single lock and re-runs the scaffolder
//! whenever enough new reads have arrived and enough time has passed.

use bstr::BString;
use fnv::FnvHashMap;
use log::{debug, info};
use parking_lot::{Condvar, Mutex};

use std::thread;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::greedy::GreedyScaffolder;
use crate::paf::PafRecord;
use crate::scaffold_graph::{ScaffoldGraph, Scaffolder, Summary};

/// Snapshot handed to the progress callback after each pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub elapsed: Duration,
    pub reads: usize,
    pub bases: usize,
    /// Set on the pass run after the input is exhausted.
    pub last: bool,
    pub summary: Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Open,
    Closed,
    Failed,
}

struct Shared {
    state: Mutex<State>,
    wake: Condvar,
}

struct State {
    graph: ScaffoldGraph,
    stream: Stream,
}

#[derive(Debug, Clone)]
pub struct RealtimeScaffolder<S = GreedyScaffolder> {
    read_interval: usize,
    time_interval: Duration,
    /// How long the worker sleeps when too few new reads have arrived.
    nap: Duration,
    scaffolder: S,
}

impl Default for RealtimeScaffolder {
    fn default() -> Self {
        RealtimeScaffolder::new(50, Duration::from_secs(10))
    }
}

impl RealtimeScaffolder {
    pub fn new(read_interval: usize, time_interval: Duration) -> Self {
        RealtimeScaffolder {
            read_interval,
            time_interval,
            nap: Duration::from_secs(1),
            scaffolder: GreedyScaffolder::default(),
        }
    }
}

impl<S: Scaffolder + Sync> RealtimeScaffolder<S> {
    pub fn with_scaffolder<T: Scaffolder + Sync>(self, scaffolder: T) -> RealtimeScaffolder<T> {
        RealtimeScaffolder {
            read_interval: self.read_interval,
            time_interval: self.time_interval,
            nap: self.nap,
            scaffolder,
        }
    }

    pub fn with_nap(mut self, nap: Duration) -> Self {
        self.nap = nap;
        self
    }

    /// Ingest every read group of `groups`, scaffolding periodically,
    /// and return the graph after a final pass. Read sequences are
    /// looked up by read name in `reads`.
    ///
    /// If the stream yields an error, or a read names an unknown
    /// contig, the worker is stopped without a final pass and the
    /// error is returned.
    pub fn run<I, F>(
        &self,
        graph: ScaffoldGraph,
        groups: I,
        reads: &FnvHashMap<BString, BString>,
        on_progress: F,
    ) -> Result<ScaffoldGraph>
    where
        I: IntoIterator<Item = Result<Vec<PafRecord>>>,
        F: FnMut(&Progress) + Send,
    {
        let shared = Shared {
            state: Mutex::new(State {
                graph,
                stream: Stream::Open,
            }),
            wake: Condvar::new(),
        };
        let start = Instant::now();

        let fed = thread::scope(|scope| {
            let worker = scope.spawn(|| self.watch(&shared, start, on_progress));
            let fed = self.feed(&shared, groups, reads);

            let mut state = shared.state.lock();
            state.stream = if fed.is_ok() {
                Stream::Closed
            } else {
                Stream::Failed
            };
            shared.wake.notify_all();
            drop(state);

            if worker.join().is_err() {
                log::error!("Scaffolding worker panicked");
            }
            fed
        });
        fed?;

        info!("Realtime scaffolding done after {:?}", start.elapsed());
        Ok(shared.state.into_inner().graph)
    }

    fn feed<I>(
        &self,
        shared: &Shared,
        groups: I,
        reads: &FnvHashMap<BString, BString>,
    ) -> Result<()>
    where
        I: IntoIterator<Item = Result<Vec<PafRecord>>>,
    {
        for group in groups {
            let group = group?;
            let sequence = group
                .first()
                .and_then(|rec| reads.get(&rec.query_seq_name))
                .cloned();

            let mut state = shared.state.lock();
            let read = state.graph.read_from_paf(&group, sequence)?;
            state.graph.ingest_read(read)?;
            if self.read_interval == 0 || state.graph.read_count() % self.read_interval == 0 {
                shared.wake.notify_one();
            }
        }
        Ok(())
    }

    fn watch<F>(&self, shared: &Shared, start: Instant, mut on_progress: F)
    where
        F: FnMut(&Progress),
    {
        info!("Start scaffolding from streamed reads");
        let mut last_time: Option<Instant> = None;
        let mut last_reads = 0;

        let mut state = shared.state.lock();
        while state.stream == Stream::Open {
            if let Some(due) = last_time.map(|t| t + self.time_interval) {
                if Instant::now() < due {
                    debug!("Not due time, waiting {:?}", due - Instant::now());
                    shared.wake.wait_until(&mut state, due);
                    continue;
                }
            }

            let reads = state.graph.read_count();
            if reads - last_reads < self.read_interval || reads == last_reads {
                debug!("Not due reads ({}), waiting {:?}", reads, self.nap);
                shared.wake.wait_for(&mut state, self.nap);
                continue;
            }

            last_reads = reads;
            last_time = Some(Instant::now());
            state.graph.connect_bridges_with(&self.scaffolder);
            on_progress(&progress(&state.graph, start, false));
        }

        if state.stream == Stream::Failed {
            return;
        }

        info!("All reads received after {:?}", start.elapsed());
        if state.graph.has_assembly_graph() {
            state.graph.config_mut().force_fill = true;
        }
        state.graph.connect_bridges_with(&self.scaffolder);
        on_progress(&progress(&state.graph, start, true));
    }
}

fn progress(graph: &ScaffoldGraph, start: Instant, last: bool) -> Progress {
    let summary = graph.summary();
    let progress = Progress {
        elapsed: start.elapsed(),
        reads: graph.read_count(),
        bases: graph.base_count(),
        last,
        summary,
    };
    info!(
        "RUNTIME\t{:.3}\t{}\t{}",
        progress.elapsed.as_secs_f64(),
        progress.reads,
        progress.summary
    );
    progress
}
