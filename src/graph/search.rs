use std::time::{Duration, Instant};

use log::debug;

use crate::config::SearchLimits;

use super::{AssemblyGraph, GraphPath, Node};

/// Source of elapsed time for the bounded path search.
pub trait Clock {
    fn elapsed(&self) -> Duration;
}

/// A clock started at construction.
#[derive(Debug, Clone, Copy)]
pub struct WallClock(Instant);

impl WallClock {
    pub fn start() -> Self {
        WallClock(Instant::now())
    }
}

impl Clock for WallClock {
    #[inline]
    fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathHit {
    pub path: GraphPath,
    /// Difference between the gap spanned by the path and the target.
    pub deviation: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Accepted paths, best first.
    pub hits: Vec<PathHit>,
    /// Whether the time limit stopped the search early.
    pub cut_off: bool,
}

impl SearchOutcome {
    pub fn best(&self) -> Option<&GraphPath> {
        self.hits.first().map(|h| &h.path)
    }
}

struct Frame {
    path: GraphPath,
    node: Node,
    distance: i64,
    depth: usize,
}

/// Find walks from `source` to `dest` whose inner part spans
/// `distance` bases, up to `limits.tolerance`.
///
/// `distance` is the gap between the end of `source` and the start of
/// `dest`. The search is depth first with an explicit stack; paths
/// longer than `limits.max_depth` vertices are not explored, and once
/// `limits.max_time` has passed on `clock` the hits found so far are
/// returned.
pub fn find_paths<C: Clock>(
    graph: &AssemblyGraph,
    source: Node,
    dest: Node,
    distance: i64,
    limits: &SearchLimits,
    clock: &C,
) -> SearchOutcome {
    let tolerance = limits.tolerance;
    let mut outcome = SearchOutcome::default();

    let mut stack = vec![Frame {
        path: GraphPath::new(source),
        node: source,
        distance,
        depth: 0,
    }];

    while let Some(frame) = stack.pop() {
        if clock.elapsed() > limits.max_time {
            debug!(
                "Path search from {:?} to {:?} cut off with {} hits",
                source,
                dest,
                outcome.hits.len()
            );
            outcome.cut_off = true;
            break;
        }

        for edge in graph.edges_from(frame.node) {
            let next = Node::new(edge.to, edge.to_orient);
            let d = -edge.weight;

            if next == dest && (frame.distance + d).abs() < tolerance {
                let mut path = frame.path.clone();
                path.push(next, edge.weight);
                outcome.hits.push(PathHit {
                    path,
                    deviation: (frame.distance + d).abs(),
                });
                continue;
            }

            let new_distance =
                frame.distance - graph.vertex(next.vertex).len() as i64 + d;
            if new_distance + d < -tolerance {
                continue;
            }
            if frame.depth + 1 < limits.max_depth {
                let mut path = frame.path.clone();
                path.push(next, edge.weight);
                stack.push(Frame {
                    path,
                    node: next,
                    distance: new_distance,
                    depth: frame.depth + 1,
                });
            }
        }
    }

    outcome.hits.sort_by_key(|h| h.deviation);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Edge;
    use crate::orientation::Orientation::*;
    use std::cell::Cell;

    /// Advances one second every time it is read.
    struct FakeClock(Cell<u64>);

    impl Clock for FakeClock {
        fn elapsed(&self) -> Duration {
            let now = self.0.get();
            self.0.set(now + 1);
            Duration::from_secs(now)
        }
    }

    fn link(graph: &mut AssemblyGraph, from: usize, to: usize, weight: i64) {
        graph.add_edge(Edge {
            from,
            from_orient: Forward,
            to,
            to_orient: Forward,
            weight,
        });
    }

    // 0 -> 1 -> 3 and 0 -> 2 -> 3, with a 100 and a 400 base middle.
    fn diamond() -> AssemblyGraph {
        let mut graph = AssemblyGraph::new();
        graph.add_vertex("src", vec![b'A'; 1000], 1.0);
        graph.add_vertex("short", vec![b'C'; 100], 1.0);
        graph.add_vertex("long", vec![b'G'; 400], 1.0);
        graph.add_vertex("dst", vec![b'T'; 1000], 1.0);
        link(&mut graph, 0, 1, -20);
        link(&mut graph, 0, 2, -20);
        link(&mut graph, 1, 3, -20);
        link(&mut graph, 2, 3, -20);
        graph
    }

    #[test]
    fn closest_path_wins() {
        let graph = diamond();
        let limits = SearchLimits {
            tolerance: 500,
            ..Default::default()
        };
        let source = Node::new(0, Forward);
        let dest = Node::new(3, Forward);

        // the long vertex spans 360 bases between the two ends
        let outcome =
            find_paths(&graph, source, dest, 350, &limits, &WallClock::start());
        assert!(!outcome.cut_off);
        assert_eq!(outcome.hits.len(), 2);
        let best = outcome.best().unwrap();
        assert_eq!(best.nodes()[1], Node::new(2, Forward));
        assert_eq!(outcome.hits[0].deviation, 10);
        assert_eq!(best.length(&graph), 1000 + 400 + 1000 - 40);

        let outcome =
            find_paths(&graph, source, dest, 70, &limits, &WallClock::start());
        assert_eq!(outcome.best().unwrap().nodes()[1], Node::new(1, Forward));
    }

    #[test]
    fn depth_limit_prunes() {
        let graph = diamond();
        let limits = SearchLimits {
            max_depth: 1,
            ..Default::default()
        };
        let outcome = find_paths(
            &graph,
            Node::new(0, Forward),
            Node::new(3, Forward),
            70,
            &limits,
            &WallClock::start(),
        );
        assert!(outcome.hits.is_empty());
        assert!(!outcome.cut_off);
    }

    #[test]
    fn timeout_returns_what_was_found() {
        let graph = diamond();
        let limits = SearchLimits {
            max_time: Duration::from_secs(1),
            ..Default::default()
        };
        // the first read is 0s, the second 1s, the third 2s
        let clock = FakeClock(Cell::new(0));
        let outcome = find_paths(
            &graph,
            Node::new(0, Forward),
            Node::new(3, Forward),
            70,
            &limits,
            &clock,
        );
        assert!(outcome.cut_off);
        assert_eq!(outcome.hits.len(), 1);
    }

    #[test]
    fn unreachable_destination() {
        let graph = diamond();
        let outcome = find_paths(
            &graph,
            Node::new(3, Forward),
            Node::new(0, Forward),
            0,
            &SearchLimits::default(),
            &WallClock::start(),
        );
        assert!(outcome.hits.is_empty());
    }
}
