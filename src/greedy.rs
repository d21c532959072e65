//! Greedy scaffolding: grow each scaffold from its longest unique
//! contig, one marker at a time, filling gaps with repeats on the way.

use log::{debug, info, trace};

use std::cmp::Ordering;

use crate::bridge::BridgeKey;
use crate::contig::ContigId;
use crate::scaffold::{Placed, Scaffold};
use crate::scaffold_graph::{ScaffoldGraph, Scaffolder};
use crate::vector::ScaffoldVector;

#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyScaffolder;

/// A contig reachable from the tip of a scaffold.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    key: BridgeKey,
    id: ContigId,
    /// Placement relative to the scaffold head.
    vector: ScaffoldVector,
    distance: i64,
}

/// Confirm that the contigs `to_prev.second` and `to_cur.second`, both
/// reached from the same marker, are also linked to each other as the
/// marker predicts. Returns the bridge linking them.
fn check_hang(graph: &ScaffoldGraph, to_prev: BridgeKey, to_cur: BridgeKey) -> Option<BridgeKey> {
    let (prev, cur) = (to_prev.second, to_cur.second);
    let mark_to_prev = graph.bridge(&to_prev)?.trans();
    let mark_to_cur = graph.bridge(&to_cur)?.trans();
    let prev_to_cur = ScaffoldVector::compose(mark_to_prev.reverse(), mark_to_cur);

    let found = graph.bridges_from(prev).find(|bridge| {
        bridge.key.second == cur && bridge.consistent_with(prev_to_cur, graph.config())
    });
    trace!(
        "{} -> {} expected at {}: {}",
        prev,
        cur,
        prev_to_cur,
        if found.is_some() { "confirmed" } else { "not found" }
    );
    found.map(|bridge| bridge.key)
}

impl GreedyScaffolder {
    /// Extend the scaffold headed by `head` from its rear or front end
    /// for as long as a marker can be reached. Returns whether the
    /// scaffold ends up closed.
    fn walk(&self, graph: &mut ScaffoldGraph, head: ContigId, to_rear: bool) -> bool {
        let config = graph.config().clone();
        let mut extended = true;

        loop {
            let scf = &graph.scaffolds[head];
            if scf.is_empty() || scf.head() != head {
                return false;
            }
            if scf.is_closed() {
                return true;
            }
            if !extended {
                return false;
            }
            extended = false;

            let tip = match if to_rear { scf.last() } else { scf.first() } {
                Some(tip) => *tip,
                None => return false,
            };
            let tip_len = graph.len_of(tip.id);
            let tip_circular = graph.contigs[tip.id].is_circular();
            let ctg_end = if to_rear {
                tip.vector.right_most(tip_len)
            } else {
                tip.vector.left_most(tip_len)
            };

            let mut keys = graph.bridges_by_contig[tip.id].clone();
            let score = |key: &BridgeKey| graph.bridge(key).map_or(0.0, |b| b.score());
            keys.sort_by(|a, b| score(b).partial_cmp(&score(a)).unwrap_or(Ordering::Equal));

            let mut step: Option<BridgeKey> = None;
            let mut cur_step = i64::MAX;
            let mut cur_score = 0.0;
            let mut extend_dir = 0;
            let mut candidates: Vec<Candidate> = Vec::with_capacity(keys.len());

            for key in keys {
                let bridge = match graph.bridge(&key) {
                    Some(bridge) => bridge,
                    None => continue,
                };
                if key.is_self() && !tip_circular {
                    continue;
                }
                let next = key.second;
                let next_len = graph.len_of(next);
                let trial = ScaffoldVector::compose(tip.vector, bridge.trans());
                let distance = bridge.distance(tip_len, next_len);
                let outward = if to_rear {
                    trial.right_most(next_len) > ctg_end
                } else {
                    trial.left_most(next_len) < ctg_end
                };
                if !outward {
                    continue;
                }

                if !graph.is_repeat(next) || (tip_circular && next == tip.id) {
                    let mut a_dir = 0;
                    if graph.scaffolds[graph.contigs[next].head].len() > 1 {
                        a_dir = graph.extend_direction(&tip, key);
                        if a_dir == 0 {
                            trace!("No jump to {} from {}", next, tip.id);
                            continue;
                        }
                    }
                    if distance > -(config.max_repeat_length as i64)
                        && bridge.count() >= config.min_support_reads
                        && bridge.score() > cur_score
                    {
                        cur_step = distance;
                        cur_score = bridge.score();
                        step = Some(key);
                        extend_dir = a_dir;
                    } else {
                        continue;
                    }
                }

                let pos = candidates
                    .iter()
                    .position(|c| c.distance > distance)
                    .unwrap_or_else(|| candidates.len());
                candidates.insert(
                    pos,
                    Candidate {
                        key,
                        id: next,
                        vector: trial,
                        distance,
                    },
                );
            }

            let step = match step {
                Some(step) => step,
                None => {
                    trace!("Scaffold {} stops at {}: no marker ahead", head, tip.id);
                    return false;
                }
            };

            let mut cur_end = ctg_end;
            let mut prev = tip;
            let mut prev_bridge: Option<BridgeKey> = None;
            let mut unique = 0;

            for cand in candidates.iter() {
                if cand.distance > cur_step {
                    continue;
                }
                let repeat = graph.is_repeat(cand.id);
                let circular = graph.contigs[cand.id].is_circular();
                if repeat && !circular && check_hang(graph, cand.key, step).is_none() {
                    continue;
                }

                let cand_len = graph.len_of(cand.id);
                let covered = if to_rear {
                    cand.vector.right_most(cand_len) < cur_end
                } else {
                    cand.vector.left_most(cand_len) > cur_end
                };
                if repeat && covered {
                    continue;
                }

                let mut prev_to_cur = ScaffoldVector::compose(prev.vector.reverse(), cand.vector);
                let confirmed = match prev_bridge {
                    Some(to_prev) => match check_hang(graph, to_prev, cand.key) {
                        Some(found) => {
                            prev_bridge = Some(cand.key);
                            if let Some(bridge) = graph.bridge(&found) {
                                prev_to_cur = bridge.trans();
                            }
                            found
                        }
                        None => continue,
                    },
                    None => {
                        prev_bridge = Some(cand.key);
                        cand.key
                    }
                };
                if confirmed.first != prev.id {
                    continue;
                }

                let scf = &graph.scaffolds[head];
                let opposite = if to_rear { scf.first() } else { scf.last() }.map(|p| p.id);
                if opposite == Some(cand.id) && (!repeat || circular) {
                    let close = if to_rear { confirmed } else { confirmed.twin() };
                    graph.set_close_bridge(head, close);
                    graph.set_contig_scores(cand.key);
                    debug!("Scaffold {} closed through {}", head, close);
                    return true;
                }

                let vector = ScaffoldVector::compose(prev.vector, prev_to_cur);
                let placed = if repeat {
                    graph.fillers.insert(cand.id);
                    Placed::clone_of(cand.id, vector)
                } else {
                    let cur_head = graph.contigs[cand.id].head;
                    if graph.scaffolds[cur_head].len() > 1 {
                        if !graph.join_scaffold(head, prev, confirmed, to_rear, extend_dir) {
                            trace!("Cannot join scaffold {} onto {}", cur_head, head);
                            continue;
                        }
                        graph.set_contig_scores(cand.key);
                        unique += 1;
                        break;
                    }
                    if cur_head == head {
                        continue;
                    }
                    unique += 1;
                    graph.set_contig_scores(cand.key);
                    graph.scaffolds[cur_head] = Scaffold::default();
                    let ctg = &mut graph.contigs[cand.id];
                    ctg.head = head;
                    ctg.vector = vector;
                    Placed::new(cand.id, vector)
                };

                trace!("Scaffold {}: {} placed at {}", head, cand.id, vector);
                if to_rear {
                    graph.scaffolds[head].add_rear(placed, confirmed);
                } else {
                    graph.scaffolds[head].add_front(placed, confirmed.twin());
                }
                cur_end = if to_rear {
                    cand.vector.right_most(cand_len)
                } else {
                    cand.vector.left_most(cand_len)
                };
                extended = true;
                prev = placed;

                if cand.distance == cur_step {
                    break;
                }
            }

            if unique < 1 {
                trace!("Scaffold {} stops at {}: marker unreachable", head, tip.id);
                graph.trim(head);
                return false;
            }
        }
    }
}

impl Scaffolder for GreedyScaffolder {
    fn connect_bridges(&self, graph: &mut ScaffoldGraph) {
        let mut order: Vec<ContigId> = (0..graph.contigs().len()).collect();
        order.sort_by(|&a, &b| graph.len_of(b).cmp(&graph.len_of(a)));

        for id in order {
            let scf = &graph.scaffolds[id];
            if scf.is_empty() || scf.head() != id || scf.is_closed() {
                continue;
            }
            let circular = graph.contigs[id].is_circular();
            if (graph.is_repeat(id) || graph.len_of(id) < graph.config().min_contig_length) && !circular {
                continue;
            }
            if !self.walk(graph, id, true) {
                self.walk(graph, id, false);
            }
        }

        let summary = graph.summary();
        info!(
            "{} scaffolds ({} circular), N50 {}",
            summary.scaffolds, summary.circular, summary.n50
        );
    }
}
