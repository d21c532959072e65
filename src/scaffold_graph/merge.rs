//! Joining, splitting and re-rooting scaffolds.

use log::debug;

use crate::bridge::BridgeKey;
use crate::contig::ContigId;
use crate::scaffold::{Placed, Scaffold};
use crate::vector::ScaffoldVector;

use super::ScaffoldGraph;

impl ScaffoldGraph {
    /// Decide how the scaffold holding `key.second` can be walked when
    /// the bridge `key` is used to extend from `tip`.
    ///
    /// Returns 1 when the contigs after `key.second` can follow it, -1
    /// for the contigs before it, and 0 when the bridge would go
    /// through the middle of an established scaffold.
    pub(crate) fn extend_direction(&self, tip: &Placed, key: BridgeKey) -> i8 {
        let bridge = match self.bridges.get(&key) {
            Some(bridge) => bridge,
            None => return 0,
        };
        let f = key.second;
        let trans = bridge.trans();
        let pointer = (trans.magnitude() * i64::from(trans.direction())).signum();

        let (t_len, f_len) = (self.len_of(tip.id), self.len_of(f));
        let head_t_to_f = ScaffoldVector::compose(tip.vector, trans);
        let (l_end_f, r_end_f) = (head_t_to_f.left_most(f_len), head_t_to_f.right_most(f_len));

        let direction = if r_end_f > tip.vector.right_most(t_len) {
            1
        } else if l_end_f < tip.vector.left_most(t_len) {
            -1
        } else {
            return 0;
        };

        let scf_f = &self.scaffolds[self.contigs[f].head];
        let idx_f = match scf_f.index_of(f) {
            Some(ix) => ix,
            None => return 0,
        };
        let rev = scf_f.contigs()[idx_f].vector.reverse();
        let side_score = if pointer < 0 {
            self.contigs[f].next_score
        } else {
            self.contigs[f].prev_score
        };

        // does the marker land beyond F, on the side we extend to?
        let beyond = |ix: usize, wraps: bool, forward: bool| {
            let marker = &scf_f.contigs()[ix];
            let mut to_marker = ScaffoldVector::compose(rev, marker.vector);
            if wraps {
                to_marker = scf_f.rotate(to_marker, forward);
            }
            let head_t_to_marker = ScaffoldVector::compose(head_t_to_f, to_marker);
            let len = self.len_of(marker.id);
            if direction > 0 {
                head_t_to_marker.right_most(len) > r_end_f
            } else {
                head_t_to_marker.left_most(len) < l_end_f
            }
        };

        if let Some(prev) = self.nearest_marker(scf_f, idx_f, false) {
            if beyond(prev, prev > idx_f && scf_f.is_closed(), false) {
                return if side_score < bridge.score() { -1 } else { 0 };
            }
        }
        if let Some(next) = self.nearest_marker(scf_f, idx_f, true) {
            if beyond(next, next < idx_f && scf_f.is_closed(), true) {
                return if side_score < bridge.score() { 1 } else { 0 };
            }
        }
        0
    }

    /// Pull the scaffold holding `key.second` onto the scaffold headed
    /// by `head_t`, whose end contig `tip` the bridge leaves from.
    ///
    /// `to_rear` says which end of T is extended; `second_dir` is the
    /// result of `extend_direction`. When both contigs already share a
    /// scaffold the bridge closes it instead, and whatever lies beyond
    /// the closing contig is split off. Returns false when the bridge
    /// can't be used that way.
    pub(crate) fn join_scaffold(
        &mut self,
        head_t: ContigId,
        tip: Placed,
        key: BridgeKey,
        to_rear: bool,
        second_dir: i8,
    ) -> bool {
        let trans = match self.bridges.get(&key) {
            Some(bridge) => bridge.trans(),
            None => return false,
        };
        let f = key.second;
        let head_f = self.contigs[f].head;

        if self.scaffolds[head_t].is_end(tip.id) == 0 {
            return false;
        }
        let index = match self.scaffolds[head_f].index_of(f) {
            Some(ix) => ix,
            None => return false,
        };

        if head_f == head_t {
            return match (second_dir, to_rear) {
                (-1, false) => {
                    self.close_at_rear(head_f, index, key);
                    true
                }
                (1, true) => {
                    self.close_at_front(head_f, index, key);
                    true
                }
                _ => false,
            };
        }

        let rev = self.scaffolds[head_f].contigs()[index].vector.reverse();
        let reroot = |v: ScaffoldVector| {
            ScaffoldVector::compose(
                tip.vector,
                ScaffoldVector::compose(trans, ScaffoldVector::compose(rev, v)),
            )
        };

        let mut scf_t = std::mem::take(&mut self.scaffolds[head_t]);
        let mut scf_f = std::mem::take(&mut self.scaffolds[head_f]);
        debug!(
            "Joining scaffold {} ({} contigs) onto {} ({} contigs) through {}",
            head_f,
            scf_f.len(),
            head_t,
            scf_t.len(),
            key
        );

        // `brg` always runs from the contig being added to the one
        // added before it.
        let attach = |scf_t: &mut Scaffold, mut ctg: Placed, brg: BridgeKey, v: ScaffoldVector| {
            ctg.vector = reroot(v);
            if to_rear {
                scf_t.add_rear(ctg, brg.twin());
            } else {
                scf_t.add_front(ctg, brg);
            }
        };

        match second_dir {
            -1 => {
                // F and everything before it, walking backwards
                let mut count = index;
                let mut ctg = scf_f.remove_contig(index);
                let mut brg = Some(key.twin());
                while let (Some(placed), Some(b)) = (ctg, brg) {
                    attach(&mut scf_t, placed, b, placed.vector);
                    if count < 1 {
                        break;
                    }
                    count -= 1;
                    ctg = scf_f.remove_contig(count);
                    brg = scf_f.remove_bridge(count);
                }

                if scf_f.is_closed() && !scf_f.is_empty() {
                    // the rest of the circle, from the old last contig
                    let mut count = scf_f.len() - 1;
                    let mut ctg = scf_f.remove_contig(count);
                    let mut brg = scf_f.close_bridge();
                    while let (Some(placed), Some(b)) = (ctg, brg) {
                        let v = scf_f.rotate(placed.vector, false);
                        attach(&mut scf_t, placed, b, v);
                        if count < 1 {
                            break;
                        }
                        brg = scf_f.remove_bridge(count);
                        count -= 1;
                        ctg = scf_f.remove_contig(count);
                    }
                } else if !scf_f.is_empty() {
                    // bridge from F into the remainder
                    scf_f.remove_bridge(0);
                }
            }
            1 => {
                // F and everything after it
                let mut ctg = scf_f.remove_contig(index);
                let mut brg = Some(key);
                while let (Some(placed), Some(b)) = (ctg, brg) {
                    attach(&mut scf_t, placed, b.twin(), placed.vector);
                    if scf_f.len() == index {
                        break;
                    }
                    ctg = scf_f.remove_contig(index);
                    brg = scf_f.remove_bridge(index);
                }

                if scf_f.is_closed() && !scf_f.is_empty() {
                    let mut ctg = scf_f.remove_contig(0);
                    let mut brg = scf_f.close_bridge();
                    while let (Some(placed), Some(b)) = (ctg, brg) {
                        let v = scf_f.rotate(placed.vector, true);
                        attach(&mut scf_t, placed, b.twin(), v);
                        if scf_f.is_empty() {
                            break;
                        }
                        brg = scf_f.remove_bridge(0);
                        ctg = scf_f.remove_contig(0);
                    }
                } else if !scf_f.is_empty() {
                    let last = scf_f.bridges().len() - 1;
                    scf_f.remove_bridge(last);
                }
            }
            _ => {
                self.scaffolds[head_t] = scf_t;
                self.scaffolds[head_f] = scf_f;
                return false;
            }
        }

        self.scaffolds[head_t] = scf_t;
        self.settle(head_t);
        self.trim(head_t);

        if scf_f.is_empty() {
            return true;
        }
        // what is left of F is linear now
        scf_f.take_close();
        if scf_f.len() <= 1 {
            scf_f.clear_bridges();
        }
        let dropped = self.trim_scaffold(&mut scf_f);
        let new_head = if second_dir < 0 {
            scf_f.first().map(|p| p.id)
        } else {
            scf_f.last().map(|p| p.id)
        };
        if let Some(id) = new_head {
            self.change_head(scf_f, id);
        }
        self.restore_singletons(dropped);
        true
    }

    /// T is the first contig of a scaffold that also holds F. Split off
    /// everything after F, then close the scaffold from F back to T.
    fn close_at_rear(&mut self, head: ContigId, index: usize, key: BridgeKey) {
        let mut scf = std::mem::take(&mut self.scaffolds[head]);
        if index + 1 < scf.len() {
            let marker = self
                .nearest_marker(&scf, index, true)
                .map(|ix| scf.contigs()[ix].id);
            if let Some(first) = scf.remove_contig(index + 1) {
                scf.remove_bridge(index);
                let mut split = Scaffold::starting_with(head, first);
                while scf.len() > index + 1 {
                    match (scf.remove_contig(index + 1), scf.remove_bridge(index)) {
                        (Some(ctg), Some(brg)) => split.add_rear(ctg, brg),
                        _ => break,
                    }
                }
                self.detach(split, marker);
            }
        }
        self.scaffolds[head] = scf;
        self.set_close_bridge(head, key.twin());
        let scf = std::mem::take(&mut self.scaffolds[head]);
        self.change_head(scf, key.second);
    }

    /// T is the last contig of a scaffold that also holds F. Split off
    /// everything before F, then close the scaffold from T to F.
    fn close_at_front(&mut self, head: ContigId, index: usize, key: BridgeKey) {
        let mut scf = std::mem::take(&mut self.scaffolds[head]);
        if index > 0 {
            let marker = self
                .nearest_marker(&scf, index, false)
                .map(|ix| scf.contigs()[ix].id);
            let mut count = index - 1;
            if let Some(first) = scf.remove_contig(count) {
                scf.remove_bridge(count);
                let mut split = Scaffold::starting_with(head, first);
                while count >= 1 {
                    count -= 1;
                    match (scf.remove_contig(count), scf.remove_bridge(count)) {
                        (Some(ctg), Some(brg)) => split.add_front(ctg, brg),
                        _ => break,
                    }
                }
                self.detach(split, marker);
            }
        }
        self.scaffolds[head] = scf;
        self.set_close_bridge(head, key);
        let scf = std::mem::take(&mut self.scaffolds[head]);
        self.change_head(scf, key.second);
    }

    /// Turn a piece split off a scaffold into a scaffold of its own.
    fn detach(&mut self, mut split: Scaffold, marker: Option<ContigId>) {
        let dropped = self.trim_scaffold(&mut split);
        match marker {
            Some(id) if split.index_of(id).is_some() => self.change_head(split, id),
            _ => self.rehome(split),
        }
        self.restore_singletons(dropped);
    }

    /// Re-root `scf` on `new_head`, which must be one of its non-repeat
    /// members, and store it in that contig's slot. The old slot must
    /// already be vacated. A scaffold that can't take the new head is
    /// handed to `rehome`.
    pub(crate) fn change_head(&mut self, mut scf: Scaffold, new_head: ContigId) {
        let placed = match scf.index_of(new_head).and_then(|ix| scf.get(ix)) {
            Some(placed) if !placed.cloned && !self.is_repeat(new_head) => *placed,
            _ => {
                self.rehome(scf);
                return;
            }
        };

        let rev = placed.vector.reverse();
        if placed.direction() < 0 {
            scf.reverse_order();
        }
        scf.reframe(rev);
        scf.set_head(new_head);
        debug!("Scaffold of {} contigs now headed by {}", scf.len(), new_head);
        self.scaffolds[new_head] = scf;
        self.settle(new_head);
    }

    /// Find any member able to head `scf`. Without one the scaffold is
    /// dissolved back into singletons.
    pub(crate) fn rehome(&mut self, scf: Scaffold) {
        let head = scf
            .contigs()
            .iter()
            .find(|p| !p.cloned && !self.is_repeat(p.id))
            .map(|p| p.id);
        match head {
            Some(id) => self.change_head(scf, id),
            None => {
                if !scf.is_empty() {
                    debug!("Dissolving a scaffold of {} repeats", scf.len());
                }
                self.restore_singletons(scf.contigs().iter().copied());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScaffoldConfig;
    use crate::scaffold_graph::tests::{contig, read_of, whole};

    /// ctg0 and ctg1 joined on a read, ctg2 and ctg3 on another, and a
    /// third read bridging ctg1 to ctg2.
    fn four_contigs() -> ScaffoldGraph {
        let contigs = (0..4).map(|i| contig(i, 10000, 20.0)).collect();
        let mut graph = ScaffoldGraph::new(contigs, ScaffoldConfig::default());
        let pairs = [(0, 1), (2, 3), (1, 2)];
        for (n, &(x, y)) in pairs.iter().enumerate() {
            let a = whole(&graph, 20100, x, 1, true);
            let b = whole(&graph, 20100, y, 10101, true);
            graph.ingest_read(read_of(&format!("r{}", n), vec![a, b])).unwrap();
        }
        graph
    }

    fn link(graph: &mut ScaffoldGraph, head: ContigId, key: BridgeKey) {
        let trans = graph.bridge(&key).unwrap().trans();
        let last = *graph.scaffolds[head].last().unwrap();
        let placed = Placed::new(key.second, ScaffoldVector::compose(last.vector, trans));
        graph.scaffolds[head].add_rear(placed, key);
        graph.scaffolds[key.second] = Scaffold::default();
        graph.settle(head);
        graph.set_contig_scores(key);
    }

    #[test]
    fn join_two_scaffolds() {
        let mut graph = four_contigs();
        link(&mut graph, 0, BridgeKey::new(0, 1, 0));
        link(&mut graph, 2, BridgeKey::new(2, 3, 0));
        assert_eq!(graph.contigs[3].head, 2);

        let tip = *graph.scaffolds[0].last().unwrap();
        let key = BridgeKey::new(1, 2, 0);
        // ctg3 seen from ctg2, then from ctg1 through the bridge, then
        // from the head
        let (old_c, old_d) = (graph.contigs[2].vector, graph.contigs[3].vector);
        let d_from_c = ScaffoldVector::compose(old_d, old_c.reverse());
        let d_from_b = ScaffoldVector::compose(d_from_c, graph.bridge(&key).unwrap().trans());
        let expected = ScaffoldVector::compose(d_from_b, tip.vector);
        assert_eq!(graph.extend_direction(&tip, key), 1);
        assert!(graph.join_scaffold(0, tip, key, true, 1));

        let scf = graph.scaffold(0).unwrap();
        assert!(scf.is_consistent());
        let ids: Vec<_> = scf.contigs().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert!(graph.scaffold(2).is_none());
        assert_eq!(graph.contigs[3].head, 0);
        assert_eq!(graph.contigs[3].vector, expected);
        assert_eq!(expected, ScaffoldVector::new(30300, 1));
    }

    #[test]
    fn change_head_reverses_when_needed() {
        let mut graph = four_contigs();
        // ctg1 placed reverse complemented after ctg0
        let mut scf = std::mem::take(&mut graph.scaffolds[0]);
        scf.add_rear(Placed::new(1, ScaffoldVector::new(20100, -1)), BridgeKey::new(0, 1, 0));
        graph.scaffolds[1] = Scaffold::default();
        graph.change_head(scf, 1);

        assert!(graph.scaffold(0).is_none());
        let scf = graph.scaffold(1).unwrap();
        assert!(scf.is_consistent());
        assert_eq!(scf.bridges()[0], BridgeKey::new(1, 0, 0));
        assert_eq!(scf.first().unwrap().id, 1);
        assert_eq!(scf.first().unwrap().vector, ScaffoldVector::identity());
        assert_eq!(scf.last().unwrap().vector, ScaffoldVector::new(20100, -1));
        assert_eq!(graph.contigs[0].head, 1);
        assert_eq!(graph.contigs[0].vector, ScaffoldVector::new(20100, -1));
    }

    #[test]
    fn repeats_cannot_head() {
        let contigs = vec![contig(0, 150, 20.0), contig(1, 150, 20.0)];
        let mut graph = ScaffoldGraph::new(contigs, ScaffoldConfig::default());
        let scf = std::mem::take(&mut graph.scaffolds[0]);
        graph.change_head(scf, 0);
        // dissolved back into its singleton
        assert_eq!(graph.scaffold(0).unwrap().len(), 1);
        assert_eq!(graph.contigs[0].head, 0);
    }

    #[test]
    fn markers_skip_repeats_and_wrap() {
        let contigs = vec![
            contig(0, 10000, 20.0),
            contig(1, 100, 20.0),
            contig(2, 10000, 20.0),
        ];
        let graph = ScaffoldGraph::new(contigs, ScaffoldConfig::default());
        let mut scf = Scaffold::singleton(0);
        scf.add_rear(Placed::clone_of(1, ScaffoldVector::new(10100, 1)), BridgeKey::new(0, 1, 0));
        scf.add_rear(Placed::new(2, ScaffoldVector::new(10300, 1)), BridgeKey::new(1, 2, 0));

        assert_eq!(graph.nearest_marker(&scf, 0, true), Some(2));
        assert_eq!(graph.nearest_marker(&scf, 2, false), Some(0));
        assert_eq!(graph.nearest_marker(&scf, 2, true), None);
        assert_eq!(graph.nearest_marker(&scf, 1, true), None);

        scf.set_close_bridge(BridgeKey::new(2, 0, 0), ScaffoldVector::new(-10400, 1));
        assert_eq!(graph.nearest_marker(&scf, 2, true), Some(0));
    }
}
