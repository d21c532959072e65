//! An ordered chain of placed contigs and the bridges joining them.

use std::collections::VecDeque;

use crate::bridge::BridgeKey;
use crate::contig::ContigId;
use crate::vector::ScaffoldVector;

/// A contig's place in a scaffold.
///
/// Repeat contigs may sit in several scaffolds at once; every such use
/// is a clone with its own vector, and the registry entry is left
/// alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placed {
    pub id: ContigId,
    /// Position relative to the scaffold's head contig.
    pub vector: ScaffoldVector,
    pub cloned: bool,
}

impl Placed {
    #[inline]
    pub fn new(id: ContigId, vector: ScaffoldVector) -> Self {
        Placed {
            id,
            vector,
            cloned: false,
        }
    }

    #[inline]
    pub fn clone_of(id: ContigId, vector: ScaffoldVector) -> Self {
        Placed {
            id,
            vector,
            cloned: true,
        }
    }

    #[inline]
    pub fn direction(&self) -> i8 {
        self.vector.direction()
    }
}

/// `bridges[i]` runs from `contigs[i]` to `contigs[i + 1]`, so a
/// non-empty scaffold always holds one bridge fewer than contigs. A
/// closed scaffold also has a bridge from its last contig back to its
/// first one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scaffold {
    head: ContigId,
    contigs: VecDeque<Placed>,
    bridges: VecDeque<BridgeKey>,
    close_bridge: Option<BridgeKey>,
    circle: Option<ScaffoldVector>,
}

impl Scaffold {
    /// A scaffold made of one contig, which is also its head.
    pub fn singleton(id: ContigId) -> Self {
        Scaffold {
            head: id,
            contigs: std::iter::once(Placed::new(id, ScaffoldVector::identity()))
                .collect(),
            ..Default::default()
        }
    }

    /// A scaffold starting from an already placed contig, keeping the
    /// vectors relative to `head`.
    pub(crate) fn starting_with(head: ContigId, first: Placed) -> Self {
        Scaffold {
            head,
            contigs: std::iter::once(first).collect(),
            ..Default::default()
        }
    }

    #[inline]
    pub fn head(&self) -> ContigId {
        self.head
    }

    pub(crate) fn set_head(&mut self, head: ContigId) {
        self.head = head;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }

    pub fn contigs(&self) -> &VecDeque<Placed> {
        &self.contigs
    }

    pub fn bridges(&self) -> &VecDeque<BridgeKey> {
        &self.bridges
    }

    #[inline]
    pub fn first(&self) -> Option<&Placed> {
        self.contigs.front()
    }

    #[inline]
    pub fn last(&self) -> Option<&Placed> {
        self.contigs.back()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Placed> {
        self.contigs.get(index)
    }

    /// Position of the registry copy of `id`, falling back to the first
    /// clone.
    pub fn index_of(&self, id: ContigId) -> Option<usize> {
        self.contigs
            .iter()
            .position(|p| p.id == id && !p.cloned)
            .or_else(|| self.contigs.iter().position(|p| p.id == id))
    }

    /// -1 if `id` is the last contig, 1 if it is the first, 0
    /// otherwise.
    pub fn is_end(&self, id: ContigId) -> i8 {
        match (self.first(), self.last()) {
            (_, Some(last)) if last.id == id => -1,
            (Some(first), _) if first.id == id => 1,
            _ => 0,
        }
    }

    #[inline]
    pub fn close_bridge(&self) -> Option<BridgeKey> {
        self.close_bridge
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.close_bridge.is_some()
    }

    /// Displacement from the first contig around the circle back to
    /// itself. Always has a non-negative magnitude.
    #[inline]
    pub fn circle(&self) -> Option<ScaffoldVector> {
        self.circle
    }

    /// Extend on the left. `bridge` must run from `contig` to the
    /// current first contig.
    pub fn add_front(&mut self, contig: Placed, bridge: BridgeKey) {
        debug_assert_eq!(bridge.first, contig.id);
        debug_assert_eq!(Some(bridge.second), self.first().map(|p| p.id));
        self.contigs.push_front(contig);
        self.bridges.push_front(bridge);
    }

    /// Extend on the right. `bridge` must run from the current last
    /// contig to `contig`.
    pub fn add_rear(&mut self, contig: Placed, bridge: BridgeKey) {
        debug_assert_eq!(bridge.second, contig.id);
        debug_assert_eq!(Some(bridge.first), self.last().map(|p| p.id));
        self.contigs.push_back(contig);
        self.bridges.push_back(bridge);
    }

    /// Remove the first contig along with the bridge leaving it.
    pub fn pop_front(&mut self) -> Option<(Placed, Option<BridgeKey>)> {
        let contig = self.contigs.pop_front()?;
        let bridge = if self.contigs.is_empty() {
            None
        } else {
            self.bridges.pop_front()
        };
        Some((contig, bridge))
    }

    /// Remove the last contig along with the bridge reaching it.
    pub fn pop_back(&mut self) -> Option<(Placed, Option<BridgeKey>)> {
        let contig = self.contigs.pop_back()?;
        let bridge = if self.contigs.is_empty() {
            None
        } else {
            self.bridges.pop_back()
        };
        Some((contig, bridge))
    }

    // The following two break the contig/bridge pairing and are only
    // used while splitting or merging scaffolds.

    pub(crate) fn remove_contig(&mut self, index: usize) -> Option<Placed> {
        self.contigs.remove(index)
    }

    pub(crate) fn remove_bridge(&mut self, index: usize) -> Option<BridgeKey> {
        self.bridges.remove(index)
    }

    pub(crate) fn clear_bridges(&mut self) {
        self.bridges.clear();
    }

    /// Close the scaffold with `bridge`, running from the last contig
    /// to the first, where `trans` is the bridge's vector.
    pub(crate) fn set_close_bridge(&mut self, bridge: BridgeKey, trans: ScaffoldVector) {
        let (first, last) = match (self.first(), self.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return,
        };
        debug_assert_eq!(bridge.first, last.id);
        let first_to_last = ScaffoldVector::compose(first.vector.reverse(), last.vector);
        let last_to_first = if first.id == bridge.first {
            trans.reverse()
        } else {
            trans
        };
        let mut circle = ScaffoldVector::compose(first_to_last, last_to_first);
        circle.set_magnitude(circle.magnitude().abs());
        self.close_bridge = Some(bridge);
        self.circle = Some(circle);
    }

    pub(crate) fn take_close(&mut self) -> Option<(BridgeKey, ScaffoldVector)> {
        let bridge = self.close_bridge.take()?;
        let circle = self.circle.take()?;
        Some((bridge, circle))
    }

    /// Shift a member's vector by one turn around the circle, forward
    /// or backward.
    pub fn rotate(&self, vector: ScaffoldVector, forward: bool) -> ScaffoldVector {
        let circle = match self.circle {
            Some(circle) => circle,
            None => return vector,
        };
        if forward && vector.is_forward() {
            ScaffoldVector::compose(vector, circle)
        } else {
            ScaffoldVector::compose(vector, circle.reverse())
        }
    }

    /// Re-express every member relative to a new frame, where `rev`
    /// maps the new frame onto the old one.
    pub(crate) fn reframe(&mut self, rev: ScaffoldVector) {
        for placed in self.contigs.iter_mut() {
            placed.vector = ScaffoldVector::compose(rev, placed.vector);
        }
    }

    /// Reverse the member order, turning every bridge around with
    /// `twin`.
    pub(crate) fn reverse_order(&mut self) {
        let contigs: VecDeque<_> = self.contigs.drain(..).rev().collect();
        let bridges: VecDeque<_> = self.bridges.drain(..).rev().map(|b| b.twin()).collect();
        self.contigs = contigs;
        self.bridges = bridges;
        self.close_bridge = self.close_bridge.map(|b| b.twin());
    }

    /// Span of the scaffold: the circle for a closed scaffold, the
    /// distance between the outer ends otherwise. `len_of` gives a
    /// contig's length.
    pub fn length<F>(&self, len_of: F) -> i64
    where
        F: Fn(ContigId) -> usize,
    {
        if let Some(circle) = self.circle {
            return circle.magnitude().abs();
        }
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => {
                last.vector.right_most(len_of(last.id))
                    - first.vector.left_most(len_of(first.id))
            }
            _ => 0,
        }
    }

    /// Whether the contig/bridge pairing holds.
    pub fn is_consistent(&self) -> bool {
        if self.contigs.is_empty() {
            return self.bridges.is_empty();
        }
        self.contigs.len() == self.bridges.len() + 1
            && self.bridges.iter().enumerate().all(|(i, b)| {
                b.first == self.contigs[i].id && b.second == self.contigs[i + 1].id
            })
    }
}
