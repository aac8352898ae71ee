//! Storage for the trapezoidal map and its search structure.
//!
//! Trapezoids and search nodes reference each other in both directions and
//! the search structure becomes a proper DAG once trapezoids merge, so
//! neither side can own the other. Both live in slot arenas addressed by
//! plain index handles; releasing a slot pushes it on a free list and the
//! whole map tears down by clearing the arenas.

use core::fmt;
use core::ops::{Index, IndexMut};

use crate::{PointId, SegmentId, Side};

/// Handle to a trapezoid in the triangulator's trapezoid arena.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct TrapezoidId(pub u32);

impl TrapezoidId {
    pub fn to_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TrapezoidId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "t#{}", self.0)
    }
}

/// Handle to a node of the search structure.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn to_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "n#{}", self.0)
    }
}

/// What a search node discriminates on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Branch on the vertical order relative to a point: below goes left,
    /// above goes right.
    Point(PointId),
    /// Branch on the side of a segment's line: left side goes left.
    Segment(SegmentId),
    /// Leaf: the query is inside this trapezoid.
    Trapezoid(TrapezoidId),
}

/// A node of the point-location structure.
///
/// The structure starts out as a binary tree; trapezoid merges during
/// segment threading redirect child links so that a node can end up with
/// several parents. `parent` keeps the link the node was created with, which
/// is the one the interior classification walks.
#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
}

/// A region of the trapezoidal decomposition.
///
/// Bounded above and below by the horizontal lines through `upper_point` and
/// `lower_point`, and laterally by `left_segment` and `right_segment`. A
/// `None` bound means the trapezoid extends to infinity in that direction.
#[derive(Clone, Debug)]
pub struct Trapezoid {
    pub upper_point: Option<PointId>,
    pub lower_point: Option<PointId>,
    pub left_segment: Option<SegmentId>,
    pub right_segment: Option<SegmentId>,

    /// Up to three neighbors sharing this trapezoid's upper boundary. The
    /// third only exists transiently while a segment is being threaded
    /// through; `upper3_side` records which lateral chain it belongs to.
    pub upper1: Option<TrapezoidId>,
    pub upper2: Option<TrapezoidId>,
    pub upper3: Option<TrapezoidId>,
    pub upper3_side: Side,

    /// Up to two neighbors sharing this trapezoid's lower boundary. When
    /// both exist they are split by a common vertex: `lower1.upper_point ==
    /// lower2.upper_point`.
    pub lower1: Option<TrapezoidId>,
    pub lower2: Option<TrapezoidId>,

    /// The leaf node representing this trapezoid.
    pub node: NodeId,

    /// Set by the interior classification pass.
    pub inside: bool,
    /// Per-side flags used by the monotone-chain walk.
    pub visited: [bool; 2],
    /// True when the diagonal from `upper_point` to `lower_point` lies in
    /// the polygon interior (neither bounding segment spans both points).
    pub has_diagonal: bool,

    /// Creation-ordered id, for display and debugging.
    pub number: u32,
}

impl Trapezoid {
    fn new(number: u32) -> Self {
        Trapezoid {
            upper_point: None,
            lower_point: None,
            left_segment: None,
            right_segment: None,
            upper1: None,
            upper2: None,
            upper3: None,
            upper3_side: Side::Left,
            lower1: None,
            lower2: None,
            node: NodeId(u32::MAX),
            inside: false,
            visited: [false, false],
            has_diagonal: false,
            number,
        }
    }
}

pub(crate) struct TrapezoidStore {
    slots: Vec<Option<Trapezoid>>,
    free: Vec<u32>,
    next_number: u32,
}

impl TrapezoidStore {
    pub fn new() -> Self {
        TrapezoidStore {
            slots: Vec::new(),
            free: Vec::new(),
            next_number: 1,
        }
    }

    pub fn allocate(&mut self) -> TrapezoidId {
        let trapezoid = Trapezoid::new(self.next_number);
        self.next_number += 1;

        match self.free.pop() {
            Some(index) => {
                debug_assert!(self.slots[index as usize].is_none());
                self.slots[index as usize] = Some(trapezoid);
                TrapezoidId(index)
            }
            None => {
                self.slots.push(Some(trapezoid));
                TrapezoidId(self.slots.len() as u32 - 1)
            }
        }
    }

    pub fn release(&mut self, id: TrapezoidId) {
        debug_assert!(self.slots[id.to_usize()].is_some());
        self.slots[id.to_usize()] = None;
        self.free.push(id.0);
    }

    /// Number of slots, live or not. The valid range of handle indices.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, index: usize) -> Option<&Trapezoid> {
        self.slots[index].as_ref()
    }

    pub fn live(&self) -> impl Iterator<Item = (TrapezoidId, &Trapezoid)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|t| (TrapezoidId(i as u32), t)))
    }

    pub fn live_mut(&mut self) -> impl Iterator<Item = (TrapezoidId, &mut Trapezoid)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|t| (TrapezoidId(i as u32), t)))
    }

    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.next_number = 1;
    }
}

impl Index<TrapezoidId> for TrapezoidStore {
    type Output = Trapezoid;
    fn index(&self, id: TrapezoidId) -> &Trapezoid {
        self.slots[id.to_usize()]
            .as_ref()
            .expect("stale trapezoid handle")
    }
}

impl IndexMut<TrapezoidId> for TrapezoidStore {
    fn index_mut(&mut self, id: TrapezoidId) -> &mut Trapezoid {
        self.slots[id.to_usize()]
            .as_mut()
            .expect("stale trapezoid handle")
    }
}

pub(crate) struct NodeStore {
    slots: Vec<Option<Node>>,
    free: Vec<u32>,
}

impl NodeStore {
    pub fn new() -> Self {
        NodeStore {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn allocate(&mut self, kind: NodeKind) -> NodeId {
        let node = Node {
            kind,
            parent: None,
            left: None,
            right: None,
        };

        match self.free.pop() {
            Some(index) => {
                debug_assert!(self.slots[index as usize].is_none());
                self.slots[index as usize] = Some(node);
                NodeId(index)
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() as u32 - 1)
            }
        }
    }

    pub fn release(&mut self, id: NodeId) {
        debug_assert!(self.slots[id.to_usize()].is_some());
        self.slots[id.to_usize()] = None;
        self.free.push(id.0);
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

impl Index<NodeId> for NodeStore {
    type Output = Node;
    fn index(&self, id: NodeId) -> &Node {
        self.slots[id.to_usize()].as_ref().expect("stale node handle")
    }
}

impl IndexMut<NodeId> for NodeStore {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        self.slots[id.to_usize()].as_mut().expect("stale node handle")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_reuse() {
        let mut store = TrapezoidStore::new();
        let a = store.allocate();
        let b = store.allocate();
        assert_eq!(store.live_count(), 2);
        assert_eq!(store[a].number, 1);
        assert_eq!(store[b].number, 2);

        store.release(a);
        assert_eq!(store.live_count(), 1);

        // The freed slot is reused, with a fresh number.
        let c = store.allocate();
        assert_eq!(c, a);
        assert_eq!(store[c].number, 3);
        assert_eq!(store.slot_count(), 2);
    }
}
