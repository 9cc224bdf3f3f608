//! Visibility collection and reconciliation
//!
//! Recomputation is a full linear scan of the world by design: it runs on
//! the view-refresh cadence, not every tick, so O(world size) per refresh
//! buys a much simpler engine than incremental spatial tracking.

use hashbrown::HashSet;

use crate::game::world::{CellId, WorldState};
use crate::util::rect::Rect;

/// The set of cell ids a session is currently allowed to know about.
///
/// Order-insensitive; the previous tick's set doubles as the baseline for
/// destroy-queue reconciliation, so collection always builds a fresh set
/// instead of mutating in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibleSet {
    ids: HashSet<CellId>,
}

impl VisibleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: HashSet::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: CellId) -> bool {
        self.ids.contains(&id)
    }

    pub fn insert(&mut self, id: CellId) -> bool {
        self.ids.insert(id)
    }

    /// Remove an id; a miss is a no-op (the cell may already have left view
    /// through a normal refresh)
    pub fn remove(&mut self, id: CellId) -> bool {
        self.ids.remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = CellId> + '_ {
        self.ids.iter().copied()
    }

    /// Reconcile this (older) set against a fresh one
    pub fn diff(&self, newer: &VisibleSet) -> VisibleDiff {
        VisibleDiff {
            entered: newer.ids.difference(&self.ids).copied().collect(),
            left: self.ids.difference(&newer.ids).copied().collect(),
        }
    }
}

impl FromIterator<CellId> for VisibleSet {
    fn from_iter<I: IntoIterator<Item = CellId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// Ids that appeared in / disappeared from view between two collections
#[derive(Debug, Clone, Default)]
pub struct VisibleDiff {
    pub entered: Vec<CellId>,
    pub left: Vec<CellId>,
}

/// Collect every world cell whose containment test passes against the view
/// box. Slots holding despawn holes are skipped; the result is always a
/// fresh set.
pub fn collect_visible(view: &Rect, world: &WorldState) -> VisibleSet {
    let mut out = VisibleSet::with_capacity(world.len());
    for cell in world.slots().iter().flatten() {
        if cell.visible_within(view) {
            out.insert(cell.id);
        }
    }
    out
}
