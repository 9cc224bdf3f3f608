//! World entity state
//!
//! The cell arena: every live entity (player cells, food) lives in a slot
//! vector owned by [`WorldState`]. Despawning leaves a `None` hole so that
//! per-client visibility scans running later in the same tick tolerate
//! concurrent removals by the simulation; holes are reused by later spawns.
//!
//! The simulation is the single writer: it holds `&mut WorldState` between
//! ticks, while session updates only ever see `&WorldState`.

use hashbrown::HashMap;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::constants::mass_to_radius;
use crate::util::rect::Rect;
use crate::util::vec2::Vec2;

/// Unique player identifier
pub type PlayerId = Uuid;

/// Unique world cell identifier
pub type CellId = u64;

/// Team identifier (team game modes)
pub type TeamId = u8;

/// RGB display color
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Random saturated color: one channel maxed, one near zero, one random
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut channels: [u8; 3] = [0xFF, 0x07, rng.gen_range(0..=0xFF)];
        channels.shuffle(rng);
        Self {
            r: channels[0],
            g: channels[1],
            b: channels[2],
        }
    }
}

/// What a cell represents in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellKind {
    /// A piece of a player's body
    Player,
    /// A consumable food pellet
    Food,
}

/// A single world entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    /// Owning session for player cells, `None` for food
    pub owner: Option<PlayerId>,
    pub kind: CellKind,
    pub position: Vec2,
    pub mass: f32,
    pub color: Color,
}

impl Cell {
    /// Display size derived from mass
    pub fn radius(&self) -> f32 {
        mass_to_radius(self.mass)
    }

    /// Containment test against a view box
    #[inline]
    pub fn visible_within(&self, view: &Rect) -> bool {
        view.contains(self.position)
    }
}

/// The arena's entity collection and bounds.
///
/// Read-only for session updates within a tick; mutated only by the
/// simulation (and the lifecycle wrappers in `GameSession`) between ticks.
#[derive(Debug, Default)]
pub struct WorldState {
    slots: Vec<Option<Cell>>,
    index: HashMap<CellId, usize>,
    free: Vec<usize>,
    next_id: CellId,
    border: Rect,
    tick: u64,
}

impl WorldState {
    pub fn new(border: Rect) -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
            free: Vec::new(),
            next_id: 1,
            border,
            tick: 0,
        }
    }

    pub fn border(&self) -> &Rect {
        &self.border
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    /// Number of live cells
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn spawn(
        &mut self,
        kind: CellKind,
        owner: Option<PlayerId>,
        position: Vec2,
        mass: f32,
        color: Color,
    ) -> CellId {
        let id = self.next_id;
        self.next_id += 1;
        let cell = Cell {
            id,
            owner,
            kind,
            position,
            mass,
            color,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(cell);
                slot
            }
            None => {
                self.slots.push(Some(cell));
                self.slots.len() - 1
            }
        };
        self.index.insert(id, slot);
        id
    }

    /// Remove a cell, leaving a hole in its slot
    pub fn despawn(&mut self, id: CellId) -> Option<Cell> {
        let slot = self.index.remove(&id)?;
        let cell = self.slots[slot].take();
        self.free.push(slot);
        cell
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.index.get(&id).and_then(|&slot| self.slots[slot].as_ref())
    }

    pub fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        let slot = *self.index.get(&id)?;
        self.slots[slot].as_mut()
    }

    /// Iterator over live cells
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.slots.iter().flatten()
    }

    /// Raw slot view including holes left by despawns
    pub fn slots(&self) -> &[Option<Cell>] {
        &self.slots
    }
}
