//! Viewport calculation
//!
//! Derives a session's sight radius, view center, and view box from the
//! cells it owns. Ownership lists may contain ids whose cells were destroyed
//! this tick and not yet pruned; such entries are skipped, never errors.

use crate::game::world::{CellId, WorldState};
use crate::util::rect::Rect;
use crate::util::vec2::Vec2;

/// Sight radius: the configured base plus each owned cell's display size
/// scaled by the view coefficient. With no (live) cells this is exactly the
/// base value.
pub fn sight_radius(cells: &[CellId], world: &WorldState, base: f32, scale: f32) -> f32 {
    let mut range = base;
    for id in cells {
        if let Some(cell) = world.cell(*id) {
            range += cell.radius() * scale;
        }
    }
    range
}

/// Centroid of the live owned cells.
///
/// When no owned cell resolves (empty list, or every entry stale) the view
/// must not move: the previous center is returned unchanged.
pub fn view_center(cells: &[CellId], world: &WorldState, previous: Vec2) -> Vec2 {
    let mut sum = Vec2::ZERO;
    let mut live = 0u32;
    for id in cells {
        if let Some(cell) = world.cell(*id) {
            sum += cell.position;
            live += 1;
        }
    }
    if live == 0 {
        return previous;
    }
    sum * (1.0 / live as f32)
}

/// Square view box spanning `center +/- radius` on both axes
pub fn view_box(center: Vec2, radius: f32) -> Rect {
    Rect::from_center_half_extent(center, radius)
}
