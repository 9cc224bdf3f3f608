//! Spectator camera
//!
//! A spectating session borrows the current leader's visible set instead of
//! computing its own, and receives a camera-position message whose zoom pulls
//! back as the leader grows.

use crate::game::constants::camera;
use crate::game::world::PlayerId;
use crate::net::visibility::VisibleSet;
use crate::util::vec2::Vec2;

/// The followed session's state, captured once per tick after that session's
/// own update so spectators see exactly what the leader sees this tick.
#[derive(Debug, Clone)]
pub struct SpectateFrame {
    pub target: PlayerId,
    pub center: Vec2,
    pub score: f32,
    pub visible: VisibleSet,
}

/// Camera zoom for a followed score.
///
/// `min(ZOOM_BASE / sqrt(SCORE_SCALE * score), 1)^ZOOM_EXPONENT * ZOOM_CAP`.
/// A zero score divides through infinity into the cap, so the result is
/// always in (0, ZOOM_CAP] and non-increasing in score.
pub fn spectator_zoom(score: f32) -> f32 {
    let focus = (camera::SCORE_SCALE * score).sqrt();
    (camera::ZOOM_BASE / focus).min(1.0).powf(camera::ZOOM_EXPONENT) * camera::ZOOM_CAP
}
