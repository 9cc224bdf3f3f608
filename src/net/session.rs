//! Per-player session state and the per-tick update entry point
//!
//! A `PlayerSession` owns everything the server tracks for one client: its
//! cells, cached score, latest input intent, the set of cells it currently
//! knows about, the queue of cells that must be reported gone, and the two
//! countdown timers that throttle view refreshes and leaderboard pushes.
//!
//! `update` runs once per tick for every online session and never blocks;
//! all outbound traffic goes through the session's fire-and-forget sink.

use std::sync::Arc;

use tracing::trace;

use crate::config::{ServerConfig, ViewTuning};
use crate::game::mode::LeaderboardView;
use crate::game::world::{CellId, Color, PlayerId, TeamId, WorldState};
use crate::net::protocol::{CellState, MessageSink, ServerMessage};
use crate::net::scheduler::Countdown;
use crate::net::spectate::{self, SpectateFrame};
use crate::net::viewport;
use crate::net::visibility::{self, VisibleSet};
use crate::util::rect::Rect;
use crate::util::vec2::Vec2;

pub struct PlayerSession {
    // identity
    id: PlayerId,
    name: String,
    team: TeamId,
    online: bool,
    spectate: bool,

    // ownership: cells belong to the simulation; this list may briefly hold
    // ids of cells destroyed this tick
    cells: Vec<CellId>,
    score: f32,

    // latest input intent, consumed by the external movement simulation
    mouse: Vec2,
    color: Color,

    // view state
    center: Vec2,
    sight_range: f32,
    view: Rect,
    visible: VisibleSet,
    destroy_queue: Vec<CellId>,

    // scheduling
    view_timer: Countdown,
    leaderboard_timer: Countdown,

    sink: Arc<dyn MessageSink>,
}

impl PlayerSession {
    /// Both timers start expired so the first tick performs a full view
    /// computation and leaderboard push.
    pub fn new(
        id: PlayerId,
        name: String,
        color: Color,
        sink: Arc<dyn MessageSink>,
        config: &ServerConfig,
    ) -> Self {
        Self {
            id,
            name,
            team: 0,
            online: true,
            spectate: false,
            cells: Vec::new(),
            score: 0.0,
            mouse: Vec2::ZERO,
            color,
            center: Vec2::ZERO,
            sight_range: 0.0,
            view: Rect::default(),
            visible: VisibleSet::new(),
            destroy_queue: Vec::new(),
            view_timer: Countdown::new(config.view_refresh_period),
            leaderboard_timer: Countdown::new(config.leaderboard_period),
            sink,
        }
    }

    // ------------------------------------------------------------------
    // Identity and flags
    // ------------------------------------------------------------------

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn team(&self) -> TeamId {
        self.team
    }

    pub fn set_team(&mut self, team: TeamId) {
        self.team = team;
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    pub fn is_spectating(&self) -> bool {
        self.spectate
    }

    pub fn set_spectate(&mut self, spectate: bool) {
        self.spectate = spectate;
    }

    // ------------------------------------------------------------------
    // Input and display
    // ------------------------------------------------------------------

    pub fn mouse_target(&self) -> Vec2 {
        self.mouse
    }

    /// Stored verbatim; the movement simulation interprets it
    pub fn set_mouse_target(&mut self, target: Vec2) {
        self.mouse = target;
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Copies the channel values into the existing color attribute
    pub fn set_color(&mut self, color: Color) {
        self.color.r = color.r;
        self.color.g = color.g;
        self.color.b = color.b;
    }

    // ------------------------------------------------------------------
    // Ownership and score
    // ------------------------------------------------------------------

    pub fn cell_ids(&self) -> &[CellId] {
        &self.cells
    }

    pub fn add_cell(&mut self, id: CellId) {
        self.cells.push(id);
    }

    pub fn remove_cell(&mut self, id: CellId) {
        self.cells.retain(|&c| c != id);
    }

    /// Cached score; equals the owned-cell mass sum as of the last recompute
    pub fn score(&self) -> f32 {
        self.score
    }

    /// With `recompute`, sums the masses of the owned cells that still
    /// resolve in the world (ids destroyed this tick are skipped) and caches
    /// the result. Otherwise returns the cached value unchanged.
    pub fn get_score(&mut self, world: &WorldState, recompute: bool) -> f32 {
        if recompute {
            let mut total = 0.0;
            for id in &self.cells {
                if let Some(cell) = world.cell(*id) {
                    total += cell.mass;
                }
            }
            self.score = total;
        }
        self.score
    }

    // ------------------------------------------------------------------
    // View state
    // ------------------------------------------------------------------

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn sight_range(&self) -> f32 {
        self.sight_range
    }

    pub fn view(&self) -> &Rect {
        &self.view
    }

    pub fn visible(&self) -> &VisibleSet {
        &self.visible
    }

    /// Mark a cell as gone; reported to the client on the next update.
    /// Ids already pending since the last flush are not queued twice.
    pub fn queue_destroy(&mut self, id: CellId) {
        if !self.destroy_queue.contains(&id) {
            self.destroy_queue.push(id);
        }
    }

    /// World bounds notification, sent once during session setup
    pub fn send_border(&self, border: &Rect) {
        self.sink.send(ServerMessage::Border { bounds: *border });
    }

    // ------------------------------------------------------------------
    // Per-tick update
    // ------------------------------------------------------------------

    /// Runs one tick for this session:
    ///
    /// 1. flush the destroy queue against the previous visible set,
    /// 2. refresh the visible set when the view timer expires (viewport path,
    ///    or the spectate frame when watching),
    /// 3. emit the cell delta (queued removals + current visible set),
    /// 4. emit the leaderboard when its timer expires.
    pub fn update(
        &mut self,
        world: &WorldState,
        leaderboard: &LeaderboardView,
        frame: Option<&SpectateFrame>,
        tuning: &ViewTuning,
    ) {
        // Snapshot before draining: the message must carry exactly what was
        // queued, whether or not each id was still visible.
        let removed = self.destroy_queue.clone();
        for id in &self.destroy_queue {
            self.visible.remove(*id);
        }

        if self.view_timer.fire() {
            self.visible = if self.spectate {
                self.spectate_view(frame)
            } else {
                self.viewport_view(world, tuning)
            };
        }

        let cells: Vec<CellState> = self
            .visible
            .iter()
            .filter_map(|id| world.cell(id).map(CellState::from_cell))
            .collect();
        self.sink.send(ServerMessage::CellUpdate { removed, cells });
        self.destroy_queue.clear();

        if self.leaderboard_timer.fire() {
            self.sink.send(ServerMessage::Leaderboard(leaderboard.clone()));
        }
    }

    /// Normal path: recompute sight range, center, and view box from the
    /// owned cells, then collect everything inside the box.
    fn viewport_view(&mut self, world: &WorldState, tuning: &ViewTuning) -> VisibleSet {
        self.sight_range =
            viewport::sight_radius(&self.cells, world, tuning.sight_base, tuning.sight_scale);
        self.center = viewport::view_center(&self.cells, world, self.center);
        self.view = viewport::view_box(self.center, self.sight_range);

        let fresh = visibility::collect_visible(&self.view, world);
        let diff = self.visible.diff(&fresh);
        trace!(
            player = %self.id,
            entered = diff.entered.len(),
            left = diff.left.len(),
            visible = fresh.len(),
            "view refreshed"
        );
        fresh
    }

    /// Spectate path: adopt the followed session's visible set and emit a
    /// camera placement. No leader means an empty view and no camera
    /// message; a valid state, not an error.
    fn spectate_view(&mut self, frame: Option<&SpectateFrame>) -> VisibleSet {
        let Some(frame) = frame else {
            return VisibleSet::new();
        };
        let zoom = spectate::spectator_zoom(frame.score);
        trace!(player = %self.id, target = %frame.target, zoom, "camera follows leader");
        self.sink.send(ServerMessage::CameraPosition {
            position: frame.center,
            zoom,
        });
        frame.visible.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::world::CellKind;
    use crate::net::protocol::BufferSink;

    fn test_world() -> WorldState {
        WorldState::new(Rect::new(0.0, 6000.0, 0.0, 6000.0))
    }

    fn test_session(config: &ServerConfig) -> (PlayerSession, Arc<BufferSink>) {
        let sink = BufferSink::new();
        let session = PlayerSession::new(
            PlayerId::new_v4(),
            "tester".to_string(),
            Color::new(255, 7, 7),
            sink.clone(),
            config,
        );
        (session, sink)
    }

    fn spawn_owned(world: &mut WorldState, owner: PlayerId, x: f32, y: f32, mass: f32) -> CellId {
        world.spawn(
            CellKind::Player,
            Some(owner),
            Vec2::new(x, y),
            mass,
            Color::default(),
        )
    }

    fn cell_update_messages(messages: &[ServerMessage]) -> Vec<(Vec<CellId>, Vec<CellId>)> {
        messages
            .iter()
            .filter_map(|m| match m {
                ServerMessage::CellUpdate { removed, cells } => {
                    Some((removed.clone(), cells.iter().map(|c| c.id).collect()))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_flags_and_mouse_are_stored_verbatim() {
        let config = ServerConfig::default();
        let (mut session, _sink) = test_session(&config);
        assert!(session.is_online());
        session.set_online(false);
        assert!(!session.is_online());

        session.set_mouse_target(Vec2::new(-12.0, 99999.0));
        assert_eq!(session.mouse_target(), Vec2::new(-12.0, 99999.0));

        session.set_name("renamed".to_string());
        assert_eq!(session.name(), "renamed");
    }

    #[test]
    fn test_set_color_copies_channels() {
        let config = ServerConfig::default();
        let (mut session, _sink) = test_session(&config);
        session.set_color(Color::new(1, 2, 3));
        assert_eq!(session.color(), Color::new(1, 2, 3));
    }

    #[test]
    fn test_score_recompute_skips_stale_ids_and_caches() {
        let config = ServerConfig::default();
        let mut world = test_world();
        let (mut session, _sink) = test_session(&config);
        let owner = session.id();

        let a = spawn_owned(&mut world, owner, 0.0, 0.0, 10.0);
        let b = spawn_owned(&mut world, owner, 0.0, 0.0, 20.0);
        session.add_cell(a);
        session.add_cell(b);

        assert_eq!(session.get_score(&world, true), 30.0);

        // destroyed but not yet pruned from the ownership list
        world.despawn(b);
        assert_eq!(session.get_score(&world, false), 30.0); // cached
        assert_eq!(session.get_score(&world, true), 10.0);
    }

    #[test]
    fn test_score_with_no_cells_is_zero() {
        let config = ServerConfig::default();
        let world = test_world();
        let (mut session, _sink) = test_session(&config);
        assert_eq!(session.get_score(&world, true), 0.0);
    }

    #[test]
    fn test_first_tick_recomputes_default_view() {
        let config = ServerConfig::default();
        let mut world = test_world();
        // one cell inside the base-range box around the origin, one outside
        let near = world.spawn(
            CellKind::Food,
            None,
            Vec2::new(500.0, 500.0),
            1.0,
            Color::default(),
        );
        let far = world.spawn(
            CellKind::Food,
            None,
            Vec2::new(3000.0, 3000.0),
            1.0,
            Color::default(),
        );
        let (mut session, sink) = test_session(&config);
        let lb = LeaderboardView::Ranked(Vec::new());

        session.update(&world, &lb, None, &config.view);

        // no cells: radius is exactly the base, box centered on the default center
        assert_eq!(session.sight_range(), config.view.sight_base);
        assert_eq!(
            *session.view(),
            Rect::from_center_half_extent(Vec2::ZERO, config.view.sight_base)
        );
        assert!(session.visible().contains(near));
        assert!(!session.visible().contains(far));

        let updates = cell_update_messages(&sink.messages());
        assert_eq!(updates.len(), 1);
        assert!(updates[0].0.is_empty());
        assert_eq!(updates[0].1, vec![near]);
    }

    #[test]
    fn test_destroy_flush_precedes_emission() {
        let config = ServerConfig::default();
        let mut world = test_world();
        let a = world.spawn(
            CellKind::Food,
            None,
            Vec2::new(100.0, 100.0),
            1.0,
            Color::default(),
        );
        let b = world.spawn(
            CellKind::Food,
            None,
            Vec2::new(200.0, 200.0),
            1.0,
            Color::default(),
        );
        let (mut session, sink) = test_session(&config);
        let lb = LeaderboardView::Ranked(Vec::new());

        // first tick seeds the visible set with {a, b}
        session.update(&world, &lb, None, &config.view);
        assert!(session.visible().contains(a) && session.visible().contains(b));
        sink.drain();

        // the simulation destroys a
        world.despawn(a);
        session.queue_destroy(a);

        // second tick: timer has not expired, no recompute happens
        session.update(&world, &lb, None, &config.view);
        let updates = cell_update_messages(&sink.messages());
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, vec![a]);
        assert!(!updates[0].1.contains(&a));
        assert!(updates[0].1.contains(&b));
        assert!(!session.visible().contains(a));
    }

    #[test]
    fn test_destroy_queue_is_cleared_after_flush() {
        let config = ServerConfig::default();
        let world = test_world();
        let (mut session, sink) = test_session(&config);
        let lb = LeaderboardView::Ranked(Vec::new());

        session.queue_destroy(77);
        session.queue_destroy(77); // duplicate, queued once
        session.update(&world, &lb, None, &config.view);
        session.update(&world, &lb, None, &config.view);

        let updates = cell_update_messages(&sink.messages());
        assert_eq!(updates[0].0, vec![77]);
        assert!(updates[1].0.is_empty(), "flushed entries must not repeat");
    }

    #[test]
    fn test_stale_destroy_entry_is_noop() {
        let config = ServerConfig::default();
        let world = test_world();
        let (mut session, sink) = test_session(&config);
        let lb = LeaderboardView::Ranked(Vec::new());

        // never visible, queued anyway (already left view via a recompute)
        session.queue_destroy(12345);
        session.update(&world, &lb, None, &config.view);
        let updates = cell_update_messages(&sink.messages());
        assert_eq!(updates[0].0, vec![12345]);
    }

    #[test]
    fn test_view_refresh_cadence() {
        let config = ServerConfig {
            view_refresh_period: 4,
            ..ServerConfig::default()
        };
        let mut world = test_world();
        let (mut session, _sink) = test_session(&config);
        let lb = LeaderboardView::Ranked(Vec::new());

        session.update(&world, &lb, None, &config.view);
        assert!(session.visible().is_empty());

        // a cell appears; ticks 2..=5 reuse the stale set
        let late = world.spawn(
            CellKind::Food,
            None,
            Vec2::new(10.0, 10.0),
            1.0,
            Color::default(),
        );
        for _ in 0..4 {
            session.update(&world, &lb, None, &config.view);
            assert!(!session.visible().contains(late));
        }
        // tick 6 recomputes
        session.update(&world, &lb, None, &config.view);
        assert!(session.visible().contains(late));
    }

    #[test]
    fn test_leaderboard_cadence() {
        let config = ServerConfig {
            leaderboard_period: 10,
            ..ServerConfig::default()
        };
        let world = test_world();
        let (mut session, sink) = test_session(&config);
        let lb = LeaderboardView::Ranked(Vec::new());

        let leaderboard_count = |messages: &[ServerMessage]| {
            messages
                .iter()
                .filter(|m| matches!(m, ServerMessage::Leaderboard(_)))
                .count()
        };

        // first tick pushes immediately (timer starts expired)
        session.update(&world, &lb, None, &config.view);
        assert_eq!(leaderboard_count(&sink.drain()), 1);

        // ten silent ticks, then exactly one push on the eleventh
        for _ in 0..10 {
            session.update(&world, &lb, None, &config.view);
        }
        assert_eq!(leaderboard_count(&sink.drain()), 0);
        session.update(&world, &lb, None, &config.view);
        assert_eq!(leaderboard_count(&sink.drain()), 1);
    }

    #[test]
    fn test_spectate_without_leader_sees_nothing() {
        let config = ServerConfig::default();
        let mut world = test_world();
        world.spawn(
            CellKind::Food,
            None,
            Vec2::new(10.0, 10.0),
            1.0,
            Color::default(),
        );
        let (mut session, sink) = test_session(&config);
        session.set_spectate(true);
        let lb = LeaderboardView::Ranked(Vec::new());

        session.update(&world, &lb, None, &config.view);

        assert!(session.visible().is_empty());
        assert!(
            !sink
                .messages()
                .iter()
                .any(|m| matches!(m, ServerMessage::CameraPosition { .. })),
            "no camera message without a leader"
        );
    }

    #[test]
    fn test_spectate_adopts_frame_and_emits_camera() {
        let config = ServerConfig::default();
        let mut world = test_world();
        let cell = world.spawn(
            CellKind::Food,
            None,
            Vec2::new(10.0, 10.0),
            1.0,
            Color::default(),
        );
        let (mut session, sink) = test_session(&config);
        session.set_spectate(true);
        let lb = LeaderboardView::Ranked(Vec::new());

        let frame = SpectateFrame {
            target: PlayerId::new_v4(),
            center: Vec2::new(111.0, 222.0),
            score: 1640.25,
            visible: [cell].into_iter().collect(),
        };
        session.update(&world, &lb, Some(&frame), &config.view);

        assert!(session.visible().contains(cell));
        let camera = sink
            .messages()
            .into_iter()
            .find_map(|m| match m {
                ServerMessage::CameraPosition { position, zoom } => Some((position, zoom)),
                _ => None,
            })
            .expect("camera message");
        assert_eq!(camera.0, Vec2::new(111.0, 222.0));
        assert!((camera.1 - 0.358).abs() < 1e-3);
    }

    #[test]
    fn test_send_border() {
        let config = ServerConfig::default();
        let (session, sink) = test_session(&config);
        session.send_border(&config.border);
        assert_eq!(
            sink.messages(),
            vec![ServerMessage::Border {
                bounds: config.border
            }]
        );
    }
}
