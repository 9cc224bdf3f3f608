//! Arena session driver
//!
//! Owns the world, the per-player sessions, and the injected game-mode
//! policy, and runs the authoritative tick: world bookkeeping, leaderboard
//! build, then every session's update. Spectators are updated after the
//! players so a spectator always adopts the leader's visible set from the
//! current tick, never a fresher or staler one.
//!
//! The external simulation mutates the world through [`GameSession::world_mut`]
//! and the spawn/despawn wrappers strictly between `tick` calls (single
//! writer); during a tick the world is only ever read.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::{ConfigError, ServerConfig};
use crate::game::constants::tick;
use crate::game::mode::GameMode;
use crate::game::world::{Cell, CellId, CellKind, Color, PlayerId, WorldState};
use crate::net::protocol::MessageSink;
use crate::net::session::PlayerSession;
use crate::net::spectate::SpectateFrame;
use crate::util::vec2::Vec2;

pub struct GameSession {
    world: WorldState,
    sessions: HashMap<PlayerId, PlayerSession>,
    mode: Box<dyn GameMode>,
    config: ServerConfig,
}

impl GameSession {
    /// Fails fast on malformed configuration instead of masking it per tick
    pub fn new(config: ServerConfig, mode: Box<dyn GameMode>) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(mode = mode.name(), "arena session created");
        Ok(Self {
            world: WorldState::new(config.border),
            sessions: HashMap::new(),
            mode,
            config,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    /// Mutable world access for the simulation's write phase between ticks.
    ///
    /// Cell lifecycle must go through [`spawn_cell`](Self::spawn_cell) /
    /// [`despawn_cell`](Self::despawn_cell) so ownership lists and destroy
    /// queues stay consistent; this handle is for moving and resizing cells.
    pub fn world_mut(&mut self) -> &mut WorldState {
        &mut self.world
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn session(&self, id: PlayerId) -> Option<&PlayerSession> {
        self.sessions.get(&id)
    }

    pub fn session_mut(&mut self, id: PlayerId) -> Option<&mut PlayerSession> {
        self.sessions.get_mut(&id)
    }

    // ------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------

    /// Register a new client: random color, game-mode join hook, world
    /// border notification. Timers start expired so the first tick sends a
    /// full view.
    pub fn join(&mut self, name: String, sink: Arc<dyn MessageSink>) -> PlayerId {
        let id = PlayerId::new_v4();
        let color = Color::random(&mut rand::thread_rng());
        let mut session = PlayerSession::new(id, name, color, sink, &self.config);
        self.mode.on_player_join(&mut session);
        session.send_border(self.world.border());
        info!(player = %id, name = session.name(), "player joined");
        self.sessions.insert(id, session);
        id
    }

    /// Drop a client and despawn everything it owned. Remaining sessions are
    /// told about the removed cells through their destroy queues.
    pub fn leave(&mut self, id: PlayerId) {
        let Some(session) = self.sessions.remove(&id) else {
            return;
        };
        for cell in session.cell_ids().to_vec() {
            self.despawn_cell(cell);
        }
        info!(player = %id, name = session.name(), "player left");
    }

    // ------------------------------------------------------------------
    // Cell lifecycle
    // ------------------------------------------------------------------

    /// Spawn a cell and, for player cells, record it in the owner's
    /// ownership list.
    pub fn spawn_cell(
        &mut self,
        kind: CellKind,
        owner: Option<PlayerId>,
        position: Vec2,
        mass: f32,
        color: Color,
    ) -> CellId {
        let id = self.world.spawn(kind, owner, position, mass, color);
        if let Some(owner) = owner {
            if let Some(session) = self.sessions.get_mut(&owner) {
                session.add_cell(id);
            }
        }
        id
    }

    /// Remove a cell from the world and queue the removal for every session.
    /// Sessions that never saw the cell flush it as a harmless no-op.
    pub fn despawn_cell(&mut self, id: CellId) -> Option<Cell> {
        let cell = self.world.despawn(id)?;
        if let Some(owner) = cell.owner {
            if let Some(session) = self.sessions.get_mut(&owner) {
                session.remove_cell(id);
            }
        }
        for session in self.sessions.values_mut() {
            session.queue_destroy(id);
        }
        debug!(cell = id, "cell despawned");
        Some(cell)
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// One authoritative tick over all online sessions.
    ///
    /// Players update first; the spectate frame is captured from the leader
    /// afterwards, so spectators adopt the leader's visible set of this very
    /// tick. Offline sessions are excluded from scheduling entirely.
    pub fn tick(&mut self) {
        self.world.advance_tick();

        let leaderboard = self.mode.leaderboard(&mut self.sessions, &self.world);
        let tuning = self.config.view;
        let ids: Vec<PlayerId> = self.sessions.keys().copied().collect();

        for id in &ids {
            if let Some(session) = self.sessions.get_mut(id) {
                if session.is_online() && !session.is_spectating() {
                    session.update(&self.world, &leaderboard, None, &tuning);
                }
            }
        }

        // Resolved fresh every tick; a leader change is picked up immediately
        let frame = self
            .mode
            .select_leader(&self.sessions)
            .and_then(|leader_id| self.sessions.get(&leader_id))
            .map(|leader| SpectateFrame {
                target: leader.id(),
                center: leader.center(),
                score: leader.score(),
                visible: leader.visible().clone(),
            });

        for id in &ids {
            if let Some(session) = self.sessions.get_mut(id) {
                if session.is_online() && session.is_spectating() {
                    session.update(&self.world, &leaderboard, frame.as_ref(), &tuning);
                }
            }
        }
    }
}

/// Start the fixed-rate tick driver as a background task
pub fn start_game_loop(session: Arc<RwLock<GameSession>>) {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_millis(tick::TICK_DURATION_MS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("game loop started at {} Hz", tick::TICK_RATE);
        let start = Instant::now();
        let mut tick_count: u64 = 0;

        loop {
            ticker.tick().await;
            tick_count += 1;

            {
                let mut guard = session.write().await;
                guard.tick();
            }

            if tick_count % (tick::TICK_RATE as u64 * tick::STATS_INTERVAL_SECS) == 0 {
                let guard = session.read().await;
                info!(
                    "arena: {}s, tick {}, {} sessions, {} cells",
                    start.elapsed().as_secs(),
                    guard.world().tick(),
                    guard.session_count(),
                    guard.world().len()
                );
            }
        }
    });
}
