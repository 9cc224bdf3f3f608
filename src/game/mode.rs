//! Game-mode policy
//!
//! Everything mode-specific (what a new player gets at join, who counts as
//! the current leader, how the leaderboard is presented) sits behind the
//! [`GameMode`] trait, injected at arena construction. The core invokes it
//! read-only apart from the score recomputation that leaderboard building
//! implies.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

use crate::game::constants::leaderboard;
use crate::game::world::{Color, PlayerId, TeamId, WorldState};
use crate::net::session::PlayerSession;

/// Leaderboard snapshot in the display format chosen by the game mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LeaderboardView {
    /// Individually ranked entries, best first
    Ranked(Vec<RankedEntry>),
    /// Relative team strengths (free-for-all-less modes)
    TeamShares(Vec<TeamShare>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub name: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamShare {
    pub team: TeamId,
    /// Fraction of the total arena score held by this team, in [0, 1]
    pub share: f32,
}

/// Per-mode policy hooks
pub trait GameMode: Send + Sync {
    fn name(&self) -> &'static str;

    /// Called once when a session is created, before it is registered
    fn on_player_join(&self, _session: &mut PlayerSession) {}

    /// The session spectators should follow. Reads the scores cached by the
    /// most recent `leaderboard` call.
    fn select_leader(&self, sessions: &HashMap<PlayerId, PlayerSession>) -> Option<PlayerId>;

    /// Build the leaderboard snapshot, recomputing eligible sessions' scores
    fn leaderboard(
        &self,
        sessions: &mut HashMap<PlayerId, PlayerSession>,
        world: &WorldState,
    ) -> LeaderboardView;
}

/// Sessions that participate in ranking: connected, playing (not watching),
/// and actually holding cells
fn eligible(session: &PlayerSession) -> bool {
    session.is_online() && !session.is_spectating() && !session.cell_ids().is_empty()
}

/// Highest cached score among eligible sessions
fn top_ranked(sessions: &HashMap<PlayerId, PlayerSession>) -> Option<PlayerId> {
    sessions
        .iter()
        .filter(|(_, s)| eligible(s))
        .max_by(|a, b| {
            a.1.score()
                .partial_cmp(&b.1.score())
                .unwrap_or(Ordering::Equal)
        })
        .map(|(id, _)| *id)
}

// ============================================================================
// Free for all
// ============================================================================

/// Classic every-cell-for-itself mode: ranked leaderboard, leader is rank one
#[derive(Debug, Clone)]
pub struct FreeForAll {
    leaderboard_size: usize,
}

impl FreeForAll {
    pub fn new(leaderboard_size: usize) -> Self {
        Self { leaderboard_size }
    }
}

impl Default for FreeForAll {
    fn default() -> Self {
        Self::new(leaderboard::MAX_ENTRIES)
    }
}

impl GameMode for FreeForAll {
    fn name(&self) -> &'static str {
        "ffa"
    }

    fn select_leader(&self, sessions: &HashMap<PlayerId, PlayerSession>) -> Option<PlayerId> {
        top_ranked(sessions)
    }

    fn leaderboard(
        &self,
        sessions: &mut HashMap<PlayerId, PlayerSession>,
        world: &WorldState,
    ) -> LeaderboardView {
        let mut ranked: SmallVec<[(f32, PlayerId); 16]> = SmallVec::new();
        for (id, session) in sessions.iter_mut() {
            if !eligible(session) {
                continue;
            }
            let score = session.get_score(world, true);
            ranked.push((score, *id));
        }
        ranked.sort_unstable_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        let entries = ranked
            .iter()
            .take(self.leaderboard_size)
            .filter_map(|(score, id)| {
                sessions.get(id).map(|s| RankedEntry {
                    name: s.name().to_string(),
                    score: *score,
                })
            })
            .collect();
        LeaderboardView::Ranked(entries)
    }
}

// ============================================================================
// Team battle
// ============================================================================

/// Fixed team palette; teams beyond the palette wrap around
const TEAM_COLORS: [Color; 3] = [
    Color { r: 223, g: 0, b: 0 },
    Color { r: 0, g: 223, b: 0 },
    Color { r: 0, g: 0, b: 223 },
];

/// Team mode: players are assigned a team and its color at join, the
/// leaderboard shows relative team strength
#[derive(Debug, Clone)]
pub struct TeamBattle {
    team_count: u8,
}

impl TeamBattle {
    pub fn new(team_count: u8) -> Self {
        Self {
            team_count: team_count.max(1),
        }
    }
}

impl Default for TeamBattle {
    fn default() -> Self {
        Self::new(TEAM_COLORS.len() as u8)
    }
}

impl GameMode for TeamBattle {
    fn name(&self) -> &'static str {
        "teams"
    }

    fn on_player_join(&self, session: &mut PlayerSession) {
        let team = rand::Rng::gen_range(&mut rand::thread_rng(), 0..self.team_count);
        session.set_team(team);
        session.set_color(TEAM_COLORS[team as usize % TEAM_COLORS.len()]);
        debug!(player = %session.id(), team, "assigned to team");
    }

    fn select_leader(&self, sessions: &HashMap<PlayerId, PlayerSession>) -> Option<PlayerId> {
        top_ranked(sessions)
    }

    fn leaderboard(
        &self,
        sessions: &mut HashMap<PlayerId, PlayerSession>,
        world: &WorldState,
    ) -> LeaderboardView {
        let mut totals = vec![0.0f32; self.team_count as usize];
        for session in sessions.values_mut() {
            if !eligible(session) {
                continue;
            }
            let score = session.get_score(world, true);
            let team = session.team() as usize % totals.len();
            totals[team] += score;
        }
        let overall: f32 = totals.iter().sum();
        let shares = totals
            .iter()
            .enumerate()
            .map(|(team, &total)| TeamShare {
                team: team as TeamId,
                share: if overall > 0.0 { total / overall } else { 0.0 },
            })
            .collect();
        LeaderboardView::TeamShares(shares)
    }
}
