//! Cell Arena Server Library
//!
//! Per-client visibility and state synchronization for a real-time
//! multiplayer cell arena. Each connected player gets a personalized view of
//! the world: a sight box derived from its cells, a periodically refreshed
//! visible-cell set, throttled leaderboard pushes, and an optional spectator
//! camera that follows the current leader.
//!
//! The authoritative movement/collision simulation and the socket transport
//! are external collaborators: the simulation mutates the world between ticks
//! through [`net::game_session::GameSession`], and a transport delivers the
//! outbound messages produced by each session's sink.

pub mod config;
pub mod util;
pub mod game;
pub mod net;
