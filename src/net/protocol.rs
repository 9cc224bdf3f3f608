//! Wire protocol for client-bound updates
//!
//! Four message kinds leave this layer: cell deltas, leaderboard snapshots,
//! spectator camera positions, and the world border sent on join. Messages
//! are handed to a [`MessageSink`] (the transport's side of the contract)
//! and this layer never learns whether delivery succeeded.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::game::mode::LeaderboardView;
use crate::game::world::{Cell, CellId, CellKind, Color, PlayerId};
use crate::util::rect::Rect;
use crate::util::vec2::Vec2;

/// Render state for one visible cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellState {
    pub id: CellId,
    /// Owning session for player cells, `None` for food
    pub owner: Option<PlayerId>,
    pub kind: CellKind,
    pub position: Vec2,
    /// Display size (radius), not raw mass
    pub size: f32,
    pub color: Color,
}

impl CellState {
    pub fn from_cell(cell: &Cell) -> Self {
        Self {
            id: cell.id,
            owner: cell.owner,
            kind: cell.kind,
            position: cell.position,
            size: cell.radius(),
            color: cell.color,
        }
    }
}

/// Messages from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    /// Per-tick cell delta: ids gone since the last flush plus the full
    /// currently visible set
    CellUpdate {
        removed: Vec<CellId>,
        cells: Vec<CellState>,
    },
    /// Leaderboard snapshot in the game mode's display format
    Leaderboard(LeaderboardView),
    /// Spectator camera placement
    CameraPosition { position: Vec2, zoom: f32 },
    /// World bounds, sent once on session setup
    Border { bounds: Rect },
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode a message using bincode
/// Uses legacy config for fixed-size integers (stable wire layout for clients)
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, EncodeError> {
    bincode::serde::encode_to_vec(message, bincode::config::legacy())
        .map_err(|e| EncodeError(e.to_string()))
}

/// Decode a message using bincode
pub fn decode<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, DecodeError> {
    bincode::serde::decode_from_slice(data, bincode::config::legacy())
        .map(|(msg, _)| msg)
        .map_err(|e| DecodeError(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
#[error("Encode error: {0}")]
pub struct EncodeError(String);

#[derive(Debug, thiserror::Error)]
#[error("Decode error: {0}")]
pub struct DecodeError(String);

// ============================================================================
// Outbound channel
// ============================================================================

/// Fire-and-forget outbound channel owned by each session.
///
/// Implementations must not block; the core neither retries nor observes
/// delivery.
pub trait MessageSink: Send + Sync {
    fn send(&self, message: ServerMessage);
}

/// Sink that frames messages for a stream transport.
///
/// Format: [4 bytes little-endian length][bincode payload], pushed into an
/// unbounded channel drained by the transport's writer task. A closed
/// receiver means the client is gone; frames are dropped silently.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<Vec<u8>>) -> Self {
        Self { tx }
    }
}

impl MessageSink for ChannelSink {
    fn send(&self, message: ServerMessage) {
        let payload = match encode(&message) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("failed to encode outbound message: {}", e);
                return;
            }
        };
        let mut frame = Vec::with_capacity(4 + payload.len());
        frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        frame.extend_from_slice(&payload);
        if self.tx.send(frame).is_err() {
            trace!("outbound channel closed, dropping frame");
        }
    }
}

/// In-memory sink that records every message, for assertions in tests
#[cfg(test)]
pub struct BufferSink {
    messages: parking_lot::Mutex<Vec<ServerMessage>>,
}

#[cfg(test)]
impl BufferSink {
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self {
            messages: parking_lot::Mutex::new(Vec::new()),
        })
    }

    /// Snapshot of everything sent so far
    pub fn messages(&self) -> Vec<ServerMessage> {
        self.messages.lock().clone()
    }

    /// Take and clear the recorded messages
    pub fn drain(&self) -> Vec<ServerMessage> {
        std::mem::take(&mut *self.messages.lock())
    }
}

#[cfg(test)]
impl MessageSink for BufferSink {
    fn send(&self, message: ServerMessage) {
        self.messages.lock().push(message);
    }
}
