//! Error types for ladder transitions

use thiserror::Error;

use crate::state::{PlayerId, StationIndex};

/// Errors raised by the ladder engine.
///
/// Premature calls (opponent not ready, station not full, stale round) are
/// not errors: they return the unchanged game. These variants cover requests
/// that can never succeed and broken state documents.
#[derive(Debug, Error)]
pub enum DuelError {
    #[error("nothing to undo for player {player_id} at station {station_index}")]
    NothingToUndo {
        station_index: StationIndex,
        player_id: PlayerId,
    },

    #[error("station count must be at least 1")]
    InvalidStationCount,

    #[error("invalid duel configuration: {0}")]
    InvalidConfig(String),

    #[error("station {0} holds more than two players")]
    StationOverfull(StationIndex),

    #[error("station {0} lists an unknown player")]
    UnknownStationMember(StationIndex),

    #[error("station list is out of order at position {0}")]
    StationOrder(usize),

    #[error("player {0} is not seated where their station index says")]
    StationMismatch(PlayerId),

    #[error("player {player_id} distance {distance} is outside the ladder range")]
    DistanceOutOfRange { player_id: PlayerId, distance: u8 },

    #[error("queue entry {0} is duplicated, unknown or already seated")]
    QueueCorrupt(PlayerId),

    #[error("malformed game document: {0}")]
    Json(#[from] serde_json::Error),
}
