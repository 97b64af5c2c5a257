//! Duel ladder engine for Sõbraduell
//!
//! Station-based putting duels: two contenders per station, simultaneous
//! made-count submissions, winners climb toward station 1 and losers drop,
//! with a waiting queue feeding open seats.
//!
//! Every transition is a pure function from a game value to a new game
//! value. Hosts load a document, call one transition and save the result.
//! This crate is compiled to:
//! - Native (for servers and tests)
//! - WASM (for the web client)

mod bootstrap;
mod config;
mod error;
mod game;
mod invariants;
mod query;
mod roster;
mod round;
mod snapshot;
mod state;
pub mod store;

#[cfg(feature = "wasm")]
mod wasm;

pub use bootstrap::{
    create_empty_duel_state, initialize_duel_game_state, join_game, launch_duel_game, start_duel_game,
};
pub use config::{DuelConfig, DuelMode, MAX_DISC_COUNT};
pub use error::DuelError;
pub use game::{abandon_game, DuelGame, GameStatus};
pub use invariants::check_invariants;
pub use query::{
    get_leaderboard_rows, get_opponent_id, get_station_players, has_pending_submission,
    is_station_ready, LeaderboardRow,
};
pub use roster::{add_player_to_state, clear_station_readiness, mark_player_ready};
pub use round::{
    begin_next_round, submit_duel_score, submit_duel_score_with_status, IgnoreReason, SubmitStatus,
};
pub use snapshot::undo_submission;
pub use state::{
    DuelState, LogEntry, PendingRound, Player, PlayerId, PlayerSnapshot, Registration, RoundId,
    RoundOutcome, RoundSnapshot, Station, StationIndex, Submission, Timestamp,
};

/// Distance every player starts from and is reset to when seated
pub const START_DISTANCE: u8 = 5;
/// Furthest distance; a win from here moves the ladder
pub const MAX_DISTANCE: u8 = 10;

/// Points for a round won from `distance`
pub fn points_for_distance(distance: u8) -> u8 {
    if distance >= MAX_DISTANCE {
        2
    } else {
        1
    }
}
