//! Undo support
//!
//! Multiplayer undo simply withdraws a submission that has not resolved yet.
//! Solo rounds resolve as soon as the single participant has reported both
//! seats, so they carry a snapshot taken just before resolution; undo and
//! resubmission restore it.

use log::info;

use crate::error::DuelError;
use crate::game::DuelGame;
use crate::invariants::debug_assert_preserved;
use crate::query::has_pending_submission;
use crate::state::{log_entry_id, PlayerId, PlayerSnapshot, RoundId, RoundSnapshot, StationIndex};

/// Capture both seats, the station's round counters and the game status
/// before a solo round resolves
pub fn capture_snapshot(
    game: &DuelGame,
    station_index: StationIndex,
    seats: [&PlayerId; 2],
) -> RoundSnapshot {
    let station = game.duel.station(station_index);
    RoundSnapshot {
        players: seats
            .iter()
            .filter_map(|id| game.duel.players.get(id.as_str()))
            .map(PlayerSnapshot::of)
            .collect(),
        station_round_id: station.map_or(0, |s| s.round_id),
        last_resolved_round: station.map_or(0, |s| s.last_resolved_round),
        status: game.status,
        winner_id: game.winner_id.clone(),
        ended_at: game.ended_at,
    }
}

/// Put back what `capture_snapshot` saw and drop the log entry of the
/// rolled-back round
pub fn restore_snapshot(
    game: &mut DuelGame,
    station_index: StationIndex,
    snapshot: &RoundSnapshot,
    round_id: RoundId,
) {
    for saved in &snapshot.players {
        if let Some(player) = game.duel.players.get_mut(&saved.id) {
            saved.apply_to(player);
        }
    }
    if let Some(station) = game.duel.station_mut(station_index) {
        station.round_id = snapshot.station_round_id;
        station.last_resolved_round = snapshot.last_resolved_round;
    }
    game.status = snapshot.status;
    game.winner_id = snapshot.winner_id.clone();
    game.ended_at = snapshot.ended_at;
    let log_id = log_entry_id(station_index, round_id);
    game.duel.log.retain(|entry| entry.id != log_id);
}

/// Withdraw a player's submission for the station's pending round.
///
/// In solo mode a round that already resolved is rolled back first.
/// `NothingToUndo` is returned when the player has no pending submission;
/// hosts usually treat it as a no-op.
pub fn undo_submission(
    game: &DuelGame,
    station_index: StationIndex,
    player_id: &str,
) -> Result<DuelGame, DuelError> {
    let nothing_to_undo = || DuelError::NothingToUndo {
        station_index,
        player_id: player_id.to_string(),
    };
    if !has_pending_submission(&game.duel, station_index, player_id) {
        return Err(nothing_to_undo());
    }

    let solo = game.is_solo();
    let mut next = game.clone();
    let mut pending = next
        .duel
        .pending
        .remove(&station_index)
        .ok_or_else(nothing_to_undo)?;

    if solo && pending.resolved {
        if let Some(snapshot) = pending.snapshot.take() {
            restore_snapshot(&mut next, station_index, &snapshot, pending.round_id);
            info!(
                "station {}: solo round {} rolled back",
                station_index, pending.round_id
            );
        }
    }

    pending.submissions.remove(player_id);
    pending.resolved = false;
    pending.snapshot = None;
    if !pending.submissions.is_empty() {
        next.duel.pending.insert(station_index, pending);
    }

    debug_assert_preserved(&game.duel, &next.duel);
    Ok(next)
}
