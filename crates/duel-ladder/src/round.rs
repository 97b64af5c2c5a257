//! Round resolution engine
//!
//! Per station: `Idle -> AwaitingSubmissions -> Idle`. A round resolves once
//! both seats have reported; a tie changes nothing, a win either moves the
//! winner one metre back or, from the maximum distance, reshuffles the ladder.

use std::cmp::Ordering;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::game::{DuelGame, GameStatus};
use crate::invariants::debug_assert_preserved;
use crate::snapshot::{capture_snapshot, restore_snapshot};
use crate::state::{
    log_entry_id, DuelState, LogEntry, PendingRound, PlayerId, RoundId, RoundOutcome, StationIndex,
    Submission, Timestamp,
};
use crate::{points_for_distance, MAX_DISTANCE};

/// Why a submission left the game untouched
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IgnoreReason {
    GameAbandoned,
    /// Only a correction of the finishing solo round is accepted.
    GameFinished,
    UnknownPlayer,
    NotStationed,
    NoOpponent,
    NotReady,
    /// The station already resolved this round or a later one.
    StaleRound,
}

/// What a submission did
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SubmitStatus {
    Ignored { reason: IgnoreReason },
    /// Recorded; waiting for the opponent.
    Pending { round_id: RoundId },
    Resolved { round_id: RoundId, outcome: RoundOutcome },
}

impl SubmitStatus {
    pub fn changed_state(&self) -> bool {
        !matches!(self, SubmitStatus::Ignored { .. })
    }
}

/// Record a player's made-count for their station's current round.
///
/// Premature or stale submissions return the game unchanged.
pub fn submit_duel_score(
    game: &DuelGame,
    player_id: &str,
    made_count: u8,
    now: Timestamp,
) -> DuelGame {
    submit_duel_score_with_status(game, player_id, made_count, now).0
}

/// `submit_duel_score`, also reporting what happened
pub fn submit_duel_score_with_status(
    game: &DuelGame,
    player_id: &str,
    made_count: u8,
    now: Timestamp,
) -> (DuelGame, SubmitStatus) {
    let mut next = game.clone();
    match apply_submission(&mut next, player_id, made_count, now) {
        Ok(status) => {
            debug_assert_preserved(&game.duel, &next.duel);
            (next, status)
        }
        Err(reason) => {
            debug!("submission from {} ignored: {:?}", player_id, reason);
            (game.clone(), SubmitStatus::Ignored { reason })
        }
    }
}

/// Discard a resolved round at `station_index` so the next submission opens a
/// fresh round, even when nobody's distance changed.
///
/// A finished game keeps its last round so the finish can still be undone.
pub fn begin_next_round(game: &DuelGame, station_index: StationIndex) -> DuelGame {
    let mut next = game.clone();
    if next.status == GameStatus::Finished {
        debug!("station {}: game finished, round kept", station_index);
        return next;
    }
    if next
        .duel
        .pending
        .get(&station_index)
        .is_some_and(|pending| pending.resolved)
    {
        next.duel.pending.remove(&station_index);
        debug!("station {}: resolved round cleared by host", station_index);
    }
    next
}

fn apply_submission(
    game: &mut DuelGame,
    player_id: &str,
    made_count: u8,
    now: Timestamp,
) -> Result<SubmitStatus, IgnoreReason> {
    if game.status == GameStatus::Abandoned {
        return Err(IgnoreReason::GameAbandoned);
    }
    let solo = game.is_solo();
    let finished = game.status == GameStatus::Finished;

    let player = game.duel.players.get(player_id).ok_or(IgnoreReason::UnknownPlayer)?;
    let station_index = player.station_index.ok_or(IgnoreReason::NotStationed)?;
    let station = game.duel.station(station_index).ok_or(IgnoreReason::NotStationed)?;
    if !station.is_full() {
        return Err(IgnoreReason::NoOpponent);
    }
    let opponent_id = station.opponent_of(player_id).ok_or(IgnoreReason::NoOpponent)?.clone();
    let opponent = game.duel.players.get(&opponent_id).ok_or(IgnoreReason::NoOpponent)?;
    if !(player.ready && opponent.ready) {
        return Err(IgnoreReason::NotReady);
    }
    let seats = [station.players[0].clone(), station.players[1].clone()];
    let next_round = station.round_id + 1;
    let last_resolved = station.last_resolved_round;

    let mut pending = game
        .duel
        .pending
        .remove(&station_index)
        .unwrap_or_else(|| PendingRound::new(next_round));

    if finished && !(solo && pending.resolved && pending.snapshot.is_some()) {
        return Err(IgnoreReason::GameFinished);
    }

    if pending.resolved && !finished && pending.is_stale(&game.duel.players) {
        debug!(
            "station {}: round {} is over, opening round {}",
            station_index,
            pending.round_id,
            pending.round_id + 1
        );
        pending = PendingRound::new(pending.round_id + 1);
    }

    if solo && pending.resolved {
        if let Some(snapshot) = pending.snapshot.take() {
            restore_snapshot(game, station_index, &snapshot, pending.round_id);
        }
        pending.resolved = false;
    }

    // Read after any restore: the distance thrown from is the pre-round one.
    let distance = game
        .duel
        .players
        .get(player_id)
        .map(|p| p.distance)
        .ok_or(IgnoreReason::UnknownPlayer)?;
    pending.submissions.insert(
        player_id.to_string(),
        Submission {
            made_count,
            distance,
            submitted_at: now,
        },
    );

    let round_id = pending.round_id;
    if !pending.submissions.contains_key(&opponent_id) {
        game.duel.pending.insert(station_index, pending);
        return Ok(SubmitStatus::Pending { round_id });
    }

    if !solo && round_id <= last_resolved {
        warn!(
            "station {}: round {} already resolved (last {}), submission dropped",
            station_index, round_id, last_resolved
        );
        return Err(IgnoreReason::StaleRound);
    }

    let outcome = resolve_round(game, station_index, &seats, &mut pending, solo, now)?;
    if solo {
        game.duel.pending.insert(station_index, pending);
    }
    Ok(SubmitStatus::Resolved { round_id, outcome })
}

fn resolve_round(
    game: &mut DuelGame,
    station_index: StationIndex,
    seats: &[PlayerId; 2],
    pending: &mut PendingRound,
    solo: bool,
    now: Timestamp,
) -> Result<RoundOutcome, IgnoreReason> {
    let [seat_a, seat_b] = seats;
    let sub_a = pending.submissions.get(seat_a).copied().ok_or(IgnoreReason::NoOpponent)?;
    let sub_b = pending.submissions.get(seat_b).copied().ok_or(IgnoreReason::NoOpponent)?;

    if solo {
        pending.snapshot = Some(capture_snapshot(game, station_index, [seat_a, seat_b]));
    }

    let decided = match sub_a.made_count.cmp(&sub_b.made_count) {
        Ordering::Equal => None,
        Ordering::Greater => Some((seat_a, seat_b, sub_a.distance)),
        Ordering::Less => Some((seat_b, seat_a, sub_b.distance)),
    };
    let outcome = match decided {
        None => RoundOutcome::Tie,
        Some((winner_id, loser_id, winner_distance)) => RoundOutcome::Win {
            winner_id: winner_id.clone(),
            loser_id: loser_id.clone(),
            points_awarded: points_for_distance(winner_distance),
        },
    };

    game.duel.log.push(LogEntry {
        id: log_entry_id(station_index, pending.round_id),
        timestamp: now,
        station_index,
        player_a: seat_a.clone(),
        player_b: seat_b.clone(),
        made_a: sub_a.made_count,
        made_b: sub_b.made_count,
        distance_a: sub_a.distance,
        distance_b: sub_b.distance,
        outcome: outcome.clone(),
    });

    if let Some((winner_id, loser_id, winner_distance)) = decided {
        award_win(game, station_index, winner_id, loser_id, winner_distance, solo, now);
    }

    pending.resolved = true;
    if let Some(station) = game.duel.station_mut(station_index) {
        station.round_id = pending.round_id;
        station.last_resolved_round = pending.round_id;
    }
    info!(
        "station {}: round {} resolved {}-{} ({:?})",
        station_index, pending.round_id, sub_a.made_count, sub_b.made_count, outcome
    );
    Ok(outcome)
}

fn award_win(
    game: &mut DuelGame,
    station_index: StationIndex,
    winner_id: &str,
    loser_id: &str,
    winner_distance: u8,
    solo: bool,
    now: Timestamp,
) {
    let points = points_for_distance(winner_distance);
    if let Some(winner) = game.duel.players.get_mut(winner_id) {
        winner.points += u32::from(points);
        winner.wins += 1;
    }
    if let Some(loser) = game.duel.players.get_mut(loser_id) {
        loser.losses += 1;
    }

    if winner_distance < MAX_DISTANCE {
        if let Some(winner) = game.duel.players.get_mut(winner_id) {
            winner.distance = (winner.distance + 1).min(MAX_DISTANCE);
        }
        return;
    }

    if solo {
        game.status = GameStatus::Finished;
        game.winner_id = Some(winner_id.to_string());
        game.ended_at = Some(now);
        info!("solo duel finished, {} wins from {}m", winner_id, winner_distance);
        return;
    }
    promote_and_demote(&mut game.duel, station_index, winner_id, loser_id);
}

/// Winner moves one station up, loser one down; a full target station sends
/// the player to the queue routed there. Freed seats are refilled afterwards.
fn promote_and_demote(
    duel: &mut DuelState,
    station_index: StationIndex,
    winner_id: &str,
    loser_id: &str,
) {
    let bottom = duel.station_count();
    let winner_target = station_index.saturating_sub(1).max(1);
    let loser_target = (station_index + 1).min(bottom);

    duel.remove_player_from_station(winner_id);
    duel.remove_player_from_station(loser_id);
    for (player_id, target) in [(winner_id, winner_target), (loser_id, loser_target)] {
        if duel.assign_player_to_station(player_id, target) {
            debug!("{} moves to station {}", player_id, target);
        } else {
            debug!("station {} full, {} queued for it", target, player_id);
            duel.enqueue_player(player_id, target);
        }
    }
    duel.fill_stations_from_queue();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::{join_game, launch_duel_game};
    use crate::config::DuelConfig;
    use crate::roster::mark_player_ready;
    use crate::state::Registration;

    fn ready_game(config: DuelConfig, ids: &[&str]) -> DuelGame {
        let mut game = DuelGame::new(config);
        for (i, id) in ids.iter().enumerate() {
            game = join_game(&game, Registration::new(*id, id.to_uppercase(), i as u64));
        }
        let mut game = launch_duel_game(&game, 0);
        for id in ids {
            game.duel = mark_player_ready(&game.duel, id);
        }
        game
    }

    fn set_distance(game: &mut DuelGame, id: &str, distance: u8) {
        game.duel.players.get_mut(id).unwrap().distance = distance;
    }

    #[test]
    fn test_ignored_when_not_ready() {
        let mut game = ready_game(DuelConfig::ladder(1), &["a", "b"]);
        game.duel.players.get_mut("b").unwrap().ready = false;
        let (next, status) = submit_duel_score_with_status(&game, "a", 3, 1);
        assert_eq!(status, SubmitStatus::Ignored { reason: IgnoreReason::NotReady });
        assert_eq!(next, game);
    }

    #[test]
    fn test_ignored_without_opponent() {
        let game = ready_game(DuelConfig::ladder(2), &["a", "b", "c"]);
        let (next, status) = submit_duel_score_with_status(&game, "c", 3, 1);
        assert_eq!(status, SubmitStatus::Ignored { reason: IgnoreReason::NoOpponent });
        assert_eq!(next, game);
    }

    #[test]
    fn test_ignored_for_queued_and_unknown_players() {
        let game = ready_game(DuelConfig::ladder(1), &["a", "b", "c"]);
        let (_, status) = submit_duel_score_with_status(&game, "c", 3, 1);
        assert_eq!(status, SubmitStatus::Ignored { reason: IgnoreReason::NotStationed });
        let (_, status) = submit_duel_score_with_status(&game, "zz", 3, 1);
        assert_eq!(status, SubmitStatus::Ignored { reason: IgnoreReason::UnknownPlayer });
    }

    #[test]
    fn test_ignored_after_abandon() {
        let game = ready_game(DuelConfig::ladder(1), &["a", "b"]);
        let game = crate::game::abandon_game(&game, 5);
        let (_, status) = submit_duel_score_with_status(&game, "a", 3, 6);
        assert_eq!(status, SubmitStatus::Ignored { reason: IgnoreReason::GameAbandoned });
    }

    #[test]
    fn test_first_submission_waits() {
        let game = ready_game(DuelConfig::ladder(1), &["a", "b"]);
        let (next, status) = submit_duel_score_with_status(&game, "a", 2, 7);
        assert_eq!(status, SubmitStatus::Pending { round_id: 1 });
        let pending = &next.duel.pending[&1];
        assert_eq!(
            pending.submissions["a"],
            Submission { made_count: 2, distance: 5, submitted_at: 7 }
        );
        assert!(!pending.resolved);
    }

    #[test]
    fn test_resubmission_before_opponent_overwrites() {
        let game = ready_game(DuelConfig::ladder(1), &["a", "b"]);
        let game = submit_duel_score(&game, "a", 1, 1);
        let game = submit_duel_score(&game, "a", 3, 2);
        assert_eq!(game.duel.pending[&1].submissions["a"].made_count, 3);
        assert_eq!(game.duel.pending[&1].submissions.len(), 1);
    }

    #[test]
    fn test_tie_changes_nothing() {
        let game = ready_game(DuelConfig::ladder(1), &["a", "b"]);
        let game = submit_duel_score(&game, "a", 2, 1);
        let (next, status) = submit_duel_score_with_status(&game, "b", 2, 2);

        assert_eq!(status, SubmitStatus::Resolved { round_id: 1, outcome: RoundOutcome::Tie });
        assert!(next.duel.pending.is_empty());
        assert_eq!(next.duel.players, game.duel.players);
        assert_eq!(next.duel.log.len(), 1);
        assert_eq!(next.duel.log[0].id, "1-1");
        assert_eq!(next.duel.station(1).unwrap().last_resolved_round, 1);
    }

    #[test]
    fn test_sub_max_win_moves_winner_back() {
        let mut game = ready_game(DuelConfig::ladder(1), &["a", "b"]);
        set_distance(&mut game, "a", 7);
        let game = submit_duel_score(&game, "a", 3, 1);
        let game = submit_duel_score(&game, "b", 1, 2);

        let a = game.duel.player("a").unwrap();
        let b = game.duel.player("b").unwrap();
        assert_eq!((a.distance, a.points, a.wins), (8, 1, 1));
        assert_eq!((b.distance, b.losses), (5, 1));
        assert_eq!(a.station_index, Some(1));
        assert_eq!(b.station_index, Some(1));
        assert!(a.ready && b.ready, "staying at the station keeps readiness");
    }

    #[test]
    fn test_rounds_advance_per_station() {
        let game = ready_game(DuelConfig::ladder(1), &["a", "b"]);
        let game = submit_duel_score(&game, "a", 3, 1);
        let game = submit_duel_score(&game, "b", 1, 2);
        let (game, status) = submit_duel_score_with_status(&game, "b", 2, 3);
        assert_eq!(status, SubmitStatus::Pending { round_id: 2 });
        let game = submit_duel_score(&game, "a", 0, 4);
        assert_eq!(game.duel.station(1).unwrap().round_id, 2);
        assert_eq!(game.duel.player("b").unwrap().distance, 6);
        assert_eq!(game.duel.log.len(), 2);
    }

    #[test]
    fn test_stale_round_rejected() {
        let game = ready_game(DuelConfig::ladder(1), &["a", "b"]);
        let mut game = submit_duel_score(&game, "a", 2, 1);
        // a later round already resolved here by the time b's report lands
        game.duel.station_mut(1).unwrap().last_resolved_round = 3;
        let (next, status) = submit_duel_score_with_status(&game, "b", 1, 2);
        assert_eq!(status, SubmitStatus::Ignored { reason: IgnoreReason::StaleRound });
        assert_eq!(next, game);
    }

    #[test]
    fn test_max_distance_win_on_single_station_ladder() {
        let mut game = ready_game(DuelConfig::ladder(1), &["a", "b"]);
        set_distance(&mut game, "b", MAX_DISTANCE);
        let game = submit_duel_score(&game, "a", 1, 1);
        let game = submit_duel_score(&game, "b", 2, 2);

        let b = game.duel.player("b").unwrap();
        assert_eq!(b.points, 2);
        assert_eq!(b.distance, crate::START_DISTANCE, "reseated at the top");
        assert_eq!(game.status, GameStatus::Active);
        assert_eq!(game.duel.station(1).unwrap().players, vec!["b".to_string(), "a".to_string()]);
        assert!(!b.ready);
    }

    #[test]
    fn test_begin_next_round_clears_resolved_solo_round() {
        let game = ready_game(DuelConfig::solo(), &["a", "b"]);
        let game = submit_duel_score(&game, "a", 2, 1);
        let game = submit_duel_score(&game, "b", 2, 2);
        assert!(game.duel.pending[&1].resolved);

        let game = begin_next_round(&game, 1);
        assert!(game.duel.pending.is_empty());
        let (_, status) = submit_duel_score_with_status(&game, "a", 1, 3);
        assert_eq!(status, SubmitStatus::Pending { round_id: 2 });
    }

    #[test]
    fn test_solo_resubmission_replays_round() {
        let game = ready_game(DuelConfig::solo(), &["a", "b"]);
        let game = submit_duel_score(&game, "a", 2, 1);
        let game = submit_duel_score(&game, "b", 2, 2);
        assert_eq!(game.duel.log[0].outcome, RoundOutcome::Tie);

        // same distances: b's corrected report replays round 1
        let (game, status) = submit_duel_score_with_status(&game, "b", 1, 3);
        let expected = RoundOutcome::Win {
            winner_id: "a".into(),
            loser_id: "b".into(),
            points_awarded: 1,
        };
        assert_eq!(status, SubmitStatus::Resolved { round_id: 1, outcome: expected });
        assert_eq!(game.duel.log.len(), 1, "replaced, not appended");
        assert_eq!(game.duel.player("a").unwrap().wins, 1);
    }

    #[test]
    fn test_solo_win_opens_next_round_without_restoring() {
        let game = ready_game(DuelConfig::solo(), &["a", "b"]);
        let game = submit_duel_score(&game, "a", 3, 1);
        let game = submit_duel_score(&game, "b", 1, 2);
        assert_eq!(game.duel.player("a").unwrap().distance, 6);

        // a's distance moved on, so this is round 2 and not a correction
        let (game, status) = submit_duel_score_with_status(&game, "b", 2, 3);
        assert_eq!(status, SubmitStatus::Pending { round_id: 2 });
        let a = game.duel.player("a").unwrap();
        assert_eq!((a.distance, a.points, a.wins), (6, 1, 1));
        assert_eq!(game.duel.log.len(), 1);
        let pending = &game.duel.pending[&1];
        assert_eq!(pending.round_id, 2);
        assert!(!pending.resolved);
        assert!(pending.snapshot.is_none());
        assert_eq!(pending.submissions["b"].distance, 5);
    }

    fn finished_solo_game() -> DuelGame {
        let mut game = ready_game(DuelConfig::solo(), &["me", "ghost"]);
        set_distance(&mut game, "me", MAX_DISTANCE);
        let game = submit_duel_score(&game, "ghost", 1, 1);
        let game = submit_duel_score(&game, "me", 3, 2);
        assert_eq!(game.status, GameStatus::Finished);
        game
    }

    #[test]
    fn test_finished_game_keeps_last_round() {
        let game = finished_solo_game();
        let next = begin_next_round(&game, 1);
        assert_eq!(next, game);

        // further reports only correct the finishing round
        let next = submit_duel_score(&next, "ghost", 3, 3);
        let next = submit_duel_score(&next, "me", 0, 4);
        assert_eq!(next.status, GameStatus::Active);
        assert_eq!(next.winner_id, None);
        let ghost = next.duel.player("ghost").unwrap();
        assert_eq!((ghost.points, ghost.wins), (1, 1));
        assert_eq!(next.duel.log.len(), 1);
    }

    #[test]
    fn test_finished_game_ignores_new_rounds() {
        let mut game = finished_solo_game();
        game.duel.pending.clear();
        let (next, status) = submit_duel_score_with_status(&game, "ghost", 3, 3);
        assert_eq!(status, SubmitStatus::Ignored { reason: IgnoreReason::GameFinished });
        assert_eq!(next, game);
    }

    #[test]
    fn test_finish_still_undoable_after_begin_next_round() {
        let game = begin_next_round(&finished_solo_game(), 1);
        let undone = crate::snapshot::undo_submission(&game, 1, "me").unwrap();
        assert_eq!(undone.status, GameStatus::Active);
        assert_eq!(undone.duel.player("me").unwrap().points, 0);
    }

    #[test]
    fn test_status_serializes_tagged() {
        let json = serde_json::to_string(&SubmitStatus::Pending { round_id: 4 }).unwrap();
        assert_eq!(json, r#"{"kind":"pending","roundId":4}"#);
    }
}
