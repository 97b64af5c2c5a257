//! Session bootstrap: empty ladders, joins and the initial seeding

use log::{info, warn};

use crate::game::{DuelGame, GameStatus};
use crate::invariants::debug_assert_preserved;
use crate::state::{DuelState, Player, Registration, Timestamp};

pub fn create_empty_duel_state(station_count: u32) -> DuelState {
    DuelState::new(station_count)
}

/// Ladder state for `game` with the configured station count and every
/// registration present as a player. Existing players keep their fields.
pub fn initialize_duel_game_state(game: &DuelGame) -> DuelState {
    let mut state = game.duel.clone();
    state.ensure_stations(game.config.station_count);
    for registration in &game.registrations {
        state.add_player(registration);
    }
    state
}

/// Register a player with the game; joining twice changes nothing.
///
/// Late joiners of a running game wait in the queue for the bottom station.
pub fn join_game(game: &DuelGame, registration: Registration) -> DuelGame {
    let mut next = game.clone();
    if next.registrations.iter().any(|r| r.id == registration.id) {
        return next;
    }
    next.duel.add_player(&registration);
    if next.status == GameStatus::Active {
        let bottom = next.duel.station_count();
        next.duel.enqueue_player(&registration.id, bottom);
        next.duel.fill_stations_from_queue();
    }
    next.registrations.push(registration);
    debug_assert_preserved(&game.duel, &next.duel);
    next
}

/// Seed a fresh ladder.
///
/// Players are ordered by join time (ties by id), seated two per station from
/// station 1 downward, and the rest queue for the bottom station.
pub fn start_duel_game(game: &DuelGame) -> DuelState {
    let known = initialize_duel_game_state(game);
    let mut roster: Vec<&Player> = known.players.values().collect();
    roster.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.id.cmp(&b.id)));

    let station_count = known.station_count();
    let mut state = DuelState::new(station_count);
    for player in &roster {
        state
            .players
            .insert(player.id.clone(), Player::from_registration(&player.registration()));
    }

    for (position, player) in roster.iter().enumerate() {
        let station_index = (position / 2) as u32 + 1;
        if station_index <= station_count && state.assign_player_to_station(&player.id, station_index) {
            continue;
        }
        state.enqueue_player(&player.id, station_count);
    }

    info!(
        "duel ladder seeded: {} players on {} stations, {} queued",
        roster.len(),
        station_count,
        state.queue.len()
    );
    state
}

/// Seed the ladder and move the game into play.
///
/// Only a game still in the lobby is launched; any other game is returned
/// unchanged so progress is never reseeded away.
pub fn launch_duel_game(game: &DuelGame, now: Timestamp) -> DuelGame {
    let mut next = game.clone();
    if game.status != GameStatus::Lobby {
        warn!("launch ignored, game is already {:?}", game.status);
        return next;
    }
    next.duel = start_duel_game(game);
    next.status = GameStatus::Active;
    next.started_at = Some(now);
    next.winner_id = None;
    next.ended_at = None;
    next
}
