//! Structural invariants of the ladder state

use std::collections::BTreeSet;

use crate::error::DuelError;
use crate::state::{DuelState, Station};

/// Check every structural invariant of a ladder state.
///
/// - stations are numbered 1..=n in order and hold at most two distinct players
/// - seat membership and `station_index` agree in both directions
/// - every distance is within [START_DISTANCE, MAX_DISTANCE]
/// - the queue has no duplicates, no unknown ids and no seated players
pub fn check_invariants(state: &DuelState) -> Result<(), DuelError> {
    for (position, station) in state.stations.iter().enumerate() {
        if station.index as usize != position + 1 {
            return Err(DuelError::StationOrder(position));
        }
        if station.players.len() > Station::CAPACITY {
            return Err(DuelError::StationOverfull(station.index));
        }
        if station.players.len() == Station::CAPACITY && station.players[0] == station.players[1] {
            return Err(DuelError::StationMismatch(station.players[0].clone()));
        }
        for player_id in &station.players {
            let player = state
                .players
                .get(player_id)
                .ok_or(DuelError::UnknownStationMember(station.index))?;
            if player.station_index != Some(station.index) {
                return Err(DuelError::StationMismatch(player_id.clone()));
            }
        }
    }

    for player in state.players.values() {
        if let Some(station_index) = player.station_index {
            let seated = state
                .station(station_index)
                .is_some_and(|station| station.has_player(&player.id));
            if !seated {
                return Err(DuelError::StationMismatch(player.id.clone()));
            }
        }
        if !player.distance_in_range() {
            return Err(DuelError::DistanceOutOfRange {
                player_id: player.id.clone(),
                distance: player.distance,
            });
        }
    }

    let mut seen = BTreeSet::new();
    for player_id in &state.queue {
        let waiting = state
            .players
            .get(player_id)
            .is_some_and(|player| player.station_index.is_none());
        if !waiting || !seen.insert(player_id) {
            return Err(DuelError::QueueCorrupt(player_id.clone()));
        }
    }

    Ok(())
}

/// Debug-build guard for transitions: a valid input must yield a valid output.
pub(crate) fn debug_assert_preserved(before: &DuelState, after: &DuelState) {
    if cfg!(debug_assertions) && check_invariants(before).is_ok() {
        if let Err(err) = check_invariants(after) {
            panic!("ladder transition broke an invariant: {}", err);
        }
    }
}
