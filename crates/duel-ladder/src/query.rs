//! Read-only lookups used by the host UI

use serde::{Deserialize, Serialize};

use crate::state::{DuelState, PlayerId, StationIndex};

/// One leaderboard line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub id: PlayerId,
    pub name: String,
    pub points: u32,
    pub wins: u32,
    pub losses: u32,
    pub station: Option<StationIndex>,
}

pub fn get_station_players(state: &DuelState, station_index: StationIndex) -> &[PlayerId] {
    state
        .station(station_index)
        .map(|station| station.players.as_slice())
        .unwrap_or(&[])
}

pub fn get_opponent_id<'a>(state: &'a DuelState, player_id: &str) -> Option<&'a PlayerId> {
    let station_index = state.player(player_id)?.station_index?;
    state.station(station_index)?.opponent_of(player_id)
}

pub fn has_pending_submission(state: &DuelState, station_index: StationIndex, player_id: &str) -> bool {
    state
        .pending
        .get(&station_index)
        .is_some_and(|pending| pending.submissions.contains_key(player_id))
}

/// Both seats taken and both occupants ready
pub fn is_station_ready(state: &DuelState, station_index: StationIndex) -> bool {
    let Some(station) = state.station(station_index) else {
        return false;
    };
    station.is_full()
        && station
            .players
            .iter()
            .all(|id| state.player(id).is_some_and(|p| p.ready))
}

/// Players by points, highest first; ties keep join order
pub fn get_leaderboard_rows(state: &DuelState) -> Vec<LeaderboardRow> {
    let mut players: Vec<_> = state.players.values().collect();
    players.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| a.joined_at.cmp(&b.joined_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    players
        .into_iter()
        .map(|player| LeaderboardRow {
            id: player.id.clone(),
            name: player.name.clone(),
            points: player.points,
            wins: player.wins,
            losses: player.losses,
            station: player.station_index,
        })
        .collect()
}
