//! Roster and queue management
//!
//! In-place operations on an owned `DuelState`, used by the transitions,
//! plus the pure roster transitions exposed to hosts.

use log::{debug, warn};

use crate::invariants::debug_assert_preserved;
use crate::state::{DuelState, Player, PlayerId, Registration, Station, StationIndex};
use crate::START_DISTANCE;

impl DuelState {
    /// Insert a new player with defaults and queue them.
    ///
    /// Returns `false` (state untouched) when the id is already known.
    pub fn add_player(&mut self, registration: &Registration) -> bool {
        if self.players.contains_key(&registration.id) {
            return false;
        }
        self.players
            .insert(registration.id.clone(), Player::from_registration(registration));
        if !self.is_queued(&registration.id) {
            self.queue.push(registration.id.clone());
        }
        true
    }

    /// Seat a player at a station, resetting readiness and distance.
    ///
    /// Fails when the station does not exist or already holds two players.
    pub fn assign_player_to_station(&mut self, player_id: &str, station_index: StationIndex) -> bool {
        if !self.players.contains_key(player_id) {
            return false;
        }
        let Some(station) = self.station(station_index) else {
            return false;
        };
        if station.has_player(player_id) {
            return true;
        }
        if station.is_full() {
            return false;
        }

        self.remove_player_from_station(player_id);
        self.queue.retain(|id| id != player_id);
        if let Some(station) = self.station_mut(station_index) {
            station.players.push(player_id.to_string());
        }
        if let Some(player) = self.players.get_mut(player_id) {
            player.station_index = Some(station_index);
            player.ready = false;
            player.distance = START_DISTANCE;
            player.desired_station = Some(station_index);
        }
        true
    }

    /// Send a player to the back of the queue, routed to `desired_station`
    pub fn enqueue_player(&mut self, player_id: &str, desired_station: StationIndex) {
        if !self.players.contains_key(player_id) {
            return;
        }
        self.remove_player_from_station(player_id);
        if let Some(player) = self.players.get_mut(player_id) {
            player.ready = false;
            player.desired_station = Some(desired_station);
        }
        if !self.is_queued(player_id) {
            self.queue.push(player_id.to_string());
        }
    }

    pub fn remove_player_from_station(&mut self, player_id: &str) {
        let Some(station_index) = self.players.get(player_id).and_then(|p| p.station_index) else {
            return;
        };
        if let Some(station) = self.station_mut(station_index) {
            station.players.retain(|id| id != player_id);
        }
        if let Some(player) = self.players.get_mut(player_id) {
            player.station_index = None;
        }
    }

    /// Targeted refill: an open seat only takes queued players routed to it,
    /// earliest in the queue first.
    pub fn fill_stations_from_queue(&mut self) {
        for position in 0..self.stations.len() {
            let station_index = self.stations[position].index;
            while !self.stations[position].is_full() {
                let candidate = self.queue.iter().position(|id| {
                    self.players.get(id).and_then(|p| p.desired_station) == Some(station_index)
                });
                let Some(at) = candidate else {
                    break;
                };
                let player_id = self.queue.remove(at);
                if !self.assign_player_to_station(&player_id, station_index) {
                    self.queue.insert(at, player_id);
                    break;
                }
                debug!("station {}: seated {} from queue", station_index, player_id);
            }
        }
    }

    /// Resize the ladder without losing anyone.
    ///
    /// Players on removed stations are queued toward the new bottom station,
    /// pending rounds of removed stations are dropped and queued players routed
    /// past the bottom are re-routed to it.
    pub fn ensure_stations(&mut self, station_count: u32) {
        let station_count = station_count.max(1);
        let current = self.station_count();
        if current == station_count {
            return;
        }

        if station_count > current {
            self.stations
                .extend((current + 1..=station_count).map(Station::new));
        } else {
            let removed: Vec<Station> = self.stations.drain(station_count as usize..).collect();
            for station in removed {
                for player_id in station.players {
                    warn!(
                        "station {} removed, queueing {} toward station {}",
                        station.index, player_id, station_count
                    );
                    self.enqueue_player(&player_id, station_count);
                }
            }
            self.pending.retain(|index, _| *index <= station_count);
        }

        for player_id in &self.queue {
            if let Some(player) = self.players.get_mut(player_id) {
                if player.desired_station.is_some_and(|s| s > station_count) {
                    player.desired_station = Some(station_count);
                }
            }
        }
        self.fill_stations_from_queue();
    }
}

/// Add a player to the ladder; re-adding a known id changes nothing.
pub fn add_player_to_state(state: &DuelState, registration: &Registration) -> DuelState {
    let mut next = state.clone();
    next.add_player(registration);
    debug_assert_preserved(state, &next);
    next
}

/// Mark a seated player ready for the next round
pub fn mark_player_ready(state: &DuelState, player_id: &str) -> DuelState {
    let mut next = state.clone();
    match next.players.get_mut(player_id) {
        Some(player) if player.station_index.is_some() => player.ready = true,
        _ => debug!("ready ignored for {}: not seated", player_id),
    }
    next
}

/// Clear readiness at a station, for hosts unsticking a round nobody submits
pub fn clear_station_readiness(state: &DuelState, station_index: StationIndex) -> DuelState {
    let mut next = state.clone();
    let seated: Vec<PlayerId> = next
        .station(station_index)
        .map(|s| s.players.clone())
        .unwrap_or_default();
    for player_id in &seated {
        if let Some(player) = next.players.get_mut(player_id) {
            player.ready = false;
        }
    }
    next
}
