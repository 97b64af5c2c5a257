//! Ladder state model
//!
//! Plain value types. Every transition clones the owned `DuelState`, mutates
//! the clone and hands it back, so nothing here is shared between calls.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{MAX_DISTANCE, START_DISTANCE};

/// Stable player identity (account id)
pub type PlayerId = String;
/// 1-based ladder position, 1 = top station
pub type StationIndex = u32;
pub type RoundId = u32;
/// Unix time in milliseconds, supplied by the host
pub type Timestamp = u64;

/// A player signing up for the game before or during play
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub joined_at: Timestamp,
}

impl Registration {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>, joined_at: Timestamp) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
            joined_at,
        }
    }
}

/// A ladder participant
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Station currently occupied; `None` while queued or unassigned
    #[serde(default)]
    pub station_index: Option<StationIndex>,
    /// Putting distance in metres, within [START_DISTANCE, MAX_DISTANCE]
    pub distance: u8,
    pub points: u32,
    pub wins: u32,
    pub losses: u32,
    pub ready: bool,
    /// Station the player is routed to while waiting in the queue
    #[serde(default)]
    pub desired_station: Option<StationIndex>,
    #[serde(default)]
    pub joined_at: Timestamp,
}

impl Player {
    /// Fresh player with zeroed counters, not seated and not ready
    pub fn from_registration(registration: &Registration) -> Self {
        Self {
            id: registration.id.clone(),
            name: registration.name.clone(),
            email: registration.email.clone(),
            station_index: None,
            distance: START_DISTANCE,
            points: 0,
            wins: 0,
            losses: 0,
            ready: false,
            desired_station: None,
            joined_at: registration.joined_at,
        }
    }

    pub fn registration(&self) -> Registration {
        Registration {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            joined_at: self.joined_at,
        }
    }

    pub fn distance_in_range(&self) -> bool {
        (START_DISTANCE..=MAX_DISTANCE).contains(&self.distance)
    }
}

/// One ladder rung holding up to two contenders
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub index: StationIndex,
    pub players: Vec<PlayerId>,
    /// Most recently started round at this station
    #[serde(default)]
    pub round_id: RoundId,
    /// Highest round fully resolved here; guards against stale resolutions
    #[serde(default)]
    pub last_resolved_round: RoundId,
}

impl Station {
    pub const CAPACITY: usize = 2;

    pub fn new(index: StationIndex) -> Self {
        Self {
            index,
            players: Vec::with_capacity(Self::CAPACITY),
            round_id: 0,
            last_resolved_round: 0,
        }
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= Self::CAPACITY
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.players.iter().any(|id| id == player_id)
    }

    /// The other occupant, if `player_id` sits here and is not alone
    pub fn opponent_of(&self, player_id: &str) -> Option<&PlayerId> {
        if !self.has_player(player_id) {
            return None;
        }
        self.players.iter().find(|id| id.as_str() != player_id)
    }
}

/// One side's report for a round
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub made_count: u8,
    /// Distance the putts were thrown from
    pub distance: u8,
    pub submitted_at: Timestamp,
}

/// Mutable fields of one player, saved before a solo round resolves
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub station_index: Option<StationIndex>,
    pub distance: u8,
    pub points: u32,
    pub wins: u32,
    pub losses: u32,
    pub ready: bool,
    pub desired_station: Option<StationIndex>,
}

impl PlayerSnapshot {
    pub fn of(player: &Player) -> Self {
        Self {
            id: player.id.clone(),
            station_index: player.station_index,
            distance: player.distance,
            points: player.points,
            wins: player.wins,
            losses: player.losses,
            ready: player.ready,
            desired_station: player.desired_station,
        }
    }

    pub(crate) fn apply_to(&self, player: &mut Player) {
        player.station_index = self.station_index;
        player.distance = self.distance;
        player.points = self.points;
        player.wins = self.wins;
        player.losses = self.losses;
        player.ready = self.ready;
        player.desired_station = self.desired_station;
    }
}

/// Point-in-time copy of both seats, the station's round counters and
/// game-level status
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSnapshot {
    pub players: Vec<PlayerSnapshot>,
    #[serde(default)]
    pub station_round_id: RoundId,
    #[serde(default)]
    pub last_resolved_round: RoundId,
    pub status: crate::game::GameStatus,
    pub winner_id: Option<PlayerId>,
    pub ended_at: Option<Timestamp>,
}

/// In-flight submissions for a station's current round
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRound {
    pub round_id: RoundId,
    pub submissions: BTreeMap<PlayerId, Submission>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<RoundSnapshot>,
}

impl PendingRound {
    pub fn new(round_id: RoundId) -> Self {
        Self {
            round_id,
            submissions: BTreeMap::new(),
            resolved: false,
            snapshot: None,
        }
    }

    /// A resolved round whose recorded distances no longer match the players
    /// means a new physical round has begun since it resolved.
    ///
    /// A player whose distance did not change between rounds (a loser, or
    /// anyone after a tie) looks identical to a resubmission of the old round.
    /// Hosts that know better call `begin_next_round` first.
    pub fn is_stale(&self, players: &BTreeMap<PlayerId, Player>) -> bool {
        self.submissions.iter().any(|(id, submission)| {
            players
                .get(id)
                .map_or(true, |player| player.distance != submission.distance)
        })
    }
}

/// Result of a resolved round
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RoundOutcome {
    Tie,
    Win {
        winner_id: PlayerId,
        loser_id: PlayerId,
        points_awarded: u8,
    },
}

impl RoundOutcome {
    pub fn winner(&self) -> Option<&PlayerId> {
        match self {
            RoundOutcome::Tie => None,
            RoundOutcome::Win { winner_id, .. } => Some(winner_id),
        }
    }
}

/// Audit record for one resolved round
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// `"{station}-{round}"`
    pub id: String,
    pub timestamp: Timestamp,
    pub station_index: StationIndex,
    pub player_a: PlayerId,
    pub player_b: PlayerId,
    pub made_a: u8,
    pub made_b: u8,
    pub distance_a: u8,
    pub distance_b: u8,
    pub outcome: RoundOutcome,
}

pub fn log_entry_id(station_index: StationIndex, round_id: RoundId) -> String {
    format!("{}-{}", station_index, round_id)
}

/// Root aggregate of the duel ladder
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuelState {
    #[serde(default)]
    pub players: BTreeMap<PlayerId, Player>,
    #[serde(default)]
    pub stations: Vec<Station>,
    #[serde(default)]
    pub queue: Vec<PlayerId>,
    #[serde(default)]
    pub pending: BTreeMap<StationIndex, PendingRound>,
    #[serde(default)]
    pub log: Vec<LogEntry>,
}

impl DuelState {
    /// Empty ladder; a station count of 0 is raised to 1
    pub fn new(station_count: u32) -> Self {
        Self {
            players: BTreeMap::new(),
            stations: (1..=station_count.max(1)).map(Station::new).collect(),
            queue: Vec::new(),
            pending: BTreeMap::new(),
            log: Vec::new(),
        }
    }

    pub fn station_count(&self) -> u32 {
        self.stations.len() as u32
    }

    pub fn station(&self, station_index: StationIndex) -> Option<&Station> {
        let position = (station_index as usize).checked_sub(1)?;
        self.stations.get(position)
    }

    pub fn station_mut(&mut self, station_index: StationIndex) -> Option<&mut Station> {
        let position = (station_index as usize).checked_sub(1)?;
        self.stations.get_mut(position)
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.get(player_id)
    }

    pub fn is_queued(&self, player_id: &str) -> bool {
        self.queue.iter().any(|id| id == player_id)
    }
}
