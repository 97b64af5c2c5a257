//! Game aggregate wrapping the ladder state

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::{DuelConfig, DuelMode};
use crate::error::DuelError;
use crate::state::{DuelState, PlayerId, Registration, Timestamp};

/// Game-level lifecycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameStatus {
    /// Players are joining; the ladder has not been seeded yet.
    #[default]
    Lobby,
    Active,
    /// Reached only through a single-station solo promotion.
    Finished,
    /// Closed by the host; submissions are ignored.
    Abandoned,
}

/// A duel game document as loaded from and saved to the store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuelGame {
    pub config: DuelConfig,
    #[serde(default)]
    pub status: GameStatus,
    #[serde(default)]
    pub winner_id: Option<PlayerId>,
    #[serde(default)]
    pub started_at: Option<Timestamp>,
    #[serde(default)]
    pub ended_at: Option<Timestamp>,
    #[serde(default)]
    pub registrations: Vec<Registration>,
    #[serde(default)]
    pub duel: DuelState,
}

impl DuelGame {
    pub fn new(config: DuelConfig) -> Self {
        let duel = DuelState::new(config.station_count);
        Self {
            config,
            status: GameStatus::Lobby,
            winner_id: None,
            started_at: None,
            ended_at: None,
            registrations: Vec::new(),
            duel,
        }
    }

    /// Solo rules (snapshots, game finish) apply only on a single station.
    pub fn is_solo(&self) -> bool {
        self.config.mode == DuelMode::Solo && self.duel.station_count() == 1
    }

    pub fn is_over(&self) -> bool {
        matches!(self.status, GameStatus::Finished | GameStatus::Abandoned)
    }

    pub fn from_json(json: &str) -> Result<Self, DuelError> {
        let game: Self = serde_json::from_str(json)?;
        game.config.validate()?;
        Ok(game)
    }

    pub fn to_json(&self) -> Result<String, DuelError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Host closes the game early
pub fn abandon_game(game: &DuelGame, now: Timestamp) -> DuelGame {
    let mut next = game.clone();
    if next.is_over() {
        return next;
    }
    next.status = GameStatus::Abandoned;
    next.ended_at = Some(now);
    info!("duel game abandoned with {} players", next.duel.players.len());
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_game_matches_config() {
        let game = DuelGame::new(DuelConfig::ladder(3));
        assert_eq!(game.status, GameStatus::Lobby);
        assert_eq!(game.duel.station_count(), 3);
        assert!(!game.is_solo());
        assert!(DuelGame::new(DuelConfig::solo()).is_solo());
    }

    #[test]
    fn test_solo_mode_on_many_stations_plays_standard() {
        let mut config = DuelConfig::ladder(2);
        config.mode = DuelMode::Solo;
        assert!(!DuelGame::new(config).is_solo());
    }

    #[test]
    fn test_abandon() {
        let game = DuelGame::new(DuelConfig::ladder(2));
        let abandoned = abandon_game(&game, 500);
        assert_eq!(abandoned.status, GameStatus::Abandoned);
        assert_eq!(abandoned.ended_at, Some(500));

        let again = abandon_game(&abandoned, 900);
        assert_eq!(again.ended_at, Some(500));
    }

    #[test]
    fn test_json_document_round_trip() {
        let mut game = DuelGame::new(DuelConfig::solo());
        game.registrations.push(Registration::new("u1", "Mari", 10));
        let json = game.to_json().unwrap();
        assert!(json.contains("\"stationCount\":1"));
        assert_eq!(DuelGame::from_json(&json).unwrap(), game);
    }

    #[test]
    fn test_minimal_document() {
        let game = DuelGame::from_json(r#"{"config": {"stationCount": 2}}"#).unwrap();
        assert_eq!(game.status, GameStatus::Lobby);
        assert!(game.duel.stations.is_empty(), "stations appear once initialized");
    }
}
