//! Persistence contract consumed by hosts
//!
//! The engine never performs I/O. Hosts read a game, run exactly one
//! transition and write the whole document back, rejecting the write when
//! the document changed in between. Retrying is the host's decision.

use std::collections::HashMap;

use log::debug;
use thiserror::Error;

use crate::error::DuelError;
use crate::game::DuelGame;

pub type GameId = String;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("game {0} not found")]
    NotFound(GameId),

    #[error("game {game_id} changed since version {expected} (now {actual})")]
    VersionConflict {
        game_id: GameId,
        expected: u64,
        actual: u64,
    },

    #[error(transparent)]
    Duel(#[from] DuelError),
}

/// A loaded document and the version it was read at
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

pub trait DuelStore {
    fn load(&self, game_id: &str) -> Result<Versioned<DuelGame>, StoreError>;

    /// Replace the document. `expected_version` of `None` creates or
    /// overwrites unconditionally; otherwise the stored version must match.
    /// Returns the new version.
    fn save(
        &mut self,
        game_id: &str,
        expected_version: Option<u64>,
        game: &DuelGame,
    ) -> Result<u64, StoreError>;
}

/// One read-transition-write cycle. A concurrent write surfaces as
/// `VersionConflict`; nothing is retried here.
pub fn transact<S, F>(store: &mut S, game_id: &str, transition: F) -> Result<DuelGame, StoreError>
where
    S: DuelStore + ?Sized,
    F: FnOnce(&DuelGame) -> Result<DuelGame, DuelError>,
{
    let current = store.load(game_id)?;
    let next = transition(&current.value)?;
    if next == current.value {
        debug!("game {}: transition changed nothing, skipping write", game_id);
        return Ok(next);
    }
    store.save(game_id, Some(current.version), &next)?;
    Ok(next)
}

/// In-memory document store holding serialized JSON, for tests and local play
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: HashMap<GameId, Versioned<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DuelStore for MemoryStore {
    fn load(&self, game_id: &str) -> Result<Versioned<DuelGame>, StoreError> {
        let document = self
            .documents
            .get(game_id)
            .ok_or_else(|| StoreError::NotFound(game_id.to_string()))?;
        Ok(Versioned {
            version: document.version,
            value: DuelGame::from_json(&document.value)?,
        })
    }

    fn save(
        &mut self,
        game_id: &str,
        expected_version: Option<u64>,
        game: &DuelGame,
    ) -> Result<u64, StoreError> {
        let actual = self.documents.get(game_id).map_or(0, |d| d.version);
        if let Some(expected) = expected_version {
            if expected != actual {
                return Err(StoreError::VersionConflict {
                    game_id: game_id.to_string(),
                    expected,
                    actual,
                });
            }
        }
        let version = actual + 1;
        self.documents.insert(
            game_id.to_string(),
            Versioned {
                version,
                value: game.to_json()?,
            },
        );
        Ok(version)
    }
}
