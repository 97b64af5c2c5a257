//! WASM bindings for the web client
//!
//! Game documents cross the boundary as JSON strings, the same shape the
//! client stores. Timestamps come from the browser clock.

#![cfg(feature = "wasm")]

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::{
    get_leaderboard_rows, get_opponent_id, has_pending_submission, is_station_ready, join_game,
    launch_duel_game, mark_player_ready, submit_duel_score_with_status, undo_submission,
    DuelConfig, DuelGame, Registration, SubmitStatus,
};

fn now() -> u64 {
    js_sys::Date::now() as u64
}

fn parse_game(game_json: &str) -> Result<DuelGame, JsError> {
    DuelGame::from_json(game_json).map_err(|e| JsError::new(&format!("Invalid game: {}", e)))
}

fn to_json(game: &DuelGame) -> Result<String, JsError> {
    game.to_json()
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Create an empty game document from a config JSON
#[wasm_bindgen]
pub fn create_game(config_json: &str) -> Result<String, JsError> {
    let config = DuelConfig::from_json(config_json)
        .map_err(|e| JsError::new(&format!("Invalid config: {}", e)))?;
    to_json(&DuelGame::new(config))
}

#[wasm_bindgen]
pub fn join(game_json: &str, player_id: &str, name: &str, email: Option<String>) -> Result<String, JsError> {
    let game = parse_game(game_json)?;
    let mut registration = Registration::new(player_id, name, now());
    registration.email = email;
    to_json(&join_game(&game, registration))
}

/// Seed the ladder and start play
#[wasm_bindgen]
pub fn launch(game_json: &str) -> Result<String, JsError> {
    let game = parse_game(game_json)?;
    to_json(&launch_duel_game(&game, now()))
}

#[wasm_bindgen]
pub fn mark_ready(game_json: &str, player_id: &str) -> Result<String, JsError> {
    let mut game = parse_game(game_json)?;
    game.duel = mark_player_ready(&game.duel, player_id);
    to_json(&game)
}

#[derive(Serialize)]
struct SubmitResult {
    game: String,
    status: SubmitStatus,
}

/// Submit a made-count.
///
/// Returns `{game, status}`; `status.kind == "ignored"` means the game
/// document is unchanged.
#[wasm_bindgen]
pub fn submit_score(game_json: &str, player_id: &str, made_count: u8) -> Result<JsValue, JsError> {
    let game = parse_game(game_json)?;
    let (next, status) = submit_duel_score_with_status(&game, player_id, made_count, now());
    let result = SubmitResult {
        game: to_json(&next)?,
        status,
    };
    serde_wasm_bindgen::to_value(&result)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

#[wasm_bindgen]
pub fn undo(game_json: &str, station_index: u32, player_id: &str) -> Result<String, JsError> {
    let game = parse_game(game_json)?;
    let next = undo_submission(&game, station_index, player_id)
        .map_err(|e| JsError::new(&e.to_string()))?;
    to_json(&next)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StationView {
    opponent_id: Option<String>,
    station_ready: bool,
    submitted: bool,
}

/// Everything a player's station screen polls for
#[wasm_bindgen]
pub fn station_view(game_json: &str, player_id: &str) -> Result<JsValue, JsError> {
    let game = parse_game(game_json)?;
    let station_index = game
        .duel
        .player(player_id)
        .and_then(|p| p.station_index);
    let view = StationView {
        opponent_id: get_opponent_id(&game.duel, player_id).cloned(),
        station_ready: station_index.is_some_and(|s| is_station_ready(&game.duel, s)),
        submitted: station_index.is_some_and(|s| has_pending_submission(&game.duel, s, player_id)),
    };
    serde_wasm_bindgen::to_value(&view)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

#[wasm_bindgen]
pub fn leaderboard(game_json: &str) -> Result<JsValue, JsError> {
    let game = parse_game(game_json)?;
    serde_wasm_bindgen::to_value(&get_leaderboard_rows(&game.duel))
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}
