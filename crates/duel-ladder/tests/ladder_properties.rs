//! Property tests: ladder invariants hold under arbitrary play

use proptest::prelude::*;

use duel_ladder::{
    add_player_to_state, begin_next_round, check_invariants, clear_station_readiness, join_game,
    launch_duel_game, mark_player_ready, submit_duel_score, undo_submission, DuelConfig, DuelGame,
    DuelMode, DuelState, Registration, MAX_DISTANCE, START_DISTANCE,
};

const PLAYER_POOL: usize = 9;

#[derive(Clone, Debug)]
enum Op {
    Ready(usize),
    Submit(usize, u8),
    Undo(u32, usize),
    Join(usize),
    ClearReadiness(u32),
    NextRound(u32),
}

fn player_id(index: usize) -> String {
    format!("p{}", index % PLAYER_POOL)
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..PLAYER_POOL).prop_map(Op::Ready),
        6 => (0..PLAYER_POOL, 0u8..=3).prop_map(|(p, made)| Op::Submit(p, made)),
        1 => (1u32..=4, 0..PLAYER_POOL).prop_map(|(s, p)| Op::Undo(s, p)),
        1 => (0..PLAYER_POOL).prop_map(Op::Join),
        1 => (1u32..=4).prop_map(Op::ClearReadiness),
        1 => (1u32..=4).prop_map(Op::NextRound),
    ]
}

fn launched(config: DuelConfig, players: usize) -> DuelGame {
    let mut game = DuelGame::new(config);
    for i in 0..players {
        game = join_game(&game, Registration::new(player_id(i), format!("Player {}", i), i as u64));
    }
    launch_duel_game(&game, 0)
}

fn apply(game: &DuelGame, op: &Op, now: u64) -> DuelGame {
    match op {
        Op::Ready(p) => {
            let mut next = game.clone();
            next.duel = mark_player_ready(&game.duel, &player_id(*p));
            next
        }
        Op::Submit(p, made) => submit_duel_score(game, &player_id(*p), *made, now),
        Op::Undo(station, p) => {
            undo_submission(game, *station, &player_id(*p)).unwrap_or_else(|_| game.clone())
        }
        Op::Join(p) => join_game(game, Registration::new(player_id(*p), "late", now)),
        Op::ClearReadiness(station) => {
            let mut next = game.clone();
            next.duel = clear_station_readiness(&game.duel, *station);
            next
        }
        Op::NextRound(station) => begin_next_round(game, *station),
    }
}

fn config_strategy() -> impl Strategy<Value = DuelConfig> {
    prop_oneof![
        (1u32..=4).prop_map(DuelConfig::ladder),
        Just(DuelConfig::solo()),
    ]
}

proptest! {
    #[test]
    fn prop_invariants_hold_under_play(
        config in config_strategy(),
        players in 2usize..=PLAYER_POOL,
        ops in prop::collection::vec(op_strategy(), 0..80),
    ) {
        let mut game = launched(config, players);
        check_invariants(&game.duel).unwrap();

        for (step, op) in ops.iter().enumerate() {
            let before = game.clone();
            game = apply(&game, op, step as u64 + 1);
            prop_assert!(
                check_invariants(&game.duel).is_ok(),
                "{:?} broke the ladder: {:?}", op, check_invariants(&game.duel)
            );
            for player in game.duel.players.values() {
                prop_assert!((START_DISTANCE..=MAX_DISTANCE).contains(&player.distance));
                if let Some(old) = before.duel.players.get(&player.id) {
                    // counters only move backwards through undo
                    if !matches!(op, Op::Undo(..) | Op::Submit(..)) {
                        prop_assert_eq!(player.points, old.points);
                    }
                }
            }
            for station in &game.duel.stations {
                prop_assert!(station.players.len() <= 2);
            }
        }
    }

    #[test]
    fn prop_multiplayer_points_never_decrease(
        stations in 1u32..=3,
        players in 2usize..=PLAYER_POOL,
        ops in prop::collection::vec(op_strategy(), 0..80),
    ) {
        let mut game = launched(DuelConfig::ladder(stations), players);
        for (step, op) in ops.iter().enumerate() {
            let before = game.clone();
            game = apply(&game, op, step as u64 + 1);
            for player in game.duel.players.values() {
                if let Some(old) = before.duel.players.get(&player.id) {
                    prop_assert!(player.points >= old.points);
                    prop_assert!(player.wins >= old.wins);
                    prop_assert!(player.losses >= old.losses);
                }
            }
        }
    }

    #[test]
    fn prop_add_player_idempotent(ids in prop::collection::vec(0..PLAYER_POOL, 1..20)) {
        let mut once = DuelState::new(2);
        for id in &ids {
            let registration = Registration::new(player_id(*id), "x", *id as u64);
            once = add_player_to_state(&once, &registration);
            let twice = add_player_to_state(&once, &registration);
            prop_assert_eq!(&once, &twice);
        }
        check_invariants(&once).unwrap();
    }

    #[test]
    fn prop_solo_submit_undo_restores_players(
        distance_a in START_DISTANCE..=MAX_DISTANCE,
        distance_b in START_DISTANCE..=MAX_DISTANCE,
        made_a in 0u8..=3,
        made_b in 0u8..=3,
    ) {
        let mut game = launched(DuelConfig::solo(), 2);
        let a = player_id(0);
        let b = player_id(1);
        game.duel.players.get_mut(&a).unwrap().distance = distance_a;
        game.duel.players.get_mut(&b).unwrap().distance = distance_b;
        game.duel = mark_player_ready(&mark_player_ready(&game.duel, &a), &b);
        prop_assert_eq!(game.config.mode, DuelMode::Solo);

        let played = submit_duel_score(&game, &a, made_a, 1);
        let played = submit_duel_score(&played, &b, made_b, 2);
        let undone = undo_submission(&played, 1, &b).unwrap();

        prop_assert_eq!(&undone.duel.players, &game.duel.players);
        prop_assert_eq!(undone.status, game.status);
        prop_assert!(undone.duel.log.is_empty());
    }
}
