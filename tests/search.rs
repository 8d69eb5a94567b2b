/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::Duration;

use prodigy::{
    legal_moves, Algorithm, Color, Engine, EvaluationPolicy, Position, SearchConfig, UctPolicy,
    FEN_KIWIPETE, FEN_POSITION_3,
};

fn config(threads: usize, simulations: Option<u32>) -> SearchConfig {
    SearchConfig {
        threads,
        arena_bytes: 1 << 24,
        simulations,
        ..Default::default()
    }
}

#[test]
fn test_simulation_limit_is_exact() {
    for threads in [1, 2, 4] {
        let mut algorithm = Algorithm::from_config(&config(threads, None));
        algorithm
            .start(Position::from_fen(FEN_POSITION_3).unwrap(), Some(1_500))
            .unwrap();
        let tree = algorithm.join_tree().unwrap();
        assert_eq!(tree.simulation_count(), 1_500, "{threads} threads");
    }
}

#[test]
fn test_best_move_is_legal() {
    let position = Position::from_fen(FEN_KIWIPETE).unwrap();
    let mut algorithm = Algorithm::from_config(&config(2, None));
    algorithm.start(position, Some(2_000)).unwrap();

    let best = algorithm.join().unwrap().unwrap();
    assert!(legal_moves(&position).contains(&best));
}

#[test]
fn test_takes_hanging_queen() {
    // Black's queen is undefended on d5
    let position = Position::from_fen("4k3/8/8/3q4/8/8/3R4/4K3 w - - 0 1").unwrap();
    let mut engine = Engine::new(config(2, Some(5_000)));
    let best = engine.search(position, None).unwrap().unwrap();
    assert_eq!(best.to_string(), "d2d5");
}

#[test]
fn test_custom_policies() {
    let mut algorithm = Algorithm::new(
        1,
        1 << 22,
        EvaluationPolicy::default,
        || UctPolicy::new(0.5),
    );
    algorithm.start(Position::default(), Some(100)).unwrap();
    assert!(algorithm.join().unwrap().is_some());
}

#[test]
fn test_lifecycle_errors() {
    let mut algorithm = Algorithm::from_config(&config(2, None));
    assert_eq!(algorithm.stop().unwrap_err().to_string(), "Not searching.");

    algorithm.start(Position::default(), None).unwrap();
    assert_eq!(
        algorithm.start(Position::default(), None).unwrap_err().to_string(),
        "Already searching."
    );

    std::thread::sleep(Duration::from_millis(20));
    algorithm.stop().unwrap();
    let best = algorithm.join().unwrap().unwrap();
    assert!(legal_moves(&Position::default()).contains(&best));
    assert_eq!(algorithm.poll().unwrap_err().to_string(), "Not searching.");
}

#[test]
fn test_engine_reports_moves_in_uci() {
    let position = Position::from_fen("4k3/8/8/8/8/8/4p3/7K b - - 0 1").unwrap();
    let mut engine = Engine::new(config(1, Some(300)));
    let best = engine
        .search(position, Some(Duration::from_secs(5)))
        .unwrap()
        .unwrap();

    let legal = legal_moves(&position)
        .iter()
        .map(|mv| mv.to_uci(Color::Black).to_string())
        .collect::<Vec<_>>();
    assert!(legal.contains(&best.to_string()), "{best} not in {legal:?}");
}
