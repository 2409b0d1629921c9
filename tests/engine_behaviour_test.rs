//! Search engine determinism and convergence.

use azul_analyzer::game::get_legal_moves::get_legal_moves;
use azul_analyzer::game::notation::parse;
use azul_analyzer::game::tile::Color;
use azul_analyzer::mcts::rollout::HeuristicRollout;
use azul_analyzer::mcts::{mcts_search, MctsConfig};
use azul_analyzer::search::alphabeta::search;
use azul_analyzer::search::{CancelToken, SearchConfig};
use azul_analyzer::Position;
use rand::rngs::StdRng;
use rand::SeedableRng;

const MIDGAME: &str = "BBYR|----|KKWW|YRRR|----/FBYYK/B----|-----|-----|-K---|-----/R|--|YYY|----|-----/K/-----|W----|-----|-----|-----/-|BB|---|RR--|-----/-/7,3/2/0";

/// Player 0 has four blue on the five-tile line and a wall row missing only
/// blue; one blue is left in the center next to six yellow.
const ROW_FINISH: &str = "----|----|----|----|----/FBYYYYYY/-----|-----|-----|-----|YRKW-/-|--|---|----|BBBB-/-/-----|-----|-----|-----|-----/-|--|---|----|-----/-/10,0/5/0";

#[test]
fn test_alpha_beta_is_deterministic() {
    let position = parse(MIDGAME).unwrap();
    let config = SearchConfig {
        max_depth: 3,
        ..SearchConfig::default()
    };
    let a = search(&position, &config, CancelToken::new());
    let b = search(&position, &config, CancelToken::new());

    assert_eq!(a.best_move, b.best_move);
    assert_eq!(a.score, b.score);
    assert_eq!(a.principal_variation, b.principal_variation);
    assert_eq!(a.nodes, b.nodes);
    assert_eq!(a.completed_depth, 3);
    assert!(!a.stopped);
}

#[test]
fn test_alpha_beta_on_fresh_opening_returns_legal_move() {
    let mut rng = StdRng::seed_from_u64(2);
    let position = Position::new_game(&mut rng);
    let result = search(
        &position,
        &SearchConfig {
            max_depth: 2,
            ..SearchConfig::default()
        },
        CancelToken::new(),
    );
    let best = result.best_move.unwrap();
    assert!(get_legal_moves(&position).contains(&best));
}

#[test]
fn test_mcts_visit_share_of_dominant_move_grows_with_budget() {
    let position = parse(ROW_FINISH).unwrap();
    let dominant = get_legal_moves(&position)
        .into_iter()
        .find(|m| m.color() == Color::Blue && m.pattern_line_dest() == Some(4))
        .unwrap();
    let policy = HeuristicRollout::default();

    let small = mcts_search(&position, &MctsConfig::with_rollouts(100), &policy, &CancelToken::new()).unwrap();
    let large = mcts_search(&position, &MctsConfig::with_rollouts(2000), &policy, &CancelToken::new()).unwrap();

    assert_eq!(large.best_move, Some(dominant));
    assert!(large.visit_share(&dominant) > small.visit_share(&dominant));
}
