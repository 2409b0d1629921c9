//! Notation round trips and structural hash consistency over sampled play.

use azul_analyzer::game::get_legal_moves::get_legal_moves;
use azul_analyzer::game::notation::{parse, serialize};
use azul_analyzer::services::batch::sample_positions;
use azul_analyzer::Position;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

#[test]
fn test_round_trip_over_sampled_positions() {
    for position in sample_positions(60, 11) {
        let text = serialize(&position);
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed, position);
        assert_eq!(parsed.structural_hash(), position.structural_hash());
        assert_eq!(serialize(&parsed), text);
    }
}

#[test]
fn test_incremental_hash_matches_recomputed_through_rounds() {
    let mut rng = StdRng::seed_from_u64(21);
    let mut position = Position::new_game(&mut rng);
    for _ in 0..3 {
        while !position.is_round_over() {
            let moves = get_legal_moves(&position);
            let mv = moves[rng.gen_range(0..moves.len())];
            position = position.apply(&mv).unwrap();
            assert_eq!(position.structural_hash(), position.recompute_hash());
        }
        let resolution = position.resolve_round();
        assert_eq!(
            resolution.position.structural_hash(),
            resolution.position.recompute_hash()
        );
        if resolution.game_over {
            break;
        }
        position = resolution.position.deal_factories(&mut rng);
        assert_eq!(position.structural_hash(), position.recompute_hash());
        let reparsed = parse(&serialize(&position)).unwrap();
        assert_eq!(reparsed, position);
    }
}

/// Every position met while playing whole games from seeded openings, round
/// resolutions and re-deals included.
fn played_positions(games: u64, seed: u64) -> Vec<Position> {
    let mut seen = Vec::new();
    for game in 0..games {
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(game));
        let mut position = Position::new_game(&mut rng);
        seen.push(position.clone());
        for _ in 0..12 {
            while !position.is_round_over() {
                let moves = get_legal_moves(&position);
                if moves.is_empty() {
                    break;
                }
                let mv = moves[rng.gen_range(0..moves.len())];
                position = position.apply(&mv).unwrap();
                seen.push(position.clone());
            }
            let resolution = position.resolve_round();
            seen.push(resolution.position.clone());
            if resolution.game_over {
                break;
            }
            position = resolution.position.deal_factories(&mut rng);
            seen.push(position.clone());
        }
    }
    seen
}

#[test]
fn test_no_hash_collisions_among_distinct_positions() {
    let positions = played_positions(150, 99);
    assert!(positions.len() > 5000);
    assert!(positions.iter().any(|p| p.round() >= 4));
    assert!(positions.iter().any(|p| p.player(0).wall_tile_count() >= 5));
    assert!(positions.iter().any(|p| p.player(1).score > 0));

    let mut by_hash: HashMap<u64, String> = HashMap::new();
    for position in &positions {
        let text = serialize(position);
        if let Some(previous) = by_hash.insert(position.structural_hash(), text.clone()) {
            assert_eq!(previous, text, "distinct positions share a hash");
        }
    }
    assert!(by_hash.len() > 4000);
}

#[test]
fn test_round_trip_over_later_rounds() {
    for position in played_positions(6, 5).iter().filter(|p| p.round() > 1) {
        let text = serialize(position);
        let parsed = parse(&text).unwrap();
        assert_eq!(&parsed, position);
        assert_eq!(parsed.structural_hash(), position.structural_hash());
    }
}
