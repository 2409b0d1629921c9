//! End-to-end analysis through the public request/response contract.

use assert_matches::assert_matches;
use azul_analyzer::game::tile::Color;
use azul_analyzer::mcts::MctsConfig;
use azul_analyzer::quality::{AnalysisResponse, SearchBudget};
use azul_analyzer::search::SearchConfig;
use azul_analyzer::{analyze, AnalysisConfig, AnalysisRequest, AnalyzerError, QualityTier};

const MIDGAME: &str = "BBYR|----|KKWW|YRRR|----/FBYYK/B----|-----|-----|-K---|-----/R|--|YYY|----|-----/K/-----|W----|-----|-----|-----/-|BB|---|RR--|-----/-/7,3/2/0";

fn light_config() -> AnalysisConfig {
    AnalysisConfig {
        search: SearchConfig {
            max_depth: 2,
            root_scoring_depth: 1,
            ..SearchConfig::default()
        },
        mcts: MctsConfig::with_rollouts(150),
        ..AnalysisConfig::default()
    }
}

#[test]
fn test_midgame_verdict_is_consistent() {
    let mut request = AnalysisRequest::new(MIDGAME, 0);
    request.max_alternatives = Some(4);
    let response = analyze(&request, &light_config(), None).unwrap();

    assert_eq!(response.alternatives.len(), 4);
    assert_eq!(
        response.best.quality_tier,
        QualityTier::from_score(response.best.quality_score)
    );
    assert!((0.0..=1.0).contains(&response.best.confidence));
    assert!(!response.best.primary_reason.is_empty());
    let mut previous = response.best.quality_score;
    for alt in &response.alternatives {
        assert!(alt.assessment.quality_score <= previous);
        assert_ne!(alt.assessment.mv, response.best.mv);
        previous = alt.assessment.quality_score;
    }
    assert_eq!(response.engines.len(), 3);
}

#[test]
fn test_identical_requests_give_identical_verdicts() {
    let request = AnalysisRequest::new(MIDGAME, 0);
    let a = analyze(&request, &light_config(), None).unwrap();
    let b = analyze(&request, &light_config(), None).unwrap();
    assert_eq!(a.best, b.best);
    assert_eq!(a.alternatives, b.alternatives);
}

#[test]
fn test_response_json_uses_move_key() {
    let mut request = AnalysisRequest::new(MIDGAME, 0);
    request.include_alternatives = Some(false);
    request.search_budget = Some(SearchBudget {
        max_depth: Some(1),
        time_limit_ms: None,
        mcts_rollouts: Some(50),
    });
    let response = analyze(&request, &light_config(), None).unwrap();
    assert!(response.alternatives.is_empty());

    let json = serde_json::to_value(&response).unwrap();
    assert!(json["best"]["move"].is_object() || json["best"]["move"].is_string());
    assert!(json["best"]["component_scores"]["opponent_impact"].is_number());

    let back: AnalysisResponse = serde_json::from_value(json).unwrap();
    assert_eq!(back.best, response.best);
}

#[test]
fn test_request_for_player_not_to_move_is_rejected() {
    let request = AnalysisRequest::new(MIDGAME, 1);
    assert_matches!(
        analyze(&request, &light_config(), None),
        Err(AnalyzerError::InvalidRequest(_))
    );
}

#[test]
fn test_malformed_position_is_rejected() {
    let broken = MIDGAME.replacen("BBYR", "BBY", 1);
    let request = AnalysisRequest::new(broken, 0);
    assert_matches!(
        analyze(&request, &light_config(), None),
        Err(AnalyzerError::MalformedPosition(_))
    );
}

#[test]
fn test_column_completion_outranks_row_completion() {
    // Yellow onto the full fifth line closes column 1; white onto line 1 closes row 1.
    let position = "BBYW|----|----|----|----/F/BYRK-|W----|K----|R----|-----/-|--|---|----|YYYY-/-/-----|-----|-----|-----|-----/-|--|---|----|-----/-/0,0/3/0";
    let mut request = AnalysisRequest::new(position, 0);
    request.max_alternatives = Some(5);
    let response = analyze(&request, &light_config(), None).unwrap();

    let ranked: Vec<_> = std::iter::once(&response.best)
        .chain(response.alternatives.iter().map(|alt| &alt.assessment))
        .collect();
    let rank_of = |color: Color, line: usize| {
        ranked
            .iter()
            .position(|a| a.mv.color() == color && a.mv.pattern_line_dest() == Some(line))
    };

    let column = rank_of(Color::Yellow, 4).expect("column-completing move is ranked");
    if let Some(row) = rank_of(Color::White, 0) {
        assert!(column < row);
        assert!(ranked[column].quality_score >= ranked[row].quality_score);
    }
    assert!(ranked[column].component_scores.scoring > 0.0);
}
