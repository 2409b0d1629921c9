//! One-line position notation.
//!
//! ```text
//! factories/center/wall0/lines0/floor0/wall1/lines1/floor1/scores/round/player
//! ```
//!
//! Factories are five 4-character segments joined by `|` (`-` marks an empty
//! slot). The center lists tile letters with `F` for the first-player marker.
//! Walls are five 5-character rows, pattern lines are padded with `-` to their
//! capacity, floors list letters in slot order. Multisets are written in
//! `B,Y,R,K,W` order, the marker first.

use crate::game::position::{
    PatternLine, PlayerBoard, Position, TileCounts, FACTORY_SIZE, NUM_FACTORIES, NUM_PLAYERS,
};
use crate::game::tile::{
    wall_color, Color, FloorTile, ALL_COLORS, NUM_COLORS, TILES_PER_COLOR, WALL_SIZE,
};
use crate::scoring::scoring::Wall;
use crate::{AnalyzerError, Result};
use std::fmt;
use std::str::FromStr;

const FIELD_COUNT: usize = 2 + 3 * NUM_PLAYERS + 3;
const EMPTY: char = '-';
const MARKER: char = 'F';

// ============================================================================
// SERIALIZATION
// ============================================================================

pub fn serialize(position: &Position) -> String {
    let mut fields = Vec::with_capacity(FIELD_COUNT);

    let factories: Vec<String> = position
        .factories()
        .iter()
        .map(|factory| {
            let mut segment = counts_to_letters(factory);
            while segment.len() < FACTORY_SIZE as usize {
                segment.push(EMPTY);
            }
            segment
        })
        .collect();
    fields.push(factories.join("|"));

    let mut center = String::new();
    if position.first_player_marker_available() {
        center.push(MARKER);
    }
    center.push_str(&counts_to_letters(position.center()));
    fields.push(or_empty(center));

    for board in position.players() {
        fields.push(serialize_wall(&board.wall));
        fields.push(serialize_pattern_lines(&board.pattern_lines));
        fields.push(or_empty(board.floor.iter().map(|t| t.letter()).collect()));
    }

    let scores: Vec<String> = position.players().iter().map(|p| p.score.to_string()).collect();
    fields.push(scores.join(","));
    fields.push(position.round().to_string());
    fields.push(position.current_player().to_string());

    fields.join("/")
}

fn counts_to_letters(counts: &TileCounts) -> String {
    ALL_COLORS
        .iter()
        .flat_map(|&color| std::iter::repeat(color.letter()).take(counts[color.index()] as usize))
        .collect()
}

fn or_empty(s: String) -> String {
    if s.is_empty() {
        EMPTY.to_string()
    } else {
        s
    }
}

fn serialize_wall(wall: &Wall) -> String {
    let rows: Vec<String> = (0..WALL_SIZE)
        .map(|row| {
            (0..WALL_SIZE)
                .map(|col| if wall[row][col] { wall_color(row, col).letter() } else { EMPTY })
                .collect()
        })
        .collect();
    rows.join("|")
}

fn serialize_pattern_lines(lines: &[PatternLine; WALL_SIZE]) -> String {
    let segments: Vec<String> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let letter = line.color.map_or(EMPTY, Color::letter);
            (0..PatternLine::capacity(i))
                .map(|slot| if slot < line.count { letter } else { EMPTY })
                .collect()
        })
        .collect();
    segments.join("|")
}

// ============================================================================
// PARSING
// ============================================================================

fn malformed<T>(msg: impl Into<String>) -> Result<T> {
    Err(AnalyzerError::MalformedPosition(msg.into()))
}

fn parse_color(c: char, context: &str) -> Result<Color> {
    match Color::from_letter(c) {
        Some(color) => Ok(color),
        None => malformed(format!("invalid tile letter '{}' in {}", c, context)),
    }
}

fn split_segments<'a>(field: &'a str, expected: usize, context: &str) -> Result<Vec<&'a str>> {
    let segments: Vec<&str> = field.split('|').collect();
    if segments.len() != expected {
        return malformed(format!("{} has {} segments, expected {}", context, segments.len(), expected));
    }
    Ok(segments)
}

pub fn parse(notation: &str) -> Result<Position> {
    let fields: Vec<&str> = notation.trim().split('/').collect();
    if fields.len() != FIELD_COUNT {
        return malformed(format!("expected {} fields, found {}", FIELD_COUNT, fields.len()));
    }

    let mut factories = [[0u8; NUM_COLORS]; NUM_FACTORIES];
    for (id, segment) in split_segments(fields[0], NUM_FACTORIES, "factories")?
        .into_iter()
        .enumerate()
    {
        if segment.chars().count() != FACTORY_SIZE as usize {
            return malformed(format!("factory {} segment '{}' is not {} characters", id + 1, segment, FACTORY_SIZE));
        }
        for c in segment.chars().filter(|&c| c != EMPTY) {
            let color = parse_color(c, "factories")?;
            factories[id][color.index()] += 1;
        }
    }

    let mut center = [0u8; NUM_COLORS];
    let mut marker = false;
    if fields[1] != EMPTY.to_string() {
        for c in fields[1].chars() {
            if c == MARKER {
                if marker {
                    return malformed("center lists the first-player marker twice");
                }
                marker = true;
                continue;
            }
            let color = parse_color(c, "center")?;
            if center[color.index()] >= TILES_PER_COLOR {
                return malformed(format!("center holds more than {} {} tiles", TILES_PER_COLOR, color));
            }
            center[color.index()] += 1;
        }
    }

    let mut players: [PlayerBoard; NUM_PLAYERS] = Default::default();
    for (p, board) in players.iter_mut().enumerate() {
        let base = 2 + p * 3;
        board.wall = parse_wall(fields[base], p)?;
        board.pattern_lines = parse_pattern_lines(fields[base + 1], p)?;
        board.floor = parse_floor(fields[base + 2], p)?;
    }

    let base = 2 + NUM_PLAYERS * 3;
    let scores: Vec<&str> = fields[base].split(',').collect();
    if scores.len() != NUM_PLAYERS {
        return malformed(format!("expected {} scores, found {}", NUM_PLAYERS, scores.len()));
    }
    for (board, score) in players.iter_mut().zip(scores) {
        board.score = match score.trim().parse::<i32>() {
            Ok(value) => value,
            Err(_) => return malformed(format!("invalid score '{}'", score)),
        };
    }

    let round = match fields[base + 1].parse::<u32>() {
        Ok(round) if round >= 1 => round,
        _ => return malformed(format!("invalid round '{}'", fields[base + 1])),
    };
    let current_player = match fields[base + 2].parse::<usize>() {
        Ok(player) if player < NUM_PLAYERS => player,
        _ => return malformed(format!("invalid player index '{}'", fields[base + 2])),
    };

    Position::from_parts(factories, center, marker, players, round, current_player)
}

fn parse_wall(field: &str, player: usize) -> Result<Wall> {
    let mut wall = [[false; WALL_SIZE]; WALL_SIZE];
    let context = format!("player {} wall", player);
    for (row, segment) in split_segments(field, WALL_SIZE, &context)?.into_iter().enumerate() {
        let cells: Vec<char> = segment.chars().collect();
        if cells.len() != WALL_SIZE {
            return malformed(format!("{} row {} is not {} characters", context, row + 1, WALL_SIZE));
        }
        for (col, &c) in cells.iter().enumerate() {
            if c == EMPTY {
                continue;
            }
            let color = parse_color(c, &context)?;
            if color != wall_color(row, col) {
                return malformed(format!(
                    "{} cell ({}, {}) holds {} but only accepts {}",
                    context,
                    row + 1,
                    col + 1,
                    color,
                    wall_color(row, col)
                ));
            }
            wall[row][col] = true;
        }
    }
    Ok(wall)
}

fn parse_pattern_lines(field: &str, player: usize) -> Result<[PatternLine; WALL_SIZE]> {
    let mut lines = [PatternLine::default(); WALL_SIZE];
    let context = format!("player {} pattern lines", player);
    for (i, segment) in split_segments(field, WALL_SIZE, &context)?.into_iter().enumerate() {
        let capacity = PatternLine::capacity(i) as usize;
        if segment.chars().count() != capacity {
            return malformed(format!("{} line {} must be {} characters", context, i + 1, capacity));
        }
        for c in segment.chars().filter(|&c| c != EMPTY) {
            let color = parse_color(c, &context)?;
            match lines[i].color {
                Some(existing) if existing != color => {
                    return malformed(format!("{} line {} mixes {} and {}", context, i + 1, existing, color));
                }
                _ => {
                    lines[i].color = Some(color);
                    lines[i].count += 1;
                }
            }
        }
    }
    Ok(lines)
}

fn parse_floor(field: &str, player: usize) -> Result<Vec<FloorTile>> {
    if field == EMPTY.to_string() {
        return Ok(Vec::new());
    }
    let context = format!("player {} floor", player);
    let mut per_color = [0u32; NUM_COLORS];
    let mut floor = Vec::new();
    for c in field.chars() {
        if c == MARKER {
            floor.push(FloorTile::FirstPlayerMarker);
            continue;
        }
        let color = parse_color(c, &context)?;
        per_color[color.index()] += 1;
        if per_color[color.index()] > u32::from(TILES_PER_COLOR) {
            return malformed(format!("{} holds more than {} {} tiles", context, TILES_PER_COLOR, color));
        }
        floor.push(FloorTile::Tile(color));
    }
    Ok(floor)
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serialize(self))
    }
}

impl FromStr for Position {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}
