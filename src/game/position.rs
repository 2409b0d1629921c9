//! Immutable position snapshot.
//!
//! `Position` is a value: [`Position::apply`] and [`Position::resolve_round`]
//! return a new position and leave `self` untouched. The structural hash is
//! carried in the value and updated incrementally by the private setters,
//! which are the only code paths that write to the zones.

use crate::game::moves::{Move, Source};
use crate::game::tile::{
    wall_color, wall_column, Color, FloorTile, ALL_COLORS, NUM_COLORS, TILES_PER_COLOR, WALL_SIZE,
};
use crate::game::zobrist::keys;
use crate::scoring::scoring::{self, Wall};
use crate::{AnalyzerError, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const NUM_FACTORIES: usize = 5;
pub const NUM_PLAYERS: usize = 2;
pub const FACTORY_SIZE: u8 = 4;

/// Per-color tile counts, indexed by [`Color::index`].
pub type TileCounts = [u8; NUM_COLORS];

// ============================================================================
// PLAYER BOARD
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PatternLine {
    pub color: Option<Color>,
    pub count: u8,
}

impl PatternLine {
    pub fn capacity(line: usize) -> u8 {
        line as u8 + 1
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn free_slots(&self, line: usize) -> u8 {
        Self::capacity(line).saturating_sub(self.count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PlayerBoard {
    pub pattern_lines: [PatternLine; WALL_SIZE],
    pub wall: Wall,
    pub floor: Vec<FloorTile>,
    pub score: i32,
}

impl PlayerBoard {
    pub fn wall_has(&self, row: usize, color: Color) -> bool {
        self.wall[row][wall_column(row, color)]
    }

    /// Whether `color` may be staged on pattern line `line` right now.
    pub fn accepts(&self, line: usize, color: Color) -> bool {
        let pattern = &self.pattern_lines[line];
        if self.wall_has(line, color) || pattern.free_slots(line) == 0 {
            return false;
        }
        pattern.color.map_or(true, |c| c == color)
    }

    pub fn line_is_full(&self, line: usize) -> bool {
        self.pattern_lines[line].count == PatternLine::capacity(line)
    }

    pub fn has_first_player_marker(&self) -> bool {
        self.floor.contains(&FloorTile::FirstPlayerMarker)
    }

    pub fn wall_tile_count(&self) -> usize {
        self.wall.iter().flatten().filter(|&&cell| cell).count()
    }

    /// Tiles of `color` sitting on this board (wall, pattern lines, floor).
    pub fn tiles_of(&self, color: Color) -> u32 {
        let on_wall = (0..WALL_SIZE).filter(|&row| self.wall_has(row, color)).count() as u32;
        let staged: u32 = self
            .pattern_lines
            .iter()
            .filter(|line| line.color == Some(color))
            .map(|line| u32::from(line.count))
            .sum();
        let on_floor = self
            .floor
            .iter()
            .filter(|&&tile| tile == FloorTile::Tile(color))
            .count() as u32;
        on_wall + staged + on_floor
    }

    pub fn floor_penalty(&self) -> i32 {
        scoring::floor_penalty(self.floor.len())
    }

    pub fn score_wall(&self) -> i32 {
        scoring::score_wall(&self.wall)
    }
}

// ============================================================================
// POSITION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    factories: [TileCounts; NUM_FACTORIES],
    center: TileCounts,
    first_player_marker: bool,
    players: [PlayerBoard; NUM_PLAYERS],
    round: u32,
    current_player: usize,
    hash: u64,
}

/// Outcome of resolving a round: the resolved position and whether the game ended.
#[derive(Debug, Clone)]
pub struct RoundResolution {
    pub position: Position,
    pub game_over: bool,
}

impl Position {
    /// Builds a validated position. Used by the notation parser and by tests.
    pub fn from_parts(
        factories: [TileCounts; NUM_FACTORIES],
        center: TileCounts,
        first_player_marker: bool,
        players: [PlayerBoard; NUM_PLAYERS],
        round: u32,
        current_player: usize,
    ) -> Result<Position> {
        let mut position = Position {
            factories,
            center,
            first_player_marker,
            players,
            round,
            current_player,
            hash: 0,
        };
        position.validate()?;
        position.hash = position.recompute_hash();
        Ok(position)
    }

    /// First round of a fresh game with factories dealt from a shuffled bag.
    pub fn new_game<R: Rng + ?Sized>(rng: &mut R) -> Position {
        let empty = Position {
            factories: [[0; NUM_COLORS]; NUM_FACTORIES],
            center: [0; NUM_COLORS],
            first_player_marker: true,
            players: Default::default(),
            round: 1,
            current_player: 0,
            hash: 0,
        };
        let mut position = empty;
        position.hash = position.recompute_hash();
        position.deal_factories(rng)
    }

    fn validate(&self) -> Result<()> {
        let malformed = |msg: String| Err(AnalyzerError::MalformedPosition(msg));

        if self.round == 0 {
            return malformed("round must be >= 1".to_string());
        }
        if self.current_player >= NUM_PLAYERS {
            return malformed(format!("invalid current player {}", self.current_player));
        }
        for (id, factory) in self.factories.iter().enumerate() {
            let total: u32 = factory.iter().map(|&n| u32::from(n)).sum();
            if total != 0 && total != u32::from(FACTORY_SIZE) {
                return malformed(format!("factory {} holds {} tiles", id + 1, total));
            }
        }
        let marker_holders = self
            .players
            .iter()
            .map(|p| p.floor.iter().filter(|&&t| t == FloorTile::FirstPlayerMarker).count())
            .sum::<usize>();
        if marker_holders + usize::from(self.first_player_marker) > 1 {
            return malformed("first-player marker appears more than once".to_string());
        }
        for (p, board) in self.players.iter().enumerate() {
            for (line, pattern) in board.pattern_lines.iter().enumerate() {
                if pattern.count > PatternLine::capacity(line) {
                    return malformed(format!("player {} pattern line {} overfilled", p, line + 1));
                }
                match pattern.color {
                    None if pattern.count > 0 => {
                        return malformed(format!("player {} pattern line {} has no color", p, line + 1));
                    }
                    Some(_) if pattern.count == 0 => {
                        return malformed(format!("player {} pattern line {} is empty but colored", p, line + 1));
                    }
                    Some(color) if board.wall_has(line, color) => {
                        return malformed(format!(
                            "player {} pattern line {} stages {} already on the wall",
                            p,
                            line + 1,
                            color
                        ));
                    }
                    _ => {}
                }
            }
        }
        for color in ALL_COLORS {
            if self.tile_count(color) > TILES_PER_COLOR as u32 {
                return malformed(format!("more than {} {} tiles in play", TILES_PER_COLOR, color));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn factories(&self) -> &[TileCounts; NUM_FACTORIES] {
        &self.factories
    }

    pub fn factory(&self, id: usize) -> &TileCounts {
        &self.factories[id]
    }

    pub fn center(&self) -> &TileCounts {
        &self.center
    }

    pub fn first_player_marker_available(&self) -> bool {
        self.first_player_marker
    }

    pub fn players(&self) -> &[PlayerBoard; NUM_PLAYERS] {
        &self.players
    }

    pub fn player(&self, index: usize) -> &PlayerBoard {
        &self.players[index]
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn current_player(&self) -> usize {
        self.current_player
    }

    pub fn structural_hash(&self) -> u64 {
        self.hash
    }

    pub fn score_wall(&self, player: usize) -> i32 {
        self.players[player].score_wall()
    }

    pub fn floor_penalty(&self, player: usize) -> i32 {
        self.players[player].floor_penalty()
    }

    /// Tiles of `color` that can be drafted this round (factories + center).
    pub fn available(&self, color: Color) -> u8 {
        u8::try_from(self.drafting_pool(color)).unwrap_or(u8::MAX)
    }

    fn drafting_pool(&self, color: Color) -> u32 {
        let in_factories: u32 = self.factories.iter().map(|f| u32::from(f[color.index()])).sum();
        in_factories + u32::from(self.center[color.index()])
    }

    /// Tiles of `color` in the given source.
    pub fn source_count(&self, source: Source, color: Color) -> u8 {
        match source {
            Source::Factory(id) => self.factories.get(id).map_or(0, |f| f[color.index()]),
            Source::Center => self.center[color.index()],
        }
    }

    /// Every tile of `color` currently visible anywhere.
    pub fn tile_count(&self, color: Color) -> u32 {
        let on_boards: u32 = self.players.iter().map(|p| p.tiles_of(color)).sum();
        self.drafting_pool(color) + on_boards
    }

    /// Tiles of `color` not visible on any board or display (bag and lid).
    pub fn remaining_supply(&self, color: Color) -> u8 {
        (TILES_PER_COLOR as u32).saturating_sub(self.tile_count(color)) as u8
    }

    pub fn is_round_over(&self) -> bool {
        self.factories.iter().all(|f| f.iter().all(|&n| n == 0))
            && self.center.iter().all(|&n| n == 0)
    }

    pub fn is_game_over(&self) -> bool {
        self.players
            .iter()
            .any(|p| (0..WALL_SIZE).any(|row| scoring::row_complete(&p.wall, row)))
    }

    // ------------------------------------------------------------------------
    // Hash-maintaining setters
    // ------------------------------------------------------------------------

    fn set_factory_count(&mut self, id: usize, color: usize, count: u8) {
        let k = keys();
        self.hash ^= k.factory(id, color, self.factories[id][color]);
        self.factories[id][color] = count;
        self.hash ^= k.factory(id, color, count);
    }

    fn set_center_count(&mut self, color: usize, count: u8) {
        let k = keys();
        self.hash ^= k.center(color, self.center[color]);
        self.center[color] = count;
        self.hash ^= k.center(color, count);
    }

    fn set_marker_available(&mut self, available: bool) {
        if self.first_player_marker != available {
            self.hash ^= keys().marker_available();
            self.first_player_marker = available;
        }
    }

    fn set_pattern_line(&mut self, player: usize, line: usize, value: PatternLine) {
        let k = keys();
        let old = self.players[player].pattern_lines[line];
        if let Some(color) = old.color {
            self.hash ^= k.pattern_line(player, line, color.index(), old.count);
        }
        self.players[player].pattern_lines[line] = value;
        if let Some(color) = value.color {
            self.hash ^= k.pattern_line(player, line, color.index(), value.count);
        }
    }

    fn set_wall_cell(&mut self, player: usize, row: usize, col: usize) {
        if !self.players[player].wall[row][col] {
            self.hash ^= keys().wall(player, row, col);
            self.players[player].wall[row][col] = true;
        }
    }

    fn push_floor(&mut self, player: usize, tile: FloorTile) {
        let slot = self.players[player].floor.len();
        self.hash ^= keys().floor(player, slot, tile);
        self.players[player].floor.push(tile);
    }

    fn clear_floor(&mut self, player: usize) {
        let k = keys();
        for (slot, &tile) in self.players[player].floor.iter().enumerate() {
            self.hash ^= k.floor(player, slot, tile);
        }
        self.players[player].floor.clear();
    }

    fn set_score(&mut self, player: usize, score: i32) {
        let k = keys();
        self.hash ^= k.score(player, self.players[player].score);
        self.players[player].score = score;
        self.hash ^= k.score(player, score);
    }

    fn set_round(&mut self, round: u32) {
        let k = keys();
        self.hash ^= k.round(self.round);
        self.round = round;
        self.hash ^= k.round(round);
    }

    fn set_current_player(&mut self, player: usize) {
        let k = keys();
        self.hash ^= k.current_player(self.current_player);
        self.current_player = player;
        self.hash ^= k.current_player(player);
    }

    /// Full hash computation from scratch.
    pub fn recompute_hash(&self) -> u64 {
        let k = keys();
        let mut hash = 0u64;
        for (id, factory) in self.factories.iter().enumerate() {
            for (color, &count) in factory.iter().enumerate() {
                hash ^= k.factory(id, color, count);
            }
        }
        for (color, &count) in self.center.iter().enumerate() {
            hash ^= k.center(color, count);
        }
        if self.first_player_marker {
            hash ^= k.marker_available();
        }
        for (p, board) in self.players.iter().enumerate() {
            for (line, pattern) in board.pattern_lines.iter().enumerate() {
                if let Some(color) = pattern.color {
                    hash ^= k.pattern_line(p, line, color.index(), pattern.count);
                }
            }
            for row in 0..WALL_SIZE {
                for col in 0..WALL_SIZE {
                    if board.wall[row][col] {
                        hash ^= k.wall(p, row, col);
                    }
                }
            }
            for (slot, &tile) in board.floor.iter().enumerate() {
                hash ^= k.floor(p, slot, tile);
            }
            hash ^= k.score(p, board.score);
        }
        hash ^= k.round(self.round);
        hash ^= k.current_player(self.current_player);
        hash
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// Plays `mv` for the current player.
    ///
    /// The move is re-validated against the position: the source must hold the
    /// color, the counts must split exactly the tiles taken, with as many as fit
    /// on the chosen line, and the line must accept the color.
    pub fn apply(&self, mv: &Move) -> Result<Position> {
        let player = self.current_player;
        let color = mv.color();
        let source = mv.source();

        if let Source::Factory(id) = source {
            if id >= NUM_FACTORIES {
                return Err(AnalyzerError::IllegalMove(format!("{}: no factory {}", mv, id + 1)));
            }
        }
        let available = self.source_count(source, color);
        if available == 0 {
            return Err(AnalyzerError::IllegalMove(format!("{}: source holds no {}", mv, color)));
        }
        if mv.tiles_taken() != available {
            return Err(AnalyzerError::IllegalMove(format!(
                "{}: takes {} tiles but the source holds {}",
                mv,
                mv.tiles_taken(),
                available
            )));
        }

        let board = &self.players[player];
        match mv.pattern_line_dest() {
            Some(line) => {
                if line >= WALL_SIZE {
                    return Err(AnalyzerError::IllegalMove(format!("{}: no pattern line {}", mv, line + 1)));
                }
                if !board.accepts(line, color) {
                    return Err(AnalyzerError::IllegalMove(format!(
                        "{}: pattern line {} cannot take {}",
                        mv,
                        line + 1,
                        color
                    )));
                }
                let fits = board.pattern_lines[line].free_slots(line).min(available);
                if mv.count_to_line() != fits {
                    return Err(AnalyzerError::IllegalMove(format!(
                        "{}: {} tiles fit on line {}",
                        mv,
                        fits,
                        line + 1
                    )));
                }
            }
            None => {
                if mv.count_to_line() != 0 {
                    return Err(AnalyzerError::IllegalMove(format!("{}: floor move stages tiles", mv)));
                }
            }
        }

        let mut next = self.clone();
        match source {
            Source::Factory(id) => {
                for other in ALL_COLORS {
                    let n = next.factories[id][other.index()];
                    if n == 0 {
                        continue;
                    }
                    next.set_factory_count(id, other.index(), 0);
                    if other != color {
                        let in_center = next.center[other.index()];
                        next.set_center_count(other.index(), in_center + n);
                    }
                }
            }
            Source::Center => {
                next.set_center_count(color.index(), 0);
                if next.first_player_marker {
                    next.set_marker_available(false);
                    next.push_floor(player, FloorTile::FirstPlayerMarker);
                }
            }
        }

        if let Some(line) = mv.pattern_line_dest() {
            let old = next.players[player].pattern_lines[line];
            next.set_pattern_line(
                player,
                line,
                PatternLine {
                    color: Some(color),
                    count: old.count + mv.count_to_line(),
                },
            );
        }
        for _ in 0..mv.count_to_floor() {
            next.push_floor(player, FloorTile::Tile(color));
        }

        next.set_current_player((player + 1) % NUM_PLAYERS);
        Ok(next)
    }

    /// Wall-tiling phase: full pattern lines move to the wall with adjacency
    /// scoring, floors are penalized and cleared (scores never drop below 0),
    /// the marker holder starts the next round. If any wall row is complete the
    /// game ends and endgame bonuses are added.
    ///
    /// Factories are left empty; see [`Position::deal_factories`].
    pub fn resolve_round(&self) -> RoundResolution {
        let mut next = self.clone();
        let mut next_starter = None;

        for player in 0..NUM_PLAYERS {
            let mut gained = 0;
            for line in 0..WALL_SIZE {
                if !next.players[player].line_is_full(line) {
                    continue;
                }
                if let Some(color) = next.players[player].pattern_lines[line].color {
                    let col = wall_column(line, color);
                    gained += scoring::placement_score(&next.players[player].wall, line, col);
                    next.set_wall_cell(player, line, col);
                    next.set_pattern_line(player, line, PatternLine::default());
                }
            }
            if next.players[player].has_first_player_marker() {
                next_starter = Some(player);
            }
            let penalty = next.players[player].floor_penalty();
            let score = (next.players[player].score + gained + penalty).max(0);
            next.set_score(player, score);
            next.clear_floor(player);
        }

        // Leftover center tiles (only possible for hand-built positions) go to the lid.
        for color in 0..NUM_COLORS {
            next.set_center_count(color, 0);
        }
        for id in 0..NUM_FACTORIES {
            for color in 0..NUM_COLORS {
                next.set_factory_count(id, color, 0);
            }
        }

        next.set_marker_available(true);
        if let Some(starter) = next_starter {
            next.set_current_player(starter);
        }

        let game_over = next.is_game_over();
        if game_over {
            for player in 0..NUM_PLAYERS {
                let bonus = scoring::endgame_bonus(&next.players[player].wall);
                let score = next.players[player].score + bonus;
                next.set_score(player, score);
            }
        } else {
            next.set_round(self.round + 1);
        }

        RoundResolution {
            position: next,
            game_over,
        }
    }

    /// Refills empty factories from the tiles not currently in play.
    /// Factories stay empty once the supply runs out.
    pub fn deal_factories<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        let mut bag: Vec<Color> = ALL_COLORS
            .iter()
            .flat_map(|&color| std::iter::repeat(color).take(self.remaining_supply(color) as usize))
            .collect();
        bag.shuffle(rng);

        let mut next = self.clone();
        for id in 0..NUM_FACTORIES {
            let total: u8 = next.factories[id].iter().sum();
            if total != 0 || bag.len() < FACTORY_SIZE as usize {
                continue;
            }
            for _ in 0..FACTORY_SIZE {
                if let Some(color) = bag.pop() {
                    let n = next.factories[id][color.index()];
                    next.set_factory_count(id, color.index(), n + 1);
                }
            }
        }
        next
    }

    /// Final score difference from `player`'s point of view, bonuses included
    /// as they stand on the walls.
    pub fn score_difference(&self, player: usize) -> i32 {
        let opponent = (player + 1) % NUM_PLAYERS;
        self.players[player].score - self.players[opponent].score
    }

    /// Whether the wall cell (row, col) holds a tile for `player`.
    pub fn wall_cell(&self, player: usize, row: usize, col: usize) -> Option<Color> {
        self.players[player].wall[row][col].then(|| wall_color(row, col))
    }
}
