use crate::game::moves::{Destination, Move, Source};
use crate::game::position::{Position, NUM_FACTORIES};
use crate::game::tile::{ALL_COLORS, WALL_SIZE};

/// Every legal move for the player to move, sorted by the move ordering.
pub fn get_legal_moves(position: &Position) -> Vec<Move> {
    legal_moves_for(position, position.current_player())
}

/// Every move `player` could make if it were their turn.
///
/// For each source holding a color: one move per pattern line that accepts
/// the color (as many tiles as fit, the rest to the floor) plus the floor move.
pub fn legal_moves_for(position: &Position, player: usize) -> Vec<Move> {
    let board = position.player(player);
    let sources = (0..NUM_FACTORIES)
        .map(Source::Factory)
        .chain(std::iter::once(Source::Center));

    let mut moves = Vec::new();
    for source in sources {
        for color in ALL_COLORS {
            let available = position.source_count(source, color);
            if available == 0 {
                continue;
            }
            for line in 0..WALL_SIZE {
                if !board.accepts(line, color) {
                    continue;
                }
                let to_line = board.pattern_lines[line].free_slots(line).min(available);
                moves.push(Move::new(
                    source,
                    color,
                    Destination::PatternLine(line),
                    to_line,
                    available - to_line,
                ));
            }
            moves.push(Move::new(source, color, Destination::Floor, 0, available));
        }
    }
    moves.sort();
    moves
}
