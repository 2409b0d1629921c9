pub mod get_legal_moves;
pub mod moves;
pub mod notation;
pub mod position;
pub mod tile;
pub mod zobrist;
