//! Zobrist keys for the structural position hash.
//!
//! Fixed-size zones (factories, center, pattern lines, wall cells) use
//! precomputed tables filled from a seeded LCG so hashes are reproducible
//! across runs. Zones with an unbounded value range (floor slots, scores,
//! round number) derive their key by mixing the feature coordinates with
//! splitmix64, which gives the same per-feature random key every time.

use crate::game::position::{NUM_FACTORIES, NUM_PLAYERS};
use crate::game::tile::{FloorTile, NUM_COLORS, TILES_PER_COLOR, WALL_SIZE};
use std::sync::OnceLock;

const MAX_FACTORY_COUNT: usize = 4;
const MAX_POOL_COUNT: usize = TILES_PER_COLOR as usize;

const ZONE_FLOOR: u64 = 0xF1;
const ZONE_SCORE: u64 = 0x5C;
const ZONE_ROUND: u64 = 0x4D;

pub struct ZobristKeys {
    factory: [[[u64; MAX_FACTORY_COUNT + 1]; NUM_COLORS]; NUM_FACTORIES],
    center: [[u64; MAX_POOL_COUNT + 1]; NUM_COLORS],
    marker_available: u64,
    pattern_line: [[[[u64; WALL_SIZE + 1]; NUM_COLORS]; WALL_SIZE]; NUM_PLAYERS],
    wall: [[[u64; WALL_SIZE]; WALL_SIZE]; NUM_PLAYERS],
    current_player: [u64; NUM_PLAYERS],
}

impl ZobristKeys {
    fn new() -> Self {
        // Knuth's MMIX LCG with a fixed seed: same seed, same table, same hashes.
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        let mut next_rand = || {
            seed = seed
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            splitmix64(seed)
        };

        let mut factory = [[[0u64; MAX_FACTORY_COUNT + 1]; NUM_COLORS]; NUM_FACTORIES];
        for per_color in factory.iter_mut() {
            for per_count in per_color.iter_mut() {
                // count 0 hashes to 0 so empty zones cost nothing
                for key in per_count.iter_mut().skip(1) {
                    *key = next_rand();
                }
            }
        }

        let mut center = [[0u64; MAX_POOL_COUNT + 1]; NUM_COLORS];
        for per_count in center.iter_mut() {
            for key in per_count.iter_mut().skip(1) {
                *key = next_rand();
            }
        }

        let marker_available = next_rand();

        let mut pattern_line = [[[[0u64; WALL_SIZE + 1]; NUM_COLORS]; WALL_SIZE]; NUM_PLAYERS];
        for per_line in pattern_line.iter_mut() {
            for per_color in per_line.iter_mut() {
                for per_count in per_color.iter_mut() {
                    for key in per_count.iter_mut().skip(1) {
                        *key = next_rand();
                    }
                }
            }
        }

        let mut wall = [[[0u64; WALL_SIZE]; WALL_SIZE]; NUM_PLAYERS];
        for rows in wall.iter_mut() {
            for cols in rows.iter_mut() {
                for key in cols.iter_mut() {
                    *key = next_rand();
                }
            }
        }

        let current_player = [next_rand(), next_rand()];

        Self {
            factory,
            center,
            marker_available,
            pattern_line,
            wall,
            current_player,
        }
    }

    #[inline]
    pub fn factory(&self, factory_id: usize, color: usize, count: u8) -> u64 {
        self.factory[factory_id][color][(count as usize).min(MAX_FACTORY_COUNT)]
    }

    #[inline]
    pub fn center(&self, color: usize, count: u8) -> u64 {
        self.center[color][(count as usize).min(MAX_POOL_COUNT)]
    }

    #[inline]
    pub fn marker_available(&self) -> u64 {
        self.marker_available
    }

    #[inline]
    pub fn pattern_line(&self, player: usize, line: usize, color: usize, count: u8) -> u64 {
        self.pattern_line[player][line][color][(count as usize).min(WALL_SIZE)]
    }

    #[inline]
    pub fn wall(&self, player: usize, row: usize, col: usize) -> u64 {
        self.wall[player][row][col]
    }

    #[inline]
    pub fn current_player(&self, player: usize) -> u64 {
        self.current_player[player]
    }

    #[inline]
    pub fn floor(&self, player: usize, slot: usize, tile: FloorTile) -> u64 {
        mix(ZONE_FLOOR, (player * 1024 + slot) as u64, tile.hash_index() as u64)
    }

    #[inline]
    pub fn score(&self, player: usize, score: i32) -> u64 {
        mix(ZONE_SCORE, player as u64, score as u32 as u64)
    }

    #[inline]
    pub fn round(&self, round: u32) -> u64 {
        mix(ZONE_ROUND, 0, round as u64)
    }
}

/// Shared, lazily built key table.
pub fn keys() -> &'static ZobristKeys {
    static KEYS: OnceLock<ZobristKeys> = OnceLock::new();
    KEYS.get_or_init(ZobristKeys::new)
}

#[inline]
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[inline]
fn mix(zone: u64, a: u64, b: u64) -> u64 {
    splitmix64(splitmix64(zone.rotate_left(56) ^ a).wrapping_add(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_keys_are_distinct() {
        let k = keys();
        let mut seen = HashSet::new();
        for f in 0..NUM_FACTORIES {
            for c in 0..NUM_COLORS {
                for n in 1..=4 {
                    assert!(seen.insert(k.factory(f, c, n)));
                }
            }
        }
        for p in 0..NUM_PLAYERS {
            for r in 0..WALL_SIZE {
                for c in 0..WALL_SIZE {
                    assert!(seen.insert(k.wall(p, r, c)));
                }
            }
        }
        assert!(seen.insert(k.marker_available()));
    }

    #[test]
    fn test_zero_counts_hash_to_zero() {
        let k = keys();
        assert_eq!(k.factory(0, 0, 0), 0);
        assert_eq!(k.center(3, 0), 0);
        assert_eq!(k.pattern_line(1, 4, 2, 0), 0);
    }

    #[test]
    fn test_mixed_keys_are_stable_and_distinct() {
        let k = keys();
        assert_eq!(k.score(0, 17), k.score(0, 17));
        assert_ne!(k.score(0, 17), k.score(1, 17));
        assert_ne!(k.score(0, 17), k.score(0, 18));
        assert_ne!(
            k.floor(0, 0, FloorTile::FirstPlayerMarker),
            k.floor(0, 1, FloorTile::FirstPlayerMarker)
        );
        assert_ne!(k.round(1), k.round(2));
    }
}
