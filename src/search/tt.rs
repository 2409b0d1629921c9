//! Transposition table keyed by the position's structural hash.
//!
//! Direct-mapped: each hash maps to exactly one slot. An entry is replaced
//! when it comes from an older search generation or when the new result was
//! searched at least as deep. A table belongs to one search call and is never
//! shared across positions.

use crate::game::moves::Move;

/// How the stored score bounds the true value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    /// Exact score: the window contained the value
    Exact,
    /// Score >= stored value (beta cutoff)
    LowerBound,
    /// Score <= stored value (failed low)
    UpperBound,
}

#[derive(Debug, Clone, Copy)]
pub struct TTEntry {
    pub hash: u64,
    pub depth: u8,
    pub score: i32,
    pub entry_type: EntryType,
    pub best_move: Option<Move>,
    generation: u8,
}

/// Result of a probe: a usable score, if any, and the stored move for ordering.
#[derive(Debug, Clone, Copy, Default)]
pub struct Probe {
    pub score: Option<i32>,
    pub best_move: Option<Move>,
}

pub struct TranspositionTable {
    entries: Vec<Option<TTEntry>>,
    mask: usize,
    generation: u8,
}

impl TranspositionTable {
    /// Table with at least `min_entries` slots, rounded up to a power of two.
    pub fn new(min_entries: usize) -> Self {
        let size = min_entries.max(1024).next_power_of_two();
        Self {
            entries: vec![None; size],
            mask: size - 1,
            generation: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Starts a new search iteration; entries from older iterations become
    /// replaceable regardless of depth.
    pub fn new_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    fn slot(&self, hash: u64) -> usize {
        (hash as usize) & self.mask
    }

    pub fn probe(&self, hash: u64, depth: u8, alpha: i32, beta: i32) -> Probe {
        let Some(entry) = self.entries[self.slot(hash)] else {
            return Probe::default();
        };
        if entry.hash != hash {
            return Probe::default();
        }

        let usable = entry.depth >= depth
            && match entry.entry_type {
                EntryType::Exact => true,
                EntryType::LowerBound => entry.score >= beta,
                EntryType::UpperBound => entry.score <= alpha,
            };
        Probe {
            score: usable.then_some(entry.score),
            best_move: entry.best_move,
        }
    }

    pub fn best_move(&self, hash: u64) -> Option<Move> {
        self.entries[self.slot(hash)]
            .filter(|e| e.hash == hash)
            .and_then(|e| e.best_move)
    }

    pub fn store(
        &mut self,
        hash: u64,
        depth: u8,
        score: i32,
        entry_type: EntryType,
        best_move: Option<Move>,
    ) {
        let idx = self.slot(hash);
        let replace = match &self.entries[idx] {
            None => true,
            Some(old) => old.generation != self.generation || depth >= old.depth,
        };
        if replace {
            self.entries[idx] = Some(TTEntry {
                hash,
                depth,
                score,
                entry_type,
                best_move,
                generation: self.generation,
            });
        }
    }

    pub fn clear(&mut self) {
        self.entries.iter_mut().for_each(|e| *e = None);
        self.generation = 0;
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
