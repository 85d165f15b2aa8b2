use serde::{Deserialize, Serialize};

use crate::aligner::scoring::ScoringScheme;

/// Amino acid letters in table order. Letters outside this set score as `X`.
const AMINO_ACIDS: &[u8; 27] = b"ABCDEFGHIJKLMNOPQRSTUVWYZX*";

const UNKNOWN_RANK: usize = 25;

const fn build_ranks() -> [u8; 256] {
    let mut ranks = [UNKNOWN_RANK as u8; 256];
    let mut i = 0;
    while i < AMINO_ACIDS.len() {
        let letter = AMINO_ACIDS[i];
        ranks[letter as usize] = i as u8;
        ranks[letter.to_ascii_lowercase() as usize] = i as u8;
        i += 1;
    }

    ranks
}

static RANKS: [u8; 256] = build_ranks();

#[inline(always)]
fn rank(symbol: u8) -> usize {
    RANKS[symbol as usize] as usize
}

type Table = [[i32; 27]; 27];

#[rustfmt::skip]
const BLOSUM62: Table = [
    [ 4, -2,  0, -2, -1, -2,  0, -2, -1, -1, -1, -1, -1, -2,  0, -1, -1, -1,  1,  0,  0,  0, -3, -2, -1,  0, -4], // A
    [-2,  4, -3,  4,  1, -3, -1,  0, -3, -4,  0, -4, -3,  3, -1, -2,  0, -1,  0, -1, -1, -3, -4, -3,  1, -1, -4], // B
    [ 0, -3,  9, -3, -4, -2, -3, -3, -1, -1, -3, -1, -1, -3, -2, -3, -3, -3, -1, -1, -2, -1, -2, -2, -3, -2, -4], // C
    [-2,  4, -3,  6,  2, -3, -1, -1, -3, -4, -1, -4, -3,  1, -1, -1,  0, -2,  0, -1, -1, -3, -4, -3,  1, -1, -4], // D
    [-1,  1, -4,  2,  5, -3, -2,  0, -3, -3,  1, -3, -2,  0, -1, -1,  2,  0,  0, -1, -1, -2, -3, -2,  4, -1, -4], // E
    [-2, -3, -2, -3, -3,  6, -3, -1,  0,  0, -3,  0,  0, -3, -1, -4, -3, -3, -2, -2, -1, -1,  1,  3, -3, -1, -4], // F
    [ 0, -1, -3, -1, -2, -3,  6, -2, -4, -4, -2, -4, -3,  0, -1, -2, -2, -2,  0, -2, -1, -3, -2, -3, -2, -1, -4], // G
    [-2,  0, -3, -1,  0, -1, -2,  8, -3, -3, -1, -3, -2,  1, -1, -2,  0,  0, -1, -2, -1, -3, -2,  2,  0, -1, -4], // H
    [-1, -3, -1, -3, -3,  0, -4, -3,  4,  3, -3,  2,  1, -3, -1, -3, -3, -3, -2, -1, -1,  3, -3, -1, -3, -1, -4], // I
    [-1, -4, -1, -4, -3,  0, -4, -3,  3,  3, -3,  3,  2, -3, -1, -3, -3, -3, -2, -1, -1,  2, -3, -1, -3, -1, -4], // J
    [-1,  0, -3, -1,  1, -3, -2, -1, -3, -3,  5, -2, -1,  0, -1, -1,  1,  2,  0, -1, -1, -2, -3, -2,  1, -1, -4], // K
    [-1, -4, -1, -4, -3,  0, -4, -3,  2,  3, -2,  4,  2, -3, -1, -3, -2, -2, -2, -1, -1,  1, -2, -1, -3, -1, -4], // L
    [-1, -3, -1, -3, -2,  0, -3, -2,  1,  2, -1,  2,  5, -2, -1, -2,  0, -1, -1, -1, -1,  1, -1, -1, -1, -1, -4], // M
    [-2,  3, -3,  1,  0, -3,  0,  1, -3, -3,  0, -3, -2,  6, -1, -2,  0,  0,  1,  0, -1, -3, -4, -2,  0, -1, -4], // N
    [ 0, -1, -2, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -2, -1, -1,  0,  0, -1, -1, -2, -1, -1, -1, -4], // O
    [-1, -2, -3, -1, -1, -4, -2, -2, -3, -3, -1, -3, -2, -2, -2,  7, -1, -2, -1, -1, -2, -2, -4, -3, -1, -2, -4], // P
    [-1,  0, -3,  0,  2, -3, -2,  0, -3, -3,  1, -2,  0,  0, -1, -1,  5,  1,  0, -1, -1, -2, -2, -1,  3, -1, -4], // Q
    [-1, -1, -3, -2,  0, -3, -2,  0, -3, -3,  2, -2, -1,  0, -1, -2,  1,  5, -1, -1, -1, -3, -3, -2,  0, -1, -4], // R
    [ 1,  0, -1,  0,  0, -2,  0, -1, -2, -2,  0, -2, -1,  1,  0, -1,  0, -1,  4,  1,  0, -2, -3, -2,  0,  0, -4], // S
    [ 0, -1, -1, -1, -1, -2, -2, -2, -1, -1, -1, -1, -1,  0,  0, -1, -1, -1,  1,  5,  0,  0, -2, -2, -1,  0, -4], // T
    [ 0, -1, -2, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -2, -1, -1,  0,  0, -1, -1, -2, -1, -1, -1, -4], // U
    [ 0, -3, -1, -3, -2, -1, -3, -3,  3,  2, -2,  1,  1, -3, -1, -2, -2, -3, -2,  0, -1,  4, -3, -1, -2, -1, -4], // V
    [-3, -4, -2, -4, -3,  1, -2, -2, -3, -3, -3, -2, -1, -4, -2, -4, -2, -3, -3, -2, -2, -3, 11,  2, -3, -2, -4], // W
    [-2, -3, -2, -3, -2,  3, -3,  2, -1, -1, -2, -1, -1, -2, -1, -3, -1, -2, -2, -2, -1, -1,  2,  7, -2, -1, -4], // Y
    [-1,  1, -3,  1,  4, -3, -2,  0, -3, -3,  1, -3, -1,  0, -1, -1,  3,  0,  0, -1, -1, -2, -3, -2,  4, -1, -4], // Z
    [ 0, -1, -2, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -2, -1, -1,  0,  0, -1, -1, -2, -1, -1, -1, -4], // X
    [-4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4,  1], // *
];

/// A symmetric substitution matrix over the amino acid alphabet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionMatrix {
    table: Table,
}

impl SubstitutionMatrix {
    pub fn blosum62() -> Self {
        Self { table: BLOSUM62 }
    }

    /// Matrix with `match_score` on the diagonal and `mismatch_score` elsewhere.
    pub fn uniform(match_score: i32, mismatch_score: i32) -> Self {
        let mut table = [[mismatch_score; 27]; 27];
        for (i, row) in table.iter_mut().enumerate() {
            row[i] = match_score;
        }

        Self { table }
    }

    /// Overwrite the score of a pair of letters, in both orientations.
    pub fn set_score(&mut self, a: u8, b: u8, score: i32) {
        let (ra, rb) = (rank(a), rank(b));
        self.table[ra][rb] = score;
        self.table[rb][ra] = score;
    }
}

impl Default for SubstitutionMatrix {
    fn default() -> Self {
        Self::blosum62()
    }
}

impl ScoringScheme for SubstitutionMatrix {
    #[inline(always)]
    fn score(&self, a: u8, b: u8) -> i32 {
        self.table[rank(a)][rank(b)]
    }

    fn max_abs_score(&self) -> u32 {
        self.table.iter()
            .flatten()
            .map(|score| score.unsigned_abs())
            .max()
            .unwrap_or(0)
    }
}
