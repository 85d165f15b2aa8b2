use serde::{Deserialize, Serialize};

use crate::aligner::scoring::ScoringScheme;

/// Fixed match and mismatch scores, as typically used for nucleotides.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchMismatch {
    match_score: i32,
    mismatch_score: i32,

    /// Compare symbols ignoring ASCII case
    ignore_case: bool,
}

impl MatchMismatch {
    pub fn new(match_score: i32, mismatch_score: i32) -> Self {
        Self { match_score, mismatch_score, ignore_case: true }
    }

    pub fn case_sensitive(self) -> Self {
        Self { ignore_case: false, ..self }
    }

    pub fn match_score(&self) -> i32 {
        self.match_score
    }

    pub fn mismatch_score(&self) -> i32 {
        self.mismatch_score
    }
}

impl Default for MatchMismatch {
    fn default() -> Self {
        Self::new(0, -1)
    }
}

impl ScoringScheme for MatchMismatch {
    #[inline(always)]
    fn score(&self, a: u8, b: u8) -> i32 {
        let is_match = if self.ignore_case { a.eq_ignore_ascii_case(&b) } else { a == b };

        if is_match { self.match_score } else { self.mismatch_score }
    }

    fn max_abs_score(&self) -> u32 {
        self.match_score.unsigned_abs().max(self.mismatch_score.unsigned_abs())
    }
}
