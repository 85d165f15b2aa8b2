use crate::aligner::scoring::ScoreType;

/// Running optimum of each lane.
#[derive(Clone, Debug)]
pub(crate) struct OptimumTracker<S, const W: usize> {
    score: [S; W],
    col: [usize; W],
    row: [usize; W],
}

impl<S: ScoreType, const W: usize> OptimumTracker<S, W> {
    pub fn new() -> Self {
        Self {
            score: [S::min_value(); W],
            col: [0; W],
            row: [0; W],
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Replace the lane's optimum if the given score is strictly better.
    #[inline(always)]
    pub fn update(&mut self, lane: usize, score: S, col: usize, row: usize) {
        if score > self.score[lane] {
            self.set(lane, score, col, row);
        }
    }

    #[inline(always)]
    pub fn set(&mut self, lane: usize, score: S, col: usize, row: usize) {
        self.score[lane] = score;
        self.col[lane] = col;
        self.row[lane] = row;
    }

    pub fn score(&self, lane: usize) -> S {
        self.score[lane]
    }

    /// Column and row of the lane's optimum.
    pub fn position(&self, lane: usize) -> (usize, usize) {
        (self.col[lane], self.row[lane])
    }
}
