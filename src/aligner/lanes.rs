use std::array;

use crate::aligner::result::SequencePair;
use crate::aligner::scoring::{ScoreType, ScoringScheme};

/// Fixed width score vector, one value per lane. Operations work lane-wise and saturate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct LaneVector<S, const W: usize>(pub [S; W]);

impl<S: ScoreType, const W: usize> LaneVector<S, W> {
    #[inline(always)]
    pub fn splat(value: S) -> Self {
        Self([value; W])
    }

    /// Minus infinity in every lane.
    #[inline(always)]
    pub fn lowest() -> Self {
        Self::splat(S::min_value())
    }

    #[inline(always)]
    pub fn add(self, rhs: Self) -> Self {
        Self(array::from_fn(|l| self.0[l].add_score(rhs.0[l])))
    }

    #[inline(always)]
    pub fn add_scalar(self, rhs: S) -> Self {
        Self(array::from_fn(|l| self.0[l].add_score(rhs)))
    }

    #[inline(always)]
    pub fn max(self, rhs: Self) -> Self {
        Self(array::from_fn(|l| self.0[l].max(rhs.0[l])))
    }

    #[inline(always)]
    pub fn gt_mask(&self, rhs: &Self) -> [bool; W] {
        array::from_fn(|l| self.0[l] > rhs.0[l])
    }

    #[inline(always)]
    pub fn eq_mask(&self, rhs: &Self) -> [bool; W] {
        array::from_fn(|l| self.0[l] == rhs.0[l])
    }

    #[inline(always)]
    pub fn lane(&self, lane: usize) -> S {
        self.0[lane]
    }
}

/// Up to `W` sequence pairs transposed into structure-of-arrays form: position `k` of every
/// lane's sequence is stored next to each other.
pub(crate) struct LaneBatch<const W: usize> {
    sequence1: Vec<[u8; W]>,
    sequence2: Vec<[u8; W]>,
    pub len1: [usize; W],
    pub len2: [usize; W],

    /// Number of lanes holding a real pair, the others are padding
    pub lanes: usize,
}

impl<const W: usize> LaneBatch<W> {
    pub fn new() -> Self {
        Self {
            sequence1: Vec::new(),
            sequence2: Vec::new(),
            len1: [0; W],
            len2: [0; W],
            lanes: 0,
        }
    }

    /// Transpose a chunk of at most `W` pairs. Unused positions hold symbol 0.
    pub fn load(&mut self, pairs: &[SequencePair<'_>]) {
        let pairs = &pairs[..pairs.len().min(W)];

        self.lanes = pairs.len();
        self.len1 = array::from_fn(|l| pairs.get(l).map_or(0, |p| p.sequence1.len()));
        self.len2 = array::from_fn(|l| pairs.get(l).map_or(0, |p| p.sequence2.len()));

        Self::transpose(&mut self.sequence1, pairs.iter().map(|p| p.sequence1));
        Self::transpose(&mut self.sequence2, pairs.iter().map(|p| p.sequence2));
    }

    fn transpose<'s>(buffer: &mut Vec<[u8; W]>, sequences: impl Iterator<Item=&'s [u8]> + Clone) {
        let max_len = sequences.clone().map(|s| s.len()).max().unwrap_or(0);

        buffer.clear();
        buffer.resize(max_len, [0; W]);

        for (lane, seq) in sequences.enumerate() {
            for (k, symbol) in seq.iter().enumerate() {
                buffer[k][lane] = *symbol;
            }
        }
    }

    pub fn max_len1(&self) -> usize {
        self.sequence1.len()
    }

    pub fn max_len2(&self) -> usize {
        self.sequence2.len()
    }

    /// Substitution scores for cell (`col`, `row`), both at least 1. Lanes for which the cell lies
    /// outside their own matrix get the lowest score, so padded cells never win.
    #[inline(always)]
    pub fn substitution<C, S>(&self, scoring: &C, col: usize, row: usize) -> LaneVector<S, W>
    where
        C: ScoringScheme,
        S: ScoreType,
    {
        let a = &self.sequence1[col - 1];
        let b = &self.sequence2[row - 1];

        LaneVector(array::from_fn(|l| {
            if col <= self.len1[l] && row <= self.len2[l] {
                S::from_i32(scoring.score(a[l], b[l]))
            } else {
                S::min_value()
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::{LaneBatch, LaneVector};
    use crate::aligner::result::SequencePair;
    use crate::aligner::scoring::MatchMismatch;

    #[test]
    fn test_lane_vector_saturates() {
        let low = LaneVector::<i16, 4>::lowest();
        assert_eq!(low.add_scalar(-5), low);

        let a = LaneVector([1i16, 5, -3, 0]);
        let b = LaneVector([2i16, 5, -4, i16::MIN]);
        assert_eq!(a.max(b), LaneVector([2, 5, -3, 0]));
        assert_eq!(a.gt_mask(&b), [false, false, true, true]);
        assert_eq!(a.eq_mask(&b), [false, true, false, false]);
        assert_eq!(a.add(b).lane(3), i16::MIN);
    }

    #[test]
    fn test_transpose() {
        let pairs = [
            SequencePair::new(0, b"ACGT", b"AAC"),
            SequencePair::new(1, b"TG", b"GGTT"),
        ];

        let mut batch = LaneBatch::<4>::new();
        batch.load(&pairs);

        assert_eq!(batch.lanes, 2);
        assert_eq!(batch.max_len1(), 4);
        assert_eq!(batch.max_len2(), 4);
        assert_eq!(batch.len1, [4, 2, 0, 0]);
        assert_eq!(batch.sequence1[1], [b'C', b'G', 0, 0]);

        let scoring = MatchMismatch::new(2, -3);
        let scores = batch.substitution::<_, i32>(&scoring, 2, 3);
        assert_eq!(scores.lane(0), 2);
        assert_eq!(scores.lane(1), -3);
        assert_eq!(scores.lane(2), i32::MIN);

        // Column 3 is past the end of the second lane's first sequence
        let scores = batch.substitution::<_, i32>(&scoring, 3, 1);
        assert_eq!(scores.lane(0), -3);
        assert_eq!(scores.lane(1), i32::MIN);
    }
}
