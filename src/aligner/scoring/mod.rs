pub mod match_mismatch;
pub mod matrix;

use std::fmt::{Debug, Display};

use num::{Bounded, Zero};
use serde::{Deserialize, Serialize};

use crate::errors::PairgapError;

pub use match_mismatch::MatchMismatch;
pub use matrix::SubstitutionMatrix;

/// Substitution scores between two symbols.
///
/// Higher is better; the aligner maximizes the total score.
pub trait ScoringScheme {
    fn score(&self, a: u8, b: u8) -> i32;

    /// Largest magnitude of any substitution score.
    fn max_abs_score(&self) -> u32;
}

impl<T: ScoringScheme> ScoringScheme for &T {
    #[inline(always)]
    fn score(&self, a: u8, b: u8) -> i32 {
        (**self).score(a, b)
    }

    fn max_abs_score(&self) -> u32 {
        (**self).max_abs_score()
    }
}

/// Affine gap scores. A gap of length `k` scores `open + k * extend`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapCosts {
    pub open: i32,
    pub extend: i32,
}

impl GapCosts {
    pub fn new(open: i32, extend: i32) -> Self {
        Self { open, extend }
    }

    /// Score of the first position of a gap.
    #[inline(always)]
    pub fn open_total(&self) -> i32 {
        self.open + self.extend
    }

    #[inline]
    pub fn gap_score(&self, length: usize) -> i64 {
        if length == 0 {
            return 0;
        }

        self.open as i64 + length as i64 * self.extend as i64
    }

    pub fn validate(&self) -> Result<(), PairgapError> {
        if self.open > 0 || self.extend > 0 {
            return Err(PairgapError::InvalidGapCosts { open: self.open, extend: self.extend });
        }

        Ok(())
    }
}

/// Integer types usable as DP cell scores.
///
/// Arithmetic saturates, so the minimum value acts as minus infinity for cells outside the band
/// and for padded lanes.
pub trait ScoreType: Copy + Ord + Default + Debug + Display + Bounded + Zero + Send + Sync + Serialize + 'static {
    fn from_i32(value: i32) -> Self;
    fn from_i64(value: i64) -> Self;
    fn as_i64(&self) -> i64;
    fn add_score(self, rhs: Self) -> Self;
}

impl ScoreType for i16 {
    #[inline(always)]
    fn from_i32(value: i32) -> Self {
        value.clamp(i16::MIN as i32, i16::MAX as i32) as Self
    }

    #[inline(always)]
    fn from_i64(value: i64) -> Self {
        value.clamp(i16::MIN as i64, i16::MAX as i64) as Self
    }

    #[inline(always)]
    fn as_i64(&self) -> i64 {
        *self as i64
    }

    #[inline(always)]
    fn add_score(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

impl ScoreType for i32 {
    #[inline(always)]
    fn from_i32(value: i32) -> Self {
        value
    }

    #[inline(always)]
    fn from_i64(value: i64) -> Self {
        value.clamp(i32::MIN as i64, i32::MAX as i64) as Self
    }

    #[inline(always)]
    fn as_i64(&self) -> i64 {
        *self as i64
    }

    #[inline(always)]
    fn add_score(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

impl ScoreType for i64 {
    #[inline(always)]
    fn from_i32(value: i32) -> Self {
        value as Self
    }

    #[inline(always)]
    fn from_i64(value: i64) -> Self {
        value
    }

    #[inline(always)]
    fn as_i64(&self) -> i64 {
        *self
    }

    #[inline(always)]
    fn add_score(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::{GapCosts, ScoreType};

    #[test]
    fn test_gap_score() {
        let gaps = GapCosts::new(-10, -1);
        assert_eq!(gaps.open_total(), -11);
        assert_eq!(gaps.gap_score(0), 0);
        assert_eq!(gaps.gap_score(1), -11);
        assert_eq!(gaps.gap_score(3), -13);

        assert!(gaps.validate().is_ok());
        assert!(GapCosts::new(2, -1).validate().is_err());
    }

    #[test]
    fn test_saturating_scores() {
        assert_eq!(i16::from_i32(100_000), i16::MAX);
        assert_eq!(i32::from_i64(-1 << 40), i32::MIN);
        assert_eq!(i16::MIN.add_score(-5), i16::MIN);
        assert_eq!(i32::MIN.add_score(-11), i32::MIN);
        assert_eq!(7i64.add_score(-3).as_i64(), 4);
    }
}
