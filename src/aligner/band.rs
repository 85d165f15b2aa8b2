use std::cmp::{max, min};
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::aligner::config::AlignmentMode;
use crate::errors::PairgapError;

/// A diagonal corridor of the DP matrix.
///
/// The cell in row `r` (sequence2) and column `c` (sequence1) is part of the band iff
/// `lower_bound <= c - r <= upper_bound`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub lower_bound: isize,
    pub upper_bound: isize,
}

impl Band {
    pub fn new(lower_bound: isize, upper_bound: isize) -> Self {
        Self { lower_bound, upper_bound }
    }

    #[inline]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        let diagonal = col as isize - row as isize;
        self.lower_bound <= diagonal && diagonal <= self.upper_bound
    }

    /// Does the band include any cell of the given row, with columns `0..=len1`?
    fn overlaps_row(&self, row: usize, len1: usize) -> bool {
        let row = row as isize;
        max(row + self.lower_bound, 0) <= min(row + self.upper_bound, len1 as isize)
    }

    /// Does the band include any cell of the given column, with rows `0..=len2`?
    fn overlaps_column(&self, col: usize, len2: usize) -> bool {
        let col = col as isize;
        max(col - self.upper_bound, 0) <= min(col - self.lower_bound, len2 as isize)
    }

    /// Check whether an alignment of sequences with the given lengths can start and end inside
    /// this band.
    pub fn validate(&self, len1: usize, len2: usize, mode: AlignmentMode) -> Result<(), PairgapError> {
        let invalid = PairgapError::InvalidBandConfiguration {
            lower: self.lower_bound,
            upper: self.upper_bound,
            len1,
            len2,
        };

        if self.lower_bound > len1 as isize
            || self.upper_bound < -(len2 as isize)
            || self.upper_bound < self.lower_bound
        {
            return Err(invalid);
        }

        if mode.is_local() {
            return Ok(());
        }

        let ends = mode.free_ends();
        let can_start = self.contains(0, 0)
            || (ends.first_row && self.overlaps_row(0, len1))
            || (ends.first_column && self.overlaps_column(0, len2));

        let can_end = self.contains(len2, len1)
            || (ends.last_row && self.overlaps_row(len2, len1))
            || (ends.last_column && self.overlaps_column(len1, len2));

        if can_start && can_end { Ok(()) } else { Err(invalid) }
    }
}

/// Which rows of each column are computed, and where each cell lives in the trace matrix.
#[derive(Copy, Clone, Debug)]
pub(crate) struct BandPolicy {
    band: Option<Band>,
    len1: usize,
    len2: usize,
}

impl BandPolicy {
    pub fn new(band: Option<Band>, len1: usize, len2: usize) -> Self {
        Self { band, len1, len2 }
    }

    /// Last column with at least one cell in the band. Sequence1 is effectively truncated to
    /// `upper_bound + len2` symbols.
    pub fn last_column(&self) -> usize {
        match self.band {
            Some(band) => {
                let reachable = band.upper_bound.saturating_add(self.len2 as isize);
                min(self.len1 as isize, max(reachable, 0)) as usize
            },
            None => self.len1,
        }
    }

    /// Rows of column `col` inside the band, possibly empty.
    pub fn rows(&self, col: usize) -> Range<usize> {
        let Some(band) = self.band else {
            return 0..self.len2 + 1;
        };

        let col = col as isize;
        let first = max(col - band.upper_bound, 0);
        let last = min(col - band.lower_bound, self.len2 as isize);

        if last < first {
            0..0
        } else {
            first as usize..last as usize + 1
        }
    }

    /// Shape of the trace matrix: rows stored per column, and the diagonal offset of the band's
    /// top edge when the storage is banded.
    pub fn trace_layout(&self) -> TraceLayout {
        let full = TraceLayout { height: self.len2 + 1, upper: None };

        let Some(band) = self.band else {
            return full;
        };

        let upper = min(band.upper_bound, self.len1 as isize);
        let lower = max(band.lower_bound, -(self.len2 as isize));
        let height = (upper - lower + 1).max(1) as usize;

        if height >= full.height {
            full
        } else {
            TraceLayout { height, upper: Some(upper) }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct TraceLayout {
    pub height: usize,
    pub upper: Option<isize>,
}

impl TraceLayout {
    #[inline(always)]
    pub fn index(&self, col: usize, row: usize) -> Option<usize> {
        let offset = match self.upper {
            Some(upper) => {
                let k = row as isize + upper - col as isize;
                if k < 0 || k as usize >= self.height {
                    return None;
                }

                k as usize
            },
            None => {
                if row >= self.height {
                    return None;
                }

                row
            }
        };

        Some(col * self.height + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::{Band, BandPolicy};
    use crate::aligner::config::AlignmentMode;
    use crate::errors::PairgapError;

    #[test]
    fn test_contains() {
        let band = Band::new(-2, 3);
        assert!(band.contains(0, 0));
        assert!(band.contains(0, 3));
        assert!(!band.contains(0, 4));
        assert!(band.contains(2, 0));
        assert!(!band.contains(3, 0));
    }

    #[test]
    fn test_rows_per_column() {
        let policy = BandPolicy::new(Some(Band::new(-2, 3)), 10, 6);
        assert_eq!(policy.rows(0), 0..3);
        assert_eq!(policy.rows(3), 0..6);
        assert_eq!(policy.rows(4), 1..7);
        assert_eq!(policy.rows(9), 6..7);
        assert_eq!(policy.last_column(), 9);

        let unbanded = BandPolicy::new(None, 10, 6);
        assert_eq!(unbanded.rows(5), 0..7);
        assert_eq!(unbanded.last_column(), 10);

        // Band entirely right of the main diagonal leaves the first columns empty
        let shifted = BandPolicy::new(Some(Band::new(2, 4)), 10, 6);
        assert!(shifted.rows(1).is_empty());
        assert_eq!(shifted.rows(2), 0..1);
    }

    #[test]
    fn test_trace_layout() {
        let policy = BandPolicy::new(Some(Band::new(-2, 3)), 10, 6);
        let layout = policy.trace_layout();
        assert_eq!(layout.height, 6);

        // Every cell in the band gets a distinct slot inside its column
        for col in 0..=policy.last_column() {
            for row in policy.rows(col) {
                let ix = layout.index(col, row).unwrap();
                assert!(ix >= col * layout.height && ix < (col + 1) * layout.height);
            }
        }
        assert_eq!(layout.index(0, 5), None);

        let wide = BandPolicy::new(Some(Band::new(-100, 100)), 10, 6).trace_layout();
        assert_eq!(wide.height, 7);
        assert_eq!(wide.upper, None);
    }

    #[test]
    fn test_validate() {
        let global = AlignmentMode::Global;
        assert!(Band::new(-4, 8).validate(18, 11, global).is_ok());
        assert!(Band::new(-4, 4).validate(18, 11, global).is_err());

        assert!(matches!(
            Band::new(19, 20).validate(18, 11, AlignmentMode::Local),
            Err(PairgapError::InvalidBandConfiguration { lower: 19, upper: 20, len1: 18, len2: 11 })
        ));
        assert!(Band::new(-20, -12).validate(18, 11, AlignmentMode::Local).is_err());
        assert!(Band::new(2, 1).validate(18, 11, AlignmentMode::Local).is_err());

        // Free leading and trailing gaps of sequence1 make an off-origin band usable
        let semi = AlignmentMode::overlap_sequence1();
        assert!(Band::new(3, 8).validate(18, 11, semi).is_ok());
        assert!(Band::new(3, 8).validate(18, 11, global).is_err());
    }
}
