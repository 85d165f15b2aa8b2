use std::fmt::{Display, Formatter};
use std::ops::{BitAnd, BitOr, BitOrAssign};

use crate::aligner::band::TraceLayout;
use crate::errors::PairgapError;

/// Which predecessors produced a cell's best score, plus whether the gap tracks entering the cell
/// were opened there.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, Hash)]
pub struct TraceDirections(u8);

impl TraceDirections {
    pub const NONE: Self = Self(0);
    pub const DIAGONAL: Self = Self(0b00001);

    /// The vertical gap ending in this cell was opened from the cell above
    pub const UP_OPEN: Self = Self(0b00010);
    pub const UP: Self = Self(0b00100);

    /// The horizontal gap ending in this cell was opened from the cell to the left
    pub const LEFT_OPEN: Self = Self(0b01000);
    pub const LEFT: Self = Self(0b10000);

    #[inline(always)]
    pub fn bits(&self) -> u8 {
        self.0
    }

    #[inline(always)]
    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    #[inline(always)]
    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    /// No predecessor: the origin, a free border cell, or a local alignment restart.
    #[inline(always)]
    pub fn is_start(&self) -> bool {
        self.0 & (Self::DIAGONAL.0 | Self::UP.0 | Self::LEFT.0) == 0
    }
}

impl BitOr for TraceDirections {
    type Output = Self;

    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for TraceDirections {
    #[inline(always)]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0
    }
}

impl BitAnd for TraceDirections {
    type Output = Self;

    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl Display for TraceDirections {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_start() {
            return write!(f, "0");
        }

        for (dir, c) in [
            (Self::DIAGONAL, '\\'),
            (Self::UP, '|'),
            (Self::UP_OPEN, '^'),
            (Self::LEFT, '-'),
            (Self::LEFT_OPEN, '<'),
        ] {
            if self.contains(dir) {
                write!(f, "{c}")?;
            }
        }

        Ok(())
    }
}

/// Column-major trace matrix with one bitmask per lane and cell, optionally restricted to a
/// band.
pub(crate) struct TraceMatrix<const W: usize> {
    layout: TraceLayout,
    data: Vec<[u8; W]>,
}

impl<const W: usize> TraceMatrix<W> {
    pub fn new() -> Self {
        Self {
            layout: TraceLayout { height: 0, upper: None },
            data: Vec::new(),
        }
    }

    /// Resize for a new alignment, reusing the allocation where possible.
    pub fn reset(&mut self, layout: TraceLayout, columns: usize) -> Result<(), PairgapError> {
        let cells = columns.saturating_mul(layout.height);

        self.data.clear();
        if let Err(source) = self.data.try_reserve_exact(cells) {
            return Err(PairgapError::AllocationFailure { cells, source });
        }
        self.data.resize(cells, [0; W]);
        self.layout = layout;

        Ok(())
    }

    /// Store the trace of all lanes for one cell. Cells outside the stored region are ignored.
    #[inline(always)]
    pub fn set(&mut self, col: usize, row: usize, dirs: [TraceDirections; W]) {
        if let Some(cell) = self.layout.index(col, row).and_then(|ix| self.data.get_mut(ix)) {
            for (slot, dir) in cell.iter_mut().zip(dirs) {
                *slot = dir.bits();
            }
        }
    }

    /// Trace of a cell, `None` if the cell is outside the stored region.
    #[inline(always)]
    pub fn get(&self, col: usize, row: usize, lane: usize) -> Option<TraceDirections> {
        self.layout.index(col, row)
            .and_then(|ix| self.data.get(ix))
            .map(|cell| TraceDirections::from_bits(cell[lane]))
    }
}

#[cfg(test)]
mod tests {
    use super::{TraceDirections, TraceMatrix};
    use crate::aligner::band::{Band, BandPolicy, TraceLayout};
    use crate::errors::PairgapError;

    #[test]
    fn test_directions() {
        let dirs = TraceDirections::DIAGONAL | TraceDirections::UP | TraceDirections::UP_OPEN;
        assert!(dirs.contains(TraceDirections::DIAGONAL));
        assert!(dirs.contains(TraceDirections::UP_OPEN));
        assert!(!dirs.contains(TraceDirections::LEFT));
        assert!(!dirs.contains(TraceDirections::NONE));
        assert!(!dirs.is_start());
        assert_eq!(dirs.to_string(), "\\|^");

        // Open flags alone do not make a predecessor
        let open_only = TraceDirections::LEFT_OPEN;
        assert!(open_only.is_start());
        assert_eq!(open_only.to_string(), "0");
    }

    #[test]
    fn test_banded_matrix() {
        let policy = BandPolicy::new(Some(Band::new(-1, 1)), 5, 5);
        let mut matrix = TraceMatrix::<2>::new();
        matrix.reset(policy.trace_layout(), policy.last_column() + 1).unwrap();

        matrix.set(3, 2, [TraceDirections::NONE, TraceDirections::LEFT]);
        assert_eq!(matrix.get(3, 2, 1), Some(TraceDirections::LEFT));
        assert_eq!(matrix.get(3, 2, 0), Some(TraceDirections::NONE));

        // Outside the band
        assert_eq!(matrix.get(4, 0, 0), None);
    }

    #[test]
    fn test_allocation_failure() {
        let mut matrix = TraceMatrix::<16>::new();
        let layout = TraceLayout { height: usize::MAX / 2, upper: None };

        assert!(matches!(matrix.reset(layout, 4), Err(PairgapError::AllocationFailure { .. })));

        // The matrix stays usable after a failed reset
        let policy = BandPolicy::new(None, 2, 2);
        matrix.reset(policy.trace_layout(), 3).unwrap();
        matrix.set(1, 1, [TraceDirections::DIAGONAL; 16]);
        assert_eq!(matrix.get(1, 1, 15), Some(TraceDirections::DIAGONAL));
    }
}
