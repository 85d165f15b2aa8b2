//! An editable view of a sequence with virtual gap symbols.
//!
//! The backing sequence is borrowed and never modified. Gaps are stored as a sorted array of
//! anchors, one per contiguous gap run, each holding the virtual position where the run starts
//! and the cumulative number of gaps up to and including that run. Random access is a binary
//! search over the anchors; inserting or erasing gaps shifts the anchors after the edit.
//!
//! # Example
//! ```
//! use pairgap::gapped::{GappedSequence, GappedSymbol};
//!
//! let mut seq = GappedSequence::new(b"AC");
//! seq.insert_gap(1, 2).unwrap();
//! assert_eq!(seq.len(), 4);
//! assert_eq!(seq.to_string(), "A--C");
//! assert_eq!(seq.at(2).unwrap(), GappedSymbol::Gap);
//! assert_eq!(seq.at(3).unwrap(), GappedSymbol::Symbol(b'C'));
//!
//! seq.erase_gap(1..3).unwrap();
//! assert_eq!(seq.to_string(), "AC");
//! ```

pub mod cursor;

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::ops::Range;

use serde::{Deserialize, Serialize, Serializer};
use smallvec::SmallVec;

use crate::errors::PairgapError;

pub use cursor::{Cursor, Iter};

const ANCHORS_ON_STACK: usize = 4;

/// A single position of a gapped sequence: either a symbol of the backing sequence or a gap.
///
/// Gaps order after every symbol.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GappedSymbol<T> {
    Symbol(T),
    Gap,
}

impl<T> GappedSymbol<T> {
    #[inline]
    pub fn is_gap(&self) -> bool {
        matches!(self, Self::Gap)
    }

    #[inline]
    pub fn symbol(self) -> Option<T> {
        match self {
            Self::Symbol(s) => Some(s),
            Self::Gap => None,
        }
    }
}

impl Display for GappedSymbol<u8> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Symbol(s) => write!(f, "{}", s as char),
            Self::Gap => write!(f, "-"),
        }
    }
}

/// One contiguous run of gaps.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnchorGap {
    /// Virtual position of the first gap in the run
    pub pos: usize,

    /// Number of gaps up to and including this run
    pub cum: usize,
}

impl AnchorGap {
    pub fn new(pos: usize, cum: usize) -> Self {
        Self { pos, cum }
    }
}

type AnchorVec = SmallVec<[AnchorGap; ANCHORS_ON_STACK]>;

/// A borrowed sequence interleaved with virtual gaps.
#[derive(Clone, Debug)]
pub struct GappedSequence<'a, T = u8> {
    backing: &'a [T],

    /// Sorted by `pos`; both `pos` and `cum` strictly increase and runs are never adjacent
    anchors: AnchorVec,
}

impl<'a, T> GappedSequence<'a, T> {
    pub fn new(backing: &'a [T]) -> Self {
        Self {
            backing,
            anchors: AnchorVec::new(),
        }
    }

    #[inline]
    pub fn backing(&self) -> &'a [T] {
        self.backing
    }

    #[inline]
    pub fn anchors(&self) -> &[AnchorGap] {
        &self.anchors
    }

    /// Virtual length: number of backing symbols plus number of gaps.
    #[inline]
    pub fn len(&self) -> usize {
        self.backing.len() + self.gap_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn gap_count(&self) -> usize {
        self.anchors.last().map_or(0, |a| a.cum)
    }

    pub fn clear_gaps(&mut self) {
        self.anchors.clear();
    }

    /// Number of anchors whose run starts at or before `pos`.
    #[inline]
    pub(crate) fn anchors_up_to(&self, pos: usize) -> usize {
        self.anchors.partition_point(|a| a.pos <= pos)
    }

    #[inline]
    pub(crate) fn cum_before(&self, run: usize) -> usize {
        if run == 0 { 0 } else { self.anchors[run - 1].cum }
    }

    #[inline]
    pub(crate) fn run_len(&self, run: usize) -> usize {
        self.anchors[run].cum - self.cum_before(run)
    }

    /// Virtual position one past the last gap of the given run.
    #[inline]
    pub(crate) fn run_end(&self, run: usize) -> usize {
        self.anchors[run].pos + self.run_len(run)
    }

    /// Inserts `count` gaps at virtual position `pos`, which may equal `len()`.
    ///
    /// A gap inserted inside or directly after an existing run extends that run. Returns a cursor
    /// positioned at `pos`.
    pub fn insert_gap(&mut self, pos: usize, count: usize) -> Result<Cursor<'_, 'a, T>, PairgapError> {
        let len = self.len();
        if pos > len {
            return Err(PairgapError::OutOfRange { index: pos, len });
        }

        if count > 0 {
            let ix = self.anchors_up_to(pos);
            let shift_from = if ix > 0 && self.run_end(ix - 1) >= pos {
                self.anchors[ix - 1].cum += count;
                ix
            } else {
                let cum = self.cum_before(ix) + count;
                self.anchors.insert(ix, AnchorGap::new(pos, cum));
                ix + 1
            };

            for anchor in &mut self.anchors[shift_from..] {
                anchor.pos += count;
                anchor.cum += count;
            }
        }

        self.cursor_at(pos)
    }

    /// Removes the gaps in `range`, which must lie within a single gap run.
    ///
    /// An empty range is a no-op. Returns a cursor positioned at `range.start`.
    pub fn erase_gap(&mut self, range: Range<usize>) -> Result<Cursor<'_, 'a, T>, PairgapError> {
        let Range { start, end } = range;
        if start >= end {
            return self.cursor_at(start);
        }

        let ix = self.anchors_up_to(start);
        if ix == 0 || self.run_end(ix - 1) < end {
            return Err(PairgapError::GapEraseFailure { first: start, last: end });
        }

        let run = ix - 1;
        let count = end - start;
        let shift_from = if self.run_len(run) == count {
            self.anchors.remove(run);
            run
        } else {
            self.anchors[run].cum -= count;
            ix
        };

        for anchor in &mut self.anchors[shift_from..] {
            anchor.pos -= count;
            anchor.cum -= count;
        }

        self.cursor_at(start)
    }

    /// Whether the virtual position `index` holds a gap.
    pub fn is_gap(&self, index: usize) -> Result<bool, PairgapError> {
        let len = self.len();
        if index >= len {
            return Err(PairgapError::OutOfRange { index, len });
        }

        let ix = self.anchors_up_to(index);
        Ok(ix > 0 && index < self.run_end(ix - 1))
    }

    /// Number of backing symbols before virtual position `index` (`index <= len()`).
    pub fn to_ungapped(&self, index: usize) -> Result<usize, PairgapError> {
        let len = self.len();
        if index > len {
            return Err(PairgapError::OutOfRange { index, len });
        }

        let ix = self.anchors_up_to(index);
        if ix == 0 {
            return Ok(index);
        }

        let run = ix - 1;
        if index < self.run_end(run) {
            Ok(self.anchors[run].pos - self.cum_before(run))
        } else {
            Ok(index - self.anchors[run].cum)
        }
    }

    /// Virtual position of backing symbol `offset` (`offset <= backing().len()`).
    pub fn to_gapped(&self, offset: usize) -> Result<usize, PairgapError> {
        if offset > self.backing.len() {
            return Err(PairgapError::OutOfRange { index: offset, len: self.backing.len() });
        }

        // Count the runs that start before or at backing offset `offset`
        let (mut lo, mut hi) = (0, self.anchors.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.anchors[mid].pos - self.cum_before(mid) <= offset {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }

        Ok(offset + self.cum_before(lo))
    }

    pub fn cursor_at(&self, pos: usize) -> Result<Cursor<'_, 'a, T>, PairgapError> {
        Cursor::new(self, pos)
    }

    pub fn begin(&self) -> Cursor<'_, 'a, T> {
        Cursor::at_position(self, 0)
    }

    pub fn end(&self) -> Cursor<'_, 'a, T> {
        Cursor::at_position(self, self.len())
    }
}

impl<'a, T: Copy> GappedSequence<'a, T> {
    /// Symbol or gap at virtual position `index`.
    pub fn at(&self, index: usize) -> Result<GappedSymbol<T>, PairgapError> {
        let len = self.len();
        if index >= len {
            return Err(PairgapError::OutOfRange { index, len });
        }

        let ix = self.anchors_up_to(index);
        if ix == 0 {
            return Ok(GappedSymbol::Symbol(self.backing[index]));
        }

        let run = ix - 1;
        if index < self.run_end(run) {
            Ok(GappedSymbol::Gap)
        } else {
            Ok(GappedSymbol::Symbol(self.backing[index - self.anchors[run].cum]))
        }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<GappedSymbol<T>> {
        self.at(index).ok()
    }

    pub fn iter(&self) -> Iter<'_, 'a, T> {
        Iter::new(self)
    }
}

impl<'g, 'a, T: Copy> IntoIterator for &'g GappedSequence<'a, T> {
    type Item = GappedSymbol<T>;
    type IntoIter = Iter<'g, 'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for GappedSequence<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.anchors == other.anchors && self.backing == other.backing
    }
}

impl<T: Eq> Eq for GappedSequence<'_, T> { }

impl<T: Copy + Ord> PartialOrd for GappedSequence<'_, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Copy + Ord> Ord for GappedSequence<'_, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl Display for GappedSequence<'_, u8> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for symbol in self.iter() {
            write!(f, "{}", symbol)?;
        }

        Ok(())
    }
}

impl Serialize for GappedSequence<'_, u8> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
