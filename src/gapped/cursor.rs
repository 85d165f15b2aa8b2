use std::fmt::{Debug, Formatter};
use std::iter::FusedIterator;

use crate::errors::PairgapError;
use crate::gapped::{GappedSequence, GappedSymbol};

/// A bidirectional cursor over a gapped sequence.
///
/// Moving one position is O(1): the cursor caches the end of the gap run to its left and the
/// index of the next anchor, so crossing a run boundary never searches the anchors. Dereferencing
/// yields a value, the backing sequence is never handed out mutably.
#[derive(Clone)]
pub struct Cursor<'g, 'a, T> {
    seq: &'g GappedSequence<'a, T>,

    /// Virtual position
    pos: usize,

    /// Number of backing symbols before `pos`
    ungapped: usize,

    /// End of the last run that starts at or before `pos` (0 if there is none)
    gap_end: usize,

    /// Index of the first anchor starting after `pos`
    next_anchor: usize,

    in_gap: bool,
}

impl<'g, 'a, T> Cursor<'g, 'a, T> {
    pub(crate) fn new(seq: &'g GappedSequence<'a, T>, pos: usize) -> Result<Self, PairgapError> {
        let len = seq.len();
        if pos > len {
            return Err(PairgapError::OutOfRange { index: pos, len });
        }

        Ok(Self::at_position(seq, pos))
    }

    pub(crate) fn at_position(seq: &'g GappedSequence<'a, T>, pos: usize) -> Self {
        let mut cursor = Self {
            seq,
            pos,
            ungapped: 0,
            gap_end: 0,
            next_anchor: 0,
            in_gap: false,
        };

        cursor.locate(pos);
        cursor
    }

    fn locate(&mut self, pos: usize) {
        let next_anchor = self.seq.anchors_up_to(pos);

        self.pos = pos;
        self.next_anchor = next_anchor;

        match next_anchor.checked_sub(1) {
            Some(run) => {
                let anchor = self.seq.anchors[run];
                self.gap_end = self.seq.run_end(run);
                self.in_gap = pos < self.gap_end;
                self.ungapped = if self.in_gap {
                    anchor.pos - self.seq.cum_before(run)
                } else {
                    pos - anchor.cum
                };
            },
            None => {
                self.gap_end = 0;
                self.in_gap = false;
                self.ungapped = pos;
            }
        }
    }

    /// Random positioning in O(log k), with k the number of gap runs.
    pub fn jump(&mut self, pos: usize) -> Result<(), PairgapError> {
        let len = self.seq.len();
        if pos > len {
            return Err(PairgapError::OutOfRange { index: pos, len });
        }

        self.locate(pos);
        Ok(())
    }

    /// Move one position forward. Returns false, without moving, at the end.
    pub fn advance(&mut self) -> bool {
        if self.pos >= self.seq.len() {
            return false;
        }

        if !self.in_gap {
            self.ungapped += 1;
        }
        self.pos += 1;

        if self.in_gap && self.pos < self.gap_end {
            return true;
        }

        self.in_gap = false;
        if let Some(anchor) = self.seq.anchors.get(self.next_anchor) {
            if anchor.pos == self.pos {
                self.gap_end = self.seq.run_end(self.next_anchor);
                self.next_anchor += 1;
                self.in_gap = true;
            }
        }

        true
    }

    /// Move one position back. Returns false, without moving, at the start.
    pub fn retreat(&mut self) -> bool {
        if self.pos == 0 {
            return false;
        }

        self.pos -= 1;

        if self.in_gap {
            let run = self.next_anchor - 1;
            if self.pos < self.seq.anchors[run].pos {
                // Runs are never adjacent, so left of a run is always a symbol
                self.in_gap = false;
                self.next_anchor = run;
                self.gap_end = if run > 0 { self.seq.run_end(run - 1) } else { 0 };
                self.ungapped -= 1;
            }
        } else if self.next_anchor > 0 && self.pos < self.gap_end {
            self.in_gap = true;
        } else {
            self.ungapped -= 1;
        }

        true
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Offset in the backing sequence of the next symbol at or after this position.
    #[inline]
    pub fn ungapped_position(&self) -> usize {
        self.ungapped
    }

    #[inline]
    pub fn is_gap(&self) -> bool {
        self.in_gap
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.pos == self.seq.len()
    }
}

impl<T: Copy> Cursor<'_, '_, T> {
    /// The symbol under the cursor, `None` at the end.
    #[inline]
    pub fn get(&self) -> Option<GappedSymbol<T>> {
        if self.in_gap {
            Some(GappedSymbol::Gap)
        } else {
            self.seq.backing.get(self.ungapped)
                .filter(|_| self.pos < self.seq.len())
                .map(|s| GappedSymbol::Symbol(*s))
        }
    }
}

impl<T> PartialEq for Cursor<'_, '_, T> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.seq, other.seq) && self.pos == other.pos
    }
}

impl<T> Debug for Cursor<'_, '_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("pos", &self.pos)
            .field("ungapped", &self.ungapped)
            .field("gap_end", &self.gap_end)
            .field("next_anchor", &self.next_anchor)
            .field("in_gap", &self.in_gap)
            .finish()
    }
}

/// Double-ended iterator over the virtual symbols, driven by two cursors.
#[derive(Clone, Debug)]
pub struct Iter<'g, 'a, T> {
    front: Cursor<'g, 'a, T>,
    back: Cursor<'g, 'a, T>,
}

impl<'g, 'a, T> Iter<'g, 'a, T> {
    pub(crate) fn new(seq: &'g GappedSequence<'a, T>) -> Self {
        Self {
            front: seq.begin(),
            back: seq.end(),
        }
    }
}

impl<T: Copy> Iterator for Iter<'_, '_, T> {
    type Item = GappedSymbol<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front.pos >= self.back.pos {
            return None;
        }

        let symbol = self.front.get();
        self.front.advance();
        symbol
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back.pos.saturating_sub(self.front.pos);
        (remaining, Some(remaining))
    }
}

impl<T: Copy> DoubleEndedIterator for Iter<'_, '_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front.pos >= self.back.pos {
            return None;
        }

        self.back.retreat();
        self.back.get()
    }
}

impl<T: Copy> ExactSizeIterator for Iter<'_, '_, T> { }

impl<T: Copy> FusedIterator for Iter<'_, '_, T> { }
