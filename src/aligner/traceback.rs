use itertools::Itertools;

use crate::aligner::result::{AlignedPair, Coordinate};
use crate::aligner::trace::{TraceDirections, TraceMatrix};
use crate::errors::PairgapError;
use crate::gapped::GappedSequence;

/// A step along the optimal path through the DP matrix.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathStep {
    /// Consume a symbol of both sequences
    Diagonal,

    /// Consume a symbol of sequence2 only (vertical move)
    GapInSequence1,

    /// Consume a symbol of sequence1 only (horizontal move)
    GapInSequence2,
}

/// Which gap track the traceback currently follows.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum TraceState {
    Best,
    Vertical,
    Horizontal,
}

/// The optimal path of one lane, as run-length encoded steps in forward order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TracebackPath {
    pub begin: Coordinate,
    pub end: Coordinate,
    pub runs: Vec<(PathStep, usize)>,
}

/// Follow the trace directions of one lane back from its optimum.
///
/// Predecessors are tried in the order diagonal, up, left. The walk stops at a cell without a
/// predecessor, i.e. the origin, a free border or a local restart, or at a cell outside the
/// stored region.
pub(crate) fn traceback<const W: usize>(trace: &TraceMatrix<W>, lane: usize, end: Coordinate) -> TracebackPath {
    let mut col = end.sequence1;
    let mut row = end.sequence2;
    let mut state = TraceState::Best;
    let mut steps = Vec::with_capacity(col + row);

    while let Some(dirs) = trace.get(col, row, lane) {
        match state {
            TraceState::Best => {
                if dirs.contains(TraceDirections::DIAGONAL) && col > 0 && row > 0 {
                    steps.push(PathStep::Diagonal);
                    col -= 1;
                    row -= 1;
                } else if dirs.contains(TraceDirections::UP) {
                    state = TraceState::Vertical;
                } else if dirs.contains(TraceDirections::LEFT) {
                    state = TraceState::Horizontal;
                } else {
                    break;
                }
            },
            TraceState::Vertical => {
                let Some(prev) = row.checked_sub(1) else { break };

                steps.push(PathStep::GapInSequence1);
                if dirs.contains(TraceDirections::UP_OPEN) {
                    state = TraceState::Best;
                }
                row = prev;
            },
            TraceState::Horizontal => {
                let Some(prev) = col.checked_sub(1) else { break };

                steps.push(PathStep::GapInSequence2);
                if dirs.contains(TraceDirections::LEFT_OPEN) {
                    state = TraceState::Best;
                }
                col = prev;
            },
        }
    }

    let runs = steps.iter().rev()
        .chunk_by(|step| **step)
        .into_iter()
        .map(|(step, group)| (step, group.count()))
        .collect();

    TracebackPath {
        begin: Coordinate::new(col, row),
        end,
        runs,
    }
}

impl TracebackPath {
    /// Apply the path as gap insertions to gapped views of both aligned regions.
    pub fn aligned_pair<'s>(&self, sequence1: &'s [u8], sequence2: &'s [u8]) -> Result<AlignedPair<'s>, PairgapError> {
        let region1 = sequence1.get(self.begin.sequence1..self.end.sequence1)
            .ok_or(PairgapError::OutOfRange { index: self.end.sequence1, len: sequence1.len() })?;
        let region2 = sequence2.get(self.begin.sequence2..self.end.sequence2)
            .ok_or(PairgapError::OutOfRange { index: self.end.sequence2, len: sequence2.len() })?;

        let mut gapped1 = GappedSequence::new(region1);
        let mut gapped2 = GappedSequence::new(region2);

        let mut pos = 0;
        for &(step, length) in &self.runs {
            match step {
                PathStep::Diagonal => (),
                PathStep::GapInSequence1 => { gapped1.insert_gap(pos, length)?; },
                PathStep::GapInSequence2 => { gapped2.insert_gap(pos, length)?; },
            }

            pos += length;
        }

        Ok(AlignedPair { sequence1: gapped1, sequence2: gapped2 })
    }
}

#[cfg(test)]
mod tests {
    use super::{traceback, PathStep};
    use crate::aligner::band::BandPolicy;
    use crate::aligner::result::Coordinate;
    use crate::aligner::trace::{TraceDirections, TraceMatrix};
    use crate::errors::PairgapError;

    const D: TraceDirections = TraceDirections::DIAGONAL;
    const U: TraceDirections = TraceDirections::UP;
    const UO: TraceDirections = TraceDirections::UP_OPEN;
    const L: TraceDirections = TraceDirections::LEFT;
    const LO: TraceDirections = TraceDirections::LEFT_OPEN;

    #[test]
    fn test_follow_gap_tracks() {
        let policy = BandPolicy::new(None, 3, 4);
        let mut trace = TraceMatrix::<1>::new();
        trace.reset(policy.trace_layout(), 4).unwrap();

        trace.set(1, 1, [D]);
        trace.set(1, 2, [D | UO]);
        trace.set(1, 3, [U]);
        trace.set(2, 3, [L | LO]);
        trace.set(3, 4, [D | L]);

        let path = traceback(&trace, 0, Coordinate::new(3, 4));
        assert_eq!(path.begin, Coordinate::new(0, 0));
        assert_eq!(path.runs, vec![
            (PathStep::Diagonal, 1),
            (PathStep::GapInSequence1, 2),
            (PathStep::GapInSequence2, 1),
            (PathStep::Diagonal, 1),
        ]);

        let pair = path.aligned_pair(b"ACG", b"ATTG").unwrap();
        assert_eq!(pair.sequence1.to_string(), "A--CG");
        assert_eq!(pair.sequence2.to_string(), "ATT-G");
        assert_eq!(pair.len(), 5);

        assert!(matches!(path.aligned_pair(b"AC", b"ATTG"), Err(PairgapError::OutOfRange { .. })));
    }

    #[test]
    fn test_stop_at_free_border() {
        let policy = BandPolicy::new(None, 4, 2);
        let mut trace = TraceMatrix::<2>::new();
        trace.reset(policy.trace_layout(), 5).unwrap();

        // Lane 1 is empty, lane 0 ends two diagonal steps after a free first row cell
        trace.set(3, 1, [D, TraceDirections::NONE]);
        trace.set(4, 2, [D, TraceDirections::NONE]);

        let path = traceback(&trace, 0, Coordinate::new(4, 2));
        assert_eq!(path.begin, Coordinate::new(2, 0));
        assert_eq!(path.runs, vec![(PathStep::Diagonal, 2)]);

        let pair = path.aligned_pair(b"TTAC", b"AC").unwrap();
        assert_eq!(pair.sequence1.to_string(), "AC");
        assert_eq!(pair.sequence2.to_string(), "AC");

        let empty = traceback(&trace, 1, Coordinate::new(4, 2));
        assert_eq!(empty.begin, Coordinate::new(4, 2));
        assert!(empty.runs.is_empty());
    }
}
