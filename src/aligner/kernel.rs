use std::array;
use std::ops::Range;

use tracing::trace;

use crate::aligner::band::BandPolicy;
use crate::aligner::config::{AlignmentConfig, FreeEnds};
use crate::aligner::lanes::{LaneBatch, LaneVector};
use crate::aligner::scoring::{ScoreType, ScoringScheme};
use crate::aligner::trace::{TraceDirections, TraceMatrix};
use crate::aligner::tracker::OptimumTracker;
use crate::errors::PairgapError;

/// Gap scores converted to the cell score type.
#[derive(Copy, Clone, Debug)]
struct GapScores<S> {
    open: S,
    extend: S,
    open_total: S,
}

impl<S: ScoreType> GapScores<S> {
    /// Score of a gap of the given length starting at the matrix origin.
    fn leading(&self, length: usize) -> S {
        S::from_i64(self.open.as_i64() + length as i64 * self.extend.as_i64())
    }
}

/// Make sure no cell of a `len1` x `len2` matrix can saturate `S`.
///
/// Every cell score is the score of some path with at most `len1 + len2 + 1` steps of magnitude
/// at most `max(|substitution|, |extend|)` and at most two gap openings on top of its best
/// predecessor, so the bound also keeps real scores clear of the minimum used as minus infinity.
fn check_score_range<C: ScoringScheme, S: ScoreType>(
    config: &AlignmentConfig<C>,
    len1: usize,
    len2: usize,
) -> Result<(), PairgapError> {
    let step = config.scoring.max_abs_score().max(config.gaps.extend.unsigned_abs()) as i64;
    let open = config.gaps.open.unsigned_abs() as i64;

    let bound = (len1 as i64).saturating_add(len2 as i64).saturating_add(1)
        .saturating_mul(step)
        .saturating_add(2 * open);
    let max = S::max_value().as_i64();

    if bound > max {
        return Err(PairgapError::ScoreOverflow { bound, max });
    }

    Ok(())
}

/// Best scores of one computed column, kept for the debug output.
#[derive(Clone, Debug)]
pub(crate) struct ColumnScores<S, const W: usize> {
    pub col: usize,
    pub rows: Range<usize>,
    pub best: Vec<LaneVector<S, W>>,
}

/// Column-wise Gotoh recurrence over a batch of `W` pairs.
///
/// Only one column of scores is kept: for each row the best score and the horizontal gap track
/// leaving the cell to the right. The vertical gap track is carried down the column in a
/// register. Trace directions are stored for every computed cell when requested.
pub(crate) struct DpKernel<S, const W: usize> {
    best: Vec<LaneVector<S, W>>,
    horizontal: Vec<LaneVector<S, W>>,
    h_open: Vec<[bool; W]>,
    trace: TraceMatrix<W>,
    tracker: OptimumTracker<S, W>,
    scores: Option<Vec<ColumnScores<S, W>>>,
}

impl<S: ScoreType, const W: usize> DpKernel<S, W> {
    pub fn new() -> Self {
        Self {
            best: Vec::new(),
            horizontal: Vec::new(),
            h_open: Vec::new(),
            trace: TraceMatrix::new(),
            tracker: OptimumTracker::new(),
            scores: None,
        }
    }

    /// Keep the best score of every computed cell, for debugging.
    pub fn record_scores(&mut self, enabled: bool) {
        self.scores = if enabled { Some(Vec::new()) } else { None };
    }

    pub fn trace(&self) -> &TraceMatrix<W> {
        &self.trace
    }

    pub fn tracker(&self) -> &OptimumTracker<S, W> {
        &self.tracker
    }

    pub fn scores(&self) -> Option<&[ColumnScores<S, W>]> {
        self.scores.as_deref()
    }

    /// Fill the matrices of all lanes in the batch and find each lane's optimum.
    pub fn run<C: ScoringScheme>(
        &mut self,
        config: &AlignmentConfig<C>,
        batch: &LaneBatch<W>,
    ) -> Result<(), PairgapError> {
        let len1 = batch.max_len1();
        let len2 = batch.max_len2();
        check_score_range::<C, S>(config, len1, len2)?;

        let policy = BandPolicy::new(config.band, len1, len2);
        let last_column = policy.last_column();
        let record_trace = config.output.needs_trace();

        let gaps = GapScores {
            open: S::from_i32(config.gaps.open),
            extend: S::from_i32(config.gaps.extend),
            open_total: S::from_i32(config.gaps.open_total()),
        };
        let ends = config.mode.free_ends();
        let local = config.mode.is_local();

        self.tracker.reset();
        self.best.clear();
        self.best.resize(len2 + 1, LaneVector::lowest());
        self.horizontal.clear();
        self.horizontal.resize(len2 + 1, LaneVector::lowest());
        self.h_open.clear();
        self.h_open.resize(len2 + 1, [false; W]);

        if let Some(scores) = self.scores.as_mut() {
            scores.clear();
        }

        if record_trace {
            self.trace.reset(policy.trace_layout(), last_column + 1)?;
        }

        let mut band_at_top = true;
        for col in 0..=last_column {
            let rows = policy.rows(col);
            if rows.is_empty() {
                continue;
            }

            if band_at_top && rows.start > 0 {
                trace!(col, "Band left the first row.");
                band_at_top = false;
            }

            if col == 0 {
                self.first_column(rows.clone(), &gaps, &ends, record_trace);
            } else {
                self.inner_column(col, rows.clone(), config, batch, &gaps, &ends, local, record_trace);
            }

            self.track_column(col, rows.clone(), batch, &ends, local);

            if let Some(scores) = self.scores.as_mut() {
                scores.push(ColumnScores { col, best: self.best[rows.clone()].to_vec(), rows });
            }
        }

        Ok(())
    }

    /// Column 0: only vertical gaps from the origin, or free.
    fn first_column(&mut self, rows: Range<usize>, gaps: &GapScores<S>, ends: &FreeEnds, record_trace: bool) {
        for row in rows {
            let score = if row == 0 || ends.first_column { S::zero() } else { gaps.leading(row) };
            let best = LaneVector::splat(score);

            self.best[row] = best;
            self.horizontal[row] = best.add_scalar(gaps.open_total);
            self.h_open[row] = [true; W];

            if record_trace {
                let dirs = if row == 0 || ends.first_column {
                    TraceDirections::NONE
                } else if row == 1 {
                    TraceDirections::UP | TraceDirections::UP_OPEN
                } else {
                    TraceDirections::UP
                };

                self.trace.set(0, row, [dirs; W]);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn inner_column<C: ScoringScheme>(
        &mut self,
        col: usize,
        rows: Range<usize>,
        config: &AlignmentConfig<C>,
        batch: &LaneBatch<W>,
        gaps: &GapScores<S>,
        ends: &FreeEnds,
        local: bool,
        record_trace: bool,
    ) {
        let zero = LaneVector::splat(S::zero());

        // Best score of the cell diagonally up-left, taken from the previous column
        let mut diag = if rows.start > 0 { self.best[rows.start - 1] } else { LaneVector::lowest() };

        let mut vertical = LaneVector::lowest();
        let mut v_open = [false; W];

        let mut first_inner = rows.start;
        if rows.start == 0 {
            // First row: only horizontal gaps from the origin, or free
            let score = if ends.first_row { S::zero() } else { gaps.leading(col) };
            let best = LaneVector::splat(score);

            diag = self.best[0];
            self.best[0] = best;
            self.horizontal[0] = best.add_scalar(gaps.open_total);
            self.h_open[0] = [true; W];

            vertical = best.add_scalar(gaps.open_total);
            v_open = [true; W];

            if record_trace {
                let dirs = if ends.first_row {
                    TraceDirections::NONE
                } else if col == 1 {
                    TraceDirections::LEFT | TraceDirections::LEFT_OPEN
                } else {
                    TraceDirections::LEFT
                };

                self.trace.set(col, 0, [dirs; W]);
            }

            first_inner = 1;
        }

        for row in first_inner..rows.end {
            let from_diag = diag.add(batch.substitution(&config.scoring, col, row));
            let h_in = self.horizontal[row];
            let h_in_open = self.h_open[row];
            let v_in = vertical;
            let v_in_open = v_open;

            diag = self.best[row];

            let mut best = from_diag.max(v_in).max(h_in);

            if record_trace {
                let is_diag = from_diag.eq_mask(&best);
                let is_up = v_in.eq_mask(&best);
                let is_left = h_in.eq_mask(&best);

                let dirs = array::from_fn(|l| {
                    let mut dirs = TraceDirections::NONE;

                    if !local || best.lane(l) > S::zero() {
                        if is_diag[l] {
                            dirs |= TraceDirections::DIAGONAL;
                        }
                        if is_up[l] {
                            dirs |= TraceDirections::UP;
                        }
                        if is_left[l] {
                            dirs |= TraceDirections::LEFT;
                        }
                    }

                    if v_in_open[l] {
                        dirs |= TraceDirections::UP_OPEN;
                    }
                    if h_in_open[l] {
                        dirs |= TraceDirections::LEFT_OPEN;
                    }

                    dirs
                });

                self.trace.set(col, row, dirs);
            }

            if local {
                best = best.max(zero);
            }

            // A gap track that ties between opening and extending keeps extending
            let opened = best.add_scalar(gaps.open_total);

            let v_extended = v_in.add_scalar(gaps.extend);
            v_open = opened.gt_mask(&v_extended);
            vertical = opened.max(v_extended);

            let h_extended = h_in.add_scalar(gaps.extend);
            self.h_open[row] = opened.gt_mask(&h_extended);
            self.horizontal[row] = opened.max(h_extended);

            self.best[row] = best;
        }
    }

    /// Offer the cells of a finished column to each lane's optimum.
    fn track_column(&mut self, col: usize, rows: Range<usize>, batch: &LaneBatch<W>, ends: &FreeEnds, local: bool) {
        for lane in 0..batch.lanes {
            let len1 = batch.len1[lane];
            let len2 = batch.len2[lane];
            if col > len1 {
                continue;
            }

            let own_rows = rows.start..rows.end.min(len2 + 1);

            if local {
                for row in own_rows {
                    self.tracker.update(lane, self.best[row].lane(lane), col, row);
                }

                continue;
            }

            if ends.last_row && own_rows.contains(&len2) {
                self.tracker.update(lane, self.best[len2].lane(lane), col, len2);
            }

            if col == len1 {
                if ends.last_column {
                    for row in own_rows {
                        self.tracker.update(lane, self.best[row].lane(lane), col, row);
                    }
                } else if !ends.last_row && own_rows.contains(&len2) {
                    self.tracker.set(lane, self.best[len2].lane(lane), col, len2);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DpKernel;
    use crate::aligner::band::Band;
    use crate::aligner::config::{AlignmentConfig, AlignmentMode, OutputSelection};
    use crate::aligner::lanes::LaneBatch;
    use crate::aligner::result::SequencePair;
    use crate::aligner::scoring::{GapCosts, MatchMismatch};
    use crate::aligner::trace::TraceDirections;
    use crate::errors::PairgapError;

    fn run_single(config: &AlignmentConfig<MatchMismatch>, seq1: &[u8], seq2: &[u8]) -> DpKernel<i32, 1> {
        let mut batch = LaneBatch::<1>::new();
        batch.load(&[SequencePair::new(0, seq1, seq2)]);

        let mut kernel = DpKernel::new();
        kernel.record_scores(true);
        kernel.run(config, &batch).unwrap();

        kernel
    }

    #[test]
    fn test_global_score_and_trace() {
        let config = AlignmentConfig::new(MatchMismatch::new(1, -1), GapCosts::new(-2, -1));
        let kernel = run_single(&config, b"ACGT", b"AGT");

        assert_eq!(kernel.tracker().score(0), 0);
        assert_eq!(kernel.tracker().position(0), (4, 3));

        let trace = kernel.trace();
        assert_eq!(trace.get(0, 0, 0), Some(TraceDirections::NONE));
        assert_eq!(trace.get(1, 0, 0), Some(TraceDirections::LEFT | TraceDirections::LEFT_OPEN));
        assert_eq!(trace.get(0, 2, 0), Some(TraceDirections::UP));

        // G of sequence2 against G of sequence1, reached through the deleted C
        assert!(trace.get(3, 2, 0).unwrap().contains(TraceDirections::DIAGONAL));
        assert!(trace.get(2, 1, 0).unwrap().contains(TraceDirections::LEFT));
    }

    #[test]
    fn test_boundaries() {
        let config = AlignmentConfig::new(MatchMismatch::new(1, -1), GapCosts::new(-10, -1));
        let kernel = run_single(&config, b"AAAA", b"AA");

        let scores = kernel.scores().unwrap();
        assert_eq!(scores.len(), 5);
        assert_eq!(scores[0].best.iter().map(|v| v.lane(0)).collect::<Vec<_>>(), vec![0, -11, -12]);
        assert_eq!(scores[3].best[0].lane(0), -13);

        let semi = config.with_mode(AlignmentMode::overlap_sequence1());
        let kernel = run_single(&semi, b"AAAA", b"AA");
        let scores = kernel.scores().unwrap();
        assert_eq!(scores[3].best[0].lane(0), 0);
        assert_eq!(kernel.tracker().score(0), 2);

        // First optimum in column-major order
        assert_eq!(kernel.tracker().position(0), (2, 2));
    }

    #[test]
    fn test_local_never_negative() {
        let config = AlignmentConfig::new(MatchMismatch::new(2, -3), GapCosts::new(-5, -2))
            .with_mode(AlignmentMode::Local);
        let kernel = run_single(&config, b"TTTT", b"GGCG");

        assert_eq!(kernel.tracker().score(0), 0);
        assert_eq!(kernel.tracker().position(0), (0, 0));
        for column in kernel.scores().unwrap() {
            assert!(column.best.iter().all(|v| v.lane(0) >= 0));
        }
    }

    #[test]
    fn test_score_only_skips_trace() {
        let config = AlignmentConfig::new(MatchMismatch::new(1, -1), GapCosts::new(-2, -1))
            .with_output(OutputSelection::score_only());
        let kernel = run_single(&config, b"ACGT", b"AGT");

        assert_eq!(kernel.tracker().score(0), 0);
        assert_eq!(kernel.trace().get(1, 1, 0), None);
    }

    #[test]
    fn test_band_restricts_columns() {
        let config = AlignmentConfig::new(MatchMismatch::new(4, -5), GapCosts::new(-10, -1))
            .with_mode(AlignmentMode::overlap_sequence1())
            .with_band(Band::new(-4, 8));
        let kernel = run_single(&config, b"TTTTTACGTATGTCCCCC", b"ACGTAAAACGT");

        let scores = kernel.scores().unwrap();
        assert_eq!(scores.last().unwrap().col, 18);
        assert_eq!(scores[12].rows, 4..12);
        assert_eq!(kernel.tracker().score(0), 10);
        assert_eq!(kernel.tracker().position(0), (13, 11));
    }

    #[test]
    fn test_lanes_are_independent() {
        let config = AlignmentConfig::new(MatchMismatch::new(2, -1), GapCosts::new(-1, -1))
            .with_mode(AlignmentMode::Local);
        let pairs = [
            SequencePair::new(0, b"ATAAGCGTCTCG", b"TCATAGAGTTGC"),
            SequencePair::new(1, b"ACGT", b"ACGT"),
            SequencePair::new(2, b"", b"ACGT"),
        ];

        let mut batch = LaneBatch::<4>::new();
        batch.load(&pairs);

        let mut kernel = DpKernel::<i32, 4>::new();
        kernel.run(&config, &batch).unwrap();

        assert_eq!(kernel.tracker().score(0), 9);
        assert_eq!(kernel.tracker().position(0), (8, 9));
        assert_eq!(kernel.tracker().score(1), 8);
        assert_eq!(kernel.tracker().position(1), (4, 4));
        assert_eq!(kernel.tracker().score(2), 0);
        assert_eq!(kernel.tracker().position(2), (0, 0));
    }

    #[test]
    fn test_score_range_checked() {
        let config = AlignmentConfig::new(MatchMismatch::new(1, -1), GapCosts::new(-10, -1));
        let long = vec![b'A'; 40_000];

        let mut batch = LaneBatch::<1>::new();
        batch.load(&[SequencePair::new(0, &long, b"A")]);

        let mut narrow = DpKernel::<i16, 1>::new();
        assert!(matches!(
            narrow.run(&config, &batch),
            Err(PairgapError::ScoreOverflow { bound: 40_022, max: 32_767 })
        ));

        let mut wide = DpKernel::<i32, 1>::new();
        wide.run(&config, &batch).unwrap();
        assert_eq!(wide.tracker().score(0), -40_008);

        // Short pairs still fit in i16
        batch.load(&[SequencePair::new(0, &long[..100], b"A")]);
        narrow.run(&config, &batch).unwrap();
        assert_eq!(narrow.tracker().score(0), -108);
    }
}
