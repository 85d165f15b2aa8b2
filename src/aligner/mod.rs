//! Affine gap pairwise alignment.
//!
//! The engine fills a Gotoh DP matrix column by column, with sequence1 along the columns and
//! sequence2 along the rows, optionally restricted to a diagonal band. Pairs are processed in
//! batches of one to sixteen lanes, and each result is handed to a callback in input order.
//!
//! ```
//! use pairgap::aligner::{AlignmentConfig, AlignmentEngine, SequencePair};
//! use pairgap::aligner::scoring::{GapCosts, MatchMismatch};
//!
//! let config = AlignmentConfig::new(MatchMismatch::new(1, -1), GapCosts::new(-2, -1));
//! let mut engine = AlignmentEngine::<_, i32>::new(config).unwrap();
//!
//! let mut results = Vec::new();
//! engine.compute([SequencePair::new(0, b"ACGT", b"AGT")], |result| results.push(result)).unwrap();
//!
//! let alignment = results[0].alignment.as_ref().unwrap();
//! assert_eq!(alignment.sequence1.to_string(), "ACGT");
//! assert_eq!(alignment.sequence2.to_string(), "A-GT");
//! ```

pub mod band;
pub mod cigar;
pub mod config;
pub mod result;
pub mod scoring;
pub mod trace;
pub mod utils;

mod kernel;
mod lanes;
mod traceback;
mod tracker;

use std::marker::PhantomData;

use itertools::Itertools;
use smallvec::SmallVec;
use tracing::debug;

use crate::debug::messages::{DebugOutputMessage, MatrixColumn};
use crate::debug::DebugOutputWriter;
use crate::errors::PairgapError;

use kernel::DpKernel;
use lanes::LaneBatch;
use scoring::{ScoreType, ScoringScheme};

pub use band::Band;
pub use cigar::{Cigar, CigarOp};
pub use config::{AlignmentConfig, AlignmentMode, LaneWidth, OutputSelection};
pub use result::{AlignedPair, AlignmentResult, Coordinate, SequencePair};
pub use traceback::PathStep;
pub use utils::{print_alignment, score_alignment};

/// Scratch space of the DP kernel, sized for the configured lane width.
enum KernelScratch<S> {
    One(DpKernel<S, 1>),
    Four(DpKernel<S, 4>),
    Eight(DpKernel<S, 8>),
    Sixteen(DpKernel<S, 16>),
}

impl<S: ScoreType> KernelScratch<S> {
    fn new(lane_width: LaneWidth) -> Self {
        match lane_width {
            LaneWidth::One => Self::One(DpKernel::new()),
            LaneWidth::Four => Self::Four(DpKernel::new()),
            LaneWidth::Eight => Self::Eight(DpKernel::new()),
            LaneWidth::Sixteen => Self::Sixteen(DpKernel::new()),
        }
    }
}

/// Pairwise aligner with a fixed configuration.
///
/// An engine owns its scratch buffers, so aligning needs `&mut self`. Use one engine per thread.
pub struct AlignmentEngine<'d, C, S = i32> {
    config: AlignmentConfig<C>,
    scratch: KernelScratch<S>,
    debug_output: Option<&'d DebugOutputWriter>,
    score_type: PhantomData<S>,
}

impl<'d, C, S> AlignmentEngine<'d, C, S>
where
    C: ScoringScheme,
    S: ScoreType,
{
    pub fn new(config: AlignmentConfig<C>) -> Result<Self, PairgapError> {
        config.validate()?;

        Ok(Self {
            scratch: KernelScratch::new(config.lane_width),
            config,
            debug_output: None,
            score_type: PhantomData,
        })
    }

    pub fn new_with_debug_output(config: AlignmentConfig<C>, debug_writer: &'d DebugOutputWriter) -> Result<Self, PairgapError> {
        let mut engine = Self::new(config)?;
        engine.debug_output = Some(debug_writer);

        Ok(engine)
    }

    pub fn config(&self) -> &AlignmentConfig<C> {
        &self.config
    }

    /// Align every pair and pass each result to `callback`, in input order.
    ///
    /// Pairs are validated a batch at a time, before the batch is computed. On error, results of
    /// earlier batches have already been delivered, none of the failing batch are.
    pub fn compute<'s, I, F>(&mut self, pairs: I, mut callback: F) -> Result<(), PairgapError>
    where
        I: IntoIterator<Item=SequencePair<'s>>,
        F: FnMut(AlignmentResult<'s, S>),
    {
        let config = &self.config;
        let debug_output = self.debug_output;

        match &mut self.scratch {
            KernelScratch::One(kernel) => compute_lanes(config, debug_output, kernel, pairs, &mut callback),
            KernelScratch::Four(kernel) => compute_lanes(config, debug_output, kernel, pairs, &mut callback),
            KernelScratch::Eight(kernel) => compute_lanes(config, debug_output, kernel, pairs, &mut callback),
            KernelScratch::Sixteen(kernel) => compute_lanes(config, debug_output, kernel, pairs, &mut callback),
        }
    }

    /// Align a single pair.
    pub fn align<'s>(&mut self, sequence1: &'s [u8], sequence2: &'s [u8]) -> Result<AlignmentResult<'s, S>, PairgapError> {
        let mut output = None;
        self.compute([SequencePair::new(0, sequence1, sequence2)], |result| output = Some(result))?;

        // compute always reports one result per pair
        Ok(output.unwrap_or_else(|| AlignmentResult::new(0)))
    }
}

fn compute_lanes<'s, C, S, I, F, const W: usize>(
    config: &AlignmentConfig<C>,
    debug_output: Option<&DebugOutputWriter>,
    kernel: &mut DpKernel<S, W>,
    pairs: I,
    callback: &mut F,
) -> Result<(), PairgapError>
where
    C: ScoringScheme,
    S: ScoreType,
    I: IntoIterator<Item=SequencePair<'s>>,
    F: FnMut(AlignmentResult<'s, S>),
{
    kernel.record_scores(debug_output.is_some());
    let mut batch = LaneBatch::<W>::new();

    let chunks = pairs.into_iter().chunks(W);
    for chunk in &chunks {
        let chunk: SmallVec<[SequencePair<'s>; 16]> = chunk.collect();

        for pair in &chunk {
            if let Some(band) = config.band {
                band.validate(pair.sequence1.len(), pair.sequence2.len(), config.mode)?;
            }
        }

        batch.load(&chunk);
        debug!("Aligning batch of {} pair(s) over {} lane(s), first id {}", chunk.len(), W, chunk[0].id);

        kernel.run(config, &batch)?;

        let results = chunk.iter().enumerate()
            .map(|(lane, pair)| lane_result(config, kernel, lane, pair))
            .collect::<Result<SmallVec<[AlignmentResult<'s, S>; 16]>, _>>()?;

        for (lane, (pair, result)) in chunk.iter().zip(results).enumerate() {
            debug!("Pair {}: score {}, end {:?}", pair.id, kernel.tracker().score(lane), result.end);

            if let Some(debug_out) = debug_output {
                log_matrices(debug_out, config, kernel, lane, pair);
            }

            callback(result);
        }
    }

    Ok(())
}

fn lane_result<'s, C, S, const W: usize>(
    config: &AlignmentConfig<C>,
    kernel: &DpKernel<S, W>,
    lane: usize,
    pair: &SequencePair<'s>,
) -> Result<AlignmentResult<'s, S>, PairgapError>
where
    S: ScoreType,
{
    let output = config.output;
    let mut result = AlignmentResult::new(pair.id);

    let (col, row) = kernel.tracker().position(lane);
    let end = Coordinate::new(col, row);

    if output.contains(OutputSelection::SCORE) {
        result.score = Some(kernel.tracker().score(lane));
    }

    if output.contains(OutputSelection::END_POSITION) {
        result.end = Some(end);
    }

    if output.needs_trace() {
        let path = traceback::traceback(kernel.trace(), lane, end);

        if output.contains(OutputSelection::BEGIN_POSITION) {
            result.begin = Some(path.begin);
        }

        if output.contains(OutputSelection::ALIGNMENT) {
            result.alignment = Some(path.aligned_pair(pair.sequence1, pair.sequence2)?);
        }
    }

    Ok(result)
}

fn log_matrices<C, S, const W: usize>(
    debug_out: &DebugOutputWriter,
    config: &AlignmentConfig<C>,
    kernel: &DpKernel<S, W>,
    lane: usize,
    pair: &SequencePair<'_>,
) where
    S: ScoreType,
{
    let len1 = pair.sequence1.len();
    let len2 = pair.sequence2.len();

    debug_out.log(DebugOutputMessage::NewPair { id: pair.id, len1, len2, mode: config.mode, band: config.band });

    // Restrict each stored column to this lane's own matrix
    let own_columns = kernel.scores().unwrap_or_default().iter()
        .filter(|column| column.col <= len1 && column.rows.start <= len2);

    let score_columns = own_columns.clone()
        .map(|column| MatrixColumn {
            col: column.col,
            first_row: column.rows.start,
            cells: column.best.iter()
                .take(len2 + 1 - column.rows.start)
                .map(|v| v.lane(lane))
                .map(|s| if s == S::min_value() { None } else { Some(s.as_i64()) })
                .collect(),
        })
        .collect();

    debug_out.log(DebugOutputMessage::ScoreMatrix { id: pair.id, columns: score_columns });

    if config.output.needs_trace() {
        let trace_columns = own_columns
            .map(|column| MatrixColumn {
                col: column.col,
                first_row: column.rows.start,
                cells: (column.rows.start..column.rows.end.min(len2 + 1))
                    .map(|row| kernel.trace().get(column.col, row, lane)
                        .map_or_else(|| ".".to_string(), |dirs| dirs.to_string()))
                    .collect(),
            })
            .collect();

        debug_out.log(DebugOutputMessage::TraceMatrix { id: pair.id, columns: trace_columns });
    }

    debug_out.log(DebugOutputMessage::PairDone { id: pair.id });
}
