use serde::Serialize;

use crate::aligner::scoring::ScoreType;
use crate::gapped::GappedSequence;

/// One unit of work for the alignment engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SequencePair<'s> {
    pub id: usize,
    pub sequence1: &'s [u8],
    pub sequence2: &'s [u8],
}

impl<'s> SequencePair<'s> {
    pub fn new(id: usize, sequence1: &'s [u8], sequence2: &'s [u8]) -> Self {
        Self { id, sequence1, sequence2 }
    }
}

/// A cell of the DP matrix, given as offsets into both sequences. `sequence1` indexes columns,
/// `sequence2` rows.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Coordinate {
    pub sequence1: usize,
    pub sequence2: usize,
}

impl Coordinate {
    pub fn new(sequence1: usize, sequence2: usize) -> Self {
        Self { sequence1, sequence2 }
    }
}

/// Gapped views of both aligned regions. Both have the same length.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AlignedPair<'s> {
    pub sequence1: GappedSequence<'s, u8>,
    pub sequence2: GappedSequence<'s, u8>,
}

impl AlignedPair<'_> {
    pub fn len(&self) -> usize {
        self.sequence1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence1.is_empty()
    }
}

/// Outcome of aligning one pair. Only the fields asked for in the output selection are set.
#[derive(Clone, Debug, Serialize)]
pub struct AlignmentResult<'s, S> {
    pub id: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<S>,

    /// Cell where the alignment starts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub begin: Option<Coordinate>,

    /// Cell of the optimum, i.e., the exclusive end offsets of the aligned regions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<Coordinate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<AlignedPair<'s>>,
}

impl<S: ScoreType> AlignmentResult<'_, S> {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            score: None,
            begin: None,
            end: None,
            alignment: None,
        }
    }
}
