use std::ops::BitOr;

use serde::{Deserialize, Serialize};

use crate::aligner::band::Band;
use crate::aligner::scoring::{GapCosts, ScoringScheme};
use crate::errors::PairgapError;

/// Type of alignment to perform
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignmentMode {
    /// End-to-end alignment of both sequences
    #[default]
    Global,

    /// Global alignment where selected end gaps are free. `free_leading_1` allows a prefix of
    /// sequence1 to remain unaligned at no cost, `free_trailing_1` a suffix, and likewise for
    /// sequence2.
    SemiGlobal {
        free_leading_1: bool,
        free_trailing_1: bool,
        free_leading_2: bool,
        free_trailing_2: bool,
    },

    /// Best scoring pair of substrings
    Local,
}

impl AlignmentMode {
    /// Both ends of sequence1 may overhang for free, e.g. to fit sequence2 into sequence1.
    pub fn overlap_sequence1() -> Self {
        Self::SemiGlobal { free_leading_1: true, free_trailing_1: true, free_leading_2: false, free_trailing_2: false }
    }

    pub fn overlap_sequence2() -> Self {
        Self::SemiGlobal { free_leading_1: false, free_trailing_1: false, free_leading_2: true, free_trailing_2: true }
    }

    /// Free end gaps on every side.
    pub fn overlap() -> Self {
        Self::SemiGlobal { free_leading_1: true, free_trailing_1: true, free_leading_2: true, free_trailing_2: true }
    }

    pub(crate) fn free_ends(&self) -> FreeEnds {
        match *self {
            Self::Global => FreeEnds::default(),
            Self::SemiGlobal { free_leading_1, free_trailing_1, free_leading_2, free_trailing_2 } => FreeEnds {
                first_row: free_leading_1,
                last_row: free_trailing_1,
                first_column: free_leading_2,
                last_column: free_trailing_2,
            },
            Self::Local => FreeEnds { first_row: true, last_row: true, first_column: true, last_column: true },
        }
    }

    #[inline]
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }
}

/// Matrix borders without gap penalties. Rows follow sequence2, columns sequence1.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct FreeEnds {
    pub first_row: bool,
    pub last_row: bool,
    pub first_column: bool,
    pub last_column: bool,
}

/// Set of results to compute for each pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputSelection(u8);

impl OutputSelection {
    pub const SCORE: Self = Self(0b0001);
    pub const BEGIN_POSITION: Self = Self(0b0010);
    pub const END_POSITION: Self = Self(0b0100);
    pub const ALIGNMENT: Self = Self(0b1000);

    pub fn all() -> Self {
        Self::SCORE | Self::BEGIN_POSITION | Self::END_POSITION | Self::ALIGNMENT
    }

    pub fn score_only() -> Self {
        Self::SCORE
    }

    pub fn positions() -> Self {
        Self::SCORE | Self::BEGIN_POSITION | Self::END_POSITION
    }

    #[inline]
    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Begin positions and alignments both need the trace matrix.
    #[inline]
    pub fn needs_trace(&self) -> bool {
        self.contains(Self::BEGIN_POSITION) || self.contains(Self::ALIGNMENT)
    }
}

impl Default for OutputSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl BitOr for OutputSelection {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Number of sequence pairs aligned in lockstep.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaneWidth {
    #[default]
    One,
    Four,
    Eight,
    Sixteen,
}

impl LaneWidth {
    pub fn width(&self) -> usize {
        match self {
            Self::One => 1,
            Self::Four => 4,
            Self::Eight => 8,
            Self::Sixteen => 16,
        }
    }
}

/// Everything the alignment engine needs to know, fixed for the lifetime of an engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AlignmentConfig<C> {
    pub scoring: C,
    pub gaps: GapCosts,
    pub mode: AlignmentMode,
    pub band: Option<Band>,
    pub output: OutputSelection,
    pub lane_width: LaneWidth,
}

impl<C: ScoringScheme> AlignmentConfig<C> {
    pub fn new(scoring: C, gaps: GapCosts) -> Self {
        Self {
            scoring,
            gaps,
            mode: AlignmentMode::default(),
            band: None,
            output: OutputSelection::default(),
            lane_width: LaneWidth::default(),
        }
    }

    pub fn with_mode(self, mode: AlignmentMode) -> Self {
        Self { mode, ..self }
    }

    pub fn with_band(self, band: Band) -> Self {
        Self { band: Some(band), ..self }
    }

    pub fn with_output(self, output: OutputSelection) -> Self {
        Self { output, ..self }
    }

    pub fn with_lane_width(self, lane_width: LaneWidth) -> Self {
        Self { lane_width, ..self }
    }

    /// Checks that do not depend on the sequences. The band is checked per pair.
    pub fn validate(&self) -> Result<(), PairgapError> {
        self.gaps.validate()?;

        if let Some(band) = self.band {
            if band.upper_bound < band.lower_bound {
                return Err(PairgapError::InvalidBandConfiguration {
                    lower: band.lower_bound,
                    upper: band.upper_bound,
                    len1: 0,
                    len2: 0,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{AlignmentConfig, AlignmentMode, LaneWidth, OutputSelection};
    use crate::aligner::band::Band;
    use crate::aligner::scoring::{GapCosts, MatchMismatch};

    #[test]
    fn test_output_selection() {
        let all = OutputSelection::all();
        assert!(all.contains(OutputSelection::SCORE));
        assert!(all.contains(OutputSelection::ALIGNMENT));
        assert!(all.needs_trace());

        let positions = OutputSelection::positions();
        assert!(positions.contains(OutputSelection::END_POSITION));
        assert!(!positions.contains(OutputSelection::ALIGNMENT));
        assert!(positions.needs_trace());

        let score_only = OutputSelection::score_only();
        assert!(!score_only.needs_trace());
        assert!(!(OutputSelection::SCORE | OutputSelection::END_POSITION).needs_trace());
    }

    #[test]
    fn test_free_ends() {
        assert_eq!(AlignmentMode::Global.free_ends(), Default::default());

        let semi = AlignmentMode::overlap_sequence1().free_ends();
        assert!(semi.first_row && semi.last_row);
        assert!(!semi.first_column && !semi.last_column);

        let local = AlignmentMode::Local.free_ends();
        assert!(local.first_row && local.first_column && local.last_row && local.last_column);
    }

    #[test]
    fn test_validate() {
        let config = AlignmentConfig::new(MatchMismatch::new(1, -1), GapCosts::new(-2, -1))
            .with_lane_width(LaneWidth::Eight);
        assert!(config.validate().is_ok());
        assert_eq!(config.lane_width.width(), 8);

        let bad_band = config.clone().with_band(Band::new(3, -3));
        assert!(bad_band.validate().is_err());

        let bad_gaps = AlignmentConfig::new(MatchMismatch::new(1, -1), GapCosts::new(-2, 1));
        assert!(bad_gaps.validate().is_err());
    }
}
