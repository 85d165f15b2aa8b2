use std::collections::TryReserveError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;

#[derive(Debug)]
pub enum PairgapError {
    /// The band excludes every cell the alignment needs, given the sequence lengths
    InvalidBandConfiguration { lower: isize, upper: isize, len1: usize, len2: usize },

    /// The requested erase range is not contained in a single gap run
    GapEraseFailure { first: usize, last: usize },

    /// Index past the end of a gapped sequence
    OutOfRange { index: usize, len: usize },

    /// Could not allocate the trace matrix
    AllocationFailure { cells: usize, source: TryReserveError },

    /// Gap scores must be non-positive
    InvalidGapCosts { open: i32, extend: i32 },

    /// Scores of this batch may leave the range of the score type
    ScoreOverflow { bound: i64, max: i64 },

    /// Malformed CIGAR string
    InvalidCigar { cigar: String },

    /// The CIGAR consumes a different number of symbols than the sequences have
    CigarLengthMismatch { consumed1: usize, consumed2: usize, len1: usize, len2: usize },

    /// Other IO errors
    IOError(io::Error),
}

impl Error for PairgapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            Self::AllocationFailure { ref source, .. } => Some(source),
            Self::IOError(ref source) => Some(source),
            _ => None
        }
    }
}

impl From<io::Error> for PairgapError {
    fn from(value: io::Error) -> Self {
        Self::IOError(value)
    }
}

impl Display for PairgapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::InvalidBandConfiguration { lower, upper, len1, len2 } =>
                write!(f, "Band [{lower}, {upper}] does not cover a valid alignment of sequences with lengths {len1} and {len2}!"),
            Self::GapEraseFailure { first, last } =>
                write!(f, "The range {first}..{last} is not part of a single gap run!"),
            Self::OutOfRange { index, len } =>
                write!(f, "Position {index} is out of range for a gapped sequence of length {len}!"),
            Self::AllocationFailure { cells, source: _ } =>
                write!(f, "Could not allocate a trace matrix with {cells} cells!"),
            Self::InvalidGapCosts { open, extend } =>
                write!(f, "Gap scores must not be positive (open: {open}, extend: {extend})!"),
            Self::ScoreOverflow { bound, max } =>
                write!(f, "Alignment scores may reach magnitude {bound}, more than the score type holds ({max})!"),
            Self::InvalidCigar { ref cigar } =>
                write!(f, "Invalid CIGAR string '{cigar}'!"),
            Self::CigarLengthMismatch { consumed1, consumed2, len1, len2 } =>
                write!(f, "CIGAR covers {consumed1} and {consumed2} symbols, but the sequences have lengths {len1} and {len2}!"),
            Self::IOError(ref err) =>
                err.fmt(f),
        }
    }
}
