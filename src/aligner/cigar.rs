use std::fmt::{self, Display, Write};
use std::str::FromStr;

use itertools::Itertools;

use crate::aligner::result::AlignedPair;
use crate::errors::PairgapError;
use crate::gapped::{GappedSequence, GappedSymbol};

/// CIGAR operation, with sequence1 as reference and sequence2 as query.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CigarOp {
    /// Aligned symbols, equal or not
    Match,
    Equal,
    Mismatch,

    /// Symbol in sequence2, gap in sequence1
    Insertion,

    /// Symbol in sequence1, gap in sequence2
    Deletion,
}

impl CigarOp {
    pub fn as_char(&self) -> char {
        match self {
            Self::Match => 'M',
            Self::Equal => '=',
            Self::Mismatch => 'X',
            Self::Insertion => 'I',
            Self::Deletion => 'D',
        }
    }

    pub fn from_char(op: char) -> Option<Self> {
        match op {
            'M' => Some(Self::Match),
            '=' => Some(Self::Equal),
            'X' => Some(Self::Mismatch),
            'I' => Some(Self::Insertion),
            'D' => Some(Self::Deletion),
            _ => None,
        }
    }

    /// Does this operation consume a symbol of sequence1 and of sequence2?
    fn consumes(&self) -> (bool, bool) {
        match self {
            Self::Match | Self::Equal | Self::Mismatch => (true, true),
            Self::Insertion => (false, true),
            Self::Deletion => (true, false),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cigar(Vec<(CigarOp, usize)>);

impl Cigar {
    /// Run-length encode an aligned pair. With `extended`, aligned symbols are split into `=` and
    /// `X` runs, otherwise both are reported as `M`. Columns with a gap in both sequences are
    /// skipped.
    pub fn from_alignment(alignment: &AlignedPair<'_>, extended: bool) -> Self {
        let ops = alignment.sequence1.iter()
            .zip(alignment.sequence2.iter())
            .filter_map(|pair| match pair {
                (GappedSymbol::Symbol(a), GappedSymbol::Symbol(b)) => Some(match (extended, a == b) {
                    (false, _) => CigarOp::Match,
                    (true, true) => CigarOp::Equal,
                    (true, false) => CigarOp::Mismatch,
                }),
                (GappedSymbol::Gap, GappedSymbol::Symbol(_)) => Some(CigarOp::Insertion),
                (GappedSymbol::Symbol(_), GappedSymbol::Gap) => Some(CigarOp::Deletion),
                (GappedSymbol::Gap, GappedSymbol::Gap) => None,
            })
            .chunk_by(|op| *op)
            .into_iter()
            .map(|(op, group)| (op, group.count()))
            .collect();

        Self(ops)
    }

    /// Parse a CIGAR string such as `4M3I1M`. A lone `*` is the empty CIGAR.
    pub fn parse(cigar: &str) -> Result<Self, PairgapError> {
        let invalid = || PairgapError::InvalidCigar { cigar: cigar.to_string() };

        if cigar == "*" {
            return Ok(Self::default());
        }

        let mut ops = Vec::new();
        let mut count_start = 0;
        for (ix, c) in cigar.char_indices() {
            if c.is_ascii_digit() {
                continue;
            }

            let op = CigarOp::from_char(c).ok_or_else(invalid)?;
            let count: usize = cigar[count_start..ix].parse().map_err(|_| invalid())?;
            if count == 0 {
                return Err(invalid());
            }

            ops.push((op, count));
            count_start = ix + c.len_utf8();
        }

        // Empty input, or a count without operation at the end
        if ops.is_empty() || count_start != cigar.len() {
            return Err(invalid());
        }

        Ok(Self(ops))
    }

    /// Rebuild the aligned pair from the two aligned regions. The CIGAR must consume both
    /// sequences completely.
    pub fn to_alignment<'s>(&self, sequence1: &'s [u8], sequence2: &'s [u8]) -> Result<AlignedPair<'s>, PairgapError> {
        let (consumed1, consumed2) = self.0.iter()
            .fold((0, 0), |(n1, n2), (op, count)| {
                let (in1, in2) = op.consumes();
                (n1 + if in1 { *count } else { 0 }, n2 + if in2 { *count } else { 0 })
            });

        if consumed1 != sequence1.len() || consumed2 != sequence2.len() {
            return Err(PairgapError::CigarLengthMismatch {
                consumed1,
                consumed2,
                len1: sequence1.len(),
                len2: sequence2.len(),
            });
        }

        let mut gapped1 = GappedSequence::new(sequence1);
        let mut gapped2 = GappedSequence::new(sequence2);

        let mut pos = 0;
        for &(op, count) in &self.0 {
            match op {
                CigarOp::Insertion => { gapped1.insert_gap(pos, count)?; },
                CigarOp::Deletion => { gapped2.insert_gap(pos, count)?; },
                CigarOp::Match | CigarOp::Equal | CigarOp::Mismatch => (),
            }

            pos += count;
        }

        Ok(AlignedPair { sequence1: gapped1, sequence2: gapped2 })
    }

    pub fn ops(&self) -> &[(CigarOp, usize)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for Cigar {
    type Err = PairgapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for Cigar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_char('*');
        }

        for (op, count) in &self.0 {
            write!(f, "{}{}", count, op.as_char())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Cigar, CigarOp};
    use crate::aligner::result::AlignedPair;
    use crate::errors::PairgapError;
    use crate::gapped::GappedSequence;

    #[test]
    fn test_cigar() {
        let mut sequence1 = GappedSequence::new(b"ACGTAGT");
        let mut sequence2 = GappedSequence::new(b"ACCTTTAGA");
        sequence1.insert_gap(4, 3).unwrap();
        sequence2.insert_gap(8, 1).unwrap();

        let pair = AlignedPair { sequence1, sequence2 };
        assert_eq!(pair.sequence1.to_string(), "ACGT---AGT");
        assert_eq!(pair.sequence2.to_string(), "ACCTTTAG-A");

        let cigar = Cigar::from_alignment(&pair, false);
        assert_eq!(cigar.to_string(), "4M3I1M1D1M");
        assert_eq!(cigar.ops()[1], (CigarOp::Insertion, 3));

        let extended = Cigar::from_alignment(&pair, true);
        assert_eq!(extended.to_string(), "2=1X1=3I1X1D1X");
    }

    #[test]
    fn test_empty_cigar() {
        let pair = AlignedPair { sequence1: GappedSequence::new(b""), sequence2: GappedSequence::new(b"") };
        let cigar = Cigar::from_alignment(&pair, true);
        assert!(cigar.is_empty());
        assert_eq!(cigar.to_string(), "*");
    }

    #[test]
    fn test_parse() {
        let cigar: Cigar = "4M3I1M1D1M".parse().unwrap();
        assert_eq!(cigar.ops(), &[
            (CigarOp::Match, 4),
            (CigarOp::Insertion, 3),
            (CigarOp::Match, 1),
            (CigarOp::Deletion, 1),
            (CigarOp::Match, 1),
        ]);
        assert_eq!(cigar.to_string(), "4M3I1M1D1M");

        assert_eq!(Cigar::parse("12=1X").unwrap().ops(), &[(CigarOp::Equal, 12), (CigarOp::Mismatch, 1)]);
        assert!(Cigar::parse("*").unwrap().is_empty());

        for bad in ["", "M", "4M3", "4Q", "0M", "3S4M", "-1M"] {
            assert!(matches!(Cigar::parse(bad), Err(PairgapError::InvalidCigar { .. })), "{bad}");
        }
    }

    #[test]
    fn test_alignment_round_trip() {
        let mut sequence1 = GappedSequence::new(b"ACGTAGT");
        let mut sequence2 = GappedSequence::new(b"ACCTTTAGA");
        sequence1.insert_gap(4, 3).unwrap();
        sequence2.insert_gap(8, 1).unwrap();
        let pair = AlignedPair { sequence1, sequence2 };

        for extended in [false, true] {
            let cigar = Cigar::from_alignment(&pair, extended);
            let parsed: Cigar = cigar.to_string().parse().unwrap();
            assert_eq!(parsed, cigar);

            let rebuilt = parsed.to_alignment(b"ACGTAGT", b"ACCTTTAGA").unwrap();
            assert_eq!(rebuilt, pair);
        }

        // Adjacent gaps in both sequences
        let rebuilt = Cigar::parse("1M1I1D1M").unwrap().to_alignment(b"AGT", b"ACT").unwrap();
        assert_eq!(rebuilt.sequence1.to_string(), "A-GT");
        assert_eq!(rebuilt.sequence2.to_string(), "AC-T");

        let empty = Cigar::default().to_alignment(b"", b"").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_alignment_length_mismatch() {
        let cigar = Cigar::parse("2M1D").unwrap();
        assert!(cigar.to_alignment(b"ACG", b"AC").is_ok());

        assert!(matches!(
            cigar.to_alignment(b"ACGT", b"AC"),
            Err(PairgapError::CigarLengthMismatch { consumed1: 3, consumed2: 2, len1: 4, len2: 2 })
        ));
        assert!(cigar.to_alignment(b"ACG", b"A").is_err());
    }
}
