use crate::aligner::result::AlignedPair;
use crate::aligner::scoring::{GapCosts, ScoringScheme};
use crate::gapped::GappedSymbol;

/// Render an aligned pair as three lines: sequence1, a match line, and sequence2.
///
/// Matches are marked with `|`, mismatches with `*`, and gaps with a space.
pub fn print_alignment(alignment: &AlignedPair<'_>) -> String {
    let mut seq1_chars = String::with_capacity(alignment.len());
    let mut aln_chars = String::with_capacity(alignment.len());
    let mut seq2_chars = String::with_capacity(alignment.len());

    for (a, b) in alignment.sequence1.iter().zip(alignment.sequence2.iter()) {
        seq1_chars.push_str(&a.to_string());
        seq2_chars.push_str(&b.to_string());

        aln_chars.push(match (a, b) {
            (GappedSymbol::Symbol(x), GappedSymbol::Symbol(y)) if x == y => '|',
            (GappedSymbol::Symbol(_), GappedSymbol::Symbol(_)) => '*',
            _ => ' ',
        });
    }

    format!("{seq1_chars}\n{aln_chars}\n{seq2_chars}")
}

/// Score an aligned pair from scratch.
///
/// Each maximal run of gaps in one sequence scores `open + length * extend`. Columns with a gap
/// in both sequences are ignored.
pub fn score_alignment<C: ScoringScheme>(alignment: &AlignedPair<'_>, scoring: &C, gaps: &GapCosts) -> i64 {
    let mut score = 0;
    let mut gap1 = 0;
    let mut gap2 = 0;

    for column in alignment.sequence1.iter().zip(alignment.sequence2.iter()) {
        match column {
            (GappedSymbol::Symbol(a), GappedSymbol::Symbol(b)) => {
                score += gaps.gap_score(gap1) + gaps.gap_score(gap2);
                gap1 = 0;
                gap2 = 0;

                score += scoring.score(a, b) as i64;
            },
            (GappedSymbol::Gap, GappedSymbol::Symbol(_)) => {
                score += gaps.gap_score(gap2);
                gap2 = 0;
                gap1 += 1;
            },
            (GappedSymbol::Symbol(_), GappedSymbol::Gap) => {
                score += gaps.gap_score(gap1);
                gap1 = 0;
                gap2 += 1;
            },
            (GappedSymbol::Gap, GappedSymbol::Gap) => (),
        }
    }

    score + gaps.gap_score(gap1) + gaps.gap_score(gap2)
}

#[cfg(test)]
mod tests {
    use super::{print_alignment, score_alignment};
    use crate::aligner::result::AlignedPair;
    use crate::aligner::scoring::{GapCosts, MatchMismatch};
    use crate::gapped::GappedSequence;

    fn example() -> AlignedPair<'static> {
        let sequence1 = GappedSequence::new(b"ACGT");
        let mut sequence2 = GappedSequence::new(b"AGT");
        sequence2.insert_gap(1, 1).unwrap();

        AlignedPair { sequence1, sequence2 }
    }

    #[test]
    fn test_print_alignment() {
        let mut pair = example();
        assert_eq!(print_alignment(&pair), "ACGT\n| ||\nA-GT");

        pair.sequence1 = GappedSequence::new(b"ACCT");
        assert_eq!(print_alignment(&pair), "ACCT\n| *|\nA-GT");
    }

    #[test]
    fn test_score_alignment() {
        let pair = example();
        let scoring = MatchMismatch::new(1, -1);
        assert_eq!(score_alignment(&pair, &scoring, &GapCosts::new(-2, -1)), 0);
        assert_eq!(score_alignment(&pair, &scoring, &GapCosts::new(0, -1)), 2);

        // Adjacent gaps in different sequences are separate runs
        let mut sequence1 = GappedSequence::new(b"AAT");
        let mut sequence2 = GappedSequence::new(b"ACT");
        sequence1.insert_gap(1, 1).unwrap();
        sequence2.insert_gap(2, 1).unwrap();
        let pair = AlignedPair { sequence1, sequence2 };
        assert_eq!(pair.sequence1.to_string(), "A-AT");
        assert_eq!(pair.sequence2.to_string(), "AC-T");
        assert_eq!(score_alignment(&pair, &scoring, &GapCosts::new(-2, -1)), 2 - 3 - 3);
    }
}
