//! Page range specification parser
//!
//! A specification is a comma-separated list of tokens, each either a
//! single 1-based page number (`"4"`) or an inclusive interval (`"2-5"`).
//! An invalid token is skipped rather than failing the whole parse; the
//! report records each skip together with its reason so callers can log
//! or surface it.

use std::fmt;

/// Why a token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Token was blank after trimming.
    Empty,
    /// One of the endpoints did not parse as an integer.
    NotANumber,
    /// An endpoint fell outside `1..=page_count`.
    OutOfBounds,
    /// Interval start was greater than its end.
    InvertedRange,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::Empty => "empty token",
            SkipReason::NotANumber => "not a number",
            SkipReason::OutOfBounds => "page out of bounds",
            SkipReason::InvertedRange => "range start greater than end",
        };
        f.write_str(text)
    }
}

/// Result of parsing a single comma-separated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenOutcome {
    /// Valid token with its resolved 1-based page numbers, ascending.
    Selected { token: String, pages: Vec<u32> },
    /// Invalid token, skipped.
    Skipped { token: String, reason: SkipReason },
}

/// Per-token outcomes for one range specification, in original order.
#[derive(Debug, Clone, Default)]
pub struct RangeReport {
    pub tokens: Vec<TokenOutcome>,
}

impl RangeReport {
    /// Valid selections, in the order the tokens were written.
    pub fn selections(&self) -> impl Iterator<Item = (&str, &[u32])> {
        self.tokens.iter().filter_map(|t| match t {
            TokenOutcome::Selected { token, pages } => Some((token.as_str(), pages.as_slice())),
            TokenOutcome::Skipped { .. } => None,
        })
    }

    /// Tokens that were rejected, with their reasons.
    pub fn skipped(&self) -> impl Iterator<Item = (&str, SkipReason)> {
        self.tokens.iter().filter_map(|t| match t {
            TokenOutcome::Skipped { token, reason } => Some((token.as_str(), *reason)),
            TokenOutcome::Selected { .. } => None,
        })
    }

    /// True when not a single token produced a selection.
    pub fn is_empty_selection(&self) -> bool {
        self.selections().next().is_none()
    }
}

/// Parse a range specification against a document of `page_count` pages.
pub fn parse_ranges(spec: &str, page_count: u32) -> RangeReport {
    let mut tokens = Vec::new();

    for raw in spec.split(',') {
        let token = raw.trim().to_string();
        let outcome = parse_token(&token, page_count);
        tokens.push(outcome);
    }

    RangeReport { tokens }
}

fn parse_token(token: &str, page_count: u32) -> TokenOutcome {
    let skipped = |reason| TokenOutcome::Skipped {
        token: token.to_string(),
        reason,
    };

    if token.is_empty() {
        return skipped(SkipReason::Empty);
    }

    if let Some((start, end)) = token.split_once('-') {
        let (Ok(start), Ok(end)) = (start.trim().parse::<u32>(), end.trim().parse::<u32>())
        else {
            return skipped(SkipReason::NotANumber);
        };

        if start < 1 || end > page_count {
            return skipped(SkipReason::OutOfBounds);
        }
        if start > end {
            return skipped(SkipReason::InvertedRange);
        }

        return TokenOutcome::Selected {
            token: token.to_string(),
            pages: (start..=end).collect(),
        };
    }

    match token.parse::<u32>() {
        Ok(page) if (1..=page_count).contains(&page) => TokenOutcome::Selected {
            token: token.to_string(),
            pages: vec![page],
        },
        Ok(_) => skipped(SkipReason::OutOfBounds),
        Err(_) => skipped(SkipReason::NotANumber),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn selected(report: &RangeReport) -> Vec<(String, Vec<u32>)> {
        report
            .selections()
            .map(|(t, p)| (t.to_string(), p.to_vec()))
            .collect()
    }

    #[test]
    fn single_page_token() {
        let report = parse_ranges("3", 5);
        assert_eq!(selected(&report), vec![("3".to_string(), vec![3])]);
    }

    #[test]
    fn interval_token() {
        let report = parse_ranges("2-4", 5);
        assert_eq!(selected(&report), vec![("2-4".to_string(), vec![2, 3, 4])]);
    }

    #[test]
    fn tokens_keep_original_order() {
        let report = parse_ranges("4, 1-2", 5);
        assert_eq!(
            selected(&report),
            vec![
                ("4".to_string(), vec![4]),
                ("1-2".to_string(), vec![1, 2]),
            ]
        );
    }

    #[test]
    fn out_of_bounds_page_is_skipped() {
        let report = parse_ranges("6", 5);
        assert!(report.is_empty_selection());
        let skipped: Vec<_> = report.skipped().collect();
        assert_eq!(skipped, vec![("6", SkipReason::OutOfBounds)]);
    }

    #[test]
    fn inverted_range_is_skipped() {
        let report = parse_ranges("3-2", 5);
        let skipped: Vec<_> = report.skipped().collect();
        assert_eq!(skipped, vec![("3-2", SkipReason::InvertedRange)]);
    }

    #[test]
    fn garbage_token_is_skipped() {
        let report = parse_ranges("abc", 5);
        let skipped: Vec<_> = report.skipped().collect();
        assert_eq!(skipped, vec![("abc", SkipReason::NotANumber)]);
    }

    #[test]
    fn page_zero_is_out_of_bounds() {
        let report = parse_ranges("0", 5);
        let skipped: Vec<_> = report.skipped().collect();
        assert_eq!(skipped, vec![("0", SkipReason::OutOfBounds)]);
    }

    #[test]
    fn mixed_valid_and_invalid_tokens() {
        let report = parse_ranges("1-2, 6, 4, 3-2", 5);
        assert_eq!(
            selected(&report),
            vec![
                ("1-2".to_string(), vec![1, 2]),
                ("4".to_string(), vec![4]),
            ]
        );
        assert_eq!(report.skipped().count(), 2);
    }

    #[test]
    fn all_invalid_yields_empty_selection() {
        let report = parse_ranges("9, x, 5-1", 5);
        assert!(report.is_empty_selection());
        assert_eq!(report.tokens.len(), 3);
    }

    #[test]
    fn whitespace_is_trimmed() {
        let report = parse_ranges("  1 - 3 ,  5 ", 5);
        assert_eq!(
            selected(&report),
            vec![
                ("1 - 3".to_string(), vec![1, 2, 3]),
                ("5".to_string(), vec![5]),
            ]
        );
    }

    proptest! {
        /// Arbitrary input never panics and never selects a page outside
        /// the document.
        #[test]
        fn arbitrary_input_is_safe(spec in ".{0,64}", page_count in 1u32..500) {
            let report = parse_ranges(&spec, page_count);
            for (_, pages) in report.selections() {
                for &page in pages {
                    prop_assert!(page >= 1 && page <= page_count);
                }
            }
        }

        /// Every token produces exactly one outcome.
        #[test]
        fn one_outcome_per_token(spec in "[0-9,\\- ]{0,64}") {
            let report = parse_ranges(&spec, 10);
            prop_assert_eq!(report.tokens.len(), spec.split(',').count());
        }
    }
}
