//! Per-year column layouts for the national results table.
//!
//! The table lists candidates in finishing order and adds columns for
//! notable third-party candidates, so the same position means different
//! things in different years. Each layout names the columns left to right
//! after the `Map`, `Pie`, `Margin` and `%Margin` columns are removed.
//!
//! The layouts are a positional contract with the upstream site. A year
//! without a layout is rejected rather than guessed.

use crate::ScrapeError;

/// Meaning of one column in the national results table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateColumn {
    /// State label.
    State,
    /// Republican electoral votes.
    RepEv,
    /// Democratic electoral votes.
    DemEv,
    /// Third-party electoral votes.
    OtherEv,
    /// Total popular vote.
    TotalVote,
    /// Republican candidate name.
    RepCandidate,
    /// Democratic candidate name.
    DemCandidate,
    /// Leading third-party candidate name.
    OtherCandidate,
    /// Republican share as printed.
    RepPct,
    /// Democratic share as printed.
    DemPct,
    /// First other-candidate share as printed.
    OtherPct,
    /// Second other-candidate share as printed.
    Other2Pct,
    /// Republican popular vote.
    RepVotes,
    /// Democratic popular vote.
    DemVotes,
    /// First other-candidate popular vote.
    OtherVotes,
    /// Second other-candidate popular vote.
    Other2Votes,
}

use StateColumn::{
    DemCandidate as D, DemEv, DemPct, DemVotes, Other2Pct, Other2Votes, OtherCandidate as O,
    OtherEv, OtherPct, OtherVotes, RepCandidate as R, RepEv, RepPct, RepVotes, State, TotalVote,
};

const LAYOUT_1972: &[StateColumn] = &[
    State, RepEv, DemEv, OtherEv, TotalVote, R, D, RepPct, DemPct, OtherPct, RepVotes, DemVotes,
    OtherVotes,
];

const LAYOUT_1976: &[StateColumn] = &[
    State, DemEv, RepEv, TotalVote, D, R, DemPct, RepPct, OtherPct, DemVotes, RepVotes, OtherVotes,
];

const LAYOUT_1980: &[StateColumn] = &[
    State, RepEv, DemEv, TotalVote, R, D, O, RepPct, DemPct, OtherPct, Other2Pct, DemVotes,
    RepVotes, OtherVotes, Other2Votes,
];

const LAYOUT_1984: &[StateColumn] = &[
    State, RepEv, DemEv, TotalVote, R, D, RepPct, DemPct, OtherPct, DemVotes, RepVotes, OtherVotes,
];

const LAYOUT_1992: &[StateColumn] = &[
    State, DemEv, RepEv, TotalVote, D, R, O, DemPct, RepPct, OtherPct, Other2Pct, DemVotes,
    RepVotes, OtherVotes, Other2Votes,
];

const LAYOUT_2000: &[StateColumn] = &[
    State, RepEv, DemEv, TotalVote, D, R, O, DemPct, RepPct, OtherPct, Other2Pct, DemVotes,
    RepVotes, OtherVotes, Other2Votes,
];

const LAYOUT_2004: &[StateColumn] = &[
    State, RepEv, DemEv, TotalVote, R, D, RepPct, DemPct, OtherPct, RepVotes, DemVotes, OtherVotes,
];

const LAYOUT_2008: &[StateColumn] = &[
    State, DemEv, RepEv, TotalVote, D, R, DemPct, RepPct, OtherPct, DemVotes, RepVotes, OtherVotes,
];

const LAYOUT_2016: &[StateColumn] = &[
    State, RepEv, DemEv, OtherEv, TotalVote, D, R, O, DemPct, RepPct, OtherPct, Other2Pct,
    DemVotes, RepVotes, OtherVotes, Other2Votes,
];

/// Presidential years with a known layout, oldest first.
pub const SUPPORTED_YEARS: &[u16] = &[
    1972, 1976, 1980, 1984, 1988, 1992, 1996, 2000, 2004, 2008, 2012, 2016, 2020,
];

/// Returns the column layout for an election year.
///
/// # Errors
///
/// Returns [`ScrapeError::UnsupportedYear`] for years without a layout.
pub fn column_layout(year: u16) -> Result<&'static [StateColumn], ScrapeError> {
    Ok(match year {
        1972 => LAYOUT_1972,
        1976 => LAYOUT_1976,
        1980 => LAYOUT_1980,
        1984 | 1988 => LAYOUT_1984,
        1992 | 1996 => LAYOUT_1992,
        2000 => LAYOUT_2000,
        2004 => LAYOUT_2004,
        2008 | 2012 | 2020 => LAYOUT_2008,
        2016 => LAYOUT_2016,
        _ => return Err(ScrapeError::UnsupportedYear(year)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_supported_year_has_a_layout() {
        for year in SUPPORTED_YEARS {
            let layout = column_layout(*year).unwrap();
            assert_eq!(layout[0], State, "{year} must start with the state label");
            assert!(layout.contains(&TotalVote), "{year} has no total column");
            assert!(layout.contains(&RepVotes) && layout.contains(&DemVotes));
            assert!(layout.contains(&RepEv) && layout.contains(&DemEv));
        }
    }

    #[test]
    fn columns_are_unique_within_a_layout() {
        for year in SUPPORTED_YEARS {
            let layout = column_layout(*year).unwrap();
            for (i, col) in layout.iter().enumerate() {
                assert!(
                    !layout[i + 1..].contains(col),
                    "{year} repeats {col:?}"
                );
            }
        }
    }

    #[test]
    fn decade_specific_widths() {
        assert_eq!(column_layout(1972).unwrap().len(), 13);
        assert_eq!(column_layout(1980).unwrap().len(), 15);
        assert_eq!(column_layout(2016).unwrap().len(), 16);
        assert_eq!(column_layout(2020).unwrap().len(), 12);
    }

    #[test]
    fn unknown_years_are_rejected() {
        assert!(matches!(
            column_layout(1968),
            Err(ScrapeError::UnsupportedYear(1968))
        ));
        assert!(matches!(
            column_layout(2024),
            Err(ScrapeError::UnsupportedYear(2024))
        ));
    }
}
