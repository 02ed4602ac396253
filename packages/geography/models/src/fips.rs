//! FIPS code tables and normalization.
//!
//! State codes are two digits, county codes five (state + three-digit
//! county). Upstream sources disagree on padding: the MIT county file
//! stores `1001` for Autauga, AL, while Census and boundary files use
//! `01001`. Every join in the pipeline goes through [`pad_county_fips`].

/// One row of the state table: FIPS code, postal abbreviation, full name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateInfo {
    /// Two-digit FIPS code.
    pub fips: &'static str,
    /// Two-letter postal abbreviation.
    pub abbr: &'static str,
    /// Full state name.
    pub name: &'static str,
}

const fn st(fips: &'static str, abbr: &'static str, name: &'static str) -> StateInfo {
    StateInfo { fips, abbr, name }
}

/// The 50 states plus DC, ordered by FIPS code. Territories are excluded.
pub const STATES: &[StateInfo] = &[
    st("01", "AL", "Alabama"),
    st("02", "AK", "Alaska"),
    st("04", "AZ", "Arizona"),
    st("05", "AR", "Arkansas"),
    st("06", "CA", "California"),
    st("08", "CO", "Colorado"),
    st("09", "CT", "Connecticut"),
    st("10", "DE", "Delaware"),
    st("11", "DC", "District of Columbia"),
    st("12", "FL", "Florida"),
    st("13", "GA", "Georgia"),
    st("15", "HI", "Hawaii"),
    st("16", "ID", "Idaho"),
    st("17", "IL", "Illinois"),
    st("18", "IN", "Indiana"),
    st("19", "IA", "Iowa"),
    st("20", "KS", "Kansas"),
    st("21", "KY", "Kentucky"),
    st("22", "LA", "Louisiana"),
    st("23", "ME", "Maine"),
    st("24", "MD", "Maryland"),
    st("25", "MA", "Massachusetts"),
    st("26", "MI", "Michigan"),
    st("27", "MN", "Minnesota"),
    st("28", "MS", "Mississippi"),
    st("29", "MO", "Missouri"),
    st("30", "MT", "Montana"),
    st("31", "NE", "Nebraska"),
    st("32", "NV", "Nevada"),
    st("33", "NH", "New Hampshire"),
    st("34", "NJ", "New Jersey"),
    st("35", "NM", "New Mexico"),
    st("36", "NY", "New York"),
    st("37", "NC", "North Carolina"),
    st("38", "ND", "North Dakota"),
    st("39", "OH", "Ohio"),
    st("40", "OK", "Oklahoma"),
    st("41", "OR", "Oregon"),
    st("42", "PA", "Pennsylvania"),
    st("44", "RI", "Rhode Island"),
    st("45", "SC", "South Carolina"),
    st("46", "SD", "South Dakota"),
    st("47", "TN", "Tennessee"),
    st("48", "TX", "Texas"),
    st("49", "UT", "Utah"),
    st("50", "VT", "Vermont"),
    st("51", "VA", "Virginia"),
    st("53", "WA", "Washington"),
    st("54", "WV", "West Virginia"),
    st("55", "WI", "Wisconsin"),
    st("56", "WY", "Wyoming"),
];

/// Looks up a state by its FIPS code. Accepts unpadded input (`"6"`).
#[must_use]
pub fn state_by_fips(fips: &str) -> Option<&'static StateInfo> {
    let padded = pad_state_fips(fips)?;
    STATES.iter().find(|s| s.fips == padded)
}

/// Maps a two-digit FIPS code to the postal abbreviation.
///
/// Returns `"??"` for unrecognized codes.
#[must_use]
pub fn state_abbr(fips: &str) -> &'static str {
    state_by_fips(fips).map_or("??", |s| s.abbr)
}

/// Resolves a state FIPS code from either a full name or a postal
/// abbreviation, case-insensitively.
///
/// Results tables label rows inconsistently ("District of Columbia" in one
/// decade, "D.C." in another), so a trailing `*` footnote marker and
/// periods are ignored.
#[must_use]
pub fn state_fips_for(label: &str) -> Option<&'static str> {
    let cleaned: String = label
        .trim()
        .trim_end_matches('*')
        .chars()
        .filter(|c| *c != '.')
        .collect();
    let cleaned = cleaned.trim();

    STATES
        .iter()
        .find(|s| s.abbr.eq_ignore_ascii_case(cleaned) || s.name.eq_ignore_ascii_case(cleaned))
        .map(|s| s.fips)
}

/// Left-pads a numeric state code to two digits.
///
/// Returns `None` if the input is empty, non-numeric, or longer than two
/// digits.
#[must_use]
pub fn pad_state_fips(raw: &str) -> Option<String> {
    pad_numeric(raw, 2)
}

/// Left-pads a numeric county code to five digits.
///
/// Idempotent: an already padded code is returned unchanged. Returns
/// `None` for empty or non-numeric input (`"NA"`, `""`), or input longer
/// than five digits.
#[must_use]
pub fn pad_county_fips(raw: &str) -> Option<String> {
    pad_numeric(raw, 5)
}

fn pad_numeric(raw: &str, width: usize) -> Option<String> {
    let trimmed = raw.trim();
    // Spreadsheet exports occasionally write integer codes as floats.
    let trimmed = trimmed.strip_suffix(".0").unwrap_or(trimmed);

    if trimmed.is_empty() || trimmed.len() > width || !trimmed.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    Some(format!("{trimmed:0>width$}"))
}
