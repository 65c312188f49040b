use serde::{Deserialize, Serialize};
use std::fmt;

/// Directory name used when a song's year is unknown.
pub const UNKNOWN_DECADE: &str = "Unknown";

/// A decade bucket derived from a release year (2023 -> "2020s").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decade {
    /// First year of the decade (e.g. 2020).
    Known(i32),
    Unknown,
}

impl Decade {
    #[must_use]
    pub fn from_year(year: Option<i32>) -> Self {
        year.map_or(Self::Unknown, |y| Self::Known(y.div_euclid(10) * 10))
    }

    /// Parse the directory form ("1990s", "Unknown").
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(UNKNOWN_DECADE) {
            return Some(Self::Unknown);
        }
        let start: i32 = s.strip_suffix('s')?.parse().ok()?;
        (start % 10 == 0).then_some(Self::Known(start))
    }
}

impl fmt::Display for Decade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(start) => write!(f, "{start}s"),
            Self::Unknown => f.write_str(UNKNOWN_DECADE),
        }
    }
}
