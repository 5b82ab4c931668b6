use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Calendar month of the twelve-month reporting cycle.
///
/// Declaration order is calendar order, so the derived `Ord` matches
/// [`Month::sort_index`]. Serialized as upper-case three-letter names
/// (`"JAN"` .. `"DEC"`) on the wire and in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::Jan,
        Month::Feb,
        Month::Mar,
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
        Month::Nov,
        Month::Dec,
    ];

    /// Position in the calendar year: 0 (January) .. 11 (December).
    pub fn sort_index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Month::Jan => "JAN",
            Month::Feb => "FEB",
            Month::Mar => "MAR",
            Month::Apr => "APR",
            Month::May => "MAY",
            Month::Jun => "JUN",
            Month::Jul => "JUL",
            Month::Aug => "AUG",
            Month::Sep => "SEP",
            Month::Oct => "OCT",
            Month::Nov => "NOV",
            Month::Dec => "DEC",
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Month {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "JAN" => Ok(Month::Jan),
            "FEB" => Ok(Month::Feb),
            "MAR" => Ok(Month::Mar),
            "APR" => Ok(Month::Apr),
            "MAY" => Ok(Month::May),
            "JUN" => Ok(Month::Jun),
            "JUL" => Ok(Month::Jul),
            "AUG" => Ok(Month::Aug),
            "SEP" => Ok(Month::Sep),
            "OCT" => Ok(Month::Oct),
            "NOV" => Ok(Month::Nov),
            "DEC" => Ok(Month::Dec),
            other => Err(format!("unknown month '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_index_covers_calendar_year() {
        assert_eq!(Month::Jan.sort_index(), 0);
        assert_eq!(Month::Dec.sort_index(), 11);

        for (i, m) in Month::ALL.iter().enumerate() {
            assert_eq!(m.sort_index(), i);
        }
    }

    #[test]
    fn parses_wire_names() {
        assert_eq!("JAN".parse::<Month>().unwrap(), Month::Jan);
        assert_eq!("dec".parse::<Month>().unwrap(), Month::Dec);
        assert!("SMARCH".parse::<Month>().is_err());
    }

    #[test]
    fn serde_uses_uppercase_names() {
        let json = serde_json::to_string(&Month::Feb).unwrap();
        assert_eq!(json, "\"FEB\"");
        let back: Month = serde_json::from_str("\"NOV\"").unwrap();
        assert_eq!(back, Month::Nov);
    }
}
