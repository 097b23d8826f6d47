//! Period — the ordered row index shared by every input and output series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One row of the dataset: a date plus an intra-date sequence number.
///
/// Ordering is by date, then sequence. Daily data uses `seq = 0`, which is
/// also the only sequence number omitted from the text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    pub date: NaiveDate,
    pub seq: u32,
}

impl Period {
    pub fn new(date: NaiveDate, seq: u32) -> Self {
        Self { date, seq }
    }

    pub fn daily(date: NaiveDate) -> Self {
        Self { date, seq: 0 }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.seq == 0 {
            write!(f, "{}", self.date)
        } else {
            write!(f, "{}#{}", self.date, self.seq)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid period '{0}' (expected YYYY-MM-DD or YYYY-MM-DD#N)")]
pub struct PeriodParseError(pub String);

impl FromStr for Period {
    type Err = PeriodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (date_part, seq_part) = match s.split_once('#') {
            Some((d, q)) => (d, Some(q)),
            None => (s, None),
        };
        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .map_err(|_| PeriodParseError(s.to_string()))?;
        let seq = match seq_part {
            Some(q) => q.parse().map_err(|_| PeriodParseError(s.to_string()))?,
            None => 0,
        };
        Ok(Self { date, seq })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn orders_by_date_then_seq() {
        let a = Period::new(d(2024, 1, 2), 3);
        let b = Period::new(d(2024, 1, 3), 0);
        let c = Period::new(d(2024, 1, 3), 1);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn display_omits_zero_seq() {
        assert_eq!(Period::daily(d(2024, 1, 2)).to_string(), "2024-01-02");
        assert_eq!(Period::new(d(2024, 1, 2), 7).to_string(), "2024-01-02#7");
    }

    #[test]
    fn parses_both_forms() {
        assert_eq!("2024-01-02".parse::<Period>().unwrap(), Period::daily(d(2024, 1, 2)));
        assert_eq!(
            " 2024-01-02#4 ".parse::<Period>().unwrap(),
            Period::new(d(2024, 1, 2), 4)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!("2024-13-01".parse::<Period>().is_err());
        assert!("2024-01-02#x".parse::<Period>().is_err());
        assert!("".parse::<Period>().is_err());
    }
}
